//! In-memory backend for exercising the poll controller under paused time.

use crate::backend::payload::StatusData;
use crate::backend::traits::Backend;
use crate::error::{DashboardError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// What a scripted status fetch does.
#[derive(Debug, Clone)]
pub enum Reply {
    Data(StatusData),
    /// Transport failure, as if the controller were unplugged.
    NetworkDown,
    /// `success: false` from the controller.
    Failure,
}

#[derive(Debug, Clone)]
struct Step {
    delay: Duration,
    reply: Reply,
}

/// Backend whose status replies are played back from a script.
///
/// Once the script runs dry every fetch answers with `fallback`.
#[derive(Debug)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Step>>,
    fallback: Reply,
    command_ok: bool,
    pub read_ph_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub feed_calls: AtomicUsize,
    pub auto_mode_calls: Mutex<Vec<bool>>,
}

impl ScriptedBackend {
    pub fn new(fallback: Reply) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            command_ok: true,
            read_ph_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            feed_calls: AtomicUsize::new(0),
            auto_mode_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(data: StatusData) -> Self {
        Self::new(Reply::Data(data))
    }

    pub fn offline() -> Self {
        Self::new(Reply::NetworkDown)
    }

    /// Make feed and auto-mode commands fail.
    pub fn with_failing_commands(mut self) -> Self {
        self.command_ok = false;
        self
    }

    pub fn then(self, reply: Reply) -> Self {
        self.then_after(Duration::ZERO, reply)
    }

    /// Queue a reply that is only delivered after `delay`.
    pub fn then_after(self, delay: Duration, reply: Reply) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Step { delay, reply });
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn ph_requests(&self) -> usize {
        self.read_ph_calls.load(Ordering::SeqCst)
    }

    pub fn feeds(&self) -> usize {
        self.feed_calls.load(Ordering::SeqCst)
    }
}

/// Status payload with only the pH set.
pub fn ph_data(ph: f64) -> StatusData {
    StatusData {
        current_ph: Some(ph),
        fish_detected: Some(false),
        motor_initialized: Some(true),
        ..Default::default()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn request_ph_reading(&self) -> Result<()> {
        self.read_ph_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_status(&self) -> Result<StatusData> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let step = self.script.lock().unwrap().pop_front();
        let step = step.unwrap_or_else(|| Step {
            delay: Duration::ZERO,
            reply: self.fallback.clone(),
        });

        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }

        match step.reply {
            Reply::Data(data) => Ok(data),
            Reply::NetworkDown => Err(DashboardError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
            Reply::Failure => Err(DashboardError::backend_failure("Backend reported failure")),
        }
    }

    async fn feed_fish(&self) -> Result<()> {
        self.feed_calls.fetch_add(1, Ordering::SeqCst);
        if self.command_ok {
            Ok(())
        } else {
            Err(DashboardError::backend_failure("Motor not initialized"))
        }
    }

    async fn set_auto_mode(&self, enabled: bool) -> Result<()> {
        self.auto_mode_calls.lock().unwrap().push(enabled);
        if self.command_ok {
            Ok(())
        } else {
            Err(DashboardError::http_status(500))
        }
    }
}
