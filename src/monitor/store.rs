//! Shared owner of the dashboard state.

use crate::monitor::data::DashboardState;
use std::sync::Arc;
use tokio::sync::watch;

/// Single owner of [`DashboardState`].
///
/// Every mutation goes through [`StateStore::update`], which also wakes all
/// subscribers. Cloning the store is cheap and shares the same state.
#[derive(Debug, Clone)]
pub struct StateStore {
    tx: Arc<watch::Sender<DashboardState>>,
}

impl StateStore {
    pub fn new(initial: DashboardState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> DashboardState {
        self.tx.borrow().clone()
    }

    /// Read the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&DashboardState) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Mutate the state and notify subscribers.
    pub fn update<R>(&self, f: impl FnOnce(&mut DashboardState) -> R) -> R {
        let mut result = None;
        self.tx.send_modify(|state| result = Some(f(state)));
        match result {
            Some(result) => result,
            None => unreachable!("send_modify runs its closure exactly once"),
        }
    }

    /// Receiver that observes every subsequent update.
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.tx.subscribe()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(DashboardState::default())
    }
}
