//! Aquarium Dashboard binary.
//!
//! Runs the polling controller behind a local web dashboard, or performs a
//! single status read or operator command against the aquarium controller.

use anyhow::{bail, Context};
use aquarium_dashboard::{
    backend::config::DEFAULT_BACKEND_URL, start_web_server, AppState, BackendConfig,
    DashboardState, HttpBackend, PollController, PollOutcome, PollerConfig, WebConfig,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_WEB_PORT,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "aquarium_dashboard")]
#[command(about = "🐟 Aquarium Dashboard - monitoring and feeder control")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Polls an aquarium controller for pH and fish detection and serves a live dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Base URL of the aquarium controller
    #[arg(long, env = "AQUARIUM_BACKEND_URL", default_value = DEFAULT_BACKEND_URL)]
    backend_url: String,

    /// Interval between scheduled polls in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    interval: u64,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = 10_000)]
    timeout: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the controller and serve the dashboard (default)
    Serve(ServeArgs),

    /// Read the controller status once and exit
    Status(StatusArgs),

    /// Dispense food now, regardless of fish detection
    Feed,

    /// Turn automatic feeding on or off
    AutoMode(AutoModeArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Web server bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Web server port
    #[arg(short, long, default_value_t = DEFAULT_WEB_PORT)]
    port: u16,

    /// Directory with a custom index.html and assets
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,

    /// Maximum WebSocket connections
    #[arg(long, default_value_t = 100)]
    max_connections: usize,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_WEB_PORT,
            static_dir: None,
            no_cors: false,
            max_connections: 100,
        }
    }
}

#[derive(Args)]
struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Args)]
struct AutoModeArgs {
    #[arg(value_enum)]
    state: Switch,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    match &cli.command {
        Some(Commands::Serve(args)) => serve_command(&cli, args).await,
        Some(Commands::Status(args)) => status_command(&cli, args).await,
        Some(Commands::Feed) => feed_command(&cli).await,
        Some(Commands::AutoMode(args)) => auto_mode_command(&cli, args).await,
        None => serve_command(&cli, &ServeArgs::default()).await,
    }
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;

    Ok(())
}

fn backend_config(cli: &Cli) -> BackendConfig {
    BackendConfig::new(&cli.backend_url).with_request_timeout_ms(cli.timeout)
}

/// Controller for one-shot commands: no automatic retries, the process exits
/// before they would fire.
fn one_shot_controller(cli: &Cli) -> anyhow::Result<PollController> {
    let backend = HttpBackend::new(backend_config(cli)).context("failed to build HTTP client")?;
    let config = PollerConfig::default().with_max_retries(0);
    Ok(PollController::new(Arc::new(backend), config))
}

async fn serve_command(cli: &Cli, args: &ServeArgs) -> anyhow::Result<()> {
    println!("🐟 Aquarium Dashboard v{}", env!("CARGO_PKG_VERSION"));
    println!("   Backend: {}", cli.backend_url);
    println!();

    let backend_config = backend_config(cli);
    let video_feed_url = backend_config.video_feed_url();
    let backend = HttpBackend::new(backend_config).context("failed to build HTTP client")?;

    let poller_config = PollerConfig::default().with_poll_interval_ms(cli.interval);
    let controller = PollController::new(Arc::new(backend), poller_config);

    let web_config = WebConfig::new(&args.host, args.port)
        .with_static_dir(args.static_dir.clone())
        .with_cors(!args.no_cors)
        .with_max_websocket_connections(args.max_connections);

    info!("Web server configuration:");
    info!("  - Bind address: {}:{}", args.host, args.port);
    info!("  - CORS enabled: {}", !args.no_cors);
    info!("  - Max WebSocket connections: {}", args.max_connections);
    info!("  - Poll interval: {}ms", cli.interval);

    controller.start()?;
    let state = AppState::new(controller.clone(), web_config, video_feed_url);
    let result = start_web_server(state).await;
    controller.stop();

    result.context("dashboard server failed")
}

async fn status_command(cli: &Cli, args: &StatusArgs) -> anyhow::Result<()> {
    let controller = one_shot_controller(cli)?;
    let outcome = controller.poll().await;
    let state = controller.store().snapshot();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
        OutputFormat::Pretty => print_pretty_state(&state),
    }

    if outcome != PollOutcome::Updated {
        bail!(
            "{}",
            state
                .last_error
                .unwrap_or_else(|| "backend unavailable".to_string())
        );
    }
    Ok(())
}

async fn feed_command(cli: &Cli) -> anyhow::Result<()> {
    let controller = one_shot_controller(cli)?;
    controller.feed().await.context("manual feed failed")?;

    let state = controller.store().snapshot();
    println!("🍤 Feed dispensed");
    if let Some(count) = state.sensors.feed_count {
        println!("   Manual feeds so far: {}", count);
    }
    Ok(())
}

async fn auto_mode_command(cli: &Cli, args: &AutoModeArgs) -> anyhow::Result<()> {
    let controller = one_shot_controller(cli)?;
    let enabled = args.state == Switch::On;
    controller
        .set_auto_mode(enabled)
        .await
        .context("failed to update auto mode")?;

    println!("⚙️  Auto mode {}", if enabled { "ON" } else { "OFF" });
    Ok(())
}

fn print_pretty_state(state: &DashboardState) {
    let sensors = &state.sensors;

    println!("🐟 Aquarium Status");
    println!("==========================================");
    println!();

    if state.connection.is_connected {
        println!("📶 Connection: Connected");
    } else {
        println!("📴 Connection: Disconnected");
    }
    if let Some(error) = &state.last_error {
        println!("   ⚠️  {}", error);
    }
    println!();

    println!("💧 Water:");
    println!("  pH: {:.1}", sensors.ph);
    if let Some(voltage) = sensors.ph_voltage {
        println!("  Probe voltage: {:.2}V", voltage);
    }
    match sensors.ph_sensor_initialized {
        Some(true) => println!("  Sensor: Active"),
        Some(false) => println!("  Sensor: Offline"),
        None => {}
    }
    println!();

    println!("🐠 Fish: {}", if sensors.fish_detected { "Detected" } else { "Not Detected" });
    println!();

    println!("⚙️  Feeder:");
    println!(
        "  Motor: {}",
        if sensors.motor_initialized { "Ready" } else { "Not initialized" }
    );
    if let Some(count) = sensors.feed_count {
        println!("  Manual feeds: {}", count);
    }
    if let Some(time) = &sensors.last_feed_time {
        println!("  Last manual feed: {}", time);
    }
    if let Some(count) = sensors.auto_feed_count {
        println!("  Auto feeds: {}", count);
    }
    if let Some(time) = &sensors.auto_last_feed_time {
        println!("  Last auto feed: {}", time);
    }
}
