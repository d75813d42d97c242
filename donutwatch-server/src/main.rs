use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use donutwatch_core::auth;
use donutwatch_core::config::{DEFAULT_LOOKUP_BASE, DEFAULT_STATS_BASE};
use donutwatch_core::registry::PlayerSession;
use donutwatch_core::sensors;
use donutwatch_core::{AuthScheme, Config, Credentials, DefaultHttpClient, DonutClient, Error,
                      PollEvent, SessionRegistry};

#[derive(Parser, Debug, Clone)]
#[command(name = "donutwatch")]
#[command(author, version, about = "DonutWatch - DonutSMP player statistics poller")]
struct Args {
    /// Player username to track (repeat for multiple players)
    #[arg(long = "player", required = true)]
    players: Vec<String>,

    /// API key; falls back to the DONUT_API_KEY environment variable
    #[arg(long)]
    api_key: Option<String>,

    /// Seconds between poll cycles
    #[arg(long, default_value_t = 60)]
    interval_secs: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Auth scheme: "bearer", or the header name to carry the key
    #[arg(long, default_value = "x-api-key")]
    auth_scheme: String,

    /// Base URL of the lookup endpoint
    #[arg(long, default_value = DEFAULT_LOOKUP_BASE)]
    lookup_base: String,

    /// Base URL of the stats endpoint
    #[arg(long, default_value = DEFAULT_STATS_BASE)]
    stats_base: String,

    /// Check the credentials with one lookup call, then exit
    #[arg(long, default_value = "false")]
    validate: bool,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("donutwatch=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!("DonutWatch starting. players={:?}, interval={}s, validate={}",
          args.players, args.interval_secs, args.validate);

    let config = build_config(&args).context("invalid configuration")?;
    let api_key = args
        .api_key
        .clone()
        .or_else(|| std::env::var("DONUT_API_KEY").ok());

    if args.validate {
        run_validate(&args, config, api_key.as_deref()).await?;
    } else {
        run_poller(&args, config, api_key.as_deref()).await?;
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

fn build_config(args: &Args) -> Result<Config, Error> {
    let auth_scheme: AuthScheme = args.auth_scheme.parse()?;
    let mut config = Config::with_bases(&args.lookup_base, &args.stats_base)?;
    config.auth_scheme = auth_scheme;
    config.request_timeout = Duration::from_secs(args.timeout_secs);
    config.poll_interval = Duration::from_secs(args.interval_secs);
    config.validate()?;
    Ok(config)
}

/// One lookup per player, reporting whether the credentials work. Exits
/// nonzero if any player fails so scripts can gate on it.
async fn run_validate(args: &Args, config: Config, api_key: Option<&str>) -> anyhow::Result<()> {
    let http = Arc::new(DefaultHttpClient::new(config.request_timeout)?);
    let client = DonutClient::new(http, config);

    let mut failures = 0usize;
    for player in &args.players {
        let credentials = Credentials::new(player, api_key)?;
        match auth::validate(&client, &credentials).await {
            Ok(validated) => {
                info!("{}: credentials OK (player id {})", validated.title, validated.player_id);
            }
            Err(e) => {
                failures += 1;
                error!("Validation failed for '{player}': {e}");
            }
        }
    }
    if failures > 0 {
        anyhow::bail!("validation failed for {failures} player(s)");
    }
    Ok(())
}

async fn run_poller(args: &Args, config: Config, api_key: Option<&str>) -> anyhow::Result<()> {
    // 1) One registry per process; every session shares its connection pool.
    let registry = Arc::new(SessionRegistry::new(config)?);

    // 2) Start a polling session per player and log what it publishes.
    for player in &args.players {
        let credentials = Credentials::new(player, api_key)?;
        let session = registry.start_session(credentials)?;
        spawn_update_logger(player.clone(), session).await;
    }

    // 3) Poll until Ctrl-C, then stop every session gracefully.
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Ctrl-C detected; stopping {} session(s)...", registry.len());
    registry.stop_all().await;
    Ok(())
}

/// Subscribes to one session and logs every update or failure. Uses the
/// sensor layer for display so values come out under their catalog names.
async fn spawn_update_logger(player: String, session: Arc<PlayerSession>) {
    let coordinator = session.coordinator();
    let mut events = coordinator.subscribe(None).await;
    let sensors = sensors::build_sensors(&coordinator);
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                PollEvent::Updated(snapshot) => {
                    info!("'{player}' updated at {}:", snapshot.fetched_at);
                    for sensor in &sensors {
                        if let Some(value) = sensor.value() {
                            info!("  {} = {}", sensor.display_name(), value);
                        }
                    }
                }
                PollEvent::Failed(record) => {
                    warn!("'{player}' poll failed ({}): {}", record.kind, record.message);
                }
            }
        }
    });
}
