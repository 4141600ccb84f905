//! # Pacer-Oxide entry point
//!
//! Loads configuration, opens the counter database and reports today's
//! admission state, then dry-runs the behavior engine against a recording
//! dispatcher.
//!
//! ## Environment variables
//! - `PACER_CONFIG`: TOML configuration file (default: `pacer.toml`, optional)
//! - `PACER_*`: field overrides, see `Config::apply_env`
//! - `RUST_LOG`: log filter (default: `info`)

use pacer_oxide::{
    config::Config,
    input::RecordingDispatcher,
    limits::{AdmissionController, QuotaKind, SqliteCounterStore},
    stealth::{BehaviorSimulator, BehaviorSimulatorImpl, KeystrokeScheduler, PathGenerator, Point2D},
    timing::DelayPolicy,
};

use anyhow::Context;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Respect RUST_LOG, default to info
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Pacer-Oxide v{}", pacer_oxide::VERSION);

    let config_path = std::env::var("PACER_CONFIG").unwrap_or_else(|_| "pacer.toml".to_string());
    let config = Config::load(Some(&config_path)).context("loading configuration")?;
    info!(
        "Configuration loaded: daily connections={}, daily messages={}, business hours only={}",
        config.limits.daily_connections,
        config.limits.daily_messages,
        config.stealth.business_hours_only
    );

    let store = SqliteCounterStore::open(&config.database.path)
        .with_context(|| format!("opening counter database {}", config.database.path))?;
    info!("Counter database: {}", config.database.path);

    let controller = AdmissionController::new(
        Arc::new(store),
        config.quota_limits(),
        DelayPolicy::new(config.delay_profile())?,
    )?
    .with_business_hours(config.stealth.business_hours_only)
    .with_window(config.business_window());

    let status = controller.status().await?;
    info!("Quota status: {}", status.to_json()?);

    for kind in QuotaKind::ALL {
        let allowed = controller.can_perform(kind).await?;
        let remaining = controller.remaining_quota(kind).await?;
        info!("{}: allowed={}, remaining={}", kind, allowed, remaining);
    }
    info!("Next allowed window: {}", controller.next_allowed_window()?);
    info!("Cooldown: {:?}", controller.cooldown().await?);

    // Dry run: plans only, nothing is dispatched to a real browser
    let mut paths = PathGenerator::new(config.motion())?;
    let path = paths.generate(Point2D::new(120.0, 80.0), Point2D::new(860.0, 540.0));
    info!(
        "Motion path: {} points, dwell {:?}",
        path.len(),
        path.total_dwell()
    );

    let mut keys = KeystrokeScheduler::new(config.delay_profile())?;
    let plan = keys.plan("Thanks for connecting!");
    info!(
        "Typing plan: {} keystrokes, correction={}, duration {:?}",
        plan.len(),
        plan.has_correction(),
        plan.total_duration()
    );

    let dispatcher = Arc::new(RecordingDispatcher::new());
    let simulator = BehaviorSimulatorImpl::new(dispatcher.clone(), config.motion(), config.delay_profile())?
        .with_random_scrolling(config.stealth.random_scrolling);

    let start = tokio::time::Instant::now();
    let at = simulator
        .click(Point2D::new(0.0, 0.0), Point2D::new(400.0, 300.0))
        .await?;
    simulator.type_text("hello").await?;
    debug!("Recorded events: {:?}", dispatcher.events().await);
    info!(
        "Dry run finished at ({:.0}, {:.0}) with {} events in {:?}",
        at.x,
        at.y,
        dispatcher.events().await.len(),
        start.elapsed()
    );

    Ok(())
}
