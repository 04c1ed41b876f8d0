mod config;
mod main_lib;
mod scheduler;

use config::Config;
use main_lib::{build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();
    let state = build_state(&config).await?;

    let sweeper = scheduler::start_goal_sweep_scheduler(
        state.clone(),
        config.sweep_initial_delay,
        config.sweep_interval,
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested, stopping goal sweeper for {}", state.db_path);
    sweeper.abort();
    Ok(())
}
