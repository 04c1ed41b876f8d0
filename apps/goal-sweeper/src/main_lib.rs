use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use bookshelf_core::goals::{GoalProgressService, GoalProgressServiceTrait};
use bookshelf_core::utils::SystemClock;
use bookshelf_storage_sqlite::{db, goals::GoalRepository};

use crate::config::Config;

pub struct AppState {
    pub goal_progress_service: Arc<dyn GoalProgressServiceTrait>,
    pub db_path: String,
}

pub fn init_tracing() {
    let log_format = std::env::var("BKS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // `init` also installs the `log` bridge, so records from the library crates land here.
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    // Keep DATABASE_URL aligned with BKS_DB_PATH so the storage layer opens the same file
    std::env::set_var("DATABASE_URL", &config.db_path);
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone())?;

    let goal_repository = Arc::new(GoalRepository::new(pool.clone(), writer));
    let goal_progress_service: Arc<dyn GoalProgressServiceTrait> =
        Arc::new(GoalProgressService::new(
            goal_repository,
            Arc::new(SystemClock),
            config.goal_progress(),
        ));

    tracing::info!(
        "Goal progress service ready (policy {:?}, unit-of-work timeout {:?})",
        config.completed_goal_policy,
        config.unit_of_work_timeout
    );

    Ok(Arc::new(AppState {
        goal_progress_service,
        db_path,
    }))
}
