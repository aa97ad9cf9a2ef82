// src/main.rs
use std::env;
use dotenvy::dotenv;
use tracing::info;
use spending_forecast_tracker::{backend, cli, config, database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    config::init_tracing();

    let config = config::AppConfig::from_env()?;
    let pool = database::db::connection::get_db_pool(&config).await?;
    database::db::migrate::run_migrations(&pool).await?;

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("seed") => {
            info!("Seeding reference data...");
            cli::seed(&pool).await?;
        }
        Some("migrate") => {
            info!("Migrations applied");
        }
        Some("server") | None => {
            info!("Starting Backend Server...");
            backend::run_server(pool, &config).await?;
        }
        Some(other) => {
            anyhow::bail!("unknown command {other:?}; expected server, seed or migrate");
        }
    }
    Ok(())
}
