use dotenvy::dotenv;
use spending_forecast_tracker::config::AppConfig;
use spending_forecast_tracker::database::db::connection::get_db_pool;
use spending_forecast_tracker::database::db::{migrate, queries};
use spending_forecast_tracker::error::AppError;
use spending_forecast_tracker::forecast::{ForecastId, ForecastInput};

use rust_decimal::Decimal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    /* ==========Testing========== */
    let config = AppConfig::from_env()?;
    let pool = get_db_pool(&config).await?;

    migrate::run_migrations(&pool).await?;
    println!("Migrations ran successfully!");

    // ----------------------------------------------------
    // TEST：REFERENCE DATA
    // ----------------------------------------------------
    println!("\n--- Testing: create_department / create_project ---");
    let suffix = chrono::Utc::now().timestamp_millis();
    let department_id = queries::create_department(&pool, "Smoke Department", &format!("SMK{suffix}")).await?;
    let project_id = queries::create_project(&pool, "Smoke Project", &format!("SMK-{suffix}"), department_id).await?;
    println!("   > department {}, project {}", department_id, project_id);
    assert!(department_id > 0 && project_id > 0, "Failed to create reference data");

    // ----------------------------------------------------
    // TEST：CREATE FORECAST
    // ----------------------------------------------------
    println!("\n--- Testing: create_forecast ---");
    let input = ForecastInput {
        department_id,
        project_id,
        year: Some(2026),
        project_name: Some("Smoke Project".to_string()),
        profit_center: Some("PC-SMOKE".to_string()),
        wbs: Some("WBS-SMOKE".to_string()),
        account: Some("5000".to_string()),
        ..Default::default()
    }
    .with_amounts([100, 150, 200, 180, 160, 140, 120, 130, 140, 150, 160, 170]);

    let created = queries::create_forecast(&pool, &input, 2026, "smoke-user", false).await?;
    println!("   > Forecast created: {} total {}", created.id, created.total());
    assert_eq!(created.total(), Decimal::from(1800), "Yearly total mismatch");

    let duplicate = queries::create_forecast(&pool, &input, 2026, "smoke-user", false).await;
    assert!(matches!(duplicate, Err(AppError::Duplicate(_))), "Duplicate create was not rejected");

    // ----------------------------------------------------
    // TEST：SNAPSHOT + UPDATE
    // ----------------------------------------------------
    println!("\n--- Testing: create_snapshot ---");
    let id = ForecastId::new(project_id, 2026);
    let snapshot = queries::create_snapshot(&pool, id, "smoke-user").await?;
    println!("   > Snapshot {} in batch {}", snapshot.id, snapshot.batch_id);

    println!("\n--- Testing: update_forecast ---");
    let mut changed = input.clone();
    changed.jan = Some(Decimal::from(500_000));
    let updated = queries::update_forecast(&pool, id, &changed).await?;
    println!("   > Forecast updated, total {}", updated.total());

    let frozen = queries::get_snapshot(&pool, snapshot.id).await?;
    assert_eq!(frozen.amounts, snapshot.amounts, "Snapshot changed after forecast update");

    // ----------------------------------------------------
    // TEST：APPROVE
    // ----------------------------------------------------
    println!("\n--- Testing: approve_snapshot ---");
    let approved = queries::approve_snapshot(&pool, snapshot.id, "smoke-approver").await?;
    assert!(approved.is_approved, "Snapshot not approved");
    println!("   > Approved by {:?} at {:?}", approved.approved_by, approved.approved_at);

    // ----------------------------------------------------
    // TEST：CLEANUP
    // ----------------------------------------------------
    println!("\n--- Testing: delete_snapshot / delete_forecast ---");
    assert!(queries::delete_snapshot(&pool, snapshot.id).await?, "Failed to delete snapshot");
    assert!(queries::delete_forecast(&pool, id).await?, "Failed to delete forecast");

    println!("\n--- All tests passed!---");
    Ok(())
}


/* commands for manipulate database */
//cargo sqlx migrate run
//cargo sqlx database reset
