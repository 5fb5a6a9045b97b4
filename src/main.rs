use costbook::config::{database, units};
use costbook::core::{product, unit};
use costbook::errors::Result;
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 4. Seed the unit table from config.toml
    let config = units::load_default_config()
        .inspect_err(|e| error!("Failed to load unit configuration: {}", e))?;
    unit::seed_units(&db, &config.units)
        .await
        .inspect(|()| info!("Units seeded successfully."))
        .inspect_err(|e| error!("Failed to seed units: {}", e))?;

    // 5. Report the current product costs
    let products = product::get_products_with_cost(&db).await?;
    info!("Tracking {} products.", products.len());
    for entry in products {
        info!(
            "{}: cost {:.2}, charged {:.2}",
            entry.product.name, entry.cost, entry.product.price
        );
    }

    Ok(())
}
