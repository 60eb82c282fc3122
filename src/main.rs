//! Plans the next action for a message given on the command line and
//! prints the result as JSON.
//!
//! ```text
//! thought-planner quero comprar um tênis
//! echo '{"message": "ok", "tenantId": "loja"}' | thought-planner --legacy
//! ```

use std::io::Read;
use std::sync::Arc;

use thought_planner::adapters::memory::{InMemoryPlanStore, StaticTenantDirectory};
use thought_planner::adapters::postgres::{
    self, PostgresPlanNodeRepository, PostgresPlanSessionRepository, PostgresTenantDirectory,
};
use thought_planner::application::{LegacyPlanRequest, PlanActionCommand, PlanActionHandler};
use thought_planner::config::AppConfig;
use thought_planner::domain::planning::ObservedState;
use thought_planner::ports::TenantDirectory;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    config.logging.init_tracing();

    let handler = build_handler(&config).await?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = if args.first().map(String::as_str) == Some("--legacy") {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        let request: LegacyPlanRequest = serde_json::from_str(&input)?;
        handler.handle_legacy(request).await?
    } else {
        let message = args.join(" ");
        handler
            .handle(PlanActionCommand::new(ObservedState::new(message)))
            .await?
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn build_handler(config: &AppConfig) -> Result<PlanActionHandler, Box<dyn std::error::Error>> {
    let handler = match &config.database {
        Some(database) => {
            let pool = postgres::connect(database).await?;
            let tenants: Arc<dyn TenantDirectory> = match config.tenancy.default_tenant {
                Some(_) => Arc::new(StaticTenantDirectory::new(config.tenancy.tenants())),
                None => Arc::new(PostgresTenantDirectory::new(pool.clone())),
            };
            PlanActionHandler::new(
                Arc::new(PostgresPlanSessionRepository::new(pool.clone())),
                Arc::new(PostgresPlanNodeRepository::new(pool)),
                tenants,
                config.planner.clone(),
            )
        }
        None => {
            tracing::info!("no database configured, using in-memory plan store");
            let store = Arc::new(InMemoryPlanStore::new());
            PlanActionHandler::new(
                store.clone(),
                store,
                Arc::new(StaticTenantDirectory::new(config.tenancy.tenants())),
                config.planner.clone(),
            )
        }
    };
    Ok(handler)
}
