use oasbind::{Application, ServerConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod health;
mod pets;

use health::HealthController;
use pets::{InMemoryPetRepository, PetController, PetRepository};

fn build_app(config: ServerConfig, repository: Arc<dyn PetRepository>) -> oasbind::Result<Application> {
    Application::builder()
        .config(config)
        .title("Pet Store")
        .version(env!("CARGO_PKG_VERSION"))
        .description("A small pet store exposing every binding feature")
        .controller(PetController::new(repository))
        .controller(HealthController::new())
        .build()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting pet store...");

    let config = ServerConfig::from_env()?;
    let repository: Arc<dyn PetRepository> = Arc::new(InMemoryPetRepository::new());

    build_app(config, repository)?.listen().await?;
    Ok(())
}
