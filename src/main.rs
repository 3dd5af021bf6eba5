use prompt_service::api;
use prompt_service::application::TemplateService;
use prompt_service::config::{Config, StorageBackend};
use prompt_service::domain::repositories::TemplateRepository;
use prompt_service::infrastructure::repositories::{
    InMemoryTemplateRepository, PostgresTemplateRepository,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("prompt_service=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    let repo: Arc<dyn TemplateRepository> = match config.storage {
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .expect("DATABASE_URL is validated by Config");

            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connected successfully");

            Arc::new(PostgresTemplateRepository::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory template store, data is lost on restart");
            Arc::new(InMemoryTemplateRepository::new())
        }
    };

    let app = api::router(TemplateService::new(repo));

    // Start server
    let addr = config.socket_addr().expect("Invalid listen address");
    tracing::info!("Prompt service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
