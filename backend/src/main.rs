use std::net::SocketAddr;
use std::sync::Arc;

use rental_marketplace::auth::AuthSettings;
use rental_marketplace::config::AppConfig;
use rental_marketplace::db::{
    MarketplaceRepository, MemoryRepository, PgRepository, PostgresConfig,
};
use rental_marketplace::email::HttpMailer;
use rental_marketplace::geocoding::GoogleGeocoder;
use rental_marketplace::routes::create_router;
use rental_marketplace::state::AppState;
use rental_marketplace::storage::LocalDiskStorage;
use tower_http::services::ServeDir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = AppConfig::load()?;
    log::info!(
        "Loaded config: port {}, uploads in {}",
        config.port,
        config.upload_dir
    );

    let repository: Arc<dyn MarketplaceRepository> = match config.database_url() {
        Some(url) => {
            let pg_config = PostgresConfig {
                max_pool_size: config.db_pool_max,
                ..PostgresConfig::new(url)
            };
            let repo = PgRepository::connect(&pg_config)?;
            repo.run_migrations()?;
            Arc::new(repo)
        }
        None => {
            log::warn!("DATABASE_URL is not set; listings are kept in memory only");
            Arc::new(MemoryRepository::new())
        }
    };
    let database_ok = repository.health_check().await?;
    log::info!("Database health check: {}", database_ok);

    let auth = AuthSettings {
        jwt_secret: config.jwt_secret.clone(),
        owner_open_id: config.owner_open_id().map(str::to_string),
    };
    let storage = Arc::new(LocalDiskStorage::new(
        &config.upload_dir,
        config.public_upload_url.clone(),
    ));
    let mut state = AppState::new(repository, auth, storage);

    if config.geocoding_enabled() {
        let geocoder = GoogleGeocoder::new(
            config.geocoding_base_url.clone(),
            config.google_maps_api_key().map(str::to_string),
            config.http_timeout(),
        )?;
        state = state.with_geocoder(Arc::new(geocoder));
    } else {
        log::warn!("GOOGLE_MAPS_API_KEY is not set; addresses will not be geocoded");
    }

    match config.email_service() {
        Some((url, key)) => {
            let mailer = HttpMailer::new(url, key, config.http_timeout())?;
            state = state.with_mailer(Arc::new(mailer));
        }
        None => {
            log::warn!("EMAIL_API_URL or EMAIL_API_KEY is not set; inquiry emails are disabled")
        }
    }

    let mut app = create_router(state);
    if config.public_upload_url.starts_with('/') {
        app = app.nest_service(&config.public_upload_url, ServeDir::new(&config.upload_dir));
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    log::info!("Starting server on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app.into_make_service()).await?;

    Ok(())
}
