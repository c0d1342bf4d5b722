//! Server startup and lifecycle

use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing_subscriber::EnvFilter;

use crate::auth::jwt::JwtConfig;
use crate::auth::password::hash_password;
use crate::config::{AppConfig, LoggingConfig};
use crate::domain::{NewUser, UserRepositoryInterface};
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::database::repositories::UserRepository;
use crate::infrastructure::database::DatabaseConfig;
use crate::interfaces::http::router::create_router;

/// Initialize the tracing subscriber. `RUST_LOG` overrides the configured
/// level. Must be called once, before any log output.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Seed the configured admin account when the user table is empty, so a
/// fresh deployment has a login that can reach the admin endpoints.
async fn create_default_admin(
    db: &DatabaseConnection,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = UserRepository::new(db.clone());
    if !repo.find_all().await?.is_empty() {
        return Ok(());
    }

    let password_hash = hash_password(&config.admin.password)?;
    let admin = repo
        .create(NewUser {
            username: config.admin.username.clone(),
            password_hash,
            is_admin: true,
            age: 0,
            hobbies: Vec::new(),
        })
        .await?;
    tracing::info!(username = %admin.username, "created default admin account");
    Ok(())
}

/// Run the HTTP server until ctrl-c.
pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let db = crate::infrastructure::database::init_database(&DatabaseConfig {
        url: config.database.url.clone(),
    })
    .await?;

    Migrator::up(&db, None).await?;
    tracing::info!("database migrations applied");

    create_default_admin(&db, &config).await?;

    let jwt_config = JwtConfig {
        secret: config.security.jwt_secret.clone(),
        expiration_days: config.security.jwt_expiration_days,
        issuer: "user-api".to_string(),
    };
    let app = create_router(db, jwt_config);

    let address = config.server.address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("listening on http://{}", address);
    tracing::info!("swagger ui available at http://{}/docs", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectOptions, Database};

    #[tokio::test]
    async fn default_admin_is_seeded_once() {
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1);
        let db = Database::connect(opts).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let config = AppConfig::default();
        create_default_admin(&db, &config).await.unwrap();
        create_default_admin(&db, &config).await.unwrap();

        let repo = UserRepository::new(db);
        let users = repo.find_all().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "admin");
        assert!(users[0].is_admin);
    }

    #[tokio::test]
    async fn existing_users_suppress_seeding() {
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1);
        let db = Database::connect(opts).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let repo = UserRepository::new(db.clone());
        repo.create(NewUser {
            username: "existing".to_string(),
            password_hash: "hash".to_string(),
            is_admin: false,
            age: 20,
            hobbies: Vec::new(),
        })
        .await
        .unwrap();

        create_default_admin(&db, &AppConfig::default()).await.unwrap();

        let users = repo.find_all().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "existing");
    }
}
