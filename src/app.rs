/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config 読み込み → 依存生成 (AppState) → Router 組み立て
 * - Middleware の適用 (middleware::apply が順序を持つ)
 * - axum::serve() で起動、Ctrl-C で graceful shutdown
 */
use std::{panic, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, ConfigError};
use crate::services::access::{AccessRules, SupplementalRoles};
use crate::services::auth::{build_login_service, build_token_service};
use crate::services::users::{InMemoryUserDirectory, UserDirectory};
use crate::state::AppState;
use crate::{api, middleware};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,guarded_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook() {
    let default_hook = panic::take_hook();

    // Handler panics are answered with a 500 envelope by the http guards; the hook only
    // makes sure they show up in the structured log as well.
    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");
        default_hook(info);
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    init_panic_hook();

    let config = Config::from_env().context("failed to load configuration")?;
    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let users: Arc<dyn UserDirectory> = Arc::new(InMemoryUserDirectory::seeded());
    let state = build_state(&config, users)?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Build process-level services and inject them into the shared application state.
pub fn build_state(config: &Config, users: Arc<dyn UserDirectory>) -> Result<AppState, ConfigError> {
    let tokens = build_token_service(config)?;
    let login = build_login_service(users.clone());
    let access = Arc::new(AccessRules::from_settings(&config.security)?);
    let supplemental = Arc::new(SupplementalRoles::from_settings(&config.security)?);

    Ok(AppState::new(tokens, users, login, access, supplemental))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    middleware::apply(api::routes(), state, &config.http)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
