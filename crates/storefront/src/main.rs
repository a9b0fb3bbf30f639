//! Harbor Storefront - account pages and shopping assistant.
//!
//! Serves the signed-in side of the storefront (port 3000 by default):
//! account overview and tabs, the admin status API and the assistant API.
//! Identity comes from the shared session written by the sign-in flow.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::borrow::Cow;

use harbor_storefront::config::StorefrontConfig;
use harbor_storefront::routes;
use harbor_storefront::state::AppState;
use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;
use tracing::{Level, Metadata};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "harbor_storefront=info,tower_http=debug";

#[tokio::main]
async fn main() {
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Sentry has to be up before the subscriber so the tracing layer binds to it.
    let sentry_guard = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: config.sentry_environment.clone().map(Cow::Owned),
                sample_rate: config.sentry_sample_rate,
                traces_sample_rate: config.sentry_traces_sample_rate,
                attach_stacktrace: true,
                ..Default::default()
            },
        ))
    });
    init_tracing();

    if sentry_guard.is_some() {
        tracing::info!("Sentry initialized");
    }
    if config.openai.is_none() {
        tracing::warn!("OPENAI_API_KEY not set, chat assistant disabled");
    }
    if config.admin_emails.is_empty() {
        tracing::info!("STOREFRONT_ADMIN_EMAILS is empty, nobody will pass the admin check");
    }

    let addr = config.socket_addr();
    let state = AppState::new(config).expect("Failed to initialize application state");

    let app = routes::app(state, MemoryStore::default())
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "storefront listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Install the global subscriber: `RUST_LOG` filter, fmt output and the
/// Sentry layer.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // Warnings and errors become Sentry events; info and debug ride along as
    // breadcrumbs.
    let sentry_layer =
        sentry_tracing::layer().event_filter(|metadata: &Metadata<'_>| match *metadata.level() {
            Level::ERROR | Level::WARN => EventFilter::Event,
            Level::INFO | Level::DEBUG => EventFilter::Breadcrumb,
            _ => EventFilter::Ignore,
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .init();
}

/// Resolve on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.expect("Failed to install Ctrl+C handler"),
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
