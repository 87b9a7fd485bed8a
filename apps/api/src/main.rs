use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::services::{BookingEvent, BroadcastEventSink, SchedulingEngine};
use barber_cell::services::InMemoryScheduleCatalog;
use shared_config::AppConfig;
use shared_utils::clock::SystemClock;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting barbershop scheduling API");

    let config = Arc::new(AppConfig::from_env());

    let catalog = match &config.catalog_path {
        Some(path) => InMemoryScheduleCatalog::load_from_path(path)
            .await
            .with_context(|| format!("failed to load provider catalog from {}", path))?,
        None => {
            warn!("CATALOG_PATH not set, starting with an empty provider catalog");
            InMemoryScheduleCatalog::new()
        }
    };

    let catalog = Arc::new(catalog);
    let events = Arc::new(BroadcastEventSink::default());
    spawn_event_logger(&events);

    let engine = Arc::new(SchedulingEngine::new(
        catalog.clone(),
        Arc::new(SystemClock::new(config.scheduling.utc_offset_minutes)),
        events,
        config.scheduling.clone(),
    ));

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(config.clone(), engine, catalog)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// Logs every booking event. Stands in for notification delivery.
fn spawn_event_logger(events: &BroadcastEventSink) {
    let mut receiver = events.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let appointment = event.appointment();
                    match &event {
                        BookingEvent::Created { .. } => info!(
                            "Booking created: {} with provider {} on {} at {}",
                            appointment.id, appointment.provider_id, appointment.date, appointment.start
                        ),
                        BookingEvent::StatusChanged { old_status, new_status, actor, .. } => info!(
                            "Booking {} moved {} -> {} by {}",
                            appointment.id, old_status, new_status, actor.role
                        ),
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Event logger lagged, skipped {} events", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
