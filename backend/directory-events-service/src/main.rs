use actix_web::{middleware, web, App, HttpServer};
use directory_events_service::{
    handlers::{
        notifications::register_routes as register_notifications,
        subscriptions::register_routes as register_subscriptions,
    },
    metrics, MembershipDiffEngine, NotificationDispatcher, Settings, SubscriptionManager,
};
use graph_directory::{DirectoryClient, GraphClient, GraphClientConfig};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting directory events service");

    let settings = Settings::from_env().map_err(|e| {
        io::Error::new(io::ErrorKind::Other, format!("Configuration error: {e}"))
    })?;

    let client: Arc<dyn DirectoryClient> = Arc::new(
        GraphClient::new(GraphClientConfig {
            tenant_id: settings.graph.tenant_id.clone(),
            client_id: settings.graph.client_id.clone(),
            client_secret: settings.graph.client_secret.clone(),
        })
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Graph client error: {e}")))?,
    );

    let subscription_manager = Arc::new(SubscriptionManager::new(
        client.clone(),
        settings.event_grid.clone(),
        &settings.subscription,
    ));

    let diff_engine = MembershipDiffEngine::new(
        client.clone(),
        Duration::from_secs(settings.subscription.settle_interval_secs),
    );

    let dispatcher = Arc::new(NotificationDispatcher::new(
        client,
        diff_engine,
        subscription_manager.clone(),
        settings.subscription.client_state.clone(),
    ));

    let addr = format!("0.0.0.0:{}", settings.app.port);
    tracing::info!("Starting HTTP server on {}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(dispatcher.clone()))
            .app_data(web::Data::new(subscription_manager.clone()))
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(|cfg| {
                register_notifications(cfg);
                register_subscriptions(cfg);
            })
    })
    .bind(&addr)?
    .run()
    .await
}
