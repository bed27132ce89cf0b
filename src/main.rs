mod cache;
mod config;
mod engine;
mod evaluation;
mod events;
mod routes;
mod sources;
mod state;

use std::sync::Arc;

use redis::aio::ConnectionManager;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();

    let cache = cache::RedisStore::connect(&config.redis_url)
        .await
        .expect("Error connecting to Redis");
    info!("connected to Redis");

    let sources = sources::HttpSources::new(
        config.flag_service_url.clone(),
        config.targeting_service_url.clone(),
        config.service_api_key.clone(),
    );

    let engine = engine::Engine::new(Arc::new(sources), Arc::new(cache));

    // The audit sink shares the Redis deployment; without a configured
    // queue the emitter only logs
    let sink: Option<Arc<dyn events::EventSink>> = match &config.audit_queue {
        Some(queue) => {
            let client = redis::Client::open(config.redis_url.as_str())
                .expect("Error opening Redis client for the audit queue");
            let connection = ConnectionManager::new(client)
                .await
                .expect("Error connecting to Redis for the audit queue");
            info!(queue = %queue, "audit events will be enqueued");
            Some(Arc::new(events::RedisQueueSink::new(
                connection,
                queue.clone(),
            )))
        }
        None => {
            info!("AUDIT_QUEUE not set, audit events will only be logged");
            None
        }
    };
    let emitter = events::AuditEmitter::spawn(sink);

    let state = state::AppState { engine, emitter };

    let app = routes::routes().with_state(state);

    let listener = tokio::net::TcpListener::bind(config.addr())
        .await
        .expect("Error binding listener");

    info!("evaluation service listening at http://{}", config.addr());

    axum::serve(listener, app).await.unwrap();
}
