use actix_web::{web, HttpResponse};

use crate::client::NodeClient;
use crate::metrics::{render, CONTENT_TYPE};
use crate::state::AppState;

/// GET /health - Liveness of the exporter itself; never touches the node.
pub async fn health<C: NodeClient + 'static>(state: web::Data<AppState<C>>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "goat-exporter",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSeconds": state.started_at.elapsed().as_secs(),
    }))
}

/// GET /metrics - Scrape the node and serve the result.
///
/// Partial RPC failure still answers 200 with whatever samples succeeded.
pub async fn metrics<C: NodeClient + 'static>(state: web::Data<AppState<C>>) -> HttpResponse {
    let collector = &state.collector;
    let samples = collector.collect().await;

    match render(collector.describe(), &samples) {
        Ok(body) => HttpResponse::Ok().content_type(CONTENT_TYPE).body(body),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            HttpResponse::InternalServerError().body("Failed to encode metrics")
        }
    }
}

pub fn configure<C: NodeClient + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::<C>))
        .route("/metrics", web::get().to(metrics::<C>));
}
