use std::net::ToSocketAddrs;
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};

use crate::client::NodeClient;
use crate::collector::Collector;
use crate::error::ExporterError;
use crate::routes;
use crate::state::AppState;

/// Seconds in-flight scrapes get to finish after SIGINT/SIGTERM.
pub const SHUTDOWN_GRACE_SECS: u64 = 5;

/// Serve `/metrics` and `/health` on `addr` until a shutdown signal arrives.
///
/// The collector is closed exactly once before returning, whether the
/// server stopped cleanly, failed to bind, or failed while running.
pub async fn serve<C, A>(collector: Arc<Collector<C>>, addr: A) -> Result<(), ExporterError>
where
    C: NodeClient + 'static,
    A: ToSocketAddrs,
{
    let state = web::Data::new(AppState::new(Arc::clone(&collector)));

    // actix handles SIGINT/SIGTERM itself and drains workers within the grace period.
    let bound = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(routes::configure::<C>)
    })
    .bind(addr);

    let served = match bound {
        Ok(server) => server
            .shutdown_timeout(SHUTDOWN_GRACE_SECS)
            .run()
            .await
            .map_err(|e| ExporterError::Shutdown(format!("http server: {e}"))),
        Err(e) => Err(ExporterError::Server(e)),
    };

    tracing::info!("shutting down goat-exporter");
    collector.close();

    served
}
