// Server loop module
// Accepts connections until the shutdown future resolves, then drains

use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// How long in-flight connections get to finish after shutdown is requested
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Run the accept loop on `listener` until `shutdown` completes.
///
/// Accept errors are logged and the loop keeps going. After shutdown the
/// listener is closed and open connections are drained for up to
/// [`DRAIN_TIMEOUT`].
pub async fn run<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: Future<Output = ()>,
{
    let graceful = GracefulShutdown::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &graceful);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }
            () = &mut shutdown => break,
        }
    }

    drop(listener);
    logger::log_shutdown(state.active_connections.load(Ordering::SeqCst));

    if tokio::time::timeout(DRAIN_TIMEOUT, graceful.shutdown()).await.is_ok() {
        logger::log_info("All connections closed");
    } else {
        logger::log_warning(&format!(
            "Timed out after {}s waiting for connections to close",
            DRAIN_TIMEOUT.as_secs()
        ));
    }
}
