// Connection handling module
// Serves a single accepted TCP connection on its own task

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Decrements the active connection counter when the connection task ends
struct ConnectionGuard(Arc<AppState>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.active_connections.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Claim a connection slot. Returns `None` when `max_connections` is reached.
fn try_acquire(state: &Arc<AppState>) -> Option<ConnectionGuard> {
    // Increment first, then check, so two accepts can't both take the last slot
    let prev_count = state.active_connections.fetch_add(1, Ordering::SeqCst);
    let guard = ConnectionGuard(Arc::clone(state));

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            return None;
        }
    }
    Some(guard)
}

/// Accept and serve a connection, checking the connection limit first.
///
/// The connection is registered with `graceful` so shutdown can wait for
/// in-flight requests to finish.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<AppState>,
    graceful: &GracefulShutdown,
) {
    let Some(guard) = try_acquire(state) else {
        drop(stream);
        return;
    };

    let perf = &state.config.performance;
    let mut builder = http1::Builder::new();
    builder.keep_alive(perf.keep_alive);
    if perf.idle_timeout > 0 {
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(Duration::from_secs(perf.idle_timeout));
    }

    let svc_state = Arc::clone(state);
    let conn = builder.serve_connection(
        TokioIo::new(stream),
        service_fn(move |req| handler::handle_request(req, Arc::clone(&svc_state), peer_addr)),
    );
    let conn = graceful.watch(conn);

    tokio::spawn(async move {
        let _guard = guard;
        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }
    });
}
