// Connection handling module
// Accepts a single TCP connection and serves it with hyper

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::sync::Notify;

use crate::config;
use crate::handler;
use crate::logger;

/// Count of connections being served, with a wakeup when it drops to zero
#[derive(Default)]
pub struct ActiveConnections {
    count: AtomicUsize,
    idle: Notify,
}

impl ActiveConnections {
    pub const fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
            idle: Notify::const_new(),
        }
    }

    /// Reserve a slot, or return the count seen if `max` is already reached.
    ///
    /// Increments first, then checks, so two racing accepts cannot both
    /// slip under the limit.
    fn try_acquire(&self, max: Option<u64>) -> Result<(), usize> {
        let prev_count = self.count.fetch_add(1, Ordering::SeqCst);
        if let Some(max_conn) = max {
            if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
                self.release();
                return Err(prev_count);
            }
        }
        Ok(())
    }

    fn release(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    pub fn current(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Resolve once no connection is being served
    pub async fn wait_idle(&self) {
        loop {
            // Registered before the check so a release in between still wakes us
            let idle = self.idle.notified();
            if self.current() == 0 {
                return;
            }
            idle.await;
        }
    }
}

/// Accept and process a connection, checking limits and logging.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `active` - Connections currently being served
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<config::AppState>,
    active: &Arc<ActiveConnections>,
) {
    let max_connections = state.config.performance.max_connections;
    if let Err(prev_count) = active.try_acquire(max_connections) {
        logger::log_warning(&format!(
            "Max connections reached: {prev_count}/{}. Connection from {peer_addr} rejected.",
            max_connections.unwrap_or_default()
        ));
        drop(stream);
        return;
    }

    if state.config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(stream, peer_addr, Arc::clone(state), Arc::clone(active));
}

/// Serve a single connection in a spawned local task.
///
/// Keep-alive follows `performance.keep_alive_timeout`; the whole connection
/// is bounded by `max(read_timeout, write_timeout)`. The slot is released
/// when the task ends, whatever the outcome.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: Arc<config::AppState>,
    active: Arc<ActiveConnections>,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let timeout_duration = connection_timeout(&state.config);

        let mut builder = http1::Builder::new();
        builder.keep_alive(performance.keep_alive_timeout > 0);

        let service_state = Arc::clone(&state);
        let service = service_fn(move |req| {
            handler::handle_request(req, Arc::clone(&service_state), peer_addr)
        });
        let conn = builder.serve_connection(io, service);

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }

        active.release();
    });
}

/// Upper bound on how long one connection may be served
pub fn connection_timeout(cfg: &config::Config) -> std::time::Duration {
    let performance = &cfg.performance;
    std::time::Duration::from_secs(std::cmp::max(
        performance.read_timeout,
        performance.write_timeout,
    ))
}
