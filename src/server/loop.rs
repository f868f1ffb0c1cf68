// Server loop module
// Accepts connections until shutdown is requested, then drains

use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::{accept_connection, connection_timeout, ActiveConnections};
use super::signal::SignalHandler;
use crate::config;
use crate::logger;

/// Accept loop for the mock server
///
/// Must run inside a `LocalSet`: connections are served with `spawn_local`.
/// Once `signals` requests shutdown the listener is closed and the loop waits
/// for connections already accepted to finish, bounded by the per-connection
/// timeout, before returning.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<config::AppState>,
    active_connections: Arc<ActiveConnections>,
    signals: Arc<SignalHandler>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        // Register before checking the flag so a concurrent request is not lost
        let shutdown = signals.shutdown.notified();
        if signals.is_shutdown_requested() {
            break;
        }

        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown => break,
        }
    }

    logger::log_shutdown_requested();
    drop(listener);
    logger::log_draining(active_connections.current());

    let grace = connection_timeout(&state.config);
    if tokio::time::timeout(grace, active_connections.wait_idle())
        .await
        .is_err()
    {
        logger::log_warning(&format!(
            "[Shutdown] {} connection(s) still open after {} seconds, abandoning",
            active_connections.current(),
            grace.as_secs()
        ));
    }
    logger::log_shutdown_complete();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppState, Config};
    use crate::server::create_reusable_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use std::time::Duration;
    use tokio::net::TcpStream;

    async fn raw_request(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_serves_projects_over_tcp_and_shuts_down() {
        let mut cfg = Config::load_from("does-not-exist/config").unwrap();
        cfg.logging.access_log = false;
        let state = Arc::new(AppState::new(&cfg));
        let counter = Arc::new(ActiveConnections::new());
        let signals = Arc::new(SignalHandler::new());

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let server = tokio::task::spawn_local(start_server_loop(
                    listener,
                    Arc::clone(&state),
                    Arc::clone(&counter),
                    Arc::clone(&signals),
                ));

                let list = raw_request(
                    addr,
                    "GET /projects HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
                )
                .await;
                assert!(list.starts_with("HTTP/1.1 200 OK\r\n"), "got: {list}");
                assert!(list.to_ascii_lowercase().contains("x-pagination-size: 5\r\n"));
                assert!(list.ends_with("\r\n\r\n[]"), "got: {list}");

                let options = raw_request(
                    addr,
                    "OPTIONS /projects/42 HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
                )
                .await;
                assert!(options.starts_with("HTTP/1.1 200 OK\r\n"));
                assert!(options.to_ascii_lowercase().contains("allow: options, get\r\n"));
                assert!(options.ends_with("\r\n\r\n"));

                let show = raw_request(
                    addr,
                    "GET /projects/42 HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
                )
                .await;
                assert!(show.starts_with("HTTP/1.1 200 OK\r\n"));
                assert!(show.to_ascii_lowercase().contains("content-length: 0\r\n"));
                assert!(show.ends_with("\r\n\r\n"));

                signals.request_shutdown();
                server.await.unwrap().unwrap();
            })
            .await;
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_in_flight_request() {
        let mut cfg = Config::load_from("does-not-exist/config").unwrap();
        cfg.logging.access_log = false;
        let state = Arc::new(AppState::new(&cfg));
        let active = Arc::new(ActiveConnections::new());
        let signals = Arc::new(SignalHandler::new());

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let client_active = Arc::clone(&active);
        let client_signals = Arc::clone(&signals);
        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream
                .write_all(b"GET /projects HTTP/1.1\r\nHost: localhost\r\n")
                .await
                .unwrap();
            while client_active.current() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }

            // Shutdown lands while the request is still half-sent
            client_signals.request_shutdown();
            tokio::time::sleep(Duration::from_millis(50)).await;

            stream.write_all(b"Connection: close\r\n\r\n").await.unwrap();
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf).await.unwrap();
            String::from_utf8(buf).unwrap()
        });

        let local = tokio::task::LocalSet::new();
        local
            .run_until(start_server_loop(
                listener,
                Arc::clone(&state),
                Arc::clone(&active),
                Arc::clone(&signals),
            ))
            .await
            .unwrap();
        // Connection tasks left behind would be cancelled here
        drop(local);

        let response = client.await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "got: {response}");
        assert!(response.ends_with("\r\n\r\n[]"), "got: {response}");
        assert_eq!(active.current(), 0);
    }
}
