//! Logger module
//!
//! Provides logging utilities for the mock server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Route dispatch tracing
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use crate::routes::RouteTable;
use crate::routing::PathParams;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, routes: &RouteTable) {
    write_info("======================================");
    write_info("Mock tracker server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("Routes:");
    for route in routes.descriptors() {
        let auth = if route.authentication_required {
            " [auth]"
        } else {
            ""
        };
        write_info(&format!(
            "  - {:<7} {:<22} {}{auth}",
            route.method.as_str(),
            route.path,
            route.description
        ));
    }
    if config.health.enabled {
        write_info(&format!(
            "Health: {} {}",
            config.health.liveness_path, config.health.readiness_path
        ));
    }
    if config.http.route_index {
        write_info(&format!("Route index: {}", config.http.route_index_path));
    }
    write_info("======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_headers_count(count: usize, show: bool) {
    if show {
        write_info(&format!("[Headers] Count: {count}"));
    }
}

pub fn log_route_matched(name: &str, params: &PathParams) {
    if params.is_empty() {
        write_info(&format!("[Route] {name}"));
    } else {
        let captured: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write_info(&format!("[Route] {name} ({})", captured.join(", ")));
    }
}

pub fn log_route_unsent(name: &str) {
    write_info(&format!("[Route] {name} sent no body, finalizing empty response"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_shutdown_requested() {
    write_info("\n[Shutdown] Stopped accepting new connections");
}

pub fn log_draining(active: usize) {
    write_info(&format!("[Shutdown] Listener closed, waiting for {active} connection(s)"));
}

pub fn log_shutdown_complete() {
    write_info("[Shutdown] Server stopped");
}
