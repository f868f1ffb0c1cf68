//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: body-size validation, health and
//! route-index endpoints, then dispatch through the route table.

use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::routes::Lookup;
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub is_head: bool,
    pub access_log: bool,
}

/// Main entry point for HTTP request handling
///
/// The request body is never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method = req.method();
    let path = req.uri().path();

    let access_log = state.config.logging.access_log;

    logger::log_headers_count(req.headers().len(), state.config.logging.show_headers);

    let ctx = RequestContext {
        method,
        path,
        is_head: *method == Method::HEAD,
        access_log,
    };

    let response = match check_body_size(&req, state.config.http.max_body_size) {
        Some(resp) => resp,
        None => route_request(&ctx, &state),
    };

    if access_log {
        let entry = build_access_entry(&req, &response, peer_addr, started);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Route request based on path and configuration
fn route_request(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let is_get = matches!(*ctx.method, Method::GET | Method::HEAD);

    // 0. Health check endpoints (highest priority, always fast)
    let health = &state.config.health;
    if health.enabled
        && is_get
        && (ctx.path == health.liveness_path || ctx.path == health.readiness_path)
    {
        return http::build_health_response("ok", ctx.is_head);
    }

    // 1. Route index
    let http_config = &state.config.http;
    if http_config.route_index && is_get && ctx.path == http_config.route_index_path {
        return serve_route_index(ctx, state);
    }

    // 2. Route table
    match state.routes.find(ctx.method, ctx.path) {
        Lookup::Matched(route) => {
            if ctx.access_log {
                logger::log_route_matched(route.descriptor.name, &route.params);
            }
            let writer = route.descriptor.respond();
            if !writer.is_sent() && ctx.access_log {
                logger::log_route_unsent(route.descriptor.name);
            }
            writer.into_response(ctx.is_head)
        }
        Lookup::MethodNotAllowed { allow } => {
            logger::log_warning(&format!(
                "Method not allowed: {} {} (allow: {allow})",
                ctx.method, ctx.path
            ));
            http::build_405_response(&allow)
        }
        Lookup::NotFound => http::build_404_response(),
    }
}

/// Serve the descriptor listing as JSON
fn serve_route_index(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let descriptors: Vec<_> = state.routes.descriptors().collect();
    match serde_json::to_vec(&descriptors) {
        Ok(json) => http::build_json_response(json, ctx.is_head),
        Err(e) => {
            logger::log_error(&format!("Failed to serialize route index: {e}"));
            http::build_500_response()
        }
    }
}

fn build_access_entry<B>(
    req: &Request<B>,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX));
    entry.referer = header_string(req, "referer");
    entry.user_agent = header_string(req, "user-agent");
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;

    fn test_state() -> Arc<AppState> {
        let mut cfg = Config::load_from("does-not-exist/config").unwrap();
        cfg.logging.access_log = false;
        Arc::new(AppState::new(&cfg))
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    async fn send(state: &Arc<AppState>, req: Request<()>) -> Response<Full<Bytes>> {
        handle_request(req, Arc::clone(state), peer()).await.unwrap()
    }

    fn request(method: Method, uri: &str) -> Request<()> {
        Request::builder().method(method).uri(uri).body(()).unwrap()
    }

    async fn body_of(response: Response<Full<Bytes>>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    fn assert_cors(response: &Response<Full<Bytes>>) {
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-methods"], "OPTIONS, GET");
        assert_eq!(
            headers["access-control-allow-headers"],
            "Accept-Charset, Accept, Content-Type, Authorization"
        );
        assert_eq!(headers["allow"], "OPTIONS, GET");
    }

    fn assert_pagination(response: &Response<Full<Bytes>>) {
        let headers = response.headers();
        assert_eq!(headers["x-pagination-limit"], "5");
        assert_eq!(headers["x-pagination-offset"], "0");
        assert_eq!(headers["x-pagination-size"], "5");
    }

    #[tokio::test]
    async fn test_options_projects() {
        let state = test_state();
        let response = send(&state, request(Method::OPTIONS, "/projects?page=3")).await;
        assert_eq!(response.status(), 200);
        assert_cors(&response);
        assert_pagination(&response);
        assert!(body_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_get_projects_returns_empty_list() {
        let state = test_state();
        let response = send(&state, request(Method::GET, "/projects")).await;
        assert!(response.status().is_success());
        assert_cors(&response);
        assert_pagination(&response);
        assert_eq!(body_of(response).await, Bytes::from_static(b"[]"));
    }

    #[tokio::test]
    async fn test_get_projects_ignores_request_content() {
        let state = test_state();
        let req = Request::builder()
            .method(Method::GET)
            .uri("/projects?limit=50&offset=10")
            .header("Authorization", "Basic Zm9vOmJhcg==")
            .header("Content-Length", "0")
            .body(())
            .unwrap();
        let response = send(&state, req).await;
        assert_pagination(&response);
        assert_eq!(body_of(response).await, Bytes::from_static(b"[]"));
    }

    #[tokio::test]
    async fn test_options_project_item() {
        let state = test_state();
        for uri in ["/projects/42", "/projects/abc", "/projects/"] {
            let response = send(&state, request(Method::OPTIONS, uri)).await;
            assert_eq!(response.status(), 200, "{uri}");
            assert_cors(&response);
            assert!(response.headers().get("x-pagination-size").is_none());
            assert!(body_of(response).await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_get_project_item_has_no_body() {
        let state = test_state();
        let response = send(&state, request(Method::GET, "/projects/42")).await;
        assert_eq!(response.status(), 200);
        assert_cors(&response);
        assert!(response.headers().get("content-type").is_none());
        assert!(body_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_head_projects_strips_body() {
        let state = test_state();
        let response = send(&state, request(Method::HEAD, "/projects")).await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["content-length"], "2");
        assert_pagination(&response);
        assert!(body_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_requests_are_identical() {
        let state = test_state();
        let first = send(&state, request(Method::GET, "/projects")).await;
        let first_headers = first.headers().clone();
        let first_body = body_of(first).await;

        for _ in 0..5 {
            let next = send(&state, request(Method::GET, "/projects")).await;
            assert_eq!(next.headers(), &first_headers);
            assert_eq!(body_of(next).await, first_body);
        }
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let state = test_state();
        let response = send(&state, request(Method::GET, "/trackers")).await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_wrong_method_is_405() {
        let state = test_state();
        let response = send(&state, request(Method::POST, "/projects")).await;
        assert_eq!(response.status(), 405);
        assert_eq!(response.headers()["allow"], "OPTIONS, GET");
    }

    #[tokio::test]
    async fn test_oversized_body_is_413() {
        let state = test_state();
        let req = Request::builder()
            .method(Method::GET)
            .uri("/projects")
            .header("Content-Length", "999999999")
            .body(())
            .unwrap();
        let response = send(&state, req).await;
        assert_eq!(response.status(), 413);
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let state = test_state();
        for uri in ["/healthz", "/readyz"] {
            let response = send(&state, request(Method::GET, uri)).await;
            assert_eq!(response.status(), 200);
            assert_eq!(body_of(response).await, Bytes::from_static(b"ok"));
        }
    }

    #[tokio::test]
    async fn test_route_index_lists_descriptors() {
        let state = test_state();
        let response = send(&state, request(Method::GET, "/_routes")).await;
        assert_eq!(response.status(), 200);

        let body = body_of(response).await;
        let routes: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let routes = routes.as_array().unwrap();
        assert_eq!(routes.len(), 4);
        assert_eq!(routes[1]["name"], "list");
        assert_eq!(routes[1]["method"], "GET");
        assert_eq!(routes[1]["path"], "/projects");
        assert_eq!(routes[1]["authentication_required"], true);
        assert_eq!(routes[3]["path"], "/projects/:projectId");
    }

    #[tokio::test]
    async fn test_route_index_can_be_disabled() {
        let mut cfg = Config::load_from("does-not-exist/config").unwrap();
        cfg.logging.access_log = false;
        cfg.http.route_index = false;
        let state = Arc::new(AppState::new(&cfg));

        let response = send(&state, request(Method::GET, "/_routes")).await;
        assert_eq!(response.status(), 404);
    }

    #[test]
    fn test_access_entry_fields() {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/projects?page=1")
            .header("User-Agent", "mylyn-test")
            .body(())
            .unwrap();
        let response = http::build_404_response();
        let entry = build_access_entry(&req, &response, peer(), Instant::now());

        assert_eq!(entry.remote_addr, "127.0.0.1");
        assert_eq!(entry.path, "/projects");
        assert_eq!(entry.query.as_deref(), Some("page=1"));
        assert_eq!(entry.status, 404);
        assert_eq!(entry.body_bytes, "404 Not Found".len());
        assert_eq!(entry.user_agent.as_deref(), Some("mylyn-test"));
        assert_eq!(entry.referer, None);
    }
}
