//! Response writer module
//!
//! The response object route behaviors write into. A behavior sets headers,
//! optionally sends a body, and the host turns the writer into a hyper
//! response afterwards.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{HeaderMap, Response, StatusCode};
use serde::Serialize;

use crate::logger;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Collects the headers and body a route behavior produces
#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    sent: bool,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            sent: false,
        }
    }

    /// Set a header, replacing any previous value with the same name
    pub fn header(&mut self, name: &str, value: &str) -> &mut Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => logger::log_warning(&format!("Dropping invalid header '{name}: {value}'")),
        }
        self
    }

    /// Finalize the response with an empty body
    pub fn send(&mut self) {
        self.sent = true;
    }

    /// Serialize `value` as JSON and finalize the response with it
    pub fn send_json<T: Serialize + ?Sized>(&mut self, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
                self.body = Bytes::from(bytes);
            }
            Err(e) => {
                logger::log_error(&format!("Failed to serialize JSON body: {e}"));
                self.status = StatusCode::INTERNAL_SERVER_ERROR;
            }
        }
        self.sent = true;
    }

    pub const fn is_sent(&self) -> bool {
        self.sent
    }

    #[cfg(test)]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Build the hyper response
    ///
    /// A writer that was never sent is finalized with an empty body. For HEAD
    /// requests the body is dropped but its length is still announced.
    pub fn into_response(self, is_head: bool) -> Response<Full<Bytes>> {
        let content_length = self.body.len();
        let body = if is_head { Bytes::new() } else { self.body };

        let mut response = Response::new(Full::new(body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
            .headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from(content_length));
        response
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}
