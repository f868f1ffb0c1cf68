//! Route descriptor types

use hyper::Method;
use serde::Serialize;

use crate::http::ResponseWriter;

/// Writes a canned response. Never inspects the request.
pub type Behavior = fn(&mut ResponseWriter);

/// HTTP methods a descriptor can be declared for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RouteMethod {
    Get,
    Options,
}

impl RouteMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Options => "OPTIONS",
        }
    }

    /// Map a request method onto a declared one; HEAD is served by GET
    pub fn for_request(method: &Method) -> Option<Self> {
        match *method {
            Method::GET | Method::HEAD => Some(Self::Get),
            Method::OPTIONS => Some(Self::Options),
            _ => None,
        }
    }
}

/// Static record binding a method and path pattern to a canned response
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RouteDescriptor {
    pub name: &'static str,
    pub method: RouteMethod,
    pub path: &'static str,
    pub description: &'static str,
    /// Declared only. Nothing in the server checks it.
    pub authentication_required: bool,
    #[serde(skip)]
    pub behavior: Behavior,
}

impl RouteDescriptor {
    pub fn respond(&self) -> ResponseWriter {
        let mut writer = ResponseWriter::new();
        (self.behavior)(&mut writer);
        writer
    }
}
