//! `/projects` collection and `/projects/:projectId` item routes
//!
//! Every behavior writes the same canned output whatever the request holds.
//! The `:projectId` capture is never consulted.

use super::descriptor::{RouteDescriptor, RouteMethod};
use crate::http::ResponseWriter;

pub const ALLOWED_METHODS: &str = "OPTIONS, GET";
pub const ALLOWED_HEADERS: &str = "Accept-Charset, Accept, Content-Type, Authorization";

pub const PAGINATION_LIMIT: &str = "5";
pub const PAGINATION_OFFSET: &str = "0";
pub const PAGINATION_SIZE: &str = "5";

static PROJECT_ROUTES: [RouteDescriptor; 4] = [
    RouteDescriptor {
        name: "optionsList",
        method: RouteMethod::Options,
        path: "/projects",
        description: "Description of the route",
        authentication_required: false,
        behavior: options_list,
    },
    RouteDescriptor {
        name: "list",
        method: RouteMethod::Get,
        path: "/projects",
        description: "Retrieve all the projects",
        authentication_required: true,
        behavior: list,
    },
    RouteDescriptor {
        name: "options",
        method: RouteMethod::Options,
        path: "/projects/:projectId",
        description: "Description of the route",
        authentication_required: false,
        behavior: options,
    },
    RouteDescriptor {
        name: "show",
        method: RouteMethod::Get,
        path: "/projects/:projectId",
        description: "Retrieve a specific project",
        authentication_required: true,
        behavior: show,
    },
];

/// The project descriptors, in declaration order
pub fn project_routes() -> &'static [RouteDescriptor] {
    &PROJECT_ROUTES
}

fn write_cors_headers(res: &mut ResponseWriter) {
    res.header("Access-Control-Allow-Methods", ALLOWED_METHODS)
        .header("Access-Control-Allow-Headers", ALLOWED_HEADERS)
        .header("Allow", ALLOWED_METHODS);
}

fn write_pagination_headers(res: &mut ResponseWriter) {
    res.header("X-PAGINATION-LIMIT", PAGINATION_LIMIT)
        .header("X-PAGINATION-OFFSET", PAGINATION_OFFSET)
        .header("X-PAGINATION-SIZE", PAGINATION_SIZE);
}

fn options_list(res: &mut ResponseWriter) {
    write_cors_headers(res);
    write_pagination_headers(res);
    res.send();
}

fn list(res: &mut ResponseWriter) {
    write_cors_headers(res);
    write_pagination_headers(res);
    res.send_json(&serde_json::json!([]));
}

fn options(res: &mut ResponseWriter) {
    write_cors_headers(res);
    res.send();
}

// Returns without sending; the host finalizes with an empty body.
fn show(res: &mut ResponseWriter) {
    write_cors_headers(res);
}
