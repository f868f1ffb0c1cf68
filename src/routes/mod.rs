//! Static route table
//!
//! Declarative route descriptors (method, path, description, auth flag,
//! behavior) and the table the request handler resolves them through.

mod descriptor;
mod projects;
mod table;

pub use projects::project_routes;
pub use table::{Lookup, RouteTable};
