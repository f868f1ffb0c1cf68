//! Routing module
//!
//! Compiles route path patterns and matches request paths against them,
//! capturing named segments such as `:projectId`.

mod matcher;

pub use matcher::{PathParams, PathPattern};
