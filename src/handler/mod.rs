//! Request handler module
//!
//! Responsible for request dispatch: host-level checks first, then the
//! static route table.

pub mod router;

// Re-export main entry point
pub use router::handle_request;
