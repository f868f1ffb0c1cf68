//! HTTP protocol layer module
//!
//! Host-side response plumbing: the writer route behaviors fill in, and the
//! builders for responses the host produces itself.

pub mod response;
pub mod writer;

// Re-export commonly used types
pub use response::{
    build_404_response, build_405_response, build_413_response, build_500_response,
    build_health_response, build_json_response,
};
pub use writer::ResponseWriter;
