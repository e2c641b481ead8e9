//! Proxy module
//!
//! The request transform at the center of the service: target resolution,
//! the single upstream fetch, HTML rewriting, and response assembly.

mod handler;
pub mod rewrite;
pub mod target;
pub mod upstream;

// Re-export main entry point
pub use handler::handle_proxy;
