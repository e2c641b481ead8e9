//! HTTP layer module
//!
//! Response construction for every outcome the server can produce.

pub mod response;

pub use response::{
    build_404_response, build_405_response, build_413_response, build_error_response,
    build_health_response, build_options_response, build_proxied_binary_response,
    build_proxied_html_response,
};
