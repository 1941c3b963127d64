//! Transport layer for the Canopy SDK.

pub mod http;

pub use http::HttpTransport;
