//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides production-ready implementations of the bridge traits
//! using desktop-appropriate libraries:
//! - `HttpClient` using `reqwest`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use bridge_traits::HttpClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     let http_client = ReqwestHttpClient::new();
//!
//!     // Use in resolver configuration
//! }
//! ```

mod http;

pub use http::ReqwestHttpClient;
