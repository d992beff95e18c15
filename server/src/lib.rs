//! SmartHR HTTP server: configuration, session handling and the JSON API.

pub mod config;
pub mod http;
pub mod routes;
pub mod seed;
pub mod session;
