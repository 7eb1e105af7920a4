pub mod config;
pub mod metrics;
pub mod router;
pub mod routes;
pub mod server;
