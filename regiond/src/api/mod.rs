//! HTTP API for regiond

pub mod health;
pub mod regions;

pub use health::health_routes;
pub use regions::region_routes;
