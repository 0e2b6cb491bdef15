//! HTTP front end for the Vigil risk scoring engine.
//!
//! Provides:
//! - A minimal HTTP/1.1 codec (one request per connection)
//! - Routing for `/`, `/health` and `/analyze`
//! - CORS allow-listing and per-client rate limiting
//! - Environment-driven configuration and a tokio accept loop

pub mod config;
pub mod cors;
pub mod http;
pub mod rate_limit;
pub mod routes;
pub mod server;

pub use config::ServiceConfig;
pub use cors::CorsPolicy;
pub use http::{parse_request, Request, Response};
pub use rate_limit::{RateDecision, RateLimiter};
pub use routes::{ErrorBody, HealthStatus, Service, ServiceInfo};
pub use server::{run, serve};
