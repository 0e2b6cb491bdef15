//! Request routing: transport concerns in front of the risk engine.

use std::net::IpAddr;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use vg_risk::RiskEngine;
use vg_types::time::iso_millis;
use vg_types::{Event, HttpError, ValidationError, VgError};

use crate::config::ServiceConfig;
use crate::cors::CorsPolicy;
use crate::http::{parse_request, Request, Response};
use crate::rate_limit::{RateDecision, RateLimiter};

const SERVICE_DESCRIPTION: &str = "Rule-based risk scoring for audit events";

/// JSON error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Liveness probe payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

/// Static description served at `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<String>,
}

/// The HTTP front end. Owns CORS, rate limiting and body decoding, and hands
/// only parsed events to the engine.
#[derive(Debug)]
pub struct Service {
    engine: RiskEngine,
    cors: CorsPolicy,
    limiter: RateLimiter,
    service_name: String,
    max_body_bytes: usize,
}

impl Service {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            engine: RiskEngine::new(config.engine),
            cors: CorsPolicy::new(&config.allowed_origins),
            limiter: RateLimiter::new(config.rate_limit_window, config.rate_limit_max_requests),
            service_name: config.service_name.clone(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Decode raw request bytes, handle them and encode the response.
    pub fn handle_raw(&self, raw: &[u8], client: IpAddr) -> Vec<u8> {
        let response = match parse_request(raw, self.max_body_bytes) {
            Ok(Some(request)) => self.handle(&request, client),
            Ok(None) => self.error_response(&HttpError::ConnectionClosed.into()),
            Err(e) => self.error_response(&e.into()),
        };
        response.to_bytes()
    }

    pub fn handle(&self, request: &Request, client: IpAddr) -> Response {
        self.handle_at(request, client, Instant::now())
    }

    pub fn handle_at(&self, request: &Request, client: IpAddr, now: Instant) -> Response {
        let origin = request.header("origin");
        let preflight = request.method == "OPTIONS";

        if preflight {
            return self.cors.apply(origin, true, Response::empty(204));
        }

        let mut remaining = None;
        if self.limiter.is_enabled() && request.path != "/health" {
            match self.limiter.check(client, now) {
                RateDecision::Allowed { remaining: left } => remaining = Some(left),
                RateDecision::Limited { retry_after } => {
                    warn!(%client, path = %request.path, "rate limit exceeded");
                    let retry_secs =
                        retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                    let response = Response::json(
                        429,
                        &ErrorBody::new("Too many requests, please try again later."),
                    )
                    .with_header("Retry-After", retry_secs.to_string());
                    return self.cors.apply(origin, false, response);
                }
            }
        }

        let mut response = self.route(request);
        if let Some(left) = remaining {
            response = response
                .with_header("X-RateLimit-Limit", self.limiter.max_requests().to_string())
                .with_header("X-RateLimit-Remaining", left.to_string());
        }
        self.cors.apply(origin, false, response)
    }

    fn route(&self, request: &Request) -> Response {
        match (request.method.as_str(), request.path.as_str()) {
            ("GET", "/") => Response::json(200, &self.info()),
            ("GET", "/health") => Response::json(200, &self.health()),
            ("POST", "/analyze") => self.analyze(request),
            (_, "/" | "/health" | "/analyze") => {
                Response::json(405, &ErrorBody::new("Method not allowed"))
            }
            _ => Response::json(404, &ErrorBody::new("Not found")),
        }
    }

    fn analyze(&self, request: &Request) -> Response {
        let result = decode_event(request)
            .and_then(|event| self.engine.analyze(&event).map_err(VgError::from));

        match result {
            Ok(verdict) => Response::json(200, &verdict),
            Err(e) => self.error_response(&e),
        }
    }

    /// Map an error onto its status code and JSON body.
    pub fn error_response(&self, err: &VgError) -> Response {
        let status = err.status_code();
        let body = match err {
            VgError::Validation(ValidationError::MissingEventId) => {
                ErrorBody::new("Missing eventId")
            }
            VgError::Http(HttpError::InvalidJson { message }) => {
                ErrorBody::new("Invalid JSON body").with_message(message.clone())
            }
            VgError::Http(HttpError::BodyTooLarge { .. }) => {
                ErrorBody::new("Payload too large").with_message(err.to_string())
            }
            VgError::Http(_) => ErrorBody::new("Bad request").with_message(err.to_string()),
            _ => {
                error!(error = %err, "request failed");
                ErrorBody::new("Internal server error").with_message(err.to_string())
            }
        };
        Response::json(status, &body)
    }

    pub fn info(&self) -> ServiceInfo {
        ServiceInfo {
            name: self.service_name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: SERVICE_DESCRIPTION.to_string(),
            endpoints: vec![
                "GET /".to_string(),
                "GET /health".to_string(),
                "POST /analyze".to_string(),
            ],
        }
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".to_string(),
            service: self.service_name.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// Decode a JSON request body into an event.
///
/// Bodies that are empty, not declared as JSON, or not a JSON object yield an
/// empty event, which then fails validation on its missing id.
fn decode_event(request: &Request) -> Result<Event, VgError> {
    let declared_json = request
        .header("content-type")
        .map_or(true, |ct| ct.to_ascii_lowercase().contains("json"));
    if !declared_json || request.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Event::default());
    }

    match serde_json::from_slice::<Value>(&request.body) {
        Ok(value @ Value::Object(_)) => Ok(serde_json::from_value(value)?),
        Ok(_) => Ok(Event::default()),
        Err(e) => Err(HttpError::InvalidJson {
            message: e.to_string(),
        }
        .into()),
    }
}
