//! Cross-origin resource sharing headers.

use crate::http::Response;

pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization";
const PREFLIGHT_MAX_AGE_SECS: u32 = 600;

/// Origin allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    allow_any: bool,
    origins: Vec<String>,
}

impl CorsPolicy {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allow_any = false;
        let mut list = Vec::new();
        for origin in origins {
            let origin = normalize(origin.as_ref());
            if origin == "*" {
                allow_any = true;
            } else if !origin.is_empty() {
                list.push(origin.to_string());
            }
        }
        Self {
            allow_any,
            origins: list,
        }
    }

    pub fn allows(&self, origin: &str) -> bool {
        self.allow_any || self.origins.iter().any(|o| o == normalize(origin))
    }

    /// Add CORS headers when `origin` is allowed. Disallowed or absent origins
    /// leave the response untouched, which browsers treat as a denial.
    pub fn apply(&self, origin: Option<&str>, preflight: bool, response: Response) -> Response {
        let Some(origin) = origin.filter(|o| self.allows(o)) else {
            return response;
        };

        let response = response
            .with_header("Access-Control-Allow-Origin", origin)
            .with_header("Vary", "Origin");

        if preflight {
            response
                .with_header("Access-Control-Allow-Methods", ALLOWED_METHODS)
                .with_header("Access-Control-Allow-Headers", ALLOWED_HEADERS)
                .with_header("Access-Control-Max-Age", PREFLIGHT_MAX_AGE_SECS.to_string())
        } else {
            response
        }
    }
}

fn normalize(origin: &str) -> &str {
    origin.trim().trim_end_matches('/')
}
