//! Rule-based risk scoring for audit events.
//!
//! Provides:
//! - An ordered rule table over IP address, user agent and time of day
//! - Score accumulation and LOW / MEDIUM / HIGH classification
//! - A stateless [`RiskEngine`] producing [`vg_types::Verdict`]s

pub mod engine;
pub mod rules;

pub use engine::{Assessment, HourBasis, RiskEngine, RiskEngineConfig, DEFAULT_CONFIDENCE};
pub use rules::{RiskFactor, IP_RULES};
