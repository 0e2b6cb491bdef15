//! Risk verdicts returned to callers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::iso_millis;

/// Lowest score classified as [`RiskLevel::Medium`].
pub const MEDIUM_RISK_THRESHOLD: u32 = 25;
/// Lowest score classified as [`RiskLevel::High`].
pub const HIGH_RISK_THRESHOLD: u32 = 50;

const HIGH_RECOMMENDATIONS: &[&str] = &[
    "Immediate investigation required",
    "Block access temporarily",
];
const MEDIUM_RECOMMENDATIONS: &[&str] = &["Monitor closely", "Review access patterns"];
const LOW_RECOMMENDATIONS: &[&str] = &["Continue monitoring"];

/// Discrete classification band for a risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Classify a score. Band lower bounds are inclusive.
    pub fn from_score(score: u32) -> Self {
        if score >= HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if score >= MEDIUM_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Fixed, ordered follow-up actions for this level.
    pub fn recommendations(self) -> &'static [&'static str] {
        match self {
            RiskLevel::High => HIGH_RECOMMENDATIONS,
            RiskLevel::Medium => MEDIUM_RECOMMENDATIONS,
            RiskLevel::Low => LOW_RECOMMENDATIONS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of scoring one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub event_id: String,
    /// Sum of triggered factor weights; not clamped.
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    /// Factor labels in evaluation order.
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub confidence: f64,
    /// When the verdict was produced (not when the event happened).
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(24), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(25), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(49), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(50), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(u32::MAX), RiskLevel::High);
    }

    #[test]
    fn level_is_monotonic_in_score() {
        let mut previous = RiskLevel::from_score(0);
        for score in 1..=200 {
            let level = RiskLevel::from_score(score);
            assert!(level >= previous, "score {score} dropped to {level}");
            previous = level;
        }
    }

    #[test]
    fn recommendation_lists() {
        assert_eq!(
            RiskLevel::High.recommendations(),
            ["Immediate investigation required", "Block access temporarily"]
        );
        assert_eq!(
            RiskLevel::Medium.recommendations(),
            ["Monitor closely", "Review access patterns"]
        );
        assert_eq!(RiskLevel::Low.recommendations(), ["Continue monitoring"]);
    }

    #[test]
    fn verdict_wire_format() {
        let verdict = Verdict {
            event_id: "e1".into(),
            risk_score: 50,
            risk_level: RiskLevel::High,
            risk_factors: vec!["Invalid IP address".into()],
            recommendations: vec![
                "Immediate investigation required".into(),
                "Block access temporarily".into(),
            ],
            confidence: 0.85,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap(),
        };

        let value = serde_json::to_value(&verdict).unwrap();
        assert_eq!(
            value,
            json!({
                "eventId": "e1",
                "riskScore": 50,
                "riskLevel": "HIGH",
                "riskFactors": ["Invalid IP address"],
                "recommendations": ["Immediate investigation required", "Block access temporarily"],
                "confidence": 0.85,
                "timestamp": "2024-05-06T07:08:09.000Z"
            })
        );

        let back: Verdict = serde_json::from_value(value).unwrap();
        assert_eq!(back, verdict);
    }
}
