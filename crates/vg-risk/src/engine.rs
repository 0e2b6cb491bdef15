//! Risk scoring engine — one event in, one verdict out.
//!
//! The [`RiskEngine`] holds only immutable configuration. Every call reads its
//! own event and the wall clock, so an engine can be shared across threads and
//! called concurrently without coordination.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, Timelike, Utc};
use tracing::{debug, info};

use vg_types::{
    config_error, Event, EventTime, ParsedTimestamp, RiskLevel, ValidationError, Verdict, VgError,
};

use crate::rules::{match_hour, match_ip, match_user_agent, total_weight, RiskFactor};

/// Confidence attached to every verdict unless configured otherwise.
pub const DEFAULT_CONFIDENCE: f64 = 0.85;

/// Time zone in which an event's hour of day is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HourBasis {
    /// The host's local zone.
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl HourBasis {
    /// Hour of day (0-23) of `ts` in this zone. Naive timestamps are already
    /// wall-clock readings and are taken as-is.
    pub fn hour_of(&self, ts: &ParsedTimestamp) -> u32 {
        match ts {
            ParsedTimestamp::Naive(naive) => naive.hour(),
            ParsedTimestamp::Zoned(dt) => match self {
                HourBasis::Local => dt.with_timezone(&Local).hour(),
                HourBasis::Utc => dt.with_timezone(&Utc).hour(),
                HourBasis::Fixed(offset) => dt.with_timezone(offset).hour(),
            },
        }
    }
}

impl FromStr for HourBasis {
    type Err = VgError;

    /// Accepts `local`, `utc`, or an offset such as `+05:30` / `-0800`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "local" => return Ok(HourBasis::Local),
            "utc" | "z" => return Ok(HourBasis::Utc),
            _ => {}
        }

        let (sign, rest) = match s.as_bytes().first() {
            Some(b'+') => (1, &s[1..]),
            Some(b'-') => (-1, &s[1..]),
            _ => return Err(config_error!("unrecognised hour basis: {s}")),
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(config_error!("unrecognised UTC offset: {s}"));
        }
        let hours: i32 = digits[..2].parse().map_err(|_| config_error!("bad offset hours: {s}"))?;
        let minutes: i32 = digits[2..].parse().map_err(|_| config_error!("bad offset minutes: {s}"))?;
        if minutes >= 60 {
            return Err(config_error!("bad offset minutes: {s}"));
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(HourBasis::Fixed)
            .ok_or_else(|| config_error!("UTC offset out of range: {s}"))
    }
}

/// Configuration for the risk engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskEngineConfig {
    pub hour_basis: HourBasis,
    /// Reported verdict confidence. Not derived from the event.
    pub confidence: f64,
}

impl Default for RiskEngineConfig {
    fn default() -> Self {
        Self {
            hour_basis: HourBasis::Local,
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

/// Scoring stage result, before validation and presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub factors: Vec<RiskFactor>,
    pub score: u32,
    pub level: RiskLevel,
}

#[derive(Debug, Clone, Default)]
pub struct RiskEngine {
    config: RiskEngineConfig,
}

impl RiskEngine {
    pub fn new(config: RiskEngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskEngineConfig {
        &self.config
    }

    /// Score an event.
    ///
    /// Fails only when the event id is missing; the verdict is stamped with the
    /// current time.
    pub fn analyze(&self, event: &Event) -> Result<Verdict, ValidationError> {
        self.analyze_at(event, Utc::now())
    }

    /// Like [`RiskEngine::analyze`] with an explicit generation time.
    pub fn analyze_at(&self, event: &Event, now: DateTime<Utc>) -> Result<Verdict, ValidationError> {
        let event_id = event.validate()?;
        let assessment = self.assess(event);

        info!(
            event_id,
            risk_score = assessment.score,
            risk_level = %assessment.level,
            factors = assessment.factors.len(),
            "event scored"
        );

        Ok(Verdict {
            event_id: event_id.to_string(),
            risk_score: assessment.score,
            risk_level: assessment.level,
            risk_factors: assessment
                .factors
                .iter()
                .map(|factor| factor.label.to_string())
                .collect(),
            recommendations: assessment
                .level
                .recommendations()
                .iter()
                .map(|r| r.to_string())
                .collect(),
            confidence: self.config.confidence,
            timestamp: now,
        })
    }

    /// Evaluate every rule in order and classify the total.
    pub fn assess(&self, event: &Event) -> Assessment {
        let mut factors = Vec::with_capacity(3);

        // --- network ---
        if let Some(factor) = event.data.ip_address.as_deref().and_then(match_ip) {
            factors.push(factor);
        }

        // --- client ---
        if let Some(factor) = event.data.user_agent.as_deref().and_then(match_user_agent) {
            factors.push(factor);
        }

        // --- time of day ---
        if let Some(factor) = self.event_hour(event).and_then(match_hour) {
            factors.push(factor);
        }

        for factor in &factors {
            debug!(label = factor.label, weight = factor.weight, "risk factor triggered");
        }

        let score = total_weight(&factors);
        Assessment {
            level: RiskLevel::from_score(score),
            score,
            factors,
        }
    }

    fn event_hour(&self, event: &Event) -> Option<u32> {
        let ts = event.timestamp.as_ref().and_then(EventTime::resolve)?;
        Some(self.config.hour_basis.hour_of(&ts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn utc_engine() -> RiskEngine {
        RiskEngine::new(RiskEngineConfig {
            hour_basis: HourBasis::Utc,
            ..Default::default()
        })
    }

    fn event(value: serde_json::Value) -> Event {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_event_id_is_rejected() {
        let engine = utc_engine();
        let err = engine
            .analyze(&event(json!({ "data": { "ipAddress": "0.0.0.0" } })))
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingEventId);
        assert!(engine.analyze(&event(json!({ "eventId": "" }))).is_err());
    }

    #[test]
    fn bare_event_is_low_risk() {
        let verdict = utc_engine().analyze(&Event::new("e0")).unwrap();
        assert_eq!(verdict.event_id, "e0");
        assert_eq!(verdict.risk_score, 0);
        assert_eq!(verdict.risk_level, RiskLevel::Low);
        assert!(verdict.risk_factors.is_empty());
        assert_eq!(verdict.recommendations, vec!["Continue monitoring"]);
        assert_eq!(verdict.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn invalid_ip_is_high_risk() {
        let verdict = utc_engine()
            .analyze(&event(json!({ "eventId": "e1", "data": { "ipAddress": "0.0.0.0" } })))
            .unwrap();
        assert_eq!(verdict.risk_score, 50);
        assert_eq!(verdict.risk_level, RiskLevel::High);
        assert_eq!(verdict.risk_factors, vec!["Invalid IP address"]);
        assert_eq!(
            verdict.recommendations,
            vec!["Immediate investigation required", "Block access temporarily"]
        );
    }

    #[test]
    fn internal_ip_with_bot_is_medium_risk() {
        let verdict = utc_engine()
            .analyze(&event(json!({
                "eventId": "e2",
                "data": { "ipAddress": "192.168.1.5", "userAgent": "somebot/1.0" }
            })))
            .unwrap();
        assert_eq!(verdict.risk_score, 40);
        assert_eq!(verdict.risk_level, RiskLevel::Medium);
        assert_eq!(
            verdict.risk_factors,
            vec!["Internal network IP", "Bot-like user agent"]
        );
        assert_eq!(
            verdict.recommendations,
            vec!["Monitor closely", "Review access patterns"]
        );
    }

    #[test]
    fn night_access_is_flagged() {
        let verdict = utc_engine()
            .analyze(&event(json!({ "eventId": "e3", "timestamp": "2024-01-01T03:00:00Z" })))
            .unwrap();
        assert_eq!(verdict.risk_score, 15);
        assert_eq!(verdict.risk_level, RiskLevel::Low);
        assert_eq!(verdict.risk_factors, vec!["Unusual access time"]);
    }

    #[test]
    fn hour_boundaries() {
        let engine = utc_engine();
        let flagged = |ts: &str| {
            engine
                .assess(&Event::new("e").with_timestamp(ts))
                .factors
                .contains(&crate::rules::UNUSUAL_ACCESS_TIME)
        };
        assert!(flagged("2024-01-01T05:59:59Z"));
        assert!(!flagged("2024-01-01T06:00:00Z"));
        assert!(!flagged("2024-01-01T22:59:59Z"));
        assert!(flagged("2024-01-01T23:00:00Z"));
        assert!(flagged("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn factors_keep_evaluation_order() {
        let verdict = utc_engine()
            .analyze(
                &Event::new("e4")
                    .with_timestamp("2024-01-01T23:30:00Z")
                    .with_user_agent("crawlbot")
                    .with_ip_address("127.0.0.1"),
            )
            .unwrap();
        assert_eq!(
            verdict.risk_factors,
            vec!["Localhost access", "Bot-like user agent", "Unusual access time"]
        );
        assert_eq!(verdict.risk_score, 65);
        assert_eq!(verdict.risk_level, RiskLevel::High);
    }

    #[test]
    fn score_boundaries_through_rules() {
        let engine = utc_engine();
        // 10 + 15 = 25
        let a = engine.assess(
            &Event::new("b1")
                .with_ip_address("192.168.0.9")
                .with_timestamp("2024-01-01T02:00:00Z"),
        );
        assert_eq!((a.score, a.level), (25, RiskLevel::Medium));

        // 20 + 30 = 50
        let b = engine.assess(
            &Event::new("b2")
                .with_ip_address("127.0.0.1")
                .with_user_agent("bot"),
        );
        assert_eq!((b.score, b.level), (50, RiskLevel::High));

        // 20 alone
        let c = engine.assess(&Event::new("b3").with_ip_address("127.0.0.1"));
        assert_eq!((c.score, c.level), (20, RiskLevel::Low));
    }

    #[test]
    fn malformed_optionals_do_not_fail() {
        let verdict = utc_engine()
            .analyze(&event(json!({
                "eventId": "e5",
                "data": { "ipAddress": 0, "userAgent": null },
                "timestamp": "definitely not a time"
            })))
            .unwrap();
        assert_eq!(verdict.risk_score, 0);
        assert!(verdict.risk_factors.is_empty());
    }

    #[test]
    fn fixed_offset_shifts_hour() {
        let engine = RiskEngine::new(RiskEngineConfig {
            hour_basis: "+05:30".parse().unwrap(),
            ..Default::default()
        });
        // 20:00Z is 01:30 at +05:30
        let a = engine.assess(&Event::new("e").with_timestamp("2024-01-01T20:00:00Z"));
        assert_eq!(a.score, 15);

        // Naive readings ignore the basis
        let b = engine.assess(&Event::new("e").with_timestamp("2024-01-01 12:00:00"));
        assert_eq!(b.score, 0);
    }

    #[test]
    fn hour_basis_parsing() {
        assert_eq!("local".parse::<HourBasis>().unwrap(), HourBasis::Local);
        assert_eq!("UTC".parse::<HourBasis>().unwrap(), HourBasis::Utc);
        assert_eq!(
            "-0800".parse::<HourBasis>().unwrap(),
            HourBasis::Fixed(FixedOffset::west_opt(8 * 3600).unwrap())
        );
        assert!("+5".parse::<HourBasis>().is_err());
        assert!("+05:75".parse::<HourBasis>().is_err());
        assert!("mars".parse::<HourBasis>().is_err());
    }

    #[test]
    fn analysis_is_repeatable() {
        let engine = utc_engine();
        let e = Event::new("e6")
            .with_ip_address("192.168.3.3")
            .with_user_agent("Mozilla/5.0")
            .with_timestamp("2024-07-04T04:00:00Z");

        let first = engine.analyze(&e).unwrap();
        let second = engine.analyze(&e).unwrap();
        assert_eq!(first.risk_score, second.risk_score);
        assert_eq!(first.risk_level, second.risk_level);
        assert_eq!(first.risk_factors, second.risk_factors);
        assert_eq!(first.recommendations, second.recommendations);
    }

    #[test]
    fn verdict_timestamp_is_generation_time() {
        let now = Utc.with_ymd_and_hms(2030, 2, 3, 4, 5, 6).unwrap();
        let verdict = utc_engine()
            .analyze_at(&Event::new("e7").with_timestamp("2024-01-01T03:00:00Z"), now)
            .unwrap();
        assert_eq!(verdict.timestamp, now);
    }

    #[test]
    fn configured_confidence_is_reported() {
        let engine = RiskEngine::new(RiskEngineConfig {
            confidence: 0.5,
            ..Default::default()
        });
        assert_eq!(engine.analyze(&Event::new("e8")).unwrap().confidence, 0.5);
    }

    #[test]
    fn engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RiskEngine>();
    }
}
