//! Audit events submitted for risk evaluation.
//!
//! Deserialization is deliberately forgiving: only `eventId` is checked, and
//! optional attributes of the wrong JSON type are read as absent.

use serde::{de::Error, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::ValidationError;
use crate::time::{from_epoch_millis, parse_timestamp, ParsedTimestamp};

/// An audit/access record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_data")]
    pub data: EventData,
    #[serde(
        default,
        deserialize_with = "lenient_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<EventTime>,
}

/// Network metadata attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    /// Source address as reported; not validated as an IP.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub ip_address: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_agent: Option<String>,
}

/// When the event happened, as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventTime {
    Text(String),
    EpochMillis(i64),
}

impl EventTime {
    /// Parse into a usable timestamp; `None` if unparsable.
    pub fn resolve(&self) -> Option<ParsedTimestamp> {
        match self {
            EventTime::Text(text) => parse_timestamp(text),
            EventTime::EpochMillis(millis) => from_epoch_millis(*millis),
        }
    }
}

impl Event {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: Some(event_id.into()),
            ..Default::default()
        }
    }

    pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.data.ip_address = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.data.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(EventTime::Text(timestamp.into()));
        self
    }

    /// Check required fields, returning the event id.
    pub fn validate(&self) -> Result<&str, ValidationError> {
        match self.event_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(ValidationError::MissingEventId),
        }
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_data<'de, D: Deserializer<'de>>(deserializer: D) -> Result<EventData, D::Error> {
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).map_err(D::Error::custom),
        _ => Ok(EventData::default()),
    }
}

fn lenient_time<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<EventTime>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(EventTime::Text(s)),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .map(EventTime::EpochMillis),
        _ => None,
    })
}
