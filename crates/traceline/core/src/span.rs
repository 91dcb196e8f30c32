//! Span record: a timed unit of work with attributes, events, and status.

use crate::context::SpanContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Span attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::String(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::String(v.to_string())
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Int(v as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

/// Span status. Settable any number of times before end; last value wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanStatus {
    Unset,
    Ok,
    Error { message: String },
}

/// Timestamped event recorded inside a span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanEvent {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub attributes: HashMap<String, AttrValue>,
}

/// One unit of work. Mutable through its owner until [`Span::end`] freezes
/// it; every mutator is a silent no-op afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    /// Immutable identity.
    pub context: SpanContext,

    /// Operation name, fixed at creation.
    pub name: String,

    /// Wall-clock start.
    pub start_time: DateTime<Utc>,

    /// Wall-clock end; `None` until the span is ended.
    pub end_time: Option<DateTime<Utc>>,

    /// Monotonic duration between start and end.
    pub duration: Option<Duration>,

    /// Key → scalar attributes, last write wins.
    #[serde(default)]
    pub attributes: HashMap<String, AttrValue>,

    /// Ordered, append-only events.
    #[serde(default)]
    pub events: Vec<SpanEvent>,

    /// Final status.
    pub status: SpanStatus,

    // Monotonic anchor for duration; not part of the wire form.
    #[serde(skip)]
    started_at: Option<Instant>,
}

impl Span {
    /// Start a span now under the given identity.
    pub fn start(context: SpanContext, name: impl Into<String>) -> Self {
        Self {
            context,
            name: name.into(),
            start_time: Utc::now(),
            end_time: None,
            duration: None,
            attributes: HashMap::new(),
            events: Vec::new(),
            status: SpanStatus::Unset,
            started_at: Some(Instant::now()),
        }
    }

    pub fn is_ended(&self) -> bool {
        self.end_time.is_some()
    }

    /// Set an attribute. Keys are unique; a repeated key overwrites.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        if self.is_ended() {
            return;
        }
        self.attributes.insert(key.into(), value.into());
    }

    /// Append an event with no attributes.
    pub fn add_event(&mut self, name: impl Into<String>) {
        self.add_event_with_attributes(name, HashMap::new());
    }

    /// Append an event carrying attributes.
    pub fn add_event_with_attributes(
        &mut self,
        name: impl Into<String>,
        attributes: HashMap<String, AttrValue>,
    ) {
        if self.is_ended() {
            return;
        }
        self.events.push(SpanEvent {
            name: name.into(),
            timestamp: Utc::now(),
            attributes,
        });
    }

    pub fn set_status(&mut self, status: SpanStatus) {
        if self.is_ended() {
            return;
        }
        self.status = status;
    }

    /// End the span, freezing it. Idempotent: only the first call records
    /// the end time and duration.
    pub fn end(&mut self) {
        if self.end_time.is_none() {
            self.end_time = Some(Utc::now());
            self.duration = self.started_at.map(|s| s.elapsed());
        }
    }
}
