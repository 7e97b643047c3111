//! CloudEvents envelope for upstream events.
//!
//! The log stores opaque bytes; this module is where those bytes get their
//! shape. Each upstream event is wrapped in a CloudEvents v1.0 envelope and
//! serialized to JSON before it is appended. The paged endpoint parses
//! stored records back into this type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::vsphere::{EventClass, VsphereEvent};

/// CloudEvents spec version produced by this service.
pub const SPEC_VERSION: &str = "1.0";

/// A CloudEvents v1.0 envelope.
///
/// Restricted to the attributes this service produces: the required context
/// attributes, `time`, `datacontenttype`, the raw upstream event as `data`,
/// and the `eventclass` extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudEvent {
    pub specversion: String,
    pub id: String,
    pub source: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eventclass: Option<EventClass>,
}

impl CloudEvent {
    /// Wraps an upstream event, keyed by the event's native identifier.
    pub fn from_vsphere(source: &str, event: &VsphereEvent) -> serde_json::Result<Self> {
        Ok(Self {
            specversion: SPEC_VERSION.to_string(),
            id: event.key.to_string(),
            source: source.to_string(),
            event_type: format!("vmware.vsphere.{}.v0", event.event_type),
            time: Some(event.created_time),
            datacontenttype: Some("application/json".to_string()),
            data: Some(serde_json::to_value(event)?),
            eventclass: Some(event.class),
        })
    }
}
