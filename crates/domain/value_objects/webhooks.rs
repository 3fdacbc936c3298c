use std::fmt::Display;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

pub const ACORISS_PROVIDER: &str = "acoriss";
pub const DEFAULT_FAILURE_REASON: &str = "Unknown error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEventKind {
    PaymentSucceeded,
    PaymentFailed,
    PaymentPending,
    RefundCompleted,
    Other(String),
}

impl GatewayEventKind {
    /// Exact, case-sensitive match on the gateway's `type` field.
    pub fn from_type(value: &str) -> Self {
        match value {
            "payment.succeeded" => GatewayEventKind::PaymentSucceeded,
            "payment.failed" => GatewayEventKind::PaymentFailed,
            "payment.pending" => GatewayEventKind::PaymentPending,
            "refund.completed" => GatewayEventKind::RefundCompleted,
            other => GatewayEventKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            GatewayEventKind::PaymentSucceeded => "payment.succeeded",
            GatewayEventKind::PaymentFailed => "payment.failed",
            GatewayEventKind::PaymentPending => "payment.pending",
            GatewayEventKind::RefundCompleted => "refund.completed",
            GatewayEventKind::Other(other) => other,
        }
    }
}

impl Display for GatewayEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields read from the event's `data` object. Ids may arrive as strings or numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayEventData {
    pub transaction_id: Option<String>,
    pub payment_id: Option<String>,
    pub payment_method: Option<String>,
    pub session_id: Option<String>,
    pub reason: Option<String>,
}

impl GatewayEventData {
    pub fn from_value(data: &Value) -> Self {
        Self {
            transaction_id: string_field(data, "transactionId"),
            payment_id: string_field(data, "paymentId"),
            payment_method: string_field(data, "paymentMethod"),
            session_id: string_field(data, "sessionId"),
            reason: string_field(data, "reason"),
        }
    }
}

fn string_field(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

/// A gateway callback as received on the wire, before any parsing.
#[derive(Debug, Clone, Default)]
pub struct InboundWebhook {
    pub body: Vec<u8>,
    pub source_ip: Option<String>,
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    Applied,
    Ignored,
    MissingLookupKey,
    SubscriptionNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookReceipt {
    pub log_id: Uuid,
    pub event_type: String,
    pub outcome: WebhookOutcome,
}
