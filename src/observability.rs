//! Observability module for correlation and tracing

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation ID tying every log line of one swap operation together
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Trace context for one swap operation
///
/// The operation gets a root span and each attempt a child span. `span()`
/// turns a context into a `tracing` span carrying its ids, so every event
/// logged inside an attempt names that attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceContext {
    /// Unique trace identifier for the entire operation
    pub trace_id: String,

    /// Unique span identifier for this specific operation
    pub span_id: String,

    pub correlation_id: CorrelationId,

    pub parent_span_id: Option<String>,

    /// Operation name (e.g. "swap", "attempt-2")
    pub operation: String,

    /// Creation timestamp (Unix epoch milliseconds)
    pub timestamp_ms: i64,
}

impl TraceContext {
    pub fn new(operation: &str) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string(),
            span_id: Uuid::new_v4().to_string(),
            correlation_id: CorrelationId::new(),
            parent_span_id: None,
            operation: operation.to_string(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Create a child span context
    pub fn child_span(&self, operation: &str) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: Uuid::new_v4().to_string(),
            correlation_id: self.correlation_id.clone(),
            parent_span_id: Some(self.span_id.clone()),
            operation: operation.to_string(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn span_id(&self) -> &str {
        &self.span_id
    }

    /// `tracing` span carrying this context's ids
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "trace",
            operation = %self.operation,
            trace_id = %self.trace_id,
            span_id = %self.span_id,
        )
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new("swap")
    }
}
