//! Correlation identifier helpers built on the context store.
//!
//! A request's trace id lives in the context under a well-known key. Inbound
//! requests either carry one in a header or get a fresh one; outbound calls
//! forward it in the same header.

mod config;
mod headers;
mod scope;

pub use config::TraceConfig;
pub use headers::inject_headers;
pub use scope::RequestTraceScope;

use crate::context::ContextStore;
use crate::errors::ContextError;
use uuid::Uuid;

/// The context key the trace id is stored under.
pub const TRACE_ID_KEY: &str = "traceId";

/// The header carrying the trace id between services.
pub const TRACE_ID_HEADER: &str = "x-traceId-header";

/// Generates a new trace id (32 lowercase hex characters).
#[must_use]
pub fn generate_trace_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Returns the trace id stored under [`TRACE_ID_KEY`], if any.
///
/// Use [`TraceConfig::trace_id`] when the key is configured.
#[must_use]
pub fn trace_id(store: &ContextStore) -> Option<String> {
    store.get(TRACE_ID_KEY)
}

/// Stores `id` under [`TRACE_ID_KEY`].
///
/// # Errors
///
/// Same as [`ContextStore::put`]; the well-known key itself is always valid.
pub fn put_trace_id(store: &mut ContextStore, id: impl Into<String>) -> Result<(), ContextError> {
    store.put(TRACE_ID_KEY, id)
}

/// Builds a span carrying the trace id stored under [`TRACE_ID_KEY`].
///
/// Events recorded inside the span carry the id, the way a pattern layout
/// prints a diagnostic context field. See [`TraceConfig::span`] for a
/// configured key.
#[must_use]
pub fn trace_span(store: &ContextStore) -> tracing::Span {
    span_for(trace_id(store))
}

fn span_for(id: Option<String>) -> tracing::Span {
    let id = id.unwrap_or_default();
    tracing::info_span!("trace", trace_id = %id)
}
