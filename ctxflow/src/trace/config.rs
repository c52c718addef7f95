//! Trace propagation configuration.

use super::{span_for, TRACE_ID_HEADER, TRACE_ID_KEY};
use crate::context::ContextStore;
use crate::errors::ContextError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Configuration for trace id scoping and header forwarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Context key the trace id is stored under.
    #[serde(default = "default_context_key")]
    pub context_key: String,
    /// Header carrying the trace id.
    #[serde(default = "default_header")]
    pub header: String,
    /// Whether to generate a trace id when the inbound header is missing.
    #[serde(default = "default_generate_missing")]
    pub generate_missing: bool,
    /// Inbound headers never forwarded on outbound calls (any case).
    #[serde(default = "default_excluded_headers")]
    pub excluded_headers: HashSet<String>,
}

fn default_context_key() -> String {
    TRACE_ID_KEY.to_string()
}

fn default_header() -> String {
    TRACE_ID_HEADER.to_string()
}

fn default_generate_missing() -> bool {
    true
}

fn default_excluded_headers() -> HashSet<String> {
    ["content-length".to_string()].into_iter().collect()
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            context_key: default_context_key(),
            header: default_header(),
            generate_missing: default_generate_missing(),
            excluded_headers: default_excluded_headers(),
        }
    }
}

impl TraceConfig {
    /// Creates a new trace configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the context key.
    #[must_use]
    pub fn with_context_key(mut self, key: impl Into<String>) -> Self {
        self.context_key = key.into();
        self
    }

    /// Sets the header name.
    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Sets whether missing trace ids are generated.
    #[must_use]
    pub fn with_generate_missing(mut self, generate: bool) -> Self {
        self.generate_missing = generate;
        self
    }

    /// Adds a header that is never forwarded.
    #[must_use]
    pub fn with_excluded_header(mut self, header: impl Into<String>) -> Self {
        self.excluded_headers.insert(header.into().to_ascii_lowercase());
        self
    }

    /// Checks whether an inbound header may be forwarded.
    #[must_use]
    pub fn forwards(&self, header: &str) -> bool {
        !header.eq_ignore_ascii_case(&self.header)
            && !self
                .excluded_headers
                .iter()
                .any(|excluded| excluded.eq_ignore_ascii_case(header))
    }

    /// Returns the trace id stored under the configured key, if any.
    #[must_use]
    pub fn trace_id(&self, store: &ContextStore) -> Option<String> {
        store.get(self.context_key.as_str())
    }

    /// Stores `id` under the configured key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the configured key is empty.
    pub fn put_trace_id(
        &self,
        store: &mut ContextStore,
        id: impl Into<String>,
    ) -> Result<(), ContextError> {
        store.put(self.context_key.as_str(), id)
    }

    /// Builds a span carrying the trace id stored under the configured key.
    #[must_use]
    pub fn span(&self, store: &ContextStore) -> tracing::Span {
        span_for(self.trace_id(store))
    }
}
