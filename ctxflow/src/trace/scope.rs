//! Request-scoped trace ids.

use super::{generate_trace_id, TraceConfig};
use crate::context::ContextStore;
use crate::errors::ContextError;
use std::ops::{Deref, DerefMut};

/// Holds a request's trace id in the context for the request's duration.
///
/// Entering stores the inbound id, or a fresh one, under the configured key.
/// Dropping the scope removes it again on every exit path, so a reused
/// thread never serves the next request with a stale id. A scope that stored
/// nothing leaves the key alone. The scope dereferences to the store for the
/// request handler.
pub struct RequestTraceScope<'a> {
    store: &'a mut ContextStore,
    key: String,
    trace_id: Option<String>,
}

impl<'a> RequestTraceScope<'a> {
    /// Enters a request scope.
    ///
    /// `inbound` is the raw header value, if the request carried one. Blank
    /// values count as missing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the configured context key is empty.
    pub fn enter(
        store: &'a mut ContextStore,
        config: &TraceConfig,
        inbound: Option<&str>,
    ) -> Result<Self, ContextError> {
        let inbound = inbound.map(str::trim).filter(|v| !v.is_empty());
        let generated = inbound.is_none();
        let trace_id = match inbound {
            Some(id) => Some(id.to_string()),
            None if config.generate_missing => Some(generate_trace_id()),
            None => None,
        };

        if let Some(id) = &trace_id {
            store.put(config.context_key.as_str(), id.clone())?;
            tracing::debug!(trace_id = %id, generated, "Entered request trace scope");
        }

        Ok(Self {
            store,
            key: config.context_key.clone(),
            trace_id,
        })
    }

    /// Returns the trace id assigned when the scope was entered.
    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }
}

impl Deref for RequestTraceScope<'_> {
    type Target = ContextStore;

    fn deref(&self) -> &ContextStore {
        self.store
    }
}

impl DerefMut for RequestTraceScope<'_> {
    fn deref_mut(&mut self) -> &mut ContextStore {
        self.store
    }
}

impl Drop for RequestTraceScope<'_> {
    fn drop(&mut self) {
        if self.trace_id.is_some() {
            self.store.remove(self.key.as_str());
        }
    }
}
