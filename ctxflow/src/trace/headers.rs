//! Outbound header injection.

use super::TraceConfig;
use crate::context::ContextStore;
use std::collections::HashMap;

/// Fills `outbound` with the headers of an outbound call.
///
/// Inbound headers are copied unless excluded by `config`; then the trace
/// header is set from the context when a non-empty trace id is present.
/// `inbound` is `None` when the call is not made on behalf of a request,
/// e.g. from a pooled background task.
pub fn inject_headers(
    store: &ContextStore,
    config: &TraceConfig,
    inbound: Option<&HashMap<String, String>>,
    outbound: &mut HashMap<String, String>,
) {
    if let Some(inbound) = inbound {
        outbound.extend(
            inbound
                .iter()
                .filter(|(name, _)| config.forwards(name))
                .map(|(name, value)| (name.clone(), value.clone())),
        );
    }

    if let Some(id) = config.trace_id(store).filter(|id| !id.is_empty()) {
        outbound.insert(config.header.clone(), id);
    }
}
