//! Simulates a service handling requests on reused threads.
//!
//! Each request enters a trace scope, logs, fans work out to a worker pool
//! and builds the headers of a downstream call. Run with
//! `RUST_LOG=debug cargo run --example request_flow` to see the copies.

use ctxflow::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

fn handle_request(
    pool: &WorkerPool,
    store: &mut ContextStore,
    config: &TraceConfig,
    inbound: &HashMap<String, String>,
) -> anyhow::Result<()> {
    let inbound_trace = inbound.get(&config.header).map(String::as_str);
    let mut scope = RequestTraceScope::enter(store, config, inbound_trace)?;
    let span = config.span(&scope);
    let _entered = span.enter();
    tracing::info!("handling request");

    let task_config = config.clone();
    let handle = pool.submit(&mut scope, move |worker| -> anyhow::Result<u32> {
        let span = task_config.span(worker);
        let _entered = span.enter();
        tracing::info!("running asynchronously");
        worker.put("stage", "async")?;
        Ok("42".parse::<u32>()?)
    })?;
    let answer = handle.join()??;
    tracing::info!(answer, "async work finished");

    let mut outbound = HashMap::new();
    inject_headers(&scope, config, Some(inbound), &mut outbound);
    tracing::info!(headers = ?outbound, "calling downstream");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing(&LoggingConfig::new().with_filter("info"))?;

    let observer = Arc::new(LoggingDuplicationObserver);
    let pool = WorkerPool::with_observer(PoolConfig::new().with_workers(2), observer.clone())?;
    let config = TraceConfig::new().with_context_key("requestId");
    let mut store = ContextStore::new().with_observer(observer);

    let mut with_trace = HashMap::new();
    with_trace.insert(config.header.clone(), "0af7651916cd43dd8448eb211c80319c".to_string());
    with_trace.insert("accept".to_string(), "text/plain".to_string());
    with_trace.insert("content-length".to_string(), "0".to_string());

    handle_request(&pool, &mut store, &config, &with_trace)?;
    handle_request(&pool, &mut store, &config, &HashMap::new())?;

    tracing::info!(leftover = ?config.trace_id(&store), "requests done");
    Ok(())
}
