use serde::{Deserialize, Serialize};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use flowpath_core::{
    ElevationGrid, FlowDirectionGrid, RunSummary, Seed, TraceOptions, TracedPath, Tracer, VecSink,
};

/// JSON request accepted by `trace_downstream`.
#[derive(Deserialize)]
struct TraceRequest {
    flow: FlowDirectionGrid,
    #[serde(default)]
    surface: Option<ElevationGrid>,
    seeds: Vec<Seed<Value>>,
    #[serde(default)]
    options: TraceOptions,
}

#[derive(Serialize)]
struct TraceResponse {
    paths: Vec<TracedPath<Value>>,
    summary: RunSummary,
    elapsed_ms: f64,
}

fn js_err(context: &str, e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{context}: {e}"))
}

/// Trace every seed in `request_json` and return
/// `{ paths: TracedPath[], summary: RunSummary, elapsed_ms }`.
#[wasm_bindgen]
pub fn trace_downstream(request_json: &str) -> Result<JsValue, JsValue> {
    let request: TraceRequest =
        serde_json::from_str(request_json).map_err(|e| js_err("Invalid request", e))?;

    let tracer = Tracer::new(request.flow, request.surface, request.options)
        .map_err(|e| js_err("Invalid grids", e))?;

    let started = js_sys::Date::now();
    let mut sink = VecSink::new();
    let summary = tracer
        .run(request.seeds, &mut sink)
        .map_err(|e| js_err("Trace failed", e))?;

    // Plain JS objects rather than Maps for the nested JSON ids.
    let response = TraceResponse {
        paths: sink.into_inner(),
        summary,
        elapsed_ms: js_sys::Date::now() - started,
    };
    response
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| js_err("Serialization failed", e))
}
