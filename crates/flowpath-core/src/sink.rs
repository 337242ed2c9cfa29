//! Consumers of finished traces.
//!
//! The tracer hands each `TracedPath` to a `FeatureSink` in seed order.
//! `GeoJsonWriter` streams a FeatureCollection of LineStrings; `VecSink`
//! keeps everything in memory.
use std::io::Write;

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::EmitError;
use crate::tracer::TracedPath;

pub trait FeatureSink<I> {
    fn emit(&mut self, path: TracedPath<I>) -> Result<(), EmitError>;

    /// Called once after the last `emit`.
    fn finish(&mut self) -> Result<(), EmitError> {
        Ok(())
    }
}

/// Collects traced paths in memory.
#[derive(Debug)]
pub struct VecSink<I> {
    pub paths: Vec<TracedPath<I>>,
}

impl<I> VecSink<I> {
    pub fn new() -> Self {
        Self { paths: Vec::new() }
    }

    pub fn into_inner(self) -> Vec<TracedPath<I>> {
        self.paths
    }
}

impl<I> Default for VecSink<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> FeatureSink<I> for VecSink<I> {
    fn emit(&mut self, path: TracedPath<I>) -> Result<(), EmitError> {
        self.paths.push(path);
        Ok(())
    }
}

/// Streams traced paths as a GeoJSON FeatureCollection.
///
/// Each feature is a LineString whose `ORIG_FID` property carries the seed
/// id.  A single-vertex trace repeats its only position, since a LineString
/// needs at least two.
pub struct GeoJsonWriter<W: Write> {
    out: W,
    crs: Option<String>,
    written: usize,
    opened: bool,
}

impl<W: Write> GeoJsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, crs: None, written: 0, opened: false }
    }

    /// Tag the collection with a named CRS, e.g. `EPSG:32633`.
    pub fn with_crs(mut self, crs: impl Into<String>) -> Self {
        self.crs = Some(crs.into());
        self
    }

    pub fn features_written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn open(&mut self) -> Result<(), EmitError> {
        if self.opened {
            return Ok(());
        }
        self.opened = true;
        write!(self.out, r#"{{"type":"FeatureCollection","#)?;
        if let Some(name) = &self.crs {
            let crs = json!({ "type": "name", "properties": { "name": name } });
            write!(self.out, r#""crs":{},"#, serde_json::to_string(&crs)?)?;
        }
        write!(self.out, r#""features":["#)?;
        Ok(())
    }
}

impl<I: Serialize, W: Write> FeatureSink<I> for GeoJsonWriter<W> {
    fn emit(&mut self, path: TracedPath<I>) -> Result<(), EmitError> {
        self.open()?;
        if self.written > 0 {
            self.out.write_all(b",")?;
        }
        serde_json::to_writer(&mut self.out, &feature_json(&path)?)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), EmitError> {
        self.open()?;
        self.out.write_all(b"]}\n")?;
        self.out.flush()?;
        Ok(())
    }
}

fn feature_json<I: Serialize>(path: &TracedPath<I>) -> Result<Value, EmitError> {
    let mut coordinates: Vec<Value> = path
        .trace
        .vertices
        .iter()
        .map(|v| if path.has_z { json!([v.x, v.y, v.z]) } else { json!([v.x, v.y]) })
        .collect();
    if coordinates.len() == 1 {
        coordinates.push(coordinates[0].clone());
    }

    Ok(json!({
        "type": "Feature",
        "geometry": { "type": "LineString", "coordinates": coordinates },
        "properties": {
            "ORIG_FID": serde_json::to_value(&path.id)?,
            "termination": path.trace.termination.label(),
            "steps": path.trace.steps,
        },
    }))
}
