use approx::assert_relative_eq;
use flowpath_core::{
    Cell, ElevationGrid, FlowDirectionGrid, GeoJsonWriter, GeoPoint, GridGeometry, RunError, Seed,
    Termination, TraceOptions, Tracer, VecSink,
};
use serde_json::Value;

/// 5×5 raster, 10 m cells, anchored at (0, 100).
fn five_by_five() -> GridGeometry {
    GridGeometry::new(5, 5, 10.0, 10.0, GeoPoint::new(0.0, 100.0))
}

fn east_then_south() -> FlowDirectionGrid {
    let mut flow = FlowDirectionGrid::filled(five_by_five(), 0);
    flow.set(0, 0, 1);
    flow.set(0, 1, 4);
    flow
}

#[test]
fn east_then_south_to_sink() {
    let tracer = Tracer::new(east_then_south(), None, TraceOptions::default()).unwrap();
    let path = tracer.trace(&Seed::new(17u32, GeoPoint::new(5.0, 95.0)));

    assert_eq!(path.id, 17);
    assert!(!path.has_z);
    let g = five_by_five();
    assert_eq!(g.point_to_cell(GeoPoint::new(5.0, 95.0)), Cell::new(0, 0));

    let points: Vec<GeoPoint> = path.trace.vertices.iter().map(|v| v.point()).collect();
    assert_eq!(
        points,
        vec![
            GeoPoint::new(5.0, 95.0),
            g.cell_to_point(Cell::new(0, 1)),
            g.cell_to_point(Cell::new(1, 1)),
            g.cell_to_point(Cell::new(1, 1)),
        ]
    );
    assert_eq!(path.trace.termination, Termination::Sink);
}

#[test]
fn surface_supplies_z_for_every_vertex() {
    let g = five_by_five();
    let values: Vec<f32> = (0..25).map(|i| 500.0 - i as f32).collect();
    let surface = ElevationGrid::new(g, values, None).unwrap();
    let tracer = Tracer::new(east_then_south(), Some(surface.clone()), TraceOptions::default()).unwrap();
    assert!(tracer.has_z());

    let trace = tracer.trace_point(GeoPoint::new(5.0, 95.0));
    let cells = [Cell::new(0, 0), Cell::new(0, 1), Cell::new(1, 1), Cell::new(1, 1)];
    for (vertex, cell) in trace.vertices.iter().zip(cells) {
        assert_relative_eq!(vertex.z, surface.get(cell).unwrap() as f64);
    }
}

#[test]
fn geojson_output_correlates_ids() {
    let tracer = Tracer::new(east_then_south(), None, TraceOptions::default()).unwrap();
    let seeds = vec![
        Seed::new(1u64, GeoPoint::new(5.0, 95.0)),
        Seed::new(2u64, GeoPoint::new(45.0, 55.0)),
        Seed::new(3u64, GeoPoint::new(5.0, 10.0)),
    ];
    let mut writer = GeoJsonWriter::new(Vec::new()).with_crs("EPSG:3857");
    let summary = tracer.run(seeds, &mut writer).unwrap();
    assert_eq!(summary.traced, 3);
    assert_eq!(summary.off_grid, 1);

    let doc: Value = serde_json::from_slice(&writer.into_inner()).unwrap();
    let features = doc["features"].as_array().unwrap();
    let ids: Vec<u64> = features.iter().map(|f| f["properties"]["ORIG_FID"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(features[0]["geometry"]["coordinates"].as_array().unwrap().len(), 4);
    assert_eq!(features[1]["geometry"]["coordinates"].as_array().unwrap().len(), 2);
    assert_eq!(features[2]["properties"]["termination"], "off_grid");
}

#[test]
fn loop_in_flow_grid_terminates_under_default_options() {
    // (2,2) -> (2,3) -> (3,3) -> (3,2) -> (2,2)
    let mut flow = FlowDirectionGrid::filled(five_by_five(), 0);
    flow.set(2, 2, 1);
    flow.set(2, 3, 4);
    flow.set(3, 3, 16);
    flow.set(3, 2, 64);
    let tracer = Tracer::new(flow, None, TraceOptions::default()).unwrap();
    let mut sink = VecSink::new();
    let summary = tracer.run(vec![Seed::new('a', GeoPoint::new(25.0, 75.0))], &mut sink).unwrap();

    assert_eq!(summary.cycles, 1);
    let trace = &sink.paths[0].trace;
    assert_eq!(trace.termination, Termination::Cycle { at: Cell::new(2, 2) });
    assert_eq!(trace.vertices.len(), 5);
}

#[test]
fn empty_seed_list_is_rejected() {
    let tracer = Tracer::new(east_then_south(), None, TraceOptions::default()).unwrap();
    let mut sink: VecSink<u64> = VecSink::new();
    let err = tracer.run(Vec::new(), &mut sink).unwrap_err();
    assert!(matches!(err, RunError::NoSeeds));
    assert_eq!(err.to_string(), "no seed points supplied");
}
