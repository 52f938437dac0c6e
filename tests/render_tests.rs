use serde_json::json;
use transect::{Engine, InputDocument};

fn render_input() -> serde_json::Value {
    json!({
        "serialization_settings": { "file": "db.snapshot" },
        "routing_settings": { "bus_wait_time": 6, "bus_velocity": 30 },
        "render_settings": {
            "width": 600.0, "height": 400.0, "padding": 50.0,
            "stop_radius": 5.0, "line_width": 14.0,
            "stop_label_font_size": 20, "stop_label_offset": [7, -3],
            "underlayer_color": [255, 255, 255, 0.85], "underlayer_width": 3.0,
            "color_palette": ["green", "red"],
            "bus_label_font_size": 20, "bus_label_offset": [7, 15],
            "layers": ["bus_lines", "bus_labels", "stop_points", "stop_labels"],
            "outer_margin": 6.0, "company_radius": 3.0, "company_line_width": 1.0,
        },
        "base_requests": [
            { "type": "Stop", "name": "A", "latitude": 0.0, "longitude": 0.0,
              "road_distances": { "B": 1000 } },
            { "type": "Stop", "name": "B", "latitude": 0.0, "longitude": 1.0,
              "road_distances": { "C": 1000 } },
            { "type": "Stop", "name": "C", "latitude": 0.0, "longitude": 2.0 },
            { "type": "Bus", "name": "1", "stops": ["A", "B", "C"], "is_roundtrip": false },
        ],
        "stat_requests": [],
    })
}

#[test]
fn base_map_contains_one_polyline_per_bus() {
    let doc = InputDocument::parse(&render_input()).unwrap();
    let engine = Engine::build(&doc).unwrap();

    let responses = engine.process_all(&[json!({ "id": 1, "type": "Map" })]).unwrap();
    let map = responses[0]["map"].as_str().unwrap();
    assert_eq!(map.matches("<polyline").count(), 1);
    assert!(map.contains("<circle"));
    assert!(map.contains("<text"));
}

#[test]
fn route_overlay_is_a_full_canvas_document_with_backdrop() {
    let doc = InputDocument::parse(&render_input()).unwrap();
    let engine = Engine::build(&doc).unwrap();

    let responses = engine
        .process_all(&[json!({ "id": 1, "type": "Route", "from": "A", "to": "C" })])
        .unwrap();
    let map = responses[0]["map"].as_str().unwrap();
    assert!(map.starts_with("<?xml"));
    assert!(map.contains("<rect"));
    // the overlay re-paints the base map underneath the backdrop plus the route itself
    assert!(map.matches("<polyline").count() >= 1);
}

#[test]
fn map_is_independent_of_request_order() {
    let doc = InputDocument::parse(&render_input()).unwrap();
    let engine = Engine::build(&doc).unwrap();

    let first = engine
        .process_all(&[
            json!({ "id": 1, "type": "Stop", "name": "A" }),
            json!({ "id": 2, "type": "Map" }),
        ])
        .unwrap();
    let second = engine
        .process_all(&[
            json!({ "id": 1, "type": "Map" }),
            json!({ "id": 2, "type": "Stop", "name": "A" }),
        ])
        .unwrap();
    assert_eq!(first[1]["map"], second[0]["map"]);
}
