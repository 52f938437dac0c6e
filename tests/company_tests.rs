use serde_json::json;
use transect::{Engine, InputDocument};

fn depot_input() -> serde_json::Value {
    json!({
        "serialization_settings": { "file": "db.snapshot" },
        "routing_settings": { "bus_wait_time": 6, "bus_velocity": 30, "pedestrian_velocity": 60 },
        "render_settings": {
            "width": 600.0, "height": 400.0, "padding": 50.0,
            "stop_radius": 5.0, "line_width": 14.0,
            "stop_label_font_size": 20, "stop_label_offset": [7, -3],
            "underlayer_color": [255, 255, 255, 0.85], "underlayer_width": 3.0,
            "color_palette": ["green"],
            "bus_label_font_size": 20, "bus_label_offset": [7, 15],
            "layers": ["bus_lines", "stop_points", "company_points"],
            "outer_margin": 6.0, "company_radius": 3.0, "company_line_width": 1.0,
        },
        "base_requests": [
            { "type": "Stop", "name": "A", "latitude": 0.0, "longitude": 0.0,
              "road_distances": { "B": 1000 } },
            { "type": "Stop", "name": "B", "latitude": 0.0, "longitude": 1.0 },
            { "type": "Bus", "name": "1", "stops": ["A", "B"], "is_roundtrip": false },
        ],
        "yellow_pages": {
            "rubrics": { "1": { "name": "Food" } },
            "companies": [{
                "names": [{ "value": "Shop", "type": "MAIN" }],
                "rubrics": [1],
                "nearby_stops": [{ "name": "B", "meters": 300 }],
                "working_time": { "intervals": [
                    { "day": "MONDAY", "minutes_from": 720, "minutes_to": 1440 }
                ]},
            }],
        },
        "stat_requests": [],
    })
}

#[test]
fn find_companies_by_rubric_and_url_intersect() {
    let doc = InputDocument::parse(&depot_input()).unwrap();
    let engine = Engine::build(&doc).unwrap();

    let responses = engine
        .process_all(&[json!({ "id": 1, "type": "FindCompanies", "rubrics": ["Food"] })])
        .unwrap();
    assert_eq!(responses[0]["companies"], json!(["Shop"]));

    let miss = engine
        .process_all(&[json!({ "id": 2, "type": "FindCompanies", "names": ["Nobody"] })])
        .unwrap();
    assert_eq!(miss[0]["companies"], json!([]));
}

#[test]
fn depot_route_waits_for_opening_and_reports_walk_item() {
    let doc = InputDocument::parse(&depot_input()).unwrap();
    let engine = Engine::build(&doc).unwrap();

    let responses = engine
        .process_all(&[json!({
            "id": 1,
            "type": "FindDepotRoute",
            "from": "A",
            "datetime": 590.0,
            "names": ["Shop"],
        })])
        .unwrap();
    let response = &responses[0];

    // bus(A->B) = 8, walk 300m @ 60km/h = 0.3 min, arrival = 598.3, closed until 720.
    let expected = 8.0 + 0.3 + (720.0 - 598.3);
    assert!((response["total_time"].as_f64().unwrap() - expected).abs() < 1e-6);

    let items = response["items"].as_array().unwrap();
    let walk = items
        .iter()
        .find(|item| item["type"] == json!("WalkToCompany"))
        .expect("walk item present");
    assert_eq!(walk["company"], json!("Shop"));
    assert_eq!(walk["stop_name"], json!("B"));

    // WaitCompany has no item shape in the response even though it contributed to total_time.
    assert!(items.iter().all(|item| item["type"] != json!("WaitCompany")));
}

#[test]
fn depot_route_with_no_matching_company_is_not_found() {
    let doc = InputDocument::parse(&depot_input()).unwrap();
    let engine = Engine::build(&doc).unwrap();

    let responses = engine
        .process_all(&[json!({
            "id": 1,
            "type": "FindDepotRoute",
            "from": "A",
            "datetime": 0.0,
            "names": ["Nobody"],
        })])
        .unwrap();
    assert_eq!(responses[0]["error_message"], json!("not found"));
}

#[test]
fn depot_route_without_pedestrian_velocity_is_a_fatal_error() {
    let mut input = depot_input();
    input["routing_settings"] = json!({ "bus_wait_time": 6, "bus_velocity": 30 });
    let doc = InputDocument::parse(&input).unwrap();
    let engine = Engine::build(&doc).unwrap();

    let err = engine
        .process_all(&[json!({
            "id": 1,
            "type": "FindDepotRoute",
            "from": "A",
            "datetime": 0.0,
            "names": ["Shop"],
        })])
        .unwrap_err();
    assert!(err.to_string().contains("pedestrian velocity"));
}
