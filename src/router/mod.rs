//! The stop–bus routing graph: wait edges and ride edges over a [`crate::graph::Graph`],
//! with an all-pairs precomputation answering [`TransportRouter::find_route`] queries.

use crate::catalog::{compute_stops_distance, BusesDict, StopsDict};
use crate::graph::{EdgeId, Graph, Router, VertexId};
use crate::shared::time::travel_minutes;
use crate::shared::Minutes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] crate::catalog::Error),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoutingSettings {
    /// Minutes spent waiting before boarding any bus.
    pub bus_wait_time: u32,
    pub bus_velocity_kmh: f64,
    pub pedestrian_velocity_kmh: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StopVertexIds {
    pub entry: VertexId,
    pub departure: VertexId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EdgeInfo {
    Bus {
        bus_name: String,
        start_stop_idx: usize,
        finish_stop_idx: usize,
        span_count: usize,
    },
    Wait,
}

/// One leg of a reconstructed route. The `WalkToCompany`/`WaitCompany` variants are never
/// produced by [`TransportRouter::find_route`] itself — they are appended by
/// `crate::company::route` when a bus route is extended to a company.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Wait {
        stop_name: String,
        time: Minutes,
    },
    Bus {
        bus_name: String,
        start_stop_idx: usize,
        finish_stop_idx: usize,
        span_count: usize,
        time: Minutes,
    },
    WalkToCompany {
        time: Minutes,
        stop_from: String,
        company_name: String,
        rubric: String,
    },
    WaitCompany {
        company_name: String,
        time: Minutes,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteInfo {
    pub total_time: Minutes,
    pub items: Vec<Item>,
}

/// The transit routing graph plus its all-pairs precomputation. Immutable after construction.
///
/// Derives `Serialize`/`Deserialize` directly: the all-pairs precomputation is the expensive
/// part of `make_base` (O(V^3)), so the snapshot persists this struct whole rather than
/// rebuilding it from the catalog on every `process_requests` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportRouter {
    pub settings: RoutingSettings,
    pub graph: Graph,
    router: Router,
    pub stop_vertex_ids: HashMap<String, StopVertexIds>,
    /// Indexed by `VertexId`: the stop each vertex belongs to.
    pub vertex_info: Vec<String>,
    /// Indexed by `EdgeId`: what kind of hop each edge represents.
    pub edge_info: Vec<EdgeInfo>,
}

impl TransportRouter {
    pub fn build(
        stops: &StopsDict,
        buses: &BusesDict,
        stop_order: &[String],
        bus_order: &[String],
        settings: RoutingSettings,
    ) -> Result<Self, Error> {
        let mut stop_vertex_ids = HashMap::with_capacity(stop_order.len());
        let mut vertex_info = vec![String::new(); stop_order.len() * 2];

        for (i, stop_name) in stop_order.iter().enumerate() {
            let entry = 2 * i;
            let departure = 2 * i + 1;
            stop_vertex_ids.insert(
                stop_name.clone(),
                StopVertexIds { entry, departure },
            );
            vertex_info[entry] = stop_name.clone();
            vertex_info[departure] = stop_name.clone();
        }

        let mut graph = Graph::new(vertex_info.len());
        let mut edge_info = Vec::new();

        for stop_name in stop_order {
            let ids = stop_vertex_ids[stop_name];
            let edge_id = graph.add_edge(ids.entry, ids.departure, settings.bus_wait_time as f64);
            debug_assert_eq!(edge_id, edge_info.len());
            edge_info.push(EdgeInfo::Wait);
        }

        for bus_name in bus_order {
            let bus = &buses[bus_name];
            for i in 0..bus.stops.len() {
                let mut distance = 0u64;
                for j in (i + 1)..bus.stops.len() {
                    distance += compute_stops_distance(stops, &bus.stops[j - 1], &bus.stops[j])?;
                    let from = stop_vertex_ids[&bus.stops[i]].departure;
                    let to = stop_vertex_ids[&bus.stops[j]].entry;
                    let weight = travel_minutes(distance as f64, settings.bus_velocity_kmh);
                    let edge_id = graph.add_edge(from, to, weight.into());
                    debug_assert_eq!(edge_id, edge_info.len());
                    edge_info.push(EdgeInfo::Bus {
                        bus_name: bus_name.clone(),
                        start_stop_idx: i,
                        finish_stop_idx: j,
                        span_count: j - i,
                    });
                }
            }
        }

        let router = Router::new(&graph);

        Ok(Self {
            settings,
            graph,
            router,
            stop_vertex_ids,
            vertex_info,
            edge_info,
        })
    }

    /// Reconstructs the fastest route between two stops, or `None` if the stops are known but
    /// unreachable from one another. Returns `None` (not an error) for unknown stop names too —
    /// callers distinguish "unknown stop" from "no route" using [`Self::stop_vertex_ids`].
    pub fn find_route(&self, from: &str, to: &str) -> Option<RouteInfo> {
        if from == to {
            return Some(RouteInfo {
                total_time: Minutes::ZERO,
                items: Vec::new(),
            });
        }

        let from_ids = self.stop_vertex_ids.get(from)?;
        let to_ids = self.stop_vertex_ids.get(to)?;
        let result = self.router.route(&self.graph, from_ids.entry, to_ids.entry)?;

        let items = result
            .edges
            .iter()
            .map(|&edge_id| self.edge_to_item(edge_id))
            .collect();

        Some(RouteInfo {
            total_time: Minutes(result.weight),
            items,
        })
    }

    fn edge_to_item(&self, edge_id: EdgeId) -> Item {
        let edge = self.graph.edge(edge_id);
        match &self.edge_info[edge_id] {
            EdgeInfo::Wait => Item::Wait {
                stop_name: self.vertex_info[edge.from].clone(),
                time: Minutes(edge.weight),
            },
            EdgeInfo::Bus {
                bus_name,
                start_stop_idx,
                finish_stop_idx,
                span_count,
            } => Item::Bus {
                bus_name: bus_name.clone(),
                start_stop_idx: *start_stop_idx,
                finish_stop_idx: *finish_stop_idx,
                span_count: *span_count,
                time: Minutes(edge.weight),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn two_stop_one_bus() -> Catalog {
        use crate::catalog::Description;
        Catalog::build(vec![
            Description::Stop {
                name: "A".into(),
                latitude: 0.0,
                longitude: 0.0,
                road_distances: [("B".to_string(), 1000)].into_iter().collect(),
            },
            Description::Stop {
                name: "B".into(),
                latitude: 0.0,
                longitude: 1.0,
                road_distances: Default::default(),
            },
            Description::Bus {
                name: "1".into(),
                stops: vec!["A".into(), "B".into()],
                is_roundtrip: false,
            },
        ])
        .unwrap()
    }

    fn settings() -> RoutingSettings {
        RoutingSettings {
            bus_wait_time: 6,
            bus_velocity_kmh: 30.0,
            pedestrian_velocity_kmh: None,
        }
    }

    #[test]
    fn matches_spec_worked_example() {
        let catalog = two_stop_one_bus();
        let router = TransportRouter::build(
            &catalog.stops,
            &catalog.buses,
            &catalog.stop_order,
            &catalog.bus_order,
            settings(),
        )
        .unwrap();

        let route = router.find_route("A", "B").unwrap();
        assert!((route.total_time.0 - 8.0).abs() < 1e-9);
        assert_eq!(
            route.items,
            vec![
                Item::Wait {
                    stop_name: "A".into(),
                    time: Minutes(6.0)
                },
                Item::Bus {
                    bus_name: "1".into(),
                    start_stop_idx: 0,
                    finish_stop_idx: 1,
                    span_count: 1,
                    time: Minutes(2.0)
                },
            ]
        );
    }

    #[test]
    fn same_stop_is_zero_time_no_items() {
        let catalog = two_stop_one_bus();
        let router = TransportRouter::build(
            &catalog.stops,
            &catalog.buses,
            &catalog.stop_order,
            &catalog.bus_order,
            settings(),
        )
        .unwrap();
        let route = router.find_route("A", "A").unwrap();
        assert_eq!(route.total_time, Minutes::ZERO);
        assert!(route.items.is_empty());
    }

    #[test]
    fn isolated_stop_has_no_route() {
        use crate::catalog::Description;
        let mut catalog = two_stop_one_bus();
        let isolated = Catalog::build(vec![Description::Stop {
            name: "C".into(),
            latitude: 5.0,
            longitude: 5.0,
            road_distances: Default::default(),
        }])
        .unwrap();
        catalog.stops.insert(
            "C".to_string(),
            isolated.stops["C"].clone(),
        );
        catalog.stop_order.push("C".to_string());

        let router = TransportRouter::build(
            &catalog.stops,
            &catalog.buses,
            &catalog.stop_order,
            &catalog.bus_order,
            settings(),
        )
        .unwrap();
        assert!(router.find_route("A", "C").is_none());
    }

    #[test]
    fn items_alternate_wait_then_bus() {
        let catalog = two_stop_one_bus();
        let router = TransportRouter::build(
            &catalog.stops,
            &catalog.buses,
            &catalog.stop_order,
            &catalog.bus_order,
            settings(),
        )
        .unwrap();
        let route = router.find_route("A", "B").unwrap();
        for (i, item) in route.items.iter().enumerate() {
            let expect_wait = i % 2 == 0;
            assert_eq!(matches!(item, Item::Wait { .. }), expect_wait);
        }
    }

    #[test]
    fn non_roundtrip_route_is_symmetric() {
        let catalog = two_stop_one_bus();
        let router = TransportRouter::build(
            &catalog.stops,
            &catalog.buses,
            &catalog.stop_order,
            &catalog.bus_order,
            settings(),
        )
        .unwrap();
        let a_to_b = router.find_route("A", "B").unwrap();
        let b_to_a = router.find_route("B", "A").unwrap();
        assert!((a_to_b.total_time.0 - b_to_a.total_time.0).abs() < 1e-6);
    }
}
