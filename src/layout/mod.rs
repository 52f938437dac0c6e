//! Coordinate compressor: assigns each stop and company a non-overlapping grid cell so the
//! renderer can draw routes without backwards or collinear segments.

use crate::catalog::{BusesDict, StopsDict};
use crate::company::Company;
use crate::shared::Coordinate;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("canvas width and height must be positive")]
    NonPositiveCanvas,
}

/// Identifies anything the renderer places on the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlaceId {
    Stop(String),
    Company(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// The assigned screen position of every stop and company. Immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    coords: HashMap<PlaceId, ScreenPoint>,
}

impl Layout {
    pub fn build(
        stops: &StopsDict,
        buses: &BusesDict,
        stop_order: &[String],
        companies: &[Company],
        width: f64,
        height: f64,
        padding: f64,
    ) -> Result<Self, Error> {
        if width <= 0.0 || height <= 0.0 {
            return Err(Error::NonPositiveCanvas);
        }

        let control = control_stops(buses);
        let recomputed = recompute_coordinates(stops, buses, &control);
        let neighbors = neighbor_relation(buses, companies);

        let mut places: Vec<PlaceId> = stop_order.iter().map(|s| PlaceId::Stop(s.clone())).collect();
        for company in companies {
            if let Ok(name) = company.main_name() {
                places.push(PlaceId::Company(name.to_string()));
            }
        }

        let position_of = |place: &PlaceId| -> Coordinate {
            match place {
                PlaceId::Stop(name) => recomputed
                    .get(name)
                    .copied()
                    .unwrap_or_else(|| stops[name].position),
                PlaceId::Company(name) => companies
                    .iter()
                    .find(|c| c.main_name().ok().as_deref() == Some(name.as_str()))
                    .map(|c| c.address.coords)
                    .unwrap_or_default(),
            }
        };

        let x_idx = compress_axis(&places, &neighbors, |p| position_of(p).longitude);
        let y_idx = compress_axis(&places, &neighbors, |p| position_of(p).latitude);

        let max_x = x_idx.values().copied().max().unwrap_or(0);
        let max_y = y_idx.values().copied().max().unwrap_or(0);
        let x_step = if max_x > 0 {
            (width - 2.0 * padding) / max_x as f64
        } else {
            0.0
        };
        let y_step = if max_y > 0 {
            (height - 2.0 * padding) / max_y as f64
        } else {
            0.0
        };

        let mut coords = HashMap::with_capacity(places.len());
        for place in &places {
            let xi = x_idx[place];
            let yi = y_idx[place];
            coords.insert(
                place.clone(),
                ScreenPoint {
                    x: xi as f64 * x_step + padding,
                    y: height - padding - yi as f64 * y_step,
                },
            );
        }

        Ok(Self { coords })
    }

    pub fn position(&self, place: &PlaceId) -> Option<ScreenPoint> {
        self.coords.get(place).copied()
    }
}

/// Endpoints of every bus, stops visited more than twice across all expanded routes, and stops
/// shared by more than one roundtrip bus — the anchors between which intermediate stops are
/// interpolated.
fn control_stops(buses: &BusesDict) -> HashSet<String> {
    let mut visit_counts: HashMap<&str, usize> = HashMap::new();
    let mut roundtrip_membership: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut control = HashSet::new();

    for bus in buses.values() {
        for endpoint in &bus.endpoints {
            control.insert(endpoint.clone());
        }
        for stop in &bus.stops {
            *visit_counts.entry(stop.as_str()).or_insert(0) += 1;
        }
        if bus.is_roundtrip {
            for stop in &bus.stops {
                roundtrip_membership
                    .entry(stop.as_str())
                    .or_default()
                    .insert(bus.name.as_str());
            }
        }
    }

    for (&stop, &count) in &visit_counts {
        if count > 2 {
            control.insert(stop.to_string());
        }
    }
    for (&stop, membership) in &roundtrip_membership {
        if membership.len() > 1 {
            control.insert(stop.to_string());
        }
    }

    control
}

/// Linear interpolation of every non-control stop between the control stops that bracket it on
/// each bus route. A stop untouched by this process keeps its original coordinate.
fn recompute_coordinates(
    stops: &StopsDict,
    buses: &BusesDict,
    control: &HashSet<String>,
) -> HashMap<String, Coordinate> {
    let mut recomputed = HashMap::new();

    for bus in buses.values() {
        let control_positions: Vec<usize> = bus
            .stops
            .iter()
            .enumerate()
            .filter(|(_, stop)| control.contains(*stop))
            .map(|(i, _)| i)
            .collect();

        for pair in control_positions.windows(2) {
            let (i1, i2) = (pair[0], pair[1]);
            let span = i2 - i1;
            if span <= 1 {
                continue;
            }
            let start = stops[&bus.stops[i1]].position;
            let end = stops[&bus.stops[i2]].position;
            for offset in 1..span {
                let stop_name = &bus.stops[i1 + offset];
                if control.contains(stop_name) {
                    continue;
                }
                let t = offset as f64 / span as f64;
                recomputed.insert(
                    stop_name.clone(),
                    Coordinate::new(
                        start.latitude + (end.latitude - start.latitude) * t,
                        start.longitude + (end.longitude - start.longitude) * t,
                    ),
                );
            }
        }
    }

    recomputed
}

/// `N`: stops adjacent on some bus route, plus companies bidirectionally adjacent to their
/// nearby stops.
fn neighbor_relation(
    buses: &BusesDict,
    companies: &[Company],
) -> HashMap<PlaceId, HashSet<PlaceId>> {
    let mut neighbors: HashMap<PlaceId, HashSet<PlaceId>> = HashMap::new();

    for bus in buses.values() {
        for pair in bus.stops.windows(2) {
            let a = PlaceId::Stop(pair[0].clone());
            let b = PlaceId::Stop(pair[1].clone());
            neighbors.entry(a.clone()).or_default().insert(b.clone());
            neighbors.entry(b).or_default().insert(a);
        }
    }

    for company in companies {
        let Ok(name) = company.main_name() else {
            continue;
        };
        let company_place = PlaceId::Company(name.to_string());
        for nearby in &company.nearby_stops {
            let stop_place = PlaceId::Stop(nearby.name.clone());
            neighbors
                .entry(company_place.clone())
                .or_default()
                .insert(stop_place.clone());
            neighbors.entry(stop_place).or_default().insert(company_place.clone());
        }
    }

    neighbors
}

/// Sorts places by `axis_value` ascending and assigns each the smallest index strictly greater
/// than every already-assigned neighbor's index, so adjacent places in `N` never share a cell on
/// this axis.
fn compress_axis(
    places: &[PlaceId],
    neighbors: &HashMap<PlaceId, HashSet<PlaceId>>,
    axis_value: impl Fn(&PlaceId) -> f64,
) -> HashMap<PlaceId, usize> {
    let mut sorted: Vec<&PlaceId> = places.iter().collect();
    sorted.sort_by(|a, b| {
        axis_value(a)
            .partial_cmp(&axis_value(b))
            .unwrap_or(Ordering::Equal)
    });

    let mut idx: HashMap<PlaceId, usize> = HashMap::with_capacity(places.len());
    for place in sorted {
        let best_neighbor = neighbors
            .get(place)
            .into_iter()
            .flatten()
            .filter_map(|neighbor| idx.get(neighbor))
            .max()
            .copied();
        let assigned = match best_neighbor {
            Some(m) => m + 1,
            None => 0,
        };
        idx.insert(place.clone(), assigned);
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn three_stop_bus() -> Catalog {
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
                latitude: 10.0,
                longitude: 10.0,
                road_distances: [("C".to_string(), 1000)].into_iter().collect(),
            },
            Description::Stop {
                name: "C".into(),
                latitude: 20.0,
                longitude: 20.0,
                road_distances: Default::default(),
            },
            Description::Bus {
                name: "1".into(),
                stops: vec!["A".into(), "B".into(), "C".into()],
                is_roundtrip: true,
            },
        ])
        .unwrap()
    }

    #[test]
    fn endpoints_and_branch_stop_are_control() {
        let catalog = three_stop_bus();
        let control = control_stops(&catalog.buses);
        assert!(control.contains("A"));
        assert!(control.contains("C"));
    }

    #[test]
    fn neighbors_get_distinct_axis_indices() {
        let catalog = three_stop_bus();
        let layout = Layout::build(
            &catalog.stops,
            &catalog.buses,
            &catalog.stop_order,
            &[],
            600.0,
            400.0,
            50.0,
        )
        .unwrap();
        let a = layout.position(&PlaceId::Stop("A".into())).unwrap();
        let b = layout.position(&PlaceId::Stop("B".into())).unwrap();
        let c = layout.position(&PlaceId::Stop("C".into())).unwrap();
        assert_ne!(a.x, b.x);
        assert_ne!(b.x, c.x);
        assert_ne!(a.y, b.y);
        assert_ne!(b.y, c.y);
    }

    #[test]
    fn non_positive_canvas_is_a_settings_error() {
        let catalog = three_stop_bus();
        let err = Layout::build(
            &catalog.stops,
            &catalog.buses,
            &catalog.stop_order,
            &[],
            0.0,
            400.0,
            50.0,
        )
        .unwrap_err();
        assert!(matches!(err, Error::NonPositiveCanvas));
    }
}
