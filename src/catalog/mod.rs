//! Stop/bus catalog assembly: parses the heterogeneous input description list into
//! [`StopsDict`]/[`BusesDict`], expands non-roundtrip bus routes, and derives per-bus stats
//! and per-stop bus membership.

use crate::shared::Coordinate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no road distance recorded between `{a}` and `{b}`")]
    MissingRoadDistance { a: String, b: String },
    #[error("bus `{bus}` references unknown stop `{stop}`")]
    UnknownStop { bus: String, stop: String },
}

/// One entry of the input's `base_requests` list, before it is sorted into stops/buses.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Description {
    Stop {
        name: String,
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        road_distances: HashMap<String, u32>,
    },
    Bus {
        name: String,
        stops: Vec<String>,
        is_roundtrip: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub name: String,
    pub position: Coordinate,
    pub distances: HashMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus {
    pub name: String,
    /// The expanded (palindromic, for non-roundtrip routes) stop sequence.
    pub stops: Vec<String>,
    pub endpoints: Vec<String>,
    pub is_roundtrip: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BusStats {
    pub stop_count: usize,
    pub unique_stop_count: usize,
    pub road_route_length: u64,
    pub geo_route_length: f64,
}

impl BusStats {
    /// `road_route_length / geo_route_length`; undefined (NaN) only if the bus has a single
    /// stop, in which case curvature is meaningless and callers should not ask for it.
    pub fn curvature(&self) -> f64 {
        self.road_route_length as f64 / self.geo_route_length
    }
}

pub type StopsDict = HashMap<String, Stop>;
pub type BusesDict = HashMap<String, Bus>;

/// Mirrors a bus's non-roundtrip forward sequence into forward+reverse, without repeating the
/// final stop (`descriptions.cpp`'s `ParseStops`).
fn expand_stops(stops: Vec<String>, is_roundtrip: bool) -> Vec<String> {
    if is_roundtrip || stops.len() <= 1 {
        return stops;
    }
    let mut expanded = Vec::with_capacity(stops.len() * 2 - 1);
    expanded.extend(stops.iter().cloned());
    for stop in stops[..stops.len() - 1].iter().rev() {
        expanded.push(stop.clone());
    }
    expanded
}

/// The terminal stops of a bus, from its raw (not yet expanded) stop sequence: just the first
/// stop for a roundtrip route, first+last for a non-roundtrip one (unless they coincide).
fn endpoints_of(raw_stops: &[String], is_roundtrip: bool) -> Vec<String> {
    match raw_stops {
        [] => Vec::new(),
        [only] => vec![only.clone()],
        [first, .., last] if is_roundtrip => {
            let _ = last;
            vec![first.clone()]
        }
        [first, .., last] if first == last => vec![first.clone()],
        [first, .., last] => vec![first.clone(), last.clone()],
    }
}

/// `a.distances[b]` if present, else `b.distances[a]` (distances are directional but a missing
/// reverse entry reuses the forward value).
pub fn compute_stops_distance(stops: &StopsDict, a: &str, b: &str) -> Result<u32, Error> {
    if let Some(stop_a) = stops.get(a) {
        if let Some(&d) = stop_a.distances.get(b) {
            return Ok(d);
        }
    }
    if let Some(stop_b) = stops.get(b) {
        if let Some(&d) = stop_b.distances.get(a) {
            return Ok(d);
        }
    }
    Err(Error::MissingRoadDistance {
        a: a.to_string(),
        b: b.to_string(),
    })
}

fn road_route_length(stops_dict: &StopsDict, expanded: &[String]) -> Result<u64, Error> {
    let mut total = 0u64;
    for pair in expanded.windows(2) {
        total += compute_stops_distance(stops_dict, &pair[0], &pair[1])? as u64;
    }
    Ok(total)
}

fn geo_route_length(stops_dict: &StopsDict, expanded: &[String]) -> f64 {
    expanded
        .windows(2)
        .map(|pair| {
            let a = &stops_dict[&pair[0]].position;
            let b = &stops_dict[&pair[1]].position;
            a.distance_to(b)
        })
        .sum()
}

/// The assembled, immutable catalog of stops and buses plus their derived stats.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub stops: StopsDict,
    pub buses: BusesDict,
    pub bus_stats: HashMap<String, BusStats>,
    pub stop_buses: HashMap<String, BTreeSet<String>>,
    /// Stop names in input order — the router and layout aligner key off this order for
    /// deterministic vertex ids and tie-breaking (§9(a)), not `HashMap` iteration order.
    pub stop_order: Vec<String>,
    /// Bus names in input order — the renderer cycles the color palette in this order (§4.6).
    pub bus_order: Vec<String>,
}

impl Catalog {
    pub fn build(descriptions: Vec<Description>) -> Result<Self, Error> {
        let mut stops: StopsDict = HashMap::new();
        let mut stop_order = Vec::new();
        let mut bus_descriptions = Vec::new();
        let mut bus_order = Vec::new();

        for description in descriptions {
            match description {
                Description::Stop {
                    name,
                    latitude,
                    longitude,
                    road_distances,
                } => {
                    stop_order.push(name.clone());
                    stops.insert(
                        name.clone(),
                        Stop {
                            name,
                            position: Coordinate::new(latitude, longitude),
                            distances: road_distances,
                        },
                    );
                }
                Description::Bus {
                    name,
                    stops: route_stops,
                    is_roundtrip,
                } => {
                    bus_order.push(name.clone());
                    bus_descriptions.push((name, route_stops, is_roundtrip));
                }
            }
        }

        let mut buses: BusesDict = HashMap::new();
        let mut bus_stats = HashMap::new();
        let mut stop_buses: HashMap<String, BTreeSet<String>> = HashMap::new();

        for (name, raw_stops, is_roundtrip) in bus_descriptions {
            for stop in &raw_stops {
                if !stops.contains_key(stop) {
                    return Err(Error::UnknownStop {
                        bus: name,
                        stop: stop.clone(),
                    });
                }
            }
            let endpoints = endpoints_of(&raw_stops, is_roundtrip);
            let expanded = expand_stops(raw_stops, is_roundtrip);

            let unique_stop_count = expanded.iter().collect::<BTreeSet<_>>().len();
            let stats = BusStats {
                stop_count: expanded.len(),
                unique_stop_count,
                road_route_length: road_route_length(&stops, &expanded)?,
                geo_route_length: geo_route_length(&stops, &expanded),
            };

            for stop in &expanded {
                stop_buses.entry(stop.clone()).or_default().insert(name.clone());
            }

            bus_stats.insert(name.clone(), stats);
            buses.insert(
                name.clone(),
                Bus {
                    name,
                    stops: expanded,
                    endpoints,
                    is_roundtrip,
                },
            );
        }

        Ok(Self {
            stops,
            buses,
            bus_stats,
            stop_buses,
            stop_order,
            bus_order,
        })
    }

    /// The sorted set of bus names that pass through `stop_name`, or `None` if the stop is
    /// unknown.
    pub fn buses_at_stop(&self, stop_name: &str) -> Option<&BTreeSet<String>> {
        if !self.stops.contains_key(stop_name) {
            return None;
        }
        Some(self.stop_buses.get(stop_name).unwrap_or(&EMPTY_BUS_SET))
    }
}

static EMPTY_BUS_SET: BTreeSet<String> = BTreeSet::new();
