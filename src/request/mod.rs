//! JSON request/response handling: parses the whole input document (`main.cpp`'s
//! `input_map`), parses the yellow-pages company records (`companies_catalog.cpp`'s
//! `ReadCompany`), and dispatches `stat_requests` to their handlers (`requests.cpp`).

use crate::catalog::{Catalog, Description};
use crate::company::{
    Address, Company, CompanyCatalog, CompanyFilter, Day, Name, NameType, NearbyStop, Phone,
    PhoneQuery, PhoneType, Url, WorkingTime, WorkingTimeInterval,
};
use crate::render::{Painter, RenderSettings};
use crate::router::{Item, RouteInfo, RoutingSettings, TransportRouter};
use crate::shared::Minutes;
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("input field `{0}` is missing or malformed")]
    InvalidField(String),
    #[error("unknown request type `{0}`")]
    UnknownRequestType(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Catalog(#[from] crate::catalog::Error),
    #[error(transparent)]
    Router(#[from] crate::router::Error),
    #[error(transparent)]
    Company(#[from] crate::company::Error),
    #[error(transparent)]
    CompanyRoute(#[from] crate::company::route::Error),
    #[error(transparent)]
    Render(#[from] crate::render::Error),
    #[error(transparent)]
    Snapshot(#[from] crate::snapshot::Error),
}

fn field<'a>(value: &'a Value, name: &str) -> Result<&'a Value, Error> {
    value.get(name).ok_or_else(|| Error::InvalidField(name.to_string()))
}

fn str_field<'a>(value: &'a Value, name: &str) -> Result<&'a str, Error> {
    field(value, name)?
        .as_str()
        .ok_or_else(|| Error::InvalidField(name.to_string()))
}

fn opt_str(value: &Value, name: &str) -> Option<String> {
    value.get(name).and_then(Value::as_str).map(str::to_string)
}

fn string_array(value: &Value, name: &str) -> Vec<String> {
    value
        .get(name)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

/// Parses a `coords` object whose `lat`/`lon` may be JSON numbers or numeric strings (the
/// original data set used strings here; this spec's stop coordinates use plain numbers, so both
/// are accepted).
fn parse_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn parse_address(value: &Value) -> Address {
    let Some(coords) = value.get("coords") else {
        return Address::default();
    };
    let latitude = coords.get("lat").and_then(parse_numeric).unwrap_or(0.0);
    let longitude = coords.get("lon").and_then(parse_numeric).unwrap_or(0.0);
    Address {
        coords: crate::shared::Coordinate::new(latitude, longitude),
    }
}

fn parse_name(value: &Value) -> Result<Name, Error> {
    let text = str_field(value, "value")?.to_string();
    let kind = match opt_str(value, "type") {
        Some(raw) => match raw.as_str() {
            "MAIN" => NameType::Main,
            "SHORT" => NameType::Short,
            "SYNONYM" => NameType::Synonym,
            other => return Err(Error::InvalidField(format!("names[].type = `{other}`"))),
        },
        None => NameType::Synonym,
    };
    Ok(Name { value: text, kind })
}

fn parse_phone(value: &Value) -> Result<Phone, Error> {
    let kind = match opt_str(value, "type") {
        Some(raw) => Some(match raw.as_str() {
            "PHONE" => PhoneType::Phone,
            "FAX" => PhoneType::Fax,
            other => return Err(Error::InvalidField(format!("phones[].type = `{other}`"))),
        }),
        None => None,
    };
    Ok(Phone {
        kind,
        country_code: opt_str(value, "country_code").unwrap_or_default(),
        local_code: opt_str(value, "local_code").unwrap_or_default(),
        number: opt_str(value, "number").unwrap_or_default(),
        extension: opt_str(value, "extension").unwrap_or_default(),
    })
}

fn parse_nearby_stop(value: &Value) -> NearbyStop {
    NearbyStop {
        name: opt_str(value, "name").unwrap_or_default(),
        meters: value.get("meters").and_then(Value::as_u64).unwrap_or(0) as u32,
    }
}

fn parse_day(raw: &str) -> Result<Day, Error> {
    Ok(match raw {
        "EVERYDAY" => Day::Everyday,
        "MONDAY" => Day::Monday,
        "TUESDAY" => Day::Tuesday,
        "WEDNESDAY" => Day::Wednesday,
        "THURSDAY" => Day::Thursday,
        "FRIDAY" => Day::Friday,
        "SATURDAY" => Day::Saturday,
        "SUNDAY" => Day::Sunday,
        other => return Err(Error::InvalidField(format!("working_time day = `{other}`"))),
    })
}

fn parse_working_time(value: &Value) -> Result<WorkingTime, Error> {
    let Some(intervals) = value.get("intervals").and_then(Value::as_array) else {
        return Ok(WorkingTime::default());
    };
    let mut parsed = Vec::with_capacity(intervals.len());
    for interval in intervals {
        parsed.push(WorkingTimeInterval {
            day: parse_day(str_field(interval, "day")?)?,
            minutes_from: field(interval, "minutes_from")?
                .as_i64()
                .ok_or_else(|| Error::InvalidField("minutes_from".to_string()))?,
            minutes_to: field(interval, "minutes_to")?
                .as_i64()
                .ok_or_else(|| Error::InvalidField("minutes_to".to_string()))?,
        });
    }
    Ok(WorkingTime { intervals: parsed })
}

/// Parses one `yellow_pages.companies[]` entry into a [`Company`] (`ReadCompany`).
pub fn parse_company(value: &Value) -> Result<Company, Error> {
    let names = match value.get("names").and_then(Value::as_array) {
        Some(items) => items.iter().map(parse_name).collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };
    let phones = match value.get("phones").and_then(Value::as_array) {
        Some(items) => items.iter().map(parse_phone).collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };
    let urls = value
        .get("urls")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.get("value").and_then(Value::as_str))
                .map(|s| Url { value: s.to_string() })
                .collect()
        })
        .unwrap_or_default();
    let rubrics = value
        .get("rubrics")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_u64).collect())
        .unwrap_or_default();
    let nearby_stops = value
        .get("nearby_stops")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(parse_nearby_stop).collect())
        .unwrap_or_default();
    let address = value.get("address").map(parse_address).unwrap_or_default();
    let working_time = match value.get("working_time") {
        Some(wt) => parse_working_time(wt)?,
        None => WorkingTime::default(),
    };

    Ok(Company {
        names,
        phones,
        urls,
        rubrics,
        address,
        nearby_stops,
        working_time,
    })
}

fn parse_rubrics(value: &Value) -> HashMap<u64, String> {
    let Some(map) = value.as_object() else {
        return HashMap::new();
    };
    map.iter()
        .filter_map(|(id, entry)| {
            let id: u64 = id.parse().ok()?;
            let name = entry.get("name")?.as_str()?.to_string();
            Some((id, name))
        })
        .collect()
}

/// Parses the `names`/`urls`/`rubrics`/`phones` company-query fields shared by `FindCompanies`
/// and `FindDepotRoute` requests (`CompanyQuery::ReadCompany`). Filter rubrics are rubric
/// *names*, matched against the rubric dictionary the same way a company's own rubric ids are.
pub fn parse_company_filter(value: &Value) -> CompanyFilter {
    let phones = value
        .get("phones")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|p| PhoneQuery {
                    kind: opt_str(p, "type").and_then(|t| match t.as_str() {
                        "PHONE" => Some(PhoneType::Phone),
                        "FAX" => Some(PhoneType::Fax),
                        _ => None,
                    }),
                    country_code: opt_str(p, "country_code").unwrap_or_default(),
                    local_code: opt_str(p, "local_code").unwrap_or_default(),
                    number: opt_str(p, "number").unwrap_or_default(),
                    extension: opt_str(p, "extension").unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    CompanyFilter {
        names: string_array(value, "names"),
        rubrics: string_array(value, "rubrics"),
        urls: string_array(value, "urls"),
        phones,
    }
}

/// The much smaller input document a `process_requests` run reads: just the snapshot file to
/// load and the requests to answer, no base data.
pub struct StatsInput {
    pub file: String,
    pub stat_requests: Vec<Value>,
}

impl StatsInput {
    pub fn parse(doc: &Value) -> Result<Self, Error> {
        let file = str_field(field(doc, "serialization_settings")?, "file")?.to_string();
        let stat_requests = field(doc, "stat_requests")?
            .as_array()
            .ok_or_else(|| Error::InvalidField("stat_requests".to_string()))?
            .clone();
        Ok(Self { file, stat_requests })
    }
}

/// Everything parsed out of the single input JSON document (`main.cpp`'s `input_map`).
pub struct InputDocument {
    pub file: String,
    pub descriptions: Vec<Description>,
    pub routing_settings: RoutingSettings,
    pub render_settings: RenderSettings,
    pub rubrics: HashMap<u64, String>,
    pub companies: Vec<Company>,
    pub stat_requests: Vec<Value>,
}

impl InputDocument {
    pub fn parse(doc: &Value) -> Result<Self, Error> {
        let file = str_field(field(doc, "serialization_settings")?, "file")?.to_string();

        let descriptions = field(doc, "base_requests")?
            .as_array()
            .ok_or_else(|| Error::InvalidField("base_requests".to_string()))?
            .iter()
            .map(|node| serde_json::from_value(node.clone()).map_err(Error::from))
            .collect::<Result<Vec<Description>, _>>()?;

        let routing_json = field(doc, "routing_settings")?;
        let routing_settings = RoutingSettings {
            bus_wait_time: field(routing_json, "bus_wait_time")?
                .as_u64()
                .ok_or_else(|| Error::InvalidField("bus_wait_time".to_string()))? as u32,
            bus_velocity_kmh: field(routing_json, "bus_velocity")?
                .as_f64()
                .ok_or_else(|| Error::InvalidField("bus_velocity".to_string()))?,
            pedestrian_velocity_kmh: routing_json.get("pedestrian_velocity").and_then(Value::as_f64),
        };

        let render_settings = RenderSettings::from_json(field(doc, "render_settings")?)?;

        let (rubrics, companies) = match doc.get("yellow_pages") {
            Some(yp) => {
                let rubrics = yp.get("rubrics").map(parse_rubrics).unwrap_or_default();
                let companies = yp
                    .get("companies")
                    .and_then(Value::as_array)
                    .map(|items| items.iter().map(parse_company).collect::<Result<Vec<_>, _>>())
                    .transpose()?
                    .unwrap_or_default();
                (rubrics, companies)
            }
            None => (HashMap::new(), Vec::new()),
        };

        let stat_requests = field(doc, "stat_requests")?
            .as_array()
            .ok_or_else(|| Error::InvalidField("stat_requests".to_string()))?
            .clone();

        Ok(Self {
            file,
            descriptions,
            routing_settings,
            render_settings,
            rubrics,
            companies,
            stat_requests,
        })
    }
}

/// The fully constructed engine: catalog, router, company catalog and painter, wired together
/// to answer `stat_requests` (`TransportCatalog` on the original side).
pub struct Engine {
    pub catalog: Catalog,
    pub router: TransportRouter,
    pub companies: CompanyCatalog,
    pub painter: Painter,
}

impl Engine {
    pub fn build(input: &InputDocument) -> Result<Self, Error> {
        let catalog = Catalog::build(input.descriptions.clone())?;
        let router = TransportRouter::build(
            &catalog.stops,
            &catalog.buses,
            &catalog.stop_order,
            &catalog.bus_order,
            input.routing_settings,
        )?;
        let companies = CompanyCatalog::build(input.rubrics.clone(), input.companies.clone())?;
        let painter = Painter::build(
            input.render_settings.clone(),
            &catalog.stops,
            &catalog.buses,
            &catalog.stop_order,
            &catalog.bus_order,
            &companies.companies,
            companies.rubrics.clone(),
        )?;
        Ok(Self {
            catalog,
            router,
            companies,
            painter,
        })
    }

    pub fn from_snapshot(snapshot: crate::snapshot::Snapshot) -> Result<Self, Error> {
        let painter = snapshot.build_painter()?;
        Ok(Self {
            catalog: snapshot.catalog,
            router: snapshot.router,
            companies: snapshot.companies,
            painter,
        })
    }

    pub fn into_snapshot(self) -> crate::snapshot::Snapshot {
        crate::snapshot::Snapshot {
            catalog: self.catalog,
            router: self.router,
            companies: self.companies,
            render_settings: self.painter.settings().clone(),
        }
    }

    /// Answers every request in order. `dispatch` already turns query-level misses (unknown
    /// stop/bus, no route, no matching company) into an `Ok` `{error_message: "not found"}`
    /// body, so any `Err` that reaches here is Structural or Settings (§7) — fatal, and stops
    /// the whole batch rather than being folded into a response.
    pub fn process_all(&self, requests: &[Value]) -> Result<Vec<Value>, Error> {
        requests.iter().map(|request| self.process_one(request)).collect()
    }

    fn process_one(&self, request: &Value) -> Result<Value, Error> {
        let id = request.get("id").cloned().unwrap_or(Value::Null);
        let mut response = self.dispatch(request)?;
        if let Value::Object(map) = &mut response {
            map.insert("request_id".to_string(), id);
        }
        Ok(response)
    }

    fn dispatch(&self, request: &Value) -> Result<Value, Error> {
        let request_type = str_field(request, "type")?;
        tracing::debug!(request_type, "processing stat request");
        match request_type {
            "Stop" => Ok(self.process_stop(str_field(request, "name")?)),
            "Bus" => Ok(self.process_bus(str_field(request, "name")?)),
            "Route" => Ok(self.process_route(str_field(request, "from")?, str_field(request, "to")?)),
            "Map" => Ok(self.process_map()),
            "FindCompanies" => Ok(self.process_find_companies(request)),
            "FindDepotRoute" => self.process_find_depot_route(request),
            other => Err(Error::UnknownRequestType(other.to_string())),
        }
    }

    fn process_stop(&self, name: &str) -> Value {
        match self.catalog.buses_at_stop(name) {
            Some(buses) => json!({ "buses": buses.iter().collect::<Vec<_>>() }),
            None => {
                tracing::warn!(stop = name, "stop lookup resolved to not found");
                json!({ "error_message": "not found" })
            }
        }
    }

    fn process_bus(&self, name: &str) -> Value {
        match self.catalog.bus_stats.get(name) {
            Some(stats) => json!({
                "stop_count": stats.stop_count,
                "unique_stop_count": stats.unique_stop_count,
                "route_length": stats.road_route_length,
                "curvature": stats.curvature(),
            }),
            None => {
                tracing::warn!(bus = name, "bus lookup resolved to not found");
                json!({ "error_message": "not found" })
            }
        }
    }

    fn process_route(&self, from: &str, to: &str) -> Value {
        match self.router.find_route(from, to) {
            Some(route) => self.render_route_response(&route),
            None => {
                tracing::warn!(from, to, "route lookup resolved to not found");
                json!({ "error_message": "not found" })
            }
        }
    }

    fn process_map(&self) -> Value {
        json!({ "map": self.painter.paint() })
    }

    fn process_find_companies(&self, request: &Value) -> Value {
        let filter = parse_company_filter(request);
        let names: Vec<&str> = self
            .companies
            .find_companies(&filter)
            .into_iter()
            .filter_map(|c| c.main_name().ok())
            .collect();
        json!({ "companies": names })
    }

    fn process_find_depot_route(&self, request: &Value) -> Result<Value, Error> {
        let from = str_field(request, "from")?;
        let datetime = field(request, "datetime")?
            .as_f64()
            .ok_or_else(|| Error::InvalidField("datetime".to_string()))?;
        let filter = parse_company_filter(request);
        let route = crate::company::route::route_to_company(
            &self.router,
            &self.companies,
            from,
            Minutes(datetime),
            &filter,
        )?;
        Ok(match route {
            Some(route) => self.render_route_response(&route),
            None => {
                tracing::warn!(from, "depot route resolved to not found");
                json!({ "error_message": "not found" })
            }
        })
    }

    /// Builds the `{total_time, items, map}` response shared by `Route` and `FindDepotRoute`.
    /// `WaitCompany` legs contribute to `total_time` but have no item shape in §6 and are
    /// skipped when building `items` (they never reach the painter either).
    fn render_route_response(&self, route: &RouteInfo) -> Value {
        let mut items = Vec::with_capacity(route.items.len());
        for item in &route.items {
            let rendered = match item {
                Item::Wait { stop_name, time } => Some(json!({
                    "type": "WaitBus",
                    "stop_name": stop_name,
                    "time": time.0,
                })),
                Item::Bus {
                    bus_name,
                    time,
                    span_count,
                    ..
                } => Some(json!({
                    "type": "RideBus",
                    "bus": bus_name,
                    "time": time.0,
                    "span_count": span_count,
                })),
                Item::WalkToCompany {
                    time,
                    stop_from,
                    company_name,
                    ..
                } => Some(json!({
                    "type": "WalkToCompany",
                    "time": time.0,
                    "stop_name": stop_from,
                    "company": company_name,
                })),
                Item::WaitCompany { .. } => None,
            };
            if let Some(value) = rendered {
                items.push(value);
            }
        }

        let map = self.painter.paint_route(
            &self.catalog.stops,
            &self.catalog.buses,
            &self.companies.companies,
            route,
        );

        json!({
            "total_time": route.total_time.0,
            "items": items,
            "map": map,
        })
    }
}
