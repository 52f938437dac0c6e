//! Grafts a walk + opening-hour wait onto a bus route, picking the company (and nearby stop)
//! that minimizes total travel time.

use super::{CompanyCatalog, CompanyFilter};
use crate::router::{Item, RouteInfo, TransportRouter};
use crate::shared::time::travel_minutes;
use crate::shared::Minutes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("pedestrian velocity is required to route to a company")]
    MissingPedestrianVelocity,
}

struct Candidate {
    total_time: Minutes,
    route: RouteInfo,
    walk_time: Minutes,
    stop_from: String,
    company_name: String,
    rubric: String,
}

/// `RouteToCompany` from the transit router's point of view: the transport leg, plus the extra
/// walk and wait legs appended by the caller once a winning candidate is chosen.
pub fn route_to_company(
    router: &TransportRouter,
    companies: &CompanyCatalog,
    from: &str,
    datetime: Minutes,
    filter: &CompanyFilter,
) -> Result<Option<RouteInfo>, Error> {
    let pedestrian_velocity_kmh = router
        .settings
        .pedestrian_velocity_kmh
        .ok_or(Error::MissingPedestrianVelocity)?;

    let mut best: Option<Candidate> = None;

    for company in companies.find_companies(filter) {
        let Ok(company_name) = company.main_name() else {
            continue;
        };
        let rubric = company.first_rubric_name(&companies.rubrics).to_string();

        for nearby in &company.nearby_stops {
            let Some(route) = router.find_route(from, &nearby.name) else {
                continue;
            };
            let walk_time = travel_minutes(nearby.meters as f64, pedestrian_velocity_kmh);
            let arrival = (datetime + route.total_time + walk_time).wrap_week();
            let wait = Minutes(companies.waiting_for_open(arrival.0, company_name));
            let total_time = route.total_time + walk_time + wait;

            let is_better = match &best {
                Some(existing) => total_time.0 < existing.total_time.0,
                None => true,
            };
            if is_better {
                best = Some(Candidate {
                    total_time,
                    route,
                    walk_time,
                    stop_from: nearby.name.clone(),
                    company_name: company_name.to_string(),
                    rubric: rubric.clone(),
                });
            }
        }
    }

    let Some(candidate) = best else {
        return Ok(None);
    };

    let mut items = candidate.route.items;
    items.push(Item::WalkToCompany {
        time: candidate.walk_time,
        stop_from: candidate.stop_from,
        company_name: candidate.company_name.clone(),
        rubric: candidate.rubric,
    });
    let wait = candidate.total_time - candidate.route.total_time - candidate.walk_time;
    if wait.0 > 0.0 {
        items.push(Item::WaitCompany {
            company_name: candidate.company_name,
            time: wait,
        });
    }

    Ok(Some(RouteInfo {
        total_time: candidate.total_time,
        items,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Description};
    use crate::company::{Address, Company, Name, NameType, NearbyStop, WorkingTime, WorkingTimeInterval};
    use crate::router::RoutingSettings;
    use std::collections::HashMap;

    fn settings() -> RoutingSettings {
        RoutingSettings {
            bus_wait_time: 6,
            bus_velocity_kmh: 30.0,
            pedestrian_velocity_kmh: Some(60.0),
        }
    }

    fn build_router() -> TransportRouter {
        let catalog = Catalog::build(vec![
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
        .unwrap();
        TransportRouter::build(
            &catalog.stops,
            &catalog.buses,
            &catalog.stop_order,
            &catalog.bus_order,
            settings(),
        )
        .unwrap()
    }

    #[test]
    fn matches_spec_depot_route_example() {
        let router = build_router();
        let company = Company {
            names: vec![Name {
                value: "Shop".into(),
                kind: NameType::Main,
            }],
            phones: vec![],
            urls: vec![],
            rubrics: vec![],
            address: Address::default(),
            nearby_stops: vec![NearbyStop {
                name: "B".into(),
                meters: 300,
            }],
            working_time: WorkingTime {
                intervals: vec![WorkingTimeInterval {
                    day: crate::company::Day::Monday,
                    minutes_from: 720,
                    minutes_to: 1440,
                }],
            },
        };
        let companies = crate::company::CompanyCatalog::build(HashMap::new(), vec![company]).unwrap();

        let filter = CompanyFilter {
            names: vec!["Shop".to_string()],
            ..Default::default()
        };
        let route = route_to_company(&router, &companies, "A", Minutes(590.0), &filter)
            .unwrap()
            .unwrap();

        // bus(A->B) = 8, walk 300m @ 60km/h = 0.3 min, arrival = 590 + 8 + 0.3 = 598.3
        // closed until 720 -> wait = 720 - 598.3 = 121.7
        let expected = 8.0 + 0.3 + 121.7;
        assert!((route.total_time.0 - expected).abs() < 1e-6);
        assert!(matches!(route.items.last(), Some(Item::WaitCompany { .. })));
    }

    #[test]
    fn no_candidate_is_not_found() {
        let router = build_router();
        let companies = crate::company::CompanyCatalog::build(HashMap::new(), vec![]).unwrap();
        let filter = CompanyFilter::default();
        let result = route_to_company(&router, &companies, "A", Minutes(0.0), &filter).unwrap();
        assert!(result.is_none());
    }
}
