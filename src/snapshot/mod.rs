//! Binary persistence of the whole engine between `make_base` and `process_requests`
//! (`serialize.cpp`/`tc_serialize.cpp` et al.): everything `process_requests` needs is written
//! once, so it never re-reads the original JSON or re-runs the all-pairs precomputation.
//!
//! The router (graph + router tables) is the expensive part to rebuild, so it is stored
//! verbatim. The painter's derived state (place coordinates, bus colors, the base map document)
//! is *not* stored — it is cheap to recompute from the catalog, companies and render settings,
//! which are stored, and recomputing it sidesteps persisting `&'static str` fields that live in
//! `render::svg::{PathProps, Text}`.

use crate::catalog::Catalog;
use crate::company::CompanyCatalog;
use crate::render::{Painter, RenderSettings};
use crate::router::TransportRouter;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("snapshot encode failed: {0}")]
    Encode(#[from] bincode::Error),
    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Render(#[from] crate::render::Error),
}

/// Everything needed to reconstruct the engine: the catalog, the precomputed router, the
/// company database, and the render settings the painter is rebuilt from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub catalog: Catalog,
    pub router: TransportRouter,
    pub companies: CompanyCatalog,
    pub render_settings: RenderSettings,
}

impl Snapshot {
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), Error> {
        let bytes = bincode::serialize(self)?;
        writer.write_all(&bytes)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(bincode::deserialize(&bytes)?)
    }

    /// Rebuilds the painter from the stored catalog, companies and render settings. Cheap
    /// relative to the router's all-pairs precomputation, so it is not itself persisted.
    pub fn build_painter(&self) -> Result<Painter, Error> {
        Painter::build(
            self.render_settings.clone(),
            &self.catalog.stops,
            &self.catalog.buses,
            &self.catalog.stop_order,
            &self.catalog.bus_order,
            &self.companies.companies,
            self.companies.rubrics.clone(),
        )
        .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Description;
    use crate::render::svg::{Color, Point};
    use crate::router::RoutingSettings;

    fn sample_snapshot() -> Snapshot {
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
        let router = TransportRouter::build(
            &catalog.stops,
            &catalog.buses,
            &catalog.stop_order,
            &catalog.bus_order,
            RoutingSettings {
                bus_wait_time: 6,
                bus_velocity_kmh: 30.0,
                pedestrian_velocity_kmh: None,
            },
        )
        .unwrap();
        let companies = CompanyCatalog::build(Default::default(), Vec::new()).unwrap();
        let render_settings = RenderSettings {
            width: 600.0,
            height: 400.0,
            padding: 50.0,
            stop_radius: 5.0,
            line_width: 14.0,
            stop_label_font_size: 20,
            stop_label_offset: Point::new(7.0, -3.0),
            underlayer_color: Color::Rgba(255, 255, 255, 0.85),
            underlayer_width: 3.0,
            color_palette: vec![Color::Owned("green".to_string())],
            bus_label_font_size: 20,
            bus_label_offset: Point::new(7.0, 15.0),
            layers: vec!["bus_lines".to_string(), "stop_points".to_string()],
            outer_margin: 6.0,
            company_radius: 3.0,
            company_line_width: 1.0,
        };
        Snapshot {
            catalog,
            router,
            companies,
            render_settings,
        }
    }

    #[test]
    fn round_trips_through_bytes() {
        let snapshot = sample_snapshot();
        let mut buf = Vec::new();
        snapshot.write_to(&mut buf).unwrap();
        let restored = Snapshot::read_from(&mut buf.as_slice()).unwrap();
        assert_eq!(restored.catalog.stop_order, snapshot.catalog.stop_order);
        assert!(restored.router.find_route("A", "B").is_some());
    }

    #[test]
    fn restored_engine_answers_the_same_route() {
        let snapshot = sample_snapshot();
        let mut buf = Vec::new();
        snapshot.write_to(&mut buf).unwrap();
        let restored = Snapshot::read_from(&mut buf.as_slice()).unwrap();

        let before = snapshot.router.find_route("A", "B").unwrap();
        let after = restored.router.find_route("A", "B").unwrap();
        assert!((before.total_time.0 - after.total_time.0).abs() < 1e-9);
    }

    #[test]
    fn painter_rebuilds_from_stored_settings() {
        let snapshot = sample_snapshot();
        let painter = snapshot.build_painter().unwrap();
        assert!(painter.paint().starts_with("<?xml"));
    }
}
