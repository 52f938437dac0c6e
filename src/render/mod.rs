//! Layered SVG renderer: builds the base network map once and can redraw any route as a
//! full-canvas overlay.

pub mod svg;

use crate::catalog::{BusesDict, StopsDict};
use crate::company::Company;
use crate::layout::{Layout, PlaceId, ScreenPoint};
use crate::router::{Item, RouteInfo};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use svg::{parse_color, Circle, Color, Document, PathProps, Point, Polyline, Primitive, Rectangle, Text};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("render settings field `{0}` is missing or malformed")]
    InvalidField(String),
    #[error("unknown layer `{0}`")]
    UnknownLayer(String),
    #[error("canvas width and height must be positive")]
    NonPositiveCanvas,
    #[error("color palette must be non-empty when the `bus_lines` layer is active")]
    EmptyPalette,
    #[error(transparent)]
    Layout(#[from] crate::layout::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    BusLines,
    BusLabels,
    StopPoints,
    StopLabels,
    CompanyLines,
    CompanyPoints,
    CompanyLabels,
}

impl Layer {
    fn parse(name: &str) -> Result<Self, Error> {
        match name {
            "bus_lines" => Ok(Self::BusLines),
            "bus_labels" => Ok(Self::BusLabels),
            "stop_points" => Ok(Self::StopPoints),
            "stop_labels" => Ok(Self::StopLabels),
            "company_lines" => Ok(Self::CompanyLines),
            "company_points" => Ok(Self::CompanyPoints),
            "company_labels" => Ok(Self::CompanyLabels),
            other => Err(Error::UnknownLayer(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub stop_radius: f64,
    pub line_width: f64,
    pub stop_label_font_size: u32,
    pub stop_label_offset: Point,
    pub underlayer_color: Color,
    pub underlayer_width: f64,
    pub color_palette: Vec<Color>,
    pub bus_label_font_size: u32,
    pub bus_label_offset: Point,
    pub layers: Vec<String>,
    pub outer_margin: f64,
    pub company_radius: f64,
    pub company_line_width: f64,
}

impl RenderSettings {
    /// Parses the `render_settings` object of the input JSON document.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, Error> {
        let field = |name: &str| -> Result<&serde_json::Value, Error> {
            json.get(name).ok_or_else(|| Error::InvalidField(name.to_string()))
        };
        let as_f64 = |name: &str| -> Result<f64, Error> {
            field(name)?.as_f64().ok_or_else(|| Error::InvalidField(name.to_string()))
        };
        let as_u32 = |name: &str| -> Result<u32, Error> {
            field(name)?
                .as_u64()
                .map(|v| v as u32)
                .ok_or_else(|| Error::InvalidField(name.to_string()))
        };
        let as_point = |name: &str| -> Result<Point, Error> {
            let array = field(name)?
                .as_array()
                .ok_or_else(|| Error::InvalidField(name.to_string()))?;
            let x = array.first().and_then(|v| v.as_f64()).unwrap_or(0.0);
            let y = array.get(1).and_then(|v| v.as_f64()).unwrap_or(0.0);
            Ok(Point::new(x, y))
        };
        let as_color = |name: &str| -> Result<Color, Error> {
            parse_color(field(name)?).map_err(|_| Error::InvalidField(name.to_string()))
        };
        let as_strings = |name: &str| -> Result<Vec<String>, Error> {
            field(name)?
                .as_array()
                .ok_or_else(|| Error::InvalidField(name.to_string()))?
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| Error::InvalidField(name.to_string()))
                })
                .collect()
        };
        let palette = field("color_palette")?
            .as_array()
            .ok_or_else(|| Error::InvalidField("color_palette".to_string()))?
            .iter()
            .map(parse_color)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| Error::InvalidField("color_palette".to_string()))?;

        Ok(Self {
            width: as_f64("width")?,
            height: as_f64("height")?,
            padding: as_f64("padding")?,
            stop_radius: as_f64("stop_radius")?,
            line_width: as_f64("line_width")?,
            stop_label_font_size: as_u32("stop_label_font_size")?,
            stop_label_offset: as_point("stop_label_offset")?,
            underlayer_color: as_color("underlayer_color")?,
            underlayer_width: as_f64("underlayer_width")?,
            color_palette: palette,
            bus_label_font_size: as_u32("bus_label_font_size")?,
            bus_label_offset: as_point("bus_label_offset")?,
            layers: as_strings("layers")?,
            outer_margin: as_f64("outer_margin")?,
            company_radius: as_f64("company_radius")?,
            company_line_width: as_f64("company_line_width")?,
        })
    }
}

fn to_svg_point(p: ScreenPoint) -> Point {
    Point::new(p.x, p.y)
}

/// The renderer's immutable state: settings, place coordinates, assigned bus colors, and the
/// cached base map.
#[derive(Debug, Clone)]
pub struct Painter {
    settings: RenderSettings,
    layers: Vec<Layer>,
    coords: HashMap<PlaceId, Point>,
    bus_colors: HashMap<String, Color>,
    /// Bus/company names in input order, so base-map layers iterate deterministically instead of
    /// following `BusesDict`'s `HashMap` order (matches the router/catalog tie-break in
    /// `[[company]]`).
    stop_order: Vec<String>,
    bus_order: Vec<String>,
    company_order: Vec<String>,
    rubrics: HashMap<u64, String>,
    base_map: Document,
}

impl Painter {
    pub fn build(
        settings: RenderSettings,
        stops: &StopsDict,
        buses: &BusesDict,
        stop_order: &[String],
        bus_order: &[String],
        companies: &[Company],
        rubrics: HashMap<u64, String>,
    ) -> Result<Self, Error> {
        if settings.width <= 0.0 || settings.height <= 0.0 {
            return Err(Error::NonPositiveCanvas);
        }
        let layers = settings
            .layers
            .iter()
            .map(|name| Layer::parse(name))
            .collect::<Result<Vec<_>, _>>()?;
        if layers.contains(&Layer::BusLines) && settings.color_palette.is_empty() {
            return Err(Error::EmptyPalette);
        }

        let layout = Layout::build(
            stops,
            buses,
            stop_order,
            companies,
            settings.width,
            settings.height,
            settings.padding,
        )?;

        let mut coords = HashMap::new();
        for stop_name in stop_order {
            if let Some(p) = layout.position(&PlaceId::Stop(stop_name.clone())) {
                coords.insert(PlaceId::Stop(stop_name.clone()), to_svg_point(p));
            }
        }
        for company in companies {
            if let Ok(name) = company.main_name() {
                if let Some(p) = layout.position(&PlaceId::Company(name.to_string())) {
                    coords.insert(PlaceId::Company(name.to_string()), to_svg_point(p));
                }
            }
        }

        let mut bus_colors = HashMap::with_capacity(bus_order.len());
        if !settings.color_palette.is_empty() {
            for (i, bus_name) in bus_order.iter().enumerate() {
                bus_colors.insert(
                    bus_name.clone(),
                    settings.color_palette[i % settings.color_palette.len()].clone(),
                );
            }
        }

        let company_order: Vec<String> = companies
            .iter()
            .filter_map(|c| c.main_name().ok().map(str::to_string))
            .collect();

        let mut painter = Self {
            settings,
            layers,
            coords,
            bus_colors,
            stop_order: stop_order.to_vec(),
            bus_order: bus_order.to_vec(),
            company_order,
            rubrics,
            base_map: Document::new(),
        };
        painter.base_map = painter.make_document(stops, buses, companies, None);
        Ok(painter)
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn paint(&self) -> String {
        self.base_map.render()
    }

    pub fn paint_route(&self, stops: &StopsDict, buses: &BusesDict, companies: &[Company], route: &RouteInfo) -> String {
        let mut doc = self.base_map.clone();
        doc.add(Primitive::Rectangle(Rectangle {
            corner: Point::new(-self.settings.outer_margin, -self.settings.outer_margin),
            width: self.settings.width + 2.0 * self.settings.outer_margin,
            height: self.settings.height + 2.0 * self.settings.outer_margin,
            props: PathProps {
                fill_color: self.settings.underlayer_color.clone(),
                ..Default::default()
            },
        }));
        let overlay = self.make_document(stops, buses, companies, Some(route));
        for primitive in overlay.into_objects() {
            doc.add(primitive);
        }
        doc.render()
    }

    fn make_document(
        &self,
        stops: &StopsDict,
        buses: &BusesDict,
        companies: &[Company],
        route: Option<&RouteInfo>,
    ) -> Document {
        let mut doc = Document::new();
        for &layer in &self.layers {
            match layer {
                Layer::BusLines => self.paint_bus_lines(&mut doc, buses, route),
                Layer::BusLabels => self.paint_bus_labels(&mut doc, buses, route),
                Layer::StopPoints => self.paint_stop_points(&mut doc, buses, route),
                Layer::StopLabels => self.paint_stop_labels(&mut doc, buses, route),
                Layer::CompanyLines => self.paint_company_lines(&mut doc, companies, route),
                Layer::CompanyPoints => self.paint_company_points(&mut doc, companies, route),
                Layer::CompanyLabels => self.paint_company_labels(&mut doc, companies, route),
            }
        }
        let _ = stops;
        doc
    }

    fn stop_point(&self, name: &str) -> Option<Point> {
        self.coords.get(&PlaceId::Stop(name.to_string())).copied()
    }

    fn company_point(&self, name: &str) -> Option<Point> {
        self.coords.get(&PlaceId::Company(name.to_string())).copied()
    }

    fn base_bus_line(&self, bus_name: &str) -> Polyline {
        Polyline {
            points: Vec::new(),
            props: PathProps {
                stroke_color: self
                    .bus_colors
                    .get(bus_name)
                    .cloned()
                    .unwrap_or(Color::None),
                stroke_width: self.settings.line_width,
                stroke_line_cap: Some("round"),
                stroke_line_join: Some("round"),
                ..Default::default()
            },
        }
    }

    fn paint_bus_lines(&self, doc: &mut Document, buses: &BusesDict, route: Option<&RouteInfo>) {
        match route {
            None => {
                for name in &self.bus_order {
                    let Some(bus) = buses.get(name) else { continue };
                    if bus.stops.is_empty() {
                        continue;
                    }
                    let mut line = self.base_bus_line(name);
                    for stop in &bus.stops {
                        if let Some(p) = self.stop_point(stop) {
                            line.points.push(p);
                        }
                    }
                    doc.add(Primitive::Polyline(line));
                }
            }
            Some(info) => {
                for (bus, start, finish) in bus_items(info) {
                    let Some(stops) = buses.get(bus).map(|b| &b.stops) else { continue };
                    let mut line = self.base_bus_line(bus);
                    for stop in &stops[start..=finish] {
                        if let Some(p) = self.stop_point(stop) {
                            line.points.push(p);
                        }
                    }
                    doc.add(Primitive::Polyline(line));
                }
            }
        }
    }

    fn bus_label_texts(&self, pos: Point, name: &str) -> [Primitive; 2] {
        let underlayer = Text {
            point: pos,
            offset: self.settings.bus_label_offset,
            font_size: self.settings.bus_label_font_size,
            font_family: Some("Verdana"),
            font_weight: Some("bold"),
            data: name.to_string(),
            props: PathProps {
                fill_color: self.settings.underlayer_color.clone(),
                stroke_color: self.settings.underlayer_color.clone(),
                stroke_width: self.settings.underlayer_width,
                stroke_line_cap: Some("round"),
                stroke_line_join: Some("round"),
            },
        };
        let top = Text {
            props: PathProps {
                fill_color: self.bus_colors.get(name).cloned().unwrap_or(Color::None),
                ..Default::default()
            },
            ..underlayer.clone()
        };
        [Primitive::Text(underlayer), Primitive::Text(top)]
    }

    fn stop_label_texts(&self, pos: Point, name: &str) -> [Primitive; 2] {
        let underlayer = Text {
            point: pos,
            offset: self.settings.stop_label_offset,
            font_size: self.settings.stop_label_font_size,
            font_family: Some("Verdana"),
            font_weight: None,
            data: name.to_string(),
            props: PathProps {
                fill_color: self.settings.underlayer_color.clone(),
                stroke_color: self.settings.underlayer_color.clone(),
                stroke_width: self.settings.underlayer_width,
                stroke_line_cap: Some("round"),
                stroke_line_join: Some("round"),
            },
        };
        let top = Text {
            props: PathProps {
                fill_color: Color::Owned("black".to_string()),
                ..Default::default()
            },
            ..underlayer.clone()
        };
        [Primitive::Text(underlayer), Primitive::Text(top)]
    }

    fn paint_bus_labels(&self, doc: &mut Document, buses: &BusesDict, route: Option<&RouteInfo>) {
        match route {
            None => {
                for name in &self.bus_order {
                    let Some(bus) = buses.get(name) else { continue };
                    if bus.stops.is_empty() {
                        continue;
                    }
                    for endpoint in &bus.endpoints {
                        if let Some(p) = self.stop_point(endpoint) {
                            for primitive in self.bus_label_texts(p, name) {
                                doc.add(primitive);
                            }
                        }
                    }
                }
            }
            Some(info) => {
                for (bus, start, finish) in bus_items(info) {
                    let Some(b) = buses.get(bus) else { continue };
                    for idx in start..=finish {
                        let stop = &b.stops[idx];
                        if b.endpoints.contains(stop) {
                            if let Some(p) = self.stop_point(stop) {
                                for primitive in self.bus_label_texts(p, bus) {
                                    doc.add(primitive);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn paint_stop_points(&self, doc: &mut Document, buses: &BusesDict, route: Option<&RouteInfo>) {
        match route {
            None => {
                for stop_name in &self.stop_order {
                    if let Some(point) = self.stop_point(stop_name) {
                        doc.add(Primitive::Circle(Circle {
                            center: point,
                            radius: self.settings.stop_radius,
                            props: PathProps {
                                fill_color: Color::Owned("white".to_string()),
                                ..Default::default()
                            },
                        }));
                    }
                }
            }
            Some(info) => {
                for (bus, start, finish) in bus_items(info) {
                    let Some(b) = buses.get(bus) else { continue };
                    for stop in &b.stops[start..=finish] {
                        if let Some(p) = self.stop_point(stop) {
                            doc.add(Primitive::Circle(Circle {
                                center: p,
                                radius: self.settings.stop_radius,
                                props: PathProps {
                                    fill_color: Color::Owned("white".to_string()),
                                    ..Default::default()
                                },
                            }));
                        }
                    }
                }
            }
        }
    }

    fn paint_stop_labels(&self, doc: &mut Document, buses: &BusesDict, route: Option<&RouteInfo>) {
        match route {
            None => {
                for stop_name in &self.stop_order {
                    if let Some(point) = self.stop_point(stop_name) {
                        for primitive in self.stop_label_texts(point, stop_name) {
                            doc.add(primitive);
                        }
                    }
                }
            }
            Some(info) => {
                let bus_legs = bus_items(info);
                let Some((first_bus, first_start, _)) = bus_legs.first().copied() else {
                    return;
                };
                if let Some(b) = buses.get(first_bus) {
                    let start_stop = &b.stops[first_start];
                    if let Some(p) = self.stop_point(start_stop) {
                        for primitive in self.stop_label_texts(p, start_stop) {
                            doc.add(primitive);
                        }
                    }
                }
                for (bus, _, finish) in bus_legs {
                    let Some(b) = buses.get(bus) else { continue };
                    let stop = &b.stops[finish];
                    if let Some(p) = self.stop_point(stop) {
                        for primitive in self.stop_label_texts(p, stop) {
                            doc.add(primitive);
                        }
                    }
                }
            }
        }
    }

    fn draw_company_line(&self, doc: &mut Document, stop_name: &str, company_name: &str) {
        if let (Some(from), Some(to)) = (self.stop_point(stop_name), self.company_point(company_name)) {
            doc.add(Primitive::Polyline(Polyline {
                points: vec![from, to],
                props: PathProps {
                    stroke_color: Color::Owned("black".to_string()),
                    stroke_width: self.settings.company_line_width,
                    stroke_line_cap: Some("round"),
                    stroke_line_join: Some("round"),
                    ..Default::default()
                },
            }));
        }
    }

    fn draw_company_point(&self, doc: &mut Document, company_name: &str) {
        if let Some(p) = self.company_point(company_name) {
            doc.add(Primitive::Circle(Circle {
                center: p,
                radius: self.settings.company_radius,
                props: PathProps {
                    fill_color: Color::Owned("black".to_string()),
                    ..Default::default()
                },
            }));
        }
    }

    fn draw_company_label(&self, doc: &mut Document, company_name: &str, rubric: &str) {
        let label = if rubric.is_empty() {
            company_name.to_string()
        } else {
            format!("{rubric} {company_name}")
        };
        if let Some(p) = self.company_point(company_name) {
            for primitive in self.stop_label_texts(p, &label) {
                doc.add(primitive);
            }
        }
    }

    fn paint_company_lines(&self, doc: &mut Document, companies: &[Company], route: Option<&RouteInfo>) {
        match route {
            None => {
                for company in companies_in_order(companies, &self.company_order) {
                    let Ok(name) = company.main_name() else { continue };
                    for nearby in &company.nearby_stops {
                        self.draw_company_line(doc, &nearby.name, name);
                    }
                }
            }
            Some(info) => {
                for item in &info.items {
                    if let Item::WalkToCompany {
                        stop_from,
                        company_name,
                        ..
                    } = item
                    {
                        self.draw_company_line(doc, stop_from, company_name);
                    }
                }
            }
        }
    }

    fn paint_company_points(&self, doc: &mut Document, companies: &[Company], route: Option<&RouteInfo>) {
        match route {
            None => {
                for company in companies_in_order(companies, &self.company_order) {
                    if let Ok(name) = company.main_name() {
                        self.draw_company_point(doc, name);
                    }
                }
            }
            Some(info) => {
                for item in &info.items {
                    if let Item::WalkToCompany { company_name, .. } = item {
                        self.draw_company_point(doc, company_name);
                    }
                }
            }
        }
    }

    fn paint_company_labels(&self, doc: &mut Document, companies: &[Company], route: Option<&RouteInfo>) {
        match route {
            None => {
                for company in companies_in_order(companies, &self.company_order) {
                    if let Ok(name) = company.main_name() {
                        self.draw_company_label(doc, name, company.first_rubric_name(&self.rubrics));
                    }
                }
            }
            Some(info) => {
                for item in &info.items {
                    if let Item::WalkToCompany {
                        company_name,
                        rubric,
                        ..
                    } = item
                    {
                        self.draw_company_label(doc, company_name, rubric);
                    }
                }
            }
        }
    }
}

/// Yields companies in `order` (input order), skipping any whose main name dropped out (e.g. a
/// `MissingMainName` company never made it into `order` to begin with).
fn companies_in_order<'a>(companies: &'a [Company], order: &[String]) -> Vec<&'a Company> {
    order
        .iter()
        .filter_map(|name| {
            companies
                .iter()
                .find(|c| c.main_name().ok() == Some(name.as_str()))
        })
        .collect()
}

/// Extracts `(bus_name, start_stop_idx, finish_stop_idx)` for each `Bus` item, in order — the
/// `RouteChain` the original painter consumes.
fn bus_items(info: &RouteInfo) -> Vec<(&str, usize, usize)> {
    info.items
        .iter()
        .filter_map(|item| match item {
            Item::Bus {
                bus_name,
                start_stop_idx,
                finish_stop_idx,
                ..
            } => Some((bus_name.as_str(), *start_stop_idx, *finish_stop_idx)),
            _ => None,
        })
        .collect()
}
