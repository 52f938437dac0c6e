//! SVG primitives as a tagged variant, plus a `Document` that renders them in insertion order.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Color {
    None,
    Owned(String),
    Rgb(u8, u8, u8),
    Rgba(u8, u8, u8, f64),
}

impl Color {
    fn render(&self, out: &mut String) {
        match self {
            Color::None => out.push_str("none"),
            Color::Owned(name) => out.push_str(name),
            Color::Rgb(r, g, b) => {
                let _ = write!(out, "rgb({r},{g},{b})");
            }
            Color::Rgba(r, g, b, a) => {
                let _ = write!(out, "rgba({r},{g},{b},{a})");
            }
        }
    }
}

/// Parses a color from the input JSON's `"name" | [r,g,b] | [r,g,b,a]` shape (§6). Not a `serde`
/// `Deserialize` impl: the input format (self-describing JSON) and the snapshot format
/// (non-self-describing `bincode`) need different rules, so input parsing goes through this
/// function and `Color`'s derived impls are reserved for the snapshot round-trip.
pub fn parse_color(value: &serde_json::Value) -> Result<Color, String> {
    match value {
        serde_json::Value::String(name) => Ok(Color::Owned(name.clone())),
        serde_json::Value::Array(items) => {
            let channel = |i: usize| -> u8 {
                items.get(i).and_then(|v| v.as_u64()).unwrap_or(0).min(255) as u8
            };
            if items.len() >= 4 {
                let alpha = items[3].as_f64().unwrap_or(1.0);
                Ok(Color::Rgba(channel(0), channel(1), channel(2), alpha))
            } else {
                Ok(Color::Rgb(channel(0), channel(1), channel(2)))
            }
        }
        other => Err(format!("expected a color string or [r,g,b(,a)] array, got {other}")),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathProps {
    pub fill_color: Color,
    pub stroke_color: Color,
    pub stroke_width: f64,
    pub stroke_line_cap: Option<&'static str>,
    pub stroke_line_join: Option<&'static str>,
}

impl Default for PathProps {
    fn default() -> Self {
        Self {
            fill_color: Color::None,
            stroke_color: Color::None,
            stroke_width: 1.0,
            stroke_line_cap: None,
            stroke_line_join: None,
        }
    }
}

impl PathProps {
    fn render(&self, out: &mut String) {
        out.push_str(" fill=\"");
        self.fill_color.render(out);
        out.push_str("\" stroke=\"");
        self.stroke_color.render(out);
        let _ = write!(out, "\" stroke-width=\"{}\"", self.stroke_width);
        if let Some(cap) = self.stroke_line_cap {
            let _ = write!(out, " stroke-linecap=\"{cap}\"");
        }
        if let Some(join) = self.stroke_line_join {
            let _ = write!(out, " stroke-linejoin=\"{join}\"");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
    pub props: PathProps,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyline {
    pub points: Vec<Point>,
    pub props: PathProps,
}

impl Polyline {
    pub fn add_point(mut self, point: Point) -> Self {
        self.points.push(point);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rectangle {
    pub corner: Point,
    pub width: f64,
    pub height: f64,
    pub props: PathProps,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub point: Point,
    pub offset: Point,
    pub font_size: u32,
    pub font_family: Option<&'static str>,
    pub font_weight: Option<&'static str>,
    pub data: String,
    pub props: PathProps,
}

impl Default for Text {
    fn default() -> Self {
        Self {
            point: Point::default(),
            offset: Point::default(),
            font_size: 1,
            font_family: None,
            font_weight: None,
            data: String::new(),
            props: PathProps::default(),
        }
    }
}

/// One renderable SVG element. A tagged enum rather than a trait object, matching the rest of
/// this codebase's preference for `match` over dynamic dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Circle(Circle),
    Polyline(Polyline),
    Rectangle(Rectangle),
    Text(Text),
}

impl Primitive {
    fn render(&self, out: &mut String) {
        match self {
            Primitive::Circle(c) => {
                let _ = write!(out, "<circle cx=\"{}\" cy=\"{}\" r=\"{}\"", c.center.x, c.center.y, c.radius);
                c.props.render(out);
                out.push_str("/>");
            }
            Primitive::Polyline(p) => {
                out.push_str("<polyline points=\"");
                for point in &p.points {
                    let _ = write!(out, "{},{} ", point.x, point.y);
                }
                out.push('"');
                p.props.render(out);
                out.push_str("/>");
            }
            Primitive::Rectangle(r) => {
                let _ = write!(
                    out,
                    "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"",
                    r.corner.x, r.corner.y, r.width, r.height
                );
                r.props.render(out);
                out.push_str("/>");
            }
            Primitive::Text(t) => {
                let _ = write!(
                    out,
                    "<text x=\"{}\" y=\"{}\" dx=\"{}\" dy=\"{}\" font-size=\"{}\"",
                    t.point.x, t.point.y, t.offset.x, t.offset.y, t.font_size
                );
                if let Some(family) = t.font_family {
                    let _ = write!(out, " font-family=\"{family}\"");
                }
                if let Some(weight) = t.font_weight {
                    let _ = write!(out, " font-weight=\"{weight}\"");
                }
                t.props.render(out);
                let _ = write!(out, ">{}</text>", t.data);
            }
        }
    }
}

/// An ordered, append-only list of primitives. Cheap to clone since a route overlay is built by
/// cloning the base map and appending to the copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    objects: Vec<Primitive>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, primitive: Primitive) {
        self.objects.push(primitive);
    }

    pub fn into_objects(self) -> Vec<Primitive> {
        self.objects
    }

    pub fn render(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n");
        out.push_str("<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\">\n");
        for object in &self.objects {
            object.render(&mut out);
            out.push('\n');
        }
        out.push_str("</svg>");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_xml_prolog_and_namespace() {
        let doc = Document::new();
        let rendered = doc.render();
        assert!(rendered.starts_with("<?xml"));
        assert!(rendered.contains("xmlns=\"http://www.w3.org/2000/svg\""));
    }

    #[test]
    fn color_array_without_alpha_is_rgb() {
        let json = serde_json::json!([10, 20, 30]);
        assert_eq!(parse_color(&json).unwrap(), Color::Rgb(10, 20, 30));
    }

    #[test]
    fn color_array_with_alpha_is_rgba() {
        let json = serde_json::json!([10, 20, 30, 0.5]);
        assert_eq!(parse_color(&json).unwrap(), Color::Rgba(10, 20, 30, 0.5));
    }

    #[test]
    fn color_string_is_owned_name() {
        let json = serde_json::json!("black");
        assert_eq!(parse_color(&json).unwrap(), Color::Owned("black".to_string()));
    }

    #[test]
    fn document_clone_is_independent() {
        let mut base = Document::new();
        base.add(Primitive::Circle(Circle {
            center: Point::new(1.0, 1.0),
            radius: 2.0,
            props: PathProps::default(),
        }));
        let mut overlay = base.clone();
        overlay.add(Primitive::Rectangle(Rectangle::default()));
        assert_eq!(base.objects.len(), 1);
        assert_eq!(overlay.objects.len(), 2);
    }
}
