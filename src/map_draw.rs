use geo::{BoundingRect, Contains, Coord, Geometry, MultiPolygon, Point, Rect};
use geojson::GeoJson;
use ratatui::layout::Rect as TuiRect;
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::canvas::{Canvas, Circle, Line, Points};
use ratatui::widgets::{Block, Borders};
use ratatui::{Frame, style::{Color, Style}};
use std::str::FromStr;

use crate::error::MapError;
use crate::layer::{MapLayer, MapPoint};
use crate::projection::{miller, project};

const SICILY_GEOJSON: &str = include_str!("../data/sicily.geojson");

/// Piksele promienia (5..40) → punkty braille'a
const DOTS_PER_PIXEL: f64 = 0.2;
/// Margines wokół obiektu, do którego przybliżamy
const ZOOM_PADDING: f64 = 0.08;
/// Połowa szerokości widoku po przybliżeniu do gminy (w jednostkach Millera)
const MARKER_ZOOM_SPAN: f64 = 0.012;

/// Wycinek płaszczyzny (współrzędne po odwzorowaniu Millera)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

impl Viewport {
    pub fn from_rect(rect: Rect<f64>, padding: f64) -> Self {
        let (w, h) = (rect.width(), rect.height());
        let pad = w.max(h) * padding;
        Self {
            x: [rect.min().x - pad, rect.max().x + pad],
            y: [rect.min().y - pad, rect.max().y + pad],
        }
    }

    pub fn around(center: Coord<f64>, half_span: f64) -> Self {
        Self {
            x: [center.x - half_span, center.x + half_span],
            y: [center.y - half_span, center.y + half_span],
        }
    }

    pub fn center(&self) -> Coord<f64> {
        Coord { x: (self.x[0] + self.x[1]) / 2.0, y: (self.y[0] + self.y[1]) / 2.0 }
    }

    pub fn width(&self) -> f64 {
        self.x[1] - self.x[0]
    }

    pub fn height(&self) -> f64 {
        self.y[1] - self.y[0]
    }

    /// Rozszerza widok tak, by jednostka na punkt braille'a była równa w obu osiach
    pub fn fitted(&self, area: TuiRect) -> Self {
        if area.width == 0 || area.height == 0 {
            return *self;
        }
        let dots_w = f64::from(area.width) * 2.0;
        let dots_h = f64::from(area.height) * 4.0;
        let per_dot = (self.width() / dots_w).max(self.height() / dots_h);
        let c = self.center();
        let (hw, hh) = (per_dot * dots_w / 2.0, per_dot * dots_h / 2.0);
        Self { x: [c.x - hw, c.x + hw], y: [c.y - hh, c.y + hh] }
    }

    /// Jednostki mapy na jeden punkt braille'a (widok musi być dopasowany)
    pub fn units_per_dot(&self, area: TuiRect) -> f64 {
        if area.width == 0 {
            return 0.0;
        }
        self.width() / (f64::from(area.width) * 2.0)
    }

    /// Komórka terminala → współrzędne mapy
    pub fn to_map(&self, area: TuiRect, column: u16, row: u16) -> Option<Coord<f64>> {
        let inside = column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        if !inside {
            return None;
        }
        let fx = (f64::from(column - area.x) + 0.5) / f64::from(area.width);
        let fy = (f64::from(row - area.y) + 0.5) / f64::from(area.height);
        Some(Coord {
            x: self.x[0] + fx * self.width(),
            y: self.y[1] - fy * self.height(),
        })
    }
}

/// Fragment lądu z geodanych (wyspa)
pub struct Region {
    pub name: String,
    shape: MultiPolygon<f64>,
    bounds: Rect<f64>,
}

/// Przygotowanie geometrii i rysowanie mapy
pub struct MapView {
    regions: Vec<Region>,
    full: Viewport,
}

impl MapView {
    pub fn bundled() -> Result<Self, MapError> {
        Self::new(GeoJson::from_str(SICILY_GEOJSON)?)
    }

    pub fn new(raw: GeoJson) -> Result<Self, MapError> {
        let GeoJson::FeatureCollection(fc) = raw else {
            return Err(MapError::NotACollection);
        };

        let mut regions = Vec::new();
        for feature in fc.features {
            let name = feature
                .properties
                .as_ref()
                .and_then(|p| p.get("name").and_then(|v| v.as_str()))
                .unwrap_or("")
                .to_string();

            if let Some(gj) = feature.geometry {
                let geom: Geometry<f64> = gj.value.try_into()?;
                let mp: MultiPolygon<f64> = match geom {
                    Geometry::Polygon(p) => p.into(),
                    Geometry::MultiPolygon(m) => m,
                    _ => continue,
                };
                let shape = project(&mp);
                if let Some(bounds) = shape.bounding_rect() {
                    regions.push(Region { name, shape, bounds });
                }
            }
        }

        let mut bounds = regions.iter().map(|r| r.bounds);
        let first = bounds.next().ok_or(MapError::Empty)?;
        let all = bounds.fold(first, |acc, b| {
            Rect::new(
                Coord { x: acc.min().x.min(b.min().x), y: acc.min().y.min(b.min().y) },
                Coord { x: acc.max().x.max(b.max().x), y: acc.max().y.max(b.max().y) },
            )
        });
        log::debug!("geodane: {} obszarów", regions.len());

        Ok(Self { regions, full: Viewport::from_rect(all, ZOOM_PADDING) })
    }

    /// Liczba obiektów (wysp)
    pub fn feature_count(&self) -> usize {
        self.regions.len()
    }

    /// Widok całej mapy
    pub fn full_view(&self) -> Viewport {
        self.full
    }

    /// Obszar zawierający punkt
    pub fn region_at(&self, at: Coord<f64>) -> Option<&Region> {
        self.regions.iter().find(|r| r.shape.contains(&Point::from(at)))
    }

    pub fn zoom_to_region(&self, region: &Region) -> Viewport {
        Viewport::from_rect(region.bounds, ZOOM_PADDING)
    }

    pub fn zoom_to_point(&self, point: &MapPoint) -> Option<Viewport> {
        let (lon, lat) = point.position()?;
        Some(Viewport::around(miller(lon, lat), MARKER_ZOOM_SPAN))
    }

    /// Znacznik pod kursorem; przy nakładaniu się wygrywa najmniejszy (rysowany na wierzchu)
    pub fn marker_at(
        &self,
        layer: &MapLayer,
        view: Viewport,
        area: TuiRect,
        column: u16,
        row: u16,
    ) -> Option<usize> {
        let view = view.fitted(inner(area));
        let at = view.to_map(inner(area), column, row)?;
        let per_dot = view.units_per_dot(inner(area));
        // jedna komórka tolerancji
        let slack = per_dot * 2.0;

        layer
            .points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                let (lon, lat) = p.position()?;
                let c = miller(lon, lat);
                let r = p.radius * DOTS_PER_PIXEL * per_dot + slack;
                let d = ((c.x - at.x).powi(2) + (c.y - at.y).powi(2)).sqrt();
                (d <= r).then_some((i, p.radius))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Współrzędne mapy pod komórką terminala
    pub fn map_coord(&self, view: Viewport, area: TuiRect, column: u16, row: u16) -> Option<Coord<f64>> {
        let area = inner(area);
        view.fitted(area).to_map(area, column, row)
    }

    /// Rysuje kontury wysp, a potem znaczniki (największe najpierw)
    pub fn render(
        &self,
        f: &mut Frame<'_>,
        area: TuiRect,
        title: &str,
        view: Viewport,
        layer: &MapLayer,
        highlight: Option<usize>,
    ) {
        let view = view.fitted(inner(area));
        let per_dot = view.units_per_dot(inner(area));

        let mut markers: Vec<(Coord<f64>, f64, Color)> = layer
            .points
            .iter()
            .filter_map(|p| {
                let (lon, lat) = p.position()?;
                Some((miller(lon, lat), p.radius * DOTS_PER_PIXEL * per_dot, p.color.to_terminal()))
            })
            .collect();
        markers.sort_by(|a, b| b.1.total_cmp(&a.1));
        let discs: Vec<(Vec<(f64, f64)>, Color)> = markers
            .iter()
            .map(|(c, r, color)| (disc(*c, *r, per_dot), *color))
            .collect();

        let selected = highlight
            .and_then(|i| layer.points.get(i))
            .and_then(|p| Some((p.position()?, p.radius, p.name.clone())));

        let canvas = Canvas::default()
            .block(Block::default().title(title.to_string()).borders(Borders::ALL))
            .marker(Marker::Braille)
            .x_bounds(view.x)
            .y_bounds(view.y)
            .paint(move |ctx| {
                // 1) Kontury wysp
                for region in &self.regions {
                    for poly in &region.shape.0 {
                        for window in poly.exterior().0.windows(2) {
                            let a = window[0];
                            let b = window[1];
                            ctx.draw(&Line { x1: a.x, y1: a.y, x2: b.x, y2: b.y, color: Color::Gray });
                        }
                    }
                }
                ctx.layer();

                // 2) Znaczniki gmin
                for (coords, color) in &discs {
                    ctx.draw(&Points { coords: coords.as_slice(), color: *color });
                }

                // 3) Podświetlenie wybranej gminy na czerwono
                if let Some(((lon, lat), radius, name)) = &selected {
                    let c = miller(*lon, *lat);
                    let r = radius * DOTS_PER_PIXEL * per_dot + per_dot * 2.0;
                    ctx.layer();
                    ctx.draw(&Circle { x: c.x, y: c.y, radius: r, color: Color::Red });
                    ctx.print(
                        c.x + r,
                        c.y + r,
                        Span::styled(name.clone(), Style::default().fg(Color::Red)),
                    );
                }
            });
        f.render_widget(canvas, area);
    }
}

/// Obszar wewnątrz ramki
fn inner(area: TuiRect) -> TuiRect {
    Block::default().borders(Borders::ALL).inner(area)
}

/// Wypełnione koło jako siatka punktów co jeden punkt braille'a
fn disc(center: Coord<f64>, radius: f64, step: f64) -> Vec<(f64, f64)> {
    if step <= 0.0 {
        return vec![(center.x, center.y)];
    }
    let n = (radius / step).ceil() as i64;
    let mut coords = Vec::new();
    for i in -n..=n {
        for j in -n..=n {
            let (dx, dy) = (i as f64 * step, j as f64 * step);
            if dx * dx + dy * dy <= radius * radius {
                coords.push((center.x + dx, center.y + dy));
            }
        }
    }
    if coords.is_empty() {
        coords.push((center.x, center.y));
    }
    coords
}
