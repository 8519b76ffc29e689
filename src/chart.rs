//! Multi-panel line charts rendered to PNG (via `image`) or SVG.
//!
//! A [`Figure`] is a grid of [`Panel`]s; each panel holds [`Layer`]s drawn in
//! order. Axis ranges are taken from the data of all layers in the panel.

use crate::error::Result;
use crate::font::{draw_text, draw_text_vertical, text_width, GLYPH_HEIGHT};
use image::{Rgb, RgbImage};
use std::fmt::Write;
use std::path::Path;
use tracing::debug;

pub type Color = (u8, u8, u8);

pub const BLUE: Color = (31, 119, 180);
pub const ORANGE: Color = (255, 127, 14);
pub const RED: Color = (214, 39, 40);
pub const GREY: Color = (128, 128, 128);
pub const BLACK: Color = (0, 0, 0);
const WHITE: Color = (255, 255, 255);

const MARGIN_LEFT: u32 = 64;
const MARGIN_RIGHT: u32 = 14;
const MARGIN_TOP: u32 = 30;
const MARGIN_BOTTOM: u32 = 34;
const BAND_OPACITY: f64 = 0.15;

#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Line {
        xs: Vec<f64>,
        ys: Vec<f64>,
        color: Color,
        label: Option<String>,
    },
    /// Filled region between `lower` and `upper`.
    Band {
        xs: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
        color: Color,
    },
    /// Vertical stems from zero with a marker at each value.
    Stems { xs: Vec<f64>, ys: Vec<f64>, color: Color },
    HLine { y: f64, color: Color },
}

impl Layer {
    pub fn line(xs: Vec<f64>, ys: Vec<f64>, color: Color) -> Self {
        Layer::Line {
            xs,
            ys,
            color,
            label: None,
        }
    }

    pub fn labeled(xs: Vec<f64>, ys: Vec<f64>, color: Color, label: impl Into<String>) -> Self {
        Layer::Line {
            xs,
            ys,
            color,
            label: Some(label.into()),
        }
    }

    fn x_values(&self) -> &[f64] {
        match self {
            Layer::Line { xs, .. } | Layer::Band { xs, .. } | Layer::Stems { xs, .. } => xs,
            Layer::HLine { .. } => &[],
        }
    }

    fn y_values(&self) -> Vec<f64> {
        match self {
            Layer::Line { ys, .. } => ys.clone(),
            Layer::Band { lower, upper, .. } => lower.iter().chain(upper.iter()).copied().collect(),
            Layer::Stems { ys, .. } => ys.iter().copied().chain(std::iter::once(0.0)).collect(),
            Layer::HLine { y, .. } => vec![*y],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Panel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub show_x_ticks: bool,
    pub layers: Vec<Layer>,
}

impl Panel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            show_x_ticks: true,
            ..Default::default()
        }
    }

    pub fn x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = label.into();
        self
    }

    pub fn y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = label.into();
        self
    }

    pub fn hide_x_ticks(mut self) -> Self {
        self.show_x_ticks = false;
        self
    }

    pub fn layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Data ranges `((x_min, x_max), (y_min, y_max))`, padded and never empty.
    pub fn bounds(&self) -> ((f64, f64), (f64, f64)) {
        let finite = |v: &f64| v.is_finite();
        let xs: Vec<f64> = self
            .layers
            .iter()
            .flat_map(|l| l.x_values().iter().copied())
            .filter(finite)
            .collect();
        let ys: Vec<f64> = self
            .layers
            .iter()
            .flat_map(|l| l.y_values())
            .filter(finite)
            .collect();
        (range_of(&xs, 0.0), range_of(&ys, 0.05))
    }
}

fn range_of(values: &[f64], pad: f64) -> (f64, f64) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if (max - min).abs() < f64::EPSILON {
        let half = if min == 0.0 { 1.0 } else { min.abs() * 0.05 };
        return (min - half, max + half);
    }
    let margin = (max - min) * pad;
    (min - margin, max + margin)
}

/// Roughly `target` round tick positions covering `[min, max]`.
pub fn nice_ticks(min: f64, max: f64, target: usize) -> Vec<f64> {
    if !(max > min) || target == 0 {
        return vec![min];
    }
    let raw = (max - min) / target as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);
    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

/// Compact tick label: `1.5M`, `250K`, `0.25`.
pub fn format_tick(value: f64) -> String {
    let abs = value.abs();
    let trim = |s: String| {
        if s.contains('.') {
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            s
        }
    };
    if abs >= 1e9 {
        format!("{}B", trim(format!("{:.1}", value / 1e9)))
    } else if abs >= 1e6 {
        format!("{}M", trim(format!("{:.1}", value / 1e6)))
    } else if abs >= 1e4 {
        format!("{}K", trim(format!("{:.1}", value / 1e3)))
    } else if abs >= 10.0 || abs == 0.0 {
        format!("{}", value.round() as i64)
    } else {
        trim(format!("{:.2}", value))
    }
}

/// Pixel rectangle of a panel's plotting area.
#[derive(Debug, Clone, Copy)]
struct Frame {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    x_range: (f64, f64),
    y_range: (f64, f64),
}

impl Frame {
    fn px(&self, x: f64) -> f64 {
        self.left + (x - self.x_range.0) / (self.x_range.1 - self.x_range.0) * self.width
    }

    fn py(&self, y: f64) -> f64 {
        self.top + (1.0 - (y - self.y_range.0) / (self.y_range.1 - self.y_range.0)) * self.height
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    fn contains(&self, x: i64, y: i64) -> bool {
        x as f64 >= self.left && x as f64 <= self.right() && y as f64 >= self.top && y as f64 <= self.bottom()
    }
}

/// A grid of panels.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub width: u32,
    pub height: u32,
    pub rows: usize,
    pub cols: usize,
    pub panels: Vec<Panel>,
}

impl Figure {
    pub fn new(rows: usize, cols: usize, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rows: rows.max(1),
            cols: cols.max(1),
            panels: Vec::new(),
        }
    }

    pub fn push(&mut self, panel: Panel) {
        self.panels.push(panel);
    }

    fn cell_size(&self) -> (u32, u32) {
        (self.width / self.cols as u32, self.height / self.rows as u32)
    }

    fn frame(&self, index: usize, panel: &Panel) -> Frame {
        let (cw, ch) = self.cell_size();
        let (row, col) = (index / self.cols, index % self.cols);
        let (x_range, y_range) = panel.bounds();
        Frame {
            left: (col as u32 * cw + MARGIN_LEFT) as f64,
            top: (row as u32 * ch + MARGIN_TOP) as f64,
            width: cw.saturating_sub(MARGIN_LEFT + MARGIN_RIGHT).max(1) as f64,
            height: ch.saturating_sub(MARGIN_TOP + MARGIN_BOTTOM).max(1) as f64,
            x_range,
            y_range,
        }
    }

    /// Rasterize the figure.
    pub fn render(&self) -> RgbImage {
        let mut canvas = Canvas {
            img: RgbImage::from_pixel(self.width.max(1), self.height.max(1), rgb(WHITE)),
        };
        for (i, panel) in self.panels.iter().enumerate().take(self.rows * self.cols) {
            let frame = self.frame(i, panel);
            canvas.draw_panel(panel, &frame, self.cell_size().0);
        }
        canvas.img
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.render().save(path)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }

    /// SVG document with the same layout as [`Figure::render`].
    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}">"#,
            self.width, self.height, self.width, self.height
        )
        .unwrap();
        writeln!(svg, r#"  <rect width="100%" height="100%" fill="white"/>"#).unwrap();

        for (i, panel) in self.panels.iter().enumerate().take(self.rows * self.cols) {
            let f = self.frame(i, panel);
            svg_panel(&mut svg, panel, &f);
        }

        writeln!(svg, "</svg>").unwrap();
        svg
    }

    pub fn save_svg(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_svg())?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

fn rgb(c: Color) -> Rgb<u8> {
    Rgb([c.0, c.1, c.2])
}

fn svg_color(c: Color) -> String {
    format!("rgb({},{},{})", c.0, c.1, c.2)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn svg_points(f: &Frame, xs: &[f64], ys: &[f64]) -> String {
    xs.iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| format!("{:.1},{:.1}", f.px(*x), f.py(*y)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn svg_panel(svg: &mut String, panel: &Panel, f: &Frame) {
    for layer in &panel.layers {
        match layer {
            Layer::Line { xs, ys, color, .. } => {
                writeln!(svg, r#"  <polyline fill="none" stroke="{}" stroke-width="1" points="{}"/>"#,
                    svg_color(*color), svg_points(f, xs, ys)).unwrap();
            }
            Layer::Band { xs, lower, upper, color } => {
                let upper_pts = svg_points(f, xs, upper);
                let rev_x: Vec<f64> = xs.iter().rev().copied().collect();
                let rev_lower: Vec<f64> = lower.iter().rev().copied().collect();
                let lower_pts = svg_points(f, &rev_x, &rev_lower);
                writeln!(svg, r#"  <polygon fill="{}" fill-opacity="{}" stroke="none" points="{} {}"/>"#,
                    svg_color(*color), BAND_OPACITY, upper_pts, lower_pts).unwrap();
            }
            Layer::Stems { xs, ys, color } => {
                let zero = f.py(0.0);
                for (x, y) in xs.iter().zip(ys) {
                    writeln!(svg, r#"  <line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}"/>"#,
                        f.px(*x), zero, f.px(*x), f.py(*y), svg_color(*color)).unwrap();
                    writeln!(svg, r#"  <circle cx="{:.1}" cy="{:.1}" r="2" fill="{}"/>"#,
                        f.px(*x), f.py(*y), svg_color(*color)).unwrap();
                }
            }
            Layer::HLine { y, color } => {
                writeln!(svg, r#"  <line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-dasharray="4 3"/>"#,
                    f.left, f.py(*y), f.right(), f.py(*y), svg_color(*color)).unwrap();
            }
        }
    }

    writeln!(svg, r#"  <rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="black"/>"#,
        f.left, f.top, f.width, f.height).unwrap();

    for tick in nice_ticks(f.y_range.0, f.y_range.1, 5) {
        writeln!(svg, r#"  <text x="{:.1}" y="{:.1}" text-anchor="end" font-family="sans-serif" font-size="10">{}</text>"#,
            f.left - 4.0, f.py(tick) + 3.0, format_tick(tick)).unwrap();
    }
    if panel.show_x_ticks {
        for tick in nice_ticks(f.x_range.0, f.x_range.1, 5) {
            writeln!(svg, r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-family="sans-serif" font-size="10">{}</text>"#,
                f.px(tick), f.bottom() + 12.0, format_tick(tick)).unwrap();
        }
    }

    let cx = f.left + f.width / 2.0;
    if !panel.title.is_empty() {
        writeln!(svg, r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-family="sans-serif" font-size="13" font-weight="bold">{}</text>"#,
            cx, f.top - 10.0, escape(&panel.title)).unwrap();
    }
    if !panel.x_label.is_empty() {
        writeln!(svg, r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-family="sans-serif" font-size="11">{}</text>"#,
            cx, f.bottom() + 28.0, escape(&panel.x_label)).unwrap();
    }
    if !panel.y_label.is_empty() {
        let lx = f.left - 52.0;
        let ly = f.top + f.height / 2.0;
        writeln!(svg, r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle" font-family="sans-serif" font-size="11" transform="rotate(-90 {:.1} {:.1})">{}</text>"#,
            lx, ly, lx, ly, escape(&panel.y_label)).unwrap();
    }

    let legend: Vec<(&String, Color)> = panel
        .layers
        .iter()
        .filter_map(|l| match l {
            Layer::Line { label: Some(label), color, .. } => Some((label, *color)),
            _ => None,
        })
        .collect();
    for (i, (label, color)) in legend.iter().enumerate() {
        writeln!(svg, r#"  <text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="10" fill="{}">{}</text>"#,
            f.left + 6.0, f.top + 12.0 + 12.0 * i as f64, svg_color(*color), escape(label)).unwrap();
    }
}

struct Canvas {
    img: RgbImage,
}

impl Canvas {
    fn set(&mut self, x: i64, y: i64, color: Color) {
        if x >= 0 && y >= 0 && (x as u32) < self.img.width() && (y as u32) < self.img.height() {
            self.img.put_pixel(x as u32, y as u32, rgb(color));
        }
    }

    fn blend(&mut self, x: i64, y: i64, color: Color, opacity: f64) {
        if x < 0 || y < 0 || x as u32 >= self.img.width() || y as u32 >= self.img.height() {
            return;
        }
        let px = self.img.get_pixel_mut(x as u32, y as u32);
        let target = [color.0, color.1, color.2];
        for (channel, t) in px.0.iter_mut().zip(target) {
            *channel = (*channel as f64 * (1.0 - opacity) + t as f64 * opacity).round() as u8;
        }
    }

    /// Bresenham line, clipped to `frame`.
    fn line(&mut self, frame: &Frame, (x0, y0): (f64, f64), (x1, y1): (f64, f64), color: Color) {
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return;
        }
        let (mut x, mut y) = (x0.round() as i64, y0.round() as i64);
        let (xe, ye) = (x1.round() as i64, y1.round() as i64);
        let dx = (xe - x).abs();
        let dy = -(ye - y).abs();
        let sx = if x < xe { 1 } else { -1 };
        let sy = if y < ye { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            if frame.contains(x, y) {
                self.set(x, y, color);
            }
            if x == xe && y == ye {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn polyline(&mut self, frame: &Frame, xs: &[f64], ys: &[f64], color: Color) {
        let points: Vec<(f64, f64)> = xs
            .iter()
            .zip(ys)
            .map(|(x, y)| (frame.px(*x), frame.py(*y)))
            .collect();
        if points.len() == 1 {
            self.line(frame, points[0], points[0], color);
        }
        for pair in points.windows(2) {
            self.line(frame, pair[0], pair[1], color);
        }
    }

    fn band(&mut self, frame: &Frame, xs: &[f64], lower: &[f64], upper: &[f64], color: Color) {
        let n = xs.len().min(lower.len()).min(upper.len());
        for i in 0..n.saturating_sub(1) {
            let (xa, xb) = (frame.px(xs[i]), frame.px(xs[i + 1]));
            let (start, end) = (xa.min(xb).round() as i64, xa.max(xb).round() as i64);
            for px in start..=end {
                let t = if (xb - xa).abs() < f64::EPSILON {
                    0.0
                } else {
                    (px as f64 - xa) / (xb - xa)
                };
                let lo = frame.py(lower[i] + t * (lower[i + 1] - lower[i]));
                let hi = frame.py(upper[i] + t * (upper[i + 1] - upper[i]));
                for py in hi.min(lo).round() as i64..=hi.max(lo).round() as i64 {
                    if frame.contains(px, py) {
                        self.blend(px, py, color, BAND_OPACITY);
                    }
                }
            }
        }
    }

    fn draw_panel(&mut self, panel: &Panel, f: &Frame, cell_width: u32) {
        let black = BLACK;

        for layer in &panel.layers {
            match layer {
                Layer::Band { xs, lower, upper, color } => self.band(f, xs, lower, upper, *color),
                Layer::HLine { y, color } => {
                    let py = f.py(*y).round() as i64;
                    let mut x = f.left as i64;
                    while (x as f64) <= f.right() {
                        if (x - f.left as i64) % 7 < 4 {
                            self.set(x, py, *color);
                        }
                        x += 1;
                    }
                }
                Layer::Line { xs, ys, color, .. } => self.polyline(f, xs, ys, *color),
                Layer::Stems { xs, ys, color } => {
                    let zero = f.py(0.0);
                    for (x, y) in xs.iter().zip(ys) {
                        let (px, py) = (f.px(*x), f.py(*y));
                        self.line(f, (px, zero), (px, py), *color);
                        for dx in -2..=2 {
                            for dy in -2..=2 {
                                self.set(px.round() as i64 + dx, py.round() as i64 + dy, *color);
                            }
                        }
                    }
                }
            }
        }

        // Frame
        let (l, t, r, b) = (f.left as i64, f.top as i64, f.right() as i64, f.bottom() as i64);
        for x in l..=r {
            self.set(x, t, black);
            self.set(x, b, black);
        }
        for y in t..=b {
            self.set(l, y, black);
            self.set(r, y, black);
        }

        let glyph_h = GLYPH_HEIGHT as i64;
        for tick in nice_ticks(f.y_range.0, f.y_range.1, 5) {
            let py = f.py(tick).round() as i64;
            for x in l - 4..l {
                self.set(x, py, black);
            }
            let label = format_tick(tick);
            let w = text_width(&label, 1) as i64;
            draw_text(&mut self.img, l - 6 - w, py - glyph_h / 2, &label, 1, rgb(black));
        }
        if panel.show_x_ticks {
            for tick in nice_ticks(f.x_range.0, f.x_range.1, 4) {
                let px = f.px(tick).round() as i64;
                for y in b..b + 4 {
                    self.set(px, y, black);
                }
                let label = format_tick(tick);
                let w = text_width(&label, 1) as i64;
                draw_text(&mut self.img, px - w / 2, b + 6, &label, 1, rgb(black));
            }
        }

        let center = (f.left + f.width / 2.0) as i64;
        if !panel.title.is_empty() {
            let scale = if text_width(&panel.title, 2) + 8 <= cell_width { 2 } else { 1 };
            let w = text_width(&panel.title, scale) as i64;
            let h = glyph_h * scale as i64;
            draw_text(&mut self.img, center - w / 2, t - 8 - h, &panel.title, scale, rgb(black));
        }
        if !panel.x_label.is_empty() {
            let w = text_width(&panel.x_label, 1) as i64;
            draw_text(&mut self.img, center - w / 2, b + 18, &panel.x_label, 1, rgb(black));
        }
        if !panel.y_label.is_empty() {
            let h = text_width(&panel.y_label, 1) as i64;
            let middle = (f.top + f.height / 2.0) as i64;
            draw_text_vertical(&mut self.img, l - 60, middle + h / 2, &panel.y_label, 1, rgb(black));
        }

        let mut row = 0;
        for layer in &panel.layers {
            if let Layer::Line { label: Some(label), color, .. } = layer {
                let y = t + 4 + row * (glyph_h + 3);
                for x in l + 4..l + 16 {
                    self.set(x, y + glyph_h / 2, *color);
                }
                draw_text(&mut self.img, l + 20, y, label, 1, rgb(*color));
                row += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sample_panel() -> Panel {
        Panel::new("Sample")
            .x_label("Date")
            .y_label("Value")
            .layer(Layer::Band {
                xs: vec![0.0, 1.0, 2.0],
                lower: vec![-1.0, -2.0, -3.0],
                upper: vec![1.0, 2.0, 3.0],
                color: ORANGE,
            })
            .layer(Layer::labeled(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 0.5], BLUE, "series"))
            .layer(Layer::HLine { y: 0.0, color: GREY })
    }

    #[test]
    fn test_bounds_cover_all_layers() {
        let ((x0, x1), (y0, y1)) = sample_panel().bounds();
        assert_eq!((x0, x1), (0.0, 2.0));
        assert!(y0 < -3.0 && y1 > 3.0);

        let empty = Panel::new("empty").bounds();
        assert_eq!(empty, ((0.0, 1.0), (0.0, 1.0)));

        let flat = Panel::new("flat").layer(Layer::line(vec![1.0, 2.0], vec![5.0, 5.0], BLUE));
        let (_, (lo, hi)) = flat.bounds();
        assert!(lo < 5.0 && hi > 5.0);
    }

    #[test]
    fn test_nice_ticks() {
        assert_eq!(nice_ticks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        let ticks = nice_ticks(733_000.0, 737_000.0, 4);
        assert!(ticks.iter().all(|t| *t >= 733_000.0 && *t <= 737_000.0));
        assert!(ticks.len() >= 3);
        assert_eq!(nice_ticks(1.0, 1.0, 5), vec![1.0]);
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(0.0), "0");
        assert_eq!(format_tick(0.25), "0.25");
        assert_eq!(format_tick(150.0), "150");
        assert_eq!(format_tick(250_000.0), "250K");
        assert_eq!(format_tick(1_500_000.0), "1.5M");
        assert_eq!(format_tick(2e9), "2B");
        assert_eq!(format_tick(-0.5), "-0.5");
    }

    #[test]
    fn test_render_draws_series_and_band() {
        let mut fig = Figure::new(1, 2, 600, 300);
        fig.push(sample_panel());
        fig.push(Panel::new("Stems").layer(Layer::Stems {
            xs: vec![0.0, 1.0, 2.0],
            ys: vec![1.0, -0.3, 0.2],
            color: BLUE,
        }));
        let img = fig.render();
        assert_eq!(img.dimensions(), (600, 300));

        let white = Rgb([255, 255, 255]);
        let non_white = img.pixels().filter(|p| **p != white).count();
        assert!(non_white > 500);
        assert!(img.pixels().any(|p| *p == rgb(BLUE)));
    }

    #[test]
    fn test_save_png_and_svg() {
        let mut fig = Figure::new(1, 1, 320, 200);
        fig.push(sample_panel());

        let png = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        fig.save_png(png.path()).unwrap();
        let decoded = image::open(png.path()).unwrap();
        assert_eq!(decoded.width(), 320);

        let svg = fig.to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("polyline"));
        assert!(svg.contains("polygon"));
        assert!(svg.contains(">Sample<"));
        assert!(svg.contains(">series<"));

        let file = NamedTempFile::new().unwrap();
        fig.save_svg(file.path()).unwrap();
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), svg);
    }

    #[test]
    fn test_extra_panels_are_ignored() {
        let mut fig = Figure::new(1, 1, 100, 100);
        fig.push(Panel::new("a"));
        fig.push(Panel::new("b"));
        assert!(!fig.to_svg().contains(">b<"));
    }
}
