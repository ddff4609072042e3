//! A small raster plotting layer for benchmark figures.
//!
//! A [Figure](struct.Figure.html) is a grid of panels. Each panel plots line
//! series against the image index (on a left and an optional right axis) or
//! grouped bars per category. Figures are drawn with `imageproc` into an RGB
//! buffer and saved as PNG. Text (titles, axis labels, tick labels, legends
//! and bar values) is set in DejaVu Sans, embedded from `assets/`.

use crate::errors::*;
use ab_glyph::FontRef;
use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut,
                         draw_line_segment_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

static FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

const PANEL_WIDTH: u32 = 640;
const PANEL_HEIGHT: u32 = 400;
const SIDE: f32 = 72.0;
const TOP: f32 = 48.0;
const BOTTOM: f32 = 48.0;
const TICK: f32 = 5.0;
const Y_TICKS: usize = 5;

const TITLE_SIZE: f32 = 15.0;
const LABEL_SIZE: f32 = 13.0;
const TICK_SIZE: f32 = 11.0;
const LEGEND_SIZE: f32 = 12.0;
const VALUE_SIZE: f32 = 10.0;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);

/// Matplotlib's `tab10` colours.
pub const PALETTE: [Rgb<u8>; 10] = [
    Rgb([31, 119, 180]),
    Rgb([255, 127, 14]),
    Rgb([44, 160, 44]),
    Rgb([214, 39, 40]),
    Rgb([148, 103, 189]),
    Rgb([140, 86, 75]),
    Rgb([227, 119, 194]),
    Rgb([127, 127, 127]),
    Rgb([188, 189, 34]),
    Rgb([23, 190, 207]),
];

/// The `i`-th palette colour, wrapping around.
pub fn color(i: usize) -> Rgb<u8> {
    PALETTE[i % PALETTE.len()]
}

/// Formats a tick or bar value: whole numbers without decimals, everything
/// else with two.
pub fn value_label(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{:.0}", v)
    } else {
        format!("{:.2}", v)
    }
}

/// Which y axis a series is scaled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Left axis.
    Left,
    /// Right (twin) axis.
    Right,
}

/// How a panel draws its series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// Connected points, x = `offset + i`.
    Lines,
    /// One group of bars per category, one bar per series.
    Bars,
}

/// One plotted sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Legend entry.
    pub label: String,

    /// Values in x order.
    pub values: Vec<f64>,

    /// Line or bar colour.
    pub color: Rgb<u8>,

    /// Axis the values are scaled against.
    pub axis: Axis,

    /// x coordinate of the first value.
    pub offset: usize,
}

impl Series {
    /// Creates a left-axis series starting at x = 0.
    pub fn new<S: Into<String>>(label: S, values: Vec<f64>, color: Rgb<u8>) -> Self {
        Series {
            label: label.into(),
            values: values,
            color: color,
            axis: Axis::Left,
            offset: 0,
        }
    }

    /// Scales the series against the right axis.
    pub fn on_right(mut self) -> Self {
        self.axis = Axis::Right;
        self
    }

    /// Starts the series at x = `offset`.
    pub fn starting_at(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    fn last_x(&self) -> Option<usize> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.offset + self.values.len() - 1)
        }
    }
}

/// One plot area of a figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    /// Panel title; `\n` starts a new line.
    pub title: String,

    /// Names of the x positions (descriptor names for per-descriptor plots).
    /// Without categories the x ticks show the index.
    pub categories: Vec<String>,

    /// Line or bar rendering.
    pub mark: Mark,

    /// Plotted series.
    pub series: Vec<Series>,

    /// Caption under the x axis.
    pub x_label: String,

    /// Caption of the left axis.
    pub y_label: String,

    /// Caption of the right axis.
    pub right_label: String,

    /// Whether a legend box lists the series labels.
    pub legend: bool,

    /// Whether each bar carries its value.
    pub annotate: bool,
}

impl Panel {
    fn empty(title: String, categories: Vec<String>, mark: Mark) -> Self {
        Panel {
            title: title,
            categories: categories,
            mark: mark,
            series: Vec::new(),
            x_label: String::new(),
            y_label: String::new(),
            right_label: String::new(),
            legend: false,
            annotate: false,
        }
    }

    /// Creates an empty line panel.
    pub fn lines<S: Into<String>>(title: S) -> Self {
        Panel::empty(title.into(), Vec::new(), Mark::Lines)
    }

    /// Creates an empty bar panel over `categories`.
    pub fn bars<S: Into<String>>(title: S, categories: Vec<String>) -> Self {
        Panel::empty(title.into(), categories, Mark::Bars)
    }

    /// Names the x positions.
    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    /// Captions the x axis.
    pub fn with_x_label<S: Into<String>>(mut self, label: S) -> Self {
        self.x_label = label.into();
        self
    }

    /// Captions the left axis.
    pub fn with_y_label<S: Into<String>>(mut self, label: S) -> Self {
        self.y_label = label.into();
        self
    }

    /// Captions the right axis.
    pub fn with_right_label<S: Into<String>>(mut self, label: S) -> Self {
        self.right_label = label.into();
        self
    }

    /// Adds a legend box.
    pub fn with_legend(mut self) -> Self {
        self.legend = true;
        self
    }

    /// Writes the value above every bar.
    pub fn with_values(mut self) -> Self {
        self.annotate = true;
        self
    }

    /// Adds a series.
    pub fn push(&mut self, series: Series) {
        self.series.push(series);
    }

    fn has_right_axis(&self) -> bool {
        self.series.iter().any(|s| s.axis == Axis::Right)
    }

    /// Number of x slots: the longest series or the category count.
    fn slots(&self) -> usize {
        let longest = self.series
            .iter()
            .filter_map(|s| s.last_x())
            .max()
            .map_or(0, |x| x + 1);
        ::std::cmp::max(longest, self.categories.len())
    }

    /// Value range of an axis, always including zero.
    fn range(&self, axis: Axis) -> (f64, f64) {
        let values = self.series
            .iter()
            .filter(|s| s.axis == axis)
            .flat_map(|s| s.values.iter().cloned())
            .filter(|v| v.is_finite());
        let (lo, hi) = values.fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if hi - lo <= ::std::f64::EPSILON {
            (lo, lo + 1.0)
        } else {
            (lo, hi + (hi - lo) * 0.05)
        }
    }

    /// Label of x slot `i`.
    fn tick_label(&self, i: usize) -> String {
        match self.categories.get(i) {
            Some(name) => name.clone(),
            None if self.mark == Mark::Lines => i.to_string(),
            None => String::new(),
        }
    }
}

/// Maps data coordinates to pixels inside one panel.
#[derive(Debug, Clone, Copy)]
struct Frame {
    x0: f32,
    y0: f32,
    left: f32,
    top: f32,
    width: f32,
    height: f32,
}

impl Frame {
    fn of_panel(index: usize, cols: usize) -> Frame {
        let x0 = (index % cols) as f32 * PANEL_WIDTH as f32;
        let y0 = (index / cols) as f32 * PANEL_HEIGHT as f32;
        Frame {
            x0: x0,
            y0: y0,
            left: x0 + SIDE,
            top: y0 + TOP,
            width: PANEL_WIDTH as f32 - 2.0 * SIDE,
            height: PANEL_HEIGHT as f32 - TOP - BOTTOM,
        }
    }

    fn bottom(&self) -> f32 {
        self.top + self.height
    }

    fn right(&self) -> f32 {
        self.left + self.width
    }

    fn center_x(&self) -> f32 {
        self.left + self.width / 2.0
    }

    /// x of the centre of slot `i` out of `slots`.
    fn x(&self, i: usize, slots: usize) -> f32 {
        if slots <= 1 {
            self.center_x()
        } else {
            self.left + self.width * i as f32 / (slots - 1) as f32
        }
    }

    fn y(&self, v: f64, (lo, hi): (f64, f64)) -> f32 {
        let t = ((v - lo) / (hi - lo)) as f32;
        self.bottom() - t * self.height
    }
}

/// Horizontal anchor of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Start,
    Center,
    End,
}

/// Sets text in one font onto a canvas.
struct Pen<'f> {
    font: FontRef<'f>,
}

impl Pen<'static> {
    fn embedded() -> Result<Pen<'static>> {
        let font = FontRef::try_from_slice(FONT_DATA)
            .map_err(|e| Error::from(ErrorKind::Render(format!("embedded font: {}", e))))?;
        Ok(Pen { font: font })
    }
}

impl<'f> Pen<'f> {
    fn width(&self, size: f32, text: &str) -> f32 {
        text_size(size, &self.font, text).0 as f32
    }

    /// Draws `text` with its top at `y`.
    fn write(&self, canvas: &mut RgbImage, size: f32, (x, y): (f32, f32), align: Align, text: &str) {
        if text.is_empty() {
            return;
        }
        let left = match align {
            Align::Start => x,
            Align::Center => x - self.width(size, text) / 2.0,
            Align::End => x - self.width(size, text),
        };
        draw_text_mut(canvas, BLACK, left.round() as i32, y.round() as i32, size, &self.font, text);
    }

    /// Draws `text` reading bottom to top, its left edge at `x` and centred
    /// on `center_y`.
    fn write_up(&self, canvas: &mut RgbImage, size: f32, x: f32, center_y: f32, text: &str) {
        if text.is_empty() {
            return;
        }
        let (w, h) = text_size(size, &self.font, text);
        let mut strip = RgbImage::from_pixel(w + 2, h.max(size.ceil() as u32) + 2, WHITE);
        draw_text_mut(&mut strip, BLACK, 1, 1, size, &self.font, text);
        let strip = imageops::rotate270(&strip);
        let top = center_y - strip.height() as f32 / 2.0;
        imageops::overlay(canvas, &strip, x.round() as i64, top.round() as i64);
    }
}

/// A grid of panels rendered to one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    /// Name of the figure, also its file stem.
    pub name: String,

    rows: usize,
    cols: usize,
    panels: Vec<Panel>,
}

impl Figure {
    /// Creates an empty `rows` x `cols` figure.
    pub fn new<S: Into<String>>(name: S, rows: usize, cols: usize) -> Self {
        Figure {
            name: name.into(),
            rows: rows,
            cols: cols,
            panels: Vec::new(),
        }
    }

    /// Adds the next panel (row major).
    pub fn push(&mut self, panel: Panel) {
        self.panels.push(panel);
    }

    /// Panels in row-major order.
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Draws the figure.
    pub fn render(&self) -> Result<RgbImage> {
        if self.rows == 0 || self.cols == 0 || self.panels.is_empty() {
            bail!(ErrorKind::Render(format!("empty figure {}", self.name)));
        }
        if self.panels.len() > self.rows * self.cols {
            bail!(ErrorKind::Render(format!(
                "{} panels do not fit a {}x{} figure {}",
                self.panels.len(),
                self.rows,
                self.cols,
                self.name
            )));
        }

        let pen = Pen::embedded()?;
        let mut canvas = RgbImage::from_pixel(
            PANEL_WIDTH * self.cols as u32,
            PANEL_HEIGHT * self.rows as u32,
            WHITE,
        );
        for (i, panel) in self.panels.iter().enumerate() {
            let frame = Frame::of_panel(i, self.cols);
            draw_panel(&mut canvas, &pen, frame, panel);
        }
        Ok(canvas)
    }

    /// Renders and writes the figure as PNG, creating the directory if needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).chain_err(|| format!("failed to create {:?}", dir))?;
        }
        self.render()?
            .save(path)
            .chain_err(|| format!("failed to write {:?}", path))?;
        info!("saved figure {} to {:?}", self.name, path);
        Ok(())
    }
}

fn draw_panel(canvas: &mut RgbImage, pen: &Pen, frame: Frame, panel: &Panel) {
    let slots = ::std::cmp::max(panel.slots(), 1);
    let left = panel.range(Axis::Left);
    let right = panel.range(Axis::Right);
    let right_axis = panel.has_right_axis();

    for (i, line) in panel.title.lines().enumerate() {
        let y = frame.y0 + 8.0 + (TITLE_SIZE + 4.0) * i as f32;
        pen.write(canvas, TITLE_SIZE, (frame.center_x(), y), Align::Center, line);
    }

    // grid and y ticks
    for k in 0..(Y_TICKS + 1) {
        let y = frame.bottom() - frame.height * k as f32 / Y_TICKS as f32;
        let label_y = y - TICK_SIZE / 2.0;
        draw_line_segment_mut(canvas, (frame.left, y), (frame.right(), y), GRID);
        draw_line_segment_mut(canvas, (frame.left - TICK, y), (frame.left, y), BLACK);
        let at = |(lo, hi): (f64, f64)| lo + (hi - lo) * k as f64 / Y_TICKS as f64;
        let tick = (frame.left - TICK - 3.0, label_y);
        pen.write(canvas, TICK_SIZE, tick, Align::End, &value_label(at(left)));
        if right_axis {
            draw_line_segment_mut(canvas, (frame.right(), y), (frame.right() + TICK, y), BLACK);
            let tick = (frame.right() + TICK + 3.0, label_y);
            pen.write(canvas, TICK_SIZE, tick, Align::Start, &value_label(at(right)));
        }
    }

    // x ticks
    for i in 0..slots {
        let x = match panel.mark {
            Mark::Lines => frame.x(i, slots),
            Mark::Bars => bar_slot_center(frame, i, slots),
        };
        draw_line_segment_mut(canvas, (x, frame.bottom()), (x, frame.bottom() + TICK), BLACK);
        let label = (x, frame.bottom() + TICK + 2.0);
        pen.write(canvas, TICK_SIZE, label, Align::Center, &panel.tick_label(i));
    }

    let caption = (frame.center_x(), frame.bottom() + TICK + TICK_SIZE + 8.0);
    pen.write(canvas, LABEL_SIZE, caption, Align::Center, &panel.x_label);
    let middle = frame.top + frame.height / 2.0;
    pen.write_up(canvas, LABEL_SIZE, frame.x0 + 4.0, middle, &panel.y_label);
    let far = frame.x0 + PANEL_WIDTH as f32 - LABEL_SIZE - 8.0;
    pen.write_up(canvas, LABEL_SIZE, far, middle, &panel.right_label);

    match panel.mark {
        Mark::Lines => {
            for s in &panel.series {
                let range = if s.axis == Axis::Left { left } else { right };
                draw_polyline(canvas, frame, s, slots, range);
            }
        }
        Mark::Bars => draw_bars(canvas, pen, frame, panel, slots, left),
    }

    let border = Rect::at(frame.left as i32, frame.top as i32)
        .of_size(frame.width as u32, frame.height as u32);
    draw_hollow_rect_mut(canvas, border, BLACK);
    if panel.legend {
        draw_legend(canvas, pen, frame, panel);
    }
}

fn draw_polyline(canvas: &mut RgbImage, frame: Frame, s: &Series, slots: usize, range: (f64, f64)) {
    let points = s.values
        .iter()
        .enumerate()
        .map(|(i, &v)| if v.is_finite() {
            Some((frame.x(s.offset + i, slots), frame.y(v, range)))
        } else {
            None
        })
        .collect::<Vec<_>>();

    for pair in points.windows(2) {
        if let (Some(a), Some(b)) = (pair[0], pair[1]) {
            draw_line_segment_mut(canvas, a, b, s.color);
        }
    }
    for p in points.iter().filter_map(|p| *p) {
        draw_filled_circle_mut(canvas, (p.0.round() as i32, p.1.round() as i32), 3, s.color);
    }
}

fn bar_slot_center(frame: Frame, i: usize, slots: usize) -> f32 {
    let slot = frame.width / slots as f32;
    frame.left + slot * (i as f32 + 0.5)
}

fn draw_bars(
    canvas: &mut RgbImage,
    pen: &Pen,
    frame: Frame,
    panel: &Panel,
    slots: usize,
    range: (f64, f64),
) {
    let n = ::std::cmp::max(panel.series.len(), 1) as f32;
    let slot = frame.width / slots as f32;
    let bar = (slot * 0.8 / n).max(1.0);
    let baseline = frame.y(0.0f64.max(range.0), range);

    for (j, s) in panel.series.iter().enumerate() {
        for (i, &v) in s.values.iter().enumerate().filter(|&(_, v)| v.is_finite()) {
            let x = bar_slot_center(frame, s.offset + i, slots) - slot * 0.4 + bar * j as f32;
            let y = frame.y(v, range);
            let (top, height) = if y < baseline {
                (y, baseline - y)
            } else {
                (baseline, y - baseline)
            };
            let rect = Rect::at(x.round() as i32, top.round() as i32)
                .of_size(bar.round().max(1.0) as u32, height.round().max(1.0) as u32);
            draw_filled_rect_mut(canvas, rect, s.color);

            if panel.annotate {
                let above = (x + bar / 2.0, top - VALUE_SIZE - 2.0);
                pen.write(canvas, VALUE_SIZE, above, Align::Center, &value_label(v));
            }
        }
    }
}

fn draw_legend(canvas: &mut RgbImage, pen: &Pen, frame: Frame, panel: &Panel) {
    let entries = panel
        .series
        .iter()
        .filter(|s| !s.label.is_empty())
        .collect::<Vec<_>>();
    if entries.is_empty() {
        return;
    }

    let row = LEGEND_SIZE + 4.0;
    let widest = entries
        .iter()
        .map(|s| pen.width(LEGEND_SIZE, &s.label))
        .fold(0.0f32, f32::max);
    let width = 8.0 + 14.0 + 6.0 + widest + 8.0;
    let height = 8.0 + row * entries.len() as f32;
    let x = frame.right() - width - 6.0;
    let y = frame.top + 6.0;

    let boxed = Rect::at(x as i32, y as i32).of_size(width as u32, height as u32);
    draw_filled_rect_mut(canvas, boxed, WHITE);
    draw_hollow_rect_mut(canvas, boxed, BLACK);
    for (j, s) in entries.iter().enumerate() {
        let line = y + 4.0 + row * j as f32;
        let swatch = Rect::at((x + 8.0) as i32, (line + 3.0) as i32).of_size(14, 8);
        draw_filled_rect_mut(canvas, swatch, s.color);
        pen.write(canvas, LEGEND_SIZE, (x + 28.0, line), Align::Start, &s.label);
    }
}

/// Opens the saved figures with `viewer`. Displaying is best effort: a
/// missing or failing viewer is only logged.
pub fn show_figures(paths: &[PathBuf], viewer: Option<&str>) {
    if paths.is_empty() {
        return;
    }
    let viewer = match viewer {
        Some(v) => v,
        None => {
            info!("no viewer configured, figures saved to {:?}", paths);
            return;
        }
    };

    match Command::new(viewer).args(paths).status() {
        Ok(status) if status.success() => debug!("{} exited", viewer),
        Ok(status) => warn!("{} exited with {}", viewer, status),
        Err(e) => warn!("failed to start viewer {}: {}", viewer, e),
    }
}
