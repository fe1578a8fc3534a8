use std::f64::consts::FRAC_PI_4;

use anyhow::{anyhow, bail, Result};
use leptos::{html::Canvas, HtmlElement};
use tracing::{debug, error};
use wasm_bindgen::JsCast;
use web_sys::CanvasRenderingContext2d;

use crate::use_canvas::CanvasSize;

use super::types::Series;

const COLORS: [&str; 5] = ["#ff00c1", "#9600ff", "#4900ff", "#00b8ff", "#00fff9"];

const BAR_WIDTH: f64 = 10.0;
const TITLE_HEIGHT: f64 = 40.0;
const AXIS_WIDTH: f64 = 56.0;
const LABELS_HEIGHT: f64 = 150.0;
const PANEL_GAP: f64 = 24.0;
const TICK_LENGTH: f64 = 6.0;
const Y_TICKS: u32 = 5;

/// Where panels, bars and axes go for a given canvas size. One panel per series, side by
/// side, sharing the same vertical scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    pub width: f64,
    pub height: f64,
    pub panels: usize,
    pub max_value: f64,
}

impl ChartLayout {
    pub fn new(series: &[Series], width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            panels: series.len(),
            max_value: scale_max(series),
        }
    }

    #[expect(clippy::cast_precision_loss)]
    fn panel_outer_width(&self) -> f64 {
        let panels = self.panels.max(1) as f64;
        ((self.width - PANEL_GAP * (panels - 1.0)) / panels).max(0.0)
    }

    #[expect(clippy::cast_precision_loss)]
    pub fn plot_left(&self, panel: usize) -> f64 {
        panel as f64 * (self.panel_outer_width() + PANEL_GAP) + AXIS_WIDTH
    }

    pub fn plot_width(&self) -> f64 {
        (self.panel_outer_width() - AXIS_WIDTH).max(0.0)
    }

    pub fn plot_top(&self) -> f64 {
        TITLE_HEIGHT
    }

    pub fn plot_bottom(&self) -> f64 {
        (self.height - LABELS_HEIGHT).max(self.plot_top())
    }

    #[expect(clippy::cast_precision_loss)]
    fn slot_width(&self, count: usize) -> f64 {
        self.plot_width() / count.max(1) as f64
    }

    #[expect(clippy::cast_precision_loss)]
    pub fn slot_center(&self, panel: usize, index: usize, count: usize) -> f64 {
        let slot_width = self.slot_width(count);
        self.plot_left(panel) + slot_width * index as f64 + slot_width / 2.0
    }

    pub fn value_to_y(&self, value: f64) -> f64 {
        let plot_height = self.plot_bottom() - self.plot_top();
        self.plot_bottom() - value / self.max_value * plot_height
    }

    /// The panel and the bar under the pointer, if any.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn hit(&self, series: &[Series], x: f64, y: f64) -> Option<(usize, usize)> {
        if y < self.plot_top() || y > self.plot_bottom() {
            return None;
        }

        series.iter().enumerate().find_map(|(panel, series)| {
            let offset = x - self.plot_left(panel);
            if offset < 0.0 || offset >= self.plot_width() {
                return None;
            }

            let index = (offset / self.slot_width(series.points.len())).floor() as usize;
            (index < series.points.len()).then_some((panel, index))
        })
    }
}

pub fn find_max_value(series: &[Series]) -> Option<f64> {
    series
        .iter()
        .flat_map(|series| series.points.iter().map(|(_, value)| *value))
        .max_by(f64::total_cmp)
}

/// Top of the vertical scale, with some headroom over the tallest bar.
fn scale_max(series: &[Series]) -> f64 {
    match find_max_value(series) {
        Some(max) if max > 0.0 => max * 1.1,
        _ => 1.0,
    }
}

pub fn get_color(index: usize) -> &'static str {
    COLORS[index % COLORS.len()]
}

pub struct ComparisonCanvas {
    ctx: CanvasRenderingContext2d,
}

impl ComparisonCanvas {
    pub fn try_new(node: &HtmlElement<Canvas>) -> Result<Self> {
        #[derive(serde::Serialize)]
        struct ContextOptions {
            alpha: bool,
        }

        let ctx = node
            .get_context_with_context_options(
                "2d",
                &serde_wasm_bindgen::to_value(&ContextOptions { alpha: false })
                    .map_err(|err| anyhow!("context options serialization error: {err}"))?,
            )
            .map_err(|err| anyhow!("{err:?}"))?;
        let Some(ctx) = ctx else {
            bail!("canvas' 2d context not found");
        };

        let ctx = ctx
            .dyn_into()
            .map_err(|err| anyhow!("context dyn conversion error: {err:?}"))?;

        Ok(Self { ctx })
    }

    pub fn render(
        &mut self,
        series: &[Series],
        size: CanvasSize,
        hovered: Option<(usize, usize)>,
    ) {
        debug!(series = series.len(), ?size, "rendering");

        if size.is_empty() {
            return;
        }

        let layout = ChartLayout::new(series, size.width, size.height);

        self.ctx.save();
        if let Err(err) = self.ctx.scale(size.dpr, size.dpr) {
            error!(size.dpr, "context scaling failed: {err:?}");
        };
        self.ctx.set_font("14px Arial");
        self.ctx.set_fill_style(&"#13171f".into());
        self.ctx.fill_rect(0.0, 0.0, size.width, size.height);
        self.ctx.set_fill_style(&"white".into());

        if series.is_empty() {
            self.fill_text("no measurements yet", 16.0, 24.0);
        }

        for (panel, series) in series.iter().enumerate() {
            self.render_title(&layout, panel, series);
            self.render_scale(&layout, panel);
            self.render_bars(&layout, panel, series, hovered);
            self.render_labels(&layout, panel, series);
        }

        self.ctx.restore();
    }

    fn render_title(&mut self, layout: &ChartLayout, panel: usize, series: &Series) {
        self.ctx.set_fill_style(&get_color(panel).into());
        self.fill_text(&series.url, layout.plot_left(panel), TITLE_HEIGHT / 2.0);
        self.ctx.set_fill_style(&"white".into());
    }

    fn render_scale(&mut self, layout: &ChartLayout, panel: usize) {
        let left = layout.plot_left(panel);
        let bottom = layout.plot_bottom();

        self.ctx.begin_path();
        self.ctx.move_to(left, layout.plot_top());
        self.ctx.line_to(left, bottom);
        self.ctx.line_to(left + layout.plot_width(), bottom);
        self.ctx.set_stroke_style(&"white".into());
        self.ctx.stroke();

        self.ctx.set_text_align("right");
        for tick in 0..=Y_TICKS {
            let value = layout.max_value * f64::from(tick) / f64::from(Y_TICKS);
            let y = layout.value_to_y(value);

            self.ctx.begin_path();
            self.ctx.move_to(left - TICK_LENGTH, y);
            self.ctx.line_to(left, y);
            self.ctx.stroke();

            self.fill_text(&format!("{value:.1}s"), left - TICK_LENGTH * 2.0, y + 4.0);
        }
        self.ctx.set_text_align("start");
    }

    fn render_bars(
        &mut self,
        layout: &ChartLayout,
        panel: usize,
        series: &Series,
        hovered: Option<(usize, usize)>,
    ) {
        let count = series.points.len();
        let bottom = layout.plot_bottom();

        self.ctx.set_fill_style(&get_color(panel).into());
        for (index, (_timestamp, value)) in series.points.iter().enumerate() {
            let x = layout.slot_center(panel, index, count) - BAR_WIDTH / 2.0;
            let y = layout.value_to_y(*value);

            self.ctx.fill_rect(x, y, BAR_WIDTH, bottom - y);

            if hovered == Some((panel, index)) {
                self.ctx.set_stroke_style(&"white".into());
                self.ctx.stroke_rect(x, y, BAR_WIDTH, bottom - y);
            }
        }
        self.ctx.set_fill_style(&"white".into());
    }

    fn render_labels(&mut self, layout: &ChartLayout, panel: usize, series: &Series) {
        let count = series.points.len();

        self.ctx.set_font("12px Arial");
        self.ctx.set_text_align("right");
        for (index, (timestamp, _value)) in series.points.iter().enumerate() {
            self.ctx.save();
            let x = layout.slot_center(panel, index, count);
            if let Err(err) = self.ctx.translate(x, layout.plot_bottom() + TICK_LENGTH * 2.0) {
                error!("translation error: {err:?}");
            }
            if let Err(err) = self.ctx.rotate(-FRAC_PI_4) {
                error!("rotation error: {err:?}");
            }
            self.fill_text(timestamp, 0.0, 0.0);
            self.ctx.restore();
        }
        self.ctx.set_text_align("start");
        self.ctx.set_font("14px Arial");
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        if let Err(err) = self.ctx.fill_text(text, x, y) {
            error!("fill text error: {err:?}");
        }
    }
}
