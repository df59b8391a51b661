//! Range charts of a comparison.
//!
//! One chart is drawn per point. For every component it shows the min-to-max
//! range of the current LoadSet as a wide light bar and the range of the
//! previous LoadSet as a narrow bar on top of it. The narrow bar turns dark
//! red when the previous range reaches outside the current one. Forces and
//! moments sit in separate panels because their units differ.
//!
//! Charts are plain data ([`RangeChart`]) until rendered with
//! [`RangeChart::to_svg`], so another front end can draw them its own way.

use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;

use super::ansys::sanitize_filename;
use super::compare::{ExtremeKind, LoadSetComparison};
use super::error::{LoadError, LoadResult};
use super::force_moment::Component;

/// Width of written charts in pixels.
pub const CHART_WIDTH: f64 = 800.0;

/// Height of written charts in pixels.
pub const CHART_HEIGHT: f64 = 600.0;

const CURRENT_FILL: &str = "#d3d3d3";
const PREVIOUS_FILL: &str = "#a9a9a9";
const EXCEEDS_FILL: &str = "#800000";
const INK: &str = "#333333";

/// File formats charts can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    /// Standalone SVG document.
    #[default]
    Svg,
}

impl ChartFormat {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
        }
    }
}

impl fmt::Display for ChartFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ChartFormat {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            other => Err(LoadError::malformed(format!(
                "unsupported chart format '{other}' (supported: svg)"
            ))),
        }
    }
}

/// Extreme range of one component in both LoadSets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentRange {
    /// Component.
    pub component: Component,
    /// Minimum in the current LoadSet.
    pub loadset1_min: f64,
    /// Maximum in the current LoadSet.
    pub loadset1_max: f64,
    /// Minimum in the previous LoadSet.
    pub loadset2_min: f64,
    /// Maximum in the previous LoadSet.
    pub loadset2_max: f64,
}

impl ComponentRange {
    /// Whether the previous range reaches below or above the current one.
    #[must_use]
    pub fn exceeds(&self) -> bool {
        self.loadset2_min < self.loadset1_min || self.loadset2_max > self.loadset1_max
    }
}

/// Everything needed to draw the range chart of one point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeChart {
    /// Point name.
    pub point_name: String,
    /// Current LoadSet name.
    pub loadset1_name: String,
    /// Previous LoadSet name.
    pub loadset2_name: String,
    /// Force unit symbol.
    pub force_unit: String,
    /// Moment unit symbol.
    pub moment_unit: String,
    /// Force components in canonical order.
    pub forces: Vec<ComponentRange>,
    /// Moment components in canonical order.
    pub moments: Vec<ComponentRange>,
}

#[derive(Debug, Clone, Copy)]
struct Area {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl RangeChart {
    /// Renders the chart as a standalone SVG document.
    #[must_use]
    pub fn to_svg(&self, width: f64, height: f64) -> String {
        let mut svg = String::new();
        svg.push_str(r#"<svg xmlns="http://www.w3.org/2000/svg" "#);
        let _ = write!(svg, r#"width="{width:.0}" height="{height:.0}" "#);
        let _ = writeln!(
            svg,
            r#"viewBox="0 0 {width:.0} {height:.0}" font-family="sans-serif">"#
        );
        let _ = writeln!(
            svg,
            r#"<rect x="0" y="0" width="{width:.0}" height="{height:.0}" fill="white"/>"#
        );
        text(
            &mut svg,
            width / 2.0,
            32.0,
            r#"font-size="18" font-weight="bold" text-anchor="middle""#,
            &format!("{}: Forces vs Moments Comparison", self.point_name),
        );

        let top = 56.0;
        let legend_y = height - 28.0;
        let panel_height = legend_y - 36.0 - top;
        let panel_width = width / 2.0;
        let forces = Area {
            x: 0.0,
            y: top,
            w: panel_width,
            h: panel_height,
        };
        let moments = Area {
            x: panel_width,
            ..forces
        };
        panel(&mut svg, forces, "Forces", &self.force_unit, &self.forces);
        panel(&mut svg, moments, "Moments", &self.moment_unit, &self.moments);
        self.legend(&mut svg, width, legend_y);

        svg.push_str("</svg>\n");
        svg
    }

    fn legend(&self, svg: &mut String, width: f64, y: f64) {
        let entries = [
            (CURRENT_FILL, self.loadset1_name.clone()),
            (PREVIOUS_FILL, format!("{} (within range)", self.loadset2_name)),
            (EXCEEDS_FILL, format!("{} (exceeds range)", self.loadset2_name)),
        ];
        let slot = width / 3.0;
        for (i, (fill, label)) in entries.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)] // three entries
            let x = slot * i as f64 + 16.0;
            let _ = writeln!(
                svg,
                r#"<rect x="{x:.1}" y="{:.1}" width="14" height="14" fill="{fill}"/>"#,
                y - 11.0
            );
            text(svg, x + 20.0, y, r#"font-size="12""#, label);
        }
    }
}

/// Draws one titled panel of range bars into `area`.
fn panel(svg: &mut String, area: Area, title: &str, unit: &str, ranges: &[ComponentRange]) {
    text(
        svg,
        area.x + area.w / 2.0,
        area.y + 14.0,
        r#"font-size="14" font-weight="bold" text-anchor="middle""#,
        title,
    );
    let plot = Area {
        x: area.x + 80.0,
        y: area.y + 30.0,
        w: area.w - 100.0,
        h: area.h - 60.0,
    };

    let (lo, hi) = value_bounds(ranges);
    let to_y = |v: f64| plot.y + plot.h * (hi - v) / (hi - lo);

    let step = tick_step(hi - lo);
    let decimals = tick_decimals(step);
    let mut tick = (lo / step).ceil() * step;
    while tick <= hi {
        let y = to_y(tick);
        let value = if tick.abs() < step * 1e-9 { 0.0 } else { tick };
        line(svg, (plot.x - 5.0, y), (plot.x, y), "");
        text(
            svg,
            plot.x - 8.0,
            y + 4.0,
            r#"font-size="11" text-anchor="end""#,
            &format!("{value:.decimals$}"),
        );
        tick += step;
    }
    let zero = to_y(0.0);
    line(
        svg,
        (plot.x, zero),
        (plot.x + plot.w, zero),
        r#"stroke-opacity="0.6""#,
    );

    let label_x = area.x + 20.0;
    let label_y = plot.y + plot.h / 2.0;
    let rotate = format!("rotate(-90 {label_x:.1} {label_y:.1})");
    text(
        svg,
        label_x,
        label_y,
        &format!(r#"font-size="12" text-anchor="middle" transform="{rotate}""#),
        &format!("Value ({unit})"),
    );
    text(
        svg,
        plot.x + plot.w / 2.0,
        plot.y + plot.h + 40.0,
        r#"font-size="12" text-anchor="middle""#,
        "Component",
    );

    // Three slots wide regardless of the bar count, centred on the bars.
    #[allow(clippy::cast_precision_loss)] // at most three components
    let centre = (ranges.len().max(1) - 1) as f64 / 2.0;
    let slot = plot.w / 3.0;
    for (i, range) in ranges.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let x = plot.x + slot * (i as f64 - centre + 1.5);
        bar(
            svg,
            x,
            slot * 0.8,
            to_y(range.loadset1_max),
            to_y(range.loadset1_min),
            CURRENT_FILL,
        );
        let fill = if range.exceeds() {
            EXCEEDS_FILL
        } else {
            PREVIOUS_FILL
        };
        bar(
            svg,
            x,
            slot * 0.4,
            to_y(range.loadset2_max),
            to_y(range.loadset2_min),
            fill,
        );
        text(
            svg,
            x,
            plot.y + plot.h + 18.0,
            r#"font-size="12" text-anchor="middle""#,
            range.component.as_str(),
        );
    }
}

/// A bar centred on `x` spanning `top` to `bottom`, at least one pixel high.
fn bar(svg: &mut String, x: f64, width: f64, top: f64, bottom: f64, fill: &str) {
    let _ = writeln!(
        svg,
        r#"<rect x="{:.1}" y="{top:.1}" width="{width:.1}" height="{:.1}" fill="{fill}"/>"#,
        x - width / 2.0,
        (bottom - top).max(1.0)
    );
}

fn line(svg: &mut String, from: (f64, f64), to: (f64, f64), attributes: &str) {
    let _ = writeln!(
        svg,
        r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{INK}" {attributes}/>"#,
        from.0, from.1, to.0, to.1
    );
}

fn text(svg: &mut String, x: f64, y: f64, attributes: &str, content: &str) {
    let _ = writeln!(
        svg,
        r#"<text x="{x:.1}" y="{y:.1}" fill="{INK}" {attributes}>{}</text>"#,
        escape_xml(content)
    );
}

/// Lowest and highest value to plot, padded by 10 % and always including zero.
fn value_bounds(ranges: &[ComponentRange]) -> (f64, f64) {
    let (lo, hi) = ranges
        .iter()
        .flat_map(|r| [r.loadset1_min, r.loadset1_max, r.loadset2_min, r.loadset2_max])
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let span = hi - lo;
    if span > 0.0 {
        (lo - span * 0.1, hi + span * 0.1)
    } else {
        (lo - 1.0, hi + 1.0)
    }
}

/// A 1, 2 or 5 times power-of-ten step giving about five ticks over `span`.
fn tick_step(span: f64) -> f64 {
    let raw = span / 5.0;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = match raw / magnitude {
        r if r <= 1.0 => 1.0,
        r if r <= 2.0 => 2.0,
        r if r <= 5.0 => 5.0,
        _ => 10.0,
    };
    step * magnitude
}

fn tick_decimals(step: f64) -> usize {
    let exponent = step.log10().floor();
    if exponent >= 0.0 {
        0
    } else {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let digits = (-exponent) as usize;
        digits.min(12)
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

impl LoadSetComparison {
    /// One range chart per point, in point order.
    #[must_use]
    pub fn range_charts(&self) -> Vec<RangeChart> {
        let mut ranges: IndexMap<(&str, Component), ComponentRange> = IndexMap::new();
        for row in &self.comparison_rows {
            let range = ranges
                .entry((row.point_name.as_str(), row.component))
                .or_insert(ComponentRange {
                    component: row.component,
                    loadset1_min: 0.0,
                    loadset1_max: 0.0,
                    loadset2_min: 0.0,
                    loadset2_max: 0.0,
                });
            match row.kind {
                ExtremeKind::Max => {
                    range.loadset1_max = row.loadset1_value;
                    range.loadset2_max = row.loadset2_value;
                }
                ExtremeKind::Min => {
                    range.loadset1_min = row.loadset1_value;
                    range.loadset2_min = row.loadset2_value;
                }
            }
        }

        let mut charts: IndexMap<&str, RangeChart> = IndexMap::new();
        for ((point, component), range) in ranges {
            let chart = charts.entry(point).or_insert_with(|| RangeChart {
                point_name: point.to_string(),
                loadset1_name: self.metadata.loadset1.name.clone(),
                loadset2_name: self.metadata.loadset2.name.clone(),
                force_unit: self.units.forces.to_string(),
                moment_unit: self.units.moments.to_string(),
                forces: Vec::new(),
                moments: Vec::new(),
            });
            if component.is_force() {
                chart.forces.push(range);
            } else {
                chart.moments.push(range);
            }
        }
        charts.into_values().collect()
    }

    /// Writes one `<point>_ranges.<ext>` chart per point into `dir`, creating
    /// it if needed. Returns the written file per point name.
    ///
    /// File names are checked for collisions before anything is written.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedInput`] if two points map to the same
    /// file name or a point name has no usable characters, and
    /// [`LoadError::FileWrite`] if the folder or a file cannot be written.
    pub fn write_range_charts(
        &self,
        dir: &Path,
        format: ChartFormat,
    ) -> LoadResult<IndexMap<String, PathBuf>> {
        let charts = self.range_charts();

        let mut owners: HashMap<String, &str> = HashMap::new();
        let mut targets = Vec::with_capacity(charts.len());
        for chart in &charts {
            let stem = sanitize_filename(&chart.point_name);
            if stem.is_empty() {
                return Err(LoadError::malformed(format!(
                    "point '{}' has no characters usable in a file name",
                    chart.point_name
                )));
            }
            let file_name = format!("{stem}_ranges.{}", format.extension());
            if let Some(previous) = owners.insert(file_name.clone(), &chart.point_name) {
                return Err(LoadError::malformed(format!(
                    "points '{previous}' and '{}' both chart to {file_name}",
                    chart.point_name
                )));
            }
            targets.push(dir.join(file_name));
        }

        std::fs::create_dir_all(dir).map_err(|e| LoadError::file_write(dir, e))?;

        let mut files = IndexMap::with_capacity(charts.len());
        for (chart, path) in charts.iter().zip(targets) {
            let rendered = match format {
                ChartFormat::Svg => chart.to_svg(CHART_WIDTH, CHART_HEIGHT),
            };
            std::fs::write(&path, rendered).map_err(|e| LoadError::file_write(&path, e))?;
            tracing::debug!(
                path = %path.display(),
                point = %chart.point_name,
                "Wrote range chart"
            );
            files.insert(chart.point_name.clone(), path);
        }

        tracing::info!(
            dir = %dir.display(),
            charts = files.len(),
            %format,
            "Wrote range charts"
        );
        Ok(files)
    }
}
