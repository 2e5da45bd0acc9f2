//! Standalone SVG line charts.
//!
//! The x axis is calendar time, so series on different date indexes line up.
//! Undefined values break the line instead of being drawn as zero.

use crate::adapters::labeled_series::LabeledSeries;
use chrono::NaiveDate;

pub(super) const WIDTH: f64 = 800.0;
pub(super) const HEIGHT: f64 = 360.0;
pub(super) const PADDING: f64 = 50.0;
pub(super) const LEGEND_ROW: f64 = 16.0;

pub(super) const PALETTE: [&str; 8] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ValueFormat {
    #[default]
    Number,
    /// Values are fractions, labelled as percentages.
    Percent,
}

impl ValueFormat {
    pub(super) fn label(self, value: f64) -> String {
        match self {
            ValueFormat::Number => format!("{:.2}", value),
            ValueFormat::Percent => format!("{:.1}%", value * 100.0),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChartOptions {
    pub title: String,
    pub format: ValueFormat,
    /// Draw a dashed horizontal line at this value when it is in range.
    pub reference_line: Option<f64>,
}

struct Bounds {
    first_date: NaiveDate,
    last_date: NaiveDate,
    min: f64,
    max: f64,
}

impl Bounds {
    fn of(series: &[LabeledSeries], reference: Option<f64>) -> Option<Self> {
        let mut values = series.iter().flat_map(|s| s.defined());
        let (date, value) = values.next()?;
        let mut b = Bounds {
            first_date: date,
            last_date: date,
            min: value,
            max: value,
        };
        for (date, value) in values {
            b.first_date = b.first_date.min(date);
            b.last_date = b.last_date.max(date);
            b.min = b.min.min(value);
            b.max = b.max.max(value);
        }
        if let Some(r) = reference {
            b.min = b.min.min(r);
            b.max = b.max.max(r);
        }
        if b.max == b.min {
            b.min -= 0.5;
            b.max += 0.5;
        }
        Some(b)
    }

    fn x(&self, date: NaiveDate) -> f64 {
        let span = (self.last_date - self.first_date).num_days();
        if span == 0 {
            return WIDTH / 2.0;
        }
        let offset = (date - self.first_date).num_days();
        PADDING + offset as f64 / span as f64 * (WIDTH - 2.0 * PADDING)
    }

    fn y(&self, value: f64) -> f64 {
        HEIGHT - PADDING - (value - self.min) / (self.max - self.min) * (HEIGHT - 2.0 * PADDING)
    }
}

/// Renders every series as one line. Returns an empty string when no series
/// has a defined value.
pub fn render_line_chart(series: &[LabeledSeries], options: &ChartOptions) -> String {
    let Some(bounds) = Bounds::of(series, options.reference_line) else {
        return String::new();
    };

    let legend_height = LEGEND_ROW * series.len() as f64;
    let mut svg = open_svg(WIDTH, HEIGHT + legend_height, &options.title);

    // axes
    let bottom = HEIGHT - PADDING;
    let right = WIDTH - PADDING;
    svg.push_str(&format!(
        "<path d=\"M{p:.1},{p:.1} L{p:.1},{b:.1} L{r:.1},{b:.1}\" fill=\"none\" stroke=\"#333\" stroke-width=\"1\"/>\n",
        p = PADDING,
        b = bottom,
        r = right,
    ));
    for (value, anchor_y) in [(bounds.max, PADDING), (bounds.min, bottom)] {
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\">{}</text>\n",
            PADDING - 4.0,
            anchor_y + 4.0,
            options.format.label(value)
        ));
    }
    for (date, anchor) in [(bounds.first_date, "start"), (bounds.last_date, "end")] {
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"{}\">{}</text>\n",
            bounds.x(date),
            bottom + 16.0,
            anchor,
            date
        ));
    }

    if let Some(r) = options.reference_line {
        let y = bounds.y(r);
        svg.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#999\" stroke-dasharray=\"4 3\"/>\n",
            PADDING, right,
        ));
    }

    for (i, s) in series.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let path = line_path(s, &bounds);
        if !path.is_empty() {
            svg.push_str(&format!(
                "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"/>\n",
                path, color
            ));
        }
        svg.push_str(&legend_entry(i, HEIGHT, &s.label));
    }

    svg.push_str("</svg>\n");
    svg
}

/// Path data with a new subpath after every gap.
fn line_path(series: &LabeledSeries, bounds: &Bounds) -> String {
    let mut segments = Vec::with_capacity(series.points.len());
    let mut pen_down = false;
    for &(date, value) in &series.points {
        match value {
            Some(v) => {
                let cmd = if pen_down { 'L' } else { 'M' };
                segments.push(format!("{}{:.1},{:.1}", cmd, bounds.x(date), bounds.y(v)));
                pen_down = true;
            }
            None => pen_down = false,
        }
    }
    segments.join(" ")
}

/// `<svg>` root, white background and centered title.
pub(super) fn open_svg(width: f64, height: f64, title: &str) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w:.0}\" height=\"{h:.0}\" viewBox=\"0 0 {w:.0} {h:.0}\" font-family=\"sans-serif\" font-size=\"11\">\n\
         <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n\
         <text x=\"{x:.1}\" y=\"24\" font-size=\"15\" text-anchor=\"middle\">{t}</text>\n",
        w = width,
        h = height,
        x = width / 2.0,
        t = escape(title),
    )
}

/// Color swatch and label for legend row `i`, below a plot of height `top`.
pub(super) fn legend_entry(i: usize, top: f64, label: &str) -> String {
    let y = top + LEGEND_ROW * i as f64;
    format!(
        "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"10\" height=\"10\" fill=\"{}\"/><text x=\"{:.1}\" y=\"{:.1}\">{}</text>\n",
        PADDING,
        y - 9.0,
        PALETTE[i % PALETTE.len()],
        PADDING + 16.0,
        y,
        escape(label)
    )
}

pub(super) fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
