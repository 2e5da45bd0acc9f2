//! Overlaid return histograms on shared bins.
//!
//! Bar heights are the fraction of each series' observations in the bin, so
//! series of different lengths compare directly.

use super::chart::{
    ChartOptions, HEIGHT, LEGEND_ROW, PADDING, PALETTE, WIDTH, legend_entry, open_svg,
};
use crate::adapters::labeled_series::LabeledSeries;

pub const DEFAULT_BINS: usize = 40;

/// Shared bin edges over every defined value.
struct Bins {
    min: f64,
    width: f64,
    count: usize,
}

impl Bins {
    fn of(series: &[LabeledSeries], count: usize) -> Option<Self> {
        let mut values = series.iter().flat_map(|s| s.defined().map(|(_, v)| v));
        let first = values.next()?;
        let (mut min, mut max) = (first, first);
        for v in values {
            min = min.min(v);
            max = max.max(v);
        }
        if max == min {
            let pad = if min == 0.0 { 0.01 } else { min.abs() * 0.1 };
            min -= pad;
            max += pad;
        }
        let count = count.max(1);
        Some(Bins {
            min,
            width: (max - min) / count as f64,
            count,
        })
    }

    fn max(&self) -> f64 {
        self.min + self.width * self.count as f64
    }

    fn index(&self, value: f64) -> usize {
        (((value - self.min) / self.width).floor() as usize).min(self.count - 1)
    }

    /// Fraction of the series' defined values falling in each bin.
    fn frequencies(&self, series: &LabeledSeries) -> Vec<f64> {
        let mut counts = vec![0usize; self.count];
        let mut total = 0usize;
        for (_, v) in series.defined() {
            counts[self.index(v)] += 1;
            total += 1;
        }
        if total == 0 {
            return vec![0.0; self.count];
        }
        counts.iter().map(|&c| c as f64 / total as f64).collect()
    }

    fn x(&self, value: f64) -> f64 {
        PADDING + (value - self.min) / (self.max() - self.min) * (WIDTH - 2.0 * PADDING)
    }
}

/// Renders one step outline per series. `reference_line` marks a value on
/// the x axis. Returns an empty string when no series has a defined value.
pub fn render_histogram(series: &[LabeledSeries], options: &ChartOptions, bins: usize) -> String {
    let Some(bins) = Bins::of(series, bins) else {
        return String::new();
    };
    let frequencies: Vec<Vec<f64>> = series.iter().map(|s| bins.frequencies(s)).collect();
    let peak = frequencies
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, &f| acc.max(f));
    let bottom = HEIGHT - PADDING;
    let y = |f: f64| bottom - f / peak * (HEIGHT - 2.0 * PADDING);

    let mut svg = open_svg(
        WIDTH,
        HEIGHT + LEGEND_ROW * series.len() as f64,
        &options.title,
    );
    svg.push_str(&format!(
        "<path d=\"M{p:.1},{p:.1} L{p:.1},{b:.1} L{r:.1},{b:.1}\" fill=\"none\" stroke=\"#333\" stroke-width=\"1\"/>\n",
        p = PADDING,
        b = bottom,
        r = WIDTH - PADDING,
    ));
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\">{:.0}%</text>\n",
        PADDING - 4.0,
        PADDING + 4.0,
        peak * 100.0
    ));
    for (value, anchor) in [(bins.min, "start"), (bins.max(), "end")] {
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"{}\">{}</text>\n",
            bins.x(value),
            bottom + 16.0,
            anchor,
            options.format.label(value)
        ));
    }

    if let Some(r) = options.reference_line.filter(|r| (bins.min..=bins.max()).contains(r)) {
        let x = bins.x(r);
        svg.push_str(&format!(
            "<line x1=\"{x:.1}\" y1=\"{:.1}\" x2=\"{x:.1}\" y2=\"{:.1}\" stroke=\"#999\" stroke-dasharray=\"4 3\"/>\n",
            PADDING, bottom,
        ));
    }

    for (i, freq) in frequencies.iter().enumerate() {
        if freq.iter().all(|&f| f == 0.0) {
            continue;
        }
        let color = PALETTE[i % PALETTE.len()];
        let mut steps = vec![format!("M{:.1},{:.1}", bins.x(bins.min), bottom)];
        for (b, &f) in freq.iter().enumerate() {
            let left = bins.min + bins.width * b as f64;
            steps.push(format!("L{:.1},{:.1}", bins.x(left), y(f)));
            steps.push(format!("L{:.1},{:.1}", bins.x(left + bins.width), y(f)));
        }
        steps.push(format!("L{:.1},{:.1} Z", bins.x(bins.max()), bottom));
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"{c}\" fill-opacity=\"0.25\" stroke=\"{c}\" stroke-width=\"1.2\"/>\n",
            steps.join(" "),
            c = color,
        ));
    }
    for (i, s) in series.iter().enumerate() {
        svg.push_str(&legend_entry(i, HEIGHT, &s.label));
    }

    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::svg_report::chart::ValueFormat;
    use chrono::NaiveDate;

    fn series(label: &str, values: &[Option<f64>]) -> LabeledSeries {
        LabeledSeries {
            label: label.into(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| (NaiveDate::from_ymd_opt(2024, 1, i as u32 + 1).unwrap(), *v))
                .collect(),
        }
    }

    fn options() -> ChartOptions {
        ChartOptions {
            title: "Return distribution".into(),
            format: ValueFormat::Percent,
            reference_line: Some(0.0),
        }
    }

    #[test]
    fn frequencies_sum_to_one_and_ignore_gaps() {
        let s = series("A", &[Some(-0.02), None, Some(0.0), Some(0.01), Some(0.02)]);
        let bins = Bins::of(std::slice::from_ref(&s), 4).unwrap();
        let freq = bins.frequencies(&s);
        assert_eq!(freq.len(), 4);
        assert!((freq.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        // the maximum lands in the last bin, not past it
        assert_eq!(bins.index(0.02), 3);
        assert_eq!(freq[0], 0.25);
    }

    #[test]
    fn bins_are_shared_across_series() {
        let a = series("A", &[Some(-0.01), Some(0.01)]);
        let b = series("B", &[Some(0.03), Some(0.05)]);
        let bins = Bins::of(&[a, b], 3).unwrap();
        assert_eq!(bins.min, -0.01);
        assert!((bins.max() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn renders_one_outline_per_series() {
        let svg = render_histogram(
            &[
                series("equal_weight_index", &[Some(-0.01), Some(0.0), Some(0.02)]),
                series("SPY", &[Some(0.01), Some(0.015), Some(-0.005)]),
            ],
            &options(),
            DEFAULT_BINS,
        );
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("fill-opacity").count(), 2);
        assert!(svg.contains("equal_weight_index"));
        assert!(svg.contains("stroke-dasharray"));
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn constant_values_still_render() {
        let svg = render_histogram(&[series("A", &[Some(0.0), Some(0.0)])], &options(), 10);
        assert!(svg.contains("fill-opacity"));
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn no_values_renders_nothing() {
        assert_eq!(render_histogram(&[series("A", &[None])], &options(), 10), "");
        assert_eq!(render_histogram(&[], &options(), 10), "");
    }
}
