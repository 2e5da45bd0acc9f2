//! Correlation matrix heatmap.
//!
//! Cells run from blue at -1 through white at 0 to red at +1. Undefined
//! entries are grey and labelled "n/a".

use super::chart::{escape, open_svg};
use crate::domain::rolling::correlation::CorrelationMatrix;

const CELL: f64 = 48.0;
const LABEL_MARGIN: f64 = 80.0;
const TOP_MARGIN: f64 = 90.0;

/// Fill color for a correlation in [-1, 1].
fn cell_color(rho: f64) -> String {
    let rho = rho.clamp(-1.0, 1.0);
    let fade = |v: f64| (255.0 * (1.0 - v.abs())).round() as u8;
    let (r, g, b) = if rho >= 0.0 {
        (255, fade(rho), fade(rho))
    } else {
        (fade(rho), fade(rho), 255)
    };
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Returns an empty string for an empty matrix.
pub fn render_heatmap(matrix: &CorrelationMatrix, title: &str) -> String {
    let n = matrix.tickers.len();
    if n == 0 {
        return String::new();
    }
    let side = CELL * n as f64;
    let width = (LABEL_MARGIN + side + 20.0).max(300.0);
    let mut svg = open_svg(width, TOP_MARGIN + side + 20.0, title);

    for (i, ticker) in matrix.tickers.iter().enumerate() {
        let center = CELL * i as f64 + CELL / 2.0;
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\">{}</text>\n",
            LABEL_MARGIN - 6.0,
            TOP_MARGIN + center + 4.0,
            escape(ticker)
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">{}</text>\n",
            LABEL_MARGIN + center,
            TOP_MARGIN - 8.0,
            escape(ticker)
        ));
    }

    for (i, row) in matrix.values.iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            let x = LABEL_MARGIN + CELL * j as f64;
            let y = TOP_MARGIN + CELL * i as f64;
            let (fill, text) = match value {
                Some(rho) => (cell_color(*rho), format!("{:.2}", rho)),
                None => ("#dddddd".to_string(), "n/a".to_string()),
            };
            svg.push_str(&format!(
                "<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{c:.0}\" height=\"{c:.0}\" fill=\"{fill}\" stroke=\"white\"/>\
                 <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">{text}</text>\n",
                x + CELL / 2.0,
                y + CELL / 2.0 + 4.0,
                c = CELL,
            ));
        }
    }

    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> CorrelationMatrix {
        CorrelationMatrix {
            tickers: vec!["AAPL".into(), "MSFT".into(), "X&Y".into()],
            values: vec![
                vec![Some(1.0), Some(0.5), None],
                vec![Some(0.5), Some(1.0), Some(-1.0)],
                vec![None, Some(-1.0), None],
            ],
        }
    }

    #[test]
    fn color_scale_endpoints() {
        assert_eq!(cell_color(1.0), "#ff0000");
        assert_eq!(cell_color(0.0), "#ffffff");
        assert_eq!(cell_color(-1.0), "#0000ff");
        assert_eq!(cell_color(0.5), "#ff8080");
    }

    #[test]
    fn one_cell_per_entry_with_labels() {
        let svg = render_heatmap(&matrix(), "Correlation");
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        // background rect plus 9 cells
        assert_eq!(svg.matches("<rect").count(), 10);
        assert!(svg.contains(">0.50<"));
        assert!(svg.contains(">-1.00<"));
        assert_eq!(svg.matches(">n/a<").count(), 3);
        assert_eq!(svg.matches(">X&amp;Y<").count(), 2);
    }

    #[test]
    fn empty_matrix_renders_nothing() {
        let empty = CorrelationMatrix {
            tickers: vec![],
            values: vec![],
        };
        assert_eq!(render_heatmap(&empty, "Correlation"), "");
    }
}
