//! Plain-text bar chart for terminal output.
//!
//! This is intentionally "dumb" (fixed-width bars), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)

use super::ChartBar;

const LABEL_MAX: usize = 16;

/// Render one horizontal bar per entry, scaled to the largest adjusted price.
pub fn render_ascii_bars(bars: &[ChartBar], width: usize) -> String {
    let width = width.max(10);

    if bars.is_empty() {
        return "No prices to chart.\n".to_string();
    }

    let max = bars.iter().map(|b| b.adjusted).fold(0.0, f64::max);
    let label_w = bars
        .iter()
        .map(|b| b.label.chars().count())
        .max()
        .unwrap_or(0)
        .min(LABEL_MAX);

    let mut out = String::new();
    out.push_str(&format!("Adjusted prices: max=${max:.2}\n"));

    for b in bars {
        let filled = if max > 0.0 {
            ((b.adjusted / max).clamp(0.0, 1.0) * width as f64).round() as usize
        } else {
            0
        };
        let label: String = b.label.chars().take(label_w).collect();
        out.push_str(&format!(
            "{label:<label_w$} |{}{}| ${:.2} -> ${:.2}\n",
            "#".repeat(filled),
            " ".repeat(width - filled),
            b.price,
            b.adjusted,
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(label: &str, price: f64, adjusted: f64) -> ChartBar {
        ChartBar {
            label: label.to_string(),
            price,
            adjusted,
        }
    }

    #[test]
    fn bars_golden_snapshot_small() {
        let bars = vec![bar("NES", 100.0, 200.0), bar("Game Boy", 50.0, 100.0)];
        let txt = render_ascii_bars(&bars, 10);
        let expected = concat!(
            "Adjusted prices: max=$200.00\n",
            "NES      |##########| $100.00 -> $200.00\n",
            "Game Boy |#####     | $50.00 -> $100.00\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn long_labels_are_truncated() {
        let bars = vec![bar("A very long console name", 1.0, 1.0)];
        let txt = render_ascii_bars(&bars, 10);
        assert!(txt.contains("A very long cons |"));
    }

    #[test]
    fn empty_selection() {
        assert_eq!(render_ascii_bars(&[], 40), "No prices to chart.\n");
    }
}
