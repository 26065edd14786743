// src/render/mod.rs

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use crate::pipeline::matrix::DenseMatrix;

const CELL_WIDTH: usize = 3;

/// Per-sex color ramps for the side-by-side comparison: blues for the male
/// slice, reds for the female slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Blues,
    Reds,
}

impl Palette {
    /// Background color for an intensity in 0..=1, ramping from near-white
    /// to the saturated end of the ColorBrewer ramp.
    fn shade(&self, t: f64) -> (u8, u8, u8) {
        let t = t.clamp(0.0, 1.0);
        let lerp = |from: u8, to: u8| (f64::from(from) + (f64::from(to) - f64::from(from)) * t)
            .round() as u8;
        match self {
            Palette::Blues => (lerp(247, 8), lerp(251, 48), lerp(255, 107)),
            Palette::Reds => (lerp(255, 103), lerp(245, 0), lerp(240, 13)),
        }
    }
}

/// Render a matrix as a shaded terminal grid: one line per category in
/// vocabulary order, one cell per year, intensity scaled to the matrix
/// maximum. The caller owns layout decisions beyond the grid itself.
pub fn render_matrix(matrix: &DenseMatrix, palette: Palette) -> String {
    let label_width = matrix
        .categories()
        .iter()
        .map(|c| UnicodeWidthStr::width(c.as_str()))
        .max()
        .unwrap_or(0);
    let max = matrix.max_value();

    let mut out = String::new();

    // Title and year header (two-digit ticks).
    out.push_str(&format!(
        "{} / {}\n",
        matrix.metric.as_str(),
        matrix.sex.as_str()
    ));
    out.push_str(&" ".repeat(label_width));
    for year in matrix.years() {
        out.push_str(&format!("{:>width$}", year % 100, width = CELL_WIDTH));
    }
    out.push('\n');

    for (row, category) in matrix.categories().iter().enumerate() {
        out.push_str(category);
        out.push_str(&" ".repeat(label_width - UnicodeWidthStr::width(category.as_str())));
        for &value in matrix.row(row) {
            let t = if max > 0.0 { value / max } else { 0.0 };
            let (r, g, b) = palette.shade(t);
            out.push_str(&format!("{}", " ".repeat(CELL_WIDTH).on_truecolor(r, g, b)));
        }
        out.push('\n');
    }

    out.push_str(&format!("0.0 .. {:.1}\n", max));
    out
}
