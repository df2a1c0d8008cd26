//! Confusion-matrix heatmap rendering
//!
//! Draws the matrix as a grid of cells shaded on a white-to-blue scale with
//! the integer count in each cell, class-index ticks, axis labels, a title
//! and a colour bar, then writes a PNG.

use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};

use super::classification::ConfusionMatrix;
use super::font::{self, ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};
use super::Result;

pub const TITLE: &str = "Confusion Matrix";
pub const X_LABEL: &str = "Predicted Label";
pub const Y_LABEL: &str = "True Label";

const CELL: u32 = 120;
const MARGIN_LEFT: u32 = 110;
const MARGIN_TOP: u32 = 80;
const MARGIN_RIGHT: u32 = 110;
const MARGIN_BOTTOM: u32 = 90;
const COLORBAR_GAP: u32 = 30;
const COLORBAR_WIDTH: u32 = 20;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

/// Sequential blue palette, light to dark
const BLUES: [[u8; 3]; 9] = [
    [247, 251, 255],
    [222, 235, 247],
    [198, 219, 239],
    [158, 202, 225],
    [107, 174, 214],
    [66, 146, 198],
    [33, 113, 181],
    [8, 81, 156],
    [8, 48, 107],
];

/// Palette colour for an intensity in `[0, 1]`
pub fn blues(t: f64) -> Rgb<u8> {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let pos = t * (BLUES.len() - 1) as f64;
    let lower = (pos.floor() as usize).min(BLUES.len() - 2);
    let frac = pos - lower as f64;

    let (a, b) = (BLUES[lower], BLUES[lower + 1]);
    let mix = |i: usize| (a[i] as f64 + (b[i] as f64 - a[i] as f64) * frac).round() as u8;
    Rgb([mix(0), mix(1), mix(2)])
}

/// Image dimensions for an `n_classes` x `n_classes` matrix
pub fn dimensions(n_classes: usize) -> (u32, u32) {
    let grid = n_classes as u32 * CELL;
    (MARGIN_LEFT + grid + MARGIN_RIGHT, MARGIN_TOP + grid + MARGIN_BOTTOM)
}

/// Pixel origin (top-left) of the cell for `true_label`, `predicted_label`
pub fn cell_origin(true_label: usize, predicted_label: usize) -> (u32, u32) {
    (
        MARGIN_LEFT + predicted_label as u32 * CELL,
        MARGIN_TOP + true_label as u32 * CELL,
    )
}

/// Render the heatmap in memory
pub fn render(cm: &ConfusionMatrix) -> RgbImage {
    let n = cm.n_classes();
    let (width, height) = dimensions(n);
    let grid = n as u32 * CELL;
    let max = cm.max_count();
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);

    for i in 0..n {
        for j in 0..n {
            let count = cm.get(i, j);
            let t = if max == 0 { 0.0 } else { count as f64 / max as f64 };
            let (x0, y0) = cell_origin(i, j);
            fill_rect(&mut img, x0, y0, CELL, CELL, blues(t));

            let text = count.to_string();
            let ink = if t > 0.5 { BACKGROUND } else { INK };
            let scale = 3;
            let tx = x0 + (CELL.saturating_sub(font::text_width(&text, scale))) / 2;
            let ty = y0 + (CELL - GLYPH_HEIGHT * scale) / 2;
            draw_text(&mut img, &text, tx, ty, scale, ink);
        }
    }

    // Ticks
    for k in 0..n {
        let label = k.to_string();
        let (x0, y0) = cell_origin(k, k);
        let tx = x0 + (CELL.saturating_sub(font::text_width(&label, 2))) / 2;
        draw_text(&mut img, &label, tx, MARGIN_TOP + grid + 10, 2, INK);

        let ty = y0 + (CELL - GLYPH_HEIGHT * 2) / 2;
        let tx = MARGIN_LEFT.saturating_sub(12 + font::text_width(&label, 2));
        draw_text(&mut img, &label, tx, ty, 2, INK);
    }

    // Axis labels and title
    let x_label_x = MARGIN_LEFT + grid.saturating_sub(font::text_width(X_LABEL, 2)) / 2;
    draw_text(&mut img, X_LABEL, x_label_x, MARGIN_TOP + grid + 45, 2, INK);

    let y_label_bottom = MARGIN_TOP + (grid + font::text_width(Y_LABEL, 2)) / 2;
    draw_text_vertical(&mut img, Y_LABEL, 24, y_label_bottom, 2, INK);

    let title_x = MARGIN_LEFT + grid.saturating_sub(font::text_width(TITLE, 3)) / 2;
    draw_text(&mut img, TITLE, title_x, 28, 3, INK);

    draw_colorbar(&mut img, MARGIN_LEFT + grid + COLORBAR_GAP, grid, max);

    img
}

/// Render and write the heatmap as PNG
pub fn render_confusion_matrix(cm: &ConfusionMatrix, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    render(cm).save(path)?;
    tracing::debug!(path = %path.display(), "confusion matrix image written");
    Ok(())
}

fn draw_colorbar(img: &mut RgbImage, x: u32, height: u32, max: usize) {
    if height == 0 {
        return;
    }
    for row in 0..height {
        let t = 1.0 - row as f64 / (height - 1).max(1) as f64;
        fill_rect(img, x, MARGIN_TOP + row, COLORBAR_WIDTH, 1, blues(t));
    }

    let label_x = x + COLORBAR_WIDTH + 6;
    draw_text(img, &max.to_string(), label_x, MARGIN_TOP, 2, INK);
    draw_text(img, "0", label_x, MARGIN_TOP + height - GLYPH_HEIGHT * 2, 2, INK);
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x_end = (x + w).min(img.width());
    let y_end = (y + h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}

fn draw_text(img: &mut RgbImage, text: &str, x: u32, y: u32, scale: u32, color: Rgb<u8>) {
    for (k, c) in text.chars().enumerate() {
        let rows = font::glyph(c);
        let cx = x + k as u32 * ADVANCE * scale;
        for gy in 0..GLYPH_HEIGHT {
            for gx in 0..GLYPH_WIDTH {
                if font::is_set(&rows, gx, gy) {
                    fill_rect(img, cx + gx * scale, y + gy * scale, scale, scale, color);
                }
            }
        }
    }
}

/// Text rotated a quarter turn counter-clockwise, reading bottom to top from
/// `(x, bottom)`
fn draw_text_vertical(
    img: &mut RgbImage,
    text: &str,
    x: u32,
    bottom: u32,
    scale: u32,
    color: Rgb<u8>,
) {
    for (k, c) in text.chars().enumerate() {
        let rows = font::glyph(c);
        let offset = k as u32 * ADVANCE;
        for gy in 0..GLYPH_HEIGHT {
            for gx in 0..GLYPH_WIDTH {
                if !font::is_set(&rows, gx, gy) {
                    continue;
                }
                let Some(py) = bottom.checked_sub((offset + gx + 1) * scale) else {
                    continue;
                };
                fill_rect(img, x + gy * scale, py, scale, scale, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_matrix() -> ConfusionMatrix {
        ConfusionMatrix::from_predictions(&[0, 0, 1, 2, 2, 2, 2], &[0, 1, 1, 2, 2, 2, 2], 3).unwrap()
    }

    #[test]
    fn test_blues_endpoints() {
        assert_eq!(blues(0.0), Rgb(BLUES[0]));
        assert_eq!(blues(1.0), Rgb(BLUES[8]));
        assert_eq!(blues(-3.0), Rgb(BLUES[0]));
        assert_eq!(blues(f64::NAN), Rgb(BLUES[0]));
    }

    #[test]
    fn test_blues_gets_darker() {
        let light = blues(0.2);
        let dark = blues(0.8);
        assert!(dark.0[0] < light.0[0]);
        assert!(dark.0[1] < light.0[1]);
    }

    #[test]
    fn test_render_dimensions() {
        let img = render(&sample_matrix());
        assert_eq!((img.width(), img.height()), dimensions(3));
        assert_eq!(dimensions(3), (580, 530));
    }

    #[test]
    fn test_render_shades_by_count() {
        let cm = sample_matrix();
        let img = render(&cm);

        // (2, 2) holds the maximum, (0, 2) is empty
        let (x, y) = cell_origin(2, 2);
        assert_eq!(*img.get_pixel(x + 2, y + 2), Rgb(BLUES[8]));
        let (x, y) = cell_origin(0, 2);
        assert_eq!(*img.get_pixel(x + 2, y + 2), Rgb(BLUES[0]));
    }

    #[test]
    fn test_render_all_zero_matrix() {
        let img = render(&ConfusionMatrix::new(3));
        let (x, y) = cell_origin(1, 1);
        assert_eq!(*img.get_pixel(x + 2, y + 2), Rgb(BLUES[0]));
    }

    #[test]
    fn test_render_writes_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plots/confusion_matrix.png");
        render_confusion_matrix(&sample_matrix(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
