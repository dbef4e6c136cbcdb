//! Accuracy bar chart rendered straight to PNG.
//!
//! The chart is rasterized into an RGB buffer with a small built-in bitmap
//! font, so no font files or plotting backends are needed at runtime.

use perceptest_core::model::Category;
use perceptest_core::summary::SessionSummary;
use thiserror::Error;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 500;

const PLOT_LEFT: u32 = 190;
const PLOT_WIDTH: u32 = 500;
const PLOT_TOP: u32 = 56;
const ROW_HEIGHT: u32 = 44;
const BAR_HEIGHT: u32 = 30;

/// Glyphs are 5x7 cells drawn at this scale.
const TEXT_SCALE: u32 = 2;
const GLYPH_ADVANCE: u32 = 6 * TEXT_SCALE;
const GLYPH_HEIGHT: u32 = 7 * TEXT_SCALE;

/// An 8-bit RGB colour.
pub type Rgb = [u8; 3];

const BACKGROUND: Rgb = [255, 255, 255];
const TEXT: Rgb = [33, 33, 33];
const GRID: Rgb = [210, 210, 210];
const AXIS: Rgb = [90, 90, 90];

const GREEN: Rgb = [46, 160, 67];
const BLUE: Rgb = [31, 111, 235];
const ORANGE: Rgb = [240, 136, 24];
const RED: Rgb = [214, 39, 40];

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("accuracy for {category} is not a finite number")]
    InvalidValue { category: Category },

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
}

/// Bar colour for a category.
pub fn category_color(category: Category) -> Rgb {
    match category {
        Category::Shape | Category::TopBottom | Category::LeftRight => GREEN,
        Category::Closest | Category::Farthest | Category::Count => BLUE,
        Category::NonRelational | Category::Relational => ORANGE,
        Category::Overall => RED,
    }
}

/// Render the nine category accuracies as a horizontal bar chart.
pub fn render_accuracy_chart(summary: &SessionSummary) -> Result<Vec<u8>, ChartError> {
    let mut canvas = Canvas::new(WIDTH, HEIGHT, BACKGROUND);

    canvas.draw_text(PLOT_LEFT, 16, "ACCURACY BY CATEGORY", TEXT);

    let plot_bottom = PLOT_TOP + ROW_HEIGHT * Category::ALL.len() as u32;

    for step in 0..=5u32 {
        let x = PLOT_LEFT + PLOT_WIDTH * step / 5;
        let color = if step == 0 { AXIS } else { GRID };
        canvas.fill_rect(x, PLOT_TOP - 6, 1, plot_bottom - PLOT_TOP + 6, color);

        let label = format!("{:.1}", step as f64 / 5.0);
        let label_x = x.saturating_sub(text_width(&label) / 2);
        canvas.draw_text(label_x, plot_bottom + 10, &label, TEXT);
    }
    canvas.fill_rect(PLOT_LEFT, plot_bottom, PLOT_WIDTH + 1, 1, AXIS);

    for (row, category) in Category::ALL.iter().copied().enumerate() {
        let value = summary.accuracy(category);
        if !value.is_finite() {
            return Err(ChartError::InvalidValue { category });
        }
        let value = value.clamp(0.0, 1.0);

        let y = bar_top(row);
        let name = category.as_str().to_uppercase();
        let label_x = PLOT_LEFT.saturating_sub(text_width(&name) + 12);
        let text_y = y + (BAR_HEIGHT - GLYPH_HEIGHT) / 2;
        canvas.draw_text(label_x, text_y, &name, TEXT);

        let bar_width = (value * PLOT_WIDTH as f64).round() as u32;
        canvas.fill_rect(PLOT_LEFT + 1, y, bar_width, BAR_HEIGHT, category_color(category));

        canvas.draw_text(
            PLOT_LEFT + bar_width + 8,
            text_y,
            &format!("{value:.4}"),
            TEXT,
        );
    }

    canvas.encode_png()
}

fn bar_top(row: usize) -> u32 {
    PLOT_TOP + row as u32 * ROW_HEIGHT + (ROW_HEIGHT - BAR_HEIGHT) / 2
}

fn text_width(text: &str) -> u32 {
    text.chars().count() as u32 * GLYPH_ADVANCE
}

struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32, fill: Rgb) -> Self {
        let pixels = fill
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Fill a rectangle, clipped to the canvas.
    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgb) {
        let x_end = (x + w).min(self.width);
        let y_end = (y + h).min(self.height);
        for py in y..y_end {
            for px in x..x_end {
                let offset = ((py * self.width + px) * 3) as usize;
                self.pixels[offset..offset + 3].copy_from_slice(&color);
            }
        }
    }

    fn draw_text(&mut self, x: u32, y: u32, text: &str, color: Rgb) {
        for (i, ch) in text.chars().enumerate() {
            let origin_x = x + i as u32 * GLYPH_ADVANCE;
            for (row, bits) in glyph(ch).iter().enumerate() {
                for col in 0..5u32 {
                    if bits & (0x10 >> col) != 0 {
                        self.fill_rect(
                            origin_x + col * TEXT_SCALE,
                            y + row as u32 * TEXT_SCALE,
                            TEXT_SCALE,
                            TEXT_SCALE,
                            color,
                        );
                    }
                }
            }
        }
    }

    fn encode_png(&self) -> Result<Vec<u8>, ChartError> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.pixels)?;
            writer.finish()?;
        }
        Ok(out)
    }
}

/// 5x7 glyph rows, most significant of the low five bits is the leftmost column.
/// Lowercase letters render as uppercase.
fn glyph(ch: char) -> [u8; 7] {
    match ch.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        ' ' => [0x00; 7],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    }
}
