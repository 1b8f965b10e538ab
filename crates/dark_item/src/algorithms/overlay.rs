use geo_types::Coord;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

/// Draws a closed outline over a copy of the working image.
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    pub color: Rgb<u8>,
    /// Stroke width in pixels
    pub thickness: u32,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self {
            color: Rgb([255, 0, 0]),
            thickness: 3,
        }
    }
}

impl OverlayRenderer {
    pub fn render(&self, image: &RgbImage, outline: &[Coord<f64>]) -> RgbImage {
        let mut canvas = image.clone();
        if outline.is_empty() {
            return canvas;
        }

        let reach = (self.thickness.max(1) / 2) as f32;
        let offsets: Vec<f32> = (0..self.thickness.max(1)).map(|i| i as f32 - reach).collect();

        for (i, start) in outline.iter().enumerate() {
            let end = outline[(i + 1) % outline.len()];
            for &dy in &offsets {
                for &dx in &offsets {
                    draw_line_segment_mut(
                        &mut canvas,
                        (start.x as f32 + dx, start.y as f32 + dy),
                        (end.x as f32 + dx, end.y as f32 + dy),
                        self.color,
                    );
                }
            }
        }

        canvas
    }
}
