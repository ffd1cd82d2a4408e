use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder as _, Rgb, RgbImage};

use crate::RenderError;

pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
pub const AXIS: Rgb<u8> = Rgb([64, 64, 64]);

/// RGB drawing surface with clipped rectangle fills.
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, BACKGROUND),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Fills `[x, x + w) x [y, y + h)`, clipped to the canvas.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
        let x_end = x.saturating_add(w).min(self.width());
        let y_end = y.saturating_add(h).min(self.height());
        for py in y..y_end {
            for px in x..x_end {
                self.image.put_pixel(px, py, color);
            }
        }
    }

    /// Draws the left and bottom axis lines of a plot area.
    pub fn axes(&mut self, left: u32, top: u32, right: u32, bottom: u32) {
        self.fill_rect(left, top, 2, bottom.saturating_sub(top) + 2, AXIS);
        self.fill_rect(left, bottom, right.saturating_sub(left), 2, AXIS);
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.image.get_pixel(x, y)
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf).write_image(
            self.image.as_raw(),
            self.width(),
            self.height(),
            ColorType::Rgb8,
        )?;
        Ok(buf)
    }
}
