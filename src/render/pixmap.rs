//! In-memory RGBA raster surface with the fill primitives the waveform
//! renderer needs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// A width x height grid of RGBA pixels, row-major.
#[derive(Debug, Clone)]
pub struct Pixmap {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl Pixmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::TRANSPARENT; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reallocates to the new dimensions. Contents are discarded; callers
    /// redraw after resizing.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![Color::TRANSPARENT; (width * height) as usize];
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    /// Overwrites every pixel, ignoring alpha blending (canvas clear
    /// semantics).
    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Fills an axis-aligned rectangle, clipped to the surface. Colors
    /// with partial alpha are blended source-over.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width as i32).min(self.width as i32);
        let y1 = (y + height as i32).min(self.height as i32);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px, py, color);
            }
        }
    }

    /// Fills a rectangle with rounded corners. The radius is clamped so it
    /// never exceeds half the rectangle's width or height.
    pub fn fill_rounded_rect(
        &mut self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        radius: f32,
        color: Color,
    ) {
        let radius = radius.min(width as f32 / 2.0).min(height as f32 / 2.0);
        if radius <= 0.0 {
            return self.fill_rect(x, y, width, height, color);
        }
        for py in 0..height as i32 {
            for px in 0..width as i32 {
                let cx = px as f32 + 0.5;
                let cy = py as f32 + 0.5;
                // Distance into the nearest corner arc; zero along the
                // straight edges, so those pixels always pass.
                let dx = if cx < radius {
                    radius - cx
                } else if cx > width as f32 - radius {
                    cx - (width as f32 - radius)
                } else {
                    0.0
                };
                let dy = if cy < radius {
                    radius - cy
                } else if cy > height as f32 - radius {
                    cy - (height as f32 - radius)
                } else {
                    0.0
                };
                if dx * dx + dy * dy <= radius * radius {
                    self.blend_pixel(x + px, y + py, color);
                }
            }
        }
    }

    /// Encodes the surface as a binary PPM (P6), composited over white so
    /// transparent backgrounds stay visible in viewers.
    pub fn to_ppm(&self) -> Vec<u8> {
        let mut out = format!("P6\n{} {}\n255\n", self.width, self.height).into_bytes();
        for pixel in &self.pixels {
            let alpha = pixel.a as u32;
            out.push(((pixel.r as u32 * alpha + 255 * (255 - alpha)) / 255) as u8);
            out.push(((pixel.g as u32 * alpha + 255 * (255 - alpha)) / 255) as u8);
            out.push(((pixel.b as u32 * alpha + 255 * (255 - alpha)) / 255) as u8);
        }
        out
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let index = (y as u32 * self.width + x as u32) as usize;
        if color.a == 255 {
            self.pixels[index] = color;
            return;
        }
        let dst = self.pixels[index];
        let sa = color.a as u32;
        let blend = |s: u8, d: u8| ((s as u32 * sa + d as u32 * (255 - sa)) / 255) as u8;
        self.pixels[index] = Color {
            r: blend(color.r, dst.r),
            g: blend(color.g, dst.g),
            b: blend(color.b, dst.b),
            a: (sa + dst.a as u32 * (255 - sa) / 255).min(255) as u8,
        };
    }
}
