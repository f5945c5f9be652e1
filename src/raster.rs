//! Raster Input - Decoded tile images handed over by an external rasterizer

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{FoundryError, Result};
use crate::palette::Rgba;

/// Read-only view of a decoded tile image.
pub trait Raster {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn pixel(&self, x: u32, y: u32) -> Rgba;

    fn colors_used(&self) -> BTreeSet<Rgba> {
        let mut colors = BTreeSet::new();
        for y in 0..self.height() {
            for x in 0..self.width() {
                colors.insert(self.pixel(x, y));
            }
        }
        colors
    }
}

pub fn is_transparent(px: Rgba) -> bool {
    px[3] == 0
}

/// Row-major RGBA pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl PixelBuffer {
    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Build from packed RGBA bytes (4 per pixel, row-major).
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(FoundryError::Format(format!(
                "Expected {} bytes for {}x{} RGBA, got {}",
                expected,
                width,
                height,
                bytes.len()
            )));
        }

        let pixels = bytes
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();
        Ok(Self { width, height, pixels })
    }

    pub fn set(&mut self, x: u32, y: u32, color: Rgba) {
        if x < self.width && y < self.height {
            self.pixels[y as usize * self.width as usize + x as usize] = color;
        }
    }

    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgba) {
        for py in y..y.saturating_add(h) {
            for px in x..x.saturating_add(w) {
                self.set(px, py, color);
            }
        }
    }
}

impl Raster for PixelBuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> Rgba {
        self.pixels[y as usize * self.width as usize + x as usize]
    }
}
