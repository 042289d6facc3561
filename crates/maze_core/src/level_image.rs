//! Decoded level raster.
//!
//! The raster is a flat RGBA8 buffer addressed by `(x, y)`, pixel index
//! `(y * width + x) * 4`. Reading outside the raster yields `None`, which the
//! cell decoders turn into [`CellType::BOUNDS`](crate::cell::CellType::BOUNDS).
//!
//! A `LevelImage` only exists once the source has been fully decoded, so every
//! grid query made through it is valid.

use std::path::Path;

use crate::level_io::{LevelError, LevelResult};

/// One pixel read from the raster, with its coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelSample {
    pub x: i32,
    pub y: i32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl PixelSample {
    /// Channel assigned to a vertical layer: R, G, B, A for layers 0..3.
    ///
    /// Layers past 3 read alpha; levels never configure more than the
    /// encoding's `max_layers`.
    #[inline]
    pub fn channel(&self, layer: usize) -> u8 {
        match layer {
            0 => self.r,
            1 => self.g,
            2 => self.b,
            _ => self.a,
        }
    }
}

/// RGBA8 raster a level is built from. Read-only after construction.
#[derive(Debug, Clone)]
pub struct LevelImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl LevelImage {
    /// Build from a raw RGBA8 buffer.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> LevelResult<Self> {
        if width == 0 || height == 0 {
            return Err(LevelError::InvalidDimensions { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(LevelError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Decode an image file (PNG) into an RGBA8 raster.
    pub fn open<P: AsRef<Path>>(path: P) -> LevelResult<Self> {
        let rgba = image::open(path.as_ref())?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(width, height, rgba.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte index of the pixel at `(x, y)`, or `None` outside the raster.
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    /// Read the pixel at `(x, y)`. Out of range reads return `None`.
    #[inline]
    pub fn sample(&self, x: i32, y: i32) -> Option<PixelSample> {
        let i = self.index(x, y)?;
        let px = &self.data[i..i + 4];
        Some(PixelSample {
            x,
            y,
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        })
    }

    /// Every pixel in index order (row by row).
    pub fn pixels(&self) -> impl Iterator<Item = PixelSample> + '_ {
        let width = self.width as usize;
        self.data.chunks_exact(4).enumerate().map(move |(id, px)| PixelSample {
            x: (id % width) as i32,
            y: (id / width) as i32,
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> LevelImage {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let v = if (x + y) % 2 == 0 { 0 } else { 255 };
                data.extend_from_slice(&[v, x as u8, y as u8, 255]);
            }
        }
        LevelImage::from_rgba8(width, height, data).unwrap()
    }

    #[test]
    fn test_index_formula() {
        let img = checker(4, 3);
        assert_eq!(img.index(0, 0), Some(0));
        assert_eq!(img.index(1, 0), Some(4));
        assert_eq!(img.index(0, 1), Some(16));
        assert_eq!(img.index(3, 2), Some((2 * 4 + 3) * 4));
    }

    #[test]
    fn test_out_of_range_is_no_sample() {
        let img = checker(4, 3);
        assert!(img.sample(-1, 0).is_none());
        assert!(img.sample(0, -1).is_none());
        assert!(img.sample(4, 0).is_none());
        assert!(img.sample(0, 3).is_none());
    }

    #[test]
    fn test_sample_reads_channels() {
        let img = checker(4, 3);
        let px = img.sample(3, 2).unwrap();
        assert_eq!((px.x, px.y), (3, 2));
        assert_eq!(px.r, 255);
        assert_eq!(px.g, 3);
        assert_eq!(px.b, 2);
        assert_eq!(px.channel(1), 3);
        assert_eq!(px.channel(3), 255);
    }

    #[test]
    fn test_pixels_iterates_in_index_order() {
        let img = checker(3, 2);
        let coords: Vec<_> = img.pixels().map(|p| (p.x, p.y)).collect();
        assert_eq!(coords, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
        for px in img.pixels() {
            assert_eq!(img.sample(px.x, px.y), Some(px));
        }
    }

    #[test]
    fn test_rejects_wrong_buffer_size() {
        let err = LevelImage::from_rgba8(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            LevelError::BufferSize {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn test_rejects_empty_dimensions() {
        let err = LevelImage::from_rgba8(0, 2, Vec::new()).unwrap_err();
        assert!(matches!(err, LevelError::InvalidDimensions { .. }));
    }
}
