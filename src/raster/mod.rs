// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Pixel-domain access for embedding.
//!
//! [`CoverImage`] wraps a decoded 8-bit bitmap (grayscale, RGB or RGBA) and
//! exposes its luminance as 8×8 blocks. [`LumaGrid`] is the block arena used
//! by the pipeline: one fixed-size `[f64; 64]` buffer per block, stored in
//! block-raster order so a block index is also its embedding slot.
//!
//! Luma changes are written back by adding the same delta to R, G and B,
//! which shifts `Y = 0.299 R + 0.587 G + 0.114 B` by exactly that delta and
//! leaves chroma untouched. Pixels right of / below the last full block are
//! never read or written.

pub mod dct;

use std::io::Cursor;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder, RgbImage, RgbaImage};

use crate::stego::error::StegoError;

/// Block edge length in pixels.
pub const BLOCK: usize = 8;

/// Number of whole 8×8 blocks in an image of the given size.
pub fn block_count(width: u32, height: u32) -> usize {
    (width as usize / BLOCK) * (height as usize / BLOCK)
}

/// Luma of the samples of an 8×8 block, indexed `row * 8 + col`.
pub type LumaBlock = [f64; 64];

/// Arena of 8×8 luma blocks in block-raster order.
#[derive(Debug, Clone)]
pub struct LumaGrid {
    blocks_wide: usize,
    blocks_tall: usize,
    blocks: Vec<LumaBlock>,
}

impl LumaGrid {
    /// Create a grid of mid-gray (128) blocks.
    pub fn new(blocks_wide: usize, blocks_tall: usize) -> Self {
        Self {
            blocks_wide,
            blocks_tall,
            blocks: vec![[128.0; 64]; blocks_wide * blocks_tall],
        }
    }

    pub fn blocks_wide(&self) -> usize {
        self.blocks_wide
    }

    pub fn blocks_tall(&self) -> usize {
        self.blocks_tall
    }

    /// Total number of blocks (the embedding capacity in bits).
    pub fn total_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, index: usize) -> &LumaBlock {
        &self.blocks[index]
    }

    pub fn block_mut(&mut self, index: usize) -> &mut LumaBlock {
        &mut self.blocks[index]
    }

    /// All blocks in block-raster order.
    pub fn blocks(&self) -> &[LumaBlock] {
        &self.blocks
    }

    /// Block (row, column) of a block index.
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index / self.blocks_wide, index % self.blocks_wide)
    }
}

/// A decoded cover or stego image.
#[derive(Debug, Clone)]
pub enum CoverImage {
    Gray(GrayImage),
    Rgb(RgbImage),
    Rgba(RgbaImage),
}

impl CoverImage {
    /// Decode any supported container (PNG, JPEG, WebP, BMP, GIF).
    ///
    /// Higher bit depths are reduced to 8 bits per channel. Grayscale with
    /// alpha is promoted to RGBA.
    ///
    /// # Errors
    /// [`StegoError::MalformedInput`] if the bytes are not a readable image.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StegoError> {
        let img = image::load_from_memory(bytes).map_err(StegoError::MalformedInput)?;
        let color = img.color();
        Ok(if color.has_alpha() {
            Self::Rgba(img.to_rgba8())
        } else if color.has_color() {
            Self::Rgb(img.to_rgb8())
        } else {
            Self::Gray(img.to_luma8())
        })
    }

    pub fn width(&self) -> u32 {
        match self {
            Self::Gray(img) => img.width(),
            Self::Rgb(img) => img.width(),
            Self::Rgba(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Self::Gray(img) => img.height(),
            Self::Rgb(img) => img.height(),
            Self::Rgba(img) => img.height(),
        }
    }

    fn luma_at(&self, x: u32, y: u32) -> f64 {
        match self {
            Self::Gray(img) => img.get_pixel(x, y).0[0] as f64,
            Self::Rgb(img) => {
                let [r, g, b] = img.get_pixel(x, y).0;
                rgb_luma(r, g, b)
            }
            Self::Rgba(img) => {
                let [r, g, b, _] = img.get_pixel(x, y).0;
                rgb_luma(r, g, b)
            }
        }
    }

    /// Read the luma samples of block (br, bc).
    pub fn block_luma(&self, br: usize, bc: usize) -> LumaBlock {
        let mut block = [0.0f64; 64];
        for row in 0..BLOCK {
            for col in 0..BLOCK {
                let x = (bc * BLOCK + col) as u32;
                let y = (br * BLOCK + row) as u32;
                block[row * BLOCK + col] = self.luma_at(x, y);
            }
        }
        block
    }

    /// Build the luma block arena for the whole image.
    pub fn luma_grid(&self) -> LumaGrid {
        let bw = self.width() as usize / BLOCK;
        let bt = self.height() as usize / BLOCK;
        let mut grid = LumaGrid::new(bw, bt);
        for index in 0..grid.total_blocks() {
            let (br, bc) = grid.coords(index);
            *grid.block_mut(index) = self.block_luma(br, bc);
        }
        grid
    }

    /// Shift the pixels of block (br, bc) by `target - original` luma,
    /// rounding and clamping each channel to 0..=255.
    pub fn apply_block(&mut self, br: usize, bc: usize, original: &LumaBlock, target: &LumaBlock) {
        for row in 0..BLOCK {
            for col in 0..BLOCK {
                let delta = target[row * BLOCK + col] - original[row * BLOCK + col];
                let x = (bc * BLOCK + col) as u32;
                let y = (br * BLOCK + row) as u32;
                match self {
                    Self::Gray(img) => shift_channels(&mut img.get_pixel_mut(x, y).0, delta),
                    Self::Rgb(img) => shift_channels(&mut img.get_pixel_mut(x, y).0, delta),
                    Self::Rgba(img) => shift_channels(&mut img.get_pixel_mut(x, y).0[..3], delta),
                }
            }
        }
    }

    /// Encode losslessly as PNG, keeping the channel layout.
    ///
    /// # Errors
    /// [`StegoError::OutputEncoding`] if the PNG encoder fails.
    pub fn to_png(&self) -> Result<Vec<u8>, StegoError> {
        let (raw, color): (&[u8], ExtendedColorType) = match self {
            Self::Gray(img) => (img.as_raw(), ExtendedColorType::L8),
            Self::Rgb(img) => (img.as_raw(), ExtendedColorType::Rgb8),
            Self::Rgba(img) => (img.as_raw(), ExtendedColorType::Rgba8),
        };
        let mut out = Cursor::new(Vec::new());
        PngEncoder::new(&mut out)
            .write_image(raw, self.width(), self.height(), color)
            .map_err(StegoError::OutputEncoding)?;
        Ok(out.into_inner())
    }
}

fn rgb_luma(r: u8, g: u8, b: u8) -> f64 {
    0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
}

fn shift_channels(channels: &mut [u8], delta: f64) {
    for c in channels.iter_mut() {
        *c = (*c as f64 + delta).round().clamp(0.0, 255.0) as u8;
    }
}
