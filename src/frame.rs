// SPDX-License-Identifier: GPL-3.0-only

//! Frame buffer types
//!
//! The pipeline works on 32-bit BGRA pixel data. [`FrameBufferView`] is a
//! non-owning view over one raw frame's memory, borrowed for the duration of
//! a single `process_frame` call; the borrow checker enforces that nothing
//! retains it past that call. [`FramePlane`] is an owned, tightly packed
//! scratch buffer used inside a render pass, where rotation steps may swap
//! its dimensions.

use crate::errors::{RenderError, RenderResult};
use std::fmt;

/// Bytes per pixel in BGRA8888 mode
pub const BGRA_BYTES_PER_PIXEL: u32 = 4;

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size in bytes of a packed BGRA buffer at these dimensions
    pub fn byte_len(&self) -> usize {
        self.pixel_count() * BGRA_BYTES_PER_PIXEL as usize
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Borrowed view over one frame's BGRA pixel memory
///
/// Not owned by the pipeline: the backing memory belongs to the frame
/// source and is mutated in place by the render engine. Scanlines may be
/// padded; `stride` is the byte distance between row starts.
pub struct FrameBufferView<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
    stride: u32,
}

impl<'a> FrameBufferView<'a> {
    pub fn new(data: &'a mut [u8], width: u32, height: u32, stride: u32) -> RenderResult<Self> {
        if stride < width * BGRA_BYTES_PER_PIXEL {
            return Err(RenderError::BadStride { stride, width });
        }
        let needed = stride as usize * height as usize;
        if data.len() < needed {
            return Err(RenderError::BufferTooSmall {
                needed,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// View over a packed buffer (stride == width * 4)
    pub fn packed(data: &'a mut [u8], width: u32, height: u32) -> RenderResult<Self> {
        Self::new(data, width, height, width * BGRA_BYTES_PER_PIXEL)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// One scanline's pixel bytes, excluding stride padding
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride as usize;
        &self.data[start..start + (self.width * BGRA_BYTES_PER_PIXEL) as usize]
    }

    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride as usize;
        &mut self.data[start..start + (self.width * BGRA_BYTES_PER_PIXEL) as usize]
    }

    /// Copy the frame into an owned packed plane (the stream snapshot for
    /// one render pass)
    pub(crate) fn snapshot(&self) -> FramePlane {
        let mut plane = FramePlane::new(self.width, self.height);
        let row_bytes = (self.width * BGRA_BYTES_PER_PIXEL) as usize;
        for y in 0..self.height {
            let dst_start = y as usize * row_bytes;
            plane.data[dst_start..dst_start + row_bytes].copy_from_slice(self.row(y));
        }
        plane
    }

    /// Copy a packed plane back into the frame, honoring stride
    pub(crate) fn write_back(&mut self, plane: &FramePlane) -> RenderResult<()> {
        if plane.resolution() != self.resolution() {
            return Err(RenderError::DimensionMismatch {
                expected: self.resolution(),
                actual: plane.resolution(),
            });
        }
        let row_bytes = (self.width * BGRA_BYTES_PER_PIXEL) as usize;
        for y in 0..self.height {
            let src_start = y as usize * row_bytes;
            self.row_mut(y)
                .copy_from_slice(&plane.data[src_start..src_start + row_bytes]);
        }
        Ok(())
    }
}

/// Owned, tightly packed BGRA buffer used as filter scratch space
#[derive(Debug, Clone)]
pub struct FramePlane {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl FramePlane {
    /// Zero-filled plane at the given dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; Resolution::new(width, height).byte_len()],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixels as BGRA quads
    pub fn pixels(&self) -> &[[u8; 4]] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn pixels_mut(&mut self) -> &mut [[u8; 4]] {
        bytemuck::cast_slice_mut(&mut self.data)
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels()[(y * self.width + x) as usize]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, bgra: [u8; 4]) {
        let width = self.width;
        self.pixels_mut()[(y * width + x) as usize] = bgra;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_rejects_short_stride() {
        let mut data = vec![0u8; 64];
        assert!(matches!(
            FrameBufferView::new(&mut data, 4, 4, 8),
            Err(RenderError::BadStride { .. })
        ));
    }

    #[test]
    fn view_rejects_short_buffer() {
        let mut data = vec![0u8; 16];
        assert!(matches!(
            FrameBufferView::packed(&mut data, 4, 4),
            Err(RenderError::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn snapshot_strips_stride_padding() {
        // 2x2 frame with 4 bytes of padding per scanline
        let mut data = vec![0u8; 2 * 12];
        data[0..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        data[12..20].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);

        let view = FrameBufferView::new(&mut data, 2, 2, 12).expect("valid view");
        let plane = view.snapshot();
        assert_eq!(plane.data(), &[1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]);
    }

    #[test]
    fn write_back_round_trips() {
        let mut data = vec![0u8; 16];
        let mut view = FrameBufferView::packed(&mut data, 2, 2).expect("valid view");
        let mut plane = FramePlane::new(2, 2);
        plane.set_pixel(1, 1, [10, 20, 30, 255]);
        view.write_back(&plane).expect("dimensions match");
        assert_eq!(view.row(1)[4..8], [10, 20, 30, 255]);
    }

    #[test]
    fn write_back_rejects_mismatched_plane() {
        let mut data = vec![0u8; 16];
        let mut view = FrameBufferView::packed(&mut data, 2, 2).expect("valid view");
        let plane = FramePlane::new(4, 1);
        assert!(matches!(
            view.write_back(&plane),
            Err(RenderError::DimensionMismatch { .. })
        ));
    }
}
