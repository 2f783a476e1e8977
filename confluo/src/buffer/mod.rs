//! Dense 2D pixel storage with zero-copy cropping.
//!
//! A [`Buffer`] owns one row-major allocation and exposes a rectangular window
//! into it. Cropping only moves the window: the discarded margin stays
//! allocated but can no longer be reached through the buffer's accessors.

mod sample;


use std::ops::{Index, IndexMut};

use glam::IVec2;
use rayon::prelude::*;

pub use sample::Sample;

#[derive(Debug, Clone)]
pub struct Buffer<T> {
    pixels: Vec<T>,
    real_width: usize,
    real_height: usize,
    x_offset: usize,
    y_offset: usize,
    width: usize,
    height: usize,
}

impl<T> Buffer<T> {
    pub fn new(width: usize, height: usize, pixels: Vec<T>) -> Self {
        assert_eq!(
            pixels.len(),
            width * height,
            "pixels length must equal width * height"
        );
        Self {
            pixels,
            real_width: width,
            real_height: height,
            x_offset: 0,
            y_offset: 0,
            width,
            height,
        }
    }

    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self::new(width, height, pixels)
    }

    /// Visible window width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Visible window height.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Visible window extent as a signed vector, for geometry computations.
    #[inline]
    pub fn extent(&self) -> IVec2 {
        IVec2::new(self.width as i32, self.height as i32)
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Extent of the underlying allocation.
    #[inline]
    pub fn real_size(&self) -> (usize, usize) {
        (self.real_width, self.real_height)
    }

    /// Top-left corner of the visible window inside the allocation.
    #[inline]
    pub fn offset(&self) -> (usize, usize) {
        (self.x_offset, self.y_offset)
    }

    /// Shrink the visible window to `width x height` starting at `(x, y)`,
    /// relative to the current window. Never reallocates.
    pub fn crop(&mut self, x: usize, y: usize, width: usize, height: usize) {
        assert!(
            x + width <= self.width && y + height <= self.height,
            "crop {}x{} at ({}, {}) exceeds window {}x{}",
            width,
            height,
            x,
            y,
            self.width,
            self.height
        );
        self.x_offset += x;
        self.y_offset += y;
        self.width = width;
        self.height = height;
        debug_assert!(self.x_offset + self.width <= self.real_width);
        debug_assert!(self.y_offset + self.height <= self.real_height);
    }

    #[inline]
    fn storage_index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({}, {}) out of range for {}x{} buffer",
            x,
            y,
            self.width,
            self.height
        );
        (y + self.y_offset) * self.real_width + x + self.x_offset
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.pixels[self.storage_index(x, y)]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.storage_index(x, y);
        &mut self.pixels[idx]
    }

    /// Visible part of row `y`.
    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        assert!(y < self.height, "row {} out of range ({})", y, self.height);
        let start = (y + self.y_offset) * self.real_width + self.x_offset;
        &self.pixels[start..start + self.width]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        assert!(y < self.height, "row {} out of range ({})", y, self.height);
        let start = (y + self.y_offset) * self.real_width + self.x_offset;
        &mut self.pixels[start..start + self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        let (x0, w) = (self.x_offset, self.width);
        self.pixels
            .chunks(self.real_width.max(1))
            .skip(self.y_offset)
            .take(self.height)
            .map(move |row| &row[x0..x0 + w])
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [T]> + '_ {
        let (x0, w) = (self.x_offset, self.width);
        self.pixels
            .chunks_mut(self.real_width.max(1))
            .skip(self.y_offset)
            .take(self.height)
            .map(move |row| &mut row[x0..x0 + w])
    }

    /// Copy of the visible window into a fresh, uncropped buffer.
    pub fn to_compact(&self) -> Self
    where
        T: Clone,
    {
        let mut pixels = Vec::with_capacity(self.area());
        for row in self.rows() {
            pixels.extend_from_slice(row);
        }
        Self::new(self.width, self.height, pixels)
    }

    pub fn map<U, F>(&self, f: F) -> Buffer<U>
    where
        T: Copy,
        F: Fn(T) -> U,
    {
        let mut pixels = Vec::with_capacity(self.area());
        for row in self.rows() {
            pixels.extend(row.iter().map(|&v| f(v)));
        }
        Buffer::new(self.width, self.height, pixels)
    }

    /// Nearest-neighbour resample of the visible window to `width x height`.
    pub fn resized_nearest(&self, width: usize, height: usize) -> Self
    where
        T: Copy,
    {
        if width == self.width && height == self.height {
            return self.map(|v| v);
        }
        assert!(
            !self.is_empty() || width == 0 || height == 0,
            "cannot resample an empty buffer to {}x{}",
            width,
            height
        );
        let sx = self.width as f64 / width.max(1) as f64;
        let sy = self.height as f64 / height.max(1) as f64;
        Self::from_fn(width, height, |x, y| {
            let src_x = (((x as f64 + 0.5) * sx) as usize).min(self.width - 1);
            let src_y = (((y as f64 + 0.5) * sy) as usize).min(self.height - 1);
            *self.get(src_x, src_y)
        })
    }
}

impl<T: Sync> Buffer<T> {
    pub fn par_rows(&self) -> impl IndexedParallelIterator<Item = &[T]> + '_ {
        let (x0, w) = (self.x_offset, self.width);
        self.pixels
            .par_chunks(self.real_width.max(1))
            .skip(self.y_offset)
            .take(self.height)
            .map(move |row| &row[x0..x0 + w])
    }
}

impl<T: Send> Buffer<T> {
    pub fn par_rows_mut(&mut self) -> impl IndexedParallelIterator<Item = &mut [T]> + '_ {
        let (x0, w) = (self.x_offset, self.width);
        self.pixels
            .par_chunks_mut(self.real_width.max(1))
            .skip(self.y_offset)
            .take(self.height)
            .map(move |row| &mut row[x0..x0 + w])
    }
}

impl<T: Default + Clone> Buffer<T> {
    pub fn new_default(width: usize, height: usize) -> Self {
        Self::new(width, height, vec![T::default(); width * height])
    }
}

impl<T: Clone> Buffer<T> {
    pub fn new_filled(width: usize, height: usize, value: T) -> Self {
        Self::new(width, height, vec![value; width * height])
    }

    /// Fill the visible window only.
    pub fn fill(&mut self, value: T) {
        for row in self.rows_mut() {
            row.fill(value.clone());
        }
    }
}

impl<T: Sample> Buffer<T> {
    /// Sample at `(x, y)` as a fraction of white.
    #[inline]
    pub fn unit(&self, x: usize, y: usize) -> f64 {
        self.get(x, y).to_unit()
    }
}

impl<T: PartialEq> PartialEq for Buffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.rows().zip(other.rows()).all(|(a, b)| a == b)
    }
}

impl<T> Index<(usize, usize)> for Buffer<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        self.get(x, y)
    }
}

impl<T> IndexMut<(usize, usize)> for Buffer<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        self.get_mut(x, y)
    }
}
