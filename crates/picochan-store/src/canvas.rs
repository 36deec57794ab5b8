use std::sync::Mutex;

use thiserror::Error;

use picochan_types::models::{CanvasSnapshot, Pixel};

use crate::lock;

pub const DEFAULT_WIDTH: usize = 24;
pub const DEFAULT_HEIGHT: usize = 8;
pub const MAX_DIFF_PIXELS: usize = 256;
pub const BLANK: char = ' ';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanvasError {
    #[error("diff too large: {got} pixels (max {max})")]
    BatchTooLarge { got: usize, max: usize },
}

/// Shared fixed-size character grid.
///
/// Batch writes and snapshots take the same lock, so a reader never sees half
/// of a diff.
pub struct Canvas {
    width: usize,
    height: usize,
    max_batch: usize,
    grid: Mutex<Vec<Vec<char>>>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            max_batch: MAX_DIFF_PIXELS,
            grid: Mutex::new(vec![vec![BLANK; width]; height]),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Write one cell. Out-of-bounds coordinates and anything other than a
    /// single char are ignored; returns whether the cell was written.
    pub fn set_cell(&self, x: i64, y: i64, ch: &str) -> bool {
        let mut grid = lock(&self.grid);
        self.write(&mut grid, x, y, ch)
    }

    /// Apply a batch under one lock acquisition. Oversized batches are
    /// rejected before anything is touched; invalid pixels are dropped.
    /// Returns the pixels that were applied, in request order.
    pub fn apply_diff(&self, pixels: &[Pixel]) -> Result<Vec<Pixel>, CanvasError> {
        if pixels.len() > self.max_batch {
            return Err(CanvasError::BatchTooLarge {
                got: pixels.len(),
                max: self.max_batch,
            });
        }

        let mut grid = lock(&self.grid);
        let applied = pixels
            .iter()
            .filter(|p| self.write(&mut grid, p.x, p.y, &p.ch))
            .cloned()
            .collect();
        Ok(applied)
    }

    pub fn snapshot(&self) -> CanvasSnapshot {
        let grid = lock(&self.grid);
        CanvasSnapshot {
            w: self.width,
            h: self.height,
            lines: grid.iter().map(|row| row.iter().collect()).collect(),
        }
    }

    /// Newline-joined rows, as posted to the `dessin` channel.
    pub fn snapshot_text(&self) -> String {
        self.snapshot().to_text()
    }

    fn write(&self, grid: &mut [Vec<char>], x: i64, y: i64, ch: &str) -> bool {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return false;
        };
        if x >= self.width || y >= self.height {
            return false;
        }

        let mut chars = ch.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                grid[y][x] = c;
                true
            }
            _ => false,
        }
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}
