//! Middlebury `.flo` optical-flow files.
//!
//! Layout: the four bytes `PIEH`, little-endian `i32` width and height, then
//! `width * height` pairs of little-endian `f32` `(u, v)` in row-major order.

use crate::format::{read_f32, read_i32, write_f32, write_i32};
use crate::util::{PmbpError, PmbpResult};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 4] = b"PIEH";

/// Dense 2D displacement field.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowField {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl FlowField {
    /// Creates a zero field.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; 2 * width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Interleaved `(u, v)` values, row-major.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Flow at `(x, y)`; panics if out of bounds.
    pub fn get(&self, x: usize, y: usize) -> (f32, f32) {
        let idx = 2 * (y * self.width + x);
        (self.data[idx], self.data[idx + 1])
    }

    pub fn set(&mut self, x: usize, y: usize, u: f32, v: f32) {
        let idx = 2 * (y * self.width + x);
        self.data[idx] = u;
        self.data[idx + 1] = v;
    }

    /// Serialises the field.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> PmbpResult<()> {
        writer.write_all(MAGIC)?;
        write_i32(writer, self.width, "flo width")?;
        write_i32(writer, self.height, "flo height")?;
        for &value in &self.data {
            write_f32(writer, value)?;
        }
        Ok(())
    }

    /// Parses a field, checking the magic tag.
    pub fn read_from<R: Read>(reader: &mut R) -> PmbpResult<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(PmbpError::InvalidInput("missing PIEH tag in flo file"));
        }
        let width = read_i32(reader, "negative flo width")?;
        let height = read_i32(reader, "negative flo height")?;
        let len = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(2))
            .ok_or(PmbpError::InvalidDimensions { width, height })?;
        let mut data = Vec::with_capacity(len.min(1 << 20));
        for _ in 0..len {
            data.push(read_f32(reader)?);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> PmbpResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> PmbpResult<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_from(&mut reader)
    }
}
