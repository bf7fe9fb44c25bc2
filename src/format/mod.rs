//! Binary file formats.
//!
//! All multi-byte values are little-endian.

pub mod fields;
pub mod flo;

pub use fields::{peek_kind, FieldBlock, FieldFile};
pub use flo::FlowField;

use crate::util::{PmbpError, PmbpResult};
use std::io::{Read, Write};

pub(crate) fn write_i32<W: Write>(
    writer: &mut W,
    value: usize,
    context: &'static str,
) -> PmbpResult<()> {
    let value = i32::try_from(value).map_err(|_| PmbpError::FieldMismatch {
        context,
        expected: i32::MAX as usize,
        found: value,
    })?;
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub(crate) fn read_i32<R: Read>(reader: &mut R, context: &'static str) -> PmbpResult<usize> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    let value = i32::from_le_bytes(buf);
    usize::try_from(value).map_err(|_| PmbpError::InvalidInput(context))
}

pub(crate) fn write_f32<W: Write>(writer: &mut W, value: f32) -> PmbpResult<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub(crate) fn read_f32<R: Read>(reader: &mut R) -> PmbpResult<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}
