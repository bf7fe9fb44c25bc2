//! Persisted particle fields.
//!
//! Layout: a one-byte model tag, `i32` data and meta dimensions, `i32` width
//! and height of view one, `i32` particles per node, then every state of view
//! one (columns outer, rows inner, particles innermost; `data` then `meta`
//! as `f32`). A bidirectional file continues with `i32` width and height of
//! view two followed by its states in the same order.

use crate::format::{read_f32, read_i32, write_f32, write_i32};
use crate::model::ModelKind;
use crate::state::State;
use crate::util::{PmbpError, PmbpResult};
use std::io::{Read, Write};

/// States of one view.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldBlock {
    pub width: usize,
    pub height: usize,
    /// Indexed by `(x * height + y) * n_particles + k`.
    pub states: Vec<State>,
}

impl FieldBlock {
    /// States of the node at `(x, y)`.
    pub fn node_states(&self, x: usize, y: usize, n_particles: usize) -> &[State] {
        let start = (x * self.height + y) * n_particles;
        &self.states[start..start + n_particles]
    }
}

/// Contents of a particle-field file.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldFile {
    pub kind: ModelKind,
    pub data_dim: usize,
    pub meta_dim: usize,
    pub n_particles: usize,
    /// View one, then view two for bidirectional solves.
    pub blocks: Vec<FieldBlock>,
}

/// Reads only the model tag at the head of a field file.
pub fn peek_kind<R: Read>(reader: &mut R) -> PmbpResult<ModelKind> {
    let mut tag = [0u8; 1];
    reader.read_exact(&mut tag)?;
    ModelKind::from_tag(tag[0])
}

impl FieldFile {
    pub fn write_to<W: Write>(&self, writer: &mut W) -> PmbpResult<()> {
        let Some((first, rest)) = self.blocks.split_first() else {
            return Err(PmbpError::InvalidInput("field file without blocks"));
        };
        writer.write_all(&[self.kind.tag()])?;
        write_i32(writer, self.data_dim, "data dimension")?;
        write_i32(writer, self.meta_dim, "meta dimension")?;
        write_i32(writer, first.width, "field width")?;
        write_i32(writer, first.height, "field height")?;
        write_i32(writer, self.n_particles, "particle count")?;
        self.write_states(writer, first)?;
        for block in rest {
            write_i32(writer, block.width, "field width")?;
            write_i32(writer, block.height, "field height")?;
            self.write_states(writer, block)?;
        }
        Ok(())
    }

    fn write_states<W: Write>(&self, writer: &mut W, block: &FieldBlock) -> PmbpResult<()> {
        let expected = block.width * block.height * self.n_particles;
        if block.states.len() != expected {
            return Err(PmbpError::FieldMismatch {
                context: "state count",
                expected,
                found: block.states.len(),
            });
        }
        for state in &block.states {
            if state.data.len() != self.data_dim || state.meta.len() != self.meta_dim {
                return Err(PmbpError::FieldMismatch {
                    context: "state size",
                    expected: self.data_dim + self.meta_dim,
                    found: state.data.len() + state.meta.len(),
                });
            }
            for &value in state.data.iter().chain(&state.meta) {
                write_f32(writer, value)?;
            }
        }
        Ok(())
    }

    /// Parses a field file; `views` is 1, or 2 for a bidirectional file.
    pub fn read_from<R: Read>(reader: &mut R, views: usize) -> PmbpResult<Self> {
        let kind = peek_kind(reader)?;
        let data_dim = read_i32(reader, "negative data dimension")?;
        let meta_dim = read_i32(reader, "negative meta dimension")?;
        let width = read_i32(reader, "negative field width")?;
        let height = read_i32(reader, "negative field height")?;
        let n_particles = read_i32(reader, "negative particle count")?;

        let mut blocks = Vec::with_capacity(views);
        blocks.push(read_states(reader, width, height, n_particles, data_dim, meta_dim)?);
        for _ in 1..views {
            let width = read_i32(reader, "negative field width")?;
            let height = read_i32(reader, "negative field height")?;
            blocks.push(read_states(reader, width, height, n_particles, data_dim, meta_dim)?);
        }
        Ok(Self {
            kind,
            data_dim,
            meta_dim,
            n_particles,
            blocks,
        })
    }
}

fn read_states<R: Read>(
    reader: &mut R,
    width: usize,
    height: usize,
    n_particles: usize,
    data_dim: usize,
    meta_dim: usize,
) -> PmbpResult<FieldBlock> {
    let count = width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(n_particles))
        .ok_or(PmbpError::InvalidDimensions { width, height })?;
    let mut states = Vec::with_capacity(count.min(1 << 16));
    for _ in 0..count {
        let mut state = State::zeros(data_dim, meta_dim);
        for value in state.data.iter_mut().chain(state.meta.iter_mut()) {
            *value = read_f32(reader)?;
        }
        states.push(state);
    }
    Ok(FieldBlock {
        width,
        height,
        states,
    })
}
