//! Saving and restoring particle states.

use crate::engine::ParticleGraph;
use crate::format::{FieldBlock, FieldFile};
use crate::model::EnergyModel;
use crate::node::Particle;
use crate::trace::trace_event;
use crate::util::{PmbpError, PmbpResult};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

impl<M: EnergyModel> ParticleGraph<M> {
    /// Snapshot of every particle state; view two is included when bidirectional.
    pub fn fields(&self) -> FieldFile {
        let blocks = self
            .active_views()
            .into_iter()
            .map(|view| {
                let (width, height) = (self.width(view), self.height(view));
                let mut states = Vec::with_capacity(width * height * self.n_particles);
                for x in 0..width {
                    for y in 0..height {
                        let node = self.node(view, x, y);
                        states.extend(node.particles().iter().map(|p| p.state.clone()));
                    }
                }
                FieldBlock {
                    width,
                    height,
                    states,
                }
            })
            .collect();
        FieldFile {
            kind: self.model.tag(),
            data_dim: self.model.data_dim(),
            meta_dim: self.model.meta_dim(),
            n_particles: self.n_particles,
            blocks,
        }
    }

    /// Writes the particle states in the field-file format.
    pub fn export_fields<W: Write>(&self, writer: &mut W) -> PmbpResult<()> {
        let fields = self.fields();
        trace_event!(
            "export_fields",
            data_dim = fields.data_dim,
            meta_dim = fields.meta_dim,
            particles = fields.n_particles,
            views = fields.blocks.len()
        );
        fields.write_to(writer)
    }

    /// Replaces every node with particles read from a field file.
    ///
    /// Scores and foundations start at zero. The file's particle count is
    /// adopted; tag, state sizes and grid dimensions must match.
    pub fn import_fields<R: Read>(&mut self, reader: &mut R) -> PmbpResult<()> {
        let views = self.active_views();
        let fields = FieldFile::read_from(reader, views.len())?;
        self.apply_fields(fields)
    }

    /// Installs previously read fields; see [`ParticleGraph::import_fields`].
    pub fn apply_fields(&mut self, fields: FieldFile) -> PmbpResult<()> {
        let expected = self.model.tag();
        if fields.kind != expected {
            return Err(PmbpError::ModelMismatch {
                expected: char::from(expected.tag()),
                found: char::from(fields.kind.tag()),
            });
        }
        check("data dimension", self.model.data_dim(), fields.data_dim)?;
        check("meta dimension", self.model.meta_dim(), fields.meta_dim)?;
        if fields.n_particles == 0 {
            return Err(PmbpError::InvalidInput("field file holds no particles"));
        }
        let views = self.active_views();
        check("view count", views.len(), fields.blocks.len())?;
        for (&view, block) in views.iter().zip(&fields.blocks) {
            check("field width", self.width(view), block.width)?;
            check("field height", self.height(view), block.height)?;
            check(
                "state count",
                block.width * block.height * fields.n_particles,
                block.states.len(),
            )?;
            for state in &block.states {
                check("data dimension", fields.data_dim, state.data.len())?;
                check("meta dimension", fields.meta_dim, state.meta.len())?;
            }
        }

        for (&view, block) in views.iter().zip(&fields.blocks) {
            for x in 0..block.width {
                for y in 0..block.height {
                    let particles = block
                        .node_states(x, y, fields.n_particles)
                        .iter()
                        .map(|state| Particle {
                            state: state.clone(),
                            score: 0.0,
                        })
                        .collect();
                    self.set_node(view, x, y, particles);
                }
            }
        }
        self.n_particles = fields.n_particles;
        trace_event!(
            "import_fields",
            particles = fields.n_particles,
            views = fields.blocks.len()
        );
        Ok(())
    }

    pub fn save_fields<P: AsRef<Path>>(&self, path: P) -> PmbpResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.export_fields(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load_fields<P: AsRef<Path>>(&mut self, path: P) -> PmbpResult<()> {
        let mut reader = BufReader::new(File::open(path)?);
        self.import_fields(&mut reader)
    }
}

fn check(context: &'static str, expected: usize, found: usize) -> PmbpResult<()> {
    if expected != found {
        return Err(PmbpError::FieldMismatch {
            context,
            expected,
            found,
        });
    }
    Ok(())
}
