//! Images and fields derived from the current best particles.

use crate::cost::View;
use crate::engine::ParticleGraph;
use crate::format::FlowField;
use crate::grid::Grid;
use crate::image::{encode_colour, RgbaImage};
use crate::model::EnergyModel;
use crate::node::Direction;
use crate::util::colour::flow_colour;

impl<M: EnergyModel> ParticleGraph<M> {
    /// Displacement of the best particle at `(x, y)`.
    pub fn displacement_at(&self, view: View, x: usize, y: usize) -> (f32, f32) {
        let state = self.min_disbelief_state(view, x, y);
        self.model.displacement(x as f32, y as f32, state)
    }

    /// Per-pixel displacements of the best particles.
    pub fn motion_field(&self, view: View) -> Grid<(f32, f32)> {
        Grid::from_fn(self.width(view), self.height(view), |x, y| {
            self.displacement_at(view, x, y)
        })
    }

    /// Best displacements as a flow field.
    pub fn export_flo(&self, view: View) -> FlowField {
        let mut flow = FlowField::new(self.width(view), self.height(view));
        for y in 0..self.height(view) {
            for x in 0..self.width(view) {
                let (u, v) = self.displacement_at(view, x, y);
                flow.set(x, y, u, v);
            }
        }
        flow
    }

    /// Colour-wheel rendering of the best displacements.
    ///
    /// Displacements are normalised by the configured motion bound, or by the
    /// largest displacement length when unbounded.
    pub fn output_motion_field(&self, view: View) -> RgbaImage {
        let field = self.motion_field(view);
        let mut max_rad = if self.config.cost.max_motion > 0.0 {
            self.config.cost.max_motion
        } else {
            field
                .iter()
                .map(|&(dx, dy)| (dx * dx + dy * dy).sqrt())
                .fold(0.0f32, f32::max)
        };
        if max_rad == 0.0 {
            max_rad = 1.0;
        }
        let data = field
            .iter()
            .map(|&(dx, dy)| {
                let [r, g, b] = flow_colour(dx / max_rad, dy / max_rad);
                encode_colour(r, g, b, 255)
            })
            .collect();
        self.scene.view(view).image.same_shape(data)
    }

    /// Target view rebuilt from the source view through every best patch.
    ///
    /// Each pixel averages the source colours of all patches covering it;
    /// pixels no patch reaches are transparent.
    pub fn output_reconstruction(&self, view: View) -> RgbaImage {
        let target = &self.scene.view(view).image;
        let source = &self.scene.view(view.other()).image;
        let (width, height) = (target.width(), target.height());
        let p = self.config.cost.patch_size;
        let mut colours = Grid::filled(width, height, [0.0f32; 3]);
        let mut weights = Grid::filled(width, height, 0u32);

        for y in 0..height {
            for x in 0..width {
                let state = self.min_disbelief_state(view, x, y);
                for y_t in y.saturating_sub(p)..=(y + p).min(height - 1) {
                    for x_t in x.saturating_sub(p)..=(x + p).min(width - 1) {
                        let (dx, dy) = self.model.displacement(x_t as f32, y_t as f32, state);
                        let (x_s, y_s) = (x_t as f32 + dx, y_t as f32 + dy);
                        if !source.is_inside(x_s, y_s) {
                            continue;
                        }
                        let rgb = source.interpolated(x_s, y_s);
                        let acc = &mut colours[(x_t, y_t)];
                        for (c, v) in acc.iter_mut().zip(rgb) {
                            *c += v;
                        }
                        weights[(x_t, y_t)] += 1;
                    }
                }
            }
        }

        let data = colours
            .iter()
            .zip(weights.iter())
            .map(|(rgb, &w)| {
                if w == 0 {
                    return encode_colour(0, 0, 0, 0);
                }
                let channel = |c: f32| (c / w as f32).clamp(0.0, 255.0) as u8;
                encode_colour(channel(rgb[0]), channel(rgb[1]), channel(rgb[2]), 255)
            })
            .collect();
        target.same_shape(data)
    }

    /// Unary energy of the best particles as a grey map, with the total.
    pub fn output_unary_energy(&self, view: View) -> (RgbaImage, f32) {
        let evaluator = self.evaluator();
        let infinity = self.config.cost.infinity;
        let energies = Grid::from_fn(self.width(view), self.height(view), |x, y| {
            let state = self.min_disbelief_state(view, x, y);
            self.model
                .unary_energy(&evaluator, view, x, y, state, infinity)
        });
        self.energy_map(view, &energies)
    }

    /// Pairwise energy of the best particles against their neighbours' best
    /// particles as a grey map, with the total.
    pub fn output_pairwise_energy(&self, view: View) -> (RgbaImage, f32) {
        let (width, height) = (self.width(view), self.height(view));
        let energies = Grid::from_fn(width, height, |x, y| {
            let state = self.min_disbelief_state(view, x, y);
            Direction::ALL
                .iter()
                .filter_map(|d| d.neighbour(x, y, width, height))
                .map(|(nx, ny)| {
                    let other = self.min_disbelief_state(view, nx, ny);
                    self.model.pairwise_energy(x, y, state, nx, ny, other)
                })
                .sum::<f32>()
        });
        self.energy_map(view, &energies)
    }

    /// Horizontal displacement magnitude times `scale` as a grey map.
    pub fn output_disparity(&self, view: View, scale: f32) -> RgbaImage {
        let data = self
            .motion_field(view)
            .iter()
            .map(|&(dx, _)| {
                let v = (dx.abs() * scale).clamp(0.0, 255.0) as u8;
                encode_colour(v, v, v, 255)
            })
            .collect();
        self.scene.view(view).image.same_shape(data)
    }

    fn energy_map(&self, view: View, energies: &Grid<f32>) -> (RgbaImage, f32) {
        let total: f32 = energies.iter().sum();
        let max = energies.iter().copied().fold(0.0f32, f32::max);
        let data = energies
            .iter()
            .map(|&e| {
                let v = if max > 0.0 {
                    (255.0 * e / max).clamp(0.0, 255.0) as u8
                } else {
                    0
                };
                encode_colour(v, v, v, 255)
            })
            .collect();
        (self.scene.view(view).image.same_shape(data), total)
    }
}
