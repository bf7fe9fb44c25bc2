use crate::cost::{Scene, View};
use crate::image::{blue, green, red};
use crate::model::EnergyModel;
use crate::state::State;

/// Parameters of the unary cost and of state validity.
#[derive(Clone, Debug, PartialEq)]
pub struct CostParams {
    /// Half side of the square patch.
    pub patch_size: usize,
    /// Largest admissible displacement length; `0` disables the check.
    pub max_motion: f32,
    /// Truncation of the colour difference.
    pub tau1: f32,
    /// Truncation of the gradient difference.
    pub tau2: f32,
    /// Blend between colour (`0`) and gradient (`1`) terms.
    pub alpha: f32,
    /// Adaptive support weight bandwidth.
    pub asw: f32,
    /// Fraction of the maximal match cost charged when the source leaves the image.
    pub border: f32,
    /// Finite sentinel returned for invalid or rejected states.
    pub infinity: f32,
}

impl Default for CostParams {
    fn default() -> Self {
        Self {
            patch_size: 2,
            max_motion: 0.0,
            tau1: 20.0,
            tau2: 20.0,
            alpha: 0.0,
            asw: 15.0,
            border: 0.85,
            infinity: 9_999_999.0,
        }
    }
}

impl CostParams {
    /// Cost charged per pixel whose source falls outside the image, before weighting.
    pub fn border_cost(&self) -> f32 {
        ((1.0 - self.alpha) * self.tau1 + self.alpha * self.tau2) * self.border
    }
}

/// Evaluates patch dissimilarity between the two views of a scene.
#[derive(Copy, Clone, Debug)]
pub struct PatchEvaluator<'a> {
    scene: &'a Scene,
    params: &'a CostParams,
}

impl<'a> PatchEvaluator<'a> {
    pub fn new(scene: &'a Scene, params: &'a CostParams) -> Self {
        Self { scene, params }
    }

    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    pub fn params(&self) -> &'a CostParams {
        self.params
    }

    /// Effective motion bound for `view`: the configured one, or the larger
    /// image side when unbounded.
    pub fn max_motion(&self, view: View) -> f32 {
        if self.params.max_motion != 0.0 {
            self.params.max_motion
        } else {
            self.scene.width(view).max(self.scene.height(view)) as f32
        }
    }

    /// Checks the motion bound and that `(x, y)` displaced by `state` lands
    /// inside the other view.
    pub fn is_state_valid<M: EnergyModel + ?Sized>(
        &self,
        model: &M,
        view: View,
        x: usize,
        y: usize,
        state: &State,
    ) -> bool {
        let (dx, dy) = model.displacement(x as f32, y as f32, state);
        let max_motion = self.params.max_motion;
        if max_motion != 0.0 && dx * dx + dy * dy > max_motion * max_motion {
            return false;
        }
        self.scene
            .view(view.other())
            .image
            .is_inside(x as f32 + dx, y as f32 + dy)
    }

    /// Weighted patch dissimilarity of `state` centred at `(x, y)` in `view`.
    ///
    /// Rows are accumulated top to bottom; once the running sum exceeds
    /// `threshold` after a row, `infinity` is returned.
    pub fn patch_cost<M: EnergyModel + ?Sized>(
        &self,
        model: &M,
        view: View,
        x: usize,
        y: usize,
        state: &State,
        threshold: f32,
    ) -> f32 {
        let target = self.scene.view(view);
        let source = self.scene.view(view.other());
        let p = self.params.patch_size;
        let start_x = x.saturating_sub(p);
        let start_y = y.saturating_sub(p);
        let end_x = (x + p).min(target.width() - 1);
        let end_y = (y + p).min(target.height() - 1);

        let image = target.image.view();
        let gradient = target.gradient.view();
        let filtered = target.filtered.view();
        let center = match filtered.get(x, y) {
            Some(&px) => px,
            None => return self.params.infinity,
        };
        let center = [
            f32::from(red(center)),
            f32::from(green(center)),
            f32::from(blue(center)),
        ];

        let mut error = 0.0f32;
        for y_t in start_y..=end_y {
            let (Some(image_row), Some(gradient_row), Some(filtered_row)) =
                (image.row(y_t), gradient.row(y_t), filtered.row(y_t))
            else {
                continue;
            };
            for x_t in start_x..=end_x {
                let (dx, dy) = model.displacement(x_t as f32, y_t as f32, state);
                let x_s = x_t as f32 + dx;
                let y_s = y_t as f32 + dy;

                let filt = filtered_row[x_t];
                let diff_asw = (center[0] - f32::from(red(filt))).abs()
                    + (center[1] - f32::from(green(filt))).abs()
                    + (center[2] - f32::from(blue(filt))).abs();
                let w = (-diff_asw / self.params.asw).exp();

                if source.image.is_inside(x_s, y_s) {
                    let t = image_row[x_t];
                    let [r_s, g_s, b_s] = source.image.interpolated(x_s, y_s);
                    let diff_colour = ((f32::from(red(t)) - r_s).abs()
                        + (f32::from(green(t)) - g_s).abs()
                        + (f32::from(blue(t)) - b_s).abs())
                        / 3.0;
                    let [gr_s, _, _] = source.gradient.interpolated(x_s, y_s);
                    let diff_gradient = (f32::from(red(gradient_row[x_t])) - gr_s).abs();
                    error += w
                        * ((1.0 - self.params.alpha) * diff_colour.min(self.params.tau1)
                            + self.params.alpha * diff_gradient.min(self.params.tau2));
                } else {
                    error += w * self.params.border_cost();
                }
            }
            if error > threshold {
                return self.params.infinity;
            }
        }
        error
    }
}
