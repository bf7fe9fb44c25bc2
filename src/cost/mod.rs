//! Two-view scene and the patch-based unary cost.
//!
//! A [`Scene`] owns, for each view, the raw image, its gradient-magnitude
//! image and its median-filtered copy. The [`PatchEvaluator`] compares a
//! square patch of the target view against the displaced source view using
//! adaptive support weights from the filtered image.

mod patch;

pub use patch::{CostParams, PatchEvaluator};

use crate::image::{filters, RgbaImage};
use crate::util::PmbpResult;

/// One of the two input views.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum View {
    One,
    Two,
}

impl View {
    /// Both views, in index order.
    pub const ALL: [View; 2] = [View::One, View::Two];

    /// The view the current one is matched against.
    #[inline]
    pub fn other(self) -> View {
        match self {
            View::One => View::Two,
            View::Two => View::One,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        match self {
            View::One => 0,
            View::Two => 1,
        }
    }
}

/// Raw, gradient and median-filtered images of one view.
#[derive(Clone, Debug)]
pub struct ViewImages {
    pub image: RgbaImage,
    pub gradient: RgbaImage,
    pub filtered: RgbaImage,
}

impl ViewImages {
    /// Preprocesses `image` with a `median_size` median filter.
    pub fn new(image: RgbaImage, median_size: usize) -> PmbpResult<Self> {
        #[cfg(feature = "rayon")]
        let (gradient, filtered) = (
            filters::gradient_par(&image),
            filters::median_filter_par(&image, median_size)?,
        );
        #[cfg(not(feature = "rayon"))]
        let (gradient, filtered) = (
            filters::gradient(&image),
            filters::median_filter(&image, median_size)?,
        );
        Ok(Self {
            image,
            gradient,
            filtered,
        })
    }

    pub fn width(&self) -> usize {
        self.image.width()
    }

    pub fn height(&self) -> usize {
        self.image.height()
    }
}

/// Preprocessed images of both views.
#[derive(Clone, Debug)]
pub struct Scene {
    views: [ViewImages; 2],
}

impl Scene {
    /// Preprocesses both input images.
    pub fn new(one: RgbaImage, two: RgbaImage, median_size: usize) -> PmbpResult<Self> {
        Ok(Self {
            views: [
                ViewImages::new(one, median_size)?,
                ViewImages::new(two, median_size)?,
            ],
        })
    }

    pub fn view(&self, view: View) -> &ViewImages {
        &self.views[view.index()]
    }

    pub fn width(&self, view: View) -> usize {
        self.view(view).width()
    }

    pub fn height(&self, view: View) -> usize {
        self.view(view).height()
    }
}

#[cfg(test)]
mod tests {
    use super::View;

    #[test]
    fn other_view_swaps() {
        assert_eq!(View::One.other(), View::Two);
        assert_eq!(View::Two.other().other(), View::Two);
        assert_eq!(View::Two.index(), 1);
    }
}
