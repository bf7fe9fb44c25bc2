//! Pixel visiting orders for the four alternating sweeps.

/// Order in which one sweep visits the pixels of a grid; rows are the outer loop.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SweepOrder {
    TopLeftToBottomRight,
    BottomRightToTopLeft,
    BottomLeftToTopRight,
    TopRightToBottomLeft,
}

impl SweepOrder {
    /// Order used by iteration `it`; the cycle repeats every four iterations.
    pub fn for_iteration(it: usize) -> Self {
        match it % 4 {
            0 => SweepOrder::TopLeftToBottomRight,
            1 => SweepOrder::BottomRightToTopLeft,
            2 => SweepOrder::BottomLeftToTopRight,
            _ => SweepOrder::TopRightToBottomLeft,
        }
    }

    /// Whether columns and rows are walked from the far end.
    fn reversed(self) -> (bool, bool) {
        match self {
            SweepOrder::TopLeftToBottomRight => (false, false),
            SweepOrder::BottomRightToTopLeft => (true, true),
            SweepOrder::BottomLeftToTopRight => (false, true),
            SweepOrder::TopRightToBottomLeft => (true, false),
        }
    }

    /// Every pixel of a `width x height` grid in this order.
    pub fn pixels(self, width: usize, height: usize) -> impl Iterator<Item = (usize, usize)> {
        let (x_rev, y_rev) = self.reversed();
        (0..height)
            .map(move |j| if y_rev { height - 1 - j } else { j })
            .flat_map(move |y| {
                (0..width).map(move |i| {
                    let x = if x_rev { width - 1 - i } else { i };
                    (x, y)
                })
            })
    }
}
