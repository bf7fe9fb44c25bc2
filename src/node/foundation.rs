//! Grid directions and cached per-particle message terms.

/// One of the four grid neighbours of a pixel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Up,
    Right,
    Down,
}

impl Direction {
    /// All directions in message-summation order.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Up,
        Direction::Right,
        Direction::Down,
    ];

    /// Slot index of this direction inside a node.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Direction::Left => 0,
            Direction::Up => 1,
            Direction::Right => 2,
            Direction::Down => 3,
        }
    }

    /// Pixel offset pointing towards the neighbour.
    #[inline]
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
        }
    }

    /// Direction pointing from `from` towards the 4-adjacent pixel `to`.
    ///
    /// Pixels sharing a column are vertical neighbours (`y` grows downwards),
    /// everything else is treated as horizontal.
    pub fn between(from: (usize, usize), to: (usize, usize)) -> Direction {
        if from.0 == to.0 {
            if from.1 < to.1 {
                Direction::Down
            } else {
                Direction::Up
            }
        } else if from.0 < to.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    }

    /// Neighbour coordinates of `(x, y)` in this direction, if inside a
    /// `width x height` grid.
    pub fn neighbour(
        self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Option<(usize, usize)> {
        let (dx, dy) = self.offset();
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        (nx < width && ny < height).then_some((nx, ny))
    }
}

/// Per-particle cache of `score - incoming message` for one direction.
///
/// A neighbour reads this when it computes the message it receives from the
/// owning node, which excludes its own contribution from the owner's belief.
#[derive(Clone, Debug, PartialEq)]
pub struct Foundation {
    values: Vec<f32>,
}

impl Foundation {
    /// Creates a zeroed foundation for `len` particles.
    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value cached for particle `k`.
    #[inline]
    pub fn value(&self, k: usize) -> f32 {
        self.values[k]
    }

    #[inline]
    pub fn set(&mut self, k: usize, value: f32) {
        self.values[k] = value;
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Subtracts the mean so that the entries sum to zero.
    ///
    /// A foundation whose entries already sum to zero is left untouched.
    pub fn normalize(&mut self) {
        if self.values.is_empty() {
            return;
        }
        let sum: f32 = self.values.iter().sum();
        if sum == 0.0 {
            return;
        }
        let mean = sum / self.values.len() as f32;
        for value in &mut self.values {
            *value -= mean;
        }
    }
}
