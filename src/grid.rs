//! Dense row-major 2D fields.

/// Owned row-major 2D buffer with fixed dimensions.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

impl<T: Clone> Grid<T> {
    /// Creates a grid with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Sets every cell to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T> Grid<T> {
    /// Creates a grid by evaluating `f(x, y)` in row-major order.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Grid width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the cell at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }

    /// Returns the mutable cell at `(x, y)` if it is within bounds.
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get_mut(y * self.width + x)
    }

    /// Iterates cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }
}

impl<T> std::ops::Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (x, y): (usize, usize)) -> &T {
        assert!(x < self.width && y < self.height, "grid index out of bounds");
        &self.data[y * self.width + x]
    }
}

impl<T> std::ops::IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        assert!(x < self.width && y < self.height, "grid index out of bounds");
        &mut self.data[y * self.width + x]
    }
}

/// Boolean per-pixel flags.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    cells: Grid<bool>,
}

impl Mask {
    /// Creates a mask with every flag cleared.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            cells: Grid::filled(width, height, false),
        }
    }

    /// Flag at `(x, y)`; out-of-bounds reads are `false`.
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.cells.get(x, y).copied().unwrap_or(false)
    }

    /// Sets the flag at `(x, y)`; out-of-bounds writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if let Some(cell) = self.cells.get_mut(x, y) {
            *cell = value;
        }
    }

    /// Sets every flag to `value`.
    pub fn set_all(&mut self, value: bool) {
        self.cells.fill(value);
    }

    /// Number of flags equal to `value`.
    pub fn count(&self, value: bool) -> usize {
        self.cells.iter().filter(|&&cell| cell == value).count()
    }

    /// Share of flags equal to `value`, in percent.
    pub fn percentage(&self, value: bool) -> f32 {
        let total = self.cells.width() * self.cells.height();
        if total == 0 {
            return 0.0;
        }
        100.0 * self.count(value) as f32 / total as f32
    }
}

#[cfg(test)]
mod tests {
    use super::{Grid, Mask};

    #[test]
    fn grid_is_row_major() {
        let grid = Grid::from_fn(3, 2, |x, y| 10 * y + x);
        assert_eq!(grid[(2, 1)], 12);
        assert_eq!(grid.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 10, 11, 12]);
        assert!(grid.get(3, 0).is_none());
    }

    #[test]
    fn mask_counts_flags() {
        let mut mask = Mask::new(2, 2);
        mask.set(1, 1, true);
        mask.set(5, 5, true);
        assert_eq!(mask.count(true), 1);
        assert!((mask.percentage(true) - 25.0).abs() < 1e-6);
        mask.set_all(true);
        assert_eq!(mask.count(false), 0);
    }
}
