use std::ops::{Index, IndexMut};

/// Small fixed size matrix addressed as `(column, row)`.
///
/// Used for the 2x2 control point grid of a terrain tile, where the column
/// is the x offset and the row the z offset of the corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix<const C: usize, const R: usize, T> {
	cells: [[T; R]; C],
}

impl<const C: usize, const R: usize, T: Copy> Matrix<C, R, T> {
	/// Every cell set to `value`.
	pub fn splat(value: T) -> Self {
		Self { cells: [[value; R]; C] }
	}
}

impl<const C: usize, const R: usize, T> Matrix<C, R, T> {
	pub fn from_fn(mut f: impl FnMut(usize, usize) -> T) -> Self {
		Self { cells: std::array::from_fn(|c| std::array::from_fn(|r| f(c, r))) }
	}

	pub const fn columns(&self) -> usize {
		C
	}

	pub const fn rows(&self) -> usize {
		R
	}

	pub fn get(&self, column: usize, row: usize) -> Option<&T> {
		self.cells.get(column).and_then(|c| c.get(row))
	}

	/// Iterates `((column, row), value)` column by column.
	pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> + '_ {
		self.cells
			.iter()
			.enumerate()
			.flat_map(|(c, column)| column.iter().enumerate().map(move |(r, v)| ((c, r), v)))
	}
}

impl<const C: usize, const R: usize, T: Copy + Default> Default for Matrix<C, R, T> {
	fn default() -> Self {
		Self::splat(T::default())
	}
}

impl<const C: usize, const R: usize, T> Index<(usize, usize)> for Matrix<C, R, T> {
	type Output = T;

	fn index(&self, (column, row): (usize, usize)) -> &T {
		assert!(column < C && row < R, "matrix index ({column}, {row}) out of {C}x{R}");
		&self.cells[column][row]
	}
}

impl<const C: usize, const R: usize, T> IndexMut<(usize, usize)> for Matrix<C, R, T> {
	fn index_mut(&mut self, (column, row): (usize, usize)) -> &mut T {
		assert!(column < C && row < R, "matrix index ({column}, {row}) out of {C}x{R}");
		&mut self.cells[column][row]
	}
}
