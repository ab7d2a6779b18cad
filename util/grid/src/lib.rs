pub mod cells;
pub mod coord;
pub mod matrix;

pub use cells::{rect_overlaps, CellRange};
pub use coord::TileCoord;
pub use matrix::Matrix;
