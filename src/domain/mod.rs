pub mod direction;
pub mod grid;
pub mod sprite;
pub mod tile;
