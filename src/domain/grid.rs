/// Tile layers and the grid & collision oracle.
///
/// The oracle answers two questions and nothing else:
///   - is (col, row) passable?
///   - how many tiles wide and tall is the map?
///
/// ## Passability Truth Table
/// ┌──────────────────────────────┬───────────┐
/// │ Condition (priority order)    │ Passable? │
/// ├──────────────────────────────┼───────────┤
/// │ col/row outside the grid      │ NO        │
/// │ no collision layer at all     │ YES       │
/// │ no tile at (col, row)         │ YES       │
/// │ tile is Water                 │ NO        │
/// │ any other tile                │ YES       │
/// └──────────────────────────────┴───────────┘

use super::direction::GridPosition;
use super::tile::{Overhang, Tile};

/// A named rectangular layer of optional cells, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer<T> {
    pub name: String,
    cols: u32,
    rows: u32,
    cells: Vec<Option<T>>,
}

pub type TileLayer = Layer<Tile>;
pub type OverhangLayer = Layer<Overhang>;

impl<T: Copy> Layer<T> {
    /// An empty layer: every cell has no data.
    pub fn new(name: &str, cols: u32, rows: u32) -> Self {
        Layer {
            name: name.to_string(),
            cols,
            rows,
            cells: vec![None; (cols * rows) as usize],
        }
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Cell at (col, row); `None` for no data or out of range.
    #[inline]
    pub fn get(&self, col: i32, row: i32) -> Option<T> {
        if col < 0 || row < 0 || col as u32 >= self.cols || row as u32 >= self.rows {
            return None;
        }
        self.cells[(row as u32 * self.cols + col as u32) as usize]
    }

    /// Write a cell; out-of-range writes are ignored.
    pub fn set(&mut self, col: u32, row: u32, value: Option<T>) {
        if col < self.cols && row < self.rows {
            self.cells[(row * self.cols + col) as usize] = value;
        }
    }
}

/// Read-only passability view over the collision layer.
#[derive(Clone, Copy, Debug)]
pub struct CollisionOracle<'a> {
    layer: Option<&'a TileLayer>,
    cols: u32,
    rows: u32,
}

impl<'a> CollisionOracle<'a> {
    /// `layer = None` means the map carries no collision data; every
    /// in-bounds tile is then passable.
    pub fn new(layer: Option<&'a TileLayer>, cols: u32, rows: u32) -> Self {
        CollisionOracle { layer, cols, rows }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && (col as u32) < self.cols && (row as u32) < self.rows
    }

    /// See truth table above.
    pub fn is_passable(&self, col: i32, row: i32) -> bool {
        if !self.in_bounds(col, row) {
            return false;
        }
        match self.layer.and_then(|l| l.get(col, row)) {
            Some(tile) => tile.is_passable(),
            None => true,
        }
    }

    pub fn is_passable_at(&self, pos: GridPosition) -> bool {
        self.is_passable(pos.col, pos.row)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Helper: build a ground layer from a string diagram.
    /// Legend: '.'=Grass ':'=Path ','=Sand '*'=Flowers '~'=Water ' '=no tile
    pub(crate) fn layer_from(rows: &[&str]) -> TileLayer {
        let h = rows.len() as u32;
        let w = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let mut layer = TileLayer::new("Ground", w, h);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                layer.set(x as u32, y as u32, Tile::from_glyph(ch));
            }
        }
        layer
    }

    #[test]
    fn water_is_impassable() {
        let l = layer_from(&[".~."]);
        let o = CollisionOracle::new(Some(&l), 3, 1);
        assert!(o.is_passable(0, 0));
        assert!(!o.is_passable(1, 0));
        assert!(o.is_passable(2, 0));
    }

    #[test]
    fn missing_tile_is_passable() {
        let l = layer_from(&[". ."]);
        let o = CollisionOracle::new(Some(&l), 3, 1);
        assert!(o.is_passable(1, 0));
    }

    #[test]
    fn out_of_bounds_is_blocked() {
        let l = layer_from(&["..", ".."]);
        let o = CollisionOracle::new(Some(&l), 2, 2);
        assert!(!o.is_passable(-1, 0));
        assert!(!o.is_passable(0, -1));
        assert!(!o.is_passable(2, 0));
        assert!(!o.is_passable(0, 2));
        assert!(o.is_passable(1, 1));
    }

    #[test]
    fn no_collision_layer_degrades_to_open() {
        let o = CollisionOracle::new(None, 4, 3);
        assert_eq!(o.dimensions(), (4, 3));
        assert!(o.is_passable(3, 2));
        assert!(!o.is_passable(4, 2));
    }

    #[test]
    fn layer_get_out_of_range_is_none() {
        let l = layer_from(&["~"]);
        assert_eq!(l.get(0, 0), Some(Tile::Water));
        assert_eq!(l.get(1, 0), None);
        assert_eq!(l.get(0, -1), None);
    }
}
