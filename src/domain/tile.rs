/// Tile identities and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Grass,
    Path,
    Sand,
    Flowers,
    Water, // the one impassable identity
}

impl Tile {
    /// Can the player stand on this tile?
    pub fn is_passable(self) -> bool {
        !matches!(self, Tile::Water)
    }

    /// Ground-layer glyph used by the text map format.
    pub fn from_glyph(ch: char) -> Option<Tile> {
        match ch {
            '.' => Some(Tile::Grass),
            ':' => Some(Tile::Path),
            ',' => Some(Tile::Sand),
            '*' => Some(Tile::Flowers),
            '~' => Some(Tile::Water),
            _ => None,
        }
    }
}

/// Cosmetic tiles of the "Above" layer, drawn over the player.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Overhang {
    Canopy,
    Roof,
}

impl Overhang {
    pub fn from_glyph(ch: char) -> Option<Overhang> {
        match ch {
            'T' => Some(Overhang::Canopy),
            '^' => Some(Overhang::Roof),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_water_blocks() {
        for t in [Tile::Grass, Tile::Path, Tile::Sand, Tile::Flowers] {
            assert!(t.is_passable(), "{t:?}");
        }
        assert!(!Tile::Water.is_passable());
    }

    #[test]
    fn glyphs() {
        assert_eq!(Tile::from_glyph('~'), Some(Tile::Water));
        assert_eq!(Tile::from_glyph(':'), Some(Tile::Path));
        assert_eq!(Tile::from_glyph('P'), None);
        assert_eq!(Overhang::from_glyph('T'), Some(Overhang::Canopy));
        assert_eq!(Overhang::from_glyph('.'), None);
    }
}
