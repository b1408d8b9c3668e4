/// Tile maps and the text map loader.
///
/// ## Sources (priority order):
///   1. `<maps_dir>/<name>.txt`
///   2. Built-in maps embedded in the binary
///
/// ## Map format (`.txt`):
///   ```text
///   # Map Name
///   [Ground]
///   <rows>
///   [Above]
///   <rows>
///   ```
///
/// Rows that appear before any `[Layer]` header belong to Ground.
/// Inside a layer, blank lines are rows with no tiles; trailing blank
/// lines are dropped. The map is as wide as its longest row.
///
/// ## Ground legend:
///   '.' = Grass    ':' = Path     ',' = Sand    '*' = Flowers
///   '~' = Water    'P' = Player spawn (on grass)  ' ' = no tile
///
/// ## Above legend:
///   'T' = Tree canopy   '^' = Roof   ' ' / '.' = nothing

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::direction::GridPosition;
use crate::domain::grid::{CollisionOracle, OverhangLayer, TileLayer};
use crate::domain::tile::{Overhang, Tile};

pub const GROUND_LAYER: &str = "Ground";
pub const ABOVE_LAYER: &str = "Above";

const BUILTIN_MAPS: &[(&str, &str)] = &[
    ("meadow", include_str!("../../maps/meadow.txt")),
    ("cove", include_str!("../../maps/cove.txt")),
];

#[derive(Debug, Error)]
pub enum MapError {
    #[error("map '{0}' not found in maps directory or built-ins")]
    NotFound(String),
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}, column {column}: unknown {layer} glyph '{glyph}'")]
    UnknownGlyph { line: usize, column: usize, layer: &'static str, glyph: char },
    #[error("line {line}: unknown layer '[{name}]'")]
    UnknownLayer { line: usize, name: String },
    #[error("line {line}: layer '[{name}]' declared twice")]
    DuplicateLayer { line: usize, name: String },
    #[error("line {line}: second player spawn")]
    DuplicateSpawn { line: usize },
    #[error("player spawn ({col}, {row}) is on an impassable tile")]
    SpawnBlocked { col: i32, row: i32 },
    #[error("map has no rows")]
    Empty,
}

/// Pixel dimensions (width, height).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        PixelSize { width, height }
    }
}

#[derive(Clone, Debug)]
pub struct TileMap {
    pub name: String,
    cols: u32,
    rows: u32,
    ground: Option<TileLayer>,
    above: Option<OverhangLayer>,
    spawn: GridPosition,
}

impl TileMap {
    /// Assemble a map from already-built layers.
    /// With no spawn the player starts on the centre tile.
    pub fn new(
        name: &str,
        ground: Option<TileLayer>,
        above: Option<OverhangLayer>,
        spawn: Option<GridPosition>,
    ) -> Result<Self, MapError> {
        let cols = ground.iter().map(|l| l.cols())
            .chain(above.iter().map(|l| l.cols()))
            .max()
            .unwrap_or(0);
        let rows = ground.iter().map(|l| l.rows())
            .chain(above.iter().map(|l| l.rows()))
            .max()
            .unwrap_or(0);
        if cols == 0 || rows == 0 {
            return Err(MapError::Empty);
        }

        let spawn = spawn.unwrap_or(GridPosition::new((cols / 2) as i32, (rows / 2) as i32));
        let map = TileMap { name: name.to_string(), cols, rows, ground, above, spawn };
        if !map.oracle().is_passable_at(spawn) {
            return Err(MapError::SpawnBlocked { col: spawn.col, row: spawn.row });
        }
        Ok(map)
    }

    pub fn parse(text: &str) -> Result<Self, MapError> {
        parse_map(text)
    }

    pub fn spawn(&self) -> GridPosition {
        self.spawn
    }

    pub fn pixel_size(&self, tile_size: u32) -> PixelSize {
        PixelSize::new(self.cols * tile_size, self.rows * tile_size)
    }

    /// Passability view over the Ground layer.
    pub fn oracle(&self) -> CollisionOracle<'_> {
        CollisionOracle::new(self.ground.as_ref(), self.cols, self.rows)
    }

    pub fn tile_at(&self, col: i32, row: i32) -> Option<Tile> {
        self.ground.as_ref().and_then(|l| l.get(col, row))
    }

    pub fn overhang_at(&self, col: i32, row: i32) -> Option<Overhang> {
        self.above.as_ref().and_then(|l| l.get(col, row))
    }

    pub fn has_layer(&self, name: &str) -> bool {
        match name {
            GROUND_LAYER => self.ground.is_some(),
            ABOVE_LAYER => self.above.is_some(),
            _ => false,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Loading
// ══════════════════════════════════════════════════════════════

/// Load `name` from `maps_dir`, falling back to the built-in maps.
pub fn load_map(name: &str, maps_dir: &Path) -> Result<TileMap, MapError> {
    let path = maps_dir.join(format!("{name}.txt"));
    if path.is_file() {
        let text = std::fs::read_to_string(&path)
            .map_err(|source| MapError::Io { path: path.clone(), source })?;
        let map = TileMap::parse(&text)?;
        info!(map = %map.name, path = %path.display(), cols = map.cols, rows = map.rows, "map loaded");
        return Ok(map);
    }

    debug!(path = %path.display(), "no map file, trying built-ins");
    let text = builtin_map(name).ok_or_else(|| MapError::NotFound(name.to_string()))?;
    let map = TileMap::parse(text)?;
    info!(map = %map.name, cols = map.cols, rows = map.rows, "built-in map loaded");
    Ok(map)
}

pub fn builtin_map(name: &str) -> Option<&'static str> {
    BUILTIN_MAPS.iter().find(|(n, _)| *n == name).map(|(_, text)| *text)
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Ground,
    Above,
}

/// Raw rows of one layer, with the source line number of each row.
#[derive(Default)]
struct RawLayer {
    declared: bool,
    rows: Vec<(usize, String)>,
}

impl RawLayer {
    fn trim_trailing_blank(&mut self) {
        while self.rows.last().is_some_and(|(_, r)| r.trim().is_empty()) {
            self.rows.pop();
        }
    }

    fn width(&self) -> u32 {
        self.rows.iter().map(|(_, r)| r.chars().count() as u32).max().unwrap_or(0)
    }
}

fn parse_map(text: &str) -> Result<TileMap, MapError> {
    let mut name: Option<String> = None;
    let mut ground = RawLayer::default();
    let mut above = RawLayer::default();
    let mut section: Option<Section> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end_matches('\r');

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.trim_end().strip_suffix(']')) {
            let next = match header.trim() {
                GROUND_LAYER => Section::Ground,
                ABOVE_LAYER => Section::Above,
                other => return Err(MapError::UnknownLayer { line: line_no, name: other.to_string() }),
            };
            let layer = match next {
                Section::Ground => &mut ground,
                Section::Above => &mut above,
            };
            if layer.declared || (next == Section::Ground && !layer.rows.is_empty()) {
                return Err(MapError::DuplicateLayer { line: line_no, name: header.trim().to_string() });
            }
            layer.declared = true;
            section = Some(next);
            continue;
        }

        if let Some(title) = line.strip_prefix('#') {
            if name.is_none() {
                name = Some(title.trim().to_string());
            }
            continue;
        }

        match section {
            // Before any header: blank lines are padding, rows are Ground.
            None if line.trim().is_empty() => {}
            None | Some(Section::Ground) => ground.rows.push((line_no, line.to_string())),
            Some(Section::Above) => above.rows.push((line_no, line.to_string())),
        }
    }

    ground.trim_trailing_blank();
    above.trim_trailing_blank();

    let has_ground = ground.declared || !ground.rows.is_empty();
    let cols = ground.width().max(above.width());
    let rows = ground.rows.len().max(above.rows.len()) as u32;
    if cols == 0 || rows == 0 {
        return Err(MapError::Empty);
    }

    let mut spawn: Option<GridPosition> = None;
    let ground_layer = if has_ground {
        let mut layer = TileLayer::new(GROUND_LAYER, cols, rows);
        for (y, (line_no, row)) in ground.rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let tile = match ch {
                    ' ' => None,
                    'P' => {
                        if spawn.is_some() {
                            return Err(MapError::DuplicateSpawn { line: *line_no });
                        }
                        spawn = Some(GridPosition::new(x as i32, y as i32));
                        Some(Tile::Grass)
                    }
                    _ => Some(Tile::from_glyph(ch).ok_or(MapError::UnknownGlyph {
                        line: *line_no,
                        column: x + 1,
                        layer: GROUND_LAYER,
                        glyph: ch,
                    })?),
                };
                layer.set(x as u32, y as u32, tile);
            }
        }
        Some(layer)
    } else {
        None
    };

    let above_layer = if above.declared {
        let mut layer = OverhangLayer::new(ABOVE_LAYER, cols, rows);
        for (y, (line_no, row)) in above.rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let cell = match ch {
                    ' ' | '.' => None,
                    _ => Some(Overhang::from_glyph(ch).ok_or(MapError::UnknownGlyph {
                        line: *line_no,
                        column: x + 1,
                        layer: ABOVE_LAYER,
                        glyph: ch,
                    })?),
                };
                layer.set(x as u32, y as u32, cell);
            }
        }
        Some(layer)
    } else {
        None
    };

    let name = name.unwrap_or_else(|| "Untitled".to_string());
    TileMap::new(&name, ground_layer, above_layer, spawn)
}
