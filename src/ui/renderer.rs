/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into `front` (a grid of Cell)
///   2. Compare each cell with `back` (the previous frame)
///   3. Emit terminal commands only for cells that changed, batched with
///      `queue!` and flushed once
///   4. Swap front/back
///
/// World → terminal: one tile is 2 columns × 1 row, so a column covers
/// half a tile horizontally and a row a whole tile vertically. Each cell
/// samples the world at its centre through the camera scroll.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use tracing::info;

use crate::domain::tile::{Overhang, Tile};
use crate::sim::camera::Bounds;
use crate::sim::map::PixelSize;
use crate::sim::prompt::FeedbackKind;
use crate::sim::scene::Overworld;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Same RGB for Clear and every empty cell, so row gaps match.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from every real cell; forces a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    const fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Tile visuals ──

/// Glyphs for the left and right column of a tile.
fn tile_cells(tile: Option<Tile>) -> [Cell; 2] {
    let grass = Color::Rgb { r: 52, g: 120, b: 58 };
    match tile {
        None => [Cell::BLANK; 2],
        Some(Tile::Grass) => {
            let fg = Color::Rgb { r: 90, g: 165, b: 80 };
            [Cell::new('"', fg, grass), Cell::new(' ', fg, grass)]
        }
        Some(Tile::Path) => {
            let bg = Color::Rgb { r: 150, g: 118, b: 78 };
            let fg = Color::Rgb { r: 120, g: 92, b: 60 };
            [Cell::new('·', fg, bg), Cell::new(' ', fg, bg)]
        }
        Some(Tile::Sand) => {
            let bg = Color::Rgb { r: 214, g: 196, b: 140 };
            let fg = Color::Rgb { r: 184, g: 164, b: 110 };
            [Cell::new(' ', fg, bg), Cell::new('∙', fg, bg)]
        }
        Some(Tile::Flowers) => {
            let fg = Color::Rgb { r: 235, g: 110, b: 150 };
            [Cell::new('✿', fg, grass), Cell::new(' ', fg, grass)]
        }
        Some(Tile::Water) => {
            let bg = Color::Rgb { r: 36, g: 78, b: 160 };
            let fg = Color::Rgb { r: 120, g: 170, b: 235 };
            [Cell::new('≈', fg, bg), Cell::new('≈', fg, bg)]
        }
    }
}

fn overhang_cell(o: Overhang) -> Cell {
    match o {
        Overhang::Canopy => Cell::new('♣', Color::Rgb { r: 30, g: 90, b: 40 }, Color::Rgb { r: 24, g: 70, b: 32 }),
        Overhang::Roof => Cell::new('▲', Color::Rgb { r: 200, g: 90, b: 70 }, Color::Rgb { r: 140, g: 50, b: 40 }),
    }
}

/// Horizontal world units per terminal column, vertical per row.
const COL_UNITS: f32 = 0.5; // in tiles
const ROW_UNITS: f32 = 1.0;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

/// Compose one full game frame into `buf`.
fn compose(buf: &mut FrameBuffer, scene: &Overworld, viewport: PixelSize) {
    let tile = scene.tile_size() as f32;
    let col_px = tile * COL_UNITS;
    let row_px = tile * ROW_UNITS;
    let view_cols = (viewport.width as f32 / col_px).ceil() as usize;
    let view_rows = (viewport.height as f32 / row_px).ceil() as usize;
    let left = buf.width.saturating_sub(view_cols) / 2;

    let scroll = scene.camera().map(|c| c.scroll()).unwrap_or_default();
    let map = scene.map();
    let world = scene.camera()
        .map(|c| c.bounds())
        .unwrap_or_else(|| Bounds::of(map.pixel_size(scene.tile_size())));
    let depths = scene.depths();

    // ── HUD ──
    let hud_bg = Color::Rgb { r: 20, g: 20, b: 60 };
    let g = scene.player_grid();
    let mode = scene.camera().map(|c| c.mode().name()).unwrap_or("-");
    let hud = format!(
        " {}  ({:>2},{:>2})  {:<12} {:<8} cam:{}  music:{} ",
        map.name, g.col, g.row, scene.sprite().name(), scene.press_state().name(), mode,
        if scene.prompt().music_on() { "on" } else { "off" }
    );
    buf.fill_row(HUD_ROW, hud_bg);
    buf.put_str(0, HUD_ROW, &hud, Color::White, hud_bg);

    // ── Ground (depth 0) ──
    let cell_origin = |vx: usize, vy: usize| {
        (scroll.x + (vx as f32 + 0.5) * col_px, scroll.y + (vy as f32 + 0.5) * row_px)
    };
    for vy in 0..view_rows {
        for vx in 0..view_cols {
            let (wx, wy) = cell_origin(vx, vy);
            let (c, r) = ((wx / tile).floor() as i32, (wy / tile).floor() as i32);
            let cell = if world.contains(wx, wy) {
                let half = usize::from(wx - c as f32 * tile >= tile / 2.0);
                tile_cells(map.tile_at(c, r))[half]
            } else {
                Cell::BLANK
            };
            buf.set(left + vx, MAP_ROW + vy, cell);
        }
    }

    // ── Player (depth 5) ──
    // First cell whose sample point lies inside the sprite box.
    let p = scene.player_position();
    let px = ((p.x - tile / 2.0 - scroll.x) / col_px - 0.5).ceil() as i32;
    let py = ((p.y - tile / 2.0 - scroll.y) / row_px - 0.5).ceil() as i32;
    let glyphs = scene.sprite().glyphs();
    for (i, ch) in glyphs.iter().enumerate() {
        let vx = px + i as i32;
        if vx >= 0 && py >= 0 && (vx as usize) < view_cols && (py as usize) < view_rows {
            let (x, y) = (left + vx as usize, MAP_ROW + py as usize);
            let under = buf.get(x, y);
            buf.set(x, y, Cell::new(*ch, Color::Rgb { r: 250, g: 240, b: 120 }, under.bg));
        }
    }

    // ── Above (depth 10) ──
    if depths.above.is_some() {
        for vy in 0..view_rows {
            for vx in 0..view_cols {
                let (wx, wy) = cell_origin(vx, vy);
                let (c, r) = ((wx / tile).floor() as i32, (wy / tile).floor() as i32);
                if let Some(o) = map.overhang_at(c, r) {
                    buf.set(left + vx, MAP_ROW + vy, overhang_cell(o));
                }
            }
        }
    }

    // ── Message bar: feedback wins over the hint ──
    let msg_row = MAP_ROW + view_rows + 1;
    let prompt = scene.prompt();
    if let Some(fb) = prompt.feedback() {
        let fg = match fb.kind {
            FeedbackKind::Interacted => Color::Rgb { r: 255, g: 255, b: 0 },
            FeedbackKind::Music => Color::Rgb { r: 0, g: 255, b: 0 },
        };
        buf.put_str(left, msg_row, &format!(" {} ", fb.text), fg, Color::Black);
    } else if let Some(hint) = prompt.hint() {
        buf.put_str(left, msg_row, &format!(" {hint} "), Color::White, Color::Black);
    }

    let help = " Arrows/WASD:move  Z:interact  M:music  Esc/Q:quit";
    buf.put_str(0, msg_row + 2, help, Color::DarkGrey, Cell::BASE_BG);
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    viewport: PixelSize,
    keyboard_enhanced: bool,
}

impl Renderer {
    pub fn new(viewport: PixelSize) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            viewport,
            keyboard_enhanced: false,
        }
    }

    /// True when the terminal reports key releases.
    pub fn keyboard_enhanced(&self) -> bool {
        self.keyboard_enhanced
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.keyboard_enhanced = true;
        }
        info!(enhanced = self.keyboard_enhanced, "keyboard release reporting");
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.front.resize(tw as usize, th as usize);
        self.back.resize(tw as usize, th as usize);
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.keyboard_enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
            self.keyboard_enhanced = false;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, scene: &Overworld) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.front.width || th as usize != self.front.height {
            self.front.resize(tw as usize, th as usize);
            self.back.resize(tw as usize, th as usize);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        compose(&mut self.front, scene, self.viewport);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        // Cursor position after the last Print, if known.
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors; ResetColor would fall back to the
        // terminal's own default and leave seams.
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MovementConfig;
    use crate::domain::direction::HeldDirections;
    use crate::sim::map::TileMap;

    fn row_text(buf: &FrameBuffer, y: usize) -> String {
        (0..buf.width).map(|x| buf.get(x, y).ch).collect()
    }

    fn scene(text: &str) -> Overworld {
        let map = TileMap::parse(text).expect("valid map");
        let mut s = Overworld::new(map, &MovementConfig::default());
        s.initialize(PixelSize::new(240, 160));
        s
    }

    #[test]
    fn player_drawn_at_spawn_with_sprite_glyphs() {
        let s = scene("# Box\n[Ground]\n~~~\n~P~\n~~~\n");
        let mut buf = FrameBuffer::new(40, 16);
        compose(&mut buf, &s, PixelSize::new(240, 160));

        let [body, arrow] = s.sprite().glyphs();
        let found = (MAP_ROW..MAP_ROW + 10).any(|y| row_text(&buf, y).contains(&format!("{body}{arrow}")));
        assert!(found, "player glyphs on screen");
        assert!(row_text(&buf, HUD_ROW).contains("down-idle"));
        assert!(row_text(&buf, HUD_ROW).contains("Box"));
    }

    #[test]
    fn above_layer_hides_player() {
        let s = scene("# Grove\n[Ground]\n...\n.P.\n...\n[Above]\n\n.T.\n");
        let mut buf = FrameBuffer::new(40, 16);
        compose(&mut buf, &s, PixelSize::new(240, 160));
        let [body, _] = s.sprite().glyphs();
        let screen: String = (0..buf.height).map(|y| row_text(&buf, y)).collect();
        assert!(!screen.contains(body));
        assert!(screen.contains('♣'));
    }

    #[test]
    fn feedback_replaces_hint_in_message_bar() {
        let mut s = scene("# Pond\n[Ground]\n...\n.P.\n.~.\n");
        s.update(0, HeldDirections::NONE);
        let mut buf = FrameBuffer::new(40, 16);
        compose(&mut buf, &s, PixelSize::new(240, 160));
        let screen: String = (0..buf.height).map(|y| row_text(&buf, y)).collect();
        assert!(screen.contains("Press Z to interact"));

        s.interact(0);
        buf.clear();
        compose(&mut buf, &s, PixelSize::new(240, 160));
        let screen: String = (0..buf.height).map(|y| row_text(&buf, y)).collect();
        assert!(screen.contains("Interacted!"));
        assert!(!screen.contains("Press Z"));
    }

    #[test]
    fn cells_outside_world_bounds_stay_blank() {
        let s = scene("# Box\n[Ground]\n~~~\n~P~\n~~~\n");
        let mut buf = FrameBuffer::new(40, 16);
        compose(&mut buf, &s, PixelSize::new(240, 160));

        // 3×3 tiles, two columns per tile.
        let painted = (MAP_ROW..MAP_ROW + 10)
            .flat_map(|y| (0..buf.width).map(move |x| (x, y)))
            .filter(|&(x, y)| buf.get(x, y).bg != Cell::BASE_BG)
            .count();
        assert_eq!(painted, 18);
        assert_eq!(buf.get(0, MAP_ROW), Cell::BLANK);
    }

    #[test]
    fn hud_shows_music_state() {
        let mut s = scene("# Box\n[Ground]\n...\n.P.\n...\n");
        let mut buf = FrameBuffer::new(80, 16);
        compose(&mut buf, &s, PixelSize::new(240, 160));
        assert!(row_text(&buf, HUD_ROW).contains("music:off"));

        s.toggle_music(0);
        buf.clear();
        compose(&mut buf, &s, PixelSize::new(240, 160));
        assert!(row_text(&buf, HUD_ROW).contains("music:on"));
    }
}
