/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. `draw_world` / `draw_player` / `draw_interact_bracket` (the render
///      contract) build the map into the `front` buffer
///   2. `present` adds HUD, footer and the mode panel on top
///   3. Compare each cell with `back` buffer (previous frame) and only
///      emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// One tile is two terminal columns. The camera works in world pixels;
/// the map area shows whole tiles starting at the tile under the camera.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::geom::{tile_of, Vec2};
use crate::domain::player::{Facing, Player};
use crate::domain::tile::{Direction, TileCategory};
use crate::sim::clock::format_clock;
use crate::sim::game::{Game, Mode, RenderTarget};
use crate::sim::zone::DecorKind;

const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb { r, g, b }
}

const HUD_BG: Color = rgb(20, 20, 60);
const STATUS_BG: Color = rgb(200, 60, 160);
const PANEL_BG: Color = rgb(28, 24, 44);
const PANEL_EDGE: Color = rgb(90, 220, 230);
const TEXT: Color = rgb(220, 220, 235);
const DIM: Color = rgb(120, 120, 140);
const ACCENT: Color = rgb(255, 110, 200);

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// gap between rows matches the cells on VTE terminals.
    const BASE_BG: Color = rgb(14, 12, 24);

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Cell::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

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

    /// Replace the background of an existing cell.
    fn tint(&mut self, x: usize, y: usize, bg: Color) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x].bg = bg;
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column; clipped at the edge.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Layout ──

/// Each tile = 2 terminal columns.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// Gap, status, hint, help.
const FOOTER_ROWS: usize = 4;

/// Map-area size in tiles for a terminal size.
fn view_tiles(term_w: usize, term_h: usize) -> (usize, usize) {
    let cols = (term_w / CELL_W).max(1);
    let rows = term_h.saturating_sub(MAP_ROW + FOOTER_ROWS).max(1);
    (cols, rows)
}

/// Which tiles the map area shows this frame.
#[derive(Clone, Copy, Debug)]
struct MapView {
    first_tx: i32,
    first_ty: i32,
    cols: usize,
    rows: usize,
    tile_size: f32,
}

impl MapView {
    fn new(cam_x: f32, cam_y: f32, cols: usize, rows: usize, tile_size: f32) -> Self {
        MapView {
            first_tx: (cam_x / tile_size).floor() as i32,
            first_ty: (cam_y / tile_size).floor() as i32,
            cols,
            rows,
            tile_size,
        }
    }

    /// Terminal (column, row) of a tile's left cell, if on screen.
    fn cell_of_tile(&self, tx: i32, ty: i32) -> Option<(usize, usize)> {
        let vx = tx - self.first_tx;
        let vy = ty - self.first_ty;
        if vx < 0 || vy < 0 || vx as usize >= self.cols || vy as usize >= self.rows {
            return None;
        }
        Some((vx as usize * CELL_W, MAP_ROW + vy as usize))
    }

    fn cell_of(&self, p: Vec2) -> Option<(usize, usize)> {
        let (tx, ty) = tile_of(p, self.tile_size);
        self.cell_of_tile(tx, ty)
    }
}

/// Glyph pair and colors for a tile. Exhaustive over `TileCategory`.
fn tile_glyph(category: TileCategory, now_ms: u64) -> (char, char, Color, Color) {
    let blink = (now_ms / 500) % 2 == 0;
    match category {
        TileCategory::Ground => (' ', ' ', DIM, rgb(26, 24, 38)),
        TileCategory::Road => ('·', ' ', rgb(70, 70, 90), rgb(34, 34, 48)),
        TileCategory::Liquid => ('~', ' ', rgb(110, 150, 230), rgb(28, 36, 66)),
        TileCategory::DeepLiquid => ('≈', '≈', rgb(60, 140, 220), rgb(10, 26, 58)),
        TileCategory::Building => ('█', '█', rgb(52, 50, 72), rgb(40, 38, 56)),
        TileCategory::Neon => {
            let pulse = 0.8 + 0.2 * ((now_ms as f32) * 0.003).sin();
            let fg = rgb((255.0 * pulse) as u8, (60.0 * pulse) as u8, (210.0 * pulse) as u8);
            ('▓', '▓', fg, rgb(48, 10, 58))
        }
        TileCategory::Barrier => ('#', '#', rgb(130, 120, 96), rgb(36, 32, 30)),
        TileCategory::Portal(dir) => {
            let arrow = match dir {
                Direction::North => '▲',
                Direction::East => '▶',
                Direction::South => '▼',
                Direction::West => '◀',
            };
            let fg = if blink { rgb(90, 255, 200) } else { rgb(40, 160, 130) };
            (arrow, ' ', fg, rgb(16, 44, 44))
        }
    }
}

fn decor_glyph(kind: DecorKind) -> (char, Color) {
    match kind {
        DecorKind::Lamp => ('¡', rgb(255, 220, 120)),
        DecorKind::Litter => (',', rgb(110, 100, 90)),
        DecorKind::Crate => ('▣', rgb(150, 110, 70)),
        DecorKind::Sign => ('▤', ACCENT),
    }
}

/// Greedy word wrap. Hard line breaks in `text` are kept.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for line in text.split('\n') {
        let mut cur = String::new();
        for word in line.split_whitespace() {
            let needed = if cur.is_empty() { word.chars().count() } else { cur.chars().count() + 1 + word.chars().count() };
            if needed > width && !cur.is_empty() {
                out.push(std::mem::take(&mut cur));
            }
            if !cur.is_empty() {
                cur.push(' ');
            }
            cur.push_str(word);
        }
        out.push(cur);
    }
    out
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    view: MapView,
    last_mode: Option<Mode>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            view: MapView::new(0.0, 0.0, 1, 1, 1.0),
            last_mode: None,
        }
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

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    /// Pick up terminal resizes and tell the game how much world fits.
    /// Call once per frame before `Game::draw`.
    pub fn sync_viewport(&mut self, game: &mut Game) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }
        let (cols, rows) = view_tiles(self.term_w, self.term_h);
        let ts = game.world().tile_size;
        game.set_viewport(cols as f32 * ts, rows as f32 * ts);
        Ok(())
    }

    /// Compose HUD, footer and the mode panel, then write the frame.
    pub fn present(&mut self, now_ms: u64, game: &Game) -> io::Result<()> {
        // Mode change → clean repaint
        if self.last_mode != Some(game.mode()) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_mode = Some(game.mode());
        }

        self.compose_hud(game);
        match game.mode() {
            Mode::Run => {}
            Mode::Start => self.compose_start(now_ms),
            Mode::Pause => self.compose_pause(now_ms),
            Mode::Dialog => self.compose_dialog(game),
            Mode::Inventory => self.compose_inventory(game),
        }
        self.compose_footer(game);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors, never ResetColor: the terminal default may
        // differ from BASE_BG.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

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

    // ── Compose: map ──

    fn compose_map(&mut self, now_ms: u64, game: &Game) {
        let world = game.world();
        let zone = &world.zone;
        let cam = game.camera();
        let (cols, rows) = view_tiles(self.term_w, self.term_h);
        self.view = MapView::new(cam.x, cam.y, cols, rows, world.tile_size);

        for vy in 0..rows {
            let ty = self.view.first_ty + vy as i32;
            for vx in 0..cols {
                let tx = self.view.first_tx + vx as i32;
                let col = vx * CELL_W;
                let row = MAP_ROW + vy;
                if tx < 0 || ty < 0 || tx >= zone.width || ty >= zone.height {
                    // void outside the zone
                    continue;
                }
                let (c0, c1, fg, bg) = tile_glyph(zone.tile_at(tx, ty).category(), now_ms);
                self.front.set(col, row, Cell::new(c0, fg, bg));
                self.front.set(col + 1, row, Cell::new(c1, fg, bg));
            }
        }

        for d in &zone.decorations {
            if let Some((col, row)) = self.view.cell_of_tile(d.tx, d.ty) {
                let (ch, fg) = decor_glyph(d.kind);
                let bg = self.front.get(col, row).bg;
                self.front.set(col, row, Cell::new(ch, fg, bg));
            }
        }

        for obj in &zone.interactables {
            if let Some((col, row)) = self.view.cell_of_tile(obj.tx, obj.ty) {
                let held = obj.memory.as_ref().map_or(true, |m| game.memories().contains(&m.id));
                let fg = if held { DIM } else { PANEL_EDGE };
                let bg = self.front.get(col, row).bg;
                self.front.set(col, row, Cell::new('◆', fg, bg));
                self.front.set(col + 1, row, Cell::new(' ', fg, bg));
            }
        }
    }

    // ── Compose: HUD / footer ──

    fn compose_hud(&mut self, game: &Game) {
        let hud = game.hud();
        let line = format!(
            " {}  ·  memories {}/{}  ·  {} ",
            hud.zone_label,
            hud.memory_count,
            hud.memory_total,
            format_clock(hud.clock_minutes),
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &line, TEXT, HUD_BG);
    }

    fn compose_footer(&mut self, game: &Game) {
        let (_, rows) = view_tiles(self.term_w, self.term_h);
        let status_row = MAP_ROW + rows + 1;

        if !game.status().is_empty() {
            self.front.fill_row(status_row, STATUS_BG);
            self.front.put_str(0, status_row, &format!(" ◈ {} ", game.status()), Color::Black, STATUS_BG);
        }
        if game.mode() == Mode::Run {
            self.front.put_str(1, status_row + 1, game.hint(), DIM, Color::Reset);
        }
        let help = " ←→↑↓/WASD move · P pause · M mute · Q menu · Ctrl+C quit";
        self.front.put_str(0, status_row + 2, help, Color::DarkGrey, Color::Reset);
    }

    // ── Compose: panels ──

    /// Boxed panel centered in the map area. Returns its inner origin.
    fn panel(&mut self, w: usize, h: usize, title: &str) -> (usize, usize) {
        let (cols, rows) = view_tiles(self.term_w, self.term_h);
        let area_w = cols * CELL_W;
        let w = w.min(area_w).max(4);
        let h = h.min(rows).max(3);
        let x0 = area_w.saturating_sub(w) / 2;
        let y0 = MAP_ROW + rows.saturating_sub(h) / 2;

        for y in y0..y0 + h {
            for x in x0..x0 + w {
                let top = y == y0;
                let bottom = y == y0 + h - 1;
                let left = x == x0;
                let right = x == x0 + w - 1;
                let ch = match (top, bottom, left, right) {
                    (true, _, true, _) => '┌',
                    (true, _, _, true) => '┐',
                    (_, true, true, _) => '└',
                    (_, true, _, true) => '┘',
                    (true, _, _, _) | (_, true, _, _) => '─',
                    (_, _, true, _) | (_, _, _, true) => '│',
                    _ => ' ',
                };
                self.front.set(x, y, Cell::new(ch, PANEL_EDGE, PANEL_BG));
            }
        }
        if !title.is_empty() {
            self.front.put_str(x0 + 2, y0, &format!(" {title} "), ACCENT, PANEL_BG);
        }
        (x0 + 2, y0 + 1)
    }

    fn compose_start(&mut self, now_ms: u64) {
        let (x, y) = self.panel(44, 11, "");
        let glow = if (now_ms / 600) % 2 == 0 { ACCENT } else { PANEL_EDGE };
        self.front.put_str(x + 11, y + 1, "n e o n w a l k", glow, PANEL_BG);
        self.front.put_str(x + 5, y + 3, "a quiet night walk through the city", DIM, PANEL_BG);
        self.front.put_str(x + 2, y + 5, "ENTER   start", TEXT, PANEL_BG);
        self.front.put_str(x + 2, y + 6, "  M     mute", TEXT, PANEL_BG);
        self.front.put_str(x + 2, y + 7, "  Q     quit", TEXT, PANEL_BG);
    }

    fn compose_pause(&mut self, now_ms: u64) {
        let (x, y) = self.panel(32, 9, "");
        let label = if (now_ms / 500) % 2 == 0 { "▶  paused  ◀" } else { "   paused   " };
        self.front.put_str(x + 8, y, label, ACCENT, PANEL_BG);
        self.front.put_str(x + 2, y + 2, "P / ESC  resume", TEXT, PANEL_BG);
        self.front.put_str(x + 2, y + 3, "R        restart", TEXT, PANEL_BG);
        self.front.put_str(x + 2, y + 4, "Q        menu", TEXT, PANEL_BG);
        self.front.put_str(x + 2, y + 5, "M        mute", TEXT, PANEL_BG);
    }

    fn compose_dialog(&mut self, game: &Game) {
        let dialog = game.dialog();
        let (page, count) = dialog.progress();
        let inner_w = 52;
        let lines = wrap(dialog.current_page().unwrap_or(""), inner_w - 4);
        let (x, y) = self.panel(inner_w, lines.len() + 5, dialog.title());
        for (i, line) in lines.iter().enumerate() {
            self.front.put_str(x, y + 1 + i, line, TEXT, PANEL_BG);
        }
        let more = if page < count { "ENTER next" } else { "ENTER close" };
        let footer = format!("{page}/{count}  ·  {more}  ·  ESC close");
        self.front.put_str(x, y + lines.len() + 2, &footer, DIM, PANEL_BG);
    }

    fn compose_inventory(&mut self, game: &Game) {
        let inv = game.inventory();
        let items = inv.items();
        let inner_w = 52;
        let detail = inv.selected().map(|m| wrap(&m.text, inner_w - 4)).unwrap_or_default();
        let list_h = items.len().max(1);
        let title = format!("memories {}", items.len());
        let (x, y) = self.panel(inner_w, list_h + detail.len() + 6, &title);

        if items.is_empty() {
            self.front.put_str(x, y + 1, "nothing yet. interact with things.", DIM, PANEL_BG);
        }
        for (i, m) in items.iter().enumerate() {
            let selected = i == inv.cursor();
            let (mark, fg) = if selected { ('▸', ACCENT) } else { (' ', TEXT) };
            self.front.put_str(x, y + 1 + i, &format!("{mark} {}", m.title), fg, PANEL_BG);
        }
        let dy = y + 2 + list_h;
        for (i, line) in detail.iter().enumerate() {
            self.front.put_str(x, dy + i, line, DIM, PANEL_BG);
        }
        self.front.put_str(x, dy + detail.len() + 1, "↑↓ browse  ·  I / ESC close", DIM, PANEL_BG);
    }
}

// ── Render contract ──

impl RenderTarget for Renderer {
    type Error = io::Error;

    fn draw_world(&mut self, now_ms: u64, game: &Game) -> io::Result<()> {
        self.front.clear();
        self.compose_map(now_ms, game);
        Ok(())
    }

    fn draw_player(&mut self, player: &Player, _now_ms: u64, glow: f32) -> io::Result<()> {
        let Some((col, row)) = self.view.cell_of(player.pos) else {
            return Ok(());
        };
        let fg = rgb((255.0 * glow) as u8, (120.0 * glow) as u8, (230.0 * glow) as u8);
        let bg = self.front.get(col, row).bg;
        let (c0, c1) = match player.facing {
            Facing::Right => ('@', '›'),
            Facing::Left => ('‹', '@'),
        };
        self.front.set(col, row, Cell::new(c0, fg, bg));
        self.front.set(col + 1, row, Cell::new(c1, fg, bg));
        Ok(())
    }

    fn draw_interact_bracket(&mut self, x: f32, y: f32, now_ms: u64) -> io::Result<()> {
        if let Some((col, row)) = self.view.cell_of(Vec2::new(x, y)) {
            let bg = if (now_ms / 350) % 2 == 0 { rgb(120, 100, 20) } else { rgb(80, 66, 14) };
            self.front.tint(col, row, bg);
            self.front.tint(col + 1, row, bg);
        }
        Ok(())
    }
}
