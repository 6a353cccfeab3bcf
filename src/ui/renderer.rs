/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws. The map is a
/// fixed 24x18 grid, so there is no scrolling; each map cell occupies
/// two terminal columns to get roughly square cells.

use std::io::{self, BufWriter, Write};
use std::time::Instant;

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::Direction;
use crate::domain::tile::Tile;
use crate::domain::trap::TrapState;
use crate::sim::scores::ScoreEntry;
use crate::sim::world::{Mode, Outcome, Phase, Session, SessionState, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// On VTE-based Linux terminals (GNOME Terminal, etc.), the inter-row gap
    /// pixels use the background color from the last Clear or the terminal's
    /// configured default.  By using the SAME explicit RGB for both
    /// `Clear(ClearType::All)` and every cell's background, the gap color
    /// matches the cell color exactly, eliminating visible horizontal lines.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: '?',
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg: Self::norm_bg(bg) }
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
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
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

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::new(ch, fg, bg));
            cx += 1;
        }
    }
}

// ── Renderer ──

/// Each map cell = 2 terminal columns, for roughly square cells.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const GREEN: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const RED: Color = Color::Rgb { r: 255, g: 60, b: 60 };
const CYAN: Color = Color::Rgb { r: 100, g: 200, b: 255 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
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
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState, now: Instant) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Detect phase change → clear for clean transition
        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        // Build front buffer
        self.front.clear();

        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::ModeSelect => self.compose_mode_select(world),
            Phase::NameEntry => self.compose_name_entry(world),
            Phase::HighScores => self.compose_high_scores(world),
            Phase::Match => {
                if let Some(session) = &world.session {
                    self.compose_match(session, now);
                }
            }
        }

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Set explicit base colors at start of frame.
        // IMPORTANT: Do NOT use ResetColor here — it resets to the terminal's
        // native default, which may differ from BASE_BG and cause line artifacts.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors only if changed
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Match screen ──

    fn compose_match(&mut self, s: &Session, now: Instant) {
        self.compose_hud(s, now);
        self.compose_map(s);

        match s.state {
            SessionState::Countdown { .. } => {
                if let Some(label) = s.countdown_label(now) {
                    self.compose_center_banner(s, label, GOLD);
                }
            }
            SessionState::Over(outcome) => self.compose_outcome(s, outcome),
            SessionState::Running => {}
        }

        // ── Help bar ──
        let help_row = MAP_ROW + s.map.height as usize + 1;
        let help = match s.mode {
            Mode::Escape => " Arrows/WASD:Move  Shift:Sprint  Space:Trap  ESC:Quit",
            Mode::Hunter => " Arrows/WASD:Move  Shift:Sprint  ESC:Quit",
        };
        self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
    }

    fn compose_hud(&mut self, s: &Session, now: Instant) {
        let buf_w = self.front.width;
        for x in 0..buf_w {
            self.front.set(x, HUD_ROW, Cell::new(' ', Color::White, HUD_BG));
        }

        let remaining = s.remaining(now).as_secs();
        let hud = format!(
            " {}  Score:{:<7}  Time {:02}:{:02} ",
            s.mode.label(),
            s.score,
            remaining / 60,
            remaining % 60,
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // Stamina gauge, 10 segments
        let filled = (s.stamina.ratio() * 10.0).round() as usize;
        let gauge: String = (0..10).map(|i| if i < filled { '█' } else { '░' }).collect();
        let gx = hud.len() + 2;
        self.front.put_str(gx, HUD_ROW, "SP ", Color::White, HUD_BG);
        let sp_color = if filled <= 2 { RED } else { GREEN };
        self.front.put_str(gx + 3, HUD_ROW, &gauge, sp_color, HUD_BG);

        // Trap readiness (Escape only)
        if s.mode == Mode::Escape {
            let tx = gx + 15;
            let ready = s.traps.can_place(now);
            let gauge = if ready {
                "READY".to_string()
            } else {
                let dots = (s.traps.cooldown_ratio(now) * 5.0) as usize;
                (0..5).map(|i| if i < dots { '•' } else { '.' }).collect()
            };
            let label = format!(
                "Traps {}/{} {}",
                s.traps.live_count(),
                s.traps.cap(),
                gauge,
            );
            let color = if ready { GOLD } else { Color::DarkGrey };
            self.front.put_str(tx, HUD_ROW, &label, color, HUD_BG);
        }
    }

    fn compose_map(&mut self, s: &Session) {
        for gy in 0..s.map.height as usize {
            let row = MAP_ROW + gy;
            if row >= self.front.height { break; }
            for gx in 0..s.map.width as usize {
                let col = gx * CELL_W;
                if col + 1 >= self.front.width { break; }
                self.compose_cell(s, gx, gy, col, row);
            }
        }
    }

    /// Write the visual for map cell (gx, gy) into the front buffer at
    /// (col, row). Entities draw over terrain, player over everything.
    fn compose_cell(&mut self, s: &Session, gx: usize, gy: usize, col: usize, row: usize) {
        // Player
        if s.player.pos.col as usize == gx && s.player.pos.row as usize == gy {
            let arrow = match s.player.facing {
                Direction::Up => '▲',
                Direction::Down => '▼',
                Direction::Left => '◄',
                Direction::Right => '►',
            };
            self.front.set(col, row, Cell::new('@', GREEN, Color::Reset));
            self.front.set(col + 1, row, Cell::new(arrow, GREEN, Color::Reset));
            return;
        }

        // Enemies
        for e in &s.enemies {
            if !e.alive { continue; }
            if e.pos.col as usize == gx && e.pos.row as usize == gy {
                let (ch, fg) = match s.mode {
                    Mode::Escape => ('&', RED),
                    Mode::Hunter => ('&', CYAN),
                };
                self.front.set(col, row, Cell::new(ch, fg, Color::Reset));
                self.front.set(col + 1, row, Cell::new(' ', fg, Color::Reset));
                return;
            }
        }

        // Traps: armed marker, or the trigger flash digit
        for t in &s.traps.traps {
            if t.pos.col as usize != gx || t.pos.row as usize != gy {
                continue;
            }
            match t.state {
                TrapState::Active => {
                    self.front.set(col, row, Cell::new('◊', Color::Rgb{r:200,g:80,b:80}, Color::Reset));
                    self.front.set(col + 1, row, Cell::new(' ', Color::White, Color::Reset));
                    return;
                }
                TrapState::Triggering => {
                    let digit = (b'0' + t.anim_sprite()) as char;
                    let bg = Color::Rgb { r: 90, g: 20, b: 20 };
                    self.front.set(col, row, Cell::new('*', GOLD, bg));
                    self.front.set(col + 1, row, Cell::new(digit, GOLD, bg));
                    return;
                }
                TrapState::Removed => {}
            }
        }

        // Terrain
        let (c0, c1, fg, bg) = match s.map.tiles[gy][gx] {
            Tile::Floor => (' ', ' ', Color::Reset, Color::Reset),
            Tile::Wall => ('▓', '▓', Color::Rgb{r:130,g:110,b:160}, Color::Rgb{r:60,g:50,b:85}),
            Tile::Vine => ('♣', '♣', Color::Rgb{r:60,g:180,b:80}, Color::Rgb{r:15,g:45,b:20}),
            Tile::Tunnel => ('∩', '∩', Color::Rgb{r:90,g:160,b:170}, Color::Rgb{r:20,g:40,b:45}),
            Tile::Exit => ('[', ']', GOLD, Color::Rgb{r:60,g:50,b:0}),
        };
        self.front.set(col, row, Cell::new(c0, fg, bg));
        self.front.set(col + 1, row, Cell::new(c1, fg, bg));
    }

    /// Big centered label over the map (countdown digits / GO!).
    fn compose_center_banner(&mut self, s: &Session, label: &str, fg: Color) {
        let map_cols = s.map.width as usize * CELL_W;
        let cy = MAP_ROW + s.map.height as usize / 2;
        let text = format!("  {}  ", label);
        let cx = map_cols.saturating_sub(text.len()) / 2;
        self.front.put_str(cx, cy, &text, fg, Color::Rgb { r: 40, g: 40, b: 10 });
    }

    fn compose_outcome(&mut self, s: &Session, outcome: Outcome) {
        let (headline, color) = match (s.mode, outcome) {
            (_, Outcome::PlayerEscaped) => ("★ ESCAPED! ★", GOLD),
            (_, Outcome::PlayerCaptured) => ("✕ CAPTURED ✕", RED),
            (Mode::Escape, Outcome::TimedOut) => ("✕ TIME UP ✕", RED),
            (Mode::Hunter, Outcome::TimedOut) => ("HUNT OVER", GOLD),
        };

        let map_cols = s.map.width as usize * CELL_W;
        let cy = MAP_ROW + s.map.height as usize / 2;
        let bg = Color::Rgb { r: 25, g: 25, b: 55 };

        let score_line = format!("  Final Score: {}  ", s.score);
        let prompt = "  ENTER: Replay   ESC: Title  ";
        let width = prompt.len().max(score_line.len()).max(headline.len() + 4);
        let cx = map_cols.saturating_sub(width) / 2;

        for (dy, line, fg) in [
            (0usize, headline, color),
            (1, score_line.as_str(), Color::White),
            (2, prompt, GREEN),
        ] {
            let row = cy - 1 + dy;
            for x in cx..cx + width {
                self.front.set(x, row, Cell::new(' ', fg, bg));
            }
            let lx = cx + width.saturating_sub(line.chars().count()) / 2;
            self.front.put_str(lx, row, line, fg, bg);
        }
    }

    // ── Menu screens ──

    fn compose_title(&mut self, _w: &WorldState) {
        let title = [
            r"  __  __                 _                            _ ",
            r" |  \/  | __ _  ____ ___| |__  ___  _   _  _ __   __| |",
            r" | |\/| |/ _` ||_  // _ \ '_ \/ _ \| | | || '_ \ / _` |",
            r" | |  | | (_| | / /|  __/ |_)  (_) | |_| || | | | (_| |",
            r" |_|  |_|\__,_|/___|\___|_.__/\___/ \__,_||_| |_|\__,_|",
        ];

        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, GOLD, Color::Reset);
        }

        let subtitle = "◈◈  Run the maze, or rule it  ◈◈";
        let sx = 2 + (title[1].len().saturating_sub(subtitle.len())) / 2;
        self.front.put_str(sx, 8, subtitle, GREEN, Color::Reset);

        // Menu options
        let menu_base = 11;
        self.front.put_str(8, menu_base,     "ENTER   Play", GREEN, Color::Reset);
        self.front.put_str(8, menu_base + 1, "  H     High Scores", Color::White, Color::Reset);
        self.front.put_str(8, menu_base + 2, "  Q     Quit", Color::White, Color::Reset);

        // Controls reference
        let help = [
            "Controls",
            "  ←→↑↓ / WASD   Move        Shift  Sprint",
            "  Space          Place trap (Escape mode)",
            "  ESC            Back / abort match",
        ];
        let help_base = menu_base + 5;
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { GOLD } else { Color::White };
            self.front.put_str(8, help_base + i, line, color, Color::Reset);
        }
    }

    fn compose_mode_select(&mut self, w: &WorldState) {
        self.front.put_str(4, 2, "SELECT MODE", GOLD, Color::Reset);

        let entries = [
            (Mode::Escape, "ESCAPE  — reach the exit before the hunters reach you"),
            (Mode::Hunter, "HUNTER  — catch the runners before they slip out"),
        ];

        for (i, (_, desc)) in entries.iter().enumerate() {
            let row = 5 + i * 2;
            let selected = w.mode_cursor == i;
            if selected {
                let blink = (w.anim_tick / 5) % 2 == 0;
                let arrow = if blink { "▸" } else { " " };
                let bg = Color::Rgb { r: 30, g: 60, b: 30 };
                for x in 2..70.min(self.front.width) {
                    self.front.set(x, row, Cell::new(' ', Color::White, bg));
                }
                self.front.put_str(2, row, arrow, GREEN, bg);
                self.front.put_str(4, row, desc, GREEN, bg);
            } else {
                self.front.put_str(4, row, desc, Color::White, Color::Reset);
            }
        }

        self.front.put_str(4, 11, "ENTER: Choose   ↑↓: Select   ESC: Back", Color::DarkGrey, Color::Reset);
    }

    fn compose_name_entry(&mut self, w: &WorldState) {
        self.front.put_str(4, 2, "ENTER YOUR NAME", GOLD, Color::Reset);

        let mode_line = format!("Mode: {}", w.selected_mode().label());
        self.front.put_str(4, 4, &mode_line, CYAN, Color::Reset);

        // Input field with a blinking cursor block
        let field_bg = Color::Rgb { r: 35, g: 35, b: 60 };
        for x in 4..24.min(self.front.width) {
            self.front.set(x, 6, Cell::new(' ', Color::White, field_bg));
        }
        self.front.put_str(4, 6, &w.player_name, Color::White, field_bg);
        let blink = (w.anim_tick / 5) % 2 == 0;
        if blink && 4 + w.player_name.chars().count() < 24 {
            self.front.set(
                4 + w.player_name.chars().count(),
                6,
                Cell::new('_', GREEN, field_bg),
            );
        }

        self.front.put_str(4, 9, "ENTER: Start   ESC: Back", Color::DarkGrey, Color::Reset);
    }

    fn compose_high_scores(&mut self, w: &WorldState) {
        self.front.put_str(4, 1, "HIGH SCORES", GOLD, Color::Reset);

        let boards: [(&str, &[ScoreEntry], usize); 2] = [
            ("ESCAPE", &w.scores_escape, 4),
            ("HUNTER", &w.scores_hunter, 36),
        ];

        for (label, entries, x) in boards {
            self.front.put_str(x, 3, label, CYAN, Color::Reset);
            if entries.is_empty() {
                self.front.put_str(x, 5, "(no scores yet)", Color::DarkGrey, Color::Reset);
                continue;
            }
            for (i, e) in entries.iter().enumerate() {
                let line = format!("{:>2}. {:>6}  {}", i + 1, e.score, e.name);
                let fg = if i == 0 { GOLD } else { Color::White };
                self.front.put_str(x, 5 + i, &line, fg, Color::Reset);
            }
        }

        self.front.put_str(4, 13, "ESC: Back", Color::DarkGrey, Color::Reset);
    }
}
