/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into the `front` buffer (grid of Cell)
///   2. Compare each cell with `back` (previous frame)
///   3. Emit terminal commands only for cells that changed, batched with `queue!`
///   4. Swap front/back
///
/// The 800×600 logical canvas is scaled onto whatever terminal area sits
/// between the HUD row and the footer row.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::app::{medal, short_address, App, Medal, PaymentFlow, View};
use crate::domain::entity::Mode;
use crate::domain::physics::Rect;
use crate::domain::rules;
use crate::sim::scene::GameScene;

// ── Palette ──

const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };
const SKY: Color = Color::Rgb { r: 78, g: 192, b: 202 };
const CLOUD: Color = Color::Rgb { r: 220, g: 240, b: 240 };
const PIPE: Color = Color::Rgb { r: 94, g: 186, b: 52 };
const PIPE_EDGE: Color = Color::Rgb { r: 56, g: 120, b: 30 };
const GROUND: Color = Color::Rgb { r: 222, g: 216, b: 149 };
const GROUND_STRIPE: Color = Color::Rgb { r: 186, g: 176, b: 100 };
const BIRD: Color = Color::Rgb { r: 250, g: 200, b: 40 };
const BIRD_HIT: Color = Color::Rgb { r: 235, g: 60, b: 60 };
const TITLE: Color = Color::Rgb { r: 0, g: 82, b: 255 };
const ACCENT: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const KEY: Color = Color::Rgb { r: 100, g: 200, b: 255 };
const DIM: Color = Color::Rgb { r: 120, g: 120, b: 140 };
const PANEL: Color = Color::Rgb { r: 40, g: 40, b: 60 };
const NOTICE_BG: Color = Color::Rgb { r: 150, g: 30, b: 30 };

// ── Cell / FrameBuffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: BASE_BG };

    /// Differs from every real cell, so the next diff repaints everything.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
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

    /// Background colour already at (x, y), so text can sit on top of a scene.
    fn bg_at(&self, x: usize, y: usize) -> Color {
        self.get(x, y).bg
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Centered text; `None` background keeps whatever is underneath.
    fn put_center(&mut self, y: usize, s: &str, fg: Color, bg: Option<Color>) {
        let len = s.chars().count();
        let x0 = self.width.saturating_sub(len) / 2;
        for (i, ch) in s.chars().enumerate() {
            let x = x0 + i;
            let bg = bg.unwrap_or_else(|| self.bg_at(x, y));
            self.set(x, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, cell: Cell) {
        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                self.set(x, y, cell);
            }
        }
    }
}

// ── Viewport: logical canvas → terminal cells ──

const HUD_ROW: usize = 0;
const CANVAS_ROW: usize = 1;
const FOOTER_ROWS: usize = 1;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Viewport {
    col0: usize,
    row0: usize,
    cols: usize,
    rows: usize,
    sx: f32,
    sy: f32,
}

impl Viewport {
    fn fit(term_w: usize, term_h: usize, canvas_w: f32, canvas_h: f32) -> Self {
        let cols = term_w.max(1);
        let rows = term_h.saturating_sub(CANVAS_ROW + FOOTER_ROWS).max(1);
        Viewport {
            col0: 0,
            row0: CANVAS_ROW,
            cols,
            rows,
            sx: cols as f32 / canvas_w.max(1.0),
            sy: rows as f32 / canvas_h.max(1.0),
        }
    }

    /// Terminal cell span `[c0, c1) × [r0, r1)` covered by a logical rect.
    fn cells(&self, r: &Rect) -> (usize, usize, usize, usize) {
        let clamp_c = |v: f32| (v.max(0.0) as usize).min(self.cols);
        let clamp_r = |v: f32| (v.max(0.0) as usize).min(self.rows);
        let c0 = clamp_c((r.left() * self.sx).round());
        let c1 = clamp_c((r.right() * self.sx).round()).max(c0 + 1).min(self.cols);
        let r0 = clamp_r((r.top() * self.sy).round());
        let r1 = clamp_r((r.bottom() * self.sy).round()).max(r0 + 1).min(self.rows);
        (self.col0 + c0, self.col0 + c1, self.row0 + r0, self.row0 + r1)
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_view: Option<View>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_view: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, app: &App) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let resized = tw as usize != self.term_w || th as usize != self.term_h;
        if resized {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
        }
        if resized || self.last_view != Some(app.view) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
            self.last_view = Some(app.view);
        }

        self.front.clear();
        compose(&mut self.front, app);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

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

// ══════════════════════════════════════════════════════════════
// Composition (pure: App → FrameBuffer)
// ══════════════════════════════════════════════════════════════

fn compose(buf: &mut FrameBuffer, app: &App) {
    match app.view {
        View::Menu => compose_menu(buf, app),
        View::Playing => compose_playing(buf, app),
        View::GameOver => {
            compose_playing(buf, app);
            compose_game_over(buf, app);
        }
        View::Leaderboard => compose_leaderboard(buf, app),
        View::Paying => compose_paying(buf, app),
    }
    compose_footer(buf, app);
}

fn wallet_line(app: &App) -> String {
    match &app.session.wallet_address {
        Some(addr) => format!("Wallet {}", short_address(addr)),
        None if app.connecting => "Connecting wallet...".to_string(),
        None => "Wallet not connected".to_string(),
    }
}

fn compose_menu(buf: &mut FrameBuffer, app: &App) {
    buf.put_center(1, "F L A P P Y   B A S E", TITLE, None);
    buf.put_center(2, &wallet_line(app), DIM, None);

    let stats = &app.stats;
    let rows = [
        ("POOL", stats.pool_label.clone()),
        ("SPOTS FILLED", stats.spots_label()),
        ("PLAYERS", stats.players_label()),
        ("ENTRY FEE", app.settings.entry_fee_label.clone()),
        ("BEST", app.best_score.to_string()),
    ];
    let x = buf.width.saturating_sub(32) / 2;
    for (i, (label, value)) in rows.iter().enumerate() {
        buf.put_str(x, 4 + i, label, DIM, BASE_BG);
        buf.put_str(x + 16, 4 + i, value, Color::White, BASE_BG);
    }

    let status = match app.payment() {
        PaymentFlow::Checking => Some("Checking payment status..."),
        _ => None,
    };
    if let Some(s) = status {
        buf.put_center(10, s, ACCENT, None);
    }

    let wallet_key = if app.session.is_connected() { "W  Disconnect wallet" } else { "W  Connect wallet" };
    let keys = [
        "P  Practice",
        "C  Compete",
        wallet_key,
        "L  Leaderboard",
        "Q  Quit",
    ];
    for (i, k) in keys.iter().enumerate() {
        buf.put_str(x, 12 + i, k, KEY, BASE_BG);
    }
}

fn compose_playing(buf: &mut FrameBuffer, app: &App) {
    let Some(scene) = app.scene.as_ref() else { return };
    let vp = Viewport::fit(buf.width, buf.height, scene.physics.canvas_width, scene.physics.canvas_height);

    compose_sky(buf, &vp, scene);
    compose_pipes(buf, &vp, scene);
    compose_ground(buf, &vp, scene);
    compose_bird(buf, &vp, scene);

    let hud = format!(
        " {}   SCORE {}   BEST {}",
        scene.ctx.mode.label(),
        scene.score,
        app.best_score.max(scene.score)
    );
    buf.put_str(0, HUD_ROW, &hud, Color::White, PANEL);
    buf.fill(hud.chars().count(), HUD_ROW, buf.width, HUD_ROW + 1, Cell::new(' ', Color::White, PANEL));
}

fn compose_sky(buf: &mut FrameBuffer, vp: &Viewport, scene: &GameScene) {
    let sky = Cell::new(' ', Color::White, SKY);
    buf.fill(vp.col0, vp.row0, vp.col0 + vp.cols, vp.row0 + vp.rows, sky);

    // Clouds repeat every 200 logical px and drift with the background offset.
    let period = 200.0;
    let w = scene.physics.canvas_width;
    let mut x = -(scene.bg_offset % period);
    while x < w {
        for (dy, dx, len) in [(80.0, 20.0, 50.0), (150.0, 110.0, 70.0)] {
            let r = Rect::new(x + dx, dy, len, 12.0);
            let (c0, c1, r0, _) = vp.cells(&r);
            buf.fill(c0, r0, c1, r0 + 1, Cell::new(' ', Color::White, CLOUD));
        }
        x += period;
    }
}

fn compose_pipes(buf: &mut FrameBuffer, vp: &Viewport, scene: &GameScene) {
    for pair in &scene.pipes {
        let (top, bottom) = rules::pipe_rects(pair, &scene.physics);
        for (rect, lip_row_at_end) in [(top, true), (bottom, false)] {
            if rect.is_empty() { continue; }
            let (c0, c1, r0, r1) = vp.cells(&rect);
            buf.fill(c0, r0, c1, r1, Cell::new(' ', Color::White, PIPE));
            // Darker lip on the gap side
            let lip = if lip_row_at_end { r1.saturating_sub(1) } else { r0 };
            buf.fill(c0, lip, c1, lip + 1, Cell::new('=', PIPE_EDGE, PIPE));
        }
    }
}

fn compose_ground(buf: &mut FrameBuffer, vp: &Viewport, scene: &GameScene) {
    let (c0, c1, r0, r1) = vp.cells(&scene.ground.rect());
    buf.fill(c0, r0, c1, r1, Cell::new(' ', Color::White, GROUND));

    // Stripe band on the top row scrolls with the ground offset.
    let stripe = 24.0;
    for col in c0..c1 {
        let logical = (col - vp.col0) as f32 / vp.sx + scene.ground_offset;
        let ch = if logical.rem_euclid(stripe) < stripe / 2.0 { '/' } else { ' ' };
        buf.set(col, r0, Cell::new(ch, GROUND_STRIPE, GROUND));
    }
}

fn compose_bird(buf: &mut FrameBuffer, vp: &Viewport, scene: &GameScene) {
    let colour = if scene.bird.tinted { BIRD_HIT } else { BIRD };
    let (c0, c1, r0, r1) = vp.cells(&scene.bird.hitbox());
    buf.fill(c0, r0, c1, r1, Cell::new(' ', Color::Black, colour));
    // Eye on the leading edge
    buf.set(c1.saturating_sub(1), r0, Cell::new('o', Color::Black, colour));
}

fn compose_game_over(buf: &mut FrameBuffer, app: &App) {
    let box_w = 36.min(buf.width);
    let box_h = 9;
    let x0 = buf.width.saturating_sub(box_w) / 2;
    let y0 = buf.height.saturating_sub(box_h) / 2;
    buf.fill(x0, y0, x0 + box_w, y0 + box_h, Cell::new(' ', Color::White, PANEL));

    let new_best = app.last_score > 0 && app.last_score == app.best_score;
    buf.put_center(y0 + 1, "GAME OVER", BIRD_HIT, Some(PANEL));
    buf.put_center(y0 + 3, &format!("SCORE {}", app.last_score), Color::White, Some(PANEL));
    let best = if new_best { format!("NEW BEST {}", app.best_score) } else { format!("BEST {}", app.best_score) };
    buf.put_center(y0 + 4, &best, ACCENT, Some(PANEL));
    if app.session.mode == Mode::Competition && app.session.is_connected() {
        buf.put_center(y0 + 5, "Score submitted", DIM, Some(PANEL));
    }
    buf.put_center(y0 + 7, "R Retry    M Menu", KEY, Some(PANEL));
}

fn compose_leaderboard(buf: &mut FrameBuffer, app: &App) {
    buf.put_center(1, "LEADERBOARD", ACCENT, None);

    let Some(entries) = app.leaderboard.as_deref() else {
        buf.put_center(3, "Loading...", DIM, None);
        return;
    };
    if entries.is_empty() {
        buf.put_center(3, "No scores yet", DIM, None);
    }

    let x = buf.width.saturating_sub(34) / 2;
    let visible = buf.height.saturating_sub(6);
    for (i, entry) in entries.iter().take(visible).enumerate() {
        let rank = i + 1;
        let (badge, colour) = match medal(rank) {
            Some(Medal::Gold) => ("(1)".to_string(), Color::Rgb { r: 255, g: 200, b: 0 }),
            Some(Medal::Silver) => ("(2)".to_string(), Color::Rgb { r: 200, g: 200, b: 210 }),
            Some(Medal::Bronze) => ("(3)".to_string(), Color::Rgb { r: 205, g: 127, b: 50 }),
            None => (format!("#{rank}"), DIM),
        };
        let y = 3 + i;
        buf.put_str(x, y, &badge, colour, BASE_BG);
        buf.put_str(x + 6, y, &short_address(&entry.wallet_address), Color::White, BASE_BG);
        buf.put_str(x + 26, y, &format!("{:>8}", entry.score), ACCENT, BASE_BG);
    }

    let hint = if app.is_admin() { "D Download rewards CSV    Esc Close" } else { "Esc Close" };
    buf.put_center(buf.height.saturating_sub(2), hint, KEY, None);
}

fn compose_paying(buf: &mut FrameBuffer, app: &App) {
    buf.put_center(3, "COMPETITION ENTRY", ACCENT, None);
    buf.put_center(5, &format!("Entry fee {}", app.settings.entry_fee_label), Color::White, None);
    let status = match app.payment() {
        PaymentFlow::Confirming { tx_hash, .. } => {
            format!("Waiting for confirmation of {}", short_address(tx_hash))
        }
        _ => "Approve the payment in your wallet".to_string(),
    };
    buf.put_center(7, &status, KEY, None);
}

fn compose_footer(buf: &mut FrameBuffer, app: &App) {
    let Some(y) = buf.height.checked_sub(1) else { return };
    match &app.notice {
        Some(notice) => {
            buf.fill(0, y, buf.width, y + 1, Cell::new(' ', Color::White, NOTICE_BG));
            buf.put_center(y, &notice.text, Color::White, Some(NOTICE_BG));
        }
        None => {
            let hint = match app.view {
                View::Playing => "Space / Up / click: flap    Esc: menu",
                View::GameOver => "R / Enter: retry    M / Esc: menu",
                _ => "",
            };
            buf.put_center(y, hint, DIM, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::app::AppSettings;
    use crate::config::GameConfig;
    use crate::net::Response;
    use crate::sim::save::SaveStore;
    use crate::sim::scene::test_support::RecordingSink;

    fn app(dir: &std::path::Path) -> App {
        App::new(
            AppSettings::from_config(&GameConfig::default()),
            SaveStore::at(dir),
            Rc::new(RecordingSink::default()),
            StdRng::seed_from_u64(9),
        )
    }

    fn text(buf: &FrameBuffer) -> String {
        let mut out = String::new();
        for y in 0..buf.height {
            for x in 0..buf.width {
                out.push(buf.get(x, y).ch);
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn viewport_scales_canvas() {
        let vp = Viewport::fit(80, 32, 800.0, 600.0);
        assert_eq!(vp.rows, 30);
        assert_eq!(vp.cells(&Rect::new(0.0, 0.0, 800.0, 600.0)), (0, 80, 1, 31));
        // Tiny rects still cover one cell
        let (c0, c1, r0, r1) = vp.cells(&Rect::new(400.0, 300.0, 1.0, 1.0));
        assert_eq!((c1 - c0, r1 - r0), (1, 1));
    }

    #[test]
    fn offscreen_rect_clamps() {
        let vp = Viewport::fit(80, 32, 800.0, 600.0);
        let (c0, c1, _, _) = vp.cells(&Rect::new(-100.0, 0.0, 50.0, 10.0));
        assert_eq!(c0, 0);
        assert!(c1 <= 1);
    }

    #[test]
    fn menu_shows_stats_and_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(dir.path());
        a.on_response(Response::Stats(Err("down".into())));
        let mut buf = FrameBuffer::new(80, 24);
        compose(&mut buf, &a);
        let screen = text(&buf);
        assert!(screen.contains("F L A P P Y"));
        assert!(screen.contains("$15,000 USD"));
        assert!(screen.contains("0 / 0"));
        assert!(screen.contains("P  Practice"));
    }

    #[test]
    fn playing_draws_bird_and_ground() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(dir.path());
        a.practice_click();
        let mut buf = FrameBuffer::new(80, 32);
        compose(&mut buf, &a);
        assert!(buf.cells.iter().any(|c| c.bg == BIRD));
        assert!(buf.cells.iter().any(|c| c.bg == GROUND));
        assert!(text(&buf).contains("SCORE 0"));
    }

    #[test]
    fn notice_replaces_footer() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(dir.path());
        a.set_notice("Payment Cancelled");
        let mut buf = FrameBuffer::new(60, 20);
        compose(&mut buf, &a);
        let last_row: String = (0..60).map(|x| buf.get(x, 19).ch).collect();
        assert!(last_row.contains("Payment Cancelled"));
    }
}
