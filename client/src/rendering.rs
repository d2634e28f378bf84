use crate::game::LocalView;
use crate::reconciler::Render;
use shared::Coordinate;
use std::io::Write;

pub const BOX_GLYPH: char = '■';

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Redraws the whole match on stdout with ANSI colours.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    pub clear: bool,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self { clear: true }
    }
}

impl Render for TerminalRenderer {
    fn render(&self, view: &LocalView) {
        let frame = render_frame(view);
        let mut stdout = std::io::stdout().lock();
        if self.clear {
            let _ = write!(stdout, "{}", CLEAR_SCREEN);
        }
        let _ = write!(stdout, "{}", frame);
        let _ = stdout.flush();
    }
}

/// Builds one frame: the grid, a score line per player and the status line.
///
/// Players are drawn over boxes, boxes over the floor. The local player is
/// bold.
pub fn render_frame(view: &LocalView) -> String {
    let snapshot = &view.snapshot;
    let mut out = String::new();

    for (y, row) in snapshot.map.rows().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            let coord = Coordinate::new(x as i32, y as i32);

            if let Some(player) = snapshot.player_at(coord) {
                let weight = if player.id == view.player_id { BOLD } else { "" };
                out.push_str(&format!(
                    "{}\x1b[{}m{}{}",
                    weight,
                    player.color.ansi_code(),
                    player.symbol,
                    RESET
                ));
            } else if snapshot.box_at(coord).is_some() {
                out.push(BOX_GLYPH);
            } else {
                out.push(cell.glyph());
            }
        }
        out.push('\n');
    }

    out.push('\n');
    for player in &snapshot.players {
        let marker = if player.id == view.player_id { "*" } else { " " };
        let state = if player.alive { "" } else { " (out)" };
        out.push_str(&format!(
            "{} \x1b[{}m{}{}{}: {}{}\n",
            marker,
            player.color.ansi_code(),
            player.symbol,
            RESET,
            player.name,
            player.score,
            state
        ));
    }

    out.push_str(&format!(
        "Treasures left: {}  Players alive: {}\n",
        snapshot.treasures_remaining, snapshot.players_alive
    ));

    let nearby = view.adjacent_boxes().len();
    if nearby > 0 {
        out.push_str(&format!("{} box(es) next to you\n", nearby));
    }

    if !view.status.is_empty() {
        out.push_str(&view.status);
        out.push('\n');
    }

    out
}
