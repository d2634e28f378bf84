use crate::map::{Coordinate, Map};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

pub const PLAYER_SYMBOL: char = '♟';

/// Opaque player token handed out by the server on connect.
///
/// Ordering follows the textual form of the underlying UUID, which makes it
/// usable as a deterministic tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(Uuid);

impl PlayerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Rendering hint assigned round-robin on connect. Opaque to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerColor {
    White,
    Red,
    Green,
    Blue,
    Yellow,
    Magenta,
    Cyan,
}

pub const PALETTE: [PlayerColor; 7] = [
    PlayerColor::White,
    PlayerColor::Red,
    PlayerColor::Green,
    PlayerColor::Blue,
    PlayerColor::Yellow,
    PlayerColor::Magenta,
    PlayerColor::Cyan,
];

impl PlayerColor {
    pub fn from_index(index: usize) -> Self {
        PALETTE[index % PALETTE.len()]
    }

    pub fn index(self) -> usize {
        PALETTE
            .iter()
            .position(|color| *color == self)
            .unwrap_or_default()
    }

    /// ANSI foreground escape code for terminal renderers.
    pub fn ansi_code(self) -> u8 {
        match self {
            PlayerColor::White => 37,
            PlayerColor::Red => 31,
            PlayerColor::Green => 32,
            PlayerColor::Blue => 34,
            PlayerColor::Yellow => 33,
            PlayerColor::Magenta => 35,
            PlayerColor::Cyan => 36,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// WASD key mapping. Anything else is not a direction.
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'w' => Some(Direction::Up),
            's' => Some(Direction::Down),
            'a' => Some(Direction::Left),
            'd' => Some(Direction::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoxKind {
    Treasure,
    Trap,
    Empty,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchPhase {
    #[default]
    Waiting,
    Playing,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Coordinate,
    pub color: PlayerColor,
    pub symbol: char,
    pub connected: bool,
    pub alive: bool,
    pub score: u32,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, position: Coordinate, color: PlayerColor) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            color,
            symbol: PLAYER_SYMBOL,
            connected: true,
            alive: true,
            score: 0,
        }
    }

    /// Connected and alive players are the only ones that block movement,
    /// take part in the end-of-match evaluation and may act.
    pub fn is_active(&self) -> bool {
        self.connected && self.alive
    }
}

/// Immutable copy of the match handed to callers.
///
/// A snapshot owns all of its data; holding one never keeps the server's
/// state locked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub map: Map,
    /// Connected players, ordered by id.
    pub players: Vec<Player>,
    /// Remaining boxes keyed by packed map key.
    pub boxes: BTreeMap<u32, BoxKind>,
    pub phase: MatchPhase,
    /// `None` while the match runs, and after a collective loss.
    pub winner: Option<PlayerId>,
    pub treasures_remaining: u32,
    pub players_alive: u32,
    /// Highest command sequence processed per connected player.
    pub last_processed: BTreeMap<PlayerId, u64>,
}

impl Snapshot {
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| player.id == id)
    }

    pub fn player_at(&self, coord: Coordinate) -> Option<&Player> {
        self.players
            .iter()
            .find(|player| player.is_active() && player.position == coord)
    }

    pub fn box_at(&self, coord: Coordinate) -> Option<BoxKind> {
        self.map
            .key(coord)
            .and_then(|key| self.boxes.get(&key).copied())
    }

    pub fn is_finished(&self) -> bool {
        self.phase == MatchPhase::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(players: Vec<Player>) -> Snapshot {
        let map = Map::parse("    \n    ");
        let mut boxes = BTreeMap::new();
        boxes.insert(map.key(Coordinate::new(1, 1)).unwrap(), BoxKind::Trap);
        Snapshot {
            map,
            players,
            boxes,
            phase: MatchPhase::Playing,
            winner: None,
            treasures_remaining: 0,
            players_alive: 1,
            last_processed: BTreeMap::new(),
        }
    }

    #[test]
    fn test_player_creation() {
        let id = PlayerId::from_u128(7);
        let player = Player::new(id, "ana", Coordinate::new(1, 2), PlayerColor::Red);
        assert_eq!(player.id, id);
        assert_eq!(player.name, "ana");
        assert_eq!(player.symbol, PLAYER_SYMBOL);
        assert!(player.connected);
        assert!(player.alive);
        assert_eq!(player.score, 0);
        assert!(player.is_active());
    }

    #[test]
    fn test_palette_wraps() {
        assert_eq!(PlayerColor::from_index(0), PlayerColor::White);
        assert_eq!(PlayerColor::from_index(1), PlayerColor::Red);
        assert_eq!(PlayerColor::from_index(PALETTE.len()), PlayerColor::White);
        assert_eq!(PlayerColor::Cyan.index(), 6);
    }

    #[test]
    fn test_direction_keys() {
        assert_eq!(Direction::from_key('w'), Some(Direction::Up));
        assert_eq!(Direction::from_key('A'), Some(Direction::Left));
        assert_eq!(Direction::from_key('s'), Some(Direction::Down));
        assert_eq!(Direction::from_key('d'), Some(Direction::Right));
        assert_eq!(Direction::from_key('x'), None);
    }

    #[test]
    fn test_player_id_order_matches_text_order() {
        let low = PlayerId::from_u128(0x0a);
        let high = PlayerId::from_u128(0xf0);
        assert!(low < high);
        assert!(low.to_string() < high.to_string());
    }

    #[test]
    fn test_snapshot_lookups() {
        let alive = Player::new(PlayerId::from_u128(1), "a", Coordinate::new(0, 0), PlayerColor::White);
        let mut dead = Player::new(PlayerId::from_u128(2), "b", Coordinate::new(2, 0), PlayerColor::Red);
        dead.alive = false;
        let snapshot = snapshot_with(vec![alive.clone(), dead]);

        assert_eq!(snapshot.player(alive.id), Some(&alive));
        assert_eq!(snapshot.player_at(Coordinate::new(0, 0)).map(|p| p.id), Some(alive.id));
        assert!(snapshot.player_at(Coordinate::new(2, 0)).is_none());
        assert_eq!(snapshot.box_at(Coordinate::new(1, 1)), Some(BoxKind::Trap));
        assert_eq!(snapshot.box_at(Coordinate::new(9, 9)), None);
        assert!(!snapshot.is_finished());
    }
}
