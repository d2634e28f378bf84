use log::debug;
use shared::{BoxKind, Coordinate, Direction, MatchPhase, Player, PlayerId, Snapshot};

/// The client's copy of the match: the last authoritative snapshot, possibly
/// with the local player nudged ahead by an optimistic move, plus a status
/// line for the renderer.
#[derive(Debug, Clone)]
pub struct LocalView {
    pub player_id: PlayerId,
    pub snapshot: Snapshot,
    pub status: String,
}

impl LocalView {
    pub fn new(player_id: PlayerId, snapshot: Snapshot) -> Self {
        Self {
            player_id,
            snapshot,
            status: String::new(),
        }
    }

    /// Replaces the view with what the server says. Any optimistic moves the
    /// server has not confirmed are simply overwritten.
    pub fn apply_authoritative(&mut self, snapshot: Snapshot) {
        if let (Some(predicted), Some(confirmed)) =
            (self.local_player(), snapshot.player(self.player_id))
        {
            if predicted.position != confirmed.position {
                debug!(
                    "Correcting local position ({}, {}) -> ({}, {})",
                    predicted.position.x,
                    predicted.position.y,
                    confirmed.position.x,
                    confirmed.position.y
                );
            }
        }

        self.snapshot = snapshot;
        if let Some(status) = self.game_over() {
            self.status = status;
        }
    }

    /// Moves the local player one step if the view thinks the move is legal.
    /// Purely cosmetic; the next authoritative snapshot wins.
    pub fn apply_prediction(&mut self, direction: Direction) -> bool {
        if self.snapshot.phase != MatchPhase::Playing {
            return false;
        }
        let Some(player) = self.local_player() else {
            return false;
        };
        if !player.is_active() {
            return false;
        }

        let target = player.position.step(direction);
        if !self.snapshot.map.is_passable(target) || self.snapshot.player_at(target).is_some() {
            return false;
        }

        match self.snapshot.player_mut(self.player_id) {
            Some(player) => {
                player.position = target;
                true
            }
            None => false,
        }
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.snapshot.player(self.player_id)
    }

    /// Whether the server still lists this client as connected.
    pub fn is_present(&self) -> bool {
        self.local_player().is_some()
    }

    /// Boxes on the cells around the local player. A display hint only: it
    /// never reveals or collects anything.
    pub fn adjacent_boxes(&self) -> Vec<Coordinate> {
        let Some(player) = self.local_player() else {
            return Vec::new();
        };

        player
            .position
            .neighbours()
            .into_iter()
            .filter(|coord| self.snapshot.box_at(*coord).is_some())
            .collect()
    }

    /// Describes the end of the match once it is over.
    pub fn game_over(&self) -> Option<String> {
        if !self.snapshot.is_finished() {
            return None;
        }

        let text = match self.snapshot.winner {
            Some(id) if id == self.player_id => "Game over: you win!".to_string(),
            Some(id) => {
                let name = self
                    .snapshot
                    .player(id)
                    .map(|p| p.name.as_str())
                    .unwrap_or("another player");
                format!("Game over: {} wins", name)
            }
            None => "Game over: everyone lost".to_string(),
        };
        Some(text)
    }

    pub fn record_reveal(&mut self, kind: Option<BoxKind>) {
        self.status = reveal_status(kind).to_string();
        if let Some(status) = self.game_over() {
            self.status = status;
        }
    }
}

pub fn reveal_status(kind: Option<BoxKind>) -> &'static str {
    match kind {
        Some(BoxKind::Treasure) => "You found a treasure!",
        Some(BoxKind::Trap) => "It's a trap! You are out.",
        Some(BoxKind::Empty) => "The box is empty.",
        None => "Nothing here.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Map, PlayerColor};
    use std::collections::BTreeMap;

    const ME: PlayerId = PlayerId::from_u128(1);
    const OTHER: PlayerId = PlayerId::from_u128(2);

    fn snapshot(players: Vec<Player>) -> Snapshot {
        let map = Map::parse("#####\n#   #\n#   #\n#####");
        let mut boxes = BTreeMap::new();
        if let Some(key) = map.key(Coordinate::new(3, 1)) {
            boxes.insert(key, BoxKind::Treasure);
        }
        Snapshot {
            map,
            players,
            boxes,
            phase: MatchPhase::Playing,
            winner: None,
            treasures_remaining: 1,
            players_alive: 1,
            last_processed: BTreeMap::new(),
        }
    }

    fn player(id: PlayerId, name: &str, x: i32, y: i32) -> Player {
        Player::new(id, name, Coordinate::new(x, y), PlayerColor::White)
    }

    #[test]
    fn test_prediction_moves_local_player() {
        let mut view = LocalView::new(ME, snapshot(vec![player(ME, "me", 1, 1)]));

        assert!(view.apply_prediction(Direction::Right));
        assert_eq!(
            view.local_player().unwrap().position,
            Coordinate::new(2, 1)
        );
    }

    #[test]
    fn test_prediction_respects_walls_and_players() {
        let mut view = LocalView::new(
            ME,
            snapshot(vec![player(ME, "me", 1, 1), player(OTHER, "other", 2, 1)]),
        );

        assert!(!view.apply_prediction(Direction::Up));
        assert!(!view.apply_prediction(Direction::Right));
        assert_eq!(
            view.local_player().unwrap().position,
            Coordinate::new(1, 1)
        );
    }

    #[test]
    fn test_prediction_stops_after_finish() {
        let mut finished = snapshot(vec![player(ME, "me", 1, 1)]);
        finished.phase = MatchPhase::Finished;
        let mut view = LocalView::new(ME, finished);

        assert!(!view.apply_prediction(Direction::Right));
    }

    #[test]
    fn test_authoritative_snapshot_overrides_prediction() {
        let mut view = LocalView::new(ME, snapshot(vec![player(ME, "me", 1, 1)]));
        view.apply_prediction(Direction::Down);

        view.apply_authoritative(snapshot(vec![player(ME, "me", 1, 1)]));

        assert_eq!(
            view.local_player().unwrap().position,
            Coordinate::new(1, 1)
        );
    }

    #[test]
    fn test_adjacent_boxes_is_a_hint() {
        let view = LocalView::new(ME, snapshot(vec![player(ME, "me", 2, 1)]));

        assert_eq!(view.adjacent_boxes(), vec![Coordinate::new(3, 1)]);
        assert_eq!(view.snapshot.boxes.len(), 1);
    }

    #[test]
    fn test_absent_player() {
        let view = LocalView::new(ME, snapshot(vec![player(OTHER, "other", 1, 1)]));

        assert!(!view.is_present());
        assert!(view.adjacent_boxes().is_empty());
    }

    #[test]
    fn test_game_over_messages() {
        let mut view = LocalView::new(
            ME,
            snapshot(vec![player(ME, "me", 1, 1), player(OTHER, "bob", 2, 1)]),
        );
        assert_eq!(view.game_over(), None);

        let mut won = view.snapshot.clone();
        won.phase = MatchPhase::Finished;
        won.winner = Some(ME);
        view.apply_authoritative(won.clone());
        assert_eq!(view.status, "Game over: you win!");

        won.winner = Some(OTHER);
        view.apply_authoritative(won.clone());
        assert_eq!(view.status, "Game over: bob wins");

        won.winner = None;
        view.apply_authoritative(won);
        assert_eq!(view.status, "Game over: everyone lost");
    }

    #[test]
    fn test_reveal_status() {
        let mut view = LocalView::new(ME, snapshot(vec![player(ME, "me", 1, 1)]));

        view.record_reveal(Some(BoxKind::Treasure));
        assert_eq!(view.status, "You found a treasure!");

        view.record_reveal(None);
        assert_eq!(view.status, "Nothing here.");
    }
}
