//! Match rules: connect, move, interact, disconnect and the end condition.
//!
//! Every operation here expects exclusive access to the [`MatchState`]; the
//! sync server takes the write lock before calling in. Benign conditions
//! (unknown player, duplicate command, finished match) never fail: they leave
//! the state untouched and hand back the current snapshot.

use crate::state::MatchState;
use log::{debug, info};
use shared::{
    BoxKind, Coordinate, Direction, MatchError, MatchPhase, MoveOutcome, Player, PlayerColor,
    PlayerId, Snapshot,
};
use std::collections::HashMap;

impl MatchState {
    /// Registers a new player and returns its id with the current snapshot.
    ///
    /// The first connection hides the boxes and starts the match.
    pub fn connect(&mut self, name: &str) -> Result<(PlayerId, Snapshot), MatchError> {
        if self.phase == MatchPhase::Finished {
            return Err(MatchError::MatchFinished);
        }

        let fresh_layout = if self.phase == MatchPhase::Waiting {
            Some(self.layout_boxes()?)
        } else {
            None
        };

        let position = self
            .spawn_point(fresh_layout.as_ref().unwrap_or(&self.boxes))
            .ok_or(MatchError::NoFreeCell)?;

        if let Some(boxes) = fresh_layout {
            self.install_boxes(boxes);
            self.phase = MatchPhase::Playing;
            info!(
                "Match started: {} treasures, {} traps, {} empty boxes hidden",
                self.quotas.treasures, self.quotas.traps, self.quotas.empties
            );
        }

        let id = PlayerId::generate();
        let color = PlayerColor::from_index(self.players.len());
        let player = Player::new(id, name, position, color);

        info!(
            "Player {} ({}) joined at ({}, {})",
            player.name, id, position.x, position.y
        );

        self.players.insert(id, player);
        self.ledger.insert(id, 0);

        // A match hiding no treasure is already won by whoever arrives first.
        self.evaluate_end();

        Ok((id, self.snapshot()))
    }

    /// Applies a one-cell move if `sequence` is new for this player.
    ///
    /// A move that is evaluated, whether it lands or is blocked, consumes its
    /// sequence number. Anything else leaves the ledger alone.
    pub fn move_player(
        &mut self,
        id: PlayerId,
        sequence: u64,
        direction: Direction,
    ) -> (MoveOutcome, Snapshot) {
        let outcome = self.apply_move(id, sequence, direction);
        debug!("Move {:?} #{} from {}: {:?}", direction, sequence, id, outcome);
        (outcome, self.snapshot())
    }

    fn apply_move(&mut self, id: PlayerId, sequence: u64, direction: Direction) -> MoveOutcome {
        if self.phase == MatchPhase::Finished {
            return MoveOutcome::MatchOver;
        }

        if let Some(last) = self.ledger.get(&id) {
            if sequence <= *last {
                return MoveOutcome::Stale;
            }
        }

        let current = match self.players.get(&id) {
            Some(player) if player.is_active() => player.position,
            _ => return MoveOutcome::Ignored,
        };

        let target = current.step(direction);
        let free = self.map.is_passable(target) && !self.occupied(target, Some(id));

        self.ledger.insert(id, sequence);

        if !free {
            return MoveOutcome::Blocked;
        }

        if let Some(player) = self.players.get_mut(&id) {
            player.position = target;
        }
        MoveOutcome::Applied
    }

    /// Opens the box under the player, if any. Boxes are revealed once.
    pub fn interact(&mut self, id: PlayerId) -> (Option<BoxKind>, Snapshot) {
        if self.phase == MatchPhase::Finished {
            return (None, self.snapshot());
        }

        let position = match self.players.get(&id) {
            Some(player) if player.is_active() => player.position,
            _ => return (None, self.snapshot()),
        };

        let revealed = self
            .map
            .key(position)
            .and_then(|key| self.boxes.remove(&key));

        if let Some(player) = self.players.get_mut(&id) {
            match revealed {
                Some(BoxKind::Treasure) => {
                    player.score += 1;
                    self.treasures_remaining = self.treasures_remaining.saturating_sub(1);
                    info!("{} found a treasure (score {})", player.name, player.score);
                }
                Some(BoxKind::Trap) => {
                    player.alive = false;
                    info!("{} triggered a trap", player.name);
                }
                Some(BoxKind::Empty) => debug!("{} opened an empty box", player.name),
                None => debug!(
                    "{} interacted at ({}, {}) but nothing is there",
                    player.name, position.x, position.y
                ),
            }
        }

        self.evaluate_end();
        (revealed, self.snapshot())
    }

    /// Marks the player as gone. The record is kept so its score still counts
    /// toward the final state. Returns false for unknown or already gone
    /// players.
    pub fn disconnect(&mut self, id: PlayerId) -> bool {
        let Some(player) = self.players.get_mut(&id) else {
            return false;
        };
        if !player.connected {
            return false;
        }

        player.connected = false;
        info!("Player {} ({}) disconnected", player.name, id);

        self.evaluate_end();
        true
    }

    /// Finishes the match when nobody is left standing or when every
    /// treasure has been collected. Ties go to the smallest player id.
    fn evaluate_end(&mut self) {
        if self.phase != MatchPhase::Playing {
            return;
        }

        let leader = self
            .players
            .values()
            .filter(|p| p.is_active())
            .max_by(|a, b| a.score.cmp(&b.score).then_with(|| b.id.cmp(&a.id)))
            .map(|p| (p.id, p.score));

        match leader {
            None => {
                self.phase = MatchPhase::Finished;
                self.winner = None;
                info!("Every player is gone or dead: collective loss");
            }
            Some((winner, score)) if self.treasures_remaining == 0 => {
                self.phase = MatchPhase::Finished;
                self.winner = Some(winner);
                info!("All treasures collected, {} wins with {}", winner, score);
            }
            Some(_) => {}
        }
    }

    /// Copies out everything a client needs to draw the match.
    pub fn snapshot(&self) -> Snapshot {
        let players: Vec<Player> = self
            .players
            .values()
            .filter(|p| p.connected)
            .cloned()
            .collect();

        let last_processed = players
            .iter()
            .map(|p| (p.id, self.ledger.get(&p.id).copied().unwrap_or_default()))
            .collect();

        Snapshot {
            map: self.map.clone(),
            players_alive: players.iter().filter(|p| p.alive).count() as u32,
            players,
            boxes: self.boxes.iter().map(|(k, v)| (*k, *v)).collect(),
            phase: self.phase,
            winner: self.winner,
            treasures_remaining: self.treasures_remaining,
            last_processed,
        }
    }

    /// First passable cell in row-major order without a box or an active
    /// player on it.
    fn spawn_point(&self, boxes: &HashMap<u32, BoxKind>) -> Option<Coordinate> {
        (0..self.map.height() as i32)
            .flat_map(|y| (0..self.map.width() as i32).map(move |x| Coordinate::new(x, y)))
            .find(|coord| {
                self.map.is_passable(*coord)
                    && self
                        .map
                        .key(*coord)
                        .is_some_and(|key| !boxes.contains_key(&key))
                    && !self.occupied(*coord, None)
            })
    }
}
