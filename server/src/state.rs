//! Authoritative match state and box distribution.
//!
//! [`MatchState`] is the single source of truth owned by the sync server:
//! - players by id, including disconnected ones (their records survive)
//! - hidden boxes keyed by packed map key
//! - the command ledger used to drop duplicate or reordered moves
//! - the match phase and winner
//!
//! The operations that mutate it live in [`crate::game`].

use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use shared::{
    BoxKind, Coordinate, Map, MatchError, MatchPhase, Player, PlayerId, DEFAULT_EMPTY_BOXES,
    DEFAULT_TRAPS, DEFAULT_TREASURES,
};
use std::collections::{BTreeMap, HashMap};

/// How many boxes of each kind a match hides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxQuotas {
    pub treasures: usize,
    pub traps: usize,
    pub empties: usize,
}

impl BoxQuotas {
    pub fn total(&self) -> usize {
        self.treasures + self.traps + self.empties
    }
}

impl Default for BoxQuotas {
    fn default() -> Self {
        Self {
            treasures: DEFAULT_TREASURES,
            traps: DEFAULT_TRAPS,
            empties: DEFAULT_EMPTY_BOXES,
        }
    }
}

/// Shuffles `candidates` and hands out treasures, then traps, then empty
/// boxes from the front of the permutation. Leftover candidates stay free.
///
/// Fails without placing anything when there are fewer candidates than
/// boxes to place.
pub fn distribute_boxes<R: Rng + ?Sized>(
    candidates: &[Coordinate],
    quotas: &BoxQuotas,
    rng: &mut R,
) -> Result<Vec<(Coordinate, BoxKind)>, MatchError> {
    let required = quotas.total();
    if candidates.len() < required {
        return Err(MatchError::InsufficientSpace {
            available: candidates.len(),
            required,
        });
    }

    let mut shuffled = candidates.to_vec();
    shuffled.shuffle(rng);

    let kinds = std::iter::repeat(BoxKind::Treasure)
        .take(quotas.treasures)
        .chain(std::iter::repeat(BoxKind::Trap).take(quotas.traps))
        .chain(std::iter::repeat(BoxKind::Empty).take(quotas.empties));

    Ok(shuffled.into_iter().zip(kinds).collect())
}

pub struct MatchState {
    pub(crate) map: Map,
    pub(crate) empty_cells: Vec<Coordinate>,
    pub(crate) quotas: BoxQuotas,
    pub(crate) players: BTreeMap<PlayerId, Player>,
    pub(crate) boxes: HashMap<u32, BoxKind>,
    pub(crate) ledger: HashMap<PlayerId, u64>,
    pub(crate) phase: MatchPhase,
    pub(crate) winner: Option<PlayerId>,
    pub(crate) treasures_remaining: u32,
    pub(crate) rng: StdRng,
}

impl MatchState {
    /// Creates a waiting match on `map`.
    ///
    /// Refuses maps that could never hold the requested boxes, so a bad map
    /// is caught at startup rather than on the first connect.
    pub fn new(map: Map, quotas: BoxQuotas) -> Result<Self, MatchError> {
        Self::with_rng(map, quotas, StdRng::from_entropy())
    }

    pub fn with_seed(map: Map, quotas: BoxQuotas, seed: u64) -> Result<Self, MatchError> {
        Self::with_rng(map, quotas, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(map: Map, quotas: BoxQuotas, rng: StdRng) -> Result<Self, MatchError> {
        let empty_cells = map.empty_cells();
        if empty_cells.len() < quotas.total() {
            return Err(MatchError::InsufficientSpace {
                available: empty_cells.len(),
                required: quotas.total(),
            });
        }

        info!(
            "Match created on {}x{} map with {} free cells",
            map.width(),
            map.height(),
            empty_cells.len()
        );

        Ok(Self {
            map,
            empty_cells,
            quotas,
            players: BTreeMap::new(),
            boxes: HashMap::new(),
            ledger: HashMap::new(),
            phase: MatchPhase::Waiting,
            winner: None,
            treasures_remaining: quotas.treasures as u32,
            rng,
        })
    }

    /// Draws a fresh box layout for this match. Does not install it.
    pub(crate) fn layout_boxes(&mut self) -> Result<HashMap<u32, BoxKind>, MatchError> {
        let placed = distribute_boxes(&self.empty_cells, &self.quotas, &mut self.rng)?;
        Ok(placed
            .into_iter()
            .filter_map(|(coord, kind)| self.map.key(coord).map(|key| (key, kind)))
            .collect())
    }

    pub(crate) fn install_boxes(&mut self, boxes: HashMap<u32, BoxKind>) {
        self.treasures_remaining = boxes
            .values()
            .filter(|kind| **kind == BoxKind::Treasure)
            .count() as u32;
        self.boxes = boxes;
    }

    /// True when a connected, alive player other than `except` stands on
    /// `coord`.
    pub(crate) fn occupied(&self, coord: Coordinate, except: Option<PlayerId>) -> bool {
        self.players
            .values()
            .any(|p| p.is_active() && p.position == coord && Some(p.id) != except)
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn treasures_remaining(&self) -> u32 {
        self.treasures_remaining
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn box_at(&self, coord: Coordinate) -> Option<BoxKind> {
        self.map
            .key(coord)
            .and_then(|key| self.boxes.get(&key).copied())
    }

    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    /// Highest sequence processed for `id`, `None` for unknown players.
    pub fn last_processed(&self, id: PlayerId) -> Option<u64> {
        self.ledger.get(&id).copied()
    }

    /// Replaces the box layout. Only for tests that need a known layout.
    #[cfg(test)]
    pub(crate) fn set_boxes(&mut self, boxes: &[(Coordinate, BoxKind)]) {
        let boxes = boxes
            .iter()
            .filter_map(|(coord, kind)| self.map.key(*coord).map(|key| (key, *kind)))
            .collect();
        self.install_boxes(boxes);
    }
}
