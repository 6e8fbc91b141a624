//! Idle/demo mode - plays either game through the ordinary intent surface
//!
//! Pilots only read snapshots and return intents, exactly like a player.

use std::collections::{HashSet, VecDeque};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::grid::{Coord, Direction, Grid};
use super::snake::SnakeBoard;
use super::whack::WhackBoard;

/// Cells reachable from `start` without crossing `blocked`, capped at `limit`
fn reachable(grid: Grid, blocked: &HashSet<Coord>, start: Coord, limit: usize) -> usize {
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(cell) = queue.pop_front() {
        if seen.len() >= limit {
            break;
        }
        for dir in Direction::ALL {
            let next = cell + dir.unit();
            if grid.contains(next) && !blocked.contains(&next) && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen.len()
}

/// Pick the next heading: never reverse, never step into a wall or the body,
/// prefer moves that keep enough room, then the shortest way to the food.
pub fn steer_snake(board: &SnakeBoard) -> Option<Direction> {
    let head = *board.snake.first()?;
    let body: HashSet<Coord> = board.snake.iter().copied().collect();
    let room_needed = board.snake.len() + 1;

    Direction::ALL
        .into_iter()
        .filter(|d| !d.is_opposite(board.direction))
        .filter_map(|d| {
            let next = head + d.unit();
            if !board.grid.contains(next) || body.contains(&next) {
                return None;
            }
            let room = reachable(board.grid, &body, next, room_needed);
            let distance = (board.food - next).abs().element_sum();
            Some((d, room >= room_needed, room, distance))
        })
        .max_by_key(|&(_, roomy, room, distance)| (roomy, -distance, room))
        .map(|(d, ..)| d)
}

/// Whacks visible targets after a reaction delay, missing some on purpose
#[derive(Debug, Clone)]
pub struct WhackPilot {
    reaction_ms: u64,
    accuracy: f64,
    first_seen: Vec<Option<u64>>,
    rng: Pcg32,
}

impl WhackPilot {
    pub fn new(seed: u64, reaction_ms: u64, accuracy: f64) -> Self {
        Self {
            reaction_ms,
            accuracy: accuracy.clamp(0.0, 1.0),
            first_seen: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Slot to whack now, if any
    pub fn decide(&mut self, board: &WhackBoard, now_ms: u64) -> Option<usize> {
        self.first_seen.resize(board.slots.len(), None);

        let mut target = None;
        for (slot, &active) in board.slots.iter().enumerate() {
            if !active {
                self.first_seen[slot] = None;
                continue;
            }
            let seen = *self.first_seen[slot].get_or_insert(now_ms);
            if target.is_none() && now_ms.saturating_sub(seen) >= self.reaction_ms {
                target = Some(slot);
            }
        }

        let slot = target?;
        // One roll per target sighting
        self.first_seen[slot] = Some(u64::MAX);
        if self.rng.random_bool(self.accuracy) {
            Some(slot)
        } else {
            None
        }
    }
}
