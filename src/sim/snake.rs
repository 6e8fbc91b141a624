//! Snake rules
//!
//! One tick: commit the pending heading, step the head, check walls then the
//! pre-move body, then either slide or grow. Food respawns on a free cell.

use glam::IVec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::engine::{Rules, Step, StepCtx};
use super::grid::{Coord, Direction, Grid};
use super::session::{EndReason, GameEvent, GameTheme};
use super::timers::{Fired, TimerId, TimerRegistry};
use crate::settings::SnakeTuning;

/// Random draws tried before falling back to enumerating free cells
const FOOD_REJECTION_ATTEMPTS: usize = 64;

/// Snake body, head first. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snake {
    cells: Vec<Coord>,
}

impl Snake {
    pub fn new(cells: Vec<Coord>) -> Option<Self> {
        if cells.is_empty() {
            None
        } else {
            Some(Self { cells })
        }
    }

    pub fn from_pairs(pairs: &[(i32, i32)]) -> Option<Self> {
        Self::new(pairs.iter().map(|&(x, y)| IVec2::new(x, y)).collect())
    }

    #[inline]
    pub fn head(&self) -> Coord {
        self.cells[0]
    }

    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn occupies(&self, cell: Coord) -> bool {
        self.cells.contains(&cell)
    }
}

/// Committed heading (used by the last tick) and pending heading (next tick).
///
/// A request is checked against the committed heading, not the pending one,
/// so two quick inputs inside one tick can never add up to a reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionLatch {
    committed: Direction,
    pending: Direction,
}

impl DirectionLatch {
    pub fn new(direction: Direction) -> Self {
        Self {
            committed: direction,
            pending: direction,
        }
    }

    pub fn committed(&self) -> Direction {
        self.committed
    }

    pub fn pending(&self) -> Direction {
        self.pending
    }

    /// Accept unless `direction` reverses the committed heading
    pub fn request(&mut self, direction: Direction) -> bool {
        if direction.is_opposite(self.committed) {
            return false;
        }
        self.pending = direction;
        true
    }

    /// Make the pending heading the committed one
    pub fn commit(&mut self) -> Direction {
        self.committed = self.pending;
        self.committed
    }
}

/// Result of one movement step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnakeStep {
    /// Head advanced, tail dropped
    Moved(Snake),
    /// Head advanced onto food, tail kept
    Grew(Snake),
    /// Wall or body hit; the body is left as it was
    Crashed(EndReason),
}

/// Advance the snake one cell along `heading`.
///
/// The body check runs against the pre-move body, tail included: moving into
/// the cell the tail is about to vacate is a collision.
pub fn step(snake: &Snake, heading: Direction, food: Coord, grid: Grid) -> SnakeStep {
    let head = snake.head() + heading.unit();

    if !grid.contains(head) {
        return SnakeStep::Crashed(EndReason::Wall);
    }
    if snake.occupies(head) {
        return SnakeStep::Crashed(EndReason::SelfCollision);
    }

    let mut cells = Vec::with_capacity(snake.len() + 1);
    cells.push(head);
    cells.extend_from_slice(snake.cells());

    if head == food {
        SnakeStep::Grew(Snake { cells })
    } else {
        cells.pop();
        SnakeStep::Moved(Snake { cells })
    }
}

/// Uniformly random cell not covered by the snake, `None` if the board is full
pub fn spawn_food<R: Rng + ?Sized>(grid: Grid, snake: &Snake, rng: &mut R) -> Option<Coord> {
    let free = grid.cell_count().saturating_sub(snake.len());
    if free == 0 {
        return None;
    }

    for _ in 0..FOOD_REJECTION_ATTEMPTS {
        let cell = grid.random_cell(rng);
        if !snake.occupies(cell) {
            return Some(cell);
        }
    }

    // Crowded board: pick among the free cells directly
    let index = rng.random_range(0..free);
    grid.cells().filter(|c| !snake.occupies(*c)).nth(index)
}

/// Starting layout applied on every reset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opening {
    pub snake: Snake,
    pub direction: Direction,
    /// Fixed first food cell; random when unset or invalid
    pub food: Option<Coord>,
}

impl Opening {
    /// Straight snake with its head on the board center, trailing away
    /// from the initial direction
    pub fn from_tuning(tuning: &SnakeTuning) -> Self {
        let center = tuning.grid_size / 2;
        let tail_dy = match tuning.initial_direction {
            Direction::Up => 1,
            Direction::Down => -1,
            Direction::Left | Direction::Right => 0,
        };
        let tail_dx = match tuning.initial_direction {
            Direction::Left => 1,
            Direction::Right => -1,
            Direction::Up | Direction::Down => 0,
        };
        let cells = (0..tuning.initial_length as i32)
            .map(|i| IVec2::new(center + tail_dx * i, center + tail_dy * i))
            .collect();
        Self {
            snake: Snake { cells },
            direction: tuning.initial_direction,
            food: None,
        }
    }
}

/// Timer keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnakeTimer {
    Tick,
}

/// Render-facing Snake state
#[derive(Debug, Clone, Serialize)]
pub struct SnakeBoard {
    pub grid: Grid,
    pub snake: Vec<Coord>,
    pub food: Coord,
    pub direction: Direction,
    pub pending: Direction,
    pub interval_ms: u64,
}

/// Snake rules for [`Engine`](super::engine::Engine)
#[derive(Debug, Clone)]
pub struct SnakeRules {
    tuning: SnakeTuning,
    grid: Grid,
    opening: Opening,
    snake: Snake,
    food: Coord,
    heading: DirectionLatch,
    interval_ms: u64,
    tick: Option<TimerId>,
}

impl SnakeRules {
    pub fn new(tuning: SnakeTuning) -> Self {
        let tuning = tuning.sanitized();
        let opening = Opening::from_tuning(&tuning);
        Self::with_opening(tuning, opening)
    }

    /// Custom starting layout. Cells outside the board are dropped; an opening
    /// left empty falls back to the tuning's default.
    pub fn with_opening(tuning: SnakeTuning, opening: Opening) -> Self {
        let tuning = tuning.sanitized();
        let grid = Grid::square(tuning.grid_size);
        let cells: Vec<Coord> = opening
            .snake
            .cells()
            .iter()
            .copied()
            .filter(|c| grid.contains(*c))
            .collect();
        let opening = match Snake::new(cells) {
            Some(snake) => Opening { snake, ..opening },
            None => Opening::from_tuning(&tuning),
        };
        Self {
            grid,
            snake: opening.snake.clone(),
            food: IVec2::ZERO,
            heading: DirectionLatch::new(opening.direction),
            interval_ms: tuning.initial_speed_ms,
            tick: None,
            opening,
            tuning,
        }
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn food(&self) -> Coord {
        self.food
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn heading(&self) -> DirectionLatch {
        self.heading
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

impl Rules for SnakeRules {
    type Action = Direction;
    type Timer = SnakeTimer;
    type Board = SnakeBoard;

    fn theme(&self) -> GameTheme {
        GameTheme::Snake
    }

    fn fresh(&mut self, rng: &mut Pcg32) {
        self.snake = self.opening.snake.clone();
        self.heading = DirectionLatch::new(self.opening.direction);
        self.interval_ms = self.tuning.initial_speed_ms;
        self.tick = None;
        self.food = match self.opening.food {
            Some(cell) if self.grid.contains(cell) && !self.snake.occupies(cell) => cell,
            // The opening never fills the board, so a free cell exists
            _ => spawn_food(self.grid, &self.snake, rng).unwrap_or(IVec2::ZERO),
        };
        log::debug!("Snake fresh: head {} food {}", self.snake.head(), self.food);
    }

    fn arm(&mut self, timers: &mut TimerRegistry<SnakeTimer>) {
        self.tick = Some(timers.arm_periodic(SnakeTimer::Tick, self.interval_ms));
    }

    fn suspend(&mut self, _timers: &TimerRegistry<SnakeTimer>) {
        self.tick = None;
    }

    fn clear_on_end(&mut self) {
        self.tick = None;
    }

    fn on_timer(&mut self, _fired: Fired<SnakeTimer>, ctx: &mut StepCtx<'_, SnakeTimer>) -> Step {
        let heading = self.heading.commit();

        match step(&self.snake, heading, self.food, self.grid) {
            SnakeStep::Crashed(reason) => Step::Ended(reason),
            SnakeStep::Moved(next) => {
                self.snake = next;
                Step::Advanced
            }
            SnakeStep::Grew(next) => {
                self.snake = next;
                *ctx.score += 1;
                self.interval_ms = self
                    .interval_ms
                    .saturating_sub(self.tuning.speed_decrement_ms)
                    .max(self.tuning.min_speed_ms);
                if let Some(id) = self.tick {
                    ctx.timers.set_period(id, self.interval_ms);
                }
                ctx.events.push(GameEvent::Ate { score: *ctx.score });

                match spawn_food(self.grid, &self.snake, ctx.rng) {
                    Some(cell) => {
                        log::debug!(
                            "Ate at {}; food -> {}, interval {} ms",
                            self.snake.head(),
                            cell,
                            self.interval_ms
                        );
                        self.food = cell;
                        Step::Advanced
                    }
                    None => Step::Ended(EndReason::BoardFull),
                }
            }
        }
    }

    fn on_action(&mut self, direction: Direction, _ctx: &mut StepCtx<'_, SnakeTimer>) -> bool {
        let before = self.heading.pending();
        if !self.heading.request(direction) {
            log::trace!(
                "Rejected {} against committed {}",
                direction.as_str(),
                self.heading.committed().as_str()
            );
            return false;
        }
        self.heading.pending() != before
    }

    fn starts_on_action(&self) -> bool {
        true
    }

    fn steer_idle(&mut self, direction: Direction) -> bool {
        self.heading.request(direction)
    }

    fn board(&self) -> SnakeBoard {
        SnakeBoard {
            grid: self.grid,
            snake: self.snake.cells().to_vec(),
            food: self.food,
            direction: self.heading.committed(),
            pending: self.heading.pending(),
            interval_ms: self.interval_ms,
        }
    }
}
