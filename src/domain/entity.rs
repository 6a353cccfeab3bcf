/// Entities: Player, Enemy, plus the small value types they share
/// (grid position, 4-way direction, role, per-tick input).

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Grid position as (row, col). Signed so neighbor math never underflows;
/// map accessors treat out-of-range coordinates as walls.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Pos {
    pub row: i32,
    pub col: i32,
}

impl Pos {
    pub fn new(row: i32, col: i32) -> Self {
        Pos { row, col }
    }

    pub fn manhattan(self, other: Pos) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }

    pub fn step(self, dir: Direction) -> Pos {
        let (dr, dc) = dir.delta();
        Pos { row: self.row + dr, col: self.col + dc }
    }
}

/// Movement direction, also used as facing.
/// Variant order is the input priority when several keys are held.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    /// Facing for a single-cell step from `from` to `to`, if they are
    /// axis-adjacent.
    pub fn between(from: Pos, to: Pos) -> Option<Direction> {
        match (to.row - from.row, to.col - from.col) {
            (-1, 0) => Some(Direction::Up),
            (1, 0) => Some(Direction::Down),
            (0, -1) => Some(Direction::Left),
            (0, 1) => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Traversal role. Which agent holds which role depends on the mode:
/// Escape gives the player Runner, Hunter mode gives the player Hunter.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Role {
    Runner,
    Hunter,
}

/// Frame input: movement is continuous (held key), sprint is a held
/// modifier, trap placement is edge-triggered (fresh press).
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub direction: Option<Direction>,
    pub sprint: bool,
    pub place_trap: bool,
}

/// Sprint fuel. Drains while sprinting, recovers otherwise; empty fuel
/// disables sprint until it climbs back above zero.
#[derive(Clone, Debug)]
pub struct Stamina {
    pub value: f32,
    pub max: f32,
}

impl Stamina {
    pub fn new(max: f32) -> Self {
        Stamina { value: max, max }
    }

    pub fn can_sprint(&self) -> bool {
        self.value > 0.0
    }

    pub fn drain(&mut self, rate_per_sec: f32, dt: f32) {
        self.value = (self.value - rate_per_sec * dt).max(0.0);
    }

    pub fn recover(&mut self, rate_per_sec: f32, dt: f32) {
        self.value = (self.value + rate_per_sec * dt).min(self.max);
    }

    /// Fill ratio 0.0..=1.0 for the HUD gauge.
    pub fn ratio(&self) -> f32 {
        if self.max <= 0.0 { return 0.0; }
        self.value / self.max
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Pos,
    pub facing: Direction,
    pub move_cooldown: u32, // ticks until the next step is allowed
    pub reached_exit: bool,
}

impl Player {
    pub fn new(pos: Pos) -> Self {
        Player {
            pos,
            facing: Direction::Down,
            move_cooldown: 0,
            reached_exit: false,
        }
    }
}

/// Enemy tactic. Escape-mode enemies only ever pursue; Hunter-mode
/// enemies alternate between fleeing the player and seeking the exit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tactic {
    Pursue,
    Flee,
    SeekExit,
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub id: u32,
    pub pos: Pos,
    pub facing: Direction,
    pub tactic: Tactic,
    pub move_cooldown: u32,
    pub alive: bool,
    pub died_at: Option<Instant>,
    /// Cached walking path; front is the current cell while following.
    pub path: VecDeque<Pos>,
    /// Position the cached path was computed toward. `None` forces a
    /// recompute on the next decision.
    pub cached_target: Option<Pos>,
}

impl Enemy {
    pub fn new(id: u32, pos: Pos, tactic: Tactic) -> Self {
        Enemy {
            id,
            pos,
            facing: Direction::Down,
            tactic,
            move_cooldown: 0,
            alive: true,
            died_at: None,
            path: VecDeque::new(),
            cached_target: None,
        }
    }

    pub fn kill(&mut self, now: Instant) {
        self.alive = false;
        self.died_at = Some(now);
        self.path.clear();
        self.cached_target = None;
    }

    /// Eligible to be replaced by a fresh spawn?
    pub fn respawn_due(&self, now: Instant, delay: Duration) -> bool {
        match self.died_at {
            Some(t) => !self.alive && now.duration_since(t) >= delay,
            None => false,
        }
    }

    /// Pop the current cell off the cached path and return the next one,
    /// or None when the path is exhausted (length <= 1).
    pub fn next_path_step(&mut self) -> Option<Pos> {
        if self.path.len() > 1 {
            self.path.pop_front();
            self.path.front().copied()
        } else {
            None
        }
    }
}
