/// WorldState: the application state, and Session: one running match.
///
/// ## Ownership
///
/// The Session owns everything a match mutates: the generated map, the
/// player, the enemy set, the trap manager, the score and the RNG. Menu
/// screens never touch a Session; a finished or aborted Session is simply
/// dropped. All timers (match deadline, trap cooldown, respawn delay)
/// compare against a single `now` sampled once per tick.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::GameConfig;
use crate::domain::entity::{Enemy, Player, Pos, Role, Stamina, Tactic};
use crate::domain::trap::TrapManager;

use super::maze::{self, MazeMap};
use super::scores::ScoreEntry;

/// The two match modes. Hunter inverts the Escape roles.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Escape,
    Hunter,
}

impl Mode {
    pub fn player_role(self) -> Role {
        match self {
            Mode::Escape => Role::Runner,
            Mode::Hunter => Role::Hunter,
        }
    }

    pub fn enemy_role(self) -> Role {
        match self {
            Mode::Escape => Role::Hunter,
            Mode::Hunter => Role::Runner,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Escape => "ESCAPE",
            Mode::Hunter => "HUNTER",
        }
    }
}

/// Application screens. The in-match sub-states (countdown, running,
/// finished) live in `SessionState`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    ModeSelect,
    NameEntry,
    HighScores,
    Match,
}

/// How a match ended.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    TimedOut,
    PlayerCaptured,
    PlayerEscaped,
}

/// Session lifecycle: Countdown -> Running -> Over(outcome).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionState {
    Countdown { started: Instant },
    Running,
    Over(Outcome),
}

/// Countdown overlay labels, one second each.
pub const COUNTDOWN_STEPS: [&str; 4] = ["3", "2", "1", "GO!"];
const COUNTDOWN_STEP_SECS: u64 = 1;

/// Minimum Manhattan distance between a spawned enemy and the player.
pub const SPAWN_MIN_DIST: i32 = 5;

/// Config-derived tuning, copied into the Session at match start so a
/// config reload never changes a match in flight.
#[derive(Clone, Debug)]
pub struct Tuning {
    pub tick: Duration,
    pub player_move_ticks: u32,
    pub sprint_move_ticks: u32,
    pub enemy_move_ticks: u32,
    pub escape_secs: u64,
    pub hunter_secs: u64,
    pub escape_enemies: usize,
    pub hunter_enemies: usize,
    pub max_traps: usize,
    pub trap_cooldown: Duration,
    pub trap_anim_step_ticks: u32,
    pub stamina_max: f32,
    pub stamina_drain: f32,
    pub stamina_recover: f32,
    pub flee_radius: i32,
    pub respawn_delay: Duration,
}

impl Tuning {
    pub fn from_config(cfg: &GameConfig) -> Self {
        Tuning {
            tick: Duration::from_millis(cfg.speed.tick_rate_ms),
            player_move_ticks: cfg.speed.player_move_ticks,
            sprint_move_ticks: cfg.speed.sprint_move_ticks,
            enemy_move_ticks: cfg.speed.enemy_move_ticks,
            escape_secs: cfg.session.escape_seconds,
            hunter_secs: cfg.session.hunter_seconds,
            escape_enemies: cfg.session.escape_enemies,
            hunter_enemies: cfg.session.hunter_enemies,
            max_traps: cfg.traps.max_traps,
            trap_cooldown: Duration::from_secs_f32(cfg.traps.cooldown_secs),
            trap_anim_step_ticks: cfg.traps.anim_step_ticks,
            stamina_max: cfg.stamina.max,
            stamina_drain: cfg.stamina.drain_per_sec,
            stamina_recover: cfg.stamina.recover_per_sec,
            flee_radius: cfg.enemies.flee_radius,
            respawn_delay: Duration::from_secs(cfg.enemies.respawn_seconds),
        }
    }

    pub fn match_duration(&self, mode: Mode) -> Duration {
        match mode {
            Mode::Escape => Duration::from_secs(self.escape_secs),
            Mode::Hunter => Duration::from_secs(self.hunter_secs),
        }
    }

    pub fn enemy_count(&self, mode: Mode) -> usize {
        match mode {
            Mode::Escape => self.escape_enemies,
            Mode::Hunter => self.hunter_enemies,
        }
    }
}

/// One match: map, agents, traps, score, timers.
pub struct Session {
    pub mode: Mode,
    pub map: MazeMap,
    pub player: Player,
    pub stamina: Stamina,
    pub enemies: Vec<Enemy>,
    pub traps: TrapManager,
    pub score: i32,
    pub state: SessionState,
    /// Match end time; meaningful once Running.
    pub deadline: Instant,
    pub last_countdown_step: usize,
    pub next_enemy_id: u32,
    pub tick: u64,
    pub tuning: Tuning,
    pub rng: StdRng,
    /// Final score handed to the leaderboard (set once).
    pub recorded: bool,
}

impl Session {
    pub fn new(mode: Mode, tuning: Tuning, now: Instant) -> Self {
        Self::with_rng(mode, tuning, now, StdRng::from_entropy())
    }

    pub fn with_rng(mode: Mode, tuning: Tuning, now: Instant, mut rng: StdRng) -> Self {
        let map = maze::generate(mode, &mut rng);
        let player = Player::new(map.start);
        let stamina = Stamina::new(tuning.stamina_max);
        let traps = TrapManager::new(
            tuning.max_traps,
            tuning.trap_cooldown,
            tuning.trap_anim_step_ticks,
        );

        let mut session = Session {
            mode,
            map,
            player,
            stamina,
            enemies: Vec::new(),
            traps,
            score: 0,
            state: SessionState::Countdown { started: now },
            deadline: now,
            last_countdown_step: 0,
            next_enemy_id: 0,
            tick: 0,
            tuning,
            rng,
            recorded: false,
        };
        session.spawn_initial_enemies();
        session
    }

    fn spawn_initial_enemies(&mut self) {
        let count = self.tuning.enemy_count(self.mode);
        let tactic = match self.mode {
            Mode::Escape => Tactic::Pursue,
            Mode::Hunter => Tactic::SeekExit,
        };
        for _ in 0..count {
            let avoid: Vec<Pos> = self
                .enemies
                .iter()
                .map(|e| e.pos)
                .chain(std::iter::once(self.map.exit))
                .collect();
            if let Some(pos) = maze::random_floor_cell(
                &self.map,
                &mut self.rng,
                self.player.pos,
                SPAWN_MIN_DIST,
                &avoid,
            ) {
                let id = self.next_enemy_id;
                self.next_enemy_id += 1;
                self.enemies.push(Enemy::new(id, pos, tactic));
            }
            // A failed search just yields one enemy fewer; the 24x18
            // maps have plenty of floor, so this is theoretical.
        }
    }

    /// Current countdown overlay label, or None once past the countdown.
    pub fn countdown_label(&self, now: Instant) -> Option<&'static str> {
        match self.state {
            SessionState::Countdown { started } => {
                let step = (now.duration_since(started).as_secs()
                    / COUNTDOWN_STEP_SECS) as usize;
                COUNTDOWN_STEPS.get(step).copied()
            }
            _ => None,
        }
    }

    /// Has the countdown run its course?
    pub fn countdown_done(&self, now: Instant) -> bool {
        match self.state {
            SessionState::Countdown { started } => {
                now.duration_since(started).as_secs()
                    >= COUNTDOWN_STEPS.len() as u64 * COUNTDOWN_STEP_SECS
            }
            _ => true,
        }
    }

    /// Time left on the match clock (zero once past the deadline or
    /// before Running).
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.state {
            SessionState::Running | SessionState::Over(_) => {
                self.deadline.saturating_duration_since(now)
            }
            SessionState::Countdown { .. } => self.tuning.match_duration(self.mode),
        }
    }

    pub fn living_enemies(&self) -> usize {
        self.enemies.iter().filter(|e| e.alive).count()
    }
}

/// Everything the application tracks across screens.
pub struct WorldState {
    pub phase: Phase,
    pub mode_cursor: usize, // 0 = Escape, 1 = Hunter
    pub player_name: String,
    pub session: Option<Session>,
    pub tuning: Tuning,
    /// Blink/animation counter for menu screens.
    pub anim_tick: u32,
    /// Cached leaderboards for the high-score screen.
    pub scores_escape: Vec<ScoreEntry>,
    pub scores_hunter: Vec<ScoreEntry>,
}

impl WorldState {
    pub fn new(tuning: Tuning) -> Self {
        WorldState {
            phase: Phase::Title,
            mode_cursor: 0,
            player_name: String::new(),
            session: None,
            tuning,
            anim_tick: 0,
            scores_escape: Vec::new(),
            scores_hunter: Vec::new(),
        }
    }

    pub fn selected_mode(&self) -> Mode {
        if self.mode_cursor == 0 { Mode::Escape } else { Mode::Hunter }
    }
}
