/// The step function: advances a match by one tick.
///
/// Running-phase order, fixed:
///   1. Match timer expiry
///   2. Mode win/loss check (Escape: player at exit; Hunter: enemies at exit)
///   3. Player-enemy contact
///   4. Advance player (movement, trap placement)
///   5. Advance enemies
///   6. Trap lifecycle + trap-enemy collisions (Escape)
///   7. Enemy respawns (Escape)
///
/// `now` is sampled once by the caller and threaded through every timer
/// comparison, so a tick sees one consistent clock.

use std::collections::VecDeque;
use std::time::Instant;

use crate::domain::ai;
use crate::domain::entity::{Direction, Enemy, FrameInput, Pos, Tactic};
use crate::domain::rules::MapView;

use super::event::GameEvent;
use super::maze;
use super::world::{Mode, Outcome, Session, SessionState, SPAWN_MIN_DIST};

// Score events.
const SCORE_TRAP_KILL: i32 = 100;
const SCORE_ESCAPE_BONUS: i32 = 500;
const SCORE_CAPTURE: i32 = 150;
const SCORE_ENEMY_ESCAPED: i32 = -100;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(s: &mut Session, input: FrameInput, now: Instant) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();

    match s.state {
        SessionState::Over(_) => return events,
        SessionState::Countdown { started } => {
            if s.countdown_done(now) {
                s.state = SessionState::Running;
                s.deadline = now + s.tuning.match_duration(s.mode);
                events.push(GameEvent::MatchStarted);
            } else {
                let step = now.duration_since(started).as_secs() as usize;
                if step != s.last_countdown_step {
                    s.last_countdown_step = step;
                    events.push(GameEvent::CountdownTick);
                }
            }
            return events;
        }
        SessionState::Running => {}
    }

    s.tick += 1;

    // 1. Timer
    if now >= s.deadline {
        finish(s, Outcome::TimedOut, &mut events);
        return events;
    }

    // 2. Mode win/loss
    match s.mode {
        Mode::Escape => {
            if s.player.reached_exit {
                s.score += SCORE_ESCAPE_BONUS;
                events.push(GameEvent::PlayerEscaped);
                finish(s, Outcome::PlayerEscaped, &mut events);
                return events;
            }
        }
        Mode::Hunter => {
            let exit = s.map.exit;
            resolve_enemy_exits(s, exit, &mut events);
        }
    }

    // 3. Player-enemy contact
    if resolve_player_contact(s, &mut events) {
        return events;
    }

    // 4-7. Advance
    resolve_player_movement(s, input, now, &mut events);
    resolve_enemy_movement(s);
    if s.mode == Mode::Escape {
        s.traps.update();
        for (pos, id) in trap_kills(s, now) {
            s.score += SCORE_TRAP_KILL;
            events.push(GameEvent::TrapKill { pos, enemy: id });
        }
        resolve_respawns(s, now, &mut events);
    }

    // Hunter mode ends as soon as the score can no longer change.
    if s.mode == Mode::Hunter && s.enemies.is_empty() {
        finish(s, Outcome::TimedOut, &mut events);
    }

    events
}

fn finish(s: &mut Session, outcome: Outcome, events: &mut Vec<GameEvent>) {
    s.state = SessionState::Over(outcome);
    match outcome {
        Outcome::TimedOut => events.push(GameEvent::TimeUp),
        Outcome::PlayerCaptured => events.push(GameEvent::PlayerCaptured),
        Outcome::PlayerEscaped => {} // PlayerEscaped already emitted
    }
}

// ══════════════════════════════════════════════════════════════
// Win/loss resolution
// ══════════════════════════════════════════════════════════════

/// Hunter mode: every enemy standing on the exit slips away. The match
/// continues; the penalty is the only consequence.
fn resolve_enemy_exits(s: &mut Session, exit: Pos, events: &mut Vec<GameEvent>) {
    let mut escaped = Vec::new();
    s.enemies.retain(|e| {
        if e.alive && e.pos == exit {
            escaped.push(e.id);
            false
        } else {
            true
        }
    });
    for id in escaped {
        s.score += SCORE_ENEMY_ESCAPED;
        events.push(GameEvent::EnemyEscaped { id });
    }
}

/// Player touching an enemy: fatal in Escape, a capture in Hunter.
/// Returns true when the match ended.
fn resolve_player_contact(s: &mut Session, events: &mut Vec<GameEvent>) -> bool {
    match s.mode {
        Mode::Escape => {
            if s.enemies.iter().any(|e| e.alive && e.pos == s.player.pos) {
                finish(s, Outcome::PlayerCaptured, events);
                return true;
            }
        }
        Mode::Hunter => {
            let ppos = s.player.pos;
            let mut captured = Vec::new();
            s.enemies.retain(|e| {
                if e.alive && e.pos == ppos {
                    captured.push(e.id);
                    false
                } else {
                    true
                }
            });
            for id in captured {
                s.score += SCORE_CAPTURE;
                events.push(GameEvent::EnemyCaptured { id });
            }
        }
    }
    false
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player_movement(
    s: &mut Session,
    input: FrameInput,
    now: Instant,
    events: &mut Vec<GameEvent>,
) {
    let dt = s.tuning.tick.as_secs_f32();

    // Stamina first, so a sprint press on an empty tank moves at
    // walking pace this very tick.
    let sprinting = input.sprint && s.stamina.can_sprint();
    if sprinting {
        s.stamina.drain(s.tuning.stamina_drain, dt);
    } else {
        s.stamina.recover(s.tuning.stamina_recover, dt);
    }

    // Trap placement is independent of the movement cooldown.
    if s.mode == Mode::Escape && input.place_trap {
        let pos = s.player.pos;
        if s.traps.place(pos, now) {
            events.push(GameEvent::TrapPlaced { pos });
        }
    }

    if s.player.move_cooldown > 0 {
        s.player.move_cooldown -= 1;
        return;
    }

    let dir = match input.direction {
        Some(d) => d,
        None => return,
    };

    // Facing follows the attempt even when the move is blocked.
    s.player.facing = dir;

    let role = s.mode.player_role();
    let next = s.player.pos.step(dir);
    if !s.map.view().passable(role, next) {
        return;
    }

    s.player.pos = next;
    s.player.move_cooldown = if sprinting {
        s.tuning.sprint_move_ticks
    } else {
        s.tuning.player_move_ticks
    };
    if s.map.tile_at(next).is_exit() {
        s.player.reached_exit = true;
    }
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

fn resolve_enemy_movement(s: &mut Session) {
    let role = s.mode.enemy_role();
    let flee_radius = s.tuning.flee_radius;
    let move_ticks = s.tuning.enemy_move_ticks;
    let ppos = s.player.pos;
    let exit = s.map.exit;
    let map = MapView {
        tiles: &s.map.tiles,
        width: s.map.width,
        height: s.map.height,
    };

    for e in s.enemies.iter_mut() {
        if !e.alive {
            continue;
        }
        if e.move_cooldown > 0 {
            e.move_cooldown -= 1;
            continue;
        }

        // Tactic transition happens on decision ticks only.
        if e.tactic != Tactic::Pursue {
            e.tactic = ai::hunted_tactic(e.pos, ppos, flee_radius);
        }

        let next = match e.tactic {
            Tactic::Pursue => follow_path(&map, role, e, ppos),
            Tactic::SeekExit => follow_path(&map, role, e, exit),
            Tactic::Flee => {
                // Fleeing walks off the cached route; drop it so the
                // next seek tick recomputes from wherever we end up.
                e.path.clear();
                e.cached_target = None;
                let step = ai::flee_step(&map, role, e.pos, ppos);
                if step == e.pos { None } else { Some(step) }
            }
        };

        if let Some(next) = next {
            if let Some(dir) = Direction::between(e.pos, next) {
                e.facing = dir;
            }
            e.pos = next;
        }
        e.move_cooldown = move_ticks;
    }
}

/// Pursue `target` along the cached path, recomputing only when the
/// tracked target position changed.
fn follow_path(
    map: &MapView,
    role: crate::domain::entity::Role,
    e: &mut Enemy,
    target: Pos,
) -> Option<Pos> {
    if e.cached_target != Some(target) {
        e.path = VecDeque::from(ai::shortest_path(map, role, e.pos, target));
        e.cached_target = Some(target);
    }
    e.next_path_step()
}

// ══════════════════════════════════════════════════════════════
// Traps and respawns (Escape only)
// ══════════════════════════════════════════════════════════════

fn trap_kills(s: &mut Session, now: Instant) -> Vec<(Pos, u32)> {
    let killed = s.traps.check_collisions(&mut s.enemies, now);
    killed
        .into_iter()
        .filter_map(|id| {
            s.enemies
                .iter()
                .find(|e| e.id == id)
                .map(|e| (e.pos, id))
        })
        .collect()
}

/// Replace each respawn-due enemy with a fresh one. A fresh identity, a
/// fresh path cache; the dead object is dropped.
fn resolve_respawns(s: &mut Session, now: Instant, events: &mut Vec<GameEvent>) {
    let delay = s.tuning.respawn_delay;
    for i in 0..s.enemies.len() {
        if !s.enemies[i].respawn_due(now, delay) {
            continue;
        }
        let mut avoid: Vec<Pos> = s
            .enemies
            .iter()
            .filter(|e| e.alive)
            .map(|e| e.pos)
            .collect();
        avoid.push(s.map.exit);
        avoid.extend(s.traps.traps.iter().map(|t| t.pos));

        if let Some(pos) = maze::random_floor_cell(
            &s.map,
            &mut s.rng,
            s.player.pos,
            SPAWN_MIN_DIST,
            &avoid,
        ) {
            let id = s.next_enemy_id;
            s.next_enemy_id += 1;
            s.enemies[i] = Enemy::new(id, pos, Tactic::Pursue);
            events.push(GameEvent::EnemyRespawned { id });
        }
        // No qualifying cell this tick: retry on the next one.
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::tile::Tile;
    use crate::domain::trap::TrapManager;
    use crate::sim::maze::MazeMap;
    use crate::sim::world::Tuning;
    use crate::domain::entity::{Player, Stamina};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    /// Legend:  '#'=Wall  '.'=Floor  'v'=Vine  'o'=Tunnel  'X'=Exit
    fn map_from(rows: &[&str], start: Pos) -> MazeMap {
        let height = rows.len() as i32;
        let width = rows[0].len() as i32;
        let mut tiles = vec![vec![Tile::Floor; width as usize]; height as usize];
        let mut exit = Pos::new(1, 1);
        for (r, row) in rows.iter().enumerate() {
            for (c, ch) in row.chars().enumerate() {
                tiles[r][c] = match ch {
                    '#' => Tile::Wall,
                    'v' => Tile::Vine,
                    'o' => Tile::Tunnel,
                    'X' => {
                        exit = Pos::new(r as i32, c as i32);
                        Tile::Exit
                    }
                    _ => Tile::Floor,
                };
            }
        }
        MazeMap { tiles, width, height, start, exit }
    }

    fn tuning() -> Tuning {
        Tuning::from_config(&GameConfig::load())
    }

    /// A hand-built session, already Running, with no enemies.
    fn session(mode: Mode, rows: &[&str], start: Pos, now: Instant) -> Session {
        let t = tuning();
        let map = map_from(rows, start);
        Session {
            mode,
            player: Player::new(map.start),
            stamina: Stamina::new(t.stamina_max),
            enemies: Vec::new(),
            traps: TrapManager::new(t.max_traps, t.trap_cooldown, t.trap_anim_step_ticks),
            score: 0,
            state: SessionState::Running,
            deadline: now + t.match_duration(mode),
            last_countdown_step: 0,
            next_enemy_id: 100,
            tick: 0,
            tuning: t,
            rng: StdRng::seed_from_u64(0),
            recorded: false,
            map,
        }
    }

    fn move_input(dir: Direction) -> FrameInput {
        FrameInput { direction: Some(dir), sprint: false, place_trap: false }
    }

    const ARENA: [&str; 5] = [
        "#######",
        "#.....#",
        "#.....#",
        "#....X#",
        "#######",
    ];

    // ── Session machine ──

    #[test]
    fn countdown_runs_then_match_starts() {
        let t0 = Instant::now();
        let mut s = session(Mode::Escape, &ARENA, Pos::new(1, 1), t0);
        s.state = SessionState::Countdown { started: t0 };

        assert!(step(&mut s, FrameInput::default(), t0).is_empty());
        assert!(matches!(s.state, SessionState::Countdown { .. }));

        let ev = step(&mut s, FrameInput::default(), t0 + Duration::from_secs(1));
        assert!(matches!(ev.as_slice(), [GameEvent::CountdownTick]));

        let go = t0 + Duration::from_secs(4);
        let ev = step(&mut s, FrameInput::default(), go);
        assert!(matches!(ev.as_slice(), [GameEvent::MatchStarted]));
        assert_eq!(s.state, SessionState::Running);
        assert_eq!(s.deadline, go + s.tuning.match_duration(Mode::Escape));
    }

    #[test]
    fn timer_expiry_ends_the_match_first() {
        let t0 = Instant::now();
        let mut s = session(Mode::Escape, &ARENA, Pos::new(1, 1), t0);
        // Even standing on the exit, an expired clock wins the order.
        s.player.reached_exit = true;

        let late = s.deadline + Duration::from_millis(1);
        let ev = step(&mut s, FrameInput::default(), late);
        assert!(matches!(ev.as_slice(), [GameEvent::TimeUp]));
        assert_eq!(s.state, SessionState::Over(Outcome::TimedOut));
    }

    #[test]
    fn finished_sessions_ignore_further_steps() {
        let t0 = Instant::now();
        let mut s = session(Mode::Escape, &ARENA, Pos::new(1, 1), t0);
        s.state = SessionState::Over(Outcome::PlayerCaptured);
        let tick = s.tick;
        assert!(step(&mut s, move_input(Direction::Right), t0).is_empty());
        assert_eq!(s.tick, tick);
    }

    // ── Escape outcomes ──

    #[test]
    fn reaching_the_exit_wins_escape_with_bonus() {
        let t0 = Instant::now();
        let mut s = session(Mode::Escape, &ARENA, Pos::new(3, 4), t0);

        // Step onto the exit, then the next tick resolves the win.
        let ev = step(&mut s, move_input(Direction::Right), t0);
        assert!(ev.is_empty());
        assert!(s.player.reached_exit);

        let ev = step(&mut s, FrameInput::default(), t0);
        assert!(matches!(ev.as_slice(), [GameEvent::PlayerEscaped]));
        assert_eq!(s.state, SessionState::Over(Outcome::PlayerEscaped));
        assert_eq!(s.score, SCORE_ESCAPE_BONUS);
    }

    #[test]
    fn enemy_contact_captures_the_escaping_player() {
        let t0 = Instant::now();
        let mut s = session(Mode::Escape, &ARENA, Pos::new(1, 1), t0);
        s.enemies.push(Enemy::new(0, Pos::new(1, 1), Tactic::Pursue));

        let ev = step(&mut s, FrameInput::default(), t0);
        assert!(matches!(ev.as_slice(), [GameEvent::PlayerCaptured]));
        assert_eq!(s.state, SessionState::Over(Outcome::PlayerCaptured));
    }

    #[test]
    fn dead_enemies_do_not_capture() {
        let t0 = Instant::now();
        let mut s = session(Mode::Escape, &ARENA, Pos::new(1, 1), t0);
        let mut e = Enemy::new(0, Pos::new(1, 1), Tactic::Pursue);
        e.kill(t0);
        s.enemies.push(e);

        step(&mut s, FrameInput::default(), t0);
        assert_eq!(s.state, SessionState::Running);
    }

    // ── Hunter outcomes ──

    #[test]
    fn hunter_capture_scores_and_removes_the_enemy() {
        let t0 = Instant::now();
        let mut s = session(Mode::Hunter, &ARENA, Pos::new(2, 2), t0);
        s.enemies.push(Enemy::new(0, Pos::new(2, 2), Tactic::SeekExit));
        s.enemies.push(Enemy::new(1, Pos::new(1, 1), Tactic::SeekExit));

        let ev = step(&mut s, FrameInput::default(), t0);
        assert!(matches!(ev.as_slice(), [GameEvent::EnemyCaptured { id: 0 }]));
        assert_eq!(s.score, SCORE_CAPTURE);
        assert_eq!(s.enemies.len(), 1);
        assert_eq!(s.state, SessionState::Running);
    }

    #[test]
    fn hunter_enemy_on_the_exit_escapes_with_penalty() {
        let t0 = Instant::now();
        let mut s = session(Mode::Hunter, &ARENA, Pos::new(1, 1), t0);
        s.enemies.push(Enemy::new(0, Pos::new(3, 5), Tactic::SeekExit));
        s.enemies.push(Enemy::new(1, Pos::new(2, 1), Tactic::SeekExit));

        let ev = step(&mut s, FrameInput::default(), t0);
        assert!(matches!(ev.first(), Some(GameEvent::EnemyEscaped { id: 0 })));
        assert_eq!(s.score, SCORE_ENEMY_ESCAPED);
        assert_eq!(s.enemies.len(), 1);
    }

    #[test]
    fn hunter_match_ends_when_all_enemies_are_resolved() {
        let t0 = Instant::now();
        let mut s = session(Mode::Hunter, &ARENA, Pos::new(1, 1), t0);
        s.enemies.push(Enemy::new(0, Pos::new(3, 5), Tactic::SeekExit));

        let ev = step(&mut s, FrameInput::default(), t0);
        assert!(matches!(ev.last(), Some(GameEvent::TimeUp)));
        assert_eq!(s.state, SessionState::Over(Outcome::TimedOut));
        assert_eq!(s.score, SCORE_ENEMY_ESCAPED);
    }

    // ── Player movement ──

    #[test]
    fn movement_respects_walls_but_facing_follows_the_attempt() {
        let t0 = Instant::now();
        let mut s = session(Mode::Escape, &ARENA, Pos::new(1, 1), t0);

        step(&mut s, move_input(Direction::Up), t0);
        assert_eq!(s.player.pos, Pos::new(1, 1)); // wall above
        assert_eq!(s.player.facing, Direction::Up);

        step(&mut s, move_input(Direction::Right), t0);
        assert_eq!(s.player.pos, Pos::new(1, 2));
        assert_eq!(s.player.facing, Direction::Right);
    }

    #[test]
    fn movement_cooldown_paces_the_player() {
        let t0 = Instant::now();
        let mut s = session(Mode::Escape, &ARENA, Pos::new(1, 1), t0);

        step(&mut s, move_input(Direction::Right), t0);
        assert_eq!(s.player.pos, Pos::new(1, 2));
        let ticks = s.tuning.player_move_ticks;

        // Held direction does nothing until the cooldown drains.
        for _ in 0..ticks {
            step(&mut s, move_input(Direction::Right), t0);
            assert_eq!(s.player.pos, Pos::new(1, 2));
        }
        step(&mut s, move_input(Direction::Right), t0);
        assert_eq!(s.player.pos, Pos::new(1, 3));
    }

    #[test]
    fn sprint_shortens_the_cooldown_and_drains_stamina() {
        let t0 = Instant::now();
        let mut s = session(Mode::Escape, &ARENA, Pos::new(1, 1), t0);
        let full = s.stamina.value;

        let input = FrameInput {
            direction: Some(Direction::Right),
            sprint: true,
            place_trap: false,
        };
        step(&mut s, input, t0);
        assert_eq!(s.player.pos, Pos::new(1, 2));
        assert_eq!(s.player.move_cooldown, s.tuning.sprint_move_ticks);
        assert!(s.stamina.value < full);
    }

    #[test]
    fn empty_stamina_falls_back_to_walking_pace() {
        let t0 = Instant::now();
        let mut s = session(Mode::Escape, &ARENA, Pos::new(1, 1), t0);
        s.stamina.value = 0.0;

        let input = FrameInput {
            direction: Some(Direction::Right),
            sprint: true,
            place_trap: false,
        };
        step(&mut s, input, t0);
        assert_eq!(s.player.move_cooldown, s.tuning.player_move_ticks);
        // Not sprinting, so the tank recovers instead of draining.
        assert!(s.stamina.value > 0.0);
    }

    #[test]
    fn trap_input_places_at_the_player_cell() {
        let t0 = Instant::now();
        let mut s = session(Mode::Escape, &ARENA, Pos::new(2, 2), t0);

        let input = FrameInput { direction: None, sprint: false, place_trap: true };
        let ev = step(&mut s, input, t0);
        assert!(matches!(
            ev.as_slice(),
            [GameEvent::TrapPlaced { pos }] if *pos == Pos::new(2, 2)
        ));
        // Cooldown running: an immediate second press is refused quietly.
        let t1 = t0 + s.tuning.tick;
        let ev = step(&mut s, input, t1);
        assert!(ev.is_empty());
    }

    #[test]
    fn hunter_mode_ignores_trap_input() {
        let t0 = Instant::now();
        let mut s = session(Mode::Hunter, &ARENA, Pos::new(2, 2), t0);
        s.enemies.push(Enemy::new(0, Pos::new(1, 1), Tactic::SeekExit));

        let input = FrameInput { direction: None, sprint: false, place_trap: true };
        let ev = step(&mut s, input, t0);
        assert!(ev.is_empty());
        assert_eq!(s.traps.live_count(), 0);
    }

    // ── Enemy movement ──

    #[test]
    fn pursuer_closes_in_along_the_shortest_path() {
        let t0 = Instant::now();
        let mut s = session(Mode::Escape, &ARENA, Pos::new(1, 1), t0);
        s.enemies.push(Enemy::new(0, Pos::new(1, 4), Tactic::Pursue));

        step(&mut s, FrameInput::default(), t0);
        assert_eq!(s.enemies[0].pos, Pos::new(1, 3));
        assert_eq!(s.enemies[0].facing, Direction::Left);
        assert_eq!(s.enemies[0].cached_target, Some(Pos::new(1, 1)));
    }

    #[test]
    fn pursuit_path_recomputes_only_when_the_player_moves() {
        let t0 = Instant::now();
        let mut s = session(Mode::Escape, &ARENA, Pos::new(1, 1), t0);
        s.enemies.push(Enemy::new(0, Pos::new(3, 4), Tactic::Pursue));
        s.tuning.enemy_move_ticks = 0; // decide every tick

        step(&mut s, FrameInput::default(), t0);
        let cached = s.enemies[0].path.clone();

        // Player holds still: the next decision continues the same path.
        step(&mut s, FrameInput::default(), t0);
        assert_eq!(s.enemies[0].path.len(), cached.len() - 1);

        // Player moves: the tracked target changes, forcing a recompute.
        s.player.pos = Pos::new(2, 1);
        step(&mut s, FrameInput::default(), t0);
        assert_eq!(s.enemies[0].cached_target, Some(Pos::new(2, 1)));
    }

    #[test]
    fn hunted_enemy_flees_inside_the_radius_and_seeks_beyond_it() {
        let t0 = Instant::now();
        let rows = [
            "############",
            "#..........#",
            "#..........#",
            "#.........X#",
            "############",
        ];
        let mut s = session(Mode::Hunter, &rows, Pos::new(1, 1), t0);
        s.tuning.flee_radius = 3;
        s.enemies.push(Enemy::new(0, Pos::new(1, 3), Tactic::SeekExit));

        // Distance 2 <= 3: flee. The best step moves away from the player.
        step(&mut s, FrameInput::default(), t0);
        assert_eq!(s.enemies[0].tactic, Tactic::Flee);
        assert!(s.enemies[0].pos.manhattan(s.player.pos) > 2);
        assert!(s.enemies[0].path.is_empty());

        // Teleport the threat far away: next decision seeks the exit.
        s.player.pos = Pos::new(1, 1);
        s.enemies[0].pos = Pos::new(3, 8);
        s.enemies[0].move_cooldown = 0;
        step(&mut s, FrameInput::default(), t0);
        assert_eq!(s.enemies[0].tactic, Tactic::SeekExit);
        assert_eq!(s.enemies[0].cached_target, Some(s.map.exit));
    }

    #[test]
    fn dead_enemies_do_not_move() {
        let t0 = Instant::now();
        let mut s = session(Mode::Escape, &ARENA, Pos::new(1, 1), t0);
        let mut e = Enemy::new(0, Pos::new(3, 4), Tactic::Pursue);
        e.kill(t0);
        s.enemies.push(e);

        step(&mut s, FrameInput::default(), t0);
        assert_eq!(s.enemies[0].pos, Pos::new(3, 4));
    }

    // ── Traps and respawns ──

    #[test]
    fn enemy_walking_onto_a_trap_dies_and_scores() {
        let t0 = Instant::now();
        let mut s = session(Mode::Escape, &ARENA, Pos::new(1, 1), t0);
        assert!(s.traps.place(Pos::new(2, 3), t0));
        let mut e = Enemy::new(7, Pos::new(2, 3), Tactic::Pursue);
        e.move_cooldown = 10; // hold it on the trap this tick
        s.enemies.push(e);

        let ev = step(&mut s, FrameInput::default(), t0 + Duration::from_millis(50));
        assert!(ev.iter().any(|e| matches!(e, GameEvent::TrapKill { enemy: 7, .. })));
        assert!(!s.enemies[0].alive);
        assert_eq!(s.score, SCORE_TRAP_KILL);
    }

    #[test]
    fn respawn_waits_out_the_delay_then_relocates() {
        let t0 = Instant::now();
        let mut rows = Vec::new();
        rows.push("####################".to_string());
        for _ in 0..8 {
            rows.push("#..................#".to_string());
        }
        rows.push("####################".to_string());
        let rows: Vec<&str> = rows.iter().map(|r| r.as_str()).collect();

        let mut s = session(Mode::Escape, &rows, Pos::new(1, 1), t0);
        s.map.tiles[8][18] = Tile::Exit;
        s.map.exit = Pos::new(8, 18);
        let mut e = Enemy::new(0, Pos::new(4, 4), Tactic::Pursue);
        e.kill(t0);
        s.enemies.push(e);

        // One second short of the delay: still dead.
        let ev = step(&mut s, FrameInput::default(), t0 + Duration::from_secs(9));
        assert!(ev.is_empty());
        assert!(!s.enemies[0].alive);

        // At the delay: replaced with a fresh identity, far from the player.
        let ev = step(&mut s, FrameInput::default(), t0 + Duration::from_secs(10));
        assert!(matches!(ev.as_slice(), [GameEvent::EnemyRespawned { .. }]));
        let fresh = &s.enemies[0];
        assert!(fresh.alive);
        assert_ne!(fresh.id, 0);
        assert!(fresh.pos.manhattan(s.player.pos) >= SPAWN_MIN_DIST);
        assert!(fresh.path.is_empty());
        assert_eq!(fresh.cached_target, None);
    }
}
