/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEventKind};

use config::GameConfig;
use domain::entity::{Direction, FrameInput};
use sim::event::GameEvent;
use sim::scores;
use sim::step;
use sim::world::{Mode, Phase, Session, SessionState, Tuning, WorldState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Longest name accepted on the name-entry screen.
const NAME_MAX: usize = 12;

fn main() {
    let config = GameConfig::load();
    let tuning = Tuning::from_config(&config);

    let mut world = WorldState::new(tuning);
    reload_boards(&mut world);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new(config.audio.volume);

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Mazebound!");
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let mut last_tick = Instant::now();
    let tick_rate = world.tuning.tick;

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }

        // One clock sample drives this whole frame: meta handling,
        // simulation timers and the HUD all agree on "now".
        let now = Instant::now();

        if handle_meta(world, &kb, &gp, now) {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            world.anim_tick = world.anim_tick.wrapping_add(1);

            let mut finished: Option<(Mode, i32)> = None;
            if world.phase == Phase::Match {
                if let Some(session) = world.session.as_mut() {
                    let frame_input = FrameInput {
                        direction: detect_direction(&kb, &gp),
                        sprint: kb.sprint_held() || gp.sprint_held(),
                        place_trap: kb.any_pressed(KEYS_TRAP) || gp.trap_pressed(),
                    };
                    let events = step::step(session, frame_input, now);
                    process_sound_events(sound, &events);

                    if matches!(session.state, SessionState::Over(_)) && !session.recorded {
                        session.recorded = true;
                        finished = Some((session.mode, session.score));
                    }
                }
            }

            if let Some((mode, score)) = finished {
                let board = scores::record(mode, &world.player_name, score);
                match mode {
                    Mode::Escape => world.scores_escape = board,
                    Mode::Hunter => world.scores_hunter = board,
                }
            }

            last_tick = Instant::now();
        }

        renderer.render(world, now)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::CountdownTick => sfx.play_countdown(),
            GameEvent::MatchStarted => sfx.play_start(),
            GameEvent::TrapPlaced { .. } => sfx.play_trap_place(),
            GameEvent::TrapKill { .. } => sfx.play_trap_kill(),
            GameEvent::EnemyCaptured { .. } => sfx.play_capture(),
            GameEvent::EnemyEscaped { .. } => sfx.play_enemy_escaped(),
            GameEvent::EnemyRespawned { .. } => sfx.play_respawn(),
            GameEvent::PlayerEscaped => sfx.play_win(),
            GameEvent::PlayerCaptured => sfx.play_caught(),
            GameEvent::TimeUp => sfx.play_time_up(),
        }
    }
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_TRAP: &[KeyCode] = &[KeyCode::Char(' ')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];

/// Held movement, with a fixed priority when several keys are down:
/// up, then down, then left, then right.
fn detect_direction(kb: &InputState, gp: &GamepadState) -> Option<Direction> {
    if kb.any_held(KEYS_UP) || kb.any_pressed(KEYS_UP) || gp.up_held() {
        Some(Direction::Up)
    } else if kb.any_held(KEYS_DOWN) || kb.any_pressed(KEYS_DOWN) || gp.down_held() {
        Some(Direction::Down)
    } else if kb.any_held(KEYS_LEFT) || kb.any_pressed(KEYS_LEFT) || gp.left_held() {
        Some(Direction::Left)
    } else if kb.any_held(KEYS_RIGHT) || kb.any_pressed(KEYS_RIGHT) || gp.right_held() {
        Some(Direction::Right)
    } else {
        None
    }
}

fn reload_boards(world: &mut WorldState) {
    world.scores_escape = scores::top(Mode::Escape, scores::SHOWN);
    world.scores_hunter = scores::top(Mode::Hunter, scores::SHOWN);
}

fn start_match(world: &mut WorldState, now: Instant) {
    let mode = world.selected_mode();
    world.session = Some(Session::new(mode, world.tuning.clone(), now));
    world.phase = Phase::Match;
}

fn return_to_title(world: &mut WorldState) {
    world.session = None;
    world.phase = Phase::Title;
    world.anim_tick = 0;
}

/// Screen navigation and other edge-triggered input. Returns true to quit.
fn handle_meta(world: &mut WorldState, kb: &InputState, gp: &GamepadState, now: Instant) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let esc = kb.any_pressed(&[KeyCode::Esc]) || gp.cancel_pressed();

    match world.phase {
        // ── Title Screen ──
        Phase::Title => {
            if confirm {
                world.phase = Phase::ModeSelect;
                world.anim_tick = 0;
            } else if kb.any_pressed(&[KeyCode::Char('h'), KeyCode::Char('H')]) {
                reload_boards(world);
                world.phase = Phase::HighScores;
            } else if kb.any_pressed(&[KeyCode::Char('q'), KeyCode::Char('Q')]) || esc {
                return true;
            }
        }

        // ── Mode Select ──
        Phase::ModeSelect => {
            if kb.any_pressed(&[KeyCode::Up]) || gp.up_held() {
                world.mode_cursor = 0;
            } else if kb.any_pressed(&[KeyCode::Down]) || gp.down_held() {
                world.mode_cursor = 1;
            } else if confirm {
                world.phase = Phase::NameEntry;
                world.anim_tick = 0;
            } else if esc {
                return_to_title(world);
            }
        }

        // ── Name Entry ──
        Phase::NameEntry => {
            for key in &kb.raw_events {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                match key.code {
                    KeyCode::Char(c)
                        if (c.is_ascii_graphic() || c == ' ')
                            && world.player_name.chars().count() < NAME_MAX =>
                    {
                        world.player_name.push(c);
                    }
                    KeyCode::Backspace => {
                        world.player_name.pop();
                    }
                    _ => {}
                }
            }
            if confirm {
                start_match(world, now);
            } else if esc {
                world.phase = Phase::ModeSelect;
            }
        }

        // ── High Scores ──
        Phase::HighScores => {
            if esc || confirm {
                return_to_title(world);
            }
        }

        // ── Match ──
        Phase::Match => {
            let over = world
                .session
                .as_ref()
                .map(|s| matches!(s.state, SessionState::Over(_)))
                .unwrap_or(true);

            if over {
                if confirm {
                    // Replay: same mode, same name, fresh maze.
                    start_match(world, now);
                } else if esc {
                    return_to_title(world);
                }
            } else if esc {
                // Aborted matches record nothing.
                return_to_title(world);
            }
        }
    }

    false
}
