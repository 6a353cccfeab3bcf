/// Trap entity and placement manager.
///
/// Lifecycle: `Active -> Triggering -> Removed`.
///   1. **Active** — armed, waiting. An enemy stepping on it dies and
///      starts the trigger animation. One kill per trap.
///   2. **Triggering** — sprite sequence 1,2,3,4,5,5,4,3,2,1 advancing
///      one step every `ticks_per_frame` ticks. Harmless.
///   3. **Removed** — purged on the next manager update.
///
/// Placement is cooldown-gated. Purging any trap reopens the gate at
/// once, so evicting the oldest trap at the cap makes the next placement
/// succeed on the following tick.

use std::time::{Duration, Instant};

use super::entity::{Enemy, Pos};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TrapState {
    Active,
    Triggering,
    Removed,
}

/// Trigger animation sprite ids, in playback order.
const TRIGGER_FRAMES: [u8; 10] = [1, 2, 3, 4, 5, 5, 4, 3, 2, 1];

#[derive(Clone, Debug)]
pub struct Trap {
    pub pos: Pos,
    pub state: TrapState,
    frame_idx: usize,
    frame_ticks: u32,
}

impl Trap {
    fn new(pos: Pos) -> Self {
        Trap {
            pos,
            state: TrapState::Active,
            frame_idx: 0,
            frame_ticks: 0,
        }
    }

    fn trigger(&mut self) {
        self.state = TrapState::Triggering;
        self.frame_idx = 0;
        self.frame_ticks = 0;
    }

    /// Current sprite id (1..=5) of the trigger animation.
    pub fn anim_sprite(&self) -> u8 {
        TRIGGER_FRAMES[self.frame_idx.min(TRIGGER_FRAMES.len() - 1)]
    }

    /// Advance the trigger animation one tick. Returns true when the
    /// sequence just finished (state flips to Removed).
    fn tick_animation(&mut self, ticks_per_frame: u32) -> bool {
        self.frame_ticks += 1;
        if self.frame_ticks >= ticks_per_frame.max(1) {
            self.frame_ticks = 0;
            self.frame_idx += 1;
            if self.frame_idx >= TRIGGER_FRAMES.len() {
                self.state = TrapState::Removed;
                return true;
            }
        }
        false
    }
}

pub struct TrapManager {
    pub traps: Vec<Trap>,
    max_traps: usize,
    cooldown: Duration,
    ticks_per_frame: u32,
    /// Last successful placement; `None` means the gate is open.
    last_place: Option<Instant>,
}

impl TrapManager {
    pub fn new(max_traps: usize, cooldown: Duration, ticks_per_frame: u32) -> Self {
        TrapManager {
            traps: Vec::new(),
            max_traps,
            cooldown,
            ticks_per_frame,
            last_place: None,
        }
    }

    pub fn can_place(&self, now: Instant) -> bool {
        match self.last_place {
            Some(t) => now.duration_since(t) >= self.cooldown,
            None => true,
        }
    }

    /// Cooldown progress for the HUD gauge: 1.0 = ready to place.
    pub fn cooldown_ratio(&self, now: Instant) -> f32 {
        match self.last_place {
            None => 1.0,
            Some(t) => {
                let elapsed = now.duration_since(t).as_secs_f32();
                (elapsed / self.cooldown.as_secs_f32()).min(1.0)
            }
        }
    }

    /// Traps not yet purged (Active or Triggering).
    pub fn live_count(&self) -> usize {
        self.traps.iter().filter(|t| t.state != TrapState::Removed).count()
    }

    pub fn cap(&self) -> usize {
        self.max_traps
    }

    /// Is a non-removed trap sitting on `pos`?
    pub fn occupies(&self, pos: Pos) -> bool {
        self.traps
            .iter()
            .any(|t| t.state != TrapState::Removed && t.pos == pos)
    }

    /// Try to arm a trap at `pos`. Refused while the cooldown runs or when
    /// the cell already holds a live trap. At the cap, the oldest
    /// still-present trap is evicted (forced to Removed) to make room.
    pub fn place(&mut self, pos: Pos, now: Instant) -> bool {
        if !self.can_place(now) {
            return false;
        }
        if self.occupies(pos) {
            return false;
        }
        if self.live_count() >= self.max_traps {
            if let Some(oldest) = self
                .traps
                .iter_mut()
                .find(|t| t.state != TrapState::Removed)
            {
                oldest.state = TrapState::Removed;
            }
        }
        self.traps.push(Trap::new(pos));
        self.last_place = Some(now);
        true
    }

    /// Advance trigger animations, then purge `Removed` traps. Any purge
    /// reopens the placement gate.
    pub fn update(&mut self) {
        for t in self.traps.iter_mut() {
            if t.state == TrapState::Triggering {
                t.tick_animation(self.ticks_per_frame);
            }
        }
        let before = self.traps.len();
        self.traps.retain(|t| t.state != TrapState::Removed);
        if self.traps.len() < before {
            self.last_place = None;
        }
    }

    /// Each Active trap kills at most one living enemy standing on it and
    /// starts its trigger animation. Returns the ids of the killed.
    pub fn check_collisions(&mut self, enemies: &mut [Enemy], now: Instant) -> Vec<u32> {
        let mut killed = Vec::new();
        for t in self.traps.iter_mut() {
            if t.state != TrapState::Active {
                continue;
            }
            for e in enemies.iter_mut() {
                if e.alive && e.pos == t.pos {
                    e.kill(now);
                    t.trigger();
                    killed.push(e.id);
                    break;
                }
            }
        }
        killed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Tactic;

    fn mgr() -> TrapManager {
        TrapManager::new(3, Duration::from_secs(5), 2)
    }

    #[test]
    fn cooldown_gates_placement() {
        let t0 = Instant::now();
        let mut m = mgr();

        assert!(m.place(Pos::new(1, 1), t0));
        assert!(!m.place(Pos::new(1, 2), t0 + Duration::from_secs(1)));
        assert!(!m.place(Pos::new(1, 2), t0 + Duration::from_millis(4999)));
        assert!(m.place(Pos::new(1, 2), t0 + Duration::from_secs(5)));
        assert_eq!(m.live_count(), 2);
    }

    #[test]
    fn occupied_cell_is_refused() {
        let t0 = Instant::now();
        let mut m = mgr();

        assert!(m.place(Pos::new(2, 3), t0));
        // cooldown elapsed, but the cell still holds a live trap
        assert!(!m.place(Pos::new(2, 3), t0 + Duration::from_secs(6)));
        assert!(m.place(Pos::new(2, 4), t0 + Duration::from_secs(6)));
    }

    #[test]
    fn cap_evicts_the_oldest() {
        let t0 = Instant::now();
        let mut m = mgr();

        assert!(m.place(Pos::new(1, 1), t0));
        assert!(m.place(Pos::new(1, 2), t0 + Duration::from_secs(5)));
        assert!(m.place(Pos::new(1, 3), t0 + Duration::from_secs(10)));
        assert_eq!(m.live_count(), 3);

        // 4th placement at the cap: the oldest is evicted
        assert!(m.place(Pos::new(1, 4), t0 + Duration::from_secs(15)));
        assert_eq!(m.live_count(), 3);
        assert!(!m.occupies(Pos::new(1, 1)));
        assert!(m.occupies(Pos::new(1, 4)));
    }

    #[test]
    fn eviction_purge_reopens_the_gate() {
        let t0 = Instant::now();
        let mut m = mgr();

        assert!(m.place(Pos::new(1, 1), t0));
        assert!(m.place(Pos::new(1, 2), t0 + Duration::from_secs(5)));
        assert!(m.place(Pos::new(1, 3), t0 + Duration::from_secs(10)));
        assert!(m.place(Pos::new(1, 4), t0 + Duration::from_secs(15)));

        // the evicted trap is purged on the next update, which clears the
        // cooldown, so a placement one tick later succeeds immediately
        let next_tick = t0 + Duration::from_millis(15_050);
        assert!(!m.can_place(next_tick));
        m.update();
        assert!(m.can_place(next_tick));
        assert!(m.place(Pos::new(1, 5), next_tick));
    }

    #[test]
    fn one_kill_per_trap_per_check() {
        let t0 = Instant::now();
        let mut m = mgr();
        assert!(m.place(Pos::new(4, 4), t0));

        let mut enemies = vec![
            Enemy::new(0, Pos::new(4, 4), Tactic::Pursue),
            Enemy::new(1, Pos::new(4, 4), Tactic::Pursue),
        ];

        let killed = m.check_collisions(&mut enemies, t0);
        assert_eq!(killed, vec![0]);
        assert!(!enemies[0].alive);
        assert!(enemies[1].alive);
        assert_eq!(m.traps[0].state, TrapState::Triggering);

        // the trap is no longer armed; the second enemy survives
        let killed = m.check_collisions(&mut enemies, t0);
        assert!(killed.is_empty());
        assert!(enemies[1].alive);
    }

    #[test]
    fn trigger_animation_runs_to_removal() {
        let t0 = Instant::now();
        let mut m = mgr();
        assert!(m.place(Pos::new(2, 2), t0));

        let mut enemies = vec![Enemy::new(0, Pos::new(2, 2), Tactic::Pursue)];
        m.check_collisions(&mut enemies, t0);
        assert_eq!(m.traps[0].anim_sprite(), 1);

        // 10 frames at 2 ticks each: gone after the 20th update
        for _ in 0..19 {
            m.update();
        }
        assert_eq!(m.live_count(), 1);
        assert_eq!(m.traps[0].state, TrapState::Triggering);
        assert_eq!(m.traps[0].anim_sprite(), 1); // tail of the sequence

        m.update();
        assert_eq!(m.live_count(), 0);
        assert!(m.traps.is_empty());
        // completion purge also reopens the gate
        assert!(m.can_place(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn sprite_sequence_ramps_up_then_down() {
        let t0 = Instant::now();
        let mut m = mgr();
        assert!(m.place(Pos::new(2, 2), t0));
        let mut enemies = vec![Enemy::new(0, Pos::new(2, 2), Tactic::Pursue)];
        m.check_collisions(&mut enemies, t0);

        let mut seen = Vec::new();
        seen.push(m.traps[0].anim_sprite());
        for _ in 0..18 {
            m.update();
            seen.push(m.traps[0].anim_sprite());
        }
        // every 2 ticks the sprite advances through 1..5 and back
        assert_eq!(seen[0], 1);
        assert_eq!(seen[8], 5);
        assert_eq!(seen[10], 5);
        assert_eq!(seen[18], 1);
        assert_eq!(*seen.iter().max().unwrap(), 5);
    }
}
