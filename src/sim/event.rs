/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and screen feedback.

use crate::domain::entity::Pos;

#[derive(Clone, Copy, Debug)]
pub enum GameEvent {
    CountdownTick,
    MatchStarted,
    TrapPlaced { pos: Pos },
    TrapKill { pos: Pos, enemy: u32 },
    EnemyCaptured { id: u32 },
    EnemyEscaped { id: u32 },
    EnemyRespawned { id: u32 },
    PlayerEscaped,
    PlayerCaptured,
    TimeUp,
}
