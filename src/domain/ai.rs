/// Enemy AI — BFS pathfinding and flee scoring over the capability table.
///
/// Three tactics use it:
///   1. **Pursue** (Escape mode) — shortest path to the player's cell.
///   2. **SeekExit** (Hunter mode) — shortest path to the exit.
///   3. **Flee** (Hunter mode) — single greedy step away from the player.
///
/// Paths are cached by the caller and recomputed only when the tracked
/// target position changes; `hunted_tactic` is the transition function
/// between the two Hunter-mode tactics.

use std::collections::VecDeque;

use super::entity::{Pos, Role, Tactic};
use super::rules::MapView;

/// Neighbor enumeration order: up, down, left, right. This order is the
/// tie-break for equal-length paths and for equal flee distances.
const DIRS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// BFS shortest path from `start` to `goal` for `role`.
///
/// The result always starts with `start`; an unreachable or out-of-bounds
/// goal yields the degenerate self-path `[start]`. The goal cell itself
/// must be enterable by the role to be reachable.
pub fn shortest_path(map: &MapView, role: Role, start: Pos, goal: Pos) -> Vec<Pos> {
    if start == goal || !map.in_bounds(goal) {
        return vec![start];
    }

    let w = map.width as usize;
    let h = map.height as usize;
    let mut visited = vec![vec![false; w]; h];
    let mut parent: Vec<Vec<Option<Pos>>> = vec![vec![None; w]; h];

    visited[start.row as usize][start.col as usize] = true;

    let mut queue: VecDeque<Pos> = VecDeque::with_capacity(256);
    queue.push_back(start);

    while let Some(cur) = queue.pop_front() {
        for &(dr, dc) in &DIRS {
            let next = Pos::new(cur.row + dr, cur.col + dc);
            if !map.passable(role, next) {
                continue;
            }
            let (nr, nc) = (next.row as usize, next.col as usize);
            if visited[nr][nc] {
                continue;
            }
            visited[nr][nc] = true;
            parent[nr][nc] = Some(cur);
            if next == goal {
                return reconstruct(&parent, start, goal);
            }
            queue.push_back(next);
        }
    }

    vec![start]
}

fn reconstruct(parent: &[Vec<Option<Pos>>], start: Pos, goal: Pos) -> Vec<Pos> {
    let mut path = vec![goal];
    let mut cur = goal;
    while cur != start {
        match parent[cur.row as usize][cur.col as usize] {
            Some(p) => {
                path.push(p);
                cur = p;
            }
            None => break, // unreachable by construction
        }
    }
    path.reverse();
    path
}

/// One greedy flee step: of the passable neighbors, the one maximizing
/// Manhattan distance to `threat`. Strictly-greater comparison, so ties
/// keep the first candidate in enumeration order. With no passable
/// neighbor the agent stays put.
pub fn flee_step(map: &MapView, role: Role, start: Pos, threat: Pos) -> Pos {
    let mut best = start;
    let mut best_dist = 0;
    for &(dr, dc) in &DIRS {
        let next = Pos::new(start.row + dr, start.col + dc);
        if !map.passable(role, next) {
            continue;
        }
        let d = next.manhattan(threat);
        if d > best_dist {
            best_dist = d;
            best = next;
        }
    }
    best
}

/// Hunter-mode tactic transition: flee when the player is within the flee
/// radius, otherwise head for the exit. Re-evaluated live on every
/// decision tick; there is no hysteresis band.
pub fn hunted_tactic(enemy: Pos, player: Pos, flee_radius: i32) -> Tactic {
    if enemy.manhattan(player) <= flee_radius {
        Tactic::Flee
    } else {
        Tactic::SeekExit
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
