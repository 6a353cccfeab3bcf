/// Traversal rules — truth-table driven.
///
/// Pure functions operating on map state — no side effects.
/// These encode "what is legal" without performing the move.
///
/// ## Capability Table
///
/// One row per role. A move is legal iff the destination is in bounds
/// AND the role's row allows the destination tile.
///
/// ┌─────────┬───────┬──────┬──────┬────────┬──────┐
/// │ Role    │ Floor │ Wall │ Vine │ Tunnel │ Exit │
/// ├─────────┼───────┼──────┼──────┼────────┼──────┤
/// │ Runner  │ ALLOW │ deny │ deny │ ALLOW  │ ALLOW│
/// │ Hunter  │ ALLOW │ deny │ ALLOW│ deny   │ deny │
/// └─────────┴───────┴──────┴──────┴────────┴──────┘
///
/// Out-of-bounds destinations read as `Wall`, so they are denied for
/// every role without a separate check.
///
/// Role assignment is the mode's job: Escape gives the player Runner and
/// enemies Hunter; Hunter mode inverts both.

use super::entity::{Direction, Pos, Role};
use super::tile::Tile;

/// Immutable view of the tile map for rule queries.
pub struct MapView<'a> {
    pub tiles: &'a Vec<Vec<Tile>>,
    pub width: i32,
    pub height: i32,
}

impl<'a> MapView<'a> {
    pub fn in_bounds(&self, p: Pos) -> bool {
        p.row >= 0 && p.row < self.height && p.col >= 0 && p.col < self.width
    }

    pub fn tile_at(&self, p: Pos) -> Tile {
        if !self.in_bounds(p) {
            return Tile::Wall; // out of bounds = wall
        }
        self.tiles[p.row as usize][p.col as usize]
    }

    /// May `role` occupy cell `p`? Bounds-checked.
    pub fn passable(&self, role: Role, p: Pos) -> bool {
        self.in_bounds(p) && can_enter(role, self.tile_at(p))
    }
}

/// The capability table itself. See the header for the full matrix.
pub fn can_enter(role: Role, tile: Tile) -> bool {
    match (role, tile) {
        (_, Tile::Floor) => true,
        (_, Tile::Wall) => false,
        (Role::Runner, Tile::Tunnel) => true,
        (Role::Runner, Tile::Exit) => true,
        (Role::Runner, Tile::Vine) => false,
        (Role::Hunter, Tile::Vine) => true,
        (Role::Hunter, Tile::Tunnel) => false,
        (Role::Hunter, Tile::Exit) => false,
    }
}

/// Is a single step from `from` toward `dir` legal for `role`?
pub fn can_move(map: &MapView, role: Role, from: Pos, dir: Direction) -> bool {
    map.passable(role, from.step(dir))
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::Tile;

    /// Helper: build a tile grid from a string diagram.
    /// Legend:  '#'=Wall  '.'=Floor  'v'=Vine  'o'=Tunnel  'X'=Exit
    fn map_from(rows: &[&str]) -> (Vec<Vec<Tile>>, i32, i32) {
        let height = rows.len() as i32;
        let width = rows[0].len() as i32;
        let mut tiles = vec![vec![Tile::Floor; width as usize]; height as usize];
        for (r, row) in rows.iter().enumerate() {
            for (c, ch) in row.chars().enumerate() {
                tiles[r][c] = match ch {
                    '#' => Tile::Wall,
                    'v' => Tile::Vine,
                    'o' => Tile::Tunnel,
                    'X' => Tile::Exit,
                    _ => Tile::Floor,
                };
            }
        }
        (tiles, width, height)
    }

    fn mv(tiles: &Vec<Vec<Tile>>, w: i32, h: i32) -> MapView {
        MapView { tiles, width: w, height: h }
    }

    // ── Capability table ──

    #[test]
    fn runner_capabilities() {
        assert!(can_enter(Role::Runner, Tile::Floor));
        assert!(can_enter(Role::Runner, Tile::Tunnel));
        assert!(can_enter(Role::Runner, Tile::Exit));
        assert!(!can_enter(Role::Runner, Tile::Wall));
        assert!(!can_enter(Role::Runner, Tile::Vine));
    }

    #[test]
    fn hunter_capabilities() {
        assert!(can_enter(Role::Hunter, Tile::Floor));
        assert!(can_enter(Role::Hunter, Tile::Vine));
        assert!(!can_enter(Role::Hunter, Tile::Wall));
        assert!(!can_enter(Role::Hunter, Tile::Tunnel));
        assert!(!can_enter(Role::Hunter, Tile::Exit));
    }

    // ── Bounds ──

    #[test]
    fn out_of_bounds_reads_as_wall() {
        let (t, w, h) = map_from(&[
            "...",
            "...",
        ]);
        let m = mv(&t, w, h);
        assert_eq!(m.tile_at(Pos::new(-1, 0)), Tile::Wall);
        assert_eq!(m.tile_at(Pos::new(0, -1)), Tile::Wall);
        assert_eq!(m.tile_at(Pos::new(2, 0)), Tile::Wall);
        assert_eq!(m.tile_at(Pos::new(0, 3)), Tile::Wall);
    }

    #[test]
    fn moves_off_the_edge_are_denied() {
        let (t, w, h) = map_from(&[
            "...",
        ]);
        let m = mv(&t, w, h);
        assert!(!can_move(&m, Role::Runner, Pos::new(0, 0), Direction::Up));
        assert!(!can_move(&m, Role::Runner, Pos::new(0, 0), Direction::Left));
        assert!(!can_move(&m, Role::Hunter, Pos::new(0, 2), Direction::Right));
        assert!(!can_move(&m, Role::Hunter, Pos::new(0, 2), Direction::Down));
    }

    // ── Role-restricted terrain ──

    #[test]
    fn vine_passes_hunter_blocks_runner() {
        let (t, w, h) = map_from(&[
            "#####",
            "#.v.#",
            "#####",
        ]);
        let m = mv(&t, w, h);
        let left = Pos::new(1, 1);
        assert!(!can_move(&m, Role::Runner, left, Direction::Right));
        assert!(can_move(&m, Role::Hunter, left, Direction::Right));
    }

    #[test]
    fn tunnel_passes_runner_blocks_hunter() {
        let (t, w, h) = map_from(&[
            "#####",
            "#.o.#",
            "#####",
        ]);
        let m = mv(&t, w, h);
        let left = Pos::new(1, 1);
        assert!(can_move(&m, Role::Runner, left, Direction::Right));
        assert!(!can_move(&m, Role::Hunter, left, Direction::Right));
    }

    #[test]
    fn exit_admits_only_the_runner() {
        let (t, w, h) = map_from(&[
            "####",
            "#.X#",
            "####",
        ]);
        let m = mv(&t, w, h);
        let beside = Pos::new(1, 1);
        assert!(can_move(&m, Role::Runner, beside, Direction::Right));
        assert!(!can_move(&m, Role::Hunter, beside, Direction::Right));
    }

    #[test]
    fn walls_block_everyone() {
        let (t, w, h) = map_from(&[
            "###",
            "#.#",
            "###",
        ]);
        let m = mv(&t, w, h);
        let center = Pos::new(1, 1);
        for dir in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            assert!(!can_move(&m, Role::Runner, center, dir));
            assert!(!can_move(&m, Role::Hunter, center, dir));
        }
    }
}
