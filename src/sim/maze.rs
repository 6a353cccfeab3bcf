/// Procedural maze construction.
///
/// Build order matters and later stages never break earlier guarantees:
///   1. Floor interior, wall border.
///   2. Start and exit placement (mode-dependent).
///   3. A guaranteed corridor from start to exit; its cells are protected
///      from every later stage.
///   4. Wall fill to a sampled density, with occasional 2-3 cell clusters.
///   5. Vine and tunnel scatter over the remaining floor.
///   6. Overrides last: start forced Floor, exit forced Exit.
///
/// All placement loops are attempt-bounded and accept shortfall; map
/// construction never fails.

use rand::Rng;

use crate::domain::entity::Pos;
use crate::domain::rules::MapView;
use crate::domain::tile::Tile;

use super::world::Mode;

pub const MAP_COLS: i32 = 24;
pub const MAP_ROWS: i32 = 18;

/// Wall fill density range over interior cells.
const WALL_DENSITY: (f32, f32) = (0.30, 0.40);
/// Chance that a placed wall grows a cluster of 1-2 extra cells.
const CLUSTER_CHANCE: f64 = 0.3;
/// Vine/tunnel coverage range over the post-wall floor count.
const TERRAIN_SHARE: (f32, f32) = (0.10, 0.15);

const NEIGHBORS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

pub struct MazeMap {
    pub tiles: Vec<Vec<Tile>>,
    pub width: i32,
    pub height: i32,
    pub start: Pos,
    pub exit: Pos,
}

impl MazeMap {
    pub fn view(&self) -> MapView {
        MapView {
            tiles: &self.tiles,
            width: self.width,
            height: self.height,
        }
    }

    pub fn tile_at(&self, p: Pos) -> Tile {
        self.view().tile_at(p)
    }
}

pub fn generate(mode: Mode, rng: &mut impl Rng) -> MazeMap {
    let width = MAP_COLS;
    let height = MAP_ROWS;

    let mut tiles = vec![vec![Tile::Floor; width as usize]; height as usize];
    for c in 0..width as usize {
        tiles[0][c] = Tile::Wall;
        tiles[height as usize - 1][c] = Tile::Wall;
    }
    for r in 0..height as usize {
        tiles[r][0] = Tile::Wall;
        tiles[r][width as usize - 1] = Tile::Wall;
    }

    // Exit near the right edge in both modes; the start is across the map
    // in Escape and a few cells short of the exit in Hunter.
    let exit = Pos::new(rng.gen_range(1..height - 1), width - 2);
    let start = match mode {
        Mode::Escape => Pos::new(rng.gen_range(1..height - 1), 1),
        Mode::Hunter => Pos::new(
            (exit.row + rng.gen_range(-2..=2)).clamp(1, height - 2),
            (exit.col - rng.gen_range(2..=4)).max(1),
        ),
    };

    let protected = carve_corridor(width, height, start, exit, rng);

    place_walls(&mut tiles, &protected, start, exit, rng);
    scatter_terrain(&mut tiles, Tile::Vine, &protected, start, exit, rng);
    scatter_terrain(&mut tiles, Tile::Tunnel, &protected, start, exit, rng);

    tiles[start.row as usize][start.col as usize] = Tile::Floor;
    tiles[exit.row as usize][exit.col as usize] = Tile::Exit;

    MazeMap { tiles, width, height, start, exit }
}

/// Randomized walk from start to exit, biased 0.7 toward closing the
/// column gap first. Every visited cell joins the protected set.
fn carve_corridor(
    width: i32,
    height: i32,
    start: Pos,
    exit: Pos,
    rng: &mut impl Rng,
) -> Vec<Vec<bool>> {
    let mut protected = vec![vec![false; width as usize]; height as usize];
    let mut cur = start;
    protected[cur.row as usize][cur.col as usize] = true;

    while cur != exit {
        let col_step =
            cur.col != exit.col && (cur.row == exit.row || rng.gen_bool(0.7));
        if col_step {
            cur.col += (exit.col - cur.col).signum();
        } else if cur.row != exit.row {
            cur.row += (exit.row - cur.row).signum();
        } else {
            cur.col += (exit.col - cur.col).signum();
        }
        protected[cur.row as usize][cur.col as usize] = true;
    }

    protected
}

fn in_interior(width: i32, height: i32, p: Pos) -> bool {
    p.row >= 1 && p.row < height - 1 && p.col >= 1 && p.col < width - 1
}

/// Inside the 1-cell no-build buffer around an anchor cell?
fn in_buffer(p: Pos, anchor: Pos) -> bool {
    (p.row - anchor.row).abs() <= 1 && (p.col - anchor.col).abs() <= 1
}

fn wall_allowed(
    tiles: &[Vec<Tile>],
    protected: &[Vec<bool>],
    start: Pos,
    exit: Pos,
    width: i32,
    height: i32,
    p: Pos,
) -> bool {
    in_interior(width, height, p)
        && tiles[p.row as usize][p.col as usize] == Tile::Floor
        && !protected[p.row as usize][p.col as usize]
        && !in_buffer(p, start)
        && !in_buffer(p, exit)
}

fn place_walls(
    tiles: &mut Vec<Vec<Tile>>,
    protected: &[Vec<bool>],
    start: Pos,
    exit: Pos,
    rng: &mut impl Rng,
) {
    let width = tiles[0].len() as i32;
    let height = tiles.len() as i32;
    let interior = ((width - 2) * (height - 2)) as f32;

    let density = rng.gen_range(WALL_DENSITY.0..WALL_DENSITY.1);
    let target = (interior * density) as usize;

    let mut placed = 0;
    let mut attempts = 0;
    let max_attempts = target * 8;

    while placed < target && attempts < max_attempts {
        attempts += 1;
        let p = Pos::new(rng.gen_range(1..height - 1), rng.gen_range(1..width - 1));
        if !wall_allowed(tiles, protected, start, exit, width, height, p) {
            continue;
        }
        tiles[p.row as usize][p.col as usize] = Tile::Wall;
        placed += 1;

        // sometimes grow a short cluster off the fresh wall
        if rng.gen_bool(CLUSTER_CHANCE) {
            let extra = rng.gen_range(1..=2);
            let mut cur = p;
            for _ in 0..extra {
                let (dr, dc) = NEIGHBORS[rng.gen_range(0..NEIGHBORS.len())];
                let next = Pos::new(cur.row + dr, cur.col + dc);
                if wall_allowed(tiles, protected, start, exit, width, height, next) {
                    tiles[next.row as usize][next.col as usize] = Tile::Wall;
                    placed += 1;
                    cur = next;
                }
            }
        }
    }
}

/// Scatter one terrain kind over 10-15% of the remaining floor. Up to 3x
/// the target count in attempts, then the shortfall stands.
fn scatter_terrain(
    tiles: &mut Vec<Vec<Tile>>,
    kind: Tile,
    protected: &[Vec<bool>],
    start: Pos,
    exit: Pos,
    rng: &mut impl Rng,
) {
    let width = tiles[0].len() as i32;
    let height = tiles.len() as i32;

    let floor_count = tiles
        .iter()
        .flatten()
        .filter(|t| **t == Tile::Floor)
        .count();
    let share = rng.gen_range(TERRAIN_SHARE.0..TERRAIN_SHARE.1);
    let target = (floor_count as f32 * share) as usize;

    let mut placed = 0;
    let mut attempts = 0;
    while placed < target && attempts < target * 3 {
        attempts += 1;
        let p = Pos::new(rng.gen_range(1..height - 1), rng.gen_range(1..width - 1));
        if tiles[p.row as usize][p.col as usize] != Tile::Floor {
            continue;
        }
        if protected[p.row as usize][p.col as usize]
            || in_buffer(p, start)
            || in_buffer(p, exit)
        {
            continue;
        }
        tiles[p.row as usize][p.col as usize] = kind;
        placed += 1;
    }
}

/// Random interior Floor cell at Manhattan distance >= `min_dist` from
/// `from`, skipping `avoid` cells. Attempt-bounded; the caller retries
/// later when nothing qualifies.
pub fn random_floor_cell(
    map: &MazeMap,
    rng: &mut impl Rng,
    from: Pos,
    min_dist: i32,
    avoid: &[Pos],
) -> Option<Pos> {
    for _ in 0..128 {
        let p = Pos::new(
            rng.gen_range(1..map.height - 1),
            rng.gen_range(1..map.width - 1),
        );
        if map.tiles[p.row as usize][p.col as usize] != Tile::Floor {
            continue;
        }
        if p.manhattan(from) < min_dist {
            continue;
        }
        if avoid.contains(&p) {
            continue;
        }
        return Some(p);
    }
    None
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ai;
    use crate::domain::entity::Role;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn count_interior(map: &MazeMap, kind: Tile) -> usize {
        let mut n = 0;
        for r in 1..(map.height - 1) as usize {
            for c in 1..(map.width - 1) as usize {
                if map.tiles[r][c] == kind {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn border_is_solid_wall() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let map = generate(Mode::Escape, &mut rng);
            for c in 0..map.width {
                assert_eq!(map.tile_at(Pos::new(0, c)), Tile::Wall);
                assert_eq!(map.tile_at(Pos::new(map.height - 1, c)), Tile::Wall);
            }
            for r in 0..map.height {
                assert_eq!(map.tile_at(Pos::new(r, 0)), Tile::Wall);
                assert_eq!(map.tile_at(Pos::new(r, map.width - 1)), Tile::Wall);
            }
        }
    }

    #[test]
    fn exactly_one_exit_and_floor_start() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let map = generate(Mode::Escape, &mut rng);

            let exits: usize = map
                .tiles
                .iter()
                .flatten()
                .filter(|t| **t == Tile::Exit)
                .count();
            assert_eq!(exits, 1);
            assert_eq!(map.tile_at(map.exit), Tile::Exit);
            assert_eq!(map.tile_at(map.start), Tile::Floor);
        }
    }

    #[test]
    fn runner_can_always_reach_the_exit() {
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let map = generate(Mode::Escape, &mut rng);
            let path = ai::shortest_path(&map.view(), Role::Runner, map.start, map.exit);
            assert!(path.len() > 1, "seed {seed}: no runner path to the exit");
            assert_eq!(path[0], map.start);
            assert_eq!(*path.last().unwrap(), map.exit);
        }
    }

    #[test]
    fn wall_density_stays_in_band() {
        let interior = ((MAP_COLS - 2) * (MAP_ROWS - 2)) as f32;
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let map = generate(Mode::Escape, &mut rng);
            let walls = count_interior(&map, Tile::Wall) as f32;
            let frac = walls / interior;
            assert!(
                (0.28..=0.42).contains(&frac),
                "seed {seed}: wall fraction {frac}"
            );
        }
    }

    #[test]
    fn terrain_present_and_bounded() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let map = generate(Mode::Escape, &mut rng);
            let floor = count_interior(&map, Tile::Floor)
                + count_interior(&map, Tile::Vine)
                + count_interior(&map, Tile::Tunnel);
            let cap = (floor as f32 * 0.15) as usize + 1;

            let vines = count_interior(&map, Tile::Vine);
            let tunnels = count_interior(&map, Tile::Tunnel);
            assert!(vines >= 1, "seed {seed}: no vines");
            assert!(tunnels >= 1, "seed {seed}: no tunnels");
            assert!(vines <= cap, "seed {seed}: {vines} vines over cap {cap}");
            assert!(tunnels <= cap, "seed {seed}: {tunnels} tunnels over cap {cap}");
        }
    }

    #[test]
    fn escape_places_start_and_exit_on_opposite_sides() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let map = generate(Mode::Escape, &mut rng);
            assert_eq!(map.start.col, 1);
            assert_eq!(map.exit.col, map.width - 2);
        }
    }

    #[test]
    fn hunter_start_sits_a_few_cells_from_the_exit() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let map = generate(Mode::Hunter, &mut rng);
            let d = map.start.manhattan(map.exit);
            assert!((2..=6).contains(&d), "seed {seed}: start-exit distance {d}");
            assert_eq!(map.tile_at(map.start), Tile::Floor);
        }
    }

    #[test]
    fn same_seed_reproduces_the_map() {
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        let m1 = generate(Mode::Escape, &mut a);
        let m2 = generate(Mode::Escape, &mut b);
        assert_eq!(m1.tiles, m2.tiles);
        assert_eq!(m1.start, m2.start);
        assert_eq!(m1.exit, m2.exit);
    }

    #[test]
    fn random_floor_cell_honors_distance_and_avoid() {
        let mut rng = StdRng::seed_from_u64(7);
        let map = generate(Mode::Escape, &mut rng);
        let from = map.start;

        for _ in 0..50 {
            if let Some(p) = random_floor_cell(&map, &mut rng, from, 5, &[map.exit]) {
                assert!(p.manhattan(from) >= 5);
                assert_eq!(map.tile_at(p), Tile::Floor);
                assert_ne!(p, map.exit);
            }
        }
    }
}
