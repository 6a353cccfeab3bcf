/// Tile types. Which roles may enter which tiles lives in `rules.rs`;
/// this module only names the kinds.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Floor,
    Wall,   // Blocks everyone
    Vine,   // Hunter-role passage (runners are blocked)
    Tunnel, // Runner-role passage (hunters are blocked)
    Exit,   // The single goal cell; runner-only
}

impl Tile {
    /// Is this the goal cell?
    pub fn is_exit(self) -> bool {
        matches!(self, Tile::Exit)
    }
}
