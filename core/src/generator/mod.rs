use crate::*;
pub use random::*;

mod random;

/// Produces a mine layout once the first revealed cell is known.
pub trait LayoutGenerator {
    fn generate(self, config: GameConfig, safe: Coord2) -> MineLayout;
}

/// Which cells around the first reveal are kept free of mines.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SafeZone {
    /// Only the revealed cell.
    Cell,
    /// The revealed cell and its up-to-8 neighbors.
    Neighborhood,
}

impl SafeZone {
    pub const fn contains(self, safe: Coord2, coords: Coord2) -> bool {
        match self {
            Self::Cell => safe.0 == coords.0 && safe.1 == coords.1,
            Self::Neighborhood => is_within_one(safe, coords),
        }
    }

    /// How many in-bounds cells the zone covers on a board of `size`.
    pub fn cell_count(self, size: Coord2, safe: Coord2) -> CellCount {
        match self {
            Self::Cell => 1,
            Self::Neighborhood => 1 + NeighborIter::new(safe, size).count() as CellCount,
        }
    }
}
