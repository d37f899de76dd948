use serde::{Deserialize, Serialize};

/// One grid position, owned by the board.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub(crate) mine: bool,
    pub(crate) revealed: bool,
    pub(crate) flagged: bool,
    pub(crate) adjacent_mines: u8,
}

impl Cell {
    pub const fn is_mine(self) -> bool {
        self.mine
    }

    pub const fn is_revealed(self) -> bool {
        self.revealed
    }

    pub const fn is_flagged(self) -> bool {
        self.flagged
    }

    /// Number of mines among the neighbors, only meaningful for safe cells.
    pub const fn adjacent_mines(self) -> u8 {
        self.adjacent_mines
    }

    pub const fn is_hidden(self) -> bool {
        !self.revealed && !self.flagged
    }
}

/// Player-visible state of a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellView {
    Hidden,
    Flagged,
    Revealed(u8),
    /// A mine that was not flagged when the game was lost.
    Detonated,
    /// A flag placed on a safe cell, shown once the game was lost.
    WrongFlag,
}

impl CellView {
    /// Whether the cell still looks closed.
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Hidden | Self::Flagged | Self::WrongFlag)
    }
}

impl Default for CellView {
    fn default() -> Self {
        Self::Hidden
    }
}
