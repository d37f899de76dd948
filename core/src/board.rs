use alloc::collections::{BTreeSet, VecDeque};
use alloc::vec::Vec;
use core::num::Saturating;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardState {
    /// Nothing revealed yet, mines may not be placed.
    Ready,
    Active,
    Won,
    Lost,
}

impl BoardState {
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::Ready
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        use RevealOutcome::*;
        match self {
            NoChange => false,
            Revealed => true,
            HitMine => true,
            Won => true,
        }
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::HitMine | Self::Won)
    }
}

/// Result of a reveal, with every cell whose [`CellView`] changed in the order they changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealReport {
    pub outcome: RevealOutcome,
    pub changed: Vec<Coord2>,
}

impl RevealReport {
    fn unchanged() -> Self {
        Self {
            outcome: RevealOutcome::NoChange,
            changed: Vec::new(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlagOutcome {
    NoChange,
    Flagged,
    Unflagged,
    /// Every flag is already in use.
    Refused,
}

impl FlagOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::Flagged | Self::Unflagged)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FlagReport {
    pub outcome: FlagOutcome,
    pub mines_left: CellCount,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    config: GameConfig,
    seed: u64,
    cells: Array2<Cell>,
    mines_placed: bool,
    revealed_count: Saturating<CellCount>,
    flagged_count: CellCount,
    state: BoardState,
    triggered_mine: Option<Coord2>,
}

impl Board {
    /// Empty board, mines are placed from `seed` on the first reveal.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            seed,
            cells: Array2::default(config.size.to_nd_index()),
            mines_placed: false,
            revealed_count: Saturating(0),
            flagged_count: 0,
            state: Default::default(),
            triggered_mine: None,
        })
    }

    /// Board with mines already in place, the first reveal gets no safety guarantee.
    pub fn from_layout(mine_layout: MineLayout) -> Self {
        let config = mine_layout.game_config();
        let mut board = Self {
            config,
            seed: 0,
            cells: Array2::default(config.size.to_nd_index()),
            mines_placed: false,
            revealed_count: Saturating(0),
            flagged_count: 0,
            state: Default::default(),
            triggered_mine: None,
        };
        board.apply_layout(&mine_layout);
        board
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn state(&self) -> BoardState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn size(&self) -> Coord2 {
        self.config.size
    }

    pub fn total_mines(&self) -> CellCount {
        self.config.mines
    }

    pub fn flags_placed(&self) -> CellCount {
        self.flagged_count
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count.0
    }

    pub fn has_mines(&self) -> bool {
        self.mines_placed
    }

    /// Unflagged mines, never below zero because flags are capped at the mine count.
    pub fn mines_left(&self) -> CellCount {
        self.config.mines.saturating_sub(self.flagged_count)
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn cell_at(&self, coords: Coord2) -> Cell {
        self.cells[coords.to_nd_index()]
    }

    pub fn view_at(&self, coords: Coord2) -> CellView {
        let cell = self.cell_at(coords);
        match (cell.revealed, cell.flagged, cell.mine) {
            (true, _, true) => CellView::Detonated,
            (true, _, false) => CellView::Revealed(cell.adjacent_mines),
            (false, true, false) if matches!(self.state, BoardState::Lost) => CellView::WrongFlag,
            (false, true, _) => CellView::Flagged,
            (false, false, _) => CellView::Hidden,
        }
    }

    pub fn iter_cells(&self) -> impl Iterator<Item = (Coord2, Cell)> + '_ {
        self.cells
            .indexed_iter()
            .map(|((row, col), &cell)| ((row as Coord, col as Coord), cell))
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let (rows, cols) = self.size();
        if coords.0 < rows && coords.1 < cols {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    /// Places the mines keeping `safe` and its neighbors clear, does nothing when mines are already placed.
    pub fn place_mines(&mut self, safe: Coord2) -> Result<()> {
        let generator = RandomLayoutGenerator::new(self.seed);
        self.place_mines_with(safe, generator)
    }

    pub fn place_mines_with(&mut self, safe: Coord2, generator: impl LayoutGenerator) -> Result<()> {
        let safe = self.validate_coords(safe)?;
        if self.mines_placed {
            log::warn!("Mines already placed, ignoring placement around {:?}", safe);
            return Ok(());
        }

        let layout = generator.generate(self.config, safe);
        self.apply_layout(&layout);
        Ok(())
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealReport> {
        let coords = self.validate_coords(coords)?;

        if self.state.is_finished() || !self.cell_at(coords).is_hidden() {
            return Ok(RevealReport::unchanged());
        }

        if !self.mines_placed {
            self.place_mines(coords)?;
        }

        let mut changed = Vec::new();
        let outcome = if self.cell_at(coords).mine {
            log::debug!("Mine hit at {:?}", coords);
            self.cells[coords.to_nd_index()].revealed = true;
            self.triggered_mine = Some(coords);
            changed.push(coords);
            self.end_game(false, &mut changed);
            RevealOutcome::HitMine
        } else {
            self.flood_reveal(coords, &mut changed);

            if self.revealed_count == Saturating(self.config.safe_cells()) {
                self.end_game(true, &mut changed);
                RevealOutcome::Won
            } else {
                self.mark_started();
                RevealOutcome::Revealed
            }
        };

        Ok(RevealReport { outcome, changed })
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<FlagReport> {
        use FlagOutcome::*;

        let coords = self.validate_coords(coords)?;

        let outcome = if self.state.is_finished() {
            NoChange
        } else {
            let can_flag = self.flagged_count < self.config.mines;
            let cell = &mut self.cells[coords.to_nd_index()];
            match (cell.revealed, cell.flagged) {
                (true, _) => NoChange,
                (false, true) => {
                    cell.flagged = false;
                    self.flagged_count -= 1;
                    Unflagged
                }
                (false, false) if can_flag => {
                    cell.flagged = true;
                    self.flagged_count += 1;
                    Flagged
                }
                (false, false) => Refused,
            }
        };

        log::trace!("Flag at {:?}: {:?}", coords, outcome);
        Ok(FlagReport {
            outcome,
            mines_left: self.mines_left(),
        })
    }

    fn apply_layout(&mut self, layout: &MineLayout) {
        for ((row, col), cell) in self.cells.indexed_iter_mut() {
            let coords = (row as Coord, col as Coord);
            cell.mine = layout.contains_mine(coords);
            cell.adjacent_mines = if cell.mine {
                0
            } else {
                layout.adjacent_mine_count(coords)
            };
        }
        self.mines_placed = true;
    }

    /// Reveals a safe cell, cascading through connected cells that have no adjacent mines.
    fn flood_reveal(&mut self, start: Coord2, changed: &mut Vec<Coord2>) {
        let mut visited = BTreeSet::from([start]);
        let mut to_visit = VecDeque::from([start]);

        while let Some(coords) = to_visit.pop_front() {
            let cell = &mut self.cells[coords.to_nd_index()];

            // flagged cells stay closed, revealed ones are never counted twice
            if !cell.is_hidden() || cell.mine {
                log::trace!("Skipping cell at {:?}", coords);
                continue;
            }

            cell.revealed = true;
            let adjacent_mines = cell.adjacent_mines;
            self.revealed_count += 1;
            changed.push(coords);
            log::trace!("Revealed {:?}, adjacent mines: {}", coords, adjacent_mines);

            if adjacent_mines == 0 {
                for neighbor in self.cells.iter_neighbors(coords) {
                    if self.cell_at(neighbor).is_hidden() && visited.insert(neighbor) {
                        to_visit.push_back(neighbor);
                    }
                }
            }
        }
    }

    fn mark_started(&mut self) {
        if matches!(self.state, BoardState::Ready) {
            log::debug!("Board started");
            self.state = BoardState::Active;
        }
    }

    /// Exposes the minefield once the game is decided.
    fn end_game(&mut self, won: bool, changed: &mut Vec<Coord2>) {
        if self.state.is_finished() {
            return;
        }

        self.state = if won {
            BoardState::Won
        } else {
            BoardState::Lost
        };
        log::debug!("Board finished: {:?}", self.state);

        for ((row, col), cell) in self.cells.indexed_iter_mut() {
            let coords = (row as Coord, col as Coord);
            match (cell.mine, cell.flagged, cell.revealed) {
                (true, false, false) if won => {
                    cell.flagged = true;
                    self.flagged_count += 1;
                    changed.push(coords);
                }
                (true, false, false) => {
                    cell.revealed = true;
                    changed.push(coords);
                }
                (false, true, _) if !won => changed.push(coords),
                _ => {}
            }
        }

        if won {
            self.flagged_count = self.config.mines;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn board(size: Coord2, mines: &[Coord2]) -> Board {
        Board::from_layout(MineLayout::from_mine_coords(size, mines).unwrap())
    }

    #[test]
    fn new_board_is_blank() {
        let board = Board::new(GameConfig::beginner(), 1).unwrap();

        assert_eq!(board.state(), BoardState::Ready);
        assert!(!board.has_mines());
        assert!(board.iter_cells().all(|(_, cell)| cell == Cell::default()));
        assert_eq!(board.mines_left(), 10);
    }

    #[test]
    fn new_board_rejects_bad_config() {
        let config = GameConfig::new_unchecked((2, 2), 4);
        assert_eq!(Board::new(config, 0), Err(GameError::TooManyMines));
    }

    #[test]
    fn first_reveal_places_mines_away_from_click() {
        let mut board = Board::new(GameConfig::beginner(), 99).unwrap();

        let report = board.reveal((4, 4)).unwrap();

        assert!(report.outcome.has_update());
        assert!(board.has_mines());
        let mines: Vec<_> = board.iter_cells().filter(|(_, cell)| cell.is_mine()).collect();
        assert_eq!(mines.len(), 10);
        assert!(mines.iter().all(|&(coords, _)| !is_within_one((4, 4), coords)));
        assert_eq!(board.view_at((4, 4)), CellView::Revealed(0));
    }

    #[test]
    fn placing_twice_keeps_first_layout() {
        let mut board = Board::new(GameConfig::beginner(), 5).unwrap();
        board.place_mines((0, 0)).unwrap();
        let before = board.clone();

        board.place_mines((8, 8)).unwrap();

        assert_eq!(board, before);
    }

    #[test]
    fn adjacent_counts_match_neighbors() {
        let mut board = Board::new(GameConfig::intermediate(), 3).unwrap();
        board.place_mines((8, 8)).unwrap();

        for (coords, cell) in board.iter_cells().filter(|(_, cell)| !cell.is_mine()) {
            let expected = NeighborIter::new(coords, board.size())
                .filter(|&pos| board.cell_at(pos).is_mine())
                .count() as u8;
            assert_eq!(cell.adjacent_mines(), expected, "at {:?}", coords);
        }
    }

    #[test]
    fn reveal_hits_mine_and_sets_triggered_cell() {
        let mut board = board((2, 2), &[(0, 0)]);

        let report = board.reveal((0, 0)).unwrap();

        assert_eq!(report.outcome, RevealOutcome::HitMine);
        assert_eq!(report.changed, vec![(0, 0)]);
        assert_eq!(board.state(), BoardState::Lost);
        assert_eq!(board.triggered_mine(), Some((0, 0)));
        assert_eq!(board.view_at((0, 0)), CellView::Detonated);
    }

    #[test]
    fn reveal_flood_fill_opens_zero_region() {
        let mut board = board((3, 3), &[(2, 2)]);

        let report = board.reveal((0, 0)).unwrap();

        assert_eq!(report.outcome, RevealOutcome::Won);
        assert_eq!(board.view_at((0, 0)), CellView::Revealed(0));
        assert_eq!(board.view_at((1, 1)), CellView::Revealed(1));
        assert_eq!(board.revealed_count(), 8);
        // the remaining mine is auto-flagged on win
        assert_eq!(board.view_at((2, 2)), CellView::Flagged);
        assert_eq!(report.changed.len(), 9);
    }

    #[test]
    fn flood_fill_stops_at_numbered_border() {
        // mines split the board, the right side stays closed
        let mut board = board((3, 5), &[(0, 2), (1, 2), (2, 2)]);

        let report = board.reveal((1, 0)).unwrap();

        assert_eq!(report.outcome, RevealOutcome::Revealed);
        assert_eq!(board.view_at((1, 0)), CellView::Revealed(0));
        assert_eq!(board.view_at((1, 1)), CellView::Revealed(3));
        assert_eq!(board.view_at((0, 3)), CellView::Hidden);
        assert_eq!(board.revealed_count(), 6);
        assert_eq!(report.changed.len(), 6);
    }

    #[test]
    fn flood_fill_skips_flags_and_revealed_cells() {
        let mut board = board((3, 5), &[(0, 4)]);
        board.toggle_flag((2, 0)).unwrap();

        let report = board.reveal((1, 1)).unwrap();

        assert_eq!(report.outcome, RevealOutcome::Revealed);
        assert_eq!(board.view_at((2, 0)), CellView::Flagged);
        assert_eq!(board.view_at((0, 3)), CellView::Revealed(1));
        assert!(!report.changed.contains(&(2, 0)));
        assert_eq!(board.revealed_count(), 13);
        let unique: BTreeSet<_> = report.changed.iter().copied().collect();
        assert_eq!(unique.len(), report.changed.len());
        assert_eq!(report.changed.len(), 13);

        // already revealed cells are not revisited
        assert_eq!(board.reveal((1, 2)).unwrap(), RevealReport::unchanged());
    }

    #[test]
    fn flagged_cell_cannot_be_revealed() {
        let mut board = board((2, 2), &[(1, 1)]);
        board.toggle_flag((0, 0)).unwrap();

        let report = board.reveal((0, 0)).unwrap();

        assert_eq!(report, RevealReport::unchanged());
        assert_eq!(board.view_at((0, 0)), CellView::Flagged);
        assert!(!board.cell_at((0, 0)).is_revealed());
    }

    #[test]
    fn toggle_flag_is_its_own_inverse() {
        let mut board = board((3, 3), &[(0, 0)]);
        let before = board.clone();

        assert_eq!(board.toggle_flag((1, 1)).unwrap().outcome, FlagOutcome::Flagged);
        assert_eq!(board.flags_placed(), 1);
        assert_eq!(board.toggle_flag((1, 1)).unwrap().outcome, FlagOutcome::Unflagged);

        assert_eq!(board, before);
    }

    #[test]
    fn flags_are_capped_by_mine_count() {
        let mut board = board((3, 3), &[(0, 0), (0, 1)]);

        assert_eq!(board.toggle_flag((2, 0)).unwrap().mines_left, 1);
        assert_eq!(board.toggle_flag((2, 1)).unwrap().mines_left, 0);
        let refused = board.toggle_flag((2, 2)).unwrap();

        assert_eq!(refused.outcome, FlagOutcome::Refused);
        assert_eq!(refused.mines_left, 0);
        assert_eq!(board.flags_placed(), 2);
        assert_eq!(board.view_at((2, 2)), CellView::Hidden);

        // clearing a flag frees the budget again
        board.toggle_flag((2, 0)).unwrap();
        assert_eq!(board.toggle_flag((2, 2)).unwrap().outcome, FlagOutcome::Flagged);
    }

    #[test]
    fn revealed_cell_cannot_be_flagged() {
        let mut board = board((2, 2), &[(0, 0)]);
        board.reveal((1, 1)).unwrap();

        let report = board.toggle_flag((1, 1)).unwrap();

        assert_eq!(report.outcome, FlagOutcome::NoChange);
        assert_eq!(board.flags_placed(), 0);
    }

    #[test]
    fn loss_exposes_mines_and_marks_wrong_flags() {
        let mut board = board((3, 3), &[(0, 0), (0, 2), (2, 2)]);
        board.toggle_flag((0, 2)).unwrap();
        board.toggle_flag((2, 0)).unwrap();

        let report = board.reveal((0, 0)).unwrap();

        assert_eq!(report.outcome, RevealOutcome::HitMine);
        assert_eq!(board.view_at((0, 0)), CellView::Detonated);
        assert_eq!(board.view_at((2, 2)), CellView::Detonated);
        assert_eq!(board.view_at((0, 2)), CellView::Flagged);
        assert_eq!(board.view_at((2, 0)), CellView::WrongFlag);
        assert_eq!(board.view_at((1, 1)), CellView::Hidden);
        for coords in [(0, 0), (2, 2), (2, 0)] {
            assert!(report.changed.contains(&coords));
        }
        assert!(!report.changed.contains(&(0, 2)));
    }

    #[test]
    fn finished_board_ignores_input() {
        let mut board = board((2, 2), &[(0, 0)]);
        board.reveal((0, 0)).unwrap();
        let after_loss = board.clone();

        assert_eq!(board.reveal((1, 1)).unwrap(), RevealReport::unchanged());
        assert_eq!(board.toggle_flag((1, 1)).unwrap().outcome, FlagOutcome::NoChange);
        assert_eq!(board, after_loss);
    }

    #[test]
    fn winning_on_last_safe_cell_is_immediate() {
        let mut board = board((2, 2), &[(0, 0)]);

        assert_eq!(board.reveal((0, 1)).unwrap().outcome, RevealOutcome::Revealed);
        assert_eq!(board.reveal((1, 0)).unwrap().outcome, RevealOutcome::Revealed);
        assert_eq!(board.state(), BoardState::Active);

        let report = board.reveal((1, 1)).unwrap();

        assert_eq!(report.outcome, RevealOutcome::Won);
        assert_eq!(report.changed, vec![(1, 1), (0, 0)]);
        assert_eq!(board.state(), BoardState::Won);
        assert_eq!(board.mines_left(), 0);
        assert_eq!(board.view_at((0, 0)), CellView::Flagged);
    }

    #[test]
    fn out_of_range_coords_are_rejected() {
        let mut board = board((2, 2), &[(0, 0)]);

        assert_eq!(board.reveal((2, 0)), Err(GameError::InvalidCoords));
        assert_eq!(board.toggle_flag((0, 2)), Err(GameError::InvalidCoords));
    }
}
