use super::*;

/// Uniform rejection sampling: draw random cells until enough of them are neither mines already nor inside the safe
/// zone around the first reveal.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomLayoutGenerator {
    seed: u64,
    safe_zone: SafeZone,
}

impl RandomLayoutGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            safe_zone: SafeZone::Neighborhood,
        }
    }

    pub fn with_safe_zone(seed: u64, safe_zone: SafeZone) -> Self {
        Self { seed, safe_zone }
    }
}

impl LayoutGenerator for RandomLayoutGenerator {
    fn generate(self, config: GameConfig, safe: Coord2) -> MineLayout {
        use rand::prelude::*;

        let (rows, cols) = config.size;
        let total_cells = config.total_cells();

        // edge-clipped zones are smaller, only fall back when the zone leaves no room for the budget
        let safe_zone = match self.safe_zone {
            SafeZone::Neighborhood
                if config.mines > total_cells - SafeZone::Neighborhood.cell_count(config.size, safe) =>
            {
                log::warn!(
                    "Cannot keep the neighborhood of {:?} free of {} mines, only the cell itself stays safe",
                    safe,
                    config.mines
                );
                SafeZone::Cell
            }
            zone => zone,
        };

        let mines = if config.mines >= total_cells {
            log::warn!(
                "Minefield cannot keep a safe cell, requested {} but only fits {}",
                config.mines,
                total_cells - 1
            );
            total_cells.saturating_sub(1)
        } else {
            config.mines
        };

        let mut mine_mask: Array2<bool> = Array2::default(config.size.to_nd_index());
        let mut mines_placed: CellCount = 0;
        let mut rejected: u32 = 0;

        let mut rng = SmallRng::seed_from_u64(self.seed);
        while mines_placed < mines {
            let coords: Coord2 = (rng.random_range(0..rows), rng.random_range(0..cols));
            let index = coords.to_nd_index();

            if mine_mask[index] || safe_zone.contains(safe, coords) {
                rejected += 1;
                continue;
            }

            mine_mask[index] = true;
            mines_placed += 1;
        }

        log::debug!(
            "Placed {} mines around safe cell {:?} ({} draws rejected)",
            mines_placed,
            safe,
            rejected
        );
        MineLayout::from_mine_mask(mine_mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(config: GameConfig, safe: Coord2, seed: u64) -> MineLayout {
        RandomLayoutGenerator::new(seed).generate(config, safe)
    }

    #[test]
    fn places_exact_count_outside_safe_neighborhood() {
        let config = GameConfig::beginner();
        for seed in 0..64 {
            let layout = generate(config, (4, 4), seed);

            assert_eq!(layout.mine_count(), 10);
            assert_eq!(layout.iter_mines().count(), 10);
            assert!(layout.iter_mines().all(|mine| !is_within_one((4, 4), mine)));
        }
    }

    #[test]
    fn corner_safe_zone_is_clipped_not_shifted() {
        let config = GameConfig::new((4, 4), 12).unwrap();
        for seed in 0..32 {
            let layout = generate(config, (0, 0), seed);

            // 16 cells minus the clipped 2x2 zone leaves exactly 12 candidates
            assert_eq!(layout.mine_count(), 12);
            for coords in [(0, 0), (0, 1), (1, 0), (1, 1)] {
                assert!(!layout.contains_mine(coords));
            }
        }
    }

    #[test]
    fn crowded_board_keeps_only_the_clicked_cell_safe() {
        let config = GameConfig::new((3, 3), 8).unwrap();
        let layout = generate(config, (1, 1), 7);

        assert_eq!(layout.mine_count(), 8);
        assert!(!layout.contains_mine((1, 1)));
    }

    #[test]
    fn same_seed_same_layout() {
        let config = GameConfig::intermediate();
        assert_eq!(generate(config, (3, 5), 42), generate(config, (3, 5), 42));
    }

    #[test]
    fn mine_free_config_yields_empty_layout() {
        let config = GameConfig::new((5, 5), 0).unwrap();
        assert_eq!(generate(config, (2, 2), 1).mine_count(), 0);
    }
}
