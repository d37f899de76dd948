use alloc::vec::Vec;
use core::time::Duration;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

/// The elapsed-time display never goes past this.
pub const MAX_ELAPSED_SECS: u16 = 999;

/// Valid transitions:
/// - Idle -> InPlay (first reveal)
/// - Idle -> Won | Lost (first reveal decides the game)
/// - InPlay -> Won | Lost
/// - any -> Idle (reset or new game)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    InPlay,
    Won,
    Lost,
}

impl SessionState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Status indicator shown on the new-game button.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Face {
    Neutral,
    /// A cell is being pressed.
    Alert,
    Dead,
    Cool,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub game: GameConfig,
    /// How long a touch must be held before it flags instead of revealing.
    pub long_press: Duration,
    /// How far a touch may move before it counts as a scroll rather than a press.
    pub drag_tolerance: f32,
    pub clock_period: Duration,
}

impl SessionConfig {
    pub fn new(game: GameConfig) -> Self {
        Self {
            game,
            ..Default::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::beginner(),
            long_press: Duration::from_millis(400),
            drag_tolerance: 10.0,
            clock_period: Duration::from_secs(1),
        }
    }
}

/// What a gesture or timer did to the game, for the host to render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Reveal(RevealReport),
    Flag(FlagReport),
    Tick(u16),
}

/// One game from the first press to a win, loss, or reset, plus the timers driving it.
pub struct Session<S: Scheduler> {
    config: SessionConfig,
    board: Board,
    state: SessionState,
    face: Face,
    elapsed: u16,
    seeds: SmallRng,
    scheduler: S,
    clock: Option<S::Handle>,
    press: Option<PendingPress<S::Handle>>,
}

impl<S: Scheduler> Session<S> {
    pub fn new(config: SessionConfig, seed: u64, scheduler: S) -> Result<Self> {
        let mut seeds = SmallRng::seed_from_u64(seed);
        let board = Board::new(config.game, seeds.random_range(0..=u64::MAX))?;
        Ok(Self::with_board(config, board, seeds, scheduler))
    }

    /// Session over a fixed minefield. Later resets generate random boards of the same shape.
    pub fn from_layout(mine_layout: MineLayout, scheduler: S) -> Self {
        let config = SessionConfig::new(mine_layout.game_config());
        let board = Board::from_layout(mine_layout);
        Self::with_board(config, board, SmallRng::seed_from_u64(0), scheduler)
    }

    fn with_board(config: SessionConfig, board: Board, seeds: SmallRng, scheduler: S) -> Self {
        Self {
            config,
            board,
            state: SessionState::Idle,
            face: Face::Neutral,
            elapsed: 0,
            seeds,
            scheduler,
            clock: None,
            press: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn face(&self) -> Face {
        self.face
    }

    pub fn elapsed_secs(&self) -> u16 {
        self.elapsed
    }

    pub fn mines_left(&self) -> CellCount {
        self.board.mines_left()
    }

    pub fn is_clock_running(&self) -> bool {
        self.clock.is_some()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Starts over with the same configuration.
    pub fn reset(&mut self) -> Result<()> {
        self.new_game(self.config.game)
    }

    /// Starts over with a different board configuration, keeping the current game when `game` is invalid.
    pub fn new_game(&mut self, game: GameConfig) -> Result<()> {
        let board = Board::new(game, self.seeds.random_range(0..=u64::MAX))?;

        self.cancel_timers();
        self.config.game = game;
        self.board = board;
        self.state = SessionState::Idle;
        self.face = Face::Neutral;
        self.elapsed = 0;
        log::debug!("New game: {:?}", game);
        Ok(())
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealReport> {
        let report = self.board.reveal(coords)?;

        match report.outcome {
            RevealOutcome::NoChange => {}
            RevealOutcome::Revealed => {
                if matches!(self.state, SessionState::Idle) {
                    self.state = SessionState::InPlay;
                    self.elapsed = 0;
                    self.start_clock();
                }
            }
            RevealOutcome::HitMine => self.finish(SessionState::Lost),
            RevealOutcome::Won => self.finish(SessionState::Won),
        }

        Ok(report)
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<FlagReport> {
        self.board.toggle_flag(coords)
    }

    /// Advances the clock by one period while in play, returning the elapsed seconds.
    pub fn tick(&mut self) -> u16 {
        if matches!(self.state, SessionState::InPlay) {
            self.elapsed = self.elapsed.saturating_add(1).min(MAX_ELAPSED_SECS);
            log::trace!("tick: {}", self.elapsed);
        }
        self.elapsed
    }

    /// Pointer went down on a cell.
    pub fn press(&mut self, coords: Coord2, device: Device, position: Point) {
        if self.is_finished() {
            return;
        }

        self.cancel_press();
        self.face = Face::Alert;

        let long_press = match device {
            Device::Touch => Some(
                self.scheduler
                    .schedule(Timer::LongPress, self.config.long_press),
            ),
            Device::Mouse => None,
        };
        log::trace!("{:?} press at {:?}", device, coords);
        self.press = Some(PendingPress::new(coords, device, position, long_press));
    }

    /// Pointer moved while pressed, a touch that travels too far becomes a scroll.
    pub fn pointer_moved(&mut self, position: Point) {
        let tolerance = self.config.drag_tolerance;
        let Some(press) = self.press.as_mut() else {
            return;
        };

        if press.resolved || press.device != Device::Touch || !press.has_drifted(position, tolerance) {
            return;
        }

        log::trace!("touch on {:?} turned into a drag", press.coords);
        press.resolved = true;
        if let Some(handle) = press.long_press.take() {
            self.scheduler.cancel(handle);
        }
        self.face = self.resting_face();
    }

    /// Pointer went up over `coords`, which may differ from where it went down.
    pub fn release(&mut self, coords: Coord2, button: Button) -> Option<Effect> {
        let press = self.take_press()?;
        self.face = self.resting_face();

        if press.resolved || self.is_finished() {
            return None;
        }

        let effect = match button {
            Button::Primary => {
                if self.board.validate_coords(coords).is_ok()
                    && self.board.cell_at(coords).is_flagged()
                {
                    return None;
                }
                self.reveal(coords).map(Effect::Reveal)
            }
            Button::Secondary => self.toggle_flag(coords).map(Effect::Flag),
        };

        self.face = self.resting_face();
        effect
            .inspect_err(|err| log::warn!("Ignoring release at {:?}: {}", coords, err))
            .ok()
    }

    /// Pointer left the board, the pending press is abandoned.
    pub fn pointer_left(&mut self) {
        if self.take_press().is_some() {
            self.face = self.resting_face();
        }
    }

    /// The touch was held long enough, it flags the pressed cell and the release does nothing more.
    pub fn long_press_elapsed(&mut self) -> Option<FlagReport> {
        let press = self.press.as_mut()?;
        if press.resolved {
            return None;
        }
        // a long-press that was never scheduled cannot elapse
        press.long_press.take()?;
        press.resolved = true;

        let coords = press.coords;
        log::debug!("long press at {:?}", coords);
        self.toggle_flag(coords)
            .inspect_err(|err| log::warn!("Ignoring long press at {:?}: {}", coords, err))
            .ok()
    }

    /// Delivers a fired timer.
    pub fn on_timer(&mut self, timer: Timer) -> Option<Effect> {
        match timer {
            Timer::Clock if self.clock.is_some() => Some(Effect::Tick(self.tick())),
            Timer::Clock => None,
            Timer::LongPress => self.long_press_elapsed().map(Effect::Flag),
        }
    }

    fn resting_face(&self) -> Face {
        match self.state {
            SessionState::Idle | SessionState::InPlay => Face::Neutral,
            SessionState::Won => Face::Cool,
            SessionState::Lost => Face::Dead,
        }
    }

    fn finish(&mut self, state: SessionState) {
        log::debug!("Session finished: {:?} after {}s", state, self.elapsed);
        self.state = state;
        self.face = self.resting_face();
        self.cancel_timers();
    }

    fn start_clock(&mut self) {
        if let Some(handle) = self.clock.take() {
            self.scheduler.cancel(handle);
        }
        self.clock = Some(
            self.scheduler
                .schedule(Timer::Clock, self.config.clock_period),
        );
    }

    fn take_press(&mut self) -> Option<PendingPress<S::Handle>> {
        let mut press = self.press.take()?;
        if let Some(handle) = press.long_press.take() {
            self.scheduler.cancel(handle);
        }
        Some(press)
    }

    fn cancel_press(&mut self) {
        self.take_press();
    }

    fn cancel_timers(&mut self) {
        if let Some(handle) = self.clock.take() {
            self.scheduler.cancel(handle);
        }
        self.cancel_press();
    }
}

impl Session<ManualScheduler> {
    /// Moves the manual clock forward, delivering every timer that comes due on the way.
    pub fn advance(&mut self, by: Duration) -> Vec<Effect> {
        let until = self.scheduler.now() + by;
        let mut effects = Vec::new();
        while let Some(timer) = self.scheduler.fire_next(until) {
            effects.extend(self.on_timer(timer));
        }
        effects
    }
}
