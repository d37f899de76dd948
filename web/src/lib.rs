use clap::Parser;
use retrosweeper_core::{GameConfig, SessionConfig};
use std::time::Duration;
use wasm_bindgen::prelude::*;

mod game;
mod scheduler;
mod utils;

/// Options read from the page URL fragment, e.g. `#-vv&--rows=16&--cols=16&--mines=40`.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 9)]
    rows: u8,

    #[arg(long, default_value_t = 9)]
    cols: u8,

    #[arg(long, default_value_t = 10)]
    mines: u16,

    /// How long a touch has to be held to place a flag, in milliseconds
    #[arg(long, default_value_t = 400)]
    long_press_ms: u64,
}

impl Args {
    fn parse_fragment(fragment: &str) -> Result<Self, clap::Error> {
        Self::try_parse_from(fragment.split(['#', '&']))
    }

    fn session_config(&self) -> retrosweeper_core::Result<SessionConfig> {
        let game = GameConfig::new((self.rows, self.cols), self.mines)?;
        Ok(SessionConfig {
            game,
            long_press: Duration::from_millis(self.long_press_ms),
            ..Default::default()
        })
    }
}

#[wasm_bindgen(start)]
pub fn run_app() {
    use gloo::utils::{document, window};

    #[cfg(feature = "console_error_panic_hook")]
    {
        console_error_panic_hook::set_once();
    }

    let location_hash = window()
        .location()
        .hash()
        .unwrap_or_else(|_| "".to_string());

    let args = Args::parse_fragment(&location_hash).expect("Could not parse args");
    if let Some(log_level) = args.verbose.log_level() {
        console_log::init_with_level(log_level).expect("Error initializing logger");
    }
    log::debug!("args: {:?}", args);

    let config = args
        .session_config()
        .expect("Invalid board configuration");

    let root = document()
        .get_element_by_id("minesweeper")
        .expect("Could not find id=\"minesweeper\" element");

    log::debug!("App started");
    let props = game::GameProps {
        config,
        seed: args.seed,
    };
    yew::Renderer::<game::GameView>::with_root_and_props(root, props).render();
}
