use std::env;
use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, size, Clear, ClearType},
};
use log::{error, info};

mod config;
mod constants;
mod entities;
mod error;
mod events;
mod field;
mod game;
mod rendering;
mod terminal_io;
mod types;

use config::GameConfig;
use constants::{DEFAULT_COLUMNS, DEFAULT_ROWS, HEADLESS_ENV_VAR, HEADLESS_MAX_FRAMES, HEADLESS_SEED, LOG_FILE};
use error::AppError;
use field::Field;
use game::{Game, Outcome};
use rendering::{GameGrid, OutputTarget, ScreenBuffer};
use terminal_io::{InputSource, SimulatedInput, TerminalInput};

fn main() -> Result<(), AppError> {
    simple_logging::log_to_file(LOG_FILE, log::LevelFilter::Info)?;
    info!("Starting asteroid-field.");

    let outcome = if env::var_os(HEADLESS_ENV_VAR).is_some() {
        info!("Headless mode enabled by {}.", HEADLESS_ENV_VAR);
        run_headless()?
    } else {
        run_in_terminal()?
    };

    info!("Exiting with final score {}.", outcome.score());
    Ok(())
}

fn validated_config(terminal_width: u16, terminal_height: u16) -> Result<GameConfig, AppError> {
    let config = GameConfig::for_terminal(terminal_width, terminal_height);
    config.validate().map_err(|e| {
        error!("Rejected configuration for {}x{}: {}", terminal_width, terminal_height, e);
        e
    })?;
    Ok(config)
}

fn play<I: InputSource>(
    terminal_width: u16,
    terminal_height: u16,
    stdout_target: OutputTarget,
    input: I,
    field: Field,
    max_frames: Option<u64>,
) -> Result<Outcome, AppError> {
    let mut game = Game::new(terminal_width, terminal_height, stdout_target, input, field, max_frames);
    let outcome = game.run().map_err(|e| {
        error!("Game loop failed: {}", e);
        e
    })?;
    info!("Field stopped on frame {}.", game.field().frame());
    Ok(outcome)
}

fn run_headless() -> Result<Outcome, AppError> {
    let config = validated_config(DEFAULT_COLUMNS, DEFAULT_ROWS)?;
    let stdout_target = OutputTarget::ScreenBuffer(ScreenBuffer::new(DEFAULT_COLUMNS, DEFAULT_ROWS));
    play(
        DEFAULT_COLUMNS,
        DEFAULT_ROWS,
        stdout_target,
        SimulatedInput::demo(),
        Field::with_seed(config, HEADLESS_SEED),
        Some(HEADLESS_MAX_FRAMES),
    )
}

fn run_in_terminal() -> Result<Outcome, AppError> {
    info!("Attempting to enable raw mode.");
    enable_raw_mode().map_err(|e| {
        error!("Failed to enable raw mode: {}", e);
        e
    })?;

    let result = prepare_and_play();

    // Restore the terminal even when the run failed.
    if let Err(e) = restore_terminal() {
        error!("Failed to restore terminal: {}", e);
        if result.is_ok() {
            return Err(e.into());
        }
    }
    result
}

fn prepare_and_play() -> Result<Outcome, AppError> {
    let (terminal_width, terminal_height) = size().map_err(|e| {
        error!("Failed to get terminal size: {}", e);
        e
    })?;
    info!("Terminal size: {}x{}", terminal_width, terminal_height);
    let config = validated_config(terminal_width, terminal_height)?;

    let mut stdout_target = OutputTarget::Stdout(io::stdout());
    let game_grid_dummy = GameGrid::new(terminal_width, terminal_height);
    game_grid_dummy.clear_screen_manual(&mut stdout_target, terminal_width, terminal_height)?;
    stdout_target.execute_other_command(Hide).map_err(|e| {
        error!("Failed to hide cursor: {}", e);
        e
    })?;
    stdout_target.flush()?;

    play(terminal_width, terminal_height, stdout_target, TerminalInput, Field::new(config), None)
}

fn restore_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, Clear(ClearType::All), MoveTo(0, 0), Show)?;
    disable_raw_mode()?;
    info!("Terminal restored.");
    Ok(())
}
