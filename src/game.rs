use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::MoveTo;
use log::info;

use crate::events::{self, StateRecorder};
use crate::field::{Field, FieldState};
use crate::rendering::{GameGrid, OutputTarget};
use crate::terminal_io::{self, InputSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Quit { score: u32 },
    GameOver { score: u32 },
}

impl Outcome {
    pub fn score(&self) -> u32 {
        match self {
            Outcome::Quit { score } | Outcome::GameOver { score } => *score,
        }
    }
}

const CONTROLS_TEXT: [&str; 6] = [
    "Controls:",
    "  Up/W    : Thrust",
    "  Down/S  : Reverse",
    "  Left/A  : Rotate Left",
    "  Right/D : Rotate Right",
    "  Space   : Fire     q: Quit",
];

fn centered(width: u16, text: &str) -> u16 {
    (width / 2).saturating_sub(text.len() as u16 / 2)
}

pub struct Game<I: InputSource> {
    pub terminal_width: u16,
    pub terminal_height: u16,
    pub stdout_target: OutputTarget,
    input: I,
    field: Field,
    recorder: StateRecorder,
    max_frames: Option<u64>,
}

impl<I: InputSource> Game<I> {
    pub fn new(
        terminal_width: u16,
        terminal_height: u16,
        stdout_target: OutputTarget,
        input: I,
        field: Field,
        max_frames: Option<u64>,
    ) -> Self {
        let recorder = StateRecorder::new(&field.config().logging, (terminal_width, terminal_height));
        Game {
            terminal_width,
            terminal_height,
            stdout_target,
            input,
            field,
            recorder,
            max_frames,
        }
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn run(&mut self) -> io::Result<Outcome> {
        let headless = self.stdout_target.is_headless();
        if !headless {
            self.show_title_screen()?;
        }

        let dt = self.field.config().dt();
        let frame_budget = Duration::from_secs_f64(dt);
        let mut game_grid = GameGrid::new(self.terminal_width, self.terminal_height);
        let mut frame_count = 0;

        let outcome = loop {
            if self.max_frames.is_some_and(|max| frame_count >= max) {
                info!("Frame limit of {} reached", frame_count);
                break Outcome::Quit { score: self.field.score() };
            }
            let frame_start = Instant::now();
            frame_count += 1;

            let input = self.input.snapshot(frame_count)?;
            if input.quit {
                info!("Quit requested on frame {}", frame_count);
                break Outcome::Quit { score: self.field.score() };
            }

            self.field.tick(&input, dt);
            for event in self.field.drain_events() {
                events::record(event.kind, &event.fields);
            }

            let snapshot = self.field.snapshot();
            self.recorder.observe(&snapshot);

            game_grid.clear();
            game_grid.draw_snapshot(&snapshot);
            self.render(&game_grid)?;

            if self.field.state() == FieldState::GameOver {
                let ship = self.field.ship().body.position;
                info!("Ship lost at ({:.1}, {:.1})", ship.x, ship.y);
                break Outcome::GameOver { score: self.field.score() };
            }

            if !headless {
                if let Some(rest) = frame_budget.checked_sub(frame_start.elapsed()) {
                    std::thread::sleep(rest);
                }
            }
        };

        info!("Run ended after {} frames: {:?}", frame_count, outcome);
        if let Outcome::GameOver { score } = outcome {
            self.show_game_over_screen(score)?;
        }
        Ok(outcome)
    }

    fn render(&mut self, game_grid: &GameGrid) -> io::Result<()> {
        game_grid.render(&mut self.stdout_target)?;

        self.stdout_target.execute_move_to(MoveTo(0, 0))?;
        write!(
            self.stdout_target,
            "Score: {}  Asteroids: {}  Shots: {}",
            self.field.score(),
            self.field.asteroids().len(),
            self.field.shots().len()
        )?;

        let controls_box_height = CONTROLS_TEXT.len() as u16;
        let controls_start_y = self.terminal_height.saturating_sub(controls_box_height);
        for (i, line) in CONTROLS_TEXT.iter().enumerate() {
            self.stdout_target.execute_move_to(MoveTo(0, controls_start_y.saturating_add(i as u16)))?;
            write!(self.stdout_target, "{}", line)?;
        }

        if let OutputTarget::ScreenBuffer(sb) = &self.stdout_target {
            sb.print_to_log();
        }
        self.stdout_target.flush()?;
        Ok(())
    }

    fn write_centered(&mut self, y: u16, text: &str) -> io::Result<()> {
        let x = centered(self.terminal_width, text);
        self.stdout_target.execute_move_to(MoveTo(x, y))?;
        write!(self.stdout_target, "{}", text)
    }

    fn show_title_screen(&mut self) -> io::Result<()> {
        let title_art = [
            r"    _   ___ _____ ___ ___  ___ ___ ___",
            r"   /_\ / __|_   _| __| _ \/ _ \_ _|   \",
            r"  / _ \\__ \ | | | _||   / (_) | || |) |",
            r" /_/ \_\___/ |_| |___|_|_\\___/___|___/",
            r"             F  I  E  L  D",
        ];

        let game_grid_dummy = GameGrid::new(self.terminal_width, self.terminal_height);
        game_grid_dummy.clear_screen_manual(&mut self.stdout_target, self.terminal_width, self.terminal_height)?;

        let title_start_y = (self.terminal_height / 2).saturating_sub(title_art.len() as u16 / 2 + 2);
        for (i, line) in title_art.iter().enumerate() {
            self.write_centered(title_start_y + i as u16, line)?;
        }
        self.write_centered(self.terminal_height.saturating_sub(5), "Press any key to start...")?;
        self.stdout_target.flush()?;

        terminal_io::wait_for_key()?;

        game_grid_dummy.clear_screen_manual(&mut self.stdout_target, self.terminal_width, self.terminal_height)?;
        self.stdout_target.flush()
    }

    fn show_game_over_screen(&mut self, score: u32) -> io::Result<()> {
        let game_grid_dummy = GameGrid::new(self.terminal_width, self.terminal_height);
        game_grid_dummy.clear_screen_manual(&mut self.stdout_target, self.terminal_width, self.terminal_height)?;

        let middle = self.terminal_height / 2;
        self.write_centered(middle.saturating_sub(2), "GAME OVER!")?;
        self.write_centered(middle, &format!("Final Score: {}", score))?;

        if let OutputTarget::ScreenBuffer(sb) = &self.stdout_target {
            sb.print_to_log();
            return Ok(());
        }

        self.write_centered(middle + 2, "Press any key to exit...")?;
        self.stdout_target.flush()?;
        terminal_io::wait_for_key()
    }
}
