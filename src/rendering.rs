use std::f64::consts::{FRAC_PI_4, PI};
use std::io::{self, Write};

use crossterm::{cursor::MoveTo, execute};
use log::info;

use crate::constants::TERMINAL_ASPECT_RATIO_COMPENSATION;
use crate::entities::AsteroidSize;
use crate::field::{EntityKind, EntityView, FieldSnapshot};
use crate::types::Vector2D;

// --- ScreenBuffer for simulated rendering ---
pub struct ScreenBuffer {
    cells: Vec<Vec<char>>,
    width: u16,
    height: u16,
    cursor: (u16, u16),
}

impl ScreenBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        ScreenBuffer {
            cells: vec![vec![' '; width as usize]; height as usize],
            width,
            height,
            cursor: (0, 0),
        }
    }

    // Characters past the right edge are dropped; the cursor does not wrap.
    fn write_str(&mut self, s: &str) {
        let (mut x, y) = self.cursor;
        for c in s.chars() {
            if y < self.height && x < self.width {
                self.cells[y as usize][x as usize] = c;
            }
            x = x.saturating_add(1);
        }
        self.cursor = (x, y);
    }

    #[cfg(test)]
    pub fn row(&self, y: u16) -> String {
        self.cells
            .get(y as usize)
            .map(|row| row.iter().collect())
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub fn contains(&self, text: &str) -> bool {
        (0..self.height).any(|y| self.row(y).contains(text))
    }

    pub fn print_to_log(&self) {
        info!("--- Screen Buffer ---");
        for row in &self.cells {
            info!("{}", row.iter().collect::<String>());
        }
        info!("---------------------");
    }
}

impl Write for ScreenBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        self.write_str(&s);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// --- OutputTarget enum to handle stdout or ScreenBuffer ---
pub enum OutputTarget {
    Stdout(io::Stdout),
    ScreenBuffer(ScreenBuffer),
}

impl OutputTarget {
    pub fn execute_move_to(&mut self, command: MoveTo) -> io::Result<()> {
        match self {
            OutputTarget::Stdout(s) => execute!(s, command),
            OutputTarget::ScreenBuffer(sb) => {
                sb.cursor = (command.0, command.1);
                Ok(())
            }
        }
    }

    pub fn execute_other_command(&mut self, command: impl crossterm::Command) -> io::Result<()> {
        match self {
            OutputTarget::Stdout(s) => execute!(s, command),
            OutputTarget::ScreenBuffer(_) => Ok(()), // Nothing to do for the buffer
        }
    }

    pub fn is_headless(&self) -> bool {
        matches!(self, OutputTarget::ScreenBuffer(_))
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputTarget::Stdout(s) => s.write(buf),
            OutputTarget::ScreenBuffer(sb) => sb.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputTarget::Stdout(s) => s.flush(),
            OutputTarget::ScreenBuffer(sb) => sb.flush(),
        }
    }
}

// --- GameGrid for geometric rendering ---
pub struct GameGrid {
    pub grid: Vec<Vec<char>>,
    pub width: u16,
    pub height: u16,
}

impl GameGrid {
    pub fn new(width: u16, height: u16) -> Self {
        GameGrid {
            grid: vec![vec![' '; width as usize]; height as usize],
            width,
            height,
        }
    }

    pub fn set_char(&mut self, x: u16, y: u16, c: char) {
        if y < self.height && x < self.width {
            self.grid[y as usize][x as usize] = c;
        }
    }

    // Points off the grid are dropped.
    pub fn plot(&mut self, point: Vector2D, c: char) {
        let column = point.x.round();
        let row = (point.y / TERMINAL_ASPECT_RATIO_COMPENSATION).round();
        if column < 0.0 || row < 0.0 || column >= self.width as f64 || row >= self.height as f64 {
            return;
        }
        self.set_char(column as u16, row as u16, c);
    }

    #[cfg(test)]
    pub fn get_char(&self, x: u16, y: u16) -> Option<char> {
        self.grid.get(y as usize)?.get(x as usize).copied()
    }

    pub fn clear(&mut self) {
        self.grid = vec![vec![' '; self.width as usize]; self.height as usize];
    }

    pub fn draw_snapshot(&mut self, snapshot: &FieldSnapshot) {
        for asteroid in &snapshot.asteroids {
            self.draw_asteroid(asteroid);
        }
        for shot in &snapshot.shots {
            self.draw_shot(shot);
        }
        self.draw_ship(&snapshot.ship);
    }

    fn draw_asteroid(&mut self, view: &EntityView) {
        let display_char = match view.kind {
            EntityKind::Asteroid(AsteroidSize::Large) => '@',
            EntityKind::Asteroid(AsteroidSize::Medium) => 'O',
            _ => 'o',
        };
        // Enough samples that neighbouring points land in adjacent cells.
        let samples = ((2.0 * PI * view.radius * 2.0).ceil() as usize).max(8);
        for i in 0..samples {
            let angle = 2.0 * PI * i as f64 / samples as f64;
            let point = view.position.add(Vector2D::from_angle(angle).scale(view.radius));
            self.plot(point, display_char);
        }
    }

    fn draw_shot(&mut self, view: &EntityView) {
        let char_to_draw = match view.lifetime.unwrap_or(1.0) {
            f if f > 2.0 / 3.0 => '*',
            f if f > 1.0 / 3.0 => '+',
            _ => '.',
        };
        self.plot(view.position, char_to_draw);
    }

    fn draw_ship(&mut self, view: &EntityView) {
        let (nose_char, left_char, right_char) = ship_chars(view.heading.unwrap_or(0.0));
        let Some([nose, rear_left, rear_right]) = view.outline else {
            self.plot(view.position, nose_char);
            return;
        };

        self.plot(rear_left, left_char);
        self.plot(rear_right, right_char);
        self.plot(nose, nose_char); // Drawn last so it wins a shared cell
    }

    pub fn render(&self, stdout: &mut OutputTarget) -> io::Result<()> {
        for y in 0..self.height {
            stdout.execute_move_to(MoveTo(0, y))?;
            write!(stdout, "{}", self.grid[y as usize].iter().collect::<String>())?;
        }
        Ok(())
    }

    pub fn clear_screen_manual(&self, stdout: &mut OutputTarget, terminal_width: u16, terminal_height: u16) -> io::Result<()> {
        for y in 0..terminal_height {
            stdout.execute_move_to(MoveTo(0, y))?;
            write!(stdout, "{}", " ".repeat(terminal_width as usize))?;
        }
        stdout.execute_move_to(MoveTo(0, 0))?;
        Ok(())
    }
}

// Nose and rear-corner characters by octant. Angle 0 points right, PI/2 points down.
pub fn ship_chars(angle: f64) -> (char, char, char) {
    let normalized_angle = angle.rem_euclid(2.0 * PI);
    if normalized_angle >= 7.0 * FRAC_PI_4 || normalized_angle < FRAC_PI_4 {
        ('>', '\u{005C}', '/') // Pointing right
    } else if normalized_angle < 3.0 * FRAC_PI_4 {
        ('v', '/', '\u{005C}') // Pointing down
    } else if normalized_angle < 5.0 * FRAC_PI_4 {
        ('<', '\u{005C}', '/') // Pointing left
    } else {
        ('^', '/', '\u{005C}') // Pointing up
    }
}
