// --- Game Constants ---
// Distances are world units: one terminal column, or half a terminal row.
// Times are seconds.
pub const TICKS_PER_SECOND: u64 = 30;

pub const SHIP_RADIUS: f64 = 1.5;
pub const SHIP_TURN_SPEED: f64 = 4.0; // Radians per second
pub const SHIP_ACCELERATION: f64 = 30.0;
pub const SHIP_DRAG: f64 = 0.95; // Velocity kept per tick

pub const SHOT_RADIUS: f64 = 0.5;
pub const SHOT_SPEED: f64 = 40.0;
pub const SHOT_LIFETIME: f64 = 1.2;
pub const SHOT_COOLDOWN: f64 = 0.3;

pub const ASTEROID_MIN_RADIUS: f64 = 1.5;
pub const ASTEROID_SPEED_LARGE: f64 = 6.0;
pub const ASTEROID_SPEED_MEDIUM: f64 = 9.0;
pub const ASTEROID_SPEED_SMALL: f64 = 12.0;
pub const ASTEROID_SPLIT_MIN_DEGREES: f64 = 20.0;
pub const ASTEROID_SPLIT_MAX_DEGREES: f64 = 50.0;
pub const ASTEROID_SPLIT_SPEEDUP: f64 = 1.2;
pub const ASTEROID_SPAWN_INTERVAL: f64 = 2.0;
pub const ASTEROID_SAFE_RADIUS: f64 = 15.0;

pub const SCORE_LARGE_ASTEROID: u32 = 20;
pub const SCORE_MEDIUM_ASTEROID: u32 = 50;
pub const SCORE_SMALL_ASTEROID: u32 = 100;

pub const TERMINAL_ASPECT_RATIO_COMPENSATION: f64 = 2.0; // Adjust this based on terminal character aspect ratio (height/width)
pub const DEFAULT_COLUMNS: u16 = 80;
pub const DEFAULT_ROWS: u16 = 24;

pub const LOG_FILE: &str = "asteroid-field.log";
pub const STATE_LOG_FPS: u64 = TICKS_PER_SECOND; // Frames between state snapshots
pub const STATE_LOG_MAX_SECONDS: u64 = 16;
pub const STATE_LOG_SAMPLE_LIMIT: usize = 10; // Entities logged per group

pub const HEADLESS_ENV_VAR: &str = "ASTEROID_FIELD_HEADLESS";
pub const HEADLESS_MAX_FRAMES: u64 = 120;
pub const HEADLESS_SEED: u64 = 7; // Headless runs replay the same field
