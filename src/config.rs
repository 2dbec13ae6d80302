use crate::constants::*;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("ship drag must be in (0, 1], got {0}")]
    DragOutOfRange(f64),

    #[error("asteroid split speed-up must be greater than 1, got {0}")]
    SplitSpeedupTooLow(f64),

    #[error("asteroid split angle range {min}..{max} degrees is invalid")]
    SplitAngleRange { min: f64, max: f64 },

    #[error("field {width}x{height} is too small for a safe radius of {safe_radius}")]
    FieldTooSmall {
        width: f64,
        height: f64,
        safe_radius: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub ship: ShipConfig,
    pub shot: ShotConfig,
    pub asteroid: AsteroidConfig,
    pub field: FieldConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShipConfig {
    pub radius: f64,
    pub turn_speed: f64, // Radians per second
    pub acceleration: f64,
    pub drag: f64, // Fraction of velocity kept each tick
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShotConfig {
    pub radius: f64,
    pub speed: f64,
    pub lifetime: f64,
    pub cooldown: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AsteroidConfig {
    pub min_radius: f64, // Smallest tier; larger tiers are multiples of it
    pub speed_large: f64,
    pub speed_medium: f64,
    pub speed_small: f64,
    pub split_min_degrees: f64,
    pub split_max_degrees: f64,
    pub split_speedup: f64,
    pub spawn_interval: f64,
    pub safe_radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldConfig {
    pub width: f64,
    pub height: f64,
    pub ticks_per_second: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub fps: u64, // Frames between state snapshots
    pub max_seconds: u64,
    pub sample_limit: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::for_terminal(DEFAULT_COLUMNS, DEFAULT_ROWS)
    }
}

impl GameConfig {
    pub fn for_terminal(columns: u16, rows: u16) -> Self {
        GameConfig {
            ship: ShipConfig {
                radius: SHIP_RADIUS,
                turn_speed: SHIP_TURN_SPEED,
                acceleration: SHIP_ACCELERATION,
                drag: SHIP_DRAG,
            },
            shot: ShotConfig {
                radius: SHOT_RADIUS,
                speed: SHOT_SPEED,
                lifetime: SHOT_LIFETIME,
                cooldown: SHOT_COOLDOWN,
            },
            asteroid: AsteroidConfig {
                min_radius: ASTEROID_MIN_RADIUS,
                speed_large: ASTEROID_SPEED_LARGE,
                speed_medium: ASTEROID_SPEED_MEDIUM,
                speed_small: ASTEROID_SPEED_SMALL,
                split_min_degrees: ASTEROID_SPLIT_MIN_DEGREES,
                split_max_degrees: ASTEROID_SPLIT_MAX_DEGREES,
                split_speedup: ASTEROID_SPLIT_SPEEDUP,
                spawn_interval: ASTEROID_SPAWN_INTERVAL,
                safe_radius: ASTEROID_SAFE_RADIUS,
            },
            field: FieldConfig {
                width: columns as f64,
                height: rows as f64 * TERMINAL_ASPECT_RATIO_COMPENSATION,
                ticks_per_second: TICKS_PER_SECOND,
            },
            logging: LoggingConfig {
                fps: STATE_LOG_FPS,
                max_seconds: STATE_LOG_MAX_SECONDS,
                sample_limit: STATE_LOG_SAMPLE_LIMIT,
            },
        }
    }

    pub fn dt(&self) -> f64 {
        1.0 / self.field.ticks_per_second as f64
    }

    pub fn max_asteroid_radius(&self) -> f64 {
        self.asteroid.min_radius * 3.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positives = [
            ("ship.radius", self.ship.radius),
            ("ship.turn_speed", self.ship.turn_speed),
            ("ship.acceleration", self.ship.acceleration),
            ("shot.radius", self.shot.radius),
            ("shot.speed", self.shot.speed),
            ("shot.lifetime", self.shot.lifetime),
            ("shot.cooldown", self.shot.cooldown),
            ("asteroid.min_radius", self.asteroid.min_radius),
            ("asteroid.speed_large", self.asteroid.speed_large),
            ("asteroid.speed_medium", self.asteroid.speed_medium),
            ("asteroid.speed_small", self.asteroid.speed_small),
            ("asteroid.spawn_interval", self.asteroid.spawn_interval),
            ("asteroid.safe_radius", self.asteroid.safe_radius),
            ("field.width", self.field.width),
            ("field.height", self.field.height),
            ("field.ticks_per_second", self.field.ticks_per_second as f64),
            ("logging.fps", self.logging.fps as f64),
        ];
        for (name, value) in positives {
            // Written this way so NaN is rejected too.
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }

        if !(self.ship.drag > 0.0 && self.ship.drag <= 1.0) {
            return Err(ConfigError::DragOutOfRange(self.ship.drag));
        }
        if !(self.asteroid.split_speedup > 1.0) {
            return Err(ConfigError::SplitSpeedupTooLow(self.asteroid.split_speedup));
        }
        let (min, max) = (self.asteroid.split_min_degrees, self.asteroid.split_max_degrees);
        if !(min >= 0.0 && min <= max && max.is_finite()) {
            return Err(ConfigError::SplitAngleRange { min, max });
        }

        let diagonal = self.field.width.hypot(self.field.height);
        if diagonal <= self.asteroid.safe_radius * 2.0 {
            return Err(ConfigError::FieldTooSmall {
                width: self.field.width,
                height: self.field.height,
                safe_radius: self.asteroid.safe_radius,
            });
        }
        Ok(())
    }
}
