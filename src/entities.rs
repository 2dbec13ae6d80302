use crate::config::{AsteroidConfig, GameConfig, ShotConfig};
use crate::constants::*;
use crate::types::{Vector2D, wrap_coordinate};
use rand::Rng;

// --- Circular body shared by every moving entity ---
#[derive(Clone, Debug, PartialEq)]
pub struct CircleShape {
    pub position: Vector2D,
    pub velocity: Vector2D,
    pub radius: f64,
}

impl CircleShape {
    /// Panics on a non-positive radius or non-finite vectors: those only come from a bug.
    pub fn new(position: Vector2D, velocity: Vector2D, radius: f64) -> Self {
        assert!(
            radius.is_finite() && radius > 0.0,
            "radius must be positive, got {radius}"
        );
        assert!(position.is_finite(), "position must be finite, got {position:?}");
        assert!(velocity.is_finite(), "velocity must be finite, got {velocity:?}");
        CircleShape { position, velocity, radius }
    }

    pub fn update(&mut self, dt: f64) {
        self.position = self.position.add(self.velocity.scale(dt));
    }

    /// Overlap test; circles that only touch do not collide.
    pub fn collides_with(&self, other: &CircleShape) -> bool {
        self.position.distance_to(other.position) < self.radius + other.radius
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    pub fn is_outside(&self, width: f64, height: f64, margin: f64) -> bool {
        let reach = self.radius + margin;
        self.position.x < -reach
            || self.position.y < -reach
            || self.position.x > width + reach
            || self.position.y > height + reach
    }
}

// --- Ship ---
#[derive(Clone, Debug)]
pub struct Ship {
    pub body: CircleShape,
    pub angle: f64, // Radians
    pub turn_speed: f64,
    pub acceleration: f64,
    pub drag: f64,
    pub cooldown: f64, // Seconds until the next shot is allowed
    shot: ShotConfig,
}

impl Ship {
    pub fn new(x: f64, y: f64, config: &GameConfig) -> Self {
        Ship {
            body: CircleShape::new(Vector2D::new(x, y), Vector2D::ZERO, config.ship.radius),
            angle: -std::f64::consts::FRAC_PI_2, // Facing upwards initially
            turn_speed: config.ship.turn_speed,
            acceleration: config.ship.acceleration,
            drag: config.ship.drag,
            cooldown: 0.0,
            shot: config.shot.clone(),
        }
    }

    pub fn forward(&self) -> Vector2D {
        Vector2D::from_angle(self.angle)
    }

    pub fn nose(&self) -> Vector2D {
        self.body.position.add(self.forward().scale(self.body.radius))
    }

    pub fn triangle(&self) -> [Vector2D; 3] {
        let forward = self.forward();
        let right = forward.perpendicular().scale(self.body.radius / 1.5);
        let rear = self.body.position.sub(forward.scale(self.body.radius));
        [self.nose(), rear.sub(right), rear.add(right)]
    }

    pub fn rotate(&mut self, direction: f64, dt: f64) {
        self.angle += self.turn_speed * direction * dt;
    }

    pub fn thrust(&mut self, direction: f64, dt: f64) {
        let thrust_vector = self.forward().scale(self.acceleration * direction * dt);
        self.body.velocity = self.body.velocity.add(thrust_vector);
    }

    pub fn update(&mut self, turn: f64, thrust: f64, dt: f64, width: f64, height: f64) {
        self.rotate(turn, dt);
        self.body.velocity = self.body.velocity.scale(self.drag);
        self.thrust(thrust, dt);
        self.cooldown = (self.cooldown - dt).max(0.0);
        self.body.update(dt);

        // Screen wrapping
        self.body.position.x = wrap_coordinate(self.body.position.x, width);
        self.body.position.y = wrap_coordinate(self.body.position.y, height);
    }

    pub fn can_fire(&self) -> bool {
        self.cooldown <= 0.0
    }

    pub fn fire(&mut self) -> Option<Shot> {
        if !self.can_fire() {
            return None;
        }
        self.cooldown = self.shot.cooldown;
        let velocity = self.forward().scale(self.shot.speed);
        Some(Shot::new(self.nose(), velocity, self.shot.radius, self.shot.lifetime))
    }
}

// --- Shot ---
#[derive(Clone, Debug)]
pub struct Shot {
    pub body: CircleShape,
    pub lifetime: f64,
    max_lifetime: f64,
}

impl Shot {
    pub fn new(position: Vector2D, velocity: Vector2D, radius: f64, lifetime: f64) -> Self {
        Shot {
            body: CircleShape::new(position, velocity, radius),
            lifetime,
            max_lifetime: lifetime,
        }
    }

    pub fn update(&mut self, dt: f64) {
        self.body.update(dt);
        self.lifetime -= dt;
    }

    pub fn is_expired(&self) -> bool {
        self.lifetime <= 0.0
    }

    pub fn lifetime_fraction(&self) -> f64 {
        (self.lifetime / self.max_lifetime).clamp(0.0, 1.0)
    }
}

// --- Asteroids ---
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AsteroidSize {
    Large,
    Medium,
    Small,
}

impl AsteroidSize {
    pub fn radius(&self, config: &AsteroidConfig) -> f64 {
        let factor = match self {
            AsteroidSize::Large => 3.0,
            AsteroidSize::Medium => 2.0,
            AsteroidSize::Small => 1.0,
        };
        config.min_radius * factor
    }

    pub fn base_speed(&self, config: &AsteroidConfig) -> f64 {
        match self {
            AsteroidSize::Large => config.speed_large,
            AsteroidSize::Medium => config.speed_medium,
            AsteroidSize::Small => config.speed_small,
        }
    }

    pub fn smaller(&self) -> Option<AsteroidSize> {
        match self {
            AsteroidSize::Large => Some(AsteroidSize::Medium),
            AsteroidSize::Medium => Some(AsteroidSize::Small),
            AsteroidSize::Small => None,
        }
    }

    pub fn score(&self) -> u32 {
        match self {
            AsteroidSize::Large => SCORE_LARGE_ASTEROID,
            AsteroidSize::Medium => SCORE_MEDIUM_ASTEROID,
            AsteroidSize::Small => SCORE_SMALL_ASTEROID,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AsteroidSize::Large => "large",
            AsteroidSize::Medium => "medium",
            AsteroidSize::Small => "small",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Asteroid {
    pub body: CircleShape,
    pub size: AsteroidSize,
}

impl Asteroid {
    pub fn new(position: Vector2D, velocity: Vector2D, size: AsteroidSize, config: &AsteroidConfig) -> Self {
        Asteroid {
            body: CircleShape::new(position, velocity, size.radius(config)),
            size,
        }
    }

    pub fn drifting(position: Vector2D, rng: &mut impl Rng, size: AsteroidSize, config: &AsteroidConfig) -> Self {
        let angle = rng.gen_range(0.0..2.0 * std::f64::consts::PI);
        let velocity = Vector2D::from_angle(angle).scale(size.base_speed(config));
        Asteroid::new(position, velocity, size, config)
    }

    pub fn update(&mut self, dt: f64) {
        self.body.update(dt);
    }

    // The smallest tier yields nothing.
    pub fn split(&self, rng: &mut impl Rng, config: &AsteroidConfig) -> Option<(Asteroid, Asteroid)> {
        let size = self.size.smaller()?;
        let angle = rng
            .gen_range(config.split_min_degrees..=config.split_max_degrees)
            .to_radians();
        let velocity = self.body.velocity.scale(config.split_speedup);
        let position = self.body.position;
        Some((
            Asteroid::new(position, velocity.rotate(angle), size, config),
            Asteroid::new(position, velocity.rotate(-angle), size, config),
        ))
    }
}
