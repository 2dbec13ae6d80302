use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

use crate::config::GameConfig;
use crate::entities::{Asteroid, AsteroidSize, Ship, Shot};
use crate::events::{EventKind, GameEvent};
use crate::types::{Vector2D, wrap_coordinate};

const SPAWN_ATTEMPTS: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldState {
    Running,
    GameOver,
}

impl FieldState {
    pub fn name(&self) -> &'static str {
        match self {
            FieldState::Running => "running",
            FieldState::GameOver => "game_over",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
    pub quit: bool,
}

impl InputState {
    pub fn turn(&self) -> f64 {
        axis(self.right, self.left)
    }

    pub fn thrust(&self) -> f64 {
        axis(self.forward, self.backward)
    }
}

fn axis(positive: bool, negative: bool) -> f64 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Ship,
    Shot,
    Asteroid(AsteroidSize),
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Ship => "Ship",
            EntityKind::Shot => "Shot",
            EntityKind::Asteroid(_) => "Asteroid",
        }
    }
}

// --- Read-only views handed to rendering and logging ---
#[derive(Clone, Debug, PartialEq)]
pub struct EntityView {
    pub kind: EntityKind,
    pub position: Vector2D,
    pub velocity: Vector2D,
    pub radius: f64,
    pub heading: Option<f64>,
    pub lifetime: Option<f64>, // Fraction of the full lifetime, shots only
    pub outline: Option<[Vector2D; 3]>, // Ship triangle: nose, rear left, rear right
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldSnapshot {
    pub state: FieldState,
    pub score: u32,
    pub frame: u64,
    pub width: f64,
    pub height: f64,
    pub ship: EntityView,
    pub shots: Vec<EntityView>,
    pub asteroids: Vec<EntityView>,
}

pub struct Field {
    config: GameConfig,
    ship: Ship,
    shots: Vec<Shot>,
    asteroids: Vec<Asteroid>,
    state: FieldState,
    score: u32,
    frame: u64,
    spawn_timer: f64,
    events: Vec<GameEvent>,
    rng: StdRng,
}

impl Field {
    pub fn new(config: GameConfig) -> Self {
        Field::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Field::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, rng: StdRng) -> Self {
        let ship = Ship::new(config.field.width / 2.0, config.field.height / 2.0, &config);
        info!(
            "Field created: {}x{} world units, ship at ({}, {})",
            config.field.width, config.field.height, ship.body.position.x, ship.body.position.y
        );
        Field {
            config,
            ship,
            shots: Vec::new(),
            asteroids: Vec::new(),
            state: FieldState::Running,
            score: 0,
            frame: 0,
            spawn_timer: 0.0,
            events: Vec::new(),
            rng,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> FieldState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn ship(&self) -> &Ship {
        &self.ship
    }

    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    pub fn asteroids(&self) -> &[Asteroid] {
        &self.asteroids
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, kind: EventKind, mut fields: Value) {
        if let Value::Object(map) = &mut fields {
            map.insert("frame".to_string(), json!(self.frame));
        }
        self.events.push(GameEvent::new(kind, fields));
    }

    pub fn spawn_asteroid(&mut self, asteroid: Asteroid) {
        let fields = json!({
            "size": asteroid.size.name(),
            "x": asteroid.body.position.x,
            "y": asteroid.body.position.y,
            "vx": asteroid.body.velocity.x,
            "vy": asteroid.body.velocity.y,
        });
        self.asteroids.push(asteroid);
        self.emit(EventKind::AsteroidSpawned, fields);
    }

    pub fn spawn_large_asteroid(&mut self) {
        let position = self.spawn_position();
        let asteroid = Asteroid::drifting(position, &mut self.rng, AsteroidSize::Large, &self.config.asteroid);
        self.spawn_asteroid(asteroid);
    }

    pub fn insert_shot(&mut self, shot: Shot) {
        let fields = json!({
            "x": shot.body.position.x,
            "y": shot.body.position.y,
            "vx": shot.body.velocity.x,
            "vy": shot.body.velocity.y,
        });
        self.shots.push(shot);
        self.emit(EventKind::ShotFired, fields);
    }

    pub fn tick(&mut self, input: &InputState, dt: f64) {
        if self.state == FieldState::GameOver {
            return;
        }
        self.frame += 1;

        self.update_ship(input, dt);
        self.update_entities(dt);
        self.resolve_collisions();
        if self.state == FieldState::GameOver {
            return;
        }
        self.update_spawn_timer(dt);
    }

    fn update_ship(&mut self, input: &InputState, dt: f64) {
        let (width, height) = (self.config.field.width, self.config.field.height);
        self.ship.update(input.turn(), input.thrust(), dt, width, height);
        if input.fire {
            if let Some(shot) = self.ship.fire() {
                self.insert_shot(shot);
            }
        }
    }

    fn update_entities(&mut self, dt: f64) {
        let (width, height) = (self.config.field.width, self.config.field.height);
        let asteroid_margin = self.config.max_asteroid_radius() * 2.0;

        let mut expired = Vec::new();
        self.shots.retain_mut(|shot| {
            shot.update(dt);
            if shot.is_expired() {
                expired.push(shot.body.position);
                return false;
            }
            !shot.body.is_outside(width, height, 0.0)
        });
        for position in expired {
            self.emit(EventKind::ShotExpired, json!({ "x": position.x, "y": position.y }));
        }

        let before = self.asteroids.len();
        self.asteroids.retain_mut(|asteroid| {
            asteroid.update(dt);
            !asteroid.body.is_outside(width, height, asteroid_margin)
        });
        if self.asteroids.len() != before {
            debug!("{} asteroids drifted out of the field", before - self.asteroids.len());
        }
    }

    fn resolve_collisions(&mut self) {
        let mut survivors = Vec::with_capacity(self.asteroids.len() + 2);
        let mut pending = std::mem::take(&mut self.asteroids).into_iter();

        while let Some(asteroid) = pending.next() {
            if asteroid.body.collides_with(&self.ship.body) {
                let fields = json!({
                    "x": self.ship.body.position.x,
                    "y": self.ship.body.position.y,
                    "asteroid": asteroid.size.name(),
                    "score": self.score,
                });
                survivors.push(asteroid);
                survivors.extend(pending);
                self.asteroids = survivors;
                self.state = FieldState::GameOver;
                info!("Ship destroyed on frame {} with score {}", self.frame, self.score);
                self.emit(EventKind::ShipDestroyed, fields);
                return;
            }

            let hit = self
                .shots
                .iter()
                .position(|shot| shot.body.collides_with(&asteroid.body));
            let Some(index) = hit else {
                survivors.push(asteroid);
                continue;
            };

            self.shots.remove(index);
            self.score += asteroid.size.score();
            let position = asteroid.body.position;
            match asteroid.split(&mut self.rng, &self.config.asteroid) {
                Some((first, second)) => {
                    self.emit(
                        EventKind::AsteroidSplit,
                        json!({
                            "size": asteroid.size.name(),
                            "into": first.size.name(),
                            "speed": asteroid.body.speed(),
                            "x": position.x,
                            "y": position.y,
                        }),
                    );
                    // Fragments join after the pass, so they are not tested again this tick.
                    survivors.push(first);
                    survivors.push(second);
                }
                None => {
                    self.emit(
                        EventKind::AsteroidDestroyed,
                        json!({ "size": asteroid.size.name(), "x": position.x, "y": position.y }),
                    );
                }
            }
        }

        self.asteroids = survivors;
    }

    fn update_spawn_timer(&mut self, dt: f64) {
        self.spawn_timer += dt;
        if self.spawn_timer > self.config.asteroid.spawn_interval {
            self.spawn_timer = 0.0;
            self.spawn_large_asteroid();
        }
    }

    fn spawn_position(&mut self) -> Vector2D {
        let (width, height) = (self.config.field.width, self.config.field.height);
        let ship = self.ship.body.position;
        for _ in 0..SPAWN_ATTEMPTS {
            let candidate = Vector2D::new(self.rng.gen_range(0.0..width), self.rng.gen_range(0.0..height));
            if candidate.distance_to(ship) >= self.config.asteroid.safe_radius {
                return candidate;
            }
        }
        fallback_spawn_position(ship, width, height)
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot {
            state: self.state,
            score: self.score,
            frame: self.frame,
            width: self.config.field.width,
            height: self.config.field.height,
            ship: EntityView {
                kind: EntityKind::Ship,
                position: self.ship.body.position,
                velocity: self.ship.body.velocity,
                radius: self.ship.body.radius,
                heading: Some(self.ship.angle),
                lifetime: None,
                outline: Some(self.ship.triangle()),
            },
            shots: self
                .shots
                .iter()
                .map(|shot| EntityView {
                    kind: EntityKind::Shot,
                    position: shot.body.position,
                    velocity: shot.body.velocity,
                    radius: shot.body.radius,
                    heading: None,
                    lifetime: Some(shot.lifetime_fraction()),
                    outline: None,
                })
                .collect(),
            asteroids: self
                .asteroids
                .iter()
                .map(|asteroid| EntityView {
                    kind: EntityKind::Asteroid(asteroid.size),
                    position: asteroid.body.position,
                    velocity: asteroid.body.velocity,
                    radius: asteroid.body.radius,
                    heading: None,
                    lifetime: None,
                    outline: None,
                })
                .collect(),
        }
    }

    #[cfg(test)]
    pub(crate) fn ship_mut(&mut self) -> &mut Ship {
        &mut self.ship
    }
}

// Half a field away on both axes, so the distance to the ship is half the diagonal.
// Config validation keeps that outside the safe radius.
fn fallback_spawn_position(ship: Vector2D, width: f64, height: f64) -> Vector2D {
    Vector2D::new(
        wrap_coordinate(ship.x + width / 2.0, width),
        wrap_coordinate(ship.y + height / 2.0, height),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn field() -> Field {
        Field::with_seed(GameConfig::default(), 42)
    }

    fn still_asteroid(field: &Field, x: f64, y: f64, size: AsteroidSize) -> Asteroid {
        Asteroid::new(Vector2D::new(x, y), Vector2D::ZERO, size, &field.config().asteroid)
    }

    fn still_shot(x: f64, y: f64) -> Shot {
        Shot::new(Vector2D::new(x, y), Vector2D::ZERO, 0.5, 1.0)
    }

    fn count(field: &Field, size: AsteroidSize) -> usize {
        field.asteroids().iter().filter(|a| a.size == size).count()
    }

    fn idle() -> InputState {
        InputState::default()
    }

    #[test]
    fn new_field_is_running_with_ship_in_centre() {
        let field = field();
        assert_eq!(field.state(), FieldState::Running);
        assert_eq!(field.ship().body.position, Vector2D::new(40.0, 24.0));
        assert!(field.shots().is_empty());
        assert!(field.asteroids().is_empty());
        assert_eq!(field.score(), 0);
    }

    #[test]
    fn input_axes() {
        let input = InputState { forward: true, left: true, ..Default::default() };
        assert_eq!(input.thrust(), 1.0);
        assert_eq!(input.turn(), -1.0);

        let both = InputState { left: true, right: true, backward: true, ..Default::default() };
        assert_eq!(both.turn(), 0.0);
        assert_eq!(both.thrust(), -1.0);
    }

    #[test]
    fn forward_thrust_matches_geometric_decay() {
        let mut field = field();
        {
            let ship = field.ship_mut();
            ship.body.position = Vector2D::ZERO;
            ship.angle = 0.0;
        }
        let config = field.config().clone();
        let dt = config.dt();
        let forward = InputState { forward: true, ..Default::default() };

        let ticks = 20;
        for _ in 0..ticks {
            field.tick(&forward, dt);
        }

        let a = config.ship.acceleration * dt;
        let d = config.ship.drag;
        let expected = a * (1.0 - d.powi(ticks)) / (1.0 - d);
        let velocity = field.ship().body.velocity;
        assert_abs_diff_eq!(velocity.x, expected, epsilon = 1e-9);
        assert_abs_diff_eq!(velocity.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn firing_twice_inside_cooldown_makes_one_shot() {
        let mut field = field();
        let fire = InputState { fire: true, ..Default::default() };
        field.tick(&fire, 0.01);
        field.tick(&fire, 0.01);
        assert_eq!(field.shots().len(), 1);

        let fired = field
            .drain_events()
            .iter()
            .filter(|event| event.kind == EventKind::ShotFired)
            .count();
        assert_eq!(fired, 1);
    }

    #[test]
    fn shot_is_removed_on_the_tick_it_expires() {
        let mut config = GameConfig::default();
        config.shot.lifetime = 0.75;
        let mut field = Field::with_seed(config, 1);
        field.insert_shot(Shot::new(Vector2D::new(10.0, 10.0), Vector2D::ZERO, 0.5, 0.75));
        field.drain_events();

        field.tick(&idle(), 0.25);
        field.tick(&idle(), 0.25);
        assert_eq!(field.shots().len(), 1);
        assert!(field.drain_events().is_empty());

        field.tick(&idle(), 0.25);
        assert!(field.shots().is_empty());
        let events = field.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::ShotExpired);
        assert_eq!(events[0].fields["frame"], 3);
    }

    #[test]
    fn shots_leaving_the_field_are_dropped() {
        let mut field = field();
        field.insert_shot(Shot::new(Vector2D::new(79.0, 10.0), Vector2D::new(40.0, 0.0), 0.5, 10.0));
        field.tick(&idle(), 0.1);
        assert!(field.shots().is_empty());
    }

    #[test]
    fn asteroids_far_outside_are_dropped() {
        let mut field = field();
        let outside = Asteroid::new(
            Vector2D::new(-20.0, 10.0),
            Vector2D::new(-1.0, 0.0),
            AsteroidSize::Small,
            &field.config().asteroid,
        );
        field.spawn_asteroid(outside);
        let near_edge = still_asteroid(&field, -3.0, 10.0, AsteroidSize::Small);
        field.spawn_asteroid(near_edge);

        field.tick(&idle(), 0.1);
        assert_eq!(field.asteroids().len(), 1);
        assert_eq!(field.asteroids()[0].body.position.x, -3.0);
    }

    #[test]
    fn ship_collision_ends_the_game() {
        let mut field = field();
        let asteroid = still_asteroid(&field, 43.0, 24.0, AsteroidSize::Medium);
        field.spawn_asteroid(asteroid);

        field.tick(&idle(), 0.01);
        assert_eq!(field.state(), FieldState::GameOver);
        assert_eq!(field.frame(), 1);
        assert!(
            field
                .drain_events()
                .iter()
                .any(|event| event.kind == EventKind::ShipDestroyed)
        );

        // Nothing moves once the game is over.
        let fire = InputState { fire: true, forward: true, ..Default::default() };
        field.tick(&fire, 1.0);
        assert_eq!(field.frame(), 1);
        assert!(field.shots().is_empty());
        assert_eq!(field.asteroids().len(), 1);
    }

    #[test]
    fn touching_the_ship_is_not_a_hit() {
        let mut field = field();
        // Ship radius 1.5 + medium radius 3.0, centres exactly 4.5 apart.
        let asteroid = still_asteroid(&field, 44.5, 24.0, AsteroidSize::Medium);
        field.spawn_asteroid(asteroid);
        field.tick(&idle(), 0.0);
        assert_eq!(field.state(), FieldState::Running);
    }

    #[test]
    fn ship_is_tested_before_shots() {
        let mut field = field();
        let asteroid = still_asteroid(&field, 42.0, 24.0, AsteroidSize::Large);
        field.spawn_asteroid(asteroid);
        field.insert_shot(still_shot(42.0, 24.0));

        field.tick(&idle(), 0.0);
        assert_eq!(field.state(), FieldState::GameOver);
        assert_eq!(field.shots().len(), 1);
        assert_eq!(count(&field, AsteroidSize::Large), 1);
        assert_eq!(field.score(), 0);
    }

    #[test]
    fn asteroids_before_a_ship_hit_are_still_resolved() {
        let mut field = field();
        let far = still_asteroid(&field, 10.0, 10.0, AsteroidSize::Small);
        field.spawn_asteroid(far);
        let on_ship = still_asteroid(&field, 40.0, 25.0, AsteroidSize::Small);
        field.spawn_asteroid(on_ship);
        field.insert_shot(still_shot(10.0, 10.0));

        field.tick(&idle(), 0.0);
        assert_eq!(field.state(), FieldState::GameOver);
        assert_eq!(field.asteroids().len(), 1);
        assert!(field.shots().is_empty());
        assert_eq!(field.score(), AsteroidSize::Small.score());
    }

    #[test]
    fn large_asteroid_breaks_down_to_four_small() {
        let mut field = field();
        let large = still_asteroid(&field, 70.0, 10.0, AsteroidSize::Large);
        field.spawn_asteroid(large);

        field.insert_shot(still_shot(70.0, 10.0));
        field.tick(&idle(), 0.0);
        assert_eq!(count(&field, AsteroidSize::Medium), 2);
        assert!(field.shots().is_empty());

        // One shot for each medium descendant.
        field.insert_shot(still_shot(70.0, 10.0));
        field.insert_shot(still_shot(70.0, 10.0));
        field.tick(&idle(), 0.0);

        assert_eq!(field.asteroids().len(), 4);
        assert_eq!(count(&field, AsteroidSize::Small), 4);
        assert!(field.shots().is_empty());
        assert_eq!(
            field.score(),
            AsteroidSize::Large.score() + 2 * AsteroidSize::Medium.score()
        );
        assert_eq!(field.state(), FieldState::Running);
    }

    #[test]
    fn fragments_are_not_hit_in_the_tick_they_appear() {
        let mut field = field();
        let large = still_asteroid(&field, 70.0, 10.0, AsteroidSize::Large);
        field.spawn_asteroid(large);
        field.insert_shot(still_shot(70.0, 10.0));
        field.insert_shot(still_shot(70.0, 10.0));

        field.tick(&idle(), 0.0);
        assert_eq!(count(&field, AsteroidSize::Medium), 2);
        assert_eq!(field.shots().len(), 1);

        field.tick(&idle(), 0.0);
        assert_eq!(count(&field, AsteroidSize::Medium), 1);
        assert_eq!(count(&field, AsteroidSize::Small), 2);
        assert!(field.shots().is_empty());
    }

    #[test]
    fn one_shot_destroys_one_asteroid() {
        let mut field = field();
        for _ in 0..2 {
            let small = still_asteroid(&field, 10.0, 10.0, AsteroidSize::Small);
            field.spawn_asteroid(small);
        }
        field.insert_shot(still_shot(10.0, 10.0));
        field.drain_events();

        field.tick(&idle(), 0.0);
        assert_eq!(field.asteroids().len(), 1);
        let events = field.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::AsteroidDestroyed);
        assert_eq!(events[0].fields["size"], "small");
    }

    #[test]
    fn spawn_timer_fires_after_the_interval() {
        let mut config = GameConfig::default();
        config.asteroid.spawn_interval = 1.0;
        let mut field = Field::with_seed(config, 9);

        field.tick(&idle(), 0.5);
        field.tick(&idle(), 0.5);
        assert!(field.asteroids().is_empty());

        field.tick(&idle(), 0.5);
        assert_eq!(field.asteroids().len(), 1);
        let asteroid = &field.asteroids()[0];
        assert_eq!(asteroid.size, AsteroidSize::Large);
        assert_abs_diff_eq!(asteroid.body.speed(), field.config().asteroid.speed_large, epsilon = 1e-9);
        assert!(asteroid.body.position.distance_to(field.ship().body.position) >= field.config().asteroid.safe_radius);

        // The timer restarted, so the next spawn is a full interval away.
        field.tick(&idle(), 0.5);
        field.tick(&idle(), 0.5);
        assert_eq!(field.asteroids().len(), 1);
    }

    #[test]
    fn spawn_positions_respect_safe_radius() {
        let mut field = field();
        let ship = field.ship().body.position;
        let safe_radius = field.config().asteroid.safe_radius;
        for _ in 0..200 {
            let position = field.spawn_position();
            assert!(position.distance_to(ship) >= safe_radius);
            assert!(position.x >= 0.0 && position.x < field.config().field.width);
            assert!(position.y >= 0.0 && position.y < field.config().field.height);
        }
    }

    #[test]
    fn fallback_position_clears_safe_radius_on_a_tight_field() {
        let config = GameConfig::for_terminal(30, 10);
        assert_eq!(config.validate(), Ok(()));
        let (width, height) = (config.field.width, config.field.height);

        for &(x, y) in &[(15.0, 10.0), (0.0, 0.0), (29.5, 19.5), (3.0, 17.0), (22.0, 1.0)] {
            let ship = Vector2D::new(x, y);
            let position = fallback_spawn_position(ship, width, height);
            assert!(position.x >= 0.0 && position.x < width);
            assert!(position.y >= 0.0 && position.y < height);
            assert!(position.distance_to(ship) > config.asteroid.safe_radius);
        }
    }

    #[test]
    fn spawning_falls_back_when_sampling_keeps_failing() {
        let mut config = GameConfig::for_terminal(30, 10);
        // Only thin slivers in the corners lie this far from the centre.
        config.asteroid.safe_radius = 17.5;
        assert_eq!(config.validate(), Ok(()));
        let mut field = Field::with_seed(config, 3);
        let ship = field.ship().body.position;
        let fallback = fallback_spawn_position(ship, 30.0, 20.0);

        let mut fallbacks = 0;
        for _ in 0..50 {
            let position = field.spawn_position();
            assert!(position.distance_to(ship) >= 17.5);
            assert!(position.x >= 0.0 && position.x < 30.0);
            assert!(position.y >= 0.0 && position.y < 20.0);
            if position == fallback {
                fallbacks += 1;
            }
        }
        assert!(fallbacks > 0);
    }

    #[test]
    fn snapshot_lists_every_entity() {
        let mut field = field();
        let asteroid = still_asteroid(&field, 10.0, 10.0, AsteroidSize::Medium);
        field.spawn_asteroid(asteroid);
        field.insert_shot(still_shot(60.0, 30.0));

        let snapshot = field.snapshot();
        assert_eq!(snapshot.state, FieldState::Running);
        assert_eq!(snapshot.ship.kind, EntityKind::Ship);
        assert_eq!(snapshot.ship.heading, Some(field.ship().angle));
        assert_eq!(snapshot.ship.outline, Some(field.ship().triangle()));
        assert_eq!(snapshot.shots[0].outline, None);
        assert_eq!(snapshot.shots.len(), 1);
        assert_eq!(snapshot.shots[0].lifetime, Some(1.0));
        assert_eq!(snapshot.asteroids.len(), 1);
        assert_eq!(snapshot.asteroids[0].kind, EntityKind::Asteroid(AsteroidSize::Medium));
        assert_eq!(snapshot.asteroids[0].radius, 3.0);
    }
}
