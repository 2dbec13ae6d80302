use std::sync::OnceLock;
use std::time::Instant;

use log::info;
use serde_json::{Map, Value, json};

use crate::config::LoggingConfig;
use crate::field::{EntityView, FieldSnapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    ShotFired,
    ShotExpired,
    AsteroidSpawned,
    AsteroidSplit,
    AsteroidDestroyed,
    ShipDestroyed,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ShotFired => "shot_fired",
            EventKind::ShotExpired => "shot_expired",
            EventKind::AsteroidSpawned => "asteroid_spawned",
            EventKind::AsteroidSplit => "asteroid_split",
            EventKind::AsteroidDestroyed => "asteroid_destroyed",
            EventKind::ShipDestroyed => "ship_destroyed",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameEvent {
    pub kind: EventKind,
    pub fields: Value,
}

impl GameEvent {
    pub fn new(kind: EventKind, fields: Value) -> Self {
        GameEvent { kind, fields }
    }
}

static CLOCK: OnceLock<Instant> = OnceLock::new();

// Seconds since the first event or state entry, shared by both log targets.
fn elapsed_s() -> f64 {
    round2(CLOCK.get_or_init(Instant::now).elapsed().as_secs_f64())
}

pub fn record(kind: EventKind, fields: &Value) {
    info!(target: "events", "{}", event_line(kind, fields, elapsed_s()));
}

fn event_line(kind: EventKind, fields: &Value, elapsed_s: f64) -> Value {
    let mut entry = Map::new();
    entry.insert("type".to_string(), json!(kind.name()));
    entry.insert("elapsed_s".to_string(), json!(elapsed_s));
    match fields {
        Value::Object(fields) => {
            for (key, value) in fields {
                entry.insert(key.clone(), value.clone());
            }
        }
        Value::Null => {}
        other => {
            entry.insert("details".to_string(), other.clone());
        }
    }
    Value::Object(entry)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn entity_json(view: &EntityView) -> Value {
    let mut info = Map::new();
    info.insert("type".to_string(), json!(view.kind.name()));
    info.insert(
        "pos".to_string(),
        json!([round2(view.position.x), round2(view.position.y)]),
    );
    info.insert(
        "vel".to_string(),
        json!([round2(view.velocity.x), round2(view.velocity.y)]),
    );
    info.insert("rad".to_string(), json!(view.radius));
    if let Some(heading) = view.heading {
        info.insert("rot".to_string(), json!(round2(heading)));
    }
    Value::Object(info)
}

// --- Periodic state snapshots ---
pub struct StateRecorder {
    frame_count: u64,
    fps: u64,
    max_seconds: u64,
    sample_limit: usize,
    screen_size: (u16, u16),
}

impl StateRecorder {
    pub fn new(config: &LoggingConfig, screen_size: (u16, u16)) -> Self {
        StateRecorder {
            frame_count: 0,
            fps: config.fps.max(1),
            max_seconds: config.max_seconds,
            sample_limit: config.sample_limit,
            screen_size,
        }
    }

    // Call once per frame.
    pub fn observe(&mut self, snapshot: &FieldSnapshot) -> Option<Value> {
        if self.frame_count > self.fps * self.max_seconds {
            return None;
        }
        self.frame_count += 1;
        if self.frame_count % self.fps != 0 {
            return None;
        }

        let entry = self.entry(snapshot);
        info!(target: "state", "{}", entry);
        Some(entry)
    }

    fn group(&self, views: &[EntityView]) -> Value {
        let sprites: Vec<Value> = views.iter().take(self.sample_limit).map(entity_json).collect();
        json!({ "count": views.len(), "sprites": sprites })
    }

    fn entry(&self, snapshot: &FieldSnapshot) -> Value {
        json!({
            "elapsed_s": elapsed_s(),
            "frame": self.frame_count,
            "field_frame": snapshot.frame,
            "screen_size": [self.screen_size.0, self.screen_size.1],
            "field_size": [snapshot.width, snapshot.height],
            "state": snapshot.state.name(),
            "score": snapshot.score,
            "ship": entity_json(&snapshot.ship),
            "shots": self.group(&snapshot.shots),
            "asteroids": self.group(&snapshot.asteroids),
        })
    }
}
