//! Serializable configuration and state types.
//!
//! Two formats live here:
//!
//! - [`Snapshot`] – the flat JSON interchange form of a `Space`
//!   (`Space::get_state` / `Space::set_state`)
//! - [`ScenarioConfig`] – a YAML scenario for the command line runner, made of
//!   [`EngineConfig`], [`ParametersConfig`] and a list of [`BodyConfig`]
//!
//! # Snapshot JSON
//!
//! ```json
//! {
//!   "time": 0.0,
//!   "objects": [
//!     { "name": "sun", "mass": 1.989e30, "radius": 6.96e8, "pos": [0, 0], "vel": [0, 0] }
//!   ],
//!   "eps": 1.0, "theta": 0.5,
//!   "collisionEnabled": true, "trackRecordingEnabled": false
//! }
//! ```
//!
//! # Scenario YAML
//!
//! ```yaml
//! engine:
//!   theta: 0.5              # opening angle
//!   collision: true         # merge overlapping bodies
//!   track_recording: false
//!
//! parameters:
//!   t_end: 3.1536e7         # total simulated time (s)
//!   h0: 3600.0              # step size (s)
//!   eps: 1.0e3              # softening length (m)
//!   G: 6.674e-11            # gravitational constant
//!
//! bodies:
//!   - name: sun
//!     x: [ 0.0, 0.0 ]
//!     v: [ 0.0, 0.0 ]
//!     m: 1.989e30
//!     radius: 6.96e8
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::simulation::error::SpaceError;

/// One body in a [`Snapshot`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SnapshotObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub mass: f64,
    pub radius: f64,
    pub pos: [f64; 2],
    pub vel: [f64; 2],
}

/// Complete observable state of a space.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub time: f64,
    pub objects: Vec<SnapshotObject>,
    pub eps: f64,
    pub theta: f64,
    pub collision_enabled: bool,
    pub track_recording_enabled: bool,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, SpaceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SpaceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every field a space relies on; nothing is mutated on failure.
    pub fn validate(&self) -> Result<(), SpaceError> {
        if !self.time.is_finite() {
            return Err(SpaceError::invalid_snapshot(format!("time is not finite: {}", self.time)));
        }
        if !self.eps.is_finite() {
            return Err(SpaceError::invalid_snapshot(format!("eps is not finite: {}", self.eps)));
        }
        if !self.theta.is_finite() {
            return Err(SpaceError::invalid_snapshot(format!("theta is not finite: {}", self.theta)));
        }
        for (i, o) in self.objects.iter().enumerate() {
            let label = o.name.clone().unwrap_or_else(|| format!("objects[{i}]"));
            if !o.mass.is_finite() || o.mass < 0.0 {
                return Err(SpaceError::invalid_snapshot(format!("{label}: mass must be finite and >= 0: {}", o.mass)));
            }
            if !o.radius.is_finite() || o.radius < 0.0 {
                return Err(SpaceError::invalid_snapshot(format!("{label}: radius must be finite and >= 0: {}", o.radius)));
            }
            if !o.pos.iter().chain(o.vel.iter()).all(|c| c.is_finite()) {
                return Err(SpaceError::invalid_snapshot(format!("{label}: pos/vel must be finite")));
            }
        }
        Ok(())
    }
}

/// Engine options of a scenario
#[derive(Deserialize, Debug, Clone)]
pub struct EngineConfig {
    pub theta: Option<f64>, // opening angle, defaults to SpaceParams::default()
    #[serde(default = "default_true")]
    pub collision: bool, // merge bodies whose circles overlap
    #[serde(default)]
    pub track_recording: bool, // record per-body trajectories
}

/// Numerical and physical parameters of a scenario
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub t_end: f64, // time end
    pub h0: f64, // time step size
    pub eps: Option<f64>, // softening length
    pub G: Option<f64>, // gravitational constant
}

/// Initial state of one body
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub name: Option<String>,
    pub x: [f64; 2], // initial position
    #[serde(default)]
    pub v: [f64; 2], // initial velocity
    pub m: f64, // mass
    pub radius: f64, // collision radius
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub engine: EngineConfig,
    pub parameters: ParametersConfig,
    pub bodies: Vec<BodyConfig>,
}

impl ScenarioConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, SpaceError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SpaceError> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        Snapshot {
            time: 12.5,
            objects: vec![SnapshotObject {
                name: None,
                mass: 2.0,
                radius: 1.0,
                pos: [1.0, -1.0],
                vel: [0.0, 3.0],
            }],
            eps: 0.5,
            theta: 0.7,
            collision_enabled: true,
            track_recording_enabled: false,
        }
    }

    #[test]
    fn json_uses_interchange_field_names() {
        let json = sample().to_json().unwrap();
        assert!(json.contains("\"collisionEnabled\""));
        assert!(json.contains("\"trackRecordingEnabled\""));
        assert!(json.contains("\"pos\""));
        assert!(!json.contains("\"name\""));
        assert_eq!(Snapshot::from_json(&json).unwrap(), sample());
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = Snapshot::from_json(r#"{"time": 0, "objects": [{"mass": 1, "radius": 1, "pos": [1], "vel": [0, 0]}], "eps": 1, "theta": 1, "collisionEnabled": true, "trackRecordingEnabled": false}"#);
        assert!(matches!(err, Err(SpaceError::Json(_))));
    }

    #[test]
    fn validation_rejects_bad_bodies() {
        let mut s = sample();
        s.objects[0].mass = -1.0;
        assert!(matches!(s.validate(), Err(SpaceError::InvalidSnapshot(_))));

        let mut s = sample();
        s.objects[0].vel = [f64::NAN, 0.0];
        assert!(s.validate().is_err());

        let mut s = sample();
        s.theta = f64::INFINITY;
        assert!(s.validate().is_err());
    }

    #[test]
    fn scenario_yaml_defaults() {
        let cfg = ScenarioConfig::from_yaml(
            "engine: { theta: 0.3 }\nparameters: { t_end: 10.0, h0: 1.0 }\nbodies:\n  - x: [1.0, 2.0]\n    m: 1.0\n    radius: 0.1\n",
        )
        .unwrap();
        assert!(cfg.engine.collision);
        assert!(!cfg.engine.track_recording);
        assert_eq!(cfg.bodies[0].v, [0.0, 0.0]);
        assert!(cfg.parameters.G.is_none());
    }

    #[test]
    fn scenario_file_loading() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios").join("two_jupiters.yaml");
        let cfg = ScenarioConfig::from_file(&path).unwrap();
        assert_eq!(cfg.bodies.len(), 2);
        assert_eq!(cfg.bodies[0].name.as_deref(), Some("left"));

        let missing = ScenarioConfig::from_file(path.with_file_name("no_such_scenario.yaml"));
        assert!(matches!(missing, Err(SpaceError::Io(_))));
    }
}
