//! Build a runnable scenario from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a `Scenario` bundle
//! containing:
//! - the run parameters (`t_end`, step size `h0`)
//! - a fully populated `Space` at t = 0
//!
//! `Scenario::run` is the fixed-step driver used by the command line binary.

use log::info;

use crate::configuration::config::{ScenarioConfig, Snapshot, SnapshotObject};
use crate::simulation::error::SpaceError;
use crate::simulation::events::DispatchError;
use crate::simulation::params::SpaceParams;
use crate::simulation::space::Space;

/// How long and with which step a scenario runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunParameters {
    pub t_end: f64, // time end
    pub h0: f64, // step size
}

pub struct Scenario {
    pub parameters: RunParameters,
    pub space: Space,
}

impl Scenario {
    pub fn build_scenario(cfg: &ScenarioConfig) -> Result<Self, SpaceError> {
        let p_cfg = &cfg.parameters;
        if !(p_cfg.h0.is_finite() && p_cfg.h0 > 0.0) {
            return Err(SpaceError::InvalidScenario(format!("h0 must be finite and > 0: {}", p_cfg.h0)));
        }
        if !p_cfg.t_end.is_finite() {
            return Err(SpaceError::InvalidScenario(format!("t_end is not finite: {}", p_cfg.t_end)));
        }

        let defaults = SpaceParams::default();
        let mut space = Space::with_params(SpaceParams {
            G: p_cfg.G.unwrap_or(defaults.G),
            ..defaults.clone()
        });

        // Bodies and parameters go through the snapshot path so they get
        // the same validation as any loaded state
        let initial = Snapshot {
            time: 0.0,
            objects: cfg
                .bodies
                .iter()
                .map(|bc| SnapshotObject {
                    name: bc.name.clone(),
                    mass: bc.m,
                    radius: bc.radius,
                    pos: bc.x,
                    vel: bc.v,
                })
                .collect(),
            eps: p_cfg.eps.unwrap_or(defaults.eps),
            theta: cfg.engine.theta.unwrap_or(defaults.theta),
            collision_enabled: cfg.engine.collision,
            track_recording_enabled: cfg.engine.track_recording,
        };
        space.set_state(&initial)?;

        info!(
            "scenario: {} bodies, t_end = {}, h0 = {}, theta = {}, eps = {}",
            space.len(),
            p_cfg.t_end,
            p_cfg.h0,
            space.theta(),
            space.epsilon()
        );

        Ok(Self {
            parameters: RunParameters {
                t_end: p_cfg.t_end,
                h0: p_cfg.h0,
            },
            space,
        })
    }

    /// Step with `h0` until `t_end` is reached; the last step is shortened to
    /// land on `t_end` exactly. Returns the number of steps taken.
    pub fn run(&mut self) -> Result<u64, DispatchError> {
        let RunParameters { t_end, h0 } = self.parameters;
        let report_every = ((t_end / h0) as u64 / 10).max(1);
        let mut steps = 0;

        while self.space.time() < t_end {
            let dt = h0.min(t_end - self.space.time());
            self.space.step(dt)?;
            steps += 1;

            if steps % report_every == 0 {
                info!(
                    "t = {:.6e}, bodies = {}, total mass = {:.6e}",
                    self.space.time(),
                    self.space.len(),
                    self.space.total_mass()
                );
            }
        }
        Ok(steps)
    }
}
