//! The simulation container
//!
//! `Space` owns the ordered body sequence and the global parameters, and
//! advances everything with [`Space::step`]:
//!
//! 1. predict every live body (first Verlet half)
//! 2. build the quadtree, aggregate it, accumulate gravity into every body,
//!    then merge overlapping bodies if collisions are enabled
//! 3. correct every surviving body (second Verlet half)
//! 4. compact tombstones out of the sequence, keeping survivor order
//! 5. advance the clock
//! 6. notify body listeners of merges, then space listeners of `Step` and
//!    `ObjectChanged`, in that order
//!
//! Listeners only ever see a fully integrated and compacted state.

use std::collections::HashMap;

use log::{debug, trace, warn};

use crate::configuration::config::{Snapshot, SnapshotObject};
use crate::simulation::barnes_hut::QuadTree;
use crate::simulation::error::SpaceError;
use crate::simulation::events::{DispatchError, Event, EventEmitter, ListenerId};
use crate::simulation::integrator;
use crate::simulation::params::SpaceParams;
use crate::simulation::states::{Body, BodyEvent, BodyId, NVec2};
use crate::simulation::track::Track;
use crate::simulation::vector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceEventKind {
    Step,
    ObjectChanged,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpaceEvent {
    /// A step of `dt` seconds completed
    Step { dt: f64 },
    /// Something observable about the space changed
    ObjectChanged,
}

impl Event for SpaceEvent {
    type Kind = SpaceEventKind;

    fn kind(&self) -> SpaceEventKind {
        match self {
            SpaceEvent::Step { .. } => SpaceEventKind::Step,
            SpaceEvent::ObjectChanged => SpaceEventKind::ObjectChanged,
        }
    }
}

#[derive(Debug)]
pub struct Space {
    bodies: Vec<Body>,
    t: f64, // elapsed simulated seconds
    frame: u64, // completed steps, keys track samples
    params: SpaceParams,
    eps2: f64,
    theta2: f64,
    events: EventEmitter<SpaceEvent>,
}

impl Space {
    pub fn new() -> Self {
        Self::with_params(SpaceParams::default())
    }

    pub fn with_params(params: SpaceParams) -> Self {
        Self {
            bodies: Vec::new(),
            t: 0.0,
            frame: 0,
            eps2: params.eps * params.eps,
            theta2: params.theta * params.theta,
            params,
            events: EventEmitter::new(),
        }
    }

    /// Build a space from a snapshot, using default values for everything the
    /// snapshot does not carry
    pub fn from_state(state: &Snapshot) -> Result<Self, SpaceError> {
        let mut space = Self::new();
        space.set_state(state)?;
        Ok(space)
    }

    // bodies ==============================================================================

    /// Append `body` to the live sequence
    pub fn add_body(&mut self, body: Body) -> BodyId {
        let id = body.id();
        self.bodies.push(body);
        id
    }

    /// Remove a body right away, outside the tombstone path used by merges.
    /// Its `RemoveFromSpace` listeners run before it is handed back.
    pub fn remove_body(&mut self, id: BodyId) -> Result<Body, SpaceError> {
        let idx = self.index_of(id).ok_or(SpaceError::BodyNotFound(id))?;
        let body = self.bodies.remove(idx);
        if let Err(err) = body.emit(&BodyEvent::RemoveFromSpace) {
            warn!("body {id} removed: {err}");
        }
        Ok(body)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id() == id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.id() == id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    fn index_of(&self, id: BodyId) -> Option<usize> {
        self.bodies.iter().position(|b| b.id() == id)
    }

    /// First live body with this name
    pub fn find_by_name(&self, name: &str) -> Option<&Body> {
        self.bodies
            .iter()
            .find(|b| !b.is_destroyed() && b.name() == Some(name))
    }

    /// Call `visit(body, distance)` for every live body whose circle intersects
    /// the circle `(center, radius)`. Linear scan, meant for interactive use.
    pub fn find_in_circle<F>(&self, center: &NVec2, radius: f64, mut visit: F)
    where
        F: FnMut(&Body, f64),
    {
        for b in self.bodies.iter().filter(|b| !b.is_destroyed()) {
            let d = vector::distance(center, &b.x);
            if d <= radius + b.radius {
                visit(b, d);
            }
        }
    }

    // parameters ==========================================================================

    pub fn time(&self) -> f64 {
        self.t
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn params(&self) -> &SpaceParams {
        &self.params
    }

    pub fn epsilon(&self) -> f64 {
        self.params.eps
    }

    /// Non-finite values are ignored
    pub fn set_epsilon(&mut self, eps: f64) {
        if eps.is_finite() {
            self.params.eps = eps;
            self.eps2 = eps * eps;
        }
    }

    pub fn theta(&self) -> f64 {
        self.params.theta
    }

    /// Non-finite values are ignored
    pub fn set_theta(&mut self, theta: f64) {
        if theta.is_finite() {
            self.params.theta = theta;
            self.theta2 = theta * theta;
        }
    }

    pub fn gravitational_constant(&self) -> f64 {
        self.params.G
    }

    /// Non-finite values are ignored
    pub fn set_gravitational_constant(&mut self, g: f64) {
        if g.is_finite() {
            self.params.G = g;
        }
    }

    pub fn collision_enabled(&self) -> bool {
        self.params.collision_enabled
    }

    pub fn set_collision_enabled(&mut self, enabled: bool) {
        self.params.collision_enabled = enabled;
    }

    pub fn track_recording_enabled(&self) -> bool {
        self.params.track_recording_enabled
    }

    /// Turning recording off drops every recorded track
    pub fn set_track_recording_enabled(&mut self, enabled: bool) {
        self.params.track_recording_enabled = enabled;
        if !enabled {
            for b in &mut self.bodies {
                b.track = None;
            }
        }
    }

    // events ==============================================================================

    pub fn add_event_listener<F>(&mut self, kind: SpaceEventKind, listener: F) -> ListenerId
    where
        F: Fn(&SpaceEvent) -> anyhow::Result<()> + 'static,
    {
        self.events.add_listener(kind, listener)
    }

    pub fn remove_event_listener(&mut self, kind: SpaceEventKind, id: ListenerId) -> bool {
        self.events.remove_listener(kind, id)
    }

    /// Emit `ObjectChanged`; for edits made between steps
    pub fn notify_changed(&self) -> Result<(), DispatchError> {
        self.events.emit(&SpaceEvent::ObjectChanged)
    }

    // stepping ============================================================================

    /// Advance the simulation by `dt` seconds.
    ///
    /// The step is always applied in full. `Err` only reports listeners that
    /// failed during the notifications at the end; every listener still ran.
    pub fn step(&mut self, dt: f64) -> Result<(), DispatchError> {
        integrator::predict(&mut self.bodies, dt);

        let mut tree = QuadTree::build(&self.bodies);
        tree.update_center_of_mass(&self.bodies);
        self.accumulate_gravity(&tree);

        let merges = if self.params.collision_enabled {
            self.merge_collisions(&tree)
        } else {
            Vec::new()
        };

        integrator::correct(&mut self.bodies, dt);
        let removed = self.compact();

        self.t += dt;
        self.frame += 1;
        if self.params.track_recording_enabled {
            self.record_tracks();
        }

        trace!(
            "step dt={dt} t={} bodies={} tree_nodes={}",
            self.t,
            self.bodies.len(),
            tree.node_count()
        );

        let mut failures = Vec::new();
        notify_merged(&removed, &merges, &mut failures);
        DispatchError::collect(self.events.emit(&SpaceEvent::Step { dt }), &mut failures);
        DispatchError::collect(self.events.emit(&SpaceEvent::ObjectChanged), &mut failures);
        DispatchError::from_failures(failures)
    }

    /// Reset and fill acceleration and potential of every live body from the tree.
    /// `G` is applied once per body after the traversal.
    fn accumulate_gravity(&mut self, tree: &QuadTree) {
        let g = self.params.G;
        let eps = self.eps2.sqrt();

        for i in 0..self.bodies.len() {
            if self.bodies[i].is_destroyed() {
                continue;
            }
            let mut acc = NVec2::zeros();
            // finite self-potential baseline, cancelled by the body's own leaf
            let mut phi = if eps > 0.0 { self.bodies[i].m / eps } else { 0.0 };
            tree.accumulate_gravity(&self.bodies, i, self.eps2, self.theta2, &mut acc, &mut phi);

            let b = &mut self.bodies[i];
            vector::scale_into(&acc, g, &mut b.a);
            b.phi = g * phi;
        }
    }

    /// Merge every pair of live bodies whose circles touch.
    ///
    /// Each live body, in sequence order, queries the tree with a square of
    /// half-width (own radius + largest radius present) and absorbs every
    /// candidate that really overlaps it. Absorbed bodies are tombstoned and
    /// skipped for the rest of the pass.
    ///
    /// # Returns
    /// `(absorbed, survivor)` pairs in the order the merges happened.
    fn merge_collisions(&mut self, tree: &QuadTree) -> Vec<(BodyId, BodyId)> {
        let max_radius = self
            .bodies
            .iter()
            .filter(|b| !b.is_destroyed())
            .map(|b| b.radius)
            .fold(0.0, f64::max);

        let mut merges = Vec::new();
        let mut candidates = Vec::new();

        for i in 0..self.bodies.len() {
            if self.bodies[i].is_destroyed() {
                continue;
            }
            let center = self.bodies[i].x;
            let reach = self.bodies[i].radius + max_radius;

            candidates.clear();
            tree.find_bodies_in_square(&center, reach, &mut |j| candidates.push(j));

            for &j in &candidates {
                if j == i {
                    continue;
                }
                let (a, b) = pair_mut(&mut self.bodies, i, j);
                if b.is_destroyed() {
                    continue;
                }
                if vector::distance(&a.x, &b.x) <= a.radius + b.radius {
                    debug!("body {} absorbs {} (m = {} + {})", a.id(), b.id(), a.m, b.m);
                    a.absorb(b);
                    b.tombstone();
                    merges.push((b.id(), a.id()));
                }
            }
        }
        merges
    }

    /// Stable removal of tombstones; returns what was removed
    fn compact(&mut self) -> Vec<Body> {
        if self.bodies.iter().all(|b| !b.is_destroyed()) {
            return Vec::new();
        }
        let (live, removed): (Vec<Body>, Vec<Body>) =
            self.bodies.drain(..).partition(|b| !b.is_destroyed());
        self.bodies = live;
        debug!("compacted {} bodies, {} remain", removed.len(), self.bodies.len());
        removed
    }

    fn record_tracks(&mut self) {
        let frame = self.frame;
        let capacity = self.params.track_capacity;
        for b in &mut self.bodies {
            let x = b.x;
            b.track
                .get_or_insert_with(|| Track::new(capacity))
                .push(frame, x);
        }
    }

    // diagnostics =========================================================================

    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().filter(|b| !b.is_destroyed()).map(|b| b.m).sum()
    }

    pub fn momentum(&self) -> NVec2 {
        self.bodies
            .iter()
            .filter(|b| !b.is_destroyed())
            .fold(NVec2::zeros(), |p, b| p + b.momentum())
    }

    pub fn center_of_mass(&self) -> NVec2 {
        let total = self.total_mass();
        if total <= 0.0 {
            return NVec2::zeros();
        }
        let weighted = self
            .bodies
            .iter()
            .filter(|b| !b.is_destroyed())
            .fold(NVec2::zeros(), |c, b| c + b.x * b.m);
        weighted / total
    }

    // snapshot ============================================================================

    pub fn get_state(&self) -> Snapshot {
        Snapshot {
            time: self.t,
            objects: self
                .bodies
                .iter()
                .map(|b| SnapshotObject {
                    name: b.name.clone(),
                    mass: b.m,
                    radius: b.radius,
                    pos: [b.x.x, b.x.y],
                    vel: [b.v.x, b.v.y],
                })
                .collect(),
            eps: self.params.eps,
            theta: self.params.theta,
            collision_enabled: self.params.collision_enabled,
            track_recording_enabled: self.params.track_recording_enabled,
        }
    }

    /// Replace every body, the clock and the parameters carried by `state`.
    /// On error the space is left exactly as it was. The replaced bodies get
    /// `RemoveFromSpace` once the new state is in place.
    pub fn set_state(&mut self, state: &Snapshot) -> Result<(), SpaceError> {
        state.validate()?;

        let bodies: Vec<Body> = state
            .objects
            .iter()
            .map(|o| {
                let mut b = Body::new(
                    o.mass,
                    o.radius,
                    NVec2::new(o.pos[0], o.pos[1]),
                    NVec2::new(o.vel[0], o.vel[1]),
                );
                b.name = o.name.clone();
                b
            })
            .collect();

        let outgoing = std::mem::replace(&mut self.bodies, bodies);
        self.t = state.time;
        self.set_epsilon(state.eps);
        self.set_theta(state.theta);
        self.params.collision_enabled = state.collision_enabled;
        self.params.track_recording_enabled = state.track_recording_enabled;
        debug!("state loaded: {} bodies at t={}", self.bodies.len(), self.t);

        for body in &outgoing {
            if let Err(err) = body.emit(&BodyEvent::RemoveFromSpace) {
                warn!("body {} replaced by state load: {err}", body.id());
            }
        }
        Ok(())
    }
}

impl Default for Space {
    fn default() -> Self {
        Self::new()
    }
}

// helpers ===========================================================================

/// Two distinct mutable elements of one slice
fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    debug_assert_ne!(i, j);
    if i < j {
        let (lo, hi) = bodies.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = bodies.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}

/// `Merged` then `RemoveFromSpace` for every body absorbed this step. The merge
/// target is followed through later merges of the same step, so it always
/// names a body that is still in the space.
fn notify_merged(removed: &[Body], merges: &[(BodyId, BodyId)], failures: &mut Vec<anyhow::Error>) {
    if merges.is_empty() {
        return;
    }
    let survivor_of: HashMap<BodyId, BodyId> = merges.iter().copied().collect();

    for body in removed {
        let Some(&first) = survivor_of.get(&body.id()) else {
            // destroyed explicitly between steps, already notified
            continue;
        };
        let mut target = first;
        while let Some(&next) = survivor_of.get(&target) {
            target = next;
        }
        DispatchError::collect(body.emit(&BodyEvent::Merged { target }), failures);
        DispatchError::collect(body.emit(&BodyEvent::RemoveFromSpace), failures);
    }
}
