//! Core state types for the 2D N-body simulation
//!
//! `Body` is a point mass with a radius used for collisions. A body is never
//! removed mid-step: destroying it zeroes mass and radius (a tombstone) and the
//! owning `Space` compacts tombstones away at the end of the step.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::Vector2;

use crate::simulation::events::{DispatchError, Event, EventEmitter, ListenerId};
use crate::simulation::track::Track;

pub type NVec2 = Vector2<f64>;

static NEXT_BODY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(u64);

impl BodyId {
    fn next() -> Self {
        BodyId(NEXT_BODY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEventKind {
    Merged,
    RemoveFromSpace,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyEvent {
    /// This body was absorbed by `target`; observers should retarget to it
    Merged { target: BodyId },
    /// This body left its space; observers should detach
    RemoveFromSpace,
}

impl Event for BodyEvent {
    type Kind = BodyEventKind;

    fn kind(&self) -> BodyEventKind {
        match self {
            BodyEvent::Merged { .. } => BodyEventKind::Merged,
            BodyEvent::RemoveFromSpace => BodyEventKind::RemoveFromSpace,
        }
    }
}

#[derive(Debug)]
pub struct Body {
    id: BodyId,
    pub name: Option<String>, // display name
    pub x: NVec2, // position
    pub v: NVec2, // velocity
    pub a: NVec2, // acceleration, recomputed every step
    pub m: f64, // mass
    pub radius: f64, // collision radius
    pub phi: f64, // potential, recomputed every step (diagnostic)
    pub(crate) track: Option<Track>,
    events: EventEmitter<BodyEvent>,
}

impl Body {
    pub fn new(m: f64, radius: f64, x: NVec2, v: NVec2) -> Self {
        Self {
            id: BodyId::next(),
            name: None,
            x,
            v,
            a: NVec2::zeros(),
            m,
            radius,
            phi: 0.0,
            track: None,
            events: EventEmitter::new(),
        }
    }

    /// A body with zero initial velocity
    pub fn at_rest(m: f64, radius: f64, x: NVec2) -> Self {
        Self::new(m, radius, x, NVec2::zeros())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_destroyed(&self) -> bool {
        self.m <= 0.0
    }

    /// Recorded trajectory, if track recording has been active for this body
    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn momentum(&self) -> NVec2 {
        self.v * self.m
    }

    /// Tombstone the body and notify `RemoveFromSpace` listeners
    pub fn destroy(&mut self) -> Result<(), DispatchError> {
        self.tombstone();
        self.emit(&BodyEvent::RemoveFromSpace)
    }

    /// Absorb `other` into `self` and notify `other`'s `Merged` listeners.
    /// `other` is left intact; the caller decides when to destroy it.
    pub fn merge(&mut self, other: &Body) -> Result<(), DispatchError> {
        self.absorb(other);
        other.emit(&BodyEvent::Merged { target: self.id })
    }

    pub fn add_event_listener<F>(&mut self, kind: BodyEventKind, listener: F) -> ListenerId
    where
        F: Fn(&BodyEvent) -> anyhow::Result<()> + 'static,
    {
        self.events.add_listener(kind, listener)
    }

    pub fn remove_event_listener(&mut self, kind: BodyEventKind, id: ListenerId) -> bool {
        self.events.remove_listener(kind, id)
    }

    pub(crate) fn emit(&self, event: &BodyEvent) -> Result<(), DispatchError> {
        self.events.emit(event)
    }

    /// Inelastic combination conserving mass, momentum, center of mass and volume
    pub(crate) fn absorb(&mut self, other: &Body) {
        let m1 = self.m;
        let m2 = other.m;
        let m = m1 + m2;

        if m > 0.0 {
            self.v = (self.v * m1 + other.v * m2) / m;
            self.x = (self.x * m1 + other.x * m2) / m;
        }
        self.m = m;
        self.radius = (self.radius.powi(3) + other.radius.powi(3)).cbrt();
    }

    pub(crate) fn tombstone(&mut self) {
        self.m = 0.0;
        self.radius = 0.0;
    }
}
