pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use simulation::states::{Body, BodyEvent, BodyEventKind, BodyId, NVec2};
pub use simulation::space::{Space, SpaceEvent, SpaceEventKind};
pub use simulation::barnes_hut::QuadTree;
pub use simulation::forces::NewtonianGravity;
pub use simulation::events::{DispatchError, ListenerId};
pub use simulation::error::SpaceError;
pub use simulation::params::{SpaceParams, G_SI};
pub use simulation::track::Track;
pub use simulation::tracker::Tracker;
pub use simulation::scenario::{Scenario, RunParameters};

pub use configuration::config::{Snapshot, SnapshotObject, ScenarioConfig, EngineConfig, ParametersConfig, BodyConfig};

pub use benchmark::benchmark::{bench_gravity, bench_step};
