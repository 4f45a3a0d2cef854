pub mod vector;
pub mod events;
pub mod states;
pub mod track;
pub mod integrator;
pub mod barnes_hut;
pub mod forces;
pub mod params;
pub mod error;
pub mod space;
pub mod tracker;
pub mod scenario;
