pub mod camera;
pub mod event;
pub mod executor;
pub mod map;
pub mod press;
pub mod prompt;
pub mod scene;

/// Simulation time, in milliseconds since the scene started.
pub type Millis = u64;
