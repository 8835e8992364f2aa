pub mod binder;
pub mod listener;
pub mod observable;
pub mod tracker;

pub use binder::{MovementBinder, TargetBinder};
pub use listener::{ChunkSystemEvent, ChunkSystemListener, TargetId};
pub use observable::Observable;
pub use tracker::{BoundaryTracker, Crossing};
