pub mod config;
pub mod frame;
pub mod geometry;
pub mod input;
pub mod listeners;
pub mod tracker;
pub mod transform;

pub use frame::{FrameHandle, FrameQueue, FrameScheduler, FrameTask};
pub use geometry::{Angle, Cardinals, CompassDirection};
pub use input::{Contact, InputId, InputKind, InputPoint, Phase, RawInputEvent};
pub use listeners::{ListenerChange, ListenerFamily, ListenerRegistry, SharedListeners};
pub use tracker::{InputTracker, InputTransition, ZOMBIE_TIMEOUT_MS};
pub use transform::{LocalFrame, parse_css_transform};

// Re-export kurbo types so downstream crates share one geometry vocabulary
pub use kurbo::{Affine, Point, Rect, Vec2};
