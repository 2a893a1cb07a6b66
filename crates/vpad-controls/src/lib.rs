pub mod button;
pub mod charge;
pub mod control;
pub mod dataset;
pub mod deck;
pub mod events;
pub mod joystick;
pub mod options;

pub use button::ActionButton;
pub use charge::{ChargeButton, charge_color, charge_hue};
pub use control::{Control, ControlKind};
pub use dataset::Dataset;
pub use deck::{ControlId, Deck, Emitted, VisibilityRegistry};
pub use events::*;
pub use joystick::Joystick;
pub use options::{ButtonOptions, ChargeOptions, JoystickMode, JoystickOptions, JoystickShape};
