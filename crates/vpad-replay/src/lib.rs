//! Replay recorded input traces through a `vpad_controls::Deck` without a
//! browser. The `vpad-replay` binary wraps this for the command line.

pub mod replay;
pub mod trace;

pub use replay::{Replayer, Timed};
pub use trace::{Action, ControlDecl, DeclKind, Step, Trace, parse_trace};
