//! Keyboard and mouse input.
//!
//! The runtime translates winit events into [`InputEvent`]s and folds them
//! into one [`InputState`] per window.

mod state;
mod types;
mod platform;

pub use platform::translate_window_event;
pub use state::InputState;
pub use types::{ButtonState, InputEvent, Key, Modifiers, MouseButton};
