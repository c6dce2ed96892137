use std::collections::HashSet;

use glam::Vec2;

use super::types::{ButtonState, InputEvent, Key, Modifiers, MouseButton};

/// Held keys and buttons plus this frame's transitions.
///
/// The runtime feeds events through [`apply`](Self::apply) and calls
/// [`end_frame`](Self::end_frame) after the app's frame callback.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,
    /// Physical pixels, top-left origin; `None` outside the window.
    pub pointer: Option<Vec2>,

    keys_down: HashSet<Key>,
    buttons_down: HashSet<MouseButton>,

    keys_pressed: HashSet<Key>,
    keys_released: HashSet<Key>,
    buttons_pressed: HashSet<MouseButton>,
    scroll: Vec2,
}

impl InputState {
    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key { key, state, .. } => match state {
                ButtonState::Pressed => {
                    if self.keys_down.insert(key) {
                        self.keys_pressed.insert(key);
                    }
                }
                ButtonState::Released => {
                    if self.keys_down.remove(&key) {
                        self.keys_released.insert(key);
                    }
                }
            },
            InputEvent::ModifiersChanged(m) => self.modifiers = m,
            InputEvent::PointerMoved { x, y } => self.pointer = Some(Vec2::new(x, y)),
            InputEvent::PointerButton { button, state } => match state {
                ButtonState::Pressed => {
                    if self.buttons_down.insert(button) {
                        self.buttons_pressed.insert(button);
                    }
                }
                ButtonState::Released => {
                    self.buttons_down.remove(&button);
                }
            },
            InputEvent::Scroll { x, y } => self.scroll += Vec2::new(x, y),
            InputEvent::PointerLeft => self.pointer = None,
            InputEvent::Focused(focused) => {
                self.focused = focused;
                // Releases are not delivered while unfocused.
                if !focused {
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }
        }
    }

    /// Clears per-frame transitions.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.scroll = Vec2::ZERO;
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    /// Went down this frame (key repeat excluded).
    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn key_released(&self, key: Key) -> bool {
        self.keys_released.contains(&key)
    }

    pub fn button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    pub fn button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    /// Scroll accumulated this frame, in lines.
    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    /// -1, 0 or 1 per axis from the arrow keys and WASD.
    pub fn direction(&self) -> Vec2 {
        let axis = |neg: [Key; 2], pos: [Key; 2]| {
            let n = neg.iter().any(|k| self.key_down(*k)) as i32;
            let p = pos.iter().any(|k| self.key_down(*k)) as i32;
            (p - n) as f32
        };
        Vec2::new(
            axis([Key::ArrowLeft, Key::A], [Key::ArrowRight, Key::D]),
            axis([Key::ArrowDown, Key::S], [Key::ArrowUp, Key::W]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: ButtonState) -> InputEvent {
        InputEvent::Key { key, state, repeat: false }
    }

    #[test]
    fn press_is_reported_once_until_released() {
        let mut input = InputState::default();
        input.apply(key(Key::Space, ButtonState::Pressed));
        assert!(input.key_pressed(Key::Space));
        input.end_frame();

        input.apply(key(Key::Space, ButtonState::Pressed));
        assert!(input.key_down(Key::Space));
        assert!(!input.key_pressed(Key::Space));

        input.apply(key(Key::Space, ButtonState::Released));
        assert!(input.key_released(Key::Space));
        assert!(!input.key_down(Key::Space));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut input = InputState::default();
        input.apply(key(Key::W, ButtonState::Pressed));
        input.apply(InputEvent::PointerButton { button: MouseButton::Left, state: ButtonState::Pressed });
        input.apply(InputEvent::Focused(false));
        assert!(!input.key_down(Key::W));
        assert!(!input.button_down(MouseButton::Left));
    }

    #[test]
    fn direction_combines_arrows_and_wasd() {
        let mut input = InputState::default();
        input.apply(key(Key::ArrowRight, ButtonState::Pressed));
        input.apply(key(Key::S, ButtonState::Pressed));
        assert_eq!(input.direction(), Vec2::new(1.0, -1.0));
        input.apply(key(Key::A, ButtonState::Pressed));
        assert_eq!(input.direction().x, 0.0);
    }

    #[test]
    fn scroll_accumulates_per_frame() {
        let mut input = InputState::default();
        input.apply(InputEvent::Scroll { x: 0.0, y: 1.0 });
        input.apply(InputEvent::Scroll { x: 0.0, y: 2.0 });
        assert_eq!(input.scroll(), Vec2::new(0.0, 3.0));
        input.end_frame();
        assert_eq!(input.scroll(), Vec2::ZERO);
    }

    #[test]
    fn pointer_tracks_and_leaves() {
        let mut input = InputState::default();
        input.apply(InputEvent::PointerMoved { x: 3.0, y: 4.0 });
        assert_eq!(input.pointer, Some(Vec2::new(3.0, 4.0)));
        input.apply(InputEvent::PointerLeft);
        assert_eq!(input.pointer, None);
    }
}
