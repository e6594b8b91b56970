use std::collections::HashSet;

use super::types::{
    InputEvent, Key, KeyState, MouseButton, MouseButtonState, PointerButtonEvent,
    PointerMoveEvent,
};

/// Current input state for the viewer window.
///
/// Holds "is down" information and the current pointer position. The runtime
/// needs the latter to stamp button events with coordinates.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: super::Modifiers,

    pub focused: bool,

    /// Pointer position in logical pixels.
    pub pointer_pos: Option<(f32, f32)>,

    pub keys_down: HashSet<Key>,

    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies an input event to the current state.
    pub fn apply_event(&mut self, ev: &InputEvent) {
        match ev {
            InputEvent::ModifiersChanged(m) => {
                self.modifiers = *m;
            }

            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Drop held keys/buttons on focus loss so nothing sticks.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
                self.pointer_pos = Some((*x, *y));
            }

            InputEvent::PointerLeft => {
                self.pointer_pos = None;
            }

            InputEvent::Key {
                key,
                state,
                modifiers,
                ..
            } => {
                self.modifiers = *modifiers;
                match state {
                    KeyState::Pressed => {
                        self.keys_down.insert(*key);
                    }
                    KeyState::Released => {
                        self.keys_down.remove(key);
                    }
                }
            }

            InputEvent::PointerButton(PointerButtonEvent {
                button,
                state,
                x,
                y,
                modifiers,
            }) => {
                self.pointer_pos = Some((*x, *y));
                self.modifiers = *modifiers;
                match state {
                    MouseButtonState::Pressed => {
                        self.buttons_down.insert(*button);
                    }
                    MouseButtonState::Released => {
                        self.buttons_down.remove(button);
                    }
                }
            }

            InputEvent::MouseWheel { modifiers, .. } => {
                self.modifiers = *modifiers;
            }

            InputEvent::FileDropped(_) => {}
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;

    fn button(button: MouseButton, state: MouseButtonState, x: f32, y: f32) -> InputEvent {
        InputEvent::PointerButton(PointerButtonEvent {
            button,
            state,
            x,
            y,
            modifiers: Modifiers::default(),
        })
    }

    #[test]
    fn pointer_position_tracks_moves_and_buttons() {
        let mut s = InputState::default();
        s.apply_event(&InputEvent::PointerMoved(PointerMoveEvent { x: 3.0, y: 4.0 }));
        assert_eq!(s.pointer_pos, Some((3.0, 4.0)));

        s.apply_event(&button(MouseButton::Left, MouseButtonState::Pressed, 7.0, 8.0));
        assert_eq!(s.pointer_pos, Some((7.0, 8.0)));
        assert!(s.button_down(MouseButton::Left));

        s.apply_event(&InputEvent::PointerLeft);
        assert_eq!(s.pointer_pos, None);
    }

    #[test]
    fn button_release_clears_down_state() {
        let mut s = InputState::default();
        s.apply_event(&button(MouseButton::Right, MouseButtonState::Pressed, 0.0, 0.0));
        s.apply_event(&button(MouseButton::Right, MouseButtonState::Released, 0.0, 0.0));
        assert!(!s.button_down(MouseButton::Right));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut s = InputState::default();
        s.apply_event(&InputEvent::Key {
            key: Key::W,
            state: KeyState::Pressed,
            modifiers: Modifiers::default(),
            repeat: false,
        });
        s.apply_event(&button(MouseButton::Left, MouseButtonState::Pressed, 0.0, 0.0));
        s.apply_event(&InputEvent::Focused(false));
        assert!(!s.key_down(Key::W));
        assert!(!s.button_down(MouseButton::Left));
    }
}
