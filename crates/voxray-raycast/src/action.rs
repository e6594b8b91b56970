//! Input adaptation: engine input events become viewer actions.
//!
//! Nothing past this module sees keys or buttons, so the camera and shader
//! manager can be driven from tests without a window.

use std::path::PathBuf;

use voxray_engine::input::{
    InputEvent, Key, KeyState, MouseButton, MouseButtonState, PointerButtonEvent,
};

use crate::transfer::{Axis, Bound, Channel, Light, RedrawNeeded, TransferFunction};

/// Wheel pixels that count as one scroll line.
const PIXELS_PER_LINE: f32 = 40.0;

/// A tunable scalar of the viewer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Parameter {
    Threshold(Channel, Bound),
    Light(Axis),
}

impl Parameter {
    /// Number keys `1`..`9` in order.
    pub const ALL: [Parameter; 9] = [
        Parameter::Threshold(Channel::Red, Bound::Min),
        Parameter::Threshold(Channel::Red, Bound::Max),
        Parameter::Threshold(Channel::Green, Bound::Min),
        Parameter::Threshold(Channel::Green, Bound::Max),
        Parameter::Threshold(Channel::Blue, Bound::Min),
        Parameter::Threshold(Channel::Blue, Bound::Max),
        Parameter::Light(Axis::X),
        Parameter::Light(Axis::Y),
        Parameter::Light(Axis::Z),
    ];

    /// Slider ticks per unit: thresholds move in hundredths, light axes in fifths.
    pub fn ticks_per_unit(self) -> f32 {
        match self {
            Parameter::Threshold(..) => 100.0,
            Parameter::Light(_) => 5.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Parameter::Threshold(c, b) => TransferFunction::uniform_name(c, b),
            Parameter::Light(Axis::X) => "light x",
            Parameter::Light(Axis::Y) => "light y",
            Parameter::Light(Axis::Z) => "light z",
        }
    }

    pub fn get(self, transfer: &TransferFunction, light: &Light) -> f32 {
        match self {
            Parameter::Threshold(c, b) => transfer.threshold(c, b),
            Parameter::Light(axis) => light.axis(axis),
        }
    }

    pub fn set(self, transfer: &mut TransferFunction, light: &mut Light, value: f32) -> RedrawNeeded {
        match self {
            Parameter::Threshold(c, b) => transfer.set_threshold(c, b, value),
            Parameter::Light(axis) => light.set_axis(axis, value),
        }
    }

    /// Display string with the precision of the matching slider.
    pub fn format(self, value: f32) -> String {
        match self {
            Parameter::Threshold(..) => format!("{} {value:.2}", self.name()),
            Parameter::Light(_) => format!("{} {value:.1}", self.name()),
        }
    }
}

/// Pointer button roles.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DragButton {
    Rotate,
    Zoom,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    RotateLeft,
    RotateRight,
    ZoomIn,
    ZoomOut,
    ReloadShaders,
    SelectParameter(Parameter),
    /// Step the selected parameter one tick up.
    Increase,
    Decrease,
    /// An externally supplied value, already in engineering units.
    SetParameter(Parameter, f32),
    PointerPressed { button: DragButton, x: f32, y: f32 },
    PointerReleased { button: DragButton, x: f32, y: f32 },
    PointerMoved { x: f32, y: f32 },
    /// Scroll in lines; positive scrolls away from the user.
    Wheel(f32),
    LoadVolume(PathBuf),
    Quit,
}

/// Maps a key press to an action. Releases are ignored; auto-repeat only
/// drives the continuous actions.
pub fn key_action(key: Key, state: KeyState, repeat: bool) -> Option<InputAction> {
    if state != KeyState::Pressed {
        return None;
    }

    let continuous = match key {
        Key::ArrowUp | Key::W => Some(InputAction::ZoomIn),
        Key::ArrowDown | Key::S => Some(InputAction::ZoomOut),
        Key::ArrowLeft | Key::A => Some(InputAction::RotateLeft),
        Key::ArrowRight | Key::D => Some(InputAction::RotateRight),
        Key::PageUp => Some(InputAction::Increase),
        Key::PageDown => Some(InputAction::Decrease),
        _ => None,
    };
    if continuous.is_some() || repeat {
        return continuous;
    }

    let digit = match key {
        Key::Digit1 => Some(0),
        Key::Digit2 => Some(1),
        Key::Digit3 => Some(2),
        Key::Digit4 => Some(3),
        Key::Digit5 => Some(4),
        Key::Digit6 => Some(5),
        Key::Digit7 => Some(6),
        Key::Digit8 => Some(7),
        Key::Digit9 => Some(8),
        _ => None,
    };
    if let Some(i) = digit {
        return Some(InputAction::SelectParameter(Parameter::ALL[i]));
    }

    match key {
        Key::R => Some(InputAction::ReloadShaders),
        Key::Escape => Some(InputAction::Quit),
        _ => None,
    }
}

fn drag_button(button: MouseButton) -> Option<DragButton> {
    match button {
        MouseButton::Left => Some(DragButton::Rotate),
        MouseButton::Right => Some(DragButton::Zoom),
        _ => None,
    }
}

/// Translates one engine event.
pub fn translate(event: &InputEvent) -> Option<InputAction> {
    match event {
        InputEvent::Key {
            key, state, repeat, ..
        } => key_action(*key, *state, *repeat),

        InputEvent::PointerButton(PointerButtonEvent {
            button, state, x, y, ..
        }) => {
            let button = drag_button(*button)?;
            let (x, y) = (*x, *y);
            Some(match state {
                MouseButtonState::Pressed => InputAction::PointerPressed { button, x, y },
                MouseButtonState::Released => InputAction::PointerReleased { button, x, y },
            })
        }

        InputEvent::PointerMoved(m) => Some(InputAction::PointerMoved { x: m.x, y: m.y }),

        InputEvent::MouseWheel { delta, .. } => {
            let lines = delta.lines_y(PIXELS_PER_LINE);
            (lines != 0.0).then_some(InputAction::Wheel(lines))
        }

        InputEvent::FileDropped(path) => Some(InputAction::LoadVolume(path.clone())),

        InputEvent::ModifiersChanged(_) | InputEvent::PointerLeft | InputEvent::Focused(_) => None,
    }
}

/// Keyboard stand-in for a slider/dial panel over the nine parameters.
///
/// Values move on an integer tick grid so repeated steps land exactly on
/// `ticks / ticks_per_unit` instead of accumulating float error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ParameterSlider {
    selected: Parameter,
}

impl Default for ParameterSlider {
    fn default() -> Self {
        Self {
            selected: Parameter::ALL[0],
        }
    }
}

impl ParameterSlider {
    pub fn selected(&self) -> Parameter {
        self.selected
    }

    pub fn select(&mut self, parameter: Parameter) {
        self.selected = parameter;
    }

    /// Moves the selected parameter by `ticks` and returns its new value.
    ///
    /// The grid runs in `f64` so stored values far outside the slider range
    /// still step without overflowing.
    pub fn step(
        &self,
        ticks: i32,
        transfer: &mut TransferFunction,
        light: &mut Light,
    ) -> (f32, RedrawNeeded) {
        let p = self.selected;
        let per_unit = f64::from(p.ticks_per_unit());
        let current = (f64::from(p.get(transfer, light)) * per_unit).round();
        let value = ((current + f64::from(ticks)) / per_unit) as f32;
        (value, p.set(transfer, light, value))
    }
}

#[cfg(test)]
mod tests {
    use voxray_engine::input::{Modifiers, MouseWheelDelta, PointerMoveEvent};

    use super::*;

    fn press(key: Key) -> Option<InputAction> {
        key_action(key, KeyState::Pressed, false)
    }

    // ── keys ──

    #[test]
    fn arrows_and_wasd_drive_the_camera() {
        assert_eq!(press(Key::ArrowUp), Some(InputAction::ZoomIn));
        assert_eq!(press(Key::W), Some(InputAction::ZoomIn));
        assert_eq!(press(Key::ArrowDown), Some(InputAction::ZoomOut));
        assert_eq!(press(Key::S), Some(InputAction::ZoomOut));
        assert_eq!(press(Key::ArrowLeft), Some(InputAction::RotateLeft));
        assert_eq!(press(Key::A), Some(InputAction::RotateLeft));
        assert_eq!(press(Key::ArrowRight), Some(InputAction::RotateRight));
        assert_eq!(press(Key::D), Some(InputAction::RotateRight));
    }

    #[test]
    fn reload_ignores_release_and_repeat() {
        assert_eq!(press(Key::R), Some(InputAction::ReloadShaders));
        assert_eq!(key_action(Key::R, KeyState::Released, false), None);
        assert_eq!(key_action(Key::R, KeyState::Pressed, true), None);
        // Held arrows keep rotating.
        assert_eq!(
            key_action(Key::ArrowLeft, KeyState::Pressed, true),
            Some(InputAction::RotateLeft)
        );
    }

    #[test]
    fn digits_select_parameters() {
        assert_eq!(
            press(Key::Digit1),
            Some(InputAction::SelectParameter(Parameter::Threshold(Channel::Red, Bound::Min)))
        );
        assert_eq!(
            press(Key::Digit9),
            Some(InputAction::SelectParameter(Parameter::Light(Axis::Z)))
        );
        assert_eq!(press(Key::Digit0), None);
    }

    // ── pointer ──

    #[test]
    fn buttons_map_to_drag_roles() {
        let event = |button, state| {
            InputEvent::PointerButton(PointerButtonEvent {
                button,
                state,
                x: 3.0,
                y: 4.0,
                modifiers: Modifiers::default(),
            })
        };
        assert_eq!(
            translate(&event(MouseButton::Left, MouseButtonState::Pressed)),
            Some(InputAction::PointerPressed {
                button: DragButton::Rotate,
                x: 3.0,
                y: 4.0
            })
        );
        assert_eq!(
            translate(&event(MouseButton::Right, MouseButtonState::Released)),
            Some(InputAction::PointerReleased {
                button: DragButton::Zoom,
                x: 3.0,
                y: 4.0
            })
        );
        assert_eq!(translate(&event(MouseButton::Middle, MouseButtonState::Pressed)), None);
    }

    #[test]
    fn moves_wheel_and_drops_translate() {
        assert_eq!(
            translate(&InputEvent::PointerMoved(PointerMoveEvent { x: 1.0, y: 2.0 })),
            Some(InputAction::PointerMoved { x: 1.0, y: 2.0 })
        );
        assert_eq!(
            translate(&InputEvent::MouseWheel {
                delta: MouseWheelDelta::Pixel { x: 0.0, y: 80.0 },
                modifiers: Modifiers::default(),
            }),
            Some(InputAction::Wheel(2.0))
        );
        assert_eq!(
            translate(&InputEvent::FileDropped(PathBuf::from("ct"))),
            Some(InputAction::LoadVolume(PathBuf::from("ct")))
        );
        assert_eq!(translate(&InputEvent::Focused(true)), None);
    }

    // ── slider ──

    #[test]
    fn threshold_steps_are_hundredths() {
        let mut tf = TransferFunction::default();
        let mut light = Light::default();
        let slider = ParameterSlider::default();

        let (value, _) = slider.step(1, &mut tf, &mut light);
        assert_eq!(value, 0.01);
        let (value, _) = slider.step(19, &mut tf, &mut light);
        assert_eq!(value, 0.2);
        assert_eq!(tf.threshold(Channel::Red, Bound::Min), 0.2);
    }

    #[test]
    fn light_steps_are_fifths_and_unclamped() {
        let mut tf = TransferFunction::default();
        let mut light = Light::default();
        let mut slider = ParameterSlider::default();
        slider.select(Parameter::Light(Axis::X));

        let (value, _) = slider.step(-10, &mut tf, &mut light);
        assert_eq!(value, -1.0);
        assert_eq!(light.position.x, -1.0);
        assert_eq!(Parameter::Light(Axis::X).format(value), "light x -1.0");
    }

    #[test]
    fn stepping_huge_stored_values_does_not_overflow() {
        let mut tf = TransferFunction::default();
        let mut light = Light::default();
        let mut slider = ParameterSlider::default();

        Parameter::Light(Axis::X).set(&mut tf, &mut light, 1e10);
        slider.select(Parameter::Light(Axis::X));
        let (value, _) = slider.step(1, &mut tf, &mut light);
        assert_eq!(value, 1e10);
        assert_eq!(light.position.x, 1e10);

        let red_max = Parameter::Threshold(Channel::Red, Bound::Max);
        red_max.set(&mut tf, &mut light, 3e7);
        slider.select(red_max);
        let (value, _) = slider.step(-1, &mut tf, &mut light);
        assert!(value > 2.9e7, "{value}");
        assert_eq!(tf.threshold(Channel::Red, Bound::Max), value);
    }
}
