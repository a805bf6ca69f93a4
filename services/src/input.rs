//! The engine's view of user input, independent of any windowing backend.
//!
//! A platform layer implements [`InputSource`] over whatever it polls; [`InputFrame`] is a
//! recorded snapshot that embedders can fill from window events, and that tests use directly.

use std::collections::HashSet;

use librebox_signals::ScriptValue;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }
}

impl From<Vec2> for ScriptValue {
    fn from(v: Vec2) -> Self { ScriptValue::table([("X", ScriptValue::Number(v.x)), ("Y", ScriptValue::Number(v.y))]) }
}

macro_rules! keys {
    ($($key:ident => $name:literal,)*) => {
        /// Keyboard keys reported to scripts, named after their `Enum.KeyCode` items.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Key {
            $($key,)*
        }

        impl Key {
            /// Every key, in the order `update` reports transitions.
            pub const ALL: &'static [Key] = &[$(Key::$key,)*];

            pub fn name(&self) -> &'static str {
                match self {
                    $(Key::$key => $name,)*
                }
            }
        }
    };
}

keys! {
    A => "A", B => "B", C => "C", D => "D", E => "E", F => "F", G => "G", H => "H", I => "I",
    J => "J", K => "K", L => "L", M => "M", N => "N", O => "O", P => "P", Q => "Q", R => "R",
    S => "S", T => "T", U => "U", V => "V", W => "W", X => "X", Y => "Y", Z => "Z",
    Zero => "Zero", One => "One", Two => "Two", Three => "Three", Four => "Four",
    Five => "Five", Six => "Six", Seven => "Seven", Eight => "Eight", Nine => "Nine",
    Space => "Space",
    Return => "Return",
    Escape => "Escape",
    Backspace => "Backspace",
    Right => "Right",
    Left => "Left",
    Down => "Down",
    Up => "Up",
    LeftShift => "LeftShift",
    RightShift => "RightShift",
    LeftControl => "LeftControl",
    RightControl => "RightControl",
    LeftAlt => "LeftAlt",
    RightAlt => "RightAlt",
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Usually the left button.
    Button1,
    /// Usually the right button.
    Button2,
    /// Usually the middle button.
    Button3,
}

impl MouseButton {
    pub const ALL: &'static [MouseButton] = &[MouseButton::Button1, MouseButton::Button2, MouseButton::Button3];

    pub fn name(&self) -> &'static str {
        match self {
            MouseButton::Button1 => "MouseButton1",
            MouseButton::Button2 => "MouseButton2",
            MouseButton::Button3 => "MouseButton3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    Keyboard,
    MouseButton,
    MouseMovement,
}

impl InputType {
    pub fn name(&self) -> &'static str {
        match self {
            InputType::Keyboard => "Keyboard",
            InputType::MouseButton => "MouseButton",
            InputType::MouseMovement => "MouseMovement",
        }
    }
}

/// The payload describing one input event.
///
/// Scripts see it as a table with `UserInputType`, `KeyCode` and `Position` fields; the first
/// two are `{ Name = ... }` items, `Position` is `{ X = ..., Y = ... }`. Mouse movement carries
/// an empty key code name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputObject {
    pub input_type: InputType,
    pub key_code: &'static str,
    pub position: Vec2,
}

impl InputObject {
    pub fn key(key: Key, position: Vec2) -> Self { Self { input_type: InputType::Keyboard, key_code: key.name(), position } }

    pub fn button(button: MouseButton, position: Vec2) -> Self { Self { input_type: InputType::MouseButton, key_code: button.name(), position } }

    pub fn movement(position: Vec2) -> Self { Self { input_type: InputType::MouseMovement, key_code: "", position } }
}

fn enum_item(name: &str) -> ScriptValue { ScriptValue::table([("Name", ScriptValue::from(name))]) }

impl From<InputObject> for ScriptValue {
    fn from(input: InputObject) -> Self {
        ScriptValue::table([
            ("UserInputType", enum_item(input.input_type.name())),
            ("KeyCode", enum_item(input.key_code)),
            ("Position", input.position.into()),
        ])
    }
}

/// Per-frame input state as polled from the platform.
///
/// "Pressed" and "released" are edges: true only on the frame the transition happened.
pub trait InputSource {
    fn mouse_position(&self) -> Vec2;
    fn key_pressed(&self, key: Key) -> bool;
    fn key_released(&self, key: Key) -> bool;
    fn button_pressed(&self, button: MouseButton) -> bool;
    fn button_released(&self, button: MouseButton) -> bool;
}

/// One frame's worth of recorded input.
#[derive(Debug, Clone, Default)]
pub struct InputFrame {
    pub mouse: Vec2,
    pressed_keys: HashSet<Key>,
    released_keys: HashSet<Key>,
    pressed_buttons: HashSet<MouseButton>,
    released_buttons: HashSet<MouseButton>,
}

impl InputFrame {
    pub fn new() -> Self { Self::default() }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.mouse = Vec2::new(x, y);
        self
    }

    pub fn press(mut self, key: Key) -> Self {
        self.pressed_keys.insert(key);
        self
    }

    pub fn release(mut self, key: Key) -> Self {
        self.released_keys.insert(key);
        self
    }

    pub fn press_button(mut self, button: MouseButton) -> Self {
        self.pressed_buttons.insert(button);
        self
    }

    pub fn release_button(mut self, button: MouseButton) -> Self {
        self.released_buttons.insert(button);
        self
    }

    /// Forgets the transitions but keeps the mouse where it is, ready for the next frame.
    pub fn clear_edges(&mut self) {
        self.pressed_keys.clear();
        self.released_keys.clear();
        self.pressed_buttons.clear();
        self.released_buttons.clear();
    }
}

impl InputSource for InputFrame {
    fn mouse_position(&self) -> Vec2 { self.mouse }
    fn key_pressed(&self, key: Key) -> bool { self.pressed_keys.contains(&key) }
    fn key_released(&self, key: Key) -> bool { self.released_keys.contains(&key) }
    fn button_pressed(&self, button: MouseButton) -> bool { self.pressed_buttons.contains(&button) }
    fn button_released(&self, button: MouseButton) -> bool { self.released_buttons.contains(&button) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(Key::A.name(), "A");
        assert_eq!(Key::Return.name(), "Return");
        assert_eq!(Key::RightAlt.name(), "RightAlt");
        assert_eq!(Key::ALL.len(), 50);
        assert_eq!(MouseButton::Button2.name(), "MouseButton2");
    }

    #[test]
    fn test_input_object_table() {
        let value = ScriptValue::from(InputObject::key(Key::Space, Vec2::new(3.0, 4.0)));
        let name = |field: &str| value.field(field).and_then(|item| item.field("Name")).and_then(|n| n.as_str().map(str::to_owned));
        assert_eq!(name("UserInputType").as_deref(), Some("Keyboard"));
        assert_eq!(name("KeyCode").as_deref(), Some("Space"));

        let position = value.field("Position").unwrap();
        assert_eq!(position.field("X").and_then(ScriptValue::as_number), Some(3.0));
        assert_eq!(position.field("Y").and_then(ScriptValue::as_number), Some(4.0));

        let moved = ScriptValue::from(InputObject::movement(Vec2::default()));
        assert_eq!(moved.field("KeyCode").and_then(|k| k.field("Name")), Some(&ScriptValue::from("")));
    }

    #[test]
    fn test_frame_edges() {
        let mut frame = InputFrame::new().at(1.0, 2.0).press(Key::W).release_button(MouseButton::Button1);
        assert!(frame.key_pressed(Key::W));
        assert!(!frame.key_released(Key::W));
        assert!(frame.button_released(MouseButton::Button1));

        frame.clear_edges();
        assert!(!frame.key_pressed(Key::W));
        assert_eq!(frame.mouse_position(), Vec2::new(1.0, 2.0));
    }
}
