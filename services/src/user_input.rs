use std::cell::Cell;
use std::rc::Rc;

use librebox_signals::{ScriptHost, Scheduler, Signal};
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::input::{InputObject, InputSource, Key, MouseButton, Vec2};

/// Publishes polled input to scripts.
///
/// `InputBegan` and `InputEnded` receive `(inputObject, gameProcessed)`; `gameProcessed` is
/// always false since no engine UI sinks input yet. `MouseMoved` receives the input object
/// alone, and `InputChanged` receives the same movement as `(inputObject, false)`.
pub struct UserInputService<H: ScriptHost> {
    pub input_began: Rc<Signal<H>>,
    pub input_ended: Rc<Signal<H>>,
    pub input_changed: Rc<Signal<H>>,
    pub mouse_moved: Rc<Signal<H>>,
    last_mouse: Cell<Vec2>,
    mouse_icon_enabled: Cell<bool>,
}

impl<H: ScriptHost> UserInputService<H>
where H::Value: From<InputObject> + From<bool>
{
    pub fn new(host: Rc<H>, scheduler: Option<Rc<dyn Scheduler>>, config: &EngineConfig) -> Self {
        let signal = || Rc::new(Signal::with_config(host.clone(), scheduler.clone(), &config.signals));
        Self {
            input_began: signal(),
            input_ended: signal(),
            input_changed: signal(),
            mouse_moved: signal(),
            last_mouse: Cell::new(Vec2::default()),
            mouse_icon_enabled: Cell::new(true),
        }
    }

    pub fn signal(&self, name: &str) -> Option<&Rc<Signal<H>>> {
        Some(match name {
            "InputBegan" => &self.input_began,
            "InputEnded" => &self.input_ended,
            "InputChanged" => &self.input_changed,
            "MouseMoved" => &self.mouse_moved,
            _ => return None,
        })
    }

    /// Mouse position as of the last `update`.
    pub fn mouse_position(&self) -> Vec2 { self.last_mouse.get() }

    pub fn mouse_enabled(&self) -> bool { true }
    pub fn keyboard_enabled(&self) -> bool { true }

    pub fn mouse_icon_enabled(&self) -> bool { self.mouse_icon_enabled.get() }

    /// Shows or hides the cursor. The platform layer reads this back when it presents the frame.
    pub fn set_mouse_icon_enabled(&self, enabled: bool) {
        if self.mouse_icon_enabled.replace(enabled) != enabled {
            debug!(enabled, "mouse icon toggled");
        }
    }

    /// Polls `input` once and fires a signal for every change since the previous poll:
    /// mouse movement first, then key transitions, then mouse button transitions.
    pub fn update(&self, input: &dyn InputSource) {
        let mouse = input.mouse_position();
        if mouse != self.last_mouse.get() {
            self.last_mouse.set(mouse);
            let moved = InputObject::movement(mouse);
            trace!(x = mouse.x, y = mouse.y, "mouse moved");
            self.mouse_moved.fire(&[H::Value::from(moved)]);
            self.input_changed.fire(&[H::Value::from(moved), H::Value::from(false)]);
        }

        for &key in Key::ALL {
            if input.key_pressed(key) {
                self.began(InputObject::key(key, mouse));
            }
            if input.key_released(key) {
                self.ended(InputObject::key(key, mouse));
            }
        }

        for &button in MouseButton::ALL {
            if input.button_pressed(button) {
                self.began(InputObject::button(button, mouse));
            }
            if input.button_released(button) {
                self.ended(InputObject::button(button, mouse));
            }
        }
    }

    fn began(&self, input: InputObject) {
        trace!(key = input.key_code, "input began");
        self.input_began.fire(&[H::Value::from(input), H::Value::from(false)]);
    }

    fn ended(&self, input: InputObject) {
        trace!(key = input.key_code, "input ended");
        self.input_ended.fire(&[H::Value::from(input), H::Value::from(false)]);
    }

    pub fn close(&self) {
        for signal in [&self.input_began, &self.input_ended, &self.input_changed, &self.mouse_moved] {
            signal.close();
        }
    }
}
