/*!
Engine services that publish frame and input events to scripts through [`librebox_signals`].

[`Services`] is built once per session from an explicit host, scheduler and [`EngineConfig`]
and handed to whatever needs it. There is no global game object to reach into.

```rust
use librebox_services::*;
use librebox_signals::*;
use std::rc::Rc;

let host = Rc::new(NativeHost::new());
let scheduler = Rc::new(FrameScheduler::new(host.main_thread()));
let services = Services::new(host, Some(scheduler.clone() as Rc<dyn Scheduler>), &EngineConfig::default()).unwrap();

services.run.heartbeat.on(&ScriptValue::function(|args: &[ScriptValue]| println!("heartbeat {:?}", args))).unwrap();
services.update(1.0 / 60.0, &InputFrame::new().at(10.0, 20.0).press(Key::W));
scheduler.step();
```
*/

mod config;
mod error;
mod input;
mod run_service;
mod user_input;

pub use config::*;
pub use error::*;
pub use input::*;
pub use run_service::*;
pub use user_input::*;

use std::rc::Rc;

use librebox_signals::{ScriptHost, Scheduler, Signal};
use tracing::info;

/// The services of one engine session, sharing a host and a scheduler.
pub struct Services<H: ScriptHost> {
    pub run: RunService<H>,
    pub input: UserInputService<H>,
}

impl<H: ScriptHost> Services<H>
where H::Value: From<f64> + From<bool> + From<InputObject>
{
    pub fn new(host: Rc<H>, scheduler: Option<Rc<dyn Scheduler>>, config: &EngineConfig) -> Result<Self, ConfigError> {
        let run = RunService::new(host.clone(), scheduler.clone(), config)?;
        let input = UserInputService::new(host, scheduler, config);
        info!(fixed_rate = config.run_service.fixed_rate, reserve = config.signals.reserve, "services started");
        Ok(Self { run, input })
    }

    /// Finds a signal as `Service.Signal`, e.g. `RunService.Heartbeat`.
    pub fn signal(&self, service: &str, name: &str) -> Option<&Rc<Signal<H>>> {
        match service {
            "RunService" => self.run.signal(name),
            "UserInputService" => self.input.signal(name),
            _ => None,
        }
    }

    /// One engine frame: input is published first, then the frame phases run.
    pub fn update(&self, dt: f64, input: &dyn InputSource) -> u32 {
        self.input.update(input);
        self.run.step(dt)
    }

    /// Ends the session: every signal is closed and gives its references back to the host.
    pub fn close(&self) {
        self.input.close();
        self.run.close();
    }
}
