use std::cell::Cell;
use std::rc::Rc;

use librebox_signals::{ScriptHost, Scheduler, Signal};
use tracing::{debug, trace};

use crate::config::{EngineConfig, RunServiceConfig};
use crate::error::ConfigError;

/// Frame-phase signals, fired once per engine frame by [`RunService::step`].
///
/// Within a frame the phases fire in this order:
/// `PreRender`, `PreAnimation`, `PreSimulation`, `FixedStep` (zero or more times), `PostStep`,
/// `PostSimulation`, `Heartbeat`. Every phase receives the frame's delta time in seconds except
/// `FixedStep`, which receives the fixed step length.
pub struct RunService<H: ScriptHost> {
    pub pre_render: Rc<Signal<H>>,
    pub pre_animation: Rc<Signal<H>>,
    pub pre_simulation: Rc<Signal<H>>,
    pub post_simulation: Rc<Signal<H>>,
    pub heartbeat: Rc<Signal<H>>,
    pub fixed_step: Rc<Signal<H>>,
    pub post_step: Rc<Signal<H>>,
    config: RunServiceConfig,
    accumulator: Cell<f64>,
}

impl<H: ScriptHost> RunService<H>
where H::Value: From<f64>
{
    pub fn new(host: Rc<H>, scheduler: Option<Rc<dyn Scheduler>>, config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let signal = || Rc::new(Signal::with_config(host.clone(), scheduler.clone(), &config.signals));
        Ok(Self {
            pre_render: signal(),
            pre_animation: signal(),
            pre_simulation: signal(),
            post_simulation: signal(),
            heartbeat: signal(),
            fixed_step: signal(),
            post_step: signal(),
            config: config.run_service.clone(),
            accumulator: Cell::new(0.0),
        })
    }

    /// Looks a signal up by its script-visible name, including the legacy aliases
    /// `RenderStepped` and `Stepped`.
    pub fn signal(&self, name: &str) -> Option<&Rc<Signal<H>>> {
        Some(match name {
            "PreRender" | "RenderStepped" => &self.pre_render,
            "PreAnimation" => &self.pre_animation,
            "PreSimulation" | "Stepped" => &self.pre_simulation,
            "PostSimulation" => &self.post_simulation,
            "Heartbeat" => &self.heartbeat,
            "FixedStep" => &self.fixed_step,
            "PostStep" => &self.post_step,
            _ => return None,
        })
    }

    pub fn fixed_rate(&self) -> f64 { self.config.fixed_rate }

    /// Length of one fixed step, in seconds.
    pub fn fixed_dt(&self) -> f64 { 1.0 / self.config.fixed_rate }

    /// Simulation time not yet consumed by a fixed step.
    pub fn accumulated(&self) -> f64 { self.accumulator.get() }

    /// Runs one frame of `dt` seconds through every phase. Returns how many fixed steps ran.
    pub fn step(&self, dt: f64) -> u32 {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        trace!(dt, "frame");
        let payload = [H::Value::from(dt)];

        self.pre_render.fire(&payload);
        self.pre_animation.fire(&payload);
        self.pre_simulation.fire(&payload);

        let steps = self.take_fixed_steps(dt);
        let fixed = [H::Value::from(self.fixed_dt())];
        for _ in 0..steps {
            self.fixed_step.fire(&fixed);
        }

        self.post_step.fire(&payload);
        self.post_simulation.fire(&payload);
        self.heartbeat.fire(&payload);
        steps
    }

    fn take_fixed_steps(&self, dt: f64) -> u32 {
        let fixed_dt = self.fixed_dt();
        let mut acc = self.accumulator.get() + dt;
        let due = (acc / fixed_dt).floor();
        let max = self.config.max_fixed_steps;
        let steps = if due > max as f64 {
            debug!(due, max, "fixed step backlog dropped");
            // keep only the fractional part so a long hitch does not snowball
            acc %= fixed_dt;
            max
        } else {
            acc -= due * fixed_dt;
            due as u32
        };
        self.accumulator.set(acc.max(0.0));
        steps
    }

    /// Closes every signal. Outstanding waits on them are abandoned.
    pub fn close(&self) {
        for signal in self.signals() {
            signal.close();
        }
    }

    fn signals(&self) -> [&Rc<Signal<H>>; 7] {
        [&self.pre_render, &self.pre_animation, &self.pre_simulation, &self.post_simulation, &self.heartbeat, &self.fixed_step, &self.post_step]
    }
}
