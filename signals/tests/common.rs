use librebox_signals::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    // if LOG_LEVEL env var is set, use it
    let level = std::env::var("LOG_LEVEL").ok().and_then(|level| Level::from_str(&level).ok()).unwrap_or(Level::DEBUG);
    tracing_subscriber::fmt().with_max_level(level).with_test_writer().init();
}

#[allow(unused)]
pub struct Harness {
    pub host: Rc<NativeHost>,
    pub scheduler: Rc<FrameScheduler>,
    pub signal: Rc<Signal<NativeHost>>,
}

#[allow(unused)]
pub fn harness() -> Harness {
    let host = Rc::new(NativeHost::new());
    let scheduler = Rc::new(FrameScheduler::new(host.main_thread()));
    let signal = Rc::new(Signal::new(host.clone(), Some(scheduler.clone() as Rc<dyn Scheduler>)));
    Harness { host, scheduler, signal }
}

/// A listener function that records every call's arguments, and a check that drains them.
#[allow(unused)]
pub fn watcher() -> (ScriptValue, Box<dyn Fn() -> Vec<Vec<ScriptValue>>>) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let listener = {
        let calls = calls.clone();
        ScriptValue::function(move |args: &[ScriptValue]| calls.borrow_mut().push(args.to_vec()))
    };
    let check = Box::new(move || calls.borrow_mut().drain(..).collect());
    (listener, check)
}

/// A listener function that appends `tag` to a shared log on every call.
#[allow(unused)]
pub fn tagged(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> ScriptValue {
    let log = log.clone();
    ScriptValue::function(move |_: &[ScriptValue]| log.borrow_mut().push(tag))
}

#[allow(unused)]
pub fn num(n: f64) -> ScriptValue { ScriptValue::Number(n) }
