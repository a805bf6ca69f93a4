/*!
Script signals for the Librebox engine.

A [`Signal`] is how native engine events reach scripts. It carries two kinds of consumer:

- listeners, registered with `connect`, called synchronously on every `fire` (once-listeners
  only on the first);
- waiters, registered with `wait`, coroutines that yield until the next `fire` and are then
  resumed by the scheduler on the following frame, never inside `fire` itself.

The interpreter and the scheduler are collaborators behind the [`ScriptHost`] and [`Scheduler`]
traits. [`NativeHost`] and [`FrameScheduler`] implement them in-process.

# Basic usage

```rust
use librebox_signals::*;
use std::rc::Rc;

let host = Rc::new(NativeHost::new());
let scheduler = Rc::new(FrameScheduler::new(host.main_thread()));
let signal = Signal::new(host.clone(), Some(scheduler.clone() as Rc<dyn Scheduler>));

signal.on(&ScriptValue::function(|args: &[ScriptValue]| println!("fired with {:?}", args))).unwrap();

// a task waits on the signal
let task = host.spawn_thread();
scheduler.spawn_task(task);
assert_eq!(signal.wait(task).unwrap(), WaitStatus::Blocked);

signal.fire(&[ScriptValue::from("hello")]);
// the listener already ran; the task resumes on the next frame
let resumed = scheduler.step();
assert_eq!(resumed[0].thread, task);
assert_eq!(host.take_args(task), vec![ScriptValue::from("hello")]);
```
*/

mod config;
mod connection;
mod error;
mod handle;
mod host;
mod listener;
mod native;
mod scheduler;
mod signal;
mod waiter;

pub use config::*;
pub use connection::*;
pub use error::*;
pub use handle::*;
pub use host::*;
pub use listener::*;
pub use native::*;
pub use scheduler::*;
pub use signal::*;
pub use waiter::*;
