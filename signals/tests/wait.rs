mod common;
use common::*;
use librebox_signals::*;
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn test_waiter_resumes_on_next_frame() {
    let Harness { host, scheduler, signal } = harness();
    let thread = host.spawn_thread();
    let script = scheduler.register_script(thread);

    assert_eq!(signal.wait(thread).unwrap(), WaitStatus::Blocked);
    assert_eq!(scheduler.state_of_script(script), Some(WaitState::WaitingEvent));
    assert_eq!(signal.waiter_count(), 1);

    // nothing moves before the fire
    assert!(scheduler.step().is_empty());

    signal.fire(&[num(7.0)]);
    assert_eq!(signal.waiter_count(), 0);
    // scheduled, not resumed: the resume belongs to the next frame
    let frame = scheduler.frame();
    assert_eq!(scheduler.state_of_script(script), Some(WaitState::Scheduled(frame + 1)));

    let resumed = scheduler.step();
    assert_eq!(resumed, vec![Resume { thread, script: Some(script), nargs: 1 }]);
    assert_eq!(scheduler.frame(), frame + 1);
    assert_eq!(host.take_args(thread), vec![num(7.0)]);
}

#[test]
fn test_listeners_run_before_waiters_are_scheduled() {
    let Harness { host, scheduler, signal } = harness();
    let task = host.spawn_thread();
    scheduler.spawn_task(task);
    let _ = signal.wait(task).unwrap();

    let seen_pending = Rc::new(Cell::new(usize::MAX));
    let probe = {
        let scheduler = scheduler.clone();
        let seen_pending = seen_pending.clone();
        ScriptValue::function(move |_: &[ScriptValue]| seen_pending.set(scheduler.pending()))
    };
    signal.on(&probe).unwrap();

    signal.fire(&[]);
    assert_eq!(seen_pending.get(), 0);
    assert_eq!(scheduler.pending(), 1);
    assert_eq!(scheduler.state_of_task(task), Some(WaitState::Scheduled(scheduler.frame() + 1)));
}

#[test]
fn test_wait_during_fire_is_deferred() {
    let Harness { host, scheduler, signal } = harness();
    let task = host.spawn_thread();
    scheduler.spawn_task(task);

    let weak = Rc::downgrade(&signal);
    let waited = Rc::new(Cell::new(false));
    let listener = {
        let waited = waited.clone();
        ScriptValue::function(move |_: &[ScriptValue]| {
            if !waited.replace(true) {
                let _ = weak.upgrade().unwrap().wait(task).unwrap();
            }
        })
    };
    signal.on(&listener).unwrap();

    signal.fire(&[num(1.0)]);
    assert_eq!(signal.waiter_count(), 1);
    assert!(scheduler.step().is_empty());
    assert_eq!(host.pending_args(task), 0);

    signal.fire(&[num(2.0)]);
    assert_eq!(scheduler.step(), vec![Resume { thread: task, script: None, nargs: 1 }]);
    assert_eq!(host.take_args(task), vec![num(2.0)]);
}

#[test]
fn test_every_waiter_is_woken_once() {
    let Harness { host, scheduler, signal } = harness();
    let a = host.spawn_thread();
    let b = host.spawn_thread();
    let script = scheduler.register_script(a);
    scheduler.spawn_task(b);

    let _ = signal.wait(a).unwrap();
    let _ = signal.wait(b).unwrap();
    signal.fire(&[ScriptValue::from("go")]);
    signal.fire(&[ScriptValue::from("again")]);

    let resumed = scheduler.step();
    assert_eq!(resumed.len(), 2);
    assert!(resumed.contains(&Resume { thread: a, script: Some(script), nargs: 1 }));
    assert!(resumed.contains(&Resume { thread: b, script: None, nargs: 1 }));
    assert_eq!(host.take_args(a), vec![ScriptValue::from("go")]);
    assert_eq!(host.take_args(b), vec![ScriptValue::from("go")]);
}

#[test]
fn test_terminated_script_is_dropped_silently() {
    let Harness { host, scheduler, signal } = harness();
    let thread = host.spawn_thread();
    let script = scheduler.register_script(thread);
    let _ = signal.wait(thread).unwrap();

    scheduler.terminate_script(script);
    signal.fire(&[num(1.0)]);
    assert_eq!(signal.waiter_count(), 0);
    assert_eq!(host.pending_args(thread), 0);
    assert!(scheduler.step().is_empty());
}

#[test]
fn test_waiter_that_cannot_take_values_is_skipped() {
    let Harness { host, scheduler, signal } = harness();
    let tight = host.spawn_thread_with_capacity(1);
    let roomy = host.spawn_thread();
    scheduler.spawn_task(tight);
    scheduler.spawn_task(roomy);
    let _ = signal.wait(tight).unwrap();
    let _ = signal.wait(roomy).unwrap();

    signal.fire(&[num(1.0), num(2.0)]);
    assert_eq!(scheduler.step(), vec![Resume { thread: roomy, script: None, nargs: 2 }]);
    assert_eq!(host.pending_args(tight), 0);
}

#[test]
fn test_wait_on_closed_signal_is_abandoned() {
    let Harness { host, scheduler, signal } = harness();
    let task = host.spawn_thread();
    scheduler.spawn_task(task);

    let _ = signal.wait(task).unwrap();
    signal.close();
    assert_eq!(signal.waiter_count(), 0);
    assert_eq!(signal.wait(task).unwrap(), WaitStatus::Abandoned);

    signal.fire(&[]);
    assert!(scheduler.step().is_empty());
}

#[test]
fn test_connection_handle() {
    let Harness { host, signal, .. } = harness();
    let (listener, check) = watcher();

    let conn = Connection::bind(&signal, &listener, false).unwrap();
    assert!(conn.is_connected());
    let copy = conn.clone();
    drop(conn);
    // dropping a handle leaves the listener in place
    assert!(copy.is_connected());

    signal.fire(&[num(1.0)]);
    assert_eq!(check().len(), 1);

    copy.disconnect();
    copy.disconnect();
    assert!(!copy.is_connected());
    assert_eq!(host.pinned_count(), 0);

    let once = Connection::bind(&signal, &listener, true).unwrap();
    signal.fire(&[]);
    signal.fire(&[]);
    assert_eq!(check().len(), 1);
    assert!(!once.is_connected());
    assert_eq!(format!("{once:?}"), format!("Connection({})", once.id()));
}
