use std::cell::RefCell;
use std::collections::HashMap;

use tracing::{debug, trace};

use crate::host::{ScriptId, ThreadId};

/// The per-frame scheduler that owns suspended scripts and tasks.
///
/// Signals never resume anything themselves: they tell the scheduler what is blocked and
/// what should be resumed, and the scheduler does it on its own frame boundary.
pub trait Scheduler {
    /// The interpreter's main context, on which listeners run.
    fn main_thread(&self) -> Option<ThreadId>;

    /// The script a thread belongs to, or `None` for a free-standing task.
    fn script_of(&self, thread: ThreadId) -> Option<ScriptId>;

    /// The live thread of a script, or `None` once the script has terminated.
    fn script_thread(&self, script: ScriptId) -> Option<ThreadId>;

    /// Marks a script as blocked on an event.
    fn block_script(&self, script: ScriptId);

    /// Marks a free-standing task as blocked on an event.
    fn block_task(&self, thread: ThreadId);

    /// Resumes a script on the next frame with `nargs` values already pushed onto its thread.
    fn resume_script_next_frame(&self, script: ScriptId, nargs: usize);

    /// Resumes a task on the next frame with `nargs` values already pushed onto it.
    fn wake_task_next_frame(&self, thread: ThreadId, nargs: usize);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    Running,
    WaitingEvent,
    /// Due to be resumed at the given frame.
    Scheduled(u64),
}

/// A resumption handed back by `FrameScheduler::step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resume {
    pub thread: ThreadId,
    pub script: Option<ScriptId>,
    pub nargs: usize,
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Script(ScriptId),
    Task(ThreadId),
}

struct ScriptEntry {
    thread: ThreadId,
    state: WaitState,
}

#[derive(Default)]
struct State {
    frame: u64,
    next_script: u64,
    scripts: HashMap<ScriptId, ScriptEntry>,
    threads: HashMap<ThreadId, ScriptId>,
    tasks: HashMap<ThreadId, WaitState>,
    next_frame: Vec<(Target, usize)>,
}

/// A cooperative scheduler driven by the engine's update loop.
///
/// Deferred resumptions queue up until the next call to [`FrameScheduler::step`], which
/// advances the frame counter and returns them. Resumptions queued while those are being
/// processed belong to the frame after.
pub struct FrameScheduler {
    main: ThreadId,
    state: RefCell<State>,
}

impl FrameScheduler {
    pub fn new(main: ThreadId) -> Self { Self { main, state: RefCell::new(State::default()) } }

    pub fn frame(&self) -> u64 { self.state.borrow().frame }

    /// Number of resumptions waiting for the next step.
    pub fn pending(&self) -> usize { self.state.borrow().next_frame.len() }

    pub fn register_script(&self, thread: ThreadId) -> ScriptId {
        let mut state = self.state.borrow_mut();
        state.next_script += 1;
        let script = ScriptId(state.next_script);
        state.scripts.insert(script, ScriptEntry { thread, state: WaitState::Running });
        state.threads.insert(thread, script);
        debug!("registered {script} on {thread}");
        script
    }

    /// Forgets a script. Pending resumptions for it are dropped at the next step.
    pub fn terminate_script(&self, script: ScriptId) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.scripts.remove(&script) {
            state.threads.remove(&entry.thread);
            debug!("terminated {script}");
        }
    }

    pub fn spawn_task(&self, thread: ThreadId) {
        self.state.borrow_mut().tasks.insert(thread, WaitState::Running);
    }

    pub fn state_of_script(&self, script: ScriptId) -> Option<WaitState> { self.state.borrow().scripts.get(&script).map(|e| e.state) }

    pub fn state_of_task(&self, thread: ThreadId) -> Option<WaitState> { self.state.borrow().tasks.get(&thread).copied() }

    /// Advances one frame and returns everything that was scheduled for it.
    pub fn step(&self) -> Vec<Resume> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.frame += 1;
        let queued = std::mem::take(&mut state.next_frame);
        let mut due = Vec::with_capacity(queued.len());
        for (target, nargs) in queued {
            match target {
                Target::Script(script) => {
                    let Some(entry) = state.scripts.get_mut(&script) else {
                        continue;
                    };
                    entry.state = WaitState::Running;
                    due.push(Resume { thread: entry.thread, script: Some(script), nargs });
                }
                Target::Task(thread) => {
                    state.tasks.insert(thread, WaitState::Running);
                    due.push(Resume { thread, script: None, nargs });
                }
            }
        }
        trace!("frame {} resumes {}", state.frame, due.len());
        due
    }
}

impl Scheduler for FrameScheduler {
    fn main_thread(&self) -> Option<ThreadId> { Some(self.main) }

    fn script_of(&self, thread: ThreadId) -> Option<ScriptId> { self.state.borrow().threads.get(&thread).copied() }

    fn script_thread(&self, script: ScriptId) -> Option<ThreadId> { self.state.borrow().scripts.get(&script).map(|e| e.thread) }

    fn block_script(&self, script: ScriptId) {
        if let Some(entry) = self.state.borrow_mut().scripts.get_mut(&script) {
            entry.state = WaitState::WaitingEvent;
        }
    }

    fn block_task(&self, thread: ThreadId) { self.state.borrow_mut().tasks.insert(thread, WaitState::WaitingEvent); }

    fn resume_script_next_frame(&self, script: ScriptId, nargs: usize) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let due = state.frame + 1;
        if let Some(entry) = state.scripts.get_mut(&script) {
            entry.state = WaitState::Scheduled(due);
            state.next_frame.push((Target::Script(script), nargs));
        }
    }

    fn wake_task_next_frame(&self, thread: ThreadId, nargs: usize) {
        let mut state = self.state.borrow_mut();
        let due = state.frame + 1;
        state.tasks.insert(thread, WaitState::Scheduled(due));
        state.next_frame.push((Target::Task(thread), nargs));
    }
}
