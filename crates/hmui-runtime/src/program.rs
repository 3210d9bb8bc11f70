#![forbid(unsafe_code)]

//! Model/command contract and the deterministic driving loop.
//!
//! The application is a state machine: [`Model::update`] consumes one
//! message and returns a [`Cmd`] describing side effects. The [`Runtime`]
//! executes those effects cooperatively on one thread:
//!
//! - messages queue FIFO and are processed in arrival order;
//! - tasks (remote calls) queue separately and run only when pumped, so
//!   tests control exactly how in-flight work interleaves with new input;
//! - ticks are low priority: they fire only once the message queue is
//!   idle, which is what turns a zero-delay tick into an "after the UI had
//!   a chance to settle" callback.
//!
//! Rendering is deliberately absent from the contract — presentation is a
//! host concern and reads from model state.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::{debug, info};

/// Application state machine driven by the runtime.
pub trait Model: Sized {
    /// Message type consumed by `update`. `Send` so task closures can
    /// produce messages from queued remote work.
    type Message: Send + 'static;

    /// Startup commands (initial loads, preference reads).
    fn init(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }

    /// The core state transition.
    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message>;
}

/// A side effect requested by the model.
#[derive(Default)]
pub enum Cmd<M> {
    /// No operation.
    #[default]
    None,
    /// Stop the driving loop.
    Quit,
    /// Feed a message back into the queue.
    Msg(M),
    /// Execute several commands.
    Batch(Vec<Cmd<M>>),
    /// Queue a unit of deferred work (typically a remote call); its result
    /// re-enters `update` when the runtime pumps the task queue.
    Task(Box<dyn FnOnce() -> M + Send>),
    /// Deliver a message once `delay` has elapsed and the queue is idle.
    Tick(Duration, Box<dyn FnOnce() -> M + Send>),
    /// Emit a log line through the runtime.
    Log(String),
}

impl<M> Cmd<M> {
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::None
    }

    #[inline]
    #[must_use]
    pub fn quit() -> Self {
        Self::Quit
    }

    #[inline]
    #[must_use]
    pub fn msg(m: M) -> Self {
        Self::Msg(m)
    }

    #[must_use]
    pub fn batch(cmds: Vec<Self>) -> Self {
        Self::Batch(cmds)
    }

    /// Queue deferred work whose result becomes a message.
    #[must_use]
    pub fn task<F>(f: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self::Task(Box::new(f))
    }

    /// Schedule a message for delivery after `delay`, once idle.
    #[must_use]
    pub fn tick<F>(delay: Duration, f: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self::Tick(delay, Box::new(f))
    }

    #[must_use]
    pub fn log(msg: impl Into<String>) -> Self {
        Self::Log(msg.into())
    }
}

impl<M> std::fmt::Debug for Cmd<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Quit => write!(f, "Quit"),
            Self::Msg(_) => write!(f, "Msg"),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(&cmds.len()).finish(),
            Self::Task(_) => write!(f, "Task"),
            Self::Tick(d, _) => f.debug_tuple("Tick").field(d).finish(),
            Self::Log(s) => f.debug_tuple("Log").field(s).finish(),
        }
    }
}

struct ScheduledTick<M> {
    due: Instant,
    seq: u64,
    produce: Box<dyn FnOnce() -> M + Send>,
}

/// Deterministic driving loop for a [`Model`].
pub struct Runtime<M: Model> {
    model: M,
    queue: VecDeque<M::Message>,
    tasks: VecDeque<Box<dyn FnOnce() -> M::Message + Send>>,
    ticks: Vec<ScheduledTick<M::Message>>,
    tick_seq: u64,
    quitting: bool,
}

impl<M: Model> Runtime<M> {
    #[must_use]
    pub fn new(model: M) -> Self {
        Self {
            model,
            queue: VecDeque::new(),
            tasks: VecDeque::new(),
            ticks: Vec::new(),
            tick_seq: 0,
            quitting: false,
        }
    }

    /// Run `Model::init` and execute its commands.
    pub fn init(&mut self) {
        let cmd = self.model.init();
        self.exec(cmd);
        self.drain();
    }

    /// Enqueue a message and process the queue to idle.
    pub fn send(&mut self, msg: M::Message) {
        self.queue.push_back(msg);
        self.drain();
    }

    /// Enqueue without processing; pair with [`Runtime::drain`].
    pub fn enqueue(&mut self, msg: M::Message) {
        self.queue.push_back(msg);
    }

    /// Process queued messages in arrival order until the queue is empty.
    pub fn drain(&mut self) {
        while let Some(msg) = self.queue.pop_front() {
            let cmd = self.model.update(msg);
            self.exec(cmd);
        }
    }

    /// Run the oldest queued task and process its result. Returns whether
    /// a task ran.
    pub fn pump_task(&mut self) -> bool {
        let Some(task) = self.tasks.pop_front() else {
            return false;
        };
        let msg = task();
        self.queue.push_back(msg);
        self.drain();
        true
    }

    /// Run every queued task, including tasks queued by task results.
    pub fn pump_tasks(&mut self) {
        while self.pump_task() {}
    }

    /// Deliver ticks that are due at `now`, oldest deadline first.
    /// Ticks are low priority: call this only between drains.
    pub fn fire_due_ticks(&mut self, now: Instant) -> usize {
        self.fire_ticks(|tick| tick.due <= now)
    }

    /// Deliver every scheduled tick regardless of deadline (test control).
    pub fn fire_all_ticks(&mut self) -> usize {
        self.fire_ticks(|_| true)
    }

    fn fire_ticks(&mut self, due: impl Fn(&ScheduledTick<M::Message>) -> bool) -> usize {
        let mut ready: Vec<ScheduledTick<M::Message>> = Vec::new();
        let mut rest: Vec<ScheduledTick<M::Message>> = Vec::new();
        for tick in self.ticks.drain(..) {
            if due(&tick) {
                ready.push(tick);
            } else {
                rest.push(tick);
            }
        }
        self.ticks = rest;
        ready.sort_by_key(|t| (t.due, t.seq));
        let count = ready.len();
        for tick in ready {
            let msg = (tick.produce)();
            self.queue.push_back(msg);
            self.drain();
        }
        count
    }

    /// Next tick deadline, if any.
    #[must_use]
    pub fn next_tick_due(&self) -> Option<Instant> {
        self.ticks.iter().map(|t| t.due).min()
    }

    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn pending_ticks(&self) -> usize {
        self.ticks.len()
    }

    /// No queued messages and no queued tasks.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.tasks.is_empty()
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.quitting
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Drive to completion: drain messages, pump tasks, sleep for and fire
    /// ticks, until nothing is pending or the model quit.
    pub fn run(&mut self) {
        loop {
            self.drain();
            if self.quitting {
                debug!("runtime quitting");
                return;
            }
            if self.pump_task() {
                continue;
            }
            let Some(due) = self.next_tick_due() else {
                return;
            };
            let now = Instant::now();
            if due > now {
                std::thread::sleep(due - now);
            }
            self.fire_due_ticks(Instant::now());
        }
    }

    fn exec(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => self.quitting = true,
            Cmd::Msg(m) => self.queue.push_back(m),
            Cmd::Batch(cmds) => {
                for cmd in cmds {
                    self.exec(cmd);
                }
            }
            Cmd::Task(task) => self.tasks.push_back(task),
            Cmd::Tick(delay, produce) => {
                self.ticks.push(ScheduledTick {
                    due: Instant::now() + delay,
                    seq: self.tick_seq,
                    produce,
                });
                self.tick_seq += 1;
            }
            Cmd::Log(line) => info!(target: "hmui", "{line}"),
        }
    }
}
