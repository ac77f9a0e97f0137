//! Interval timers for the poll loops, and response ordering.
//!
//! Each [`Scheduler`] owns one background thread. A tick is entered only
//! under the control lock, and `stop()` sets the flag under that lock and
//! then waits for a tick already entered to finish. Once `stop()` returns no
//! tick is running and none can begin. A tick that stops its own scheduler
//! does not wait on itself.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use std::time::Duration;
use tracing::{debug, error};

use crate::error::{Result, ShogunError};

#[derive(Debug, Default)]
struct Flags {
    stopped: bool,
    in_tick: bool,
}

#[derive(Default)]
struct Control {
    flags: Mutex<Flags>,
    wake: Condvar,
}

impl Control {
    fn flags(&self) -> MutexGuard<'_, Flags> {
        self.flags.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sets the stop flag and, unless called from the tick itself, waits for
    /// an entered tick to finish.
    fn stop(&self, from_tick: bool) {
        let mut flags = self.flags();
        flags.stopped = true;
        self.wake.notify_all();
        if from_tick {
            return;
        }
        while flags.in_tick {
            flags = self.wake.wait(flags).unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Marks a tick as entered. False once stopped.
    fn enter_tick(&self) -> bool {
        let mut flags = self.flags();
        if flags.stopped {
            return false;
        }
        flags.in_tick = true;
        true
    }

    fn leave_tick(&self) {
        self.flags().in_tick = false;
        self.wake.notify_all();
    }

    /// Sleeps for `interval` or until stopped. Returns false once stopped.
    fn wait(&self, interval: Duration) -> bool {
        let flags = self.flags();
        let (flags, _) = self
            .wake
            .wait_timeout_while(flags, interval, |flags| !flags.stopped)
            .unwrap_or_else(|e| e.into_inner());
        !flags.stopped
    }
}

struct Running {
    control: Arc<Control>,
    thread: ThreadId,
}

pub struct Scheduler {
    name: &'static str,
    running: Option<Running>,
}

impl Scheduler {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            running: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Runs `tick` now and then every `interval` until stopped. A running
    /// scheduler is stopped first, so there is never more than one timer.
    pub fn start<F>(&mut self, interval: Duration, tick: F) -> Result<()>
    where
        F: Fn() + Send + 'static,
    {
        self.stop();

        let control = Arc::new(Control::default());
        let thread_control = Arc::clone(&control);
        let name = self.name;

        let handle = thread::Builder::new()
            .name(format!("shogun-{}", name))
            .spawn(move || {
                while thread_control.enter_tick() {
                    debug!(scheduler = name, "Tick");
                    if catch_unwind(AssertUnwindSafe(&tick)).is_err() {
                        error!(scheduler = name, "Tick panicked; continuing");
                    }
                    thread_control.leave_tick();
                    if !thread_control.wait(interval) {
                        break;
                    }
                }
                debug!(scheduler = name, "Scheduler thread exiting");
            })
            .map_err(|source| ShogunError::Io {
                context: format!("spawning {} scheduler", name),
                source,
            })?;

        self.running = Some(Running {
            control,
            thread: handle.thread().id(),
        });
        Ok(())
    }

    /// After this returns no tick is running and none will begin.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            let from_tick = thread::current().id() == running.thread;
            running.control.stop(from_tick);
            debug!(scheduler = self.name, "Scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Response Ordering
// ═══════════════════════════════════════════════════════════════════════════════

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Generation counter for one request stream.
///
/// A response is applied only if it was issued after the last applied one,
/// so a slow early request can never overwrite a faster later one.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    issued: u64,
    applied: u64,
}

impl RequestTracker {
    pub fn begin(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// Marks `ticket` applied if it is newer than anything applied so far.
    pub fn accept(&mut self, ticket: Ticket) -> bool {
        if ticket.0 <= self.applied {
            return false;
        }
        self.applied = ticket.0;
        true
    }
}
