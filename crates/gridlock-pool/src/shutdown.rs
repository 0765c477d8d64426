//! Termination-signal handling for preempted worker processes.
//!
//! Orchestrators signal imminent eviction with SIGTERM. The signal handler
//! itself only stores into a static atomic (the only async-signal-safe thing
//! it may do); a watcher thread observes the flag, performs the single
//! lock-acquire and document rewrite through [`Coordinator::preempt`], and
//! terminates the process with a non-zero exit status. The bounded work keeps
//! the teardown inside a typical termination grace period.
//!
//! Embeddings without signal delivery skip the watch and call
//! [`Coordinator::preempt`] from their own shutdown path instead.

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{error, warn};

use crate::coordinator::Coordinator;

static TERMINATED: AtomicBool = AtomicBool::new(false);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Process-wide SIGTERM watch releasing the current claim before exit.
///
/// Install at most once per process, after [`Coordinator::init`].
#[derive(Debug)]
pub struct TerminationWatch {
    _watcher: thread::JoinHandle<()>,
}

impl TerminationWatch {
    /// Registers the signal handler and spawns the watcher thread.
    pub fn install(coordinator: Arc<Coordinator>) -> Self {
        register_signal_handler();
        let watcher = thread::spawn(move || watch(coordinator));
        Self { _watcher: watcher }
    }

    /// Returns `true` once the termination signal has been observed.
    pub fn triggered() -> bool {
        TERMINATED.load(Ordering::Relaxed)
    }
}

fn watch(coordinator: Arc<Coordinator>) {
    loop {
        if TERMINATED.load(Ordering::Relaxed) {
            warn!("experiment was preempted (received termination signal)");
            match coordinator.preempt() {
                Ok(Some(id)) => warn!(id = %id, "experiment marked preempted"),
                Ok(None) => {}
                Err(err) => {
                    // No corrective action is possible during teardown.
                    error!(error = %err, "failed to release claim during teardown");
                }
            }
            process::exit(1);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(unix)]
fn register_signal_handler() {
    extern "C" fn handler(_: libc::c_int) {
        TERMINATED.store(true, Ordering::Relaxed);
    }

    // SAFETY: the handler only stores into a static atomic, which is
    // async-signal-safe. Registration itself is a plain POSIX call.
    unsafe {
        let h = handler as *const () as libc::sighandler_t;
        libc::signal(libc::SIGTERM, h);
    }
}

#[cfg(not(unix))]
fn register_signal_handler() {
    // No signal delivery on this platform; the embedding application must
    // call `Coordinator::preempt` from its own shutdown path.
}
