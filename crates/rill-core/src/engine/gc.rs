//! Deferred deallocation for sources dropped by the clock thread
//!
//! Voices removed from the mixer on the clock thread are held in
//! `basedrop::Owned` pointers. Dropping one only enqueues it; the source's
//! destructor and the memory release run later on the collector thread,
//! where a decoder closing a file or a large sample buffer being unmapped
//! cannot stall a tick.

use basedrop::{Collector, Handle};
use std::io;
use std::sync::mpsc;
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

/// Name of the process-wide collector thread
pub const GC_THREAD_NAME: &str = "rill-gc";

/// How often the process-wide collector drains its queue
pub const COLLECT_INTERVAL: Duration = Duration::from_millis(100);

static GC_HANDLE: OnceLock<Handle> = OnceLock::new();

/// Start a collector on a new thread named `name`, draining every `interval`
///
/// The thread runs for the rest of the process. Values allocated through
/// the returned handle are destroyed on that thread, at most one interval
/// after their last owner lets go of them.
pub fn spawn_collector(name: &str, interval: Duration) -> io::Result<Handle> {
    let (tx, rx) = mpsc::channel();

    thread::Builder::new().name(name.to_string()).spawn(move || {
        // Collector is !Sync, so it is created on the thread that runs it
        let mut collector = Collector::new();
        if tx.send(collector.handle()).is_err() {
            return;
        }

        log::debug!("Collector started, draining every {:?}", interval);
        loop {
            collector.collect();
            thread::sleep(interval);
        }
    })?;

    rx.recv().map_err(|_| {
        io::Error::new(
            io::ErrorKind::Other,
            "collector thread exited before handing out its handle",
        )
    })
}

/// Handle to the process-wide collector
///
/// The `rill-gc` thread is started on first use. Failing to start it leaves
/// the engine unable to retire voices without freeing on the clock thread,
/// so that is fatal.
pub fn gc_handle() -> Handle {
    GC_HANDLE
        .get_or_init(|| match spawn_collector(GC_THREAD_NAME, COLLECT_INTERVAL) {
            Ok(handle) => handle,
            Err(e) => panic!("Failed to start {} thread: {}", GC_THREAD_NAME, e),
        })
        .clone()
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};

    /// Records the name of the thread it was dropped on
    pub struct DropRecorder(pub Arc<Mutex<Option<String>>>);

    impl Drop for DropRecorder {
        fn drop(&mut self) {
            let name = thread::current().name().unwrap_or("<unnamed>").to_string();
            *self.0.lock().unwrap() = Some(name);
        }
    }

    /// Wait up to five seconds for a `DropRecorder` to fire
    pub fn wait_for_drop(slot: &Mutex<Option<String>>) -> Option<String> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(name) = slot.lock().unwrap().clone() {
                return Some(name);
            }
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}
