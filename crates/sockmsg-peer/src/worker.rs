use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::debug;

use crate::error::{PeerError, Result};

/// Interval between polling ticks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A named thread that runs a tick closure every [`POLL_INTERVAL`] until
/// stopped.
///
/// Stopping is cooperative: the flag is raised, the in-flight tick finishes,
/// and the thread is joined. Dropping a running worker stops it.
pub struct PollWorker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PollWorker {
    /// Start a worker thread named `name` running `tick` on every interval.
    pub fn spawn<F>(name: &str, mut tick: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while !stop_flag.load(Ordering::Acquire) {
                    tick();
                    std::thread::sleep(POLL_INTERVAL);
                }
            })
            .map_err(PeerError::Spawn)?;

        debug!(name, "polling worker started");
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Signal the worker to stop and wait for its current tick to finish.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_ok() {
                debug!(name, "polling worker stopped");
            }
        }
    }
}

impl Drop for PollWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn ticks_until_stopped() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let mut worker = PollWorker::spawn("test-ticker", move || {
            counter.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while ticks.load(Ordering::Relaxed) < 3 {
            assert!(std::time::Instant::now() < deadline, "worker never ticked");
            std::thread::sleep(Duration::from_millis(5));
        }

        worker.stop();
        let after_stop = ticks.load(Ordering::Relaxed);
        std::thread::sleep(POLL_INTERVAL * 3);
        assert_eq!(ticks.load(Ordering::Relaxed), after_stop);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut worker = PollWorker::spawn("test-idle", || {}).unwrap();
        worker.stop();
        worker.stop();
    }
}
