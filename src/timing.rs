//! Build timing utilities.

use std::time::Instant;

use log::info;

/// A simple timer for measuring build phase durations.
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    /// Start a new timer with the given phase name.
    pub fn start(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }

    /// Seconds since the timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Finish the timer and log the elapsed time.
    pub fn finish(self) {
        let secs = self.elapsed_secs();
        if secs >= 1.0 {
            info!("[{:.1}s] {}", secs, self.name);
        } else {
            info!("[{:.0}ms] {}", secs * 1000.0, self.name);
        }
    }
}
