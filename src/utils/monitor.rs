use std::time::{Duration, Instant};

/// Lap timer for sequential remote calls. Each lap logs the time since the previous one.
#[derive(Debug)]
pub struct StepTimer {
    started: Instant,
    last: Instant,
}

impl StepTimer {
    pub fn start() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last: now,
        }
    }

    pub fn lap(&mut self, label: &str) -> Duration {
        let now = Instant::now();
        let elapsed = now - self.last;
        self.last = now;
        tracing::info!("⏱ {} -> {:.3}s", label, elapsed.as_secs_f64());
        elapsed
    }

    pub fn total(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn log_total(&self, what: &str) {
        tracing::info!("⏱ {} finished in {:.3}s", what, self.total().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn laps_never_exceed_total() {
        let mut timer = StepTimer::start();
        let first = timer.lap("first");
        std::thread::sleep(Duration::from_millis(5));
        let second = timer.lap("second");

        assert!(second >= Duration::from_millis(5));
        assert!(timer.total() >= first + second);
    }
}
