use std::sync::atomic::{AtomicI64, Ordering};

type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

/// Issues pet ids from the wall clock in Unix milliseconds.
///
/// Ids are strictly increasing within a process: when the clock has not moved
/// past the last issued id, the next id is `last + 1`.
pub struct IdGenerator {
    last: AtomicI64,
    clock: Clock,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::with_clock(|| chrono::Utc::now().timestamp_millis())
    }

    /// Use a custom millisecond clock
    pub fn with_clock<F>(clock: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        Self {
            last: AtomicI64::new(i64::MIN),
            clock: Box::new(clock),
        }
    }

    pub fn next_id(&self) -> i64 {
        let now = (self.clock)();
        let mut last = self.last.load(Ordering::Relaxed);

        loop {
            let candidate = if now > last { now } else { last.saturating_add(1) };

            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
