use std::time::Duration;

/// Sequence of waits between attempts.
///
/// The first wait equals the base interval; each following wait is
/// `previous * base + base`, with `base` taken in seconds. For a base of
/// two seconds this yields 2, 6, 14, 30, ... seconds.
#[derive(Clone, Debug)]
pub struct Backoff {
    base: Duration,
    next: Duration,
}

impl Backoff {
    /// Starts the sequence at `base`.
    pub fn new(base: Duration) -> Self {
        Self { base, next: base }
    }

    /// Returns the wait for the upcoming retry and advances the sequence.
    pub fn next_interval(&mut self) -> Duration {
        let current = self.next;
        self.next = grow(current, self.base);
        current
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_interval())
    }
}

// Saturates instead of panicking once the sequence leaves Duration's range.
fn grow(current: Duration, base: Duration) -> Duration {
    Duration::try_from_secs_f64(current.as_secs_f64() * base.as_secs_f64())
        .ok()
        .and_then(|scaled| scaled.checked_add(base))
        .unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Backoff;

    #[test]
    fn default_base_grows_as_t_times_base_plus_base() {
        let waits: Vec<u64> = Backoff::new(Duration::from_secs(2))
            .take(4)
            .map(|wait| wait.as_secs())
            .collect();
        assert_eq!(waits, vec![2, 6, 14, 30]);
    }

    #[test]
    fn unit_base_grows_linearly() {
        let waits: Vec<u64> = Backoff::new(Duration::from_secs(1))
            .take(4)
            .map(|wait| wait.as_secs())
            .collect();
        assert_eq!(waits, vec![1, 2, 3, 4]);
    }

    #[test]
    fn zero_base_never_waits() {
        assert!(Backoff::new(Duration::ZERO)
            .take(3)
            .all(|wait| wait.is_zero()));
    }

    #[test]
    fn growth_saturates_instead_of_overflowing() {
        let mut backoff = Backoff::new(Duration::from_secs(1_000));
        for _ in 0..10 {
            backoff.next_interval();
        }
        assert_eq!(backoff.next_interval(), Duration::MAX);
    }
}
