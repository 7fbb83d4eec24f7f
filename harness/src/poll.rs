//! Fixed-interval polling until a probe reports a terminal reading.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, instrument, warn};

use crate::core::types::Readiness;

/// Source of time for polling loops.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall clock that blocks the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Re-run `probe` until `classify` calls a reading terminal or `deadline` elapses.
///
/// Readings are trimmed before classification. Once the deadline is exceeded
/// the last reading is returned as-is; deciding whether a non-terminal value
/// is a failure is left to the caller. The total wait is bounded by
/// `deadline + interval`. Errors come only from `probe`.
#[instrument(skip_all, fields(interval_ms = interval.as_millis() as u64, deadline_secs = deadline.as_secs()))]
pub fn poll_until<C, P, F, E>(
    clock: &C,
    mut probe: P,
    classify: F,
    interval: Duration,
    deadline: Duration,
) -> Result<String, E>
where
    C: Clock + ?Sized,
    P: FnMut() -> Result<String, E>,
    F: Fn(&str) -> Readiness,
{
    let started = clock.now();
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let reading = probe()?.trim().to_string();
        match classify(&reading) {
            Readiness::Terminal(value) => {
                debug!(attempts, value = %value, "terminal reading");
                return Ok(value);
            }
            Readiness::Intermediate(value) => {
                let elapsed = clock.now().saturating_duration_since(started);
                if elapsed >= deadline {
                    warn!(
                        attempts,
                        elapsed_secs = elapsed.as_secs(),
                        value = %value,
                        "deadline exceeded before a terminal reading"
                    );
                    return Ok(value);
                }
                debug!(attempts, value = %value, "intermediate reading");
            }
        }
        clock.sleep(interval);
    }
}

/// Classifier for `systemctl is-system-running`.
///
/// `initializing` and `starting` are transitional; any other state (including
/// `degraded`, `maintenance` and `offline`) ends the wait.
pub fn classify_system_state(reading: &str) -> Readiness {
    match reading {
        "initializing" | "starting" => Readiness::Intermediate(reading.to_string()),
        _ => Readiness::Terminal(reading.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeClock;
    use std::convert::Infallible;

    fn scripted(readings: &[&str]) -> impl FnMut() -> Result<String, Infallible> {
        let mut queue: Vec<String> = readings.iter().rev().map(|s| s.to_string()).collect();
        move || Ok(queue.pop().unwrap_or_else(|| "starting".to_string()))
    }

    #[test]
    fn returns_terminal_after_intermediate_readings() {
        let clock = FakeClock::new();
        let interval = Duration::from_secs(1);
        let deadline = Duration::from_secs(60);

        let value = poll_until(
            &clock,
            scripted(&["starting\n", " starting", "starting", "running\n"]),
            classify_system_state,
            interval,
            deadline,
        )
        .expect("poll");

        assert_eq!(value, "running");
        assert!(clock.sleeps() >= 3);
        assert!(clock.elapsed() <= deadline + interval);
    }

    #[test]
    fn immediate_terminal_does_not_sleep() {
        let clock = FakeClock::new();
        let value = poll_until(
            &clock,
            scripted(&["degraded"]),
            classify_system_state,
            Duration::from_secs(1),
            Duration::from_secs(10),
        )
        .expect("poll");
        assert_eq!(value, "degraded");
        assert_eq!(clock.sleeps(), 0);
    }

    #[test]
    fn deadline_returns_last_intermediate_without_error() {
        let clock = FakeClock::new();
        let interval = Duration::from_secs(1);
        let deadline = Duration::from_secs(5);

        let value = poll_until(
            &clock,
            scripted(&[]),
            classify_system_state,
            interval,
            deadline,
        )
        .expect("poll");

        assert_eq!(value, "starting");
        assert!(clock.elapsed() >= deadline);
        assert!(clock.elapsed() <= deadline + interval);
    }

    #[test]
    fn probe_errors_stop_polling() {
        let clock = FakeClock::new();
        let mut calls = 0;
        let result: Result<String, String> = poll_until(
            &clock,
            || {
                calls += 1;
                if calls < 3 {
                    Ok("starting".to_string())
                } else {
                    Err("probe failed".to_string())
                }
            },
            classify_system_state,
            Duration::from_secs(1),
            Duration::from_secs(60),
        );
        assert_eq!(result, Err("probe failed".to_string()));
        assert_eq!(clock.sleeps(), 2);
    }

    #[test]
    fn system_state_classification() {
        assert!(!classify_system_state("starting").is_terminal());
        assert!(!classify_system_state("initializing").is_terminal());
        assert!(classify_system_state("running").is_terminal());
        assert!(classify_system_state("degraded").is_terminal());
        assert!(classify_system_state("offline").is_terminal());
    }
}
