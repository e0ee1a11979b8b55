//! Countdown primitives reconciling server-issued deadlines with the local
//! clock.
//!
//! Both timers publish integer remaining seconds through a [`watch`] channel
//! and only write on value transitions, so consumers pay rendering cost
//! exactly once per visible change. A single driver task per timer owns the
//! tick loop; replacing the input is a watch write the driver observes at
//! its next suspension point, which retires the old target without racing
//! it. Dropping a timer aborts its driver.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tokio_stream::wrappers::WatchStream;

/// Tick cadence while a countdown is running.
const TICK: Duration = Duration::from_millis(100);

/// Default turn length.
pub const DEFAULT_TURN_DURATION: Duration = Duration::from_secs(30);

type WallClock = fn() -> i64;

/// Current wall-clock time in epoch milliseconds.
fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

fn floor_secs(remaining: Duration) -> u64 {
    remaining.as_millis() as u64 / 1_000
}

fn ceil_secs(remaining: Duration) -> u64 {
    (remaining.as_millis() as u64).div_ceil(1_000)
}

/// Monotonic instant lying `ms` milliseconds in the future (clamped to now).
fn instant_after_ms(ms: i64) -> Instant {
    if ms <= 0 {
        Instant::now()
    } else {
        Instant::now() + Duration::from_millis(ms as u64)
    }
}

/// Countdown to an absolute, server-issued phase deadline.
///
/// Remaining seconds are `max(0, floor((deadline - (now + offset)) / 1000))`.
/// A missing or zero deadline is a valid steady state: remaining is 0 and no
/// tick loop runs.
pub struct PhaseCountdown {
    input: watch::Sender<Option<Instant>>,
    remaining: watch::Receiver<u64>,
    driver: JoinHandle<()>,
    wall_clock: WallClock,
}

impl PhaseCountdown {
    /// Create an idle countdown showing 0 remaining seconds.
    pub fn new() -> Self {
        Self::with_wall_clock(now_unix_ms)
    }

    fn with_wall_clock(wall_clock: WallClock) -> Self {
        let (input_tx, input_rx) = watch::channel(None);
        let (remaining_tx, remaining_rx) = watch::channel(0);
        let driver = tokio::spawn(drive(input_rx, remaining_tx, 0, floor_secs));

        Self {
            input: input_tx,
            remaining: remaining_rx,
            driver,
            wall_clock,
        }
    }

    /// Replace the deadline, restarting the tick loop against the new target.
    ///
    /// `clock_offset_ms` is the externally measured server-minus-local clock
    /// delta; it corrects the deadline into local time before the remaining
    /// value is computed. The wall clock is consulted only here; after that
    /// the loop runs purely against the monotonic clock.
    pub fn set_deadline(&self, deadline_ms: Option<i64>, clock_offset_ms: i64) {
        let target = match deadline_ms {
            None | Some(0) => None,
            Some(deadline) => {
                let remaining = deadline - ((self.wall_clock)() + clock_offset_ms);
                Some(instant_after_ms(remaining))
            }
        };
        let _ = self.input.send(target);
    }

    /// Watch the remaining-seconds value.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.remaining.clone()
    }

    /// Remaining-seconds transitions as a stream, starting with the current
    /// value. Suits render loops that consume updates asynchronously.
    pub fn updates(&self) -> WatchStream<u64> {
        WatchStream::new(self.remaining.clone())
    }

    /// Current remaining seconds.
    pub fn remaining_secs(&self) -> u64 {
        *self.remaining.borrow()
    }
}

impl Default for PhaseCountdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PhaseCountdown {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

/// Countdown over a fixed turn duration from a server-issued start instant.
///
/// Remaining seconds are `max(0, ceil(duration - (now - turn_start)))`. A
/// missing start is a valid steady state: remaining resets to the full
/// duration and no tick loop runs.
pub struct TurnCountdown {
    input: watch::Sender<Option<Instant>>,
    remaining: watch::Receiver<u64>,
    duration: Duration,
    driver: JoinHandle<()>,
    wall_clock: WallClock,
}

impl TurnCountdown {
    /// Create an idle countdown for the default turn length.
    pub fn new() -> Self {
        Self::with_duration(DEFAULT_TURN_DURATION)
    }

    /// Create an idle countdown for a custom turn length.
    pub fn with_duration(duration: Duration) -> Self {
        Self::build(duration, now_unix_ms)
    }

    fn build(duration: Duration, wall_clock: WallClock) -> Self {
        let idle = ceil_secs(duration);
        let (input_tx, input_rx) = watch::channel(None);
        let (remaining_tx, remaining_rx) = watch::channel(idle);
        let driver = tokio::spawn(drive(input_rx, remaining_tx, idle, ceil_secs));

        Self {
            input: input_tx,
            remaining: remaining_rx,
            duration,
            driver,
            wall_clock,
        }
    }

    /// Replace the turn start, restarting the tick loop. `None` resets the
    /// display to the full duration immediately, regardless of prior state.
    pub fn set_turn_start(&self, turn_start_ms: Option<i64>) {
        let target = turn_start_ms.map(|start| {
            let elapsed = (self.wall_clock)() - start;
            instant_after_ms(self.duration.as_millis() as i64 - elapsed)
        });
        let _ = self.input.send(target);
    }

    /// Watch the remaining-seconds value.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.remaining.clone()
    }

    /// Remaining-seconds transitions as a stream, starting with the current
    /// value.
    pub fn updates(&self) -> WatchStream<u64> {
        WatchStream::new(self.remaining.clone())
    }

    /// Current remaining seconds.
    pub fn remaining_secs(&self) -> u64 {
        *self.remaining.borrow()
    }
}

impl Default for TurnCountdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TurnCountdown {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

/// Tick loop shared by both countdown variants.
///
/// While a target is set and unexpired: recompute remaining on each tick and
/// publish only integer-second transitions. With no target, or once zero is
/// reached, the loop parks until the input changes, so an idle timer
/// schedules nothing.
async fn drive(
    mut input: watch::Receiver<Option<Instant>>,
    output: watch::Sender<u64>,
    idle_value: u64,
    to_secs: fn(Duration) -> u64,
) {
    loop {
        let target = *input.borrow_and_update();
        loop {
            let secs = match target {
                Some(target) => to_secs(target.saturating_duration_since(Instant::now())),
                None => idle_value,
            };
            output.send_if_modified(|current| {
                if *current != secs {
                    *current = secs;
                    true
                } else {
                    false
                }
            });

            if target.is_none() || secs == 0 {
                match input.changed().await {
                    Ok(()) => break,
                    Err(_) => return,
                }
            }

            tokio::select! {
                changed = input.changed() => match changed {
                    Ok(()) => break,
                    Err(_) => return,
                },
                _ = sleep(TICK) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    const FROZEN_NOW_MS: i64 = 1_700_000_000_000;

    fn frozen_now() -> i64 {
        FROZEN_NOW_MS
    }

    async fn next_value(rx: &mut watch::Receiver<u64>) -> u64 {
        rx.changed().await.expect("countdown driver alive");
        *rx.borrow()
    }

    async fn assert_idle(rx: &mut watch::Receiver<u64>) {
        let outcome = timeout(Duration::from_secs(5), rx.changed()).await;
        assert!(outcome.is_err(), "expected no further transitions");
    }

    #[tokio::test(start_paused = true)]
    async fn phase_countdown_emits_each_second_once() {
        let countdown = PhaseCountdown::with_wall_clock(frozen_now);
        let mut rx = countdown.subscribe();

        countdown.set_deadline(Some(FROZEN_NOW_MS + 5_000), 0);

        let mut values = Vec::new();
        for _ in 0..6 {
            values.push(next_value(&mut rx).await);
        }
        assert_eq!(values, vec![5, 4, 3, 2, 1, 0]);

        // The loop stops scheduling once zero is reached.
        assert_idle(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn phase_countdown_applies_clock_offset() {
        let countdown = PhaseCountdown::with_wall_clock(frozen_now);
        let mut rx = countdown.subscribe();

        // Deadline 7s out on the server clock, but the local clock runs 2s
        // behind the server: only 5s remain locally.
        countdown.set_deadline(Some(FROZEN_NOW_MS + 7_000), 2_000);
        assert_eq!(next_value(&mut rx).await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_or_zero_deadline_is_steady_zero() {
        let countdown = PhaseCountdown::with_wall_clock(frozen_now);
        let mut rx = countdown.subscribe();

        countdown.set_deadline(None, 0);
        assert_eq!(countdown.remaining_secs(), 0);
        assert_idle(&mut rx).await;

        countdown.set_deadline(Some(0), 0);
        assert_eq!(countdown.remaining_secs(), 0);
        assert_idle(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_the_deadline_restarts_the_loop() {
        let countdown = PhaseCountdown::with_wall_clock(frozen_now);
        let mut rx = countdown.subscribe();

        countdown.set_deadline(Some(FROZEN_NOW_MS + 5_000), 0);
        assert_eq!(next_value(&mut rx).await, 5);

        countdown.set_deadline(Some(FROZEN_NOW_MS + 10_000), 0);
        assert_eq!(next_value(&mut rx).await, 10);
        assert_eq!(next_value(&mut rx).await, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_deadline_shows_zero_without_looping() {
        let countdown = PhaseCountdown::with_wall_clock(frozen_now);
        let mut rx = countdown.subscribe();

        countdown.set_deadline(Some(FROZEN_NOW_MS + 5_000), 0);
        assert_eq!(next_value(&mut rx).await, 5);

        countdown.set_deadline(Some(FROZEN_NOW_MS - 1_000), 0);
        assert_eq!(next_value(&mut rx).await, 0);
        assert_idle(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn turn_countdown_counts_down_and_stops() {
        let countdown = TurnCountdown::build(Duration::from_secs(3), frozen_now);
        let mut rx = countdown.subscribe();
        assert_eq!(countdown.remaining_secs(), 3);

        countdown.set_turn_start(Some(FROZEN_NOW_MS));

        assert_eq!(next_value(&mut rx).await, 2);
        assert_eq!(next_value(&mut rx).await, 1);
        assert_eq!(next_value(&mut rx).await, 0);
        assert_idle(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_turn_start_resets_to_full_duration() {
        let countdown = TurnCountdown::build(Duration::from_secs(3), frozen_now);
        let mut rx = countdown.subscribe();

        // A start far in the past pins the display at zero.
        countdown.set_turn_start(Some(FROZEN_NOW_MS - 10_000));
        assert_eq!(next_value(&mut rx).await, 0);

        countdown.set_turn_start(None);
        assert_eq!(next_value(&mut rx).await, 3);
        assert_idle(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn default_turn_duration_is_thirty_seconds() {
        let countdown = TurnCountdown::new();
        assert_eq!(countdown.remaining_secs(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn updates_stream_yields_the_transition_sequence() {
        use futures::StreamExt;

        let countdown = PhaseCountdown::with_wall_clock(frozen_now);
        let mut updates = countdown.updates();

        // WatchStream leads with the current value.
        assert_eq!(updates.next().await, Some(0));

        countdown.set_deadline(Some(FROZEN_NOW_MS + 3_000), 0);
        let mut values = Vec::new();
        for _ in 0..4 {
            values.push(updates.next().await.expect("driver alive"));
        }
        assert_eq!(values, vec![3, 2, 1, 0]);
    }
}
