//! Presence debounce and the sensor poll loop.
//!
//! Raw motion-sensor presence flickers. Only absence that lasts longer
//! than the hold threshold is reported, once per absence episode, and a
//! return to presence is reported only if that absence was reported.
//!
//! ## Transitions (evaluated in order against `(last, current)`)
//!
//! | last  | current | condition                           | effect                          |
//! |-------|---------|-------------------------------------|---------------------------------|
//! | true  | false   |                                     | start absence clock, clear sent |
//! | false | false   | not sent, absent longer than hold   | emit `false`, mark sent         |
//! | false | true    | sent                                | emit `true`, clear sent         |
//! | *     | *       | otherwise                           | nothing                         |

use std::future::Future;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::{Instant, MissedTickBehavior};

use crate::app::ports::PresenceSensor;

/// Edge detector with a hold time on the falling edge.
#[derive(Debug, Clone)]
pub struct PresenceDebouncer {
    hold: Duration,
    last_presence: bool,
    last_false_at: Instant,
    false_event_sent: bool,
}

impl PresenceDebouncer {
    /// Starts as "absent since `now`", nothing reported yet.
    pub fn new(hold: Duration, now: Instant) -> Self {
        Self {
            hold,
            last_presence: false,
            last_false_at: now,
            false_event_sent: false,
        }
    }

    /// Feed one reading. Returns the presence value to report, if any.
    pub fn update(&mut self, present: bool, now: Instant) -> Option<bool> {
        let event = match (self.last_presence, present) {
            (true, false) => {
                self.last_false_at = now;
                self.false_event_sent = false;
                None
            }
            (false, false)
                if !self.false_event_sent
                    && now.saturating_duration_since(self.last_false_at) > self.hold =>
            {
                self.false_event_sent = true;
                Some(false)
            }
            (false, true) if self.false_event_sent => {
                self.false_event_sent = false;
                Some(true)
            }
            _ => None,
        };
        self.last_presence = present;
        event
    }

    pub fn last_presence(&self) -> bool {
        self.last_presence
    }

    /// Whether the current absence episode has already been reported.
    pub fn absence_reported(&self) -> bool {
        self.false_event_sent
    }
}

/// Polls a [`PresenceSensor`] and feeds the debouncer.
pub struct PresenceMonitor<S> {
    sensor: S,
    debouncer: PresenceDebouncer,
    interval: Duration,
}

impl<S: PresenceSensor> PresenceMonitor<S> {
    pub fn new(sensor: S, hold: Duration, interval: Duration) -> Self {
        Self {
            sensor,
            debouncer: PresenceDebouncer::new(hold, Instant::now()),
            interval,
        }
    }

    /// One poll tick. Fetch failures keep the previous state and report nothing.
    pub async fn poll_once(&mut self) -> Option<bool> {
        match self.sensor.fetch().await {
            Ok(present) => {
                debug!("Presence reading: {}", present);
                self.debouncer.update(present, Instant::now())
            }
            Err(e) => {
                warn!("Presence poll skipped: {}", e);
                None
            }
        }
    }

    /// Poll forever, invoking `on_change` for every debounced edge.
    ///
    /// The sensor fetch runs outside any lock `on_change` may take.
    pub async fn run<F, Fut>(mut self, mut on_change: F)
    where
        F: FnMut(bool) -> Fut,
        Fut: Future<Output = ()>,
    {
        info!(
            "Presence monitor polling every {:?}, hold {:?}",
            self.interval, self.debouncer.hold
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Some(present) = self.poll_once().await {
                info!("Presence changed: {}", present);
                on_change(present).await;
            }
        }
    }

    pub fn debouncer(&self) -> &PresenceDebouncer {
        &self.debouncer
    }
}
