use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    config::LoopCadence,
    db::{BlinkSample, SessionMetrics, UserPreferences},
    estimator::{Estimator, EstimatorEvent},
    notify::{dispatch, Notification, NotificationSink},
};

use super::{
    sink::MetricsSink,
    state::{SessionState, SessionSummary, TrackingSnapshot},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

/// Everything one tracking session needs. Moved into the spawned task and
/// handed back when the task exits so the controller can do the final write.
pub(crate) struct SessionLoop {
    session: SessionState,
    preferences: UserPreferences,
    cadence: LoopCadence,
    estimator: Box<dyn Estimator>,
    sink: Arc<dyn MetricsSink>,
    notifier: Arc<dyn NotificationSink>,
    snapshot: Arc<watch::Sender<TrackingSnapshot>>,
    last_refresh: Instant,
    last_drowsiness: Instant,
    last_persist: Instant,
    last_break_reminder: Instant,
    last_blink_reminder: Instant,
    samples_written: u64,
}

impl SessionLoop {
    pub(crate) fn new(
        session: SessionState,
        preferences: UserPreferences,
        cadence: LoopCadence,
        estimator: Box<dyn Estimator>,
        sink: Arc<dyn MetricsSink>,
        notifier: Arc<dyn NotificationSink>,
        snapshot: Arc<watch::Sender<TrackingSnapshot>>,
    ) -> Self {
        let start = session.started_instant;
        Self {
            session,
            preferences,
            cadence,
            estimator,
            sink,
            notifier,
            snapshot,
            last_refresh: start,
            last_drowsiness: start,
            last_persist: start,
            last_break_reminder: start,
            last_blink_reminder: start,
            samples_written: 0,
        }
    }

    /// Ticks every poll interval until `cancel_token` fires, then returns
    /// itself. A write in flight when cancellation lands is allowed to finish.
    pub(crate) async fn run(mut self, cancel_token: CancellationToken) -> Self {
        let mut ticker =
            tokio::time::interval_at(self.session.started_instant, self.cadence.poll());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log_info!("tracking loop started for session {}", self.session.session_id);

        loop {
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {
                    log_info!("tracking loop shutting down for session {}", self.session.session_id);
                    break;
                }
                tick = ticker.tick() => {
                    self.step(tick).await;
                }
            }
        }

        self
    }

    async fn step(&mut self, now: Instant) {
        if now.duration_since(self.last_refresh) >= self.cadence.refresh() {
            self.last_refresh = now;
            self.refresh_eyes();
        }

        if now.duration_since(self.last_drowsiness) >= self.cadence.drowsiness() {
            self.last_drowsiness = now;
            self.check_drowsiness(now);
            self.check_reminders(now);
        }

        if now.duration_since(self.last_persist) >= self.cadence.persist() {
            self.last_persist = now;
            self.persist(now).await;
        }
    }

    fn refresh_eyes(&mut self) {
        let previous = self.snapshot.borrow().clone();
        let estimate = self.estimator.estimate_eyes(&previous);
        self.snapshot.send_replace(previous.with_eyes(&estimate));
    }

    fn check_drowsiness(&mut self, now: Instant) {
        let previous = self.snapshot.borrow().clone();
        let estimate = self
            .estimator
            .estimate_drowsiness(&previous, self.session.elapsed_at(now));
        self.snapshot.send_replace(previous.with_drowsiness(&estimate));

        for event in estimate.events {
            match event {
                EstimatorEvent::DrowsinessDetected { level } => {
                    log_info!("drowsiness detected at level {level:.1}");
                    if self.preferences.drowsiness_detection_enabled {
                        dispatch(self.notifier.as_ref(), Notification::DrowsinessAlert);
                    }
                }
            }
        }
    }

    fn check_reminders(&mut self, now: Instant) {
        let break_interval =
            Duration::from_secs(u64::from(self.preferences.break_interval_minutes) * 60);
        if self.preferences.break_reminder_enabled
            && now.duration_since(self.last_break_reminder) >= break_interval
        {
            self.last_break_reminder = now;
            dispatch(self.notifier.as_ref(), Notification::BreakReminder);
        }

        let blink_is_low = {
            let snapshot = self.snapshot.borrow();
            snapshot.eyes_detected
                && snapshot.blink_rate < f64::from(self.preferences.min_healthy_blink_rate)
        };
        if self.preferences.blink_reminder_enabled
            && blink_is_low
            && now.duration_since(self.last_blink_reminder)
                >= self.cadence.blink_reminder_cooldown()
        {
            self.last_blink_reminder = now;
            dispatch(self.notifier.as_ref(), Notification::BlinkReminder);
        }
    }

    /// Writes one blink sample and one metrics row from the current snapshot.
    /// Failures are logged; the session keeps running.
    pub(crate) async fn persist(&mut self, now: Instant) {
        if !self.preferences.data_collection_enabled {
            log_debug!("data collection disabled, skipping write");
            return;
        }

        let snapshot = self.snapshot.borrow().clone();
        let (blink, metrics) = self.build_rows(&snapshot, now);

        match self.sink.persist(&blink, &metrics).await {
            Ok(()) => {
                self.samples_written += 1;
                log_debug!(
                    "persisted sample {} for session {}",
                    self.samples_written,
                    self.session.session_id
                );
            }
            Err(err) => log_error!(
                "failed to persist metrics for session {}: {err:?}",
                self.session.session_id
            ),
        }
    }

    fn build_rows(
        &mut self,
        snapshot: &TrackingSnapshot,
        now: Instant,
    ) -> (BlinkSample, SessionMetrics) {
        let timestamp = self.session.stamp(now, Utc::now());
        let session_id = &self.session.session_id;

        let blink = BlinkSample::new(session_id, timestamp, snapshot.blink_rate);
        let metrics = SessionMetrics {
            id: None,
            timestamp,
            blink_rate: snapshot.blink_rate,
            drowsiness_level: snapshot.drowsiness_level,
            session_duration_minutes: minutes(self.session.duration_until(timestamp)),
            drowsiness_detected: snapshot.is_drowsy,
            session_id: session_id.clone(),
            breaks_taken: 0,
            notes: String::new(),
        };
        (blink, metrics)
    }

    pub(crate) fn summary(&self, now: Instant) -> SessionSummary {
        let stopped_at = self.session.wall_clock_at(now, Utc::now());
        SessionSummary {
            session_id: self.session.session_id.clone(),
            started_at: self.session.started_at,
            stopped_at,
            duration_minutes: minutes(self.session.duration_until(stopped_at)),
            samples_written: self.samples_written,
        }
    }
}

fn minutes(duration: Duration) -> f64 {
    duration.as_secs_f64() / 60.0
}
