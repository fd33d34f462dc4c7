use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{bail, Context, Result};
use log::{info, warn};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::Instant,
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::LoopCadence,
    estimator::Estimator,
    notify::NotificationSink,
};

use super::{
    loop_worker::SessionLoop,
    sink::MetricsSink,
    state::{SessionInfo, SessionState, SessionSummary, TrackingSnapshot},
};

pub type EstimatorFactory = dyn Fn() -> Box<dyn Estimator> + Send + Sync;

struct ActiveSession {
    info: SessionInfo,
    cancel_token: CancellationToken,
    handle: JoinHandle<SessionLoop>,
}

/// Owns the one tracking session a host can run at a time.
#[derive(Clone)]
pub struct TrackingController {
    sink: Arc<dyn MetricsSink>,
    notifier: Arc<dyn NotificationSink>,
    estimator_factory: Arc<EstimatorFactory>,
    cadence: LoopCadence,
    camera_permission: Arc<AtomicBool>,
    active: Arc<Mutex<Option<ActiveSession>>>,
    snapshot: Arc<watch::Sender<TrackingSnapshot>>,
}

impl TrackingController {
    pub fn new<F>(
        sink: Arc<dyn MetricsSink>,
        notifier: Arc<dyn NotificationSink>,
        estimator_factory: F,
        cadence: LoopCadence,
    ) -> Self
    where
        F: Fn() -> Box<dyn Estimator> + Send + Sync + 'static,
    {
        let (snapshot, _) = watch::channel(TrackingSnapshot::default());
        Self {
            sink,
            notifier,
            estimator_factory: Arc::new(estimator_factory),
            cadence,
            camera_permission: Arc::new(AtomicBool::new(false)),
            active: Arc::new(Mutex::new(None)),
            snapshot: Arc::new(snapshot),
        }
    }

    pub fn set_camera_permission(&self, granted: bool) {
        self.camera_permission.store(granted, Ordering::SeqCst);
    }

    pub fn has_camera_permission(&self) -> bool {
        self.camera_permission.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackingSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> TrackingSnapshot {
        self.snapshot.borrow().clone()
    }

    pub async fn is_tracking(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Starts a session, or returns the running one unchanged.
    pub async fn start(&self) -> Result<SessionInfo> {
        let mut active = self.active.lock().await;
        if let Some(existing) = active.as_ref() {
            return Ok(existing.info.clone());
        }

        if !self.has_camera_permission() {
            bail!("camera permission has not been granted");
        }

        let preferences = match self.sink.preferences().await {
            Ok(preferences) => preferences,
            Err(err) => {
                warn!("falling back to default preferences: {err:?}");
                Default::default()
            }
        };

        let session = SessionState::begin();
        let info = SessionInfo::from(&session);

        self.snapshot
            .send_replace(TrackingSnapshot::default().with_tracking(true));

        let session_loop = SessionLoop::new(
            session,
            preferences,
            self.cadence,
            (self.estimator_factory)(),
            self.sink.clone(),
            self.notifier.clone(),
            self.snapshot.clone(),
        );

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(session_loop.run(cancel_token.clone()));

        info!("tracking session {} started", info.session_id);

        *active = Some(ActiveSession {
            info: info.clone(),
            cancel_token,
            handle,
        });

        Ok(info)
    }

    /// Stops the running session after one last write. Returns `None` when
    /// nothing was tracking.
    pub async fn stop(&self) -> Result<Option<SessionSummary>> {
        let mut active = self.active.lock().await;
        let Some(session) = active.take() else {
            return Ok(None);
        };

        session.cancel_token.cancel();
        let joined = session
            .handle
            .await
            .context("tracking loop task failed to join");

        let summary = match joined {
            Ok(mut session_loop) => {
                let now = Instant::now();
                session_loop.persist(now).await;
                Some(session_loop.summary(now))
            }
            Err(err) => {
                self.publish_idle();
                return Err(err);
            }
        };

        self.publish_idle();

        if let Some(summary) = &summary {
            info!(
                "tracking session {} stopped after {:.2} min, {} samples written",
                summary.session_id, summary.duration_minutes, summary.samples_written
            );
        }

        Ok(summary)
    }

    fn publish_idle(&self) {
        let idle = self.snapshot.borrow().with_tracking(false);
        self.snapshot.send_replace(idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::UserPreferences,
        estimator::{ScriptedRandom, SimulatedEstimator, StdRandom},
        notify::{testing::RecordingNotifier, Notification},
        tracking::sink::testing::RecordingSink,
    };
    use tokio::time::{sleep, Duration};

    fn controller_with(
        sink: RecordingSink,
        notifier: RecordingNotifier,
        cadence: LoopCadence,
    ) -> TrackingController {
        let controller = TrackingController::new(
            Arc::new(sink),
            Arc::new(notifier),
            || Box::new(SimulatedEstimator::new(StdRandom::seeded(7))) as Box<dyn Estimator>,
            cadence,
        );
        controller.set_camera_permission(true);
        controller
    }

    fn controller(sink: RecordingSink) -> TrackingController {
        controller_with(sink, RecordingNotifier::default(), LoopCadence::default())
    }

    /// Sleeps on the paused clock, then lets the loop task drain its tick.
    async fn advance(ms: u64) {
        sleep(Duration::from_millis(ms)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn persists_on_the_five_second_boundary() {
        let sink = RecordingSink::default();
        let controller = controller(sink.clone());
        controller.start().await.unwrap();

        advance(5_000).await;
        assert_eq!(sink.blinks().len(), 1);
        assert_eq!(sink.metrics().len(), 1);

        advance(4_999).await;
        assert_eq!(sink.blinks().len(), 1);
        assert_eq!(sink.metrics().len(), 1);

        advance(1).await;
        assert_eq!(sink.blinks().len(), 2);
        assert_eq!(sink.metrics().len(), 2);

        controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_idempotent_and_restart_gets_a_new_id() {
        let controller = controller(RecordingSink::default());

        let first = controller.start().await.unwrap();
        let again = controller.start().await.unwrap();
        assert_eq!(first, again);
        assert!(controller.snapshot().is_tracking);

        controller.stop().await.unwrap();
        assert!(!controller.snapshot().is_tracking);

        let second = controller.start().await.unwrap();
        assert_ne!(first.session_id, second.session_id);
        controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_without_start_is_a_no_op() {
        let sink = RecordingSink::default();
        let controller = controller(sink.clone());

        assert!(controller.stop().await.unwrap().is_none());
        assert!(sink.blinks().is_empty());
        assert!(sink.metrics().is_empty());
        assert!(!controller.snapshot().is_tracking);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_performs_a_final_write() {
        let sink = RecordingSink::default();
        let controller = controller(sink.clone());
        let info = controller.start().await.unwrap();

        advance(5_000).await;
        advance(1_200).await;
        let summary = controller.stop().await.unwrap().unwrap();

        assert_eq!(summary.session_id, info.session_id);
        assert_eq!(summary.samples_written, 2);
        assert!((summary.duration_minutes - 6.2 / 60.0).abs() < 1e-9);
        assert_eq!(sink.metrics().len(), 2);
        assert!(controller.stop().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn rows_carry_the_session_id_in_time_order() {
        let sink = RecordingSink::default();
        let controller = controller(sink.clone());
        let info = controller.start().await.unwrap();

        for _ in 0..4 {
            advance(5_000).await;
        }
        controller.stop().await.unwrap();

        let blinks = sink.blinks();
        let metrics = sink.metrics();
        assert_eq!(blinks.len(), 5);
        assert!(blinks.iter().all(|b| b.session_id == info.session_id));
        assert!(metrics.iter().all(|m| m.session_id == info.session_id));
        assert!(blinks.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(metrics
            .windows(2)
            .all(|w| w[0].session_duration_minutes <= w[1].session_duration_minutes));
        assert!(blinks
            .iter()
            .all(|b| b.is_low_rate == (b.blink_rate < 10.0) && b.blink_duration_ms == 200.0));
    }

    #[tokio::test(start_paused = true)]
    async fn refuses_to_start_without_camera_permission() {
        let controller = controller(RecordingSink::default());
        controller.set_camera_permission(false);

        assert!(controller.start().await.is_err());
        assert!(!controller.is_tracking().await);
        assert!(!controller.snapshot().is_tracking);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_writes_do_not_end_the_session() {
        let sink = RecordingSink::default();
        sink.fail_next(1);
        let controller = controller(sink.clone());
        controller.start().await.unwrap();

        advance(5_000).await;
        assert!(sink.blinks().is_empty());
        assert!(controller.is_tracking().await);

        advance(5_000).await;
        assert_eq!(sink.blinks().len(), 1);

        let summary = controller.stop().await.unwrap().unwrap();
        assert_eq!(summary.samples_written, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn data_collection_off_writes_nothing() {
        let sink = RecordingSink::with_preferences(UserPreferences {
            data_collection_enabled: false,
            ..UserPreferences::default()
        });
        let controller = controller(sink.clone());
        controller.start().await.unwrap();

        advance(15_000).await;
        let summary = controller.stop().await.unwrap().unwrap();

        assert_eq!(summary.samples_written, 0);
        assert!(sink.metrics().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_updates_are_broadcast() {
        let controller = controller(RecordingSink::default());
        let mut rx = controller.subscribe();
        controller.start().await.unwrap();

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_tracking);

        advance(100).await;
        assert!(rx.has_changed().unwrap());
        controller.stop().await.unwrap();
        assert!(!rx.borrow().is_tracking);
    }

    #[tokio::test(start_paused = true)]
    async fn drowsiness_alerts_follow_preferences() {
        // noise 0.5, spike chance 0.0, spike value 0.5 on every evaluation
        let estimator = || {
            Box::new(SimulatedEstimator::new(ScriptedRandom::new(vec![0.5, 0.0, 0.5])))
                as Box<dyn Estimator>
        };

        let notifier = RecordingNotifier::default();
        let controller = TrackingController::new(
            Arc::new(RecordingSink::default()),
            Arc::new(notifier.clone()),
            estimator,
            LoopCadence::default(),
        );
        controller.set_camera_permission(true);
        controller.start().await.unwrap();
        advance(150_000).await;
        controller.stop().await.unwrap();
        assert!(notifier.sent().contains(&Notification::DrowsinessAlert));

        let muted = RecordingNotifier::default();
        let controller = TrackingController::new(
            Arc::new(RecordingSink::with_preferences(UserPreferences {
                drowsiness_detection_enabled: false,
                ..UserPreferences::default()
            })),
            Arc::new(muted.clone()),
            estimator,
            LoopCadence::default(),
        );
        controller.set_camera_permission(true);
        controller.start().await.unwrap();
        advance(150_000).await;
        controller.stop().await.unwrap();
        assert!(!muted.sent().contains(&Notification::DrowsinessAlert));
    }

    #[tokio::test(start_paused = true)]
    async fn break_reminder_fires_on_the_configured_interval() {
        let notifier = RecordingNotifier::default();
        let sink = RecordingSink::with_preferences(UserPreferences {
            break_interval_minutes: 1,
            blink_reminder_enabled: false,
            ..UserPreferences::default()
        });
        let controller = controller_with(sink, notifier.clone(), LoopCadence::default());
        controller.start().await.unwrap();

        advance(59_000).await;
        assert!(!notifier.sent().contains(&Notification::BreakReminder));

        advance(1_500).await;
        let reminders = notifier
            .sent()
            .into_iter()
            .filter(|n| *n == Notification::BreakReminder)
            .count();
        assert_eq!(reminders, 1);
        controller.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn failing_notifier_does_not_stop_tracking() {
        let sink = RecordingSink::with_preferences(UserPreferences {
            break_interval_minutes: 1,
            ..UserPreferences::default()
        });
        let controller =
            controller_with(sink.clone(), RecordingNotifier::failing(), LoopCadence::default());
        controller.start().await.unwrap();

        advance(65_000).await;
        assert!(controller.is_tracking().await);
        assert_eq!(sink.metrics().len(), 13);
        controller.stop().await.unwrap();
    }
}
