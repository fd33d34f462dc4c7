use anyhow::Result;
use log::{info, warn};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Notification {
    DrowsinessAlert,
    BlinkReminder,
    BreakReminder,
}

impl Notification {
    pub fn title(self) -> &'static str {
        match self {
            Notification::DrowsinessAlert => "Drowsiness detected",
            Notification::BlinkReminder => "Time to blink",
            Notification::BreakReminder => "Time for a break",
        }
    }

    pub fn body(self) -> &'static str {
        match self {
            Notification::DrowsinessAlert => {
                "You seem drowsy. Consider taking a short break or getting some fresh air."
            }
            Notification::BlinkReminder => {
                "Your blink rate is low. Blink a few times to keep your eyes moist."
            }
            Notification::BreakReminder => {
                "Look at something 20 feet away for 20 seconds to rest your eyes."
            }
        }
    }
}

/// Destination for user-facing alerts.
pub trait NotificationSink: Send + Sync + 'static {
    fn notify(&self, notification: Notification) -> Result<()>;
}

/// Writes notifications to the log. Used when no platform notifier exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, notification: Notification) -> Result<()> {
        info!("[notification] {}: {}", notification.title(), notification.body());
        Ok(())
    }
}

/// Best-effort delivery: a failing sink is logged and otherwise ignored.
pub fn dispatch(sink: &dyn NotificationSink, notification: Notification) {
    if let Err(err) = sink.notify(notification) {
        warn!("failed to deliver {:?} notification: {err:?}", notification);
    }
}
