//! Notification sinks.

use ds_core::notice::{Notice, NoticeLevel};
use ds_core::ports::NotificationPort;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Writes notices to the log. Used by headless front ends.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationPort for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => info!(target: "docshare::notice", "{}", notice.message),
            NoticeLevel::Error => warn!(target: "docshare::notice", "{}", notice.message),
        }
    }
}

/// Forwards notices to a UI task over an unbounded channel.
///
/// Notices sent after the receiver is gone are dropped.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationPort for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        if let Err(e) = self.tx.send(notice) {
            debug!(message = %e.0.message, "notice dropped; no receiver");
        }
    }
}
