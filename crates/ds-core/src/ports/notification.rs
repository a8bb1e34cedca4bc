use crate::notice::Notice;

/// Fire-and-forget sink for short user-facing messages (toasts).
///
/// Write-only from the core's point of view: nothing is ever read back.
pub trait NotificationPort: Send + Sync {
    fn notify(&self, notice: Notice);
}
