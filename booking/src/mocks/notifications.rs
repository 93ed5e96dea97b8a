//! Recording notification dispatcher.

use crate::providers::{Notification, NotificationDispatcher};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Dispatcher that records everything it is asked to deliver.
#[derive(Clone, Default)]
pub struct RecordingDispatcher {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingDispatcher {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything dispatched so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("dispatcher lock").clone()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn dispatch(
        &self,
        notification: Notification,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<(), String>> + Send>> {
        let sent = Arc::clone(&self.sent);
        Box::pin(async move {
            #[allow(clippy::expect_used)]
            sent.lock().expect("dispatcher lock").push(notification);
            Ok(())
        })
    }
}
