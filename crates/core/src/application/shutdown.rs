// Stop signal for the flush scheduler and the audit writer

use tokio::sync::watch;

/// Receiving half held by each background task.
///
/// Once raised the signal stays raised, so a task that starts waiting late
/// still returns at once. Dropping the sender counts as a stop as well.
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    pub async fn wait(&mut self) {
        // Err means the sender is gone, which is treated the same as a stop
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Raise the stop signal for every token, including ones cloned later
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }
}

pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}
