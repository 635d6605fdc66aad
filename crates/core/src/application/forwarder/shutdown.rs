// Shutdown signalling for background tasks (forwarder, expiry sweeper)

use tokio::sync::watch;

/// Receiving side; cheap to clone, one per background task
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested (immediately if it already was)
    ///
    /// Also resolves if the sender is dropped.
    pub async fn wait(&mut self) {
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn token(&self) -> ShutdownToken {
        ShutdownToken {
            rx: self.tx.subscribe(),
        }
    }
}

pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_returns_after_shutdown() {
        let (tx, mut token) = shutdown_channel();
        assert!(!token.is_shutdown());

        tx.shutdown();
        assert!(token.is_shutdown());

        // Waiting twice must not hang once the flag is set
        tokio::time::timeout(Duration::from_millis(100), token.wait())
            .await
            .unwrap();
        tokio::time::timeout(Duration::from_millis(100), token.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_subscribed_token_sees_shutdown() {
        let (tx, _token) = shutdown_channel();
        let mut late = tx.token();
        tx.shutdown();
        tokio::time::timeout(Duration::from_millis(100), late.wait())
            .await
            .unwrap();
    }
}
