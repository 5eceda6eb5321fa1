//! Probes for asynchronous completion handlers.

use std::time::Duration;

use tokio::sync::oneshot;

/// Captures the value passed to a fire-and-forget completion handler.
#[derive(Debug)]
pub struct CompletionProbe<T> {
    receiver: oneshot::Receiver<T>,
}

impl<T: Send + 'static> CompletionProbe<T> {
    /// Create a probe and the handler to pass to the call under test.
    #[must_use]
    pub fn channel() -> (Self, impl FnOnce(T) + Send + 'static) {
        let (sender, receiver) = oneshot::channel();
        let handler = move |value: T| {
            let _ = sender.send(value);
        };
        (Self { receiver }, handler)
    }

    /// Wait for the handler to run, up to `timeout`.
    ///
    /// Returns `None` if it did not run in time or was dropped unrun.
    pub async fn wait(self, timeout: Duration) -> Option<T> {
        tokio::time::timeout(timeout, self.receiver).await.ok()?.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_receives_value() {
        let (probe, handler) = CompletionProbe::channel();
        tokio::spawn(async move { handler(42) });
        assert_eq!(probe.wait(Duration::from_secs(1)).await, Some(42));
    }

    #[tokio::test]
    async fn test_probe_times_out() {
        let (probe, handler) = CompletionProbe::<u8>::channel();
        let _keep = handler;
        assert_eq!(probe.wait(Duration::from_millis(10)).await, None);
    }
}
