//! One-shot recovery barrier.
//!
//! The serialized context owns the [`RecoveryGate`] and opens it once the
//! startup load is registered. API callers hold [`RecoveryWaiter`]s and await
//! the opening before they touch shared state. The gate never closes again.

use tokio::sync::watch;

use crate::error::EngineError;

pub(crate) struct RecoveryGate {
    tx: watch::Sender<bool>,
}

#[derive(Clone)]
pub(crate) struct RecoveryWaiter {
    rx: watch::Receiver<bool>,
}

impl RecoveryGate {
    pub(crate) fn new() -> (RecoveryGate, RecoveryWaiter) {
        let (tx, rx) = watch::channel(false);
        (RecoveryGate { tx }, RecoveryWaiter { rx })
    }

    pub(crate) fn open(&self) {
        self.tx.send_replace(true);
    }

    pub(crate) fn is_open(&self) -> bool {
        *self.tx.borrow()
    }
}

impl RecoveryWaiter {
    /// Resolve once recovery completed. Fails if the gate was dropped without
    /// opening (the serialized context is gone).
    pub(crate) async fn wait(&self) -> Result<(), EngineError> {
        let mut rx = self.rx.clone();
        rx.wait_for(|open| *open)
            .await
            .map(|_| ())
            .map_err(|_| EngineError::Closed)
    }

    pub(crate) fn is_open(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn waiters_block_until_open() {
        let (gate, waiter) = RecoveryGate::new();
        assert!(!gate.is_open());
        assert!(!waiter.is_open());

        let pending = tokio::time::timeout(Duration::from_millis(20), waiter.wait()).await;
        assert!(pending.is_err(), "wait must not resolve before open");

        let early = waiter.clone();
        let task = tokio::spawn(async move { early.wait().await });
        gate.open();
        task.await.unwrap().unwrap();
        assert!(waiter.is_open());

        // Stays open; later waiters return immediately.
        waiter.wait().await.unwrap();
        gate.open();
        assert!(gate.is_open());
    }

    #[tokio::test]
    async fn dropped_gate_reports_closed() {
        let (gate, waiter) = RecoveryGate::new();
        drop(gate);
        assert!(matches!(waiter.wait().await, Err(EngineError::Closed)));
    }

    #[tokio::test]
    async fn dropped_gate_after_open_still_reports_open() {
        let (gate, waiter) = RecoveryGate::new();
        gate.open();
        drop(gate);
        waiter.wait().await.unwrap();
    }
}
