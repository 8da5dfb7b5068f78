//! Best-effort progress channel between the optimizer and an observer.

use bt_types::ProgressEvent;
use crossbeam_channel::{Receiver, RecvError, Sender, TryRecvError, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Create a bounded progress channel.
///
/// Publishing never blocks: events that do not fit are dropped.
pub fn progress_channel(capacity: usize) -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (ProgressSender::new(tx), ProgressReceiver { rx })
}

/// Producer half, held by the run configuration.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: Sender<ProgressEvent>,
    dropped: Arc<AtomicU64>,
}

impl ProgressSender {
    /// Wrap an existing crossbeam sender.
    pub fn new(tx: Sender<ProgressEvent>) -> Self {
        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Enqueue without blocking. Returns `false` if the event was dropped.
    pub fn publish(&self, event: ProgressEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                trace!(phase = %event.phase, iteration = event.current_iteration, "progress channel full, event dropped");
                false
            }
            Err(TrySendError::Disconnected(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                trace!(phase = %event.phase, iteration = event.current_iteration, "progress receiver gone, event dropped");
                false
            }
        }
    }

    /// Events dropped so far across all clones of this sender.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn capacity(&self) -> Option<usize> {
        self.tx.capacity()
    }
}

impl From<Sender<ProgressEvent>> for ProgressSender {
    fn from(tx: Sender<ProgressEvent>) -> Self {
        Self::new(tx)
    }
}

/// Consumer half, read by an independently scheduled observer.
#[derive(Debug, Clone)]
pub struct ProgressReceiver {
    rx: Receiver<ProgressEvent>,
}

impl ProgressReceiver {
    /// Block until an event arrives or every sender is gone.
    pub fn recv(&self) -> Result<ProgressEvent, RecvError> {
        self.rx.recv()
    }

    pub fn try_recv(&self) -> Result<ProgressEvent, TryRecvError> {
        self.rx.try_recv()
    }

    /// Blocking iterator that ends once every sender is dropped.
    pub fn iter(&self) -> impl Iterator<Item = ProgressEvent> + '_ {
        self.rx.iter()
    }

    /// Drain the events currently queued.
    pub fn try_iter(&self) -> impl Iterator<Item = ProgressEvent> + '_ {
        self.rx.try_iter()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bt_types::Phase;
    use chrono::Utc;
    use uuid::Uuid;

    fn event(iteration: usize) -> ProgressEvent {
        ProgressEvent {
            run_id: Uuid::new_v4(),
            phase: Phase::InitialSampling,
            current_iteration: iteration,
            total_iterations: 10,
            current_params: vec![1.0],
            best_params_so_far: vec![1.0],
            best_cost_so_far: 1.0,
            last_cost: 1.0,
            improved: false,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn publish_drops_when_full() {
        let (tx, rx) = progress_channel(2);
        assert_eq!(tx.capacity(), Some(2));
        assert!(tx.publish(event(1)));
        assert!(tx.publish(event(2)));
        assert!(!tx.publish(event(3)));
        assert_eq!(tx.dropped(), 1);

        let received: Vec<usize> = rx.try_iter().map(|e| e.current_iteration).collect();
        assert_eq!(received, vec![1, 2]);
        assert!(rx.is_empty());
    }

    #[test]
    fn publish_drops_when_receiver_gone() {
        let (tx, rx) = progress_channel(4);
        drop(rx);
        assert!(!tx.publish(event(1)));
        assert_eq!(tx.dropped(), 1);
    }

    #[test]
    fn clones_share_drop_counter() {
        let (tx, _rx) = progress_channel(0);
        let other = tx.clone();
        tx.publish(event(1));
        other.publish(event(2));
        assert_eq!(tx.dropped(), 2);
        assert_eq!(other.dropped(), 2);
    }

    #[test]
    fn receiver_iter_ends_when_senders_drop() {
        let (tx, rx) = progress_channel(8);
        let consumer = std::thread::spawn(move || rx.iter().count());
        for i in 1..=5 {
            tx.publish(event(i));
        }
        drop(tx);
        assert_eq!(consumer.join().unwrap(), 5);
    }

    #[test]
    fn wraps_external_sender() {
        let (raw_tx, raw_rx) = crossbeam_channel::bounded(1);
        let tx = ProgressSender::from(raw_tx);
        assert!(tx.publish(event(1)));
        assert_eq!(raw_rx.recv().unwrap().current_iteration, 1);
    }
}
