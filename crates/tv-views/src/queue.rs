//! The dashboard's interaction queue

use tokio::sync::mpsc;
use tv_core::InteractionEvent;

/// Create a connected sink and queue
pub fn event_queue() -> (EventSink, EventQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, EventQueue { rx })
}

/// Cloneable producer side. Lenses and controls push events here.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<InteractionEvent>,
}

impl EventSink {
    /// Enqueue an event. Returns false once the dashboard has gone away.
    pub fn send(&self, event: InteractionEvent) -> bool {
        let label = event.label();
        match self.tx.send(event) {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(event = label, "Dropping interaction, dashboard queue is closed");
                false
            }
        }
    }
}

/// Consumer side, drained one event at a time in arrival order
#[derive(Debug)]
pub struct EventQueue {
    rx: mpsc::UnboundedReceiver<InteractionEvent>,
}

impl EventQueue {
    /// Wait for the next event. `None` once every sink is dropped.
    pub async fn recv(&mut self) -> Option<InteractionEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already queued
    pub fn try_recv(&mut self) -> Option<InteractionEvent> {
        self.rx.try_recv().ok()
    }
}
