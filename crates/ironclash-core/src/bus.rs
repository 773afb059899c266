//! Publish/subscribe transport for command envelopes.
//!
//! Delivery contract: every published envelope reaches every subscriber, the publisher's
//! own subscription included, in a single total order. Instances must therefore drop
//! their own echoes by origin.

use std::sync::Arc;

use ironclash_protocol::Envelope;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::trace;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus closed")]
    Closed,
    #[error("subscriber lagged, {0} envelopes skipped")]
    Lagged(u64),
    #[error("publish failed: {0}")]
    Publish(String),
}

pub trait CommandBus: Send + Sync {
    fn publish(&self, envelope: Envelope) -> Result<(), BusError>;
    fn subscribe(&self) -> broadcast::Receiver<Envelope>;
}

impl<B: CommandBus + ?Sized> CommandBus for Arc<B> {
    fn publish(&self, envelope: Envelope) -> Result<(), BusError> {
        (**self).publish(envelope)
    }

    fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        (**self).subscribe()
    }
}

/// In-process bus backed by a `tokio::sync::broadcast` channel.
#[derive(Clone, Debug)]
pub struct LocalBus {
    tx: broadcast::Sender<Envelope>,
}

impl LocalBus {
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl CommandBus for LocalBus {
    fn publish(&self, envelope: Envelope) -> Result<(), BusError> {
        if self.tx.send(envelope).is_err() {
            // Nobody listening; nothing to deliver.
            trace!("published with no subscribers");
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }
}

/// Non-blocking receive: `Ok(None)` when the queue is currently empty.
pub fn try_next(rx: &mut broadcast::Receiver<Envelope>) -> Result<Option<Envelope>, BusError> {
    match rx.try_recv() {
        Ok(envelope) => Ok(Some(envelope)),
        Err(broadcast::error::TryRecvError::Empty) => Ok(None),
        Err(broadcast::error::TryRecvError::Closed) => Err(BusError::Closed),
        Err(broadcast::error::TryRecvError::Lagged(n)) => Err(BusError::Lagged(n)),
    }
}
