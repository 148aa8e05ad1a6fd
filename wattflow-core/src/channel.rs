//! Local channels between pipeline stages.
//!
//! Uses crossbeam-channel for bounded, backpressure-aware communication
//! between the ingress thread and the partition workers.

use anyhow::{Result, anyhow};
use crossbeam_channel::{Receiver, Sender, bounded};

use crate::types::StreamElement;

/// Sender side of a local channel.
pub struct LocalChannelSender<T> {
    sender: Sender<StreamElement<T>>,
}

impl<T> LocalChannelSender<T> {
    /// Send a stream element to the channel.
    ///
    /// Blocks if the channel is full (backpressure).
    pub fn send(&self, element: StreamElement<T>) -> Result<()> {
        self.sender
            .send(element)
            .map_err(|_| anyhow!("Channel closed: receiver dropped"))
    }
}

/// Receiver side of a local channel.
pub struct LocalChannelReceiver<T> {
    receiver: Receiver<StreamElement<T>>,
}

impl<T> LocalChannelReceiver<T> {
    /// Receive the next stream element from the channel.
    ///
    /// Blocks until an element is available.
    pub fn recv(&self) -> Result<StreamElement<T>> {
        self.receiver
            .recv()
            .map_err(|_| anyhow!("Channel closed: sender dropped"))
    }
}

/// Create a bounded local channel pair.
///
/// # Backpressure
/// When the channel is full, `send()` blocks until space is available, so a
/// slow partition throttles ingress instead of buffering without bound.
pub fn local_channel<T>(capacity: usize) -> (LocalChannelSender<T>, LocalChannelReceiver<T>) {
    let (sender, receiver) = bounded(capacity);
    (
        LocalChannelSender { sender },
        LocalChannelReceiver { receiver },
    )
}
