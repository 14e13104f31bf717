//! Control thread ↔ audio thread plumbing.
//!
//! Parameter updates travel one way over a bounded lock-free queue and are
//! drained by the audio thread at block boundaries, never mid-sample. Frame
//! markers travel back the other way; dropping one is harmless.
//!
//! Only the sending side logs. The audio side uses `try_recv`/`try_send`
//! exclusively and never blocks.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, warn};

use crate::backend::SidBackend;
use crate::sid::ParameterUpdate;
use crate::{Result, SidError};

/// Message delivered to the audio thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlMessage {
    /// Sparse parameter update
    Update(ParameterUpdate),
    /// Raw register write ($00-$18)
    WriteRegister {
        /// Register address
        addr: u8,
        /// Register value
        value: u8,
    },
    /// Return the engine to its power-on state
    Reset,
}

/// Create a bounded control queue
pub fn control_channel(capacity: usize) -> (ControlSender, ControlReceiver) {
    let (tx, rx) = bounded(capacity.max(1));
    (ControlSender { tx }, ControlReceiver { rx })
}

/// Sending half, owned by the control thread(s)
#[derive(Debug, Clone)]
pub struct ControlSender {
    tx: Sender<ControlMessage>,
}

impl ControlSender {
    /// Validate and enqueue a parameter update without blocking
    pub fn send(&self, update: ParameterUpdate) -> Result<()> {
        if let Err(e) = update.validate() {
            warn!("Rejected control update: {e}");
            return Err(e);
        }
        self.push(ControlMessage::Update(update))
    }

    /// Parse a JSON control message and enqueue it
    pub fn send_json(&self, json: &str) -> Result<()> {
        let update = ParameterUpdate::from_json(json).map_err(|e| {
            warn!("Malformed control message: {e}");
            e
        })?;
        self.send(update)
    }

    /// Enqueue a raw register write
    pub fn write_register(&self, addr: u8, value: u8) -> Result<()> {
        self.push(ControlMessage::WriteRegister { addr, value })
    }

    /// Enqueue an engine reset
    pub fn reset(&self) -> Result<()> {
        self.push(ControlMessage::Reset)
    }

    fn push(&self, message: ControlMessage) -> Result<()> {
        match self.tx.try_send(message) {
            Ok(()) => {
                debug!("Queued {message:?}");
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                warn!("Control queue full, dropping {message:?}");
                Err(SidError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(SidError::Disconnected),
        }
    }

    /// Messages waiting to be drained
    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

/// Receiving half, owned by the audio thread
#[derive(Debug)]
pub struct ControlReceiver {
    rx: Receiver<ControlMessage>,
}

impl ControlReceiver {
    /// Take the next message if one is queued
    pub fn try_recv(&self) -> Option<ControlMessage> {
        self.rx.try_recv().ok()
    }

    /// Messages waiting to be drained
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Apply every queued message to an engine, returning how many were applied
    pub fn drain_into<B: SidBackend>(&self, backend: &mut B) -> usize {
        let mut applied = 0;
        while let Some(message) = self.try_recv() {
            apply_message(backend, &message);
            applied += 1;
        }
        applied
    }
}

/// Apply one control message to an engine
pub fn apply_message<B: SidBackend>(backend: &mut B, message: &ControlMessage) {
    match message {
        ControlMessage::Update(update) => backend.apply(update),
        ControlMessage::WriteRegister { addr, value } => backend.write_register(*addr, *value),
        ControlMessage::Reset => backend.reset(),
    }
}

/// Advisory frame boundary notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMarker {
    /// Frame boundaries passed since the engine started
    pub frame: u64,
}

/// Create a bounded frame-marker channel
pub fn frame_channel(capacity: usize) -> (FrameSender, FrameReceiver) {
    let (tx, rx) = bounded(capacity.max(1));
    (FrameSender { tx }, FrameReceiver { rx })
}

/// Audio-thread side of the frame-marker channel
#[derive(Debug, Clone)]
pub struct FrameSender {
    tx: Sender<FrameMarker>,
}

impl FrameSender {
    /// Offer a marker; returns false when it was dropped
    pub fn notify(&self, marker: FrameMarker) -> bool {
        self.tx.try_send(marker).is_ok()
    }
}

/// Control-thread side of the frame-marker channel
#[derive(Debug)]
pub struct FrameReceiver {
    rx: Receiver<FrameMarker>,
}

impl FrameReceiver {
    /// Take the next marker if one is queued
    pub fn try_recv(&self) -> Option<FrameMarker> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next marker
    pub fn recv_timeout(&self, timeout: Duration) -> Option<FrameMarker> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Drain every queued marker, returning the latest
    pub fn latest(&self) -> Option<FrameMarker> {
        self.rx.try_iter().last()
    }
}
