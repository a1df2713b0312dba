use std::sync::{
    mpsc::{self, Receiver, Sender},
    Mutex,
};

use crate::PerkEvent;

/// Destination for emitted events.
///
/// Components hold a shared sink handle and publish fire-and-forget;
/// a sink must never block the emitting component or surface errors
/// back into it.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PerkEvent);
}

/// Sink backed by a standard mpsc channel.
///
/// Handing clones of one `ChannelSink` to several components multiplexes
/// their events onto a single receiver while keeping each component's own
/// emission order intact. Events emitted after the receiver is dropped are
/// discarded silently.
pub struct ChannelSink {
    sender: Sender<PerkEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<PerkEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: PerkEvent) {
        let _ = self.sender.send(event);
    }
}

/// Sink that drops everything, for headless use.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: PerkEvent) {}
}

/// Sink that records every event, in emission order, for later assertions.
#[derive(Default)]
pub struct CollectorSink {
    events: Mutex<Vec<PerkEvent>>,
}

impl CollectorSink {
    /// Everything emitted so far.
    pub fn events(&self) -> Vec<PerkEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for CollectorSink {
    fn emit(&self, event: PerkEvent) {
        self.events.lock().unwrap().push(event);
    }
}
