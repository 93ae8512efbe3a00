// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus - Pub/Sub for Orchestration Events
//
// In-memory fan-out over a tokio broadcast channel. Feeds the `/events` SSE
// endpoint and any in-process observers. Events are not persisted.

use crate::domain::envelope::EventId;
use crate::domain::events::OrchestrationEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<OrchestrationEvent>>,
}

impl EventBus {
    /// Capacity is how many events a slow subscriber may fall behind before
    /// it starts losing the oldest ones.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    pub fn publish(&self, event: OrchestrationEvent) {
        debug!(kind = event.kind(), "Publishing orchestration event");

        // send() only fails when nobody is listening
        if self.sender.send(event).is_err() {
            debug!("No subscribers listening to event");
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe to the transitions of a single event.
    pub fn subscribe_event(&self, event_id: EventId) -> FilteredEventReceiver {
        FilteredEventReceiver {
            receiver: self.sender.subscribe(),
            event_id,
        }
    }

    /// Raw broadcast receiver, for adapting into a stream.
    pub fn raw_receiver(&self) -> broadcast::Receiver<OrchestrationEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

pub struct EventReceiver {
    receiver: broadcast::Receiver<OrchestrationEvent>,
}

impl EventReceiver {
    pub async fn recv(&mut self) -> Result<OrchestrationEvent, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    pub fn try_recv(&mut self) -> Result<OrchestrationEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

pub struct FilteredEventReceiver {
    receiver: broadcast::Receiver<OrchestrationEvent>,
    event_id: EventId,
}

impl FilteredEventReceiver {
    /// Next transition for the watched event; others are skipped.
    pub async fn recv(&mut self) -> Result<OrchestrationEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(map_recv_error)?;
            if event.event_id() == Some(self.event_id) {
                return Ok(event);
            }
        }
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
