//! # Progress Broadcast Hub
//!
//! Fans task events out to push clients. Events are buffered and delivered
//! as one `{"batch":true,"events":[...]}` payload per flush window, so a fast
//! run does not flood slow clients with one frame per batch.
//!
//! At most one flush is pending at a time. Clients that report closed are
//! dropped without a send; clients whose send fails are dropped after the
//! attempt. Delivery problems never reach the emitter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::task::state::{BatchMessage, TaskEvent};

pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Error, Debug)]
pub enum PushError {
    #[error("client is closed")]
    Closed,

    #[error("send failed: {0}")]
    Failed(String),
}

/// A connected push subscriber.
///
/// `send` is called with the hub's lock held and must not call back into
/// the hub.
pub trait PushClient: Send {
    fn is_open(&self) -> bool {
        true
    }

    fn send(&self, payload: &str) -> Result<(), PushError>;
}

/// Push client backed by an unbounded tokio channel. A dropped receiver
/// makes the client report closed.
#[derive(Debug, Clone)]
pub struct ChannelClient {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelClient {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PushClient for ChannelClient {
    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send(&self, payload: &str) -> Result<(), PushError> {
        self.tx
            .send(payload.to_string())
            .map_err(|_| PushError::Closed)
    }
}

#[derive(Default)]
struct HubState {
    clients: HashMap<u64, Box<dyn PushClient>>,
    next_client_id: u64,
    buffer: Vec<TaskEvent>,
    flush_scheduled: bool,
}

struct HubInner {
    flush_interval: Duration,
    state: Mutex<HubState>,
}

impl HubInner {
    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self) {
        let mut state = self.lock();
        state.flush_scheduled = false;
        if state.buffer.is_empty() {
            return;
        }
        let events = std::mem::take(&mut state.buffer);
        let event_count = events.len();
        let payload = match serde_json::to_string(&BatchMessage::new(events)) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "dropping unserializable event batch");
                return;
            }
        };

        let before = state.clients.len();
        state
            .clients
            .retain(|_, client| client.is_open() && client.send(&payload).is_ok());
        let dropped = before - state.clients.len();
        tracing::debug!(
            events = event_count,
            clients = state.clients.len(),
            dropped,
            "flushed event batch"
        );
    }
}

/// Handle returned by [`BroadcastHub::register_client`].
#[derive(Debug)]
pub struct ClientHandle {
    id: u64,
    hub: Weak<HubInner>,
}

impl ClientHandle {
    /// Remove the client. Returns `false` if it was already gone.
    pub fn unregister(self) -> bool {
        match self.hub.upgrade() {
            Some(hub) => hub.lock().clients.remove(&self.id).is_some(),
            None => false,
        }
    }
}

impl std::fmt::Debug for HubInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubInner")
            .field("flush_interval", &self.flush_interval)
            .finish_non_exhaustive()
    }
}

/// Coalescing event fan-out. Cheap to clone; clones share clients and
/// buffer.
#[derive(Clone)]
pub struct BroadcastHub {
    inner: Arc<HubInner>,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_FLUSH_INTERVAL)
    }
}

impl BroadcastHub {
    pub fn new(flush_interval: Duration) -> Self {
        Self {
            inner: Arc::new(HubInner {
                flush_interval,
                state: Mutex::new(HubState::default()),
            }),
        }
    }

    pub fn register_client(&self, client: Box<dyn PushClient>) -> ClientHandle {
        let mut state = self.inner.lock();
        let id = state.next_client_id;
        state.next_client_id += 1;
        state.clients.insert(id, client);
        ClientHandle {
            id,
            hub: Arc::downgrade(&self.inner),
        }
    }

    pub fn client_count(&self) -> usize {
        self.inner.lock().clients.len()
    }

    /// Buffer `event` and make sure a flush is scheduled.
    ///
    /// Outside a tokio runtime the buffer is flushed immediately.
    pub fn emit_event(&self, event: TaskEvent) {
        {
            let mut state = self.inner.lock();
            state.buffer.push(event);
            if state.flush_scheduled {
                return;
            }
            state.flush_scheduled = true;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::clone(&self.inner);
                handle.spawn(async move {
                    tokio::time::sleep(inner.flush_interval).await;
                    inner.flush();
                });
            }
            Err(_) => self.inner.flush(),
        }
    }
}
