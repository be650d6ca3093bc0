//! Transport listeners
//!
//! A listener observes every raw frame a reader sends or receives,
//! together with the direction and the timeout in effect for that
//! exchange.
//! Listeners are diagnostic taps only: they cannot alter traffic, and a
//! reader works identically with zero listeners registered.
//!
//! Registration hands back a [`ListenerId`] drawn from a process-wide
//! counter, so ids stay unique across every reader handle in the process
//! and an id from one reader can never accidentally unregister a listener
//! on another.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::reader::Reader;

/// Direction of an observed transport exchange
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportDirection {
    /// Bytes sent to the device
    Send,
    /// Bytes received from the device
    Receive,
}

impl fmt::Display for TransportDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportDirection::Send => f.write_str("send"),
            TransportDirection::Receive => f.write_str("receive"),
        }
    }
}

/// Callback invoked for each raw frame crossing the transport, with the
/// direction and the timeout in effect for the exchange
pub type TransportListenerFn =
    Box<dyn FnMut(TransportDirection, &[u8], Duration) + Send + 'static>;

/// Opaque handle returned by [`Reader::add_transport_listener`]
///
/// Ids are unique for the lifetime of the process.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

fn next_listener_id() -> ListenerId {
    ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
}

impl Reader {
    /// Register a transport listener
    ///
    /// The callback runs synchronously on the thread driving the reader,
    /// once per send and once per receive, before the frame is decoded.
    /// It must not panic and must not call back into this reader.
    pub fn add_transport_listener<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(TransportDirection, &[u8], Duration) + Send + 'static,
    {
        let id = next_listener_id();
        self.listeners.insert(id.to_string(), Box::new(listener));
        id
    }

    /// Remove a previously registered listener
    ///
    /// Returns `true` if the id was registered on this reader. Removing
    /// an unknown or already-removed id is a no-op.
    pub fn remove_transport_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id.to_string()).is_some()
    }

    /// Number of listeners currently registered
    pub fn transport_listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn notify_listeners(
        &mut self,
        direction: TransportDirection,
        data: &[u8],
        timeout: Duration,
    ) {
        for listener in self.listeners.values_mut() {
            listener(direction, data, timeout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_across_readers() {
        let mut a = Reader::create("test:///dev/a").unwrap();
        let mut b = Reader::create("test:///dev/b").unwrap();

        let id_a = a.add_transport_listener(|_, _, _| {});
        let id_b = b.add_transport_listener(|_, _, _| {});
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut reader = Reader::create("test:///dev/null").unwrap();
        let id = reader.add_transport_listener(|_, _, _| {});

        assert_eq!(reader.transport_listener_count(), 1);
        assert!(reader.remove_transport_listener(id));
        assert!(!reader.remove_transport_listener(id));
        assert_eq!(reader.transport_listener_count(), 0);
    }

    #[test]
    fn test_listener_observes_both_directions() {
        use std::sync::{Arc, Mutex};

        let mut reader = Reader::create("test:///dev/tap").unwrap();
        let seen: Arc<Mutex<Vec<TransportDirection>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let id = reader.add_transport_listener(move |direction, data, _timeout| {
            assert!(!data.is_empty());
            sink.lock().unwrap().push(direction);
        });

        // connect is a single version exchange: one send, one receive
        reader.connect().unwrap();
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[TransportDirection::Send, TransportDirection::Receive]
        );

        // After removal the tap stays silent
        reader.remove_transport_listener(id);
        reader.read(10).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_foreign_id_does_not_remove() {
        let mut a = Reader::create("test:///dev/a").unwrap();
        let mut b = Reader::create("test:///dev/b").unwrap();

        let id_a = a.add_transport_listener(|_, _, _| {});
        assert!(!b.remove_transport_listener(id_a));
        assert_eq!(a.transport_listener_count(), 1);
    }
}
