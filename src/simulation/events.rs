//! Minimal synchronous publish/subscribe for bodies and the space
//!
//! Listeners are registered per event kind and called in registration order.
//! The listener list is snapshotted when a dispatch starts, so listeners added
//! or removed while it runs only affect later dispatches. A failing listener
//! does not stop the remaining ones; all failures are returned together.

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

/// An event that can be routed by kind
pub trait Event: 'static {
    type Kind: Copy + Eq + fmt::Debug;

    fn kind(&self) -> Self::Kind;
}

/// Handle returned by [`EventEmitter::add_listener`], used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<E> = Rc<dyn Fn(&E) -> anyhow::Result<()>>;

/// Failures collected from one or more listeners
#[derive(Debug, Error)]
#[error("{} event listener(s) failed", .failures.len())]
pub struct DispatchError {
    pub failures: Vec<anyhow::Error>,
}

impl DispatchError {
    /// Fold a dispatch result into an accumulator of failures
    pub fn collect(result: Result<(), DispatchError>, into: &mut Vec<anyhow::Error>) {
        if let Err(err) = result {
            into.extend(err.failures);
        }
    }

    /// `Ok` if nothing failed
    pub fn from_failures(failures: Vec<anyhow::Error>) -> Result<(), DispatchError> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError { failures })
        }
    }
}

pub struct EventEmitter<E: Event> {
    listeners: Vec<(E::Kind, ListenerId, Listener<E>)>,
    next_id: u64,
}

impl<E: Event> EventEmitter<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn add_listener<F>(&mut self, kind: E::Kind, listener: F) -> ListenerId
    where
        F: Fn(&E) -> anyhow::Result<()> + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((kind, id, Rc::new(listener)));
        id
    }

    /// Returns `false` if no listener with this kind and id was registered
    pub fn remove_listener(&mut self, kind: E::Kind, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(k, lid, _)| !(*k == kind && *lid == id));
        self.listeners.len() != before
    }

    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.listeners.iter().filter(|(k, _, _)| *k == kind).count()
    }

    pub fn emit(&self, event: &E) -> Result<(), DispatchError> {
        let kind = event.kind();
        let snapshot: Vec<Listener<E>> = self
            .listeners
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .map(|(_, _, l)| Rc::clone(l))
            .collect();

        let mut failures = Vec::new();
        for listener in snapshot {
            if let Err(err) = listener(event) {
                failures.push(err);
            }
        }
        DispatchError::from_failures(failures)
    }
}

impl<E: Event> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum PingKind {
        Ping,
        Pong,
    }

    struct Ping(PingKind);

    impl Event for Ping {
        type Kind = PingKind;
        fn kind(&self) -> PingKind {
            self.0
        }
    }

    #[test]
    fn dispatches_in_registration_order_by_kind() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut emitter = EventEmitter::<Ping>::new();
        for tag in ["a", "b"] {
            let log = Rc::clone(&log);
            emitter.add_listener(PingKind::Ping, move |_| {
                log.borrow_mut().push(tag);
                Ok(())
            });
        }
        let pong_log = Rc::clone(&log);
        emitter.add_listener(PingKind::Pong, move |_| {
            pong_log.borrow_mut().push("pong");
            Ok(())
        });

        emitter.emit(&Ping(PingKind::Ping)).unwrap();
        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn removed_listener_is_not_called() {
        let hits = Rc::new(RefCell::new(0));
        let mut emitter = EventEmitter::<Ping>::new();
        let h = Rc::clone(&hits);
        let id = emitter.add_listener(PingKind::Ping, move |_| {
            *h.borrow_mut() += 1;
            Ok(())
        });

        assert!(!emitter.remove_listener(PingKind::Pong, id));
        assert!(emitter.remove_listener(PingKind::Ping, id));
        assert_eq!(emitter.listener_count(PingKind::Ping), 0);
        emitter.emit(&Ping(PingKind::Ping)).unwrap();
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn failures_do_not_abort_dispatch() {
        let hits = Rc::new(RefCell::new(0));
        let mut emitter = EventEmitter::<Ping>::new();
        emitter.add_listener(PingKind::Ping, |_| Err(anyhow::anyhow!("first")));
        let h = Rc::clone(&hits);
        emitter.add_listener(PingKind::Ping, move |_| {
            *h.borrow_mut() += 1;
            Ok(())
        });
        emitter.add_listener(PingKind::Ping, |_| Err(anyhow::anyhow!("third")));

        let err = emitter.emit(&Ping(PingKind::Ping)).unwrap_err();
        assert_eq!(err.failures.len(), 2);
        assert_eq!(*hits.borrow(), 1);
    }
}
