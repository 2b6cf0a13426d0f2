//! Observer registry for synchronous event dispatch

use std::collections::HashMap;
use std::hash::Hash;

/// Events that can be routed to the handlers registered for their kind
pub trait Event {
    type Kind: Copy + Eq + Hash;

    fn kind(&self) -> Self::Kind;
}

type Handler<E> = Box<dyn FnMut(&E)>;

/// Event kind → ordered handler list. Handlers run synchronously, in
/// registration order, on the thread that emits.
pub struct Observers<E: Event> {
    handlers: HashMap<E::Kind, Vec<Handler<E>>>,
}

impl<E: Event> Observers<E> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for one event kind
    pub fn subscribe(&mut self, kind: E::Kind, handler: impl FnMut(&E) + 'static) {
        self.handlers
            .entry(kind)
            .or_default()
            .push(Box::new(handler));
    }

    /// Deliver an event to every handler registered for its kind
    pub fn emit(&mut self, event: &E) {
        if let Some(handlers) = self.handlers.get_mut(&event.kind()) {
            for handler in handlers.iter_mut() {
                handler(event);
            }
        }
    }

    pub fn handler_count(&self, kind: E::Kind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl<E: Event> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> std::fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("kinds", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug)]
    enum Ping {
        A(u32),
        B,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum PingKind {
        A,
        B,
    }

    impl Event for Ping {
        type Kind = PingKind;

        fn kind(&self) -> PingKind {
            match self {
                Ping::A(_) => PingKind::A,
                Ping::B => PingKind::B,
            }
        }
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut observers = Observers::<Ping>::new();

        let first = log.clone();
        observers.subscribe(PingKind::A, move |e| {
            if let Ping::A(n) = e {
                first.borrow_mut().push(format!("first {n}"));
            }
        });
        let second = log.clone();
        observers.subscribe(PingKind::A, move |_| second.borrow_mut().push("second".into()));

        observers.emit(&Ping::A(7));
        assert_eq!(*log.borrow(), vec!["first 7".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_only_matching_kind_is_notified() {
        let hits = Rc::new(RefCell::new(0));
        let mut observers = Observers::<Ping>::new();
        let counter = hits.clone();
        observers.subscribe(PingKind::B, move |_| *counter.borrow_mut() += 1);

        observers.emit(&Ping::A(1));
        assert_eq!(*hits.borrow(), 0);
        observers.emit(&Ping::B);
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(observers.handler_count(PingKind::B), 1);
        assert_eq!(observers.handler_count(PingKind::A), 0);
    }
}
