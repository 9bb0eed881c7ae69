//! Current-value containers with replay-on-subscribe fan-out.
//!
//! Writers update synchronously; readers observe the most recent value and
//! may skip intermediate ones when several updates land between polls.

use tokio::sync::watch;

pub struct StateCell<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> StateCell<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replaces the value. Succeeds whether or not anyone is subscribed.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Mutates the value in place and notifies subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    /// Like [`StateCell::update`], but subscribers are only woken when `f`
    /// reports a change. Returns what `f` returned.
    pub fn update_if(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }

    pub fn subscribe(&self) -> StateStream<T> {
        StateStream::new(self.tx.subscribe())
    }

    pub(crate) fn receiver(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Default> Default for StateCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

pub struct StateStream<T> {
    rx: watch::Receiver<T>,
    primed: bool,
}

impl<T: Clone> StateStream<T> {
    fn new(rx: watch::Receiver<T>) -> Self {
        Self { rx, primed: false }
    }

    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// First call yields the current value; later calls wait for a change.
    /// Returns `None` once the owning cell is gone.
    pub async fn next(&mut self) -> Option<T> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
