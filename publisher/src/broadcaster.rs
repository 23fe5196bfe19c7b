use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use common::traits::Notifiable;

use crate::publisher::{Publishable, Publisher, PublisherError};

/// Latest-value hand-off between one producer and many consumers.
///
/// Holds at most one value. [`Broadcaster::publish`] overwrites it and never
/// waits on consumers. Consumers either pull through a [`Subscription`], peek
/// with [`Broadcaster::latest`], or register push listeners.
pub struct Broadcaster<T> {
    cell: watch::Sender<Option<T>>,
    listeners: Publisher<T>,
}

impl<T> Broadcaster<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        let (cell, _) = watch::channel(None);
        Self {
            cell,
            listeners: Publisher::new(),
        }
    }

    /// Replaces the current value and wakes every subscription.
    pub fn publish(&self, value: T) {
        self.cell.send_replace(Some(value.clone()));
        if !self.listeners.is_empty() {
            self.listeners.notify_listeners(Arc::new(value));
        }
    }

    /// Returns a copy of the latest value without consuming it.
    pub fn latest(&self) -> Option<T> {
        self.cell.borrow().clone()
    }

    /// Creates a subscription that only sees values published from now on.
    pub fn subscribe(&self) -> Subscription<T> {
        Subscription {
            receiver: self.cell.subscribe(),
        }
    }

    pub fn register_listener(&self, listener: &mut dyn Notifiable<T>) -> Uuid {
        self.listeners.register_listener(listener)
    }

    pub fn unregister_listener(&self, id: Uuid) -> Result<(), PublisherError> {
        self.listeners.unregister_listener(id)
    }

    pub fn unregister_all(&self) {
        self.listeners.unregister_all();
    }
}

impl<T> Default for Broadcaster<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// One consumer's view of a [`Broadcaster`].
pub struct Subscription<T> {
    receiver: watch::Receiver<Option<T>>,
}

impl<T: Clone> Subscription<T> {
    /// Returns the latest value if it was published after the previous take.
    pub fn try_take(&mut self) -> Option<T> {
        match self.receiver.has_changed() {
            Ok(true) => self.receiver.borrow_and_update().clone(),
            _ => None,
        }
    }

    /// Waits for the next publish. Returns `None` once the broadcaster is dropped.
    pub async fn next(&mut self) -> Option<T> {
        loop {
            self.receiver.changed().await.ok()?;
            if let Some(value) = self.receiver.borrow_and_update().clone() {
                return Some(value);
            }
        }
    }
}
