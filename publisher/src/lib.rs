//! # Crate publisher
//!
//! ## publisher
//!
//! The `publisher` crate hands samples from a single producer to any number of
//! consumers without ever making the producer wait for them.
//!
//! - [`Publisher`] keeps a registry of [`Listener`] callbacks and calls them with every update.
//! - [`Broadcaster`] keeps only the latest value. Each [`Subscription`] takes a value at most once,
//!   so a slow consumer skips stale values instead of queueing them.
//! - [`DisplayQueue`] is a small bounded queue of display strings that drops new updates when full.
//!
//! ### Example
//!
//! ```
//! use publisher::{Broadcaster, Listener};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! let broadcaster = Broadcaster::<u32>::new();
//! let mut subscription = broadcaster.subscribe();
//!
//! let mut listener = Listener::new(|_id: Uuid, value: Arc<u32>| {
//!     println!("Listener received: {}", value);
//! });
//! let id = broadcaster.register_listener(&mut listener);
//!
//! broadcaster.publish(1);
//! broadcaster.publish(2);
//! assert_eq!(subscription.try_take(), Some(2));
//! assert_eq!(subscription.try_take(), None);
//!
//! broadcaster.unregister_listener(id).expect("Failed to unregister listener");
//! ```

mod broadcaster;
mod display_queue;
pub mod listener;
mod macros;
mod publisher;

pub use broadcaster::{Broadcaster, Subscription};
pub use display_queue::{DisplayQueue, DisplayReceiver};
pub use listener::Listener;
pub use publisher::{Publishable, Publisher, PublisherError};
