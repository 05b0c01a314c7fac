#![doc = include_str!("../README.md")]

pub mod channel;
pub mod dispatch;
mod envelope;
pub mod worker;

pub use crate::channel::{Receiver, Sender, TrySendError, channel};
pub use crate::dispatch::{Dispatcher, NUM_WORKERS, SEQUENTIAL_WORKER_ID, WORK_DELAY};
pub use crate::envelope::Envelope;
pub use crate::worker::{greeting, worker_loop};

/// The fixed batch of names served by both endpoints.
pub const NAMES: [&str; 8] = [
    "Maia", "Reegan", "Kelly", "Matt", "Krisha", "Patrick", "Tony", "Jason",
];
