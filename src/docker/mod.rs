//! Everything that talks to the Docker engine: the client wrapper, the
//! container watcher, and the per-check scheduler.

pub mod client;
pub mod error;
pub mod scheduler;
pub mod watcher;

pub use client::Client;
pub use error::DockerError;
pub use scheduler::CheckHandle;
pub use watcher::{Watcher, WatcherControl};
