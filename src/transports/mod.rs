//! Built-in transports: console, file and remote

pub mod console;
pub mod file;
#[cfg(feature = "remote")]
pub mod http;
pub mod remote;

pub use console::ConsoleTransport;
pub use file::{FileTransport, RotationPolicy};
#[cfg(feature = "remote")]
pub use http::HttpBatchSender;
pub use remote::{BatchSender, RemoteOptions, RemoteStats, RemoteTransport};
