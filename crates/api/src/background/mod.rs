//! Background tasks.
//!
//! Each submodule provides a long-running async function intended to be
//! spawned via `tokio::spawn`.

pub mod change_log;
pub mod stuck_images;
