//! Pure domain logic for batch photo editing.
//!
//! Nothing in this crate touches storage or the network: the settings model,
//! the preview transform mapping, template/override resolution, the image
//! status state machine, upload limits and batch progress are all plain
//! functions over plain data, shared by the row store, the engine and the
//! HTTP layer.

pub mod error;
pub mod image_status;
pub mod progress;
pub mod resolution;
pub mod settings;
pub mod transform;
pub mod types;
pub mod upload;
