//! Repository layer: one stateless struct per table.

pub mod batch_repo;
pub mod image_repo;

pub use batch_repo::BatchRepo;
pub use image_repo::ImageRepo;
