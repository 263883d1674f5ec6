pub mod batch;
pub mod image;
