//! 服务层

pub mod images;

pub use images::{ImageStore, StoredImage};
