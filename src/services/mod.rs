pub mod classifier;
pub mod decoder;
pub mod file_access;
pub mod image_source;
pub mod permission;
pub mod pipeline;
pub mod runtime;
