pub mod backend;
pub mod inference;
pub mod model_manager;
pub mod session;
