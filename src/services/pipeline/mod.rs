pub mod controller;
pub mod core;
pub mod run_effect;
