pub mod config;
pub mod fs;
pub mod runtime;
pub mod store;
pub mod sync;
pub mod tooling;
