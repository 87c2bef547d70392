pub mod error;
pub mod models;
pub mod prelude;
pub mod traits;
pub mod uid;

/// Version of the shared model, reported by the CLI alongside parser versions
pub static LIB_VERSION: &str = env!("CARGO_PKG_VERSION");
