pub mod config;
pub mod executor;
pub mod logging;
pub mod model;
pub mod repodata;
pub mod traits;
pub mod xref;

// Re-export common types for convenience
pub use config::*;
pub use executor::*;
pub use model::*;
pub use repodata::RepodataProvider;
pub use traits::*;
