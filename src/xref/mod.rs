//! Cross-reference stages over loaded repository metadata.
//!
//! - **Traits**: [`XrefStage`], [`StageReport`] for composing stages
//! - **Pairing**: [`PairingEngine`] links binary RPMs to their source RPM
//! - **Index**: [`IndexBuilder`] builds the per-package index and resolves
//!   module labels
//! - **Pipeline**: async load-then-derive executor via [`XrefPipeline`]
//! - **Report**: text and JSON renderings

pub mod index;
pub mod listing;
pub mod modules;
pub mod pairing;
pub mod pipeline;
pub mod report;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use traits::{IndexError, StageReport, Warning, XrefStage};

pub use index::{IndexBuilder, IndexEntry, IndexReport, PackageIndex, EXPECTED_CHECKSUM};
pub use listing::{ListStage, PackageListing};
pub use modules::{ModuleResolver, ResolutionStats};
pub use pairing::{PairingEngine, PairingMap, PairingReport};
pub use pipeline::{PipelineError, PipelineStats, XrefPipeline, XrefResult};
