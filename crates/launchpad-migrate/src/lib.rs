pub mod descriptor;
pub mod engine;
pub mod ledger;
pub mod procedural;
pub mod sink;
pub mod source;

pub use descriptor::{Descriptor, DescriptorKind};
pub use engine::{DescriptorStatus, MigrationEngine, MigrationStatus, RunReport};
pub use ledger::{Ledger, LedgerLock};
pub use procedural::ProceduralRunner;
pub use sink::{LoggingSink, StatementSink};
pub use source::SourceDirectory;
