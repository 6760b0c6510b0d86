pub mod entity;
pub mod record;

pub use record::{CorpusKind, Record, RecordKey};
