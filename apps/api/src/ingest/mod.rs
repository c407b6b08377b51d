// Crafted-résumé ingestion: loose payload decoding, date formatting, and the
// pipeline that produces a fresh saved half of the document model.

pub mod dates;
pub mod payload;
pub mod pipeline;

pub use payload::NamedLink;
pub use pipeline::{ingest_value, BothScopesPlacement, IngestError, IngestOptions};
