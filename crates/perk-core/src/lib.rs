//! Core data model for the perk runtime manager.
//!
//! This crate defines the immutable [`RuntimeDescription`] value, the
//! persisted [`RuntimeRecord`] wrapping it with local state, version and
//! hash handling, search criteria, and the pluggable record codec SPI
//! shared by every other perk crate.

pub mod codec;
pub mod criteria;
pub mod description;
pub mod error;
pub mod record;
pub mod version;

pub use codec::{CodecRegistry, JsonRecordCodec, RecordCodec, JSON_CONTENT_TYPE};
pub use criteria::SearchCriteria;
pub use description::{ArchiveHash, HashAlgorithm, RuntimeConfiguration, RuntimeDescription};
pub use error::CoreError;
pub use record::RuntimeRecord;
pub use version::RuntimeVersion;
