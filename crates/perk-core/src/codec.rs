//! Record codec SPI.
//!
//! The on-disk format of a runtime record is pluggable: codecs are
//! negotiated by content type and the description database never parses
//! record bytes itself.

use std::sync::Arc;

use crate::{error::CoreError, record::RuntimeRecord};

/// Media type of the built-in JSON record format.
pub const JSON_CONTENT_TYPE: &str = "application/vnd.perk.runtime+json";

/// Parses and serializes individual runtime records.
pub trait RecordCodec: Send + Sync {
    /// Content type identifier this codec handles.
    fn content_type(&self) -> &'static str;

    fn parse(&self, bytes: &[u8]) -> Result<RuntimeRecord, CoreError>;

    fn serialize(&self, record: &RuntimeRecord) -> Result<Vec<u8>, CoreError>;
}

impl std::fmt::Debug for dyn RecordCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCodec")
            .field("content_type", &self.content_type())
            .finish()
    }
}

/// Built-in JSON codec.
#[derive(Default)]
pub struct JsonRecordCodec;

impl RecordCodec for JsonRecordCodec {
    fn content_type(&self) -> &'static str {
        JSON_CONTENT_TYPE
    }

    fn parse(&self, bytes: &[u8]) -> Result<RuntimeRecord, CoreError> {
        serde_json::from_slice(bytes).map_err(|source| CoreError::CodecParse {
            content_type: JSON_CONTENT_TYPE,
            source,
        })
    }

    fn serialize(&self, record: &RuntimeRecord) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec_pretty(record).map_err(|source| CoreError::CodecSerialize {
            content_type: JSON_CONTENT_TYPE,
            source,
        })
    }
}

/// Registry of codecs keyed by content type.
///
/// Lookup order is registration order; registering a second codec for the
/// same content type shadows the first.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: Vec<Arc<dyn RecordCodec>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self { codecs: Vec::new() }
    }

    /// Registry containing only the built-in JSON codec.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(JsonRecordCodec));
        registry
    }

    pub fn register(&mut self, codec: Arc<dyn RecordCodec>) {
        self.codecs.insert(0, codec);
    }

    pub fn for_content_type(
        &self,
        content_type: &str,
    ) -> Result<Arc<dyn RecordCodec>, CoreError> {
        self.codecs
            .iter()
            .find(|codec| codec.content_type() == content_type)
            .cloned()
            .ok_or_else(|| CoreError::UnsupportedContentType(content_type.to_string()))
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
