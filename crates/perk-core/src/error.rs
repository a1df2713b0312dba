//! Error types for perk-core.

use miette::Diagnostic;
use thiserror::Error;

/// Errors produced while handling runtime descriptions.
#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("Unknown hash algorithm `{0}`")]
    #[diagnostic(
        code(perk_core::unknown_algorithm),
        help("Supported algorithms are `sha-256` and `blake3`")
    )]
    UnknownAlgorithm(String),

    #[error("Invalid runtime version `{input}`")]
    #[diagnostic(
        code(perk_core::invalid_version),
        help("Versions follow the JDK scheme, e.g. `17`, `17.0.2` or `17.0.2+8`")
    )]
    InvalidVersion {
        input: String,
        #[source]
        source: semver::Error,
    },

    #[error("Invalid runtime configuration `{0}`")]
    #[diagnostic(
        code(perk_core::invalid_configuration),
        help("Expected `jdk` or `jre`")
    )]
    InvalidConfiguration(String),

    #[error("Failed to parse runtime description as {content_type}")]
    #[diagnostic(code(perk_core::codec_parse))]
    CodecParse {
        content_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize runtime description as {content_type}")]
    #[diagnostic(code(perk_core::codec_serialize))]
    CodecSerialize {
        content_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("No codec registered for content type `{0}`")]
    #[diagnostic(
        code(perk_core::unsupported_content_type),
        help("Register a codec for this content type before parsing")
    )]
    UnsupportedContentType(String),
}
