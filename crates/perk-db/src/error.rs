use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum DatabaseError {
    #[error("Failed to {action} `{path}`")]
    #[diagnostic(
        code(perk_db::io),
        help("Check file permissions and disk space")
    )]
    Io {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(perk_db::filesystem))]
    FileSystem(#[from] perk_utils::error::FileSystemError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Codec(#[from] perk_core::CoreError),
}
