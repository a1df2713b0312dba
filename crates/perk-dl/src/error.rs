use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum DownloadError {
    #[error("Invalid URL: {url}")]
    #[diagnostic(code(perk_dl::invalid_url))]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    #[diagnostic(
        code(perk_dl::network),
        help("Check your internet connection or try again later")
    )]
    Network(#[from] Box<ureq::Error>),

    #[error("HTTP {status}: {url}")]
    #[diagnostic(code(perk_dl::http_error))]
    HttpError { status: u16, url: String },

    #[error(transparent)]
    #[diagnostic(code(perk_dl::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(perk_dl::hash))]
    Hash(#[from] perk_utils::error::HashError),

    #[error("Download cancelled")]
    #[diagnostic(code(perk_dl::cancelled))]
    Cancelled,

    #[error("Invalid response from server")]
    #[diagnostic(code(perk_dl::invalid_response))]
    InvalidResponse,
}

impl From<ureq::Error> for DownloadError {
    fn from(e: ureq::Error) -> Self {
        Self::Network(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message() {
        let err = DownloadError::HttpError {
            status: 404,
            url: "https://example.com/notfound".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("HTTP 404"));
        assert!(msg.contains("https://example.com/notfound"));
    }

    #[test]
    fn test_cancelled_message() {
        assert_eq!(DownloadError::Cancelled.to_string(), "Download cancelled");
    }

    #[test]
    fn test_from_ureq_error() {
        let ureq_err = ureq::Error::ConnectionFailed;
        let download_err: DownloadError = ureq_err.into();
        assert!(matches!(download_err, DownloadError::Network(_)));
    }

    #[test]
    fn test_error_source_chain() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = DownloadError::Io(io_err);
        assert!(std::error::Error::source(&err).is_some());
    }
}
