use std::{
    fs::{self, File},
    io::{Read, Write as _},
    path::{Path, PathBuf},
};

use perk_utils::hash::Digester;
use tracing::{debug, trace};
use ureq::http::header::{CONTENT_LENGTH, CONTENT_RANGE};

use crate::{
    error::DownloadError,
    http::Http,
    types::{Progress, ShouldCancel},
};

/// Result of a completed download.
#[derive(Debug)]
pub struct Downloaded {
    pub path: PathBuf,
    pub size: u64,
    /// Hex digest computed while streaming, when an algorithm was requested.
    pub digest: Option<String>,
}

/// Streaming downloader with incremental digest computation.
///
/// Bytes are written to a `.part` sibling of the output path and renamed
/// into place only after the transfer completes, so a crash or cancellation
/// never leaves a partially-written file at the output path. `file://` URLs
/// are served from the local filesystem, which covers offline mirrors and
/// keeps tests hermetic.
pub struct Download {
    url: String,
    output: PathBuf,
    algorithm: Option<String>,
    on_progress: Option<Box<dyn Fn(Progress) + Send + Sync>>,
    should_cancel: Option<Box<ShouldCancel>>,
}

impl Download {
    pub fn new(url: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            output: output.into(),
            algorithm: None,
            on_progress: None,
            should_cancel: None,
        }
    }

    /// Requests an incremental digest with the named algorithm.
    pub fn digest(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }

    /// Registers a progress callback invoked at chunk boundaries.
    pub fn progress<F>(mut self, on_progress: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Box::new(on_progress));
        self
    }

    /// Registers a cooperative cancellation predicate.
    pub fn cancel_when<F>(mut self, should_cancel: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.should_cancel = Some(Box::new(should_cancel));
        self
    }

    /// Performs the download and returns the final output path and digest.
    pub fn execute(self) -> Result<Downloaded, DownloadError> {
        debug!(url = %self.url, output = %self.output.display(), "starting download");

        let url = url::Url::parse(&self.url).map_err(|source| DownloadError::InvalidUrl {
            url: self.url.clone(),
            source,
        })?;

        if let Some(parent) = self.output.parent() {
            fs::create_dir_all(parent)?;
        }

        let (reader, total): (Box<dyn Read>, u64) = if url.scheme() == "file" {
            let file = File::open(url.path())?;
            let total = file.metadata()?.len();
            (Box::new(file), total)
        } else {
            let resp = Http::fetch(&self.url)?;
            let total = parse_content_length(&resp);
            (Box::new(resp.into_body().into_reader()), total)
        };

        let part = part_path(&self.output);
        let result = self.stream_to(reader, total, &part);

        match result {
            Ok(downloaded) => {
                fs::rename(&part, &self.output)?;
                trace!(size = downloaded.size, "download complete");
                Ok(Downloaded {
                    path: self.output,
                    ..downloaded
                })
            }
            Err(err) => {
                // Never leave partial output behind.
                let _ = fs::remove_file(&part);
                Err(err)
            }
        }
    }

    fn stream_to(
        &self,
        mut reader: Box<dyn Read>,
        total: u64,
        part: &Path,
    ) -> Result<Downloaded, DownloadError> {
        let mut digester = self
            .algorithm
            .as_deref()
            .map(Digester::new)
            .transpose()?;

        if let Some(ref cb) = self.on_progress {
            cb(Progress::Starting { total });
        }

        let mut file = File::create(part)?;
        let mut buffer = [0u8; 8192];
        let mut downloaded = 0u64;

        loop {
            if let Some(ref should_cancel) = self.should_cancel {
                if should_cancel() {
                    return Err(DownloadError::Cancelled);
                }
            }

            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }

            file.write_all(&buffer[..n])?;
            if let Some(ref mut digester) = digester {
                digester.update(&buffer[..n]);
            }
            downloaded += n as u64;

            if let Some(ref cb) = self.on_progress {
                cb(Progress::Chunk {
                    current: downloaded,
                    total,
                });
            }
        }

        file.flush()?;

        if let Some(ref cb) = self.on_progress {
            cb(Progress::Complete { total });
        }

        Ok(Downloaded {
            path: part.to_path_buf(),
            size: downloaded,
            digest: digester.map(Digester::finalize),
        })
    }
}

fn part_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

fn parse_content_length(resp: &ureq::http::Response<ureq::Body>) -> u64 {
    resp.headers()
        .get(CONTENT_RANGE)
        .and_then(|h| h.to_str().ok())
        .and_then(|range| range.rsplit_once('/').and_then(|(_, tot)| tot.parse().ok()))
        .or_else(|| {
            resp.headers()
                .get(CONTENT_LENGTH)
                .and_then(|h| h.to_str().ok())
                .and_then(|len| len.parse::<u64>().ok())
        })
        .unwrap_or(0)
}
