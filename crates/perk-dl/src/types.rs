/// Progress events emitted during a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Starting { total: u64 },
    Chunk { current: u64, total: u64 },
    Complete { total: u64 },
}

/// Cooperative cancellation predicate, consulted at chunk boundaries.
///
/// Returning `true` aborts the transfer; partial output is discarded.
pub type ShouldCancel = dyn Fn() -> bool + Send + Sync;
