use std::{
    fmt::Display,
    sync::{LazyLock, RwLock},
    time::Duration,
};

use nu_ansi_term::Color;
use perk_client::{ClientError, OperationHandle};

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let color = COLOR.read().unwrap();
        if *color {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

/// Waits for a background operation, honoring the global `--timeout` flag.
pub async fn finish<T>(
    handle: OperationHandle<T>,
    timeout: Option<Duration>,
) -> Result<T, ClientError> {
    match timeout {
        Some(timeout) => handle.wait_timeout(timeout).await,
        None => handle.wait().await,
    }
}
