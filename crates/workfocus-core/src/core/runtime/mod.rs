use std::future::Future;

use anyhow::{Context, Result};
use tokio::runtime::Builder;

pub(crate) mod effects;

mod facade;

pub use facade::*;

/// Drives `future` to completion on a fresh current-thread runtime.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create install runtime")?;
    Ok(runtime.block_on(future))
}
