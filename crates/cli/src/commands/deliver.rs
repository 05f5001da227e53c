// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue delivery commands.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::Session;
use crate::error::Result;

/// Runs a single delivery pass and prints its summary.
pub fn once(session: &Session) -> Result<()> {
    let driver = session.client.delivery_driver();
    let report = session.runtime.block_on(driver.run_pass())?;
    println!(
        "delivered {}, failed {}, deferred {}, busy {}, dead-lettered {}",
        report.delivered, report.failed, report.deferred, report.busy, report.dead_lettered
    );
    Ok(())
}

/// Delivers queued jobs whenever connectivity allows, until Ctrl-C.
pub fn serve(session: &Session) -> Result<()> {
    let driver = session.client.delivery_driver();
    let connectivity = Arc::clone(&session.connectivity);
    let wake = Arc::clone(&session.wake);
    let shutdown = CancellationToken::new();

    session.runtime.block_on(async {
        let stop = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupted, stopping delivery");
                stop.cancel();
            }
        });
        driver.run(connectivity, wake, shutdown).await;
    });
    Ok(())
}
