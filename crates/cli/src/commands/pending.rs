// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Lists queued and dead-lettered jobs.

use std::io::Write;

use crate::error::Result;
use crate::queue::JobStore;

pub fn run(store: &JobStore, out: &mut impl Write) -> Result<()> {
    let pending = store.pending()?;
    let failed = store.dead_letters()?;
    if pending.is_empty() && failed.is_empty() {
        writeln!(out, "No pending calls")?;
        return Ok(());
    }

    for id in &pending {
        match store.load(id) {
            Ok(job) => {
                write!(out, "{}\t{} {}\tattempts={}", id, job.request.method(), job.request.url(), job.attempts)?;
                if let Some(err) = &job.last_error {
                    write!(out, "\tlast error: {}", err)?;
                }
                writeln!(out)?;
            }
            Err(e) => writeln!(out, "{}\tunreadable: {}", id, e)?,
        }
    }

    if !failed.is_empty() {
        writeln!(out, "Dead-lettered ({}):", failed.len())?;
        for id in &failed {
            writeln!(out, "  {}", id)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
