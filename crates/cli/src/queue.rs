// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline job store.
//!
//! Each pending job is one file named `toucan_client_pending_request_<id>`
//! in the queue directory. Writes go to a hidden temporary file that is
//! fsynced and then linked (new jobs) or renamed (rewrites) into place, so a
//! reader sees either the old job or the new one, never a partial write. A
//! new job never replaces an existing file: several processes may share the
//! directory and their job ids can collide. The directory is the only record
//! of what is pending.
//!
//! Replays claim a job with an exclusive advisory lock on its file. The
//! lock is held until the file is removed or rewritten, so two workers in
//! any number of processes never run the same job at the same time.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use fs2::FileExt;
use toucan_core::{Job, JobId};

/// File name prefix of every pending job.
pub const JOB_FILE_PREFIX: &str = "toucan_client_pending_request_";

const FAILED_DIR_NAME: &str = "failed";
const TMP_PREFIX: &str = ".tmp-";

/// Temporary files older than this were left by a writer that crashed.
pub const STALE_TMP_AGE: Duration = Duration::from_secs(600);

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Error type for queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No pending job with this id.
    #[error("job not found: {0}")]
    NotFound(JobId),

    /// A pending job with this id is already stored.
    #[error("job already exists: {0}")]
    AlreadyExists(JobId),

    /// The job file exists but does not hold a valid job.
    #[error("corrupt job {id}: {reason}")]
    Corrupt { id: JobId, reason: String },
}

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Exclusive hold on one pending job. Released on drop.
#[derive(Debug)]
pub struct JobClaim {
    id: JobId,
    _file: File,
}

impl JobClaim {
    pub fn id(&self) -> &JobId {
        &self.id
    }
}

/// Directory-backed store of pending jobs.
#[derive(Debug, Clone)]
pub struct JobStore {
    dir: PathBuf,
}

impl JobStore {
    /// Opens the store, creating the directory if needed and sweeping
    /// temporary files older than [`STALE_TMP_AGE`].
    pub fn open(dir: &Path) -> QueueResult<Self> {
        fs::create_dir_all(dir)?;
        let store = JobStore { dir: dir.to_path_buf() };
        store.sweep_temp_files(STALE_TMP_AGE);
        Ok(store)
    }

    /// Deletes temporary files at least `max_age` old. Returns the number
    /// removed. Younger ones may belong to a writer that is still running.
    pub fn sweep_temp_files(&self, max_age: Duration) -> usize {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };
        let now = SystemTime::now();
        let mut removed = 0;
        for entry in entries.flatten() {
            let name = entry.file_name();
            if !name.to_str().is_some_and(|n| n.starts_with(TMP_PREFIX)) {
                continue;
            }
            let age = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok());
            if age.is_some_and(|a| a >= max_age) && fs::remove_file(entry.path()).is_ok() {
                tracing::warn!("removed stale temporary file {:?}", name);
                removed += 1;
            }
        }
        removed
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn job_path(&self, id: &JobId) -> PathBuf {
        self.dir.join(format!("{}{}", JOB_FILE_PREFIX, id))
    }

    fn failed_dir(&self) -> PathBuf {
        self.dir.join(FAILED_DIR_NAME)
    }

    /// Durably writes a new job. The job is visible to
    /// [`pending`](Self::pending) only once fully on disk.
    ///
    /// Fails with [`QueueError::AlreadyExists`] if a job with the same id is
    /// stored; the stored job is left untouched.
    pub fn persist(&self, job: &Job) -> QueueResult<PathBuf> {
        let path = self.job_path(&job.id);
        let tmp = self.write_temp(job)?;
        let linked = fs::hard_link(&tmp, &path);
        let _ = fs::remove_file(&tmp);
        match linked {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(QueueError::AlreadyExists(job.id.clone()));
            }
            Err(e) => return Err(e.into()),
        }
        sync_dir(&self.dir);

        tracing::info!(job = %job.id, operation = %job.operation, "job persisted");
        Ok(path)
    }

    /// Rewrites an existing job atomically.
    pub fn update(&self, job: &Job) -> QueueResult<()> {
        let path = self.job_path(&job.id);
        if !path.exists() {
            return Err(QueueError::NotFound(job.id.clone()));
        }
        let tmp = self.write_temp(job)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        sync_dir(&self.dir);

        tracing::debug!(job = %job.id, attempts = job.attempts, "job rewritten");
        Ok(())
    }

    /// Writes the job to a fresh, fsynced temporary file unique to this
    /// process and call.
    fn write_temp(&self, job: &Job) -> QueueResult<PathBuf> {
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self.dir.join(format!("{}{}-{}-{}", TMP_PREFIX, std::process::id(), seq, job.id));
        let json = serde_json::to_string(job)?;
        if let Err(e) = write_synced(&tmp, json.as_bytes()) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(tmp)
    }

    /// Ids of all pending jobs, sorted by name.
    pub fn pending(&self) -> QueueResult<Vec<JobId>> {
        list_jobs(&self.dir)
    }

    /// Ids of dead-lettered jobs, sorted by name.
    pub fn dead_letters(&self) -> QueueResult<Vec<JobId>> {
        match fs::metadata(self.failed_dir()) {
            Ok(_) => list_jobs(&self.failed_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn load(&self, id: &JobId) -> QueueResult<Job> {
        let content = match fs::read_to_string(self.job_path(id)) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(QueueError::NotFound(id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        let job = Job::decode(&content).map_err(|e| QueueError::Corrupt { id: id.clone(), reason: e.to_string() })?;
        if &job.id != id {
            return Err(QueueError::Corrupt { id: id.clone(), reason: format!("file holds job {}", job.id) });
        }
        Ok(job)
    }

    /// Deletes a pending job.
    pub fn remove(&self, id: &JobId) -> QueueResult<()> {
        match fs::remove_file(self.job_path(id)) {
            Ok(()) => {
                sync_dir(&self.dir);
                tracing::info!(job = %id, "job removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(QueueError::NotFound(id.clone())),
            Err(e) => Err(e.into()),
        }
    }

    pub fn len(&self) -> QueueResult<usize> {
        Ok(self.pending()?.len())
    }

    pub fn is_empty(&self) -> QueueResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Takes the exclusive claim on a job without blocking.
    ///
    /// Returns `None` if another worker holds it or the job is gone.
    pub fn claim(&self, id: &JobId) -> QueueResult<Option<JobClaim>> {
        let path = self.job_path(id);
        let file = match OpenOptions::new().read(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if file.try_lock_exclusive().is_err() {
            return Ok(None);
        }
        // The previous holder may have removed or replaced the file while we
        // waited on an old handle.
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(JobClaim { id: id.clone(), _file: file }))
    }

    /// Moves a job into the `failed/` directory.
    pub fn dead_letter(&self, id: &JobId) -> QueueResult<PathBuf> {
        let failed = self.failed_dir();
        fs::create_dir_all(&failed)?;
        let target = failed.join(format!("{}{}", JOB_FILE_PREFIX, id));
        match fs::rename(self.job_path(id), &target) {
            Ok(()) => {
                sync_dir(&self.dir);
                tracing::warn!(job = %id, "job dead-lettered");
                Ok(target)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(QueueError::NotFound(id.clone())),
            Err(e) => Err(e.into()),
        }
    }
}

fn list_jobs(dir: &Path) -> QueueResult<Vec<JobId>> {
    let mut ids = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(rest) = name.to_str().and_then(|n| n.strip_prefix(JOB_FILE_PREFIX)) else {
            continue;
        };
        match JobId::parse(rest) {
            Ok(id) => ids.push(id),
            Err(e) => tracing::warn!("ignoring queue entry {:?}: {}", name, e),
        }
    }
    ids.sort();
    Ok(ids)
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create_new(true).write(true).open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Flushes directory entries so renames survive a crash. Best-effort.
fn sync_dir(dir: &Path) {
    if let Ok(d) = File::open(dir) {
        let _ = d.sync_all();
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
