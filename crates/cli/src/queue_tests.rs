// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the offline job store.

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::tempdir;
use toucan_core::{ClockSource, JobIdGenerator, Operation, TagsRequest};
use toucan_core::{Sha1Digester, Signer};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

struct FixedClock(u64);

impl ClockSource for FixedClock {
    fn now_ms(&self) -> u64 {
        self.0
    }
}

fn age_file(path: &Path, by: Duration) {
    let file = OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - by).unwrap();
}

fn tags_job(stamp: u64) -> Job {
    let signer = Signer::new("PK", "AT", Arc::new(Sha1Digester));
    let req = TagsRequest::build(&signer, "D1", vec!["a".into(), "b".into()]);
    Job::post(JobId::new(Operation::AddTags, stamp), Operation::AddTags, "https://push.test/x?dta", &req, false).unwrap()
}

fn list_job(stamp: u64) -> Job {
    Job::get(JobId::new(Operation::ListTags, stamp), Operation::ListTags, "https://push.test/x?dtl=abc", false)
}

#[test]
fn test_persist_creates_prefixed_file() {
    let dir = tempdir().unwrap();
    let store = JobStore::open(dir.path()).unwrap();

    let path = store.persist(&tags_job(1000)).unwrap();

    assert_eq!(path.file_name().unwrap(), "toucan_client_pending_request_AddTags1000");
    assert!(path.exists());
    let names: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
    assert_eq!(names.len(), 1, "no temporary file left behind");
}

#[test]
fn test_persist_then_load_is_identical() {
    let dir = tempdir().unwrap();
    let store = JobStore::open(dir.path()).unwrap();

    for job in [tags_job(1), list_job(2)] {
        store.persist(&job).unwrap();
        let restored = store.load(&job.id).unwrap();
        assert_eq!(restored, job);
        assert_eq!(restored.request.method(), job.operation.method());
    }
}

#[test]
fn test_pending_is_sorted_and_filtered() {
    let dir = tempdir().unwrap();
    let store = JobStore::open(dir.path()).unwrap();
    store.persist(&list_job(3)).unwrap();
    store.persist(&tags_job(2)).unwrap();
    store.persist(&tags_job(1)).unwrap();

    fs::write(dir.path().join(".tmp-AddTags9"), "partial").unwrap();
    fs::write(dir.path().join("unrelated.txt"), "x").unwrap();
    fs::write(dir.path().join("toucan_client_pending_request_Bogus1"), "{}").unwrap();
    fs::create_dir(dir.path().join("toucan_client_pending_request_AddTags5")).unwrap();

    let ids: Vec<String> = store.pending().unwrap().iter().map(|id| id.to_string()).collect();
    assert_eq!(ids, vec!["AddTags1", "AddTags2", "ListTags3"]);
    assert_eq!(store.len().unwrap(), 3);
    assert!(!store.is_empty().unwrap());
}

#[test]
fn test_remove_deletes_once() {
    let dir = tempdir().unwrap();
    let store = JobStore::open(dir.path()).unwrap();
    let job = tags_job(1);
    store.persist(&job).unwrap();

    store.remove(&job.id).unwrap();
    assert!(store.is_empty().unwrap());
    assert!(matches!(store.remove(&job.id), Err(QueueError::NotFound(_))));
    assert!(matches!(store.load(&job.id), Err(QueueError::NotFound(_))));
}

#[test]
fn test_update_rewrites_bookkeeping() {
    let dir = tempdir().unwrap();
    let store = JobStore::open(dir.path()).unwrap();
    let mut job = tags_job(1);
    store.persist(&job).unwrap();

    job.record_failure("HTTP 503", 42);
    store.update(&job).unwrap();

    let restored = store.load(&job.id).unwrap();
    assert_eq!(restored.attempts, 1);
    assert_eq!(restored.not_before_ms, Some(42));
}

#[test]
fn test_persist_never_replaces_a_stored_job() {
    let dir = tempdir().unwrap();
    let store = JobStore::open(dir.path()).unwrap();
    // Two processes with their own generators, same millisecond.
    let first_gen = JobIdGenerator::with_clock(FixedClock(5_000));
    let second_gen = JobIdGenerator::with_clock(FixedClock(5_000));
    let first = Job::get(first_gen.next(Operation::DeviceEnable), Operation::DeviceEnable, "https://x/?de=FIRST", false);
    let second =
        Job::get(second_gen.next(Operation::DeviceEnable), Operation::DeviceEnable, "https://x/?de=SECOND", false);
    assert_eq!(first.id, second.id);

    store.persist(&first).unwrap();
    let err = store.persist(&second).unwrap_err();

    assert!(matches!(err, QueueError::AlreadyExists(ref id) if id == &first.id));
    assert_eq!(store.load(&first.id).unwrap().request.url(), "https://x/?de=FIRST");
    assert_eq!(store.len().unwrap(), 1);
    let names: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
    assert_eq!(names.len(), 1, "no temporary file left behind");
}

#[test]
fn test_update_missing_job() {
    let dir = tempdir().unwrap();
    let store = JobStore::open(dir.path()).unwrap();
    assert!(matches!(store.update(&tags_job(1)), Err(QueueError::NotFound(_))));
}

#[test]
fn test_load_corrupt_job() {
    let dir = tempdir().unwrap();
    let store = JobStore::open(dir.path()).unwrap();
    let id = JobId::new(Operation::AddTags, 1);
    fs::write(store.job_path(&id), "{broken").unwrap();

    assert!(matches!(store.load(&id), Err(QueueError::Corrupt { .. })));
}

#[test]
fn test_load_rejects_renamed_file() {
    let dir = tempdir().unwrap();
    let store = JobStore::open(dir.path()).unwrap();
    let job = tags_job(1);
    let path = store.persist(&job).unwrap();

    let other = JobId::new(Operation::AddTags, 2);
    fs::rename(path, store.job_path(&other)).unwrap();
    assert!(matches!(store.load(&other), Err(QueueError::Corrupt { .. })));
}

#[test]
fn test_claim_is_exclusive() {
    let dir = tempdir().unwrap();
    let store = JobStore::open(dir.path()).unwrap();
    let job = tags_job(1);
    store.persist(&job).unwrap();

    let first = store.claim(&job.id).unwrap();
    assert!(first.is_some());
    assert_eq!(first.as_ref().unwrap().id(), &job.id);

    let other = JobStore::open(dir.path()).unwrap();
    assert!(other.claim(&job.id).unwrap().is_none());

    drop(first);
    assert!(other.claim(&job.id).unwrap().is_some());
}

#[test]
fn test_claim_missing_job() {
    let dir = tempdir().unwrap();
    let store = JobStore::open(dir.path()).unwrap();
    assert!(store.claim(&JobId::new(Operation::AddTags, 1)).unwrap().is_none());
}

#[test]
fn test_claim_after_removal_by_holder() {
    let dir = tempdir().unwrap();
    let store = JobStore::open(dir.path()).unwrap();
    let job = tags_job(1);
    store.persist(&job).unwrap();

    let held = store.claim(&job.id).unwrap().unwrap();
    store.remove(&job.id).unwrap();
    drop(held);

    assert!(store.claim(&job.id).unwrap().is_none());
}

#[test]
fn test_dead_letter_moves_job() {
    let dir = tempdir().unwrap();
    let store = JobStore::open(dir.path()).unwrap();
    let job = tags_job(1);
    store.persist(&job).unwrap();

    let target = store.dead_letter(&job.id).unwrap();

    assert!(target.starts_with(dir.path().join("failed")));
    assert!(target.exists());
    assert!(store.is_empty().unwrap());
    assert_eq!(store.dead_letters().unwrap(), vec![job.id.clone()]);
    assert!(matches!(store.dead_letter(&job.id), Err(QueueError::NotFound(_))));
}

#[test]
fn test_dead_letters_empty_without_directory() {
    let dir = tempdir().unwrap();
    let store = JobStore::open(dir.path()).unwrap();
    assert!(store.dead_letters().unwrap().is_empty());
}

#[test]
fn test_open_creates_directory() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("state").join("queue");
    let store = JobStore::open(&nested).unwrap();
    assert!(nested.is_dir());
    assert_eq!(store.dir(), nested.as_path());
}

#[test]
fn test_open_sweeps_stale_temp_files() {
    let dir = tempdir().unwrap();
    let stale = dir.path().join(".tmp-41-0-AddTags1");
    let fresh = dir.path().join(".tmp-42-0-AddTags2");
    fs::write(&stale, "partial").unwrap();
    fs::write(&fresh, "in progress").unwrap();
    age_file(&stale, STALE_TMP_AGE + Duration::from_secs(60));

    let store = JobStore::open(dir.path()).unwrap();

    assert!(!stale.exists());
    assert!(fresh.exists());
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_sweep_leaves_jobs_alone() {
    let dir = tempdir().unwrap();
    let store = JobStore::open(dir.path()).unwrap();
    let path = store.persist(&tags_job(1)).unwrap();
    age_file(&path, Duration::from_secs(3600));

    assert_eq!(store.sweep_temp_files(Duration::ZERO), 0);
    assert!(path.exists());
}
