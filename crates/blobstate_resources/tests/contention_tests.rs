//! Concurrent writers on one resource path.
//!
//! Rivals are injected between a transaction's read and its commit with
//! [`HookedStore`]: the hooked manager commits through the decorator, the
//! rival through the undecorated inner store, so only the hooked manager's
//! commits trigger further interference.

use blobstate_core::testing::HookedStore;
use blobstate_core::{DocumentStore, InMemoryDocumentStore, RunnerConfig};
use blobstate_resources::{ManagerConfig, PutRequest, ResourceError, ResourceManager};
use blobstate_storage::{BlobStore, InMemoryBlobStore};
use std::io::Read;
use std::sync::Arc;
use std::thread;

const TAHR: &str = "/blob/s/trusty/tahr.gz";

struct Fixture {
    hooked: Arc<HookedStore<InMemoryDocumentStore>>,
    blobs: Arc<InMemoryBlobStore>,
    subject: ResourceManager,
    rival: ResourceManager,
}

impl Fixture {
    fn new(config: ManagerConfig) -> Self {
        let hooked = Arc::new(HookedStore::new(Arc::new(InMemoryDocumentStore::new())));
        let blobs = Arc::new(InMemoryBlobStore::new());
        let subject = ResourceManager::new(
            config.clone(),
            Arc::clone(&hooked) as Arc<dyn DocumentStore>,
            Arc::clone(&blobs) as Arc<dyn BlobStore>,
        );
        let rival = ResourceManager::new(
            config,
            hooked.inner(),
            Arc::clone(&blobs) as Arc<dyn BlobStore>,
        );
        Self {
            hooked,
            blobs,
            subject,
            rival,
        }
    }

    /// Queues `count` commits by the rival, one before each of the
    /// subject's next commits.
    fn rival_puts_before_commits(&self, count: usize) {
        for n in 1..=count {
            let rival = self.rival.clone();
            let body = format!("rival-{n}");
            self.hooked.push_before(move || {
                rival
                    .put(&PutRequest::new(TAHR), body.as_bytes())
                    .unwrap();
            });
        }
    }
}

fn content(manager: &ResourceManager, path: &str) -> String {
    let mut out = String::new();
    manager
        .get(path)
        .unwrap()
        .read_to_string(&mut out)
        .unwrap();
    out
}

#[test]
fn put_gives_up_after_three_lost_commits() {
    let fx = Fixture::new(ManagerConfig::default());
    fx.rival_puts_before_commits(3);

    let err = fx
        .subject
        .put(&PutRequest::new(TAHR), &b"subject"[..])
        .unwrap_err();
    match err {
        ResourceError::ExcessiveContention { path, attempts } => {
            assert_eq!(path, TAHR);
            assert_eq!(attempts, 3);
        }
        other => panic!("expected contention, got {other:?}"),
    }

    assert_eq!(fx.hooked.pending_hooks(), 0);
    assert_eq!(content(&fx.subject, TAHR), "rival-3");
    // The subject's blob and the rival's superseded blobs are all gone.
    assert_eq!(fx.blobs.len(), 1);
}

#[test]
fn put_wins_on_last_attempt() {
    let fx = Fixture::new(ManagerConfig::default());
    fx.rival_puts_before_commits(2);

    let stored = fx
        .subject
        .put(&PutRequest::new(TAHR), &b"subject"[..])
        .unwrap();
    assert_eq!(stored.size, 7);
    assert_eq!(content(&fx.rival, TAHR), "subject");
    assert_eq!(fx.blobs.len(), 1, "rival's last blob must be removed");
}

#[test]
fn larger_retry_budget_outlasts_rival() {
    let config = ManagerConfig::default().runner(RunnerConfig::new().max_attempts(5));
    let fx = Fixture::new(config);
    fx.rival_puts_before_commits(4);

    fx.subject
        .put(&PutRequest::new(TAHR), &b"subject"[..])
        .unwrap();
    assert_eq!(content(&fx.subject, TAHR), "subject");
    assert_eq!(fx.blobs.len(), 1);
}

#[test]
fn racing_deletes_one_wins() {
    let fx = Fixture::new(ManagerConfig::default());
    fx.subject.put(&PutRequest::new(TAHR), &b"abc"[..]).unwrap();

    let rival = fx.rival.clone();
    let (tx, rx) = std::sync::mpsc::channel();
    fx.hooked.push_before(move || {
        tx.send(rival.delete(TAHR)).unwrap();
    });

    let err = fx.subject.delete(TAHR).unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
    rx.recv().unwrap().unwrap();

    assert!(fx.subject.get(TAHR).unwrap_err().is_not_found());
    assert!(fx.blobs.is_empty());
}

#[test]
fn delete_yields_to_concurrent_replacement() {
    let fx = Fixture::new(ManagerConfig::default());
    fx.subject.put(&PutRequest::new(TAHR), &b"old"[..]).unwrap();
    fx.rival_puts_before_commits(1);

    fx.subject.delete(TAHR).unwrap();

    assert_eq!(content(&fx.subject, TAHR), "rival-1");
    assert_eq!(fx.blobs.len(), 1);
}

#[test]
fn concurrent_puts_leave_one_record_and_one_blob() {
    let docs: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
    let blobs = Arc::new(InMemoryBlobStore::new());
    let manager = ResourceManager::new(
        ManagerConfig::default(),
        docs,
        Arc::clone(&blobs) as Arc<dyn BlobStore>,
    );

    let bodies: Vec<String> = (0..8).map(|n| format!("writer-{n}")).collect();
    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = bodies
            .iter()
            .map(|body| {
                let manager = manager.clone();
                scope.spawn(move || manager.put(&PutRequest::new(TAHR), body.as_bytes()))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    let mut succeeded = 0;
    for result in &results {
        match result {
            Ok(_) => succeeded += 1,
            Err(e) => assert!(e.is_excessive_contention(), "unexpected error {e:?}"),
        }
    }
    assert!(succeeded >= 1);

    let stored = content(&manager, TAHR);
    assert!(bodies.contains(&stored));
    assert_eq!(blobs.len(), 1);
    assert_eq!(
        manager
            .list(&blobstate_resources::ResourceFilter::new())
            .unwrap()
            .len(),
        1
    );
}
