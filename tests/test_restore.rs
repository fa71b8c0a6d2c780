use chrono::{Local, TimeZone};
use std::{path::Path, time::Duration};

use mailvault_lib::{
    store::{memory, RetryPolicy},
    Folder, FolderPath, Item, Mailbox, MemoryStore, RestoreBuilder, RestoreOutcome, Store,
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn item(subject: &str, sender: &str, minute: u32, size: u64) -> Item {
    Item {
        subject: Some(subject.into()),
        received_at: Local.with_ymd_and_hms(2024, 3, 5, 10, minute, 0).single(),
        sender: Some(Mailbox::new_nameless(sender)),
        size,
        ..Item::default()
    }
}

fn no_retry() -> RetryPolicy {
    RetryPolicy {
        attempts: 1,
        delay: Duration::ZERO,
    }
}

fn outcome<'a>(
    report: &'a mailvault_lib::RestoreReport,
    folder: &FolderPath,
) -> &'a RestoreOutcome {
    &report
        .records
        .iter()
        .find(|record| &record.folder == folder)
        .unwrap_or_else(|| panic!("no record for folder {}", folder))
        .outcome
}

#[test]
fn missing_folder_is_copied_whole() {
    init_logs();

    let source = MemoryStore::new("archive");
    let target = MemoryStore::new("live");

    let inbox = FolderPath::root().join("Inbox");
    let projects = inbox.join("Projects");
    source.create_folder(&inbox).unwrap();
    target.create_folder(&inbox).unwrap();
    for n in 0..5 {
        source
            .append_item(
                &projects,
                item(&format!("project {}", n), "alice@example.com", n, 100),
                b"raw".to_vec(),
            )
            .unwrap();
    }

    let report = RestoreBuilder::new().restore(&source, &target).unwrap();

    assert_eq!(
        &RestoreOutcome::RestoredFolder { items: 5 },
        outcome(&report, &projects)
    );
    assert_eq!(1, report.folders_restored);
    assert_eq!(5, report.items_restored);
    assert_eq!(0, report.errors);

    let target_projects = Folder::new(&inbox, "Projects");
    assert_eq!(5, target.count_items(&target_projects).unwrap());
}

#[test]
fn partial_item_loss_is_reconciled() {
    init_logs();

    let source = MemoryStore::new("archive");
    let target = MemoryStore::new("live");

    let inbox = FolderPath::root().join("Inbox");
    source.create_folder(&inbox).unwrap();
    target.create_folder(&inbox).unwrap();

    // Nine items present on both sides, three more in the source
    // only.
    for n in 0..9 {
        let shared = item(&format!("shared {}", n), "alice@example.com", n, 200);
        source
            .append_item(&inbox, shared.clone(), b"raw".to_vec())
            .unwrap();
        target.append_item(&inbox, shared, b"raw".to_vec()).unwrap();
    }
    for n in 0..3 {
        source
            .append_item(
                &inbox,
                item(&format!("lost {}", n), "bob@example.com", 30 + n, 300),
                b"raw".to_vec(),
            )
            .unwrap();
    }

    let report = RestoreBuilder::new().restore(&source, &target).unwrap();

    assert_eq!(
        &RestoreOutcome::RestoredItems {
            copied: 3,
            skipped: 9
        },
        outcome(&report, &inbox)
    );
    assert_eq!(3, report.items_restored);
    assert_eq!(9, report.duplicates_skipped);
    assert_eq!(12, target.count_items(&Folder::new(&FolderPath::root(), "Inbox")).unwrap());
}

#[test]
fn restore_is_idempotent() {
    init_logs();

    let source = MemoryStore::new("archive");
    let target = MemoryStore::new("live");

    let inbox = FolderPath::root().join("Inbox");
    let projects = inbox.join("Projects");
    source.create_folder(&projects).unwrap();
    target.create_folder(&inbox).unwrap();
    for n in 0..4 {
        source
            .append_item(
                &inbox,
                item(&format!("mail {}", n), "alice@example.com", n, 150),
                b"raw".to_vec(),
            )
            .unwrap();
    }
    for n in 0..6 {
        source
            .append_item(
                &projects,
                item(&format!("project {}", n), "alice@example.com", n, 80),
                b"raw".to_vec(),
            )
            .unwrap();
    }

    let builder = RestoreBuilder::new();
    let first = builder.restore(&source, &target).unwrap();
    assert_eq!(1, first.folders_restored);
    assert_eq!(10, first.items_restored);

    // Running again against the fully restored target copies
    // nothing: item counts now match everywhere, so every pair is
    // checked without a single copy.
    let second = builder.restore(&source, &target).unwrap();
    assert_eq!(0, second.folders_restored);
    assert_eq!(0, second.items_restored);
    assert_eq!(0, second.errors);
    assert!(second
        .records
        .iter()
        .all(|record| record.outcome == RestoreOutcome::Checked));
}

#[test]
fn dedup_matches_by_metadata_not_identity() {
    init_logs();

    let source = MemoryStore::new("archive");
    let target = MemoryStore::new("live");

    let inbox = FolderPath::root().join("Inbox");
    source.create_folder(&inbox).unwrap();
    target.create_folder(&inbox).unwrap();

    let original = item("Q1 Report", "a@x.com", 0, 1000);
    target
        .append_item(&inbox, original.clone(), b"raw".to_vec())
        .unwrap();

    // Identical subject, sender and receipt date: already present.
    source
        .append_item(&inbox, original, b"raw".to_vec())
        .unwrap();
    // Same subject but different sender and size: missing.
    source
        .append_item(&inbox, item("Q1 Report", "b@y.com", 30, 2500), b"raw".to_vec())
        .unwrap();

    let report = RestoreBuilder::new().restore(&source, &target).unwrap();

    assert_eq!(
        &RestoreOutcome::RestoredItems {
            copied: 1,
            skipped: 1
        },
        outcome(&report, &inbox)
    );
    assert_eq!(2, target.count_items(&Folder::new(&FolderPath::root(), "Inbox")).unwrap());
}

#[test]
fn matched_folders_need_no_action() {
    init_logs();

    let source = MemoryStore::new("archive");
    let target = MemoryStore::new("live");

    let drafts = FolderPath::root().join("Drafts");
    source.create_folder(&drafts).unwrap();
    target.create_folder(&drafts).unwrap();

    let report = RestoreBuilder::new().restore(&source, &target).unwrap();

    assert_eq!(&RestoreOutcome::Checked, outcome(&report, &drafts));
    assert_eq!(0, report.items_restored);
    assert_eq!(0, report.folders_restored);
    assert_eq!(0, report.errors);
}

#[test]
fn dry_run_writes_nothing() {
    init_logs();

    let source = MemoryStore::new("archive");
    let target = MemoryStore::new("live");

    let inbox = FolderPath::root().join("Inbox");
    let projects = inbox.join("Projects");
    source.create_folder(&projects).unwrap();
    target.create_folder(&inbox).unwrap();
    for n in 0..3 {
        source
            .append_item(
                &projects,
                item(&format!("project {}", n), "alice@example.com", n, 100),
                b"raw".to_vec(),
            )
            .unwrap();
    }

    let report = RestoreBuilder::new()
        .dry_run(true)
        .restore(&source, &target)
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(1, report.folders_restored);

    // The target tree was not touched.
    let target_root = target.root().unwrap();
    assert_eq!(1, target.list_folders(&target_root).unwrap().len());
    let target_inbox = Folder::new(&FolderPath::root(), "Inbox");
    assert!(target.list_folders(&target_inbox).unwrap().is_empty());
}

#[test]
fn failed_copies_are_logged_and_skipped() {
    init_logs();

    struct FlakyTarget<'a> {
        inner: &'a MemoryStore,
        poisoned: FolderPath,
    }

    impl Store for FlakyTarget<'_> {
        fn name(&self) -> &str {
            self.inner.name()
        }
        fn path(&self) -> Option<&Path> {
            self.inner.path()
        }
        fn root(&self) -> mailvault_lib::store::Result<Folder> {
            self.inner.root()
        }
        fn list_folders(&self, folder: &Folder) -> mailvault_lib::store::Result<Vec<Folder>> {
            self.inner.list_folders(folder)
        }
        fn count_items(&self, folder: &Folder) -> mailvault_lib::store::Result<usize> {
            self.inner.count_items(folder)
        }
        fn list_items(&self, folder: &Folder) -> mailvault_lib::store::Result<Vec<Item>> {
            self.inner.list_items(folder)
        }
        fn fetch_item(&self, folder: &Folder, item: &Item) -> mailvault_lib::store::Result<Vec<u8>> {
            self.inner.fetch_item(folder, item)
        }
        fn add_folder(&self, parent: &Folder, name: &str) -> mailvault_lib::store::Result<Folder> {
            self.inner.add_folder(parent, name)
        }
        fn add_item(
            &self,
            folder: &Folder,
            item: &Item,
            raw: &[u8],
        ) -> mailvault_lib::store::Result<()> {
            if folder.path == self.poisoned {
                return Err(memory::Error::FindFolderError(folder.path.clone()))?;
            }
            self.inner.add_item(folder, item, raw)
        }
    }

    let source = MemoryStore::new("archive");
    let inner = MemoryStore::new("live");

    let inbox = FolderPath::root().join("Inbox");
    let sent = FolderPath::root().join("Sent");
    source.create_folder(&inbox).unwrap();
    source.create_folder(&sent).unwrap();
    inner.create_folder(&inbox).unwrap();
    for n in 0..2 {
        source
            .append_item(
                &inbox,
                item(&format!("mail {}", n), "alice@example.com", n, 100),
                b"raw".to_vec(),
            )
            .unwrap();
    }
    for n in 0..3 {
        source
            .append_item(
                &sent,
                item(&format!("sent {}", n), "alice@example.com", n, 100),
                b"raw".to_vec(),
            )
            .unwrap();
    }

    let target = FlakyTarget {
        inner: &inner,
        poisoned: inbox.clone(),
    };

    let report = RestoreBuilder::new()
        .retry(no_retry())
        .restore(&source, &target)
        .unwrap();

    // Both Inbox items failed to copy, each got its own error
    // record, and the folder still closed with an item summary.
    assert_eq!(2, report.errors);
    assert!(report.records.iter().any(|record| {
        record.folder == inbox
            && record.outcome
                == RestoreOutcome::RestoredItems {
                    copied: 0,
                    skipped: 0,
                }
    }));

    // The sibling folder was still restored in full.
    assert_eq!(
        &RestoreOutcome::RestoredFolder { items: 3 },
        outcome(&report, &sent)
    );
    assert_eq!(3, inner.count_items(&Folder::new(&FolderPath::root(), "Sent")).unwrap());
}
