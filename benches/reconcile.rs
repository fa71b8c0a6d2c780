use chrono::{Local, TimeZone};
use criterion::{criterion_group, criterion_main, Criterion};

use mailvault_lib::{
    CompareBuilder, FolderPath, Item, Mailbox, MemoryStore, MetadataSignature, SignatureIndex,
};

fn item(n: usize) -> Item {
    Item {
        subject: Some(format!("message {}", n)),
        received_at: Local
            .with_ymd_and_hms(2024, 3, 1 + (n % 28) as u32, 10, (n % 60) as u32, 0)
            .single(),
        sender: Some(Mailbox::new_nameless(format!("sender{}@example.com", n % 7))),
        size: 1000 + n as u64,
        ..Item::default()
    }
}

fn populated_store(name: &str, folders: usize, items_per_folder: usize) -> MemoryStore {
    let store = MemoryStore::new(name);
    for f in 0..folders {
        let path = FolderPath::root().join(format!("Folder {}", f));
        store.create_folder(&path).unwrap();
        for n in 0..items_per_folder {
            store.append_item(&path, item(n), Vec::new()).unwrap();
        }
    }
    store
}

fn bench_compare(c: &mut Criterion) {
    let source = populated_store("live", 100, 10);
    let target = populated_store("archive", 100, 10);

    c.bench_function("compare 100 folders", |b| {
        b.iter(|| CompareBuilder::new().compare(&source, &target).unwrap())
    });
}

fn bench_signature_index(c: &mut Criterion) {
    let items: Vec<Item> = (0..1000).map(item).collect();
    let probe = item(500);

    c.bench_function("signature index 1k items", |b| {
        b.iter(|| {
            let index = SignatureIndex::build(&MetadataSignature, &items);
            assert!(index.contains(&MetadataSignature, &probe));
        })
    });
}

criterion_group!(benches, bench_compare, bench_signature_index);
criterion_main!(benches);
