//! Array-field pagination tests against the in-memory document source.

use bson::{Bson, doc, oid::ObjectId};
use docjson::memory::InMemoryLoader;
use docjson::prelude::*;

fn seeded(comment_count: i32) -> (InMemoryLoader, ObjectId) {
    let loader = InMemoryLoader::new();
    let id = ObjectId::new();
    let comments: Vec<Bson> = (0..comment_count)
        .map(|n| Bson::String(format!("comment {n}")))
        .collect();
    loader
        .insert("posts", doc! { "_id": id, "title": "Post", "comments": comments })
        .unwrap();
    (loader, id)
}

#[test]
fn pages_one_array_field_without_loading_it_whole() {
    let (loader, id) = seeded(25);
    let page = paginate_field(
        &loader,
        "posts",
        &Bson::ObjectId(id),
        "comments",
        2,
        10,
        None,
    )
    .unwrap();

    assert_eq!(page.items.len(), 10);
    assert_eq!(page.items[0], Bson::String("comment 10".into()));
    // Total comes from the projected comments_count, not the slice.
    assert_eq!(page.total, 25);
    assert_eq!(page.pages(), 3);
    assert_eq!(page.prev_num(), Some(1));
    assert_eq!(page.next_num(), Some(3));
}

#[test]
fn explicit_total_wins_over_the_projection() {
    let (loader, id) = seeded(25);
    let page = paginate_field(
        &loader,
        "posts",
        &Bson::ObjectId(id),
        "comments",
        1,
        10,
        Some(100),
    )
    .unwrap();
    assert_eq!(page.total, 100);
    assert_eq!(page.pages(), 10);
}

#[test]
fn adjacent_field_pages_requery_the_loader() {
    let (loader, id) = seeded(25);
    let page = paginate_field(
        &loader,
        "posts",
        &Bson::ObjectId(id),
        "comments",
        2,
        10,
        None,
    )
    .unwrap();

    let next = page.next().unwrap();
    assert_eq!(next.items.len(), 5);
    assert_eq!(next.items[0], Bson::String("comment 20".into()));
    assert!(!next.has_next());

    let prev = page.prev().unwrap();
    assert_eq!(prev.items[0], Bson::String("comment 0".into()));
    assert!(!prev.has_prev());
}

#[test]
fn field_range_errors() {
    let (loader, id) = seeded(3);

    let err = paginate_field(
        &loader,
        "posts",
        &Bson::ObjectId(id),
        "comments",
        0,
        10,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, DocJsonError::InvalidPage(0)));

    let err = paginate_field(
        &loader,
        "posts",
        &Bson::ObjectId(id),
        "comments",
        2,
        10,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, DocJsonError::PageOutOfRange(2)));
}

#[test]
fn field_pages_iterate_with_the_same_window_as_result_pages() {
    let (loader, id) = seeded(200);
    let page = paginate_field(
        &loader,
        "posts",
        &Bson::ObjectId(id),
        "comments",
        10,
        10,
        None,
    )
    .unwrap();
    assert_eq!(page.pages(), 20);

    let nums: Vec<Option<usize>> = page.iter_pages_default().collect();
    assert_eq!(
        nums,
        vec![
            Some(1),
            Some(2),
            None,
            Some(8),
            Some(9),
            Some(10),
            Some(11),
            Some(12),
            None,
            Some(19),
            Some(20),
        ]
    );
}

#[test]
fn missing_document_propagates() {
    let loader = InMemoryLoader::new();
    let err = paginate_field(
        &loader,
        "posts",
        &Bson::ObjectId(ObjectId::new()),
        "comments",
        1,
        10,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, DocJsonError::DocumentNotFound(_, _)));
}
