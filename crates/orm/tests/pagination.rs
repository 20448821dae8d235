//! Pagination boundaries: full mode with COUNT, simple mode with the
//! one-extra-row probe, and eager loading over pages.

mod common;

use serde_json::json;

use common::{database, Author, Post};
use rill_orm::Entity;

fn seed_posts(db: &rill_orm::Database, count: usize) {
    for i in 0..count {
        Post::create(db, json!({"title": format!("Post {i}")})).unwrap();
    }
}

#[test]
fn five_rows_at_three_per_page_make_two_pages() {
    let (db, _) = database();
    seed_posts(&db, 5);

    let first = Post::query(&db).order_by_asc("id").paginate(1, 3).unwrap();
    assert_eq!(first.total(), Some(5));
    assert_eq!(first.last_page(), Some(2));
    assert_eq!(first.len(), 3);
    assert!(first.has_more_pages());
    assert!(first.on_first_page());

    let second = Post::query(&db).order_by_asc("id").paginate(2, 3).unwrap();
    assert_eq!(second.len(), 2);
    assert!(!second.has_more_pages());
    assert_eq!(second.items().pluck("title"), vec![json!("Post 3"), json!("Post 4")]);
}

#[test]
fn out_of_range_pages_clamp() {
    let (db, _) = database();
    seed_posts(&db, 5);

    let clamped_high = Post::query(&db).paginate(99, 3).unwrap();
    assert_eq!(clamped_high.current_page(), 2);
    assert_eq!(clamped_high.len(), 2);

    let clamped_low = Post::query(&db).paginate(0, 3).unwrap();
    assert_eq!(clamped_low.current_page(), 1);
}

#[test]
fn empty_result_set_still_reports_one_page() {
    let (db, _) = database();
    let page = Post::query(&db).paginate(1, 10).unwrap();
    assert_eq!(page.total(), Some(0));
    assert_eq!(page.last_page(), Some(1));
    assert!(page.is_empty());
    assert!(!page.has_more_pages());
}

#[test]
fn simple_pagination_probes_without_counting() {
    let (db, connection) = database();
    seed_posts(&db, 5);

    connection.reset_statement_count();
    let first = Post::query(&db)
        .order_by_asc("id")
        .simple_paginate(1, 3)
        .unwrap();
    // One SELECT, no COUNT.
    assert_eq!(connection.statements_executed(), 1);
    assert_eq!(first.total(), None);
    assert_eq!(first.last_page(), None);
    assert_eq!(first.page_range(), None);
    assert_eq!(first.len(), 3);
    assert!(first.has_more_pages());

    let second = Post::query(&db)
        .order_by_asc("id")
        .simple_paginate(2, 3)
        .unwrap();
    assert_eq!(second.len(), 2);
    assert!(!second.has_more_pages());
}

#[test]
fn paginated_pages_support_eager_loading() {
    let (db, connection) = database();
    let author = Author::create(&db, json!({"name": "Ada", "email": "a@b.c"})).unwrap();
    let author_id = author.primary_key_value();
    for i in 0..4 {
        Post::create(&db, json!({"title": format!("P{i}"), "author_id": author_id})).unwrap();
    }

    connection.reset_statement_count();
    let page = Post::query(&db)
        .order_by_asc("id")
        .with("author")
        .paginate(1, 2)
        .unwrap();
    // COUNT + page SELECT + one eager query.
    assert_eq!(connection.statements_executed(), 3);
    for post in page.items() {
        assert_eq!(
            post.related("author").unwrap().one().unwrap().get("name"),
            json!("Ada")
        );
    }

    let meta = page.to_value();
    assert_eq!(meta["meta"]["total"], json!(4));
    assert_eq!(meta["meta"]["current_page"], json!(1));
    assert_eq!(meta["data"].as_array().unwrap().len(), 2);
}

#[test]
fn pagination_urls_carry_the_page_parameter() {
    let (db, _) = database();
    seed_posts(&db, 5);

    let page = Post::query(&db)
        .paginate(1, 2)
        .unwrap()
        .with_path("/posts")
        .append_query("sort", "id");
    assert_eq!(page.next_page_url(), Some("/posts?page=2&sort=id".to_string()));
    assert_eq!(page.previous_page_url(), None);
    assert_eq!(page.page_range(), Some(vec![1, 2, 3]));
}
