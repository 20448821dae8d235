//! Eager loading: query-count bounds, equivalence with lazy resolution, and
//! attachment semantics for every relation kind.

mod common;

use serde_json::json;

use common::{database, Author, Post, Profile, Tag};
use rill_orm::{Entity, Related};

#[test]
fn author_with_posts_uses_exactly_two_queries() {
    let (db, connection) = database();
    let author = Author::create(&db, json!({"name": "Ada", "email": "a@b.c"})).unwrap();
    let author_id = author.primary_key_value();
    for title in ["First", "Second"] {
        Post::create(&db, json!({"title": title, "author_id": author_id})).unwrap();
    }

    connection.reset_statement_count();
    let authors = Author::query(&db).with("posts").get().unwrap();
    assert_eq!(connection.statements_executed(), 2);

    assert_eq!(authors.len(), 1);
    let posts = authors[0].related("posts").unwrap().many().unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts.pluck("title"), vec![json!("First"), json!("Second")]);
}

#[test]
fn query_count_stays_constant_as_roots_grow() {
    let (db, connection) = database();
    for i in 0..4 {
        let author =
            Author::create(&db, json!({"name": format!("A{i}"), "email": "x@y.z"})).unwrap();
        let author_id = author.primary_key_value();
        Profile::create(&db, json!({"author_id": author_id, "bio": "bio"})).unwrap();
        for j in 0..3 {
            Post::create(&db, json!({"title": format!("P{i}-{j}"), "author_id": author_id}))
                .unwrap();
        }
    }

    connection.reset_statement_count();
    let authors = Author::query(&db)
        .with("posts")
        .with("profile")
        .get()
        .unwrap();
    // 1 root + 1 per relation, independent of the number of roots.
    assert_eq!(connection.statements_executed(), 3);
    assert_eq!(authors.len(), 4);
    for author in &authors {
        assert_eq!(author.related("posts").unwrap().count(), 3);
        assert!(author.related("profile").unwrap().one().is_some());
    }
}

#[test]
fn eager_loading_matches_lazy_resolution() {
    let (db, _) = database();
    for i in 0..3 {
        let author =
            Author::create(&db, json!({"name": format!("A{i}"), "email": "x@y.z"})).unwrap();
        let author_id = author.primary_key_value();
        for j in 0..=i {
            Post::create(&db, json!({"title": format!("P{i}-{j}"), "author_id": author_id}))
                .unwrap();
        }
    }

    let eager = Author::query(&db).with("posts").get().unwrap();
    let mut lazy = Author::query(&db).get().unwrap();

    for (eager_author, lazy_author) in eager.iter().zip(lazy.iter_mut()) {
        let eager_ids: Vec<_> = eager_author
            .related("posts")
            .unwrap()
            .many()
            .unwrap()
            .pluck("id");
        let lazy_ids: Vec<_> = lazy_author
            .relation("posts")
            .unwrap()
            .many()
            .unwrap()
            .pluck("id");
        assert_eq!(eager_ids, lazy_ids);
    }
}

#[test]
fn roots_without_matches_are_loaded_as_empty() {
    let (db, _) = database();
    Author::create(&db, json!({"name": "Ada", "email": "a@b.c"})).unwrap();

    let authors = Author::query(&db).with("posts").with("profile").get().unwrap();
    let author = &authors[0];
    assert!(author.relation_loaded("posts"));
    assert!(author.relation_loaded("profile"));
    match author.related("posts").unwrap() {
        Related::Many(posts) => assert!(posts.is_empty()),
        other => panic!("expected collection, got {other:?}"),
    }
    match author.related("profile").unwrap() {
        Related::One(profile) => assert!(profile.is_none()),
        other => panic!("expected single, got {other:?}"),
    }
}

#[test]
fn belongs_to_with_null_foreign_key_resolves_to_none() {
    let (db, connection) = database();
    Post::create(&db, json!({"title": "Orphan"})).unwrap();

    // Eager path.
    let posts = Post::query(&db).with("author").get().unwrap();
    assert!(posts[0].related("author").unwrap().one().is_none());

    // Lazy path issues no query at all.
    let mut post = Post::query(&db).first().unwrap().unwrap();
    connection.reset_statement_count();
    assert!(post.relation("author").unwrap().one().is_none());
    assert_eq!(connection.statements_executed(), 0);
}

#[test]
fn belongs_to_groups_by_foreign_key() {
    let (db, connection) = database();
    let ada = Author::create(&db, json!({"name": "Ada", "email": "a@b.c"})).unwrap();
    let grace = Author::create(&db, json!({"name": "Grace", "email": "g@b.c"})).unwrap();
    Post::create(&db, json!({"title": "P1", "author_id": ada.primary_key_value()})).unwrap();
    Post::create(&db, json!({"title": "P2", "author_id": grace.primary_key_value()})).unwrap();
    Post::create(&db, json!({"title": "P3", "author_id": ada.primary_key_value()})).unwrap();

    connection.reset_statement_count();
    let posts = Post::query(&db).with("author").get().unwrap();
    assert_eq!(connection.statements_executed(), 2);
    let names: Vec<_> = posts
        .iter()
        .map(|post| post.related("author").unwrap().one().unwrap().get("name"))
        .collect();
    assert_eq!(names, vec![json!("Ada"), json!("Grace"), json!("Ada")]);
}

#[test]
fn many_to_many_costs_one_extra_query() {
    let (db, connection) = database();
    let post_a = Post::create(&db, json!({"title": "A"})).unwrap();
    let post_b = Post::create(&db, json!({"title": "B"})).unwrap();
    let mut tag_ids = Vec::new();
    for name in ["rust", "orm"] {
        let mut tag = Tag::build(&db);
        tag.set("name", name);
        tag.save().unwrap();
        tag_ids.push(tag.primary_key_value());
    }
    let mut post_a = post_a;
    post_a.attach("tags", &tag_ids).unwrap();
    let mut post_b = post_b;
    post_b.attach("tags", &tag_ids[..1].to_vec()).unwrap();

    connection.reset_statement_count();
    let posts = Post::query(&db).with("tags").get().unwrap();
    // 1 root + 1 pivot + 1 related.
    assert_eq!(connection.statements_executed(), 3);

    let tags_a = posts[0].related("tags").unwrap().many().unwrap();
    let tags_b = posts[1].related("tags").unwrap().many().unwrap();
    assert_eq!(tags_a.len(), 2);
    assert_eq!(tags_b.len(), 1);
    assert_eq!(tags_b.pluck("name"), vec![json!("rust")]);
}

#[test]
fn unknown_relation_names_are_skipped_silently() {
    let (db, _) = database();
    Author::create(&db, json!({"name": "Ada", "email": "a@b.c"})).unwrap();

    let authors = Author::query(&db)
        .with("posts")
        .with("nonexistent")
        .get()
        .unwrap();
    assert!(authors[0].relation_loaded("posts"));
    assert!(!authors[0].relation_loaded("nonexistent"));
}

#[test]
fn duplicate_with_requests_are_idempotent() {
    let (db, connection) = database();
    let author = Author::create(&db, json!({"name": "Ada", "email": "a@b.c"})).unwrap();
    Post::create(&db, json!({"title": "Once", "author_id": author.primary_key_value()})).unwrap();

    connection.reset_statement_count();
    let authors = Author::query(&db)
        .with("posts")
        .with("posts")
        .with_many(["posts"])
        .get()
        .unwrap();
    assert_eq!(connection.statements_executed(), 2);
    assert_eq!(authors[0].related("posts").unwrap().count(), 1);
}
