//! Shared fixtures: a small blog schema over the in-memory backend.

#![allow(dead_code)]

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use rill_orm::{
    Cast, Database, Entity, EntityDef, MemoryConnection, Registry, RelationDef, Row,
};

/// Authors write posts and have one profile.
pub struct Author;

static AUTHOR_DEF: Lazy<EntityDef> = Lazy::new(|| {
    EntityDef::builder("Author")
        .fillable(["name", "email"])
        .hidden(["email"])
        .mutator("email", |_model, value| match value {
            Value::String(s) => Value::String(s.to_lowercase()),
            other => other,
        })
        .relation(RelationDef::has_many("posts", || Post::definition()))
        .relation(RelationDef::has_one("profile", || Profile::definition()))
        .build()
});

impl Entity for Author {
    fn definition() -> &'static EntityDef {
        &AUTHOR_DEF
    }
}

/// Posts belong to an author and carry tags through a pivot table.
pub struct Post;

static POST_DEF: Lazy<EntityDef> = Lazy::new(|| {
    EntityDef::builder("Post")
        .fillable(["title", "author_id", "published", "views", "meta"])
        .cast("published", Cast::Bool)
        .cast("views", Cast::Int)
        .cast("meta", Cast::Json)
        .accessor("excerpt", |model, _raw| {
            match model.get("title") {
                Value::String(title) => Value::String(title.chars().take(10).collect()),
                _ => Value::Null,
            }
        })
        .scope("published", |query| query.where_eq("published", true))
        .relation(RelationDef::belongs_to("author", || Author::definition()))
        .relation(RelationDef::belongs_to_many("tags", || Tag::definition()))
        .build()
});

impl Entity for Post {
    fn definition() -> &'static EntityDef {
        &POST_DEF
    }
}

pub struct Profile;

static PROFILE_DEF: Lazy<EntityDef> = Lazy::new(|| {
    EntityDef::builder("Profile")
        .timestamps(false)
        .fillable(["author_id", "bio"])
        .relation(RelationDef::belongs_to("author", || Author::definition()))
        .build()
});

impl Entity for Profile {
    fn definition() -> &'static EntityDef {
        &PROFILE_DEF
    }
}

pub struct Tag;

static TAG_DEF: Lazy<EntityDef> = Lazy::new(|| {
    EntityDef::builder("Tag")
        .timestamps(false)
        .guarded(["secret"])
        .relation(RelationDef::belongs_to_many("posts", || Post::definition()))
        .build()
});

impl Entity for Tag {
    fn definition() -> &'static EntityDef {
        &TAG_DEF
    }
}

/// Soft-deletable entity.
pub struct Document;

static DOCUMENT_DEF: Lazy<EntityDef> = Lazy::new(|| {
    EntityDef::builder("Document")
        .soft_deletes()
        .fillable(["title"])
        .build()
});

impl Entity for Document {
    fn definition() -> &'static EntityDef {
        &DOCUMENT_DEF
    }
}

/// Entity whose boot hook installs a global scope.
pub struct Draft;

fn boot_draft(registry: &Registry) {
    registry.add_global_scope(Draft::definition(), "unarchived", |query| {
        query.where_eq("archived", false)
    });
}

static DRAFT_DEF: Lazy<EntityDef> = Lazy::new(|| {
    EntityDef::builder("Draft")
        .timestamps(false)
        .fillable(["title", "archived"])
        .boot(boot_draft)
        .build()
});

impl Entity for Draft {
    fn definition() -> &'static EntityDef {
        &DRAFT_DEF
    }
}

/// A fresh database over a fresh in-memory connection. Run tests with
/// `RUST_LOG=rill_orm=debug` to see statement logging.
pub fn database() -> (Database, Arc<MemoryConnection>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    let connection = Arc::new(MemoryConnection::new());
    let database = Database::new(connection.clone());
    (database, connection)
}

pub fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// One author with two published posts and one unpublished.
pub fn seed_blog(database: &Database) -> Value {
    let author = Author::create(
        database,
        json!({"name": "Ada", "email": "ADA@example.com"}),
    )
    .expect("author");
    let author_id = author.primary_key_value();
    for (title, published) in [
        ("Analytical engines", true),
        ("Notes on notation", true),
        ("Unfinished draft", false),
    ] {
        Post::create(
            database,
            json!({"title": title, "author_id": author_id, "published": published, "views": 0}),
        )
        .expect("post");
    }
    author_id
}
