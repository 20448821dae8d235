//! Relationship Key Inference
//!
//! Conventions used when a relationship definition omits explicit keys:
//! foreign keys are the snake-cased entity name plus `_id`, pivot tables are
//! the two related table names sorted and joined with `_`.

/// Convert an entity type name to snake_case (`BlogPost` -> `blog_post`).
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}

/// Default foreign key column for an entity type name (`Author` -> `author_id`).
pub fn foreign_key(entity_name: &str) -> String {
    format!("{}_id", snake_case(entity_name))
}

/// Default table name for an entity type name (`Author` -> `authors`).
pub fn table_name(entity_name: &str) -> String {
    format!("{}s", snake_case(entity_name))
}

/// Default pivot table name: both table names sorted, joined with `_`.
pub fn pivot_table(local_table: &str, foreign_table: &str) -> String {
    let mut tables = [local_table, foreign_table];
    tables.sort_unstable();
    tables.join("_")
}
