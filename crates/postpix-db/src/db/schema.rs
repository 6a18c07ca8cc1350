/// DDL for the `posts` table.
///
/// Only ever creates; existing tables and rows are left untouched, so it is safe to
/// run on every start.
pub const CREATE_POSTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS posts (
        id SERIAL PRIMARY KEY,
        image_url VARCHAR(255),
        title VARCHAR(100),
        text TEXT,
        tags VARCHAR(100),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;
