//! Database migrations

/// SQL for creating the database schema
pub const INIT_SCHEMA: &str = r#"
-- Labeled items: latent feature vector (JSON array) plus label and index
CREATE TABLE IF NOT EXISTS user_division (
    user_id TEXT PRIMARY KEY,
    user_latent_feature TEXT NOT NULL,
    user_interest TEXT NOT NULL,
    user_interest_index INTEGER
);

-- Latest cluster metrics, replaced wholesale on every run
CREATE TABLE IF NOT EXISTS cluster_metrics (
    label TEXT PRIMARY KEY,
    position INTEGER NOT NULL,
    intra_dispersion REAL NOT NULL,
    inter_distance REAL NOT NULL,
    size INTEGER NOT NULL,
    computed_at TEXT NOT NULL
);

-- Latest keyword rankings, one row per cluster index
CREATE TABLE IF NOT EXISTS top_keywords (
    interest_index INTEGER PRIMARY KEY,
    keywords TEXT NOT NULL,
    computed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_user_division_interest ON user_division(user_interest);
"#;
