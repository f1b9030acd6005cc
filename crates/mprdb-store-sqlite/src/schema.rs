//! SQL schema for the mprdb SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Remote nodes whose assertions are folded into the aggregate.
-- Rows are only ever inserted; `seq` preserves registration order.
CREATE TABLE IF NOT EXISTS sources (
    seq           INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id     TEXT NOT NULL UNIQUE,
    display_name  TEXT NOT NULL,
    public_key    TEXT NOT NULL,       -- armored public key
    trust_level   INTEGER NOT NULL CHECK (trust_level BETWEEN 1 AND 5),
    registered_at TEXT NOT NULL        -- ISO 8601 UTC
);

-- Assertions authored and published by this node.
CREATE TABLE IF NOT EXISTS submissions (
    operation_id  TEXT PRIMARY KEY,
    subject_id    TEXT NOT NULL,
    score         REAL NOT NULL,
    justification TEXT NOT NULL,
    issued_at     TEXT NOT NULL        -- ISO 8601 UTC
);

-- Derived table; wiped and rebuilt by every aggregate rebuild.
CREATE TABLE IF NOT EXISTS reputation (
    subject_id TEXT PRIMARY KEY,
    score      REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS submissions_issued_idx ON submissions(issued_at);
CREATE INDEX IF NOT EXISTS reputation_score_idx   ON reputation(score);

PRAGMA user_version = 1;
";
