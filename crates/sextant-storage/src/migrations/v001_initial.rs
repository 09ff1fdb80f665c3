//! v001: runs, run_failures, facts, patterns, pattern_matches.

pub const MIGRATION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS runs (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    spec_version TEXT NOT NULL,
    message_root TEXT NOT NULL,
    airline_code TEXT,
    status TEXT NOT NULL,
    started_at TEXT NOT NULL,
    completed_at TEXT,
    fragments INTEGER NOT NULL DEFAULT 0,
    facts INTEGER NOT NULL DEFAULT 0,
    matches INTEGER NOT NULL DEFAULT 0,
    patterns INTEGER NOT NULL DEFAULT 0,
    failures INTEGER NOT NULL DEFAULT 0,
    error TEXT
) STRICT;

CREATE TABLE IF NOT EXISTS run_failures (
    run_id TEXT NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    section_path TEXT NOT NULL,
    detail TEXT NOT NULL,
    created_at TEXT NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_run_failures_run ON run_failures(run_id);

CREATE TABLE IF NOT EXISTS facts (
    id TEXT PRIMARY KEY,
    run_id TEXT NOT NULL REFERENCES runs(id),
    spec_version TEXT NOT NULL,
    message_root TEXT NOT NULL,
    airline_code TEXT,
    section_path TEXT NOT NULL,
    node_type TEXT NOT NULL,
    ordinal INTEGER NOT NULL,
    attributes TEXT NOT NULL,
    children TEXT NOT NULL,
    references_json TEXT NOT NULL,
    confidence REAL NOT NULL,
    snippet TEXT,
    masked INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_facts_run ON facts(run_id, ordinal);

CREATE TABLE IF NOT EXISTS patterns (
    id TEXT PRIMARY KEY,
    spec_version TEXT NOT NULL,
    message_root TEXT NOT NULL,
    airline_code TEXT,
    section_path TEXT NOT NULL,
    decision_rule TEXT NOT NULL,
    signature_hash TEXT NOT NULL,
    times_seen INTEGER NOT NULL DEFAULT 1,
    examples TEXT NOT NULL,
    superseded_by TEXT,
    created_at TEXT NOT NULL,
    last_seen_at TEXT NOT NULL
) STRICT;

CREATE UNIQUE INDEX IF NOT EXISTS idx_patterns_signature
    ON patterns(spec_version, message_root, COALESCE(airline_code, ''), signature_hash);
CREATE INDEX IF NOT EXISTS idx_patterns_scope
    ON patterns(spec_version, message_root, section_path);

CREATE TABLE IF NOT EXISTS pattern_matches (
    id TEXT PRIMARY KEY,
    run_id TEXT NOT NULL REFERENCES runs(id),
    fact_id TEXT NOT NULL REFERENCES facts(id),
    pattern_id TEXT REFERENCES patterns(id) ON DELETE SET NULL,
    confidence REAL NOT NULL,
    verdict TEXT NOT NULL,
    created_at TEXT NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_pattern_matches_run ON pattern_matches(run_id);
CREATE INDEX IF NOT EXISTS idx_pattern_matches_pattern ON pattern_matches(pattern_id);
"#;
