//! SQL schema for the Vigil SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Geofence snapshots, pushed by the account collaborator. The engine only
-- ever reads these; home coordinates change through set_home.
CREATE TABLE IF NOT EXISTS wards (
    ward_id       TEXT PRIMARY KEY,
    display_name  TEXT,
    home_lat      REAL NOT NULL,
    home_lng      REAL NOT NULL,
    safe_radius_m REAL NOT NULL DEFAULT 100.0
);

-- Location samples are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS location_samples (
    sample_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    ward_id     TEXT NOT NULL REFERENCES wards(ward_id),
    lat         REAL NOT NULL,
    lng         REAL NOT NULL,
    captured_at TEXT NOT NULL    -- ISO 8601 UTC, caller-supplied
);

-- Latest-position projection: one row per ward, replaced unconditionally on
-- every recorded sample.
CREATE TABLE IF NOT EXISTS latest_positions (
    ward_id     TEXT PRIMARY KEY REFERENCES wards(ward_id),
    lat         REAL NOT NULL,
    lng         REAL NOT NULL,
    captured_at TEXT NOT NULL
);

-- Presence state, 1:1 with wards, created lazily on first report.
CREATE TABLE IF NOT EXISTS ward_presence (
    ward_id             TEXT PRIMARY KEY REFERENCES wards(ward_id),
    is_outside          INTEGER NOT NULL,
    last_alert_at       TEXT NOT NULL,
    alert_interval_secs INTEGER NOT NULL DEFAULT 10,
    last_lat            REAL NOT NULL,
    last_lng            REAL NOT NULL,
    last_moved_at       TEXT NOT NULL
);

-- Missing cases are never deleted; FOUND rows remain for audit.
CREATE TABLE IF NOT EXISTS missing_cases (
    case_id     TEXT PRIMARY KEY,
    ward_id     TEXT NOT NULL REFERENCES wards(ward_id),
    detected_at TEXT NOT NULL,
    last_lat    REAL,
    last_lng    REAL,
    status      TEXT NOT NULL,   -- 'missing' | 'found'
    notes       TEXT NOT NULL DEFAULT '',
    updated_at  TEXT NOT NULL
);

-- At most one open case per ward; a FOUND case never blocks re-opening.
CREATE UNIQUE INDEX IF NOT EXISTS cases_open_ward_idx
    ON missing_cases(ward_id) WHERE status = 'missing';

CREATE INDEX IF NOT EXISTS samples_ward_idx   ON location_samples(ward_id);
CREATE INDEX IF NOT EXISTS cases_detected_idx ON missing_cases(detected_at);

PRAGMA user_version = 1;
";
