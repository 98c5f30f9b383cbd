//! `SQLite` schema definitions for echallan.

/// Registered drivers. `face_descriptor` is a JSON array or NULL.
pub const CREATE_DRIVERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS drivers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    is_driver INTEGER NOT NULL DEFAULT 1,
    govt_id_type TEXT NOT NULL,
    govt_id_number TEXT NOT NULL,
    license_number TEXT NOT NULL,
    vehicle_number TEXT NOT NULL,
    vehicle_type TEXT NOT NULL,
    father_name TEXT NOT NULL,
    dob TEXT NOT NULL,
    blood_group TEXT NOT NULL,
    address TEXT NOT NULL,
    city TEXT NOT NULL,
    phone TEXT NOT NULL,
    license_expiry TEXT NOT NULL,
    photo TEXT NOT NULL,
    face_descriptor TEXT
)
";

/// Violation catalog.
pub const CREATE_VIOLATIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS violations (
    id TEXT PRIMARY KEY,
    code TEXT NOT NULL,
    category TEXT NOT NULL,
    violation TEXT NOT NULL,
    fine INTEGER NOT NULL,
    description TEXT NOT NULL
)
";

/// Issued memos. `violations` is the JSON array the kiosk posted.
pub const CREATE_MEMOS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS memos (
    id TEXT PRIMARY KEY,
    driver_id TEXT NOT NULL,
    officer_id TEXT NOT NULL,
    officer_name TEXT NOT NULL,
    location TEXT NOT NULL,
    violations TEXT NOT NULL,
    total_fine INTEGER NOT NULL,
    payment_status TEXT NOT NULL DEFAULT 'pending',
    date TEXT NOT NULL,
    FOREIGN KEY(driver_id) REFERENCES drivers(id)
)
";

/// Index for per-driver history.
pub const CREATE_MEMOS_DRIVER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_memos_driver ON memos(driver_id, date DESC)
";

/// Index for the daily prefix scan.
pub const CREATE_MEMOS_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_memos_date ON memos(date)
";

/// Append-only analytics snapshots.
pub const CREATE_ANALYTICS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS analytics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    total_violations INTEGER NOT NULL,
    total_fines INTEGER NOT NULL,
    active_officers INTEGER NOT NULL,
    violation_breakdown TEXT NOT NULL,
    payment_stats TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// Index for fetching the newest snapshot.
pub const CREATE_ANALYTICS_UPDATED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_analytics_updated ON analytics(updated_at DESC)
";

/// Districts of the location hierarchy.
pub const CREATE_DISTRICTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS districts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
)
";

/// Cities, each belonging to one district.
pub const CREATE_CITIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS cities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    district_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    FOREIGN KEY(district_id) REFERENCES districts(id)
)
";

/// Simulated cameras. `feeds` is a JSON array of image URLs.
pub const CREATE_CAMERAS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS cameras (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    feeds TEXT NOT NULL
)
";

/// Key-value metadata (schema version).
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_DRIVERS_TABLE,
    CREATE_VIOLATIONS_TABLE,
    CREATE_MEMOS_TABLE,
    CREATE_MEMOS_DRIVER_INDEX,
    CREATE_MEMOS_DATE_INDEX,
    CREATE_ANALYTICS_TABLE,
    CREATE_ANALYTICS_UPDATED_INDEX,
    CREATE_DISTRICTS_TABLE,
    CREATE_CITIES_TABLE,
    CREATE_CAMERAS_TABLE,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.trim().is_empty());
        }
    }

    #[test]
    fn test_memos_table_references_drivers() {
        assert!(CREATE_MEMOS_TABLE.contains("total_fine INTEGER NOT NULL"));
        assert!(CREATE_MEMOS_TABLE.contains("REFERENCES drivers(id)"));
        assert!(CREATE_MEMOS_TABLE.contains("DEFAULT 'pending'"));
    }

    #[test]
    fn test_statements_execute_on_fresh_database() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        for stmt in SCHEMA_STATEMENTS {
            conn.execute(stmt, []).unwrap();
        }
    }
}
