//! Storage layer for echallan.
//!
//! `SQLite`-backed record store: reference data (drivers, violations,
//! locations, cameras), issued memos, and the append-only analytics cache.

pub mod migrations;
pub mod schema;
pub mod seed;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::analytics::{self, AnalyticsSnapshot};
use crate::error::{Error, Result};
use crate::memo::{self, NewMemo};
use crate::records::{
    Camera, CameraDirectory, Driver, DriverSummary, LocationHierarchy, Memo, PaymentStatus,
    Violation,
};

pub use seed::{SeedOptions, SeedReport};

/// Record store for the kiosk.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

const DRIVER_COLUMNS: &str = "id, name, is_driver, govt_id_type, govt_id_number, license_number, \
     vehicle_number, vehicle_type, father_name, dob, blood_group, address, city, phone, \
     license_expiry, photo, face_descriptor";

const MEMO_COLUMNS: &str = "id, driver_id, officer_id, officer_name, location, violations, \
     total_fine, payment_status, date";

/// Decode a JSON TEXT column inside a row mapper.
fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Decode a nullable JSON TEXT column inside a row mapper.
fn optional_json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<Option<T>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        serde_json::from_str(&t)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// and brings the schema up to date. Does not seed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::configure(&conn)?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        Self::configure(&conn)?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Connection settings shared by every open path.
    ///
    /// `memos.driver_id` declares its foreign key but is not checked: a memo
    /// may name a driver the store does not know. The bundled `SQLite`
    /// enables enforcement by default, so it is switched off here.
    fn configure(conn: &Connection) -> Result<()> {
        conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
        Ok(())
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seed every empty reference table.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn seed(&self, options: SeedOptions) -> Result<SeedReport> {
        seed::seed_all(&self.conn, options)
    }

    /// Insert a driver record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails, including a
    /// duplicate id.
    pub fn insert_driver(&self, driver: &Driver) -> Result<()> {
        seed::insert_driver(&self.conn, driver)
    }

    // === Drivers ===

    /// Get a driver by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the stored
    /// descriptor is not valid JSON.
    pub fn get_driver(&self, id: &str) -> Result<Option<Driver>> {
        let driver = self
            .conn
            .query_row(
                &format!("SELECT {DRIVER_COLUMNS} FROM drivers WHERE id = ?1"),
                [id],
                Self::row_to_driver,
            )
            .optional()?;
        Ok(driver)
    }

    /// All drivers as matcher summaries, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn driver_summaries(&self) -> Result<Vec<DriverSummary>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, photo, face_descriptor FROM drivers ORDER BY rowid")?;

        let drivers = stmt
            .query_map([], |row| {
                Ok(DriverSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    photo: row.get(2)?,
                    face_descriptor: optional_json_column(row, 3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(drivers)
    }

    fn row_to_driver(row: &Row) -> rusqlite::Result<Driver> {
        Ok(Driver {
            id: row.get(0)?,
            name: row.get(1)?,
            is_driver: row.get(2)?,
            govt_id_type: row.get(3)?,
            govt_id_number: row.get(4)?,
            license_number: row.get(5)?,
            vehicle_number: row.get(6)?,
            vehicle_type: row.get(7)?,
            father_name: row.get(8)?,
            dob: row.get(9)?,
            blood_group: row.get(10)?,
            address: row.get(11)?,
            city: row.get(12)?,
            phone: row.get(13)?,
            license_expiry: row.get(14)?,
            photo: row.get(15)?,
            face_descriptor: optional_json_column(row, 16)?,
        })
    }

    // === Reference data ===

    /// The violation catalog, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn violations(&self) -> Result<Vec<Violation>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, code, category, violation, fine, description FROM violations ORDER BY rowid",
        )?;

        let violations = stmt
            .query_map([], |row| {
                Ok(Violation {
                    id: row.get(0)?,
                    code: row.get(1)?,
                    category: row.get(2)?,
                    violation: row.get(3)?,
                    fine: row.get(4)?,
                    description: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(violations)
    }

    /// Districts with their cities (both sorted by name) and known city
    /// coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn locations(&self) -> Result<LocationHierarchy> {
        let mut hierarchy = LocationHierarchy::default();

        let mut stmt = self.conn.prepare("SELECT name FROM districts ORDER BY name")?;
        for name in stmt.query_map([], |row| row.get::<_, String>(0))? {
            hierarchy.districts.insert(name?, Vec::new());
        }

        let mut stmt = self.conn.prepare(
            r"
            SELECT d.name, c.name, c.latitude, c.longitude
            FROM cities c JOIN districts d ON d.id = c.district_id
            ORDER BY c.name
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<f64>>(2)?,
                row.get::<_, Option<f64>>(3)?,
            ))
        })?;

        for row in rows {
            let (district, city, lat, lng) = row?;
            if let (Some(lat), Some(lng)) = (lat, lng) {
                hierarchy.city_coordinates.insert(city.clone(), [lat, lng]);
            }
            hierarchy.districts.entry(district).or_default().push(city);
        }

        Ok(hierarchy)
    }

    /// All cameras, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or a feed list is
    /// not valid JSON.
    pub fn cameras(&self) -> Result<Vec<Camera>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, type, feeds FROM cameras ORDER BY rowid")?;

        let cameras = stmt
            .query_map([], |row| {
                Ok(Camera {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    kind: row.get(2)?,
                    feeds: json_column(row, 3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(cameras)
    }

    /// Cameras keyed by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn camera_directory(&self) -> Result<CameraDirectory> {
        Ok(self.cameras()?.into_iter().collect())
    }

    // === Memos ===

    /// Persist a validated memo and refresh today's analytics.
    ///
    /// The id is `MEMO-<millis of created_at>`, bumped by one millisecond
    /// until unused. An analytics failure is logged and does not undo the
    /// memo.
    ///
    /// # Errors
    ///
    /// Returns an error if the memo cannot be inserted.
    pub fn create_memo(&self, new_memo: NewMemo, created_at: DateTime<Utc>) -> Result<Memo> {
        let memo = self.insert_memo(new_memo, created_at)?;
        info!(
            memo = %memo.id,
            driver = %memo.driver_id,
            officer = %memo.officer_id,
            total_fine = memo.total_fine,
            "Memo created"
        );

        if let Err(e) = self.refresh_analytics(created_at) {
            warn!("Failed to refresh analytics after memo {}: {e}", memo.id);
        }
        Ok(memo)
    }

    /// Insert a memo without touching analytics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_memo(&self, new_memo: NewMemo, created_at: DateTime<Utc>) -> Result<Memo> {
        let mut millis = created_at.timestamp_millis();
        while self.memo_exists(&memo::memo_id(millis))? {
            millis += 1;
        }
        let memo = new_memo.into_memo(memo::memo_id(millis), created_at);
        let violations = serde_json::to_string(&memo.violations)?;

        self.conn.execute(
            &format!(
                "INSERT INTO memos ({MEMO_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                memo.id,
                memo.driver_id,
                memo.officer_id,
                memo.officer_name,
                memo.location,
                violations,
                memo.total_fine,
                memo.payment_status.as_str(),
                memo.date,
            ],
        )?;

        debug!("Inserted memo {}", memo.id);
        Ok(memo)
    }

    fn memo_exists(&self, id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM memos WHERE id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get a memo by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_memo(&self, id: &str) -> Result<Option<Memo>> {
        let memo = self
            .conn
            .query_row(
                &format!("SELECT {MEMO_COLUMNS} FROM memos WHERE id = ?1"),
                [id],
                Self::row_to_memo,
            )
            .optional()?;
        Ok(memo)
    }

    /// A driver's memos, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn memos_for_driver(&self, driver_id: &str) -> Result<Vec<Memo>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEMO_COLUMNS} FROM memos WHERE driver_id = ?1 ORDER BY date DESC"
        ))?;

        let memos = stmt
            .query_map([driver_id], Self::row_to_memo)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(memos)
    }

    /// Memos whose stored date string starts with `day` (`YYYY-MM-DD`).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn memos_on_day(&self, day: &str) -> Result<Vec<Memo>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEMO_COLUMNS} FROM memos WHERE date LIKE ?1 ORDER BY date"
        ))?;

        let pattern = format!("{day}%");
        let memos = stmt
            .query_map([pattern], Self::row_to_memo)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(memos)
    }

    fn row_to_memo(row: &Row) -> rusqlite::Result<Memo> {
        let id: String = row.get(0)?;
        let status: String = row.get(7)?;
        let payment_status = PaymentStatus::parse(&status).unwrap_or_else(|| {
            warn!("Unknown payment status {status:?} on memo {id}, treating as pending");
            PaymentStatus::Pending
        });

        Ok(Memo {
            driver_id: row.get(1)?,
            officer_id: row.get(2)?,
            officer_name: row.get(3)?,
            location: row.get(4)?,
            violations: json_column(row, 5)?,
            total_fine: row.get(6)?,
            payment_status,
            date: row.get(8)?,
            id,
        })
    }

    // === Analytics ===

    /// Aggregate the memos dated on `now`'s day, without persisting.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn compute_analytics(&self, now: DateTime<Utc>) -> Result<AnalyticsSnapshot> {
        let memos = self.memos_on_day(&memo::day_prefix(now))?;
        Ok(analytics::compute(&memos, now))
    }

    /// Aggregate today's memos and append the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn refresh_analytics(&self, now: DateTime<Utc>) -> Result<AnalyticsSnapshot> {
        let snapshot = self.compute_analytics(now)?;
        self.insert_analytics(&snapshot)?;
        debug!(
            date = %snapshot.date,
            memos = snapshot.today_violations,
            "Analytics snapshot appended"
        );
        Ok(snapshot)
    }

    /// The newest stored snapshot, or a fresh unpersisted computation when
    /// none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn analytics(&self, now: DateTime<Utc>) -> Result<AnalyticsSnapshot> {
        match self.latest_analytics()? {
            Some(snapshot) => Ok(snapshot),
            None => self.compute_analytics(now),
        }
    }

    /// Append a snapshot row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_analytics(&self, snapshot: &AnalyticsSnapshot) -> Result<i64> {
        let to_i64 = |n: u64| i64::try_from(n).unwrap_or(i64::MAX);
        self.conn.execute(
            r"
            INSERT INTO analytics (
                date, total_violations, total_fines, active_officers,
                violation_breakdown, payment_stats, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                snapshot.date,
                to_i64(snapshot.today_violations),
                snapshot.total_fines,
                to_i64(snapshot.active_officers),
                serde_json::to_string(&snapshot.violation_breakdown)?,
                serde_json::to_string(&snapshot.payment_stats)?,
                snapshot.last_updated,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// The most recently written snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn latest_analytics(&self) -> Result<Option<AnalyticsSnapshot>> {
        let snapshot = self
            .conn
            .query_row(
                r"
                SELECT date, total_violations, total_fines, active_officers,
                       violation_breakdown, payment_stats, updated_at
                FROM analytics ORDER BY updated_at DESC, id DESC LIMIT 1
                ",
                [],
                |row| {
                    let to_u64 = |n: i64| u64::try_from(n).unwrap_or(0);
                    Ok(AnalyticsSnapshot {
                        date: row.get(0)?,
                        today_violations: to_u64(row.get(1)?),
                        total_fines: row.get(2)?,
                        active_officers: to_u64(row.get(3)?),
                        violation_breakdown: json_column(row, 4)?,
                        payment_stats: json_column(row, 5)?,
                        last_updated: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(snapshot)
    }

    // === Statistics ===

    /// Row counts and file size.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let count = |sql: &str| -> Result<i64> {
            Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
        };

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            drivers: count("SELECT COUNT(*) FROM drivers")?,
            enrolled_drivers: count(
                "SELECT COUNT(*) FROM drivers WHERE face_descriptor IS NOT NULL",
            )?,
            violations: count("SELECT COUNT(*) FROM violations")?,
            memos: count("SELECT COUNT(*) FROM memos")?,
            analytics_snapshots: count("SELECT COUNT(*) FROM analytics")?,
            db_size_bytes,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageStats {
    /// Registered drivers.
    pub drivers: i64,
    /// Drivers with a face descriptor.
    pub enrolled_drivers: i64,
    /// Catalog violations.
    pub violations: i64,
    /// Issued memos.
    pub memos: i64,
    /// Stored analytics snapshots.
    pub analytics_snapshots: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
