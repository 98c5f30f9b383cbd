//! Core record types for echallan.
//!
//! These are the rows the store keeps and the shapes the HTTP API speaks.
//! Field names are camelCase on the wire.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A face descriptor: the fixed-length vector an inference library emits
/// for one detected face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceDescriptor(Vec<f32>);

impl FaceDescriptor {
    /// Wrap a raw vector.
    #[must_use]
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the descriptor has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw components.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Euclidean distance to `other`, or `None` if the lengths differ.
    #[must_use]
    pub fn euclidean_distance(&self, other: &Self) -> Option<f32> {
        if self.0.len() != other.0.len() {
            return None;
        }
        let sum: f32 = self
            .0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        Some(sum.sqrt())
    }
}

impl From<Vec<f32>> for FaceDescriptor {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// A registered driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: String,
    pub name: String,
    pub is_driver: bool,
    pub govt_id_type: String,
    pub govt_id_number: String,
    pub license_number: String,
    pub vehicle_number: String,
    pub vehicle_type: String,
    pub father_name: String,
    pub dob: String,
    pub blood_group: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub license_expiry: String,
    pub photo: String,
    pub face_descriptor: Option<FaceDescriptor>,
}

/// The projection of a driver a matcher needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverSummary {
    pub id: String,
    pub name: String,
    pub photo: String,
    pub face_descriptor: Option<FaceDescriptor>,
}

impl From<&Driver> for DriverSummary {
    fn from(driver: &Driver) -> Self {
        Self {
            id: driver.id.clone(),
            name: driver.name.clone(),
            photo: driver.photo.clone(),
            face_descriptor: driver.face_descriptor.clone(),
        }
    }
}

/// A catalog entry for a traffic offence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub id: String,
    pub code: String,
    pub category: String,
    /// Human-readable offence name.
    pub violation: String,
    /// Fixed fine in rupees.
    pub fine: i64,
    pub description: String,
}

/// A violation as referenced from a memo.
///
/// Clients send back catalog entries, possibly partial; whatever they send
/// is stored verbatim, including fields this type does not name. `id` and
/// `code` are kept as whatever JSON the client used. `violation` must be a
/// string and `fine` an integer, since analytics and totals read them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViolationRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fine: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ViolationRef {
    /// Fine amount, treating a missing fine as zero.
    #[must_use]
    pub fn fine_or_zero(&self) -> i64 {
        self.fine.unwrap_or(0)
    }
}

impl From<&Violation> for ViolationRef {
    fn from(v: &Violation) -> Self {
        Self {
            id: Some(v.id.clone().into()),
            code: Some(v.code.clone().into()),
            violation: Some(v.violation.clone()),
            fine: Some(v.fine),
            extra: serde_json::Map::new(),
        }
    }
}

/// Payment state of a memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

impl PaymentStatus {
    /// Stored text form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }

    /// Parse the stored text form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted e-challan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    pub id: String,
    pub driver_id: String,
    pub officer_id: String,
    pub officer_name: String,
    pub location: String,
    pub violations: Vec<ViolationRef>,
    pub total_fine: i64,
    pub payment_status: PaymentStatus,
    /// RFC 3339 UTC timestamp of creation.
    pub date: String,
}

/// District → cities, plus the coordinates known for some cities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationHierarchy {
    #[serde(rename = "gujaratData")]
    pub districts: BTreeMap<String, Vec<String>>,
    pub city_coordinates: BTreeMap<String, [f64; 2]>,
}

/// A simulated traffic camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camera {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub feeds: Vec<String>,
}

/// Camera feeds and names keyed by camera id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraDirectory {
    #[serde(rename = "rtoCameraFeeds")]
    pub feeds: BTreeMap<String, Vec<String>>,
    pub camera_names: BTreeMap<String, String>,
}

impl FromIterator<Camera> for CameraDirectory {
    fn from_iter<I: IntoIterator<Item = Camera>>(iter: I) -> Self {
        let mut directory = Self::default();
        for camera in iter {
            directory.camera_names.insert(camera.id.clone(), camera.name);
            directory.feeds.insert(camera.id, camera.feeds);
        }
        directory
    }
}
