//! Memo (e-challan) creation.
//!
//! Validates an operator's request, computes the total fine from the
//! referenced violations, and fills the defaults the store expects.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::records::{Memo, PaymentStatus, ViolationRef};

/// Message returned when a memo request lacks its required fields.
pub const MISSING_FIELDS_MESSAGE: &str =
    "Missing required fields: driverId, officerId, or violations";

/// Officer name stored when the request omits one.
pub const DEFAULT_OFFICER_NAME: &str = "Unknown Officer";

/// Location stored when the request omits one.
pub const DEFAULT_LOCATION: &str = "Unknown Location";

/// A memo creation request as posted by the kiosk.
///
/// Any client-supplied `totalFine` is ignored; the total is always
/// recomputed from `violations`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoRequest {
    pub driver_id: Option<String>,
    pub officer_id: Option<String>,
    pub officer_name: Option<String>,
    pub location: Option<String>,
    pub violations: Option<Vec<ViolationRef>>,
    pub payment_status: Option<PaymentStatus>,
}

/// A validated memo that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMemo {
    pub driver_id: String,
    pub officer_id: String,
    pub officer_name: String,
    pub location: String,
    pub violations: Vec<ViolationRef>,
    pub total_fine: i64,
    pub payment_status: PaymentStatus,
}

/// The part of a created memo echoed back to the kiosk.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoReceipt {
    pub id: String,
    pub date: String,
    pub total_fine: i64,
    pub payment_status: PaymentStatus,
}

impl From<&Memo> for MemoReceipt {
    fn from(memo: &Memo) -> Self {
        Self {
            id: memo.id.clone(),
            date: memo.date.clone(),
            total_fine: memo.total_fine,
            payment_status: memo.payment_status,
        }
    }
}

/// Message returned when the fines do not fit in a total.
pub const FINE_OVERFLOW_MESSAGE: &str = "Total fine is too large";

/// Sum of the violation fines, counting a missing fine as zero.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the sum overflows.
pub fn total_fine(violations: &[ViolationRef]) -> Result<i64> {
    violations
        .iter()
        .map(ViolationRef::fine_or_zero)
        .try_fold(0i64, i64::checked_add)
        .ok_or_else(|| Error::validation(FINE_OVERFLOW_MESSAGE))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl MemoRequest {
    /// Check required fields and compute the total fine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `driverId` or `officerId` is missing
    /// or blank, if `violations` is missing or empty, or if the fines
    /// overflow.
    pub fn validate(self) -> Result<NewMemo> {
        let (Some(driver_id), Some(officer_id), Some(violations)) = (
            non_empty(self.driver_id),
            non_empty(self.officer_id),
            self.violations.filter(|v| !v.is_empty()),
        ) else {
            return Err(Error::validation(MISSING_FIELDS_MESSAGE));
        };

        Ok(NewMemo {
            total_fine: total_fine(&violations)?,
            driver_id,
            officer_id,
            officer_name: non_empty(self.officer_name)
                .unwrap_or_else(|| DEFAULT_OFFICER_NAME.to_string()),
            location: non_empty(self.location).unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            violations,
            payment_status: self.payment_status.unwrap_or_default(),
        })
    }
}

impl NewMemo {
    /// Assign an id and creation timestamp.
    #[must_use]
    pub fn into_memo(self, id: String, created_at: DateTime<Utc>) -> Memo {
        Memo {
            id,
            driver_id: self.driver_id,
            officer_id: self.officer_id,
            officer_name: self.officer_name,
            location: self.location,
            violations: self.violations,
            total_fine: self.total_fine,
            payment_status: self.payment_status,
            date: format_timestamp(created_at),
        }
    }
}

/// Memo id for a creation time: `MEMO-<unix millis>`.
#[must_use]
pub fn memo_id(millis: i64) -> String {
    format!("MEMO-{millis}")
}

/// RFC 3339 UTC timestamp with millisecond precision, as stored in `date`.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The `YYYY-MM-DD` prefix shared by every timestamp on `at`'s day.
#[must_use]
pub fn day_prefix(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn violation(name: &str, fine: Option<i64>) -> ViolationRef {
        ViolationRef {
            violation: Some(name.to_string()),
            fine,
            ..ViolationRef::default()
        }
    }

    fn valid_request() -> MemoRequest {
        MemoRequest {
            driver_id: Some("GJ001".to_string()),
            officer_id: Some("OFF-7".to_string()),
            violations: Some(vec![
                violation("Riding without helmet", Some(1000)),
                violation("Dangerous driving", Some(5000)),
            ]),
            ..MemoRequest::default()
        }
    }

    #[test]
    fn test_validate_computes_total_and_defaults() {
        let memo = valid_request().validate().unwrap();

        assert_eq!(memo.total_fine, 6000);
        assert_eq!(memo.officer_name, DEFAULT_OFFICER_NAME);
        assert_eq!(memo.location, DEFAULT_LOCATION);
        assert_eq!(memo.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn test_missing_fine_counts_as_zero() {
        let mut request = valid_request();
        request.violations = Some(vec![
            violation("Helmet", Some(1000)),
            violation("Unpriced", None),
        ]);
        assert_eq!(request.validate().unwrap().total_fine, 1000);
    }

    #[test]
    fn test_overflowing_fines_rejected() {
        let mut request = valid_request();
        request.violations = Some(vec![
            violation("Helmet", Some(i64::MAX)),
            violation("Dangerous driving", Some(1)),
        ]);
        let err = request.validate().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), FINE_OVERFLOW_MESSAGE);
    }

    #[test]
    fn test_large_fines_at_the_limit() {
        let violations = vec![
            violation("Helmet", Some(i64::MAX - 1)),
            violation("Dangerous driving", Some(1)),
        ];
        assert_eq!(total_fine(&violations).unwrap(), i64::MAX);
    }

    #[test]
    fn test_missing_driver_id_rejected() {
        let mut request = valid_request();
        request.driver_id = None;
        let err = request.validate().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), MISSING_FIELDS_MESSAGE);
    }

    #[test]
    fn test_blank_officer_id_rejected() {
        let mut request = valid_request();
        request.officer_id = Some("  ".to_string());
        assert!(request.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_empty_violations_rejected() {
        let mut request = valid_request();
        request.violations = Some(Vec::new());
        assert!(request.validate().unwrap_err().is_validation());

        let mut request = valid_request();
        request.violations = None;
        assert!(request.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_explicit_fields_are_kept() {
        let mut request = valid_request();
        request.officer_name = Some("Inspector Vikram Singh".to_string());
        request.location = Some("Visnagar".to_string());
        request.payment_status = Some(PaymentStatus::Paid);

        let memo = request.validate().unwrap();
        assert_eq!(memo.officer_name, "Inspector Vikram Singh");
        assert_eq!(memo.location, "Visnagar");
        assert_eq!(memo.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_client_total_is_ignored() {
        let json = r#"{
            "driverId": "GJ001",
            "officerId": "OFF-7",
            "totalFine": 1,
            "violations": [{"violation": "Helmet", "fine": 1000}]
        }"#;
        let request: MemoRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.validate().unwrap().total_fine, 1000);
    }

    #[test]
    fn test_into_memo_assigns_id_and_date() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();
        let memo = valid_request()
            .validate()
            .unwrap()
            .into_memo(memo_id(at.timestamp_millis()), at);

        assert_eq!(memo.id, format!("MEMO-{}", at.timestamp_millis()));
        assert_eq!(memo.date, "2026-10-19T08:30:00.000Z");
        assert!(memo.date.starts_with(&day_prefix(at)));
    }

    #[test]
    fn test_receipt_wire_names() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();
        let memo = valid_request().validate().unwrap().into_memo(memo_id(1), at);
        let json = serde_json::to_value(MemoReceipt::from(&memo)).unwrap();
        assert_eq!(json["id"], "MEMO-1");
        assert_eq!(json["totalFine"], 6000);
        assert_eq!(json["paymentStatus"], "pending");
    }
}
