//! Mock officer login.
//!
//! Any non-empty officer id and password pair is accepted and mapped to a
//! fixed inspector profile. There is no credential store.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const OFFICER_NAME: &str = "Inspector Vikram Singh";
const OFFICER_RANK: &str = "Senior Inspector";
const OFFICER_STATION: &str = "RTO Main Station";

/// Credentials posted by the login screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub officer_id: Option<String>,
    pub password: Option<String>,
}

/// The profile of a logged-in officer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Officer {
    pub id: String,
    pub name: String,
    pub badge_number: String,
    pub rank: String,
    pub station: String,
}

/// Accept any non-empty credentials.
///
/// # Errors
///
/// Returns [`Error::Unauthorized`] when either field is missing or empty.
pub fn authenticate(request: LoginRequest) -> Result<Officer> {
    let officer_id = request.officer_id.filter(|s| !s.is_empty());
    let has_password = request.password.is_some_and(|p| !p.is_empty());

    match officer_id {
        Some(id) if has_password => Ok(Officer {
            badge_number: id.clone(),
            id,
            name: OFFICER_NAME.to_string(),
            rank: OFFICER_RANK.to_string(),
            station: OFFICER_STATION.to_string(),
        }),
        _ => Err(Error::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: Option<&str>, password: Option<&str>) -> LoginRequest {
        LoginRequest {
            officer_id: id.map(str::to_string),
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn test_any_credentials_accepted() {
        let officer = authenticate(request(Some("RTO-42"), Some("x"))).unwrap();
        assert_eq!(officer.id, "RTO-42");
        assert_eq!(officer.badge_number, "RTO-42");
        assert_eq!(officer.name, OFFICER_NAME);
    }

    #[test]
    fn test_missing_or_empty_fields_rejected() {
        for (id, pw) in [
            (None, Some("x")),
            (Some("RTO-42"), None),
            (Some(""), Some("x")),
            (Some("RTO-42"), Some("")),
        ] {
            assert!(matches!(
                authenticate(request(id, pw)),
                Err(Error::Unauthorized)
            ));
        }
    }

    #[test]
    fn test_officer_wire_names() {
        let officer = authenticate(request(Some("A1"), Some("p"))).unwrap();
        let json = serde_json::to_value(officer).unwrap();
        assert_eq!(json["badgeNumber"], "A1");
    }
}
