use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::services::credential;
use crate::services::identifier::EmployeeNumber;
use crate::utils::validation::not_blank;

/// The eight blood groups an ID card can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::AbPositive => "AB+",
            BloodGroup::AbNegative => "AB-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A+" => Ok(BloodGroup::APositive),
            "A-" => Ok(BloodGroup::ANegative),
            "B+" => Ok(BloodGroup::BPositive),
            "B-" => Ok(BloodGroup::BNegative),
            "AB+" => Ok(BloodGroup::AbPositive),
            "AB-" => Ok(BloodGroup::AbNegative),
            "O+" => Ok(BloodGroup::OPositive),
            "O-" => Ok(BloodGroup::ONegative),
            other => Err(format!("unknown blood group '{}'", other)),
        }
    }
}

/// An unselected blood group arrives as `null` or `""`.
fn optional_blood_group<'de, D>(deserializer: D) -> Result<Option<BloodGroup>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(label) => label.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Present-but-empty clears; absence is handled by `#[serde(default)]`.
fn blood_group_change<'de, D>(deserializer: D) -> Result<Option<Option<BloodGroup>>, D::Error>
where
    D: Deserializer<'de>,
{
    optional_blood_group(deserializer).map(Some)
}

/// A stored employee record. The verification link is not part of it; see
/// [`EmployeeView`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeRecord {
    pub record_id: Uuid,
    pub employee_number: EmployeeNumber,
    pub name: String,
    pub role: String,
    pub date_of_joining: NaiveDate,
    pub blood_group: Option<BloodGroup>,
    pub photo_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of a record that does not exist yet. The store assigns the id and
/// timestamps.
#[derive(Debug, Clone)]
pub struct NewEmployeeRecord {
    pub employee_number: EmployeeNumber,
    pub name: String,
    pub role: String,
    pub date_of_joining: NaiveDate,
    pub blood_group: Option<BloodGroup>,
    pub photo_reference: Option<String>,
}

/// Create payload, the `employee` part of the admin form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewEmployee {
    pub employee_number: String,
    #[validate(length(max = 100), custom = "not_blank")]
    pub name: String,
    #[validate(length(max = 100), custom = "not_blank")]
    pub role: String,
    pub date_of_joining: NaiveDate,
    #[serde(default, deserialize_with = "optional_blood_group")]
    pub blood_group: Option<BloodGroup>,
}

/// Partial update payload. Absent fields are left alone; `bloodGroup: null`
/// clears the blood group.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EmployeeUpdate {
    pub employee_number: Option<String>,
    #[validate(length(max = 100), custom = "not_blank")]
    pub name: Option<String>,
    #[validate(length(max = 100), custom = "not_blank")]
    pub role: Option<String>,
    pub date_of_joining: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blood_group_change")]
    pub blood_group: Option<Option<BloodGroup>>,
}

/// Admin-facing representation, with the verification link derived from the
/// current employee number.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeView {
    pub record_id: Uuid,
    pub employee_number: String,
    pub name: String,
    pub role: String,
    pub date_of_joining: NaiveDate,
    pub blood_group: Option<BloodGroup>,
    pub photo_reference: Option<String>,
    pub verification_link: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmployeeView {
    pub fn from_record(record: &EmployeeRecord, base_url: &str) -> Self {
        EmployeeView {
            record_id: record.record_id,
            employee_number: record.employee_number.to_string(),
            name: record.name.clone(),
            role: record.role.clone(),
            date_of_joining: record.date_of_joining,
            blood_group: record.blood_group,
            photo_reference: record.photo_reference.clone(),
            verification_link: credential::encode(record.employee_number.as_str(), base_url),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// What a public verification is allowed to reveal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicEmployee {
    pub employee_number: String,
    pub name: String,
    pub role: String,
    pub date_of_joining: NaiveDate,
    pub blood_group: Option<BloodGroup>,
    pub photo_reference: Option<String>,
}

impl From<&EmployeeRecord> for PublicEmployee {
    fn from(record: &EmployeeRecord) -> Self {
        PublicEmployee {
            employee_number: record.employee_number.to_string(),
            name: record.name.clone(),
            role: record.role.clone(),
            date_of_joining: record.date_of_joining,
            blood_group: record.blood_group,
            photo_reference: record.photo_reference.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blood_group_serializes_as_card_label() {
        let json = serde_json::to_string(&BloodGroup::AbNegative).unwrap();
        assert_eq!(json, "\"AB-\"");
        let parsed: BloodGroup = serde_json::from_str("\"O+\"").unwrap();
        assert_eq!(parsed, BloodGroup::OPositive);
        assert!(serde_json::from_str::<BloodGroup>("\"C+\"").is_err());
    }

    #[test]
    fn blood_group_text_matches_serde_names() {
        for label in ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"] {
            let group: BloodGroup = label.parse().unwrap();
            assert_eq!(group.as_str(), label);
            assert_eq!(serde_json::to_string(&group).unwrap(), format!("\"{}\"", label));
        }
    }

    #[test]
    fn update_tells_cleared_blood_group_from_untouched() {
        let untouched: EmployeeUpdate = serde_json::from_str(r#"{"name":"Asha"}"#).unwrap();
        assert_eq!(untouched.blood_group, None);

        let cleared: EmployeeUpdate = serde_json::from_str(r#"{"bloodGroup":null}"#).unwrap();
        assert_eq!(cleared.blood_group, Some(None));
        let unselected: EmployeeUpdate = serde_json::from_str(r#"{"bloodGroup":""}"#).unwrap();
        assert_eq!(unselected.blood_group, Some(None));

        let set: EmployeeUpdate = serde_json::from_str(r#"{"bloodGroup":"B-"}"#).unwrap();
        assert_eq!(set.blood_group, Some(Some(BloodGroup::BNegative)));
        assert!(serde_json::from_str::<EmployeeUpdate>(r#"{"bloodGroup":"Z+"}"#).is_err());
    }

    #[test]
    fn new_employee_accepts_unselected_blood_group() {
        let fields: NewEmployee = serde_json::from_str(
            r#"{"employeeNumber":"DI-3001","name":"Asha Rao","role":"Engineer","dateOfJoining":"2024-01-10","bloodGroup":""}"#,
        )
        .unwrap();
        assert_eq!(fields.blood_group, None);

        let fields: NewEmployee = serde_json::from_str(
            r#"{"employeeNumber":"DI-3001","name":"Asha Rao","role":"Engineer","dateOfJoining":"2024-01-10"}"#,
        )
        .unwrap();
        assert_eq!(fields.blood_group, None);
    }

    #[test]
    fn public_projection_drops_admin_metadata() {
        let record = EmployeeRecord {
            record_id: Uuid::new_v4(),
            employee_number: EmployeeNumber::parse("DI-3001").unwrap(),
            name: "Asha Rao".to_string(),
            role: "Engineer".to_string(),
            date_of_joining: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            blood_group: Some(BloodGroup::OPositive),
            photo_reference: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(PublicEmployee::from(&record)).unwrap();
        assert_eq!(value["employeeNumber"], "DI-3001");
        assert_eq!(value["dateOfJoining"], "2024-01-10");
        assert_eq!(value["bloodGroup"], "O+");
        assert!(value.get("recordId").is_none());
        assert!(value.get("createdAt").is_none());
    }
}
