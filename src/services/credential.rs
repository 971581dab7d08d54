use chrono::NaiveDate;
use serde::Serialize;

use super::barcode::{BarcodeError, Code128, SvgOptions};
use crate::models::employee::{BloodGroup, EmployeeRecord};

pub const SYMBOLOGY: &str = "CODE128";

/// Verification link for an employee number. Pure; the admin views and the
/// server both derive links through here.
pub fn encode(employee_number: &str, base_url: &str) -> String {
    format!("{}/{}", base_url, employee_number)
}

/// The payload printed into the barcode: the bare employee number, which
/// keeps the symbol short enough for an ID card.
pub fn scannable_token(record: &EmployeeRecord) -> &str {
    record.employee_number.as_str()
}

pub fn barcode(record: &EmployeeRecord) -> Result<Code128, BarcodeError> {
    Code128::encode(scannable_token(record))
}

pub fn barcode_svg(record: &EmployeeRecord) -> Result<String, BarcodeError> {
    Ok(barcode(record)?.to_svg(&SvgOptions::default()))
}

/// Everything the ID card needs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub token: String,
    pub symbology: &'static str,
    pub check_value: u8,
    pub verification_link: String,
    pub name: String,
    pub role: String,
    pub date_of_joining: NaiveDate,
    pub blood_group: Option<BloodGroup>,
    pub photo_reference: Option<String>,
}

pub fn credential(record: &EmployeeRecord, base_url: &str) -> Result<Credential, BarcodeError> {
    let code = barcode(record)?;
    Ok(Credential {
        token: code.text().to_string(),
        symbology: SYMBOLOGY,
        check_value: code.check_value(),
        verification_link: encode(record.employee_number.as_str(), base_url),
        name: record.name.clone(),
        role: record.role.clone(),
        date_of_joining: record.date_of_joining,
        blood_group: record.blood_group,
        photo_reference: record.photo_reference.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::services::identifier::EmployeeNumber;

    fn record() -> EmployeeRecord {
        EmployeeRecord {
            record_id: Uuid::new_v4(),
            employee_number: EmployeeNumber::parse("DI-3001").unwrap(),
            name: "Asha Rao".to_string(),
            role: "Engineer".to_string(),
            date_of_joining: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            blood_group: Some(BloodGroup::OPositive),
            photo_reference: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn encode_is_plain_concatenation() {
        let base = "https://id.example.com/v";
        assert_eq!(encode("DI-3001", base), "https://id.example.com/v/DI-3001");
        assert_eq!(encode("DI-3001", base).as_bytes(), encode("DI-3001", base).as_bytes());
    }

    #[test]
    fn token_is_the_bare_employee_number() {
        let record = record();
        assert_eq!(scannable_token(&record), "DI-3001");
        assert_eq!(barcode(&record).unwrap().text(), "DI-3001");
    }

    #[test]
    fn credential_links_back_to_the_verification_page() {
        let card = credential(&record(), "https://id.example.com/v").unwrap();
        assert_eq!(card.token, "DI-3001");
        assert_eq!(card.symbology, "CODE128");
        assert_eq!(card.check_value, 14);
        assert_eq!(card.verification_link, "https://id.example.com/v/DI-3001");
    }
}
