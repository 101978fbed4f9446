//! The cross-workflow data record.
//!
//! `DataCollection` holds every field any workflow may collect. All fields
//! are independently nullable; a field is either unknown or a value that
//! passed its validator. Mutation goes through [`merge`](super::merge) so
//! that known values are never erased by an empty extraction result.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Requested coverage scope for a new policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoverageScope {
    Single,
    WithPartner,
    WithChildren,
    WithFamily,
}

/// Termination reasons the assistant is allowed to file.
///
/// The upstream policy API knows dozens more; only these four are
/// reachable through the conversational flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TerminationReason {
    ExtraordinaryTerminationForAnImportantReason,
    FalseDeclarations,
    OrdinaryCancellation,
    Withdrawal,
}

/// Every collectible field, in schema order.
///
/// The order is load-bearing: validation reports the *first* failing field
/// in this order, which keeps the "one outstanding conflict" policy
/// deterministic across turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    DateOfBirth,
    CoverageScope,
    HasInsurance,
    HasClaims,
    ClaimCount,
    FirstName,
    LastName,
    Email,
    Street,
    HouseNumber,
    ZipCode,
    City,
    StartDate,
    Iban,
    PolicyId,
    PolicyTerminationReason,
    PolicyTerminationDate,
}

impl FieldKey {
    /// All fields, in schema order.
    pub const ALL: [FieldKey; 17] = [
        FieldKey::DateOfBirth,
        FieldKey::CoverageScope,
        FieldKey::HasInsurance,
        FieldKey::HasClaims,
        FieldKey::ClaimCount,
        FieldKey::FirstName,
        FieldKey::LastName,
        FieldKey::Email,
        FieldKey::Street,
        FieldKey::HouseNumber,
        FieldKey::ZipCode,
        FieldKey::City,
        FieldKey::StartDate,
        FieldKey::Iban,
        FieldKey::PolicyId,
        FieldKey::PolicyTerminationReason,
        FieldKey::PolicyTerminationDate,
    ];

    /// Wire name of the field (camelCase, as in the JSON schema).
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::DateOfBirth => "dateOfBirth",
            FieldKey::CoverageScope => "coverageScope",
            FieldKey::HasInsurance => "hasInsurance",
            FieldKey::HasClaims => "hasClaims",
            FieldKey::ClaimCount => "claimCount",
            FieldKey::FirstName => "firstName",
            FieldKey::LastName => "lastName",
            FieldKey::Email => "email",
            FieldKey::Street => "street",
            FieldKey::HouseNumber => "houseNumber",
            FieldKey::ZipCode => "zipCode",
            FieldKey::City => "city",
            FieldKey::StartDate => "startDate",
            FieldKey::Iban => "iban",
            FieldKey::PolicyId => "policyId",
            FieldKey::PolicyTerminationReason => "policyTerminationReason",
            FieldKey::PolicyTerminationDate => "policyTerminationDate",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single field value, typed per field family.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Count(u32),
    Scope(CoverageScope),
    Reason(TerminationReason),
}

impl FieldValue {
    /// True when the value carries no information.
    ///
    /// Blank text counts as empty so a whitespace-only extraction result
    /// cannot overwrite a known value.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

/// The flat record of everything collected so far in a conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataCollection {
    pub date_of_birth: Option<String>,
    pub coverage_scope: Option<CoverageScope>,
    pub has_insurance: Option<bool>,
    pub has_claims: Option<bool>,
    pub claim_count: Option<u32>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub start_date: Option<String>,
    pub iban: Option<String>,
    pub policy_id: Option<String>,
    pub policy_termination_reason: Option<TerminationReason>,
    pub policy_termination_date: Option<String>,
}

impl DataCollection {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a field generically.
    pub fn get(&self, key: FieldKey) -> Option<FieldValue> {
        match key {
            FieldKey::DateOfBirth => self.date_of_birth.clone().map(FieldValue::Text),
            FieldKey::CoverageScope => self.coverage_scope.map(FieldValue::Scope),
            FieldKey::HasInsurance => self.has_insurance.map(FieldValue::Flag),
            FieldKey::HasClaims => self.has_claims.map(FieldValue::Flag),
            FieldKey::ClaimCount => self.claim_count.map(FieldValue::Count),
            FieldKey::FirstName => self.first_name.clone().map(FieldValue::Text),
            FieldKey::LastName => self.last_name.clone().map(FieldValue::Text),
            FieldKey::Email => self.email.clone().map(FieldValue::Text),
            FieldKey::Street => self.street.clone().map(FieldValue::Text),
            FieldKey::HouseNumber => self.house_number.clone().map(FieldValue::Text),
            FieldKey::ZipCode => self.zip_code.clone().map(FieldValue::Text),
            FieldKey::City => self.city.clone().map(FieldValue::Text),
            FieldKey::StartDate => self.start_date.clone().map(FieldValue::Text),
            FieldKey::Iban => self.iban.clone().map(FieldValue::Text),
            FieldKey::PolicyId => self.policy_id.clone().map(FieldValue::Text),
            FieldKey::PolicyTerminationReason => {
                self.policy_termination_reason.map(FieldValue::Reason)
            }
            FieldKey::PolicyTerminationDate => {
                self.policy_termination_date.clone().map(FieldValue::Text)
            }
        }
    }

    /// Writes a field generically.
    ///
    /// A value whose variant does not match the field's type is discarded;
    /// the merge function only moves values between same-typed slots, so
    /// this cannot occur there.
    pub fn set(&mut self, key: FieldKey, value: Option<FieldValue>) {
        match key {
            FieldKey::DateOfBirth => self.date_of_birth = as_text(value),
            FieldKey::CoverageScope => {
                self.coverage_scope = match value {
                    Some(FieldValue::Scope(s)) => Some(s),
                    _ => None,
                }
            }
            FieldKey::HasInsurance => self.has_insurance = as_flag(value),
            FieldKey::HasClaims => self.has_claims = as_flag(value),
            FieldKey::ClaimCount => {
                self.claim_count = match value {
                    Some(FieldValue::Count(n)) => Some(n),
                    _ => None,
                }
            }
            FieldKey::FirstName => self.first_name = as_text(value),
            FieldKey::LastName => self.last_name = as_text(value),
            FieldKey::Email => self.email = as_text(value),
            FieldKey::Street => self.street = as_text(value),
            FieldKey::HouseNumber => self.house_number = as_text(value),
            FieldKey::ZipCode => self.zip_code = as_text(value),
            FieldKey::City => self.city = as_text(value),
            FieldKey::StartDate => self.start_date = as_text(value),
            FieldKey::Iban => self.iban = as_text(value),
            FieldKey::PolicyId => self.policy_id = as_text(value),
            FieldKey::PolicyTerminationReason => {
                self.policy_termination_reason = match value {
                    Some(FieldValue::Reason(r)) => Some(r),
                    _ => None,
                }
            }
            FieldKey::PolicyTerminationDate => self.policy_termination_date = as_text(value),
        }
    }

    /// True when the field is unknown or blank.
    pub fn is_empty(&self, key: FieldKey) -> bool {
        self.get(key).map_or(true, |v| v.is_empty())
    }

    /// Text content of a field, when the field holds text.
    pub fn text(&self, key: FieldKey) -> Option<&str> {
        match key {
            FieldKey::DateOfBirth => self.date_of_birth.as_deref(),
            FieldKey::FirstName => self.first_name.as_deref(),
            FieldKey::LastName => self.last_name.as_deref(),
            FieldKey::Email => self.email.as_deref(),
            FieldKey::Street => self.street.as_deref(),
            FieldKey::HouseNumber => self.house_number.as_deref(),
            FieldKey::ZipCode => self.zip_code.as_deref(),
            FieldKey::City => self.city.as_deref(),
            FieldKey::StartDate => self.start_date.as_deref(),
            FieldKey::Iban => self.iban.as_deref(),
            FieldKey::PolicyId => self.policy_id.as_deref(),
            FieldKey::PolicyTerminationDate => self.policy_termination_date.as_deref(),
            _ => None,
        }
    }

    /// Replaces the text content of a field.
    pub fn set_text(&mut self, key: FieldKey, value: String) {
        self.set(key, Some(FieldValue::Text(value)));
    }

    /// Keys among `keys` that are still empty in this record.
    pub fn missing_keys(&self, keys: &[FieldKey]) -> Vec<FieldKey> {
        keys.iter().copied().filter(|k| self.is_empty(*k)).collect()
    }
}

fn as_text(value: Option<FieldValue>) -> Option<String> {
    match value {
        Some(FieldValue::Text(s)) => Some(s),
        _ => None,
    }
}

fn as_flag(value: Option<FieldValue>) -> Option<bool> {
    match value {
        Some(FieldValue::Flag(b)) => Some(b),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_is_entirely_empty() {
        let record = DataCollection::new();
        for key in FieldKey::ALL {
            assert!(record.is_empty(key), "{} should start empty", key);
        }
    }

    #[test]
    fn get_and_set_round_trip_every_field() {
        let mut record = DataCollection::new();
        record.set_text(FieldKey::FirstName, "Mara".to_string());
        record.set(FieldKey::HasClaims, Some(FieldValue::Flag(true)));
        record.set(FieldKey::ClaimCount, Some(FieldValue::Count(2)));
        record.set(
            FieldKey::CoverageScope,
            Some(FieldValue::Scope(CoverageScope::WithFamily)),
        );

        assert_eq!(
            record.get(FieldKey::FirstName),
            Some(FieldValue::Text("Mara".to_string()))
        );
        assert_eq!(record.get(FieldKey::HasClaims), Some(FieldValue::Flag(true)));
        assert_eq!(record.get(FieldKey::ClaimCount), Some(FieldValue::Count(2)));
        assert_eq!(
            record.get(FieldKey::CoverageScope),
            Some(FieldValue::Scope(CoverageScope::WithFamily))
        );
    }

    #[test]
    fn blank_text_counts_as_empty() {
        let mut record = DataCollection::new();
        record.set_text(FieldKey::City, "   ".to_string());
        assert!(record.is_empty(FieldKey::City));
    }

    #[test]
    fn false_flag_is_not_empty() {
        let mut record = DataCollection::new();
        record.set(FieldKey::HasInsurance, Some(FieldValue::Flag(false)));
        assert!(!record.is_empty(FieldKey::HasInsurance));
    }

    #[test]
    fn zero_count_is_not_empty() {
        let mut record = DataCollection::new();
        record.set(FieldKey::ClaimCount, Some(FieldValue::Count(0)));
        assert!(!record.is_empty(FieldKey::ClaimCount));
    }

    #[test]
    fn missing_keys_filters_satisfied_fields() {
        let mut record = DataCollection::new();
        record.set_text(FieldKey::FirstName, "Jon".to_string());

        let missing = record.missing_keys(&[FieldKey::FirstName, FieldKey::LastName]);
        assert_eq!(missing, vec![FieldKey::LastName]);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let mut record = DataCollection::new();
        record.set_text(FieldKey::DateOfBirth, "1992-08-15".to_string());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["dateOfBirth"], "1992-08-15");
        assert_eq!(json["coverageScope"], serde_json::Value::Null);
    }

    #[test]
    fn deserializes_partial_objects() {
        let record: DataCollection =
            serde_json::from_str(r#"{"firstName":"Ada","hasClaims":false}"#).unwrap();
        assert_eq!(record.first_name.as_deref(), Some("Ada"));
        assert_eq!(record.has_claims, Some(false));
        assert!(record.last_name.is_none());
    }

    #[test]
    fn field_key_wire_names_match_serde() {
        for key in FieldKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }
}
