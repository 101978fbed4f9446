//! Deterministic field validators.
//!
//! Each validator is a pure function from a raw string to a typed outcome:
//! either the canonical form of the value or a specific [`ValueError`].
//! Validators never panic and never return a generic failure; the error
//! code is what the conversation layer uses to phrase the correction
//! request.

use chrono::{Datelike, NaiveDate, Utc};
use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::record::FieldKey;

/// Canonical date format for every normalized date field.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Validation thresholds, loaded from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    /// Minimum age of a policy holder.
    pub age_min: u32,
    /// Maximum age of a policy holder.
    pub age_max: u32,
    /// Claims above this count fail underwriting.
    pub max_claim_count: u32,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            age_min: 18,
            age_max: 99,
            max_claim_count: 2,
        }
    }
}

/// Typed validation failure for a single value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("value is empty")]
    Empty,

    #[error("value has the wrong shape")]
    Format,

    #[error("value is not plausible")]
    Invalid,

    #[error("check digits do not match")]
    Checksum,

    #[error("not a recognizable date")]
    WrongFormat,

    #[error("date lies in the future")]
    FutureDate,

    #[error("date lies in the past")]
    PastDate,

    #[error("contains characters that are not allowed")]
    InvalidCharacters,

    #[error("contains no letters")]
    NoLetters,

    #[error("below the minimum age of {min_age}")]
    TooYoung { min_age: u32 },

    #[error("above the maximum age of {max_age}")]
    TooOld { max_age: u32 },
}

impl ValueError {
    /// Stable wire code for the error, used in `data` messages.
    pub fn code(&self) -> &'static str {
        match self {
            ValueError::Empty => "empty",
            ValueError::Format => "format",
            ValueError::Invalid => "invalid",
            ValueError::Checksum => "checksum",
            ValueError::WrongFormat => "wrong_format",
            ValueError::FutureDate => "future_date",
            ValueError::PastDate => "past_date",
            ValueError::InvalidCharacters => "invalid_characters",
            ValueError::NoLetters => "no_letters",
            ValueError::TooYoung { .. } => "too_young",
            ValueError::TooOld { .. } => "too_old",
        }
    }

    /// Threshold parameters embedded in the error, when any.
    pub fn params(&self) -> HashMap<String, String> {
        let mut params = HashMap::new();
        match self {
            ValueError::TooYoung { min_age } => {
                params.insert("minAge".to_string(), min_age.to_string());
            }
            ValueError::TooOld { max_age } => {
                params.insert("maxAge".to_string(), max_age.to_string());
            }
            _ => {}
        }
        params
    }
}

/// Outcome of validating one raw value: the canonical string or an error.
pub type ValidationOutcome = Result<String, ValueError>;

static MONTH_NAMES: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    let mut m = HashMap::new();
    // German
    for (name, n) in [
        ("januar", 1),
        ("februar", 2),
        ("märz", 3),
        ("april", 4),
        ("mai", 5),
        ("juni", 6),
        ("juli", 7),
        ("august", 8),
        ("september", 9),
        ("oktober", 10),
        ("november", 11),
        ("dezember", 12),
        ("jan", 1),
        ("feb", 2),
        ("mär", 3),
        ("mrz", 3),
        ("apr", 4),
        ("jun", 6),
        ("jul", 7),
        ("aug", 8),
        ("sep", 9),
        ("okt", 10),
        ("nov", 11),
        ("dez", 12),
    ] {
        m.insert(name, n);
    }
    // English (where different)
    for (name, n) in [
        ("january", 1),
        ("february", 2),
        ("march", 3),
        ("may", 5),
        ("june", 6),
        ("july", 7),
        ("october", 10),
        ("december", 12),
        ("mar", 3),
        ("oct", 10),
        ("dec", 12),
    ] {
        m.insert(name, n);
    }
    m
});

/// The full validator set, parameterized by rules and the reference date.
///
/// The reference date defaults to today (UTC); tests pin it to keep
/// age and past/future checks reproducible.
#[derive(Debug, Clone)]
pub struct FieldValidators {
    rules: ValidationRules,
    today: NaiveDate,
}

impl FieldValidators {
    /// Creates validators with the given rules, anchored at today (UTC).
    pub fn new(rules: ValidationRules) -> Self {
        Self {
            rules,
            today: Utc::now().date_naive(),
        }
    }

    /// Pins the reference date used for age and past/future checks.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Returns the configured rules.
    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Runs the validator registered for `key`, if any.
    ///
    /// Fields without a validator (booleans, enums, counts, free ids)
    /// return `None` and are accepted as-is.
    pub fn validate(&self, key: FieldKey, raw: Option<&str>) -> Option<ValidationOutcome> {
        match key {
            FieldKey::DateOfBirth => Some(self.date_of_birth(raw)),
            FieldKey::PolicyTerminationDate => Some(self.date_in_future(raw)),
            FieldKey::FirstName | FieldKey::LastName => Some(self.name(raw)),
            FieldKey::Email => Some(self.email(raw)),
            FieldKey::Street | FieldKey::HouseNumber | FieldKey::City => Some(self.address(raw)),
            FieldKey::ZipCode => Some(self.zip_code(raw)),
            FieldKey::Iban => Some(self.iban(raw)),
            _ => None,
        }
    }

    /// Parses a date in any accepted format and normalizes it.
    ///
    /// Accepted shapes, tried day-first before month-first as German
    /// input dominates: `15.08.1992`, `15/08/92`, `08/15/1992`,
    /// `15-08-1992`, `15 08 1992`, `15. August 1992`, `15 Aug 1992`,
    /// `1992-08-15`.
    pub fn date(&self, raw: Option<&str>) -> ValidationOutcome {
        let input = non_empty(raw)?;
        let parsed = parse_date(input).ok_or(ValueError::WrongFormat)?;
        Ok(parsed.format(CANONICAL_DATE_FORMAT).to_string())
    }

    /// Date of birth: a valid date, not in the future, within age bounds.
    pub fn date_of_birth(&self, raw: Option<&str>) -> ValidationOutcome {
        let canonical = self.date(raw)?;
        let date = canonical_date(&canonical);

        if date > self.today {
            return Err(ValueError::FutureDate);
        }

        let age = age_in_years(date, self.today);
        if age < i64::from(self.rules.age_min) {
            return Err(ValueError::TooYoung {
                min_age: self.rules.age_min,
            });
        }
        if age > i64::from(self.rules.age_max) {
            return Err(ValueError::TooOld {
                max_age: self.rules.age_max,
            });
        }

        Ok(canonical)
    }

    /// A valid date that is today or later.
    pub fn date_in_future(&self, raw: Option<&str>) -> ValidationOutcome {
        let canonical = self.date(raw)?;
        if canonical_date(&canonical) < self.today {
            return Err(ValueError::PastDate);
        }
        Ok(canonical)
    }

    /// German IBAN: 22 characters, DE prefix, ISO 7064 mod-97 check.
    pub fn iban(&self, raw: Option<&str>) -> ValidationOutcome {
        let input = non_empty(raw)?;
        let cleaned: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();

        if cleaned.len() != 22
            || !cleaned.starts_with("DE")
            || !cleaned[2..].bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ValueError::Format);
        }

        // ISO 7064: move the first four characters to the end, map letters
        // to 10..35, interpret as a decimal number and reduce mod 97.
        let rearranged = format!("{}{}", &cleaned[4..], &cleaned[..4]);
        let mut remainder: u32 = 0;
        for ch in rearranged.chars() {
            let value = if ch.is_ascii_uppercase() {
                ch as u32 - 'A' as u32 + 10
            } else {
                ch as u32 - '0' as u32
            };
            for digit in value.to_string().bytes() {
                remainder = (remainder * 10 + u32::from(digit - b'0')) % 97;
            }
        }

        if remainder != 1 {
            return Err(ValueError::Checksum);
        }

        Ok(cleaned)
    }

    /// German postal code: five digits, not all-zero or all-identical.
    pub fn zip_code(&self, raw: Option<&str>) -> ValidationOutcome {
        let input = non_empty(raw)?;
        let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();

        if cleaned.len() != 5 || !cleaned.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValueError::Format);
        }

        let first = cleaned.as_bytes()[0];
        if cleaned.bytes().all(|b| b == first) {
            // 00000 and repeated-digit codes are not assigned.
            return Err(ValueError::Invalid);
        }

        Ok(cleaned)
    }

    /// Email: single `@`, non-empty local part, dotted domain.
    pub fn email(&self, raw: Option<&str>) -> ValidationOutcome {
        let input = non_empty(raw)?;

        if input.chars().any(char::is_whitespace) {
            return Err(ValueError::Invalid);
        }
        let mut parts = input.split('@');
        let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => (local, domain),
            _ => return Err(ValueError::Invalid),
        };
        if local.is_empty()
            || domain.is_empty()
            || !domain.contains('.')
            || domain.starts_with('.')
            || domain.ends_with('.')
        {
            return Err(ValueError::Invalid);
        }

        Ok(input.to_string())
    }

    /// Person name: letters (incl. umlauts), spaces, hyphens, apostrophes.
    pub fn name(&self, raw: Option<&str>) -> ValidationOutcome {
        let input = non_empty(raw)?;
        let cleaned = input.trim();

        if !cleaned.chars().all(is_name_char) {
            return Err(ValueError::InvalidCharacters);
        }
        if !cleaned.chars().any(is_name_letter) {
            return Err(ValueError::NoLetters);
        }

        Ok(cleaned.to_string())
    }

    /// Address line: any non-blank text, trimmed.
    pub fn address(&self, raw: Option<&str>) -> ValidationOutcome {
        let input = non_empty(raw)?;
        Ok(input.trim().to_string())
    }
}

impl Default for FieldValidators {
    fn default() -> Self {
        Self::new(ValidationRules::default())
    }
}

fn non_empty(raw: Option<&str>) -> Result<&str, ValueError> {
    match raw {
        Some(s) if !s.trim().is_empty() => Ok(s.trim()),
        _ => Err(ValueError::Empty),
    }
}

fn is_name_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, 'ä' | 'ö' | 'ü' | 'Ä' | 'Ö' | 'Ü' | 'ß')
}

fn is_name_char(c: char) -> bool {
    is_name_letter(c) || c.is_whitespace() || c == '-' || c == '\''
}

fn canonical_date(canonical: &str) -> NaiveDate {
    // Only called with strings this module produced.
    NaiveDate::parse_from_str(canonical, CANONICAL_DATE_FORMAT).unwrap_or_default()
}

fn age_in_years(born: NaiveDate, today: NaiveDate) -> i64 {
    let mut age = i64::from(today.year()) - i64::from(born.year());
    if (today.month(), today.day()) < (born.month(), born.day()) {
        age -= 1;
    }
    age
}

fn expand_year(year: u32, token_len: usize) -> i32 {
    if token_len <= 2 {
        // Two-digit years: 00-68 map into the 2000s, 69-99 into the 1900s.
        if year <= 68 {
            2000 + year as i32
        } else {
            1900 + year as i32
        }
    } else {
        year as i32
    }
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    parse_numeric_date(input).or_else(|| parse_textual_date(input))
}

fn parse_numeric_date(input: &str) -> Option<NaiveDate> {
    let separator = ['.', '/', '-', ' ']
        .into_iter()
        .find(|sep| input.contains(*sep))?;
    let parts: Vec<&str> = input
        .split(separator)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 || !parts.iter().all(|p| p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    let nums: Vec<u32> = parts.iter().map(|p| p.parse().unwrap_or(0)).collect();

    // ISO when the year leads.
    if parts[0].len() == 4 {
        return NaiveDate::from_ymd_opt(nums[0] as i32, nums[1], nums[2]);
    }

    // Day-first (German) takes precedence, month-first (US) as fallback.
    let year = expand_year(nums[2], parts[2].len());
    NaiveDate::from_ymd_opt(year, nums[1], nums[0])
        .or_else(|| NaiveDate::from_ymd_opt(year, nums[0], nums[1]))
}

fn parse_textual_date(input: &str) -> Option<NaiveDate> {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    if tokens.len() != 3 {
        return None;
    }

    let day: u32 = tokens[0].trim_end_matches('.').parse().ok()?;
    let month = *MONTH_NAMES.get(tokens[1].trim_end_matches('.').to_lowercase().as_str())?;
    let year_token = tokens[2];
    if !year_token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = expand_year(year_token.parse().ok()?, year_token.len());

    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validators() -> FieldValidators {
        FieldValidators::default().with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
    }

    mod dates {
        use super::*;

        #[test]
        fn accepts_german_english_and_iso_formats() {
            let v = validators();
            for input in ["15.08.1992", "15/08/1992", "1992-08-15"] {
                assert_eq!(
                    v.date(Some(input)),
                    Ok("1992-08-15".to_string()),
                    "input {input}"
                );
            }
        }

        #[test]
        fn accepts_two_digit_years() {
            let v = validators();
            assert_eq!(v.date(Some("15.08.92")), Ok("1992-08-15".to_string()));
            assert_eq!(v.date(Some("05.03.04")), Ok("2004-03-05".to_string()));
        }

        #[test]
        fn accepts_single_digit_day_and_month() {
            assert_eq!(
                validators().date(Some("5.8.1992")),
                Ok("1992-08-05".to_string())
            );
        }

        #[test]
        fn prefers_day_first_but_falls_back_to_month_first() {
            let v = validators();
            // Ambiguous: day-first wins.
            assert_eq!(v.date(Some("03/04/1992")), Ok("1992-04-03".to_string()));
            // Unambiguous US ordering still parses.
            assert_eq!(v.date(Some("08/15/1992")), Ok("1992-08-15".to_string()));
        }

        #[test]
        fn accepts_textual_german_months() {
            let v = validators();
            assert_eq!(
                v.date(Some("15. August 1992")),
                Ok("1992-08-15".to_string())
            );
            assert_eq!(v.date(Some("1. März 2001")), Ok("2001-03-01".to_string()));
            assert_eq!(v.date(Some("3 Okt 1999")), Ok("1999-10-03".to_string()));
        }

        #[test]
        fn accepts_textual_english_months() {
            assert_eq!(
                validators().date(Some("15 August 1992")),
                Ok("1992-08-15".to_string())
            );
        }

        #[test]
        fn rejects_impossible_dates_as_wrong_format() {
            let v = validators();
            assert_eq!(v.date(Some("31.13.1992")), Err(ValueError::WrongFormat));
            assert_eq!(v.date(Some("30.02.1992")), Err(ValueError::WrongFormat));
            assert_eq!(v.date(Some("not a date")), Err(ValueError::WrongFormat));
        }

        #[test]
        fn rejects_missing_input_as_empty() {
            let v = validators();
            assert_eq!(v.date(None), Err(ValueError::Empty));
            assert_eq!(v.date(Some("  ")), Err(ValueError::Empty));
        }

        #[test]
        fn normalization_is_idempotent() {
            let v = validators();
            let first = v.date(Some("15.08.1992")).unwrap();
            assert_eq!(v.date(Some(&first)), Ok(first.clone()));
        }
    }

    mod date_of_birth {
        use super::*;

        #[test]
        fn accepts_an_adult() {
            assert_eq!(
                validators().date_of_birth(Some("15.08.1992")),
                Ok("1992-08-15".to_string())
            );
        }

        #[test]
        fn rejects_future_dates() {
            assert_eq!(
                validators().date_of_birth(Some("01.01.2030")),
                Err(ValueError::FutureDate)
            );
        }

        #[test]
        fn rejects_minors_with_threshold() {
            // 15 years old on the pinned reference date.
            assert_eq!(
                validators().date_of_birth(Some("01.01.2010")),
                Err(ValueError::TooYoung { min_age: 18 })
            );
        }

        #[test]
        fn rejects_above_maximum_age() {
            assert_eq!(
                validators().date_of_birth(Some("01.01.1900")),
                Err(ValueError::TooOld { max_age: 99 })
            );
        }

        #[test]
        fn age_counts_whole_years_only() {
            // Turns 18 the day after the reference date: still 17.
            assert_eq!(
                validators().date_of_birth(Some("02.06.2007")),
                Err(ValueError::TooYoung { min_age: 18 })
            );
            // Turned 18 exactly on the reference date.
            assert_eq!(
                validators().date_of_birth(Some("01.06.2007")),
                Ok("2007-06-01".to_string())
            );
        }

        #[test]
        fn threshold_is_embedded_in_error_params() {
            let err = validators().date_of_birth(Some("01.01.2010")).unwrap_err();
            assert_eq!(err.code(), "too_young");
            assert_eq!(err.params().get("minAge").map(String::as_str), Some("18"));
        }
    }

    mod date_in_future {
        use super::*;

        #[test]
        fn rejects_past_dates() {
            assert_eq!(
                validators().date_in_future(Some("01.01.2020")),
                Err(ValueError::PastDate)
            );
        }

        #[test]
        fn accepts_today_and_later() {
            let v = validators();
            assert_eq!(v.date_in_future(Some("01.06.2025")), Ok("2025-06-01".to_string()));
            assert_eq!(v.date_in_future(Some("01.07.2025")), Ok("2025-07-01".to_string()));
        }
    }

    mod iban {
        use super::*;

        #[test]
        fn accepts_a_valid_test_iban() {
            assert_eq!(
                validators().iban(Some("DE89370400440532013000")),
                Ok("DE89370400440532013000".to_string())
            );
        }

        #[test]
        fn strips_whitespace_and_uppercases() {
            assert_eq!(
                validators().iban(Some("de89 3704 0044 0532 0130 00")),
                Ok("DE89370400440532013000".to_string())
            );
        }

        #[test]
        fn rejects_flipped_digit_as_checksum() {
            assert_eq!(
                validators().iban(Some("DE89370400440532013001")),
                Err(ValueError::Checksum)
            );
        }

        #[test]
        fn rejects_wrong_length_or_country_as_format() {
            let v = validators();
            assert_eq!(v.iban(Some("DE8937040044053201300")), Err(ValueError::Format));
            assert_eq!(
                v.iban(Some("FR1420041010050500013M02606")),
                Err(ValueError::Format)
            );
            assert_eq!(v.iban(Some("DE89X70400440532013000")), Err(ValueError::Format));
        }

        #[test]
        fn revalidating_canonical_output_is_stable() {
            let v = validators();
            let canonical = v.iban(Some("de89 3704 0044 0532 0130 00")).unwrap();
            assert_eq!(v.iban(Some(&canonical)), Ok(canonical.clone()));
        }
    }

    mod zip_code {
        use super::*;

        #[test]
        fn accepts_five_digits() {
            assert_eq!(validators().zip_code(Some("10115")), Ok("10115".to_string()));
        }

        #[test]
        fn strips_inner_whitespace() {
            assert_eq!(validators().zip_code(Some("10 115")), Ok("10115".to_string()));
        }

        #[test]
        fn rejects_wrong_length_as_format() {
            assert_eq!(validators().zip_code(Some("1234")), Err(ValueError::Format));
            assert_eq!(validators().zip_code(Some("123456")), Err(ValueError::Format));
            assert_eq!(validators().zip_code(Some("12a45")), Err(ValueError::Format));
        }

        #[test]
        fn rejects_all_zero_and_repeated_digits_as_invalid() {
            assert_eq!(validators().zip_code(Some("00000")), Err(ValueError::Invalid));
            assert_eq!(validators().zip_code(Some("77777")), Err(ValueError::Invalid));
        }
    }

    mod email {
        use super::*;

        #[test]
        fn accepts_plain_addresses() {
            assert_eq!(
                validators().email(Some("mara@example.com")),
                Ok("mara@example.com".to_string())
            );
        }

        #[test]
        fn rejects_missing_or_duplicate_at() {
            let v = validators();
            assert_eq!(v.email(Some("mara.example.com")), Err(ValueError::Invalid));
            assert_eq!(v.email(Some("mara@@example.com")), Err(ValueError::Invalid));
        }

        #[test]
        fn rejects_undotted_or_malformed_domain() {
            let v = validators();
            assert_eq!(v.email(Some("mara@example")), Err(ValueError::Invalid));
            assert_eq!(v.email(Some("mara@.com")), Err(ValueError::Invalid));
            assert_eq!(v.email(Some("mara@example.")), Err(ValueError::Invalid));
            assert_eq!(v.email(Some("@example.com")), Err(ValueError::Invalid));
        }
    }

    mod names {
        use super::*;

        #[test]
        fn accepts_umlauts_hyphens_and_apostrophes() {
            let v = validators();
            assert_eq!(v.name(Some("Jürgen")), Ok("Jürgen".to_string()));
            assert_eq!(v.name(Some("Jean-Pierre")), Ok("Jean-Pierre".to_string()));
            assert_eq!(v.name(Some("O'Connor")), Ok("O'Connor".to_string()));
        }

        #[test]
        fn trims_surrounding_whitespace() {
            assert_eq!(validators().name(Some("  Mara  ")), Ok("Mara".to_string()));
        }

        #[test]
        fn rejects_digits_as_invalid_characters() {
            assert_eq!(
                validators().name(Some("Mara2")),
                Err(ValueError::InvalidCharacters)
            );
        }

        #[test]
        fn rejects_punctuation_only_as_no_letters() {
            assert_eq!(validators().name(Some("--'")), Err(ValueError::NoLetters));
        }
    }

    mod dispatch {
        use super::*;

        #[test]
        fn routes_keys_to_their_validators() {
            let v = validators();
            assert!(v.validate(FieldKey::DateOfBirth, Some("15.08.1992")).is_some());
            assert!(v.validate(FieldKey::Iban, Some("x")).is_some());
            assert!(v.validate(FieldKey::ZipCode, Some("10115")).is_some());
        }

        #[test]
        fn unvalidated_fields_return_none() {
            let v = validators();
            assert!(v.validate(FieldKey::CoverageScope, Some("single")).is_none());
            assert!(v.validate(FieldKey::ClaimCount, Some("2")).is_none());
            assert!(v.validate(FieldKey::PolicyId, Some("pol-1")).is_none());
        }
    }

    mod purity {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn validators_are_deterministic(input in ".{0,40}") {
                let v = validators();
                prop_assert_eq!(v.date(Some(&input)), v.date(Some(&input)));
                prop_assert_eq!(v.iban(Some(&input)), v.iban(Some(&input)));
                prop_assert_eq!(v.email(Some(&input)), v.email(Some(&input)));
                prop_assert_eq!(v.name(Some(&input)), v.name(Some(&input)));
            }

            #[test]
            fn validators_never_panic(input in ".{0,60}") {
                let v = validators();
                let _ = v.date_of_birth(Some(&input));
                let _ = v.date_in_future(Some(&input));
                let _ = v.iban(Some(&input));
                let _ = v.zip_code(Some(&input));
                let _ = v.email(Some(&input));
                let _ = v.name(Some(&input));
                let _ = v.address(Some(&input));
            }
        }
    }
}
