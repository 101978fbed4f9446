//! Field-wise merge of collection records.
//!
//! The merge is total over [`FieldKey::ALL`] and asymmetric on purpose:
//! a newly extracted value only wins when it actually carries information.
//! A plain struct update would let a `None` coming back from extraction
//! erase a value the user already gave us; this function cannot.

use super::record::{DataCollection, FieldKey};

/// Merges `incoming` over `existing`.
///
/// For every schema field: take the incoming value if it is non-empty,
/// otherwise keep the existing value if non-empty, otherwise `None`.
pub fn merge(existing: Option<&DataCollection>, incoming: Option<&DataCollection>) -> DataCollection {
    let mut merged = DataCollection::new();
    for key in FieldKey::ALL {
        let incoming_value = incoming
            .and_then(|record| record.get(key))
            .filter(|value| !value.is_empty());
        let value = incoming_value.or_else(|| {
            existing
                .and_then(|record| record.get(key))
                .filter(|value| !value.is_empty())
        });
        merged.set(key, value);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::collection::record::{CoverageScope, FieldValue};

    fn record_with(entries: &[(FieldKey, FieldValue)]) -> DataCollection {
        let mut record = DataCollection::new();
        for (key, value) in entries {
            record.set(*key, Some(value.clone()));
        }
        record
    }

    #[test]
    fn incoming_value_wins_when_present() {
        let existing = record_with(&[(FieldKey::City, FieldValue::Text("Berlin".into()))]);
        let incoming = record_with(&[(FieldKey::City, FieldValue::Text("Hamburg".into()))]);

        let merged = merge(Some(&existing), Some(&incoming));
        assert_eq!(merged.city.as_deref(), Some("Hamburg"));
    }

    #[test]
    fn empty_incoming_does_not_erase_existing() {
        let existing = record_with(&[
            (FieldKey::FirstName, FieldValue::Text("Mara".into())),
            (FieldKey::HasClaims, FieldValue::Flag(false)),
        ]);

        let merged = merge(Some(&existing), Some(&DataCollection::new()));
        assert_eq!(merged, existing);
    }

    #[test]
    fn blank_string_counts_as_absent() {
        let existing = record_with(&[(FieldKey::Street, FieldValue::Text("Hauptstr.".into()))]);
        let incoming = record_with(&[(FieldKey::Street, FieldValue::Text("   ".into()))]);

        let merged = merge(Some(&existing), Some(&incoming));
        assert_eq!(merged.street.as_deref(), Some("Hauptstr."));
    }

    #[test]
    fn unknown_fields_resolve_to_none() {
        let merged = merge(None, None);
        for key in FieldKey::ALL {
            assert!(merged.is_empty(key));
        }
    }

    #[test]
    fn fields_from_both_sides_coexist() {
        let existing = record_with(&[(FieldKey::FirstName, FieldValue::Text("Mara".into()))]);
        let incoming = record_with(&[(
            FieldKey::CoverageScope,
            FieldValue::Scope(CoverageScope::Single),
        )]);

        let merged = merge(Some(&existing), Some(&incoming));
        assert_eq!(merged.first_name.as_deref(), Some("Mara"));
        assert_eq!(merged.coverage_scope, Some(CoverageScope::Single));
    }

    #[test]
    fn false_and_zero_are_information() {
        let existing = record_with(&[
            (FieldKey::HasInsurance, FieldValue::Flag(true)),
            (FieldKey::ClaimCount, FieldValue::Count(2)),
        ]);
        let incoming = record_with(&[
            (FieldKey::HasInsurance, FieldValue::Flag(false)),
            (FieldKey::ClaimCount, FieldValue::Count(0)),
        ]);

        let merged = merge(Some(&existing), Some(&incoming));
        assert_eq!(merged.has_insurance, Some(false));
        assert_eq!(merged.claim_count, Some(0));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn text_field() -> impl Strategy<Value = Option<String>> {
            proptest::option::of("[a-zA-Z0-9 ]{0,12}")
        }

        fn arb_record() -> impl Strategy<Value = DataCollection> {
            (
                text_field(),
                text_field(),
                text_field(),
                proptest::option::of(any::<bool>()),
                proptest::option::of(0u32..10),
            )
                .prop_map(|(first, last, city, has_claims, claim_count)| {
                    let mut record = DataCollection::new();
                    record.first_name = first;
                    record.last_name = last;
                    record.city = city;
                    record.has_claims = has_claims;
                    record.claim_count = claim_count;
                    record
                })
        }

        proptest! {
            #[test]
            fn merge_is_idempotent(a in arb_record(), b in arb_record()) {
                let once = merge(Some(&a), Some(&b));
                let twice = merge(Some(&once), None);
                prop_assert_eq!(once, twice);
            }

            #[test]
            fn merging_nothing_normalizes_blanks_only(a in arb_record()) {
                let merged = merge(Some(&a), Some(&DataCollection::new()));
                for key in FieldKey::ALL {
                    prop_assert_eq!(merged.is_empty(key), a.is_empty(key));
                }
            }

            #[test]
            fn incoming_information_always_survives(a in arb_record(), b in arb_record()) {
                let merged = merge(Some(&a), Some(&b));
                for key in FieldKey::ALL {
                    if let Some(value) = b.get(key).filter(|v| !v.is_empty()) {
                        prop_assert_eq!(merged.get(key), Some(value));
                    }
                }
            }
        }
    }
}
