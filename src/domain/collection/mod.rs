//! Collection module - the cross-workflow data record and the hybrid
//! extraction/validation pipeline that fills it.

mod hybrid;
mod merge;
mod record;
mod validators;

pub use hybrid::{CollectionError, CollectionOutcome, HybridCollector, ValidationFailure};
pub use merge::merge;
pub use record::{CoverageScope, DataCollection, FieldKey, FieldValue, TerminationReason};
pub use validators::{FieldValidators, ValidationRules, ValueError};
