//! Insurance module - typed payloads exchanged with the policy platform.

mod types;

pub use types::{
    AuthToken, CancellationOrder, Customer, CustomerValues, DraftInvoice, PaymentOrder,
    PaymentReceipt, Policy, PolicyDraft, PolicyDraftOrder, Quote, QuoteRequest, TariffPackage,
    WithdrawalOrder,
};
