//! Insurance adapters - policy platform client implementations.

mod http;
mod mock;

pub use http::{HttpInsuranceApi, InsuranceApiConfig};
pub use mock::{FiledTermination, MockInsuranceApi};
