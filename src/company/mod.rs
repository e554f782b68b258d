//! Company registry and mutable rating state

pub mod store;

pub use store::{CompanyRecord, CompanyStore, InMemoryCompanyStore};
