//! Company storage interface and implementations
//!
//! This module defines the interface for persisting company records and the
//! in-memory implementation. Rating mutations go through a versioned
//! compare-and-swap so concurrent voters never lose updates; the persistence
//! contract (not a specific engine) is what callers rely on.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::error::VotingError;
use crate::types::{Company, CompanyId, NewCompany};
use crate::utils::current_timestamp;

/// A stored company with its optimistic-concurrency version
#[derive(Debug, Clone)]
pub struct CompanyRecord {
    pub company: Company,
    /// Rating at registration; the aggregation baseline until a history
    /// snapshot exists for the company
    pub initial_rating: i64,
    /// Incremented on every successful update; the CAS token
    pub version: u64,
}

/// Trait for company storage operations
pub trait CompanyStore: Send + Sync {
    /// Register a new company, assigning its id
    fn create(&self, new_company: NewCompany, default_rating: i64) -> crate::error::Result<Company>;

    /// Get a company record by id
    fn get(&self, company_id: CompanyId) -> crate::error::Result<Option<CompanyRecord>>;

    /// Get records for multiple companies
    fn get_many(
        &self,
        company_ids: &[CompanyId],
    ) -> crate::error::Result<HashMap<CompanyId, CompanyRecord>>;

    /// All companies ordered by id (deterministic for daily pair derivation)
    fn list(&self) -> crate::error::Result<Vec<Company>>;

    /// Number of registered companies
    fn count(&self) -> crate::error::Result<usize>;

    /// Replace a company's mutable state if the stored version still matches.
    ///
    /// Returns `false` when the version moved underneath the caller, in which
    /// case the caller re-reads and retries.
    fn update_if_version(
        &self,
        company_id: CompanyId,
        expected_version: u64,
        company: Company,
    ) -> crate::error::Result<bool>;

    /// Remove a company. The caller is responsible for refusing removal while
    /// votes still reference the company.
    fn remove(&self, company_id: CompanyId) -> crate::error::Result<bool>;
}

/// In-memory company storage implementation
#[derive(Debug, Default)]
pub struct InMemoryCompanyStore {
    companies: RwLock<HashMap<CompanyId, CompanyRecord>>,
    next_id: AtomicU64,
}

impl InMemoryCompanyStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            companies: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl CompanyStore for InMemoryCompanyStore {
    fn create(
        &self,
        new_company: NewCompany,
        default_rating: i64,
    ) -> crate::error::Result<Company> {
        if new_company.name.is_empty() {
            return Err(VotingError::InvalidInput {
                reason: "Company name cannot be empty".to_string(),
            }
            .into());
        }

        let company = Company {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: new_company.name,
            logo: new_company.logo,
            rating: new_company.rating.unwrap_or(default_rating),
            votes: new_company.votes.unwrap_or(0),
            win_percentage: new_company.win_percentage.unwrap_or(0),
            created_at: current_timestamp(),
        };

        let mut companies = self
            .companies
            .write()
            .map_err(|_| VotingError::Internal {
                message: "Failed to acquire companies write lock".to_string(),
            })?;

        companies.insert(
            company.id,
            CompanyRecord {
                initial_rating: company.rating,
                company: company.clone(),
                version: 0,
            },
        );

        Ok(company)
    }

    fn get(&self, company_id: CompanyId) -> crate::error::Result<Option<CompanyRecord>> {
        let companies = self
            .companies
            .read()
            .map_err(|_| VotingError::Internal {
                message: "Failed to acquire companies read lock".to_string(),
            })?;

        Ok(companies.get(&company_id).cloned())
    }

    fn get_many(
        &self,
        company_ids: &[CompanyId],
    ) -> crate::error::Result<HashMap<CompanyId, CompanyRecord>> {
        let companies = self
            .companies
            .read()
            .map_err(|_| VotingError::Internal {
                message: "Failed to acquire companies read lock".to_string(),
            })?;

        let mut result = HashMap::new();
        for company_id in company_ids {
            if let Some(record) = companies.get(company_id) {
                result.insert(*company_id, record.clone());
            }
        }

        Ok(result)
    }

    fn list(&self) -> crate::error::Result<Vec<Company>> {
        let companies = self
            .companies
            .read()
            .map_err(|_| VotingError::Internal {
                message: "Failed to acquire companies read lock".to_string(),
            })?;

        let mut all: Vec<Company> = companies.values().map(|r| r.company.clone()).collect();
        all.sort_by_key(|c| c.id);
        Ok(all)
    }

    fn count(&self) -> crate::error::Result<usize> {
        let companies = self
            .companies
            .read()
            .map_err(|_| VotingError::Internal {
                message: "Failed to acquire companies read lock".to_string(),
            })?;

        Ok(companies.len())
    }

    fn update_if_version(
        &self,
        company_id: CompanyId,
        expected_version: u64,
        company: Company,
    ) -> crate::error::Result<bool> {
        let mut companies = self
            .companies
            .write()
            .map_err(|_| VotingError::Internal {
                message: "Failed to acquire companies write lock".to_string(),
            })?;

        let record = companies
            .get_mut(&company_id)
            .ok_or(VotingError::CompanyNotFound { company_id })?;

        if record.version != expected_version {
            return Ok(false);
        }

        record.company = company;
        record.version += 1;
        Ok(true)
    }

    fn remove(&self, company_id: CompanyId) -> crate::error::Result<bool> {
        let mut companies = self
            .companies
            .write()
            .map_err(|_| VotingError::Internal {
                message: "Failed to acquire companies write lock".to_string(),
            })?;

        Ok(companies.remove(&company_id).is_some())
    }
}
