//! Daily comparison selection
//!
//! Maps a UTC calendar date to the comparison shown to every voter that day:
//! a scheduled entry when one exists, otherwise a pairing and theme derived
//! deterministically from the date alone so that all observers see the same
//! comparison.

pub mod schedule;
pub mod themes;

pub use schedule::{InMemoryScheduleStore, ScheduleStore};

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::company::CompanyStore;
use crate::error::VotingError;
use crate::types::{Company, Comparison};

/// Resolves the comparison for a given voting day
pub struct DailySelector {
    schedule: Arc<dyn ScheduleStore>,
    companies: Arc<dyn CompanyStore>,
}

impl DailySelector {
    pub fn new(schedule: Arc<dyn ScheduleStore>, companies: Arc<dyn CompanyStore>) -> Self {
        Self { schedule, companies }
    }

    /// Get the comparison for `date`: the scheduled entry if one exists,
    /// otherwise the deterministic fallback pairing.
    pub fn comparison_for(&self, date: NaiveDate) -> crate::error::Result<Comparison> {
        if let Some(scheduled) = self.schedule.get(date)? {
            debug!(
                "Using scheduled comparison for {} - theme: '{}', companies: {:?}",
                date, scheduled.theme, scheduled.company_ids
            );

            let records = self.companies.get_many(&scheduled.company_ids)?;
            let mut companies = Vec::with_capacity(scheduled.company_ids.len());
            for company_id in &scheduled.company_ids {
                let record = records
                    .get(company_id)
                    .ok_or(VotingError::CompanyNotFound {
                        company_id: *company_id,
                    })?;
                companies.push(record.company.clone());
            }

            return Ok(Comparison {
                date,
                theme: scheduled.theme,
                companies,
            });
        }

        self.fallback_comparison(date)
    }

    /// Derive the fallback pairing purely from the date string.
    ///
    /// The company list is ordered by id so the derivation is a pure function
    /// of (date, registered companies) with no per-request randomness.
    fn fallback_comparison(&self, date: NaiveDate) -> crate::error::Result<Comparison> {
        let all = self.companies.list()?;
        if all.len() < 2 {
            return Err(VotingError::NotEnoughCompanies {
                available: all.len(),
            }
            .into());
        }

        let hash = date_hash(date);
        let first_index = (hash % all.len() as u64) as usize;
        let mut second_index = (hash.wrapping_mul(13) % all.len() as u64) as usize;
        if second_index == first_index {
            second_index = (second_index + 1) % all.len();
        }

        let theme = themes::theme_for(date);
        debug!(
            "Derived fallback comparison for {} - theme: '{}', pair: ({}, {})",
            date, theme, all[first_index].name, all[second_index].name
        );

        Ok(Comparison {
            date,
            theme,
            companies: vec![all[first_index].clone(), all[second_index].clone()],
        })
    }
}

/// Hash of the `YYYY-MM-DD` form of a date: the sum of its character codes
fn date_hash(date: NaiveDate) -> u64 {
    date.format("%Y-%m-%d")
        .to_string()
        .bytes()
        .map(u64::from)
        .sum()
}

/// Day-of-year of a date, 1-based, used for the theme cycle
pub(crate) fn day_of_year(date: NaiveDate) -> usize {
    date.ordinal() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::InMemoryCompanyStore;
    use crate::types::NewCompany;

    fn store_with_companies(names: &[&str]) -> Arc<InMemoryCompanyStore> {
        let store = Arc::new(InMemoryCompanyStore::new());
        for name in names {
            store
                .create(
                    NewCompany {
                        name: name.to_string(),
                        logo: String::new(),
                        rating: None,
                        votes: None,
                        win_percentage: None,
                    },
                    1500,
                )
                .unwrap();
        }
        store
    }

    fn selector(companies: Arc<InMemoryCompanyStore>) -> DailySelector {
        DailySelector::new(Arc::new(InMemoryScheduleStore::new()), companies)
    }

    #[test]
    fn test_date_hash_is_char_code_sum() {
        // "2025-01-01": '2'+'0'+'2'+'5'+'-'+'0'+'1'+'-'+'0'+'1'
        let expected: u64 = "2025-01-01".bytes().map(u64::from).sum();
        assert_eq!(
            date_hash(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            expected
        );
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let companies = store_with_companies(&["A", "B", "C", "D", "E"]);
        let selector = selector(companies);
        let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();

        let first = selector.comparison_for(date).unwrap();
        for _ in 0..5 {
            let again = selector.comparison_for(date).unwrap();
            assert_eq!(again.theme, first.theme);
            let ids: Vec<_> = again.companies.iter().map(|c| c.id).collect();
            let first_ids: Vec<_> = first.companies.iter().map(|c| c.id).collect();
            assert_eq!(ids, first_ids);
        }
    }

    #[test]
    fn test_fallback_never_pairs_company_with_itself() {
        let companies = store_with_companies(&["A", "B", "C"]);
        let selector = selector(companies);

        let mut date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        for _ in 0..365 {
            let comparison = selector.comparison_for(date).unwrap();
            assert_eq!(comparison.companies.len(), 2);
            assert_ne!(comparison.companies[0].id, comparison.companies[1].id);
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_not_enough_companies() {
        let companies = store_with_companies(&["A"]);
        let selector = selector(companies);
        let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();

        let err = selector.comparison_for(date).unwrap_err();
        let voting_err = err.downcast_ref::<VotingError>().unwrap();
        assert!(matches!(
            voting_err,
            VotingError::NotEnoughCompanies { available: 1 }
        ));
    }

    #[test]
    fn test_schedule_entry_wins_over_fallback() {
        let companies = store_with_companies(&["A", "B", "C", "D"]);
        let schedule = Arc::new(InMemoryScheduleStore::new());
        let all = companies.list().unwrap();
        let date = NaiveDate::from_ymd_opt(2099, 3, 1).unwrap();

        schedule
            .insert(crate::types::ScheduledComparison {
                date,
                theme: "Cloud Computing Leaders".to_string(),
                company_ids: vec![all[2].id, all[3].id],
            })
            .unwrap();

        let selector = DailySelector::new(schedule, companies);
        let comparison = selector.comparison_for(date).unwrap();
        assert_eq!(comparison.theme, "Cloud Computing Leaders");
        assert_eq!(comparison.companies[0].id, all[2].id);
        assert_eq!(comparison.companies[1].id, all[3].id);
    }

    #[test]
    fn test_scheduled_comparison_with_missing_company_fails() {
        let companies = store_with_companies(&["A", "B"]);
        let schedule = Arc::new(InMemoryScheduleStore::new());
        let date = NaiveDate::from_ymd_opt(2099, 3, 1).unwrap();

        schedule
            .insert(crate::types::ScheduledComparison {
                date,
                theme: "Tech Giants".to_string(),
                company_ids: vec![1, 999],
            })
            .unwrap();

        let selector = DailySelector::new(schedule, companies);
        assert!(selector.comparison_for(date).is_err());
    }
}
