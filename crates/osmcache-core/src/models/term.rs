use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::today;

/// A bounded date range that scopes a section's members and progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub section_id: String,
}

impl Term {
    /// Inclusive on both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// First term (in supplied order) whose range contains `today`.
pub fn resolve_current(terms: &[Term], today: NaiveDate) -> Option<&Term> {
    terms.iter().find(|t| t.contains(today))
}

/// The terms of one section plus the active ("current") term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TermArray {
    terms: Vec<Term>,
    current: Option<Term>,
}

impl TermArray {
    /// Resolve the current term against today's UTC date.
    pub fn new(terms: Vec<Term>) -> Self {
        Self::resolved_at(terms, today())
    }

    pub fn resolved_at(terms: Vec<Term>, today: NaiveDate) -> Self {
        let current = resolve_current(&terms, today).cloned();
        Self { terms, current }
    }

    /// A new array over the same terms with an explicit current term.
    pub fn change_current_term(&self, term: Term) -> Self {
        Self {
            terms: self.terms.clone(),
            current: Some(term),
        }
    }

    pub fn current(&self) -> Option<&Term> {
        self.current.as_ref()
    }

    pub fn find(&self, term_id: &str) -> Option<&Term> {
        self.terms.iter().find(|t| t.id == term_id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Term> {
        self.terms.iter()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl<'a> IntoIterator for &'a TermArray {
    type Item = &'a Term;
    type IntoIter = std::slice::Iter<'a, Term>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.iter()
    }
}
