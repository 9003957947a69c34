//! Recorded query shape
//!
//! [`QueryPlan`] is the list of steps applied to a query, in application
//! order. The in-memory store executes it directly; tests use it to assert the
//! shape the evaluator produced.

use crate::specification::{Criteria, Include, OrderDirection, SortKey};

/// One transformation applied to a query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryStep {
    /// Filter by criteria
    Filter(Criteria),
    /// Eager-load a relation
    Include(Include),
    /// Sort by a key
    OrderBy(SortKey, OrderDirection),
    /// Skip a number of results
    Skip(u64),
    /// Keep a number of results
    Take(u64),
}

/// Ordered list of [`QueryStep`]s
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPlan {
    steps: Vec<QueryStep>,
}

impl QueryPlan {
    /// Empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step
    pub fn push(&mut self, step: QueryStep) {
        self.steps.push(step);
    }

    /// Steps in application order
    pub fn steps(&self) -> &[QueryStep] {
        &self.steps
    }

    /// Relations to load, in order
    pub fn includes(&self) -> impl Iterator<Item = &Include> {
        self.steps.iter().filter_map(|step| match step {
            QueryStep::Include(include) => Some(include),
            _ => None,
        })
    }

    /// Whether the plan has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_includes_filters_other_steps() {
        let mut plan = QueryPlan::new();
        assert!(plan.is_empty());
        plan.push(QueryStep::Skip(1));
        plan.push(QueryStep::Include(Include::new("a")));
        plan.push(QueryStep::Take(2));
        plan.push(QueryStep::Include(Include::new("b")));

        let includes: Vec<_> = plan.includes().map(Include::path).collect();
        assert_eq!(includes, vec!["a", "b"]);
        assert_eq!(plan.steps().len(), 4);
    }
}
