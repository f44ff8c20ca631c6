use crate::query_variables::QueryVariables;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Handle for one issued fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    variables: QueryVariables,
}

impl FetchTicket {
    pub fn variables(&self) -> &QueryVariables {
        &self.variables
    }
}

/// Tracks fetches keyed by their variables so a response that arrives after
/// newer filters were applied never replaces the current data.
///
/// Completed results are kept in a small in-memory cache keyed by variables.
#[derive(Debug)]
pub struct FetchTracker<T> {
    generation: u64,
    latest: Option<FetchTicket>,
    cache: HashMap<QueryVariables, T>,
    order: VecDeque<QueryVariables>,
    capacity: usize,
}

impl<T> FetchTracker<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            generation: 0,
            latest: None,
            cache: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Register a new fetch; every older ticket becomes stale
    pub fn begin(&mut self, variables: QueryVariables) -> FetchTicket {
        self.generation += 1;
        let ticket = FetchTicket {
            generation: self.generation,
            variables,
        };
        self.latest = Some(ticket.clone());
        ticket
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.latest.as_ref() == Some(ticket)
    }

    /// Record a finished fetch. Returns `false` for a stale ticket, whose
    /// result is only cached under its own variables.
    pub fn complete(&mut self, ticket: &FetchTicket, result: T) -> bool {
        let current = self.is_current(ticket);
        if !current {
            debug!(generation = ticket.generation, "ignoring stale fetch result");
        }
        self.store(ticket.variables.clone(), result);
        current
    }

    pub fn cached(&self, variables: &QueryVariables) -> Option<&T> {
        self.cache.get(variables)
    }

    /// Result for the latest ticket, if it has arrived
    pub fn current(&self) -> Option<&T> {
        self.latest
            .as_ref()
            .and_then(|ticket| self.cache.get(&ticket.variables))
    }

    fn store(&mut self, variables: QueryVariables, result: T) {
        if self.cache.insert(variables.clone(), result).is_none() {
            self.order.push_back(variables);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.cache.remove(&oldest);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilterSet, FilterValue};
    use crate::query_variables::to_query_variables;
    use pretty_assertions::assert_eq;

    fn vars(tags: &[&str]) -> QueryVariables {
        let mut filters = FilterSet::new();
        filters.set("tags", FilterValue::list(tags.iter().copied()));
        to_query_variables("1", &filters)
    }

    #[test]
    fn test_stale_result_does_not_become_current() {
        let mut tracker = FetchTracker::new(4);
        let old = tracker.begin(vars(&["80"]));
        let new = tracker.begin(vars(&["85"]));

        assert!(tracker.complete(&new, "fresh"));
        assert!(!tracker.complete(&old, "stale"));
        assert_eq!(tracker.current(), Some(&"fresh"));
        assert_eq!(tracker.cached(&vars(&["80"])), Some(&"stale"));
    }

    #[test]
    fn test_same_variables_new_generation() {
        let mut tracker = FetchTracker::new(4);
        let first = tracker.begin(vars(&["80"]));
        let second = tracker.begin(vars(&["80"]));

        assert!(!tracker.is_current(&first));
        assert!(tracker.is_current(&second));
        assert_eq!(tracker.current(), None::<&u32>);
    }

    #[test]
    fn test_cache_evicts_oldest() {
        let mut tracker = FetchTracker::new(2);
        for (i, tag) in ["1", "2", "3"].into_iter().enumerate() {
            let ticket = tracker.begin(vars(&[tag]));
            tracker.complete(&ticket, i);
        }

        assert_eq!(tracker.cached(&vars(&["1"])), None);
        assert_eq!(tracker.cached(&vars(&["2"])), Some(&1));
        assert_eq!(tracker.current(), Some(&2));
    }
}
