use stockview_core::{BoxState, Dataset, FactRow, QueryTransport, QueryVariables, TransportError};
use tracing::debug;

/// Serves the boxes query from a dataset file, applying the server-side
/// part of the filters (states and tags) and the page size.
#[derive(Debug)]
pub struct DatasetTransport {
    dataset: Dataset,
}

impl DatasetTransport {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }
}

impl QueryTransport for DatasetTransport {
    type Output = Vec<FactRow>;

    fn fetch(&mut self, variables: &QueryVariables) -> Result<Vec<FactRow>, TransportError> {
        if variables.base_id != self.dataset.base_id {
            return Err(TransportError::Server(format!(
                "base '{}' is not available",
                variables.base_id
            )));
        }

        let states: Option<Vec<BoxState>> = variables
            .filter_input
            .states
            .as_ref()
            .filter(|states| !states.is_empty())
            .map(|states| states.iter().filter_map(|s| s.parse().ok()).collect());
        let tag_ids = variables
            .filter_input
            .tag_ids
            .as_ref()
            .filter(|ids| !ids.is_empty());

        let facts: Vec<FactRow> = self
            .dataset
            .facts
            .iter()
            .filter(|row| states.as_ref().map_or(true, |states| states.contains(&row.box_state)))
            .filter(|row| tag_ids.map_or(true, |ids| row.tag_ids.iter().any(|id| ids.contains(id))))
            .take(variables.pagination_input as usize)
            .cloned()
            .collect();

        debug!(rows = facts.len(), "served boxes query");
        Ok(facts)
    }
}
