use anyhow::{Context, Result};
use std::path::Path;
use stockview_core::*;

use crate::operations::DatasetTransport;

/// Fetch results kept for recently used query variables
const FETCH_CACHE_SIZE: usize = 8;

/// Application state: one mounted statistics view over a dataset
#[derive(Debug)]
pub struct AppState {
    /// Filters, measure and drilldown bound to the in-memory URL
    pub sync: FilterSynchronizer<MemoryQueryPort>,
    /// Stand-in for the remote boxes query
    pub transport: DatasetTransport,
    /// Fetched rows keyed by the variables they were fetched for
    pub fetches: FetchTracker<Vec<FactRow>>,
    pub dimensions: DimensionTables,
}

impl AppState {
    /// Load the dataset, mount the view on `query` and run the initial fetch
    pub fn load(dataset_path: &Path, config_path: Option<&Path>, query: &str) -> Result<Self> {
        let dataset = load_dataset(dataset_path)
            .with_context(|| format!("loading dataset {}", dataset_path.display()))?;

        let config = match config_path {
            Some(path) => load_config(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => EngineConfig::default(),
        };

        let port = MemoryQueryPort::from_query_string(query);
        let sync = FilterSynchronizer::mount(port, dataset.base_id.clone(), config);
        let dimensions = dataset.dimensions.clone();
        let mut transport = DatasetTransport::new(dataset);
        let facts = sync.fetch(&mut transport).context("initial fetch")?;

        let mut app = Self {
            sync,
            transport,
            fetches: FetchTracker::new(FETCH_CACHE_SIZE),
            dimensions,
        };
        app.record_fetch(facts);
        Ok(app)
    }

    /// Store rows fetched for the synchronizer's current variables
    pub fn record_fetch(&mut self, facts: Vec<FactRow>) {
        let ticket = self.fetches.begin(self.sync.query_variables());
        self.fetches.complete(&ticket, facts);
    }

    /// Rows of the latest fetch
    pub fn facts(&self) -> &[FactRow] {
        self.fetches.current().map(Vec::as_slice).unwrap_or_default()
    }

    /// Chart rows for the current filters and drilldown level, unsorted
    pub fn chart_rows(&self) -> Vec<AggregatedRow> {
        let rows = apply_row_filters(self.facts(), self.sync.filters());
        self.sync
            .drilldown()
            .recompute(&rows, &self.dimensions, self.sync.measure())
    }

    /// Address-bar form of the current URL state
    pub fn url(&self) -> String {
        let query = self.sync.port().current().to_query_string();
        if query.is_empty() {
            String::new()
        } else {
            format!("?{}", query)
        }
    }
}
