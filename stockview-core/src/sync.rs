//! Keeps a view's filters, measure and drilldown consistent with the URL.
//!
//! The URL is reached through a [`QueryPort`] and remote data through a
//! [`QueryTransport`], so a view can be driven without a browser. Every
//! committed change reaches the port as a single replace.

use crate::config::EngineConfig;
use crate::drilldown::DrilldownState;
use crate::error::{SyncError, TransportError};
use crate::models::{facet, BoxState, Dimension, FilterSet, FilterValue, Measure};
use crate::normalize::{absent_policy_for, normalize_id_strings, normalize_ids};
use crate::query_string::{decode_values, QueryParams, QueryUpdate};
use crate::query_variables::{to_query_variables_with_page_size, QueryVariables};
use tracing::{debug, warn};

/// URL parameters a statistics view reads, with the facet each one feeds
pub const URL_FACETS: &[(&str, &str)] = &[
    ("box_state", facet::STATE),
    ("category_ids", facet::PRODUCT_CATEGORY),
    ("product_ids", facet::PRODUCT),
    ("size_ids", facet::SIZE),
    ("gender_ids", facet::GENDER),
    ("location_ids", facet::LOCATION),
    ("tag_ids", facet::TAGS),
];

/// URL parameter selecting the aggregation measure
pub const MEASURE_PARAM: &str = "boi";

/// Read/write access to the address bar's query string
pub trait QueryPort {
    fn get_query(&self) -> QueryParams;
    /// Replace the whole query string; one call is one history replace
    fn set_query(&mut self, params: QueryParams);
}

/// The remote data query
pub trait QueryTransport {
    type Output;
    fn fetch(&mut self, variables: &QueryVariables) -> Result<Self::Output, TransportError>;
}

/// In-memory location that records every replace it receives
#[derive(Debug, Clone, Default)]
pub struct MemoryQueryPort {
    current: QueryParams,
    replaces: Vec<QueryParams>,
}

impl MemoryQueryPort {
    pub fn new(params: QueryParams) -> Self {
        Self {
            current: params,
            replaces: Vec::new(),
        }
    }

    pub fn from_query_string(raw: &str) -> Self {
        Self::new(QueryParams::parse(raw))
    }

    pub fn current(&self) -> &QueryParams {
        &self.current
    }

    pub fn replace_count(&self) -> usize {
        self.replaces.len()
    }

    pub fn history(&self) -> &[QueryParams] {
        &self.replaces
    }

    /// Simulate navigation that bypasses the view (back button, pasted link)
    pub fn navigate(&mut self, raw: &str) {
        self.current = QueryParams::parse(raw);
    }
}

impl QueryPort for MemoryQueryPort {
    fn get_query(&self) -> QueryParams {
        self.current.clone()
    }

    fn set_query(&mut self, params: QueryParams) {
        self.replaces.push(params.clone());
        self.current = params;
    }
}

pub fn param_for_facet(facet_id: &str) -> Option<&'static str> {
    URL_FACETS
        .iter()
        .find(|(_, id)| *id == facet_id)
        .map(|(param, _)| *param)
}

pub fn facet_for_param(param: &str) -> Option<&'static str> {
    URL_FACETS
        .iter()
        .find(|(name, _)| *name == param)
        .map(|(_, id)| *id)
}

/// Entries a facet value is written to the URL as: known box states for
/// `state`, parsable ids for everything else.
pub fn url_values(facet_id: &str, value: &FilterValue) -> Vec<String> {
    let policy = absent_policy_for(facet_id);
    if facet_id == facet::STATE {
        normalize_id_strings(value, policy)
            .into_iter()
            .filter(|state| state.parse::<BoxState>().is_ok())
            .collect()
    } else {
        normalize_ids(value, policy)
            .valid()
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

/// Seed filters from the URL. Malformed entries are skipped and a parameter
/// left with nothing valid means no filter on that facet.
pub fn filters_from_query(params: &QueryParams) -> FilterSet {
    let mut filters = FilterSet::new();
    for (param, facet_id) in URL_FACETS {
        let Some(raw) = decode_values(params, param) else {
            continue;
        };
        let values = url_values(facet_id, &FilterValue::list(raw));
        if !values.is_empty() {
            filters.set(*facet_id, FilterValue::list(values));
        }
    }
    filters
}

pub fn measure_from_query(params: &QueryParams, default: Measure) -> Measure {
    params
        .get(MEASURE_PARAM)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterEdit {
    Set(String, FilterValue),
    Clear(String),
}

/// A batch of edits committed together
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChange {
    edits: Vec<FilterEdit>,
    measure: Option<Measure>,
}

impl FilterChange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a facet; an empty value clears it
    pub fn set(mut self, id: impl Into<String>, value: FilterValue) -> Self {
        self.edits.push(FilterEdit::Set(id.into(), value));
        self
    }

    pub fn clear(mut self, id: impl Into<String>) -> Self {
        self.edits.push(FilterEdit::Clear(id.into()));
        self
    }

    pub fn measure(mut self, measure: Measure) -> Self {
        self.measure = Some(measure);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty() && self.measure.is_none()
    }

    fn apply_to(&self, filters: &FilterSet) -> FilterSet {
        let mut next = filters.clone();
        for edit in &self.edits {
            match edit {
                FilterEdit::Set(id, value) if !value.is_empty() => next.set(id.clone(), value.clone()),
                FilterEdit::Set(id, _) | FilterEdit::Clear(id) => {
                    next.remove(id);
                }
            }
        }
        next
    }
}

/// What a commit did
#[derive(Debug)]
pub struct SyncOutcome<T> {
    /// Data fetched for the new variables, when a forwarded facet changed
    pub refetched: Option<T>,
    pub url_replaced: bool,
    /// Facets whose in-memory value changed
    pub changed: Vec<String>,
}

impl<T> SyncOutcome<T> {
    fn unchanged() -> Self {
        Self {
            refetched: None,
            url_replaced: false,
            changed: Vec::new(),
        }
    }
}

/// Per-view binding of filters, measure and drilldown to the URL
#[derive(Debug)]
pub struct FilterSynchronizer<P> {
    port: P,
    config: EngineConfig,
    base_id: String,
    filters: FilterSet,
    measure: Measure,
    drilldown: DrilldownState,
    last_read: QueryParams,
}

impl<P: QueryPort> FilterSynchronizer<P> {
    /// Seed state from the current URL, falling back to config defaults
    pub fn mount(port: P, base_id: impl Into<String>, config: EngineConfig) -> Self {
        let last_read = port.get_query();
        let filters = filters_from_query(&last_read);
        let measure = measure_from_query(&last_read, config.default_measure);
        let drilldown = DrilldownState::with_max_depth(config.default_base, config.max_drill_depth);
        let base_id = base_id.into();

        debug!(base_id = %base_id, filters = filters.len(), measure = %measure, "view mounted");

        Self {
            port,
            config,
            base_id,
            filters,
            measure,
            drilldown,
            last_read,
        }
    }

    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn measure(&self) -> Measure {
        self.measure
    }

    pub fn drilldown(&self) -> &DrilldownState {
        &self.drilldown
    }

    /// Drill transitions only touch in-memory state
    pub fn drilldown_mut(&mut self) -> &mut DrilldownState {
        &mut self.drilldown
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn query_variables(&self) -> QueryVariables {
        self.variables_for(&self.filters)
    }

    /// Fetch data for the current filters (initial load or a user retry)
    pub fn fetch<T: QueryTransport>(&self, transport: &mut T) -> Result<T::Output, SyncError> {
        self.fetch_for(&self.filters, transport)
    }

    /// Facets whose in-memory value is not what the last read URL says
    pub fn divergence(&self) -> Vec<&'static str> {
        diverged_facets(&self.filters, &self.last_read)
    }

    /// Commit a batch of edits.
    ///
    /// If the batch changes the query variables the remote query runs
    /// first; when it fails nothing is committed. The URL then receives at
    /// most one replace for the whole batch, covering the facets whose URL
    /// form diverged.
    pub fn apply<T: QueryTransport>(
        &mut self,
        change: FilterChange,
        transport: &mut T,
    ) -> Result<SyncOutcome<T::Output>, SyncError> {
        let candidate = change.apply_to(&self.filters);
        let measure = change.measure.unwrap_or(self.measure);

        let diverged = diverged_facets(&candidate, &self.last_read);
        let measure_diverged =
            measure_from_query(&self.last_read, self.config.default_measure) != measure;
        let changed = changed_facets(&self.filters, &candidate);

        let refetched = if self.variables_for(&candidate) != self.query_variables() {
            Some(self.fetch_for(&candidate, transport)?)
        } else {
            None
        };

        let mut update = QueryUpdate::new();
        for facet_id in &diverged {
            if let Some(param) = param_for_facet(facet_id) {
                let values = candidate
                    .get(facet_id)
                    .map(|value| url_values(facet_id, value))
                    .unwrap_or_default();
                update.set_values(param, values.as_slice());
            }
        }
        if measure_diverged {
            update.set_raw(MEASURE_PARAM, measure.as_str());
        }

        self.filters = candidate;
        self.measure = measure;
        let url_replaced = self.write_url(&update);

        Ok(SyncOutcome {
            refetched,
            url_replaced,
            changed,
        })
    }

    /// Switch the top-level grouping and commit `change` in the same replace.
    /// The drilldown is only reset once the commit succeeded.
    pub fn regroup<T: QueryTransport>(
        &mut self,
        base: Dimension,
        change: FilterChange,
        transport: &mut T,
    ) -> Result<SyncOutcome<T::Output>, SyncError> {
        let outcome = self.apply(change, transport)?;
        self.drilldown.reset(base);
        Ok(outcome)
    }

    /// Adopt a URL that changed outside the view. Facets without a URL
    /// parameter keep their in-memory value.
    pub fn on_url_changed<T: QueryTransport>(
        &mut self,
        transport: &mut T,
    ) -> Result<SyncOutcome<T::Output>, SyncError> {
        let params = self.port.get_query();
        if params == self.last_read {
            return Ok(SyncOutcome::unchanged());
        }

        let mut filters = filters_from_query(&params);
        for spec in self.filters.iter() {
            if param_for_facet(&spec.id).is_none() {
                filters.set(spec.id.clone(), spec.value.clone());
            }
        }
        let changed = changed_facets(&self.filters, &filters);

        let refetched = if self.variables_for(&filters) != self.query_variables() {
            Some(self.fetch_for(&filters, transport)?)
        } else {
            None
        };

        self.measure = measure_from_query(&params, self.config.default_measure);
        self.filters = filters;
        self.last_read = params;

        Ok(SyncOutcome {
            refetched,
            url_replaced: false,
            changed,
        })
    }

    /// Tear the view down; the URL stays as it is
    pub fn unmount(self) -> P {
        self.port
    }

    fn fetch_for<T: QueryTransport>(
        &self,
        filters: &FilterSet,
        transport: &mut T,
    ) -> Result<T::Output, SyncError> {
        let variables = self.variables_for(filters);
        transport.fetch(&variables).map_err(|source| {
            warn!(base_id = %self.base_id, error = %source, "refetch failed");
            SyncError::Refetch {
                base_id: self.base_id.clone(),
                source,
            }
        })
    }

    fn variables_for(&self, filters: &FilterSet) -> QueryVariables {
        to_query_variables_with_page_size(&self.base_id, filters, self.config.pagination_size)
    }

    fn write_url(&mut self, update: &QueryUpdate) -> bool {
        let current = self.port.get_query();
        let next = update.apply_to(&current);
        if next == current {
            self.last_read = next;
            return false;
        }

        debug!(query = %next.to_query_string(), "replacing URL");
        self.port.set_query(next.clone());
        self.last_read = next;
        true
    }
}

fn diverged_facets(filters: &FilterSet, params: &QueryParams) -> Vec<&'static str> {
    URL_FACETS
        .iter()
        .filter(|(param, facet_id)| {
            let wanted = filters
                .get(facet_id)
                .map(|value| url_values(facet_id, value))
                .unwrap_or_default();
            let current = decode_values(params, param)
                .map(|raw| url_values(facet_id, &FilterValue::list(raw)))
                .unwrap_or_default();
            wanted != current
        })
        .map(|(_, facet_id)| *facet_id)
        .collect()
}

fn changed_facets(before: &FilterSet, after: &FilterSet) -> Vec<String> {
    let mut changed: Vec<String> = Vec::new();
    for id in before.ids().chain(after.ids()) {
        if before.get(id) != after.get(id) && !changed.iter().any(|seen| seen == id) {
            changed.push(id.to_string());
        }
    }
    changed
}
