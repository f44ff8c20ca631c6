// Public modules
pub mod config;
pub mod drilldown;
pub mod error;
pub mod fetch;
pub mod filtering;
pub mod grouping;
pub mod io;
pub mod models;
pub mod normalize;
pub mod query_string;
pub mod query_variables;
pub mod sorting;
pub mod sync;

// Re-export commonly used types for convenience
pub use config::{EngineConfig, DEFAULT_MAX_DRILL_DEPTH};
pub use drilldown::{DrillOutcome, DrilldownState};
pub use error::{LoadError, SyncError, TransportError};
pub use fetch::{FetchTicket, FetchTracker};
pub use filtering::{apply_row_filters, has_row_filters, matches_row_filters};
pub use grouping::{group_and_sum, resolve_rows, ResolvedRow};
pub use io::{load_config, load_dataset};
pub use models::{
    facet, Absence, AggregatedRow, BoxState, Dataset, Dimension, DimensionEntry, DimensionTables,
    FactRow, FilterSet, FilterSpec, FilterValue, Measure, ProductGender,
};
pub use normalize::{absent_policy_for, normalize_id_strings, normalize_ids, parse_int, AbsentPolicy, NormalizedIds};
pub use query_string::{decode_values, encode_values, join_values, split_values, QueryParams, QueryUpdate};
pub use query_variables::{
    forwarded_variable, is_forwarded, to_query_variables, to_query_variables_with_page_size, FilterInput,
    ForwardedVariable, QueryVariables,
    DEFAULT_PAGINATION_SIZE, FORWARDED_FACETS,
};
pub use sorting::{normalize_for_sorting, sort_rows, strip_leading_articles, RowOrder};
pub use sync::{
    facet_for_param, filters_from_query, measure_from_query, param_for_facet, url_values, FilterChange,
    FilterSynchronizer, MemoryQueryPort, QueryPort, QueryTransport, SyncOutcome, MEASURE_PARAM, URL_FACETS,
};
