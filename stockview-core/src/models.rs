use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Facet ids understood by the box views
pub mod facet {
    pub const STATE: &str = "state";
    pub const TAGS: &str = "tags";
    pub const PRODUCT_CATEGORY: &str = "productCategory";
    pub const PRODUCT: &str = "product";
    pub const SIZE: &str = "size";
    pub const GENDER: &str = "gender";
    pub const LOCATION: &str = "location";
}

/// The two flavours of "nothing" a UI control can hand over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Absence {
    Null,
    Undefined,
}

impl Absence {
    pub fn as_str(self) -> &'static str {
        match self {
            Absence::Null => "null",
            Absence::Undefined => "undefined",
        }
    }
}

/// A filter value as produced by a table filter control or decoded from the URL.
///
/// Controls hand over raw strings, option objects (`{ id, label }`), lists of
/// either, or nothing at all. Nothing here is validated; see `normalize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Scalar(String),
    /// An option object; `None` when the object carries no `id`
    Wrapped(Option<String>),
    ListOf(Vec<FilterValue>),
    Absent(Absence),
}

impl FilterValue {
    /// Build a list of scalars
    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterValue::ListOf(values.into_iter().map(|v| FilterValue::Scalar(v.into())).collect())
    }

    pub fn wrapped(id: impl Into<String>) -> Self {
        FilterValue::Wrapped(Some(id.into()))
    }

    /// Convert loosely-shaped JSON into a filter value
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FilterValue::Absent(Absence::Null),
            Value::String(s) => FilterValue::Scalar(s.clone()),
            Value::Number(n) => FilterValue::Scalar(n.to_string()),
            Value::Bool(b) => FilterValue::Scalar(b.to_string()),
            Value::Array(arr) => FilterValue::ListOf(arr.iter().map(Self::from_json).collect()),
            Value::Object(map) => FilterValue::Wrapped(map.get("id").and_then(|id| match id {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FilterValue::Scalar(s) => Value::String(s.clone()),
            FilterValue::Wrapped(Some(id)) => {
                let mut map = Map::new();
                map.insert("id".to_string(), Value::String(id.clone()));
                Value::Object(map)
            }
            FilterValue::Wrapped(None) => Value::Object(Map::new()),
            FilterValue::ListOf(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            FilterValue::Absent(_) => Value::Null,
        }
    }

    /// True when the value carries nothing a control would display as selected
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Scalar(s) => s.is_empty(),
            FilterValue::Wrapped(_) => false,
            FilterValue::ListOf(items) => items.is_empty(),
            FilterValue::Absent(_) => true,
        }
    }
}

impl Serialize for FilterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FilterValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|value| FilterValue::from_json(&value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub id: String,
    pub value: FilterValue,
}

/// Active table filters keyed by facet id, in the order the UI added them.
/// Serialized as a plain list; a repeated id keeps its first position and its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<FilterSpec>", into = "Vec<FilterSpec>")]
pub struct FilterSet {
    specs: Vec<FilterSpec>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&FilterValue> {
        self.specs.iter().find(|spec| spec.id == id).map(|spec| &spec.value)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Set a facet's value, replacing an existing entry in place
    pub fn set(&mut self, id: impl Into<String>, value: FilterValue) {
        let id = id.into();
        match self.specs.iter_mut().find(|spec| spec.id == id) {
            Some(spec) => spec.value = value,
            None => self.specs.push(FilterSpec { id, value }),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<FilterValue> {
        let position = self.specs.iter().position(|spec| spec.id == id)?;
        Some(self.specs.remove(position).value)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|spec| spec.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl From<Vec<FilterSpec>> for FilterSet {
    fn from(specs: Vec<FilterSpec>) -> Self {
        specs.into_iter().collect()
    }
}

impl From<FilterSet> for Vec<FilterSpec> {
    fn from(set: FilterSet) -> Self {
        set.specs
    }
}

impl FromIterator<FilterSpec> for FilterSet {
    fn from_iter<T: IntoIterator<Item = FilterSpec>>(iter: T) -> Self {
        let mut set = FilterSet::new();
        for spec in iter {
            set.set(spec.id, spec.value);
        }
        set
    }
}

/// Attribute a drilldown level groups by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    CategoryName,
    ProductName,
    Gender,
    SizeName,
    LocationName,
    BoxState,
    Tag,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::CategoryName,
        Dimension::ProductName,
        Dimension::Gender,
        Dimension::SizeName,
        Dimension::LocationName,
        Dimension::BoxState,
        Dimension::Tag,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::CategoryName => "categoryName",
            Dimension::ProductName => "productName",
            Dimension::Gender => "gender",
            Dimension::SizeName => "sizeName",
            Dimension::LocationName => "locationName",
            Dimension::BoxState => "boxState",
            Dimension::Tag => "tag",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::ALL
            .into_iter()
            .find(|dimension| dimension.as_str() == s)
            .ok_or_else(|| format!("unknown grouping '{}'", s))
    }
}

/// Which count a chart sums (`boi` URL parameter)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Measure {
    #[default]
    BoxesCount,
    ItemsCount,
}

impl Measure {
    pub fn as_str(self) -> &'static str {
        match self {
            Measure::BoxesCount => "boxesCount",
            Measure::ItemsCount => "itemsCount",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Measure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boxesCount" => Ok(Measure::BoxesCount),
            "itemsCount" => Ok(Measure::ItemsCount),
            other => Err(format!("unknown measure '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoxState {
    InStock,
    Lost,
    MarkedForShipment,
    Receiving,
    Donated,
    Scrap,
    InTransit,
    NotDelivered,
}

impl BoxState {
    pub const ALL: [BoxState; 8] = [
        BoxState::InStock,
        BoxState::Lost,
        BoxState::MarkedForShipment,
        BoxState::Receiving,
        BoxState::Donated,
        BoxState::Scrap,
        BoxState::InTransit,
        BoxState::NotDelivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BoxState::InStock => "InStock",
            BoxState::Lost => "Lost",
            BoxState::MarkedForShipment => "MarkedForShipment",
            BoxState::Receiving => "Receiving",
            BoxState::Donated => "Donated",
            BoxState::Scrap => "Scrap",
            BoxState::InTransit => "InTransit",
            BoxState::NotDelivered => "NotDelivered",
        }
    }
}

impl FromStr for BoxState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BoxState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("unknown box state '{}'", s))
    }
}

/// Product gender, addressed in URLs by a stable decimal id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductGender {
    Women,
    Men,
    UnisexAdult,
    Girl,
    Boy,
    UnisexKid,
    UnisexBaby,
    TeenGirl,
    TeenBoy,
    #[serde(rename = "none")]
    None,
}

impl ProductGender {
    pub const ALL: [ProductGender; 10] = [
        ProductGender::Women,
        ProductGender::Men,
        ProductGender::UnisexAdult,
        ProductGender::Girl,
        ProductGender::Boy,
        ProductGender::UnisexKid,
        ProductGender::UnisexBaby,
        ProductGender::TeenGirl,
        ProductGender::TeenBoy,
        ProductGender::None,
    ];

    pub fn id(self) -> i64 {
        match self {
            ProductGender::Women => 1,
            ProductGender::Men => 2,
            ProductGender::UnisexAdult => 3,
            ProductGender::Girl => 4,
            ProductGender::Boy => 5,
            ProductGender::UnisexKid => 6,
            ProductGender::UnisexBaby => 7,
            ProductGender::TeenGirl => 8,
            ProductGender::TeenBoy => 9,
            ProductGender::None => 10,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        ProductGender::ALL.into_iter().find(|gender| gender.id() == id)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProductGender::Women => "Women",
            ProductGender::Men => "Men",
            ProductGender::UnisexAdult => "UnisexAdult",
            ProductGender::Girl => "Girl",
            ProductGender::Boy => "Boy",
            ProductGender::UnisexKid => "UnisexKid",
            ProductGender::UnisexBaby => "UnisexBaby",
            ProductGender::TeenGirl => "TeenGirl",
            ProductGender::TeenBoy => "TeenBoy",
            ProductGender::None => "none",
        }
    }
}

/// One row of the stock overview fact table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactRow {
    pub category_id: i64,
    pub size_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub gender: ProductGender,
    pub location_id: i64,
    pub location_name: String,
    pub box_state: BoxState,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    pub boxes_count: u64,
    pub items_count: u64,
}

impl FactRow {
    pub fn measure(&self, measure: Measure) -> u64 {
        match measure {
            Measure::BoxesCount => self.boxes_count,
            Measure::ItemsCount => self.items_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionEntry {
    pub id: i64,
    pub name: String,
}

/// Lookup tables that resolve fact foreign keys to display names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionTables {
    #[serde(default)]
    pub categories: Vec<DimensionEntry>,
    #[serde(default)]
    pub sizes: Vec<DimensionEntry>,
    #[serde(default)]
    pub tags: Vec<DimensionEntry>,
}

/// Chart-ready slice: a display label and its summed measure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedRow {
    pub id: String,
    pub value: u64,
}

/// Everything one base serves to the statistics views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub base_id: String,
    pub facts: Vec<FactRow>,
    #[serde(default)]
    pub dimensions: DimensionTables,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_filter_value_from_loose_json() {
        let value = FilterValue::from_json(&json!(["80", {"id": "85"}, 90, null, {}]));
        assert_eq!(
            value,
            FilterValue::ListOf(vec![
                FilterValue::Scalar("80".to_string()),
                FilterValue::wrapped("85"),
                FilterValue::Scalar("90".to_string()),
                FilterValue::Absent(Absence::Null),
                FilterValue::Wrapped(None),
            ])
        );
    }

    #[test]
    fn test_filter_set_replaces_in_place() {
        let mut filters = FilterSet::new();
        filters.set(facet::STATE, FilterValue::list(["InStock"]));
        filters.set(facet::TAGS, FilterValue::list(["80"]));
        filters.set(facet::STATE, FilterValue::list(["Lost"]));

        assert_eq!(filters.ids().collect::<Vec<_>>(), vec!["state", "tags"]);
        assert_eq!(filters.get(facet::STATE), Some(&FilterValue::list(["Lost"])));
    }

    #[test]
    fn test_filter_set_deserializes_from_spec_list() {
        let filters: FilterSet = serde_json::from_value(json!([
            {"id": "tags", "value": [{"id": "80"}, "85"]},
            {"id": "productCategory", "value": "Food & Kitchen"}
        ]))
        .unwrap();

        assert_eq!(filters.len(), 2);
        assert_eq!(
            filters.get(facet::PRODUCT_CATEGORY),
            Some(&FilterValue::Scalar("Food & Kitchen".to_string()))
        );
    }

    #[test]
    fn test_filter_set_deserialization_keeps_ids_unique() {
        let filters: FilterSet = serde_json::from_value(json!([
            {"id": "tags", "value": ["80"]},
            {"id": "state", "value": ["Lost"]},
            {"id": "tags", "value": ["85"]}
        ]))
        .unwrap();

        assert_eq!(filters.ids().collect::<Vec<_>>(), vec!["tags", "state"]);
        assert_eq!(filters.get(facet::TAGS), Some(&FilterValue::list(["85"])));
        assert_eq!(
            serde_json::to_value(&filters).unwrap(),
            json!([
                {"id": "tags", "value": ["85"]},
                {"id": "state", "value": ["Lost"]}
            ])
        );
    }

    #[test]
    fn test_dimension_names_round_trip() {
        for dimension in Dimension::ALL {
            assert_eq!(dimension.as_str().parse::<Dimension>(), Ok(dimension));
        }
        assert!("colour".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_gender_ids_are_unique() {
        for gender in ProductGender::ALL {
            assert_eq!(ProductGender::from_id(gender.id()), Some(gender));
        }
        assert_eq!(ProductGender::from_id(0), None);
    }

    #[test]
    fn test_fact_row_reads_camel_case() {
        let row: FactRow = serde_json::from_value(json!({
            "categoryId": 1,
            "sizeId": 2,
            "productId": 3,
            "productName": "Jacket",
            "gender": "Women",
            "locationId": 4,
            "locationName": "Warehouse",
            "boxState": "InStock",
            "boxesCount": 5,
            "itemsCount": 50
        }))
        .unwrap();

        assert!(row.tag_ids.is_empty());
        assert_eq!(row.measure(Measure::ItemsCount), 50);
    }
}
