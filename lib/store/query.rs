use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }
}

/// One entry of a query's sort list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sort {
    Property {
        property: String,
        direction: SortDirection,
    },
    CreatedTime(SortDirection),
}

impl Sort {
    pub fn to_value(&self) -> Value {
        match self {
            Sort::Property {
                property,
                direction,
            } => json!({ "property": property, "direction": direction.as_str() }),
            Sort::CreatedTime(direction) => {
                json!({ "timestamp": "created_time", "direction": direction.as_str() })
            }
        }
    }
}

/// Filter expressions over number properties, plus logical OR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    NumberIsEmpty { property: String },
    NumberIsNotEmpty { property: String },
    NumberGreaterThan { property: String, value: i64 },
    Or(Vec<Filter>),
}

impl Filter {
    pub fn to_value(&self) -> Value {
        match self {
            Filter::NumberIsEmpty { property } => {
                json!({ "property": property, "number": { "is_empty": true } })
            }
            Filter::NumberIsNotEmpty { property } => {
                json!({ "property": property, "number": { "is_not_empty": true } })
            }
            Filter::NumberGreaterThan { property, value } => {
                json!({ "property": property, "number": { "greater_than": value } })
            }
            Filter::Or(branches) => {
                json!({ "or": branches.iter().map(Filter::to_value).collect::<Vec<_>>() })
            }
        }
    }
}

/// Descriptor for one page of a filtered, sorted database query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRequest {
    pub filter: Option<Filter>,
    pub sorts: Vec<Sort>,
    pub page_size: Option<u32>,
    pub start_cursor: Option<String>,
}

impl QueryRequest {
    /// Renders the JSON body for `POST /databases/{id}/query`. Unset fields are omitted.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        if let Some(filter) = &self.filter {
            body.insert("filter".to_string(), filter.to_value());
        }
        if !self.sorts.is_empty() {
            body.insert(
                "sorts".to_string(),
                Value::Array(self.sorts.iter().map(Sort::to_value).collect()),
            );
        }
        if let Some(page_size) = self.page_size {
            body.insert("page_size".to_string(), json!(page_size));
        }
        if let Some(cursor) = &self.start_cursor {
            body.insert("start_cursor".to_string(), json!(cursor));
        }
        Value::Object(body)
    }
}

/// Renders the JSON body for `PATCH /pages/{id}` setting one number property.
pub fn number_update_body(property: &str, value: i64) -> Value {
    let mut properties = Map::new();
    properties.insert(property.to_string(), json!({ "number": value }));
    json!({ "properties": properties })
}

/// One page of query results, in the order the store sorted them.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub results: Vec<PageRecord>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// A record in the store. Only the id, the creation time and raw property values are kept.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub id: String,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl PageRecord {
    pub fn new(id: impl Into<String>, created_time: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_time: Some(created_time.into()),
            properties: Map::new(),
        }
    }

    pub fn with_number(mut self, property: &str, value: Option<i64>) -> Self {
        self.properties.insert(
            property.to_string(),
            json!({ "type": "number", "number": value }),
        );
        self
    }

    /// Reads the number stored in `property`.
    ///
    /// Fractional values round up, so a number derived from them is always strictly greater
    /// than anything already stored.
    pub fn ticket_number(&self, property: &str) -> Option<i64> {
        let number = self.properties.get(property)?.get("number")?;
        number
            .as_i64()
            .or_else(|| number.as_f64().map(|value| value.ceil() as i64))
    }
}

/// Declared property types of a database, keyed by property name.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseSchema {
    pub properties: HashMap<String, PropertySchema>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub type_: String,
}

impl DatabaseSchema {
    pub fn property_type(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(|prop| prop.type_.as_str())
    }

    pub fn with_property(mut self, name: &str, type_: &str) -> Self {
        self.properties.insert(
            name.to_string(),
            PropertySchema {
                type_: type_.to_string(),
            },
        );
        self
    }
}
