use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// A typed field value produced by the serializer registry.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    /// The site rendered an empty spec cell for this field.
    Null,
    Number(f64),
    Text(String),
    Bool(bool),
    List(Vec<Value>),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A canonical field name from the mapping table.
///
/// The mapping table is the single source of field names, so the set is
/// closed at load time; `MappingTable::validate` rejects duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(pub &'static str);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Field present on every record: `"{variant} {title}"`.
pub const NAME: FieldId = FieldId("name");
/// Field present on every record: numeric price, or null when the site
/// rendered no price.
pub const PRICE: FieldId = FieldId("price");

/// One extracted catalog item: an insertion-ordered field map.
///
/// Serializes as a JSON object. `name` and `price` are always present; the
/// remaining fields depend on the category's mapping table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(FieldId, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field. Fields are unique by construction (one spec cell per
    /// label); a repeated id overwrites the earlier value in place.
    pub fn insert(&mut self, field: FieldId, value: Value) {
        if let Some(slot) = self.fields.iter_mut().find(|(f, _)| *f == field) {
            slot.1 = value;
        } else {
            self.fields.push((field, value));
        }
    }

    pub fn get(&self, field: FieldId) -> Option<&Value> {
        self.fields.iter().find(|(f, _)| *f == field).map(|(_, v)| v)
    }

    pub fn name(&self) -> Option<&str> {
        self.get(NAME).and_then(Value::as_text)
    }

    /// The parsed price; `None` both when the field is null and (defensively)
    /// when it is missing.
    pub fn price(&self) -> Option<f64> {
        self.get(PRICE).and_then(Value::as_number)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(FieldId, Value)> {
        self.fields.iter()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field.0, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_as_ordered_json_object() {
        let mut rec = Record::new();
        rec.insert(NAME, Value::Text("DDR5 Vortex 32GB".into()));
        rec.insert(PRICE, Value::Number(129.99));
        rec.insert(FieldId("speed"), Value::Number(6000.0));
        rec.insert(FieldId("heat_spreader"), Value::Bool(true));
        rec.insert(FieldId("timings"), Value::Null);

        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(
            json,
            r#"{"name":"DDR5 Vortex 32GB","price":129.99,"speed":6000.0,"heat_spreader":true,"timings":null}"#
        );
    }

    #[test]
    fn null_price_reads_as_none() {
        let mut rec = Record::new();
        rec.insert(PRICE, Value::Null);
        assert_eq!(rec.price(), None);
        assert_eq!(rec.get(PRICE), Some(&Value::Null));
    }

    #[test]
    fn repeated_insert_overwrites_in_place() {
        let mut rec = Record::new();
        rec.insert(FieldId("cores"), Value::Number(8.0));
        rec.insert(FieldId("tdp"), Value::Number(65.0));
        rec.insert(FieldId("cores"), Value::Number(16.0));
        assert_eq!(rec.len(), 2);
        assert_eq!(rec.get(FieldId("cores")), Some(&Value::Number(16.0)));
        assert_eq!(rec.iter().next().unwrap().0, FieldId("cores"));
    }

    #[test]
    fn list_values_serialize_as_arrays() {
        let v = Value::List(vec![Value::Number(3.6), Value::Number(5.1)]);
        assert_eq!(serde_json::to_string(&v).unwrap(), "[3.6,5.1]");
        assert_eq!(serde_json::to_string(&Value::Null).unwrap(), "null");
    }
}
