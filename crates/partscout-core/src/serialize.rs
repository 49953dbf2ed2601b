//! The serializer registry: pure converters from raw spec text to typed
//! [`Value`]s.
//!
//! Generic kinds are shared across categories; custom serializers are looked
//! up by exact `(Category, FieldId)` pair and must all be registered before a
//! crawl starts (`MappingTable::validate` enforces this).

use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::Category;
use crate::error::CrawlError;
use crate::record::{FieldId, Value};

/// How a raw text value is converted into a typed field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializerKind {
    /// One of the shared, category-agnostic parsers.
    Generic(GenericKind),
    /// A per-(category, field) function from the [`SerializerRegistry`].
    Custom,
}

/// The shared value-kind parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericKind {
    /// Decoration-stripping decimal parse (`"$1,299.99"` → `1299.99`).
    Number,
    /// Yes/No (or true/false), ASCII-case-insensitive.
    Boolean,
    /// Trim and collapse internal whitespace.
    Text,
    /// Comma-delimited, each piece normalized as text.
    List,
}

/// Converts raw text with one of the generic parsers.
///
/// Empty or whitespace-only input never reaches this path (the extractor
/// short-circuits empty cells to `Null`); if it arrives anyway it fails as
/// malformed rather than guessing.
pub fn serialize(kind: GenericKind, field: FieldId, raw: &str) -> Result<Value, CrawlError> {
    match kind {
        GenericKind::Number => parse_number(field, raw),
        GenericKind::Boolean => parse_boolean(field, raw),
        GenericKind::Text => Ok(Value::Text(normalize_text(raw))),
        GenericKind::List => Ok(parse_list(raw)),
    }
}

/// Trim and collapse internal whitespace runs to single spaces.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn malformed(field: FieldId, raw: &str) -> CrawlError {
    CrawlError::MalformedValue {
        field: field.0,
        raw: raw.to_string(),
    }
}

/// Strips non-numeric decoration (currency symbols, units, thousands
/// separators) and parses the first decimal run. `"3.6 GHz (boost 5.1)"`
/// parses as `3.6`; trailing text after the run is ignored.
fn parse_number(field: FieldId, raw: &str) -> Result<Value, CrawlError> {
    let mut buf = String::new();
    let mut started = false;
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        if !started {
            match ch {
                '0'..='9' => {
                    buf.push(ch);
                    started = true;
                }
                '-' if matches!(chars.peek(), Some('0'..='9')) => buf.push(ch),
                _ => buf.clear(),
            }
        } else {
            match ch {
                '0'..='9' => buf.push(ch),
                // Thousands separator inside a run.
                ',' if matches!(chars.peek(), Some('0'..='9')) => {}
                '.' if !buf.contains('.') => buf.push(ch),
                _ => break,
            }
        }
    }
    if !started {
        return Err(malformed(field, raw));
    }
    buf.parse::<f64>()
        .map(Value::Number)
        .map_err(|_| malformed(field, raw))
}

fn parse_boolean(field: FieldId, raw: &str) -> Result<Value, CrawlError> {
    let t = raw.trim();
    if t.eq_ignore_ascii_case("yes") || t.eq_ignore_ascii_case("true") {
        Ok(Value::Bool(true))
    } else if t.eq_ignore_ascii_case("no") || t.eq_ignore_ascii_case("false") {
        Ok(Value::Bool(false))
    } else {
        Err(malformed(field, raw))
    }
}

fn parse_list(raw: &str) -> Value {
    Value::List(
        raw.split(',')
            .map(normalize_text)
            .filter(|piece| !piece.is_empty())
            .map(Value::Text)
            .collect(),
    )
}

/// A registered custom serializer.
pub type CustomFn = Arc<dyn Fn(&str) -> Result<Value, CrawlError> + Send + Sync>;

/// Dispatch table for per-(category, field) custom serializers.
///
/// Built once at startup and read-only thereafter; calling [`apply`] with an
/// unregistered pair is a configuration bug that startup validation makes
/// unreachable at crawl time.
///
/// [`apply`]: SerializerRegistry::apply
#[derive(Clone, Default)]
pub struct SerializerRegistry {
    customs: HashMap<(Category, FieldId), CustomFn>,
}

impl SerializerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry matching `MappingTable::builtin()`.
    pub fn builtin() -> Self {
        let mut reg = Self::new();
        reg.register(Category::Cpu, FieldId("clock"), cpu_clock);
        reg.register(Category::Memory, FieldId("capacity"), memory_capacity);
        reg.register(Category::Ssd, FieldId("capacity"), drive_capacity);
        reg.register(Category::HardDrive, FieldId("capacity"), drive_capacity);
        reg.register(Category::ExternalDrive, FieldId("capacity"), drive_capacity);
        reg
    }

    pub fn register<F>(&mut self, category: Category, field: FieldId, f: F)
    where
        F: Fn(&str) -> Result<Value, CrawlError> + Send + Sync + 'static,
    {
        self.customs.insert((category, field), Arc::new(f));
    }

    pub fn is_registered(&self, category: Category, field: FieldId) -> bool {
        self.customs.contains_key(&(category, field))
    }

    /// Runs the custom serializer for an exact `(category, field)` pair.
    pub fn apply(&self, category: Category, field: FieldId, raw: &str) -> Result<Value, CrawlError> {
        match self.customs.get(&(category, field)) {
            Some(f) => f(raw),
            None => Err(CrawlError::UnregisteredCustomSerializer {
                category,
                field: field.0,
            }),
        }
    }
}

impl std::fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializerRegistry")
            .field("customs", &self.customs.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// `"3.4 GHz (5.0 GHz Boost)"` → `[3.4, 5.0]`; a single clock still yields a
/// one-element list so the field shape is stable.
fn cpu_clock(raw: &str) -> Result<Value, CrawlError> {
    let clocks: Vec<Value> = decimal_runs(raw).map(Value::Number).collect();
    if clocks.is_empty() {
        return Err(CrawlError::MalformedValue {
            field: "clock",
            raw: raw.to_string(),
        });
    }
    Ok(Value::List(clocks))
}

/// `"2 x 16GB"` → `32`; `"16GB"` → `16`.
fn memory_capacity(raw: &str) -> Result<Value, CrawlError> {
    let mut runs = decimal_runs(raw);
    match (runs.next(), runs.next()) {
        (Some(sticks), Some(size)) if raw.contains('x') || raw.contains('X') => {
            Ok(Value::Number(sticks * size))
        }
        (Some(size), _) => Ok(Value::Number(size)),
        (None, _) => Err(CrawlError::MalformedValue {
            field: "capacity",
            raw: raw.to_string(),
        }),
    }
}

/// Drive capacity normalized to gigabytes: `"2TB"` → `2000`, `"512GB"` → `512`.
fn drive_capacity(raw: &str) -> Result<Value, CrawlError> {
    let n = decimal_runs(raw)
        .next()
        .ok_or_else(|| CrawlError::MalformedValue {
            field: "capacity",
            raw: raw.to_string(),
        })?;
    let upper = raw.to_ascii_uppercase();
    if upper.contains("TB") {
        Ok(Value::Number(n * 1000.0))
    } else {
        Ok(Value::Number(n))
    }
}

/// All decimal runs in a string, in order (`"2 x 16GB"` → `2`, `16`).
fn decimal_runs(raw: &str) -> impl Iterator<Item = f64> {
    let mut runs = Vec::new();
    let mut buf = String::new();
    for ch in raw.chars() {
        match ch {
            '0'..='9' => buf.push(ch),
            '.' if !buf.is_empty() && !buf.contains('.') => buf.push(ch),
            _ => {
                if !buf.is_empty() {
                    runs.push(std::mem::take(&mut buf));
                }
            }
        }
    }
    if !buf.is_empty() {
        runs.push(buf);
    }
    runs.into_iter().filter_map(|r| r.parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> FieldId {
        FieldId("test")
    }

    #[test]
    fn number_strips_currency_and_thousands() {
        assert_eq!(
            serialize(GenericKind::Number, field(), "$129.99").unwrap(),
            Value::Number(129.99)
        );
        assert_eq!(
            serialize(GenericKind::Number, field(), "$1,299.99").unwrap(),
            Value::Number(1299.99)
        );
        assert_eq!(
            serialize(GenericKind::Number, field(), "165 Hz").unwrap(),
            Value::Number(165.0)
        );
    }

    #[test]
    fn number_takes_first_decimal_run() {
        assert_eq!(
            serialize(GenericKind::Number, field(), "3.6 GHz (5.1 GHz boost)").unwrap(),
            Value::Number(3.6)
        );
        assert_eq!(
            serialize(GenericKind::Number, field(), "-12 dB").unwrap(),
            Value::Number(-12.0)
        );
    }

    #[test]
    fn number_rejects_non_numeric_and_empty() {
        assert!(matches!(
            serialize(GenericKind::Number, field(), "N/A"),
            Err(CrawlError::MalformedValue { .. })
        ));
        assert!(matches!(
            serialize(GenericKind::Number, field(), ""),
            Err(CrawlError::MalformedValue { .. })
        ));
        assert!(matches!(
            serialize(GenericKind::Number, field(), "   "),
            Err(CrawlError::MalformedValue { .. })
        ));
    }

    #[test]
    fn boolean_accepts_yes_no_any_case() {
        assert_eq!(
            serialize(GenericKind::Boolean, field(), " Yes ").unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            serialize(GenericKind::Boolean, field(), "NO").unwrap(),
            Value::Bool(false)
        );
        assert!(matches!(
            serialize(GenericKind::Boolean, field(), "maybe"),
            Err(CrawlError::MalformedValue { .. })
        ));
    }

    #[test]
    fn list_splits_and_normalizes_pieces() {
        assert_eq!(
            serialize(GenericKind::List, field(), "HDMI 2.1,  DisplayPort 1.4 , USB-C").unwrap(),
            Value::List(vec![
                Value::Text("HDMI 2.1".into()),
                Value::Text("DisplayPort 1.4".into()),
                Value::Text("USB-C".into()),
            ])
        );
    }

    #[test]
    fn text_collapses_whitespace() {
        assert_eq!(
            serialize(GenericKind::Text, field(), "  80+   Gold  ").unwrap(),
            Value::Text("80+ Gold".into())
        );
    }

    #[test]
    fn unregistered_custom_pair_is_a_contract_violation() {
        let reg = SerializerRegistry::new();
        assert!(matches!(
            reg.apply(Category::Cpu, FieldId("clock"), "3.4 GHz"),
            Err(CrawlError::UnregisteredCustomSerializer { .. })
        ));
    }

    #[test]
    fn builtin_cpu_clock_yields_base_and_boost() {
        let reg = SerializerRegistry::builtin();
        assert_eq!(
            reg.apply(Category::Cpu, FieldId("clock"), "3.4 GHz (5.0 GHz Boost)")
                .unwrap(),
            Value::List(vec![Value::Number(3.4), Value::Number(5.0)])
        );
        assert_eq!(
            reg.apply(Category::Cpu, FieldId("clock"), "2.9 GHz").unwrap(),
            Value::List(vec![Value::Number(2.9)])
        );
    }

    #[test]
    fn builtin_memory_capacity_multiplies_kits() {
        let reg = SerializerRegistry::builtin();
        assert_eq!(
            reg.apply(Category::Memory, FieldId("capacity"), "2 x 16GB")
                .unwrap(),
            Value::Number(32.0)
        );
        assert_eq!(
            reg.apply(Category::Memory, FieldId("capacity"), "8GB").unwrap(),
            Value::Number(8.0)
        );
    }

    #[test]
    fn builtin_drive_capacity_normalizes_to_gigabytes() {
        let reg = SerializerRegistry::builtin();
        assert_eq!(
            reg.apply(Category::Ssd, FieldId("capacity"), "2TB").unwrap(),
            Value::Number(2000.0)
        );
        assert_eq!(
            reg.apply(Category::HardDrive, FieldId("capacity"), "512 GB")
                .unwrap(),
            Value::Number(512.0)
        );
    }
}
