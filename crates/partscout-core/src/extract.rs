//! The record extractor: one listing element in, one typed record out.
//!
//! Fail-fast by design: an unknown label or a malformed value aborts the
//! current item and propagates upward to abort the owning category's
//! traversal. A record is either fully built or not produced at all.

use std::sync::Arc;

use crate::catalog::Category;
use crate::error::CrawlError;
use crate::mapping::MappingTable;
use crate::record::{NAME, PRICE, Record, Value};
use crate::serialize::{GenericKind, SerializerKind, SerializerRegistry, serialize};
use crate::traits::ListingItem;

/// Turns listing items into typed records using the mapping table and
/// serializer registry. Cheap to clone; shared read-only state.
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    mapping: Arc<MappingTable>,
    registry: Arc<SerializerRegistry>,
}

impl RecordExtractor {
    pub fn new(mapping: Arc<MappingTable>, registry: Arc<SerializerRegistry>) -> Self {
        Self { mapping, registry }
    }

    /// Extracts one record from a listing item.
    ///
    /// `name` is the item title prefixed with the variant's display name.
    /// `price` is null when the site rendered no price text. Every spec cell
    /// resolves through the mapping table; an empty cell value becomes `Null`
    /// without invoking any serializer.
    pub async fn extract<I: ListingItem>(
        &self,
        item: &I,
        category: Category,
        variant_name: &str,
    ) -> Result<Record, CrawlError> {
        let mut record = Record::new();

        let title = item.title().await?;
        record.insert(NAME, Value::Text(format!("{variant_name} {}", title.trim())));

        let price = match item.price_text().await? {
            Some(raw) if !raw.trim().is_empty() => serialize(GenericKind::Number, PRICE, &raw)?,
            _ => Value::Null,
        };
        record.insert(PRICE, price);

        for cell in item.spec_cells().await? {
            let spec = self.mapping.resolve(category, &cell.label)?;
            let value = match cell.value.as_deref().map(str::trim) {
                None | Some("") => Value::Null,
                Some(raw) => match spec.kind {
                    SerializerKind::Custom => self.registry.apply(category, spec.field, raw)?,
                    SerializerKind::Generic(kind) => serialize(kind, spec.field, raw)?,
                },
            };
            record.insert(spec.field, value);
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::record::FieldId;
    use crate::testutil::FixtureItem;

    fn extractor() -> RecordExtractor {
        RecordExtractor::new(
            Arc::new(MappingTable::builtin()),
            Arc::new(SerializerRegistry::builtin()),
        )
    }

    fn memory_item() -> FixtureItem {
        FixtureItem::new("Vortex 32GB Kit")
            .price("$129.99")
            .cell("Capacity", Some("2 x 16GB"))
            .cell("Speed", Some("6000 MHz"))
            .cell("Heat Spreader", Some("Yes"))
            .cell("Timings", Some("30, 38, 38, 96"))
    }

    #[tokio::test]
    async fn builds_name_from_variant_and_title() {
        let rec = extractor()
            .extract(&memory_item(), Category::Memory, "DDR5")
            .await
            .unwrap();
        assert_eq!(rec.name(), Some("DDR5 Vortex 32GB Kit"));
    }

    #[tokio::test]
    async fn price_parses_currency_text() {
        let rec = extractor()
            .extract(&memory_item(), Category::Memory, "DDR5")
            .await
            .unwrap();
        assert_eq!(rec.price(), Some(129.99));
    }

    #[tokio::test]
    async fn missing_or_empty_price_is_null() {
        for item in [
            FixtureItem::new("Budget Stick"),
            FixtureItem::new("Budget Stick").price("   "),
        ] {
            let rec = extractor()
                .extract(&item, Category::Memory, "DDR4")
                .await
                .unwrap();
            assert_eq!(rec.get(PRICE), Some(&Value::Null));
            assert_eq!(rec.price(), None);
        }
    }

    #[tokio::test]
    async fn typed_fields_follow_the_mapping_table() {
        let rec = extractor()
            .extract(&memory_item(), Category::Memory, "DDR5")
            .await
            .unwrap();
        assert_eq!(rec.get(FieldId("capacity")), Some(&Value::Number(32.0)));
        assert_eq!(rec.get(FieldId("speed")), Some(&Value::Number(6000.0)));
        assert_eq!(rec.get(FieldId("heat_spreader")), Some(&Value::Bool(true)));
        assert_eq!(
            rec.get(FieldId("timings")),
            Some(&Value::List(vec![
                Value::Text("30".into()),
                Value::Text("38".into()),
                Value::Text("38".into()),
                Value::Text("96".into()),
            ]))
        );
    }

    #[tokio::test]
    async fn empty_cell_is_null_and_invokes_no_serializer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = SerializerRegistry::new();
        let counter = Arc::clone(&calls);
        registry.register(Category::Memory, FieldId("capacity"), move |raw| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Text(raw.to_string()))
        });
        let extractor = RecordExtractor::new(
            Arc::new(MappingTable::builtin()),
            Arc::new(registry),
        );

        let item = FixtureItem::new("Blank")
            .cell("Capacity", Some(""))
            .cell("Speed", None);
        let rec = extractor
            .extract(&item, Category::Memory, "DDR4")
            .await
            .unwrap();

        assert_eq!(rec.get(FieldId("capacity")), Some(&Value::Null));
        assert_eq!(rec.get(FieldId("speed")), Some(&Value::Null));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // A non-empty cell does dispatch.
        let item = FixtureItem::new("Full").cell("Capacity", Some("16GB"));
        extractor
            .extract(&item, Category::Memory, "DDR4")
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_label_aborts_the_item() {
        let item = FixtureItem::new("Drifted").cell("Wattage", Some("850"));
        let err = extractor()
            .extract(&item, Category::Memory, "DDR5")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CrawlError::UnmappedLabel {
                category: Category::Memory,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn malformed_value_aborts_the_item() {
        let item = FixtureItem::new("Odd").cell("Speed", Some("very fast"));
        let err = extractor()
            .extract(&item, Category::Memory, "DDR5")
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::MalformedValue { field: "speed", .. }));
    }

    #[tokio::test]
    async fn extraction_is_idempotent() {
        let item = memory_item();
        let ex = extractor();
        let a = ex.extract(&item, Category::Memory, "DDR5").await.unwrap();
        let b = ex.extract(&item, Category::Memory, "DDR5").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_vec(&a).unwrap(),
            serde_json::to_vec(&b).unwrap()
        );
    }
}
