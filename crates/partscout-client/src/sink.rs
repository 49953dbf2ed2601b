use std::path::PathBuf;

use partscout_core::catalog::Category;
use partscout_core::error::CrawlError;
use partscout_core::record::Record;
use partscout_core::traits::RecordSink;

/// Sink writing one pretty-printed JSON array per category to
/// `<dir>/<category>.json`.
///
/// Every emission is one atomic file write, so concurrent emissions for
/// different categories never interleave.
#[derive(Debug, Clone)]
pub struct JsonDirSink {
    dir: PathBuf,
}

impl JsonDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl RecordSink for JsonDirSink {
    async fn emit(&self, category: Category, records: &[Record]) -> Result<(), CrawlError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CrawlError::Sink(format!("failed to create {}: {e}", self.dir.display())))?;

        let path = self.dir.join(format!("{}.json", category.slug()));
        let json = serde_json::to_vec_pretty(records)
            .map_err(|e| CrawlError::Sink(format!("failed to serialize {category}: {e}")))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| CrawlError::Sink(format!("failed to write {}: {e}", path.display())))?;

        tracing::info!(%category, records = records.len(), path = %path.display(), "category result written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partscout_core::record::{NAME, PRICE, Value};

    fn record(name: &str, price: Option<f64>) -> Record {
        let mut rec = Record::new();
        rec.insert(NAME, Value::Text(name.to_string()));
        rec.insert(PRICE, price.map(Value::Number).unwrap_or(Value::Null));
        rec
    }

    #[tokio::test]
    async fn writes_one_json_array_per_category() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(dir.path());

        sink.emit(
            Category::Memory,
            &[record("DDR5 Vortex", Some(129.99)), record("DDR4 Budget", None)],
        )
        .await
        .unwrap();

        let written = std::fs::read_to_string(dir.path().join("memory.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[0]["name"], "DDR5 Vortex");
        assert_eq!(parsed[0]["price"], 129.99);
        assert_eq!(parsed[1]["price"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn empty_partial_results_still_produce_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(dir.path());

        sink.emit(Category::Ups, &[]).await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("ups.json")).unwrap();
        assert_eq!(written.trim(), "[]");
    }
}
