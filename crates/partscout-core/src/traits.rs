use std::future::Future;

use crate::catalog::Category;
use crate::error::CrawlError;
use crate::record::Record;

/// One raw spec cell of a listing item: the human-readable label next to its
/// value. `value` is `None` when the cell rendered empty or had no value node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCell {
    pub label: String,
    pub value: Option<String>,
}

/// One listing item element on a category page.
///
/// Reads go through the automation collaborator and may suspend; the element
/// descriptors behind them are the collaborator's configuration, not the
/// core's concern.
pub trait ListingItem: Send + Sync {
    fn title(&self) -> impl Future<Output = Result<String, CrawlError>> + Send;

    /// The raw price text, `None` when the item renders no price.
    fn price_text(&self) -> impl Future<Output = Result<Option<String>, CrawlError>> + Send;

    fn spec_cells(&self) -> impl Future<Output = Result<Vec<SpecCell>, CrawlError>> + Send;
}

/// A browsing session (the automation collaborator).
///
/// Exactly one category traversal owns a session at a time; the orchestrator
/// recycles sessions through its pool between categories.
pub trait Session: Send + 'static {
    type Item: ListingItem;

    fn navigate(&self, url: &str) -> impl Future<Output = Result<(), CrawlError>> + Send;

    /// Waits until the current page has settled (network idle / content
    /// rendered).
    fn wait_settled(&self) -> impl Future<Output = Result<(), CrawlError>> + Send;

    /// Reads the pagination control of the current listing page and returns
    /// the total page count.
    fn page_count(&self) -> impl Future<Output = Result<u32, CrawlError>> + Send;

    /// Every listing item element on the current page, in document order.
    fn listing_items(&self) -> impl Future<Output = Result<Vec<Self::Item>, CrawlError>> + Send;
}

/// Receives one finished (complete or partial) record collection per
/// category.
///
/// Each call is independent and atomic from the sink's perspective; calls for
/// different categories may arrive concurrently.
pub trait RecordSink: Send + Sync {
    fn emit(
        &self,
        category: Category,
        records: &[Record],
    ) -> impl Future<Output = Result<(), CrawlError>> + Send;
}

/// A no-op RecordSink for use when output is not needed.
#[derive(Debug, Clone)]
pub struct NullSink;

impl RecordSink for NullSink {
    async fn emit(&self, _category: Category, _records: &[Record]) -> Result<(), CrawlError> {
        Ok(())
    }
}
