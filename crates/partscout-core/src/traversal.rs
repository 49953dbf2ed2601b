//! Pagination traversal: a lazy, finite cursor over every variant and page
//! of one category.
//!
//! The cursor is single-use. Variants are visited in declared order, pages in
//! ascending order, and control returns to the caller between pages; items on
//! a page are extracted sequentially. Any fatal condition terminates the
//! cursor for good — traversal state (current variant, current page,
//! navigated session) is never rewound.

use url::Url;

use crate::catalog::{Category, Variant, listing_url};
use crate::error::CrawlError;
use crate::extract::RecordExtractor;
use crate::record::Record;
use crate::traits::Session;

/// The records of one listing page. Ownership transfers to the caller on
/// yield; the traversal retains nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct PageBatch {
    pub variant: &'static str,
    pub page: u32,
    pub records: Vec<Record>,
}

/// A fatal traversal condition plus the records of the failing page that were
/// fully extracted before it hit. The category result is truncated at exactly
/// the last fully-processed item.
#[derive(Debug)]
pub struct BatchError {
    pub partial: Vec<Record>,
    pub error: CrawlError,
}

enum State {
    /// About to open page 1 of `variants[index]`.
    NextVariant { index: usize },
    /// Paging through `variants[index]`; `page` is the last page collected.
    InVariant { index: usize, page: u32, pages: u32 },
    Done,
}

/// Cursor over one category's listing. Borrowed session; exclusive use.
pub struct CategoryTraversal<'s, S: Session> {
    session: &'s S,
    category: Category,
    extractor: RecordExtractor,
    base: Url,
    variants: Vec<Variant>,
    state: State,
}

impl<'s, S: Session> CategoryTraversal<'s, S> {
    pub fn new(session: &'s S, category: Category, extractor: RecordExtractor, base: Url) -> Self {
        Self {
            session,
            category,
            extractor,
            base,
            variants: category.variants(),
            state: State::NextVariant { index: 0 },
        }
    }

    /// Advances to the next listing page and returns its batch, or `None`
    /// once the last page of the last variant has been yielded.
    ///
    /// An error is terminal: it carries the fully-extracted records of the
    /// failing page, and every later call returns `Ok(None)`.
    pub async fn next_batch(&mut self) -> Result<Option<PageBatch>, BatchError> {
        loop {
            match self.state {
                State::Done => return Ok(None),
                State::NextVariant { index } => {
                    let Some(&variant) = self.variants.get(index) else {
                        self.state = State::Done;
                        return Ok(None);
                    };
                    let url = listing_url(&self.base, self.category, &variant, 1);
                    self.open(&url).await?;
                    let pages = match self.session.page_count().await {
                        // A listing without a pager is a single page.
                        Ok(n) => n.max(1),
                        Err(e) => {
                            return Err(self.fail(CrawlError::PaginationUnreadable {
                                variant: variant.name.to_string(),
                                reason: e.to_string(),
                            }));
                        }
                    };
                    tracing::debug!(
                        category = %self.category,
                        variant = variant.name,
                        pages,
                        "variant opened"
                    );
                    self.state = State::InVariant { index, page: 1, pages };
                    return self.collect_page(variant, 1).await.map(Some);
                }
                State::InVariant { index, page, pages } => {
                    if page >= pages {
                        self.state = State::NextVariant { index: index + 1 };
                        continue;
                    }
                    let variant = self.variants[index];
                    let page = page + 1;
                    let url = listing_url(&self.base, self.category, &variant, page);
                    self.open(&url).await?;
                    self.state = State::InVariant { index, page, pages };
                    return self.collect_page(variant, page).await.map(Some);
                }
            }
        }
    }

    async fn open(&mut self, url: &str) -> Result<(), BatchError> {
        if let Err(e) = self.session.navigate(url).await {
            return Err(self.fail(e));
        }
        if let Err(e) = self.session.wait_settled().await {
            return Err(self.fail(e));
        }
        Ok(())
    }

    /// Extracts every item on the current page, sequentially and in document
    /// order. A page with zero items yields an empty batch.
    async fn collect_page(&mut self, variant: Variant, page: u32) -> Result<PageBatch, BatchError> {
        let items = match self.session.listing_items().await {
            Ok(items) => items,
            Err(e) => return Err(self.fail(e)),
        };
        let mut records = Vec::with_capacity(items.len());
        for item in &items {
            match self
                .extractor
                .extract(item, self.category, variant.name)
                .await
            {
                Ok(record) => records.push(record),
                Err(error) => {
                    self.state = State::Done;
                    return Err(BatchError {
                        partial: records,
                        error,
                    });
                }
            }
        }
        Ok(PageBatch {
            variant: variant.name,
            page,
            records,
        })
    }

    fn fail(&mut self, error: CrawlError) -> BatchError {
        self.state = State::Done;
        BatchError {
            partial: Vec::new(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::mapping::MappingTable;
    use crate::serialize::SerializerRegistry;
    use crate::testutil::{FixtureItem, FixturePage, FixtureSite};

    fn extractor() -> RecordExtractor {
        RecordExtractor::new(
            Arc::new(MappingTable::builtin()),
            Arc::new(SerializerRegistry::builtin()),
        )
    }

    fn memory_page(total_pages: u32, titles: &[&str]) -> FixturePage {
        let mut page = FixturePage::new(total_pages);
        for t in titles {
            page = page.item(FixtureItem::new(t).price("$99.00"));
        }
        page
    }

    #[tokio::test]
    async fn batches_arrive_in_variant_then_page_order() {
        let mut site = FixtureSite::new("https://fixture.test");
        // DDR3: 2 pages, DDR4: 2 pages, DDR5: 1 empty page.
        site.page(Category::Memory, 0, 1, memory_page(2, &["a1"]));
        site.page(Category::Memory, 0, 2, memory_page(2, &["a2"]));
        site.page(Category::Memory, 1, 1, memory_page(2, &["b1"]));
        site.page(Category::Memory, 1, 2, memory_page(2, &["b2"]));
        site.page(Category::Memory, 2, 1, memory_page(1, &[]));

        let session = site.session();
        let mut traversal =
            CategoryTraversal::new(&session, Category::Memory, extractor(), site.base().clone());

        let mut order = Vec::new();
        while let Some(batch) = traversal.next_batch().await.unwrap() {
            order.push((batch.variant, batch.page, batch.records.len()));
        }
        assert_eq!(
            order,
            vec![
                ("DDR3", 1, 1),
                ("DDR3", 2, 1),
                ("DDR4", 1, 1),
                ("DDR4", 2, 1),
                ("DDR5", 1, 0),
            ]
        );
        // Exhausted cursor stays exhausted.
        assert!(traversal.next_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn record_names_carry_the_variant_prefix() {
        let mut site = FixtureSite::new("https://fixture.test");
        site.page(Category::Memory, 0, 1, memory_page(1, &["Stick"]));
        site.page(Category::Memory, 1, 1, memory_page(1, &[]));
        site.page(Category::Memory, 2, 1, memory_page(1, &[]));

        let session = site.session();
        let mut traversal =
            CategoryTraversal::new(&session, Category::Memory, extractor(), site.base().clone());
        let batch = traversal.next_batch().await.unwrap().unwrap();
        assert_eq!(batch.records[0].name(), Some("DDR3 Stick"));
    }

    #[tokio::test]
    async fn unreadable_pager_is_fatal_for_the_category() {
        let mut site = FixtureSite::new("https://fixture.test");
        site.page(Category::Memory, 0, 1, FixturePage::unreadable_pager());

        let session = site.session();
        let mut traversal =
            CategoryTraversal::new(&session, Category::Memory, extractor(), site.base().clone());
        let err = traversal.next_batch().await.unwrap_err();
        assert!(matches!(
            err.error,
            CrawlError::PaginationUnreadable { ref variant, .. } if variant == "DDR3"
        ));
        assert!(err.partial.is_empty());
        assert!(traversal.next_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn item_failure_preserves_earlier_items_of_the_page() {
        let mut site = FixtureSite::new("https://fixture.test");
        let page = FixturePage::new(1)
            .item(FixtureItem::new("ok-1").price("$10"))
            .item(FixtureItem::new("ok-2").price("$20"))
            .item(FixtureItem::new("bad").cell("Wattage", Some("850")))
            .item(FixtureItem::new("never-reached"));
        site.page(Category::Memory, 0, 1, page);

        let session = site.session();
        let mut traversal =
            CategoryTraversal::new(&session, Category::Memory, extractor(), site.base().clone());
        let err = traversal.next_batch().await.unwrap_err();
        assert!(matches!(err.error, CrawlError::UnmappedLabel { .. }));
        let names: Vec<_> = err.partial.iter().map(|r| r.name().unwrap()).collect();
        assert_eq!(names, vec!["DDR3 ok-1", "DDR3 ok-2"]);
        assert!(traversal.next_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn navigation_failure_is_fatal() {
        // Only page 1 exists but the pager claims 3 pages.
        let mut site = FixtureSite::new("https://fixture.test");
        site.page(Category::Memory, 0, 1, memory_page(3, &["a1"]));

        let session = site.session();
        let mut traversal =
            CategoryTraversal::new(&session, Category::Memory, extractor(), site.base().clone());
        assert!(traversal.next_batch().await.unwrap().is_some());
        let err = traversal.next_batch().await.unwrap_err();
        assert!(matches!(err.error, CrawlError::Navigation(_)));
    }
}
