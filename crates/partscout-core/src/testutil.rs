//! Test utilities: fixture site and mock implementations of the collaborator
//! traits.
//!
//! Handwritten mocks for dependency injection in unit tests. Mocks use
//! `Arc<Mutex<_>>` for interior mutability, allowing test assertions on
//! recorded calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use url::Url;

use crate::catalog::{Category, listing_url};
use crate::error::CrawlError;
use crate::orchestrator::{CrawlEvent, CrawlReporter};
use crate::record::Record;
use crate::traits::{ListingItem, RecordSink, Session, SpecCell};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// One listing item as the fixture site renders it.
#[derive(Debug, Clone, Default)]
pub struct FixtureItem {
    pub title: String,
    pub price: Option<String>,
    pub cells: Vec<(String, Option<String>)>,
}

impl FixtureItem {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    pub fn price(mut self, raw: &str) -> Self {
        self.price = Some(raw.to_string());
        self
    }

    pub fn cell(mut self, label: &str, value: Option<&str>) -> Self {
        self.cells
            .push((label.to_string(), value.map(str::to_string)));
        self
    }
}

/// One listing page: the page count its pagination control reads, and its
/// items. `pager: None` simulates an unreadable pagination control.
#[derive(Debug, Clone)]
pub struct FixturePage {
    pub pager: Option<u32>,
    pub items: Vec<FixtureItem>,
}

impl FixturePage {
    pub fn new(total_pages: u32) -> Self {
        Self {
            pager: Some(total_pages),
            items: Vec::new(),
        }
    }

    pub fn unreadable_pager() -> Self {
        Self {
            pager: None,
            items: Vec::new(),
        }
    }

    pub fn item(mut self, item: FixtureItem) -> Self {
        self.items.push(item);
        self
    }
}

/// A fixture catalog site keyed by listing URL. Sessions built from one site
/// share its pages, so any pooled session can serve any category.
pub struct FixtureSite {
    base: Url,
    pages: HashMap<String, FixturePage>,
}

impl FixtureSite {
    /// New site; the catalog root itself resolves (for orchestrator seeding).
    pub fn new(base: &str) -> Self {
        let base = Url::parse(base).expect("fixture base URL");
        let mut pages = HashMap::new();
        pages.insert(base.as_str().to_string(), FixturePage::new(1));
        Self { base, pages }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Registers the fixture page at `category.variants()[variant_index]`,
    /// page `page` (1-based).
    pub fn page(&mut self, category: Category, variant_index: usize, page: u32, fixture: FixturePage) {
        let variant = category.variants()[variant_index];
        let url = listing_url(&self.base, category, &variant, page);
        self.pages.insert(url, fixture);
    }

    pub fn session(&self) -> MockSession {
        self.session_with_delay(Duration::ZERO)
    }

    /// Session whose `navigate` sleeps, to force overlap in concurrency
    /// tests.
    pub fn session_with_delay(&self, delay: Duration) -> MockSession {
        MockSession {
            pages: Arc::new(self.pages.clone()),
            current: Arc::new(Mutex::new(None)),
            navigations: Arc::new(Mutex::new(Vec::new())),
            delay,
        }
    }
}

// ---------------------------------------------------------------------------
// MockSession
// ---------------------------------------------------------------------------

/// Mock browsing session serving fixture pages by URL.
#[derive(Clone)]
pub struct MockSession {
    pages: Arc<HashMap<String, FixturePage>>,
    current: Arc<Mutex<Option<FixturePage>>>,
    /// Every URL navigated to, in order.
    pub navigations: Arc<Mutex<Vec<String>>>,
    delay: Duration,
}

impl Session for MockSession {
    type Item = MockItem;

    async fn navigate(&self, url: &str) -> Result<(), CrawlError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.navigations.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(page) => {
                *self.current.lock().unwrap() = Some(page.clone());
                Ok(())
            }
            None => Err(CrawlError::Navigation(format!("no fixture page at {url}"))),
        }
    }

    async fn wait_settled(&self) -> Result<(), CrawlError> {
        Ok(())
    }

    async fn page_count(&self) -> Result<u32, CrawlError> {
        let current = self.current.lock().unwrap();
        match current.as_ref().and_then(|p| p.pager) {
            Some(n) => Ok(n),
            None => Err(CrawlError::Browser("no pagination control".into())),
        }
    }

    async fn listing_items(&self) -> Result<Vec<MockItem>, CrawlError> {
        let current = self.current.lock().unwrap();
        let items = current.as_ref().map(|p| p.items.clone()).unwrap_or_default();
        Ok(items.into_iter().map(|fixture| MockItem { fixture }).collect())
    }
}

// ---------------------------------------------------------------------------
// MockItem
// ---------------------------------------------------------------------------

/// Mock listing item backed by a [`FixtureItem`].
#[derive(Debug, Clone)]
pub struct MockItem {
    fixture: FixtureItem,
}

impl ListingItem for FixtureItem {
    async fn title(&self) -> Result<String, CrawlError> {
        Ok(self.title.clone())
    }

    async fn price_text(&self) -> Result<Option<String>, CrawlError> {
        Ok(self.price.clone())
    }

    async fn spec_cells(&self) -> Result<Vec<SpecCell>, CrawlError> {
        Ok(self
            .cells
            .iter()
            .map(|(label, value)| SpecCell {
                label: label.clone(),
                value: value.clone(),
            })
            .collect())
    }
}

impl ListingItem for MockItem {
    async fn title(&self) -> Result<String, CrawlError> {
        self.fixture.title().await
    }

    async fn price_text(&self) -> Result<Option<String>, CrawlError> {
        self.fixture.price_text().await
    }

    async fn spec_cells(&self) -> Result<Vec<SpecCell>, CrawlError> {
        self.fixture.spec_cells().await
    }
}

// ---------------------------------------------------------------------------
// MockSink
// ---------------------------------------------------------------------------

/// Mock sink that records every emission.
#[derive(Clone, Default)]
pub struct MockSink {
    pub emitted: Arc<Mutex<Vec<(Category, Vec<Record>)>>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records_for(&self, category: Category) -> Option<Vec<Record>> {
        self.emitted
            .lock()
            .unwrap()
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, records)| records.clone())
    }

    pub fn emit_count(&self) -> usize {
        self.emitted.lock().unwrap().len()
    }
}

impl RecordSink for MockSink {
    async fn emit(&self, category: Category, records: &[Record]) -> Result<(), CrawlError> {
        self.emitted
            .lock()
            .unwrap()
            .push((category, records.to_vec()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Mock crawl reporter that records event labels and tracks how many
/// categories are mid-traversal at once.
#[derive(Default)]
pub struct MockReporter {
    pub events: Arc<Mutex<Vec<String>>>,
    active: Arc<Mutex<(usize, usize)>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The highest number of categories that were mid-traversal
    /// simultaneously.
    pub fn max_active(&self) -> usize {
        self.active.lock().unwrap().1
    }
}

impl CrawlReporter for MockReporter {
    fn report(&self, event: CrawlEvent<'_>) {
        let label = match &event {
            CrawlEvent::Seeded => "Seeded",
            CrawlEvent::CategoryStarted { .. } => "CategoryStarted",
            CrawlEvent::BatchCollected { .. } => "BatchCollected",
            CrawlEvent::CategoryCompleted { .. } => "CategoryCompleted",
            CrawlEvent::CategoryFailed { .. } => "CategoryFailed",
            CrawlEvent::Finished { .. } => "Finished",
        };
        self.events.lock().unwrap().push(label.to_string());

        let mut active = self.active.lock().unwrap();
        match event {
            CrawlEvent::CategoryStarted { .. } => {
                active.0 += 1;
                active.1 = active.1.max(active.0);
            }
            CrawlEvent::CategoryCompleted { .. } | CrawlEvent::CategoryFailed { .. } => {
                active.0 = active.0.saturating_sub(1);
            }
            _ => {}
        }
    }
}
