//! The crawl orchestrator: a bounded pool of browsing sessions, one category
//! per session, with per-category fault isolation.
//!
//! The category boundary is the sole recovery point of the pipeline. Any
//! fatal condition inside a traversal — schema drift, malformed values,
//! navigation failures, the hard per-category timeout — is converted here
//! into a logged warning plus emission of whatever partial result was already
//! accumulated. Nothing is retried; sibling categories are unaffected.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::catalog::Category;
use crate::error::CrawlError;
use crate::extract::RecordExtractor;
use crate::mapping::MappingTable;
use crate::record::Record;
use crate::serialize::SerializerRegistry;
use crate::traits::{RecordSink, Session};
use crate::traversal::CategoryTraversal;

/// Crawl-wide settings.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Catalog site root; also the seeding target.
    pub base_url: Url,
    /// Hard budget for one category's whole traversal.
    pub category_timeout: Duration,
}

impl CrawlConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            category_timeout: Duration::from_secs(300),
        }
    }

    pub fn with_timeout(mut self, category_timeout: Duration) -> Self {
        self.category_timeout = category_timeout;
        self
    }
}

/// Terminal state of one category's crawl.
#[derive(Debug)]
pub struct CategoryReport {
    pub category: Category,
    /// Records emitted to the sink (complete or partial).
    pub records: usize,
    /// The fatal condition that truncated the traversal, if any.
    pub error: Option<CrawlError>,
}

impl CategoryReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Events emitted by the orchestrator for monitoring/logging.
#[derive(Debug, Clone)]
pub enum CrawlEvent<'a> {
    /// The seeding session opened the catalog root.
    Seeded,
    CategoryStarted {
        category: Category,
    },
    BatchCollected {
        category: Category,
        variant: &'a str,
        page: u32,
        records: usize,
    },
    CategoryCompleted {
        category: Category,
        records: usize,
    },
    CategoryFailed {
        category: Category,
        error: &'a CrawlError,
        records_kept: usize,
    },
    Finished {
        completed: usize,
        failed: usize,
    },
}

/// Trait for receiving crawl events (decoupled logging).
pub trait CrawlReporter: Send + Sync {
    fn report(&self, event: CrawlEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl CrawlReporter for TracingReporter {
    fn report(&self, event: CrawlEvent<'_>) {
        match event {
            CrawlEvent::Seeded => {
                tracing::info!("catalog root seeded");
            }
            CrawlEvent::CategoryStarted { category } => {
                tracing::info!(%category, "category traversal started");
            }
            CrawlEvent::BatchCollected {
                category,
                variant,
                page,
                records,
            } => {
                tracing::debug!(%category, variant, page, records, "page batch collected");
            }
            CrawlEvent::CategoryCompleted { category, records } => {
                tracing::info!(%category, records, "category completed");
            }
            CrawlEvent::CategoryFailed {
                category,
                error,
                records_kept,
            } => {
                tracing::warn!(%category, %error, records_kept, "category failed; partial result emitted");
            }
            CrawlEvent::Finished { completed, failed } => {
                tracing::info!(completed, failed, "crawl finished");
            }
        }
    }
}

/// Runs category traversals over a bounded session pool and hands finished
/// per-category collections to the sink.
pub struct Orchestrator<K> {
    extractor: RecordExtractor,
    sink: Arc<K>,
    config: CrawlConfig,
}

impl<K: RecordSink + 'static> Orchestrator<K> {
    pub fn new(
        mapping: Arc<MappingTable>,
        registry: Arc<SerializerRegistry>,
        sink: K,
        config: CrawlConfig,
    ) -> Self {
        Self {
            extractor: RecordExtractor::new(mapping, registry),
            sink: Arc::new(sink),
            config,
        }
    }

    /// Crawls every requested category to a terminal state.
    ///
    /// The pool bound is `sessions.len()`: each category exclusively owns one
    /// session while active and returns it to the pool afterwards, success or
    /// not. Exactly one sink emission happens per dispatched category.
    /// Cancellation stops dispatching further categories; in-flight ones
    /// finish normally.
    pub async fn run<S, R>(
        &self,
        sessions: Vec<S>,
        categories: &[Category],
        cancel: CancellationToken,
        reporter: Arc<R>,
    ) -> Result<Vec<CategoryReport>, CrawlError>
    where
        S: Session + Sync,
        R: CrawlReporter + 'static,
    {
        if sessions.is_empty() {
            return Err(CrawlError::Browser("session pool is empty".into()));
        }

        // Seed baseline session/cookie state before any category traffic.
        let seed = &sessions[0];
        seed.navigate(self.config.base_url.as_str()).await?;
        seed.wait_settled().await?;
        reporter.report(CrawlEvent::Seeded);

        let pool_size = sessions.len();
        let (pool_tx, mut pool_rx) = mpsc::channel::<S>(pool_size);
        for session in sessions {
            // Capacity equals the pool size; this never blocks.
            let _ = pool_tx.send(session).await;
        }

        let mut tasks: JoinSet<(usize, CategoryReport)> = JoinSet::new();
        for (pos, &category) in categories.iter().enumerate() {
            let session = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::info!(
                        remaining = categories.len() - pos,
                        "cancellation requested; not dispatching remaining categories"
                    );
                    break;
                }
                session = pool_rx.recv() => match session {
                    Some(s) => s,
                    None => break,
                },
            };

            let extractor = self.extractor.clone();
            let sink = Arc::clone(&self.sink);
            let reporter = Arc::clone(&reporter);
            let pool_tx = pool_tx.clone();
            let base = self.config.base_url.clone();
            let budget = self.config.category_timeout;

            tasks.spawn(async move {
                reporter.report(CrawlEvent::CategoryStarted { category });

                let (records, error) =
                    crawl_category(&session, category, extractor, base, budget, reporter.as_ref())
                        .await;

                if let Err(e) = sink.emit(category, &records).await {
                    tracing::warn!(%category, error = %e, "failed to emit category result");
                }

                match &error {
                    None => reporter.report(CrawlEvent::CategoryCompleted {
                        category,
                        records: records.len(),
                    }),
                    Some(e) => reporter.report(CrawlEvent::CategoryFailed {
                        category,
                        error: e,
                        records_kept: records.len(),
                    }),
                }

                let _ = pool_tx.send(session).await;
                (
                    pos,
                    CategoryReport {
                        category,
                        records: records.len(),
                        error,
                    },
                )
            });
        }
        drop(pool_tx);

        let mut entries = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::error!(error = %e, "category task failed to join"),
            }
        }
        entries.sort_by_key(|(pos, _)| *pos);

        let reports: Vec<CategoryReport> = entries.into_iter().map(|(_, r)| r).collect();
        let failed = reports.iter().filter(|r| r.error.is_some()).count();
        reporter.report(CrawlEvent::Finished {
            completed: reports.len() - failed,
            failed,
        });
        Ok(reports)
    }
}

/// Drains one category's traversal under a fixed deadline, preserving
/// whatever was accumulated when a fatal condition hits.
async fn crawl_category<S: Session, R: CrawlReporter>(
    session: &S,
    category: Category,
    extractor: RecordExtractor,
    base: Url,
    budget: Duration,
    reporter: &R,
) -> (Vec<Record>, Option<CrawlError>) {
    let mut traversal = CategoryTraversal::new(session, category, extractor, base);
    let mut records = Vec::new();
    let deadline = tokio::time::Instant::now() + budget;

    loop {
        match tokio::time::timeout_at(deadline, traversal.next_batch()).await {
            Err(_) => {
                return (records, Some(CrawlError::CategoryTimeout(budget.as_secs())));
            }
            Ok(Ok(Some(batch))) => {
                reporter.report(CrawlEvent::BatchCollected {
                    category,
                    variant: batch.variant,
                    page: batch.page,
                    records: batch.records.len(),
                });
                records.extend(batch.records);
            }
            Ok(Ok(None)) => return (records, None),
            Ok(Err(failure)) => {
                records.extend(failure.partial);
                return (records, Some(failure.error));
            }
        }
    }
}
