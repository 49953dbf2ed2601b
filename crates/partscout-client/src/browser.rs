use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;

use partscout_core::error::CrawlError;
use partscout_core::traits::{ListingItem, Session, SpecCell};

use crate::selectors::SiteSelectors;

/// Headless-Chromium session factory via the Chrome DevTools Protocol.
///
/// A single Chromium process is shared by every session created from one
/// pool; each [`BrowserSession`] owns its own tab, so each category traversal
/// gets an isolated browsing context.
///
/// # Example
///
/// ```rust,no_run
/// use partscout_client::BrowserPool;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = BrowserPool::launch().await?;
/// let sessions = pool.sessions(5).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BrowserPool {
    browser: Arc<Browser>,
    timeout: Duration,
    selectors: Arc<SiteSelectors>,
}

impl BrowserPool {
    /// Launches a headless Chromium browser with a **30 s** navigation
    /// timeout and default selectors.
    ///
    /// Requires a Chromium / Chrome binary reachable via `$PATH` (or the
    /// default locations checked by `chromiumoxide`).
    pub async fn launch() -> Result<Self, CrawlError> {
        Self::with_options(Duration::from_secs(30), SiteSelectors::default()).await
    }

    /// Launches with a custom navigation timeout and selector set.
    pub async fn with_options(
        timeout: Duration,
        selectors: SiteSelectors,
    ) -> Result<Self, CrawlError> {
        let mut builder = BrowserConfig::builder();
        builder = builder.no_sandbox().disable_default_args();

        // Snap-packaged Chromium exposes a wrapper that rejects standard
        // Chrome CLI flags (--headless, --disable-gpu, …).  We try to
        // locate the *real* binary buried inside the snap, falling back
        // to any other Chrome/Chromium the user may have installed.
        if let Some(bin) = Self::find_chrome_binary() {
            tracing::info!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        let config = builder
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking")
            .arg("--disable-translate")
            .arg("--no-first-run")
            .build()
            .map_err(|e| CrawlError::Browser(format!("browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CrawlError::Browser(format!("failed to launch browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection to work.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        Ok(Self {
            browser: Arc::new(browser),
            timeout,
            selectors: Arc::new(selectors),
        })
    }

    /// Opens one fresh tab as a browsing session.
    pub async fn new_session(&self) -> Result<BrowserSession, CrawlError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| CrawlError::Browser(format!("failed to open tab: {e}")))?;
        Ok(BrowserSession {
            page,
            timeout: self.timeout,
            selectors: Arc::clone(&self.selectors),
        })
    }

    /// Opens `n` sessions for the orchestrator's pool.
    pub async fn sessions(&self, n: usize) -> Result<Vec<BrowserSession>, CrawlError> {
        let mut sessions = Vec::with_capacity(n);
        for _ in 0..n {
            sessions.push(self.new_session().await?);
        }
        Ok(sessions)
    }

    /// Tries to locate the real Chrome/Chromium binary.
    ///
    /// On systems where Chromium is installed via **snap**, the wrapper at
    /// `/snap/bin/chromium` strips unknown CLI flags, breaking headless mode.
    /// We look for the real binary inside the snap first, then fall back to
    /// well-known system paths.  If nothing is found we return `None` and let
    /// `chromiumoxide` do its own lookup.
    fn find_chrome_binary() -> Option<PathBuf> {
        let candidates: &[&str] = &[
            // Snap (Ubuntu default)
            "/snap/chromium/current/usr/lib/chromium-browser/chrome",
            // Flatpak
            "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
            // Common apt / manual installs
            "/usr/bin/google-chrome-stable",
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
        ];

        // Also honour an explicit override via env var.
        if let Ok(p) = std::env::var("CHROME_BIN") {
            let path = PathBuf::from(&p);
            if path.exists() {
                return Some(path);
            }
        }

        candidates.iter().map(PathBuf::from).find(|p| p.exists())
    }
}

/// One Chromium tab serving as a browsing session.
#[derive(Clone)]
pub struct BrowserSession {
    page: Page,
    timeout: Duration,
    selectors: Arc<SiteSelectors>,
}

impl BrowserSession {
    async fn bounded<T, F>(&self, what: &str, fut: F) -> Result<T, CrawlError>
    where
        F: Future<Output = Result<T, CrawlError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(inner) => inner,
            Err(_) => Err(CrawlError::Navigation(format!(
                "{what} timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

impl Session for BrowserSession {
    type Item = BrowserItem;

    async fn navigate(&self, url: &str) -> Result<(), CrawlError> {
        self.bounded("navigation", async {
            self.page
                .goto(url)
                .await
                .map_err(|e| CrawlError::Navigation(format!("failed to navigate to {url}: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn wait_settled(&self) -> Result<(), CrawlError> {
        self.bounded("page settle", async {
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| CrawlError::Navigation(format!("page did not settle: {e}")))?;
            // <body> present is the minimal signal that the page has
            // rendered its main content.
            self.page
                .find_element("body")
                .await
                .map_err(|e| CrawlError::Navigation(format!("page did not render body: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn page_count(&self) -> Result<u32, CrawlError> {
        self.bounded("pagination read", async {
            // A listing without a pagination control is a single page.
            let Ok(el) = self.page.find_element(&self.selectors.pagination).await else {
                return Ok(1);
            };
            let text = el
                .inner_text()
                .await
                .map_err(|e| CrawlError::Browser(format!("failed to read pagination: {e}")))?
                .unwrap_or_default();
            text.split_whitespace()
                .rev()
                .find_map(|token| token.parse::<u32>().ok())
                .ok_or_else(|| {
                    CrawlError::Browser(format!("no page number in pagination text {text:?}"))
                })
        })
        .await
    }

    async fn listing_items(&self) -> Result<Vec<BrowserItem>, CrawlError> {
        self.bounded("listing read", async {
            let elements = self
                .page
                .find_elements(&self.selectors.listing_item)
                .await
                .map_err(|e| CrawlError::Browser(format!("failed to locate listing items: {e}")))?;
            Ok(elements
                .into_iter()
                .map(|element| BrowserItem {
                    element,
                    selectors: Arc::clone(&self.selectors),
                })
                .collect())
        })
        .await
    }
}

/// One listing item element on the current page.
pub struct BrowserItem {
    element: Element,
    selectors: Arc<SiteSelectors>,
}

impl BrowserItem {
    /// Reads the trimmed inner text of a child node; `None` when the node is
    /// missing or renders empty.
    async fn child_text(&self, selector: &str) -> Result<Option<String>, CrawlError> {
        let Ok(el) = self.element.find_element(selector).await else {
            return Ok(None);
        };
        let text = el
            .inner_text()
            .await
            .map_err(|e| CrawlError::Browser(format!("failed to read element text: {e}")))?;
        Ok(text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }
}

impl ListingItem for BrowserItem {
    async fn title(&self) -> Result<String, CrawlError> {
        self.child_text(&self.selectors.title)
            .await?
            .ok_or_else(|| CrawlError::Browser("listing item has no title".into()))
    }

    async fn price_text(&self) -> Result<Option<String>, CrawlError> {
        self.child_text(&self.selectors.price).await
    }

    async fn spec_cells(&self) -> Result<Vec<SpecCell>, CrawlError> {
        let cells = self
            .element
            .find_elements(&self.selectors.spec_cell)
            .await
            .map_err(|e| CrawlError::Browser(format!("failed to locate spec cells: {e}")))?;

        let mut out = Vec::with_capacity(cells.len());
        for cell in cells {
            let label = match cell.find_element(&self.selectors.spec_label).await {
                Ok(el) => el
                    .inner_text()
                    .await
                    .map_err(|e| CrawlError::Browser(format!("failed to read spec label: {e}")))?
                    .unwrap_or_default(),
                // A cell without a label node carries no mappable data.
                Err(_) => continue,
            };
            let value = match cell.find_element(&self.selectors.spec_value).await {
                Ok(el) => el
                    .inner_text()
                    .await
                    .map_err(|e| CrawlError::Browser(format!("failed to read spec value: {e}")))?
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty()),
                Err(_) => None,
            };
            out.push(SpecCell { label, value });
        }
        Ok(out)
    }
}
