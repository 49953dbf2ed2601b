//! Concrete collaborators for the partscout core: Chromium-backed browsing
//! sessions and record sinks.

pub mod browser;
pub mod selectors;
pub mod sink;

pub use browser::{BrowserItem, BrowserPool, BrowserSession};
pub use selectors::SiteSelectors;
pub use sink::JsonDirSink;
