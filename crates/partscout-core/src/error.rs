use thiserror::Error;

use crate::catalog::Category;

/// Application-wide error types for partscout.
#[derive(Error, Debug, Clone)]
pub enum CrawlError {
    /// A raw spec label has no mapping-table entry for its category.
    /// Signals live-site schema drift; fatal to that category's traversal.
    #[error("unmapped spec label {label:?} for category {category}")]
    UnmappedLabel { category: Category, label: String },

    /// Raw text could not be parsed by the selected serializer.
    #[error("malformed value for field {field:?}: {raw:?}")]
    MalformedValue { field: &'static str, raw: String },

    /// A field is marked `custom` but no function is registered for it.
    /// Indicates a broken mapping table; caught by startup validation.
    #[error("no custom serializer registered for {category} field {field:?}")]
    UnregisteredCustomSerializer {
        category: Category,
        field: &'static str,
    },

    /// Two raw labels of one category resolve to the same field name.
    #[error("duplicate field {field:?} in mapping table for category {category}")]
    DuplicateField {
        category: Category,
        field: &'static str,
    },

    /// The pagination control could not be read for a variant listing.
    #[error("pagination unreadable for variant {variant:?}: {reason}")]
    PaginationUnreadable { variant: String, reason: String },

    /// Navigating to a listing page failed.
    #[error("navigation error: {0}")]
    Navigation(String),

    /// A category traversal exceeded its hard time budget.
    #[error("category traversal timed out after {0} seconds")]
    CategoryTimeout(u64),

    /// Browser/session-level failure outside a specific navigation.
    #[error("browser error: {0}")]
    Browser(String),

    /// The output sink rejected an emission.
    #[error("sink error: {0}")]
    Sink(String),
}

impl CrawlError {
    /// Returns true if this error indicates a broken static configuration.
    ///
    /// Configuration errors are fatal to the whole process and must be
    /// surfaced by startup validation, never mid-crawl. Everything else is
    /// isolated at the owning category's boundary.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CrawlError::UnregisteredCustomSerializer { .. } | CrawlError::DuplicateField { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_flagged() {
        assert!(
            CrawlError::UnregisteredCustomSerializer {
                category: Category::Cpu,
                field: "clock",
            }
            .is_config_error()
        );
        assert!(
            CrawlError::DuplicateField {
                category: Category::Memory,
                field: "capacity",
            }
            .is_config_error()
        );
    }

    #[test]
    fn crawl_time_errors_are_isolated() {
        assert!(
            !CrawlError::UnmappedLabel {
                category: Category::Cpu,
                label: "Wattage".into(),
            }
            .is_config_error()
        );
        assert!(!CrawlError::CategoryTimeout(300).is_config_error());
        assert!(
            !CrawlError::PaginationUnreadable {
                variant: "DDR5".into(),
                reason: "no pager element".into(),
            }
            .is_config_error()
        );
    }
}
