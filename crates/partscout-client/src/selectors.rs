/// CSS descriptors for the catalog site's listing markup.
///
/// Element descriptors are deliberately client configuration: the core never
/// sees a selector, only the domain-shaped [`Session`]/[`ListingItem`]
/// surface.
///
/// [`Session`]: partscout_core::Session
/// [`ListingItem`]: partscout_core::ListingItem
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// One listing item row.
    pub listing_item: String,
    /// Item title, inside a listing item.
    pub title: String,
    /// Item price, inside a listing item; may be absent.
    pub price: String,
    /// One spec cell (label + value), inside a listing item.
    pub spec_cell: String,
    /// Label node inside a spec cell.
    pub spec_label: String,
    /// Value node inside a spec cell; may be absent.
    pub spec_value: String,
    /// The pagination control on a listing page; absent on single-page
    /// listings.
    pub pagination: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            listing_item: ".listing .listing-row".into(),
            title: ".item-title".into(),
            price: ".item-price".into(),
            spec_cell: ".spec-cell".into(),
            spec_label: ".spec-label".into(),
            spec_value: ".spec-value".into(),
            pagination: ".pagination .page-link:last-child".into(),
        }
    }
}
