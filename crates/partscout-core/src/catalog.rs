//! The fixed catalog: product categories, their listing variants, and
//! listing-page URL construction.
//!
//! Loaded once at startup and read-only thereafter; safe to share across
//! concurrent traversals without synchronization.

use std::fmt;
use std::str::FromStr;

use url::Url;

/// A product type being crawled. Closed set; one traversal per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Cpu,
    CpuCooler,
    Motherboard,
    Memory,
    GraphicsCard,
    Ssd,
    HardDrive,
    PowerSupply,
    Case,
    CaseFan,
    Monitor,
    Keyboard,
    Mouse,
    Headset,
    Speakers,
    Webcam,
    Microphone,
    SoundCard,
    NetworkCard,
    WirelessAdapter,
    OpticalDrive,
    ExternalDrive,
    CaptureCard,
    ThermalPaste,
    Ups,
}

/// A named sub-partition of a category's listing (a memory generation, a CPU
/// socket). Each resolves to its own URL fragment and page count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    /// Display name, used as the record-name prefix.
    pub name: &'static str,
    /// URL path fragment; empty for single-listing categories.
    pub fragment: &'static str,
}

const SOCKET_VARIANTS: &[Variant] = &[
    Variant {
        name: "AM4",
        fragment: "am4",
    },
    Variant {
        name: "AM5",
        fragment: "am5",
    },
    Variant {
        name: "LGA1700",
        fragment: "lga1700",
    },
    Variant {
        name: "LGA1851",
        fragment: "lga1851",
    },
];

const MEMORY_VARIANTS: &[Variant] = &[
    Variant {
        name: "DDR3",
        fragment: "ddr3",
    },
    Variant {
        name: "DDR4",
        fragment: "ddr4",
    },
    Variant {
        name: "DDR5",
        fragment: "ddr5",
    },
];

impl Category {
    /// Every known category, in default crawl order.
    pub const ALL: &'static [Category] = &[
        Category::Cpu,
        Category::CpuCooler,
        Category::Motherboard,
        Category::Memory,
        Category::GraphicsCard,
        Category::Ssd,
        Category::HardDrive,
        Category::PowerSupply,
        Category::Case,
        Category::CaseFan,
        Category::Monitor,
        Category::Keyboard,
        Category::Mouse,
        Category::Headset,
        Category::Speakers,
        Category::Webcam,
        Category::Microphone,
        Category::SoundCard,
        Category::NetworkCard,
        Category::WirelessAdapter,
        Category::OpticalDrive,
        Category::ExternalDrive,
        Category::CaptureCard,
        Category::ThermalPaste,
        Category::Ups,
    ];

    /// Stable identifier used on the command line and in sink file names.
    pub fn slug(self) -> &'static str {
        match self {
            Category::Cpu => "cpu",
            Category::CpuCooler => "cpu-cooler",
            Category::Motherboard => "motherboard",
            Category::Memory => "memory",
            Category::GraphicsCard => "graphics-card",
            Category::Ssd => "ssd",
            Category::HardDrive => "hard-drive",
            Category::PowerSupply => "power-supply",
            Category::Case => "case",
            Category::CaseFan => "case-fan",
            Category::Monitor => "monitor",
            Category::Keyboard => "keyboard",
            Category::Mouse => "mouse",
            Category::Headset => "headset",
            Category::Speakers => "speakers",
            Category::Webcam => "webcam",
            Category::Microphone => "microphone",
            Category::SoundCard => "sound-card",
            Category::NetworkCard => "network-card",
            Category::WirelessAdapter => "wireless-adapter",
            Category::OpticalDrive => "optical-drive",
            Category::ExternalDrive => "external-drive",
            Category::CaptureCard => "capture-card",
            Category::ThermalPaste => "thermal-paste",
            Category::Ups => "ups",
        }
    }

    /// Human-readable name, also the variant prefix for single-listing
    /// categories.
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Cpu => "CPU",
            Category::CpuCooler => "CPU Cooler",
            Category::Motherboard => "Motherboard",
            Category::Memory => "Memory",
            Category::GraphicsCard => "Graphics Card",
            Category::Ssd => "SSD",
            Category::HardDrive => "Hard Drive",
            Category::PowerSupply => "Power Supply",
            Category::Case => "Case",
            Category::CaseFan => "Case Fan",
            Category::Monitor => "Monitor",
            Category::Keyboard => "Keyboard",
            Category::Mouse => "Mouse",
            Category::Headset => "Headset",
            Category::Speakers => "Speakers",
            Category::Webcam => "Webcam",
            Category::Microphone => "Microphone",
            Category::SoundCard => "Sound Card",
            Category::NetworkCard => "Network Card",
            Category::WirelessAdapter => "Wireless Adapter",
            Category::OpticalDrive => "Optical Drive",
            Category::ExternalDrive => "External Drive",
            Category::CaptureCard => "Capture Card",
            Category::ThermalPaste => "Thermal Paste",
            Category::Ups => "UPS",
        }
    }

    /// Listing path segment on the catalog site.
    pub fn path(self) -> &'static str {
        self.slug()
    }

    /// The ordered listing variants of this category. Every category has at
    /// least one; traversal visits them in this order.
    ///
    /// Single-listing categories get one variant named after the category so
    /// record naming stays uniform.
    pub fn variants(self) -> Vec<Variant> {
        match self {
            Category::Cpu | Category::Motherboard => SOCKET_VARIANTS.to_vec(),
            Category::Memory => MEMORY_VARIANTS.to_vec(),
            other => vec![Variant {
                name: other.display_name(),
                fragment: "",
            }],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.slug() == s)
            .ok_or_else(|| format!("unknown category: {s:?}"))
    }
}

/// Builds the listing-page URL for one (category, variant, page) triple.
///
/// The variant fragment is always preserved when paging; only the `page`
/// query parameter varies between pages of one variant.
pub fn listing_url(base: &Url, category: Category, variant: &Variant, page: u32) -> String {
    let base = base.as_str().trim_end_matches('/');
    if variant.fragment.is_empty() {
        format!("{base}/{}?page={page}", category.path())
    } else {
        format!("{base}/{}/{}?page={page}", category.path(), variant.fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://catalog.example.com/").unwrap()
    }

    #[test]
    fn all_categories_round_trip_through_slug() {
        assert_eq!(Category::ALL.len(), 25);
        for &c in Category::ALL {
            assert_eq!(c.slug().parse::<Category>().unwrap(), c);
        }
    }

    #[test]
    fn every_category_has_at_least_one_variant() {
        for &c in Category::ALL {
            assert!(!c.variants().is_empty(), "{c} has no variants");
        }
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!("flux-capacitor".parse::<Category>().is_err());
    }

    #[test]
    fn listing_url_keeps_variant_fragment_across_pages() {
        let ddr5 = Category::Memory.variants()[2];
        assert_eq!(
            listing_url(&base(), Category::Memory, &ddr5, 1),
            "https://catalog.example.com/memory/ddr5?page=1"
        );
        assert_eq!(
            listing_url(&base(), Category::Memory, &ddr5, 7),
            "https://catalog.example.com/memory/ddr5?page=7"
        );
    }

    #[test]
    fn single_variant_listing_url_has_no_fragment() {
        let v = Category::Monitor.variants()[0];
        assert_eq!(
            listing_url(&base(), Category::Monitor, &v, 2),
            "https://catalog.example.com/monitor?page=2"
        );
    }
}
