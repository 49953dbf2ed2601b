//! The declarative field-mapping table: for every category, a lookup from
//! the raw spec label rendered on the listing page to the canonical field
//! name and the serializer that parses its value.
//!
//! The table is loaded once at startup, validated against the serializer
//! registry, and read-only for the rest of the process. A label encountered
//! on a live page without an entry here means the site schema drifted and
//! the category can no longer be trusted.

use std::collections::HashMap;

use crate::catalog::Category;
use crate::error::CrawlError;
use crate::record::FieldId;
use crate::serialize::{GenericKind, SerializerKind, SerializerRegistry};

const NUM: SerializerKind = SerializerKind::Generic(GenericKind::Number);
const BOOL: SerializerKind = SerializerKind::Generic(GenericKind::Boolean);
const TEXT: SerializerKind = SerializerKind::Generic(GenericKind::Text);
const LIST: SerializerKind = SerializerKind::Generic(GenericKind::List);
const CUSTOM: SerializerKind = SerializerKind::Custom;

/// What a raw label resolves to: canonical field name plus serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: FieldId,
    pub kind: SerializerKind,
}

/// `Category → (raw label → FieldSpec)`.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    tables: HashMap<Category, HashMap<&'static str, FieldSpec>>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one `(raw label → field)` entry for a category.
    pub fn insert(
        &mut self,
        category: Category,
        label: &'static str,
        field: &'static str,
        kind: SerializerKind,
    ) {
        self.tables.entry(category).or_default().insert(
            label,
            FieldSpec {
                field: FieldId(field),
                kind,
            },
        );
    }

    /// Resolves a raw spec label for a category.
    ///
    /// The label is trimmed first (listing pages render incidental
    /// whitespace); the lookup itself is case-sensitive. A miss is fatal to
    /// the current category's traversal, not to the run.
    pub fn resolve(&self, category: Category, raw_label: &str) -> Result<FieldSpec, CrawlError> {
        self.tables
            .get(&category)
            .and_then(|t| t.get(raw_label.trim()))
            .copied()
            .ok_or_else(|| CrawlError::UnmappedLabel {
                category,
                label: raw_label.trim().to_string(),
            })
    }

    /// Startup validation: every `custom` field has a registered function and
    /// no two labels of one category resolve to the same field name.
    ///
    /// Run this before any traversal; both failures are process-fatal
    /// configuration errors, never live-data anomalies.
    pub fn validate(&self, registry: &SerializerRegistry) -> Result<(), CrawlError> {
        for (&category, table) in &self.tables {
            let mut seen: HashMap<FieldId, &'static str> = HashMap::new();
            for (&label, spec) in table {
                if seen.insert(spec.field, label).is_some() {
                    return Err(CrawlError::DuplicateField {
                        category,
                        field: spec.field.0,
                    });
                }
                if spec.kind == SerializerKind::Custom
                    && !registry.is_registered(category, spec.field)
                {
                    return Err(CrawlError::UnregisteredCustomSerializer {
                        category,
                        field: spec.field.0,
                    });
                }
            }
        }
        Ok(())
    }

    /// The full static table for the built-in catalog.
    pub fn builtin() -> Self {
        let mut t = Self::new();
        for &(category, entries) in BUILTIN {
            for &(label, field, kind) in entries {
                t.insert(category, label, field, kind);
            }
        }
        t
    }
}

type Entries = &'static [(&'static str, &'static str, SerializerKind)];

#[rustfmt::skip]
const BUILTIN: &[(Category, Entries)] = &[
    (Category::Cpu, &[
        ("Cores", "cores", NUM),
        ("Threads", "threads", NUM),
        ("Clock Speed", "clock", CUSTOM),
        ("TDP", "tdp", NUM),
        ("Socket", "socket", TEXT),
        ("Integrated Graphics", "integrated_graphics", BOOL),
        ("L3 Cache", "l3_cache", NUM),
    ]),
    (Category::CpuCooler, &[
        ("Fan RPM", "fan_rpm", NUM),
        ("Noise Level", "noise_level", NUM),
        ("Radiator Size", "radiator_size", NUM),
        ("Water Cooled", "water_cooled", BOOL),
        ("Supported Sockets", "supported_sockets", LIST),
        ("Height", "height", NUM),
    ]),
    (Category::Motherboard, &[
        ("Socket", "socket", TEXT),
        ("Form Factor", "form_factor", TEXT),
        ("Chipset", "chipset", TEXT),
        ("Memory Slots", "memory_slots", NUM),
        ("Max Memory", "max_memory", NUM),
        ("Wi-Fi", "wifi", BOOL),
        ("M.2 Slots", "m2_slots", NUM),
    ]),
    (Category::Memory, &[
        ("Capacity", "capacity", CUSTOM),
        ("Speed", "speed", NUM),
        ("CAS Latency", "cas_latency", NUM),
        ("Timings", "timings", LIST),
        ("Heat Spreader", "heat_spreader", BOOL),
        ("Voltage", "voltage", NUM),
    ]),
    (Category::GraphicsCard, &[
        ("Memory", "memory", NUM),
        ("Memory Type", "memory_type", TEXT),
        ("Core Clock", "core_clock", NUM),
        ("Boost Clock", "boost_clock", NUM),
        ("TDP", "tdp", NUM),
        ("Length", "length", NUM),
        ("Outputs", "outputs", LIST),
    ]),
    (Category::Ssd, &[
        ("Capacity", "capacity", CUSTOM),
        ("Form Factor", "form_factor", TEXT),
        ("Interface", "interface", TEXT),
        ("NVMe", "nvme", BOOL),
        ("Read Speed", "read_speed", NUM),
        ("Write Speed", "write_speed", NUM),
    ]),
    (Category::HardDrive, &[
        ("Capacity", "capacity", CUSTOM),
        ("RPM", "rpm", NUM),
        ("Cache", "cache", NUM),
        ("Form Factor", "form_factor", TEXT),
        ("Interface", "interface", TEXT),
    ]),
    (Category::PowerSupply, &[
        ("Wattage", "wattage", NUM),
        ("Efficiency Rating", "efficiency_rating", TEXT),
        ("Modular", "modular", TEXT),
        ("Form Factor", "form_factor", TEXT),
        ("Fanless", "fanless", BOOL),
    ]),
    (Category::Case, &[
        ("Form Factor", "form_factor", TEXT),
        ("Motherboard Support", "motherboard_support", LIST),
        ("Side Panel", "side_panel", TEXT),
        ("Drive Bays", "drive_bays", NUM),
        ("Max GPU Length", "max_gpu_length", NUM),
    ]),
    (Category::CaseFan, &[
        ("Size", "size", NUM),
        ("RPM", "rpm", NUM),
        ("Airflow", "airflow", NUM),
        ("Noise Level", "noise_level", NUM),
        ("PWM", "pwm", BOOL),
        ("LED", "led", TEXT),
    ]),
    (Category::Monitor, &[
        ("Screen Size", "screen_size", NUM),
        ("Resolution", "resolution", TEXT),
        ("Refresh Rate", "refresh_rate", NUM),
        ("Response Time", "response_time", NUM),
        ("Panel Type", "panel_type", TEXT),
        ("Curved", "curved", BOOL),
    ]),
    (Category::Keyboard, &[
        ("Switch Type", "switch_type", TEXT),
        ("Backlight", "backlight", TEXT),
        ("Wireless", "wireless", BOOL),
        ("Tenkeyless", "tenkeyless", BOOL),
        ("Connectivity", "connectivity", LIST),
    ]),
    (Category::Mouse, &[
        ("Sensor", "sensor", TEXT),
        ("Max DPI", "max_dpi", NUM),
        ("Buttons", "buttons", NUM),
        ("Wireless", "wireless", BOOL),
        ("Weight", "weight", NUM),
    ]),
    (Category::Headset, &[
        ("Driver Size", "driver_size", NUM),
        ("Wireless", "wireless", BOOL),
        ("Microphone", "microphone", BOOL),
        ("Frequency Response", "frequency_response", TEXT),
        ("Connectivity", "connectivity", LIST),
    ]),
    (Category::Speakers, &[
        ("Configuration", "configuration", TEXT),
        ("Total Wattage", "total_wattage", NUM),
        ("Bluetooth", "bluetooth", BOOL),
        ("Subwoofer", "subwoofer", BOOL),
    ]),
    (Category::Webcam, &[
        ("Resolution", "resolution", TEXT),
        ("Frame Rate", "frame_rate", NUM),
        ("Autofocus", "autofocus", BOOL),
        ("Field of View", "field_of_view", NUM),
        ("Microphone", "microphone", BOOL),
    ]),
    (Category::Microphone, &[
        ("Polar Patterns", "polar_patterns", LIST),
        ("Sample Rate", "sample_rate", NUM),
        ("USB", "usb", BOOL),
        ("Boom Arm Included", "boom_arm_included", BOOL),
    ]),
    (Category::SoundCard, &[
        ("Channels", "channels", NUM),
        ("Sample Rate", "sample_rate", NUM),
        ("Signal-to-Noise Ratio", "snr", NUM),
        ("Interface", "interface", TEXT),
    ]),
    (Category::NetworkCard, &[
        ("Speed", "speed", NUM),
        ("Ports", "ports", NUM),
        ("Interface", "interface", TEXT),
        ("Chipset", "chipset", TEXT),
    ]),
    (Category::WirelessAdapter, &[
        ("Standard", "standard", TEXT),
        ("Bands", "bands", LIST),
        ("Interface", "interface", TEXT),
        ("Bluetooth", "bluetooth", BOOL),
    ]),
    (Category::OpticalDrive, &[
        ("Type", "drive_type", TEXT),
        ("Write Speed", "write_speed", NUM),
        ("Interface", "interface", TEXT),
    ]),
    (Category::ExternalDrive, &[
        ("Capacity", "capacity", CUSTOM),
        ("Interface", "interface", TEXT),
        ("Portable", "portable", BOOL),
        ("Rugged", "rugged", BOOL),
    ]),
    (Category::CaptureCard, &[
        ("Max Capture Resolution", "max_capture_resolution", TEXT),
        ("Passthrough", "passthrough", TEXT),
        ("Interface", "interface", TEXT),
        ("HDR", "hdr", BOOL),
    ]),
    (Category::ThermalPaste, &[
        ("Amount", "amount", NUM),
        ("Thermal Conductivity", "thermal_conductivity", NUM),
        ("Electrically Conductive", "electrically_conductive", BOOL),
    ]),
    (Category::Ups, &[
        ("Capacity", "capacity", NUM),
        ("Wattage", "wattage", NUM),
        ("Outlets", "outlets", NUM),
        ("Pure Sine Wave", "pure_sine_wave", BOOL),
    ]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_every_category() {
        let table = MappingTable::builtin();
        for &c in Category::ALL {
            assert!(table.tables.contains_key(&c), "no mapping for {c}");
        }
    }

    #[test]
    fn builtin_validates_against_builtin_registry() {
        MappingTable::builtin()
            .validate(&SerializerRegistry::builtin())
            .unwrap();
    }

    #[test]
    fn resolve_trims_incidental_whitespace() {
        let table = MappingTable::builtin();
        let spec = table.resolve(Category::Cpu, "  Cores \n").unwrap();
        assert_eq!(spec.field, FieldId("cores"));
        assert_eq!(spec.kind, NUM);
    }

    #[test]
    fn resolve_is_case_sensitive() {
        let table = MappingTable::builtin();
        assert!(matches!(
            table.resolve(Category::Cpu, "cores"),
            Err(CrawlError::UnmappedLabel { .. })
        ));
    }

    #[test]
    fn unknown_label_names_category_and_label() {
        let table = MappingTable::builtin();
        match table.resolve(Category::Memory, "Wattage") {
            Err(CrawlError::UnmappedLabel { category, label }) => {
                assert_eq!(category, Category::Memory);
                assert_eq!(label, "Wattage");
            }
            other => panic!("expected UnmappedLabel, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_unregistered_custom() {
        let mut table = MappingTable::new();
        table.insert(Category::Cpu, "Clock Speed", "clock", CUSTOM);
        let err = table.validate(&SerializerRegistry::new()).unwrap_err();
        assert!(matches!(
            err,
            CrawlError::UnregisteredCustomSerializer {
                category: Category::Cpu,
                field: "clock",
            }
        ));
        assert!(err.is_config_error());
    }

    #[test]
    fn validate_rejects_duplicate_field_names() {
        let mut table = MappingTable::new();
        table.insert(Category::Ups, "Capacity", "capacity", NUM);
        table.insert(Category::Ups, "Capacity (VA)", "capacity", NUM);
        assert!(matches!(
            table.validate(&SerializerRegistry::new()),
            Err(CrawlError::DuplicateField {
                category: Category::Ups,
                field: "capacity",
            })
        ));
    }
}
