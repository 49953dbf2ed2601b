//! Core crawl pipeline for partscout: catalog configuration, the
//! mapping/serialization engine, pagination traversal, and the bounded
//! crawl orchestrator.

pub mod catalog;
pub mod error;
pub mod extract;
pub mod mapping;
pub mod orchestrator;
pub mod record;
pub mod serialize;
pub mod testutil;
pub mod traits;
pub mod traversal;

pub use catalog::{Category, Variant};
pub use error::CrawlError;
pub use extract::RecordExtractor;
pub use mapping::MappingTable;
pub use orchestrator::{CrawlConfig, Orchestrator, TracingReporter};
pub use record::{FieldId, Record, Value};
pub use serialize::SerializerRegistry;
pub use traits::{ListingItem, NullSink, RecordSink, Session};
