//! # folio-core
//!
//! Core types, traits, and annotation logic for the folio page archive.
//!
//! This crate provides the data model (pages, projects, annotations), the
//! storage traits that `folio-db` implements, and the pure logic the API
//! builds on: the annotation merge engine, the export pipeline, the
//! cross-project passage lookup and year extraction.

pub mod annotation;
pub mod defaults;
pub mod error;
pub mod export;
pub mod logging;
pub mod lookup;
pub mod models;
pub mod search;
pub mod traits;
pub mod uuid_utils;
pub mod years;

// Re-export commonly used types at crate root
pub use annotation::AnnotationPatch;
pub use error::{Error, Result};
pub use export::{build_export, ExportRow, ProjectExport, CSV_HEADERS};
pub use lookup::find_passages_elsewhere;
pub use models::*;
pub use search::PageSearchRequest;
pub use traits::*;
pub use uuid_utils::{new_v7, parse_id, short_id};
pub use years::collect_years;
