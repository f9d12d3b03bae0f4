//! Service layer for business logic.

pub mod export;
pub mod page_metadata;
pub mod passage_lookup;
pub mod project_metadata;

pub use export::ExportService;
pub use page_metadata::PageMetadataService;
pub use passage_lookup::PassageLookupService;
pub use project_metadata::ProjectMetadataService;
