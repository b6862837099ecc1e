//! `exportkit_export` v1:
//! Asynchronous paged spreadsheet export pipeline.
//!
//! Architecture:
//! - `conf`         : constants and defaults
//! - `spec`         : descriptors/schemas/options/jobs/errors
//! - `util`         : locale resolution, cell normalization, naming
//! - `schema`       : export model extraction
//! - `driver`       : paged fetch -> rolling sheets
//! - `store`        : tracking and blob store contracts + local implementations
//! - `scheduler`    : bounded worker pool with rejection policies
//! - `orchestrator` : job lifecycle, temp files, upload
pub mod conf;
pub mod driver;
pub mod orchestrator;
pub mod scheduler;
pub mod schema;
pub mod spec;
pub mod store;
pub mod util;

#[cfg(test)]
mod testing;

pub use driver::{SpecFixedSheet, export_template, run_paged_export, write_fixed_sheet};
pub use orchestrator::ExportOrchestrator;
pub use scheduler::{ScheduledTask, TaskScheduler, WorkerPool};
pub use schema::{derive_file_name, extract_export_model, select_sorted_fields};
pub use spec::{
    EnumExportStatus, EnumFieldType, EnumFieldValue, EnumRejectionPolicy, ExportError,
    ExportRecord, FixedSheet, JobId, PageSource, PageSourceFn, SchedulerError,
    SpecColumnDescriptor, SpecColumnSchema, SpecDriverOptions, SpecExportContext, SpecExportJob,
    SpecExportJobUpdate, SpecExportModelDescriptor, SpecExportModelSchema, SpecExportReport,
    SpecExportRequest, SpecExtractOptions, SpecFieldDescriptor, SpecLocaleContext,
    SpecLocalizedText, SpecNewExportJob, SpecNormalizeOptions, SpecOrchestratorOptions,
    SpecPageRequest, SpecPageResult, SpecUploadRequest, SpecWorkerPoolOptions,
};
pub use store::{BlobStore, InMemoryTrackingStore, LocalBlobStore, TrackingStore};
pub use util::{derive_localized_text, derive_row_cells, normalize_cell_value};
