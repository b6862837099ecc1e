//! Export task orchestration: job tracking, background execution, upload.

use std::fs::{self, File};
use std::sync::Arc;

use chrono::Utc;
use exportkit_io_xlsx::XlsxSheetWriter;
use log::{error, info, warn};
use tempfile::{Builder, NamedTempFile};

use crate::conf::{C_DIR_TEMP_NAME, C_FILE_EXTENSION_XLSX, C_MSG_TASK_TERMINATED};
use crate::driver::{SpecFixedSheet, run_paged_export};
use crate::scheduler::{ScheduledTask, TaskScheduler};
use crate::schema::extract_export_model;
use crate::spec::{
    EnumExportStatus, ExportError, ExportRecord, FixedSheet, JobId, PageSource, SchedulerError,
    SpecDriverOptions, SpecExportContext, SpecExportJob, SpecExportJobUpdate,
    SpecExportModelSchema, SpecExportRequest, SpecExtractOptions, SpecLocaleContext,
    SpecNewExportJob, SpecOrchestratorOptions, SpecUploadRequest,
};
use crate::store::{BlobStore, TrackingStore};
use crate::util::{sanitize_file_stem, truncate_message};

////////////////////////////////////////////////////////////////////////////////
// #region JobFinalizer

/// Writes the terminal status of a job exactly once, when dropped.
///
/// `outcome` holds the file id on success and the error text on failure. A
/// finalizer dropped without an outcome (the task panicked) marks the job as
/// failed with a generic message.
struct JobFinalizer {
    tracking: Arc<dyn TrackingStore>,
    job_id: JobId,
    n_len_error_message_max: usize,
    outcome: Option<Result<String, String>>,
}

impl Drop for JobFinalizer {
    fn drop(&mut self) {
        let outcome = self
            .outcome
            .take()
            .unwrap_or_else(|| Err(C_MSG_TASK_TERMINATED.to_string()));
        let update = match outcome {
            Ok(c_file_id) => SpecExportJobUpdate {
                job_id: self.job_id,
                status: EnumExportStatus::Success,
                file_id: Some(c_file_id),
                error_message: None,
                end_time: Utc::now(),
            },
            Err(c_msg) => SpecExportJobUpdate {
                job_id: self.job_id,
                status: EnumExportStatus::Failed,
                file_id: None,
                error_message: Some(truncate_message(&c_msg, self.n_len_error_message_max)),
                end_time: Utc::now(),
            },
        };
        if let Err(err) = self.tracking.update_job(&update) {
            error!(
                "failed to record {:?} for job {}: {err}",
                update.status, self.job_id
            );
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportTask

/// Everything one background export needs, moved onto a worker.
struct ExportTask<T> {
    job_id: JobId,
    owner_id: String,
    schema: SpecExportModelSchema,
    ctx_locale: SpecLocaleContext,
    page_source: Box<dyn PageSource<T>>,
    secondary: Option<Box<dyn FixedSheet>>,
    driver: SpecDriverOptions,
    tracking: Arc<dyn TrackingStore>,
    blobs: Arc<dyn BlobStore>,
    options: SpecOrchestratorOptions,
}

impl<T: ExportRecord> ExportTask<T> {
    fn finalizer(&self) -> JobFinalizer {
        JobFinalizer {
            tracking: Arc::clone(&self.tracking),
            job_id: self.job_id,
            n_len_error_message_max: self.options.n_len_error_message_max,
            outcome: None,
        }
    }

    fn create_temp_file(&self) -> Result<NamedTempFile, ExportError> {
        let dir_temp = self
            .options
            .dir_temp
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(C_DIR_TEMP_NAME));
        fs::create_dir_all(&dir_temp)?;
        let c_prefix = format!(
            "{}_{}_",
            sanitize_file_stem(&self.schema.task_type),
            sanitize_file_stem(&self.owner_id)
        );
        Ok(Builder::new()
            .prefix(&c_prefix)
            .suffix(C_FILE_EXTENSION_XLSX)
            .tempfile_in(&dir_temp)?)
    }

    /// Write the workbook into a scratch file and upload it. Returns the
    /// file id. The scratch file is removed when this returns.
    fn execute(&mut self) -> Result<String, ExportError> {
        let file_temp = self.create_temp_file()?;
        let mut writer =
            XlsxSheetWriter::open(file_temp.path(), self.options.write_options.clone());

        let schema_secondary = match self.secondary.as_deref() {
            Some(rows) => Some(extract_export_model(
                &rows.descriptor(),
                &SpecExtractOptions::default(),
                &self.ctx_locale,
            )?),
            None => None,
        };
        let secondary = match (schema_secondary.as_ref(), self.secondary.as_deref()) {
            (Some(schema), Some(rows)) => Some(SpecFixedSheet { schema, rows }),
            _ => None,
        };

        let report = run_paged_export(
            &self.schema,
            self.page_source.as_mut(),
            secondary,
            &mut writer,
            &self.driver,
        )?;
        let report_xlsx = writer.finish()?;
        for c_warning in &report_xlsx.warnings {
            warn!("job {}: {c_warning}", self.job_id);
        }

        let n_size_bytes = fs::metadata(file_temp.path())?.len();
        let request = SpecUploadRequest {
            file_name: self.schema.file_name.clone(),
            size_bytes: n_size_bytes,
            owner_id: self.owner_id.clone(),
            security_level: self.options.upload_security_level,
            shared_with: self.options.upload_shared_with.clone(),
            expires_at: self
                .options
                .upload_ttl
                .and_then(|dur| chrono::Duration::from_std(dur).ok())
                .map(|dur| Utc::now() + dur),
        };
        let mut file_content: File = file_temp.reopen()?;
        let c_file_id = self.blobs.upload(&request, &mut file_content)?;
        if c_file_id.trim().is_empty() {
            return Err(ExportError::Upload(
                "Failed to upload the exported file.".to_string(),
            ));
        }

        info!(
            "job {}: uploaded {:?} ({n_size_bytes} bytes, {} rows, sheets {:?}) as {c_file_id}",
            self.job_id, self.schema.file_name, report.n_rows_written, report.sheets
        );
        Ok(c_file_id)
    }
}

impl<T: ExportRecord + 'static> ScheduledTask for ExportTask<T> {
    fn label(&self) -> String {
        format!("{}#{}", self.schema.task_type, self.job_id)
    }

    fn run(mut self: Box<Self>) {
        let mut finalizer = self.finalizer();
        let outcome = self.execute();
        if let Err(err) = &outcome {
            error!("job {} failed: {err}", self.job_id);
        }
        finalizer.outcome = Some(outcome.map_err(|err| err.to_string()));
    }

    fn discard(self: Box<Self>, err: SchedulerError) {
        let mut finalizer = self.finalizer();
        finalizer.outcome = Some(Err(err.to_string()));
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportOrchestrator

/// Accepts export requests and runs them in the background.
///
/// Each accepted request gets a `Pending` job that ends as exactly one of
/// `Success` (with a file id) or `Failed` (with an error message).
pub struct ExportOrchestrator {
    tracking: Arc<dyn TrackingStore>,
    blobs: Arc<dyn BlobStore>,
    scheduler: Arc<dyn TaskScheduler>,
    options: SpecOrchestratorOptions,
}

impl ExportOrchestrator {
    pub fn new(
        tracking: Arc<dyn TrackingStore>,
        blobs: Arc<dyn BlobStore>,
        scheduler: Arc<dyn TaskScheduler>,
        options: SpecOrchestratorOptions,
    ) -> Self {
        Self {
            tracking,
            blobs,
            scheduler,
            options,
        }
    }

    /// Register a job for `request` and schedule it. Returns the job id
    /// without waiting for the export.
    ///
    /// Schema problems fail here, before any job exists. A scheduler
    /// rejection marks the job `Failed` and is returned as an error.
    pub fn submit<T: ExportRecord + 'static>(
        &self,
        context: &SpecExportContext,
        request: SpecExportRequest<T>,
    ) -> Result<JobId, ExportError> {
        let ctx_locale = SpecLocaleContext::new(context.locale.clone())
            .with_base_locale(self.options.base_locale.clone());
        let schema = extract_export_model(&T::descriptor(), &request.extract, &ctx_locale)?;

        let job_id = self.tracking.create_job(&SpecNewExportJob {
            task_type: schema.task_type.clone(),
            file_name: schema.file_name.clone(),
            description: schema.file_name.clone(),
            owner_id: context.user_id.clone(),
            owner_name: context.user_name.clone(),
            start_time: Utc::now(),
        })?;
        info!(
            "job {job_id}: {:?} submitted by {:?}",
            schema.task_type, context.user_id
        );

        let mut driver = self.options.driver.clone();
        if let Some(n_page_size) = request.page_size {
            driver.page_size = n_page_size;
        }
        let task = ExportTask {
            job_id,
            owner_id: context.user_id.clone(),
            schema,
            ctx_locale,
            page_source: request.page_source,
            secondary: request.secondary,
            driver,
            tracking: Arc::clone(&self.tracking),
            blobs: Arc::clone(&self.blobs),
            options: self.options.clone(),
        };
        self.scheduler.submit(Box::new(task))?;
        Ok(job_id)
    }

    /// Tracking record of `job_id`.
    pub fn job(&self, job_id: JobId) -> Result<Option<SpecExportJob>, ExportError> {
        self.tracking.find_job(job_id)
    }

    pub fn options(&self) -> &SpecOrchestratorOptions {
        &self.options
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
