//! Export specification models, collaborator contracts and error types.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use exportkit_io_xlsx::{
    EnumHorizontalAlign, SpecSheetColumn, SpecSheetLayout, SpecXlsxWriteOptions, XlsxSheetError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conf::{
    C_DATE_FORMAT_DEFAULT, C_LOCALE_BASE_DEFAULT, C_THREAD_NAME_PREFIX_DEFAULT,
    DUR_AWAIT_TERMINATION_DEFAULT, N_LEN_ERROR_MESSAGE_MAX, N_PAGE_SIZE_DEFAULT,
    N_QUEUE_CAPACITY_DEFAULT, N_ROWS_SHEET_CEILING_DEFAULT, N_UPLOAD_SECURITY_LEVEL_DEFAULT,
    N_WIDTH_MODEL_DEFAULT, TUP_EMPLOYEE_ID_FIELDS,
};

/// Tracking-store identifier of an export job.
pub type JobId = u64;

////////////////////////////////////////////////////////////////////////////////
// #region FieldValues

/// Declared type of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFieldType {
    /// Text.
    String,
    /// Whole number.
    Integer,
    /// Floating point number.
    Float,
    /// Boolean flag.
    Boolean,
    /// Date with time of day.
    DateTime,
    /// Calendar date.
    Date,
}

/// Raw field value read from a record.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumFieldValue {
    /// Missing value.
    Null,
    /// Text value.
    String(String),
    /// Whole number.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean flag.
    Boolean(bool),
    /// Date with time of day.
    DateTime(NaiveDateTime),
    /// Calendar date.
    Date(NaiveDate),
}

impl From<&str> for EnumFieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EnumFieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for EnumFieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for EnumFieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for EnumFieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for EnumFieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<NaiveDateTime> for EnumFieldValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<NaiveDate> for EnumFieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl<T: Into<EnumFieldValue>> From<Option<T>> for EnumFieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Descriptors

/// Declared text plus per-locale translations.
///
/// `text` is the constant as declared on the model; `translations` maps a
/// locale tag (`en-US`, `zh-CN`, ...) to its variant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecLocalizedText {
    /// Declared text.
    pub text: String,
    /// Locale tag to translated text.
    pub translations: BTreeMap<String, String>,
}

impl SpecLocalizedText {
    /// Text with no translations; used for every locale.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            translations: BTreeMap::new(),
        }
    }

    /// Add a translation for `locale`.
    pub fn with_translation(mut self, locale: impl Into<String>, text: impl Into<String>) -> Self {
        self.translations.insert(locale.into(), text.into());
        self
    }

    /// `true` when the default text and every translation are blank.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.translations.values().all(|v| v.trim().is_empty())
    }
}

impl From<&str> for SpecLocalizedText {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Export metadata attached to one record field.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecColumnDescriptor {
    /// Display position; lower comes first.
    pub index: i32,
    /// Header text.
    pub title: SpecLocalizedText,
    /// Column width; the model width applies when `None`.
    pub width: Option<f64>,
    /// Body alignment.
    pub align: EnumHorizontalAlign,
    /// chrono strftime pattern for date/time values.
    pub date_format: Option<String>,
    /// Body row height. Only the first exported column's value is used.
    pub row_height: Option<f64>,
    /// Example cell text for import templates.
    pub example: SpecLocalizedText,
}

impl SpecColumnDescriptor {
    /// Column at `index` titled `title`. Lower indices come first; ties keep declaration order.
    pub fn new(index: i32, title: impl Into<SpecLocalizedText>) -> Self {
        Self {
            index,
            title: title.into(),
            width: None,
            align: EnumHorizontalAlign::General,
            date_format: None,
            row_height: None,
            example: SpecLocalizedText::default(),
        }
    }

    /// Column width in character units.
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_align(mut self, align: EnumHorizontalAlign) -> Self {
        self.align = align;
        self
    }

    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = Some(date_format.into());
        self
    }

    pub fn with_row_height(mut self, row_height: f64) -> Self {
        self.row_height = Some(row_height);
        self
    }

    pub fn with_example(mut self, example: impl Into<SpecLocalizedText>) -> Self {
        self.example = example.into();
        self
    }
}

/// One declared record field.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecFieldDescriptor {
    /// Field name as returned to [`ExportRecord::field_value`].
    pub field_name: String,
    /// Declared field type.
    pub field_type: EnumFieldType,
    /// Export metadata; `None` keeps the field out of every export.
    pub column: Option<SpecColumnDescriptor>,
}

impl SpecFieldDescriptor {
    /// Field read from records by `field_name`.
    ///
    /// Fields without a column are not exported.
    pub fn new(field_name: impl Into<String>, field_type: EnumFieldType) -> Self {
        Self {
            field_name: field_name.into(),
            field_type,
            column: None,
        }
    }

    /// Attach the column that exports this field.
    pub fn with_column(mut self, column: SpecColumnDescriptor) -> Self {
        self.column = Some(column);
        self
    }
}

/// Model-level export metadata for a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecExportModelDescriptor {
    /// Export center task type. Mandatory.
    pub task_type: String,
    /// Workbook file name.
    pub file_name: SpecLocalizedText,
    /// First sheet name.
    pub sheet_name: SpecLocalizedText,
    /// Instructions row for import templates.
    pub remark: SpecLocalizedText,
    /// Default column width.
    pub width: f64,
    /// Header row height.
    pub title_row_height: Option<f64>,
    /// Remark row height.
    pub remark_row_height: Option<f64>,
    /// Fields in declaration order.
    pub fields: Vec<SpecFieldDescriptor>,
}

impl SpecExportModelDescriptor {
    /// Descriptor for `task_type` with no names, remark or fields.
    ///
    /// Blank names are derived at extraction time, see
    /// [`derive_file_name`](crate::schema::derive_file_name).
    pub fn new(task_type: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            file_name: SpecLocalizedText::default(),
            sheet_name: SpecLocalizedText::default(),
            remark: SpecLocalizedText::default(),
            width: N_WIDTH_MODEL_DEFAULT,
            title_row_height: None,
            remark_row_height: None,
            fields: Vec::new(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<SpecLocalizedText>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn with_sheet_name(mut self, sheet_name: impl Into<SpecLocalizedText>) -> Self {
        self.sheet_name = sheet_name.into();
        self
    }

    pub fn with_remark(mut self, remark: impl Into<SpecLocalizedText>) -> Self {
        self.remark = remark.into();
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    pub fn with_title_row_height(mut self, height: f64) -> Self {
        self.title_row_height = Some(height);
        self
    }

    pub fn with_remark_row_height(mut self, height: f64) -> Self {
        self.remark_row_height = Some(height);
        self
    }

    /// Append a field; declaration order breaks column index ties.
    pub fn with_field(mut self, field: SpecFieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }
}

/// A record type that can be exported.
pub trait ExportRecord {
    /// Export metadata of the record type.
    fn descriptor() -> SpecExportModelDescriptor
    where
        Self: Sized;

    /// Value of the named field; [`EnumFieldValue::Null`] for unknown names.
    fn field_value(&self, field_name: &str) -> EnumFieldValue;
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExtractedSchema

/// Active locale plus the locale consulted when a translation is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecLocaleContext {
    /// Active locale tag.
    pub locale: String,
    /// Base-language locale tag.
    pub base_locale: String,
}

impl SpecLocaleContext {
    /// Context for `locale` with the default base locale.
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            base_locale: C_LOCALE_BASE_DEFAULT.to_string(),
        }
    }

    pub fn with_base_locale(mut self, base_locale: impl Into<String>) -> Self {
        self.base_locale = base_locale.into();
        self
    }
}

impl Default for SpecLocaleContext {
    fn default() -> Self {
        Self::new(C_LOCALE_BASE_DEFAULT)
    }
}

/// One resolved output column.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecColumnSchema {
    pub field_name: String,
    pub field_type: EnumFieldType,
    /// Header resolved for the active locale.
    pub header: String,
    pub width: f64,
    pub align: EnumHorizontalAlign,
    pub date_format: Option<String>,
    pub index: i32,
    /// Example cell resolved for the active locale (templates only).
    pub example: Option<String>,
}

/// Immutable per-export schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecExportModelSchema {
    pub task_type: String,
    /// File name with extension.
    pub file_name: String,
    pub sheet_name: String,
    pub title_row_height: Option<f64>,
    pub content_row_height: Option<f64>,
    /// Instructions row (templates only).
    pub remark: Option<String>,
    pub remark_row_height: Option<f64>,
    /// Columns in output order.
    pub columns: Vec<SpecColumnSchema>,
}

impl SpecExportModelSchema {
    /// Writer layout for sheets of this schema.
    pub fn to_sheet_layout(&self) -> SpecSheetLayout {
        SpecSheetLayout {
            columns: self
                .columns
                .iter()
                .map(|col| SpecSheetColumn {
                    header: col.header.clone(),
                    width: Some(col.width),
                    align: col.align,
                })
                .collect(),
            title_row_height: self.title_row_height,
            content_row_height: self.content_row_height,
            remark: self.remark.clone(),
            remark_row_height: self.remark_row_height,
        }
    }

    /// Example row when examples were resolved.
    pub fn example_row(&self) -> Option<Vec<String>> {
        self.columns
            .iter()
            .map(|col| col.example.clone())
            .collect::<Option<Vec<_>>>()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Field selection for schema extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExtractOptions {
    /// Fields removed from the export. Takes precedence over `fields_include`.
    pub fields_exclude: Vec<String>,
    /// Fields kept in the export; ignored when `fields_exclude` is non-empty.
    pub fields_include: Vec<String>,
    /// Resolve example row and remark (import templates).
    pub if_include_examples: bool,
    /// Employee-ID field names (compared case-insensitively).
    pub fields_employee_id: Vec<String>,
}

impl Default for SpecExtractOptions {
    fn default() -> Self {
        Self {
            fields_exclude: Vec::new(),
            fields_include: Vec::new(),
            if_include_examples: false,
            fields_employee_id: TUP_EMPLOYEE_ID_FIELDS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Cell value normalization policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecNormalizeOptions {
    /// Employee-ID field names (compared case-insensitively).
    pub fields_employee_id: Vec<String>,
    /// Pattern for date/time columns that declare none.
    pub date_format_default: String,
}

impl Default for SpecNormalizeOptions {
    fn default() -> Self {
        Self {
            fields_employee_id: TUP_EMPLOYEE_ID_FIELDS.iter().map(ToString::to_string).collect(),
            date_format_default: C_DATE_FORMAT_DEFAULT.to_string(),
        }
    }
}

/// Paged export driver options.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDriverOptions {
    /// Rows per page.
    pub page_size: usize,
    /// Maximum rows per sheet, header rows included.
    pub n_rows_sheet_ceiling: usize,
    /// Cell normalization policy.
    pub normalize: SpecNormalizeOptions,
}

impl Default for SpecDriverOptions {
    fn default() -> Self {
        Self {
            page_size: N_PAGE_SIZE_DEFAULT,
            n_rows_sheet_ceiling: N_ROWS_SHEET_CEILING_DEFAULT,
            normalize: SpecNormalizeOptions::default(),
        }
    }
}

/// Orchestrator options.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecOrchestratorOptions {
    /// Scratch directory for workbooks; `<system temp>/exportkit` when `None`.
    pub dir_temp: Option<PathBuf>,
    /// Locale consulted when the active locale has no translation.
    pub base_locale: String,
    /// Driver defaults; a request's page size overrides `driver.page_size`.
    pub driver: SpecDriverOptions,
    /// Workbook writer options.
    pub write_options: SpecXlsxWriteOptions,
    /// Blob store security level for uploaded files.
    pub upload_security_level: u8,
    /// Users the uploaded file is shared with.
    pub upload_shared_with: Vec<String>,
    /// Lifetime of uploaded files; kept forever when `None`.
    pub upload_ttl: Option<Duration>,
    /// Stored error messages are cut to this many characters.
    pub n_len_error_message_max: usize,
}

impl Default for SpecOrchestratorOptions {
    fn default() -> Self {
        Self {
            dir_temp: None,
            base_locale: C_LOCALE_BASE_DEFAULT.to_string(),
            driver: SpecDriverOptions::default(),
            write_options: SpecXlsxWriteOptions::default(),
            upload_security_level: N_UPLOAD_SECURITY_LEVEL_DEFAULT,
            upload_shared_with: Vec::new(),
            upload_ttl: None,
            n_len_error_message_max: N_LEN_ERROR_MESSAGE_MAX,
        }
    }
}

/// What the worker pool does with a task when its queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumRejectionPolicy {
    /// Reject with [`SchedulerError::Rejected`].
    Abort,
    /// Run the task on the submitting thread.
    #[default]
    CallerRuns,
    /// Drop the new task.
    Discard,
    /// Drop the oldest queued task and enqueue the new one.
    DiscardOldest,
}

impl FromStr for EnumRejectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let c_key: String = s
            .trim()
            .chars()
            .filter(|chr| !matches!(chr, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match c_key.trim_end_matches("policy") {
            "abort" => Ok(Self::Abort),
            "callerruns" => Ok(Self::CallerRuns),
            "discard" => Ok(Self::Discard),
            "discardoldest" => Ok(Self::DiscardOldest),
            _ => Err(format!("Unknown rejection policy: {s:?}")),
        }
    }
}

/// Worker pool options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecWorkerPoolOptions {
    /// Worker threads; CPU count + 1 when `None`.
    pub num_workers_max: Option<usize>,
    /// Tasks that may wait for a worker.
    pub queue_capacity: usize,
    /// Behavior when the queue is full.
    pub rule_rejection: EnumRejectionPolicy,
    /// Let queued and running tasks finish on shutdown.
    pub if_wait_for_tasks_on_shutdown: bool,
    /// Upper bound on the shutdown wait.
    pub dur_await_termination: Duration,
    /// Worker thread name prefix.
    pub thread_name_prefix: String,
}

impl Default for SpecWorkerPoolOptions {
    fn default() -> Self {
        Self {
            num_workers_max: None,
            queue_capacity: N_QUEUE_CAPACITY_DEFAULT,
            rule_rejection: EnumRejectionPolicy::default(),
            if_wait_for_tasks_on_shutdown: true,
            dur_await_termination: DUR_AWAIT_TERMINATION_DEFAULT,
            thread_name_prefix: C_THREAD_NAME_PREFIX_DEFAULT.to_string(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Paging

/// Page query handed to a [`PageSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecPageRequest {
    /// 1-based page index.
    pub page_index: usize,
    pub page_size: usize,
    /// Whether the source should compute a total count. Always `false`.
    pub if_search_count: bool,
}

/// One page of records.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecPageResult<T> {
    pub rows: Vec<T>,
}

impl<T> SpecPageResult<T> {
    /// Page holding `rows`.
    pub fn new(rows: Vec<T>) -> Self {
        Self { rows }
    }
}

/// Paginated data origin.
///
/// Must honor `page_index`/`page_size` and return a short or empty page only
/// at the true end of data.
pub trait PageSource<T>: Send {
    fn page(&mut self, request: &SpecPageRequest) -> Result<SpecPageResult<T>, ExportError>;
}

/// [`PageSource`] backed by a closure.
pub struct PageSourceFn<F>(pub F);

impl<T, F> PageSource<T> for PageSourceFn<F>
where
    F: FnMut(&SpecPageRequest) -> Result<SpecPageResult<T>, ExportError> + Send,
{
    fn page(&mut self, request: &SpecPageRequest) -> Result<SpecPageResult<T>, ExportError> {
        (self.0)(request)
    }
}

/// Small in-memory dataset written as one extra sheet after the paged data.
pub trait FixedSheet: Send {
    /// Export metadata of the rows.
    fn descriptor(&self) -> SpecExportModelDescriptor;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Value of `field_name` on row `idx_row`.
    fn field_value(&self, idx_row: usize, field_name: &str) -> EnumFieldValue;
}

impl<S: ExportRecord + Send> FixedSheet for Vec<S> {
    fn descriptor(&self) -> SpecExportModelDescriptor {
        S::descriptor()
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn field_value(&self, idx_row: usize, field_name: &str) -> EnumFieldValue {
        self.get(idx_row)
            .map_or(EnumFieldValue::Null, |row| row.field_value(field_name))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Requests

/// Identity and locale of the user who requested an export.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecExportContext {
    /// Account id; owns the job and the uploaded file.
    pub user_id: String,
    pub user_name: String,
    /// Active locale tag.
    pub locale: String,
}

impl SpecExportContext {
    /// Context of the user submitting an export.
    pub fn new(
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            locale: locale.into(),
        }
    }
}

/// One export submission.
pub struct SpecExportRequest<T> {
    pub page_source: Box<dyn PageSource<T>>,
    /// Overrides the orchestrator's default page size.
    pub page_size: Option<usize>,
    pub extract: SpecExtractOptions,
    /// Extra sheet written after the paged data.
    pub secondary: Option<Box<dyn FixedSheet>>,
}

impl<T> SpecExportRequest<T> {
    /// Request reading from `page_source` with the default page size.
    pub fn new(page_source: impl PageSource<T> + 'static) -> Self {
        Self {
            page_source: Box::new(page_source),
            page_size: None,
            extract: SpecExtractOptions::default(),
            secondary: None,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_extract_options(mut self, extract: SpecExtractOptions) -> Self {
        self.extract = extract;
        self
    }

    pub fn with_fields_exclude(mut self, fields: &[&str]) -> Self {
        self.extract.fields_exclude = fields.iter().map(ToString::to_string).collect();
        self
    }

    pub fn with_fields_include(mut self, fields: &[&str]) -> Self {
        self.extract.fields_include = fields.iter().map(ToString::to_string).collect();
        self
    }

    /// In-memory sheet written after the paged data.
    pub fn with_secondary<S: ExportRecord + Send + 'static>(mut self, rows: Vec<S>) -> Self {
        self.secondary = Some(Box::new(rows));
        self
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Jobs

/// Export job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumExportStatus {
    Pending,
    Success,
    Failed,
}

impl EnumExportStatus {
    /// `Success` and `Failed` are terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Tracking record of one export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecExportJob {
    pub job_id: JobId,
    pub task_type: String,
    pub file_name: String,
    pub description: String,
    pub owner_id: String,
    pub owner_name: String,
    pub status: EnumExportStatus,
    pub file_id: Option<String>,
    pub error_message: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Tracking record insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecNewExportJob {
    pub task_type: String,
    pub file_name: String,
    pub description: String,
    pub owner_id: String,
    pub owner_name: String,
    pub start_time: DateTime<Utc>,
}

/// Terminal tracking record update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExportJobUpdate {
    pub job_id: JobId,
    pub status: EnumExportStatus,
    pub file_id: Option<String>,
    pub error_message: Option<String>,
    pub end_time: DateTime<Utc>,
}

/// Blob upload metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecUploadRequest {
    pub file_name: String,
    pub size_bytes: u64,
    pub owner_id: String,
    pub security_level: u8,
    pub shared_with: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Outcome of one paged export.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecExportReport {
    /// Page fetches, the terminating short/empty page included.
    pub n_pages_fetched: usize,
    /// Data rows written to the paged sheets.
    pub n_rows_written: usize,
    /// Sheet names in workbook order, secondary sheet included.
    pub sheets: Vec<String>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Export pipeline failures.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Missing mandatory metadata or invalid options.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Page fetch failed.
    #[error("Data source error: {0}")]
    DataSource(String),
    /// Workbook encoding failed.
    #[error(transparent)]
    Encoding(#[from] XlsxSheetError),
    /// Blob store rejected or failed the upload.
    #[error("Upload failed: {0}")]
    Upload(String),
    /// Tracking store failure.
    #[error("Tracking store error: {0}")]
    Tracking(String),
    /// Scratch file allocation or IO failure.
    #[error("Temp file error: {0}")]
    TempFile(#[from] std::io::Error),
    /// Task rejected by the scheduler.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Scheduler admission failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Queue full under [`EnumRejectionPolicy::Abort`].
    #[error("Task {0:?} rejected: worker queue is full.")]
    Rejected(String),
    /// Task dropped by a discard policy.
    #[error("Task {0:?} discarded: worker queue is full.")]
    Discarded(String),
    /// Pool no longer accepts or runs tasks.
    #[error("Task {0:?} not run: worker pool is shut down.")]
    ShutDown(String),
    /// Pool could not be built.
    #[error("Worker pool initialization failed: {0}")]
    Init(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
