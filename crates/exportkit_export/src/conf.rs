//! Export pipeline constants.

use std::time::Duration;

////////////////////////////////////////////////////////////////////////////////
// #region Paging

/// Rows requested per page when the caller does not override it.
pub const N_PAGE_SIZE_DEFAULT: usize = 500;
/// First page index handed to page sources.
pub const N_PAGE_INDEX_FIRST: usize = 1;
/// Maximum rows per sheet (header included) before rolling over.
pub const N_ROWS_SHEET_CEILING_DEFAULT: usize = 1_000_000;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Naming

/// Model-level column width fallback.
pub const N_WIDTH_MODEL_DEFAULT: f64 = 20.0;
/// Locale whose translations back up the active locale.
pub const C_LOCALE_BASE_DEFAULT: &str = "zh-CN";
/// Prefix of generated file names when a model names nothing.
pub const C_FILE_NAME_UNNAMED_PREFIX: &str = "unnamed-";
/// Same prefix for Chinese locales.
pub const C_FILE_NAME_UNNAMED_PREFIX_ZH: &str = "未命名-";
/// Timestamp pattern appended to generated file names.
pub const C_FILE_NAME_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
/// Workbook file extension, dot included.
pub const C_FILE_EXTENSION_XLSX: &str = ".xlsx";

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValues

/// Date/time pattern used when a column declares none.
pub const C_DATE_FORMAT_DEFAULT: &str = "%Y-%m-%d %H:%M:%S";
/// Field names holding employee IDs (compared case-insensitively).
pub const TUP_EMPLOYEE_ID_FIELDS: [&str; 2] = ["empNo", "emplid"];
/// Largest integer an `f64` holds exactly (2^53).
pub const N_F64_SAFE_INTEGER_MAX: i64 = 9_007_199_254_740_992;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Orchestration

/// Stored job error messages are cut to this many characters.
pub const N_LEN_ERROR_MESSAGE_MAX: usize = 500;
/// Scratch sub-directory under the system temp dir.
pub const C_DIR_TEMP_NAME: &str = "exportkit";
/// Security level passed to the blob store for exported files.
pub const N_UPLOAD_SECURITY_LEVEL_DEFAULT: u8 = 1;
/// Message stored when a task ends without reporting an outcome.
pub const C_MSG_TASK_TERMINATED: &str = "Export task terminated unexpectedly.";

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WorkerPool

/// Tasks that may wait for a worker before the rejection policy applies.
pub const N_QUEUE_CAPACITY_DEFAULT: usize = 200;
/// How long shutdown waits for queued and running tasks.
pub const DUR_AWAIT_TERMINATION_DEFAULT: Duration = Duration::from_secs(60);
/// Worker thread name prefix.
pub const C_THREAD_NAME_PREFIX_DEFAULT: &str = "export-worker";

// #endregion
////////////////////////////////////////////////////////////////////////////////
