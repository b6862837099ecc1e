//! Tracking-record and blob-store collaborators plus reference implementations.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use log::debug;
use uuid::Uuid;

use crate::spec::{
    EnumExportStatus, ExportError, JobId, SpecExportJob, SpecExportJobUpdate, SpecNewExportJob,
    SpecUploadRequest,
};
use crate::util::sanitize_file_stem;

////////////////////////////////////////////////////////////////////////////////
// #region Contracts

/// Persistence of export job records.
pub trait TrackingStore: Send + Sync {
    /// Insert a `Pending` job and return its id.
    fn create_job(&self, job: &SpecNewExportJob) -> Result<JobId, ExportError>;
    /// Apply a terminal status update.
    fn update_job(&self, update: &SpecExportJobUpdate) -> Result<(), ExportError>;
    fn find_job(&self, job_id: JobId) -> Result<Option<SpecExportJob>, ExportError>;
}

/// File storage service receiving finished workbooks.
pub trait BlobStore: Send + Sync {
    /// Store `content` and return the new file id.
    fn upload(
        &self,
        request: &SpecUploadRequest,
        content: &mut dyn Read,
    ) -> Result<String, ExportError>;
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region InMemoryTrackingStore

#[derive(Default)]
struct SpecTrackingState {
    n_job_id_last: JobId,
    dict_jobs: BTreeMap<JobId, SpecExportJob>,
}

/// Process-local tracking store.
///
/// Rejects a second terminal update of the same job.
#[derive(Default)]
pub struct InMemoryTrackingStore {
    state: Mutex<SpecTrackingState>,
}

impl InMemoryTrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All jobs ordered by id.
    pub fn jobs(&self) -> Vec<SpecExportJob> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.dict_jobs.values().cloned().collect()
    }
}

impl TrackingStore for InMemoryTrackingStore {
    fn create_job(&self, job: &SpecNewExportJob) -> Result<JobId, ExportError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.n_job_id_last += 1;
        let job_id = state.n_job_id_last;
        state.dict_jobs.insert(
            job_id,
            SpecExportJob {
                job_id,
                task_type: job.task_type.clone(),
                file_name: job.file_name.clone(),
                description: job.description.clone(),
                owner_id: job.owner_id.clone(),
                owner_name: job.owner_name.clone(),
                status: EnumExportStatus::Pending,
                file_id: None,
                error_message: None,
                start_time: job.start_time,
                end_time: None,
            },
        );
        Ok(job_id)
    }

    fn update_job(&self, update: &SpecExportJobUpdate) -> Result<(), ExportError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let job = state
            .dict_jobs
            .get_mut(&update.job_id)
            .ok_or_else(|| ExportError::Tracking(format!("Unknown job id: {}", update.job_id)))?;
        if job.status.is_terminal() {
            return Err(ExportError::Tracking(format!(
                "Job {} already finished as {:?}.",
                update.job_id, job.status
            )));
        }

        job.status = update.status;
        job.file_id = update.file_id.clone();
        job.error_message = update.error_message.clone();
        job.end_time = Some(update.end_time);
        Ok(())
    }

    fn find_job(&self, job_id: JobId) -> Result<Option<SpecExportJob>, ExportError> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(state.dict_jobs.get(&job_id).cloned())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region LocalBlobStore

/// Blob store that copies uploads into a local directory.
///
/// Each file is stored as `<uuid>_<file name>`; the UUID is the file id.
pub struct LocalBlobStore {
    dir_root: PathBuf,
    dict_paths: Mutex<BTreeMap<String, PathBuf>>,
}

impl LocalBlobStore {
    /// Use `dir_root` as storage, creating it when missing.
    pub fn new(dir_root: impl AsRef<Path>) -> io::Result<Self> {
        fs::create_dir_all(dir_root.as_ref())?;
        Ok(Self {
            dir_root: dir_root.as_ref().to_path_buf(),
            dict_paths: Mutex::new(BTreeMap::new()),
        })
    }

    /// Stored path of `file_id`.
    pub fn path_of(&self, file_id: &str) -> Option<PathBuf> {
        let dict_paths = self.dict_paths.lock().unwrap_or_else(PoisonError::into_inner);
        dict_paths.get(file_id).cloned()
    }
}

impl BlobStore for LocalBlobStore {
    fn upload(
        &self,
        request: &SpecUploadRequest,
        content: &mut dyn Read,
    ) -> Result<String, ExportError> {
        let c_file_id = Uuid::new_v4().to_string();
        let path_dst = self.dir_root.join(format!(
            "{c_file_id}_{}",
            sanitize_file_stem(&request.file_name)
        ));

        let mut file_dst =
            File::create(&path_dst).map_err(|err| ExportError::Upload(err.to_string()))?;
        let n_bytes =
            io::copy(content, &mut file_dst).map_err(|err| ExportError::Upload(err.to_string()))?;
        if n_bytes != request.size_bytes {
            let _ = fs::remove_file(&path_dst);
            return Err(ExportError::Upload(format!(
                "Expected {} bytes but received {n_bytes}.",
                request.size_bytes
            )));
        }

        debug!(
            "stored {n_bytes} bytes for owner {:?} as {}",
            request.owner_id,
            path_dst.display()
        );
        let mut dict_paths = self.dict_paths.lock().unwrap_or_else(PoisonError::into_inner);
        dict_paths.insert(c_file_id.clone(), path_dst);
        Ok(c_file_id)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn derive_new_job() -> SpecNewExportJob {
        SpecNewExportJob {
            task_type: "EMPLOYEE_EXPORT".to_string(),
            file_name: "employees.xlsx".to_string(),
            description: "employees.xlsx".to_string(),
            owner_id: "u1".to_string(),
            owner_name: "Ada".to_string(),
            start_time: Utc::now(),
        }
    }

    #[test]
    fn test_tracking_store_allows_exactly_one_terminal_update() {
        let store = InMemoryTrackingStore::new();
        let job_id = store.create_job(&derive_new_job()).unwrap();
        assert_eq!(
            store.find_job(job_id).unwrap().unwrap().status,
            EnumExportStatus::Pending
        );

        let update = SpecExportJobUpdate {
            job_id,
            status: EnumExportStatus::Success,
            file_id: Some("f1".to_string()),
            error_message: None,
            end_time: Utc::now(),
        };
        store.update_job(&update).unwrap();
        assert!(matches!(
            store.update_job(&update),
            Err(ExportError::Tracking(_))
        ));

        let job = store.find_job(job_id).unwrap().unwrap();
        assert_eq!(job.status, EnumExportStatus::Success);
        assert_eq!(job.file_id.as_deref(), Some("f1"));
        assert!(job.end_time.is_some());
        assert!(store.find_job(job_id + 1).unwrap().is_none());
    }

    #[test]
    fn test_local_blob_store_copies_content() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir_tmp.path().join("blobs")).unwrap();

        let v_content = b"workbook bytes".to_vec();
        let request = SpecUploadRequest {
            file_name: "employees.xlsx".to_string(),
            size_bytes: v_content.len() as u64,
            owner_id: "u1".to_string(),
            security_level: 1,
            shared_with: Vec::new(),
            expires_at: None,
        };
        let c_file_id = store.upload(&request, &mut v_content.as_slice()).unwrap();

        let path_stored = store.path_of(&c_file_id).unwrap();
        assert_eq!(fs::read(path_stored).unwrap(), v_content);
    }

    #[test]
    fn test_local_blob_store_rejects_truncated_content() {
        let dir_tmp = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir_tmp.path()).unwrap();

        let request = SpecUploadRequest {
            file_name: "x.xlsx".to_string(),
            size_bytes: 100,
            owner_id: "u1".to_string(),
            security_level: 1,
            shared_with: Vec::new(),
            expires_at: None,
        };
        let err = store.upload(&request, &mut &b"short"[..]).unwrap_err();
        assert!(matches!(err, ExportError::Upload(_)));
    }
}
