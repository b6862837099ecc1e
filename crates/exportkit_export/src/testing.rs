//! Shared test fixtures.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{NaiveDate, NaiveDateTime};
use exportkit_io_xlsx::EnumHorizontalAlign;

use crate::spec::{
    EnumFieldType, EnumFieldValue, ExportError, ExportRecord, PageSource, SpecColumnDescriptor,
    SpecExportModelDescriptor, SpecFieldDescriptor, SpecLocalizedText, SpecPageRequest,
    SpecPageResult,
};

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Employee {
    pub emp_no: String,
    pub name: String,
    pub department: Option<String>,
    pub salary: f64,
    pub hired_at: NaiveDateTime,
    pub internal_note: String,
}

impl ExportRecord for Employee {
    fn descriptor() -> SpecExportModelDescriptor {
        // Declared out of display order on purpose.
        SpecExportModelDescriptor::new("EMPLOYEE_EXPORT")
            .with_file_name(SpecLocalizedText::new("员工").with_translation("en-US", "employees"))
            .with_sheet_name(SpecLocalizedText::new("员工").with_translation("en-US", "Employees"))
            .with_remark(
                SpecLocalizedText::new("每行一名员工")
                    .with_translation("en-US", "One employee per row."),
            )
            .with_width(25.0)
            .with_title_row_height(24.0)
            .with_remark_row_height(40.0)
            .with_field(
                SpecFieldDescriptor::new("salary", EnumFieldType::Float).with_column(
                    SpecColumnDescriptor::new(
                        3,
                        SpecLocalizedText::new("薪资").with_translation("en-US", "Salary"),
                    )
                    .with_align(EnumHorizontalAlign::Right),
                ),
            )
            .with_field(
                SpecFieldDescriptor::new("empNo", EnumFieldType::String).with_column(
                    SpecColumnDescriptor::new(
                        0,
                        SpecLocalizedText::new("工号").with_translation("en-US", "Employee No."),
                    )
                    .with_width(15.0)
                    .with_row_height(18.0)
                    .with_example("100234"),
                ),
            )
            .with_field(SpecFieldDescriptor::new("internalNote", EnumFieldType::String))
            .with_field(
                SpecFieldDescriptor::new("name", EnumFieldType::String).with_column(
                    SpecColumnDescriptor::new(
                        1,
                        SpecLocalizedText::new("姓名").with_translation("en-US", "Name"),
                    )
                    .with_row_height(30.0)
                    .with_example("Ada Lovelace"),
                ),
            )
            .with_field(
                SpecFieldDescriptor::new("department", EnumFieldType::String).with_column(
                    SpecColumnDescriptor::new(
                        2,
                        SpecLocalizedText::new("部门").with_translation("en-US", "Department"),
                    ),
                ),
            )
            .with_field(
                SpecFieldDescriptor::new("hiredAt", EnumFieldType::DateTime).with_column(
                    SpecColumnDescriptor::new(
                        4,
                        SpecLocalizedText::new("入职时间").with_translation("en-US", "Hired At"),
                    )
                    .with_date_format("%Y-%m-%d"),
                ),
            )
    }

    fn field_value(&self, field_name: &str) -> EnumFieldValue {
        match field_name {
            "empNo" => self.emp_no.clone().into(),
            "name" => self.name.clone().into(),
            "department" => self.department.clone().into(),
            "salary" => self.salary.into(),
            "hiredAt" => self.hired_at.into(),
            "internalNote" => self.internal_note.clone().into(),
            _ => EnumFieldValue::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Department {
    pub code: String,
    pub name: String,
}

impl ExportRecord for Department {
    fn descriptor() -> SpecExportModelDescriptor {
        SpecExportModelDescriptor::new("DEPARTMENT_LIST")
            .with_sheet_name(
                SpecLocalizedText::new("部门").with_translation("en-US", "Departments"),
            )
            .with_field(
                SpecFieldDescriptor::new("code", EnumFieldType::String).with_column(
                    SpecColumnDescriptor::new(
                        0,
                        SpecLocalizedText::new("编码").with_translation("en-US", "Code"),
                    ),
                ),
            )
            .with_field(
                SpecFieldDescriptor::new("name", EnumFieldType::String).with_column(
                    SpecColumnDescriptor::new(
                        1,
                        SpecLocalizedText::new("名称").with_translation("en-US", "Name"),
                    ),
                ),
            )
    }

    fn field_value(&self, field_name: &str) -> EnumFieldValue {
        match field_name {
            "code" => self.code.clone().into(),
            "name" => self.name.clone().into(),
            _ => EnumFieldValue::Null,
        }
    }
}

pub(crate) fn derive_employees(n_rows: usize) -> Vec<Employee> {
    let dt_hired = NaiveDate::from_ymd_opt(2020, 1, 15)
        .and_then(|date| date.and_hms_opt(9, 30, 0))
        .unwrap_or_default();
    (0..n_rows)
        .map(|n_idx| Employee {
            emp_no: format!("{}", 100_000 + n_idx),
            name: format!("Employee {n_idx}"),
            department: (n_idx % 3 != 0).then(|| format!("D{}", n_idx % 3)),
            salary: 1000.0 + n_idx as f64,
            hired_at: dt_hired,
            internal_note: "secret".to_string(),
        })
        .collect()
}

pub(crate) fn derive_departments() -> Vec<Department> {
    vec![
        Department {
            code: "D1".to_string(),
            name: "Research".to_string(),
        },
        Department {
            code: "D2".to_string(),
            name: "Sales".to_string(),
        },
    ]
}

/// Page source over an in-memory vector that counts fetches.
pub(crate) struct VecPageSource<T> {
    rows: Vec<T>,
    n_calls: Arc<AtomicUsize>,
    fail_on_page: Option<usize>,
    l_requests: Vec<SpecPageRequest>,
}

impl<T> VecPageSource<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self {
            rows,
            n_calls: Arc::new(AtomicUsize::new(0)),
            fail_on_page: None,
            l_requests: Vec::new(),
        }
    }

    pub fn with_failure_on_page(mut self, page_index: usize) -> Self {
        self.fail_on_page = Some(page_index);
        self
    }

    /// Shared fetch counter, readable after the source moved into a task.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.n_calls)
    }

    pub fn requests(&self) -> &[SpecPageRequest] {
        &self.l_requests
    }
}

impl<T: Clone + Send> PageSource<T> for VecPageSource<T> {
    fn page(&mut self, request: &SpecPageRequest) -> Result<SpecPageResult<T>, ExportError> {
        self.n_calls.fetch_add(1, Ordering::SeqCst);
        self.l_requests.push(*request);
        if self.fail_on_page == Some(request.page_index) {
            return Err(ExportError::DataSource(format!(
                "page {} unavailable",
                request.page_index
            )));
        }

        let n_start = (request.page_index - 1) * request.page_size;
        let n_end = usize::min(self.rows.len(), n_start + request.page_size);
        let l_rows = if n_start < n_end {
            self.rows[n_start..n_end].to_vec()
        } else {
            Vec::new()
        };
        Ok(SpecPageResult::new(l_rows))
    }
}
