//! Draft job model behind the "new job" form.
//!
//! The form keeps one detail record per job type so that flipping the type
//! selector back and forth never loses what the user typed. Only the record
//! for the selected type is ever serialized into `jobData`.
//!
//! Numeric inputs are held as text, the way the input surface edits them,
//! and coerced to integers on [`JobForm::submit`].

use std::str::FromStr;

use serde::Serialize;

use super::models::{HttpMethod, JobType};

/// Errors raised while assembling the create-job payload.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("{field} must be a whole number, got {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("failed to encode {blob}: {source}")]
    Encode {
        blob: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Body of `POST /api/jobs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub name: String,
    pub owner: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub description: String,
    pub schedule: String,
    pub is_recurring: bool,
    pub max_retries: i32,
    /// JSON-encoded [`JobData`]; opaque to everything but the scheduler.
    pub job_data: String,
    /// JSON-encoded [`RetryConfig`].
    pub config: String,
}

/// Type-specific execution payload. Each variant carries only its own keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JobData {
    Http {
        url: String,
        method: HttpMethod,
        timeout: u32,
    },
    Shell {
        script: String,
    },
    Java {
        #[serde(rename = "className")]
        class_name: String,
    },
    Python {
        script: String,
        #[serde(rename = "scriptPath")]
        script_path: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    pub retry_delay_seconds: u32,
}

/// Fields shared by every job type.
#[derive(Debug, Clone, PartialEq)]
pub struct CommonFields {
    pub name: String,
    pub owner: String,
    pub job_type: JobType,
    pub description: String,
    /// Cron expression when recurring, ISO-8601 date-time otherwise.
    /// Passed through untouched.
    pub schedule: String,
    pub is_recurring: bool,
    pub max_retries: String,
}

impl Default for CommonFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            owner: String::new(),
            job_type: JobType::HttpRequest,
            description: String::new(),
            schedule: String::new(),
            is_recurring: false,
            max_retries: "3".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpDetails {
    pub url: String,
    pub method: HttpMethod,
    pub timeout: String,
}

impl Default for HttpDetails {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: HttpMethod::Get,
            timeout: "60".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShellDetails {
    pub script: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JavaDetails {
    pub class_name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PythonDetails {
    pub script_path: String,
    pub script: String,
}

/// Per-type detail records, all retained while the form is open.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailCache {
    pub http: HttpDetails,
    pub shell: ShellDetails,
    pub java: JavaDetails,
    pub python: PythonDetails,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdvancedOptions {
    /// Disclosure state; the retry delay is submitted either way.
    pub open: bool,
    pub retry_delay: String,
}

impl Default for AdvancedOptions {
    fn default() -> Self {
        Self {
            open: false,
            retry_delay: "5".to_string(),
        }
    }
}

/// An editable field of the form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Owner,
    Type,
    Url,
    Method,
    Timeout,
    ShellScript,
    ClassName,
    PythonScriptPath,
    PythonScript,
    Recurring,
    Schedule,
    Advanced,
    MaxRetries,
    RetryDelay,
    Description,
}

/// How a field is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Choice,
    Toggle,
}

impl FormField {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Type | Self::Method => FieldKind::Choice,
            Self::Recurring | Self::Advanced => FieldKind::Toggle,
            Self::Timeout | Self::MaxRetries | Self::RetryDelay => FieldKind::Number,
            _ => FieldKind::Text,
        }
    }
}

/// The draft job being edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobForm {
    pub common: CommonFields,
    pub details: DetailCache,
    pub advanced: AdvancedOptions,
}

impl JobForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_type(&self) -> JobType {
        self.common.job_type
    }

    /// Switch the active detail record. Cached records are kept.
    pub fn select_type(&mut self, job_type: JobType) {
        self.common.job_type = job_type;
    }

    pub fn toggle_advanced(&mut self) {
        self.advanced.open = !self.advanced.open;
    }

    pub fn schedule_label(&self) -> &'static str {
        if self.common.is_recurring {
            "Cron Expression"
        } else {
            "Run At (ISO Date)"
        }
    }

    pub fn schedule_placeholder(&self) -> &'static str {
        if self.common.is_recurring {
            "0 0 12 * * ?"
        } else {
            "2023-12-31T23:59:00"
        }
    }

    /// Fields currently presented, in order.
    pub fn visible_fields(&self) -> Vec<FormField> {
        let mut fields = vec![FormField::Name, FormField::Owner, FormField::Type];
        fields.extend_from_slice(match self.job_type() {
            JobType::HttpRequest => &[FormField::Url, FormField::Method, FormField::Timeout][..],
            JobType::ShellScript => &[FormField::ShellScript],
            JobType::JavaClass => &[FormField::ClassName],
            JobType::PythonScript => &[FormField::PythonScriptPath, FormField::PythonScript],
        });
        fields.extend([FormField::Recurring, FormField::Schedule, FormField::Advanced]);
        if self.advanced.open {
            fields.extend([
                FormField::MaxRetries,
                FormField::RetryDelay,
                FormField::Description,
            ]);
        }
        fields
    }

    pub fn label(&self, field: FormField) -> &'static str {
        match field {
            FormField::Name => "Job Name",
            FormField::Owner => "Owner",
            FormField::Type => "Type",
            FormField::Url => "URL",
            FormField::Method => "Method",
            FormField::Timeout => "Timeout (sec)",
            FormField::ShellScript => "Script Command",
            FormField::ClassName => "Class Name",
            FormField::PythonScriptPath => "Script Path",
            FormField::PythonScript => "Inline Script",
            FormField::Recurring => "Recurring Job",
            FormField::Schedule => self.schedule_label(),
            FormField::Advanced => "Advanced Options",
            FormField::MaxRetries => "Max Retries",
            FormField::RetryDelay => "Retry Delay (sec)",
            FormField::Description => "Description",
        }
    }

    /// Current display value of a field.
    pub fn value(&self, field: FormField) -> String {
        match field {
            FormField::Type => self.job_type().to_string(),
            FormField::Method => self.details.http.method.to_string(),
            FormField::Recurring => yes_no(self.common.is_recurring).to_string(),
            FormField::Advanced => (if self.advanced.open { "shown" } else { "hidden" }).to_string(),
            text => self.text(text).map(str::to_string).unwrap_or_default(),
        }
    }

    /// Borrow the text buffer behind a text or number field.
    pub fn text(&self, field: FormField) -> Option<&str> {
        let s = match field {
            FormField::Name => &self.common.name,
            FormField::Owner => &self.common.owner,
            FormField::Url => &self.details.http.url,
            FormField::Timeout => &self.details.http.timeout,
            FormField::ShellScript => &self.details.shell.script,
            FormField::ClassName => &self.details.java.class_name,
            FormField::PythonScriptPath => &self.details.python.script_path,
            FormField::PythonScript => &self.details.python.script,
            FormField::Schedule => &self.common.schedule,
            FormField::MaxRetries => &self.common.max_retries,
            FormField::RetryDelay => &self.advanced.retry_delay,
            FormField::Description => &self.common.description,
            FormField::Type | FormField::Method | FormField::Recurring | FormField::Advanced => {
                return None;
            }
        };
        Some(s)
    }

    pub fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        let s = match field {
            FormField::Name => &mut self.common.name,
            FormField::Owner => &mut self.common.owner,
            FormField::Url => &mut self.details.http.url,
            FormField::Timeout => &mut self.details.http.timeout,
            FormField::ShellScript => &mut self.details.shell.script,
            FormField::ClassName => &mut self.details.java.class_name,
            FormField::PythonScriptPath => &mut self.details.python.script_path,
            FormField::PythonScript => &mut self.details.python.script,
            FormField::Schedule => &mut self.common.schedule,
            FormField::MaxRetries => &mut self.common.max_retries,
            FormField::RetryDelay => &mut self.advanced.retry_delay,
            FormField::Description => &mut self.common.description,
            FormField::Type | FormField::Method | FormField::Recurring | FormField::Advanced => {
                return None;
            }
        };
        Some(s)
    }

    /// Step a choice or toggle field. Returns false for text fields.
    pub fn cycle(&mut self, field: FormField, forward: bool) -> bool {
        match field {
            FormField::Type => {
                let current = self.job_type();
                self.select_type(if forward { current.next() } else { current.prev() });
            }
            FormField::Method => {
                let m = self.details.http.method;
                self.details.http.method = if forward { m.next() } else { m.prev() };
            }
            FormField::Recurring => self.common.is_recurring = !self.common.is_recurring,
            FormField::Advanced => self.toggle_advanced(),
            _ => return false,
        }
        true
    }

    /// Required fields that are still blank for the selected type.
    ///
    /// This is the input surface's check; [`JobForm::submit`] does not
    /// enforce it.
    pub fn missing_fields(&self) -> Vec<FormField> {
        let blank = |s: &str| s.trim().is_empty();
        let mut missing = Vec::new();
        if blank(&self.common.name) {
            missing.push(FormField::Name);
        }
        if blank(&self.common.owner) {
            missing.push(FormField::Owner);
        }
        match self.job_type() {
            JobType::HttpRequest if blank(&self.details.http.url) => missing.push(FormField::Url),
            JobType::ShellScript if blank(&self.details.shell.script) => {
                missing.push(FormField::ShellScript)
            }
            JobType::JavaClass if blank(&self.details.java.class_name) => {
                missing.push(FormField::ClassName)
            }
            JobType::PythonScript
                if blank(&self.details.python.script_path) && blank(&self.details.python.script) =>
            {
                missing.push(FormField::PythonScriptPath)
            }
            _ => {}
        }
        missing
    }

    /// Detail payload for the selected type only.
    pub fn job_data(&self) -> Result<JobData, FormError> {
        let d = &self.details;
        Ok(match self.job_type() {
            JobType::HttpRequest => JobData::Http {
                url: d.http.url.clone(),
                method: d.http.method,
                timeout: parse_int("timeout", &d.http.timeout)?,
            },
            JobType::ShellScript => JobData::Shell {
                script: d.shell.script.clone(),
            },
            JobType::JavaClass => JobData::Java {
                class_name: d.java.class_name.clone(),
            },
            JobType::PythonScript => JobData::Python {
                script: d.python.script.clone(),
                script_path: d.python.script_path.clone(),
            },
        })
    }

    /// Assemble the `POST /api/jobs` body. Performs no I/O.
    pub fn submit(&self) -> Result<CreateJobRequest, FormError> {
        let job_data = serde_json::to_string(&self.job_data()?).map_err(|source| {
            FormError::Encode {
                blob: "jobData",
                source,
            }
        })?;

        let retry = RetryConfig {
            retry_delay_seconds: parse_int("retryDelaySeconds", &self.advanced.retry_delay)?,
        };
        let config = serde_json::to_string(&retry).map_err(|source| FormError::Encode {
            blob: "config",
            source,
        })?;

        let c = &self.common;
        Ok(CreateJobRequest {
            name: c.name.clone(),
            owner: c.owner.clone(),
            job_type: c.job_type,
            description: c.description.clone(),
            schedule: c.schedule.clone(),
            is_recurring: c.is_recurring,
            max_retries: parse_int("maxRetries", &c.max_retries)?,
            job_data,
            config,
        })
    }
}

fn parse_int<T: FromStr>(field: &'static str, raw: &str) -> Result<T, FormError> {
    raw.trim().parse().map_err(|_| FormError::NotANumber {
        field,
        value: raw.to_string(),
    })
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
