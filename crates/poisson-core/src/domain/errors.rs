use std::fmt::{Display, Formatter};
use std::path::Path;

pub type SweepResult<T> = Result<T, SweepError>;
pub type ParserResult<T> = SweepResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SweepErrorCategory {
    ConfigError,
    IoError,
    TemplateError,
    InvocationError,
    MalformedReportError,
}

impl SweepErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::ConfigError => 2,
            Self::IoError => 3,
            Self::TemplateError => 4,
            Self::InvocationError => 5,
            Self::MalformedReportError => 6,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigError => "ConfigError",
            Self::IoError => "IoError",
            Self::TemplateError => "TemplateError",
            Self::InvocationError => "InvocationError",
            Self::MalformedReportError => "MalformedReportError",
        }
    }
}

impl Display for SweepErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{category} [{placeholder}] {message}")]
pub struct SweepError {
    category: SweepErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl SweepError {
    pub fn new(
        category: SweepErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn config(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SweepErrorCategory::ConfigError, placeholder, message)
    }

    pub fn io(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SweepErrorCategory::IoError, placeholder, message)
    }

    pub fn template(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SweepErrorCategory::TemplateError, placeholder, message)
    }

    pub fn invocation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SweepErrorCategory::InvocationError, placeholder, message)
    }

    pub fn malformed_report(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            SweepErrorCategory::MalformedReportError,
            placeholder,
            message,
        )
    }

    /// Wraps a filesystem failure, naming the action and the path involved.
    pub fn io_at(
        placeholder: &'static str,
        action: &str,
        path: &Path,
        source: std::io::Error,
    ) -> Self {
        Self::io(
            placeholder,
            format!("failed to {} '{}': {}", action, path.display(), source),
        )
    }

    pub const fn category(&self) -> SweepErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }
}
