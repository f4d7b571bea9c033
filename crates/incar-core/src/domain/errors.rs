pub type IncarResult<T> = Result<T, IncarError>;
pub type ParserResult<T> = IncarResult<T>;
pub type TableResult<T> = IncarResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncarErrorCategory {
    InputValidationError,
    IoSystemError,
    InternalError,
}

impl IncarErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::InternalError => 5,
        }
    }

    pub const fn rust_category(self) -> &'static str {
        match self {
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::InternalError => "InternalError",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} [{}] {}", .category.rust_category(), .placeholder, .message)]
pub struct IncarError {
    category: IncarErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl IncarError {
    pub fn new(
        category: IncarErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            IncarErrorCategory::InputValidationError,
            placeholder,
            message,
        )
    }

    /// Startup failure of a static table. Always input validation: the process
    /// must not serve generation requests from a partially loaded table.
    pub fn malformed_table(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::input_validation(placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(IncarErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(IncarErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> IncarErrorCategory {
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

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}
