use thiserror::Error;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("no to-do store found (run `todolist init` first)")]
    NotInitialized,

    #[error("task {0} not found")]
    TaskNotFound(i64),

    #[error("tag {0} not found")]
    TagNotFound(String),

    #[error("task title must not be empty")]
    InvalidTitle,

    #[error("tag name must not be empty")]
    InvalidTagName,

    #[error("invalid tag color '{0}': expected #RRGGBB")]
    InvalidColor(String),

    #[error("tag name '{0}' is already in use")]
    TagNameUnavailable(String),

    #[error("PIN must be exactly 4 digits")]
    InvalidPin,

    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("locked by another process: {0}")]
    Locked(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

impl TodoError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::TaskNotFound(_) => "task_not_found",
            Self::TagNotFound(_) => "tag_not_found",
            Self::InvalidTitle => "invalid_title",
            Self::InvalidTagName => "invalid_tag_name",
            Self::InvalidColor(_) => "invalid_color",
            Self::TagNameUnavailable(_) => "tag_name_unavailable",
            Self::InvalidPin => "invalid_pin",
            Self::InvalidDate(_) => "invalid_date",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Locked(_) => "locked",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
            Self::Yaml(_) => "yaml_error",
            Self::Db(_) => "db_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, TodoError>;
