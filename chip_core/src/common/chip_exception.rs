use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Error codes for the chip system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[repr(i32)]
pub enum ErrCode {
    // Chip errors (0-99)
    #[strum(serialize = "_CHIP_ERR_BEGIN")]
    ChipErrBegin = 0,
    #[strum(serialize = "SRC_DATA_NOT_FOUND")]
    SrcDataNotFound = 3,
    #[strum(serialize = "PARA_ERROR")]
    ParaError = 5,
    #[strum(serialize = "CONFIG_ERROR")]
    ConfigError = 17,
    #[strum(serialize = "SRC_DATA_FORMAT_ERROR")]
    SrcDataFormatError = 18,
    #[strum(serialize = "EMPTY_WINDOW")]
    EmptyWindow = 19,
    #[strum(serialize = "_CHIP_ERR_END")]
    ChipErrEnd = 99,

    // KL data errors (200-299)
    #[strum(serialize = "_KL_ERR_BEGIN")]
    KlErrBegin = 200,
    #[strum(serialize = "PRICE_BELOW_ZERO")]
    PriceBelowZero = 201,
    #[strum(serialize = "KL_DATA_INVALID")]
    KlDataInvalid = 203,
    #[strum(serialize = "NO_DATA")]
    NoData = 210,
    #[strum(serialize = "INSUFFICIENT_DATA")]
    InsufficientData = 213,
    #[strum(serialize = "_KL_ERR_END")]
    KlErrEnd = 299,

    // Fetch errors (300-399)
    #[strum(serialize = "_FETCH_ERR_BEGIN")]
    FetchErrBegin = 300,
    #[strum(serialize = "DATA_FETCH_ERROR")]
    DataFetchError = 301,
    #[strum(serialize = "DATA_SOURCE_UNAVAILABLE")]
    DataSourceUnavailable = 302,
    #[strum(serialize = "_FETCH_ERR_END")]
    FetchErrEnd = 399,
}

impl ErrCode {
    pub fn is_kldata_err(&self) -> bool {
        let code = *self as i32;
        code > Self::KlErrBegin as i32 && code < Self::KlErrEnd as i32
    }

    pub fn is_chip_err(&self) -> bool {
        let code = *self as i32;
        code > Self::ChipErrBegin as i32 && code < Self::ChipErrEnd as i32
    }

    pub fn is_fetch_err(&self) -> bool {
        let code = *self as i32;
        code > Self::FetchErrBegin as i32 && code < Self::FetchErrEnd as i32
    }
}

#[derive(Debug, Error)]
pub enum ChipError {
    /// Malformed input: a bar record, a column layout or an argument.
    #[error("{errcode}: {msg}")]
    Validation { errcode: ErrCode, msg: String },

    #[error("{}: need at least {required} bars, got {actual}", ErrCode::InsufficientData)]
    InsufficientData { required: usize, actual: usize },

    #[error("{errcode}: {msg}")]
    Computation { errcode: ErrCode, msg: String },

    /// Raised by the data-fetch collaborator, never by the math core.
    #[error("{errcode}: {code} unavailable from {source_name}: {msg}")]
    DataUnavailable {
        errcode: ErrCode,
        code: String,
        source_name: String,
        msg: String,
    },

    #[error("{}: {0}", ErrCode::ConfigError)]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChipError {
    pub fn validation(message: impl Into<String>, code: ErrCode) -> Self {
        Self::Validation {
            errcode: code,
            msg: message.into(),
        }
    }

    pub fn computation(message: impl Into<String>, code: ErrCode) -> Self {
        Self::Computation {
            errcode: code,
            msg: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn unavailable(
        code: impl Into<String>,
        source_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::fetch(ErrCode::DataSourceUnavailable, code, source_name, message)
    }

    /// Fetch failure carrying a specific code, e.g. `NoData` for an empty response.
    pub fn fetch(
        errcode: ErrCode,
        code: impl Into<String>,
        source_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::DataUnavailable {
            errcode,
            code: code.into(),
            source_name: source_name.into(),
            msg: message.into(),
        }
    }

    pub fn errcode(&self) -> ErrCode {
        match self {
            Self::Validation { errcode, .. }
            | Self::Computation { errcode, .. }
            | Self::DataUnavailable { errcode, .. } => *errcode,
            Self::InsufficientData { .. } => ErrCode::InsufficientData,
            Self::Config(_) => ErrCode::ConfigError,
            Self::Io(_) => ErrCode::SrcDataNotFound,
            Self::Csv(_) | Self::Json(_) => ErrCode::SrcDataFormatError,
        }
    }

    pub fn is_kldata_err(&self) -> bool {
        self.errcode().is_kldata_err()
    }

    pub fn is_fetch_err(&self) -> bool {
        self.errcode().is_fetch_err()
    }
}
