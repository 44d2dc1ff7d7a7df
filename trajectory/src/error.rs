use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The content doesn't follow the format: wrong origin tag, missing block, bad number...
    #[error("malformed input: {0}")]
    Format(String),
    #[error("unsupported file format for '{}'", .0.display())]
    UnsupportedFormat(PathBuf),
    /// A point or column list doesn't match the trajectory's schema
    #[error("schema violation: {0}")]
    SchemaViolation(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn format<S: Into<String>>(msg: S) -> Self {
        Error::Format(msg.into())
    }

    pub(crate) fn schema<S: Into<String>>(msg: S) -> Self {
        Error::SchemaViolation(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            return Error::Io(err.into());
        }
        Error::Format(format!("JSON: {err}"))
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        if !err.is_io_error() {
            return Error::Format(format!("CSV: {err}"));
        }
        match err.into_kind() {
            csv::ErrorKind::Io(err) => Error::Io(err),
            kind => Error::Format(format!("CSV: {kind:?}")),
        }
    }
}

impl From<geojson::Error> for Error {
    fn from(err: geojson::Error) -> Self {
        Error::Format(format!("GeoJSON: {err}"))
    }
}

impl From<std::num::ParseFloatError> for Error {
    fn from(err: std::num::ParseFloatError) -> Self {
        Error::Format(format!("bad number: {err}"))
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::Format(format!("bad integer: {err}"))
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Error::Format(format!("couldn't build output: {err}"))
    }
}
