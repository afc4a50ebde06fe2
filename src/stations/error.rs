use thiserror::Error;

/// A single inventory or data record that failed structural validation.
///
/// Decoders skip records that produce this error and keep going; one bad line
/// never aborts a load.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecordError {
    #[error("Line is {found} characters long, expected at least {expected}")]
    LineTooShort { expected: usize, found: usize },

    #[error("Field '{field}' is not numeric: '{value}'")]
    NotNumeric { field: &'static str, value: String },

    #[error("Station id is empty")]
    EmptyStationId,

    #[error("Latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("Longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("Month {0} is outside 1..=12")]
    MonthOutOfRange(i64),

    #[error("Unknown population class '{0}'")]
    UnknownPopulationClass(String),
}
