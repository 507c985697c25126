use std::fmt;

pub type Result<T, E = GtfsError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required table or the feed location itself is missing.
    FileNotFound,
    /// Malformed CSV syntax or an unreadable source.
    Decode,
    MissingField,
    Type,
    Range,
    Format,
    UnsupportedValue,
    Reference,
    DuplicateId,
    Sequence,
    Validation,
    WriterIo,
}

/// Where in the feed an error was detected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub file: Option<String>,
    pub line: Option<u64>,
    pub field: Option<String>,
}

impl fmt::Display for Location {
    /// Renders as a prefix for the message, e.g. `stops.txt:3: in field 'stop_lat', `.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:", file)?;
        }
        if let Some(line) = self.line {
            write!(f, "{}:", line)?;
        }
        if self.file.is_some() || self.line.is_some() {
            f.write_str(" ")?;
        }
        if let Some(field) = &self.field {
            write!(f, "in field '{}', ", field)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{location}{message}")]
pub struct GtfsError {
    kind: ErrorKind,
    message: String,
    location: Location,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl GtfsError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: Location::default(),
            source: None,
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::new(ErrorKind::FileNotFound, "File not found").in_file(path)
    }

    pub fn with_line(mut self, line: u64) -> Self {
        self.location.line = Some(line);
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.location.field = Some(field.into());
        self
    }

    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Attaches the file name unless an inner layer already did.
    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        if self.location.file.is_none() {
            self.location.file = Some(file.into());
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn file(&self) -> Option<&str> {
        self.location.file.as_deref()
    }

    pub fn line(&self) -> Option<u64> {
        self.location.line
    }

    pub fn field(&self) -> Option<&str> {
        self.location.field.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_full_location() {
        let err = GtfsError::new(ErrorKind::Type, "expected float number, found 'abc'")
            .with_field("stop_lat")
            .with_line(3)
            .in_file("stops.txt");
        assert_eq!(
            err.to_string(),
            "stops.txt:3: in field 'stop_lat', expected float number, found 'abc'"
        );
    }

    #[test]
    fn omits_missing_segments() {
        let err = GtfsError::new(ErrorKind::Sequence, "stop_sequence collision")
            .with_line(7)
            .in_file("stop_times.txt");
        assert_eq!(err.to_string(), "stop_times.txt:7: stop_sequence collision");

        let bare = GtfsError::new(ErrorKind::Validation, "bad");
        assert_eq!(bare.to_string(), "bad");
    }

    #[test]
    fn keeps_innermost_file() {
        let err = GtfsError::file_not_found("feed/agency.txt").in_file("agency.txt");
        assert_eq!(err.file(), Some("feed/agency.txt"));
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(err.to_string(), "feed/agency.txt: File not found");
    }
}
