use gtfs_kit_model::{GtfsColor, GtfsParseError, GtfsTime, RouteType, ServiceDate};
use url::Url;

use crate::csv_reader::{CsvHeader, CsvRecord};
use crate::error::{ErrorKind, GtfsError, Result};

/// Schema-aware getters over one CSV row.
///
/// Every failure names the field and the row's line; the file name is added
/// by the caller.
pub struct FieldAccessor<'a> {
    header: &'a CsvHeader,
    record: &'a CsvRecord,
    strict: bool,
}

impl<'a> FieldAccessor<'a> {
    pub fn new(header: &'a CsvHeader, record: &'a CsvRecord) -> Self {
        Self {
            header,
            record,
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn line(&self) -> u64 {
        self.record.line()
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Column names of the table this row belongs to.
    pub fn columns(&self) -> &'a [String] {
        self.header.names()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.header.contains(name)
    }

    /// The cell for `name`, or `None` if the column is absent or the row is short.
    pub fn raw(&self, name: &str) -> Option<&'a str> {
        let position = self.header.position(name)?;
        self.record.get(position)
    }

    pub fn is_empty(&self, name: &str) -> bool {
        self.raw(name).map_or(true, str::is_empty)
    }

    pub fn error(&self, kind: ErrorKind, field: &str, message: impl Into<String>) -> GtfsError {
        GtfsError::new(kind, message)
            .with_field(field)
            .with_line(self.line())
    }

    pub fn string(&self, name: &str) -> Result<&'a str> {
        match self.raw(name) {
            None => Err(self.error(
                ErrorKind::MissingField,
                name,
                format!("field '{}' is required but missing", name),
            )),
            Some("") => Err(self.error(
                ErrorKind::MissingField,
                name,
                format!("field '{}' is required but empty", name),
            )),
            Some(value) => Ok(value),
        }
    }

    pub fn string_or(&self, name: &str, default: &'a str) -> &'a str {
        match self.raw(name) {
            Some(value) if !value.is_empty() => value,
            _ => default,
        }
    }

    /// An optional URL cell. Only checked for well-formedness in strict mode.
    pub fn url(&self, name: &str) -> Result<&'a str> {
        self.check_url(name, self.string_or(name, ""))
    }

    pub fn required_url(&self, name: &str) -> Result<&'a str> {
        self.check_url(name, self.string(name)?)
    }

    fn check_url(&self, name: &str, value: &'a str) -> Result<&'a str> {
        if self.strict && !value.is_empty() && Url::parse(value).is_err() {
            return Err(self.error(
                ErrorKind::Format,
                name,
                format!("expected a valid URL, found '{}'", value),
            ));
        }
        Ok(value)
    }

    pub fn double(&self, name: &str) -> Result<f64> {
        let value = self.string(name)?;
        self.parse_double(name, value)
    }

    pub fn double_or(&self, name: &str, default: f64) -> Result<f64> {
        Ok(self.optional_double(name)?.unwrap_or(default))
    }

    pub fn optional_double(&self, name: &str) -> Result<Option<f64>> {
        match self.raw(name) {
            Some(value) if !value.is_empty() => self.parse_double(name, value).map(Some),
            _ => Ok(None),
        }
    }

    fn parse_double(&self, name: &str, value: &str) -> Result<f64> {
        match value.parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => Ok(parsed),
            _ => Err(self.error(
                ErrorKind::Type,
                name,
                format!("expected float number, found '{}'", value),
            )),
        }
    }

    pub fn ranged_integer(&self, name: &str, min: i64, max: i64) -> Result<i64> {
        let value = self.string(name)?;
        self.parse_ranged(name, value, min, max)
    }

    pub fn ranged_integer_or(&self, name: &str, min: i64, max: i64, default: i64) -> Result<i64> {
        Ok(self
            .optional_ranged_integer(name, min, max)?
            .unwrap_or(default))
    }

    pub fn optional_ranged_integer(&self, name: &str, min: i64, max: i64) -> Result<Option<i64>> {
        match self.raw(name) {
            Some(value) if !value.is_empty() => self.parse_ranged(name, value, min, max).map(Some),
            _ => Ok(None),
        }
    }

    fn parse_ranged(&self, name: &str, value: &str, min: i64, max: i64) -> Result<i64> {
        let parsed = value.parse::<i64>().map_err(|_| {
            let expected = if min >= 0 {
                "expected non-negative integer number"
            } else {
                "expected integer number"
            };
            self.error(
                ErrorKind::Type,
                name,
                format!("{}, found '{}'", expected, value),
            )
        })?;
        if parsed < min || parsed > max {
            return Err(self.error(
                ErrorKind::Range,
                name,
                format!("expected integer in range [{},{}]", min, max),
            ));
        }
        Ok(parsed)
    }

    /// An enumerated code with a default for absent or empty cells.
    pub fn code_or<T>(
        &self,
        name: &str,
        min: i64,
        max: i64,
        default: T,
        from_code: impl Fn(i64) -> Option<T>,
    ) -> Result<T> {
        match self.optional_code(name, min, max, from_code)? {
            Some(value) => Ok(value),
            None => Ok(default),
        }
    }

    pub fn optional_code<T>(
        &self,
        name: &str,
        min: i64,
        max: i64,
        from_code: impl Fn(i64) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.optional_ranged_integer(name, min, max)? {
            Some(code) => from_code(code).map(Some).ok_or_else(|| {
                self.error(
                    ErrorKind::Range,
                    name,
                    format!("expected integer in range [{},{}]", min, max),
                )
            }),
            None => Ok(None),
        }
    }

    pub fn flag_or(&self, name: &str, default: bool) -> Result<bool> {
        Ok(self.ranged_integer_or(name, 0, 1, default as i64)? == 1)
    }

    pub fn hex_color(&self, name: &str, default: GtfsColor) -> Result<GtfsColor> {
        Ok(self.optional_hex_color(name)?.unwrap_or(default))
    }

    pub fn optional_hex_color(&self, name: &str) -> Result<Option<GtfsColor>> {
        match self.raw(name) {
            Some(value) if !value.is_empty() => GtfsColor::parse(value)
                .map(Some)
                .map_err(|err| self.value_error(name, err)),
            _ => Ok(None),
        }
    }

    pub fn service_date(&self, name: &str) -> Result<ServiceDate> {
        let value = self.string(name)?;
        self.parse_date(name, value)
    }

    pub fn optional_service_date(&self, name: &str) -> Result<Option<ServiceDate>> {
        match self.raw(name) {
            Some(value) if !value.is_empty() => self.parse_date(name, value).map(Some),
            _ => Ok(None),
        }
    }

    fn parse_date(&self, name: &str, value: &str) -> Result<ServiceDate> {
        let parsed = if self.strict {
            ServiceDate::parse_checked(value)
        } else {
            ServiceDate::parse(value)
        };
        parsed.map_err(|err| self.value_error(name, err))
    }

    /// A time cell; empty or absent cells decode to `00:00:00`.
    pub fn time(&self, name: &str) -> Result<GtfsTime> {
        let value = self.string_or(name, "");
        if value.is_empty() {
            return Ok(GtfsTime::default());
        }
        let parsed = if self.strict {
            GtfsTime::parse_strict(value)
        } else {
            GtfsTime::parse(value)
        };
        parsed.map_err(|err| self.value_error(name, err))
    }

    pub fn route_type(&self, name: &str) -> Result<RouteType> {
        let value = self.string(name)?;
        let code = value.parse::<i64>().map_err(|_| {
            self.error(
                ErrorKind::UnsupportedValue,
                name,
                format!("route type '{}' not supported.", value),
            )
        })?;
        RouteType::from_code(code).map_err(|err| self.value_error(name, err))
    }

    fn value_error(&self, name: &str, err: GtfsParseError) -> GtfsError {
        let kind = match err {
            GtfsParseError::UnsupportedRouteType(_) => ErrorKind::UnsupportedValue,
            _ => ErrorKind::Format,
        };
        self.error(kind, name, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_reader::CsvReader;

    fn with_row<T>(data: &str, check: impl FnOnce(FieldAccessor<'_>) -> T) -> T {
        let mut reader = CsvReader::new(data.as_bytes()).unwrap();
        let record = reader.next_record().unwrap().unwrap();
        check(FieldAccessor::new(reader.header(), &record))
    }

    #[test]
    fn required_strings() {
        with_row("a,b\nx,\n", |row| {
            assert_eq!(row.string("a").unwrap(), "x");
            let empty = row.string("b").unwrap_err();
            assert_eq!(empty.kind(), ErrorKind::MissingField);
            assert_eq!(empty.field(), Some("b"));
            assert_eq!(empty.line(), Some(2));
            let missing = row.string("c").unwrap_err();
            assert_eq!(missing.kind(), ErrorKind::MissingField);
            assert_eq!(row.string_or("b", "dflt"), "dflt");
            assert_eq!(row.string_or("c", "dflt"), "dflt");
        });
    }

    #[test]
    fn doubles() {
        with_row("lat,lon,dist\n48.5,abc,\n", |row| {
            assert_eq!(row.double("lat").unwrap(), 48.5);
            let err = row.double("lon").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Type);
            assert_eq!(err.message(), "expected float number, found 'abc'");
            assert_eq!(row.optional_double("dist").unwrap(), None);
            assert_eq!(row.double_or("dist", -1.0).unwrap(), -1.0);
            assert!(row.double("dist").is_err());
        });
    }

    #[test]
    fn ranged_integers() {
        with_row("a,b,c,d\n1,5,,x\n", |row| {
            assert_eq!(row.ranged_integer("a", 0, 2).unwrap(), 1);
            let err = row.ranged_integer("b", 0, 2).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Range);
            assert_eq!(err.message(), "expected integer in range [0,2]");
            assert_eq!(row.ranged_integer_or("c", 0, 2, 1).unwrap(), 1);
            assert_eq!(row.ranged_integer_or("missing", 0, 2, 2).unwrap(), 2);
            assert_eq!(row.ranged_integer("d", 0, 2).unwrap_err().kind(), ErrorKind::Type);
        });
    }

    #[test]
    fn colors() {
        with_row("c1,c2,c3,c4\nFF00FF,,GGGGGG,ABC\n", |row| {
            assert_eq!(row.hex_color("c1", GtfsColor::WHITE).unwrap().rgb(), 0xFF00FF);
            assert_eq!(row.hex_color("c2", GtfsColor::WHITE).unwrap().rgb(), 0xFFFFFF);
            assert_eq!(row.optional_hex_color("c2").unwrap(), None);
            assert_eq!(
                row.hex_color("c3", GtfsColor::WHITE).unwrap_err().kind(),
                ErrorKind::Format
            );
            assert_eq!(
                row.hex_color("c4", GtfsColor::WHITE).unwrap_err().kind(),
                ErrorKind::Format
            );
        });
    }

    #[test]
    fn dates() {
        with_row("d1,d2,d3\n20240101,2024011,20240231\n", |row| {
            assert_eq!(row.service_date("d1").unwrap().yyyymmdd(), 20240101);
            assert_eq!(row.service_date("d2").unwrap_err().kind(), ErrorKind::Format);
            assert!(row.service_date("d3").is_ok());
        });
        with_row("d3\n20240231\n", |row| {
            let row = row.strict(true);
            assert_eq!(row.service_date("d3").unwrap_err().kind(), ErrorKind::Format);
        });
    }

    #[test]
    fn times() {
        with_row("t1,t2,t3,t4\n25:03:61,1:2:03,,7:05\n", |row| {
            let time = row.time("t1").unwrap();
            assert_eq!((time.hours(), time.minutes(), time.seconds()), (25, 3, 1));
            assert_eq!(row.time("t2").unwrap_err().kind(), ErrorKind::Format);
            assert_eq!(row.time("t3").unwrap(), GtfsTime::new(0, 0, 0));
            assert_eq!(row.time("t4").unwrap(), GtfsTime::new(7, 5, 0));
        });
        with_row("t1,t4\n25:03:61,7:05\n", |row| {
            let row = row.strict(true);
            assert!(row.time("t1").is_err());
            assert!(row.time("t4").is_err());
        });
    }

    #[test]
    fn route_types() {
        with_row("r1,r2,r3\n3,109,42\n", |row| {
            assert_eq!(row.route_type("r1").unwrap(), RouteType::BUS);
            assert_eq!(row.route_type("r2").unwrap().code(), 109);
            let err = row.route_type("r3").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnsupportedValue);
            assert_eq!(err.message(), "route type '42' not supported.");
        });
    }

    #[test]
    fn urls_only_checked_in_strict_mode() {
        with_row("url\nnot a url\n", |row| {
            assert_eq!(row.url("url").unwrap(), "not a url");
            assert_eq!(row.strict(true).url("url").unwrap_err().kind(), ErrorKind::Format);
        });
    }

    #[test]
    fn enumerated_codes() {
        with_row("a,b\n2,\n", |row| {
            let a = row.code_or("a", 0, 2, 0u8, |code| Some(code as u8)).unwrap();
            assert_eq!(a, 2);
            let b = row.code_or("b", 0, 2, 9u8, |code| Some(code as u8)).unwrap();
            assert_eq!(b, 9);
            assert_eq!(row.optional_code("b", 0, 2, |code| Some(code)).unwrap(), None);
        });
    }
}
