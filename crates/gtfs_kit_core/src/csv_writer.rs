use std::fmt::Write as _;
use std::io::Write;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::{ErrorKind, GtfsError, Result};

const POW10: [f64; 10] = [1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9];

/// Row-by-row CSV emitter for one GTFS table.
///
/// The header goes out right before the first row, or on [`CsvWriter::write_header`]
/// for tables that must exist even when empty. Fields are quoted only when
/// they contain the delimiter, a quote or a line break.
pub struct CsvWriter<W: Write> {
    inner: csv::Writer<W>,
    headers: Vec<String>,
    header_written: bool,
    fields_in_row: usize,
    scratch: String,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(out: W, headers: Vec<String>) -> Self {
        let inner = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(out);
        Self {
            inner,
            headers,
            header_written: false,
            fields_in_row: 0,
            scratch: String::with_capacity(32),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn write_str(&mut self, value: &str) -> Result<()> {
        self.field(value.as_bytes())
    }

    pub fn write_int(&mut self, value: i64) -> Result<()> {
        match value {
            0 => self.field(b"0"),
            1 => self.field(b"1"),
            2 => self.field(b"2"),
            _ => {
                self.scratch.clear();
                let _ = write!(self.scratch, "{}", value);
                let bytes = std::mem::take(&mut self.scratch);
                let result = self.field(bytes.as_bytes());
                self.scratch = bytes;
                result
            }
        }
    }

    /// Shortest decimal form that reads back as the same `f64`.
    pub fn write_double(&mut self, value: f64) -> Result<()> {
        let value = if value == 0.0 { 0.0 } else { value };
        self.scratch.clear();
        let _ = write!(self.scratch, "{}", value);
        let bytes = std::mem::take(&mut self.scratch);
        let result = self.field(bytes.as_bytes());
        self.scratch = bytes;
        result
    }

    /// Rounds to `digits` decimal places before writing the shortest form.
    pub fn write_double_rounded(&mut self, value: f64, digits: u32) -> Result<()> {
        self.write_double(round_to(value, digits))
    }

    /// Emits an empty field.
    pub fn skip(&mut self) -> Result<()> {
        self.field(b"")
    }

    pub fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Ok(());
        }
        self.header_written = true;
        self.inner.write_record(&self.headers).map_err(write_error)
    }

    /// Terminates the current row, writing the header first if needed.
    pub fn flush_line(&mut self) -> Result<()> {
        self.write_header()?;
        self.fields_in_row = 0;
        self.inner
            .write_record(None::<&[u8]>)
            .map_err(write_error)
    }

    pub fn finish(mut self) -> Result<W> {
        self.inner.flush().map_err(|err| {
            GtfsError::new(ErrorKind::WriterIo, "Could not write to file.").with_source(err)
        })?;
        self.inner.into_inner().map_err(|err| {
            GtfsError::new(ErrorKind::WriterIo, "Could not write to file.")
                .with_source(err.into_error())
        })
    }

    fn field(&mut self, value: &[u8]) -> Result<()> {
        if self.fields_in_row == 0 {
            self.write_header()?;
        }
        self.fields_in_row += 1;
        self.inner.write_field(value).map_err(write_error)
    }
}

pub fn round_to(value: f64, digits: u32) -> f64 {
    let factor = match POW10.get(digits as usize) {
        Some(factor) => *factor,
        None => 10f64.powi(digits as i32),
    };
    (value * factor).round() / factor
}

fn write_error(err: csv::Error) -> GtfsError {
    GtfsError::new(ErrorKind::WriterIo, "Could not write to file.").with_source(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn output(writer: CsvWriter<Vec<u8>>) -> String {
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn header_is_written_before_first_row() {
        let mut writer = CsvWriter::new(Vec::new(), headers(&["a", "b", "c"]));
        writer.write_str("x").unwrap();
        writer.skip().unwrap();
        writer.write_int(42).unwrap();
        writer.flush_line().unwrap();
        assert_eq!(output(writer), "a,b,c\nx,,42\n");
    }

    #[test]
    fn no_rows_means_no_output() {
        let writer = CsvWriter::new(Vec::new(), headers(&["a"]));
        assert_eq!(output(writer), "");

        let mut forced = CsvWriter::new(Vec::new(), headers(&["a", "b"]));
        forced.write_header().unwrap();
        forced.write_header().unwrap();
        assert_eq!(output(forced), "a,b\n");
    }

    #[test]
    fn quotes_only_when_needed() {
        let mut writer = CsvWriter::new(Vec::new(), headers(&["a", "b", "c"]));
        writer.write_str("plain").unwrap();
        writer.write_str("with,comma").unwrap();
        writer.write_str("say \"hi\", ok").unwrap();
        writer.flush_line().unwrap();
        assert_eq!(
            output(writer),
            "a,b,c\nplain,\"with,comma\",\"say \"\"hi\"\", ok\"\n"
        );
    }

    #[test]
    fn doubles_use_shortest_form() {
        let mut writer = CsvWriter::new(Vec::new(), headers(&["a", "b", "c", "d"]));
        writer.write_double(48.0).unwrap();
        writer.write_double(0.1).unwrap();
        writer.write_double_rounded(7.123456789, 6).unwrap();
        writer.write_double_rounded(-0.0001, 3).unwrap();
        writer.flush_line().unwrap();
        assert_eq!(output(writer), "a,b,c,d\n48,0.1,7.123457,0\n");
    }

    #[test]
    fn rounding_beyond_cached_exponents() {
        assert_eq!(round_to(1.25, 1), 1.3);
        assert_eq!(round_to(0.123456789012, 11), 0.12345678901);
        assert_eq!(round_to(2.5, 0), 3.0);
    }

    #[test]
    fn small_integers_take_the_fast_path() {
        let mut writer = CsvWriter::new(Vec::new(), headers(&["a", "b", "c", "d"]));
        for value in [0, 1, 2, -7] {
            writer.write_int(value).unwrap();
        }
        writer.flush_line().unwrap();
        assert_eq!(output(writer), "a,b,c,d\n0,1,2,-7\n");
    }
}
