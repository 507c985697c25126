use std::collections::HashMap;
use std::io::{self, Read};

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::{ErrorKind, GtfsError, Result};

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const CHUNK_SIZE: usize = 8 * 1024;

/// Column names of a table, looked up by name rather than position.
#[derive(Debug, Clone, Default)]
pub struct CsvHeader {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl CsvHeader {
    fn from_record(record: &StringRecord) -> Self {
        let names: Vec<String> = record
            .iter()
            .map(|value| value.chars().filter(|ch| !ch.is_whitespace()).collect())
            .collect();
        let mut index = HashMap::with_capacity(names.len());
        for (position, name) in names.iter().enumerate() {
            // First occurrence wins for duplicated columns.
            index.entry(name.clone()).or_insert(position);
        }
        Self { names, index }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One data row together with the raw input line it started on.
#[derive(Debug, Clone)]
pub struct CsvRecord {
    fields: StringRecord,
    line: u64,
}

impl CsvRecord {
    pub fn get(&self, position: usize) -> Option<&str> {
        self.fields.get(position)
    }

    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Byte pre-pass in front of the CSV parser.
///
/// Drops a leading BOM and tracks RFC4180 quoting so that a quoted field
/// still open at end of input can be reported. Empty lines outside quotes
/// are padded with a space: the parser silently swallows empty lines, which
/// would shift the line numbers of the rows after them.
struct LineScanner<R> {
    inner: R,
    started: bool,
    finished: bool,
    state: QuoteState,
    at_line_start: bool,
    offset: u64,
    line: u64,
    open_quote: (u64, u64),
    chunk: Vec<u8>,
    pending: Vec<u8>,
    consumed: usize,
}

impl<R: Read> LineScanner<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            started: false,
            finished: false,
            state: QuoteState::FieldStart,
            at_line_start: true,
            offset: 0,
            line: 1,
            open_quote: (0, 0),
            chunk: vec![0; CHUNK_SIZE],
            pending: Vec::with_capacity(CHUNK_SIZE + CHUNK_SIZE / 8),
            consumed: 0,
        }
    }

    fn skip_bom(&mut self) -> io::Result<Vec<u8>> {
        let mut prefix = Vec::with_capacity(UTF8_BOM.len());
        let mut byte = [0u8; 1];
        while prefix.len() < UTF8_BOM.len() {
            if self.inner.read(&mut byte)? == 0 {
                break;
            }
            prefix.push(byte[0]);
            if prefix[..] != UTF8_BOM[..prefix.len()] {
                return Ok(prefix);
            }
        }
        if prefix[..] == UTF8_BOM[..] {
            prefix.clear();
        }
        Ok(prefix)
    }

    /// Refills `pending` from the source; leaves it empty at end of input.
    fn fill(&mut self) -> io::Result<()> {
        self.pending.clear();
        self.consumed = 0;
        if !self.started {
            self.started = true;
            let prefix = self.skip_bom()?;
            if !prefix.is_empty() {
                self.scan(&prefix);
                return Ok(());
            }
        }
        let mut chunk = std::mem::take(&mut self.chunk);
        let result = self.inner.read(&mut chunk);
        if let Ok(count) = result {
            if count == 0 {
                self.finished = true;
            }
            self.scan(&chunk[..count]);
        }
        self.chunk = chunk;
        result.map(|_| ())
    }

    fn scan(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            let is_break = byte == b'\n' || byte == b'\r';
            if is_break && self.at_line_start && self.state == QuoteState::FieldStart {
                self.pending.push(b' ');
            }
            self.pending.push(byte);
            self.state = match (self.state, byte) {
                (QuoteState::FieldStart, b'"') => {
                    self.open_quote = (self.line, self.offset);
                    QuoteState::Quoted
                }
                (QuoteState::FieldStart | QuoteState::Unquoted, b',' | b'\n' | b'\r') => {
                    QuoteState::FieldStart
                }
                (QuoteState::FieldStart | QuoteState::Unquoted, _) => QuoteState::Unquoted,
                (QuoteState::Quoted, b'"') => QuoteState::QuoteInQuoted,
                (QuoteState::Quoted, _) => QuoteState::Quoted,
                (QuoteState::QuoteInQuoted, b'"') => QuoteState::Quoted,
                (QuoteState::QuoteInQuoted, b',' | b'\n' | b'\r') => QuoteState::FieldStart,
                (QuoteState::QuoteInQuoted, _) => QuoteState::Unquoted,
            };
            self.at_line_start = byte == b'\n' && self.state == QuoteState::FieldStart;
            if byte == b'\n' {
                self.line += 1;
            }
            self.offset += 1;
        }
    }

    /// Line and byte offset of a quote left open at end of input.
    fn unterminated_quote(&self) -> Option<(u64, u64)> {
        (self.finished && self.state == QuoteState::Quoted).then_some(self.open_quote)
    }
}

impl<R: Read> Read for LineScanner<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.consumed == self.pending.len() {
            if self.finished {
                return Ok(0);
            }
            self.fill()?;
        }
        let available = &self.pending[self.consumed..];
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.consumed += count;
        Ok(count)
    }
}

/// Streaming reader for one GTFS table.
///
/// The first non-blank row is the header. Rows are produced lazily and the
/// underlying stream is read once; blank rows are skipped while the reported
/// line numbers keep following the raw input.
pub struct CsvReader<R: Read> {
    inner: csv::Reader<LineScanner<R>>,
    header: CsvHeader,
}

impl<R: Read> CsvReader<R> {
    pub fn new(source: R) -> Result<Self> {
        let inner = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(LineScanner::new(source));
        let mut reader = Self {
            inner,
            header: CsvHeader::default(),
        };
        if let Some(first) = reader.next_raw()? {
            reader.header = CsvHeader::from_record(&first.fields);
        }
        Ok(reader)
    }

    pub fn header(&self) -> &CsvHeader {
        &self.header
    }

    pub fn next_record(&mut self) -> Result<Option<CsvRecord>> {
        self.next_raw()
    }

    fn next_raw(&mut self) -> Result<Option<CsvRecord>> {
        loop {
            let mut fields = StringRecord::new();
            let has_record = self
                .inner
                .read_record(&mut fields)
                .map_err(decode_error)?;
            self.check_quotes()?;
            if !has_record {
                return Ok(None);
            }
            if is_blank(&fields) {
                continue;
            }
            let line = fields.position().map(|pos| pos.line()).unwrap_or(0);
            return Ok(Some(CsvRecord { fields, line }));
        }
    }

    fn check_quotes(&self) -> Result<()> {
        match self.inner.get_ref().unterminated_quote() {
            Some((line, offset)) => Err(GtfsError::new(
                ErrorKind::Decode,
                format!("unterminated quoted field starting at byte {}", offset),
            )
            .with_line(line)),
            None => Ok(()),
        }
    }
}

impl<R: Read> Iterator for CsvReader<R> {
    type Item = Result<CsvRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

fn is_blank(fields: &StringRecord) -> bool {
    fields.iter().all(|value| value.is_empty())
}

fn decode_error(err: csv::Error) -> GtfsError {
    let line = err.position().map(|pos| pos.line());
    let message = match err.kind() {
        csv::ErrorKind::Utf8 { .. } => "invalid UTF-8 in CSV data".to_string(),
        csv::ErrorKind::Io(io_err) => format!("could not read CSV data: {}", io_err),
        _ => format!("malformed CSV data: {}", err),
    };
    let error = GtfsError::new(ErrorKind::Decode, message);
    let error = match line {
        Some(line) => error.with_line(line),
        None => error,
    };
    error.with_source(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(data: &str) -> Result<(CsvHeader, Vec<CsvRecord>)> {
        let mut reader = CsvReader::new(data.as_bytes())?;
        let mut records = Vec::new();
        while let Some(record) = reader.next_record()? {
            records.push(record);
        }
        Ok((reader.header().clone(), records))
    }

    fn values(record: &CsvRecord) -> Vec<&str> {
        record.iter().collect()
    }

    #[test]
    fn reads_header_and_records() {
        let (header, records) = read_all("stop_id,stop_name\nS1,Main\nS2,Side\n").unwrap();
        assert_eq!(header.names(), ["stop_id", "stop_name"]);
        assert_eq!(header.position("stop_name"), Some(1));
        assert_eq!(records.len(), 2);
        assert_eq!(values(&records[1]), ["S2", "Side"]);
        assert_eq!(records[0].line(), 2);
    }

    #[test]
    fn skips_bom_and_strips_header_whitespace() {
        let data = "\u{feff}stop_id, stop _name \nS1,Main\n";
        let (header, records) = read_all(data).unwrap();
        assert_eq!(header.names(), ["stop_id", "stop_name"]);
        assert_eq!(values(&records[0]), ["S1", "Main"]);
    }

    #[test]
    fn unescapes_quotes_and_trims() {
        let data = "a,b,c\n  x  ,\"he said \"\"hi\"\"\",\"1,2\"\n";
        let (_, records) = read_all(data).unwrap();
        assert_eq!(values(&records[0]), ["x", "he said \"hi\"", "1,2"]);
    }

    #[test]
    fn blank_lines_are_skipped_but_counted() {
        let data = "\n\na,b\n1,2\n\n   \n3,4\n";
        let (header, records) = read_all(data).unwrap();
        assert_eq!(header.names(), ["a", "b"]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line(), 4);
        assert_eq!(records[1].line(), 7);
    }

    #[test]
    fn rows_after_empty_lines_keep_their_line() {
        let (_, records) = read_all("a,b\n1,2\n\n\n3,4\r\n\r\n5,6").unwrap();
        let lines: Vec<u64> = records.iter().map(CsvRecord::line).collect();
        assert_eq!(lines, [2, 5, 7]);
        assert_eq!(values(&records[2]), ["5", "6"]);
    }

    #[test]
    fn crlf_line_endings() {
        let (_, records) = read_all("a,b\r\n1,2\r\n3,4\r\n").unwrap();
        assert_eq!(values(&records[1]), ["3", "4"]);
        assert_eq!(records[1].line(), 3);
    }

    #[test]
    fn empty_input_has_no_header() {
        let (header, records) = read_all("").unwrap();
        assert!(header.is_empty());
        assert!(records.is_empty());
    }

    #[test]
    fn unterminated_quote_is_a_decode_error() {
        let err = read_all("a,b\n1,\"open\n2,3\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.line(), Some(2));
        assert!(err.message().contains("byte 6"));
    }

    #[test]
    fn quote_inside_unquoted_field_is_literal() {
        let (_, records) = read_all("a,b\n5\" pipe,x\n").unwrap();
        assert_eq!(values(&records[0]), ["5\" pipe", "x"]);
    }
}
