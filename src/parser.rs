//! Streaming reader for SQL `INSERT` dumps.
//!
//! Dump lines batch thousands of row tuples after an `INSERT INTO ... VALUES`
//! prefix. [`TupleTokenizer`] pulls tuples out of one line, [`Record`] maps a
//! tuple onto a typed row, and [`DumpScanner`] ties both to a decompressing
//! [`DumpReader`] so a dump is visited one line at a time.
//!
//! Accepted tuple grammar (no whitespace between tokens):
//!
//! ```text
//! tuple  := '(' value (',' value)* ')'
//! value  := number | string | 'NULL'
//! number := '-'? digit+ ('.' digit+)? (('e'|'E') ('+'|'-')? digit+)?
//! string := '\'' ( '\\' any | not('\'' | '\\') )* '\''
//! ```
//!
//! String fields are returned raw: `\'` stays `\'` until the report unescapes it.

use crate::config::{PROGRESS_INTERVAL, SIZE_FIELD_FROM_END};
use crate::models::{CategoryLink, LangLink, PageRow, SizedPage};
use anyhow::{Context, Result};
use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

static LANG_CODE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w-]+$").unwrap());

const READ_BUFFER_SIZE: usize = 256 * 1024;

/// One field of a dump tuple
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Int(i64),
    /// Decimal or exponent literal, or an integer too large for `i64`
    Number(&'a str),
    /// String contents between the quotes, escapes preserved
    Str(&'a str),
    Null,
}

impl<'a> Value<'a> {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        self.as_int().and_then(|n| u32::try_from(n).ok())
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::Str(s) => Some(*s),
            _ => None,
        }
    }
}

/// Iterates the tuples of a single dump line, left to right.
///
/// A `(` that does not open a well-formed tuple is skipped and the search
/// resumes at the next byte, so boilerplate lines simply yield nothing.
pub struct TupleTokenizer<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> TupleTokenizer<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { line, pos: 0 }
    }

    fn parse_tuple(&self, start: usize) -> Option<(Vec<Value<'a>>, usize)> {
        let bytes = self.line.as_bytes();
        let mut fields = Vec::new();
        let mut i = start + 1;
        loop {
            let (value, next) = self.parse_value(i)?;
            fields.push(value);
            match bytes.get(next)? {
                b',' => i = next + 1,
                b')' => return Some((fields, next + 1)),
                _ => return None,
            }
        }
    }

    fn parse_value(&self, start: usize) -> Option<(Value<'a>, usize)> {
        let bytes = self.line.as_bytes();
        match *bytes.get(start)? {
            b'\'' => {
                let mut i = start + 1;
                while i < bytes.len() {
                    match bytes[i] {
                        b'\\' => i += 2,
                        b'\'' => return Some((Value::Str(&self.line[start + 1..i]), i + 1)),
                        _ => i += 1,
                    }
                }
                None
            }
            b'N' if bytes[start..].starts_with(b"NULL") => Some((Value::Null, start + 4)),
            b'-' | b'0'..=b'9' => self.parse_number(start),
            _ => None,
        }
    }

    fn parse_number(&self, start: usize) -> Option<(Value<'a>, usize)> {
        let bytes = self.line.as_bytes();
        let digits = |mut i: usize| {
            let from = i;
            while bytes.get(i).is_some_and(u8::is_ascii_digit) {
                i += 1;
            }
            (i > from).then_some(i)
        };

        let mut end = if bytes[start] == b'-' {
            start + 1
        } else {
            start
        };
        end = digits(end)?;
        let mut integral = true;
        if bytes.get(end) == Some(&b'.') {
            end = digits(end + 1)?;
            integral = false;
        }
        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp = end + 1;
            if matches!(bytes.get(exp), Some(b'+' | b'-')) {
                exp += 1;
            }
            end = digits(exp)?;
            integral = false;
        }

        let text = &self.line[start..end];
        let value = if integral {
            text.parse().map_or(Value::Number(text), Value::Int)
        } else {
            Value::Number(text)
        };
        Some((value, end))
    }
}

impl<'a> Iterator for TupleTokenizer<'a> {
    type Item = Vec<Value<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.line.as_bytes();
        while self.pos < bytes.len() {
            let start = self.pos + memchr::memchr(b'(', &bytes[self.pos..])?;
            match self.parse_tuple(start) {
                Some((fields, end)) => {
                    self.pos = end;
                    return Some(fields);
                }
                None => self.pos = start + 1,
            }
        }
        None
    }
}

/// A row type that can be recognized in a dump tuple
pub trait Record: Sized {
    fn from_tuple(fields: &[Value<'_>]) -> Option<Self>;
}

/// `(page_id, 'category', ...)`
impl Record for CategoryLink {
    fn from_tuple(fields: &[Value<'_>]) -> Option<Self> {
        match fields {
            [id, Value::Str(category), ..] => Some(Self {
                page_id: id.as_u32()?,
                category: category.to_string(),
            }),
            _ => None,
        }
    }
}

/// `(id, namespace, 'title', ...)`
impl Record for PageRow {
    fn from_tuple(fields: &[Value<'_>]) -> Option<Self> {
        match fields {
            [id, Value::Int(ns), Value::Str(title), ..] => Some(Self {
                id: id.as_u32()?,
                namespace: i32::try_from(*ns).ok()?,
                title: title.to_string(),
            }),
            _ => None,
        }
    }
}

/// Exactly `(page_id, 'lang', 'title')`
impl Record for LangLink {
    fn from_tuple(fields: &[Value<'_>]) -> Option<Self> {
        match fields {
            [id, Value::Str(lang), Value::Str(title)] if LANG_CODE_REGEX.is_match(lang) => {
                Some(Self {
                    page_id: id.as_u32()?,
                    lang: lang.to_string(),
                    title: title.to_string(),
                })
            }
            _ => None,
        }
    }
}

/// `(id, namespace, 'title', ..., size, _, _)`
impl Record for SizedPage {
    fn from_tuple(fields: &[Value<'_>]) -> Option<Self> {
        if fields.len() < 3 + SIZE_FIELD_FROM_END {
            return None;
        }
        match fields {
            [Value::Int(_), Value::Int(ns), Value::Str(title), ..] => {
                let size = fields[fields.len() - SIZE_FIELD_FROM_END].as_int()?;
                Some(Self {
                    namespace: i32::try_from(*ns).ok()?,
                    title: title.to_string(),
                    size: u64::try_from(size).ok()?,
                })
            }
            _ => None,
        }
    }
}

/// Line reader over a possibly compressed dump.
///
/// `.gz` and `.bz2` are decompressed on the fly; anything else is read as text.
pub struct DumpReader {
    inner: Box<dyn BufRead>,
    buf: Vec<u8>,
    lines_read: u64,
}

impl DumpReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open dump file: {}", path.display()))?;
        let decoder: Box<dyn Read> = match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => Box::new(MultiGzDecoder::new(file)),
            Some("bz2") => Box::new(MultiBzDecoder::new(file)),
            _ => Box::new(file),
        };
        Ok(Self {
            inner: Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, decoder)),
            buf: Vec::new(),
            lines_read: 0,
        })
    }

    /// Next line without its terminator, or `None` at end of input
    pub fn read_line(&mut self) -> Result<Option<Cow<'_, str>>> {
        self.buf.clear();
        let n = self
            .inner
            .read_until(b'\n', &mut self.buf)
            .context("Failed to read dump line")?;
        if n == 0 {
            return Ok(None);
        }
        self.lines_read += 1;
        while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
            self.buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&self.buf)))
    }

    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }
}

/// Lazy, forward-only sequence of `R` records from one dump file
pub struct DumpScanner<R> {
    reader: DumpReader,
    path: PathBuf,
    pending: VecDeque<R>,
    progress: ProgressBar,
    progress_interval: u64,
    finished: bool,
}

impl<R: Record> DumpScanner<R> {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            reader: DumpReader::open(path)?,
            path: path.to_path_buf(),
            pending: VecDeque::new(),
            progress: ProgressBar::hidden(),
            progress_interval: u64::MAX,
            finished: false,
        })
    }

    /// Tick `progress` every `interval` lines. Does not affect the records yielded.
    pub fn with_progress(mut self, progress: ProgressBar, interval: u64) -> Self {
        self.progress = progress;
        self.progress_interval = interval.max(1);
        self
    }

    fn finish(&mut self) {
        self.finished = true;
        self.progress.finish_and_clear();
        info!(
            path = %self.path.display(),
            lines = self.reader.lines_read(),
            "Finished scanning dump"
        );
    }
}

impl<R: Record> Iterator for DumpScanner<R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }
            if self.finished {
                return None;
            }
            let more = match self.reader.read_line() {
                Ok(Some(line)) => {
                    self.pending
                        .extend(TupleTokenizer::new(&line).filter_map(|t| R::from_tuple(&t)));
                    true
                }
                Ok(None) => false,
                Err(e) => {
                    self.finished = true;
                    self.progress.abandon();
                    return Some(Err(e.context(format!(
                        "Failed while scanning {}",
                        self.path.display()
                    ))));
                }
            };
            if !more {
                self.finish();
                continue;
            }
            let lines = self.reader.lines_read();
            if lines % self.progress_interval == 0 {
                self.progress.set_message(format!(
                    "{}: {} lines",
                    self.path.display(),
                    lines
                ));
                self.progress.tick();
            }
        }
    }
}

/// A dataset that can be scanned from the start more than once
pub trait RecordSource<R> {
    type Records: Iterator<Item = Result<R>>;

    fn records(&self) -> Result<Self::Records>;
}

/// Dump file on disk; every call to `records` reopens and rescans it
#[derive(Debug, Clone)]
pub struct DumpFile {
    path: PathBuf,
    show_progress: bool,
}

impl DumpFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn scan<R: Record>(&self) -> Result<DumpScanner<R>> {
        debug!(path = %self.path.display(), "Opening dump");
        let scanner = DumpScanner::open(&self.path)?;
        if !self.show_progress {
            return Ok(scanner);
        }
        Ok(scanner.with_progress(
            make_spinner(&format!("Scanning {}", self.path.display())),
            PROGRESS_INTERVAL,
        ))
    }
}

impl<R: Record> RecordSource<R> for DumpFile {
    type Records = DumpScanner<R>;

    fn records(&self) -> Result<DumpScanner<R>> {
        self.scan()
    }
}

/// In-memory dataset, mostly for tests and small fixtures
impl<R: Clone> RecordSource<R> for Vec<R> {
    type Records = std::iter::Map<std::vec::IntoIter<R>, fn(R) -> Result<R>>;

    fn records(&self) -> Result<Self::Records> {
        let wrap: fn(R) -> Result<R> = Ok;
        Ok(self.clone().into_iter().map(wrap))
    }
}

fn make_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb
}
