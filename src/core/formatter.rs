//! Template formatter
//!
//! A template is literal text with attribute references written as
//! `${name}`. Compilation turns it into an ordered rendering plan of literal
//! segments and field extractors; rendering walks the plan once per record.
//!
//! ```
//! use rust_rotating_logger::core::{Formatter, LogLevel, LogRecord};
//!
//! let formatter = Formatter::compile("[${levelname}] ${name}: ${message}").unwrap();
//! let record = LogRecord::new("db", LogLevel::Warn, "slow query");
//! assert_eq!(formatter.format(&record), b"[WARN] db: slow query\n");
//! ```

use super::call_site::CallSite;
use super::log_record::LogRecord;
use chrono::{DateTime, Local};
use std::fmt;
use std::str::FromStr;

/// Template used when a handler is given no formatter of its own
pub const DEFAULT_TEMPLATE: &str =
    "${datetime} ${filename}:${lineno}-[${levelname}]-${name}-${message}";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("unknown attribute '${{{0}}}'")]
    UnknownAttribute(String),

    #[error("unterminated attribute reference starting at byte {0}")]
    Unterminated(usize),

    #[error("template must reference ${{message}}")]
    MissingMessage,
}

/// Record attribute a template can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Date,
    Time,
    DateTime,
    FileName,
    FilePath,
    FuncName,
    LineNo,
    LevelName,
    Name,
    Message,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Time => "time",
            Field::DateTime => "datetime",
            Field::FileName => "filename",
            Field::FilePath => "filepath",
            Field::FuncName => "funcname",
            Field::LineNo => "lineno",
            Field::LevelName => "levelname",
            Field::Name => "name",
            Field::Message => "message",
        }
    }

    /// Whether rendering this field needs the record's call-site
    pub fn uses_call_site(&self) -> bool {
        matches!(
            self,
            Field::FileName | Field::FilePath | Field::FuncName | Field::LineNo
        )
    }

    fn render(&self, record: &LogRecord, now: &DateTime<Local>, out: &mut Vec<u8>) {
        use std::io::Write;

        let unknown;
        let site = match record.call_site.as_ref() {
            Some(site) => site,
            None => {
                unknown = CallSite::unknown();
                &unknown
            }
        };

        match self {
            Field::Date => {
                let _ = write!(out, "{}", now.format(DATE_FORMAT));
            }
            Field::Time => {
                let _ = write!(out, "{}", now.format(TIME_FORMAT));
            }
            Field::DateTime => {
                let _ = write!(out, "{}", now.format(DATETIME_FORMAT));
            }
            Field::FileName => out.extend_from_slice(site.file_name().as_bytes()),
            Field::FilePath => out.extend_from_slice(site.file.as_bytes()),
            Field::FuncName => out.extend_from_slice(site.function.as_bytes()),
            Field::LineNo => {
                let _ = write!(out, "{}", site.line);
            }
            Field::LevelName => out.extend_from_slice(record.level.to_str().as_bytes()),
            Field::Name => out.extend_from_slice(record.logger_name.as_bytes()),
            Field::Message => out.extend_from_slice(record.message.as_bytes()),
        }
    }
}

impl FromStr for Field {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "date" => Field::Date,
            "time" => Field::Time,
            "datetime" => Field::DateTime,
            "filename" => Field::FileName,
            "filepath" => Field::FilePath,
            "funcname" => Field::FuncName,
            "lineno" => Field::LineNo,
            "levelname" => Field::LevelName,
            "name" => Field::Name,
            "message" => Field::Message,
            other => return Err(CompileError::UnknownAttribute(other.to_string())),
        })
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of the rendering plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Field(Field),
}

/// A compiled template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatter {
    template: String,
    segments: Vec<Segment>,
    literal_len: usize,
}

impl Formatter {
    /// Compile a template into a rendering plan.
    ///
    /// A `$` that is not followed by `{` is kept as a literal character.
    pub fn compile(template: &str) -> Result<Self, CompileError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((start, c)) = chars.next() {
            if c != '$' || !matches!(chars.peek(), Some((_, '{'))) {
                literal.push(c);
                continue;
            }
            chars.next();

            let mut name = String::new();
            let mut closed = false;
            for (_, c) in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                name.push(c);
            }
            if !closed {
                return Err(CompileError::Unterminated(start));
            }

            let field = name.parse::<Field>()?;
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Field(field));
        }

        if !segments.contains(&Segment::Field(Field::Message)) {
            return Err(CompileError::MissingMessage);
        }

        literal.push('\n');
        segments.push(Segment::Literal(literal));

        let literal_len = segments
            .iter()
            .map(|s| match s {
                Segment::Literal(text) => text.len(),
                Segment::Field(_) => 0,
            })
            .sum();

        Ok(Self {
            template: template.to_string(),
            segments,
            literal_len,
        })
    }

    /// Render a record, sampling the wall clock for date and time fields
    pub fn format(&self, record: &LogRecord) -> Vec<u8> {
        self.format_at(record, &Local::now())
    }

    /// Render a record against an explicit instant
    pub fn format_at(&self, record: &LogRecord, now: &DateTime<Local>) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.literal_len + record.message.len() + 32);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.extend_from_slice(text.as_bytes()),
                Segment::Field(field) => field.render(record, now, &mut out),
            }
        }
        out
    }

    /// Source template
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Field extractors in rendering order
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field(field) => Some(*field),
            Segment::Literal(_) => None,
        })
    }

    pub fn needs_call_site(&self) -> bool {
        self.fields().any(|f| f.uses_call_site())
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::compile(DEFAULT_TEMPLATE).expect("default template compiles")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_level::LogLevel;
    use chrono::TimeZone;

    fn record(message: &str) -> LogRecord {
        LogRecord::new("app", LogLevel::Info, message)
    }

    #[test]
    fn test_message_only() {
        let formatter = Formatter::compile("${message}").unwrap();
        assert_eq!(formatter.format(&record("X")), b"X\n");
    }

    #[test]
    fn test_missing_message() {
        assert_eq!(
            Formatter::compile("${levelname} ${name}"),
            Err(CompileError::MissingMessage)
        );
        assert_eq!(Formatter::compile(""), Err(CompileError::MissingMessage));
    }

    #[test]
    fn test_unknown_attribute() {
        assert_eq!(
            Formatter::compile("${bogus} ${message}"),
            Err(CompileError::UnknownAttribute("bogus".to_string()))
        );
    }

    #[test]
    fn test_unterminated_reference() {
        assert_eq!(
            Formatter::compile("${message} ${levelname"),
            Err(CompileError::Unterminated(11))
        );
    }

    #[test]
    fn test_bare_dollar_is_literal() {
        let formatter = Formatter::compile("$5 $$ ${message} $").unwrap();
        assert_eq!(formatter.format(&record("paid")), b"$5 $$ paid $\n");
    }

    #[test]
    fn test_plan_order() {
        let formatter = Formatter::compile("${levelname}|${name}|${message}").unwrap();
        let fields: Vec<Field> = formatter.fields().collect();
        assert_eq!(fields, vec![Field::LevelName, Field::Name, Field::Message]);
        assert_eq!(
            formatter.segments().last(),
            Some(&Segment::Literal("\n".to_string()))
        );
        assert!(!formatter.needs_call_site());
    }

    #[test]
    fn test_call_site_fields() {
        let formatter =
            Formatter::compile("${filepath} ${filename}:${lineno} ${funcname} ${message}").unwrap();
        assert!(formatter.needs_call_site());

        let rec = record("hello")
            .with_call_site(CallSite::new("/srv/app/src/main.rs", 7, "app::main"));
        assert_eq!(
            formatter.format(&rec),
            b"/srv/app/src/main.rs main.rs:7 app::main hello\n"
        );

        assert_eq!(formatter.format(&record("hello")), b"unknown unknown:0 unknown hello\n");
    }

    #[test]
    fn test_date_and_time_fields() {
        let formatter = Formatter::compile("${date}|${time}|${datetime} ${message}").unwrap();
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            formatter.format_at(&record("m"), &now),
            b"2024-03-09|07:05:01|2024-03-09 07:05:01 m\n"
        );
    }

    #[test]
    fn test_default_template() {
        let formatter = Formatter::default();
        assert_eq!(formatter.template(), DEFAULT_TEMPLATE);
        let rendered = String::from_utf8(formatter.format(&record("ready"))).unwrap();
        assert!(rendered.ends_with("-[INFO]-app-ready\n"));
    }
}
