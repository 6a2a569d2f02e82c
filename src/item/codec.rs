use crate::item::{Book, Format, ItemError};
use serde::Deserialize;
use std::io;
use std::io::{BufRead, Write};
use std::string::FromUtf8Error;
use thiserror::Error;
use tracing::warn;

/// 필드 구분자
///
/// 필드 안의 구분자는 이스케이프 하지 않는다. 제목/저자/파일 형식에 구분자가 포함되면 다시 읽을 수 없다.
pub const SEPARATOR: char = ',';

const PRINT_FIELDS: usize = 4;
const ELECTRONIC_FIELDS: usize = 6;

/// 잘못된 줄을 만났을 때의 처리 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// 잘못된 줄에서 불러오기를 멈추고 그 전까지 읽은 도서만 사용한다.
    #[default]
    Abort,

    /// 잘못된 줄은 건너뛰고 계속 읽는다.
    Skip,
}

impl LoadPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadPolicy::Abort => "abort",
            LoadPolicy::Skip => "skip",
        }
    }
}

impl TryFrom<&str> for LoadPolicy {
    type Error = ItemError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "abort" => Ok(LoadPolicy::Abort),
            "skip" => Ok(LoadPolicy::Skip),
            _ => Err(ItemError::InvalidValue(format!("Unknown load policy: {}", value))),
        }
    }
}

/// 한 줄을 도서로 변환하지 못한 이유
#[derive(Debug, Error, PartialEq)]
pub enum LineError {
    #[error("expected {expected} fields but found {actual}")]
    FieldCount { expected: usize, actual: usize },

    #[error("invalid year {0:?}")]
    Year(String),

    #[error("invalid e-book flag {0:?}, expected true or false")]
    Flag(String),

    #[error("invalid file size {0:?}")]
    FileSize(String),

    #[error("line is not valid UTF-8: {0}")]
    Encoding(#[source] FromUtf8Error),

    #[error(transparent)]
    Record(#[from] ItemError),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read line {line}: {source}")]
    Io {
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("malformed record at line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: LineError,
    },
}

/// [`decode`]의 결과
///
/// `errors`가 비어 있지 않더라도 `books`에는 정상적으로 읽은 도서가 들어 있다.
#[derive(Debug, Default)]
pub struct Decoded {
    pub books: Vec<Book>,
    pub errors: Vec<DecodeError>,
}

/// 도서 한 권을 한 줄로 변환한다. 줄바꿈 문자는 포함하지 않는다.
///
/// # Example
/// ```
/// use library_catalog::item::Book;
/// use library_catalog::item::codec::encode_line;
///
/// let book = Book::builder()
///     .title("Foo".to_owned())
///     .author("Bar".to_owned())
///     .year(2000)
///     .electronic("EPUB".to_owned(), 1.5)
///     .build()
///     .unwrap();
/// assert_eq!(encode_line(&book), "Foo,Bar,2000,true,EPUB,1.5");
/// ```
pub fn encode_line(book: &Book) -> String {
    match book.format() {
        Format::Print => format!(
            "{}{sep}{}{sep}{}{sep}false",
            book.title(), book.author(), book.year(), sep = SEPARATOR
        ),
        Format::Electronic(e) => format!(
            "{}{sep}{}{sep}{}{sep}true{sep}{}{sep}{:?}",
            book.title(), book.author(), book.year(), e.file_format(), e.file_size_mb(), sep = SEPARATOR
        ),
    }
}

/// 도서 목록을 한 줄에 한 권씩 기록한다.
pub fn encode<W, B>(writer: &mut W, books: &[B]) -> io::Result<()>
where
    W: Write,
    B: AsRef<Book>,
{
    for book in books {
        writeln!(writer, "{}", encode_line(book.as_ref()))?;
    }
    Ok(())
}

/// 한 줄을 읽어 도서로 변환한다. 반환되는 도서의 아이디는 0이다.
pub fn decode_line(line: &str) -> Result<Book, LineError> {
    let fields: Vec<&str> = line.split(SEPARATOR).collect();
    if fields.len() < PRINT_FIELDS {
        return Err(LineError::FieldCount { expected: PRINT_FIELDS, actual: fields.len() });
    }

    let year = fields[2].trim().parse::<i32>()
        .map_err(|_| LineError::Year(fields[2].to_owned()))?;
    let is_electronic = parse_flag(fields[3])?;

    let expected = if is_electronic { ELECTRONIC_FIELDS } else { PRINT_FIELDS };
    if fields.len() != expected {
        return Err(LineError::FieldCount { expected, actual: fields.len() });
    }

    let mut builder = Book::builder()
        .title(fields[0].to_owned())
        .author(fields[1].to_owned())
        .year(year);

    if is_electronic {
        let file_size_mb = fields[5].trim().parse::<f64>()
            .map_err(|_| LineError::FileSize(fields[5].to_owned()))?;
        builder = builder.electronic(fields[4].to_owned(), file_size_mb);
    }

    Ok(builder.build()?)
}

fn parse_flag(s: &str) -> Result<bool, LineError> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(LineError::Flag(s.to_owned()))
    }
}

/// 전달 받은 리더에서 도서 목록을 읽는다.
///
/// 공백만 있는 줄은 무시한다. 잘못된 줄(UTF-8이 아닌 줄 포함)의 처리는 `policy`를 따르며
/// 읽기 에러가 발생하면 정책과 무관하게 멈춘다.
pub fn decode<R: BufRead>(mut reader: R, policy: LoadPolicy) -> Decoded {
    let mut decoded = Decoded::default();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        line_no += 1;
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(source) => {
                decoded.errors.push(DecodeError::Io { line: line_no, source });
                break;
            }
        }

        let result = String::from_utf8(strip_line_ending(&buf).to_vec())
            .map_err(LineError::Encoding)
            .and_then(|line| {
                if line.trim().is_empty() {
                    Ok(None)
                } else {
                    decode_line(&line).map(Some)
                }
            });

        match result {
            Ok(Some(book)) => decoded.books.push(book),
            Ok(None) => {}
            Err(source) => {
                warn!("{}번째 줄을 도서로 변환 할 수 없습니다. => {} (정책: {:?})", line_no, source, policy);
                decoded.errors.push(DecodeError::Malformed { line: line_no, source });
                if policy == LoadPolicy::Abort {
                    break;
                }
            }
        }
    }

    decoded
}

fn strip_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}
