pub mod codec;
pub mod repo;

use chrono::NaiveDate;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Item 모듈에서 사용할 에러 열거
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    /// 필수 데이터가 입력 되지 않음
    RequireArgumentMissing(String),

    /// 사용할 수 없는 값이 입력됨
    InvalidValue(String),
}

impl Display for ItemError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ItemError::RequireArgumentMissing(s) => write!(f, "Missing required argument: {}", s),
            ItemError::InvalidValue(s) => write!(f, "Invalid value: {}", s),
        }
    }
}

impl std::error::Error for ItemError {}

/// 카탈로그에서 도서를 구분하기 위한 아이디
///
/// 카탈로그에 추가될 때 부여되며 파일에는 저장되지 않는다. 아직 카탈로그에 추가되지 않은 도서는 0을 가진다.
pub type BookId = u64;

/// 전자책 고유 정보
#[derive(Debug, Clone, PartialEq)]
pub struct Electronic {
    file_format: String,
    file_size_mb: f64,
}

impl Electronic {
    pub fn new(file_format: String, file_size_mb: f64) -> Self {
        Self { file_format, file_size_mb }
    }

    pub fn file_format(&self) -> &str {
        &self.file_format
    }

    pub fn file_size_mb(&self) -> f64 {
        self.file_size_mb
    }
}

/// 도서 형태
#[derive(Debug, Clone, PartialEq)]
pub enum Format {
    /// 종이책
    Print,

    /// 전자책
    Electronic(Electronic),
}

impl Format {
    pub fn is_electronic(&self) -> bool {
        matches!(self, Format::Electronic(_))
    }

    pub fn electronic(&self) -> Option<&Electronic> {
        match self {
            Format::Print => None,
            Format::Electronic(e) => Some(e),
        }
    }
}

/// 도서
///
/// 대출 상태는 대출일/반납일 두 값으로만 표현된다.
/// 대출일이 있고 반납일이 없거나 반납일이 대출일보다 앞서면 대출 중인 도서로 본다.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    id: BookId,
    title: String,
    author: String,
    year: i32,
    format: Format,
    borrow_date: Option<NaiveDate>,
    return_date: Option<NaiveDate>,
}

impl Book {
    pub fn builder() -> BookBuilder {
        BookBuilder::new()
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    pub fn borrow_date(&self) -> Option<NaiveDate> {
        self.borrow_date
    }

    pub fn return_date(&self) -> Option<NaiveDate> {
        self.return_date
    }

    pub fn is_borrowed(&self) -> bool {
        match (self.borrow_date, self.return_date) {
            (Some(_), None) => true,
            (Some(borrowed), Some(returned)) => returned < borrowed,
            _ => false,
        }
    }

    /// 전달 받은 제목이 이 도서의 제목과 대소문자 구분 없이 일치하는지 확인한다.
    pub fn title_matches(&self, title: &str) -> bool {
        self.title.chars().flat_map(char::to_lowercase)
            .eq(title.chars().flat_map(char::to_lowercase))
    }

    pub(crate) fn set_id(&mut self, id: BookId) {
        self.id = id;
    }

    /// 대출일을 설정하고 이전 대출의 반납일은 지운다.
    pub(crate) fn set_borrow_date(&mut self, date: NaiveDate) {
        self.borrow_date = Some(date);
        self.return_date = None;
    }

    pub(crate) fn set_return_date(&mut self, date: NaiveDate) {
        self.return_date = Some(date);
    }

    pub fn to_builder(&self) -> BookBuilder {
        let mut builder = BookBuilder::new()
            .id(self.id)
            .title(self.title.clone())
            .author(self.author.clone())
            .year(self.year);

        if let Format::Electronic(e) = &self.format {
            builder = builder.electronic(e.file_format.clone(), e.file_size_mb);
        }

        if let Some(date) = self.borrow_date {
            builder = builder.borrow_date(date);
        }

        if let Some(date) = self.return_date {
            builder = builder.return_date(date);
        }

        builder
    }
}

impl AsRef<Book> for Book {
    fn as_ref(&self) -> &Book {
        self
    }
}

impl Display for Book {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {} ({})", self.title, self.author, self.year)?;
        if let Format::Electronic(e) = &self.format {
            write!(f, "\nFile Format: {}\nFile Size: {:?} MB", e.file_format, e.file_size_mb)?;
        }
        Ok(())
    }
}

/// Book 빌더
#[derive(Debug, Clone, PartialEq)]
pub struct BookBuilder {
    id: Option<BookId>,
    title: Option<String>,
    author: Option<String>,
    year: Option<i32>,
    format: Format,
    borrow_date: Option<NaiveDate>,
    return_date: Option<NaiveDate>,
}

impl BookBuilder {
    pub fn new() -> Self {
        Self {
            id: None,
            title: None,
            author: None,
            year: None,
            format: Format::Print,
            borrow_date: None,
            return_date: None,
        }
    }

    pub fn id(mut self, id: BookId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }

    pub fn author(mut self, author: String) -> Self {
        self.author = Some(author);
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn electronic(mut self, file_format: String, file_size_mb: f64) -> Self {
        self.format = Format::Electronic(Electronic::new(file_format, file_size_mb));
        self
    }

    pub fn borrow_date(mut self, date: NaiveDate) -> Self {
        self.borrow_date = Some(date);
        self
    }

    pub fn return_date(mut self, date: NaiveDate) -> Self {
        self.return_date = Some(date);
        self
    }

    pub fn build(self) -> Result<Book, ItemError> {
        let title = self.title.ok_or(ItemError::RequireArgumentMissing("title".to_owned()))?;
        if title.is_empty() {
            return Err(ItemError::InvalidValue("title must not be empty".to_owned()));
        }
        let author = self.author.ok_or(ItemError::RequireArgumentMissing("author".to_owned()))?;
        let year = self.year.ok_or(ItemError::RequireArgumentMissing("year".to_owned()))?;

        Ok(Book {
            id: self.id.unwrap_or(0),
            title,
            author,
            year,
            format: self.format,
            borrow_date: self.borrow_date,
            return_date: self.return_date,
        })
    }
}

impl Default for BookBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 불러온 도서 목록과 불러오는 중 발생한 에러
///
/// 저장소는 불러오기에 실패하더라도 그때까지 읽은 도서는 그대로 반환한다.
#[derive(Debug, Default)]
pub struct Loaded {
    pub books: Vec<Book>,
    pub errors: Vec<repo::StoreError>,
}

/// 도서 저장소
pub trait BookRepository {

    /// 저장소의 모든 도서를 저장된 순서대로 가져온다.
    fn load_all(&self) -> Loaded;

    /// 전달 받은 도서 목록으로 저장소 전체를 덮어쓴다.
    fn save_all(&self, books: &[Book]) -> Result<(), repo::StoreError>;
}
