use crate::catalog::{Catalog, LoanError};
use crate::item::{Book, BookRepository};
use chrono::NaiveDate;
use std::io;
use std::io::{BufRead, Write};
use tracing::{info, warn};

/// 오늘 날짜를 제공하는 트레이트
///
/// `Fn() -> NaiveDate` 형태의 함수나 클로저는 모두 [`Clock`]으로 사용 할 수 있다.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

impl<T> Clock for T where T: Fn() -> NaiveDate {
    fn today(&self) -> NaiveDate {
        self()
    }
}

/// 로컬 시간대 기준 오늘 날짜
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// 메뉴 항목
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Add,
    Borrow,
    Return,
    Display,
    Exit,
}

impl TryFrom<u32> for MenuChoice {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MenuChoice::Add),
            2 => Ok(MenuChoice::Borrow),
            3 => Ok(MenuChoice::Return),
            4 => Ok(MenuChoice::Display),
            5 => Ok(MenuChoice::Exit),
            _ => Err(value),
        }
    }
}

impl MenuChoice {
    /// 입력 받은 한 줄을 메뉴 항목으로 변환한다. 숫자가 아니거나 없는 번호면 [`None`]
    pub fn parse(s: &str) -> Option<Self> {
        s.trim().parse::<u32>().ok().and_then(|n| Self::try_from(n).ok())
    }
}

enum Flow {
    Continue,
    Exit,
}

/// 메뉴 기반 콘솔
///
/// 입력/출력 스트림을 인자로 받아 표준 입출력 뿐만 아니라 메모리 버퍼로도 실행 할 수 있다.
/// 도서를 추가하거나 종료할 때 카탈로그 전체를 저장소에 저장한다.
pub struct Console<R: BookRepository, C: Clock> {
    catalog: Catalog,
    repository: R,
    clock: C,
}

impl<R: BookRepository, C: Clock> Console<R, C> {
    pub fn new(catalog: Catalog, repository: R, clock: C) -> Self {
        Self { catalog, repository, clock }
    }

    /// 저장소에서 카탈로그를 불러와 콘솔을 생성한다.
    ///
    /// 불러오기 중 발생한 에러는 `output`에 출력하고 읽은 도서까지만 사용한다. 저장 파일이 없는 경우는 출력하지 않는다.
    pub fn open<O: Write>(repository: R, clock: C, output: &mut O) -> io::Result<Self> {
        let loaded = repository.load_all();
        for err in loaded.errors.iter().filter(|e| !e.is_missing()) {
            writeln!(output, "Error reading library data from file: {}", err)?;
        }

        Ok(Self::new(Catalog::with_books(loaded.books), repository, clock))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// 종료 메뉴를 선택하거나 입력이 끝날 때까지 메뉴를 반복한다.
    pub fn run<I: BufRead, O: Write>(&mut self, mut input: I, mut output: O) -> io::Result<()> {
        loop {
            write_menu(&mut output)?;

            let Some(line) = read_line(&mut input)? else {
                info!("입력이 종료 되어 프로그램을 종료 합니다.");
                return self.exit(&mut output);
            };

            let flow = match MenuChoice::parse(&line) {
                Some(choice) => self.perform(choice, &mut input, &mut output)?,
                None => {
                    writeln!(output, "Invalid option. Please choose again.")?;
                    Flow::Continue
                }
            };

            if let Flow::Exit = flow {
                return self.exit(&mut output);
            }
        }
    }

    fn perform<I: BufRead, O: Write>(&mut self, choice: MenuChoice, input: &mut I, output: &mut O) -> io::Result<Flow> {
        match choice {
            MenuChoice::Add => self.add_book(input, output),
            MenuChoice::Borrow => self.borrow_book(input, output),
            MenuChoice::Return => self.return_book(input, output),
            MenuChoice::Display => {
                self.display_books(output)?;
                Ok(Flow::Continue)
            }
            MenuChoice::Exit => Ok(Flow::Exit),
        }
    }

    fn add_book<I: BufRead, O: Write>(&mut self, input: &mut I, output: &mut O) -> io::Result<Flow> {
        let Some(title) = prompt(input, output, "Enter title: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(author) = prompt(input, output, "Enter author: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(year) = prompt_until(input, output, "Enter year: ", "Invalid year. Please enter a whole number.",
                                      |s| s.parse::<i32>().ok())? else {
            return Ok(Flow::Exit);
        };
        let Some(is_ebook) = prompt_until(input, output, "Is it an EBook? (true/false): ", "Please answer true or false.",
                                          parse_bool)? else {
            return Ok(Flow::Exit);
        };

        let mut builder = Book::builder()
            .title(title)
            .author(author)
            .year(year);

        if is_ebook {
            let Some(file_format) = prompt(input, output, "Enter file format: ")? else {
                return Ok(Flow::Exit);
            };
            let Some(file_size) = prompt_until(input, output, "Enter file size (MB): ", "Invalid file size. Please enter a number.",
                                               |s| s.parse::<f64>().ok())? else {
                return Ok(Flow::Exit);
            };
            builder = builder.electronic(file_format, file_size);
        }

        match builder.build() {
            Ok(book) => {
                let id = self.catalog.add(book);
                info!("도서가 추가 되었습니다. (ID: {})", id);
                self.save(output)?;
            }
            Err(e) => {
                warn!("도서를 추가 할 수 없습니다. => {}", e);
                writeln!(output, "Cannot add book: {}", e)?;
            }
        }
        Ok(Flow::Continue)
    }

    fn borrow_book<I: BufRead, O: Write>(&mut self, input: &mut I, output: &mut O) -> io::Result<Flow> {
        let Some(title) = prompt(input, output, "Enter the title of the book to borrow: ")? else {
            return Ok(Flow::Exit);
        };
        let Some((id, title)) = self.catalog.find_by_title(&title).map(|b| (b.id(), b.title().to_owned())) else {
            writeln!(output, "Book not found in library.")?;
            return Ok(Flow::Continue);
        };

        match self.catalog.borrow_book(id, self.clock.today()) {
            Ok(book) => writeln!(output, "Book borrowed: {}", book.title())?,
            Err(e) => writeln!(output, "{}", loan_failure(&e, &title))?,
        }
        Ok(Flow::Continue)
    }

    fn return_book<I: BufRead, O: Write>(&mut self, input: &mut I, output: &mut O) -> io::Result<Flow> {
        let Some(title) = prompt(input, output, "Enter the title of the book to return: ")? else {
            return Ok(Flow::Exit);
        };
        let Some((id, title)) = self.catalog.find_by_title(&title).map(|b| (b.id(), b.title().to_owned())) else {
            writeln!(output, "Book not found in library.")?;
            return Ok(Flow::Continue);
        };

        match self.catalog.return_book(id, self.clock.today()) {
            Ok(book) => writeln!(output, "Book returned: {}", book.title())?,
            Err(e) => writeln!(output, "{}", loan_failure(&e, &title))?,
        }
        Ok(Flow::Continue)
    }

    fn display_books<O: Write>(&self, output: &mut O) -> io::Result<()> {
        writeln!(output, "Library Books:")?;
        for book in self.catalog.list_all() {
            writeln!(output, "{}", book)?;
            if let (true, Some(date)) = (book.is_borrowed(), book.borrow_date()) {
                writeln!(output, "Borrowed: {}", date)?;
            }
        }
        Ok(())
    }

    /// 카탈로그를 저장한다. 저장에 실패하면 메시지만 출력하고 계속 진행한다.
    fn save<O: Write>(&self, output: &mut O) -> io::Result<()> {
        if let Err(e) = self.repository.save_all(self.catalog.list_all()) {
            writeln!(output, "Error saving library data to file: {}", e)?;
        }
        Ok(())
    }

    fn exit<O: Write>(&self, output: &mut O) -> io::Result<()> {
        self.save(output)?;
        writeln!(output, "Exiting...")?;
        output.flush()
    }
}

/// 대출/반납 실패 메시지로 아이디 대신 도서 제목을 보여준다.
fn loan_failure(err: &LoanError, title: &str) -> String {
    match err {
        LoanError::NotAvailable(_) => format!("Book not available for borrowing: {}", title),
        LoanError::NotBorrowed(_) => format!("Book not borrowed: {}", title),
    }
}

fn write_menu<O: Write>(output: &mut O) -> io::Result<()> {
    writeln!(output)?;
    writeln!(output, "Library Management System")?;
    writeln!(output, "1. Add Book")?;
    writeln!(output, "2. Borrow Book")?;
    writeln!(output, "3. Return Book")?;
    writeln!(output, "4. Display Books")?;
    writeln!(output, "5. Exit")?;
    write!(output, "Choose an option: ")?;
    output.flush()
}

/// 한 줄을 읽어 줄바꿈 문자를 제거한다. 입력이 끝났으면 [`None`]
fn read_line<I: BufRead>(input: &mut I) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }

    let len = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(len);
    Ok(Some(line))
}

fn prompt<I: BufRead, O: Write>(input: &mut I, output: &mut O, message: &str) -> io::Result<Option<String>> {
    write!(output, "{}", message)?;
    output.flush()?;
    read_line(input)
}

/// 올바른 값이 입력될 때까지 다시 묻는다.
fn prompt_until<I, O, T, F>(input: &mut I, output: &mut O, message: &str, invalid: &str, parse: F) -> io::Result<Option<T>>
where
    I: BufRead,
    O: Write,
    F: Fn(&str) -> Option<T>,
{
    loop {
        let Some(line) = prompt(input, output, message)? else {
            return Ok(None);
        };
        match parse(line.trim()) {
            Some(value) => return Ok(Some(value)),
            None => writeln!(output, "{}", invalid)?,
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
