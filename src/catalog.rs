use crate::item::{Book, BookId};
use chrono::NaiveDate;
use std::fmt;
use std::fmt::{Display, Formatter};
use tracing::debug;

/// 대출/반납 중 발생한 에러 열거
///
/// 카탈로그에 없는 도서와 이미 대출된 도서를 구분하지 않는다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanError {
    /// 대출 할 수 없는 도서
    NotAvailable(BookId),

    /// 반납 할 수 없는 도서
    NotBorrowed(BookId),
}

impl Display for LoanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LoanError::NotAvailable(id) => write!(f, "Book not available for borrowing: #{}", id),
            LoanError::NotBorrowed(id) => write!(f, "Book not borrowed: #{}", id),
        }
    }
}

impl std::error::Error for LoanError {}

/// 도서 카탈로그
///
/// 도서를 추가된 순서대로 보관하며 모든 검색은 선형 탐색으로 한다.
/// 추가되는 도서마다 1부터 시작하는 아이디를 부여하며 한번 부여한 아이디는 다시 사용하지 않는다.
#[derive(Debug, Clone)]
pub struct Catalog {
    books: Vec<Book>,
    next_id: BookId,
}

impl Catalog {
    pub fn new() -> Self {
        Self { books: Vec::new(), next_id: 1 }
    }

    /// 전달 받은 순서대로 도서를 추가한 카탈로그를 생성한다.
    pub fn with_books<I: IntoIterator<Item = Book>>(books: I) -> Self {
        let mut catalog = Self::new();
        for book in books {
            catalog.add(book);
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// 카탈로그의 모든 도서를 추가된 순서대로 반환한다.
    pub fn list_all(&self) -> &[Book] {
        &self.books
    }

    pub fn into_books(self) -> Vec<Book> {
        self.books
    }

    pub fn get(&self, id: BookId) -> Option<&Book> {
        self.books.iter().find(|b| b.id() == id)
    }

    fn get_mut(&mut self, id: BookId) -> Option<&mut Book> {
        self.books.iter_mut().find(|b| b.id() == id)
    }

    /// 도서를 카탈로그 끝에 추가하고 부여한 아이디를 반환한다.
    ///
    /// 도서가 가지고 있던 아이디는 무시된다. 저장은 호출하는 쪽에서 해야 한다.
    pub fn add(&mut self, mut book: Book) -> BookId {
        let id = self.next_id;
        self.next_id += 1;

        book.set_id(id);
        debug!("도서를 카탈로그에 추가 합니다. (ID: {}, 제목: {})", id, book.title());
        self.books.push(book);
        id
    }

    /// 아이디에 해당하는 도서를 제거한다. 없는 아이디일 경우 아무것도 하지 않는다.
    pub fn remove(&mut self, id: BookId) -> Option<Book> {
        let position = self.books.iter().position(|b| b.id() == id)?;
        let book = self.books.remove(position);
        debug!("도서를 카탈로그에서 제거 합니다. (ID: {}, 제목: {})", id, book.title());
        Some(book)
    }

    /// 대소문자 구분 없이 제목이 일치하는 첫번째 도서를 찾는다.
    pub fn find_by_title(&self, title: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.title_matches(title))
    }

    /// 도서의 대출일을 설정한다.
    ///
    /// 이미 대출된 도서라도 대출일을 덮어쓴다.
    pub fn borrow_book(&mut self, id: BookId, date: NaiveDate) -> Result<&Book, LoanError> {
        let book = self.get_mut(id).ok_or(LoanError::NotAvailable(id))?;
        book.set_borrow_date(date);
        debug!("도서가 대출 되었습니다. (ID: {}, 대출일: {})", id, date);
        Ok(&*book)
    }

    /// 도서의 반납일을 설정한다.
    ///
    /// 대출 여부나 대출일과의 선후 관계는 검사하지 않는다.
    pub fn return_book(&mut self, id: BookId, date: NaiveDate) -> Result<&Book, LoanError> {
        let book = self.get_mut(id).ok_or(LoanError::NotBorrowed(id))?;
        book.set_return_date(date);
        debug!("도서가 반납 되었습니다. (ID: {}, 반납일: {})", id, date);
        Ok(&*book)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn book(title: &str, author: &str) -> Book {
        Book::builder()
            .title(title.to_owned())
            .author(author.to_owned())
            .year(1965)
            .build()
            .unwrap()
    }

    fn titles(catalog: &Catalog) -> Vec<(BookId, &str)> {
        catalog.list_all().iter().map(|b| (b.id(), b.title())).collect()
    }

    #[test]
    fn add_assigns_sequential_ids_in_order() {
        let mut catalog = Catalog::new();
        assert_eq!(catalog.add(book("Dune", "Herbert")), 1);
        assert_eq!(catalog.add(book("Emma", "Austen")), 2);

        assert_eq!(titles(&catalog), vec![(1, "Dune"), (2, "Emma")]);
    }

    #[test]
    fn add_overrides_existing_id() {
        let mut catalog = Catalog::new();
        let id = catalog.add(book("Dune", "Herbert").to_builder().id(42).build().unwrap());
        assert_eq!(id, 1);
        assert_eq!(catalog.get(1).unwrap().title(), "Dune");
        assert!(catalog.get(42).is_none());
    }

    #[test]
    fn remove_by_id_and_ignore_missing() {
        let mut catalog = Catalog::with_books(vec![book("Dune", "Herbert"), book("Emma", "Austen")]);

        assert_eq!(catalog.remove(1).map(|b| b.title().to_owned()), Some("Dune".to_owned()));
        assert!(catalog.remove(1).is_none());
        assert!(catalog.remove(99).is_none());
        assert_eq!(titles(&catalog), vec![(2, "Emma")]);
    }

    #[test]
    fn ids_are_not_reused_after_remove() {
        let mut catalog = Catalog::with_books(vec![book("Dune", "Herbert")]);
        catalog.remove(1);
        assert_eq!(catalog.add(book("Emma", "Austen")), 2);
    }

    #[test]
    fn find_by_title_is_case_insensitive_and_first_wins() {
        let catalog = Catalog::with_books(vec![
            book("Dune", "Herbert"),
            book("DUNE", "Someone Else"),
        ]);

        let found = catalog.find_by_title("dune").unwrap();
        assert_eq!(found.id(), 1);
        assert_eq!(found.author(), "Herbert");
        assert!(catalog.find_by_title("Dune Messiah").is_none());
        assert!(Catalog::new().find_by_title("Dune").is_none());
    }

    #[test]
    fn borrow_sets_date_and_overwrites() {
        let mut catalog = Catalog::with_books(vec![book("Dune", "Herbert")]);

        let borrowed = catalog.borrow_book(1, date(2024, 1, 1)).unwrap();
        assert_eq!(borrowed.borrow_date(), Some(date(2024, 1, 1)));
        assert!(borrowed.is_borrowed());

        catalog.borrow_book(1, date(2024, 1, 5)).unwrap();
        assert_eq!(catalog.get(1).unwrap().borrow_date(), Some(date(2024, 1, 5)));
    }

    #[test]
    fn borrow_missing_book_leaves_catalog_unchanged() {
        let mut catalog = Catalog::with_books(vec![book("Dune", "Herbert")]);
        let before = catalog.list_all().to_vec();

        assert_eq!(catalog.borrow_book(7, date(2024, 1, 1)).unwrap_err(), LoanError::NotAvailable(7));
        assert_eq!(catalog.list_all(), before.as_slice());
    }

    #[test]
    fn return_sets_date_without_checking_borrow() {
        let mut catalog = Catalog::with_books(vec![book("Dune", "Herbert")]);

        let returned = catalog.return_book(1, date(2024, 1, 2)).unwrap();
        assert_eq!(returned.return_date(), Some(date(2024, 1, 2)));
        assert_eq!(returned.borrow_date(), None);
    }

    #[test]
    fn return_missing_book_leaves_catalog_unchanged() {
        let mut catalog = Catalog::with_books(vec![book("Dune", "Herbert")]);
        let before = catalog.list_all().to_vec();

        assert_eq!(catalog.return_book(3, date(2024, 1, 2)).unwrap_err(), LoanError::NotBorrowed(3));
        assert_eq!(catalog.list_all(), before.as_slice());
    }

    #[test]
    fn borrow_then_return_round_trip() {
        let mut catalog = Catalog::with_books(vec![book("Dune", "Herbert")]);
        catalog.borrow_book(1, date(2024, 1, 1)).unwrap();
        catalog.return_book(1, date(2024, 1, 2)).unwrap();

        let book = catalog.get(1).unwrap();
        assert!(!book.is_borrowed());
        assert_eq!((book.borrow_date(), book.return_date()), (Some(date(2024, 1, 1)), Some(date(2024, 1, 2))));
    }

    #[test]
    fn same_day_borrow_after_return_is_borrowed() {
        let mut catalog = Catalog::with_books(vec![book("Dune", "Herbert")]);
        let today = date(2024, 1, 1);

        catalog.borrow_book(1, today).unwrap();
        catalog.return_book(1, today).unwrap();
        assert!(!catalog.get(1).unwrap().is_borrowed());

        let book = catalog.borrow_book(1, today).unwrap();
        assert!(book.is_borrowed());
        assert_eq!((book.borrow_date(), book.return_date()), (Some(today), None));
    }
}
