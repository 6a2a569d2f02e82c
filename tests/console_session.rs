//! 파일 저장소를 사용하는 콘솔 세션 통합 테스트

use chrono::NaiveDate;
use library_catalog::console::Console;
use library_catalog::item::codec::LoadPolicy;
use library_catalog::item::repo::TextFileRepository;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// 저장 파일을 열고 입력을 실행한 뒤 (불러오기 출력, 세션 출력)을 반환한다.
fn session(path: &Path, input: &str) -> (String, String) {
    let repository = TextFileRepository::new(path, LoadPolicy::Abort);

    let mut open_output = Vec::new();
    let mut console = Console::open(repository, today, &mut open_output).expect("Failed to open console");

    let mut output = Vec::new();
    console.run(Cursor::new(input), &mut output).expect("Console session failed");

    (String::from_utf8(open_output).unwrap(), String::from_utf8(output).unwrap())
}

#[test]
fn first_run_without_file_starts_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("library_data.txt");

    let (opened, output) = session(&path, "4\n5\n");

    assert_eq!(opened, "");
    assert!(output.contains("Library Books:\n\nLibrary Management System"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "");
}

#[test]
fn books_added_in_one_session_are_borrowable_in_the_next() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("library_data.txt");

    session(&path, "1\nDune\nHerbert\n1965\nfalse\n1\nFoo\nBar\n2000\ntrue\nEPUB\n1.5\n5\n");
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "Dune,Herbert,1965,false\nFoo,Bar,2000,true,EPUB,1.5\n"
    );

    let (_, output) = session(&path, "2\nfoo\n4\n5\n");
    assert!(output.contains("Book borrowed: Foo\n"));
    assert!(output.contains("Foo by Bar (2000)\nFile Format: EPUB\nFile Size: 1.5 MB\nBorrowed: 2024-01-01\n"));
}

#[test]
fn malformed_file_is_reported_and_partial_catalog_is_kept() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("library_data.txt");
    fs::write(&path, "Dune,Herbert,1965,false\nFoo,Bar,2000,true,EPUB\n").unwrap();

    let (opened, output) = session(&path, "4\n5\n");

    assert!(opened.starts_with("Error reading library data from file: "));
    assert!(opened.contains("line 2"));
    assert!(output.contains("Library Books:\nDune by Herbert (1965)\n\n"));
    // 종료 시 읽은 도서만 다시 저장된다.
    assert_eq!(fs::read_to_string(&path).unwrap(), "Dune,Herbert,1965,false\n");
}
