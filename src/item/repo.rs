use crate::item::codec::{DecodeError, LoadPolicy};
use crate::item::{codec, Book, BookRepository, Loaded};
use std::fs;
use std::fs::File;
use std::io;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// 기본 저장 파일 이름 (작업 디렉토리 기준)
pub const DEFAULT_DATA_FILE: &str = "library_data.txt";

/// 저장소 사용 중 발생한 에러
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

impl StoreError {
    /// 저장 파일이 아직 없어서 발생한 에러인지 확인한다.
    pub fn is_missing(&self) -> bool {
        matches!(self, StoreError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// 텍스트 파일 도서 저장소
///
/// 파일은 불러오기/저장 할 때마다 열고 닫으며 저장은 항상 파일 전체를 다시 쓴다.
/// 저장 중 실패하더라도 기존 파일이 잘린 채로 남지 않도록 임시 파일에 먼저 기록한 뒤 교체한다.
#[derive(Debug, Clone)]
pub struct TextFileRepository {
    path: PathBuf,
    policy: LoadPolicy,
}

impl TextFileRepository {
    pub fn new<P: Into<PathBuf>>(path: P, policy: LoadPolicy) -> Self {
        Self { path: path.into(), policy }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> LoadPolicy {
        self.policy
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_DATA_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }

    fn write_temp(&self, temp_path: &Path, books: &[Book]) -> io::Result<()> {
        let file = File::create(temp_path)?;
        let mut writer = BufWriter::new(file);
        codec::encode(&mut writer, books)?;
        writer.flush()?;

        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    }
}

impl BookRepository for TextFileRepository {
    fn load_all(&self) -> Loaded {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(source) => {
                let err = self.io_error(source);
                if err.is_missing() {
                    info!("저장 파일이 없어 빈 카탈로그로 시작합니다. => {}", self.path.display());
                } else {
                    error!("저장 파일을 열 수 없습니다. => {}", err);
                }
                return Loaded { books: Vec::new(), errors: vec![err] };
            }
        };

        let decoded = codec::decode(BufReader::new(file), self.policy);
        let errors: Vec<StoreError> = decoded.errors.into_iter()
            .map(|source| StoreError::Decode { path: self.path.clone(), source })
            .collect();

        for err in &errors {
            if let StoreError::Decode { source: DecodeError::Io { .. }, .. } = err {
                error!("저장 파일을 읽는 중 에러가 발생 하였습니다. => {}", err);
            }
        }
        info!("{}권의 도서를 불러왔습니다. (파일: {}, 에러: {})", decoded.books.len(), self.path.display(), errors.len());

        Loaded { books: decoded.books, errors }
    }

    fn save_all(&self, books: &[Book]) -> Result<(), StoreError> {
        let temp_path = self.temp_path();

        if let Err(source) = self.write_temp(&temp_path, books) {
            error!("임시 파일에 저장하는 중 에러가 발생 하였습니다. 기존 파일은 변경 되지 않았습니다. => {} ({})", source, temp_path.display());
            if let Err(e) = fs::remove_file(&temp_path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("임시 파일을 삭제할 수 없습니다. => {} ({})", e, temp_path.display());
                }
            }
            return Err(self.io_error(source));
        }

        fs::rename(&temp_path, &self.path).map_err(|source| {
            error!("저장 파일을 교체 할 수 없습니다. => {} ({})", source, self.path.display());
            _ = fs::remove_file(&temp_path);
            self.io_error(source)
        })?;

        debug!("{}권의 도서를 저장 하였습니다. => {}", books.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn setup() -> (TempDir, TextFileRepository) {
        let dir = TempDir::new().unwrap();
        let repository = TextFileRepository::new(dir.path().join(DEFAULT_DATA_FILE), LoadPolicy::Abort);
        (dir, repository)
    }

    fn books() -> Vec<Book> {
        vec![
            Book::builder().title("Dune".to_owned()).author("Herbert".to_owned()).year(1965).build().unwrap(),
            Book::builder().title("Foo".to_owned()).author("Bar".to_owned()).year(2000)
                .electronic("EPUB".to_owned(), 1.5).build().unwrap(),
        ]
    }

    #[test]
    fn missing_file_loads_empty() {
        let (_dir, repository) = setup();
        let loaded = repository.load_all();

        assert!(loaded.books.is_empty());
        assert_eq!(loaded.errors.len(), 1);
        assert!(loaded.errors[0].is_missing());
    }

    #[test]
    fn save_then_load() {
        let (_dir, repository) = setup();
        repository.save_all(&books()).unwrap();

        let loaded = repository.load_all();
        assert!(loaded.errors.is_empty());
        assert_eq!(loaded.books, books());
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let (dir, repository) = setup();
        repository.save_all(&books()).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path()).unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![DEFAULT_DATA_FILE.to_owned()]);
    }

    #[test]
    fn save_replaces_whole_file() {
        let (_dir, repository) = setup();
        repository.save_all(&books()).unwrap();
        repository.save_all(&books()[..1]).unwrap();

        assert_eq!(fs::read_to_string(repository.path()).unwrap(), "Dune,Herbert,1965,false\n");
    }

    #[test]
    fn failed_save_keeps_previous_file() {
        let (dir, repository) = setup();
        repository.save_all(&books()).unwrap();

        // 임시 파일 경로에 디렉토리가 있으면 임시 파일을 만들 수 없다.
        fs::create_dir(dir.path().join(format!("{}.tmp", DEFAULT_DATA_FILE))).unwrap();
        let result = repository.save_all(&books()[..1]);

        assert!(matches!(result, Err(StoreError::Io { .. })));
        assert_eq!(repository.load_all().books, books());
    }

    #[test]
    fn decode_errors_carry_path() {
        let (_dir, repository) = setup();
        fs::write(repository.path(), "Dune,Herbert,1965,false\nFoo,Bar,x,true,EPUB,1.5\n").unwrap();

        let loaded = repository.load_all();
        assert_eq!(loaded.books.len(), 1);
        assert_eq!(loaded.errors.len(), 1);
        assert!(loaded.errors[0].to_string().contains(DEFAULT_DATA_FILE));
        assert!(!loaded.errors[0].is_missing());
    }
}
