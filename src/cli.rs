use crate::configs::Overrides;
use crate::item::codec::LoadPolicy;
use clap::Parser;
use std::path::PathBuf;

/// 메뉴 기반 도서 카탈로그 관리 프로그램
///
/// 설정 파일(config/{RUN_MODE}.json)과 LIBRARY_ 환경 변수 보다 명령줄 인자가 우선 한다.
#[derive(Parser, Debug)]
#[command(name = "library-catalog")]
#[command(version, about)]
pub struct Args {
    /// 카탈로그를 저장할 파일 (기본값: library_data.txt)
    #[arg(short = 'f', long)]
    pub data_file: Option<PathBuf>,

    /// 저장 파일에서 잘못된 줄을 만났을 때의 처리 방식 (abort, skip)
    #[arg(short = 'p', long, value_parser = parse_load_policy)]
    pub load_policy: Option<LoadPolicy>,
}

impl Args {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            data_file: self.data_file.clone(),
            load_policy: self.load_policy,
        }
    }
}

fn parse_load_policy(s: &str) -> Result<LoadPolicy, String> {
    LoadPolicy::try_from(s).map_err(|e| e.to_string())
}
