use crate::item::codec::LoadPolicy;
use crate::item::repo::DEFAULT_DATA_FILE;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

pub mod logging;

/// 환경 변수로 설정 값을 덮어쓸 때 사용하는 접두어 (예: `LIBRARY_DATA_FILE`)
pub const ENV_PREFIX: &str = "LIBRARY";

/// 실행 환경에 따라 .env 파일을 로드한다.
pub fn load_dotenv() {
    let env_filename = env::var("RUN_MODE")
        .map(|env| format!(".env.{}", env))
        .unwrap_or_else(|_| ".env".into());

    dotenvy::from_filename(env_filename).ok();
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    data_file: PathBuf,
    load_policy: LoadPolicy,
    logger: Option<logging::Config>,
}

impl AppConfig {
    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn load_policy(&self) -> LoadPolicy {
        self.load_policy
    }

    pub fn logger(&self) -> Option<&logging::Config> {
        self.logger.as_ref()
    }
}

/// 명령줄 인자 등 설정 파일/환경 변수보다 우선 적용할 값
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub data_file: Option<PathBuf>,
    pub load_policy: Option<LoadPolicy>,
}

/// 설정을 불러온다.
///
/// 기본값, `config/{RUN_MODE}.json`(없어도 됨), `LIBRARY_` 환경 변수, [`Overrides`] 순서로 덮어쓴다.
pub fn load_config(overrides: &Overrides) -> Result<AppConfig, ConfigError> {
    let env = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
    let builder = config::Config::builder()
        .add_source(config::File::with_name(&format!("config/{}.json", env)).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX));

    build_config(builder, overrides)
}

fn build_config(builder: ConfigBuilder<DefaultState>, overrides: &Overrides) -> Result<AppConfig, ConfigError> {
    let mut builder = builder
        .set_default("data_file", DEFAULT_DATA_FILE)?
        .set_default("load_policy", LoadPolicy::default().as_str())?;

    if let Some(path) = &overrides.data_file {
        builder = builder.set_override("data_file", path.to_string_lossy().into_owned())?;
    }

    if let Some(policy) = overrides.load_policy {
        builder = builder.set_override("load_policy", policy.as_str())?;
    }

    builder.build()?.try_deserialize()
}
