use anyhow::Result;
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.yml";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("reading {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("no home directory to place data in; pass --data-dir")]
    NoDataDir,
}

/// Contents of `config.yml`. Every field is optional.
#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub blur_delay_secs: Option<u32>,
}

/// Settings after merging flags, environment and the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub log_level: Option<String>,
    pub blur_delay_secs: i64,
}

impl Settings {
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// Flag values win over the file; clap already folds the environment
/// variables into them.
pub fn resolve(
    data_dir_flag: Option<PathBuf>,
    log_level_flag: Option<String>,
    config_path: Option<&Path>,
) -> Result<Settings> {
    let dirs = project_dirs();
    let default_config = dirs.as_ref().map(|d| d.config_dir().join(CONFIG_FILE));
    let file = match config_path.map(Path::to_path_buf).or(default_config) {
        Some(path) => load_file_config(&path)?,
        None => FileConfig::default(),
    };

    let data_dir = match data_dir_flag.or(file.data_dir) {
        Some(dir) => dir,
        None => dirs
            .as_ref()
            .map(|d| d.data_dir().to_path_buf())
            .ok_or(ConfigError::NoDataDir)?,
    };

    Ok(Settings {
        data_dir,
        log_level: log_level_flag.or(file.log_level),
        blur_delay_secs: file
            .blur_delay_secs
            .map(i64::from)
            .unwrap_or(crate::blur::DEFAULT_BLUR_DELAY_SECS),
    })
}

/// A missing file means defaults; a malformed one is an error.
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(FileConfig::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if data.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "mindflow")
}
