use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::GlobalArgs;
use crate::pairing::UnpairedPolicy;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not determine a data directory; pass --data-dir")]
    NoDataDir,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Directory,
    Sqlite,
}

/// Shape of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub storage: StorageSection,
    pub roster: RosterSection,
    pub pairing: PairingSection,
    pub audit: AuditSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSection {
    pub backend: Option<BackendKind>,
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RosterSection {
    pub path: Option<PathBuf>,
    pub delimiter: Option<char>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PairingSection {
    pub unpaired: Option<UnpairedPolicy>,
    pub seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditSection {
    pub log_file: Option<PathBuf>,
}

impl FileConfig {
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads `path`; a missing file means defaults unless it was asked for explicitly.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => Ok(FileConfig::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// Resolved settings after merging the config file with command-line flags.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub data_dir: PathBuf,
    pub roster_path: Option<PathBuf>,
    pub delimiter: char,
    pub unpaired: UnpairedPolicy,
    pub seed: Option<u64>,
    pub audit_log: PathBuf,
    pub verbose: bool,
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "seatmate")
}

/// `~/.config/seatmate/config.toml` or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

impl Config {
    pub fn from_args(args: &GlobalArgs) -> Result<Self, ConfigError> {
        let file = match (&args.config, default_config_path()) {
            (Some(path), _) => FileConfig::load(path, true)?,
            (None, Some(path)) => FileConfig::load(&path, false)?,
            (None, None) => FileConfig::default(),
        };
        Self::merge(file, args)
    }

    pub fn merge(file: FileConfig, args: &GlobalArgs) -> Result<Self, ConfigError> {
        let data_dir = match args.data_dir.clone().or(file.storage.data_dir) {
            Some(dir) => dir,
            None => project_dirs()
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or(ConfigError::NoDataDir)?,
        };

        let audit_log = file
            .audit
            .log_file
            .unwrap_or_else(|| data_dir.join("logs").join("reshuffle.log"));

        let unpaired = if args.seat_alone {
            UnpairedPolicy::SeatAlone
        } else {
            file.pairing.unpaired.unwrap_or_default()
        };

        Ok(Config {
            backend: args.backend.or(file.storage.backend).unwrap_or_default(),
            data_dir,
            roster_path: args.roster.clone().or(file.roster.path),
            delimiter: args.delimiter.or(file.roster.delimiter).unwrap_or(','),
            unpaired,
            seed: args.seed.or(file.pairing.seed),
            audit_log,
            verbose: args.verbose,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("seatmate.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> GlobalArgs {
        GlobalArgs {
            config: None,
            data_dir: Some(PathBuf::from("/tmp/seatmate-test")),
            backend: None,
            roster: None,
            delimiter: None,
            seed: None,
            seat_alone: false,
            verbose: false,
        }
    }

    #[test]
    fn defaults_without_file() {
        let config = Config::merge(FileConfig::default(), &args()).unwrap();
        assert_eq!(config.backend, BackendKind::Directory);
        assert_eq!(config.delimiter, ',');
        assert_eq!(config.unpaired, UnpairedPolicy::Leave);
        assert_eq!(config.audit_log, PathBuf::from("/tmp/seatmate-test/logs/reshuffle.log"));
        assert!(config.seed.is_none());
    }

    #[test]
    fn file_values_apply() {
        let text = r#"
            [storage]
            backend = "sqlite"

            [roster]
            path = "names.csv"
            delimiter = ";"

            [pairing]
            unpaired = "seat-alone"
            seed = 42

            [audit]
            log_file = "/var/log/seatmate.log"
        "#;
        let file = FileConfig::parse(text, Path::new("config.toml")).unwrap();
        let config = Config::merge(file, &args()).unwrap();

        assert_eq!(config.backend, BackendKind::Sqlite);
        assert_eq!(config.roster_path, Some(PathBuf::from("names.csv")));
        assert_eq!(config.delimiter, ';');
        assert_eq!(config.unpaired, UnpairedPolicy::SeatAlone);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.audit_log, PathBuf::from("/var/log/seatmate.log"));
        assert_eq!(config.database_path(), PathBuf::from("/tmp/seatmate-test/seatmate.db"));
    }

    #[test]
    fn flags_override_file() {
        let file = FileConfig::parse("[pairing]\nseed = 1\n[storage]\nbackend = \"sqlite\"\n", Path::new("c.toml")).unwrap();
        let mut args = args();
        args.seed = Some(9);
        args.backend = Some(BackendKind::Directory);
        args.seat_alone = true;

        let config = Config::merge(file, &args).unwrap();
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.backend, BackendKind::Directory);
        assert_eq!(config.unpaired, UnpairedPolicy::SeatAlone);
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = FileConfig::parse("[storage]\nbakend = \"sqlite\"\n", Path::new("c.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn missing_optional_file_is_default() {
        let config = FileConfig::load(Path::new("/nonexistent/seatmate.toml"), false).unwrap();
        assert!(config.storage.backend.is_none());
        assert!(FileConfig::load(Path::new("/nonexistent/seatmate.toml"), true).is_err());
    }
}
