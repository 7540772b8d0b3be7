use crate::error::{Error, OptionError};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix of option keys in property sources.
pub const PROPERTY_PREFIX: &str = "veeline.";

/// Property controlling process exit, never treated as a session option.
pub const PROPERTY_NAME_EXIT: &str = "veeline.system.exit";

/// Environment variables starting with this prefix are read as options.
pub const ENV_PREFIX: &str = "VEELINE_";

const ENV_SAVE_DIR: &str = "VEELINE_SAVE_DIR";
const ENV_BASE_DIR: &str = "VEELINE_BASE_DIR";

const PROPERTIES_FILE: &str = "veeline.toml";

// Listed, but never written to the properties file.
const NOT_SAVED: &[&str] = &["maxwidth", "propertiesfile"];

/// Session options of the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    pub auto_commit: bool,
    pub auto_save: bool,
    pub color: bool,
    pub fast_connect: bool,
    pub force: bool,
    pub header_interval: i64,
    pub history_file: String,
    pub incremental: bool,
    pub isolation: String,
    pub max_column_width: i64,
    pub max_height: i64,
    pub max_width: i64,
    pub number_format: String,
    pub output_format: String,
    pub row_limit: i64,
    pub show_elapsed_time: bool,
    pub show_header: bool,
    pub show_nested_errs: bool,
    pub show_warnings: bool,
    pub silent: bool,
    pub timeout: i64,
    pub trim_scripts: bool,
    pub verbose: bool,
    /// Script to run at start-up. Settable, but not a persisted property.
    pub run: Option<String>,
}

impl Default for Opts {
    fn default() -> Self {
        let history_file = Self::save_dir()
            .map(|dir| dir.join("history"))
            .unwrap_or_else(|| PathBuf::from("history"));

        Self {
            auto_commit: true,
            auto_save: false,
            color: false,
            fast_connect: true,
            force: false,
            header_interval: 100,
            history_file: history_file.display().to_string(),
            incremental: false,
            isolation: "TRANSACTION_REPEATABLE_READ".to_string(),
            max_column_width: 100,
            max_height: 2000,
            max_width: 2000,
            number_format: "default".to_string(),
            output_format: "table".to_string(),
            row_limit: 0,
            show_elapsed_time: true,
            show_header: true,
            show_nested_errs: false,
            show_warnings: false,
            silent: false,
            timeout: -1,
            trim_scripts: true,
            verbose: false,
            run: None,
        }
    }
}

struct OptionEntry {
    name: &'static str,
    /// Whether the option is reported by `property_names` and saved.
    listed: bool,
    get: fn(&Opts) -> String,
    set: fn(&mut Opts, &str) -> Result<(), OptionError>,
}

macro_rules! option_entry {
    ($name:literal, $field:ident, $parse:ident) => {
        OptionEntry {
            name: $name,
            listed: true,
            get: |opts: &Opts| opts.$field.to_string(),
            set: |opts: &mut Opts, value: &str| -> Result<(), OptionError> {
                opts.$field = $parse($name, value)?;
                Ok(())
            },
        }
    };
}

// Sorted by lowercased name.
static OPTIONS: &[OptionEntry] = &[
    option_entry!("autoCommit", auto_commit, parse_bool),
    option_entry!("autoSave", auto_save, parse_bool),
    option_entry!("color", color, parse_bool),
    option_entry!("fastConnect", fast_connect, parse_bool),
    option_entry!("force", force, parse_bool),
    option_entry!("headerInterval", header_interval, parse_int),
    option_entry!("historyFile", history_file, parse_text),
    option_entry!("incremental", incremental, parse_bool),
    option_entry!("isolation", isolation, parse_text),
    option_entry!("maxColumnWidth", max_column_width, parse_int),
    option_entry!("maxHeight", max_height, parse_int),
    option_entry!("maxWidth", max_width, parse_int),
    option_entry!("numberFormat", number_format, parse_text),
    option_entry!("outputFormat", output_format, parse_text),
    OptionEntry {
        name: "propertiesFile",
        listed: true,
        get: |_: &Opts| {
            Opts::properties_file()
                .map(|path| path.display().to_string())
                .unwrap_or_default()
        },
        set: |_: &mut Opts, _: &str| -> Result<(), OptionError> {
            Err(OptionError::ReadOnly("propertiesFile"))
        },
    },
    option_entry!("rowLimit", row_limit, parse_int),
    OptionEntry {
        name: "run",
        listed: false,
        get: |opts: &Opts| opts.run.clone().unwrap_or_default(),
        set: |opts: &mut Opts, value: &str| -> Result<(), OptionError> {
            opts.run = Some(value.to_string());
            Ok(())
        },
    },
    option_entry!("showElapsedTime", show_elapsed_time, parse_bool),
    option_entry!("showHeader", show_header, parse_bool),
    option_entry!("showNestedErrs", show_nested_errs, parse_bool),
    option_entry!("showWarnings", show_warnings, parse_bool),
    option_entry!("silent", silent, parse_bool),
    option_entry!("timeout", timeout, parse_int),
    option_entry!("trimScripts", trim_scripts, parse_bool),
    option_entry!("verbose", verbose, parse_bool),
];

fn parse_bool(name: &'static str, value: &str) -> Result<bool, OptionError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(OptionError::InvalidValue {
            name,
            value: value.to_string(),
            expected: Opts::possible_setting_values().join(" or "),
        }),
    }
}

fn parse_int(name: &'static str, value: &str) -> Result<i64, OptionError> {
    value
        .trim()
        .parse()
        .map_err(|_| OptionError::InvalidValue {
            name,
            value: value.to_string(),
            expected: "an integer".to_string(),
        })
}

fn parse_text(_name: &'static str, value: &str) -> Result<String, OptionError> {
    Ok(value.to_string())
}

fn lookup(name: &str) -> Result<&'static OptionEntry, OptionError> {
    OPTIONS
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| OptionError::UnknownOption(name.to_string()))
}

/// On-disk layout of the properties file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PropertiesFile {
    #[serde(default)]
    veeline: BTreeMap<String, toml::Value>,
}

impl Opts {
    /// Defaults overridden by `VEELINE_*` environment variables.
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        opts.load_env_vars(env::vars());
        opts
    }

    /// Lowercased names of all listed options, sorted.
    pub fn property_names() -> impl Iterator<Item = String> {
        OPTIONS
            .iter()
            .filter(|entry| entry.listed)
            .map(|entry| entry.name.to_lowercase())
    }

    /// Canonical spellings of boolean option values.
    pub fn possible_setting_values() -> &'static [&'static str] {
        &["yes", "no"]
    }

    /// Option names completing `prefix`, for the shell's line editor.
    pub fn complete(prefix: &str) -> Vec<String> {
        let prefix = prefix.to_lowercase();
        Self::property_names()
            .filter(|name| name.starts_with(&prefix))
            .collect()
    }

    pub fn get(&self, name: &str) -> Result<String, OptionError> {
        lookup(name).map(|entry| (entry.get)(self))
    }

    pub fn set(&mut self, name: &str, value: &str) -> Result<(), OptionError> {
        let entry = lookup(name)?;
        (entry.set)(self, value)?;
        log::debug!("option {} set to {:?}", entry.name, value);
        Ok(())
    }

    /// Like `set`, but a failure is only logged.
    pub fn set_quietly(&mut self, name: &str, value: &str) -> bool {
        match self.set(name, value) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("error setting {}: {}", name, e);
                false
            }
        }
    }

    /// All listed options keyed by prefixed, lowercased name.
    pub fn to_properties(&self) -> BTreeMap<String, String> {
        let props: BTreeMap<String, String> = OPTIONS
            .iter()
            .filter(|entry| entry.listed)
            .map(|entry| {
                (
                    format!("{}{}", PROPERTY_PREFIX, entry.name.to_lowercase()),
                    (entry.get)(self),
                )
            })
            .collect();
        log::debug!("properties: {:?}", props);
        props
    }

    /// Apply every `veeline.`-prefixed property; anything else is skipped.
    pub fn load_properties<K, V>(&mut self, props: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in props {
            let key = key.as_ref();
            if key.eq_ignore_ascii_case(PROPERTY_NAME_EXIT) {
                continue;
            }
            if let Some(name) = strip_prefix_ignore_case(key, PROPERTY_PREFIX) {
                self.set_quietly(name, value.as_ref());
            }
        }
    }

    /// Apply `VEELINE_<NAME>` variables, e.g. `VEELINE_ISOLATION`.
    pub fn load_env_vars<K, V>(&mut self, vars: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let props = vars.into_iter().filter_map(|(key, value)| {
            let key = key.as_ref();
            if key == ENV_SAVE_DIR || key == ENV_BASE_DIR {
                return None;
            }
            let name = strip_prefix_ignore_case(key, ENV_PREFIX)?;
            Some((format!("{}{}", PROPERTY_PREFIX, name), value))
        });
        self.load_properties(props);
    }

    /// Read options from a properties file. A missing file leaves them as is.
    pub fn load(&mut self, path: &Path) -> crate::error::Result<()> {
        if !path.exists() {
            log::debug!("no properties file at {}", path.display());
            return Ok(());
        }

        let contents = fs::read_to_string(path).map_err(|source| Error::ReadProperties {
            path: path.to_path_buf(),
            source,
        })?;
        let file: PropertiesFile =
            toml::from_str(&contents).map_err(|source| Error::ParseProperties {
                path: path.to_path_buf(),
                source,
            })?;

        let props = file.veeline.into_iter().map(|(name, value)| {
            let value = match value {
                toml::Value::String(s) => s,
                other => other.to_string(),
            };
            (format!("{}{}", PROPERTY_PREFIX, name), value)
        });
        self.load_properties(props);
        log::debug!("loaded properties from {}", path.display());
        Ok(())
    }

    /// Write listed options to a properties file. `maxwidth` is left out
    /// because it follows the terminal, `propertiesfile` because it is
    /// read-only.
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let veeline = self
            .to_properties()
            .into_iter()
            .filter_map(|(key, value)| {
                let name = key.strip_prefix(PROPERTY_PREFIX)?.to_string();
                (!NOT_SAVED.contains(&name.as_str()))
                    .then_some((name, toml::Value::String(value)))
            })
            .collect();
        let contents = toml::to_string(&PropertiesFile { veeline })?;

        let write_error = |source: std::io::Error| Error::WriteProperties {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(path, contents).map_err(write_error)?;
        log::debug!("saved properties to {}", path.display());
        Ok(())
    }

    /// Directory holding the properties and history files:
    /// `$VEELINE_SAVE_DIR`, then `$VEELINE_BASE_DIR`, then the platform
    /// config directory.
    pub fn save_dir() -> Option<PathBuf> {
        for var in [ENV_SAVE_DIR, ENV_BASE_DIR] {
            if let Some(dir) = env::var_os(var).filter(|dir| !dir.is_empty()) {
                return Some(PathBuf::from(dir));
            }
        }
        ProjectDirs::from("", "", "veeline").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn properties_file() -> Option<PathBuf> {
        Self::save_dir().map(|dir| dir.join(PROPERTIES_FILE))
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_opts() {
        let opts = Opts::default();
        assert!(opts.auto_commit);
        assert_eq!(opts.header_interval, 100);
        assert_eq!(opts.timeout, -1);
        assert_eq!(opts.isolation, "TRANSACTION_REPEATABLE_READ");
        assert_eq!(opts.run, None);
    }

    #[test]
    fn test_option_table_is_sorted() {
        let names: Vec<String> = OPTIONS.iter().map(|e| e.name.to_lowercase()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_property_names_skip_run() {
        let names: Vec<String> = Opts::property_names().collect();
        assert_eq!(names.len(), 24);
        assert!(names.contains(&"autosave".to_string()));
        assert!(names.contains(&"propertiesfile".to_string()));
        assert!(!names.contains(&"run".to_string()));
    }

    #[test]
    fn test_get_and_set_are_case_insensitive() {
        let mut opts = Opts::default();
        opts.set("MAXCOLUMNWIDTH", "42").unwrap();
        assert_eq!(opts.max_column_width, 42);
        assert_eq!(opts.get("maxColumnWidth").unwrap(), "42");

        // deprecated spelling of autoSave
        opts.set("autosave", "yes").unwrap();
        assert!(opts.auto_save);
        assert_eq!(opts.get("autoSave").unwrap(), "true");
    }

    #[test]
    fn test_set_errors() {
        let mut opts = Opts::default();
        assert_eq!(
            opts.set("bogus", "1"),
            Err(OptionError::UnknownOption("bogus".to_string()))
        );
        assert!(matches!(
            opts.set("color", "maybe"),
            Err(OptionError::InvalidValue { name: "color", .. })
        ));
        assert_eq!(
            opts.set("color", "maybe").unwrap_err().to_string(),
            "invalid value \"maybe\" for option color: expected yes or no"
        );
        assert!(opts.set("timeout", "soon").is_err());
        assert!(!opts.set_quietly("rowlimit", "many"));
        assert_eq!(opts.row_limit, 0);
    }

    #[test]
    fn test_properties_file_is_read_only() {
        let mut opts = Opts::default();
        assert_eq!(
            opts.set("propertiesFile", "/tmp/other.toml"),
            Err(OptionError::ReadOnly("propertiesFile"))
        );
        let expected = Opts::properties_file()
            .map(|path| path.display().to_string())
            .unwrap_or_default();
        assert_eq!(opts.get("propertiesfile").unwrap(), expected);
    }

    #[test]
    fn test_run_is_settable() {
        let mut opts = Opts::default();
        opts.set("run", "init.sql").unwrap();
        assert_eq!(opts.run.as_deref(), Some("init.sql"));
        assert_eq!(opts.get("run").unwrap(), "init.sql");
    }

    #[test]
    fn test_complete() {
        assert_eq!(
            Opts::complete("Show"),
            vec!["showelapsedtime", "showheader", "shownestederrs", "showwarnings"]
        );
        assert!(Opts::complete("zzz").is_empty());
    }

    #[test]
    fn test_load_properties_skips_foreign_keys() {
        let mut opts = Opts::default();
        opts.load_properties([
            ("veeline.color", "true"),
            ("veeline.system.exit", "true"),
            ("other.verbose", "true"),
            ("veeline.Isolation", "TRANSACTION_NONE"),
        ]);
        assert!(opts.color);
        assert!(!opts.verbose);
        assert_eq!(opts.isolation, "TRANSACTION_NONE");
    }

    #[test]
    fn test_load_env_vars() {
        let mut opts = Opts::default();
        opts.load_env_vars([
            ("VEELINE_ISOLATION", "TRANSACTION_NONE"),
            ("VEELINE_SAVE_DIR", "/tmp/x"),
            ("PATH", "/usr/bin"),
        ]);
        assert_eq!(opts.isolation, "TRANSACTION_NONE");
    }

    #[test]
    fn test_to_properties() {
        let props = Opts::default().to_properties();
        assert_eq!(props["veeline.outputformat"], "table");
        assert!(!props.contains_key("veeline.run"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(PROPERTIES_FILE);

        let mut opts = Opts::default();
        opts.set("color", "yes").unwrap();
        opts.set("rowLimit", "10").unwrap();
        opts.set("maxWidth", "80").unwrap();
        opts.save(&path).unwrap();

        let saved = fs::read_to_string(&path).unwrap();
        assert!(saved.contains("[veeline]"));
        assert!(!saved.contains("maxwidth"));
        assert!(!saved.contains("propertiesfile"));

        let mut loaded = Opts::default();
        loaded.load(&path).unwrap();
        assert!(loaded.color);
        assert_eq!(loaded.row_limit, 10);
        assert_eq!(loaded.max_width, 2000);
    }

    #[test]
    fn test_load_accepts_native_toml_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PROPERTIES_FILE);
        fs::write(&path, "[veeline]\nverbose = true\nrowlimit = 5\n").unwrap();

        let mut opts = Opts::default();
        opts.load(&path).unwrap();
        assert!(opts.verbose);
        assert_eq!(opts.row_limit, 5);
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PROPERTIES_FILE);
        fs::write(&path, "[veeline\n").unwrap();

        let mut opts = Opts::default();
        let err = opts.load(&path).unwrap_err();
        assert!(matches!(err, Error::ParseProperties { .. }));
        assert!(err.to_string().starts_with("failed to parse properties file"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut opts = Opts::default();
        opts.load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(opts, Opts::default());
    }
}
