//! INI file configuration adapter.

use crate::domain::error::BasketError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BasketError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BasketError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config file not found: {}", path.display()),
            )));
        }
        let mut config = Ini::new();
        config.load(path).map_err(|reason| BasketError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, BasketError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| BasketError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Some(true),
            "false" | "no" | "0" | "off" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }

    fn keys(&self, section: &str) -> Vec<String> {
        // configparser lower-cases section and key names by default.
        let mut keys: Vec<String> = self
            .config
            .get_map_ref()
            .get(&section.to_lowercase())
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
dir = ./prices

[analysis]
tickers = AAPL, MSFT GOOG
window = 60
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(adapter.get_string("data", "dir"), Some("./prices".to_string()));
        assert_eq!(adapter.get_int("analysis", "window", 0), 60);
    }

    #[test]
    fn get_string_returns_none_for_missing_or_blank_key() {
        let adapter =
            FileConfigAdapter::from_string("[analysis]\nwindow = 20\nbenchmark =\n").unwrap();
        assert_eq!(adapter.get_string("analysis", "missing"), None);
        assert_eq!(adapter.get_string("analysis", "benchmark"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_default_for_missing_or_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[analysis]\nwindow = abc\n").unwrap();
        assert_eq!(adapter.get_int("analysis", "window", 42), 42);
        assert_eq!(adapter.get_int("analysis", "missing", 7), 7);
    }

    #[test]
    fn get_double_returns_value_or_default() {
        let adapter =
            FileConfigAdapter::from_string("[analysis]\nrisk_free_rate = 0.02\nbad = x\n").unwrap();
        assert_eq!(adapter.get_double("analysis", "risk_free_rate", 0.0), 0.02);
        assert_eq!(adapter.get_double("analysis", "bad", 99.9), 99.9);
        assert_eq!(adapter.get_double("analysis", "missing", 1.5), 1.5);
    }

    #[test]
    fn get_bool_accepts_common_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\na = true\nb = yes\nc = 1\nd = off\ne = no\nf = 0\n",
        )
        .unwrap();
        assert!(adapter.get_bool("data", "a", false));
        assert!(adapter.get_bool("data", "b", false));
        assert!(adapter.get_bool("data", "c", false));
        assert!(!adapter.get_bool("data", "d", true));
        assert!(!adapter.get_bool("data", "e", true));
        assert!(!adapter.get_bool("data", "f", true));
        assert!(adapter.get_bool("data", "missing", true));
    }

    #[test]
    fn get_list_splits_on_commas_and_spaces() {
        let adapter =
            FileConfigAdapter::from_string("[analysis]\ntickers = aapl, msft  goog,,amzn\n")
                .unwrap();
        assert_eq!(
            adapter.get_list("analysis", "tickers"),
            Some(vec![
                "aapl".to_string(),
                "msft".to_string(),
                "goog".to_string(),
                "amzn".to_string()
            ])
        );
        assert_eq!(adapter.get_list("analysis", "missing"), None);
    }

    #[test]
    fn keys_lists_section_entries() {
        let adapter =
            FileConfigAdapter::from_string("[presets]\ntech = AAPL MSFT\nbanks = JPM,BAC\n")
                .unwrap();
        assert_eq!(adapter.keys("presets"), vec!["banks", "tech"]);
        assert!(adapter.keys("missing").is_empty());
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[report]\noutput_dir = /tmp/out\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("report", "output_dir"),
            Some("/tmp/out".to_string())
        );
    }

    #[test]
    fn from_file_returns_io_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(BasketError::Io(_))));
    }
}
