use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use shared::protocol::DEFAULT_DOWNLOAD_FILENAME;
use tracing::warn;

pub const DEFAULT_ENDPOINT: &str =
    "https://us-central1-boxwood-coil-480604-g3.cloudfunctions.net/generate-document";

#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoint: String,
    pub output_dir: PathBuf,
    pub default_filename: String,
    pub fields: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            output_dir: default_output_dir(),
            default_filename: DEFAULT_DOWNLOAD_FILENAME.into(),
            fields: BTreeMap::new(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

#[derive(Debug, Deserialize)]
struct FileSettings {
    endpoint: Option<String>,
    output_dir: Option<PathBuf>,
    default_filename: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, String>,
}

pub fn load_settings(config_path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.endpoint {
                    settings.endpoint = v;
                }
                if let Some(v) = file_cfg.output_dir {
                    settings.output_dir = v;
                }
                if let Some(v) = file_cfg.default_filename {
                    settings.default_filename = v;
                }
                settings.fields.extend(file_cfg.fields);
            }
            Err(err) => {
                warn!(
                    path = %config_path.display(),
                    error = %err,
                    "ignoring malformed config file"
                );
            }
        }
    }

    if let Ok(v) = std::env::var("DOCGEN_ENDPOINT") {
        settings.endpoint = v;
    }
    if let Ok(v) = std::env::var("APP__ENDPOINT") {
        settings.endpoint = v;
    }

    if let Ok(v) = std::env::var("DOCGEN_OUTPUT_DIR") {
        settings.output_dir = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("APP__OUTPUT_DIR") {
        settings.output_dir = PathBuf::from(v);
    }

    if let Ok(v) = std::env::var("DOCGEN_DEFAULT_FILENAME") {
        settings.default_filename = v;
    }
    if let Ok(v) = std::env::var("APP__DEFAULT_FILENAME") {
        settings.default_filename = v;
    }

    settings
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn temp_config(contents: &str, tag: &str) -> PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("docgen_cli_{tag}_{suffix}.toml"));
        fs::write(&path, contents).expect("write config");
        path
    }

    #[test]
    fn defaults_point_at_public_endpoint() {
        let settings = Settings::default();
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.default_filename, DEFAULT_DOWNLOAD_FILENAME);
        assert!(settings.fields.is_empty());
    }

    #[test]
    fn file_settings_override_defaults() {
        let path = temp_config(
            r#"
endpoint = "https://example.com/generate"

[fields]
title = "Essay"
pages = "5"
"#,
            "file",
        );
        let settings = load_settings(&path);
        assert_eq!(settings.endpoint, "https://example.com/generate");
        assert_eq!(
            settings.fields.get("title").map(String::as_str),
            Some("Essay")
        );
        assert_eq!(
            settings.fields.get("pages").map(String::as_str),
            Some("5")
        );
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_or_malformed_file_keeps_defaults() {
        let missing = Path::new("/definitely/not/here/docgen.toml");
        assert_eq!(load_settings(missing).endpoint, DEFAULT_ENDPOINT);

        let path = temp_config("endpoint = [not toml", "broken");
        assert_eq!(load_settings(&path).endpoint, DEFAULT_ENDPOINT);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn env_overrides_beat_file_settings() {
        let path = temp_config(r#"default_filename = "from_file.docx""#, "env");
        env::set_var("DOCGEN_DEFAULT_FILENAME", "from_env.docx");
        env::set_var("APP__OUTPUT_DIR", "/tmp/docgen-env-test");
        let settings = load_settings(&path);
        env::remove_var("DOCGEN_DEFAULT_FILENAME");
        env::remove_var("APP__OUTPUT_DIR");

        assert_eq!(settings.default_filename, "from_env.docx");
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/docgen-env-test"));
        let _ = fs::remove_file(path);
    }
}
