//! The configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fbmux_core::MuxConfig;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub regular: PathBuf,
    pub italic: Option<PathBuf>,
    pub bold: Option<PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            regular: PathBuf::from("/usr/share/fbmux/font.tf"),
            italic: None,
            bold: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mux: MuxConfig,
    pub fonts: FontConfig,
    /// Seconds between status file rereads; only SIGALRM rereads it when unset.
    pub status_interval: Option<u64>,
    /// Port of the local sshd that checks lock passwords.
    pub ssh_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mux: MuxConfig::default(),
            fonts: FontConfig::default(),
            status_interval: None,
            ssh_port: 22,
        }
    }
}

impl AppConfig {
    /// Read `path`, or the per-user file when `path` is `None`. A missing
    /// per-user file gives the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::read(path)?,
            None => match default_path() {
                Some(path) if path.exists() => Self::read(&path)?,
                _ => Self::default(),
            },
        };
        config.mux.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid configuration in {}", path.display()))
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fbmux").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write(
            r#"
ssh_port = 2222

[mux]
tags = "abc"
shell = ["bash", "-l"]

[fonts]
bold = "/fonts/bold.tf"
"#,
        );
        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.ssh_port, 2222);
        assert_eq!(config.mux.tags, "abc");
        assert_eq!(config.mux.shell, ["bash", "-l"]);
        assert_eq!(config.mux.editor, MuxConfig::default().editor);
        assert_eq!(config.fonts.bold, Some(PathBuf::from("/fonts/bold.tf")));
        assert_eq!(config.fonts.regular, FontConfig::default().regular);
        assert_eq!(config.status_interval, None);
    }

    #[test]
    fn test_duplicate_tags_are_rejected() {
        let file = write("[mux]\ntags = \"aba\"\n");
        assert!(AppConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("none.toml"))).unwrap_err();
        assert!(err.to_string().contains("none.toml"));
    }
}
