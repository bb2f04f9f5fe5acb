//! Multiplexer settings: tag symbols, command key and the programs it runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::MuxError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MuxConfig {
    /// One symbol per tag, in status bar order. Also the key that selects it.
    pub tags: String,
    /// Tags whose hidden screens are kept as snapshots.
    pub saved_tags: String,
    /// The byte that introduces a command.
    pub escape: u8,
    pub shell: Vec<String>,
    pub mail: Vec<String>,
    pub editor: Vec<String>,
    /// Color file reloaded by the palette command.
    pub palette_file: Option<PathBuf>,
    /// Screenshot path prefix; the user name and a timestamp are appended.
    pub screenshot: PathBuf,
    /// Text file whose first line is shown in the status bar.
    pub status_file: Option<PathBuf>,
}

impl Default for MuxConfig {
    fn default() -> Self {
        Self {
            tags: "xnlhtr01uiva-".to_string(),
            saved_tags: String::new(),
            escape: 0x1b,
            shell: vec!["sh".to_string()],
            mail: vec!["mailx".to_string(), "-f".to_string(), "+inbox".to_string()],
            editor: vec!["vi".to_string()],
            palette_file: None,
            screenshot: PathBuf::from("/tmp/scr"),
            status_file: None,
        }
    }
}

impl MuxConfig {
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// The tag selected by `key`, if it is a tag symbol.
    pub fn tag_index(&self, key: u8) -> Option<usize> {
        self.tags.bytes().position(|b| b == key)
    }

    /// The symbol of tag `tag`.
    pub fn tag_symbol(&self, tag: usize) -> char {
        self.tags.as_bytes().get(tag).map_or('?', |&b| b as char)
    }

    pub fn is_saved(&self, tag: usize) -> bool {
        self.tags
            .as_bytes()
            .get(tag)
            .is_some_and(|b| self.saved_tags.as_bytes().contains(b))
    }

    pub fn validate(&self) -> Result<(), MuxError> {
        if self.tags.is_empty() {
            return Err(MuxError::Config("at least one tag is required".into()));
        }
        if !self.tags.is_ascii() {
            return Err(MuxError::Config(format!("tags must be ASCII: {:?}", self.tags)));
        }
        let bytes = self.tags.as_bytes();
        if let Some(dup) = bytes.iter().enumerate().find(|&(i, b)| bytes[..i].contains(b)) {
            return Err(MuxError::Config(format!("duplicate tag {:?}", *dup.1 as char)));
        }
        if self.shell.is_empty() {
            return Err(MuxError::Config("shell command is empty".into()));
        }
        Ok(())
    }
}
