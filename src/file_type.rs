use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Coarse file classification derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Text,
    Audio,
    Video,
    Archive,
    Unknown,
}

const EXTENSIONS: &[(&str, FileType)] = &[
    ("txt", FileType::Text),
    ("md", FileType::Text),
    ("rtf", FileType::Text),
    ("doc", FileType::Text),
    ("docx", FileType::Text),
    ("pdf", FileType::Text),
    ("mp3", FileType::Audio),
    ("m4a", FileType::Audio),
    ("wav", FileType::Audio),
    ("aac", FileType::Audio),
    ("flac", FileType::Audio),
    ("mp4", FileType::Video),
    ("mov", FileType::Video),
    ("avi", FileType::Video),
    ("mkv", FileType::Video),
    ("webm", FileType::Video),
    ("zip", FileType::Archive),
    ("rar", FileType::Archive),
    ("7z", FileType::Archive),
    ("tar", FileType::Archive),
    ("gz", FileType::Archive),
    ("bz2", FileType::Archive),
    ("dmg", FileType::Archive),
    ("pkg", FileType::Archive),
];

impl FileType {
    /// Classifies an extension, with or without the leading dot. Matching is
    /// case-insensitive; anything unrecognised is [`FileType::Unknown`].
    pub fn from_extension(extension: &str) -> Self {
        let extension = extension.strip_prefix('.').unwrap_or(extension).to_lowercase();
        EXTENSIONS
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, file_type)| *file_type)
            .unwrap_or(FileType::Unknown)
    }

    pub fn is_supported(extension: &str) -> bool {
        Self::from_extension(extension) != FileType::Unknown
    }

    /// All extensions of this type with a leading dot, sorted.
    pub fn extensions(self) -> Vec<String> {
        let mut extensions: Vec<String> = EXTENSIONS
            .iter()
            .filter(|(_, file_type)| *file_type == self && self != FileType::Unknown)
            .map(|(ext, _)| format!(".{ext}"))
            .collect();
        extensions.sort();
        extensions
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileType::Text => "text",
            FileType::Audio => "audio",
            FileType::Video => "video",
            FileType::Archive => "archive",
            FileType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(FileType::Text),
            "audio" => Ok(FileType::Audio),
            "video" => Ok(FileType::Video),
            "archive" => Ok(FileType::Archive),
            other => Err(format!(
                "unknown file type '{other}' (expected text, audio, video or archive)"
            )),
        }
    }
}
