//! Language detection for the C-family sources the pipeline repairs.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Source language of a file under repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cpp,
}

impl Language {
    /// Detect the language from a file extension.
    pub fn detect(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        match ext {
            "c" => Some(Self::C),
            "cc" | "cpp" | "cxx" | "h" | "hh" | "hpp" | "hxx" => Some(Self::Cpp),
            _ => None,
        }
    }

    /// Display name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Cpp => "cpp",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_c() {
        assert_eq!(Language::detect("src/list.c"), Some(Language::C));
    }

    #[test]
    fn test_detect_cpp() {
        assert_eq!(Language::detect("src/list.cpp"), Some(Language::Cpp));
        assert_eq!(Language::detect("include/list.hpp"), Some(Language::Cpp));
        assert_eq!(Language::detect("include/list.h"), Some(Language::Cpp));
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(Language::detect("build.rs"), None);
        assert_eq!(Language::detect("Makefile"), None);
    }
}
