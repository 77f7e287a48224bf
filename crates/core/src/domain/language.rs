use std::fmt;
use std::str::FromStr;

use super::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    Java,
    Python,
    Cpp,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Java, Language::Python, Language::Cpp];

    /// Tag sent to the judging service.
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::Python => "python",
            Language::Cpp => "cpp",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        match tag.as_str() {
            "c++" => Ok(Language::Cpp),
            _ => Self::ALL
                .into_iter()
                .find(|language| language.as_str() == tag)
                .ok_or_else(|| DomainError::UnknownLanguage(s.to_string())),
        }
    }
}
