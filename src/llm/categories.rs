//! Classification categories

/// Language of the classification labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// Armenian
    Hy,
    /// English
    En,
    /// Russian
    Ru,
}

impl Default for Language {
    fn default() -> Self {
        Self::Hy
    }
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Hy, Language::En, Language::Ru];

    /// Parse a language code, falling back to English for unknown codes
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "hy" => Self::Hy,
            "ru" => Self::Ru,
            _ => Self::En,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Hy => "hy",
            Self::En => "en",
            Self::Ru => "ru",
        }
    }

    pub fn categories(&self) -> &'static [&'static str; 8] {
        match self {
            Self::Hy => &[
                "ֆինանսական",
                "իրավաբանական",
                "վարչական",
                "տեխնիկական",
                "անձնական",
                "ակադեմիական",
                "գովազդային",
                "բժշկական",
            ],
            Self::En => &[
                "Financial",
                "Legal",
                "Administrative",
                "Technical",
                "Personal",
                "Academic",
                "Advertising",
                "Medical",
            ],
            Self::Ru => &[
                "Финансовый",
                "Юридический",
                "Административный",
                "Технический",
                "Личный",
                "Академический",
                "Рекламный",
                "Медицинский",
            ],
        }
    }
}
