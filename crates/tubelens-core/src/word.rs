//! # Word Module
//!
//! Loading words: the short trivia terms shown while an analysis runs.
//!
//! A [`LoadingWord`] is built either from a [`HistoryKeyword`] (a term pulled
//! from the user's own analysis history) or from a [`StaticWord`] in the
//! built-in table. Words are rebuilt on every rotation and never mutated.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// LANGUAGE
// =============================================================================

/// Display language for definitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ko,
}

impl Language {
    /// Parse a language tag such as `en`, `ko`, `en-US` or `ko_KR`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let primary = raw
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Language::En),
            "ko" | "kr" => Some(Language::Ko),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ko => "ko",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// PROVENANCE
// =============================================================================

/// Where a loading word came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordSource {
    /// The user's own analysis history.
    History,
    /// The built-in static table.
    Local,
}

// =============================================================================
// RAW RECORDS
// =============================================================================

/// A keyword record as returned by the history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryKeyword {
    #[serde(alias = "term")]
    pub keyword: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Identifier of the analysis the keyword was extracted from.
    #[serde(default)]
    pub analysis_id: Option<String>,
    #[serde(default)]
    pub video_title: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
    /// AI-generated definition, when the backend produced one.
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub short_definition: Option<String>,
}

impl HistoryKeyword {
    /// A bare keyword with no definitions or back-references.
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            category: None,
            analysis_id: None,
            video_title: None,
            video_id: None,
            definition: None,
            short_definition: None,
        }
    }
}

/// An entry of the built-in word table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticWord {
    pub term: &'static str,
    pub category: &'static str,
    pub definition_en: &'static str,
    pub short_en: &'static str,
    pub definition_ko: &'static str,
    pub short_ko: &'static str,
}

impl StaticWord {
    #[must_use]
    pub fn definition(&self, language: Language) -> &'static str {
        match language {
            Language::En => self.definition_en,
            Language::Ko => self.definition_ko,
        }
    }

    #[must_use]
    pub fn short_definition(&self, language: Language) -> &'static str {
        match language {
            Language::En => self.short_en,
            Language::Ko => self.short_ko,
        }
    }
}

// =============================================================================
// LOADING WORD
// =============================================================================

/// A term ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingWord {
    pub term: String,
    pub definition: String,
    pub short_definition: String,
    pub category: String,
    pub source: WordSource,
    /// Analysis record to navigate back to (history words only).
    pub record_id: Option<String>,
    pub video_title: Option<String>,
    pub video_id: Option<String>,
}

impl LoadingWord {
    /// Build a display word from a history keyword.
    ///
    /// AI definitions win when present and non-blank; otherwise a placeholder
    /// naming the source video is used.
    #[must_use]
    pub fn from_history(keyword: &HistoryKeyword, language: Language) -> Self {
        let title = non_blank(keyword.video_title.as_deref());

        let definition = non_blank(keyword.definition.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| placeholder_definition(title, language));
        let short_definition = non_blank(keyword.short_definition.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| placeholder_short(language).to_string());

        Self {
            term: keyword.keyword.trim().to_string(),
            definition,
            short_definition,
            category: non_blank(keyword.category.as_deref())
                .unwrap_or("history")
                .to_string(),
            source: WordSource::History,
            record_id: non_blank(keyword.analysis_id.as_deref()).map(str::to_string),
            video_title: title.map(str::to_string),
            video_id: non_blank(keyword.video_id.as_deref()).map(str::to_string),
        }
    }

    /// Build a display word from the static table.
    #[must_use]
    pub fn from_static(word: &StaticWord, language: Language) -> Self {
        Self {
            term: word.term.to_string(),
            definition: word.definition(language).to_string(),
            short_definition: word.short_definition(language).to_string(),
            category: word.category.to_string(),
            source: WordSource::Local,
            record_id: None,
            video_title: None,
            video_id: None,
        }
    }

    /// Whether the word links back to an analysis record.
    #[must_use]
    pub fn is_clickable(&self) -> bool {
        self.source == WordSource::History && self.record_id.is_some()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn placeholder_definition(title: Option<&str>, language: Language) -> String {
    match (language, title) {
        (Language::En, Some(title)) => {
            format!("A key concept from your analysis of \"{}\".", title)
        }
        (Language::En, None) => String::from("A key concept from one of your analyzed videos."),
        (Language::Ko, Some(title)) => format!("\"{}\" 분석에서 나온 핵심 개념입니다.", title),
        (Language::Ko, None) => String::from("분석한 영상에서 나온 핵심 개념입니다."),
    }
}

fn placeholder_short(language: Language) -> &'static str {
    match language {
        Language::En => "From your analysis history",
        Language::Ko => "내 분석 기록에서",
    }
}

// =============================================================================
// STATIC TABLE
// =============================================================================

const STATIC_WORDS: &[StaticWord] = &[
    StaticWord {
        term: "Transcript",
        category: "video",
        definition_en: "A written record of everything spoken in a video, the raw material for every summary.",
        short_en: "Spoken words, written down",
        definition_ko: "영상에서 말한 모든 내용을 글로 옮긴 기록으로, 모든 요약의 재료가 됩니다.",
        short_ko: "말을 글로 옮긴 것",
    },
    StaticWord {
        term: "Summarization",
        category: "ai",
        definition_en: "Condensing a long text into its essential points while keeping the original meaning.",
        short_en: "Long content, short form",
        definition_ko: "긴 글의 의미를 유지하면서 핵심만 간추리는 작업입니다.",
        short_ko: "핵심만 간추리기",
    },
    StaticWord {
        term: "Large Language Model",
        category: "ai",
        definition_en: "A neural network trained on vast text corpora to predict and generate language.",
        short_en: "AI that reads and writes text",
        definition_ko: "방대한 텍스트로 학습해 언어를 예측하고 생성하는 신경망입니다.",
        short_ko: "글을 읽고 쓰는 AI",
    },
    StaticWord {
        term: "Token",
        category: "ai",
        definition_en: "The unit of text a language model processes, often a word fragment.",
        short_en: "A piece of a word",
        definition_ko: "언어 모델이 처리하는 텍스트 단위로, 보통 단어의 일부입니다.",
        short_ko: "단어의 조각",
    },
    StaticWord {
        term: "Context Window",
        category: "ai",
        definition_en: "The maximum amount of text a model can consider at once.",
        short_en: "How much a model can read at once",
        definition_ko: "모델이 한 번에 고려할 수 있는 텍스트의 최대 길이입니다.",
        short_ko: "한 번에 읽는 양",
    },
    StaticWord {
        term: "Hallucination",
        category: "ai",
        definition_en: "A confident statement produced by an AI model that is not supported by its sources.",
        short_en: "Confident but unfounded",
        definition_ko: "AI가 근거 없이 그럴듯하게 만들어낸 내용입니다.",
        short_ko: "근거 없는 확신",
    },
    StaticWord {
        term: "Embedding",
        category: "ai",
        definition_en: "A vector of numbers representing the meaning of a piece of text.",
        short_en: "Meaning as numbers",
        definition_ko: "텍스트의 의미를 숫자 벡터로 표현한 것입니다.",
        short_ko: "숫자로 표현한 의미",
    },
    StaticWord {
        term: "Retrieval",
        category: "ai",
        definition_en: "Finding the passages most relevant to a question before answering it.",
        short_en: "Finding the right passage",
        definition_ko: "질문에 답하기 전에 가장 관련 있는 구절을 찾아내는 과정입니다.",
        short_ko: "알맞은 구절 찾기",
    },
    StaticWord {
        term: "Timestamp",
        category: "video",
        definition_en: "A marker pointing to an exact moment in a video.",
        short_en: "A moment in the video",
        definition_ko: "영상의 정확한 시점을 가리키는 표시입니다.",
        short_ko: "영상 속 한 순간",
    },
    StaticWord {
        term: "Playlist",
        category: "video",
        definition_en: "An ordered collection of videos that can be analyzed as one body of knowledge.",
        short_en: "Videos grouped together",
        definition_ko: "하나의 지식 묶음으로 분석할 수 있는 영상 모음입니다.",
        short_ko: "묶음 영상",
    },
    StaticWord {
        term: "Chapter",
        category: "video",
        definition_en: "A titled segment of a video covering one topic.",
        short_en: "One topic, one segment",
        definition_ko: "하나의 주제를 다루는 제목이 붙은 영상 구간입니다.",
        short_ko: "주제별 구간",
    },
    StaticWord {
        term: "Reliability Score",
        category: "data",
        definition_en: "An estimate of how well a video's claims are supported by evidence.",
        short_en: "How trustworthy the claims are",
        definition_ko: "영상의 주장이 근거로 얼마나 뒷받침되는지 나타내는 추정치입니다.",
        short_ko: "주장의 신뢰도",
    },
    StaticWord {
        term: "Citation",
        category: "data",
        definition_en: "A reference to the source that backs up a statement.",
        short_en: "Where a claim comes from",
        definition_ko: "어떤 진술을 뒷받침하는 출처를 밝히는 것입니다.",
        short_ko: "주장의 출처",
    },
    StaticWord {
        term: "Bias",
        category: "data",
        definition_en: "A systematic tilt in how information is selected or presented.",
        short_en: "A consistent tilt",
        definition_ko: "정보를 고르거나 전달하는 방식에 나타나는 일정한 치우침입니다.",
        short_ko: "한쪽으로 치우침",
    },
    StaticWord {
        term: "Corpus",
        category: "data",
        definition_en: "A structured collection of texts analyzed together.",
        short_en: "A body of texts",
        definition_ko: "함께 분석되는 텍스트들의 체계적인 모음입니다.",
        short_ko: "텍스트 모음",
    },
    StaticWord {
        term: "Active Recall",
        category: "learning",
        definition_en: "Studying by retrieving information from memory instead of rereading it.",
        short_en: "Test yourself to remember",
        definition_ko: "다시 읽는 대신 기억에서 꺼내며 공부하는 방법입니다.",
        short_ko: "꺼내며 외우기",
    },
    StaticWord {
        term: "Spaced Repetition",
        category: "learning",
        definition_en: "Reviewing material at increasing intervals to strengthen long-term memory.",
        short_en: "Review, wait, review again",
        definition_ko: "간격을 점점 늘려가며 복습해 장기 기억을 강화하는 방법입니다.",
        short_ko: "간격을 둔 복습",
    },
    StaticWord {
        term: "Mind Map",
        category: "learning",
        definition_en: "A diagram that arranges ideas around a central concept.",
        short_en: "Ideas around a center",
        definition_ko: "중심 개념을 둘러싸고 생각을 배치한 도식입니다.",
        short_ko: "중심에서 뻗는 생각",
    },
    StaticWord {
        term: "Key Takeaway",
        category: "learning",
        definition_en: "The single most important point to remember from a piece of content.",
        short_en: "The one thing to remember",
        definition_ko: "콘텐츠에서 꼭 기억해야 할 가장 중요한 한 가지입니다.",
        short_ko: "꼭 기억할 한 가지",
    },
    StaticWord {
        term: "Fact Check",
        category: "data",
        definition_en: "Verifying a claim against independent, reliable sources.",
        short_en: "Verify before you trust",
        definition_ko: "독립적이고 믿을 만한 출처로 주장을 검증하는 일입니다.",
        short_ko: "믿기 전에 확인",
    },
];

/// The built-in word table.
#[must_use]
pub fn static_words() -> &'static [StaticWord] {
    STATIC_WORDS
}

// =============================================================================
// TESTS
// =============================================================================
