use serde::{Deserialize, Serialize};

use super::errors::EngineError;

// ============================================================================
// LEVELS
// ============================================================================

/// Novakid proficiency level, an integer 0-5 mapped 1:1 to CEFR
/// pre-A1 through B2.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct NovakidLevel(u8);

impl NovakidLevel {
    pub const MIN: NovakidLevel = NovakidLevel(0);
    pub const MAX: NovakidLevel = NovakidLevel(5);

    /// All levels in ascending order.
    pub const ALL: [NovakidLevel; 6] = [
        NovakidLevel(0),
        NovakidLevel(1),
        NovakidLevel(2),
        NovakidLevel(3),
        NovakidLevel(4),
        NovakidLevel(5),
    ];

    pub fn new(value: u8) -> Result<Self, EngineError> {
        if value <= Self::MAX.0 {
            Ok(Self(value))
        } else {
            Err(EngineError::InvalidLevel(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// CEFR equivalent for this level.
    pub fn cefr_label(self) -> &'static str {
        match self.0 {
            0 => "pre-A1",
            1 => "A1",
            2 => "A1+",
            3 => "A2",
            4 => "B1",
            _ => "B2",
        }
    }

    /// Mechanics permitted at this level. Gating is strict and cumulative:
    /// level 0 is pronunciation-only, level 1 adds the two single-choice
    /// mechanics, level 2 and above open the full set.
    pub fn allowed_mechanics(self) -> &'static [Mechanic] {
        use Mechanic::*;
        match self.0 {
            0 => &[WordPronunciationPractice],
            1 => &[
                WordPronunciationPractice,
                ImageSingleChoiceFromTexts,
                AudioSingleChoiceFromImages,
            ],
            _ => &[
                WordPronunciationPractice,
                ImageSingleChoiceFromTexts,
                AudioSingleChoiceFromImages,
                MultipleChoiceTextText,
                SentencePronunciationPractice,
                AudioCategorySorting,
                SentenceScramble,
            ],
        }
    }

    pub fn permits(self, mechanic: Mechanic) -> bool {
        self.allowed_mechanics().contains(&mechanic)
    }

    /// Step the level by a signed offset, clamped to the 0-5 range.
    pub fn stepped(self, delta: i8) -> Self {
        let raw = (self.0 as i8 + delta).clamp(0, Self::MAX.0 as i8);
        Self(raw as u8)
    }

    /// Absolute distance between two levels.
    pub fn distance(self, other: NovakidLevel) -> u8 {
        self.0.abs_diff(other.0)
    }
}

impl TryFrom<u8> for NovakidLevel {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NovakidLevel> for u8 {
    fn from(level: NovakidLevel) -> Self {
        level.0
    }
}

impl std::fmt::Display for NovakidLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// MECHANICS
// ============================================================================

/// The format of a single question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mechanic {
    WordPronunciationPractice,
    SentencePronunciationPractice,
    AudioSingleChoiceFromImages,
    AudioCategorySorting,
    ImageSingleChoiceFromTexts,
    MultipleChoiceTextText,
    SentenceScramble,
}

impl Mechanic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mechanic::WordPronunciationPractice => "word-pronunciation-practice",
            Mechanic::SentencePronunciationPractice => "sentence-pronunciation-practice",
            Mechanic::AudioSingleChoiceFromImages => "audio-single-choice-from-images",
            Mechanic::AudioCategorySorting => "audio-category-sorting",
            Mechanic::ImageSingleChoiceFromTexts => "image-single-choice-from-texts",
            Mechanic::MultipleChoiceTextText => "multiple-choice-text-text",
            Mechanic::SentenceScramble => "sentence-scramble",
        }
    }

    /// Presentation category of the mechanic.
    pub fn category(&self) -> MechanicCategory {
        match self {
            Mechanic::WordPronunciationPractice | Mechanic::SentencePronunciationPractice => {
                MechanicCategory::Pronunciation
            }
            Mechanic::AudioSingleChoiceFromImages | Mechanic::AudioCategorySorting => {
                MechanicCategory::Audio
            }
            Mechanic::ImageSingleChoiceFromTexts
            | Mechanic::MultipleChoiceTextText
            | Mechanic::SentenceScramble => MechanicCategory::Text,
        }
    }

    /// Side of the 50/50 audio/text balance this mechanic counts toward.
    /// Pronunciation mechanics are their own category but balance under audio.
    pub fn balance_side(&self) -> BalanceSide {
        self.category().balance_side()
    }
}

impl std::fmt::Display for Mechanic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Presentation category: how the student receives and answers the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MechanicCategory {
    /// Student hears, then chooses or sorts.
    Audio,
    /// Student reads, then selects or arranges.
    Text,
    /// Student speaks and self-assesses.
    Pronunciation,
}

impl MechanicCategory {
    pub fn balance_side(self) -> BalanceSide {
        match self {
            MechanicCategory::Audio | MechanicCategory::Pronunciation => BalanceSide::Audio,
            MechanicCategory::Text => BalanceSide::Text,
        }
    }
}

/// The two sides of the serving-balance tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceSide {
    Audio,
    Text,
}

impl BalanceSide {
    pub fn other(self) -> BalanceSide {
        match self {
            BalanceSide::Audio => BalanceSide::Text,
            BalanceSide::Text => BalanceSide::Audio,
        }
    }
}

// ============================================================================
// SKILLS
// ============================================================================

/// Skill a question exercises, as tagged in the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    Pronunciation,
    Vocabulary,
    Grammar,
    Reading,
    Speaking,
}

impl Skill {
    /// Reporting bucket this skill rolls up into. Reading counts as
    /// vocabulary recognition; speaking counts as pronunciation.
    pub fn bucket(self) -> SkillBucket {
        match self {
            Skill::Vocabulary | Skill::Reading => SkillBucket::Vocabulary,
            Skill::Pronunciation | Skill::Speaking => SkillBucket::Pronunciation,
            Skill::Grammar => SkillBucket::Grammar,
        }
    }
}

/// The three buckets the placement report scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkillBucket {
    Vocabulary,
    Pronunciation,
    Grammar,
}

impl SkillBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillBucket::Vocabulary => "vocabulary",
            SkillBucket::Pronunciation => "pronunciation",
            SkillBucket::Grammar => "grammar",
        }
    }
}

// ============================================================================
// QUESTIONS
// ============================================================================

/// One item to place into an audio-category-sorting question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SortItem {
    /// Stable id the renderer echoes back in the answer.
    pub id: String,
    /// Spoken/displayed label.
    pub text: String,
    /// The category this item belongs to.
    pub category: String,
}

/// Mechanic-specific payload. The `mechanic` field of a bank record is the
/// serde tag, so a record's mechanic and its payload can never disagree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mechanic", rename_all = "kebab-case")]
pub enum MechanicPayload {
    /// Student hears and repeats a single word, then self-assesses.
    WordPronunciationPractice {
        target_word: String,
        phonetic: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_description: Option<String>,
    },

    /// Student repeats a full sentence, then self-assesses.
    SentencePronunciationPractice {
        sentence: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        phonetic: Option<String>,
    },

    /// Student hears a word/phrase and picks the matching image.
    AudioSingleChoiceFromImages {
        audio_text: String,
        image_options: Vec<String>,
        correct_index: usize,
    },

    /// Student hears items one by one and sorts them into categories.
    AudioCategorySorting {
        categories: Vec<String>,
        items: Vec<SortItem>,
    },

    /// Student sees an image and picks the matching text.
    ImageSingleChoiceFromTexts {
        image_description: String,
        options: Vec<String>,
        correct_index: usize,
    },

    /// Plain text question with text options.
    MultipleChoiceTextText {
        prompt: String,
        options: Vec<String>,
        correct_index: usize,
    },

    /// Student rearranges shuffled words into a sentence.
    SentenceScramble {
        scrambled_words: Vec<String>,
        correct_order: Vec<usize>,
    },
}

impl MechanicPayload {
    pub fn mechanic(&self) -> Mechanic {
        match self {
            MechanicPayload::WordPronunciationPractice { .. } => {
                Mechanic::WordPronunciationPractice
            }
            MechanicPayload::SentencePronunciationPractice { .. } => {
                Mechanic::SentencePronunciationPractice
            }
            MechanicPayload::AudioSingleChoiceFromImages { .. } => {
                Mechanic::AudioSingleChoiceFromImages
            }
            MechanicPayload::AudioCategorySorting { .. } => Mechanic::AudioCategorySorting,
            MechanicPayload::ImageSingleChoiceFromTexts { .. } => {
                Mechanic::ImageSingleChoiceFromTexts
            }
            MechanicPayload::MultipleChoiceTextText { .. } => Mechanic::MultipleChoiceTextText,
            MechanicPayload::SentenceScramble { .. } => Mechanic::SentenceScramble,
        }
    }
}

/// Immutable bank question. `level` is the bucket the question was loaded
/// from; it is stamped by the loader, never read from the record itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: String,
    pub skill: Skill,
    /// Advisory difficulty within the level, 0.0 (easy) to 1.0 (hard).
    pub difficulty: f64,
    #[serde(skip)]
    pub level: NovakidLevel,
    #[serde(flatten)]
    pub payload: MechanicPayload,
}

impl Question {
    pub fn mechanic(&self) -> Mechanic {
        self.payload.mechanic()
    }
}

/// A question handed to the renderer, stamped with the level bucket it was
/// drawn from and whether it belongs to the calibration phase.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServedQuestion {
    pub question: Question,
    pub assigned_level: NovakidLevel,
    pub is_calibration: bool,
}

// ============================================================================
// HISTORY
// ============================================================================

/// One answered question, as recorded in the session history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnsweredRecord {
    pub question_id: String,
    pub mechanic: Mechanic,
    pub assigned_level: NovakidLevel,
    pub skill: Skill,
    pub correct: bool,
    /// Seconds from render to answer, as measured by the renderer.
    pub response_time: f64,
    /// Set when the answer arrived with a shape that does not match the
    /// mechanic; such answers score as incorrect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<String>,
}
