//! Note content blocks.
//!
//! # Responsibility
//! - Define the closed set of block kinds a note can hold.
//! - Validate block payloads before they enter a note.
//!
//! # Invariants
//! - Heading level is within `1..=6` and heading text is not blank.
//! - Math expressions and asset references are stored raw, never rendered.
//! - Lists and paragraphs hold at least one item/run.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Deepest heading level accepted by `ContentBlock::Heading`.
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Opaque reference resolved by the external asset store.
pub type AssetRef = String;

/// Inline formatting flags of one paragraph run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Monospace inline code span.
    pub code: bool,
}

impl InlineStyle {
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// Contiguous paragraph text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineRun {
    pub text: String,
    #[serde(default, skip_serializing_if = "InlineStyle::is_plain")]
    pub style: InlineStyle,
}

impl InlineRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: InlineStyle::default(),
        }
    }

    pub fn styled(text: impl Into<String>, style: InlineStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// One discrete unit of note content.
///
/// Serialized with an internal `type` tag so renderers can dispatch on it
/// without knowing the payload shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Heading { level: u8, text: String },
    Paragraph { runs: Vec<InlineRun> },
    BulletList { items: Vec<String> },
    NumberedList { items: Vec<String> },
    /// Raw expression handed to the math typesetting engine.
    InlineMath { expression: String },
    Image { asset: AssetRef },
    Icon { asset: AssetRef },
}

impl ContentBlock {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::Heading {
            level,
            text: text.into(),
        }
    }

    /// Creates a paragraph with a single unstyled run.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph {
            runs: vec![InlineRun::plain(text)],
        }
    }

    pub fn math(expression: impl Into<String>) -> Self {
        Self::InlineMath {
            expression: expression.into(),
        }
    }

    pub fn image(asset: impl Into<AssetRef>) -> Self {
        Self::Image {
            asset: asset.into(),
        }
    }

    /// Stable tag name, identical to the serialized `type` field.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Heading { .. } => "heading",
            Self::Paragraph { .. } => "paragraph",
            Self::BulletList { .. } => "bullet_list",
            Self::NumberedList { .. } => "numbered_list",
            Self::InlineMath { .. } => "inline_math",
            Self::Image { .. } => "image",
            Self::Icon { .. } => "icon",
        }
    }

    /// Returns the searchable text of this block.
    ///
    /// Image and icon references carry no text and return an empty string.
    pub fn plain_text(&self) -> String {
        match self {
            Self::Heading { text, .. } => text.clone(),
            Self::Paragraph { runs } => runs.iter().map(|run| run.text.as_str()).collect(),
            Self::BulletList { items } | Self::NumberedList { items } => items.join(" "),
            Self::InlineMath { expression } => expression.clone(),
            Self::Image { .. } | Self::Icon { .. } => String::new(),
        }
    }

    /// Validates payload invariants for this block kind.
    pub fn validate(&self) -> Result<(), BlockValidationError> {
        match self {
            Self::Heading { level, text } => {
                if *level == 0 || *level > MAX_HEADING_LEVEL {
                    return Err(BlockValidationError::HeadingLevelOutOfRange(*level));
                }
                if text.trim().is_empty() {
                    return Err(BlockValidationError::BlankText("heading"));
                }
            }
            Self::Paragraph { runs } => {
                if runs.is_empty() {
                    return Err(BlockValidationError::EmptyParagraph);
                }
            }
            Self::BulletList { items } | Self::NumberedList { items } => {
                if items.is_empty() {
                    return Err(BlockValidationError::EmptyList(self.tag()));
                }
            }
            Self::InlineMath { expression } => {
                if expression.trim().is_empty() {
                    return Err(BlockValidationError::BlankText("inline_math"));
                }
            }
            Self::Image { asset } | Self::Icon { asset } => {
                if asset.trim().is_empty() {
                    return Err(BlockValidationError::BlankAssetRef(self.tag()));
                }
            }
        }
        Ok(())
    }
}

/// Validation failures for block payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockValidationError {
    HeadingLevelOutOfRange(u8),
    /// Required text is blank; carries the block tag.
    BlankText(&'static str),
    EmptyParagraph,
    EmptyList(&'static str),
    BlankAssetRef(&'static str),
}

impl Display for BlockValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HeadingLevelOutOfRange(level) => write!(
                f,
                "heading level {level} is outside 1..={MAX_HEADING_LEVEL}"
            ),
            Self::BlankText(tag) => write!(f, "{tag} block requires non-blank text"),
            Self::EmptyParagraph => write!(f, "paragraph block requires at least one run"),
            Self::EmptyList(tag) => write!(f, "{tag} block requires at least one item"),
            Self::BlankAssetRef(tag) => write!(f, "{tag} block requires an asset reference"),
        }
    }
}

impl Error for BlockValidationError {}
