//! Content-type classification and source/publication compatibility.
//!
//! A content type is the pair (language, edit criterion). The edit criterion
//! never changes between a source and its publication target; VA and VF
//! sources publish only to their own language while VO sources may publish to
//! either.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    VaSansEdit,
    VaAvecEdit,
    VfSansEdit,
    VfAvecEdit,
    VoSansEdit,
    VoAvecEdit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Va,
    Vf,
    Vo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditCriterion {
    SansEdit,
    AvecEdit,
}

impl ContentType {
    pub const ALL: [ContentType; 6] = [
        ContentType::VaSansEdit,
        ContentType::VaAvecEdit,
        ContentType::VfSansEdit,
        ContentType::VfAvecEdit,
        ContentType::VoSansEdit,
        ContentType::VoAvecEdit,
    ];

    pub fn new(language: Language, edit: EditCriterion) -> Self {
        match (language, edit) {
            (Language::Va, EditCriterion::SansEdit) => ContentType::VaSansEdit,
            (Language::Va, EditCriterion::AvecEdit) => ContentType::VaAvecEdit,
            (Language::Vf, EditCriterion::SansEdit) => ContentType::VfSansEdit,
            (Language::Vf, EditCriterion::AvecEdit) => ContentType::VfAvecEdit,
            (Language::Vo, EditCriterion::SansEdit) => ContentType::VoSansEdit,
            (Language::Vo, EditCriterion::AvecEdit) => ContentType::VoAvecEdit,
        }
    }

    pub fn language(self) -> Language {
        match self {
            ContentType::VaSansEdit | ContentType::VaAvecEdit => Language::Va,
            ContentType::VfSansEdit | ContentType::VfAvecEdit => Language::Vf,
            ContentType::VoSansEdit | ContentType::VoAvecEdit => Language::Vo,
        }
    }

    pub fn edit(self) -> EditCriterion {
        match self {
            ContentType::VaSansEdit | ContentType::VfSansEdit | ContentType::VoSansEdit => {
                EditCriterion::SansEdit
            }
            ContentType::VaAvecEdit | ContentType::VfAvecEdit | ContentType::VoAvecEdit => {
                EditCriterion::AvecEdit
            }
        }
    }

    /// Whether a publication channel may carry this classification.
    pub fn is_publication_eligible(self) -> bool {
        self.language() != Language::Vo
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::VaSansEdit => "VA_SANS_EDIT",
            ContentType::VaAvecEdit => "VA_AVEC_EDIT",
            ContentType::VfSansEdit => "VF_SANS_EDIT",
            ContentType::VfAvecEdit => "VF_AVEC_EDIT",
            ContentType::VoSansEdit => "VO_SANS_EDIT",
            ContentType::VoAvecEdit => "VO_AVEC_EDIT",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentType::ALL
            .into_iter()
            .find(|ct| ct.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::Validation(format!("Unknown content type: {}", s)))
    }
}

/// Publication content types a short from a `source` channel may target.
pub fn compatible_targets(source: ContentType) -> BTreeSet<ContentType> {
    let edit = source.edit();
    match source.language() {
        Language::Va | Language::Vf => BTreeSet::from([source]),
        Language::Vo => BTreeSet::from([
            ContentType::new(Language::Va, edit),
            ContentType::new(Language::Vf, edit),
        ]),
    }
}

pub fn is_compatible(source: ContentType, target: ContentType) -> bool {
    compatible_targets(source).contains(&target)
}

pub fn publication_eligible_types() -> BTreeSet<ContentType> {
    ContentType::ALL
        .into_iter()
        .filter(|ct| ct.is_publication_eligible())
        .collect()
}

/// Source content types whose shorts may be published on a `target` channel.
pub fn compatible_sources(target: ContentType) -> BTreeSet<ContentType> {
    ContentType::ALL
        .into_iter()
        .filter(|source| is_compatible(*source, target))
        .collect()
}
