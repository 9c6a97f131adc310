use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error type for values that fall outside a vocabulary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VocabError {
    #[error("unrecognized {kind} value: {raw:?}")]
    Unknown { kind: &'static str, raw: String },
    #[error("ambiguous {kind} value {raw:?}: it names different values in different vocabularies")]
    Ambiguous { kind: &'static str, raw: String },
}

/// One external string representation of an enumerated field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vocabulary {
    /// Storage form, total over every value
    Canonical,
    /// Kanban column labels (`todo`, `inprogress`, `done`)
    Kanban,
    /// List and filter labels (`Open`, `InProgress`, `Blocked`, `Closed`)
    List,
}

impl Vocabulary {
    pub const ALL: [Vocabulary; 3] = [Vocabulary::Canonical, Vocabulary::Kanban, Vocabulary::List];
}

/// An enumerated field with an explicit mapping table per vocabulary.
///
/// Each table maps a label to exactly one value. `Canonical` must cover every
/// value; the other vocabularies may leave values out.
pub trait Vocab: Copy + Eq + fmt::Debug + 'static {
    /// Field name used in error messages
    const KIND: &'static str;

    fn table(vocab: Vocabulary) -> &'static [(&'static str, Self)];

    /// Strict lookup of `raw` in one vocabulary
    fn decode(vocab: Vocabulary, raw: &str) -> Option<Self> {
        Self::table(vocab)
            .iter()
            .find(|(label, _)| *label == raw)
            .map(|(_, value)| *value)
    }

    /// The label for `self` in one vocabulary, if it has one
    fn encode(self, vocab: Vocabulary) -> Option<&'static str> {
        Self::table(vocab)
            .iter()
            .find(|(_, value)| *value == self)
            .map(|(label, _)| *label)
    }

    /// Parse a value written in any vocabulary.
    ///
    /// Rejects values that decode to nothing, and values that decode to
    /// different results depending on which vocabulary reads them.
    fn parse_any(raw: &str) -> Result<Self, VocabError> {
        let raw = raw.trim();
        let mut found: Option<Self> = None;
        for vocab in Vocabulary::ALL {
            if let Some(value) = Self::decode(vocab, raw) {
                match found {
                    Some(prev) if prev != value => {
                        return Err(VocabError::Ambiguous {
                            kind: Self::KIND,
                            raw: raw.to_string(),
                        });
                    }
                    _ => found = Some(value),
                }
            }
        }
        found.ok_or_else(|| VocabError::Unknown {
            kind: Self::KIND,
            raw: raw.to_string(),
        })
    }

    /// Storage label
    fn canonical(self) -> &'static str {
        self.encode(Vocabulary::Canonical).unwrap_or_default()
    }
}

/// Canonical task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    Todo,
    InProgress,
    Blocked,
    Done,
}

impl Status {
    pub const ALL: [Status; 4] = [Status::Todo, Status::InProgress, Status::Blocked, Status::Done];
}

const STATUS_CANONICAL: &[(&str, Status)] = &[
    ("todo", Status::Todo),
    ("inprogress", Status::InProgress),
    ("blocked", Status::Blocked),
    ("done", Status::Done),
];

const STATUS_KANBAN: &[(&str, Status)] = &[
    ("todo", Status::Todo),
    ("inprogress", Status::InProgress),
    ("done", Status::Done),
];

const STATUS_LIST: &[(&str, Status)] = &[
    ("Open", Status::Todo),
    ("InProgress", Status::InProgress),
    ("Blocked", Status::Blocked),
    ("Closed", Status::Done),
];

impl Vocab for Status {
    const KIND: &'static str = "status";

    fn table(vocab: Vocabulary) -> &'static [(&'static str, Self)] {
        match vocab {
            Vocabulary::Canonical => STATUS_CANONICAL,
            Vocabulary::Kanban => STATUS_KANBAN,
            Vocabulary::List => STATUS_LIST,
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];
}

const PRIORITY_CANONICAL: &[(&str, Priority)] = &[
    ("low", Priority::Low),
    ("medium", Priority::Medium),
    ("high", Priority::High),
];

const PRIORITY_LIST: &[(&str, Priority)] = &[
    ("Low", Priority::Low),
    ("Medium", Priority::Medium),
    ("High", Priority::High),
];

impl Vocab for Priority {
    const KIND: &'static str = "priority";

    fn table(vocab: Vocabulary) -> &'static [(&'static str, Self)] {
        match vocab {
            // The board has no priority lanes; cards show the storage form
            Vocabulary::Canonical | Vocabulary::Kanban => PRIORITY_CANONICAL,
            Vocabulary::List => PRIORITY_LIST,
        }
    }
}

macro_rules! vocab_str_impls {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.canonical())
            }
        }

        impl FromStr for $ty {
            type Err = VocabError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty as Vocab>::parse_any(s)
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.canonical())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                <$ty as Vocab>::parse_any(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

vocab_str_impls!(Status);
vocab_str_impls!(Priority);

/// A stored enumerated field that may hold a value outside the vocabulary.
///
/// Loading data never fails on an unknown value. It is kept verbatim so it
/// can be shown and written back, but it matches no filter value and belongs
/// to no board column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognized<T> {
    Known(T),
    Unrecognized(String),
}

impl<T: Vocab> Recognized<T> {
    pub fn from_raw(raw: &str) -> Self {
        match T::parse_any(raw) {
            Ok(value) => Recognized::Known(value),
            Err(_) => Recognized::Unrecognized(raw.to_string()),
        }
    }

    pub fn known(&self) -> Option<T> {
        match self {
            Recognized::Known(value) => Some(*value),
            Recognized::Unrecognized(_) => None,
        }
    }

    /// True only for a recognized value equal to `value`
    pub fn is(&self, value: T) -> bool {
        self.known() == Some(value)
    }

    /// Label in `vocab`, falling back to the storage label, then the raw text.
    pub fn label(&self, vocab: Vocabulary) -> &str {
        match self {
            Recognized::Known(value) => value.encode(vocab).unwrap_or_else(|| value.canonical()),
            Recognized::Unrecognized(raw) => raw,
        }
    }
}

impl<T> From<T> for Recognized<T> {
    fn from(value: T) -> Self {
        Recognized::Known(value)
    }
}

impl<T: Vocab> Serialize for Recognized<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label(Vocabulary::Canonical))
    }
}

impl<'de, T: Vocab> Deserialize<'de> for Recognized<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Recognized::from_raw(&raw))
    }
}
