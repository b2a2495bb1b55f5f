use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of the authenticated caller, attached to promotion
/// snapshots for audit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Class levels
// ---------------------------------------------------------------------------

/// A grade level. Variants are declared in progression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClassLevel {
    #[serde(rename = "Nursery")]
    Nursery,
    #[serde(rename = "KG 1")]
    Kg1,
    #[serde(rename = "KG 2")]
    Kg2,
    #[serde(rename = "Class 1")]
    Class1,
    #[serde(rename = "Class 2")]
    Class2,
    #[serde(rename = "Class 3")]
    Class3,
    #[serde(rename = "Class 4")]
    Class4,
    #[serde(rename = "Class 5")]
    Class5,
    #[serde(rename = "Class 6")]
    Class6,
    #[serde(rename = "Class 7")]
    Class7,
    #[serde(rename = "Class 8")]
    Class8,
    #[serde(rename = "Class 9")]
    Class9,
    #[serde(rename = "Class 10")]
    Class10,
}

/// Every class level, lowest first.
pub const ALL_CLASSES: [ClassLevel; 13] = [
    ClassLevel::Nursery,
    ClassLevel::Kg1,
    ClassLevel::Kg2,
    ClassLevel::Class1,
    ClassLevel::Class2,
    ClassLevel::Class3,
    ClassLevel::Class4,
    ClassLevel::Class5,
    ClassLevel::Class6,
    ClassLevel::Class7,
    ClassLevel::Class8,
    ClassLevel::Class9,
    ClassLevel::Class10,
];

impl ClassLevel {
    /// The class a student moves into on promotion, or `None` at the top of
    /// the progression.
    pub fn next(self) -> Option<Self> {
        let pos = ALL_CLASSES.iter().position(|c| *c == self)?;
        ALL_CLASSES.get(pos + 1).copied()
    }

    /// The final class level; students here pass out on promotion.
    pub fn last() -> Self {
        ClassLevel::Class10
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClassLevel::Nursery => "Nursery",
            ClassLevel::Kg1 => "KG 1",
            ClassLevel::Kg2 => "KG 2",
            ClassLevel::Class1 => "Class 1",
            ClassLevel::Class2 => "Class 2",
            ClassLevel::Class3 => "Class 3",
            ClassLevel::Class4 => "Class 4",
            ClassLevel::Class5 => "Class 5",
            ClassLevel::Class6 => "Class 6",
            ClassLevel::Class7 => "Class 7",
            ClassLevel::Class8 => "Class 8",
            ClassLevel::Class9 => "Class 9",
            ClassLevel::Class10 => "Class 10",
        }
    }
}

impl fmt::Display for ClassLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Statuses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StudentStatus {
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "pass-out")]
    PassOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeacherStatus {
    Active,
    #[serde(rename = "On Leave")]
    OnLeave,
    Resigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeStatus {
    Unpaid,
    Paid,
    Partial,
}

impl FeeStatus {
    /// Whether a record in this status carries a paid date.
    pub fn is_settled(self) -> bool {
        self != FeeStatus::Unpaid
    }
}
