// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// Category key written by the current submission path.
pub const CATEGORY_FIELD_PRIMARY: &str = "tahap";
/// Category key written by the pre-rewrite submission path.
pub const CATEGORY_FIELD_LEGACY: &str = "stage";

/// Report date field, `YYYY-MM-DD` or locale-formatted. Range filtering is
/// inclusive lexicographic comparison on the raw string.
pub const DATE_FIELD: &str = "tanggal";

/// Creation-timestamp keys observed across the collection's lifetime, in
/// detection priority order. Any given document carries exactly one.
pub const TIME_FIELD_CANDIDATES: [&str; 5] = [
    "createdAt",
    "created_at",
    "timestamp",
    "waktu",
    "tanggal_input",
];

/// Attributes covered by free-text search, in match order.
pub const SEARCH_TEXT_FIELDS: [&str; 3] = ["nama", "lokasi", "keterangan"];

/// Which field name encodes the workflow stage for a document generation.
///
/// Resolved once per listing session by probing and threaded explicitly
/// through every subsequent query; never re-detected mid-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CategoryField {
    Tahap,
    Stage,
}

impl CategoryField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tahap => CATEGORY_FIELD_PRIMARY,
            Self::Stage => CATEGORY_FIELD_LEGACY,
        }
    }

    #[must_use]
    pub const fn candidates() -> [Self; 2] {
        [Self::Tahap, Self::Stage]
    }
}

/// Which field name encodes the creation timestamp used for ordering.
///
/// A cursor minted under one time field is only valid under that same field;
/// the engine pins the detected value for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TimeField {
    CreatedAt,
    CreatedAtSnake,
    Timestamp,
    Waktu,
    TanggalInput,
}

impl TimeField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::CreatedAtSnake => "created_at",
            Self::Timestamp => "timestamp",
            Self::Waktu => "waktu",
            Self::TanggalInput => "tanggal_input",
        }
    }

    #[must_use]
    pub const fn candidates() -> [Self; 5] {
        [
            Self::CreatedAt,
            Self::CreatedAtSnake,
            Self::Timestamp,
            Self::Waktu,
            Self::TanggalInput,
        ]
    }

    #[must_use]
    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::candidates().into_iter().find(|c| c.as_str() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_field_candidates_round_trip_by_name() {
        for candidate in TimeField::candidates() {
            assert_eq!(TimeField::from_field_name(candidate.as_str()), Some(candidate));
        }
        assert_eq!(TimeField::from_field_name("updatedAt"), None);
    }

    #[test]
    fn category_candidates_cover_both_writer_generations() {
        let names: Vec<&str> = CategoryField::candidates()
            .into_iter()
            .map(CategoryField::as_str)
            .collect();
        assert_eq!(names, [CATEGORY_FIELD_PRIMARY, CATEGORY_FIELD_LEGACY]);
    }
}
