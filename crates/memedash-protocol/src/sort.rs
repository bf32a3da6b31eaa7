//! Sorting and paging parameters accepted by `/memes/allmemes`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors returned when parsing sort or paging parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseParamError {
    #[error("unknown sort field: {0}")]
    SortField(String),
    #[error("unknown sort order: {0}")]
    SortOrder(String),
    #[error("unsupported page size: {0} (expected 20, 50 or 100)")]
    PageSize(u32),
}

/// Field the history feed is ordered by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    Score,
    RedditCreatedAt,
    NumComments,
}

impl SortField {
    pub const ALL: [SortField; 4] = [
        SortField::CreatedAt,
        SortField::Score,
        SortField::RedditCreatedAt,
        SortField::NumComments,
    ];

    /// Value sent as the `sort_by` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Score => "score",
            SortField::RedditCreatedAt => "reddit_created_at",
            SortField::NumComments => "num_comments",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortField::CreatedAt => "Date Created",
            SortField::Score => "Score",
            SortField::RedditCreatedAt => "Reddit Date",
            SortField::NumComments => "Comments",
        }
    }

    /// The following option, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|field| *field == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = ParseParamError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == value)
            .ok_or_else(|| ParseParamError::SortField(value.to_string()))
    }
}

/// Direction of the history ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Asc => "Ascending",
            SortOrder::Desc => "Descending",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ParseParamError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(ParseParamError::SortOrder(other.to_string())),
        }
    }
}

/// Number of memes per history page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "u32", into = "u32")]
pub enum PageSize {
    #[default]
    Twenty,
    Fifty,
    Hundred,
}

impl PageSize {
    pub const ALL: [PageSize; 3] = [PageSize::Twenty, PageSize::Fifty, PageSize::Hundred];

    pub fn value(self) -> u32 {
        match self {
            PageSize::Twenty => 20,
            PageSize::Fifty => 50,
            PageSize::Hundred => 100,
        }
    }

    pub fn label(self) -> String {
        format!("{} per page", self.value())
    }

    /// The following option, wrapping around.
    pub fn next(self) -> Self {
        match self {
            PageSize::Twenty => PageSize::Fifty,
            PageSize::Fifty => PageSize::Hundred,
            PageSize::Hundred => PageSize::Twenty,
        }
    }
}

impl TryFrom<u32> for PageSize {
    type Error = ParseParamError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            20 => Ok(PageSize::Twenty),
            50 => Ok(PageSize::Fifty),
            100 => Ok(PageSize::Hundred),
            other => Err(ParseParamError::PageSize(other)),
        }
    }
}

impl From<PageSize> for u32 {
    fn from(size: PageSize) -> Self {
        size.value()
    }
}
