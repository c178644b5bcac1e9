//! # Pagination
//!
//! Page requests and page results for coupon listings.
//!
//! ```text
//! 23 coupons, size 10
//!
//!   page 0 → items  0..10   last = false
//!   page 1 → items 10..20   last = false
//!   page 2 → items 20..23   last = true     total_pages = 3
//! ```
//! Pages are 0-based. A page past the end is empty and `last`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use coupon_core::validation::{validate_page_size, ValidationResult};
use coupon_core::ValidationError;

// =============================================================================
// Sorting
// =============================================================================

/// Columns a coupon listing may be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Id,
    Code,
    Kind,
    ExpiryDate,
    CreatedAt,
}

impl SortField {
    /// Whitelisted SQL column for this field.
    pub const fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Code => "code",
            SortField::Kind => "kind",
            SortField::ExpiryDate => "expiry_date",
            SortField::CreatedAt => "created_at",
        }
    }
}

impl FromStr for SortField {
    type Err = ValidationError;

    /// Accepts snake_case and camelCase names; `type` is an alias of `kind`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "id" => Ok(SortField::Id),
            "code" => Ok(SortField::Code),
            "kind" | "type" => Ok(SortField::Kind),
            "expiry_date" | "expiryDate" => Ok(SortField::ExpiryDate),
            "created_at" | "createdAt" => Ok(SortField::CreatedAt),
            _ => Err(ValidationError::NotAllowed {
                field: "sort".to_string(),
                allowed: ["id", "code", "kind", "expiry_date", "created_at"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(ValidationError::NotAllowed {
                field: "direction".to_string(),
                allowed: vec!["asc".to_string(), "desc".to_string()],
            }),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        })
    }
}

// =============================================================================
// Page Request / Page
// =============================================================================

/// Which slice of the listing to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 0-based page index.
    pub page: u32,
    pub size: u32,
    pub sort: SortField,
    pub direction: SortDirection,
}

impl PageRequest {
    /// Builds a request, validating the page size.
    pub fn new(
        page: u32,
        size: u32,
        sort: SortField,
        direction: SortDirection,
    ) -> ValidationResult<Self> {
        validate_page_size(size)?;
        Ok(PageRequest {
            page,
            size,
            sort,
            direction,
        })
    }

    /// Rows to skip.
    pub fn offset(&self) -> i64 {
        self.page as i64 * self.size as i64
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: i64,
    pub total_pages: u32,
    pub last: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: i64) -> Self {
        let size = request.size.max(1) as i64;
        let total_pages = ((total_elements.max(0) + size - 1) / size) as u32;
        Page {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages,
            last: request.page + 1 >= total_pages,
        }
    }

    /// Maps the content, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            last: self.last,
        }
    }
}
