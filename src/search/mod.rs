//! Single-field text search over an already loaded collection.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::inventory::Material;

/// Field the query is matched against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchField {
    #[default]
    Name,
    Category,
    LastUpdated,
}

impl SearchField {
    pub const ALL: [SearchField; 3] = [Self::Name, Self::Category, Self::LastUpdated];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Category => "category",
            Self::LastUpdated => "lastUpdated",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Category => "Category",
            Self::LastUpdated => "Last Updated",
        }
    }

    /// Cycle to the next field, wrapping around
    pub fn next(self) -> Self {
        match self {
            Self::Name => Self::Category,
            Self::Category => Self::LastUpdated,
            Self::LastUpdated => Self::Name,
        }
    }
}

impl std::fmt::Display for SearchField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "category" => Ok(Self::Category),
            "lastUpdated" | "last_updated" => Ok(Self::LastUpdated),
            _ => Err(format!(
                "Unknown search field: {} (expected name, category or lastUpdated)",
                s
            )),
        }
    }
}

/// Filter against the local timezone's date rendering
pub fn filter(materials: &[Material], query: &str, field: SearchField) -> Vec<Material> {
    filter_in(&Local, materials, query, field)
}

/// Keep materials whose chosen field contains `query`, case-insensitively.
/// An empty query keeps everything.
pub fn filter_in<Tz: TimeZone>(
    tz: &Tz,
    materials: &[Material],
    query: &str,
    field: SearchField,
) -> Vec<Material>
where
    Tz::Offset: std::fmt::Display,
{
    if query.is_empty() {
        return materials.to_vec();
    }

    let needle = query.to_lowercase();
    materials
        .iter()
        .filter(|m| {
            let haystack = match field {
                SearchField::Name => m.name.to_lowercase(),
                SearchField::Category => m.category.to_lowercase(),
                SearchField::LastUpdated => display_date(tz, &m.last_updated),
            };
            haystack.contains(&needle)
        })
        .cloned()
        .collect()
}

/// Human-readable date, e.g. `3/7/2026`
pub fn display_date<Tz: TimeZone>(tz: &Tz, at: &DateTime<Utc>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.with_timezone(tz).format("%-m/%-d/%Y").to_string()
}
