use serde::{Deserialize, Serialize};

/// Hard cap on emitted results when the caller does not override it.
pub const DEFAULT_MAX_ITEMS: usize = 20_000;

/// Records accumulated per batch emission.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Where the search text must sit within the candidate field.
///
/// For Address searches the positions take comparison semantics instead:
/// `Start` → address ≥ value, `End` → address ≤ value,
/// `Contains`/`Equals` → address = value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPosition {
    Start,
    Contains,
    End,
    Equals,
}

impl std::str::FromStr for MatchPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "contains" => Ok(Self::Contains),
            "end" => Ok(Self::End),
            "equals" => Ok(Self::Equals),
            other => Err(format!("unknown match position: \"{other}\" (expected start, contains, end, or equals)")),
        }
    }
}

impl std::fmt::Display for MatchPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "starts with"),
            Self::Contains => write!(f, "contains"),
            Self::End => write!(f, "ends with"),
            Self::Equals => write!(f, "equals"),
        }
    }
}

/// Which measurement field the query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    Name,
    Description,
    Address,
}

impl std::str::FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "description" => Ok(Self::Description),
            "address" => Ok(Self::Address),
            other => Err(format!("unknown search field: \"{other}\" (expected name, description, or address)")),
        }
    }
}

impl std::fmt::Display for SearchField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Description => write!(f, "description"),
            Self::Address => write!(f, "address"),
        }
    }
}

/// An immutable search request. Constructed fresh per call and passed
/// explicitly; nothing about a running search is shared between calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub field: SearchField,
    pub position: MatchPosition,
    pub max_items: usize,
    pub batch_size: usize,
}

impl Query {
    pub fn new(field: SearchField, position: MatchPosition, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            field,
            position,
            max_items: DEFAULT_MAX_ITEMS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Exact-address lookup with no item budget, as used by reconciliation.
    pub fn address_equals(address_text: impl Into<String>) -> Self {
        Self::new(SearchField::Address, MatchPosition::Equals, address_text).with_max_items(usize::MAX)
    }

    /// Exact-name lookup with no item budget, as used by reconciliation.
    pub fn name_equals(name: impl Into<String>) -> Self {
        Self::new(SearchField::Name, MatchPosition::Equals, name).with_max_items(usize::MAX)
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let q = Query::new(SearchField::Name, MatchPosition::Contains, "Eng");
        assert_eq!(q.max_items, DEFAULT_MAX_ITEMS);
        assert_eq!(q.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn recon_lookups_uncapped() {
        assert_eq!(Query::address_equals("0x10").max_items, usize::MAX);
        assert_eq!(Query::name_equals("X").max_items, usize::MAX);
    }

    #[test]
    fn parse_field_and_position() {
        assert_eq!("name".parse::<SearchField>().unwrap(), SearchField::Name);
        assert_eq!("equals".parse::<MatchPosition>().unwrap(), MatchPosition::Equals);
        assert!("addr".parse::<SearchField>().is_err());
        assert!("middle".parse::<MatchPosition>().is_err());
    }

    #[test]
    fn batch_size_floor() {
        let q = Query::new(SearchField::Name, MatchPosition::Start, "a").with_batch_size(0);
        assert_eq!(q.batch_size, 1);
    }
}
