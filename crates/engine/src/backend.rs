//! Uniform query surface over the two concrete description stores.
//!
//! Callers dispatch through the [`Backend`] trait; the SQLite-backed
//! relational description implements it in `calscope-io`, the in-memory
//! description lives here.

use rustc_hash::FxHashMap;

use crate::error::SearchError;
use crate::model::{parse_address, ListRow, Measurement};
use crate::query::MatchPosition;

/// A loaded calibration description. Implementations return results ordered
/// ascending by name (ASCII-case-insensitive, byte order as tie-break) and
/// never include a record lacking an address or a resolvable conversion.
pub trait Backend: std::fmt::Debug {
    fn find_by_name(&self, text: &str, position: MatchPosition) -> Result<Vec<Measurement>, SearchError>;

    fn find_by_description(&self, text: &str, position: MatchPosition) -> Result<Vec<Measurement>, SearchError>;

    /// Address comparison semantics: `Start` → address ≥ value,
    /// `End` → address ≤ value, `Contains`/`Equals` → address = value.
    fn find_by_address(&self, address: u64, position: MatchPosition) -> Result<Vec<Measurement>, SearchError>;
}

/// Case-insensitive position match. `needle_lower` must already be lowercased.
pub(crate) fn matches_at(haystack: &str, needle_lower: &str, position: MatchPosition) -> bool {
    let hay = haystack.to_ascii_lowercase();
    match position {
        MatchPosition::Start => hay.starts_with(needle_lower),
        MatchPosition::Contains => hay.contains(needle_lower),
        MatchPosition::End => hay.ends_with(needle_lower),
        MatchPosition::Equals => hay == needle_lower,
    }
}

/// Canonical result ordering shared by both backends.
pub(crate) fn sort_by_name(items: &mut [Measurement]) {
    items.sort_by(|a, b| {
        a.name
            .to_ascii_lowercase()
            .cmp(&b.name.to_ascii_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// A description materialized as three precomputed dictionaries, built once
/// at load time from working-list rows. Rows whose address, length, or
/// limits cannot be parsed are dropped at build time: a record that cannot
/// be fully rendered is never a search result.
#[derive(Debug)]
pub struct InMemoryBackend {
    by_name: FxHashMap<String, Measurement>,
    by_description: FxHashMap<String, Measurement>,
    by_address: FxHashMap<u64, Measurement>,
    skipped: usize,
}

impl InMemoryBackend {
    pub fn from_rows(rows: &[ListRow]) -> Self {
        let mut skipped = 0usize;
        let rendered: Vec<Measurement> = rows
            .iter()
            .filter_map(|row| {
                let m = Self::render(row);
                if m.is_none() {
                    skipped += 1;
                }
                m
            })
            .collect();

        let mut backend = Self::from_measurements(rendered);
        backend.skipped = skipped;
        backend
    }

    /// Index already-rendered measurements. On key collision the later
    /// entry wins, matching load order in description files.
    pub fn from_measurements(measurements: Vec<Measurement>) -> Self {
        let mut by_name = FxHashMap::default();
        let mut by_description = FxHashMap::default();
        let mut by_address = FxHashMap::default();

        for m in measurements {
            by_name.insert(m.name.to_ascii_lowercase(), m.clone());
            if !m.description.is_empty() {
                by_description.insert(m.description.to_ascii_lowercase(), m.clone());
            }
            by_address.insert(m.address, m);
        }

        Self { by_name, by_description, by_address, skipped: 0 }
    }

    /// Number of distinct names indexed.
    pub fn indexed(&self) -> usize {
        self.by_name.len()
    }

    /// Rows dropped at build time because they could not be rendered.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn render(row: &ListRow) -> Option<Measurement> {
        let address = parse_address(&row.address)?;
        let length = row.length.trim().parse::<u8>().ok()?;
        let min = row.prog_min.trim().parse::<f64>().ok()?;
        let max = row.prog_max.trim().parse::<f64>().ok()?;
        Some(Measurement {
            name: row.name.clone(),
            unit: row.unit.clone(),
            equation: row.equation.clone(),
            address,
            length,
            signed: row.signed.trim().eq_ignore_ascii_case("TRUE"),
            min,
            max,
            description: row.description.clone(),
            format: None,
        })
    }

    fn scan<F>(&self, keep: F) -> Vec<Measurement>
    where
        F: Fn(&Measurement) -> bool,
    {
        let mut out: Vec<Measurement> = self.by_name.values().filter(|m| keep(m)).cloned().collect();
        sort_by_name(&mut out);
        out
    }
}

impl Backend for InMemoryBackend {
    fn find_by_name(&self, text: &str, position: MatchPosition) -> Result<Vec<Measurement>, SearchError> {
        let needle = text.to_ascii_lowercase();
        Ok(self.scan(|m| matches_at(&m.name, &needle, position)))
    }

    fn find_by_description(&self, text: &str, position: MatchPosition) -> Result<Vec<Measurement>, SearchError> {
        let needle = text.to_ascii_lowercase();
        let mut out: Vec<Measurement> = self
            .by_description
            .values()
            .filter(|m| matches_at(&m.description, &needle, position))
            .cloned()
            .collect();
        sort_by_name(&mut out);
        Ok(out)
    }

    fn find_by_address(&self, address: u64, position: MatchPosition) -> Result<Vec<Measurement>, SearchError> {
        let out = match position {
            // Direct key lookup for exact matches.
            MatchPosition::Equals => self.by_address.get(&address).cloned().into_iter().collect(),
            MatchPosition::Contains => self.scan(|m| m.address == address),
            MatchPosition::Start => self.scan(|m| m.address >= address),
            MatchPosition::End => self.scan(|m| m.address <= address),
        };
        Ok(out)
    }
}
