use serde::Serialize;

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Sentinel addresses (all-ones patterns) used for variables that have no
/// real location in the image. Exempt from duplicate detection and never
/// rewritten by reconciliation.
pub const VIRTUAL_ADDRESSES: [&str; 3] = ["0xffff", "0xffffff", "0xffffffff"];

/// Case-insensitive membership test against [`VIRTUAL_ADDRESSES`].
pub fn is_virtual_address(address: &str) -> bool {
    let trimmed = address.trim();
    VIRTUAL_ADDRESSES.iter().any(|v| v.eq_ignore_ascii_case(trimmed))
}

/// Canonical display form: lowercase hex with `0x` prefix.
pub fn format_address(address: u64) -> String {
    format!("{address:#x}")
}

/// Parse a hex address string. Case-insensitive, `0x` prefix optional.
pub fn parse_address(text: &str) -> Option<u64> {
    let t = text.trim();
    let t = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")).unwrap_or(t);
    if t.is_empty() {
        return None;
    }
    u64::from_str_radix(t, 16).ok()
}

// ---------------------------------------------------------------------------
// Numeric rendering
// ---------------------------------------------------------------------------

/// Render a limit value to 5 significant digits, never in scientific
/// notation. Trailing zeros after the decimal point are trimmed.
pub fn format_limit(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let exp = value.abs().log10().floor() as i32;
    let scale = 10f64.powi(exp - 4);
    let rounded = (value / scale).round() * scale;
    let decimals = (4 - exp).max(0) as usize;

    let mut s = format!("{rounded:.decimals$}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

// ---------------------------------------------------------------------------
// Datatypes
// ---------------------------------------------------------------------------

/// Storage datatype of a measurement. Fixed table: byte length and
/// signedness are derived from the variant, never stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataType {
    Ubyte,
    Sbyte,
    Uword,
    Sword,
    Ulong,
    Slong,
    Float32Ieee,
}

impl DataType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UBYTE" => Some(Self::Ubyte),
            "SBYTE" => Some(Self::Sbyte),
            "UWORD" => Some(Self::Uword),
            "SWORD" => Some(Self::Sword),
            "ULONG" => Some(Self::Ulong),
            "SLONG" => Some(Self::Slong),
            "FLOAT32_IEEE" => Some(Self::Float32Ieee),
            _ => None,
        }
    }

    pub fn byte_len(self) -> u8 {
        match self {
            Self::Ubyte | Self::Sbyte => 1,
            Self::Uword | Self::Sword => 2,
            Self::Ulong | Self::Slong | Self::Float32Ieee => 4,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(self, Self::Sbyte | Self::Sword | Self::Slong)
    }
}

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

/// A fully rendered search result: a named calibratable variable with a
/// resolved address, unit, and display equation. Backends never emit a
/// measurement that could not be fully rendered.
#[derive(Debug, Clone, Serialize)]
pub struct Measurement {
    pub name: String,
    pub unit: String,
    pub equation: String,
    pub address: u64,
    pub length: u8,
    pub signed: bool,
    pub min: f64,
    pub max: f64,
    pub description: String,
    /// printf-style precision string, resolved from the compu-method by the
    /// relational backend. Absent on in-memory results, where the working
    /// list keeps its own format column.
    pub format: Option<String>,
}

impl Measurement {
    pub fn display_address(&self) -> String {
        format_address(self.address)
    }
}

// ---------------------------------------------------------------------------
// Working list
// ---------------------------------------------------------------------------

/// One row of the caller-curated working list. String-typed throughout:
/// rows round-trip through CSV byte-for-byte and are identified by position,
/// not content. `address` is the reconciliation / duplicate-detection key
/// and is not guaranteed unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListRow {
    pub name: String,
    pub unit: String,
    pub equation: String,
    pub format: String,
    pub address: String,
    pub length: String,
    pub signed: String,
    pub prog_min: String,
    pub prog_max: String,
    pub warn_min: String,
    pub warn_max: String,
    pub smoothing: String,
    pub enabled: String,
    pub tabs: String,
    pub assign_to: String,
    pub description: String,
}

impl ListRow {
    /// Seed a list row from a search result: warn bounds are one unit
    /// outside the programmed bounds, smoothing off, row enabled.
    pub fn from_measurement(m: &Measurement) -> Self {
        Self {
            name: m.name.clone(),
            unit: m.unit.clone(),
            equation: m.equation.clone(),
            format: m.format.clone().unwrap_or_else(|| "%01.0f".to_string()),
            address: m.display_address(),
            length: m.length.to_string(),
            signed: if m.signed { "TRUE".to_string() } else { "FALSE".to_string() },
            prog_min: format_limit(m.min),
            prog_max: format_limit(m.max),
            warn_min: format_limit(m.min - 1.0),
            warn_max: format_limit(m.max + 1.0),
            smoothing: "0".to_string(),
            enabled: "TRUE".to_string(),
            tabs: String::new(),
            assign_to: String::new(),
            description: m.description.clone(),
        }
    }
}
