// SQLite-backed calibration description database

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use rusqlite::{params, params_from_iter, Connection};

use calscope_engine::backend::Backend;
use calscope_engine::conversion::{Coefficients, Conversion};
use calscope_engine::error::SearchError;
use calscope_engine::model::{parse_address, DataType, ListRow, Measurement};
use calscope_engine::query::MatchPosition;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS measurement (
    name TEXT NOT NULL PRIMARY KEY,
    description TEXT NOT NULL DEFAULT '',
    datatype TEXT NOT NULL,
    conversion TEXT NOT NULL,
    lower_limit REAL NOT NULL,
    upper_limit REAL NOT NULL,
    address INTEGER                -- NULL = no ECU address resolved
);

CREATE INDEX IF NOT EXISTS idx_measurement_address ON measurement(address);

CREATE TABLE IF NOT EXISTS compu_method (
    name TEXT NOT NULL PRIMARY KEY,
    unit TEXT NOT NULL DEFAULT '',
    display_format TEXT,           -- printf-style precision string
    coeff_a REAL,
    coeff_b REAL,
    coeff_c REAL,
    coeff_d REAL,
    coeff_e REAL,
    coeff_f REAL
);
"#;

const SELECT_MEASUREMENTS: &str = "SELECT name, description, datatype, conversion, lower_limit, upper_limit, address \
     FROM measurement WHERE address IS NOT NULL AND ";

const ORDER_BY_NAME: &str = " ORDER BY name COLLATE NOCASE ASC, name ASC";

// Bound on IN (...) placeholder count per statement.
const CONVERSION_CHUNK: usize = 500;

/// One measurement row as it comes out of the description database, before
/// conversion resolution.
struct RawMeasurement {
    name: String,
    description: String,
    datatype: String,
    conversion: String,
    lower_limit: f64,
    upper_limit: f64,
    address: i64,
}

/// Fields of a measurement row inserted by the description builder.
pub struct MeasurementRecord<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub datatype: &'a str,
    pub conversion: &'a str,
    pub lower_limit: f64,
    pub upper_limit: f64,
    pub address: Option<u64>,
}

/// A query-filterable, disk-backed description. Opened from an existing
/// `.a2ldb` file (built by the load collaborator) or created fresh for
/// tests and the `convert` command.
#[derive(Debug)]
pub struct RelationalBackend {
    conn: Connection,
}

impl RelationalBackend {
    /// Open an existing description database.
    pub fn open(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Err(format!("no such description database: {}", path.display()));
        }
        let conn = Connection::open(path).map_err(|e| e.to_string())?;
        apply_pragmas(&conn);
        Ok(Self { conn })
    }

    /// Create a new, empty description database (schema applied).
    pub fn create(path: &Path) -> Result<Self, String> {
        let conn = Connection::open(path).map_err(|e| e.to_string())?;
        conn.execute_batch(SCHEMA).map_err(|e| e.to_string())?;
        apply_pragmas(&conn);
        Ok(Self { conn })
    }

    /// In-memory description, schema applied. Test fixture path.
    pub fn open_in_memory() -> Result<Self, String> {
        let conn = Connection::open_in_memory().map_err(|e| e.to_string())?;
        conn.execute_batch(SCHEMA).map_err(|e| e.to_string())?;
        Ok(Self { conn })
    }

    pub fn insert_measurement(&self, record: &MeasurementRecord<'_>) -> Result<(), String> {
        self.conn
            .execute(
                "INSERT INTO measurement (name, description, datatype, conversion, lower_limit, upper_limit, address) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.name,
                    record.description,
                    record.datatype,
                    record.conversion,
                    record.lower_limit,
                    record.upper_limit,
                    record.address.map(|a| a as i64),
                ],
            )
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn insert_conversion(
        &self,
        name: &str,
        unit: &str,
        display_format: Option<&str>,
        coefficients: Option<Coefficients>,
    ) -> Result<(), String> {
        let co = coefficients;
        self.conn
            .execute(
                "INSERT INTO compu_method (name, unit, display_format, coeff_a, coeff_b, coeff_c, coeff_d, coeff_e, coeff_f) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    name,
                    unit,
                    display_format,
                    co.map(|c| c.a),
                    co.map(|c| c.b),
                    co.map(|c| c.c),
                    co.map(|c| c.d),
                    co.map(|c| c.e),
                    co.map(|c| c.f),
                ],
            )
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Materialize working-list rows into this description database.
    ///
    /// Lossy by nature: the display equation cannot be decomposed back into
    /// coefficients, so each distinct unit becomes an identity compu-method.
    /// Returns (inserted, skipped); rows with an unparsable address, length,
    /// or limit are skipped.
    pub fn materialize_list(&self, rows: &[ListRow]) -> Result<(usize, usize), String> {
        self.conn.execute("BEGIN TRANSACTION", []).map_err(|e| e.to_string())?;

        let mut inserted = 0usize;
        let mut skipped = 0usize;
        let mut units: BTreeSet<String> = BTreeSet::new();

        for row in rows {
            let (Some(address), Ok(length), Ok(lower), Ok(upper)) = (
                parse_address(&row.address),
                row.length.trim().parse::<u8>(),
                row.prog_min.trim().parse::<f64>(),
                row.prog_max.trim().parse::<f64>(),
            ) else {
                skipped += 1;
                continue;
            };

            let signed = row.signed.trim().eq_ignore_ascii_case("TRUE");
            let datatype = match (length, signed) {
                (1, true) => "SBYTE",
                (1, false) => "UBYTE",
                (2, true) => "SWORD",
                (2, false) => "UWORD",
                (_, true) => "SLONG",
                (_, false) => "ULONG",
            };

            let conversion = conversion_name_for_unit(&row.unit);
            if units.insert(conversion.clone()) {
                let format = if row.format.is_empty() { None } else { Some(row.format.as_str()) };
                self.insert_conversion(&conversion, &row.unit, format, None)?;
            }

            self.insert_measurement(&MeasurementRecord {
                name: &row.name,
                description: &row.description,
                datatype,
                conversion: &conversion,
                lower_limit: lower,
                upper_limit: upper,
                address: Some(address),
            })?;
            inserted += 1;
        }

        self.conn.execute("COMMIT", []).map_err(|e| e.to_string())?;
        Ok((inserted, skipped))
    }

    fn search_text(&self, column: &str, text: &str, position: MatchPosition) -> Result<Vec<Measurement>, String> {
        let pattern = like_pattern(text, position);
        let predicate = format!("{column} LIKE ?1 ESCAPE '\\'");
        let raw = self.raw_query(&predicate, params![pattern])?;
        self.build_measurements(raw)
    }

    fn search_address(&self, address: u64, position: MatchPosition) -> Result<Vec<Measurement>, String> {
        // Indexed comparison, never a substring scan over hex strings.
        let predicate = match position {
            MatchPosition::Start => "address >= ?1",
            MatchPosition::End => "address <= ?1",
            MatchPosition::Contains | MatchPosition::Equals => "address = ?1",
        };
        let raw = self.raw_query(predicate, params![address as i64])?;
        self.build_measurements(raw)
    }

    fn raw_query(&self, predicate: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<RawMeasurement>, String> {
        let sql = format!("{SELECT_MEASUREMENTS}{predicate}{ORDER_BY_NAME}");
        let mut stmt = self.conn.prepare(&sql).map_err(|e| e.to_string())?;

        let rows = stmt
            .query_map(params, |row| {
                Ok(RawMeasurement {
                    name: row.get(0)?,
                    description: row.get(1)?,
                    datatype: row.get(2)?,
                    conversion: row.get(3)?,
                    lower_limit: row.get(4)?,
                    upper_limit: row.get(5)?,
                    address: row.get(6)?,
                })
            })
            .map_err(|e| e.to_string())?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| e.to_string())?);
        }
        Ok(out)
    }

    /// Resolve every distinct conversion reference of a raw result set in
    /// one pass (chunked IN queries), never one lookup per record.
    fn resolve_conversions(&self, raw: &[RawMeasurement]) -> Result<HashMap<String, Conversion>, String> {
        let names: Vec<&str> = raw
            .iter()
            .map(|r| r.conversion.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut resolved = HashMap::with_capacity(names.len());

        for chunk in names.chunks(CONVERSION_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT name, unit, display_format, coeff_a, coeff_b, coeff_c, coeff_d, coeff_e, coeff_f \
                 FROM compu_method WHERE name IN ({placeholders})"
            );
            let mut stmt = self.conn.prepare(&sql).map_err(|e| e.to_string())?;

            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), |row| {
                    let name: String = row.get(0)?;
                    let unit: String = row.get(1)?;
                    let format: Option<String> = row.get(2)?;
                    let coeffs: [Option<f64>; 6] = [
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                        row.get(7)?,
                        row.get(8)?,
                    ];
                    Ok((name, unit, format, coeffs))
                })
                .map_err(|e| e.to_string())?;

            for row in rows {
                let (name, unit, format, c) = row.map_err(|e| e.to_string())?;
                let coefficients = match c {
                    [Some(a), Some(b), Some(cc), Some(d), Some(e), Some(f)] => {
                        Some(Coefficients { a, b, c: cc, d, e, f })
                    }
                    _ => None,
                };
                resolved.insert(name, Conversion { unit, format, coefficients });
            }
        }

        Ok(resolved)
    }

    /// Build output records, dropping anything that cannot be fully
    /// rendered (unknown datatype, unresolvable conversion reference).
    fn build_measurements(&self, raw: Vec<RawMeasurement>) -> Result<Vec<Measurement>, String> {
        let conversions = self.resolve_conversions(&raw)?;

        let mut out = Vec::with_capacity(raw.len());
        for r in raw {
            let Some(datatype) = DataType::parse(&r.datatype) else {
                continue;
            };
            let Some(conversion) = conversions.get(&r.conversion) else {
                continue;
            };
            out.push(Measurement {
                name: r.name,
                unit: conversion.unit.clone(),
                equation: conversion.equation(),
                address: r.address as u64,
                length: datatype.byte_len(),
                signed: datatype.is_signed(),
                min: r.lower_limit,
                max: r.upper_limit,
                description: r.description,
                format: conversion.format.clone(),
            });
        }
        Ok(out)
    }
}

impl Backend for RelationalBackend {
    fn find_by_name(&self, text: &str, position: MatchPosition) -> Result<Vec<Measurement>, SearchError> {
        self.search_text("name", text, position).map_err(SearchError::Backend)
    }

    fn find_by_description(&self, text: &str, position: MatchPosition) -> Result<Vec<Measurement>, SearchError> {
        self.search_text("description", text, position).map_err(SearchError::Backend)
    }

    fn find_by_address(&self, address: u64, position: MatchPosition) -> Result<Vec<Measurement>, SearchError> {
        self.search_address(address, position).map_err(SearchError::Backend)
    }
}

/// Performance pragmas from the original loader. Non-fatal: the database
/// still works without them.
fn apply_pragmas(conn: &Connection) {
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "cache_size", -64000); // 64MB cache
    let _ = conn.pragma_update(None, "temp_store", "MEMORY");
}

fn conversion_name_for_unit(unit: &str) -> String {
    if unit.is_empty() {
        "CM_IDENTITY".to_string()
    } else {
        format!("CM_{}", unit.to_ascii_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"))
    }
}

/// SQL LIKE is case-insensitive for ASCII; `%` / `_` in the search text are
/// escaped so they match literally.
fn like_pattern(text: &str, position: MatchPosition) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    match position {
        MatchPosition::Start => format!("{escaped}%"),
        MatchPosition::Contains => format!("%{escaped}%"),
        MatchPosition::End => format!("%{escaped}"),
        MatchPosition::Equals => escaped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> RelationalBackend {
        let db = RelationalBackend::open_in_memory().unwrap();
        db.insert_conversion(
            "CM_RPM",
            "rpm",
            Some("%01.0f"),
            Some(Coefficients { a: 0.0, b: 2.0, c: -3.0, d: 0.0, e: 0.0, f: 6.0 }),
        )
        .unwrap();
        db.insert_conversion("CM_DEGC", "degC", None, None).unwrap();

        db.insert_measurement(&MeasurementRecord {
            name: "EngSpeed",
            description: "Engine speed",
            datatype: "UWORD",
            conversion: "CM_RPM",
            lower_limit: 0.0,
            upper_limit: 8000.0,
            address: Some(0x1a),
        })
        .unwrap();
        db.insert_measurement(&MeasurementRecord {
            name: "engLoad",
            description: "Engine load",
            datatype: "UBYTE",
            conversion: "CM_RPM",
            lower_limit: 0.0,
            upper_limit: 100.0,
            address: Some(0x20),
        })
        .unwrap();
        db.insert_measurement(&MeasurementRecord {
            name: "CoolantTemp",
            description: "Coolant temperature",
            datatype: "SBYTE",
            conversion: "CM_DEGC",
            lower_limit: -40.0,
            upper_limit: 215.0,
            address: Some(0x30),
        })
        .unwrap();
        db
    }

    #[test]
    fn name_contains_is_case_insensitive_and_sorted() {
        let db = fixture();
        let hits = db.find_by_name("ENG", MatchPosition::Contains).unwrap();
        let names: Vec<&str> = hits.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["EngSpeed", "engLoad"]);
    }

    #[test]
    fn name_prefix_suffix_equals() {
        let db = fixture();
        assert_eq!(db.find_by_name("cool", MatchPosition::Start).unwrap().len(), 1);
        assert_eq!(db.find_by_name("TEMP", MatchPosition::End).unwrap().len(), 1);
        assert_eq!(db.find_by_name("engspeed", MatchPosition::Equals).unwrap().len(), 1);
        assert!(db.find_by_name("engspee", MatchPosition::Equals).unwrap().is_empty());
    }

    #[test]
    fn conversion_metadata_is_resolved() {
        let db = fixture();
        let m = &db.find_by_name("EngSpeed", MatchPosition::Equals).unwrap()[0];
        assert_eq!(m.unit, "rpm");
        assert_eq!(m.equation, "((6 * [x]) + 3) / 2");
        assert_eq!(m.format.as_deref(), Some("%01.0f"));
        assert_eq!(m.length, 2);
        assert!(!m.signed);

        let m = &db.find_by_name("CoolantTemp", MatchPosition::Equals).unwrap()[0];
        assert_eq!(m.equation, "x");
        assert_eq!(m.length, 1);
        assert!(m.signed);
    }

    #[test]
    fn address_comparison_semantics() {
        let db = fixture();
        assert_eq!(db.find_by_address(0x1a, MatchPosition::Equals).unwrap()[0].name, "EngSpeed");
        assert_eq!(db.find_by_address(0x1a, MatchPosition::Contains).unwrap().len(), 1);
        assert_eq!(db.find_by_address(0x20, MatchPosition::Start).unwrap().len(), 2);
        assert_eq!(db.find_by_address(0x20, MatchPosition::End).unwrap().len(), 2);
        assert!(db.find_by_address(0x99, MatchPosition::Equals).unwrap().is_empty());
    }

    #[test]
    fn records_without_address_are_excluded() {
        let db = fixture();
        db.insert_measurement(&MeasurementRecord {
            name: "EngTorque",
            description: "Engine torque",
            datatype: "UWORD",
            conversion: "CM_RPM",
            lower_limit: 0.0,
            upper_limit: 500.0,
            address: None,
        })
        .unwrap();
        assert!(db.find_by_name("EngTorque", MatchPosition::Equals).unwrap().is_empty());
    }

    #[test]
    fn records_without_resolvable_conversion_are_excluded() {
        let db = fixture();
        db.insert_measurement(&MeasurementRecord {
            name: "Orphan",
            description: "",
            datatype: "UWORD",
            conversion: "CM_MISSING",
            lower_limit: 0.0,
            upper_limit: 1.0,
            address: Some(0x50),
        })
        .unwrap();
        assert!(db.find_by_name("Orphan", MatchPosition::Equals).unwrap().is_empty());
    }

    #[test]
    fn records_with_unknown_datatype_are_excluded() {
        let db = fixture();
        db.insert_measurement(&MeasurementRecord {
            name: "Wide",
            description: "",
            datatype: "A_UINT64",
            conversion: "CM_RPM",
            lower_limit: 0.0,
            upper_limit: 1.0,
            address: Some(0x60),
        })
        .unwrap();
        assert!(db.find_by_name("Wide", MatchPosition::Equals).unwrap().is_empty());
    }

    #[test]
    fn like_wildcards_in_search_text_match_literally() {
        let db = fixture();
        db.insert_conversion("CM_NONE", "", None, None).unwrap();
        db.insert_measurement(&MeasurementRecord {
            name: "Pct_100",
            description: "100% duty",
            datatype: "UBYTE",
            conversion: "CM_NONE",
            lower_limit: 0.0,
            upper_limit: 100.0,
            address: Some(0x70),
        })
        .unwrap();
        // "%" must not act as a wildcard
        assert!(db.find_by_name("%", MatchPosition::Contains).unwrap().is_empty());
        assert_eq!(db.find_by_description("100%", MatchPosition::Start).unwrap().len(), 1);
        // "_" must not match an arbitrary character
        assert_eq!(db.find_by_name("Pct_", MatchPosition::Start).unwrap().len(), 1);
        assert!(db.find_by_name("PctX", MatchPosition::Start).unwrap().is_empty());
    }

    #[test]
    fn materialize_list_roundtrips_through_search() {
        let db = RelationalBackend::open_in_memory().unwrap();
        let rows = vec![
            ListRow {
                name: "EngSpeed".to_string(),
                unit: "rpm".to_string(),
                equation: "x".to_string(),
                format: "%01.0f".to_string(),
                address: "0x1000".to_string(),
                length: "2".to_string(),
                signed: "FALSE".to_string(),
                prog_min: "0".to_string(),
                prog_max: "8000".to_string(),
                warn_min: "-1".to_string(),
                warn_max: "8001".to_string(),
                smoothing: "0".to_string(),
                enabled: "TRUE".to_string(),
                tabs: String::new(),
                assign_to: String::new(),
                description: "Engine speed".to_string(),
            },
            ListRow {
                name: "Broken".to_string(),
                unit: String::new(),
                equation: "x".to_string(),
                format: String::new(),
                address: "nope".to_string(),
                length: "2".to_string(),
                signed: "FALSE".to_string(),
                prog_min: "0".to_string(),
                prog_max: "1".to_string(),
                warn_min: "-1".to_string(),
                warn_max: "2".to_string(),
                smoothing: "0".to_string(),
                enabled: "TRUE".to_string(),
                tabs: String::new(),
                assign_to: String::new(),
                description: String::new(),
            },
        ];

        let (inserted, skipped) = db.materialize_list(&rows).unwrap();
        assert_eq!((inserted, skipped), (1, 1));

        let m = &db.find_by_name("EngSpeed", MatchPosition::Equals).unwrap()[0];
        assert_eq!(m.address, 0x1000);
        assert_eq!(m.unit, "rpm");
        assert_eq!(m.length, 2);
    }
}
