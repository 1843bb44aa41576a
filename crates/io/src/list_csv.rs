// Working-list CSV import/export

use std::fs;
use std::path::Path;

use calscope_engine::model::ListRow;

use crate::error::ListIoError;

/// Columns every working list must carry, in canonical export order.
pub const REQUIRED_COLUMNS: [&str; 15] = [
    "Name", "Unit", "Equation", "Format", "Address", "Length", "Signed", "ProgMin", "ProgMax",
    "WarnMin", "WarnMax", "Smoothing", "Enabled", "Tabs", "Assign To",
];

/// Optional trailing column; absent in lists produced by older tools.
pub const DESCRIPTION_COLUMN: &str = "Description";

/// Read a list CSV. Column order in the file is free; columns are resolved
/// by header name and any required column missing is an error.
pub fn import(path: &Path) -> Result<Vec<ListRow>, ListIoError> {
    let text = read_file_as_utf8(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(|e| ListIoError::Csv(e.to_string()))?.clone();

    let index_of = |column: &str| -> Option<usize> {
        headers.iter().position(|h| h.trim() == column)
    };

    let mut required = [0usize; 15];
    for (slot, column) in required.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = index_of(column).ok_or_else(|| ListIoError::MissingColumn(column.to_string()))?;
    }
    let description = index_of(DESCRIPTION_COLUMN);

    let field = |record: &csv::StringRecord, idx: usize| -> String {
        record.get(idx).unwrap_or_default().to_string()
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ListIoError::Csv(e.to_string()))?;
        rows.push(ListRow {
            name: field(&record, required[0]),
            unit: field(&record, required[1]),
            equation: field(&record, required[2]),
            format: field(&record, required[3]),
            address: field(&record, required[4]),
            length: field(&record, required[5]),
            signed: field(&record, required[6]),
            prog_min: field(&record, required[7]),
            prog_max: field(&record, required[8]),
            warn_min: field(&record, required[9]),
            warn_max: field(&record, required[10]),
            smoothing: field(&record, required[11]),
            enabled: field(&record, required[12]),
            tabs: field(&record, required[13]),
            assign_to: field(&record, required[14]),
            description: description.map(|idx| field(&record, idx)).unwrap_or_default(),
        });
    }
    Ok(rows)
}

/// Write a list CSV in canonical column order, Description last.
pub fn export(path: &Path, rows: &[ListRow]) -> Result<(), ListIoError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| ListIoError::Csv(e.to_string()))?;

    let mut header: Vec<&str> = REQUIRED_COLUMNS.to_vec();
    header.push(DESCRIPTION_COLUMN);
    writer.write_record(&header).map_err(|e| ListIoError::Csv(e.to_string()))?;

    for row in rows {
        writer
            .write_record([
                row.name.as_str(),
                row.unit.as_str(),
                row.equation.as_str(),
                row.format.as_str(),
                row.address.as_str(),
                row.length.as_str(),
                row.signed.as_str(),
                row.prog_min.as_str(),
                row.prog_max.as_str(),
                row.warn_min.as_str(),
                row.warn_max.as_str(),
                row.smoothing.as_str(),
                row.enabled.as_str(),
                row.tabs.as_str(),
                row.assign_to.as_str(),
                row.description.as_str(),
            ])
            .map_err(|e| ListIoError::Csv(e.to_string()))?;
    }
    writer.flush().map_err(|e| ListIoError::Io(e.to_string()))?;
    Ok(())
}

/// Lists in the field come as UTF-8 or legacy Windows-1252 exports; decode
/// as UTF-8 first and fall back to 1252 rather than failing.
pub fn read_file_as_utf8(path: &Path) -> Result<String, ListIoError> {
    let bytes = fs::read(path).map_err(|e| ListIoError::Io(e.to_string()))?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(err.as_bytes());
            Ok(decoded.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn sample_row() -> ListRow {
        ListRow {
            name: "EngSpeed".to_string(),
            unit: "rpm".to_string(),
            equation: "x".to_string(),
            format: "%01.0f".to_string(),
            address: "0x1a".to_string(),
            length: "2".to_string(),
            signed: "FALSE".to_string(),
            prog_min: "0".to_string(),
            prog_max: "8000".to_string(),
            warn_min: "-1".to_string(),
            warn_max: "8001".to_string(),
            smoothing: "0".to_string(),
            enabled: "TRUE".to_string(),
            tabs: "Engine".to_string(),
            assign_to: String::new(),
            description: "Engine speed".to_string(),
        }
    }

    #[test]
    fn export_then_import_preserves_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.csv");

        export(&path, &[sample_row()]).unwrap();
        let rows = import(&path).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], sample_row());
    }

    #[test]
    fn import_resolves_columns_by_header_not_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shuffled.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "Address,Name,Unit,Equation,Format,Length,Signed,ProgMin,ProgMax,WarnMin,WarnMax,Smoothing,Enabled,Tabs,Assign To"
        )
        .unwrap();
        writeln!(f, "0x20,engLoad,%,x,%01.0f,1,FALSE,0,100,-1,101,0,TRUE,,").unwrap();
        drop(f);

        let rows = import(&path).unwrap();
        assert_eq!(rows[0].name, "engLoad");
        assert_eq!(rows[0].address, "0x20");
        // Description column absent: field defaults to empty
        assert_eq!(rows[0].description, "");
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "Name,Unit").unwrap();
        writeln!(f, "EngSpeed,rpm").unwrap();
        drop(f);

        match import(&path) {
            Err(ListIoError::MissingColumn(col)) => assert_eq!(col, "Equation"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn windows_1252_input_is_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        let mut header = REQUIRED_COLUMNS.join(",").into_bytes();
        header.extend_from_slice(b",Description\n");
        f.write_all(&header).unwrap();
        // 0xB0 is the degree sign in Windows-1252, invalid as UTF-8
        f.write_all(b"CoolantTemp,\xB0C,x,,0x30,1,TRUE,-40,215,-41,216,0,TRUE,,,\n").unwrap();
        drop(f);

        let rows = import(&path).unwrap();
        assert_eq!(rows[0].unit, "\u{b0}C");
    }
}
