//! Duplicate-address detection over the working list.
//!
//! Advisory only: the result drives highlighting and never removes or
//! reorders rows. Single bucket pass, O(n) in list size.

use rustc_hash::FxHashMap;

use crate::model::{is_virtual_address, ListRow};

/// Flag every row that shares a (case-folded) address with another
/// non-exempt row. Virtual addresses never flag, regardless of collisions.
/// Returns the flagged row indices sorted ascending; idempotent and
/// re-runnable after any list mutation.
pub fn find_duplicates(rows: &[ListRow]) -> Vec<usize> {
    let mut buckets: FxHashMap<String, Vec<usize>> = FxHashMap::default();

    for (index, row) in rows.iter().enumerate() {
        let address = row.address.trim();
        if address.is_empty() || is_virtual_address(address) {
            continue;
        }
        buckets.entry(address.to_ascii_lowercase()).or_default().push(index);
    }

    let mut flagged: Vec<usize> = buckets
        .into_values()
        .filter(|indices| indices.len() > 1)
        .flatten()
        .collect();
    flagged.sort_unstable();
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, address: &str) -> ListRow {
        ListRow {
            name: name.to_string(),
            unit: String::new(),
            equation: "x".to_string(),
            format: String::new(),
            address: address.to_string(),
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
        }
    }

    #[test]
    fn flags_exactly_the_colliding_rows() {
        let rows = vec![
            row("A", "0x01"),
            row("B", "0x02"),
            row("C", "0x10"),
            row("D", "0x03"),
            row("E", "0x10"),
        ];
        assert_eq!(find_duplicates(&rows), vec![2, 4]);
    }

    #[test]
    fn address_comparison_is_case_folded() {
        let rows = vec![row("A", "0x1A"), row("B", "0x1a")];
        assert_eq!(find_duplicates(&rows), vec![0, 1]);
    }

    #[test]
    fn virtual_addresses_never_flag() {
        let rows = vec![
            row("A", "0xFFFFFFFF"),
            row("B", "0xFFFFFFFF"),
            row("C", "0xffffffff"),
        ];
        assert!(find_duplicates(&rows).is_empty());
    }

    #[test]
    fn empty_addresses_are_exempt() {
        let rows = vec![row("A", ""), row("B", ""), row("C", "0x10")];
        assert!(find_duplicates(&rows).is_empty());
    }

    #[test]
    fn rescan_is_idempotent() {
        let rows = vec![row("A", "0x10"), row("B", "0x10")];
        let first = find_duplicates(&rows);
        assert_eq!(find_duplicates(&rows), first);
    }
}
