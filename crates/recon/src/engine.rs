// Two-hop address reconciliation: address -> name in the original
// description, name -> address in the new one.

use std::fmt;
use std::time::{Duration, Instant};

use calscope_engine::backend::Backend;
use calscope_engine::error::SearchError;
use calscope_engine::model::{format_address, is_virtual_address, ListRow};
use calscope_engine::query::Query;
use calscope_engine::search::{collect, SingleFlight};

use crate::error::ReconError;

/// Outcome of one reconciliation run.
#[derive(Debug, Clone)]
pub struct ReconReport {
    /// Rows whose address was rewritten.
    pub replaced: usize,
    /// Rows examined against the descriptions (virtual rows excluded).
    pub examined: usize,
    /// Rows skipped because their address is a virtual marker.
    pub skipped_virtual: usize,
    pub elapsed: Duration,
    /// RFC 3339 timestamp of when the run started.
    pub run_at: String,
}

impl fmt::Display for ReconReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "replaced {} out of {} items in {:.2} seconds",
            self.replaced,
            self.examined,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Rewrites working-list addresses from one description generation to the
/// next. At most one run per reconciler at a time; a second caller gets
/// `ReconError::AlreadyRunning` instead of interleaved row mutation.
pub struct Reconciler {
    flight: SingleFlight,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    pub const fn new() -> Self {
        Self { flight: SingleFlight::new() }
    }

    /// Walk `rows` and rewrite each address that can be traced through both
    /// descriptions. Rows that cannot be traced keep their address and a
    /// line naming the miss goes to `log`. Virtual addresses are left alone
    /// without being looked up.
    pub fn run(
        &self,
        rows: &mut [ListRow],
        original: &dyn Backend,
        new_db: &dyn Backend,
        log: &mut dyn FnMut(String),
    ) -> Result<ReconReport, ReconError> {
        let _guard = self.flight.try_begin().ok_or(ReconError::AlreadyRunning)?;

        let started = Instant::now();
        let run_at = chrono::Utc::now().to_rfc3339();
        let mut replaced = 0usize;
        let mut examined = 0usize;
        let mut skipped_virtual = 0usize;

        for row in rows.iter_mut() {
            if is_virtual_address(&row.address) {
                skipped_virtual += 1;
                continue;
            }
            examined += 1;

            // Hop 1: identify the variable by its stale address.
            let Some(found) = first_hit(original, &Query::address_equals(&row.address))? else {
                log(format!(
                    "unable to find address {} [{}] in original database",
                    row.address, row.name
                ));
                continue;
            };

            // Hop 2: the same variable by exact name in the new build.
            let hits = collect(new_db, &Query::name_equals(&found))
                .map_err(|e| ReconError::Backend(e.to_string()))?;
            let Some(hit) = hits.into_iter().find(|m| m.name == found) else {
                log(format!("unable to find name {found} [{}] in new database", row.name));
                continue;
            };

            row.address = format_address(hit.address);
            replaced += 1;
        }

        Ok(ReconReport {
            replaced,
            examined,
            skipped_virtual,
            elapsed: started.elapsed(),
            run_at,
        })
    }
}

/// Name of the first match, if any. An unparsable address is a miss, not
/// an error: stale lists carry free-text address fields.
fn first_hit(backend: &dyn Backend, query: &Query) -> Result<Option<String>, ReconError> {
    match collect(backend, query) {
        Ok(hits) => Ok(hits.into_iter().next().map(|m| m.name)),
        Err(SearchError::InvalidQuery(_)) => Ok(None),
        Err(e) => Err(ReconError::Backend(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calscope_engine::backend::InMemoryBackend;
    use calscope_engine::model::Measurement;

    fn measurement(name: &str, address: u64) -> Measurement {
        Measurement {
            name: name.to_string(),
            unit: "rpm".to_string(),
            equation: "x".to_string(),
            address,
            length: 2,
            signed: false,
            min: 0.0,
            max: 8000.0,
            description: String::new(),
            format: None,
        }
    }

    fn row(name: &str, address: &str) -> ListRow {
        ListRow {
            name: name.to_string(),
            unit: "rpm".to_string(),
            equation: "x".to_string(),
            format: "%01.0f".to_string(),
            address: address.to_string(),
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
            description: String::new(),
        }
    }

    #[test]
    fn rewrites_addresses_through_both_descriptions() {
        let original =
            InMemoryBackend::from_measurements(vec![measurement("EngSpeed", 0x1a), measurement("EngLoad", 0x20)]);
        let new_db = InMemoryBackend::from_measurements(vec![
            measurement("EngSpeed", 0x2000),
            measurement("EngLoad", 0x2004),
        ]);

        let mut rows = vec![row("rpm display", "0x1a"), row("load display", "0x20")];
        let mut lines = Vec::new();
        let report = Reconciler::new()
            .run(&mut rows, &original, &new_db, &mut |l| lines.push(l))
            .unwrap();

        assert_eq!(report.replaced, 2);
        assert_eq!(report.examined, 2);
        assert_eq!(rows[0].address, "0x2000");
        assert_eq!(rows[1].address, "0x2004");
        assert!(lines.is_empty());
    }

    #[test]
    fn virtual_addresses_are_skipped_without_lookup() {
        let original = InMemoryBackend::from_measurements(vec![]);
        let new_db = InMemoryBackend::from_measurements(vec![]);

        let mut rows = vec![row("calc channel", "0xFFFF"), row("calc wide", "0xffffffff")];
        let mut lines = Vec::new();
        let report = Reconciler::new()
            .run(&mut rows, &original, &new_db, &mut |l| lines.push(l))
            .unwrap();

        assert_eq!(report.skipped_virtual, 2);
        assert_eq!(report.examined, 0);
        assert_eq!(rows[0].address, "0xFFFF");
        assert!(lines.is_empty());
    }

    #[test]
    fn original_miss_is_logged_and_row_kept() {
        let original = InMemoryBackend::from_measurements(vec![]);
        let new_db = InMemoryBackend::from_measurements(vec![measurement("EngSpeed", 0x2000)]);

        let mut rows = vec![row("rpm display", "0x1a")];
        let mut lines = Vec::new();
        let report = Reconciler::new()
            .run(&mut rows, &original, &new_db, &mut |l| lines.push(l))
            .unwrap();

        assert_eq!(report.replaced, 0);
        assert_eq!(rows[0].address, "0x1a");
        assert_eq!(lines, ["unable to find address 0x1a [rpm display] in original database"]);
    }

    #[test]
    fn new_database_miss_is_logged_and_row_kept() {
        let original = InMemoryBackend::from_measurements(vec![measurement("EngSpeed", 0x1a)]);
        let new_db = InMemoryBackend::from_measurements(vec![]);

        let mut rows = vec![row("rpm display", "0x1a")];
        let mut lines = Vec::new();
        Reconciler::new()
            .run(&mut rows, &original, &new_db, &mut |l| lines.push(l))
            .unwrap();

        assert_eq!(rows[0].address, "0x1a");
        assert_eq!(lines, ["unable to find name EngSpeed [rpm display] in new database"]);
    }

    #[test]
    fn unparsable_address_counts_as_original_miss() {
        let original = InMemoryBackend::from_measurements(vec![measurement("EngSpeed", 0x1a)]);
        let new_db = InMemoryBackend::from_measurements(vec![measurement("EngSpeed", 0x2000)]);

        let mut rows = vec![row("garbled", "not-an-address")];
        let mut lines = Vec::new();
        let report = Reconciler::new()
            .run(&mut rows, &original, &new_db, &mut |l| lines.push(l))
            .unwrap();

        assert_eq!(report.replaced, 0);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("unable to find address not-an-address"));
    }

    #[test]
    fn second_concurrent_run_is_rejected() {
        let original = InMemoryBackend::from_measurements(vec![]);
        let new_db = InMemoryBackend::from_measurements(vec![]);
        let recon = Reconciler::new();

        // Re-enter from inside the log callback of a miss.
        let mut rows = vec![row("rpm display", "0x1a")];
        let mut nested_result = None;
        recon
            .run(&mut rows, &original, &new_db, &mut |_| {
                let mut inner = vec![row("x", "0x2")];
                nested_result = Some(recon.run(&mut inner, &original, &new_db, &mut |_| {}));
            })
            .unwrap();

        assert!(matches!(nested_result, Some(Err(ReconError::AlreadyRunning))));

        // Guard released: a fresh run succeeds.
        assert!(recon.run(&mut rows, &original, &new_db, &mut |_| {}).is_ok());
    }
}
