use log::debug;

use super::model::Dataset;
use crate::error::Result;

/// Convert every value of each named field to a number.
///
/// Cells that fail conversion become `Missing`; malformed content never
/// raises.  The only error is a named field that is not a column.
pub fn coerce_numeric<S: AsRef<str>>(dataset: &Dataset, fields: &[S]) -> Result<Dataset> {
    dataset.require_columns(fields)?;

    let mut failed = 0usize;
    let records = dataset
        .records
        .iter()
        .map(|record| {
            let mut out = record.clone();
            for field in fields {
                let field = field.as_ref();
                let before = record.get(field);
                let after = before.coerce_numeric();
                if after.is_missing() && !before.is_missing() {
                    failed += 1;
                }
                out.set(field, after);
            }
            out
        })
        .collect();

    if failed > 0 {
        debug!("coerce_numeric: {failed} cell(s) became missing");
    }
    Ok(dataset.derive(records))
}

/// Keep only records where every required field is present.
///
/// Order-preserving and idempotent.
pub fn drop_incomplete<S: AsRef<str>>(dataset: &Dataset, required_fields: &[S]) -> Result<Dataset> {
    dataset.require_columns(required_fields)?;

    let records: Vec<_> = dataset
        .records
        .iter()
        .filter(|record| {
            required_fields
                .iter()
                .all(|f| !record.get(f.as_ref()).is_missing())
        })
        .cloned()
        .collect();

    debug!(
        "drop_incomplete: kept {} of {} record(s)",
        records.len(),
        dataset.len()
    );
    Ok(dataset.derive(records))
}
