//! Derived scalar fields computed from operator input prior to rendering.
//!
//! Failure policy: a scalar that cannot be computed is substituted with the
//! [`CALC_ERROR`] sentinel, never an exception and never a silent zero. The
//! sentinel is deliberately visible in the rendered document — a report that
//! prints "Erro no cálculo" gets corrected; a report that prints a fabricated
//! `0` gets filed.

use crate::config::fields;
use crate::context::RenderingContext;
use std::collections::BTreeMap;
use tracing::warn;

/// Sentinel rendered in place of a scalar that failed to compute.
pub const CALC_ERROR: &str = "Erro no cálculo";

/// Transfer rate: `(transfers / total_visits) * 100`, formatted `"{:.2}%"`.
///
/// Zero total visits and unparseable inputs both yield [`CALC_ERROR`].
pub fn transfer_rate(total_visits: &str, transfer_count: &str) -> String {
    let total: f64 = match total_visits.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(total_visits, "transfer rate: total visits not numeric");
            return CALC_ERROR.to_string();
        }
    };
    let transfers: f64 = match transfer_count.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(transfer_count, "transfer rate: transfer count not numeric");
            return CALC_ERROR.to_string();
        }
    };
    if total <= 0.0 {
        warn!("transfer rate: total visits is zero");
        return CALC_ERROR.to_string();
    }
    format!("{:.2}%", (transfers / total) * 100.0)
}

/// Doctor total: clinical + pediatric physician counts.
///
/// Either field failing integer parsing yields [`CALC_ERROR`].
pub fn doctor_total(clinical: &str, pediatric: &str) -> String {
    match (
        clinical.trim().parse::<i64>(),
        pediatric.trim().parse::<i64>(),
    ) {
        (Ok(c), Ok(p)) => (c + p).to_string(),
        _ => {
            warn!(clinical, pediatric, "doctor total: non-integer input");
            CALC_ERROR.to_string()
        }
    }
}

/// Join newline-separated transfer destinations with `" / "`.
///
/// Blank lines and surrounding whitespace are dropped so trailing newlines in
/// a text area do not produce dangling separators.
pub fn join_destinations(input: &str) -> String {
    input
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Copy every manual field into the context and add the derived fields.
///
/// Derived fields are only added when their inputs are present at all;
/// present-but-invalid inputs produce the sentinel.
pub fn assemble(fields_in: &BTreeMap<String, String>, context: &mut RenderingContext) {
    for (key, value) in fields_in {
        context.insert_scalar(key.clone(), value.clone());
    }

    if let (Some(total), Some(transfers)) = (
        fields_in.get(fields::TOTAL_VISITS),
        fields_in.get(fields::TRANSFER_COUNT),
    ) {
        context.insert_scalar(fields::TRANSFER_RATE, transfer_rate(total, transfers));
    }

    if let (Some(clinical), Some(pediatric)) = (
        fields_in.get(fields::CLINICAL_PHYSICIAN),
        fields_in.get(fields::PEDIATRIC_PHYSICIAN),
    ) {
        context.insert_scalar(fields::DOCTOR_TOTAL, doctor_total(clinical, pediatric));
    }

    if let Some(destinations) = fields_in.get(fields::TRANSFER_DESTINATIONS) {
        context.insert_scalar(
            fields::TRANSFER_DESTINATIONS,
            join_destinations(destinations),
        );
    }
}
