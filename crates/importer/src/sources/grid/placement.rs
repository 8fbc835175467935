use lazy_static::lazy_static;
use regex::Regex;

use crate::{ImporterError, Result};

lazy_static! {
    static ref PLACEMENT_NOISE: Regex = Regex::new(r"[. ]").unwrap();
    static ref TIE_RANGE: Regex = Regex::new(r"-\d+").unwrap();
}

/// Parse a placement cell. `"3."` is 3, a shared place written as `"3.-5."`
/// is 3, and a blank cell is no placement.
pub fn clean_placement(cell: &str) -> Result<Option<i32>> {
    let stripped = PLACEMENT_NOISE.replace_all(cell, "");
    let stripped = TIE_RANGE.replace_all(&stripped, "");
    if stripped.is_empty() {
        return Ok(None);
    }

    stripped
        .parse::<i32>()
        .map(Some)
        .map_err(|_| ImporterError::Grid(format!("Invalid placement '{}'", cell)))
}

/// Parse a total score, accepting a decimal comma and a trailing `%`.
pub fn parse_total(cell: &str) -> Result<f64> {
    let normalized = cell.trim().replace(',', ".").replace('%', "");
    normalized
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|total| total.is_finite())
        .ok_or_else(|| ImporterError::Grid(format!("Invalid total '{}'", cell)))
}

/// Placements for rows already ordered best-first.
///
/// Every row gets its 1-based position, except that a row whose total does
/// not drop below the previous one shares the previous row's placement.
pub fn generate_placements(totals: &[f64]) -> Vec<i32> {
    let mut placements = Vec::with_capacity(totals.len());
    let mut last_total = f64::INFINITY;
    let mut shared_place = 0;

    for (idx, total) in totals.iter().enumerate() {
        let position = idx as i32 + 1;
        if *total < last_total {
            last_total = *total;
            shared_place = position;
        }
        placements.push(shared_place);
    }

    placements
}
