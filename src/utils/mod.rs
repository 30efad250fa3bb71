use std::collections::HashSet;

use log::warn;

use crate::sanitize::sanitize_game_id;

/// Parses a comma-separated id list, keeping first-seen order. Non-numeric
/// entries are dropped with a warning.
pub fn parse_id_csv(value: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for part in value.split(',') {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        match sanitize_game_id(item) {
            Some(id) => {
                if seen.insert(id.to_string()) {
                    out.push(id.to_string());
                }
            }
            None => warn!("ignoring invalid game id '{item}'"),
        }
    }
    out
}

/// Trims and drops empty or invalid entries from a configured id list.
pub fn clean_id_list(values: &[String]) -> Vec<String> {
    parse_id_csv(&values.join(","))
}

pub fn parse_positive(value: usize, name: &str) -> Result<usize, String> {
    if value == 0 {
        return Err(format!("invalid {name}, expected positive integer"));
    }
    Ok(value)
}
