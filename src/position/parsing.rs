use super::{FixSourceError, PositionFix};

/// Parses a JSON-lines fix log. Blank lines and `#` comments are skipped.
pub fn parse_fix_lines(content: &str) -> Result<Vec<PositionFix>, FixSourceError> {
    content
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
        .map(|(line, l)| {
            serde_json::from_str(l).map_err(|source| FixSourceError::Parse { line, source })
        })
        .collect()
}
