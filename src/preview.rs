use serde::Serialize;

use crate::error::ReconcileError;

const PREVIEW_LINES: usize = 5;
const CANDIDATE_DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// The first lines of an upload and the delimiter they appear to use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadPreview {
    pub lines: Vec<String>,
    pub detected_delimiter: Option<char>,
}

pub fn preview_upload(bytes: &[u8]) -> Result<UploadPreview, ReconcileError> {
    let content = std::str::from_utf8(bytes)
        .map_err(|e| ReconcileError::ParseFailure(format!("upload is not UTF-8: {}", e)))?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let lines: Vec<String> = content
        .lines()
        .take(PREVIEW_LINES)
        .map(str::to_string)
        .collect();
    let detected_delimiter = sniff_delimiter(&lines);

    Ok(UploadPreview { lines, detected_delimiter })
}

// Prefers a delimiter that appears the same number of times on every
// non-empty line, then the one with the most occurrences on the first line.
fn sniff_delimiter(lines: &[String]) -> Option<char> {
    let lines: Vec<&String> = lines.iter().filter(|l| !l.trim().is_empty()).collect();
    let first = lines.first()?;

    let mut best: Option<(bool, usize, char)> = None;
    for delimiter in CANDIDATE_DELIMITERS {
        let count = first.matches(delimiter).count();
        if count == 0 {
            continue;
        }
        let consistent = lines.iter().all(|l| l.matches(delimiter).count() == count);
        let candidate = (consistent, count, delimiter);
        let better = match best {
            None => true,
            Some((best_consistent, best_count, _)) => (consistent, count) > (best_consistent, best_count),
        };
        if better {
            best = Some(candidate);
        }
    }
    best.map(|(_, _, delimiter)| delimiter)
}
