//! Parsing of raw response header lines as delivered by libcurl.

/// Headers of one HTTP response, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    entries: Vec<(String, String)>,
}

impl ResponseHeaders {
    /// Builds from raw header lines (`Name: value`). The status line and
    /// blank lines are skipped.
    pub fn from_lines(lines: &[String]) -> Self {
        let entries = lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty() && !l.starts_with("HTTP/"))
            .filter_map(|l| l.split_once(':'))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect();
        Self { entries }
    }

    /// Case-insensitive lookup; the last occurrence wins.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status code from the first `HTTP/` line (e.g. `HTTP/1.1 302 Found`, `HTTP/2 200`).
pub fn parse_http_status(lines: &[String]) -> Option<u32> {
    lines
        .iter()
        .find(|l| l.starts_with("HTTP/"))
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|code| code.parse::<u32>().ok())
}
