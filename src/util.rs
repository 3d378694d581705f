use anyhow::{Context, Result};
use std::path::Path;
use time::format_description::well_known::Rfc3339;

pub fn ensure_dir(p: &Path) -> Result<()> {
    std::fs::create_dir_all(p).with_context(|| format!("create_dir_all {}", p.display()))
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

pub fn trim_trailing_slashes(s: &str) -> &str {
    s.trim_end_matches('/')
}

/// Job id with path separators replaced, for use inside a file name.
pub fn file_safe_id(id: &str) -> String {
    id.chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}

/// Renders a 0-100 score; integral values drop the fractional part.
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 && score.abs() < 1e15 {
        format!("{}", score as i64)
    } else {
        format!("{score}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_every_trailing_slash() {
        assert_eq!(trim_trailing_slashes("http://host:5000///"), "http://host:5000");
        assert_eq!(trim_trailing_slashes("http://host"), "http://host");
    }

    #[test]
    fn file_safe_id_replaces_separators() {
        assert_eq!(file_safe_id("../a/b\\c:d"), ".._a_b_c_d");
        assert_eq!(file_safe_id("job-1"), "job-1");
    }

    #[test]
    fn scores_render_without_spurious_decimals() {
        assert_eq!(format_score(82.0), "82");
        assert_eq!(format_score(0.0), "0");
        assert_eq!(format_score(72.5), "72.5");
    }
}
