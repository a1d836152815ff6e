//! ISO-8601 durations as reported by the API (`PT4M13S`, `P1DT2H`).

use once_cell::sync::Lazy;
use regex::Regex;

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^P(?:(?P<w>\d+(?:\.\d+)?)W)?(?:(?P<d>\d+(?:\.\d+)?)D)?(?:T(?:(?P<h>\d+(?:\.\d+)?)H)?(?:(?P<m>\d+(?:\.\d+)?)M)?(?:(?P<s>\d+(?:\.\d+)?)S)?)?$",
    )
    .expect("Invalid regex: ISO-8601 duration")
});

/// Duration in minutes, or `None` when the text is not a week/day/time
/// duration. Year and month components have no fixed length and are
/// rejected.
pub fn parse_iso_duration_minutes(text: &str) -> Option<f64> {
    let text = text.trim();
    let caps = DURATION.captures(text)?;

    let mut minutes = 0.0;
    let mut seen = false;
    for (group, factor) in [
        ("w", 7.0 * 24.0 * 60.0),
        ("d", 24.0 * 60.0),
        ("h", 60.0),
        ("m", 1.0),
        ("s", 1.0 / 60.0),
    ] {
        if let Some(m) = caps.name(group) {
            minutes += m.as_str().parse::<f64>().ok()? * factor;
            seen = true;
        }
    }

    if !seen || text.ends_with('T') {
        return None;
    }
    Some(minutes)
}
