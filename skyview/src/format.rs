//! Sexagesimal formatting for star tooltips.

/// Right ascension in degrees as `"{h}h {m}m {s}s"`.
///
/// Hours are `floor(|deg| / 15)`; a negative input keeps a leading `-`.
pub fn format_hms(degrees: f64) -> String {
    let sign = if degrees < 0.0 { "-" } else { "" };
    let abs = degrees.abs();
    let hours = (abs / 15.0).floor();
    let minutes_exact = (abs % 15.0) * 4.0;
    let minutes = minutes_exact.floor();
    let seconds = (minutes_exact - minutes) * 60.0;
    format!("{sign}{hours}h {minutes}m {seconds:.1}s")
}

/// Declination in degrees as `{d}° {m}' {s}"`.
pub fn format_dms(degrees: f64) -> String {
    let sign = if degrees < 0.0 { "-" } else { "" };
    let abs = degrees.abs();
    let whole = abs.floor();
    let minutes_exact = (abs - whole) * 60.0;
    let minutes = minutes_exact.floor();
    let seconds = (minutes_exact - minutes) * 60.0;
    format!("{sign}{whole}° {minutes}' {seconds:.1}\"")
}
