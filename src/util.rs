/// Marker appended to labels cut short for display.
pub const ELLIPSIS: &str = "..";

/// Clamped linear map from `domain` onto `range`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span.abs() < f64::EPSILON {
            return r0;
        }
        let t = ((value - d0) / span).clamp(0.0, 1.0);
        r0 + (r1 - r0) * t
    }
}

/// Clamped logarithmic map; values at or below zero land on the low end.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LogScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if value <= 0.0 || d0 <= 0.0 || d1 <= 0.0 {
            return r0;
        }
        let denominator = d1.ln() - d0.ln();
        if denominator.abs() < f64::EPSILON {
            return r0;
        }
        let t = ((value.ln() - d0.ln()) / denominator).clamp(0.0, 1.0);
        r0 + (r1 - r0) * t
    }
}

/// Label text as shown next to the matrix: everything before a `#` suffix,
/// cut to `max_chars` with a trailing [`ELLIPSIS`].
pub fn display_name(name: &str, max_chars: usize) -> (String, bool) {
    let base = name.split('#').next().unwrap_or(name);
    if base.chars().count() > max_chars {
        let kept = base.chars().take(max_chars).collect::<String>();
        (format!("{kept}{ELLIPSIS}"), true)
    } else {
        (base.to_owned(), false)
    }
}

/// Keeps `keep_chars` characters of `text` followed by [`ELLIPSIS`].
pub fn truncate_chars(text: &str, keep_chars: usize) -> String {
    let kept = text.chars().take(keep_chars).collect::<String>();
    format!("{kept}{ELLIPSIS}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_scale_clamps_both_ends() {
        let scale = LinearScale::new((5.0, 10.0), (65.0, 115.0));
        assert_eq!(scale.map(2.0), 65.0);
        assert_eq!(scale.map(8.0), 95.0);
        assert_eq!(scale.map(40.0), 115.0);
    }

    #[test]
    fn degenerate_linear_domain_maps_to_range_start() {
        let scale = LinearScale::new((10.0, 10.0), (1.0, 0.5));
        assert_eq!(scale.map(12.0), 1.0);
    }

    #[test]
    fn log_scale_treats_non_positive_values_as_floor() {
        let scale = LogScale::new((0.001, 10.0), (0.0, 1.0));
        assert_eq!(scale.map(0.0), 0.0);
        assert_eq!(scale.map(-3.0), 0.0);
        assert!((scale.map(10.0) - 1.0).abs() < 1e-12);
        assert!(scale.map(0.1) > 0.0 && scale.map(0.1) < 1.0);
    }

    #[test]
    fn display_name_drops_hash_suffix_and_truncates() {
        assert_eq!(display_name("STAT3#chr17", 10), ("STAT3".to_owned(), false));
        assert_eq!(
            display_name("VERY LONG GENE NAME", 10),
            ("VERY LONG ..".to_owned(), true)
        );
    }
}
