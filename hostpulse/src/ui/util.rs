//! Small UI helpers: number formatting and truncation.

pub fn fmt_gb(v: f64) -> String {
    format!("{v:.2} GB")
}

pub fn fmt_pct(v: f64) -> String {
    format!("{v:>5.1}%")
}

pub fn fmt_mb(v: f64) -> String {
    if v >= 1024.0 {
        format!("{:.1} GB", v / 1024.0)
    } else {
        format!("{v:.1} MB")
    }
}

pub fn truncate_middle(s: &str, max: usize) -> String {
    let n = s.chars().count();
    if n <= max {
        return s.to_string();
    }
    if max <= 3 {
        return "...".into();
    }
    let keep = max - 3;
    let left = keep / 2;
    let right = keep - left;
    let head: String = s.chars().take(left).collect();
    let tail: String = s.chars().skip(n - right).collect();
    format!("{head}...{tail}")
}
