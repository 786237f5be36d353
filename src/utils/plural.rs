//! Count formatting for log messages.

/// Format count with noun, handling pluralization
///
/// `plural_count(1, "asset")` -> `"1 asset"`, `plural_count(3, "asset")` -> `"3 assets"`
pub fn plural_count(count: usize, noun: &str) -> String {
    match count {
        1 => format!("1 {noun}"),
        n => format!("{n} {noun}s"),
    }
}
