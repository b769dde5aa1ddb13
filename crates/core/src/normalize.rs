//! Canonicalization of free-text answers before comparison.

/// Normalize a free-text answer for comparison.
///
/// Removes thousands separators, collapses internal whitespace runs, trims
/// the ends, strips the leading run of currency symbols, and folds case
/// unless `case_sensitive` is set. The output is a fixed point:
/// normalizing an already-normalized string returns it unchanged.
#[must_use]
pub fn normalize(text: &str, case_sensitive: bool) -> String {
    // Separators come out before the whitespace collapse so "1, 000"
    // cannot leave a double space behind.
    let no_separators = text.replace(',', "");
    let collapsed = no_separators.split_whitespace().collect::<Vec<_>>().join(" ");
    let stripped = collapsed.trim_start_matches(['$', ' ']);
    if case_sensitive {
        stripped.to_string()
    } else {
        stripped.to_lowercase()
    }
}
