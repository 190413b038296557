//! Field paths reported in fill results
//!
//! Object keys are joined with `.`, array indices are written as `[i]`
//! (`items[0].id`, `[2].name`). A value that replaced the whole input is
//! reported as [`ROOT`].

/// Path of a value that was absent as a whole
pub const ROOT: &str = "(root)";

/// Path of an object key below `prefix`
pub fn key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Path of an array element below `prefix`
pub fn index(prefix: &str, index: usize) -> String {
    format!("{}[{}]", prefix, index)
}

/// Path to report for `path`, substituting [`ROOT`] for the empty path
pub fn display(path: &str) -> String {
    if path.is_empty() {
        ROOT.to_string()
    } else {
        path.to_string()
    }
}
