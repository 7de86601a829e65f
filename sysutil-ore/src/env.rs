//! Utilities for reading environment variables.

use std::ffi::OsStr;

/// Values that turn a flag off even though the variable is set.
static FALSEY: &[&str] = &["0", "", "no", "off", "false"];

/// Returns true if the environment variable is set, and is _not_ one of the following:
/// `'0', '', 'no', 'off', 'false'` (case insensitive).
pub fn is_truthy<K: AsRef<OsStr>>(var: K) -> bool {
    std::env::var_os(var)
        .map(|value| value_is_truthy(&value))
        .unwrap_or(false)
}

/// Returns the value of `var` if it's set to valid UTF-8 and isn't blank.
pub fn non_empty<K: AsRef<OsStr>>(var: K) -> Option<String> {
    let value = std::env::var(var).ok()?;
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn value_is_truthy(value: &OsStr) -> bool {
    let value = value.to_ascii_lowercase();
    !FALSEY.iter().any(|falsey| value == *falsey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoketest_truthy() {
        assert!(value_is_truthy(OsStr::new("1")));
        assert!(value_is_truthy(OsStr::new("yes")));
        assert!(!value_is_truthy(OsStr::new("FALSE")));
        assert!(!value_is_truthy(OsStr::new("")));
        assert!(!value_is_truthy(OsStr::new("Off")));
    }

    #[test]
    fn unset_is_not_truthy() {
        assert!(!is_truthy("SYSUTIL_ORE_TEST_VARIABLE_THAT_IS_NEVER_SET"));
        assert_eq!(non_empty("SYSUTIL_ORE_TEST_VARIABLE_THAT_IS_NEVER_SET"), None);
    }
}
