//! Environment variable parsing helpers with defaults, so callers never unwrap.

use std::str::FromStr;

/// Parse an environment variable, falling back to `default` when missing or invalid
///
/// ```ignore
/// let port: u16 = parse_env_with_default("PORT", 8080);
/// ```
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    parse_env_optional(key).unwrap_or(default)
}

/// Parse an environment variable, `None` when missing or invalid
pub fn parse_env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_with_default() {
        let result: u32 = parse_env_with_default("DB_POOL_NONEXISTENT_VAR", 42);
        assert_eq!(result, 42);

        std::env::set_var("DB_POOL_TEST_PORT", " 8080 ");
        let result: u16 = parse_env_with_default("DB_POOL_TEST_PORT", 3000);
        assert_eq!(result, 8080);
        std::env::remove_var("DB_POOL_TEST_PORT");
    }

    #[test]
    fn test_parse_env_optional_rejects_garbage() {
        std::env::set_var("DB_POOL_TEST_OPT", "not-a-number");
        assert_eq!(parse_env_optional::<u32>("DB_POOL_TEST_OPT"), None);
        std::env::remove_var("DB_POOL_TEST_OPT");
    }
}
