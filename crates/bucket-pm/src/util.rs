//! Utility functions for the package manager.

/// Check if a package name represents a platform package.
///
/// Platform packages are virtual packages describing the runtime the
/// packages are installed into rather than installable code:
/// - `php` and its capability variants (`php-64bit`, `php-ipv6`, `php-zts`, `php-debug`)
/// - `hhvm`
/// - `ext-*` extensions and `lib-*` system libraries
///
/// # Examples
///
/// ```
/// use bucket_pm::util::is_platform_package;
///
/// assert!(is_platform_package("php"));
/// assert!(is_platform_package("ext-json"));
/// assert!(is_platform_package("lib-libxml"));
///
/// assert!(!is_platform_package("phpunit/phpunit"));
/// assert!(!is_platform_package("ext-"));
/// ```
pub fn is_platform_package(name: &str) -> bool {
    let suffix_ok = |prefix: &str| {
        name.strip_prefix(prefix)
            .map_or(false, |rest| !rest.is_empty() && !rest.contains(['/', ' ']))
    };

    matches!(
        name,
        "php" | "php-64bit" | "php-ipv6" | "php-zts" | "php-debug" | "hhvm"
    ) || suffix_ok("ext-")
        || suffix_ok("lib-")
}
