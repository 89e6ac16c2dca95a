//! Build result model.

/// Build status of the request's package in one repository/arch.
///
/// Flattened from the `_result` endpoint: the repository-level result
/// attributes and the package-level status are merged into one record.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildResult {
    /// Package (or multibuild flavor, e.g. `mypkg:flavor`).
    pub package: String,

    pub repository: String,
    pub arch: String,

    /// Repository-level result code (`published`, `building`, ...).
    pub code: String,

    /// Repository scheduler state.
    pub state: String,

    /// Package-level status code (`succeeded`, `failed`, `unresolvable`, ...).
    pub status_code: String,

    /// Scheduler detail text, e.g. the unresolvable reason.
    pub details: Option<String>,
}

impl BuildResult {
    /// Whether `package` is `base` itself or one of its multibuild flavors.
    pub fn matches_package(package: &str, base: &str) -> bool {
        package == base || package.strip_prefix(base).is_some_and(|r| r.starts_with(':'))
    }

    /// Statuses that carry no build information and are hidden from the page.
    pub fn is_hidden(&self) -> bool {
        matches!(self.status_code.as_str(), "excluded" | "disabled")
    }
}
