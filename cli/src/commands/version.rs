//! Command: print version information.

/// The version stamped at build time, falling back to the crate version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("DOTDEX_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the dotdex version to stdout.
pub fn run() {
    println!("dotdex {}", version());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
