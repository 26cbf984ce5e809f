/// Map common non-SPDX spellings from registry metadata to SPDX IDs.
///
/// Anything not in the table comes back trimmed but otherwise unchanged.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let id = match trimmed {
        "Apache 2.0" | "Apache 2" | "Apache License 2.0" | "Apache License, Version 2.0"
        | "Apache Software License" | "ASL 2.0" | "Apache-2" => "Apache-2.0",
        "MIT License" | "The MIT License" | "MIT license" | "Expat" => "MIT",
        "BSD" | "BSD License" => "BSD-3-Clause",
        "BSD 2-Clause" | "Simplified BSD" | "FreeBSD" => "BSD-2-Clause",
        "BSD 3-Clause" | "New BSD" | "Modified BSD" | "Revised BSD" => "BSD-3-Clause",
        "GNU GPL v2" | "GNU General Public License v2" | "GPL v2" | "GPLv2" => "GPL-2.0-only",
        "GPLv2+" | "GPL v2 or later" => "GPL-2.0-or-later",
        "GNU GPL v3" | "GNU General Public License v3" | "GPL v3" | "GPLv3" => "GPL-3.0-only",
        "GPLv3+" | "GPL v3 or later" => "GPL-3.0-or-later",
        "GNU LGPL v2.1" | "LGPL v2.1" | "LGPLv2.1" => "LGPL-2.1-only",
        "GNU LGPL v3" | "LGPL v3" | "LGPLv3" => "LGPL-3.0-only",
        "Mozilla Public License 2.0" | "MPL 2.0" | "MPLv2" => "MPL-2.0",
        "ISC License" => "ISC",
        "Boost Software License" | "Boost" => "BSL-1.0",
        "zlib License" | "zlib" => "Zlib",
        "The Unlicense" | "Unlicensed" => "Unlicense",
        "CC0" | "Public Domain" => "CC0-1.0",
        "AGPL v3" | "AGPLv3" | "GNU AGPL v3" => "AGPL-3.0-only",
        other => other,
    };
    id.to_string()
}

/// Deprecated bare GNU IDs and their explicit `-only` form. Matrix lookups
/// try both so either spelling in a matrix file matches either in metadata.
pub fn deprecated_alias(id: &str) -> Option<String> {
    const GNU: &[&str] = &["GPL-", "LGPL-", "AGPL-"];
    if !GNU.iter().any(|prefix| id.to_ascii_uppercase().starts_with(prefix)) {
        return None;
    }
    if let Some(base) = id.strip_suffix('+') {
        return Some(format!("{base}-or-later"));
    }
    if let Some(base) = id.strip_suffix("-only") {
        return Some(base.to_string());
    }
    if id.ends_with("-or-later") {
        return None;
    }
    Some(format!("{id}-only"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("MIT License"), "MIT");
        assert_eq!(normalize("Apache License 2.0"), "Apache-2.0");
        assert_eq!(normalize(" GPLv3 "), "GPL-3.0-only");
        assert_eq!(normalize("BSD-3-Clause"), "BSD-3-Clause");
    }

    #[test]
    fn test_deprecated_alias() {
        assert_eq!(deprecated_alias("GPL-3.0").as_deref(), Some("GPL-3.0-only"));
        assert_eq!(deprecated_alias("LGPL-2.1-only").as_deref(), Some("LGPL-2.1"));
        assert_eq!(deprecated_alias("GPL-2.0+").as_deref(), Some("GPL-2.0-or-later"));
        assert_eq!(deprecated_alias("GPL-3.0-or-later"), None);
        assert_eq!(deprecated_alias("MIT"), None);
    }
}
