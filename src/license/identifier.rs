//! License identification by canonical prefix match.

use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;

use crate::license::canonical::canonicalize;
use crate::license::corpus::{Corpus, TemplateKind};

/// Sentences that state a work is offered under several licenses. They are
/// meta-statements, so the named license is taken as-is instead of being
/// matched against template bodies. Only the opening paragraph is searched.
static MULTI_LICENSE_STATEMENTS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?im)^[ \t]*this (?:project|software|library) is covered by two different licenses:[ \t]*(?P<license>.+?)\.?[ \t\r]*$",
        r"(?im)^[ \t]*this (?:project|software|library) is (?:dual|multi)[- ]licensed under (?:the )?(?P<license>[\w.+\-]+(?:[ \t]+(?:and|or)[ \t]+[\w.+\-]+)+)[ \t]*(?:licenses?)?\.?[ \t\r]*$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static multi-license pattern"))
    .collect()
});

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n[ \t]*\r?\n").expect("static paragraph pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchedBy {
    Statement,
    Template(TemplateKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identification {
    pub spdx_id: String,
    pub matched_by: MatchedBy,
}

/// Identify the license `text` reproduces, or `None` when nothing matches.
///
/// Matching is by prefix of the canonical form: a LICENSE file that appends
/// third-party notices after its own license still identifies as its own
/// license, never as one embedded further down.
pub fn identify(corpus: &Corpus, text: &str) -> Option<Identification> {
    if let Some(license) = multi_license_statement(text) {
        tracing::debug!(license = %license, "identified from multi-license statement");
        return Some(Identification {
            spdx_id: license,
            matched_by: MatchedBy::Statement,
        });
    }

    let canonical = canonicalize(text);
    if canonical.is_empty() {
        return None;
    }

    // Templates are independent; stop at the first hit. The corpus rejects
    // overlapping templates at load time, so the hit does not depend on
    // which worker finds it.
    let hit = corpus
        .templates()
        .par_iter()
        .find_any(|template| canonical.starts_with(&template.canonical))?;

    tracing::debug!(license = %hit.spdx_id, template = %hit.asset, "identified license text");
    Some(Identification {
        spdx_id: hit.spdx_id.clone(),
        matched_by: MatchedBy::Template(hit.kind),
    })
}

fn opening_paragraph(text: &str) -> &str {
    let text = text.trim_start();
    match PARAGRAPH_BREAK.find(text) {
        Some(found) => &text[..found.start()],
        None => text,
    }
}

fn multi_license_statement(text: &str) -> Option<String> {
    let opening = opening_paragraph(text);
    MULTI_LICENSE_STATEMENTS.iter().find_map(|pattern| {
        let captures = pattern.captures(opening)?;
        let license = captures
            .name("license")?
            .as_str()
            .trim()
            .trim_end_matches([',', ';', ':', '.'])
            .trim();
        (!license.is_empty()).then(|| license.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{EmbeddedAssets, MemoryAssets};

    const MIT_BODY: &str = "\
MIT License

Copyright (c) 2023 Example Corp

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the \"Software\"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
";

    const GPL_HEADER: &str = "\
This program is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.
";

    fn synthetic() -> Corpus {
        let store = MemoryAssets::new()
            .with("lcs-templates/MIT.txt", MIT_BODY)
            .with("header-templates/GPL-3.0-or-later.txt", GPL_HEADER);
        Corpus::load(&store).unwrap()
    }

    #[test]
    fn test_identifies_full_body() {
        let corpus = synthetic();
        let found = identify(&corpus, MIT_BODY).unwrap();
        assert_eq!(found.spdx_id, "MIT");
        assert_eq!(found.matched_by, MatchedBy::Template(TemplateKind::Full));
    }

    #[test]
    fn test_identifies_commented_header() {
        let corpus = synthetic();
        let header: String = GPL_HEADER.lines().map(|l| format!("# {l}\n")).collect();
        let found = identify(&corpus, &header).unwrap();
        assert_eq!(found.spdx_id, "GPL-3.0-or-later");
        assert_eq!(found.matched_by, MatchedBy::Template(TemplateKind::Header));
    }

    #[test]
    fn test_prefix_not_substring() {
        let corpus = synthetic();
        let combined = format!("{MIT_BODY}\n{GPL_HEADER}");
        assert_eq!(identify(&corpus, &combined).unwrap().spdx_id, "MIT");

        // The GPL header buried after unrelated text is not a match.
        let buried = format!("Some preamble.\n{GPL_HEADER}");
        assert_eq!(identify(&corpus, &buried), None);
    }

    #[test]
    fn test_unidentified() {
        let corpus = synthetic();
        assert_eq!(identify(&corpus, "All code here is proprietary."), None);
        assert_eq!(identify(&corpus, ""), None);
    }

    #[test]
    fn test_multi_license_statement() {
        let corpus = synthetic();
        let text = "This project is covered by two different licenses: Apache-2.0 and MIT.\n\nMore text.";
        let found = identify(&corpus, text).unwrap();
        assert_eq!(found.spdx_id, "Apache-2.0 and MIT");
        assert_eq!(found.matched_by, MatchedBy::Statement);
    }

    #[test]
    fn test_dual_license_statement_names_ids() {
        let corpus = synthetic();
        let text = "This library is dual-licensed under the MIT or Apache-2.0 licenses.\n";
        assert_eq!(identify(&corpus, text).unwrap().spdx_id, "MIT or Apache-2.0");
    }

    #[test]
    fn test_statement_past_opening_paragraph_is_ignored() {
        let corpus = synthetic();
        let text = format!(
            "{MIT_BODY}\nThe bundled jquery is dual licensed under the MIT or GPL Version 2 licenses.\n\n\
This project is covered by two different licenses: Apache-2.0 and MIT.\n"
        );
        let found = identify(&corpus, &text).unwrap();
        assert_eq!(found.spdx_id, "MIT");
        assert_eq!(found.matched_by, MatchedBy::Template(TemplateKind::Full));
    }

    #[test]
    fn test_title_with_spdx_tag() {
        let corpus = synthetic();
        let text = MIT_BODY.replacen("MIT License", "The MIT License (MIT)", 1);
        assert_eq!(identify(&corpus, &text).unwrap().spdx_id, "MIT");
    }

    #[test]
    fn test_banner_before_body() {
        let corpus = synthetic();
        let text = format!("==== Copyright 2020 ACME ====\n{MIT_BODY}");
        assert_eq!(identify(&corpus, &text).unwrap().spdx_id, "MIT");
    }

    #[test]
    fn test_single_quoted_software() {
        let corpus = synthetic();
        let text = MIT_BODY.replace("\"Software\"", "'Software'").replace("\"AS IS\"", "‘AS IS’");
        assert_eq!(identify(&corpus, &text).unwrap().spdx_id, "MIT");
    }

    #[test]
    fn test_deterministic_across_runs() {
        let corpus = Corpus::load(&EmbeddedAssets).unwrap();
        let first = identify(&corpus, MIT_BODY);
        for _ in 0..20 {
            assert_eq!(identify(&corpus, MIT_BODY), first);
        }
        assert_eq!(first.unwrap().spdx_id, "MIT");
    }
}
