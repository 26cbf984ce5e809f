//! Canonical form of license text.
//!
//! Raw LICENSE files and source headers come wrapped in comment syntax,
//! reflowed, re-spelled and decorated in every way imaginable. The pipeline
//! below strips all of that so two texts with the same legal content compare
//! equal (or one is a prefix of the other).
//!
//! Order of the stages matters:
//! 1. line leads: comment indicators, decorative rules and bullets
//! 2. line-scoped edits (title lines, copyright lines, boilerplate),
//!    then line breaks become spaces
//! 3. whitespace collapse
//! 4. ordered substitution table
//! 5. whitespace collapse again
//! 6. lowercase
//! 7. trim
//!
//! Stages 1 and 2 run once, on the original lines. Stages 4 to 7 repeat
//! until the output stops changing. Canonical output never starts with a
//! line lead and never forms a whole droppable line, so feeding it back in
//! returns it unchanged.

use once_cell::sync::Lazy;
use regex::Regex;

/// Upper bound on substitution passes. Real inputs settle in one.
const MAX_PASSES: usize = 8;

/// Line-leading comment tokens, longest first where two share a prefix.
const COMMENT_TOKENS: &[&str] = &[
    r"<!--+",
    r"-->",
    r"--+",
    r#"""""#,
    r"\(\*",
    r"/\*+",
    r"\*+/",
    r"\*+\}",
    r"\*+",
    r"//+",
    r"\{-+",
    r"-+\}",
    r"\{#+",
    r"#+\}",
    r"\{\*+",
    r"#+",
    r";+",
    r"~+",
    r"::",
    r"\.\.",
    r"(?i:@?REM\b)",
    r"%+",
    r"'+",
];

/// Runs of `-`, `=` or `*` used as banners and separators.
const DECORATIVE_RULE: &str = r"[-=*]{3,}";

/// a. 1. iv) (b) (12); "(c)" is left for the copyright rule.
const BULLET: &str =
    r"(?i:(?:[a-z]|\d{1,3}|[ivx]{1,5})[.)][ \t]|\((?:[abd-z]|\d{1,3}|[ivx]{2,5})\)[ \t])";

/// American spellings and their British forms.
const SPELLINGS: &[(&str, &str)] = &[
    ("acknowledgment", "acknowledgement"),
    ("analog", "analogue"),
    ("analyze", "analyse"),
    ("artifact", "artefact"),
    ("authorization", "authorisation"),
    ("authorized", "authorised"),
    ("behavior", "behaviour"),
    ("center", "centre"),
    ("color", "colour"),
    ("favor", "favour"),
    ("favorable", "favourable"),
    ("fulfill", "fulfil"),
    ("honor", "honour"),
    ("initialize", "initialise"),
    ("judgment", "judgement"),
    ("labor", "labour"),
    ("organization", "organisation"),
    ("organize", "organise"),
    ("recognize", "recognise"),
    ("utilize", "utilise"),
    ("licence", "license"),
];

/// Every quote form, and runs of them, collapse to one `"`.
const QUOTES: &str = r#"["'‘’‛`´“”„‟″]+"#;

struct Pipeline {
    comments: Regex,
    line_leads: Regex,
    rules: Regex,
    title_lines: Regex,
    dropped_lines: Vec<Regex>,
    spaces: Regex,
    substitutions: Vec<(Regex, &'static str)>,
    pattern_substitutions: Vec<(Regex, &'static str)>,
}

static PIPELINE: Lazy<Pipeline> = Lazy::new(Pipeline::new);

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static canonicalization pattern")
}

impl Pipeline {
    fn new() -> Self {
        let tokens = COMMENT_TOKENS.join("|");
        let comments = re(&format!(r"(?m)^[ \t]*(?:(?:{tokens})[ \t]*)+"));
        let line_leads = re(&format!(
            r"(?m)^[ \t]*(?:(?:{tokens}|{DECORATIVE_RULE}|{BULLET})[ \t]*)+"
        ));

        // "MIT License", "The MIT License (MIT)", "GNU GENERAL PUBLIC LICENSE",
        // "Apache License, Version 2.0". Words must be capitalised so running
        // prose such as "in compliance with the License" survives.
        let title_lines = re(
            r"(?m)^[ \t]*(?:[Tt]he[ \t]+)?(?:[A-Z0-9][\w.+\-]*[ \t]+){0,4}(?:License|LICENSE|Licence|LICENCE)(?:,?[ \t]+[Vv](?:ersion|ERSION)[ \t]+[\d.]+)?(?:[ \t]*\([\w.+\-]+\))?[ \t]*$",
        );

        let dropped_lines = vec![
            re(r"(?im)^[ \t]*(?:portions[ \t]+)?(?:copyright\b|\(c\)|©).*$"),
            re(r"(?im)^[ \t]*all[ \t]+rights[ \t]+reserved\.?[ \t]*$"),
            re(r"(?im)^[ \t]*SPDX-License-Identifier:.*$"),
            re(r"(?im)^[ \t]*<?https?://\S+>?[ \t]*$"),
            re(r"(?im)^[ \t]*code generated\b.*\bdo not edit\.?[ \t]*$"),
        ];

        let spellings: Vec<(Regex, &'static str)> = SPELLINGS
            .iter()
            .map(|(us, uk)| (re(&format!(r"(?i)\b{us}\b")), *uk))
            .collect();

        let mut substitutions = spellings.clone();
        substitutions.extend([
            (re(QUOTES), "\""),
            // Copyright symbols.
            (re(r"©"), "Copyright"),
            (re(r"(?i)\(c\)"), "Copyright"),
            (re(r"(?i)\bcopyright(?:\s+copyright\b)+"), "Copyright"),
            (re(r"(?i)https://"), "http://"),
            (re(DECORATIVE_RULE), " "),
            // Recurring clauses whose subject differs between copies.
            (
                re(r"(?i)\bin no event shall (?:the )?.+? be liable\b"),
                "in no event shall the copyright holder be liable",
            ),
            (
                re(r"(?i)\bneither the names? of .+? nor the names? of (?:its|their|the) contributors\b"),
                "neither the name of the copyright holder nor the names of its contributors",
            ),
            (
                re(r#"(?i)\bprovided by [^."]+? "as is""#),
                "provided by the copyright holder \"as is\"",
            ),
        ]);

        // Only rewrites that read the same as regex syntax and as text.
        let mut pattern_substitutions = spellings;
        pattern_substitutions.extend([
            (re(QUOTES), "\""),
            (re(r"©"), "Copyright"),
            (re(r"(?i)\\\(c\\\)"), "Copyright"),
            (re(r"(?i)https://"), "http://"),
        ]);

        Self {
            comments,
            line_leads,
            rules: re(DECORATIVE_RULE),
            title_lines,
            dropped_lines,
            spaces: re(r"\s+"),
            substitutions,
            pattern_substitutions,
        }
    }

    fn edit_lines(&self, text: &str) -> String {
        let text = self.line_leads.replace_all(text, "");
        let text = self.rules.replace_all(&text, " ");
        let mut text = self.title_lines.replace_all(&text, "").into_owned();
        for regex in &self.dropped_lines {
            text = regex.replace_all(&text, "").into_owned();
        }
        text.replace('\n', " ")
    }

    fn collapse(&self, text: &str) -> String {
        self.spaces.replace_all(text, " ").into_owned()
    }

    fn substitute(&self, text: &str) -> String {
        apply(&self.substitutions, text)
    }

    fn settle(&self, text: &str) -> String {
        let text = self.substitute(text);
        let text = self.collapse(&text);
        text.to_lowercase().trim().to_owned()
    }
}

fn apply(table: &[(Regex, &'static str)], text: &str) -> String {
    let mut text = text.to_owned();
    for (regex, replacement) in table {
        text = regex.replace_all(&text, *replacement).into_owned();
    }
    text
}

/// Reduce `text` to its canonical comparison form.
///
/// Total and pure: the same input always yields the same output and empty
/// input yields an empty string.
pub fn canonicalize(text: &str) -> String {
    let pipeline = &*PIPELINE;
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let flat = pipeline.collapse(&pipeline.edit_lines(&text));

    let mut current = pipeline.settle(&flat);
    for _ in 1..MAX_PASSES {
        let next = pipeline.settle(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Normalize a header regex template.
///
/// Comment markers come off each line, whitespace is flattened and the
/// literal-safe substitutions run (spelling, quotes, copyright symbols,
/// `https`), so literal text in the pattern reads the way canonical content
/// does. Case is handled by compiling the result with `(?i)`.
pub fn canonicalize_pattern(pattern: &str) -> String {
    let pipeline = &*PIPELINE;
    let text = pattern.replace("\r\n", "\n");
    let text = pipeline.comments.replace_all(&text, "");
    let text = apply(&pipeline.pattern_substitutions, &text);
    pipeline.collapse(&text).trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIT_HEADER_LINES: &str = "\
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the \"Software\"), to deal
// in the Software without restriction.";

    #[test]
    fn test_empty_input() {
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize("   \n\t  "), "");
    }

    #[test]
    fn test_strips_comment_indicators() {
        let expected = "permission is hereby granted, free of charge, to any person obtaining a copy \
of this software and associated documentation files (the \"software\"), to deal \
in the software without restriction.";
        assert_eq!(canonicalize(MIT_HEADER_LINES), expected);
        assert_eq!(canonicalize(&MIT_HEADER_LINES.replace("//", "#")), expected);
        assert_eq!(canonicalize(&MIT_HEADER_LINES.replace("//", " *")), expected);
        assert_eq!(canonicalize(&MIT_HEADER_LINES.replace("//", "--")), expected);
        assert_eq!(canonicalize(&MIT_HEADER_LINES.replace("//", "REM")), expected);
    }

    #[test]
    fn test_block_comment_markers() {
        let text = "/*\n * Licensed to you.\n * Really.\n */";
        assert_eq!(canonicalize(text), "licensed to you. really.");

        let html = "<!--\n  Licensed to you.\n-->";
        assert_eq!(canonicalize(html), "licensed to you.");
    }

    #[test]
    fn test_comment_marker_only_at_line_start() {
        assert_eq!(canonicalize("see a // b"), "see a // b");
        assert_eq!(canonicalize("50% off"), "50% off");
    }

    #[test]
    fn test_drops_title_and_copyright_lines() {
        let text = "MIT License\n\nCopyright (c) 2021 Someone\nAll rights reserved.\nPermission is granted.";
        assert_eq!(canonicalize(text), "permission is granted.");

        let text = "Portions Copyright 2019 Other\n© 2020 Third\nBody";
        assert_eq!(canonicalize(text), "body");
    }

    #[test]
    fn test_keeps_prose_ending_in_license() {
        let text = "you may not use this file except in compliance with the License";
        assert_eq!(
            canonicalize(text),
            "you may not use this file except in compliance with the license"
        );
    }

    #[test]
    fn test_strips_bullets() {
        let text = "1. Keep notices.\n(a) Keep more.\nb. And more.";
        assert_eq!(canonicalize(text), "keep notices. keep more. and more.");
    }

    #[test]
    fn test_drops_spdx_and_url_lines() {
        let text = "SPDX-License-Identifier: MIT\n   https://example.org/license\nBody text";
        assert_eq!(canonicalize(text), "body text");
    }

    #[test]
    fn test_spelling_and_quotes() {
        assert_eq!(
            canonicalize("We favor the Organization’s “Software”"),
            "we favour the organisation\"s \"software\""
        );
    }

    #[test]
    fn test_every_quote_style_is_one_glyph() {
        let expected = canonicalize("the \"Software\"");
        for quoted in [
            "the 'Software'",
            "the ‘Software’",
            "the “Software”",
            "the `Software´",
            "the ``Software''",
        ] {
            assert_eq!(canonicalize(quoted), expected, "for {quoted:?}");
        }
    }

    #[test]
    fn test_drops_title_with_spdx_tag() {
        let text = "The MIT License (MIT)\n\nPermission is granted.";
        assert_eq!(canonicalize(text), "permission is granted.");
        assert_eq!(canonicalize("Apache License, Version 2.0 (Apache-2.0)\nBody"), "body");
    }

    #[test]
    fn test_decorated_banner_keeps_body() {
        let text = "==== Copyright 2020 ACME ====\nPermission is granted.\nKeep it.";
        assert_eq!(canonicalize(text), "permission is granted. keep it.");

        let text = "===== 1. Keep notices.\n***** All rights reserved *****\nBody";
        assert_eq!(canonicalize(text), "keep notices. body");
    }

    #[test]
    fn test_copyright_symbol_inline() {
        assert_eq!(
            canonicalize("the notice © must stay and (C) too"),
            "the notice copyright must stay and copyright too"
        );
    }

    #[test]
    fn test_https_and_rules() {
        assert_eq!(
            canonicalize("see https://x.org\n=====\nnext ---- part"),
            "see http://x.org next part"
        );
    }

    #[test]
    fn test_liability_subjects_unified() {
        let a = canonicalize("IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM");
        let b = canonicalize("IN NO EVENT SHALL ACME CORP BE LIABLE FOR ANY CLAIM");
        assert_eq!(a, b);
        assert_eq!(a, "in no event shall the copyright holder be liable for any claim");
    }

    #[test]
    fn test_neither_name_unified() {
        let a = canonicalize(
            "Neither the name of the copyright holder nor the names of its contributors may be used",
        );
        let b = canonicalize("Neither the name of ACME nor the names of their contributors may be used");
        assert_eq!(a, b);
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            MIT_HEADER_LINES,
            "1. # Copyright hidden behind a bullet\nBody",
            "MIT\nLicense",
            "(C) copyright © 2020\nIN NO EVENT SHALL X BE LIABLE",
            "  ' quoted ''thing'' `here`  ",
            "a. b. c. nested bullets",
            "==== Copyright 2020 ACME ====\nBody",
            "===== 1. Keep notices.\nBody",
            "==== SPDX-License-Identifier: MIT ====\nBody",
            "---- All rights reserved ----\nBody",
        ];
        for sample in samples {
            let once = canonicalize(sample);
            assert_eq!(canonicalize(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_line_rules_do_not_rerun_on_flattened_text() {
        for (sample, kept) in [
            ("==== Copyright 2020 ACME ====\nBody", "body"),
            ("1. # Copyright hidden behind a bullet\nBody", "body"),
            ("===== 1. Keep notices.\nBody", "keep notices. body"),
            ("==== SPDX-License-Identifier: MIT ====\nBody", "body"),
        ] {
            assert_eq!(canonicalize(sample), kept, "for {sample:?}");
        }
    }

    #[test]
    fn test_pattern_gets_literal_substitutions() {
        assert_eq!(
            canonicalize_pattern("// Licensed under https://example\\.org/licence\n// \\(c\\) “Owner”"),
            "Licensed under http://example\\.org/license Copyright \"Owner\""
        );
    }

    #[test]
    fn test_pattern_normalization_keeps_case_and_regex() {
        let pattern = "# Licensed under (MIT|Apache-2\\.0)\n#   see \\S+";
        assert_eq!(
            canonicalize_pattern(pattern),
            "Licensed under (MIT|Apache-2\\.0) see \\S+"
        );
    }
}
