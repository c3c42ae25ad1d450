// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Make-and-model canonicalization.
//
// Driver catalogs and printers report display names with no consistent
// structure ("HP LaserJet 4 Plus v2013.111 Postscript (recommended)",
// "DESKJET 990C", "CanonBJC8200 TurboPrint").  This module splits such
// strings into a canonical (make, model) pair and produces the normalized
// comparison keys the indices are built on.

use std::sync::LazyLock;

use regex::Regex;

/// Manufacturers recognisable from a characteristic model-name token when
/// the make itself is missing from the string.  First match wins; patterns
/// are anchored at the start and case-insensitive.
static MODEL_NAME_MAKES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        (
            "HP",
            r"deskjet|laserjet|designjet|officejet|photosmart|psc|edgeline",
        ),
        ("Epson", r"stylus|aculaser"),
        ("Apple", r"stylewriter|imagewriter|deskwriter|laserwriter"),
        ("Canon", r"pixus|pixma|selphy|imagerunner|bjc\b|bj\b|lbp\b"),
        ("Brother", r"hl\b|dcp\b|mfc\b"),
        ("Xerox", r"docuprint|docupage|phaser|workcentre|homecentre"),
        ("Lexmark", r"optra|(?:color\s*)?jetprinter"),
        ("KONICA MINOLTA", r"magicolor|pageworks|pagepro"),
        ("Ricoh", r"aficio"),
        ("Oce", r"varioprint"),
        ("Okidata", r"okipage|microline"),
    ]
    .into_iter()
    .map(|(make, pattern)| {
        let re = Regex::new(&format!("(?i)^(?:{pattern})")).expect("valid make table pattern");
        (make, re)
    })
    .collect()
});

/// Two-word manufacturer prefixes that must not be split at the first
/// space.  KONICA MINOLTA is handled separately because of its `_`/`-`
/// spelling variants.
const TWO_WORD_MAKES: [(&str, &str); 3] = [
    ("lexmark international", "Lexmark International"),
    ("kyocera mita", "Kyocera Mita"),
    ("fuji xerox", "Fuji Xerox"),
];

/// Canonical casing for manufacturer names that appear in the wild in
/// all-caps or other variants.
const CANONICAL_MAKES: [&str; 9] = [
    "Apple", "Brother", "Canon", "Epson", "Lexmark", "Oce", "Okidata", "Ricoh", "Xerox",
];

static RE_KONICA_MINOLTA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^konica[\s_-]*minolta[\s_-]*").expect("valid pattern")
});

static RE_HEWLETT_PACKARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^hewlett[\s_-]*packard[\s_-]*").expect("valid pattern")
});

/// Trailing version marker, e.g. " v2013.111" in HP NickNames.
static RE_VERSION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i) v(?:\d+(?:\.\d+)*|\.\d+)(?:\s|$)").expect("valid pattern")
});

/// Driver-flavour suffixes that are not part of the model name.  The model
/// string is truncated at the first occurrence of any of these; order
/// matters at a shared position (" pcl3" before " pcl", " postscript"
/// before " ps").
const IGNORE_SUFFIXES: [&str; 18] = [
    ", ",
    " hpijs",
    " foomatic/",
    " - ",
    " w/",
    " (",
    " postscript",
    " ps",
    " pdf",
    " pxl",
    " zjs",
    " zxs",
    " pcl3",
    " printer",
    "_bt",
    " pcl",
    " ufr ii",
    " br-script",
];

static RE_IGNORE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = IGNORE_SUFFIXES
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i){alternation}")).expect("valid suffix pattern")
});

static RE_SERIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*\b(?:series|all-in-one)\b").expect("valid pattern"));

/// HP model-name abbreviations, rewritten to the full name when they start
/// the model string.  Checked longest-first.
const HP_ABBREVIATIONS: [(&str, &str); 5] = [
    ("color lj", "Color LaserJet"),
    ("dj", "DeskJet"),
    ("lj", "LaserJet"),
    ("oj", "OfficeJet"),
    ("ps ", "PhotoSmart"),
];

/// Split a make-and-model display string into a canonical (make, model)
/// pair.
///
/// Strings starting with a known model name ("LaserJet ...") get the
/// matching manufacturer assigned even though the make is missing from the
/// text.  Otherwise the first whitespace-delimited token is the make,
/// with special handling for two-word manufacturers and TurboPrint's
/// camel-cased vendor stamp.
pub fn split_make_and_model(text: &str) -> (String, String) {
    let text = text.trim();
    let lower = text.to_lowercase();

    let (mut make, mut model);
    if let Some((m, _)) = MODEL_NAME_MAKES.iter().find(|(_, re)| re.is_match(text)) {
        make = (*m).to_string();
        model = text.to_string();
    } else if let Some(m) = RE_KONICA_MINOLTA.find(text) {
        make = "KONICA MINOLTA".to_string();
        model = text[m.end()..].to_string();
    } else if let Some((canonical, rest)) = match_two_word_make(text, &lower) {
        make = canonical;
        model = rest;
    } else if lower.contains("turboprint") {
        (make, model) = split_turboprint(text);
    } else if let Some(m) = RE_HEWLETT_PACKARD.find(text) {
        make = "HP".to_string();
        model = text[m.end()..].to_string();
    } else {
        match text.split_once(char::is_whitespace) {
            Some((m, rest)) => {
                make = m.to_string();
                model = rest.trim_start().to_string();
            }
            None => {
                make = text.to_string();
                model = String::new();
            }
        }
    }

    make = correct_make_case(&make);

    // Model cleanup, in this fixed order.
    if let Some(m) = RE_VERSION_MARKER.find(&model) {
        model.truncate(m.start());
    }
    if let Some(m) = RE_IGNORE_SUFFIX.find(&model) {
        model.truncate(m.start());
    }
    model = RE_SERIES.replace(&model, "").into_owned();
    if make == "HP" {
        if let Some(expanded) = expand_hp_abbreviation(&model) {
            model = expanded;
        }
    }

    (make, model.trim().to_string())
}

/// Collapse a display string into a pure comparison key: lower-cased,
/// alphanumeric only, with a single space at every letter/digit boundary
/// and every run of separators.  Never shown to the user.
pub fn normalize(text: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum Kind {
        Alpha,
        Digit,
        Other,
    }

    let mut out = String::with_capacity(text.len());
    let mut prev = Kind::Other;
    let mut pending_space = false;
    for ch in text.trim().to_lowercase().chars() {
        let kind = if ch.is_alphabetic() {
            Kind::Alpha
        } else if ch.is_ascii_digit() {
            Kind::Digit
        } else {
            Kind::Other
        };
        if kind == Kind::Other {
            if !out.is_empty() {
                pending_space = true;
            }
            continue;
        }
        if !out.is_empty() && (pending_space || prev != kind) {
            out.push(' ');
        }
        out.push(ch);
        pending_space = false;
        prev = kind;
    }
    out
}

fn match_two_word_make(text: &str, lower: &str) -> Option<(String, String)> {
    for (prefix, canonical) in TWO_WORD_MAKES {
        if let Some(rest) = lower.strip_prefix(prefix) {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                let model = text[prefix.len()..].trim().to_string();
                return Some((canonical.to_string(), model));
            }
        }
    }
    None
}

/// TurboPrint stamps vendor names without separators
/// ("CanonBJC8200 TurboPrint").  Drop the stamp, insert token breaks at
/// camel-case and letter/digit boundaries, and take the first token as
/// the make.
fn split_turboprint(text: &str) -> (String, String) {
    let tokens: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("turboprint"))
        .collect();
    let spaced = camel_breaks(&tokens.join(" ")).replace(" Jet", "Jet");
    match spaced.split_once(' ') {
        Some((m, rest)) => (m.to_string(), rest.trim().to_string()),
        None => (spaced, String::new()),
    }
}

fn camel_breaks(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    let mut prev: Option<char> = None;
    for ch in s.chars() {
        if let Some(p) = prev {
            if (p.is_lowercase() && ch.is_uppercase())
                || (p.is_alphabetic() && ch.is_ascii_digit())
            {
                out.push(' ');
            }
        }
        out.push(ch);
        prev = Some(ch);
    }
    out
}

fn correct_make_case(make: &str) -> String {
    if make.eq_ignore_ascii_case("hp") || RE_HEWLETT_PACKARD.is_match(make) {
        return "HP".to_string();
    }
    if RE_KONICA_MINOLTA.is_match(make) {
        return "KONICA MINOLTA".to_string();
    }
    for canonical in CANONICAL_MAKES {
        if make.eq_ignore_ascii_case(canonical) {
            return canonical.to_string();
        }
    }
    make.to_string()
}

fn expand_hp_abbreviation(model: &str) -> Option<String> {
    let lower = model.to_lowercase();
    for (abbr, full) in HP_ABBREVIATIONS {
        if !lower.starts_with(abbr) {
            continue;
        }
        // Bare abbreviations must end at a word boundary ("lj 4" yes,
        // "laserjet" no).
        if !abbr.ends_with(' ') {
            if let Some(next) = lower[abbr.len()..].chars().next() {
                if next.is_alphabetic() {
                    continue;
                }
            }
        }
        return Some(format!("{}{}", full, &model[abbr.len()..]));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_marker_and_flavour_suffix_are_stripped() {
        assert_eq!(
            split_make_and_model("LaserJet 4 Plus v2013.111 Postscript"),
            ("HP".to_string(), "LaserJet 4 Plus".to_string())
        );
    }

    #[test]
    fn known_model_token_implies_make() {
        assert_eq!(
            split_make_and_model("Stylus D78"),
            ("Epson".to_string(), "Stylus D78".to_string())
        );
        assert_eq!(
            split_make_and_model("PIXMA iP3000"),
            ("Canon".to_string(), "PIXMA iP3000".to_string())
        );
    }

    #[test]
    fn hewlett_packard_variants_become_hp() {
        assert_eq!(
            split_make_and_model("HEWLETT-PACKARD DESKJET 990C"),
            ("HP".to_string(), "DESKJET 990C".to_string())
        );
        assert_eq!(
            split_make_and_model("Hewlett Packard LaserJet 1200"),
            ("HP".to_string(), "LaserJet 1200".to_string())
        );
    }

    #[test]
    fn konica_minolta_spelling_variants() {
        let (make, model) = split_make_and_model("KONICA_MINOLTA magicolor 2430 DL");
        assert_eq!(make, "KONICA MINOLTA");
        assert_eq!(model, "magicolor 2430 DL");
        // Model-name table also routes bare model strings here.
        let (make, _) = split_make_and_model("magicolor 7450");
        assert_eq!(make, "KONICA MINOLTA");
    }

    #[test]
    fn two_word_manufacturers_survive_the_split() {
        assert_eq!(
            split_make_and_model("Lexmark International Optra E310"),
            ("Lexmark International".to_string(), "Optra E310".to_string())
        );
        assert_eq!(
            split_make_and_model("Kyocera Mita FS-600"),
            ("Kyocera Mita".to_string(), "FS-600".to_string())
        );
    }

    #[test]
    fn turboprint_camel_case_is_tokenized() {
        assert_eq!(
            split_make_and_model("CanonBJC8200 TurboPrint"),
            ("Canon".to_string(), "BJC 8200".to_string())
        );
    }

    #[test]
    fn series_token_is_removed_once() {
        assert_eq!(
            split_make_and_model("HP PSC 2200 Series"),
            ("HP".to_string(), "PSC 2200".to_string())
        );
        assert_eq!(
            split_make_and_model("HP OfficeJet 5600 All-in-One"),
            ("HP".to_string(), "OfficeJet 5600".to_string())
        );
    }

    #[test]
    fn hp_abbreviations_are_expanded() {
        assert_eq!(
            split_make_and_model("HP DJ 990C"),
            ("HP".to_string(), "DeskJet 990C".to_string())
        );
        // "lj" must not fire inside "LaserJet".
        assert_eq!(
            split_make_and_model("HP LaserJet 3390"),
            ("HP".to_string(), "LaserJet 3390".to_string())
        );
    }

    #[test]
    fn all_caps_makes_get_canonical_casing() {
        assert_eq!(split_make_and_model("EPSON Stylus Color 740").0, "Epson");
        assert_eq!(split_make_and_model("OKIDATA OKIPAGE 10e").0, "Okidata");
    }

    #[test]
    fn generic_names_lose_the_printer_suffix() {
        assert_eq!(
            split_make_and_model("Generic PCL 6/PCL XL Printer"),
            ("Generic".to_string(), "PCL 6/PCL XL".to_string())
        );
        assert_eq!(
            split_make_and_model("Generic PostScript Printer"),
            ("Generic".to_string(), "PostScript".to_string())
        );
    }

    #[test]
    fn single_token_input_has_empty_model() {
        assert_eq!(
            split_make_and_model("Epson"),
            ("Epson".to_string(), String::new())
        );
    }

    #[test]
    fn normalize_splits_letter_digit_boundaries() {
        assert_eq!(normalize("Epson PM-A820"), "epson pm a 820");
        assert_eq!(normalize("Epson PM A820"), "epson pm a 820");
        assert_eq!(normalize("HP LaserJet 3390"), "hp laserjet 3390");
    }

    #[test]
    fn normalize_collapses_separator_runs() {
        assert_eq!(normalize("  FS--600  "), "fs 600");
        assert_eq!(normalize("PCL 6/PCL XL"), "pcl 6 pcl xl");
    }

    #[test]
    fn normalize_is_idempotent() {
        for s in ["Epson PM-A820", "HP LaserJet 3390", "a1b2c3", "--x--"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }
}
