//! Naming-convention recognizer for asset filenames.
//!
//! Titles follow the pattern used by the art department when exporting files:
//!
//! - `15BTMN002B King Of Bats cmp.psd`: a licensed composition. Two-digit
//!   license year, four-character product-line code, sequence number with an
//!   optional variation letter, then the short name.
//! - `GR125 basic crew with side tie COMP.psd`: a composition resource. The
//!   leading letters are the department, then sequence number and short name.
//! - `15BTMN002 King Of Bats.jpg`: licensed art that is not a composition.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Searched in the lowercased title; the trailing dot anchors them before the extension.
pub const COMPOSITION_MARKERS: [&str; 2] = [" comp.", " cmp."];

/// Two year digits, four code characters, a dot and an extension.
pub const MIN_TITLE_LENGTH: usize = 8;

const RESOURCE_SUFFIX: &str = " comp";

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<year>[0-9]{2})").expect("valid year regex"))
}

fn licensed_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<year>[0-9]{2})(?P<code>.{4})(?P<token>[^ ]+) (?P<name>.*)$")
            .expect("valid licensed title regex")
    })
}

fn resource_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<token>[^ ]+) (?P<name>.*)$").expect("valid resource title regex")
    })
}

fn department_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<department>[^0-9]*)(?P<sequence>.*)$").expect("valid department regex")
    })
}

/// What a title says about the asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TitleClass {
    LicensedComposition,
    CompositionResource,
    LicensedArtResource,
    Unclassified,
}

/// A title split into the pieces the classifier branches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleParts<'a> {
    pub extension: &'a str,
    /// Title without extension, cut at the composition marker when there is one.
    /// `None` when the title has no extension to strip.
    pub stem: Option<&'a str>,
    pub composition: bool,
    /// Leading two-digit year; `00` counts as no year.
    pub year: Option<u32>,
}

impl<'a> TitleParts<'a> {
    pub fn parse(title: &'a str) -> Self {
        let (extension, mut stem) = match title.rfind('.') {
            Some(pos) if pos > 0 => (&title[pos + 1..], Some(&title[..pos])),
            _ => ("", None),
        };

        let year = stem.and_then(leading_year);

        // ASCII lowercasing keeps byte offsets aligned with `title`
        let lowered = title.to_ascii_lowercase();
        let mut composition = false;
        for marker in COMPOSITION_MARKERS {
            if let Some(pos) = lowered.find(marker) {
                if pos > 0 {
                    composition = true;
                    stem = stem.map(|s| &s[..pos.min(s.len())]);
                    break;
                }
            }
        }

        Self {
            extension,
            stem,
            composition,
            year,
        }
    }

    pub fn class(&self) -> TitleClass {
        match (self.composition, self.year.is_some()) {
            (true, true) => TitleClass::LicensedComposition,
            (true, false) => TitleClass::CompositionResource,
            (false, true) => TitleClass::LicensedArtResource,
            (false, false) => TitleClass::Unclassified,
        }
    }
}

fn leading_year(stem: &str) -> Option<u32> {
    year_regex()
        .captures(stem)
        .and_then(|caps| caps["year"].parse::<u32>().ok())
        .filter(|year| *year > 0)
}

/// Numeric part of a sequence token and whatever follows it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceNumber {
    pub number: String,
    pub suffix: String,
}

/// Leading digits are the number; the first non-digit starts the suffix.
///
/// A token that does not start with a digit has an empty number and is
/// entirely suffix.
pub fn split_sequence(token: &str) -> SequenceNumber {
    match token.find(|c: char| !c.is_ascii_digit()) {
        Some(pos) => SequenceNumber {
            number: token[..pos].to_string(),
            suffix: token[pos..].to_string(),
        },
        None => SequenceNumber {
            number: token.to_string(),
            suffix: String::new(),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicensedName {
    pub year: u32,
    pub code: String,
    pub sequence: SequenceNumber,
    pub name: String,
}

/// `YY` + code + sequence token, a space, then the short name.
pub fn parse_licensed(stem: &str) -> Option<LicensedName> {
    let caps = licensed_regex().captures(stem)?;
    Some(LicensedName {
        year: caps["year"].parse().ok()?,
        code: caps["code"].to_string(),
        sequence: split_sequence(&caps["token"]),
        name: caps["name"].to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceName {
    pub department: String,
    pub sequence: SequenceNumber,
    pub name: String,
}

/// Department letters + sequence token, a space, then the short name.
pub fn parse_resource(stem: &str) -> Option<ResourceName> {
    let stem = match stem.to_ascii_lowercase().rfind(RESOURCE_SUFFIX) {
        Some(pos) if pos > 0 => &stem[..pos],
        _ => stem,
    };

    let caps = resource_regex().captures(stem)?;
    let parts = department_regex().captures(&caps["token"])?;
    Some(ResourceName {
        department: parts["department"].to_string(),
        sequence: split_sequence(&parts["sequence"]),
        name: caps["name"].to_string(),
    })
}

/// Everything a title yields, without looking anything up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleSummary {
    pub title: String,
    pub class: TitleClass,
    pub extension: String,
    pub year: Option<u32>,
    pub code: Option<String>,
    pub department: Option<String>,
    pub sequence: Option<String>,
    pub suffix: Option<String>,
    pub name: Option<String>,
}

pub fn summarize(title: &str) -> TitleSummary {
    let parts = TitleParts::parse(title);
    let class = if title.chars().count() < MIN_TITLE_LENGTH {
        TitleClass::Unclassified
    } else {
        parts.class()
    };

    let mut summary = TitleSummary {
        title: title.to_string(),
        class,
        extension: parts.extension.to_string(),
        year: None,
        code: None,
        department: None,
        sequence: None,
        suffix: None,
        name: None,
    };

    let stem = parts.stem.unwrap_or_default();
    match class {
        TitleClass::LicensedComposition | TitleClass::LicensedArtResource => {
            if let Some(parsed) = parse_licensed(stem) {
                summary.year = Some(parsed.year);
                summary.code = Some(parsed.code);
                summary.sequence = Some(parsed.sequence.number);
                summary.suffix = Some(parsed.sequence.suffix);
                summary.name = Some(parsed.name);
            }
        }
        TitleClass::CompositionResource => {
            if let Some(parsed) = parse_resource(stem) {
                summary.department = Some(parsed.department);
                summary.sequence = Some(parsed.sequence.number);
                summary.suffix = Some(parsed.sequence.suffix);
                summary.name = Some(parsed.name);
            }
        }
        TitleClass::Unclassified => {}
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_licensed_composition() {
        let summary = summarize("15BTMN002B King Of Bats cmp.psd");
        assert_eq!(summary.class, TitleClass::LicensedComposition);
        assert_eq!(summary.year, Some(15));
        assert_eq!(summary.code.as_deref(), Some("BTMN"));
        assert_eq!(summary.sequence.as_deref(), Some("002"));
        assert_eq!(summary.suffix.as_deref(), Some("B"));
        assert_eq!(summary.name.as_deref(), Some("King Of Bats"));
    }

    #[test]
    fn test_summarize_short_title() {
        let summary = summarize("15A.jpg");
        assert_eq!(summary.class, TitleClass::Unclassified);
        assert_eq!(summary.year, None);
    }

    #[test]
    fn test_split_sequence_with_suffix() {
        let seq = split_sequence("002B");
        assert_eq!(seq.number, "002");
        assert_eq!(seq.suffix, "B");
    }

    #[test]
    fn test_split_sequence_digits_only() {
        let seq = split_sequence("002");
        assert_eq!(seq.number, "002");
        assert_eq!(seq.suffix, "");
    }

    #[test]
    fn test_split_sequence_not_digit_led() {
        let seq = split_sequence("B002");
        assert_eq!(seq.number, "");
        assert_eq!(seq.suffix, "B002");
    }

    #[test]
    fn test_split_sequence_multi_char_suffix() {
        let seq = split_sequence("12ab3");
        assert_eq!(seq.number, "12");
        assert_eq!(seq.suffix, "ab3");
    }

    #[test]
    fn test_parts_licensed_composition() {
        let parts = TitleParts::parse("15BTMN002 King Of Bats cmp.psd");
        assert_eq!(parts.extension, "psd");
        assert_eq!(parts.stem, Some("15BTMN002 King Of Bats"));
        assert!(parts.composition);
        assert_eq!(parts.year, Some(15));
        assert_eq!(parts.class(), TitleClass::LicensedComposition);
    }

    #[test]
    fn test_parts_marker_is_case_insensitive() {
        let parts = TitleParts::parse("GR125 basic crew with side tie COMP.psd");
        assert!(parts.composition);
        assert_eq!(parts.year, None);
        assert_eq!(parts.stem, Some("GR125 basic crew with side tie"));
        assert_eq!(parts.class(), TitleClass::CompositionResource);
    }

    #[test]
    fn test_parts_marker_at_start_is_ignored() {
        let parts = TitleParts::parse(" comp.15BTMN002 x.jpg");
        assert!(!parts.composition);
    }

    #[test]
    fn test_parts_licensed_art_resource() {
        let parts = TitleParts::parse("15BTMN002 King Of Bats.jpg");
        assert!(!parts.composition);
        assert_eq!(parts.class(), TitleClass::LicensedArtResource);
    }

    #[test]
    fn test_parts_unclassified() {
        let parts = TitleParts::parse("holiday picture.jpg");
        assert_eq!(parts.class(), TitleClass::Unclassified);
    }

    #[test]
    fn test_parts_year_zero_is_no_year() {
        let parts = TitleParts::parse("00BTMN002 King cmp.psd");
        assert_eq!(parts.year, None);
        assert_eq!(parts.class(), TitleClass::CompositionResource);
    }

    #[test]
    fn test_parts_without_extension_has_no_year() {
        let parts = TitleParts::parse("15BTMN002 King Of Bats");
        assert_eq!(parts.stem, None);
        assert_eq!(parts.year, None);
        assert_eq!(parts.class(), TitleClass::Unclassified);
    }

    #[test]
    fn test_parse_licensed() {
        let parsed = parse_licensed("15BTMN002B King Of Bats").unwrap();
        assert_eq!(parsed.year, 15);
        assert_eq!(parsed.code, "BTMN");
        assert_eq!(parsed.sequence.number, "002");
        assert_eq!(parsed.sequence.suffix, "B");
        assert_eq!(parsed.name, "King Of Bats");
    }

    #[test]
    fn test_parse_licensed_needs_a_name() {
        assert!(parse_licensed("15BTMN002").is_none());
        assert!(parse_licensed("15BTMN 002 King").is_none());
        assert!(parse_licensed("15BT").is_none());
    }

    #[test]
    fn test_parse_resource() {
        let parsed = parse_resource("GR125 basic crew with side tie").unwrap();
        assert_eq!(parsed.department, "GR");
        assert_eq!(parsed.sequence.number, "125");
        assert_eq!(parsed.sequence.suffix, "");
        assert_eq!(parsed.name, "basic crew with side tie");
    }

    #[test]
    fn test_parse_resource_strips_remaining_comp() {
        let parsed = parse_resource("JR228A Gym Tote Comp").unwrap();
        assert_eq!(parsed.department, "JR");
        assert_eq!(parsed.sequence.number, "228");
        assert_eq!(parsed.sequence.suffix, "A");
        assert_eq!(parsed.name, "Gym Tote");
    }

    #[test]
    fn test_parse_resource_without_digits() {
        let parsed = parse_resource("GRX basic crew").unwrap();
        assert_eq!(parsed.department, "GRX");
        assert_eq!(parsed.sequence.number, "");
    }
}
