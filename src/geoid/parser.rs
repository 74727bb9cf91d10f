//! Geography label parsing.
//!
//! Labels come in two shapes:
//!
//! - enumeration labels:
//!   `Summary level: 150, state:37> county:001> tract:000100> block group:1`
//! - row identifiers, prefixed with the display name:
//!   `Block Group 1, Census Tract 1, Alamance County, North Carolina: Summary level: 150, state:37> ...`
//!
//! Both are tokenized against the same named schema. Segments are separated by
//! `>` or `,` and must cover exactly the four block-group levels, in order.

use super::types::{GeoidError, GeoidParts, Level, check_code};

const SUMMARY_MARKER: &str = "Summary level:";
const BLOCK_GROUP_SUMMARY_LEVEL: &str = "150";

/// A decomposed geography label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLabel {
    /// Display name preceding the summary-level marker, if any.
    pub name: Option<String>,
    /// Summary level code, if the label declared one.
    pub summary_level: Option<String>,
    pub parts: GeoidParts,
}

/// Parse a geography label into its GEOID parts.
pub fn parse_label(label: &str) -> Result<ParsedLabel, GeoidError> {
    let (name, body, has_marker) = match label.find(SUMMARY_MARKER) {
        Some(idx) => {
            let name = label[..idx].trim().trim_end_matches(':').trim();
            let name = (!name.is_empty()).then(|| name.to_string());
            (name, &label[idx + SUMMARY_MARKER.len()..], true)
        }
        None => (None, label, false),
    };

    let mut segments = body
        .split([',', '>'])
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let summary_level = if has_marker {
        let code = segments.next().ok_or(GeoidError::Empty)?;
        if code != BLOCK_GROUP_SUMMARY_LEVEL {
            return Err(GeoidError::SummaryLevel(code.to_string()));
        }
        Some(code.to_string())
    } else {
        None
    };

    let mut codes: [Option<String>; 4] = Default::default();
    let mut next = 0usize;

    for segment in segments {
        let (level_name, code) = segment
            .split_once(':')
            .ok_or_else(|| GeoidError::MalformedSegment(segment.to_string()))?;
        let level = Level::from_api_name(level_name)
            .ok_or_else(|| GeoidError::UnknownLevel(level_name.trim().to_string()))?;

        let idx = level.index();
        if codes[idx].is_some() {
            return Err(GeoidError::DuplicateLevel(level));
        }
        if idx != next {
            return Err(GeoidError::OutOfOrder {
                expected: Level::ALL[next],
                found: level,
            });
        }
        codes[idx] = Some(check_code(level, code)?);
        next += 1;
    }

    if next == 0 {
        return Err(GeoidError::Empty);
    }
    let [Some(state), Some(county), Some(tract), Some(block_group)] = codes else {
        return Err(GeoidError::MissingLevel(Level::ALL[next]));
    };

    Ok(ParsedLabel {
        name,
        summary_level,
        parts: GeoidParts::from_codes(&state, &county, &tract, &block_group)?,
    })
}

/// Render parts as a row-identifier label, the inverse of [`parse_label`].
pub fn format_label(name: &str, parts: &GeoidParts) -> String {
    let mut out = String::new();
    if !name.is_empty() {
        out.push_str(name);
        out.push_str(": ");
    }
    out.push_str(SUMMARY_MARKER);
    out.push(' ');
    out.push_str(BLOCK_GROUP_SUMMARY_LEVEL);
    for (i, level) in Level::ALL.into_iter().enumerate() {
        out.push_str(if i == 0 { ", " } else { "> " });
        out.push_str(level.api_name());
        out.push(':');
        out.push_str(parts.get(level));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW_LABEL: &str = "Block Group 1, Census Tract 1, Alamance County, North Carolina: \
         Summary level: 150, state:37> county:001> tract:000100> block group:1";

    #[test]
    fn parses_comma_separated_enumeration_label() {
        let parsed =
            parse_label("Summary level: 150,state:37,county:001,tract:000100,block group:1").unwrap();
        assert_eq!(parsed.parts.state(), "37");
        assert_eq!(parsed.parts.county(), "001");
        assert_eq!(parsed.parts.tract(), "000100");
        assert_eq!(parsed.parts.block_group(), "1");
        assert_eq!(parsed.parts.geoid().as_str(), "370010001001");
        assert_eq!(parsed.summary_level.as_deref(), Some("150"));
        assert_eq!(parsed.name, None);
    }

    #[test]
    fn parses_row_identifier_with_display_name() {
        let parsed = parse_label(ROW_LABEL).unwrap();
        assert_eq!(parsed.parts.geoid().as_str(), "370010001001");
        assert_eq!(
            parsed.name.as_deref(),
            Some("Block Group 1, Census Tract 1, Alamance County, North Carolina")
        );
    }

    #[test]
    fn parses_bare_segments_without_marker() {
        let parsed = parse_label("state:06> county:075> tract:010101> block group:3").unwrap();
        assert_eq!(parsed.parts.geoid().as_str(), "060750101013");
        assert_eq!(parsed.summary_level, None);
    }

    #[test]
    fn geoid_is_concatenation_of_parts() {
        let labels = [
            "Summary level: 150, state:01> county:003> tract:010200> block group:2",
            "Summary level: 150, state:72> county:153> tract:750602> block group:9",
            ROW_LABEL,
        ];
        for label in labels {
            let parts = parse_label(label).unwrap().parts;
            let geoid = parts.geoid();
            assert_eq!(geoid.as_str().len(), 12);
            assert_eq!(
                geoid.as_str(),
                format!(
                    "{}{}{}{}",
                    parts.state(),
                    parts.county(),
                    parts.tract(),
                    parts.block_group()
                )
            );
        }
    }

    #[test]
    fn parsing_is_deterministic() {
        let a = parse_label(ROW_LABEL).unwrap();
        let b = parse_label(ROW_LABEL).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_level_fails_loudly() {
        let err = parse_label("Summary level: 150, state:37> county:001> tract:000100").unwrap_err();
        assert_eq!(err, GeoidError::MissingLevel(Level::BlockGroup));
    }

    #[test]
    fn skipped_level_is_reported_as_out_of_order() {
        let err = parse_label("Summary level: 150, state:37> tract:000100> block group:1").unwrap_err();
        assert_eq!(
            err,
            GeoidError::OutOfOrder {
                expected: Level::County,
                found: Level::Tract
            }
        );
    }

    #[test]
    fn repeated_level_is_rejected() {
        let err = parse_label("state:37> state:37> county:001> tract:000100> block group:1").unwrap_err();
        assert_eq!(err, GeoidError::DuplicateLevel(Level::State));
    }

    #[test]
    fn wrong_summary_level_is_rejected() {
        let err = parse_label("Summary level: 140, state:37> county:001> tract:000100").unwrap_err();
        assert_eq!(err, GeoidError::SummaryLevel("140".to_string()));
    }

    #[test]
    fn unknown_and_malformed_segments_are_rejected() {
        assert_eq!(
            parse_label("state:37> place:12345").unwrap_err(),
            GeoidError::UnknownLevel("place".to_string())
        );
        assert_eq!(
            parse_label("state:37> county001").unwrap_err(),
            GeoidError::MalformedSegment("county001".to_string())
        );
        assert_eq!(parse_label("   ").unwrap_err(), GeoidError::Empty);
    }

    #[test]
    fn format_label_parses_back() {
        let parts = GeoidParts::from_codes("37", "001", "000100", "1").unwrap();
        let label = format_label("Block Group 1, Census Tract 1, Alamance County, North Carolina", &parts);
        assert_eq!(label, ROW_LABEL);
        assert_eq!(parse_label(&label).unwrap().parts, parts);
    }
}
