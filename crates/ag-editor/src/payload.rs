//! Drag-and-drop payload parser.
//!
//! Drops arrive as plain text, one entry per line. Two line forms exist:
//!
//! - palette entries: `Category;TypeName;NameHint` — create one node of
//!   `TypeName`, named after `NameHint` (uniquified by the canvas).
//! - window entries: `window:Source;key=value;key=value;...` — items
//!   dragged out of another editor window (e.g. a motion-set row). The
//!   canvas maps known sources to node kinds and attributes.
//!
//! Multi-line drops create one node per line, staggered vertically.

use thiserror::Error;
use winnow::combinator::{opt, separated};
use winnow::prelude::*;
use winnow::token::take_while;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed drop payload: {0}")]
pub struct PayloadError(pub String);

/// One parsed drop line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropEntry {
    Palette {
        category: String,
        type_name: String,
        name_hint: String,
    },
    Window {
        source: String,
        properties: Vec<(String, String)>,
    },
}

/// A complete drop: the parsed entries in line order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropPayload {
    pub entries: Vec<DropEntry>,
}

pub fn parse_payload(text: &str) -> Result<DropPayload, PayloadError> {
    let mut entries = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut rest = line;
        let entry = if let Some(marker) = rest.strip_prefix("window:") {
            rest = marker;
            window_entry
                .parse_next(&mut rest)
                .map_err(|e| PayloadError(format!("{line:?}: {e}")))?
        } else {
            palette_entry
                .parse_next(&mut rest)
                .map_err(|e| PayloadError(format!("{line:?}: {e}")))?
        };
        if !rest.is_empty() {
            return Err(PayloadError(format!("{line:?}: trailing input {rest:?}")));
        }
        entries.push(entry);
    }
    if entries.is_empty() {
        return Err(PayloadError("empty payload".into()));
    }
    Ok(DropPayload { entries })
}

// ─── Line parsers ────────────────────────────────────────────────────────

fn token<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    take_while(1.., |c| c != ';' && c != '=').parse_next(input)
}

fn palette_entry(input: &mut &str) -> ModalResult<DropEntry> {
    let category = token.parse_next(input)?;
    ';'.parse_next(input)?;
    let type_name = token.parse_next(input)?;
    ';'.parse_next(input)?;
    let name_hint = token.parse_next(input)?;
    Ok(DropEntry::Palette {
        category: category.trim().to_string(),
        type_name: type_name.trim().to_string(),
        name_hint: name_hint.trim().to_string(),
    })
}

fn key_value(input: &mut &str) -> ModalResult<(String, String)> {
    let key = token.parse_next(input)?;
    '='.parse_next(input)?;
    let value = token.parse_next(input)?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

fn window_entry(input: &mut &str) -> ModalResult<DropEntry> {
    let source = token.parse_next(input)?;
    let properties = opt((';', separated(1.., key_value, ';')))
        .parse_next(input)?
        .map(|(_, props): (char, Vec<(String, String)>)| props)
        .unwrap_or_default();
    Ok(DropEntry::Window {
        source: source.trim().to_string(),
        properties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_palette_line() {
        let payload = parse_payload("AnimGraph;Blend2;Blend Two").unwrap();
        assert_eq!(
            payload.entries,
            vec![DropEntry::Palette {
                category: "AnimGraph".into(),
                type_name: "Blend2".into(),
                name_hint: "Blend Two".into(),
            }]
        );
    }

    #[test]
    fn parse_window_lines() {
        let payload = parse_payload(
            "window:MotionSet;motionId=walk_loop;name=Walk\n\
             window:MotionSet;motionId=run_loop;name=Run",
        )
        .unwrap();
        assert_eq!(payload.entries.len(), 2);
        assert_eq!(
            payload.entries[0],
            DropEntry::Window {
                source: "MotionSet".into(),
                properties: vec![
                    ("motionId".into(), "walk_loop".into()),
                    ("name".into(), "Walk".into()),
                ],
            }
        );
    }

    #[test]
    fn window_without_properties() {
        let payload = parse_payload("window:ParameterWindow").unwrap();
        assert_eq!(
            payload.entries,
            vec![DropEntry::Window {
                source: "ParameterWindow".into(),
                properties: Vec::new(),
            }]
        );
    }

    #[test]
    fn blank_lines_skipped() {
        let payload = parse_payload("\nAnimGraph;Motion;Walk\n\n").unwrap();
        assert_eq!(payload.entries.len(), 1);
    }

    #[test]
    fn malformed_rejected() {
        assert!(parse_payload("").is_err());
        assert!(parse_payload("just-one-token").is_err());
        assert!(parse_payload("window:MotionSet;novalue").is_err());
    }
}
