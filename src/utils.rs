use crate::engine::{resolve_clickable, Tile, TileKind};
use thiserror::Error;

/// Errors raised while parsing a tile-collection spec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: unknown tile kind `{token}`")]
    UnknownKind { line: usize, token: String },
    #[error("line {line}: `{token}` is not a valid {field}")]
    BadNumber {
        line: usize,
        field: &'static str,
        token: String,
    },
    #[error("line {line}: expected `KIND x y z`")]
    MissingField { line: usize },
}

/// Parses a tile collection from lines of the form `KIND x y z`.
///
/// `KIND` is the upper-case ticker of a [`TileKind`], `x` and `y` are grid
/// coordinates (fractions allowed), and `z` is the integer layer. Blank
/// lines and lines starting with `#` are skipped. Tiles get sequential ids
/// `t0`, `t1`, ... in input order, and the returned collection has already
/// been through the occlusion resolver.
///
/// This is a fixture helper: tests and tools use it to pin down exact board
/// constellations without going through the randomized generator.
///
/// # Examples
/// ```
/// use tristack::utils::tiles_from_spec;
/// use tristack::engine::TileKind;
///
/// let tiles = tiles_from_spec(&[
///     "# two stacked tiles",
///     "BTC 0 0 0",
///     "ETH 0 0 1",
/// ])
/// .unwrap();
/// assert_eq!(tiles.len(), 2);
/// assert_eq!(tiles[0].kind, TileKind::Btc);
/// assert!(!tiles[0].clickable);
///
/// assert!(tiles_from_spec(&["XYZ 0 0 0"]).is_err());
/// ```
pub fn tiles_from_spec(lines: &[&str]) -> Result<Vec<Tile>, ParseError> {
    let mut tiles = Vec::new();

    for (index, raw) in lines.iter().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut fields = trimmed.split_whitespace();
        let mut next_field = || fields.next().ok_or(ParseError::MissingField { line });

        let kind_token = next_field()?;
        let kind: TileKind = kind_token.parse().map_err(|_| ParseError::UnknownKind {
            line,
            token: kind_token.to_string(),
        })?;
        let x = parse_number::<f32>(next_field()?, "x coordinate", line)?;
        let y = parse_number::<f32>(next_field()?, "y coordinate", line)?;
        let z = parse_number::<i32>(next_field()?, "layer index", line)?;

        tiles.push(Tile::new(format!("t{}", tiles.len()), kind, x, y, z));
    }

    resolve_clickable(&mut tiles);
    Ok(tiles)
}

fn parse_number<T: std::str::FromStr>(
    token: &str,
    field: &'static str,
    line: usize,
) -> Result<T, ParseError> {
    token.parse().map_err(|_| ParseError::BadNumber {
        line,
        field,
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_spec() {
        let tiles = tiles_from_spec(&[
            "BTC 0 0 0",
            "",
            "# comment",
            "ETH 2.5 1 3",
        ])
        .unwrap();
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[0].id, "t0");
        assert_eq!(tiles[1].id, "t1");
        assert_eq!(tiles[1].kind, TileKind::Eth);
        assert_eq!((tiles[1].x, tiles[1].y, tiles[1].z), (2.5, 1.0, 3));
    }

    #[test]
    fn test_parse_resolves_clickability() {
        let tiles = tiles_from_spec(&["BTC 0 0 0", "ETH 0 0 1"]).unwrap();
        assert!(!tiles[0].clickable);
        assert!(tiles[1].clickable);
    }

    #[test]
    fn test_parse_unknown_kind() {
        let err = tiles_from_spec(&["BTC 0 0 0", "WAT 0 0 0"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownKind {
                line: 2,
                token: "WAT".to_string()
            }
        );
    }

    #[test]
    fn test_parse_bad_number() {
        let err = tiles_from_spec(&["BTC one 0 0"]).unwrap_err();
        assert!(matches!(err, ParseError::BadNumber { line: 1, .. }));

        let err = tiles_from_spec(&["BTC 0 0 1.5"]).unwrap_err();
        assert!(matches!(
            err,
            ParseError::BadNumber {
                field: "layer index",
                ..
            }
        ));
    }

    #[test]
    fn test_parse_missing_field() {
        let err = tiles_from_spec(&["BTC 0 0"]).unwrap_err();
        assert_eq!(err, ParseError::MissingField { line: 1 });
    }

    #[test]
    fn test_parse_empty_input() {
        assert_eq!(tiles_from_spec(&[]).unwrap(), Vec::new());
    }
}
