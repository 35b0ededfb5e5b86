//! Delimited text tile format support
//!
//! Tiles are stored as one point per line with the attributes
//! `x,y,z,r,g,b,class`:
//! - Auto-detection of delimiters (comma, space, tab, semicolon)
//! - Optional header; named columns may come in any order and unknown
//!   columns are ignored
//! - Headerless files are read positionally
//! - Blank lines and `#` comments are skipped

use crate::error::IoError;
use log::debug;
use pointfeat_core::{Result, Tile, POINT_ATTRIBUTES};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Supported delimiters for tile files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Space,
    Tab,
    Semicolon,
}

impl Delimiter {
    /// Get the character representation of the delimiter
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Space => ' ',
            Delimiter::Tab => '\t',
            Delimiter::Semicolon => ';',
        }
    }

    /// Detect delimiter from a line of text
    pub fn detect_from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        let counts = [
            (line.matches(',').count(), Delimiter::Comma),
            (line.matches('\t').count(), Delimiter::Tab),
            (line.matches(';').count(), Delimiter::Semicolon),
            (line.matches(' ').count(), Delimiter::Space),
        ];

        // Explicit separators win over spaces used as padding.
        counts
            .iter()
            .find(|(count, delimiter)| *count > 0 && *delimiter != Delimiter::Space)
            .or_else(|| counts.iter().find(|(count, _)| *count > 0))
            .map(|(_, delimiter)| *delimiter)
    }

    /// Split a line into trimmed fields
    pub fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Space => line.split_whitespace().collect(),
            other => line.split(other.as_char()).map(|s| s.trim()).collect(),
        }
    }
}

/// Column types that can appear in a tile file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileColumn {
    X,
    Y,
    Z,
    Red,
    Green,
    Blue,
    Class,
    Unknown,
}

impl TileColumn {
    /// Columns of a tile row, in attribute order
    pub const ATTRIBUTES: [TileColumn; POINT_ATTRIBUTES] = [
        TileColumn::X,
        TileColumn::Y,
        TileColumn::Z,
        TileColumn::Red,
        TileColumn::Green,
        TileColumn::Blue,
        TileColumn::Class,
    ];

    /// Parse column type from header name
    pub fn from_header(header: &str) -> Self {
        match header.trim().to_lowercase().as_str() {
            "x" => TileColumn::X,
            "y" => TileColumn::Y,
            "z" => TileColumn::Z,
            "r" | "red" => TileColumn::Red,
            "g" | "green" => TileColumn::Green,
            "b" | "blue" => TileColumn::Blue,
            "class" | "classification" | "label" => TileColumn::Class,
            _ => TileColumn::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TileColumn::X => "x",
            TileColumn::Y => "y",
            TileColumn::Z => "z",
            TileColumn::Red => "r",
            TileColumn::Green => "g",
            TileColumn::Blue => "b",
            TileColumn::Class => "class",
            TileColumn::Unknown => "unknown",
        }
    }
}

/// Layout of a tile file
#[derive(Debug, Clone, PartialEq)]
pub struct TileSchema {
    pub delimiter: Delimiter,
    pub has_header: bool,
    /// Field position of each attribute, in `x,y,z,r,g,b,class` order
    pub positions: [usize; POINT_ATTRIBUTES],
    /// Number of fields every data line must have
    pub width: usize,
}

impl TileSchema {
    /// Headerless layout with the attributes in their natural order
    pub fn positional(delimiter: Delimiter) -> Self {
        Self {
            delimiter,
            has_header: false,
            positions: [0, 1, 2, 3, 4, 5, 6],
            width: POINT_ATTRIBUTES,
        }
    }

    /// Detect the layout from the first data-bearing line of a file
    pub fn detect(first_line: &str, source: &str) -> std::result::Result<Self, IoError> {
        let delimiter = Delimiter::detect_from_line(first_line).ok_or_else(|| IoError::ParseError {
            path: source.to_string(),
            line: 1,
            message: "could not detect delimiter".to_string(),
        })?;

        let fields = delimiter.split(first_line);
        let is_header = fields.iter().any(|f| f.parse::<f64>().is_err());
        if !is_header {
            return Ok(Self::positional(delimiter));
        }

        let columns: Vec<TileColumn> = fields.iter().map(|f| TileColumn::from_header(f)).collect();
        let mut positions = [0usize; POINT_ATTRIBUTES];
        for (slot, wanted) in positions.iter_mut().zip(TileColumn::ATTRIBUTES) {
            *slot = columns
                .iter()
                .position(|c| *c == wanted)
                .ok_or_else(|| IoError::MissingColumn {
                    path: source.to_string(),
                    column: wanted.name().to_string(),
                })?;
        }

        Ok(Self {
            delimiter,
            has_header: true,
            positions,
            width: columns.len(),
        })
    }

    /// Parse one data line into a `x,y,z,r,g,b,class` row
    fn parse_line(
        &self,
        line: &str,
        line_number: usize,
        source: &str,
    ) -> std::result::Result<[f64; POINT_ATTRIBUTES], IoError> {
        let fields = self.delimiter.split(line);
        if fields.len() != self.width {
            return Err(IoError::ParseError {
                path: source.to_string(),
                line: line_number,
                message: format!("expected {} fields, found {}", self.width, fields.len()),
            });
        }

        let mut row = [0.0; POINT_ATTRIBUTES];
        for ((value, &position), column) in row
            .iter_mut()
            .zip(self.positions.iter())
            .zip(TileColumn::ATTRIBUTES)
        {
            let field = fields[position];
            *value = field
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| IoError::ParseError {
                    path: source.to_string(),
                    line: line_number,
                    message: format!("invalid {} value '{}'", column.name(), field),
                })?;
        }
        Ok(row)
    }
}

/// Tile reader for delimited text files
pub struct TileCsvReader;

impl TileCsvReader {
    /// Read a tile from a file, detecting its layout
    pub fn read_tile<P: AsRef<Path>>(path: P) -> Result<Tile> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let tile = Self::read_tile_from(BufReader::new(file), &path.display().to_string())?;
        debug!("Read {} points from {}", tile.len(), path.display());
        Ok(tile)
    }

    /// Read a tile from any buffered reader; `source` names it in errors
    pub fn read_tile_from<R: BufRead>(reader: R, source: &str) -> Result<Tile> {
        let mut schema: Option<TileSchema> = None;
        let mut rows: Vec<[f64; POINT_ATTRIBUTES]> = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(IoError::from)?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            match &schema {
                None => {
                    let detected = TileSchema::detect(trimmed, source)?;
                    if !detected.has_header {
                        rows.push(detected.parse_line(trimmed, i + 1, source)?);
                    }
                    schema = Some(detected);
                }
                Some(schema) => rows.push(schema.parse_line(trimmed, i + 1, source)?),
            }
        }

        if schema.is_none() {
            return Err(IoError::EmptyFile {
                path: source.to_string(),
            }
            .into());
        }

        Tile::from_rows(&rows)
    }
}
