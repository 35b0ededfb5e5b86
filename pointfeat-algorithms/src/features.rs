//! Feature table assembly
//!
//! Column order is a contract with the tools that load feature tables:
//!
//! ```text
//! x,y,z,r,g,b, normal_x,normal_y,normal_z, curvature,
//! std_<c>..., skewness_<c>..., excess_<c>..., dz_max, dz_min [, class]
//! ```
//!
//! where `<c>` runs over the configured channel subset in `x,y,z,r,g,b`
//! order. Any change to this order must bump [`FEATURE_SCHEMA_VERSION`].

use pointfeat_core::{ChannelSet, Descriptor, Error, MomentSet, Result, Tile};

/// Version of the feature column layout
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

const RAW_COLUMNS: [&str; 6] = ["x", "y", "z", "r", "g", "b"];
const DESCRIPTOR_COLUMNS: [&str; 4] = ["normal_x", "normal_y", "normal_z", "curvature"];

/// Named, ordered columns of a feature table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    channels: ChannelSet,
    include_class: bool,
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new(channels: &ChannelSet, include_class: bool) -> Self {
        let mut columns: Vec<String> = RAW_COLUMNS
            .iter()
            .chain(DESCRIPTOR_COLUMNS.iter())
            .map(|c| c.to_string())
            .collect();
        for stat in ["std", "skewness", "excess"] {
            columns.extend(channels.iter().map(|c| format!("{}_{}", stat, c.name())));
        }
        columns.push("dz_max".to_string());
        columns.push("dz_min".to_string());
        if include_class {
            columns.push("class".to_string());
        }

        Self {
            channels: channels.clone(),
            include_class,
            columns,
        }
    }

    pub fn version(&self) -> u32 {
        FEATURE_SCHEMA_VERSION
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    pub fn include_class(&self) -> bool {
        self.include_class
    }

    /// Position of a named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Row-major feature table, one row per tile point
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    schema: FeatureSchema,
    values: Vec<f64>,
}

impl FeatureTable {
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn columns(&self) -> &[String] {
        self.schema.columns()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.values.len() / self.schema.width()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let width = self.schema.width();
        &self.values[i * width..(i + 1) * width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.values.chunks_exact(self.schema.width())
    }

    /// Value at `row` of the named column
    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        self.schema.column_index(column).map(|c| self.row(row)[c])
    }

    /// All values of the named column
    pub fn column(&self, column: &str) -> Option<Vec<f64>> {
        let c = self.schema.column_index(column)?;
        Some(self.rows().map(|row| row[c]).collect())
    }
}

/// Concatenate raw attributes, descriptors and moments into a feature table
///
/// # Arguments
/// * `tile` - Source tile
/// * `descriptors` - One descriptor per point
/// * `moments` - One moment set per point, computed over `schema.channels()`
/// * `schema` - Output column layout
pub fn assemble_features(
    tile: &Tile,
    descriptors: &[Descriptor],
    moments: &[MomentSet],
    schema: &FeatureSchema,
) -> Result<FeatureTable> {
    if descriptors.len() != tile.len() || moments.len() != tile.len() {
        return Err(Error::InvalidData(format!(
            "tile has {} points but got {} descriptors and {} moment sets",
            tile.len(),
            descriptors.len(),
            moments.len()
        )));
    }

    let channel_count = schema.channels().len();
    let mut values = Vec::with_capacity(tile.len() * schema.width());
    for ((point, descriptor), moment) in tile.iter().zip(descriptors).zip(moments) {
        if moment.std.len() != channel_count
            || moment.skewness.len() != channel_count
            || moment.excess.len() != channel_count
        {
            return Err(Error::InvalidData(format!(
                "moment set has {} channels, schema expects {}",
                moment.std.len(),
                channel_count
            )));
        }

        values.extend_from_slice(&point.raw_attributes());
        values.extend_from_slice(&[
            descriptor.normal.x,
            descriptor.normal.y,
            descriptor.normal.z,
            descriptor.curvature,
        ]);
        values.extend_from_slice(&moment.std);
        values.extend_from_slice(&moment.skewness);
        values.extend_from_slice(&moment.excess);
        values.push(moment.dz_max);
        values.push(moment.dz_min);
        if schema.include_class() {
            values.push(point.class as f64);
        }
    }

    Ok(FeatureTable {
        schema: schema.clone(),
        values,
    })
}
