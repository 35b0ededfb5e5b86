//! Per-point attribute channels and channel subsets

use crate::error::{Error, Result};
use crate::point::TilePoint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A numeric attribute channel of a tile point
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    X,
    Y,
    Z,
    R,
    G,
    B,
}

impl Channel {
    /// All channels in canonical column order
    pub const ALL: [Channel; 6] = [
        Channel::X,
        Channel::Y,
        Channel::Z,
        Channel::R,
        Channel::G,
        Channel::B,
    ];

    /// Column suffix used in feature names
    pub fn name(&self) -> &'static str {
        match self {
            Channel::X => "x",
            Channel::Y => "y",
            Channel::Z => "z",
            Channel::R => "r",
            Channel::G => "g",
            Channel::B => "b",
        }
    }

    pub fn value(&self, point: &TilePoint) -> f64 {
        match self {
            Channel::X => point.position.x,
            Channel::Y => point.position.y,
            Channel::Z => point.position.z,
            Channel::R => point.color[0],
            Channel::G => point.color[1],
            Channel::B => point.color[2],
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_lowercase();
        Channel::ALL
            .iter()
            .copied()
            .find(|c| c.name() == name)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown channel '{}'", s.trim())))
    }
}

/// A duplicate-free subset of channels.
///
/// Iteration always follows `x,y,z,r,g,b` order no matter how the subset was
/// spelled, so feature columns derived from it are stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Channel>", into = "Vec<Channel>")]
pub struct ChannelSet {
    channels: Vec<Channel>,
}

impl ChannelSet {
    pub fn new<I: IntoIterator<Item = Channel>>(channels: I) -> Self {
        let mut channels: Vec<Channel> = channels.into_iter().collect();
        channels.sort();
        channels.dedup();
        Self { channels }
    }

    /// All six channels
    pub fn all() -> Self {
        Self::new(Channel::ALL)
    }

    /// The coordinate channels `x,y,z`
    pub fn coordinates() -> Self {
        Self::new([Channel::X, Channel::Y, Channel::Z])
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn contains(&self, channel: Channel) -> bool {
        self.channels.binary_search(&channel).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = Channel> + '_ {
        self.channels.iter().copied()
    }

    pub fn as_slice(&self) -> &[Channel] {
        &self.channels
    }
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::all()
    }
}

impl From<Vec<Channel>> for ChannelSet {
    fn from(channels: Vec<Channel>) -> Self {
        Self::new(channels)
    }
}

impl From<ChannelSet> for Vec<Channel> {
    fn from(set: ChannelSet) -> Self {
        set.channels
    }
}

impl FromIterator<Channel> for ChannelSet {
    fn from_iter<I: IntoIterator<Item = Channel>>(iter: I) -> Self {
        Self::new(iter)
    }
}
