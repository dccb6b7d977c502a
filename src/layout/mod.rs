//! Channel grid arrangement, labels and pen colors.
//!
//! The core never looks at positions; a layout is handed to whatever
//! canvas draws the grid.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// MCS channels carrying non-electrode signals
const MCS_SPECIAL_CHANNELS: [&str; 4] = [
    "Photodiode",
    "Intracellular Vm",
    "Intracellular I",
    "Unused",
];

const MCS_AUTOSCALED_CHANNELS: [usize; 4] = [0, 1, 2, 3];

const HIDENS_PHOTODIODE_NAME: &str = "Photodiode";

/// Recording array family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrayKind {
    Mcs,
    HiDens,
}

impl ArrayKind {
    /// HiDens identifiers all start with "hidens"; anything else is MCS
    pub fn from_name(name: &str) -> Self {
        if name.to_ascii_lowercase().starts_with("hidens") {
            ArrayKind::HiDens
        } else {
            ArrayKind::Mcs
        }
    }

    pub fn default_sample_rate(&self) -> f64 {
        match self {
            ArrayKind::Mcs => 10_000.0,
            ArrayKind::HiDens => 20_000.0,
        }
    }

    /// Default half-range of the value axis, in display units
    pub fn default_display_range(&self) -> f64 {
        match self {
            ArrayKind::Mcs => 0.5,
            ArrayKind::HiDens => 100.0,
        }
    }

    pub fn max_display_range(&self) -> f64 {
        match self {
            ArrayKind::Mcs => 10.0,
            ArrayKind::HiDens => 10_000.0,
        }
    }

    /// Volts for MCS, microvolts for HiDens
    pub fn scale_multiplier(&self) -> f64 {
        match self {
            ArrayKind::Mcs => 1.0,
            ArrayKind::HiDens => 1e-6,
        }
    }

    /// Channels that are always scaled to fit their data
    pub fn autoscaled_channels(&self) -> &'static [usize] {
        match self {
            ArrayKind::Mcs => &MCS_AUTOSCALED_CHANNELS,
            ArrayKind::HiDens => &[],
        }
    }

    pub fn is_autoscaled(&self, channel: usize) -> bool {
        self.autoscaled_channels().contains(&channel)
    }

    pub fn channel_label(&self, channel: usize, channel_count: usize) -> String {
        match self {
            ArrayKind::Mcs => MCS_SPECIAL_CHANNELS
                .get(channel)
                .map(|s| s.to_string())
                .unwrap_or_else(|| channel.to_string()),
            ArrayKind::HiDens if channel + 1 == channel_count => {
                HIDENS_PHOTODIODE_NAME.to_string()
            }
            ArrayKind::HiDens => channel.to_string(),
        }
    }
}

/// HSV pen color, hue in degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenColor {
    pub hue: u16,
    pub saturation: u8,
    pub value: u8,
}

impl PenColor {
    pub const INVALID: PenColor = PenColor {
        hue: 0,
        saturation: 0,
        value: 60,
    };

    /// Highlighted pen for a selected channel
    pub fn selected(&self) -> PenColor {
        PenColor {
            hue: self.hue,
            saturation: 255,
            value: 255,
        }
    }
}

/// Equally spaced hues around the color wheel, gray for invalid channels
pub fn pen_colors(valid: &[bool]) -> Vec<PenColor> {
    if valid.is_empty() {
        return Vec::new();
    }
    let spacing = (360 / valid.len()) as u16;
    valid
        .iter()
        .enumerate()
        .map(|(i, &ok)| {
            if ok {
                PenColor {
                    hue: i as u16 * spacing,
                    saturation: 100,
                    value: 100,
                }
            } else {
                PenColor::INVALID
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelPlacement {
    pub channel: usize,
    pub row: usize,
    pub column: usize,
    pub label: String,
    pub color: PenColor,
}

/// Mapping from channels to cells of the plot grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelLayout {
    pub rows: usize,
    pub columns: usize,
    pub placements: Vec<ChannelPlacement>,
}

impl ChannelLayout {
    /// Channels laid out in order, row by row, on a near-square grid
    pub fn channel_order(kind: ArrayKind, channel_count: usize) -> Self {
        let (rows, columns) = grid_size(channel_count);
        let positions = (0..channel_count)
            .map(|i| (i / columns.max(1), i % columns.max(1)))
            .collect();
        Self::build(kind, rows, columns, positions, &vec![true; channel_count])
    }

    /// Use an externally supplied placement, one cell per channel
    pub fn from_positions(
        kind: ArrayKind,
        rows: usize,
        columns: usize,
        positions: Vec<(usize, usize)>,
        valid: &[bool],
    ) -> Result<Self> {
        if valid.len() != positions.len() {
            anyhow::bail!(
                "Validity mask covers {} channels, layout has {}",
                valid.len(),
                positions.len()
            );
        }
        let mut seen = HashSet::new();
        for (channel, &(row, column)) in positions.iter().enumerate() {
            if row >= rows || column >= columns {
                anyhow::bail!(
                    "Channel {} placed at ({}, {}) outside {}x{} grid",
                    channel,
                    row,
                    column,
                    rows,
                    columns
                );
            }
            if !seen.insert((row, column)) {
                anyhow::bail!("Cell ({}, {}) assigned to more than one channel", row, column);
            }
        }
        Ok(Self::build(kind, rows, columns, positions, valid))
    }

    fn build(
        kind: ArrayKind,
        rows: usize,
        columns: usize,
        positions: Vec<(usize, usize)>,
        valid: &[bool],
    ) -> Self {
        let count = positions.len();
        let colors = pen_colors(valid);
        let placements = positions
            .into_iter()
            .zip(colors)
            .enumerate()
            .map(|(channel, ((row, column), color))| ChannelPlacement {
                channel,
                row,
                column,
                label: kind.channel_label(channel, count),
                color,
            })
            .collect();
        Self {
            rows,
            columns,
            placements,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.placements.len()
    }

    pub fn placement(&self, channel: usize) -> Option<&ChannelPlacement> {
        self.placements.get(channel)
    }

    /// Channel drawn at a grid cell, if any
    pub fn channel_at(&self, row: usize, column: usize) -> Option<usize> {
        self.placements
            .iter()
            .find(|p| p.row == row && p.column == column)
            .map(|p| p.channel)
    }
}

/// rows = ceil(sqrt(n)), columns = ceil(n / rows)
pub fn grid_size(channel_count: usize) -> (usize, usize) {
    if channel_count == 0 {
        return (0, 0);
    }
    let rows = (channel_count as f64).sqrt().ceil() as usize;
    let columns = (channel_count + rows - 1) / rows;
    (rows, columns)
}
