use serde::{Deserialize, Serialize};

/// Global scaling settings pushed to every worker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormatSettings {
    pub autoscale: bool,
    pub scale: f64,
    pub scale_multiplier: f64,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            autoscale: false,
            scale: 0.5,
            scale_multiplier: 1.0,
        }
    }
}

/// Value-axis ticks at the lower bound, center and upper bound
#[derive(Debug, Clone, PartialEq)]
pub struct AxisTicks {
    pub positions: [f64; 3],
    pub labels: [String; 3],
}

/// Per-channel display state computed at swap time, so the renderer
/// never touches channel state
#[derive(Debug, Clone, PartialEq)]
pub struct PlotFormat {
    pub value_range: (f64, f64),
    pub ticks: Option<AxisTicks>,
    pub selected: bool,
}

impl PlotFormat {
    /// Fit the axis to the data. Tick labels are offsets from the center
    /// in display units.
    pub fn autoscaled(samples: &[f64], scale_multiplier: f64, selected: bool) -> Self {
        let (lower, upper) = min_max(samples);
        let center = (lower + upper) / 2.0;
        let offset_label = |value: f64| (((value - center) / scale_multiplier) as i64).to_string();
        Self {
            value_range: (lower, upper),
            ticks: Some(AxisTicks {
                positions: [lower, center, upper],
                labels: [offset_label(lower), "0".to_string(), offset_label(upper)],
            }),
            selected,
        }
    }

    /// Fixed half-range around the block mean, no ticks
    pub fn centered(mean: f64, settings: &FormatSettings, selected: bool) -> Self {
        let half = settings.scale * settings.scale_multiplier;
        Self {
            value_range: (mean - half, mean + half),
            ticks: None,
            selected,
        }
    }

    pub fn is_autoscaled(&self) -> bool {
        self.ticks.is_some()
    }
}

impl Default for PlotFormat {
    fn default() -> Self {
        Self::centered(0.0, &FormatSettings::default(), false)
    }
}

pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

fn min_max(samples: &[f64]) -> (f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autoscaled_ticks() {
        let format = PlotFormat::autoscaled(&[-1.0, 0.5, 3.0], 1.0, false);
        assert_eq!(format.value_range, (-1.0, 3.0));
        let ticks = format.ticks.unwrap();
        assert_eq!(ticks.positions, [-1.0, 1.0, 3.0]);
        assert_eq!(ticks.labels, ["-2".to_string(), "0".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_autoscaled_labels_use_multiplier() {
        let format = PlotFormat::autoscaled(&[0.0, 100.0], 0.5, true);
        let ticks = format.ticks.unwrap();
        assert_eq!(ticks.labels[2], "100");
        assert!(format.selected);
    }

    #[test]
    fn test_centered_range() {
        let settings = FormatSettings {
            autoscale: false,
            scale: 0.5,
            scale_multiplier: 2.0,
        };
        let format = PlotFormat::centered(1.0, &settings, false);
        assert_eq!(format.value_range, (0.0, 2.0));
        assert!(!format.is_autoscaled());
    }

    #[test]
    fn test_mean_of_empty_block() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    }
}
