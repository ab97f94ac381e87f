//! Choropleth classification of regional production values.
//!
//! Buckets are bounded below by strict `>` thresholds, so a value sitting
//! exactly on a threshold belongs to the bucket beneath it.

use serde::Serialize;

/// Ordered severity bins, lowest production first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ColorBucket {
    /// No production (`<= 0`, or not a number).
    Empty,
    /// `> 0`
    Trace,
    /// `> 5`
    VeryLow,
    /// `> 70`
    Low,
    /// `> 150`
    Moderate,
    /// `> 600`
    High,
    /// `> 900`
    VeryHigh,
    /// `> 1400`
    Peak,
}

/// Lower bounds in kilotonnes, highest first, paired with the bucket a value
/// strictly above the bound falls into.
pub const THRESHOLDS: [(f64, ColorBucket); 7] = [
    (1400.0, ColorBucket::Peak),
    (900.0, ColorBucket::VeryHigh),
    (600.0, ColorBucket::High),
    (150.0, ColorBucket::Moderate),
    (70.0, ColorBucket::Low),
    (5.0, ColorBucket::VeryLow),
    (0.0, ColorBucket::Trace),
];

impl ColorBucket {
    pub const ALL: [ColorBucket; 8] = [
        ColorBucket::Empty,
        ColorBucket::Trace,
        ColorBucket::VeryLow,
        ColorBucket::Low,
        ColorBucket::Moderate,
        ColorBucket::High,
        ColorBucket::VeryHigh,
        ColorBucket::Peak,
    ];

    /// Fill colour of the green sequential palette used by the map.
    pub fn fill_color(self) -> &'static str {
        match self {
            ColorBucket::Peak => "#006400",
            ColorBucket::VeryHigh => "#238b45",
            ColorBucket::High => "#41ab5d",
            ColorBucket::Moderate => "#74c476",
            ColorBucket::Low => "#a1d99b",
            ColorBucket::VeryLow => "#c7e9c0",
            ColorBucket::Trace => "#e5f5e0",
            ColorBucket::Empty => "#f7fcf5",
        }
    }

    /// Legend text for the bucket.
    pub fn legend(self) -> &'static str {
        match self {
            ColorBucket::Peak => "> 1400 kt",
            ColorBucket::VeryHigh => "900 - 1400 kt",
            ColorBucket::High => "600 - 900 kt",
            ColorBucket::Moderate => "150 - 600 kt",
            ColorBucket::Low => "70 - 150 kt",
            ColorBucket::VeryLow => "5 - 70 kt",
            ColorBucket::Trace => "0 - 5 kt",
            ColorBucket::Empty => "0 kt",
        }
    }
}

pub fn color_bucket(value: f64) -> ColorBucket {
    THRESHOLDS
        .iter()
        .find(|(bound, _)| value > *bound)
        .map(|(_, bucket)| *bucket)
        .unwrap_or(ColorBucket::Empty)
}
