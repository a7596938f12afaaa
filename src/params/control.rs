//! Control-surface ranges for user-adjustable parameters.
//!
//! The core only checks positivity; these helpers keep user input on the
//! slider grid (range plus step) before it ever reaches the session.

/// Allowed frequency sample counts: 64..=512 in steps of 64
pub const FREQUENCY_SAMPLES: SteppedRange = SteppedRange {
    min: 64,
    max: 512,
    step: 64,
};

/// Allowed time sample counts: 200..=1200 in steps of 100
pub const TIME_SAMPLES: SteppedRange = SteppedRange {
    min: 200,
    max: 1200,
    step: 100,
};

/// Zoom slider limits
pub const ZOOM: (f32, f32) = (0.1, 10.0);

/// Max height slider limits (world units)
pub const MAX_HEIGHT: (f32, f32) = (0.0, 40.0);

/// An inclusive integer range walked in fixed steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SteppedRange {
    pub min: usize,
    pub max: usize,
    pub step: usize,
}

impl SteppedRange {
    /// Whether `value` lies on the grid
    pub fn contains(&self, value: usize) -> bool {
        (self.min..=self.max).contains(&value) && (value - self.min) % self.step == 0
    }

    /// Move `steps` grid positions from `value`, saturating at the ends
    pub fn step_from(&self, value: usize, steps: i32) -> usize {
        let snapped = self.snap(value) as i64;
        let moved = snapped + steps as i64 * self.step as i64;
        moved.clamp(self.min as i64, self.max as i64) as usize
    }

    /// Nearest grid value to `value`
    pub fn snap(&self, value: usize) -> usize {
        let clamped = value.clamp(self.min, self.max);
        let offset = clamped - self.min;
        let lower = self.min + offset / self.step * self.step;
        let upper = (lower + self.step).min(self.max);
        if clamped - lower <= upper.saturating_sub(clamped) {
            lower
        } else {
            upper
        }
    }

    /// clap value parser: accept only values on the grid
    pub fn parse(&self, text: &str) -> Result<usize, String> {
        let value: usize = text
            .parse()
            .map_err(|e| format!("'{}' is not a whole number: {}", text, e))?;
        if self.contains(value) {
            Ok(value)
        } else {
            Err(format!(
                "must be between {} and {} in steps of {}",
                self.min, self.max, self.step
            ))
        }
    }
}

/// clap value parser for `--frequency-samples`
pub fn parse_frequency_samples(text: &str) -> Result<usize, String> {
    FREQUENCY_SAMPLES.parse(text)
}

/// clap value parser for `--time-samples`
pub fn parse_time_samples(text: &str) -> Result<usize, String> {
    TIME_SAMPLES.parse(text)
}

/// Clamp a zoom value into the slider range
pub fn clamp_zoom(zoom: f32) -> f32 {
    zoom.clamp(ZOOM.0, ZOOM.1)
}

/// Clamp a max height value into the slider range
pub fn clamp_max_height(max_height: f32) -> f32 {
    max_height.clamp(MAX_HEIGHT.0, MAX_HEIGHT.1)
}
