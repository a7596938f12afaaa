//! Scroll buffer updater: fixed-capacity ring along the time axis.

/// Shift the heights buffer left by one column and append the newest spectrum
///
/// The buffer holds `vertex_count / (frequency_samples + 1)` columns of
/// `frequency_samples + 1` values each. The oldest column is evicted, every other
/// column moves one position toward index 0, and `sample` becomes the rightmost
/// column. The closing row of the new column repeats the last real bin. Bins the
/// sample does not provide read as 0.
///
/// This is the only code that writes heights; the buffer length never changes.
pub fn scroll_tick(
    sample: &[u8],
    heights: &mut [u8],
    frequency_samples: usize,
    vertex_count: usize,
) {
    let stride = frequency_samples + 1;
    debug_assert!(vertex_count <= heights.len());
    if frequency_samples == 0 || vertex_count < stride {
        return;
    }

    // Overlap-safe move of columns 1.. onto 0..
    heights.copy_within(stride..vertex_count, 0);

    let insert_base = vertex_count - stride;
    let column = &mut heights[insert_base..vertex_count];
    for (j, slot) in column[..frequency_samples].iter_mut().enumerate() {
        *slot = sample.get(j).copied().unwrap_or(0);
    }
    column[frequency_samples] = column[frequency_samples - 1];
}
