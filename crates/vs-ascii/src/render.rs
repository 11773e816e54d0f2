use vs_core::charset::GlyphRamp;
use vs_core::frame::{LuminanceGrid, RenderedFrame};

/// Map every sample of `grid` through `ramp` and build one text row per
/// grid row, glyphs joined by `separator`.
///
/// Pure: the same grid always renders to the same text.
///
/// # Example
/// ```
/// use vs_ascii::render::render;
/// use vs_core::charset::GlyphRamp;
/// use vs_core::frame::LuminanceGrid;
///
/// let ramp = GlyphRamp::new("@#. ").unwrap();
/// let grid = LuminanceGrid::new(2, 1, vec![0, 255]).unwrap();
/// assert_eq!(render(&grid, &ramp, " ").to_string(), "@  ");
/// ```
#[must_use]
pub fn render(grid: &LuminanceGrid, ramp: &GlyphRamp, separator: &str) -> RenderedFrame {
    let width = grid.width() as usize;
    // Glyphs may be multi-byte (blocks), reserve for the worst case.
    let row_capacity = width * 4 + width.saturating_sub(1) * separator.len();

    let rows = grid
        .rows()
        .map(|samples| {
            let mut row = String::with_capacity(row_capacity);
            for (i, &s) in samples.iter().enumerate() {
                if i > 0 {
                    row.push_str(separator);
                }
                row.push(ramp.map(s));
            }
            row
        })
        .collect();

    RenderedFrame::new(rows)
}
