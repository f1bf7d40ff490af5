//! Synthetic grid generators.
//!
//! Values are predictable so tests can check where each cell ended up after
//! flattening and joining.

/// Evenly spaced coordinate axis: `start, start + step, ...` (`n` values).
pub fn axis(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Creates a test grid with predictable values.
///
/// Each cell value is `row * 1000 + col`, row-major (latitude outer).
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(2, 3);
/// assert_eq!(grid.len(), 6);
/// assert_eq!(grid[1], 1.0);    // row 0, col 1
/// assert_eq!(grid[3], 1000.0); // row 1, col 0
/// ```
pub fn create_test_grid(rows: usize, cols: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            data.push((row * 1000 + col) as f64);
        }
    }
    data
}
