/// Viewport packing: tile N camera viewports into a target rectangle.
///
/// The grid is chosen so tiles stay close to the target's aspect ratio:
/// for a landscape target the row count is the rounded square root of
/// `count / aspect`, columns fill up from there. Portrait targets swap the
/// roles. Remainder pixels go to the last tile of each row so the grid
/// always covers the full width.

use crate::device::{Rect2D, ViewportRect};

/// Grid shape for `count` tiles in a `width` x `height` rectangle
pub fn grid_dimensions(width: f32, height: f32, count: usize) -> (usize, usize) {
    if count == 0 {
        return (0, 0);
    }
    let n = count as f32;
    if width > height {
        let rows = ((n / (width / height)).sqrt().round() as usize).max(1);
        let cols = count.div_ceil(rows);
        (rows, cols)
    } else {
        let cols = ((n / (height / width)).sqrt().round() as usize).max(1);
        let rows = count.div_ceil(cols);
        (rows, cols)
    }
}

/// Pack `count` viewports into the rectangle, row-major
pub fn pack(width: f32, height: f32, count: usize) -> Vec<ViewportRect> {
    let (rows, cols) = grid_dimensions(width, height, count);
    if rows == 0 {
        return Vec::new();
    }

    let tile_width = width / cols as f32;
    let tile_height = height / rows as f32;

    let mut tiles = Vec::with_capacity(count);
    for j in 0..count {
        let row = j / cols;
        let col = j % cols;
        let x = col as f32 * tile_width;
        let y = row as f32 * tile_height;
        // Last tile of the row absorbs the remainder out to the right edge
        let last_in_row = col == cols - 1 || j == count - 1;
        let w = if last_in_row { width - x } else { tile_width };
        tiles.push(ViewportRect {
            x,
            y,
            width: w,
            height: tile_height,
            ..ViewportRect::default()
        });
    }
    tiles
}

/// Integer scissor covering a packed viewport
pub fn scissor_for(viewport: &ViewportRect) -> Rect2D {
    Rect2D {
        x: viewport.x as i32,
        y: viewport.y as i32,
        width: viewport.width as u32,
        height: viewport.height as u32,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "viewport_packer_tests.rs"]
mod tests;
