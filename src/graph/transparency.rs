/// Back-to-front ordering for alpha-blended drawables.
///
/// Blended geometry must be drawn farthest-first or closer surfaces get
/// overwritten by farther ones. Opaque geometry never goes through here.

use glam::Vec3;

use crate::scene::DrawItem;

/// Sort items by descending squared distance from the camera position.
///
/// Squared distance preserves ordering and skips the square root. The sort
/// is unstable: items at equal distance may swap between frames, which is
/// harmless for blending.
pub fn sort_back_to_front(items: &mut [DrawItem], camera_position: Vec3) {
    items.sort_unstable_by(|a, b| {
        let da = a.position.distance_squared(camera_position);
        let db = b.position.distance_squared(camera_position);
        db.total_cmp(&da)
    });
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "transparency_tests.rs"]
mod tests;
