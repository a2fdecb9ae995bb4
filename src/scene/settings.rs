use glam::Vec4;

/// Frame-level tunables read while recording and when filling the
/// per-viewport environment buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub clear_color: Vec4,
    pub gamma: f32,
    pub exposure: f32,
    /// MSAA sample count for scene targets; 1 disables resolve attachments
    pub sample_count: u32,
    pub line_width: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            gamma: 2.2,
            exposure: 1.0,
            sample_count: 1,
            line_width: 1.0,
        }
    }
}
