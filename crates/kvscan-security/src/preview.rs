/// Characters kept by [`preview`]
pub const PREVIEW_LEN: usize = 50;

/// Truncate a value for display, appending `...` when cut.
///
/// This is a display convenience. Short secrets stay fully visible.
pub fn preview(value: &str) -> String {
    if value.chars().count() > PREVIEW_LEN {
        let head: String = value.chars().take(PREVIEW_LEN).collect();
        format!("{}...", head)
    } else {
        value.to_string()
    }
}
