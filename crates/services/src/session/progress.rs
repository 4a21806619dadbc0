/// Aggregated view of session progress, useful for the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    /// Questions in the original set.
    pub total: usize,
    /// Questions with a recorded answer, counted over the original set.
    pub answered: usize,
    /// Zero-based position within the filtered view.
    pub position: usize,
    /// Questions in the filtered view.
    pub filtered_total: usize,
    pub is_complete: bool,
    pub is_submitted: bool,
}
