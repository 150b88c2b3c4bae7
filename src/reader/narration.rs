//! Paragraph narration bookkeeping: which paragraph owns the narration
//! slot, whether its audio is still loading, and how far it has played.

/// Characters of a paragraph counted as already read.
///
/// The boundary is proportional to character count, not time per
/// character: `floor(len * progress)`.
///
/// ```rust
/// use smartread::reader::read_boundary;
///
/// assert_eq!(read_boundary("荷塘月色", 0.5), 2);
/// assert_eq!(read_boundary("a", 1.0), 1);
/// assert_eq!(read_boundary("a", 0.0), 0);
/// ```
pub fn read_boundary(text: &str, progress: f64) -> usize {
    let len = text.chars().count();
    let progress = progress.clamp(0.0, 1.0);
    ((len as f64) * progress).floor() as usize
}

#[derive(Debug, Clone, Default)]
pub struct Narration {
    generation: u64,
    active: Option<usize>,
    loading: bool,
    progress: f64,
}

impl Narration {
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Hand the slot to `index` and return the generation its speech
    /// request must carry.
    pub(crate) fn activate(&mut self, index: usize) -> u64 {
        self.generation += 1;
        self.active = Some(index);
        self.loading = true;
        self.progress = 0.0;
        self.generation
    }

    pub(crate) fn loaded(&mut self) {
        self.loading = false;
    }

    pub(crate) fn set_progress(&mut self, progress: f64) {
        self.progress = progress.clamp(0.0, 1.0);
    }

    /// Drop the active paragraph; any in-flight request becomes stale.
    pub(crate) fn clear(&mut self) {
        self.generation += 1;
        self.active = None;
        self.loading = false;
        self.progress = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_round_trip() {
        let paragraphs = ["a", "b"];
        assert_eq!(read_boundary(paragraphs[0], 1.0), "a".len());
        assert_eq!(read_boundary(paragraphs[0], 0.0), 0);
    }

    #[test]
    fn boundary_clamps_out_of_range_progress() {
        assert_eq!(read_boundary("荷塘", 1.7), 2);
        assert_eq!(read_boundary("荷塘", -0.2), 0);
    }

    #[test]
    fn activation_bumps_generation() {
        let mut n = Narration::default();
        let first = n.activate(0);
        n.set_progress(0.5);
        let second = n.activate(1);

        assert_ne!(first, second);
        assert_eq!(n.active(), Some(1));
        assert_eq!(n.progress(), 0.0);
        assert!(n.is_loading());

        n.clear();
        assert_eq!(n.active(), None);
        assert_ne!(n.generation(), second);
    }
}
