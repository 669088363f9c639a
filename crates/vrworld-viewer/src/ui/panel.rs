use std::collections::BTreeMap;

/// Input-target bookkeeping for the settings panel: which hand controllers
/// can drive it and whether each is currently pressing.
#[derive(Debug, Default, Clone)]
pub struct ControlPanel {
    targets: BTreeMap<u32, bool>,
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a controller. Re-registering keeps its pressed state.
    pub fn register(&mut self, id: u32) {
        self.targets.entry(id).or_insert(false);
    }

    /// Returns whether the controller was registered.
    pub fn unregister(&mut self, id: u32) -> bool {
        self.targets.remove(&id).is_some()
    }

    /// Sets the pressed state of a registered controller. Unknown ids are
    /// ignored and reported as `false`.
    pub fn pressed(&mut self, id: u32, down: bool) -> bool {
        match self.targets.get_mut(&id) {
            Some(state) => {
                *state = down;
                true
            }
            None => false,
        }
    }

    pub fn is_pressed(&self, id: u32) -> bool {
        self.targets.get(&id).copied().unwrap_or(false)
    }

    pub fn targets(&self) -> impl Iterator<Item = (u32, bool)> + '_ {
        self.targets.iter().map(|(id, down)| (*id, *down))
    }

    #[inline]
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_press_unregister() {
        let mut panel = ControlPanel::new();
        panel.register(7);
        assert!(panel.pressed(7, true));
        assert!(panel.is_pressed(7));
        panel.register(7);
        assert!(panel.is_pressed(7));
        assert!(panel.unregister(7));
        assert!(!panel.unregister(7));
        assert_eq!(panel.target_count(), 0);
    }

    #[test]
    fn unknown_target_is_ignored() {
        let mut panel = ControlPanel::new();
        assert!(!panel.pressed(3, true));
        assert!(!panel.is_pressed(3));
    }
}
