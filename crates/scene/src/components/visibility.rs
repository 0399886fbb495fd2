/// Shown/hidden flag carried per layer object.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Visibility {
    pub visible: bool,
}

impl Visibility {
    pub fn visible() -> Self {
        Self { visible: true }
    }

    pub fn hidden() -> Self {
        Self { visible: false }
    }

    /// Sets the flag, returning whether it changed.
    pub fn set(&mut self, visible: bool) -> bool {
        let changed = self.visible != visible;
        self.visible = visible;
        changed
    }
}
