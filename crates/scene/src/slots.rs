use foundation::LayerKind;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SlotError {
    /// The layer already holds a value; slots are written once.
    AlreadyFilled(LayerKind),
}

impl std::fmt::Display for SlotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotError::AlreadyFilled(layer) => write!(f, "{layer} slot is already filled"),
        }
    }
}

impl std::error::Error for SlotError {}

/// Write-once storage with one slot per [`LayerKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSlots<T> {
    slots: [Option<T>; LayerKind::COUNT],
}

impl<T> Default for LayerSlots<T> {
    fn default() -> Self {
        Self {
            slots: [const { None }; LayerKind::COUNT],
        }
    }
}

impl<T> LayerSlots<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, layer: LayerKind, value: T) -> Result<(), SlotError> {
        let slot = &mut self.slots[layer.index()];
        if slot.is_some() {
            return Err(SlotError::AlreadyFilled(layer));
        }
        *slot = Some(value);
        Ok(())
    }

    pub fn get(&self, layer: LayerKind) -> Option<&T> {
        self.slots[layer.index()].as_ref()
    }

    pub fn get_mut(&mut self, layer: LayerKind) -> Option<&mut T> {
        self.slots[layer.index()].as_mut()
    }

    pub fn contains(&self, layer: LayerKind) -> bool {
        self.slots[layer.index()].is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Filled layers in [`LayerKind::ALL`] order.
    pub fn layers(&self) -> impl Iterator<Item = LayerKind> + '_ {
        LayerKind::ALL.into_iter().filter(|l| self.contains(*l))
    }

    pub fn iter(&self) -> impl Iterator<Item = (LayerKind, &T)> {
        LayerKind::ALL
            .into_iter()
            .zip(self.slots.iter())
            .filter_map(|(layer, slot)| slot.as_ref().map(|v| (layer, v)))
    }
}
