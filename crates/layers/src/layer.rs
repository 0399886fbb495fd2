use foundation::LayerKind;
use scene::{Legend, VisualObject};

/// Output of one layer builder: the object and its optional legend.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltLayer {
    pub object: VisualObject,
    pub legend: Option<Legend>,
}

impl BuiltLayer {
    pub fn new(object: VisualObject, legend: Option<Legend>) -> Self {
        Self { object, legend }
    }

    pub fn layer(&self) -> LayerKind {
        self.object.layer
    }
}
