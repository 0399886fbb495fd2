use std::collections::HashMap;
use std::sync::Arc;

use foundation::math::LocalFrame;
use layers::WindGeometry;
use tracing::debug;

/// Identifies one wind surface: node positions, cell connectivity and the
/// frame it was placed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindCacheKey {
    nodes: String,
    topology: String,
    origin: [u64; 2],
}

impl WindCacheKey {
    pub fn new(
        nodes_digest: impl Into<String>,
        topology_digest: impl Into<String>,
        frame: &LocalFrame,
    ) -> Self {
        Self {
            nodes: nodes_digest.into(),
            topology: topology_digest.into(),
            origin: [frame.origin.x.to_bits(), frame.origin.y.to_bits()],
        }
    }
}

/// Session-wide wind geometry shared across options.
///
/// Options that differ only in Lawson categories reuse the triangles and
/// recompute colors.
#[derive(Debug, Default)]
pub struct WindGeometryCache {
    entries: HashMap<WindCacheKey, Arc<WindGeometry>>,
    hits: u64,
    misses: u64,
}

impl WindGeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(
        &mut self,
        key: WindCacheKey,
        build: impl FnOnce() -> WindGeometry,
    ) -> Arc<WindGeometry> {
        if let Some(geometry) = self.entries.get(&key) {
            self.hits += 1;
            debug!(triangles = geometry.triangle_count(), "wind geometry reused");
            return Arc::clone(geometry);
        }
        self.misses += 1;
        let geometry = Arc::new(build());
        self.entries.insert(key, Arc::clone(&geometry));
        geometry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
