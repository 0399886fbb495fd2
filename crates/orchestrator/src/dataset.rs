//! Per-option load state machine.
//!
//! `Created -> AwaitingOrigin -> Loading -> Complete`. The energy table (when
//! present) is the only load submitted before the local origin is known; it
//! is joined with the city model, whose origin then places every other
//! layer. A dataset never talks to the loader itself: each transition
//! returns the requests to submit, so completions can be fed in any order.

use std::collections::BTreeSet;
use std::sync::Arc;

use foundation::math::{LocalFrame, Vec2};
use foundation::{LayerKind, ResourceKey, ResourceSlot};
use formats::{CityModel, OptionSpec, Table};
use layers::{
    BuiltLayer, build_building_option, build_buildings, build_noise, build_radiation, build_wind,
    build_wind_geometry, cell_topology_digest,
};
use runtime::{EventBus, LoadEvent};
use scene::{DatasetVisuals, Renderer};
use streaming::{LoadCompletion, LoadRequest, LoadedResource, Payload, ResourceFormat};
use tracing::{debug, warn};

use crate::wind_cache::{WindCacheKey, WindGeometryCache};

/// Slots that need the local origin before they can be submitted.
const SPATIAL_SLOTS: [ResourceSlot; 5] = [
    ResourceSlot::BuildingOption,
    ResourceSlot::Noise,
    ResourceSlot::Radiation,
    ResourceSlot::WindCells,
    ResourceSlot::WindNodes,
];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DatasetState {
    Created,
    AwaitingOrigin,
    Loading,
    Complete,
}

/// What the owner must do after a transition.
#[derive(Debug, Default)]
pub struct Step {
    pub requests: Vec<LoadRequest>,
    /// Set exactly once per dataset, on the transition into `Complete`.
    pub completed: bool,
}

#[derive(Debug)]
struct WindTable {
    table: Table,
    digest: String,
}

#[derive(Debug, Default)]
struct WindInputs {
    cells: Option<WindTable>,
    nodes: Option<WindTable>,
    failed: bool,
}

#[derive(Debug)]
pub struct Dataset {
    spec: OptionSpec,
    city: Option<Arc<CityModel>>,
    state: DatasetState,
    pending: BTreeSet<ResourceSlot>,
    frame: Option<LocalFrame>,
    visuals: DatasetVisuals,
    wind: WindInputs,
}

impl Dataset {
    /// Wraps one manifest option. Paths that cannot be honoured are dropped
    /// here: energy without a city model, and wind with only one table.
    pub fn new(mut spec: OptionSpec, city: Option<Arc<CityModel>>) -> Self {
        if city.is_none() && spec.energy_path.is_some() {
            warn!(dataset = %spec.name, "energy data needs a city model, skipping it");
            spec.remove_layer(LayerKind::Energy);
        }
        if spec.wind_surface_cell_path.is_some() != spec.wind_surface_nodes_path.is_some() {
            warn!(dataset = %spec.name, "wind needs both cell and node tables, skipping it");
            spec.remove_layer(LayerKind::Wind);
        }
        let visuals = DatasetVisuals::new(spec.name.clone());
        Self {
            spec,
            city,
            state: DatasetState::Created,
            pending: BTreeSet::new(),
            frame: None,
            visuals,
            wind: WindInputs::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &OptionSpec {
        &self.spec
    }

    pub fn state(&self) -> DatasetState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == DatasetState::Complete
    }

    pub fn pending(&self) -> impl Iterator<Item = ResourceSlot> + '_ {
        self.pending.iter().copied()
    }

    pub fn is_pending(&self, slot: ResourceSlot) -> bool {
        self.pending.contains(&slot)
    }

    /// Local frame, once resolved.
    pub fn frame(&self) -> Option<LocalFrame> {
        self.frame
    }

    pub fn visuals(&self) -> &DatasetVisuals {
        &self.visuals
    }

    pub fn visuals_mut(&mut self) -> &mut DatasetVisuals {
        &mut self.visuals
    }

    fn request(&self, slot: ResourceSlot) -> Option<LoadRequest> {
        let path = self.spec.path(slot)?;
        let format = match slot {
            ResourceSlot::BuildingOption => ResourceFormat::Stl,
            ResourceSlot::Noise => ResourceFormat::Table { has_header: false },
            ResourceSlot::CityModel => ResourceFormat::CityModel,
            _ => ResourceFormat::Table { has_header: true },
        };
        Some(LoadRequest::new(
            ResourceKey::new(self.spec.name.clone(), slot),
            path,
            format,
        ))
    }

    /// Registers every present resource as pending and returns the first
    /// batch of requests. Only acts in `Created`.
    pub fn start(&mut self, events: &mut EventBus) -> Step {
        if self.state != DatasetState::Created {
            return Step::default();
        }
        for layer in LayerKind::ALL {
            if !self.spec.has_layer(layer) {
                events.emit(LoadEvent::LayerMissing {
                    dataset: self.spec.name.clone(),
                    layer,
                });
            }
        }
        self.pending = LayerKind::ALL
            .iter()
            .flat_map(|layer| layer.slots())
            .copied()
            .filter(|slot| self.spec.path(*slot).is_some())
            .collect();

        if let Some(request) = self.request(ResourceSlot::EnergyTable) {
            self.state = DatasetState::AwaitingOrigin;
            return Step {
                requests: vec![request],
                completed: false,
            };
        }

        let frame = match &self.city {
            Some(city) => LocalFrame::new(Vec2::new(city.origin.x, city.origin.y)),
            None => LocalFrame::fallback(),
        };
        self.resolve_origin(frame, events)
    }

    fn resolve_origin(&mut self, frame: LocalFrame, events: &mut EventBus) -> Step {
        debug!(dataset = %self.spec.name, x = frame.origin.x, y = frame.origin.y, "origin resolved");
        self.frame = Some(frame);
        self.state = DatasetState::Loading;
        let requests = SPATIAL_SLOTS
            .iter()
            .filter_map(|slot| self.request(*slot))
            .collect();
        Step {
            requests,
            completed: self.check_complete(events),
        }
    }

    fn check_complete(&mut self, events: &mut EventBus) -> bool {
        if self.state != DatasetState::Loading || !self.pending.is_empty() {
            return false;
        }
        self.state = DatasetState::Complete;
        events.emit(LoadEvent::DatasetComplete {
            dataset: self.spec.name.clone(),
        });
        true
    }

    /// Resolves one pending slot. Completions for slots that are not
    /// pending (duplicates, other datasets) are ignored.
    pub fn on_completion(
        &mut self,
        completion: LoadCompletion,
        renderer: &mut dyn Renderer,
        wind_cache: &mut WindGeometryCache,
        events: &mut EventBus,
    ) -> Step {
        let LoadCompletion {
            key,
            source,
            result,
        } = completion;
        let slot = key.slot;
        if key.dataset != self.spec.name || !self.pending.remove(&slot) {
            warn!(dataset = %self.spec.name, %key, "ignoring completion that is not pending");
            return Step::default();
        }

        let resource = match result {
            Ok(resource) => {
                events.emit(LoadEvent::ResourceLoaded {
                    dataset: self.spec.name.clone(),
                    slot,
                    source,
                });
                Some(resource)
            }
            Err(e) => {
                events.emit(LoadEvent::ResourceFailed {
                    dataset: self.spec.name.clone(),
                    slot,
                    source,
                    message: e.to_string(),
                });
                None
            }
        };

        if slot == ResourceSlot::EnergyTable {
            return self.on_energy(resource, renderer, events);
        }

        match (slot, self.frame) {
            (ResourceSlot::WindCells | ResourceSlot::WindNodes, Some(frame)) => {
                self.on_wind_table(slot, resource, frame, renderer, wind_cache)
            }
            (_, Some(frame)) => {
                if let Some(built) = self.build(slot, resource, &frame) {
                    self.install(built, renderer);
                }
            }
            (_, None) => warn!(dataset = %self.spec.name, %slot, "completion before origin"),
        }

        Step {
            requests: Vec::new(),
            completed: self.check_complete(events),
        }
    }

    fn on_energy(
        &mut self,
        resource: Option<LoadedResource>,
        renderer: &mut dyn Renderer,
        events: &mut EventBus,
    ) -> Step {
        let table = resource.and_then(|r| self.expect_table(ResourceSlot::EnergyTable, r));
        let frame = match self.city.clone() {
            Some(city) => {
                // A failed table still yields uncolored buildings.
                let built = build_buildings(&city, table.as_ref().map(|t| &t.table));
                self.install(built, renderer);
                LocalFrame::new(Vec2::new(city.origin.x, city.origin.y))
            }
            None => LocalFrame::fallback(),
        };
        self.resolve_origin(frame, events)
    }

    fn build(
        &self,
        slot: ResourceSlot,
        resource: Option<LoadedResource>,
        frame: &LocalFrame,
    ) -> Option<BuiltLayer> {
        let resource = resource?;
        match slot {
            ResourceSlot::BuildingOption => match resource.payload {
                Payload::Mesh(mesh) => Some(build_building_option(&mesh, frame)),
                _ => {
                    warn!(dataset = %self.spec.name, %slot, "expected a mesh");
                    None
                }
            },
            ResourceSlot::Noise => self
                .expect_table(slot, resource)
                .map(|t| build_noise(&t.table, frame)),
            ResourceSlot::Radiation => self
                .expect_table(slot, resource)
                .map(|t| build_radiation(&t.table, frame)),
            _ => None,
        }
    }

    fn expect_table(&self, slot: ResourceSlot, resource: LoadedResource) -> Option<WindTable> {
        match resource.payload {
            Payload::Table(table) => Some(WindTable {
                table,
                digest: resource.digest,
            }),
            _ => {
                warn!(dataset = %self.spec.name, %slot, "expected a table");
                None
            }
        }
    }

    /// Whichever wind table arrives second triggers the join.
    fn on_wind_table(
        &mut self,
        slot: ResourceSlot,
        resource: Option<LoadedResource>,
        frame: LocalFrame,
        renderer: &mut dyn Renderer,
        wind_cache: &mut WindGeometryCache,
    ) {
        match resource.and_then(|r| self.expect_table(slot, r)) {
            Some(table) if slot == ResourceSlot::WindCells => self.wind.cells = Some(table),
            Some(table) => self.wind.nodes = Some(table),
            None => self.wind.failed = true,
        }
        if self.wind.failed {
            if !self.is_pending(ResourceSlot::WindCells) && !self.is_pending(ResourceSlot::WindNodes)
            {
                debug!(dataset = %self.spec.name, "wind layer skipped after a failed table");
                self.wind = WindInputs {
                    failed: true,
                    ..WindInputs::default()
                };
            }
            return;
        }

        let built = {
            let (Some(cells), Some(nodes)) = (&self.wind.cells, &self.wind.nodes) else {
                return;
            };
            let key = WindCacheKey::new(
                nodes.digest.clone(),
                cell_topology_digest(&cells.table),
                &frame,
            );
            let geometry = wind_cache.get_or_build(key, || {
                build_wind_geometry(&cells.table, &nodes.table, &frame)
            });
            build_wind(&geometry, &cells.table)
        };
        self.wind = WindInputs::default();
        self.install(built, renderer);
    }

    fn install(&mut self, built: BuiltLayer, renderer: &mut dyn Renderer) {
        let layer = built.layer();
        if let Err(e) = self.visuals.install(built.object, built.legend, renderer) {
            warn!(dataset = %self.spec.name, %layer, "{e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{Dataset, DatasetState};
    use crate::wind_cache::WindGeometryCache;
    use foundation::math::Vec2;
    use foundation::{LayerKind, ResourceKey, ResourceSlot};
    use formats::{CityModel, OptionSpec};
    use pretty_assertions::assert_eq;
    use runtime::{EventBus, LoadEvent};
    use scene::{Geometry, HeadlessRenderer};
    use streaming::{LoadCompletion, LoadError, ResourceFormat, decode};

    const STL: &str = "solid m\nfacet normal 0 0 1\nouter loop\nvertex 319189 6396991 0\nvertex 319190 6396991 0\nvertex 319189 6396992 4\nendloop\nendfacet\nendsolid m\n";
    const NODES: &str = "x,y,z\n319189,6396991,1\n319199,6396991,1\n319189,6397001,2\n319199,6397001,2\n";
    const CELLS: &str = "node 1,node 2,node 3,Lawson LDDC\n0,1,2,0\n1,3,2,4\n";
    const CITY: &str = r#"{"Origin":{"x":1000,"y":2000},"Buildings":[
        {"UUID":"b1","Footprint":[{"x":0,"y":0},{"x":5,"y":0},{"x":5,"y":5}],"Height":10}]}"#;

    fn full_spec(name: &str) -> OptionSpec {
        OptionSpec {
            building_option_path: Some("massing.stl".into()),
            noise_path: Some("noise.csv".into()),
            radiation_path: Some("radiation.csv".into()),
            wind_surface_cell_path: Some("cells.csv".into()),
            wind_surface_nodes_path: Some("nodes.csv".into()),
            ..OptionSpec::new(name)
        }
    }

    fn completion(dataset: &str, slot: ResourceSlot) -> LoadCompletion {
        let (body, format) = match slot {
            ResourceSlot::BuildingOption => (STL, ResourceFormat::Stl),
            ResourceSlot::Noise => ("319189,6396991,50\n319190,6396992,70\n", ResourceFormat::Table { has_header: false }),
            ResourceSlot::Radiation => ("x,y,value\n319189,6396991,800\n", ResourceFormat::Table { has_header: true }),
            ResourceSlot::WindCells => (CELLS, ResourceFormat::Table { has_header: true }),
            ResourceSlot::WindNodes => (NODES, ResourceFormat::Table { has_header: true }),
            ResourceSlot::EnergyTable => ("ID,Total\nb1,42\n", ResourceFormat::Table { has_header: true }),
            ResourceSlot::CityModel => (CITY, ResourceFormat::CityModel),
        };
        let source = format!("{slot}.src");
        LoadCompletion {
            key: ResourceKey::new(dataset, slot),
            result: decode(body.as_bytes(), format).map_err(|reason| LoadError::Decode {
                source: source.clone(),
                reason,
            }),
            source,
        }
    }

    fn failed(dataset: &str, slot: ResourceSlot) -> LoadCompletion {
        LoadCompletion {
            key: ResourceKey::new(dataset, slot),
            source: format!("{slot}.src"),
            result: Err(LoadError::Decode {
                source: format!("{slot}.src"),
                reason: "boom".into(),
            }),
        }
    }

    fn permutations(items: &[ResourceSlot]) -> Vec<Vec<ResourceSlot>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, head);
                out.push(tail);
            }
        }
        out
    }

    fn city() -> Arc<CityModel> {
        Arc::new(CityModel::from_json_str(CITY).unwrap())
    }

    #[test]
    fn completes_exactly_once_under_any_interleaving() {
        let slots = [
            ResourceSlot::BuildingOption,
            ResourceSlot::Noise,
            ResourceSlot::Radiation,
            ResourceSlot::WindCells,
            ResourceSlot::WindNodes,
        ];
        let mut wind_colors = None;
        for order in permutations(&slots) {
            let mut renderer = HeadlessRenderer::new();
            let mut cache = WindGeometryCache::new();
            let mut events = EventBus::new();
            let mut dataset = Dataset::new(full_spec("A"), None);

            let step = dataset.start(&mut events);
            assert_eq!(step.requests.len(), 5);
            assert!(!step.completed);

            let mut completions = 0;
            for slot in &order {
                let step = dataset.on_completion(
                    completion("A", *slot),
                    &mut renderer,
                    &mut cache,
                    &mut events,
                );
                completions += usize::from(step.completed);
            }
            // A late duplicate must not complete the dataset again.
            let step = dataset.on_completion(
                completion("A", order[0]),
                &mut renderer,
                &mut cache,
                &mut events,
            );
            completions += usize::from(step.completed);

            assert_eq!(completions, 1, "{order:?}");
            assert_eq!(
                events.count_matching(|e| matches!(e, LoadEvent::DatasetComplete { .. })),
                1
            );
            assert!(dataset.is_complete());
            assert_eq!(dataset.visuals().objects().len(), 4);

            let Geometry::Mesh { colors, .. } =
                &dataset.visuals().object(LayerKind::Wind).unwrap().geometry
            else {
                panic!("wind is a mesh");
            };
            match &wind_colors {
                None => wind_colors = Some(colors.clone()),
                Some(first) => assert_eq!(first, colors, "{order:?}"),
            }
        }
    }

    #[test]
    fn absent_paths_are_never_pending() {
        let mut events = EventBus::new();
        let spec = OptionSpec {
            noise_path: Some("noise.csv".into()),
            ..OptionSpec::new("B")
        };
        let mut dataset = Dataset::new(spec, None);
        let step = dataset.start(&mut events);

        assert_eq!(dataset.pending().collect::<Vec<_>>(), vec![ResourceSlot::Noise]);
        assert_eq!(step.requests.len(), 1);
        assert_eq!(
            events.count_matching(|e| matches!(e, LoadEvent::LayerMissing { .. })),
            4
        );

        let mut renderer = HeadlessRenderer::new();
        let step = dataset.on_completion(
            completion("B", ResourceSlot::Noise),
            &mut renderer,
            &mut WindGeometryCache::new(),
            &mut events,
        );
        assert!(step.completed);
        let layers: Vec<_> = dataset.visuals().objects().layers().collect();
        assert_eq!(layers, vec![LayerKind::Noise]);
    }

    #[test]
    fn empty_option_completes_at_start() {
        let mut events = EventBus::new();
        let mut dataset = Dataset::new(OptionSpec::new("Empty"), None);
        let step = dataset.start(&mut events);
        assert!(step.completed);
        assert!(step.requests.is_empty());
        assert!(!dataset.start(&mut events).completed);
    }

    #[test]
    fn energy_resolves_origin_before_spatial_loads() {
        let mut events = EventBus::new();
        let spec = OptionSpec {
            energy_path: Some("energy.csv".into()),
            noise_path: Some("noise.csv".into()),
            ..OptionSpec::new("E")
        };
        let mut dataset = Dataset::new(spec, Some(city()));
        let step = dataset.start(&mut events);

        assert_eq!(dataset.state(), DatasetState::AwaitingOrigin);
        assert_eq!(step.requests.len(), 1);
        assert_eq!(step.requests[0].key.slot, ResourceSlot::EnergyTable);
        assert!(dataset.is_pending(ResourceSlot::Noise));
        assert!(dataset.frame().is_none());

        let mut renderer = HeadlessRenderer::new();
        let mut cache = WindGeometryCache::new();
        let step = dataset.on_completion(
            completion("E", ResourceSlot::EnergyTable),
            &mut renderer,
            &mut cache,
            &mut events,
        );
        assert_eq!(dataset.state(), DatasetState::Loading);
        assert_eq!(dataset.frame().unwrap().origin, Vec2::new(1000.0, 2000.0));
        assert_eq!(step.requests.len(), 1);
        assert_eq!(step.requests[0].key.slot, ResourceSlot::Noise);
        assert!(dataset.visuals().legend(LayerKind::Energy).is_some());

        let step = dataset.on_completion(
            completion("E", ResourceSlot::Noise),
            &mut renderer,
            &mut cache,
            &mut events,
        );
        assert!(step.completed);
    }

    #[test]
    fn failed_energy_still_builds_uncolored_buildings() {
        let mut events = EventBus::new();
        let spec = OptionSpec {
            energy_path: Some("energy.csv".into()),
            ..OptionSpec::new("E")
        };
        let mut dataset = Dataset::new(spec, Some(city()));
        dataset.start(&mut events);

        let step = dataset.on_completion(
            failed("E", ResourceSlot::EnergyTable),
            &mut HeadlessRenderer::new(),
            &mut WindGeometryCache::new(),
            &mut events,
        );
        assert!(step.completed);
        assert!(dataset.visuals().has_layer(LayerKind::Energy));
        assert!(dataset.visuals().legend(LayerKind::Energy).is_none());
        assert!(events.loading_log().iter().any(|l| l.contains("failed")));
    }

    #[test]
    fn energy_without_city_model_is_absent() {
        let mut events = EventBus::new();
        let spec = OptionSpec {
            energy_path: Some("energy.csv".into()),
            noise_path: Some("noise.csv".into()),
            ..OptionSpec::new("E")
        };
        let mut dataset = Dataset::new(spec, None);
        let step = dataset.start(&mut events);
        assert_eq!(dataset.state(), DatasetState::Loading);
        assert!(!dataset.is_pending(ResourceSlot::EnergyTable));
        assert_eq!(step.requests[0].key.slot, ResourceSlot::Noise);
    }

    #[test]
    fn wind_with_one_table_is_absent() {
        let mut events = EventBus::new();
        let spec = OptionSpec {
            wind_surface_cell_path: Some("cells.csv".into()),
            ..OptionSpec::new("W")
        };
        let mut dataset = Dataset::new(spec, None);
        assert!(dataset.start(&mut events).completed);
        assert!(!dataset.is_pending(ResourceSlot::WindCells));
    }

    #[test]
    fn failed_wind_table_leaves_layer_empty_but_completes() {
        let mut events = EventBus::new();
        let spec = OptionSpec {
            wind_surface_cell_path: Some("cells.csv".into()),
            wind_surface_nodes_path: Some("nodes.csv".into()),
            ..OptionSpec::new("W")
        };
        let mut dataset = Dataset::new(spec, None);
        dataset.start(&mut events);
        let mut renderer = HeadlessRenderer::new();
        let mut cache = WindGeometryCache::new();

        let first = dataset.on_completion(
            failed("W", ResourceSlot::WindNodes),
            &mut renderer,
            &mut cache,
            &mut events,
        );
        assert!(!first.completed);
        let second = dataset.on_completion(
            completion("W", ResourceSlot::WindCells),
            &mut renderer,
            &mut cache,
            &mut events,
        );
        assert!(second.completed);
        assert!(!dataset.visuals().has_layer(LayerKind::Wind));
        assert!(cache.is_empty());
    }
}
