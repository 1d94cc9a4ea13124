use super::centerline::parse_linestring;
use super::envelope::{build_corridor, simplify_polyline};
use super::ports::SceneGateway;
use super::scene::{EntityGeometry, EntityId, Material, NewEntity, PathTag};
use super::types::{ComputedPath, LonLat};
use crate::common::TurnPathError;
use crate::domains::logger::DynLogger;
use std::collections::BTreeMap;

/// Tuning for how a computed path is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub corridor_tightening: f64,
    pub simplify_epsilon_deg: f64,
    pub simplify_min_distance_m: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            corridor_tightening: 1.0,
            simplify_epsilon_deg: 1e-9,
            simplify_min_distance_m: 0.05,
        }
    }
}

/// What ended up on the map for one computed path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderReport {
    pub corridor: Option<EntityId>,
    pub corridor_derived: bool,
    pub centerline: Option<EntityId>,
    pub markers: usize,
    pub intersection_highlighted: bool,
    pub skipped: Vec<String>,
}

impl RenderReport {
    pub fn entity_count(&self) -> usize {
        self.corridor.is_some() as usize + self.centerline.is_some() as usize + self.markers
    }
}

/// Sole owner of the entities that depict the current computed path.
pub struct RenderedPathRegistry {
    tracked: BTreeMap<PathTag, EntityId>,
    // Extra copies of a tag found on attach.
    orphans: Vec<EntityId>,
    intersection_highlight: Option<(EntityId, Material)>,
    settings: RenderSettings,
    logger: DynLogger,
}

impl RenderedPathRegistry {
    pub fn new(settings: RenderSettings, logger: DynLogger) -> Self {
        Self {
            tracked: BTreeMap::new(),
            orphans: Vec::new(),
            intersection_highlight: None,
            settings,
            logger,
        }
    }

    /// Creates a registry for `scene`, taking ownership of tagged entities a
    /// previous registry left behind.
    pub fn attach(scene: &dyn SceneGateway, settings: RenderSettings, logger: DynLogger) -> Self {
        let mut registry = Self::new(settings, logger);
        let mut orphans = Vec::new();
        for (id, tag) in scene.tagged_entities() {
            if let Some(previous) = registry.tracked.insert(tag, id) {
                orphans.push(previous);
            }
        }
        registry.orphans = orphans;
        if !registry.tracked.is_empty() {
            registry.logger.warn(&format!(
                "adopted {} turn-path entities left in the scene",
                registry.tracked.len() + registry.orphans.len()
            ));
        }
        registry
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len() + self.orphans.len()
    }

    pub fn tracked_ids(&self) -> Vec<EntityId> {
        self.tracked.values().chain(self.orphans.iter()).copied().collect()
    }

    pub fn has_intersection_highlight(&self) -> bool {
        self.intersection_highlight.is_some()
    }

    /// Removes every tracked entity and restores the intersection material. Idempotent.
    pub fn clear(&mut self, scene: &mut dyn SceneGateway) {
        let ids: Vec<EntityId> = self.tracked_ids();
        self.tracked.clear();
        self.orphans.clear();
        for id in ids {
            if !scene.remove_entity(id) {
                self.logger.warn(&format!("turn-path entity {} was already gone", id));
            }
        }
        if let Some((id, original)) = self.intersection_highlight.take() {
            if !scene.set_material(id, original) {
                self.logger.warn(&format!("intersection {} vanished before its material was restored", id));
            }
        }
    }

    /// Replaces whatever is drawn with `path`.
    pub fn render(&mut self, scene: &mut dyn SceneGateway, path: &ComputedPath) -> RenderReport {
        self.clear(scene);
        let mut report = RenderReport::default();

        let centerline = match path.path.centerline.as_ref().map(|c| parse_linestring(&c.wkt)) {
            Some(Ok(points)) => Some(simplify_polyline(
                &points,
                self.settings.simplify_epsilon_deg,
                self.settings.simplify_min_distance_m,
            )),
            Some(Err(e)) => {
                self.skip(&mut report, "centerline", &e);
                None
            }
            None => None,
        };

        let ring = match (&path.path.polygon, &centerline) {
            (Some(polygon), _) => Some(polygon.clone()),
            (None, Some(points)) => match build_corridor(
                points,
                path.clearance.vehicle_width_with_buffer_m,
                self.settings.corridor_tightening,
            ) {
                Ok(corridor) => {
                    report.corridor_derived = true;
                    Some(corridor.ring())
                }
                Err(e) => {
                    self.skip(&mut report, "corridor", &e);
                    None
                }
            },
            (None, None) => {
                let err = TurnPathError::geometry("response carries neither polygon nor centerline");
                self.skip(&mut report, "corridor", &err);
                None
            }
        };

        let label = format!("Turn path via {}", path.intersection.name);
        if let Some(ring) = ring {
            report.corridor = Some(self.add(scene, PathTag::Corridor, &label, Material::corridor(), EntityGeometry::Polygon(ring)));
        }
        if let Some(points) = centerline {
            let (start, end) = (points[0], points[points.len() - 1]);
            report.centerline = Some(self.add(scene, PathTag::Centerline, &label, Material::centerline(), EntityGeometry::Polyline(points)));
            self.add_marker(scene, PathTag::StartMarker, "Turn start", start);
            self.add_marker(scene, PathTag::EndMarker, "Turn end", end);
            report.markers = 2;
        }

        if report.entity_count() == 0 {
            self.logger.warn(&format!("nothing drawable for turn path via {}", path.intersection.name));
            return report;
        }

        if let Some(id) = scene.find_intersection(&path.intersection.name) {
            if let Some(original) = scene.material(id) {
                scene.set_material(id, Material::intersection_highlight());
                self.intersection_highlight = Some((id, original));
                report.intersection_highlighted = true;
            }
        }

        self.logger.info(&format!(
            "rendered turn path via {}: {} entities, corridor {}",
            path.intersection.name,
            report.entity_count(),
            if report.corridor_derived { "derived" } else if report.corridor.is_some() { "from solver" } else { "skipped" },
        ));
        report
    }

    fn add(&mut self, scene: &mut dyn SceneGateway, tag: PathTag, name: &str, material: Material, geometry: EntityGeometry) -> EntityId {
        let id = scene.add_entity(NewEntity::turn_path(tag, name, material, geometry));
        self.tracked.insert(tag, id);
        id
    }

    fn add_marker(&mut self, scene: &mut dyn SceneGateway, tag: PathTag, name: &str, at: LonLat) {
        self.add(scene, tag, name, Material::centerline(), EntityGeometry::Point(at));
    }

    fn skip(&self, report: &mut RenderReport, step: &str, err: &TurnPathError) {
        self.logger.warn(&format!("skipping {} render: {}", step, err));
        report.skipped.push(step.to_string());
    }
}
