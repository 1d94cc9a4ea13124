use super::ports::LocationDataSource;
use super::types::{Intersection, ResolutionStrategy, RoadSelection, SideCenterMarker};
use crate::common::DomainResult;
use crate::domains::logger::DynLogger;

/// Optional marker ids used to break ties between equally named marker pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TieBreakHints<'a> {
    pub from_marker_oid: Option<&'a str>,
    pub to_marker_oid: Option<&'a str>,
}

impl<'a> TieBreakHints<'a> {
    pub fn from_selections(source: &'a RoadSelection, destination: &'a RoadSelection) -> Self {
        Self {
            from_marker_oid: source.marker_oid(),
            to_marker_oid: destination.marker_oid(),
        }
    }
}

/// Finds the intersection shared by two roads.
pub struct IntersectionResolver<'a> {
    locations: &'a dyn LocationDataSource,
    logger: DynLogger,
}

impl<'a> IntersectionResolver<'a> {
    pub fn new(locations: &'a dyn LocationDataSource, logger: DynLogger) -> Self {
        Self { locations, logger }
    }

    /// Side-center markers first, connection names second.
    ///
    /// An unavailable marker feed counts as no marker match; `None` means neither
    /// strategy found a shared name.
    pub fn resolve(&self, source: &RoadSelection, destination: &RoadSelection) -> Option<Intersection> {
        let hints = TieBreakHints::from_selections(source, destination);
        match self.resolve_by_markers(&source.road_id, &destination.road_id, &hints) {
            Ok(Some(found)) => return Some(found),
            Ok(None) => {}
            Err(e) => self.logger.warn(&format!(
                "side-center markers for {} -> {} unavailable, trying connection names: {}",
                source.road_id, destination.road_id, e
            )),
        }
        resolve_by_connection_names(&source.connection_names, &destination.connection_names)
    }

    pub fn resolve_by_markers(
        &self,
        from_road_id: &str,
        to_road_id: &str,
        hints: &TieBreakHints<'_>,
    ) -> DomainResult<Option<Intersection>> {
        let from_markers = self.locations.side_center_markers(from_road_id)?;
        let to_markers = self.locations.side_center_markers(to_road_id)?;
        Ok(best_marker_pair(&from_markers, &to_markers, hints).map(|(a, b, name)| Intersection {
            name: name.to_string(),
            from_marker_oid: a.oid.clone(),
            to_marker_oid: b.oid.clone(),
            strategy: ResolutionStrategy::SideCenterMarkers,
        }))
    }
}

fn best_marker_pair<'m>(
    from_markers: &'m [SideCenterMarker],
    to_markers: &'m [SideCenterMarker],
    hints: &TieBreakHints<'_>,
) -> Option<(&'m SideCenterMarker, &'m SideCenterMarker, &'m str)> {
    let score = |a: &SideCenterMarker, b: &SideCenterMarker| {
        let hit = |oid: &Option<String>, hint: Option<&str>| match (oid.as_deref(), hint) {
            (Some(o), Some(h)) => o == h,
            _ => false,
        };
        hit(&a.oid, hints.from_marker_oid) as u8 + hit(&b.oid, hints.to_marker_oid) as u8
    };

    let mut best: Option<(&SideCenterMarker, &SideCenterMarker, &str, u8)> = None;
    for a in from_markers {
        let Some(name) = a.intersection_name() else { continue };
        for b in to_markers {
            if b.intersection_name() != Some(name) {
                continue;
            }
            let s = score(a, b);
            // Strictly greater keeps the first match among equals.
            if best.map_or(true, |(_, _, _, top)| s > top) {
                best = Some((a, b, name, s));
            }
        }
    }
    best.map(|(a, b, name, _)| (a, b, name))
}

/// First connection name of `from` that `to` also lists.
pub fn resolve_by_connection_names(from: &[String], to: &[String]) -> Option<Intersection> {
    from.iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .find(|n| to.iter().any(|m| m.trim() == *n))
        .map(|name| Intersection {
            name: name.to_string(),
            from_marker_oid: None,
            to_marker_oid: None,
            strategy: ResolutionStrategy::ConnectionNames,
        })
}
