//! Region catalogue: loading and indexing of the region hierarchy.
//!
//! The catalogue payload arrives as one JSON document listing every
//! region (keyed by its abbreviation) plus the available grouping
//! schemes. Loading builds an id-indexed arena, resolves the root,
//! stamps each region's ancestor trail, and precomputes the case-folded
//! fields used by search. The catalogue is immutable per session apart
//! from the per-slice `exists` flags.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::error::ViewerError;
use crate::model::{Grouping, Plane, Region, RegionId};

/// One region entry of the catalogue payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionPayload {
    /// Unique abbreviation.
    pub abb: String,
    /// Parent abbreviation; absent only for the root.
    #[serde(default)]
    pub parent: Option<String>,
    /// Long display name.
    pub name: String,
    /// RGB display color.
    #[serde(default)]
    pub color: [u8; 3],
    /// Whether the region appears in at least one loaded slice.
    #[serde(default = "default_exists")]
    pub exists: bool,
    /// Ordered child abbreviations; derived from parent links when absent.
    #[serde(default)]
    pub children: Option<Vec<String>>,
    /// Grouping scheme id -> group id memberships.
    #[serde(default)]
    pub groups: HashMap<String, String>,
    /// Representative slice on the default plane (legacy single-axis form).
    #[serde(rename = "centerSlice", default)]
    pub center_slice: Option<usize>,
    /// Representative slice per plane.
    #[serde(rename = "centerSlices", default)]
    pub center_slices: HashMap<Plane, usize>,
}

fn default_exists() -> bool {
    true
}

/// One grouping scheme of the catalogue payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupingPayload {
    /// Display name of the scheme.
    pub name: String,
    /// Groups of the scheme.
    #[serde(default)]
    pub groups: Vec<GroupPayload>,
}

/// One group of a grouping scheme.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupPayload {
    /// Group id.
    pub id: String,
    /// Group display name.
    pub name: String,
}

/// The full catalogue payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CataloguePayload {
    /// All regions, in payload order.
    pub regions: Vec<RegionPayload>,
    /// Grouping schemes by id.
    #[serde(default)]
    pub groupings: HashMap<String, GroupingPayload>,
}

/// Loaded, indexed region hierarchy.
#[derive(Debug)]
pub struct RegionCatalogue {
    regions: HashMap<RegionId, Region>,
    /// Payload ordering, used for deterministic iteration.
    order: Vec<RegionId>,
    root: RegionId,
    groupings: HashMap<String, Grouping>,
}

impl RegionCatalogue {
    /// Parse and load a catalogue from its JSON payload.
    pub fn from_json(json: &str) -> Result<Self, ViewerError> {
        let payload: CataloguePayload = serde_json::from_str(json)?;
        Self::load(payload)
    }

    /// Build the catalogue from a parsed payload.
    ///
    /// Fails with [`ViewerError::NoRoot`] when no region has a null
    /// parent; every tree operation assumes a root exists. Extra
    /// parentless regions beyond the first are logged and treated as
    /// orphans (reachable by id, absent from every trail).
    pub fn load(payload: CataloguePayload) -> Result<Self, ViewerError> {
        let mut root = None;
        for region in &payload.regions {
            if region.parent.is_none() {
                if root.is_none() {
                    root = Some(region.abb.clone());
                } else {
                    log::warn!("extra parentless region '{}' treated as orphan", region.abb);
                }
            }
        }
        let root = root.ok_or(ViewerError::NoRoot)?;

        let order: Vec<RegionId> = payload.regions.iter().map(|r| r.abb.clone()).collect();
        let known: HashSet<&str> = order.iter().map(String::as_str).collect();

        // Children either come straight from the payload or are derived
        // from the parent links, preserving payload order.
        let mut derived_children: HashMap<String, Vec<String>> = HashMap::new();
        for region in &payload.regions {
            if let Some(parent) = region.parent.as_deref() {
                if known.contains(parent) {
                    derived_children
                        .entry(parent.to_string())
                        .or_default()
                        .push(region.abb.clone());
                } else {
                    log::warn!(
                        "region '{}' references unknown parent '{}'",
                        region.abb,
                        parent
                    );
                }
            }
        }

        let mut regions: HashMap<RegionId, Region> = HashMap::with_capacity(payload.regions.len());
        for entry in payload.regions {
            let children = match entry.children {
                Some(children) => children
                    .into_iter()
                    .filter(|c| known.contains(c.as_str()))
                    .collect(),
                None => derived_children.remove(entry.abb.as_str()).unwrap_or_default(),
            };
            let mut center_slices = entry.center_slices;
            if let Some(slice) = entry.center_slice {
                center_slices.entry(Plane::default()).or_insert(slice);
            }
            let region = Region {
                name_upper: entry.name.to_uppercase(),
                abb_upper: entry.abb.to_uppercase(),
                abb: entry.abb.clone(),
                name: entry.name,
                parent: entry.parent,
                children,
                color: entry.color,
                exists: entry.exists,
                center_slices,
                groups: entry.groups,
                trail: Vec::new(),
            };
            regions.insert(entry.abb, region);
        }

        stamp_trails(&mut regions, &root);

        let groupings = payload
            .groupings
            .into_iter()
            .map(|(id, scheme)| {
                let group_names = scheme
                    .groups
                    .into_iter()
                    .map(|g| (g.id, g.name))
                    .collect();
                (
                    id,
                    Grouping {
                        name: scheme.name,
                        group_names,
                    },
                )
            })
            .collect();

        log::info!("catalogue loaded: {} regions, root '{}'", regions.len(), root);
        Ok(Self {
            regions,
            order,
            root,
            groupings,
        })
    }

    /// Look up a region by abbreviation.
    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.get(id)
    }

    /// The root region.
    pub fn root(&self) -> &Region {
        // The root id is validated at load time.
        &self.regions[&self.root]
    }

    /// Abbreviation of the root region.
    pub fn root_id(&self) -> &str {
        &self.root
    }

    /// Number of regions in the catalogue.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the catalogue holds no regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Iterate all region ids in payload order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Iterate all regions in payload order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.order.iter().filter_map(|id| self.regions.get(id))
    }

    /// Look up a grouping scheme by id.
    pub fn grouping(&self, scheme: &str) -> Option<&Grouping> {
        self.groupings.get(scheme)
    }

    /// Display name of a group within a scheme.
    pub fn group_name(&self, scheme: &str, group_id: &str) -> Option<&str> {
        self.groupings
            .get(scheme)?
            .group_names
            .get(group_id)
            .map(String::as_str)
    }

    /// Ids of every region belonging to a grouping scheme.
    pub fn members_of_scheme(&self, scheme: &str) -> Vec<RegionId> {
        self.regions()
            .filter(|r| r.groups.contains_key(scheme))
            .map(|r| r.abb.clone())
            .collect()
    }

    /// Flattened list of childless descendants of a region, depth-first.
    ///
    /// Used to expand a preselected ancestor into all its selectable
    /// leaves. A leaf region returns itself.
    pub fn leaf_descendants(&self, id: &str) -> Vec<RegionId> {
        let mut leaves = Vec::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            let Some(region) = self.regions.get(&current) else {
                continue;
            };
            if region.is_leaf() {
                leaves.push(current);
            } else {
                // Reverse so the depth-first order follows child order.
                for child in region.children.iter().rev() {
                    stack.push(child.clone());
                }
            }
        }
        leaves
    }

    /// Update the `exists` flags from the set of regions present in the
    /// loaded slices.
    pub fn update_exists_flags(&mut self, present: &HashSet<String>) {
        for region in self.regions.values_mut() {
            region.exists = present.contains(&region.abb);
        }
    }
}

/// Stamp every region's ancestor trail via an iterative depth-first pass
/// from the root. Regions unreachable from the root keep an empty trail.
fn stamp_trails(regions: &mut HashMap<RegionId, Region>, root: &str) {
    let mut stack: Vec<(RegionId, Vec<RegionId>)> = vec![(root.to_string(), Vec::new())];
    let mut visited = HashSet::new();
    while let Some((id, trail)) = stack.pop() {
        if !visited.insert(id.clone()) {
            log::warn!("cycle detected in region hierarchy at '{}'", id);
            continue;
        }
        let children = match regions.get_mut(&id) {
            Some(region) => {
                region.trail = trail.clone();
                region.children.clone()
            }
            None => continue,
        };
        let mut child_trail = trail;
        child_trail.push(id);
        for child in children {
            stack.push((child, child_trail.clone()));
        }
    }
}
