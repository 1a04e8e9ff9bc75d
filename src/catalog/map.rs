//! Global map data: species grouped by approximate location.
//! Coordinates come from the seed document, where entry N (1-based) is the
//! species stored with id N. Each species is reduced to the mean of its
//! coordinates, rounded to whole degrees (about 111 km), and species that
//! land on the same rounded point share a location.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::store::StoreError;
use super::Mammal;

const UNKNOWN: &str = "Unknown";

/// One recorded point of a species' former range.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Coordinate {
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeoFile {
    #[serde(default)]
    mammals: Vec<GeoEntry>,
}

#[derive(Debug, Deserialize)]
struct GeoEntry {
    #[serde(default)]
    coordinates: Option<Vec<Coordinate>>,
}

/// Coordinates per species id. Species without coordinates are absent.
#[derive(Debug, Clone, Default)]
pub struct GeocodingData {
    by_id: HashMap<i64, Vec<Coordinate>>,
}

impl GeocodingData {
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, StoreError> {
        let file: GeoFile = serde_json::from_str(content)?;
        let by_id = file
            .mammals
            .into_iter()
            .zip(1..)
            .filter_map(|(entry, id)| match entry.coordinates {
                Some(coords) if !coords.is_empty() => Some((id, coords)),
                _ => None,
            })
            .collect();
        Ok(Self { by_id })
    }

    pub fn coordinates(&self, id: i64) -> Option<&[Coordinate]> {
        self.by_id.get(&id).map(Vec::as_slice)
    }

    /// Number of species with at least one coordinate.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSpecies {
    pub id: i64,
    pub common_name: String,
    pub binomial_name: String,
    pub continent: String,
    pub image_filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLocation {
    pub lat: f64,
    pub lon: f64,
    /// Name of the first coordinate of the first species placed here.
    pub location_name: String,
    pub species: Vec<MapSpecies>,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MapStatistics {
    pub total_locations: usize,
    pub total_species: usize,
    pub max_concentration: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapData {
    pub locations: Vec<MapLocation>,
    pub statistics: MapStatistics,
}

/// Group `mammals` by rounded mean coordinate. Locations keep the order in
/// which they were first seen; a species appears at most once per location.
pub fn aggregate(mammals: &[Mammal], geo: &GeocodingData) -> MapData {
    let mut locations: Vec<MapLocation> = Vec::new();
    let mut index: HashMap<(i64, i64), usize> = HashMap::new();

    for mammal in mammals {
        let Some(coords) = geo.coordinates(mammal.id) else {
            continue;
        };
        if coords.is_empty() {
            continue;
        }

        let n = coords.len() as f64;
        let lat = (coords.iter().map(|c| c.lat).sum::<f64>() / n).round_ties_even();
        let lon = (coords.iter().map(|c| c.lon).sum::<f64>() / n).round_ties_even();

        let slot = *index.entry((lat as i64, lon as i64)).or_insert_with(|| {
            locations.push(MapLocation {
                lat,
                lon,
                location_name: coords[0]
                    .location
                    .clone()
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                species: Vec::new(),
                count: 0,
            });
            locations.len() - 1
        });

        let location = &mut locations[slot];
        if location.species.iter().any(|s| s.id == mammal.id) {
            continue;
        }
        location.species.push(MapSpecies {
            id: mammal.id,
            common_name: mammal.common_name.clone(),
            binomial_name: mammal.binomial_name.clone(),
            continent: mammal.continent.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            image_filename: mammal.image_filename.clone().unwrap_or_default(),
        });
        location.count += 1;
    }

    let statistics = MapStatistics {
        total_locations: locations.len(),
        total_species: locations.iter().map(|l| l.count).sum(),
        max_concentration: locations.iter().map(|l| l.count).max().unwrap_or(0),
    };
    MapData {
        locations,
        statistics,
    }
}
