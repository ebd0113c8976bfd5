use std::collections::HashMap;
use std::path::Path;
use voltride_core::VehicleResolver;
use voltride_shared::{Vehicle, VehicleRecord};

/// Map centre used when nothing is selected, and the anchor for placing
/// vehicles that arrive without coordinates.
pub const DEFAULT_CENTER: (f64, f64) = (37.7749, -122.4194);

const DEMO_NAMES: [&str; 6] = ["City Car", "Sedan", "SUV", "Van", "Coupe", "EV"];
const DEMO_TYPES: [&str; 6] = ["Compact", "Sedan", "SUV", "Van", "Coupe", "Electric"];

/// Read-only vehicle inventory, in the order the source supplied it.
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    vehicles: Vec<Vehicle>,
    index: HashMap<String, usize>,
}

impl Fleet {
    pub fn new(vehicles: Vec<Vehicle>) -> Self {
        let mut index = HashMap::with_capacity(vehicles.len());
        for (position, vehicle) in vehicles.iter().enumerate() {
            // First occurrence wins on duplicate ids.
            index.entry(vehicle.id.clone()).or_insert(position);
        }
        Self { vehicles, index }
    }

    /// Build from inventory records, spreading out the ones without a position.
    pub fn from_records(records: Vec<VehicleRecord>) -> Self {
        let (center_lat, center_lng) = DEFAULT_CENTER;
        let vehicles = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| match (record.lat, record.lng) {
                (Some(lat), Some(lng)) => record.place(lat, lng),
                _ => {
                    let lat = center_lat + 0.01 - (i % 6) as f64 * 0.004;
                    let lng = center_lng + (i % 4) as f64 * 0.008 - 0.01;
                    record.place(lat, lng)
                }
            })
            .collect();
        Self::new(vehicles)
    }

    /// Six placeholder vehicles for when the inventory cannot be reached.
    pub fn demo() -> Self {
        let (center_lat, center_lng) = DEFAULT_CENTER;
        let vehicles = (0..6)
            .map(|i| Vehicle {
                id: format!("demo-{}", i + 1),
                name: DEMO_NAMES[i].to_string(),
                vehicle_type: DEMO_TYPES[i].to_string(),
                capacity: 4 + (i % 3) as u32,
                price: (20 + i * 5) as f64,
                lat: center_lat + (i % 3) as f64 * 0.006 - 0.006,
                lng: center_lng + (i / 3) as f64 * 0.007 - 0.004,
                description: Some("Demo vehicle for interactive map.".to_string()),
                image: None,
            })
            .collect();
        Self::new(vehicles)
    }

    /// Load a JSON array of inventory records.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FleetError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| FleetError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let records: Vec<VehicleRecord> = serde_json::from_str(&raw)?;
        Ok(Self::from_records(records))
    }

    /// Load the inventory, falling back to the demo fleet on any failure.
    pub fn load_or_demo(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            tracing::info!("No inventory configured, using demo fleet");
            return Self::demo();
        };
        match Self::load(path) {
            Ok(fleet) => {
                tracing::info!(vehicles = fleet.len(), "Inventory loaded");
                fleet
            }
            Err(e) => {
                tracing::warn!(error = %e, "Inventory unavailable, using demo fleet");
                Self::demo()
            }
        }
    }

    pub fn get(&self, vehicle_id: &str) -> Option<&Vehicle> {
        self.index.get(vehicle_id).map(|&position| &self.vehicles[position])
    }

    pub fn all(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Case-insensitive match on name, type or description.
    pub fn search(&self, term: &str) -> Vec<&Vehicle> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self.vehicles.iter().collect();
        }
        self.vehicles
            .iter()
            .filter(|v| {
                v.name.to_lowercase().contains(&term)
                    || v.vehicle_type.to_lowercase().contains(&term)
                    || v
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&term))
            })
            .collect()
    }

    /// Vehicle the map should centre on: the one the rider selected, else the
    /// one under booking.
    pub fn focus(&self, selected: Option<&str>, booked: Option<&str>) -> Option<&Vehicle> {
        selected
            .and_then(|id| self.get(id))
            .or_else(|| booked.and_then(|id| self.get(id)))
    }
}

impl VehicleResolver for Fleet {
    fn vehicle_exists(&self, vehicle_id: &str) -> bool {
        self.index.contains_key(vehicle_id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error("Failed to read inventory {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed inventory: {0}")]
    Parse(#[from] serde_json::Error),
}
