use serde::{Deserialize, Serialize};

/// A rentable vehicle as the client sees it. Identity is `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vehicle {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub capacity: u32,
    pub price: f64,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Inventory wire shape. Coordinates are optional; the catalog places
/// vehicles that arrive without them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl VehicleRecord {
    /// Build a vehicle at the given position, filling display defaults.
    pub fn place(self, lat: f64, lng: f64) -> Vehicle {
        Vehicle {
            id: self.id,
            name: self.name,
            vehicle_type: self.vehicle_type.unwrap_or_else(|| "Vehicle".to_string()),
            capacity: self.capacity.unwrap_or(0),
            price: self.price.unwrap_or(0.0),
            lat,
            lng,
            description: self.description,
            image: self.image,
        }
    }
}
