/// Confirms that a vehicle id names something bookable. Inventory lookups
/// happen before the session is asked to start, so this is synchronous.
pub trait VehicleResolver: Send + Sync {
    fn vehicle_exists(&self, vehicle_id: &str) -> bool;
}

impl<F> VehicleResolver for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn vehicle_exists(&self, vehicle_id: &str) -> bool {
        self(vehicle_id)
    }
}

