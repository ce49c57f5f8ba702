use tracing::debug;

use crate::api::{ApiClient, ApiError};
use crate::models::{NewVehicle, Vehicle};

/// Local cache of the vehicle inventory.
///
/// The remote system owns the records; this view holds an ordered sequence
/// synchronized by full refetch or by append/removal after a confirmed
/// server operation. There is no optimistic-then-rollback logic - the cache
/// always follows server-confirmed truth.
#[derive(Debug)]
pub struct InventoryView {
    api: ApiClient,
    cars: Vec<Vehicle>,
}

impl InventoryView {
    pub fn new(api: ApiClient) -> Self {
        Self { api, cars: Vec::new() }
    }

    pub fn cars(&self) -> &[Vehicle] {
        &self.cars
    }

    /// Replace the cached sequence wholesale from the server.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        let cars: Vec<Vehicle> = self.api.get_json("/cars", true).await?;
        debug!(count = cars.len(), "Refreshed inventory");
        self.cars = cars;
        Ok(())
    }

    /// Fetch one vehicle's full record; does not touch the cached list.
    pub async fn fetch_detail(&self, car_id: i64) -> Result<Vehicle, ApiError> {
        self.api.get_json(&format!("/cars/{}", car_id), true).await
    }

    /// Create a vehicle and append the server-returned record on
    /// confirmation.
    pub async fn add_car(&mut self, new_car: &NewVehicle) -> Result<Vehicle, ApiError> {
        let created: Vehicle = self.api.post_json("/cars", new_car, true).await?;
        self.cars.push(created.clone());
        Ok(created)
    }

    /// Delete a vehicle remotely, removing it locally only on confirmation.
    pub async fn delete_car(&mut self, car_id: i64) -> Result<(), ApiError> {
        self.api
            .delete(&format!("/cars/{}", car_id), true)
            .await?;
        self.cars.retain(|car| car.id != car_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CredentialStore, SessionHandle};
    use std::sync::atomic::{AtomicU64, Ordering};

    static DIR_SEQ: AtomicU64 = AtomicU64::new(0);

    fn view() -> InventoryView {
        let dir = std::env::temp_dir().join(format!(
            "drivehub-inventory-test-{}-{}",
            std::process::id(),
            DIR_SEQ.fetch_add(1, Ordering::SeqCst)
        ));
        let session = SessionHandle::new(CredentialStore::new(dir));
        InventoryView::new(ApiClient::new("http://127.0.0.1:5555", session).unwrap())
    }

    #[tokio::test]
    async fn test_refresh_requires_session() {
        let mut view = view();
        let err = view.refresh().await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
        assert!(view.cars().is_empty());
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_cache_untouched() {
        let mut view = view();
        view.cars.push(Vehicle {
            id: 1,
            car_name: "Saab 900".to_string(),
            year_of_manufacture: 1993,
            car_value: 4000.0,
            photo: None,
            user_id: 1,
        });
        // No session: the delete fails before the network and the cached
        // record must survive.
        assert!(view.delete_car(1).await.is_err());
        assert_eq!(view.cars().len(), 1);
    }
}
