use serde::{Deserialize, Serialize};

/// A vehicle record in the dealership inventory.
///
/// Owned by the remote system; the inventory view holds an ordered local
/// sequence synchronized by full refetch or by confirmed append/removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    pub car_name: String,
    pub year_of_manufacture: i32,
    pub car_value: f64,
    pub photo: Option<String>,
    /// Id of the user who created the record.
    pub user_id: i64,
}

/// Payload for creating a vehicle. The server assigns `id` and `user_id`
/// and returns the full record, which is what the inventory view appends.
#[derive(Debug, Clone, Serialize)]
pub struct NewVehicle {
    pub car_name: String,
    pub year_of_manufacture: i32,
    pub car_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}
