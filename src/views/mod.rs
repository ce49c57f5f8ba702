//! Resource views: per-resource local caches reconciled with server truth.
//!
//! Each view exclusively owns its cached sequence and is its only mutator.
//! Views call the `ApiClient` for every remote operation and update their
//! cache only from confirmed responses; they never read the token or the
//! user from storage directly - identity questions go through the
//! `SessionHandle`.

pub mod inventory;
pub mod notifications;
pub mod referrals;

pub use inventory::InventoryView;
pub use notifications::NotificationsView;
pub use referrals::{can_act_on_referral, can_update_commission, ReferralPanel};

use futures::future::try_join;

use crate::api::ApiError;

/// Refresh the inventory and the notification feed concurrently. The two
/// views own disjoint caches, so the refreshes are independent; the first
/// classified failure wins.
pub async fn refresh_all(
    inventory: &mut InventoryView,
    notifications: &mut NotificationsView,
) -> Result<(), ApiError> {
    try_join(inventory.refresh(), notifications.refresh()).await?;
    Ok(())
}
