//! Data models for DriveHub entities.
//!
//! This module contains the data structures exchanged with the DriveHub
//! API and cached by the resource views:
//!
//! - `User`, `UserUpdate`, `RegisterRequest`: account identity and mutation
//! - `Vehicle`, `NewVehicle`: dealership inventory records
//! - `Notification`, `NotificationFeed`: the read/unread notification feed
//! - `Referral`, `Commission` and their status enums: the referral workflow

pub mod notification;
pub mod referral;
pub mod user;
pub mod vehicle;

pub use notification::{Notification, NotificationFeed};
pub use referral::{Commission, CommissionStatus, NewReferral, Referral, ReferralStatus};
pub use user::{RegisterRequest, User, UserUpdate};
pub use vehicle::{NewVehicle, Vehicle};
