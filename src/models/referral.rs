use serde::{Deserialize, Serialize};

/// Referral lifecycle. `Accepted` and `Declined` are terminal; only the
/// recipient may move a referral out of `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    Pending,
    Accepted,
    Declined,
}

impl ReferralStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReferralStatus::Accepted | ReferralStatus::Declined)
    }
}

impl std::fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferralStatus::Pending => write!(f, "pending"),
            ReferralStatus::Accepted => write!(f, "accepted"),
            ReferralStatus::Declined => write!(f, "declined"),
        }
    }
}

/// Commission payment lifecycle. Transitions (`pending -> paid`,
/// `pending -> overdue`) are applied only by the referral's recipient and
/// only while the referral itself is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionStatus {
    Pending,
    Paid,
    Overdue,
}

impl std::fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommissionStatus::Pending => write!(f, "pending"),
            CommissionStatus::Paid => write!(f, "paid"),
            CommissionStatus::Overdue => write!(f, "overdue"),
        }
    }
}

/// The payable amount tied to a referral. Nested inside its referral and
/// owned by the referral's lifecycle; it cannot outlive it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commission {
    pub amount: f64,
    pub status: CommissionStatus,
    pub due_date: Option<String>,
    pub commission_type: Option<String>,
    pub rate: Option<f64>,
}

/// An invitation linking a sender, a recipient and a vehicle, with an
/// acceptance workflow and an optional nested commission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Referral {
    pub id: i64,
    pub car_id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub recipient_email: Option<String>,
    pub status: ReferralStatus,
    pub referral_date: Option<String>,
    pub commission: Option<Commission>,
}

/// Payload for creating a referral on a vehicle the sender owns.
#[derive(Debug, Clone, Serialize)]
pub struct NewReferral {
    pub recipient_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_type: Option<String>,
}
