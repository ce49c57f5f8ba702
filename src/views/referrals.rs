use serde_json::json;
use tracing::debug;

use crate::api::{ApiClient, ApiError};
use crate::auth::SessionHandle;
use crate::models::{CommissionStatus, NewReferral, Referral, ReferralStatus, Vehicle};
use crate::sync::StaleGuard;

/// Whether `viewer` may accept or decline `referral` right now. Used by
/// the UI to disable the actions; the same rule is enforced before any
/// request is issued.
pub fn can_act_on_referral(viewer_id: i64, referral: &Referral) -> bool {
    viewer_id == referral.recipient_id && referral.status == ReferralStatus::Pending
}

/// Whether `viewer` may update the commission status. Allowed only for the
/// recipient and only while the referral itself is accepted - a server-side
/// invariant the client respects locally, not merely cosmetically.
pub fn can_update_commission(viewer_id: i64, referral: &Referral) -> bool {
    viewer_id == referral.recipient_id
        && referral.status == ReferralStatus::Accepted
        && referral.commission.is_some()
}

fn check_referral_action(viewer_id: i64, referral: &Referral) -> Result<(), ApiError> {
    if viewer_id != referral.recipient_id {
        return Err(ApiError::invalid_input(
            "Only the recipient may act on a referral",
        ));
    }
    if referral.status != ReferralStatus::Pending {
        return Err(ApiError::invalid_input("Referral is no longer pending"));
    }
    Ok(())
}

fn check_commission_update(
    viewer_id: i64,
    referral: &Referral,
    target: CommissionStatus,
) -> Result<(), ApiError> {
    if viewer_id != referral.recipient_id {
        return Err(ApiError::invalid_input(
            "Only the recipient may update the commission",
        ));
    }
    if referral.status != ReferralStatus::Accepted {
        return Err(ApiError::invalid_input(
            "Commission can only be updated for an accepted referral",
        ));
    }
    if referral.commission.is_none() {
        return Err(ApiError::invalid_input(
            "No commission information available",
        ));
    }
    if target == CommissionStatus::Pending {
        return Err(ApiError::invalid_input(
            "Commission cannot be moved back to pending",
        ));
    }
    Ok(())
}

enum ReferralAction {
    Accept,
    Decline,
}

impl ReferralAction {
    fn path_segment(&self) -> &'static str {
        match self {
            ReferralAction::Accept => "accept",
            ReferralAction::Decline => "decline",
        }
    }
}

/// Local cache of the referrals (and their nested commissions) for one
/// vehicle. Status-changing actions replace the single affected record by
/// identity match on confirmation; a failed action leaves the record
/// unchanged. Each action is one independent request - no batching.
#[derive(Debug)]
pub struct ReferralPanel {
    api: ApiClient,
    session: SessionHandle,
    car_id: Option<i64>,
    owner_id: Option<i64>,
    referrals: Vec<Referral>,
    /// Discards per-record responses that lost the completion-order race.
    guard: StaleGuard<i64>,
}

impl ReferralPanel {
    pub fn new(api: ApiClient, session: SessionHandle) -> Self {
        Self {
            api,
            session,
            car_id: None,
            owner_id: None,
            referrals: Vec::new(),
            guard: StaleGuard::new(),
        }
    }

    pub fn referrals(&self) -> &[Referral] {
        &self.referrals
    }

    /// Load the referral list for a vehicle, remembering the vehicle's
    /// owner for send gating.
    pub async fn load(&mut self, car: &Vehicle) -> Result<(), ApiError> {
        let referrals: Vec<Referral> = self
            .api
            .get_json(&format!("/cars/{}/referrals", car.id), true)
            .await?;
        debug!(car_id = car.id, count = referrals.len(), "Loaded referrals");
        self.car_id = Some(car.id);
        self.owner_id = Some(car.user_id);
        self.referrals = referrals;
        Ok(())
    }

    /// Create a referral on the loaded vehicle. Only the vehicle's owner
    /// may send one; anyone else is rejected without a network call.
    pub async fn send_referral(&mut self, new_referral: &NewReferral) -> Result<Referral, ApiError> {
        let viewer_id = self.viewer_id().await?;
        let car_id = self
            .car_id
            .ok_or_else(|| ApiError::invalid_input("No vehicle loaded"))?;
        if self.owner_id != Some(viewer_id) {
            return Err(ApiError::invalid_input(
                "Only the vehicle's owner may send referrals",
            ));
        }
        let created: Referral = self
            .api
            .post_json(&format!("/cars/{}/referrals", car_id), new_referral, true)
            .await?;
        self.referrals.push(created.clone());
        Ok(created)
    }

    /// Accept a pending referral addressed to the viewer.
    pub async fn accept(&mut self, referral_id: i64) -> Result<(), ApiError> {
        self.resolve(referral_id, ReferralAction::Accept).await
    }

    /// Decline a pending referral addressed to the viewer.
    pub async fn decline(&mut self, referral_id: i64) -> Result<(), ApiError> {
        self.resolve(referral_id, ReferralAction::Decline).await
    }

    async fn resolve(&mut self, referral_id: i64, action: ReferralAction) -> Result<(), ApiError> {
        let viewer_id = self.viewer_id().await?;
        let referral = self.find(referral_id)?;
        check_referral_action(viewer_id, referral)?;

        let ticket = self.guard.begin(referral_id);
        let updated: Referral = self
            .api
            .post_json(
                &format!("/referrals/{}/{}", referral_id, action.path_segment()),
                &json!({}),
                true,
            )
            .await?;
        if self.guard.commit(&referral_id, ticket) {
            self.replace(updated);
        }
        Ok(())
    }

    /// Move the commission of an accepted referral to `paid` or `overdue`.
    pub async fn set_commission_status(
        &mut self,
        referral_id: i64,
        target: CommissionStatus,
    ) -> Result<(), ApiError> {
        let viewer_id = self.viewer_id().await?;
        let referral = self.find(referral_id)?;
        check_commission_update(viewer_id, referral, target)?;

        let ticket = self.guard.begin(referral_id);
        let updated: Referral = self
            .api
            .post_json(
                &format!("/referrals/{}/commission", referral_id),
                &json!({ "status": target }),
                true,
            )
            .await?;
        if self.guard.commit(&referral_id, ticket) {
            self.replace(updated);
        }
        Ok(())
    }

    async fn viewer_id(&self) -> Result<i64, ApiError> {
        self.session
            .user()
            .await
            .map(|user| user.id)
            .ok_or(ApiError::Unauthenticated)
    }

    fn find(&self, referral_id: i64) -> Result<&Referral, ApiError> {
        self.referrals
            .iter()
            .find(|r| r.id == referral_id)
            .ok_or_else(|| ApiError::invalid_input("Unknown referral"))
    }

    /// Replace the single affected record by identity match.
    fn replace(&mut self, updated: Referral) {
        if let Some(slot) = self.referrals.iter_mut().find(|r| r.id == updated.id) {
            *slot = updated;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialStore;
    use crate::models::{Commission, User};
    use std::sync::atomic::{AtomicU64, Ordering};

    static DIR_SEQ: AtomicU64 = AtomicU64::new(0);

    const RECIPIENT: i64 = 4;
    const SENDER: i64 = 3;

    fn referral(status: ReferralStatus, commission: Option<Commission>) -> Referral {
        Referral {
            id: 11,
            car_id: 7,
            sender_id: SENDER,
            recipient_id: RECIPIENT,
            recipient_email: Some("buyer@example.com".to_string()),
            status,
            referral_date: Some("2025-03-02".to_string()),
            commission,
        }
    }

    fn commission() -> Commission {
        Commission {
            amount: 950.0,
            status: CommissionStatus::Pending,
            due_date: Some("2025-04-01".to_string()),
            commission_type: Some("fixed".to_string()),
            rate: Some(0.1),
        }
    }

    fn panel() -> ReferralPanel {
        let dir = std::env::temp_dir().join(format!(
            "drivehub-referrals-test-{}-{}",
            std::process::id(),
            DIR_SEQ.fetch_add(1, Ordering::SeqCst)
        ));
        let session = SessionHandle::new(CredentialStore::new(dir));
        let api = ApiClient::new("http://127.0.0.1:5555", session.clone()).unwrap();
        ReferralPanel::new(api, session)
    }

    async fn login_as(panel: &ReferralPanel, user_id: i64) {
        let user = User {
            id: user_id,
            first_name: "Test".to_string(),
            last_name: "Viewer".to_string(),
            email: "viewer@example.com".to_string(),
            organisation: None,
        };
        panel.session.install("tok".to_string(), user).await;
    }

    #[test]
    fn test_referral_action_gating() {
        let pending = referral(ReferralStatus::Pending, None);
        assert!(can_act_on_referral(RECIPIENT, &pending));
        // The sender never acts on their own referral.
        assert!(!can_act_on_referral(SENDER, &pending));
        // Terminal states stay terminal.
        assert!(!can_act_on_referral(RECIPIENT, &referral(ReferralStatus::Accepted, None)));
        assert!(!can_act_on_referral(RECIPIENT, &referral(ReferralStatus::Declined, None)));
    }

    #[test]
    fn test_commission_gating() {
        let accepted = referral(ReferralStatus::Accepted, Some(commission()));
        assert!(can_update_commission(RECIPIENT, &accepted));
        assert!(!can_update_commission(SENDER, &accepted));
        // Only an accepted referral's commission may move.
        assert!(!can_update_commission(
            RECIPIENT,
            &referral(ReferralStatus::Pending, Some(commission()))
        ));
        // No commission attached, nothing to update.
        assert!(!can_update_commission(RECIPIENT, &referral(ReferralStatus::Accepted, None)));

        let err = check_commission_update(RECIPIENT, &accepted, CommissionStatus::Pending)
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_accept_by_non_recipient_rejected_without_network() {
        let mut panel = panel();
        login_as(&panel, SENDER).await;
        panel.referrals = vec![referral(ReferralStatus::Pending, None)];

        let err = panel.accept(11).await.unwrap_err();
        // Validation, not Network: the request was never issued.
        assert!(matches!(err, ApiError::Validation { .. }));
        assert_eq!(panel.referrals()[0].status, ReferralStatus::Pending);
    }

    #[tokio::test]
    async fn test_decline_terminal_referral_rejected_without_network() {
        let mut panel = panel();
        login_as(&panel, RECIPIENT).await;
        panel.referrals = vec![referral(ReferralStatus::Declined, None)];

        let err = panel.decline(11).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_commission_update_on_pending_referral_rejected() {
        let mut panel = panel();
        login_as(&panel, RECIPIENT).await;
        panel.referrals = vec![referral(ReferralStatus::Pending, Some(commission()))];

        let err = panel
            .set_commission_status(11, CommissionStatus::Paid)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_send_referral_gated_on_ownership() {
        let mut panel = panel();
        login_as(&panel, RECIPIENT).await;
        panel.car_id = Some(7);
        panel.owner_id = Some(SENDER);

        let err = panel
            .send_referral(&NewReferral {
                recipient_email: "buyer@example.com".to_string(),
                commission_rate: None,
                commission_type: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
        assert!(panel.referrals().is_empty());
    }

    #[tokio::test]
    async fn test_actions_require_session() {
        let mut panel = panel();
        panel.referrals = vec![referral(ReferralStatus::Pending, None)];
        let err = panel.accept(11).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[test]
    fn test_replace_matches_by_identity() {
        let mut panel = panel();
        panel.referrals = vec![referral(ReferralStatus::Pending, None)];
        let mut updated = referral(ReferralStatus::Accepted, Some(commission()));
        updated.id = 11;
        panel.replace(updated);
        assert_eq!(panel.referrals()[0].status, ReferralStatus::Accepted);

        // Unknown id: nothing changes.
        let mut stranger = referral(ReferralStatus::Declined, None);
        stranger.id = 99;
        panel.replace(stranger);
        assert_eq!(panel.referrals().len(), 1);
        assert_eq!(panel.referrals()[0].status, ReferralStatus::Accepted);
    }
}
