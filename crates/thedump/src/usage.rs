//! Subscription tier and monthly usage reported by the backend.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Trial,
    Paid,
    PreApproved,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionProvider {
    Apple,
    Stripe,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    BillingRetry,
    Expired,
    Revoked,
    Refunded,
}

/// Monthly usage against the plan limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageStatus {
    pub subscription_tier: SubscriptionTier,
    pub notes_used: u64,
    pub monthly_note_limit: u64,
    pub words_used: u64,
    pub monthly_word_limit: u64,
    pub usage_percentage: f64,
    pub is_blocked: bool,
    #[serde(default)]
    pub blocked_reason: Option<String>,
    #[serde(default)]
    pub trial_ends_at: Option<String>,
    pub resets_at: String,
    #[serde(default)]
    pub subscription_provider: Option<SubscriptionProvider>,
    #[serde(default)]
    pub subscription_status: Option<SubscriptionStatus>,
    #[serde(default)]
    pub subscription_expires_at: Option<String>,
}

fn percentage(used: u64, limit: u64) -> f64 {
    if limit == 0 {
        return 0.0;
    }
    used as f64 / limit as f64 * 100.0
}

impl UsageStatus {
    pub fn notes_percentage(&self) -> f64 {
        percentage(self.notes_used, self.monthly_note_limit)
    }

    pub fn words_percentage(&self) -> f64 {
        percentage(self.words_used, self.monthly_word_limit)
    }

    /// Free and trial accounts can be upgraded.
    pub fn can_upgrade(&self) -> bool {
        matches!(
            self.subscription_tier,
            SubscriptionTier::Free | SubscriptionTier::Trial
        )
    }

    pub fn is_billing_retry(&self) -> bool {
        self.subscription_status == Some(SubscriptionStatus::BillingRetry)
    }

    /// Describes whichever limit is closer to being hit; notes win ties.
    pub fn limiting_factor_label(&self) -> String {
        if self.notes_percentage() >= self.words_percentage() {
            format!(
                "{} of {} notes used",
                self.notes_used, self.monthly_note_limit
            )
        } else {
            format!(
                "{} of {} words used",
                self.words_used, self.monthly_word_limit
            )
        }
    }
}
