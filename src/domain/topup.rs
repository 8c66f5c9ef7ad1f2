use super::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TopupStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Kpay,
    Wave,
}

impl PaymentMethod {
    pub fn code(&self) -> &'static str {
        match self {
            PaymentMethod::Kpay => "kpay",
            PaymentMethod::Wave => "wave",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMethod::Kpay => "KBZ Pay",
            PaymentMethod::Wave => "Wave Money",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kpay" => Ok(PaymentMethod::Kpay),
            "wave" => Ok(PaymentMethod::Wave),
            other => Err(format!("unknown payment method `{other}`")),
        }
    }
}

/// A balance top-up request embedded in a user's record.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Topup {
    pub topup_id: String,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    /// Telegram file id of the payment screenshot.
    pub proof_file_id: String,
    pub status: TopupStatus,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub chat_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    /// Set once the referrer has been paid for this top-up.
    #[serde(default)]
    pub commission_paid: bool,
}

impl Topup {
    pub fn is_pending(&self) -> bool {
        self.status == TopupStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopupDecision {
    Approve,
    Reject,
}

impl TopupDecision {
    pub fn status(&self) -> TopupStatus {
        match self {
            TopupDecision::Approve => TopupStatus::Approved,
            TopupDecision::Reject => TopupStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopupResolution {
    pub decision: TopupDecision,
    pub admin: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTopup {
    pub topup: Topup,
    /// Amount credited to the user (zero unless approved).
    pub credited: Money,
    pub new_balance: Money,
}

/// The declare-phase state of a top-up, before any screenshot exists.
///
/// Lives only in process memory; losing it on restart moves no money.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTopupIntent {
    pub amount: Money,
    pub declared_at: DateTime<Utc>,
    pub method: Option<PaymentMethod>,
}
