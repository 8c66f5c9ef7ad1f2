use super::topup::PaymentMethod;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Feature areas that can be switched off for maintenance.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Orders,
    Topups,
    General,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Feature::Orders => "orders",
            Feature::Topups => "topups",
            Feature::General => "general",
        })
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "orders" => Ok(Feature::Orders),
            "topups" => Ok(Feature::Topups),
            "general" => Ok(Feature::General),
            other => Err(format!("unknown feature `{other}`")),
        }
    }
}

/// `true` means the feature is open to users.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(default, deny_unknown_fields)]
pub struct Maintenance {
    pub orders: bool,
    pub topups: bool,
    pub general: bool,
}

impl Default for Maintenance {
    fn default() -> Self {
        Self {
            orders: true,
            topups: true,
            general: true,
        }
    }
}

impl Maintenance {
    pub fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::Orders => self.orders,
            Feature::Topups => self.topups,
            Feature::General => self.general,
        }
    }

    fn set(&mut self, feature: Feature, enabled: bool) {
        match feature {
            Feature::Orders => self.orders = enabled,
            Feature::Topups => self.topups = enabled,
            Feature::General => self.general = enabled,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct PaymentAccount {
    pub number: String,
    pub name: String,
    /// Telegram file id of a QR code image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct PaymentInfo {
    pub kpay: PaymentAccount,
    pub wave: PaymentAccount,
}

impl Default for PaymentInfo {
    fn default() -> Self {
        Self {
            kpay: PaymentAccount {
                number: "09000000000".into(),
                name: "Shop Owner".into(),
                image: None,
            },
            wave: PaymentAccount {
                number: "09000000000".into(),
                name: "Shop Owner".into(),
                image: None,
            },
        }
    }
}

impl PaymentInfo {
    pub fn account(&self, method: PaymentMethod) -> &PaymentAccount {
        match method {
            PaymentMethod::Kpay => &self.kpay,
            PaymentMethod::Wave => &self.wave,
        }
    }

    fn account_mut(&mut self, method: PaymentMethod) -> &mut PaymentAccount {
        match method {
            PaymentMethod::Kpay => &mut self.kpay,
            PaymentMethod::Wave => &mut self.wave,
        }
    }
}

/// Which approved top-ups of a referred user earn the referrer a commission.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommissionPolicy {
    #[default]
    FirstTopup,
    EveryTopup,
}

impl fmt::Display for CommissionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommissionPolicy::FirstTopup => "first top-up only",
            CommissionPolicy::EveryTopup => "every top-up",
        })
    }
}

impl FromStr for CommissionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" | "first_topup" => Ok(CommissionPolicy::FirstTopup),
            "every" | "every_topup" => Ok(CommissionPolicy::EveryTopup),
            other => Err(format!("unknown commission policy `{other}`")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct Affiliate {
    /// Commission in percent of the approved top-up amount.
    pub percentage: Decimal,
    pub policy: CommissionPolicy,
}

impl Default for Affiliate {
    fn default() -> Self {
        Self {
            percentage: dec!(3),
            policy: CommissionPolicy::FirstTopup,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct AutoDelete {
    pub enabled: bool,
    pub delay_seconds: u64,
}

impl Default for AutoDelete {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_seconds: 60,
        }
    }
}

/// The global settings document.
///
/// Missing sections fall back to their defaults; unknown keys fail the load.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub payment_info: PaymentInfo,
    pub maintenance: Maintenance,
    pub affiliate: Affiliate,
    pub auto_delete: AutoDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentField {
    Number,
    Name,
    Image,
}

impl fmt::Display for PaymentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentField::Number => "number",
            PaymentField::Name => "name",
            PaymentField::Image => "image",
        })
    }
}

impl FromStr for PaymentField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "number" => Ok(PaymentField::Number),
            "name" => Ok(PaymentField::Name),
            "image" | "qr" => Ok(PaymentField::Image),
            other => Err(format!("unknown payment field `{other}`")),
        }
    }
}

/// A single-field patch to the settings document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingUpdate {
    Maintenance(Feature, bool),
    Payment(PaymentMethod, PaymentField, String),
    AffiliatePercentage(Decimal),
    AffiliatePolicy(CommissionPolicy),
    AutoDelete { enabled: bool, delay_seconds: u64 },
}

impl SettingUpdate {
    pub fn apply(&self, settings: &mut Settings) {
        match self {
            SettingUpdate::Maintenance(feature, enabled) => {
                settings.maintenance.set(*feature, *enabled)
            }
            SettingUpdate::Payment(method, field, value) => {
                let account = settings.payment_info.account_mut(*method);
                match field {
                    PaymentField::Number => account.number = value.clone(),
                    PaymentField::Name => account.name = value.clone(),
                    PaymentField::Image => account.image = Some(value.clone()),
                }
            }
            SettingUpdate::AffiliatePercentage(percentage) => {
                settings.affiliate.percentage = *percentage
            }
            SettingUpdate::AffiliatePolicy(policy) => settings.affiliate.policy = *policy,
            SettingUpdate::AutoDelete {
                enabled,
                delay_seconds,
            } => {
                settings.auto_delete.enabled = *enabled;
                settings.auto_delete.delay_seconds = *delay_seconds;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_fills_defaults() {
        let json = serde_json::json!({ "maintenance": { "orders": false } });
        let settings: Settings = serde_json::from_value(json).unwrap();
        assert!(!settings.maintenance.orders);
        assert!(settings.maintenance.topups);
        assert_eq!(settings.affiliate, Affiliate::default());
    }

    #[test]
    fn test_unknown_shape_is_rejected_at_load() {
        let json = serde_json::json!({ "maintenance": { "orders": "off" } });
        assert!(serde_json::from_value::<Settings>(json).is_err());

        let json = serde_json::json!({ "mystery": 1 });
        assert!(serde_json::from_value::<Settings>(json).is_err());
    }

    #[test]
    fn test_apply_patches_single_field() {
        let mut settings = Settings::default();
        SettingUpdate::Maintenance(Feature::Topups, false).apply(&mut settings);
        SettingUpdate::Payment(PaymentMethod::Wave, PaymentField::Image, "qr-file".into())
            .apply(&mut settings);

        assert!(!settings.maintenance.is_enabled(Feature::Topups));
        assert!(settings.maintenance.is_enabled(Feature::Orders));
        assert_eq!(settings.payment_info.wave.image.as_deref(), Some("qr-file"));
        assert_eq!(settings.payment_info.kpay.image, None);
    }
}
