use super::money::Money;
use super::order::{Order, OrderDecision, OrderResolution, OrderStatus, ResolvedOrder};
use super::settings::CommissionPolicy;
use super::topup::{ResolvedTopup, Topup, TopupDecision, TopupResolution, TopupStatus};
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer record with its embedded orders and top-ups.
///
/// The mutating methods below are the single-document transitions the store
/// backends apply while holding their write guard; nothing outside a store
/// calls them on a live record.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub username: String,
    pub balance: Money,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub topups: Vec<Topup>,
    pub joined_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referred_by: Option<String>,
    #[serde(default)]
    pub referral_earnings: Money,
}

impl User {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        username: impl Into<String>,
        referred_by: Option<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            username: username.into(),
            balance: Money::ZERO,
            orders: Vec::new(),
            topups: Vec::new(),
            joined_at: Utc::now(),
            referred_by,
            referral_earnings: Money::ZERO,
        }
    }

    pub fn pending_topup(&self) -> Option<&Topup> {
        self.topups.iter().find(|t| t.is_pending())
    }

    pub fn pending_topup_total(&self) -> (usize, Money) {
        self.topups
            .iter()
            .filter(|t| t.is_pending())
            .fold((0, Money::ZERO), |(n, sum), t| (n + 1, sum + t.amount))
    }

    pub fn order(&self, order_id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.order_id == order_id)
    }

    pub fn topup(&self, topup_id: &str) -> Option<&Topup> {
        self.topups.iter().find(|t| t.topup_id == topup_id)
    }

    /// The balance after applying `delta`, without changing anything.
    fn balance_after(&self, delta: Money) -> Result<Money, LedgerError> {
        self.balance
            .checked_add(delta)
            .ok_or(LedgerError::BalanceOverflow {
                balance: self.balance,
                delta,
            })
    }

    /// Applies a balance delta, refusing to go below zero.
    pub fn adjust_balance(&mut self, delta: Money) -> Result<Money, LedgerError> {
        let next = self.balance_after(delta)?;
        if next < Money::ZERO {
            return Err(LedgerError::InsufficientBalance {
                balance: self.balance,
                required: -delta,
            });
        }
        self.balance = next;
        Ok(next)
    }

    /// Debits the order's captured price and appends it, or changes nothing.
    pub fn place_order(&mut self, order: Order) -> Result<Money, LedgerError> {
        let balance = self.adjust_balance(-order.price)?;
        self.orders.push(order);
        Ok(balance)
    }

    /// Appends a top-up unless one is already awaiting review.
    pub fn push_topup(&mut self, topup: Topup) -> Result<(), LedgerError> {
        if let Some(pending) = self.pending_topup() {
            return Err(LedgerError::Conflict(format!("topup {}", pending.topup_id)));
        }
        self.topups.push(topup);
        Ok(())
    }

    /// Test-and-set on a pending order. A cancel refunds the stored price.
    pub fn resolve_order(
        &mut self,
        order_id: &str,
        resolution: &OrderResolution,
    ) -> Result<ResolvedOrder, LedgerError> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.order_id == order_id)
            .ok_or_else(|| LedgerError::NotFound(format!("order {order_id}")))?;

        if order.status != OrderStatus::Pending {
            return Err(LedgerError::Conflict(format!("order {order_id}")));
        }
        let refunded = match resolution.decision {
            OrderDecision::Confirm => Money::ZERO,
            OrderDecision::Cancel => order.price,
        };
        let new_balance = self
            .balance
            .checked_add(refunded)
            .ok_or(LedgerError::BalanceOverflow {
                balance: self.balance,
                delta: refunded,
            })?;

        order.status = resolution.decision.status();
        order.resolved_by = Some(resolution.admin.clone());
        order.resolved_at = Some(resolution.at);
        let order = order.clone();
        self.balance = new_balance;

        Ok(ResolvedOrder {
            order,
            refunded,
            new_balance,
        })
    }

    /// Test-and-set on a pending top-up. Approval credits the stored amount.
    pub fn resolve_topup(
        &mut self,
        topup_id: &str,
        resolution: &TopupResolution,
    ) -> Result<ResolvedTopup, LedgerError> {
        let topup = self
            .topups
            .iter_mut()
            .find(|t| t.topup_id == topup_id)
            .ok_or_else(|| LedgerError::NotFound(format!("topup {topup_id}")))?;

        if topup.status != TopupStatus::Pending {
            return Err(LedgerError::Conflict(format!("topup {topup_id}")));
        }
        let credited = match resolution.decision {
            TopupDecision::Approve => topup.amount,
            TopupDecision::Reject => Money::ZERO,
        };
        let new_balance = self
            .balance
            .checked_add(credited)
            .ok_or(LedgerError::BalanceOverflow {
                balance: self.balance,
                delta: credited,
            })?;

        topup.status = resolution.decision.status();
        topup.resolved_by = Some(resolution.admin.clone());
        topup.resolved_at = Some(resolution.at);
        let topup = topup.clone();
        self.balance = new_balance;

        Ok(ResolvedTopup {
            topup,
            credited,
            new_balance,
        })
    }

    /// Credits a referral commission to both the balance and the earnings
    /// total, or changes nothing.
    pub fn credit_commission(&mut self, amount: Money) -> Result<Money, LedgerError> {
        let balance = self.balance_after(amount)?;
        let earnings = self.referral_earnings.checked_add(amount).ok_or(
            LedgerError::BalanceOverflow {
                balance: self.referral_earnings,
                delta: amount,
            },
        )?;
        self.balance = balance;
        self.referral_earnings = earnings;
        Ok(balance)
    }

    /// Whether a commission is still owed for `topup_id` under `policy`.
    ///
    /// Marks the top-up as paid when it is; the caller credits the referrer
    /// in the same store transaction.
    pub fn claim_commission(
        &mut self,
        topup_id: &str,
        policy: CommissionPolicy,
    ) -> Result<Option<Money>, LedgerError> {
        let already_paid = self.topups.iter().any(|t| t.commission_paid);
        let earlier_approved = self
            .topups
            .iter()
            .any(|t| t.topup_id != topup_id && t.status == TopupStatus::Approved);

        let topup = self
            .topups
            .iter_mut()
            .find(|t| t.topup_id == topup_id)
            .ok_or_else(|| LedgerError::NotFound(format!("topup {topup_id}")))?;

        if topup.status != TopupStatus::Approved || topup.commission_paid {
            return Ok(None);
        }
        if policy == CommissionPolicy::FirstTopup && (already_paid || earlier_approved) {
            return Ok(None);
        }

        topup.commission_paid = true;
        Ok(Some(topup.amount))
    }
}
