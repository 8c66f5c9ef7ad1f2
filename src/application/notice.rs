use crate::domain::money::Money;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::pricing::Catalog;
use crate::domain::settings::{CommissionPolicy, Feature, PaymentAccount, PaymentField};
use crate::domain::topup::{PaymentMethod, Topup, TopupStatus};
use crate::error::WorkflowError;
use rust_decimal::Decimal;
use std::fmt;

/// Everything the bot can say, as typed data.
///
/// Rendering to text happens only in `Display`; workflows and tests match on
/// the variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Welcome {
        name: String,
        balance: Money,
    },
    AccessRequired,
    AccessRequested,
    AccessRequestAlert {
        user_id: String,
        name: String,
        username: String,
    },
    AccessGranted,
    AccessDenied,
    AccessDecision {
        user_id: String,
        approved: bool,
        admin: String,
    },
    AlreadyAuthorized,
    ReferralJoined {
        name: String,
    },
    Balance {
        balance: Money,
        pending_topups: usize,
        pending_amount: Money,
        orders: usize,
        topups: usize,
    },
    History {
        orders: Vec<Order>,
        topups: Vec<Topup>,
    },
    PriceList {
        mlbb: Vec<(String, Money)>,
        pubg: Vec<(String, Money)>,
    },
    AffiliateInfo {
        user_id: String,
        referrals: usize,
        earnings: Money,
        percentage: Decimal,
        policy: CommissionPolicy,
    },

    OrderPlaced {
        order: Order,
        balance: Money,
    },
    OrderAlert {
        order: Order,
        name: String,
        username: String,
        balance: Money,
    },
    OrderConfirmed {
        order_id: String,
        sku: String,
    },
    OrderCancelled {
        order_id: String,
        refunded: Money,
        balance: Money,
    },
    OrderResolved {
        order_id: String,
        status: OrderStatus,
        admin: String,
        refunded: Money,
    },
    BannedAccountAlert {
        user_id: String,
        name: String,
        game_id: String,
    },

    TopupDeclared {
        amount: Money,
    },
    PaymentInstructions {
        method: PaymentMethod,
        amount: Money,
        account: PaymentAccount,
    },
    PaymentQr {
        method: PaymentMethod,
        account: PaymentAccount,
    },
    TopupSubmitted {
        topup_id: String,
        amount: Money,
    },
    TopupAlert {
        topup: Topup,
        name: String,
        username: String,
    },
    TopupApproved {
        topup_id: String,
        amount: Money,
        balance: Money,
    },
    TopupRejected {
        topup_id: String,
        amount: Money,
    },
    TopupResolved {
        topup_id: String,
        status: TopupStatus,
        admin: String,
        amount: Money,
    },
    TopupCancelled,
    CommissionEarned {
        referred_id: String,
        amount: Money,
        balance: Money,
    },

    PricesUpdated {
        catalog: Catalog,
        entries: Vec<(String, Money)>,
    },
    MaintenanceUpdated {
        feature: Feature,
        enabled: bool,
    },
    PaymentUpdated {
        method: PaymentMethod,
        field: PaymentField,
    },
    AffiliateUpdated {
        percentage: Decimal,
        policy: CommissionPolicy,
    },
    AutoDeleteUpdated {
        enabled: bool,
        delay_seconds: u64,
    },
    UserBanned {
        user_id: String,
    },
    UserUnbanned {
        user_id: String,
    },
    AccessRevoked,
    BalanceDeducted {
        user_id: String,
        amount: Money,
        balance: Money,
    },
    DeductionNotice {
        amount: Money,
        balance: Money,
    },

    Rejected(WorkflowError),
    UnknownCommand(String),
    UnknownAction,
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

fn write_rejection(f: &mut fmt::Formatter<'_>, err: &WorkflowError) -> fmt::Result {
    match err {
        WorkflowError::InvalidFormat { usage } => write!(f, "Invalid format. Usage: {usage}"),
        WorkflowError::InvalidAmount => f.write_str("Invalid amount."),
        WorkflowError::InvalidGameId => f.write_str("Invalid game id: it must be 6-10 digits."),
        WorkflowError::InvalidServerId => {
            f.write_str("Invalid server id: it must be 3-5 digits.")
        }
        WorkflowError::InvalidPlayerId => {
            f.write_str("Invalid player id: it must be 7-11 digits.")
        }
        WorkflowError::NotAuthorized => {
            f.write_str("You are not authorized to use this bot. Send /start to request access.")
        }
        WorkflowError::NotAdmin => f.write_str("This command is for admins only."),
        WorkflowError::MaintenanceActive(feature) => {
            write!(f, "{feature} are temporarily closed for maintenance.")
        }
        WorkflowError::InsufficientBalance { price, balance } => write!(
            f,
            "Insufficient balance. Price: {price}, balance: {balance}, short by {}. Use /topup to add funds.",
            err.shortfall().unwrap_or_default()
        ),
        WorkflowError::BannedAccount(game_id) => {
            write!(f, "Game account {game_id} cannot be served.")
        }
        WorkflowError::PendingTopup => f.write_str(
            "You have a top-up awaiting admin review. Please wait until it is processed.",
        ),
        WorkflowError::NoPendingIntent => f.write_str("There is no top-up in progress."),
        WorkflowError::Conflict(what) => write!(f, "{what} was already processed."),
        WorkflowError::NotFound(what) => write!(f, "{what} was not found."),
        WorkflowError::StoreUnavailable | WorkflowError::Inconsistent(_) => {
            f.write_str("Service temporarily unavailable, please try again later.")
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Welcome { name, balance } => write!(
                f,
                "Welcome, {name}! Balance: {balance}.\n\
                 /mmb gameid serverid amount - order diamonds\n\
                 /pubg playerid amount - order UC\n\
                 /topup amount - add balance\n\
                 /balance /price /history /affiliate"
            ),
            Notice::AccessRequired => {
                f.write_str("You are not authorized yet. Request access from the owner below.")
            }
            Notice::AccessRequested => {
                f.write_str("Access requested. You will be notified once an admin decides.")
            }
            Notice::AccessRequestAlert {
                user_id,
                name,
                username,
            } => write!(f, "Access request from {name} (@{username}, id {user_id})"),
            Notice::AccessGranted => f.write_str("Access granted. Send /start to begin."),
            Notice::AccessDenied => f.write_str("Your access request was declined."),
            Notice::AccessDecision {
                user_id,
                approved,
                admin,
            } => {
                let verdict = if *approved { "approved" } else { "rejected" };
                write!(f, "Access request of {user_id} {verdict} by {admin}")
            }
            Notice::AlreadyAuthorized => f.write_str("You already have access."),
            Notice::ReferralJoined { name } => write!(f, "{name} joined through your referral link."),
            Notice::Balance {
                balance,
                pending_topups,
                pending_amount,
                orders,
                topups,
            } => {
                write!(f, "Balance: {balance}\nOrders: {orders}\nTop-ups: {topups}")?;
                if *pending_topups > 0 {
                    write!(f, "\nPending top-ups: {pending_topups} ({pending_amount})")?;
                }
                Ok(())
            }
            Notice::History { orders, topups } => {
                if orders.is_empty() && topups.is_empty() {
                    return f.write_str("No history yet.");
                }
                f.write_str("Recent orders:")?;
                for order in orders {
                    write!(
                        f,
                        "\n{} {} {} {:?}",
                        order.order_id, order.amount, order.price, order.status
                    )?;
                }
                f.write_str("\nRecent top-ups:")?;
                for topup in topups {
                    write!(
                        f,
                        "\n{} {} {} {:?}",
                        topup.topup_id, topup.amount, topup.payment_method, topup.status
                    )?;
                }
                Ok(())
            }
            Notice::PriceList { mlbb, pubg } => {
                f.write_str("MLBB diamonds:")?;
                for (sku, price) in mlbb {
                    write!(f, "\n{sku}: {price}")?;
                }
                f.write_str("\nPUBG UC:")?;
                for (sku, price) in pubg {
                    write!(f, "\n{sku}: {price}")?;
                }
                Ok(())
            }
            Notice::AffiliateInfo {
                user_id,
                referrals,
                earnings,
                percentage,
                policy,
            } => write!(
                f,
                "Referral code: /start {user_id}\nReferrals: {referrals}\nEarnings: {earnings}\nCommission: {percentage}% on {policy}"
            ),

            Notice::OrderPlaced { order, balance } => write!(
                f,
                "Order {} placed: {} for {} at {}. New balance: {balance}. Awaiting confirmation.",
                order.order_id, order.amount, order.account, order.price
            ),
            Notice::OrderAlert {
                order,
                name,
                username,
                balance,
            } => write!(
                f,
                "New order {}\nUser: {name} (@{username}, id {})\nAccount: {}\nItem: {}\nPrice: {}\nBalance after: {balance}",
                order.order_id, order.user_id, order.account, order.amount, order.price
            ),
            Notice::OrderConfirmed { order_id, sku } => {
                write!(f, "Order {order_id} ({sku}) confirmed and delivered.")
            }
            Notice::OrderCancelled {
                order_id,
                refunded,
                balance,
            } => write!(
                f,
                "Order {order_id} was cancelled. Refunded {refunded}. New balance: {balance}."
            ),
            Notice::OrderResolved {
                order_id,
                status,
                admin,
                refunded,
            } => match status {
                OrderStatus::Cancelled => {
                    write!(f, "Order {order_id} cancelled by {admin}, refunded {refunded}")
                }
                _ => write!(f, "Order {order_id} confirmed by {admin}"),
            },
            Notice::BannedAccountAlert {
                user_id,
                name,
                game_id,
            } => write!(f, "Banned game account {game_id} used by {name} (id {user_id})"),

            Notice::TopupDeclared { amount } => {
                write!(f, "Top-up of {amount}. Choose a payment method.")
            }
            Notice::PaymentInstructions {
                method,
                amount,
                account,
            } => write!(
                f,
                "Top-up of {amount} via {method}\nNumber: {}\nName: {}\nTransfer the amount, then send the screenshot here. /cancel to abort.",
                account.number, account.name
            ),
            Notice::PaymentQr { method, account } => write!(
                f,
                "{method} QR\nNumber: {}\nName: {}",
                account.number, account.name
            ),
            Notice::TopupSubmitted { topup_id, amount } => write!(
                f,
                "Top-up {topup_id} of {amount} submitted. An admin will review it shortly."
            ),
            Notice::TopupAlert {
                topup,
                name,
                username,
            } => write!(
                f,
                "Top-up request {}\nUser: {name} (@{username}, id {})\nAmount: {}\nMethod: {}",
                topup.topup_id, topup.user_id, topup.amount, topup.payment_method
            ),
            Notice::TopupApproved {
                topup_id,
                amount,
                balance,
            } => write!(
                f,
                "Top-up {topup_id} approved: {amount} added. New balance: {balance}."
            ),
            Notice::TopupRejected { topup_id, amount } => {
                write!(f, "Top-up {topup_id} of {amount} was rejected.")
            }
            Notice::TopupResolved {
                topup_id,
                status,
                admin,
                amount,
            } => match status {
                TopupStatus::Approved => {
                    write!(f, "Top-up {topup_id} ({amount}) approved by {admin}")
                }
                _ => write!(f, "Top-up {topup_id} ({amount}) rejected by {admin}"),
            },
            Notice::TopupCancelled => f.write_str("Top-up cancelled. Use /topup to start again."),
            Notice::CommissionEarned {
                referred_id,
                amount,
                balance,
            } => write!(
                f,
                "You earned {amount} commission from referral {referred_id}. New balance: {balance}."
            ),

            Notice::PricesUpdated { catalog, entries } => {
                write!(f, "Updated {} {catalog} price(s):", entries.len())?;
                for (sku, price) in entries {
                    write!(f, "\n{sku}: {price}")?;
                }
                Ok(())
            }
            Notice::MaintenanceUpdated { feature, enabled } => {
                write!(f, "{feature} turned {}", on_off(*enabled))
            }
            Notice::PaymentUpdated { method, field } => {
                write!(f, "{method} {field} updated")
            }
            Notice::AffiliateUpdated { percentage, policy } => {
                write!(f, "Affiliate commission set to {percentage}% on {policy}")
            }
            Notice::AutoDeleteUpdated {
                enabled,
                delay_seconds,
            } => write!(
                f,
                "Auto-delete turned {} ({delay_seconds}s)",
                on_off(*enabled)
            ),
            Notice::UserBanned { user_id } => write!(f, "User {user_id} banned"),
            Notice::UserUnbanned { user_id } => write!(f, "User {user_id} unbanned"),
            Notice::AccessRevoked => f.write_str("Your access to this bot was revoked."),
            Notice::BalanceDeducted {
                user_id,
                amount,
                balance,
            } => write!(
                f,
                "Deducted {amount} from {user_id}. New balance: {balance}"
            ),
            Notice::DeductionNotice { amount, balance } => write!(
                f,
                "{amount} was deducted from your balance. New balance: {balance}."
            ),

            Notice::Rejected(err) => write_rejection(f, err),
            Notice::UnknownCommand(name) => write!(f, "Unknown command /{name}."),
            Notice::UnknownAction => f.write_str("This button is no longer valid."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance_names_the_shortfall() {
        let notice = Notice::Rejected(WorkflowError::InsufficientBalance {
            price: Money::new(5100),
            balance: Money::new(4050),
        });
        let text = notice.to_string();
        assert!(text.contains("5100 MMK"));
        assert!(text.contains("short by 1050 MMK"));
    }

    #[test]
    fn test_store_failures_render_a_generic_retry() {
        let down = Notice::Rejected(WorkflowError::StoreUnavailable).to_string();
        let broken = Notice::Rejected(WorkflowError::Inconsistent("order ORD1".into())).to_string();
        assert_eq!(down, broken);
        assert!(!broken.contains("ORD1"));
    }

    #[test]
    fn test_balance_hides_pending_line_when_nothing_pending() {
        let text = Notice::Balance {
            balance: Money::new(5000),
            pending_topups: 0,
            pending_amount: Money::ZERO,
            orders: 1,
            topups: 1,
        }
        .to_string();
        assert!(text.starts_with("Balance: 5000 MMK"));
        assert!(!text.contains("Pending"));
    }
}
