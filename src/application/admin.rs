//! Admin commands: prices, settings, bans and balance corrections.

use super::context::WorkflowContext;
use super::event::Caller;
use super::notice::Notice;
use super::outbound::{Outbound, Recipient};
use crate::domain::money::Money;
use crate::domain::pricing::{
    BatchError, Catalog, DOUBLE_SKUS, MAX_PRICE, NORMAL_SKUS, batch_prices, weekly_pass_prices,
    weekly_pass_weeks,
};
use crate::domain::settings::{
    CommissionPolicy, Feature, PaymentField, SettingUpdate,
};
use crate::domain::topup::PaymentMethod;
use crate::error::{WorkflowError, WorkflowResult};
use rust_decimal::Decimal;

const SETPRICE_USAGE: &str = "/setprice item price | /setprice normal p1..p23 | /setprice 2x p1..p4";
const SETPUBGPRICE_USAGE: &str = "/setpubgprice item price";
const MAINTENANCE_USAGE: &str = "/maintenance orders|topups|general on|off";
const SETPAYMENT_USAGE: &str = "/setpayment kpay|wave number|name|image value";
const AFFILIATE_USAGE: &str = "/affiliateconfig percentage [first|every]";
const AUTODELETE_USAGE: &str = "/autodelete on|off [seconds]";
const BAN_USAGE: &str = "/ban user_id";
const UNBAN_USAGE: &str = "/unban user_id";
const DEDUCT_USAGE: &str = "/deduct user_id amount";

fn parse_switch(raw: &str) -> Option<bool> {
    match raw {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}

fn parse_price(raw: &str) -> WorkflowResult<Money> {
    match raw.parse::<i64>() {
        Ok(units) if (0..=MAX_PRICE.units()).contains(&units) => Ok(Money::new(units)),
        _ => Err(WorkflowError::InvalidAmount),
    }
}

fn reply(chat_id: i64, notice: Notice) -> WorkflowResult<Vec<Outbound>> {
    Ok(vec![Outbound::message(Recipient::Chat(chat_id), notice)])
}

/// Works out which MLBB entries a `/setprice` invocation writes.
fn mlbb_price_entries(args: &[String]) -> WorkflowResult<Vec<(String, Money)>> {
    let batch = |skus: &[&str], raw: &[String]| {
        let raw: Vec<&str> = raw.iter().map(String::as_str).collect();
        batch_prices(skus, &raw).map_err(|err| match err {
            BatchError::Count { .. } => WorkflowError::InvalidFormat {
                usage: SETPRICE_USAGE,
            },
            BatchError::Price(_) => WorkflowError::InvalidAmount,
        })
    };

    match args {
        [kind, rest @ ..] if kind == "normal" => batch(&NORMAL_SKUS, rest),
        [kind, rest @ ..] if kind == "2x" => batch(&DOUBLE_SKUS, rest),
        [sku, price] => {
            let price = parse_price(price)?;
            match weekly_pass_weeks(sku) {
                Some(weeks) => weekly_pass_prices(price, weeks).ok_or(WorkflowError::InvalidAmount),
                None => Ok(vec![(sku.clone(), price)]),
            }
        }
        _ => Err(WorkflowError::InvalidFormat {
            usage: SETPRICE_USAGE,
        }),
    }
}

async fn write_prices(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    catalog: Catalog,
    entries: Vec<(String, Money)>,
) -> WorkflowResult<Vec<Outbound>> {
    ctx.store.merge_prices(catalog, entries.clone()).await?;
    tracing::info!(%catalog, count = entries.len(), admin = %caller.user_id, "prices updated");
    reply(chat_id, Notice::PricesUpdated { catalog, entries })
}

/// `/setprice`
pub async fn set_price(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    args: &[String],
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_admin(caller)?;
    let entries = mlbb_price_entries(args)?;
    write_prices(ctx, caller, chat_id, Catalog::Mlbb, entries).await
}

/// `/setpubgprice`
pub async fn set_pubg_price(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    args: &[String],
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_admin(caller)?;
    let [sku, price] = args else {
        return Err(WorkflowError::InvalidFormat {
            usage: SETPUBGPRICE_USAGE,
        });
    };
    let entries = vec![(sku.clone(), parse_price(price)?)];
    write_prices(ctx, caller, chat_id, Catalog::Pubg, entries).await
}

/// `/maintenance`
pub async fn maintenance(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    args: &[String],
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_admin(caller)?;
    let usage = WorkflowError::InvalidFormat {
        usage: MAINTENANCE_USAGE,
    };
    let [feature, switch] = args else {
        return Err(usage);
    };
    let (Ok(feature), Some(enabled)) = (feature.parse::<Feature>(), parse_switch(switch)) else {
        return Err(usage);
    };

    ctx.store
        .update_setting(SettingUpdate::Maintenance(feature, enabled))
        .await?;
    tracing::info!(%feature, enabled, admin = %caller.user_id, "maintenance switched");
    reply(chat_id, Notice::MaintenanceUpdated { feature, enabled })
}

/// `/setpayment`; the value may contain spaces.
pub async fn set_payment(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    args: &[String],
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_admin(caller)?;
    let usage = WorkflowError::InvalidFormat {
        usage: SETPAYMENT_USAGE,
    };
    let [method, field, value @ ..] = args else {
        return Err(usage);
    };
    let (Ok(method), Ok(field)) = (method.parse::<PaymentMethod>(), field.parse::<PaymentField>())
    else {
        return Err(usage);
    };
    if value.is_empty() {
        return Err(usage);
    }

    ctx.store
        .update_setting(SettingUpdate::Payment(method, field, value.join(" ")))
        .await?;
    reply(chat_id, Notice::PaymentUpdated { method, field })
}

/// `/affiliateconfig`
pub async fn affiliate_config(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    args: &[String],
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_admin(caller)?;
    let usage = WorkflowError::InvalidFormat {
        usage: AFFILIATE_USAGE,
    };
    let (raw_percentage, raw_policy) = match args {
        [percentage] => (percentage, None),
        [percentage, policy] => (percentage, Some(policy)),
        _ => return Err(usage),
    };
    let percentage = raw_percentage
        .parse::<Decimal>()
        .ok()
        .filter(|p| (Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(p))
        .ok_or(WorkflowError::InvalidAmount)?;
    let policy = raw_policy
        .map(|raw| raw.parse::<CommissionPolicy>())
        .transpose()
        .map_err(|_| usage)?;

    let mut settings = ctx
        .store
        .update_setting(SettingUpdate::AffiliatePercentage(percentage))
        .await?;
    if let Some(policy) = policy {
        settings = ctx
            .store
            .update_setting(SettingUpdate::AffiliatePolicy(policy))
            .await?;
    }
    reply(
        chat_id,
        Notice::AffiliateUpdated {
            percentage: settings.affiliate.percentage,
            policy: settings.affiliate.policy,
        },
    )
}

/// `/autodelete`; the delay is kept as is when omitted.
pub async fn auto_delete(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    args: &[String],
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_admin(caller)?;
    let usage = WorkflowError::InvalidFormat {
        usage: AUTODELETE_USAGE,
    };
    let (switch, delay) = match args {
        [switch] => (switch, None),
        [switch, delay] => (switch, Some(delay)),
        _ => return Err(usage),
    };
    let enabled = parse_switch(switch).ok_or(usage)?;
    let delay_seconds = match delay {
        Some(raw) => raw
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(WorkflowError::InvalidAmount)?,
        None => ctx.store.load_settings().await?.auto_delete.delay_seconds,
    };

    ctx.store
        .update_setting(SettingUpdate::AutoDelete {
            enabled,
            delay_seconds,
        })
        .await?;
    reply(
        chat_id,
        Notice::AutoDeleteUpdated {
            enabled,
            delay_seconds,
        },
    )
}

/// `/ban user_id` revokes access; `/unban user_id` restores it.
pub async fn set_access(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    args: &[String],
    allowed: bool,
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_admin(caller)?;
    let [user_id] = args else {
        let usage = if allowed { UNBAN_USAGE } else { BAN_USAGE };
        return Err(WorkflowError::InvalidFormat { usage });
    };

    let (ack, to_user) = if allowed {
        ctx.store.add_authorized_user(user_id).await?;
        let ack = Notice::UserUnbanned {
            user_id: user_id.clone(),
        };
        (ack, Notice::AccessGranted)
    } else {
        ctx.store.remove_authorized_user(user_id).await?;
        let ack = Notice::UserBanned {
            user_id: user_id.clone(),
        };
        (ack, Notice::AccessRevoked)
    };
    tracing::info!(%user_id, allowed, admin = %caller.user_id, "access changed");

    let mut out = vec![Outbound::message(Recipient::Chat(chat_id), ack)];
    out.extend(Recipient::user(user_id).map(|to| Outbound::message(to, to_user)));
    Ok(out)
}

/// `/deduct user_id amount`
pub async fn deduct(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    args: &[String],
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_admin(caller)?;
    let [user_id, raw] = args else {
        return Err(WorkflowError::InvalidFormat {
            usage: DEDUCT_USAGE,
        });
    };
    let amount = parse_price(raw)?;
    if !amount.is_positive() {
        return Err(WorkflowError::InvalidAmount);
    }

    let balance = ctx.store.adjust_balance(user_id, -amount).await?;
    tracing::info!(%user_id, amount = amount.units(), admin = %caller.user_id, "balance deducted");

    let mut out = vec![Outbound::message(
        Recipient::Chat(chat_id),
        Notice::BalanceDeducted {
            user_id: user_id.clone(),
            amount,
            balance,
        },
    )];
    out.extend(
        Recipient::user(user_id)
            .map(|to| Outbound::message(to, Notice::DeductionNotice { amount, balance })),
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_weekly_pass_expands_to_all_weeks() {
        let entries = mlbb_price_entries(&args(&["wp10", "60000"])).unwrap();
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0], ("wp1".to_string(), Money::new(6000)));
        assert_eq!(entries[9], ("wp10".to_string(), Money::new(60000)));
    }

    #[test]
    fn test_batch_needs_exact_count() {
        let mut raw = vec!["2x".to_string()];
        raw.extend(["1000", "2000", "3000"].map(String::from));
        assert_eq!(
            mlbb_price_entries(&raw),
            Err(WorkflowError::InvalidFormat {
                usage: SETPRICE_USAGE
            })
        );

        raw.push("4000".into());
        let entries = mlbb_price_entries(&raw).unwrap();
        assert_eq!(entries[3], ("565".to_string(), Money::new(4000)));
    }

    #[test]
    fn test_single_price_rejects_garbage() {
        assert_eq!(
            mlbb_price_entries(&args(&["86", "cheap"])),
            Err(WorkflowError::InvalidAmount)
        );
        assert_eq!(
            mlbb_price_entries(&args(&["86"])),
            Err(WorkflowError::InvalidFormat {
                usage: SETPRICE_USAGE
            })
        );
    }

    #[test]
    fn test_prices_above_ceiling_are_refused() {
        let max = i64::MAX.to_string();
        assert_eq!(
            mlbb_price_entries(&args(&["wp1", max.as_str()])),
            Err(WorkflowError::InvalidAmount)
        );
        assert_eq!(
            mlbb_price_entries(&args(&["86", "1000000001"])),
            Err(WorkflowError::InvalidAmount)
        );
        let entries = mlbb_price_entries(&args(&["wp1", "1000000000"])).unwrap();
        assert_eq!(entries[9], ("wp10".to_string(), Money::new(10_000_000_000)));
    }
}
