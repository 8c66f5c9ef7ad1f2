//! Referral commissions and the `/affiliate` summary.

use super::context::WorkflowContext;
use super::event::Caller;
use super::notice::Notice;
use super::outbound::{Outbound, Recipient};
use crate::domain::ports::Commission;
use crate::error::WorkflowResult;

/// Pays the referrer of an approved top-up's owner, if one is owed.
///
/// Runs after the top-up credit has been committed, so failures here are
/// logged as inconsistencies instead of being reported to the approving
/// admin.
pub async fn on_topup_approved(ctx: &WorkflowContext, topup_id: &str) -> Vec<Outbound> {
    match pay_commission(ctx, topup_id).await {
        Ok(Some(commission)) => {
            tracing::info!(
                topup_id,
                referrer_id = %commission.referrer_id,
                amount = commission.amount.units(),
                "referral commission paid"
            );
            notify_referrer(&commission).into_iter().collect()
        }
        Ok(None) => Vec::new(),
        Err(err) => {
            tracing::error!(topup_id, error = %err, "top-up approved but commission not settled");
            Vec::new()
        }
    }
}

async fn pay_commission(
    ctx: &WorkflowContext,
    topup_id: &str,
) -> WorkflowResult<Option<Commission>> {
    let settings = ctx.store.load_settings().await?;
    let affiliate = settings.affiliate;
    Ok(ctx
        .store
        .pay_referral_commission(topup_id, affiliate.percentage, affiliate.policy)
        .await?)
}

fn notify_referrer(commission: &Commission) -> Option<Outbound> {
    let to = Recipient::user(&commission.referrer_id)?;
    Some(Outbound::message(
        to,
        Notice::CommissionEarned {
            referred_id: commission.referred_id.clone(),
            amount: commission.amount,
            balance: commission.referrer_balance,
        },
    ))
}

/// `/affiliate`
pub async fn info(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_authorized(caller).await?;
    let settings = ctx.require_open(&[]).await?;
    let user = ctx.load_user(caller).await?;
    let referrals = ctx.store.count_referrals(&user.user_id).await?;

    Ok(vec![Outbound::message(
        Recipient::Chat(chat_id),
        Notice::AffiliateInfo {
            user_id: user.user_id,
            referrals,
            earnings: user.referral_earnings,
            percentage: settings.affiliate.percentage,
            policy: settings.affiliate.policy,
        },
    )])
}
