//! Balance top-ups: declare, pick a method, send proof, admin review.

use super::affiliate;
use super::context::WorkflowContext;
use super::event::Caller;
use super::notice::Notice;
use super::outbound::{Button, Outbound, Recipient};
use crate::domain::action::CallbackAction;
use crate::domain::money::Money;
use crate::domain::settings::Feature;
use crate::domain::topup::{PaymentMethod, Topup, TopupDecision, TopupResolution, TopupStatus};
use crate::error::{WorkflowError, WorkflowResult};
use chrono::Utc;

/// Smallest amount accepted by `/topup`.
pub const MIN_TOPUP: Money = Money(1000);
/// Largest amount a single top-up may declare or approve.
pub const MAX_TOPUP: Money = Money(10_000_000);

const TOPUP_USAGE: &str = "/topup amount";
const APPROVE_USAGE: &str = "/approve user_id amount";
const PROOF_USAGE: &str = "/topup amount, choose a payment method, then send the screenshot";

fn parse_amount(raw: &str, min: Money) -> WorkflowResult<Money> {
    match raw.parse::<i64>() {
        Ok(units) if (min..=MAX_TOPUP).contains(&Money::new(units)) => Ok(Money::new(units)),
        _ => Err(WorkflowError::InvalidAmount),
    }
}

/// `/topup amount`
pub async fn declare(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    args: &[String],
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_authorized(caller).await?;
    ctx.require_open(&[Feature::Topups]).await?;
    let user = ctx.load_user(caller).await?;
    if user.pending_topup().is_some() {
        return Err(WorkflowError::PendingTopup);
    }

    let [raw] = args else {
        return Err(WorkflowError::InvalidFormat { usage: TOPUP_USAGE });
    };
    let amount = parse_amount(raw, MIN_TOPUP)?;
    ctx.intents.declare(&caller.user_id, amount).await;

    let keyboard = vec![
        vec![
            Button::new(
                PaymentMethod::Kpay.display_name(),
                CallbackAction::SelectPayment(PaymentMethod::Kpay, amount),
            ),
            Button::new(
                PaymentMethod::Wave.display_name(),
                CallbackAction::SelectPayment(PaymentMethod::Wave, amount),
            ),
        ],
        vec![Button::new("Cancel", CallbackAction::CancelTopup)],
    ];
    Ok(vec![Outbound::with_keyboard(
        Recipient::Chat(chat_id),
        Notice::TopupDeclared { amount },
        keyboard,
    )])
}

/// A payment-method button under the declare message.
pub async fn select_method(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    message_id: i64,
    method: PaymentMethod,
    amount: Money,
) -> WorkflowResult<Vec<Outbound>> {
    let settings = ctx.require_open(&[Feature::Topups]).await?;
    let intent = ctx
        .intents
        .select_method(&caller.user_id, amount, method)
        .await?;
    let account = settings.payment_info.account(method).clone();

    let mut out = Vec::with_capacity(2);
    if let Some(file_id) = account.image.clone() {
        out.push(Outbound::Photo {
            to: Recipient::Chat(chat_id),
            file_id,
            notice: Notice::PaymentQr {
                method,
                account: account.clone(),
            },
            keyboard: Vec::new(),
        });
    }
    out.push(Outbound::edit(
        chat_id,
        message_id,
        Notice::PaymentInstructions {
            method,
            amount: intent.amount,
            account,
        },
    ));
    Ok(out)
}

/// A photo from the user, taken as proof for the declared top-up.
pub async fn submit_proof(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    file_id: &str,
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_authorized(caller).await?;
    ctx.require_open(&[Feature::Topups]).await?;
    let intent = ctx
        .intents
        .take(&caller.user_id)
        .await
        .ok_or(WorkflowError::NoPendingIntent)?;
    let Some(method) = intent.method else {
        ctx.intents.restore(&caller.user_id, intent).await;
        return Err(WorkflowError::InvalidFormat { usage: PROOF_USAGE });
    };

    let topup = Topup {
        topup_id: ctx.ids.topup_id(),
        amount: intent.amount,
        payment_method: method,
        proof_file_id: file_id.to_string(),
        status: TopupStatus::Pending,
        timestamp: Utc::now(),
        user_id: caller.user_id.clone(),
        chat_id,
        resolved_by: None,
        resolved_at: None,
        commission_paid: false,
    };

    match store_topup(ctx, caller, topup.clone()).await {
        Ok(()) => {}
        Err(WorkflowError::Conflict(_)) => return Err(WorkflowError::PendingTopup),
        Err(err) => {
            ctx.intents.restore(&caller.user_id, intent).await;
            return Err(err);
        }
    }
    tracing::info!(
        topup_id = %topup.topup_id,
        user_id = %caller.user_id,
        amount = topup.amount.units(),
        method = method.code(),
        "top-up submitted"
    );

    let keyboard = vec![vec![
        Button::new("Approve", CallbackAction::ApproveTopup(topup.topup_id.clone())),
        Button::new("Reject", CallbackAction::RejectTopup(topup.topup_id.clone())),
    ]];
    Ok(vec![
        Outbound::message(
            Recipient::Chat(chat_id),
            Notice::TopupSubmitted {
                topup_id: topup.topup_id.clone(),
                amount: topup.amount,
            },
        ),
        Outbound::Photo {
            to: Recipient::AdminGroup,
            file_id: file_id.to_string(),
            notice: Notice::TopupAlert {
                topup,
                name: caller.name.clone(),
                username: caller.username.clone(),
            },
            keyboard,
        },
    ])
}

async fn store_topup(ctx: &WorkflowContext, caller: &Caller, topup: Topup) -> WorkflowResult<()> {
    ctx.load_user(caller).await?;
    ctx.store.append_topup(&caller.user_id, topup).await?;
    Ok(())
}

/// `/cancel` or the Cancel button; `message_id` is set for the button.
pub async fn cancel(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    message_id: Option<i64>,
) -> WorkflowResult<Vec<Outbound>> {
    if !ctx.intents.discard(&caller.user_id).await {
        return Err(WorkflowError::NoPendingIntent);
    }
    let out = match message_id {
        Some(message_id) => Outbound::edit(chat_id, message_id, Notice::TopupCancelled),
        None => Outbound::message(Recipient::Chat(chat_id), Notice::TopupCancelled),
    };
    Ok(vec![out])
}

/// Approve or reject a pending top-up from its admin alert.
pub async fn resolve(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    message_id: i64,
    topup_id: &str,
    decision: TopupDecision,
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_admin(caller)?;
    let (summary, mut out) = settle(ctx, caller, topup_id, decision).await?;
    out.insert(0, Outbound::edit(chat_id, message_id, summary));
    Ok(out)
}

/// `/approve user_id amount`: approves the user's pending top-up of that
/// amount without going through the alert.
pub async fn approve_manual(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    args: &[String],
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_admin(caller)?;
    let [user_id, raw] = args else {
        return Err(WorkflowError::InvalidFormat {
            usage: APPROVE_USAGE,
        });
    };
    let amount = parse_amount(raw, Money::new(1))?;
    let topup_id = ctx
        .store
        .find_pending_topup(user_id, amount)
        .await?
        .ok_or_else(|| WorkflowError::NotFound(format!("pending top-up of {amount} for {user_id}")))?;

    let (summary, mut out) = settle(ctx, caller, &topup_id, TopupDecision::Approve).await?;
    out.insert(0, Outbound::message(Recipient::Chat(chat_id), summary));
    Ok(out)
}

/// Applies the decision and builds the user and affiliate notifications.
/// Returns the admin-facing summary separately.
async fn settle(
    ctx: &WorkflowContext,
    caller: &Caller,
    topup_id: &str,
    decision: TopupDecision,
) -> WorkflowResult<(Notice, Vec<Outbound>)> {
    let resolution = TopupResolution {
        decision,
        admin: caller.name.clone(),
        at: Utc::now(),
    };
    let resolved = ctx.store.update_pending_topup(topup_id, resolution).await?;
    let topup = &resolved.topup;
    tracing::info!(
        topup_id,
        admin = %caller.user_id,
        status = ?topup.status,
        credited = resolved.credited.units(),
        "top-up resolved"
    );

    let summary = Notice::TopupResolved {
        topup_id: topup.topup_id.clone(),
        status: topup.status,
        admin: caller.name.clone(),
        amount: topup.amount,
    };
    let to_user = match decision {
        TopupDecision::Approve => Notice::TopupApproved {
            topup_id: topup.topup_id.clone(),
            amount: resolved.credited,
            balance: resolved.new_balance,
        },
        TopupDecision::Reject => Notice::TopupRejected {
            topup_id: topup.topup_id.clone(),
            amount: topup.amount,
        },
    };

    let mut out = vec![Outbound::message(Recipient::Chat(topup.chat_id), to_user)];
    if decision == TopupDecision::Approve {
        out.extend(affiliate::on_topup_approved(ctx, topup_id).await);
    }
    Ok((summary, out))
}
