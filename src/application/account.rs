//! `/start`, registration and the read-only user commands.

use super::context::WorkflowContext;
use super::event::Caller;
use super::notice::Notice;
use super::outbound::{Button, Outbound, Recipient};
use crate::domain::action::CallbackAction;
use crate::domain::pricing::{Catalog, price_list};
use crate::domain::user::User;
use crate::error::WorkflowResult;

const HISTORY_LEN: usize = 5;

/// `/start [referrer_id]`
///
/// Unauthorized callers get the access-request button. Authorized callers
/// are created on first contact (recording a referrer if given) or have
/// their profile refreshed.
pub async fn start(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    args: &[String],
) -> WorkflowResult<Vec<Outbound>> {
    if !ctx.is_authorized(&caller.user_id).await? {
        return Ok(vec![Outbound::with_keyboard(
            Recipient::Chat(chat_id),
            Notice::AccessRequired,
            vec![vec![Button::new(
                "Request access",
                CallbackAction::RequestRegister,
            )]],
        )]);
    }

    let mut out = Vec::new();
    let user = match ctx.store.get_user(&caller.user_id).await? {
        Some(user) => {
            ctx.store
                .update_profile(&caller.user_id, &caller.name, &caller.username)
                .await?;
            user
        }
        None => {
            let referrer = referrer_from(ctx, caller, args).await?;
            let user = User::new(
                &caller.user_id,
                &caller.name,
                &caller.username,
                referrer.clone(),
            );
            if ctx.store.create_user(user.clone()).await? {
                tracing::info!(user_id = %caller.user_id, referrer = ?referrer, "user created");
                if let Some(to) = referrer.as_deref().and_then(Recipient::user) {
                    out.push(Outbound::message(
                        to,
                        Notice::ReferralJoined {
                            name: caller.name.clone(),
                        },
                    ));
                }
            }
            user
        }
    };

    out.insert(
        0,
        Outbound::message(
            Recipient::Chat(chat_id),
            Notice::Welcome {
                name: caller.name.clone(),
                balance: user.balance,
            },
        ),
    );
    Ok(out)
}

/// A referrer argument counts only if it names another existing user.
async fn referrer_from(
    ctx: &WorkflowContext,
    caller: &Caller,
    args: &[String],
) -> WorkflowResult<Option<String>> {
    let Some(referrer_id) = args.first().filter(|id| **id != caller.user_id) else {
        return Ok(None);
    };
    if ctx.store.get_user(referrer_id).await?.is_none() {
        tracing::debug!(%referrer_id, "unknown referrer ignored");
        return Ok(None);
    }
    Ok(Some(referrer_id.clone()))
}

/// The access-request button.
pub async fn request_access(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
) -> WorkflowResult<Vec<Outbound>> {
    if ctx.is_authorized(&caller.user_id).await? {
        return Ok(vec![Outbound::message(
            Recipient::Chat(chat_id),
            Notice::AlreadyAuthorized,
        )]);
    }

    let keyboard = vec![vec![
        Button::new(
            "Approve",
            CallbackAction::ApproveRegister(caller.user_id.clone()),
        ),
        Button::new(
            "Reject",
            CallbackAction::RejectRegister(caller.user_id.clone()),
        ),
    ]];
    Ok(vec![
        Outbound::message(Recipient::Chat(chat_id), Notice::AccessRequested),
        Outbound::with_keyboard(
            Recipient::AdminGroup,
            Notice::AccessRequestAlert {
                user_id: caller.user_id.clone(),
                name: caller.name.clone(),
                username: caller.username.clone(),
            },
            keyboard,
        ),
    ])
}

/// Admin decision on an access request.
pub async fn resolve_access(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    message_id: i64,
    user_id: &str,
    approved: bool,
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_admin(caller)?;
    if approved {
        ctx.store.add_authorized_user(user_id).await?;
    }
    tracing::info!(%user_id, approved, admin = %caller.user_id, "access request resolved");

    let mut out = vec![Outbound::edit(
        chat_id,
        message_id,
        Notice::AccessDecision {
            user_id: user_id.to_string(),
            approved,
            admin: caller.name.clone(),
        },
    )];
    if let Some(to) = Recipient::user(user_id) {
        let notice = if approved {
            Notice::AccessGranted
        } else {
            Notice::AccessDenied
        };
        out.push(Outbound::message(to, notice));
    }
    Ok(out)
}

/// `/balance`
pub async fn balance(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_authorized(caller).await?;
    ctx.require_open(&[]).await?;
    let user = ctx.load_user(caller).await?;
    ctx.store
        .update_profile(&caller.user_id, &caller.name, &caller.username)
        .await?;

    let (pending_topups, pending_amount) = user.pending_topup_total();
    Ok(vec![Outbound::message(
        Recipient::Chat(chat_id),
        Notice::Balance {
            balance: user.balance,
            pending_topups,
            pending_amount,
            orders: user.orders.len(),
            topups: user.topups.len(),
        },
    )])
}

/// `/history`: the most recent orders and top-ups, newest first.
pub async fn history(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_authorized(caller).await?;
    ctx.require_open(&[]).await?;
    let user = ctx.load_user(caller).await?;

    let orders = user.orders.iter().rev().take(HISTORY_LEN).cloned().collect();
    let topups = user.topups.iter().rev().take(HISTORY_LEN).cloned().collect();
    Ok(vec![Outbound::message(
        Recipient::Chat(chat_id),
        Notice::History { orders, topups },
    )])
}

/// `/price`
pub async fn prices(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_authorized(caller).await?;
    ctx.require_open(&[]).await?;
    let mlbb = ctx.store.load_prices(Catalog::Mlbb).await?;
    let pubg = ctx.store.load_prices(Catalog::Pubg).await?;

    Ok(vec![Outbound::message(
        Recipient::Chat(chat_id),
        Notice::PriceList {
            mlbb: price_list(Catalog::Mlbb, &mlbb),
            pubg: price_list(Catalog::Pubg, &pubg),
        },
    )])
}
