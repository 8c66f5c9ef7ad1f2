//! Game top-up orders: placement and admin resolution.

use super::context::WorkflowContext;
use super::event::Caller;
use super::notice::Notice;
use super::outbound::{Button, Outbound, Recipient};
use crate::domain::action::CallbackAction;
use crate::domain::order::{GameAccount, Order, OrderDecision, OrderResolution, OrderStatus};
use crate::domain::pricing::resolve_price;
use crate::domain::settings::Feature;
use crate::domain::validation::{
    is_banned_account, is_valid_game_id, is_valid_pubg_id, is_valid_server_id,
};
use crate::error::{WorkflowError, WorkflowResult};
use chrono::Utc;

const MLBB_USAGE: &str = "/mmb gameid serverid amount";
const PUBG_USAGE: &str = "/pubg playerid amount";

fn parse_mlbb(args: &[String]) -> WorkflowResult<(GameAccount, String)> {
    let [game_id, server_id, sku] = args else {
        return Err(WorkflowError::InvalidFormat { usage: MLBB_USAGE });
    };
    if !is_valid_game_id(game_id) {
        return Err(WorkflowError::InvalidGameId);
    }
    if !is_valid_server_id(server_id) {
        return Err(WorkflowError::InvalidServerId);
    }
    let account = GameAccount::Mlbb {
        game_id: game_id.clone(),
        server_id: server_id.clone(),
    };
    Ok((account, sku.clone()))
}

fn parse_pubg(args: &[String]) -> WorkflowResult<(GameAccount, String)> {
    let [player_id, sku] = args else {
        return Err(WorkflowError::InvalidFormat { usage: PUBG_USAGE });
    };
    if !is_valid_pubg_id(player_id) {
        return Err(WorkflowError::InvalidPlayerId);
    }
    let account = GameAccount::Pubg {
        player_id: player_id.clone(),
    };
    Ok((account, sku.clone()))
}

/// `/mmb gameid serverid amount`
pub async fn place_mlbb(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    args: &[String],
) -> WorkflowResult<Vec<Outbound>> {
    place(ctx, caller, chat_id, args, parse_mlbb).await
}

/// `/pubg playerid amount`
pub async fn place_pubg(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    args: &[String],
) -> WorkflowResult<Vec<Outbound>> {
    place(ctx, caller, chat_id, args, parse_pubg).await
}

async fn place(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    args: &[String],
    parse: fn(&[String]) -> WorkflowResult<(GameAccount, String)>,
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_authorized(caller).await?;
    ctx.require_open(&[Feature::Orders]).await?;
    let user = ctx.load_user(caller).await?;
    ctx.require_no_pending_topup(&user).await?;

    let (account, sku) = parse(args)?;
    let target_id = match &account {
        GameAccount::Mlbb { game_id, .. } => game_id,
        GameAccount::Pubg { player_id } => player_id,
    };
    if is_banned_account(target_id) {
        return Err(WorkflowError::BannedAccount(target_id.clone()));
    }

    let catalog = account.catalog();
    let overrides = ctx.store.load_prices(catalog).await?;
    let price = resolve_price(catalog, &sku, &overrides).ok_or(WorkflowError::InvalidAmount)?;
    if user.balance < price {
        return Err(WorkflowError::InsufficientBalance {
            price,
            balance: user.balance,
        });
    }

    let order = Order {
        order_id: ctx.ids.order_id(),
        account,
        amount: sku,
        price,
        status: OrderStatus::Pending,
        timestamp: Utc::now(),
        user_id: caller.user_id.clone(),
        chat_id,
        resolved_by: None,
        resolved_at: None,
    };
    let balance = ctx.store.place_order(&caller.user_id, order.clone()).await?;
    tracing::info!(
        order_id = %order.order_id,
        user_id = %caller.user_id,
        sku = %order.amount,
        price = order.price.units(),
        "order placed"
    );

    let buttons = vec![vec![
        Button::new("Confirm", CallbackAction::ConfirmOrder(order.order_id.clone())),
        Button::new("Cancel", CallbackAction::CancelOrder(order.order_id.clone())),
    ]];
    Ok(vec![
        Outbound::message(
            Recipient::Chat(chat_id),
            Notice::OrderPlaced {
                order: order.clone(),
                balance,
            },
        ),
        Outbound::with_keyboard(
            Recipient::AdminGroup,
            Notice::OrderAlert {
                order,
                name: caller.name.clone(),
                username: caller.username.clone(),
                balance,
            },
            buttons,
        ),
    ])
}

/// Confirm or cancel a pending order from its admin alert.
pub async fn resolve(
    ctx: &WorkflowContext,
    caller: &Caller,
    chat_id: i64,
    message_id: i64,
    order_id: &str,
    decision: OrderDecision,
) -> WorkflowResult<Vec<Outbound>> {
    ctx.require_admin(caller)?;

    let resolution = OrderResolution {
        decision,
        admin: caller.name.clone(),
        at: Utc::now(),
    };
    let resolved = ctx.store.update_pending_order(order_id, resolution).await?;
    let order = &resolved.order;
    tracing::info!(
        order_id,
        admin = %caller.user_id,
        status = ?order.status,
        refunded = resolved.refunded.units(),
        "order resolved"
    );

    let summary = Notice::OrderResolved {
        order_id: order.order_id.clone(),
        status: order.status,
        admin: caller.name.clone(),
        refunded: resolved.refunded,
    };
    let to_user = match decision {
        OrderDecision::Confirm => Notice::OrderConfirmed {
            order_id: order.order_id.clone(),
            sku: order.amount.clone(),
        },
        OrderDecision::Cancel => Notice::OrderCancelled {
            order_id: order.order_id.clone(),
            refunded: resolved.refunded,
            balance: resolved.new_balance,
        },
    };

    Ok(vec![
        Outbound::edit(chat_id, message_id, summary.clone()),
        Outbound::message(Recipient::AdminGroup, summary),
        Outbound::message(Recipient::Chat(order.chat_id), to_user),
    ])
}
