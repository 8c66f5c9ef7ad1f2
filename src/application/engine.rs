use super::context::WorkflowContext;
use super::event::{Caller, Inbound};
use super::notice::Notice;
use super::outbound::{Outbound, Recipient};
use super::{account, admin, affiliate, order, topup};
use crate::domain::action::CallbackAction;
use crate::domain::order::OrderDecision;
use crate::domain::topup::TopupDecision;
use crate::error::{WorkflowError, WorkflowResult};
use std::sync::Arc;

/// The entry point for every inbound bot event.
///
/// `LedgerEngine` routes commands, button presses and photos to their
/// workflow and turns each outcome, including rejections, into delivery
/// instructions. It keeps no state of its own beyond the shared context.
#[derive(Clone)]
pub struct LedgerEngine {
    ctx: Arc<WorkflowContext>,
}

impl LedgerEngine {
    /// Creates a new `LedgerEngine` over a shared context.
    pub fn new(ctx: Arc<WorkflowContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &WorkflowContext {
        &self.ctx
    }

    /// Handles one event. Never fails: every rejection becomes a notice to
    /// the chat the event came from.
    pub async fn handle(&self, event: Inbound) -> Vec<Outbound> {
        let caller = event.caller().clone();
        let chat_id = event.chat_id();

        let result = match event {
            Inbound::Command { name, args, .. } => {
                tracing::debug!(user_id = %caller.user_id, command = %name, "command");
                self.dispatch_command(&caller, chat_id, &name, &args).await
            }
            Inbound::Callback {
                message_id, data, ..
            } => {
                tracing::debug!(user_id = %caller.user_id, %data, "callback");
                match data.parse::<CallbackAction>() {
                    Ok(action) => {
                        self.dispatch_action(&caller, chat_id, message_id, action)
                            .await
                    }
                    Err(err) => {
                        tracing::warn!(user_id = %caller.user_id, error = %err, "callback ignored");
                        Ok(vec![Outbound::message(
                            Recipient::Chat(chat_id),
                            Notice::UnknownAction,
                        )])
                    }
                }
            }
            Inbound::Photo { file_id, .. } => {
                tracing::debug!(user_id = %caller.user_id, "photo");
                topup::submit_proof(&self.ctx, &caller, chat_id, &file_id).await
            }
        };

        result.unwrap_or_else(|err| self.reject(&caller, chat_id, err))
    }

    async fn dispatch_command(
        &self,
        caller: &Caller,
        chat_id: i64,
        name: &str,
        args: &[String],
    ) -> WorkflowResult<Vec<Outbound>> {
        let ctx = &*self.ctx;
        match name {
            "start" => account::start(ctx, caller, chat_id, args).await,
            "mmb" => order::place_mlbb(ctx, caller, chat_id, args).await,
            "pubg" => order::place_pubg(ctx, caller, chat_id, args).await,
            "topup" => topup::declare(ctx, caller, chat_id, args).await,
            "cancel" => topup::cancel(ctx, caller, chat_id, None).await,
            "balance" => account::balance(ctx, caller, chat_id).await,
            "history" => account::history(ctx, caller, chat_id).await,
            "price" => account::prices(ctx, caller, chat_id).await,
            "affiliate" => affiliate::info(ctx, caller, chat_id).await,
            "setprice" => admin::set_price(ctx, caller, chat_id, args).await,
            "setpubgprice" => admin::set_pubg_price(ctx, caller, chat_id, args).await,
            "maintenance" => admin::maintenance(ctx, caller, chat_id, args).await,
            "setpayment" => admin::set_payment(ctx, caller, chat_id, args).await,
            "affiliateconfig" => admin::affiliate_config(ctx, caller, chat_id, args).await,
            "autodelete" => admin::auto_delete(ctx, caller, chat_id, args).await,
            "ban" => admin::set_access(ctx, caller, chat_id, args, false).await,
            "unban" => admin::set_access(ctx, caller, chat_id, args, true).await,
            "deduct" => admin::deduct(ctx, caller, chat_id, args).await,
            "approve" => topup::approve_manual(ctx, caller, chat_id, args).await,
            other => Ok(vec![Outbound::message(
                Recipient::Chat(chat_id),
                Notice::UnknownCommand(other.to_string()),
            )]),
        }
    }

    async fn dispatch_action(
        &self,
        caller: &Caller,
        chat_id: i64,
        message_id: i64,
        action: CallbackAction,
    ) -> WorkflowResult<Vec<Outbound>> {
        let ctx = &*self.ctx;
        match action {
            CallbackAction::ConfirmOrder(id) => {
                order::resolve(ctx, caller, chat_id, message_id, &id, OrderDecision::Confirm).await
            }
            CallbackAction::CancelOrder(id) => {
                order::resolve(ctx, caller, chat_id, message_id, &id, OrderDecision::Cancel).await
            }
            CallbackAction::ApproveTopup(id) => {
                topup::resolve(ctx, caller, chat_id, message_id, &id, TopupDecision::Approve).await
            }
            CallbackAction::RejectTopup(id) => {
                topup::resolve(ctx, caller, chat_id, message_id, &id, TopupDecision::Reject).await
            }
            CallbackAction::SelectPayment(method, amount) => {
                topup::select_method(ctx, caller, chat_id, message_id, method, amount).await
            }
            CallbackAction::CancelTopup => {
                topup::cancel(ctx, caller, chat_id, Some(message_id)).await
            }
            CallbackAction::RequestRegister => account::request_access(ctx, caller, chat_id).await,
            CallbackAction::ApproveRegister(uid) => {
                account::resolve_access(ctx, caller, chat_id, message_id, &uid, true).await
            }
            CallbackAction::RejectRegister(uid) => {
                account::resolve_access(ctx, caller, chat_id, message_id, &uid, false).await
            }
        }
    }

    fn reject(&self, caller: &Caller, chat_id: i64, err: WorkflowError) -> Vec<Outbound> {
        match &err {
            WorkflowError::StoreUnavailable => {
                tracing::error!(user_id = %caller.user_id, "request dropped, store unavailable");
            }
            WorkflowError::Inconsistent(what) => {
                tracing::error!(user_id = %caller.user_id, %what, "ledger inconsistency");
            }
            other => tracing::debug!(user_id = %caller.user_id, rejection = %other, "rejected"),
        }

        let alert = match &err {
            WorkflowError::BannedAccount(game_id) => Some(Outbound::message(
                Recipient::AdminGroup,
                Notice::BannedAccountAlert {
                    user_id: caller.user_id.clone(),
                    name: caller.name.clone(),
                    game_id: game_id.clone(),
                },
            )),
            _ => None,
        };
        let mut out = vec![Outbound::message(
            Recipient::Chat(chat_id),
            Notice::Rejected(err),
        )];
        out.extend(alert);
        out
    }
}
