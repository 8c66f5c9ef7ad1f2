#![allow(dead_code)]

use std::sync::Arc;
use topup_ledger::application::context::{WorkflowConfig, WorkflowContext};
use topup_ledger::application::engine::LedgerEngine;
use topup_ledger::application::event::{Caller, Inbound};
use topup_ledger::application::notice::Notice;
use topup_ledger::application::outbound::Outbound;
use topup_ledger::domain::money::Money;
use topup_ledger::error::WorkflowError;
use topup_ledger::infrastructure::in_memory::InMemoryLedgerStore;

pub const ADMIN: &str = "900";
pub const ADMIN_GROUP: i64 = -100;

pub fn engine() -> LedgerEngine {
    let config = WorkflowConfig {
        admin_ids: [ADMIN.to_string()].into(),
        admin_group_id: ADMIN_GROUP,
        ..WorkflowConfig::default()
    };
    let store = Box::new(InMemoryLedgerStore::new());
    LedgerEngine::new(Arc::new(WorkflowContext::new(store, config)))
}

fn caller(user: &str) -> Caller {
    Caller::new(user, format!("user{user}"), "")
}

pub fn command(user: &str, line: &str) -> Inbound {
    let mut words = line.split_whitespace();
    let name = words.next().unwrap_or_default().trim_start_matches('/');
    Inbound::Command {
        caller: caller(user),
        chat_id: user.parse().unwrap(),
        name: name.to_string(),
        args: words.map(str::to_string).collect(),
    }
}

pub fn admin_callback(data: String) -> Inbound {
    Inbound::Callback {
        caller: caller(ADMIN),
        chat_id: ADMIN_GROUP,
        message_id: 1,
        data,
    }
}

pub fn rejection(out: &[Outbound]) -> Option<&WorkflowError> {
    out.iter().find_map(|o| match o.notice() {
        Notice::Rejected(err) => Some(err),
        _ => None,
    })
}

pub async fn balance_of(engine: &LedgerEngine, user: &str) -> Money {
    engine
        .context()
        .store
        .get_user(user)
        .await
        .unwrap()
        .unwrap()
        .balance
}

pub async fn authorize(engine: &LedgerEngine, user: &str) {
    engine.handle(command(ADMIN, &format!("/unban {user}"))).await;
    engine.handle(command(user, "/start")).await;
}

/// Declares, pays and uploads proof for a top-up; returns its id.
pub async fn submitted_topup(engine: &LedgerEngine, user: &str, amount: i64) -> String {
    engine.handle(command(user, &format!("/topup {amount}"))).await;
    engine
        .handle(Inbound::Callback {
            caller: caller(user),
            chat_id: user.parse().unwrap(),
            message_id: 2,
            data: format!("topup_pay_kpay_{amount}"),
        })
        .await;
    let out = engine
        .handle(Inbound::Photo {
            caller: caller(user),
            chat_id: user.parse().unwrap(),
            file_id: "proof".into(),
        })
        .await;
    out.iter()
        .find_map(|o| match o.notice() {
            Notice::TopupSubmitted { topup_id, .. } => Some(topup_id.clone()),
            _ => None,
        })
        .expect("top-up was not submitted")
}

pub async fn funded_user(engine: &LedgerEngine, user: &str, amount: i64) {
    authorize(engine, user).await;
    let topup_id = submitted_topup(engine, user, amount).await;
    engine
        .handle(admin_callback(format!("topup_approve_{topup_id}")))
        .await;
}

/// Places an order and returns its id.
pub async fn placed_order(engine: &LedgerEngine, user: &str, line: &str) -> String {
    let out = engine.handle(command(user, line)).await;
    out.iter()
        .find_map(|o| match o.notice() {
            Notice::OrderPlaced { order, .. } => Some(order.order_id.clone()),
            _ => None,
        })
        .expect("order was not placed")
}
