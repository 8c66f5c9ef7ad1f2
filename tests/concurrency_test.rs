mod common;

use chrono::Utc;
use common::*;
use rand::seq::SliceRandom;
use topup_ledger::domain::money::Money;
use topup_ledger::domain::order::{
    GameAccount, Order, OrderDecision, OrderResolution, OrderStatus,
};
use topup_ledger::domain::ports::LedgerStore;
use topup_ledger::domain::pricing::Catalog;
use topup_ledger::domain::user::User;
use topup_ledger::error::LedgerError;
use topup_ledger::infrastructure::in_memory::InMemoryLedgerStore;

fn order(order_id: &str, price: i64) -> Order {
    Order {
        order_id: order_id.to_string(),
        account: GameAccount::Mlbb {
            game_id: "12345678".into(),
            server_id: "1234".into(),
        },
        amount: "11".into(),
        price: Money::new(price),
        status: OrderStatus::Pending,
        timestamp: Utc::now(),
        user_id: "1".into(),
        chat_id: 1,
        resolved_by: None,
        resolved_at: None,
    }
}

async fn funded_store(balance: i64) -> InMemoryLedgerStore {
    let store = InMemoryLedgerStore::new();
    store.create_user(User::new("1", "Aung", "aung", None)).await.unwrap();
    store.adjust_balance("1", Money::new(balance)).await.unwrap();
    store
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolution_has_one_winner() {
    let store = funded_store(5000).await;
    store.place_order("1", order("ORD1", 950)).await.unwrap();

    let mut decisions: Vec<OrderDecision> = (0..16)
        .map(|i| {
            if i % 2 == 0 {
                OrderDecision::Confirm
            } else {
                OrderDecision::Cancel
            }
        })
        .collect();
    decisions.shuffle(&mut rand::thread_rng());

    let handles: Vec<_> = decisions
        .into_iter()
        .enumerate()
        .map(|(i, decision)| {
            let store = store.clone();
            tokio::spawn(async move {
                let resolution = OrderResolution {
                    decision,
                    admin: format!("admin{i}"),
                    at: Utc::now(),
                };
                store.update_pending_order("ORD1", resolution).await
            })
        })
        .collect();

    let mut winners = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(resolved) => winners.push(resolved),
            Err(LedgerError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }

    assert_eq!(winners.len(), 1);
    let user = store.get_user("1").await.unwrap().unwrap();
    let expected = match winners[0].order.status {
        OrderStatus::Cancelled => Money::new(5000),
        _ => Money::new(4050),
    };
    assert_eq!(user.balance, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_debits_never_overdraw() {
    let store = funded_store(5000).await;

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.place_order("1", order(&format!("ORD{i}"), 950)).await })
        })
        .collect();

    let mut placed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(balance) => {
                assert!(balance >= Money::ZERO);
                placed += 1;
            }
            Err(LedgerError::InsufficientBalance { .. }) => {}
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }

    let user = store.get_user("1").await.unwrap().unwrap();
    assert_eq!(placed, 5);
    assert_eq!(user.orders.len(), 5);
    assert_eq!(user.balance, Money::new(250));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_double_approve_credits_once() {
    let engine = engine();
    authorize(&engine, "1").await;
    let topup_id = submitted_topup(&engine, "1", 5000).await;

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let engine = engine.clone();
            let data = format!("topup_approve_{topup_id}");
            tokio::spawn(async move { engine.handle(admin_callback(data)).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(balance_of(&engine, "1").await, Money::new(5000));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_orders_through_engine() {
    let engine = engine();
    funded_user(&engine, "1", 5000).await;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.handle(command("1", "/mmb 12345678 1234 11")).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let user = engine.context().store.get_user("1").await.unwrap().unwrap();
    assert_eq!(user.orders.len(), 5);
    assert_eq!(user.balance, Money::new(250));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_price_edits_are_all_kept() {
    let engine = engine();
    let skus = ["11", "22", "33", "56", "86", "112", "172", "257"];

    let handles: Vec<_> = skus
        .iter()
        .map(|sku| {
            let engine = engine.clone();
            let line = format!("/setprice {sku} 7777");
            tokio::spawn(async move { engine.handle(command(ADMIN, &line)).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let table = engine
        .context()
        .store
        .load_prices(Catalog::Mlbb)
        .await
        .unwrap();
    for sku in skus {
        assert_eq!(table.get(sku), Some(&Money::new(7777)));
    }
}
