use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use battle_client::{Client, Frontend};
use client_blockchain_core::Address;
use client_blockchain_local::{LocalLedger, LocalWallet};
use runtime::{BattlegroundStore, Route, Runtime, RuntimeHandle};

/// Frontend that registers a player, records where it ended up and quits.
struct ScriptedFrontend {
    name: &'static str,
    reached: Arc<std::sync::Mutex<Option<Route>>>,
}

#[async_trait]
impl Frontend for ScriptedFrontend {
    async fn run(&mut self, handle: RuntimeHandle) -> Result<()> {
        for _ in 0..500 {
            if handle.snapshot().await?.session.connected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        handle.register_player(self.name).await?;

        for _ in 0..500 {
            let snapshot = handle.snapshot().await?;
            if snapshot.route == Route::CreateBattle {
                *self.reached.lock().unwrap() = Some(snapshot.route);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn client_runs_frontend_then_shuts_down() {
    let data_dir = tempfile::tempdir().unwrap();
    let ledger = LocalLedger::new();
    let wallet = Arc::new(LocalWallet::connected(
        ledger.clone(),
        Address::new("0x00000000000000000000000000000000000000aa"),
    ));

    let runtime = Runtime::builder()
        .wallet(wallet)
        .settings(BattlegroundStore::in_dir(data_dir.path()))
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    let reached = Arc::new(std::sync::Mutex::new(None));
    let client = Client::builder()
        .runtime(runtime)
        .frontend(ScriptedFrontend {
            name: "alice",
            reached: reached.clone(),
        })
        .build()
        .unwrap();

    client.run().await.unwrap();

    assert_eq!(*reached.lock().unwrap(), Some(Route::CreateBattle));
    assert!(handle.snapshot().await.is_err());
}

#[test]
fn builder_requires_a_frontend() {
    assert!(Client::builder().build().is_err());
}
