use std::sync::Arc;
use std::time::Duration;

use client_blockchain_core::{Address, BattleStatus, EventFilter, EventKind};
use client_blockchain_local::{LOCAL_CHAIN_ID, LocalLedger, LocalWallet};
use runtime::{
    ActionError, AlertKind, BattlegroundStore, ConnectionStep, CueAnchor, CueEvent, Event, Route,
    Runtime, RuntimeConfig, RuntimeError, RuntimeHandle, RuntimeSnapshot, Topic,
};
use strum::IntoEnumIterator;
use tempfile::TempDir;

struct Client {
    runtime: Runtime,
    handle: RuntimeHandle,
    wallet: Arc<LocalWallet>,
    _data_dir: TempDir,
}

async fn start_client(wallet: LocalWallet) -> Client {
    let data_dir = tempfile::tempdir().expect("tempdir");
    let wallet = Arc::new(wallet);

    let runtime = Runtime::builder()
        .config(RuntimeConfig::default())
        .wallet(wallet.clone())
        .settings(BattlegroundStore::in_dir(data_dir.path()))
        .build()
        .await
        .expect("Runtime should start successfully");
    let handle = runtime.handle();

    Client {
        runtime,
        handle,
        wallet,
        _data_dir: data_dir,
    }
}

fn addr(tail: &str) -> Address {
    Address::new(format!("0x{tail:0>40}"))
}

/// Poll snapshots until `done` holds. Time is paused, so polling is free.
async fn wait_until(
    handle: &RuntimeHandle,
    what: &str,
    done: impl Fn(&RuntimeSnapshot) -> bool,
) -> RuntimeSnapshot {
    for _ in 0..1_000 {
        let snapshot = handle.snapshot().await.expect("snapshot");
        if done(&snapshot) {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

async fn registered_client(ledger: &LocalLedger, who: Address, name: &str) -> Client {
    let client = start_client(LocalWallet::connected(ledger.clone(), who)).await;
    wait_until(&client.handle, "ledger connection", |s| s.session.connected).await;

    client
        .handle
        .register_player(name)
        .await
        .expect("registration should be accepted");
    wait_until(&client.handle, "battle creation screen", |s| {
        s.route == Route::CreateBattle
    })
    .await;
    client
}

#[tokio::test(start_paused = true)]
async fn missing_wallet_stays_on_onboarding() {
    let ledger = LocalLedger::new();
    let client = start_client(LocalWallet::missing(ledger.clone())).await;

    let snapshot = wait_until(&client.handle, "first probe", |s| {
        s.session.step == ConnectionStep::NeedsProvider
    })
    .await;
    assert_eq!(snapshot.route, Route::Onboarding);

    let err = client.handle.register_player("alice").await.unwrap_err();
    assert!(matches!(err, RuntimeError::Action(ActionError::NotConnected)));

    // Explicit navigation is ignored until onboarding completes.
    let route = client.handle.navigate(Route::JoinBattle).await.unwrap();
    assert_eq!(route, Route::Onboarding);

    client.runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn environment_change_completes_onboarding() {
    let ledger = LocalLedger::new();
    let client = start_client(LocalWallet::missing(ledger.clone())).await;
    wait_until(&client.handle, "first probe", |s| {
        s.session.step == ConnectionStep::NeedsProvider
    })
    .await;

    client.wallet.set_provider_available(true);
    client.wallet.switch_account(Some(addr("a")));
    client.wallet.switch_chain(1);
    client.handle.environment_changed().await.unwrap();
    wait_until(&client.handle, "wrong network", |s| {
        s.session.step == ConnectionStep::NeedsNetwork
    })
    .await;

    client.wallet.switch_chain(LOCAL_CHAIN_ID);
    client.handle.environment_changed().await.unwrap();
    wait_until(&client.handle, "low balance", |s| {
        s.session.step == ConnectionStep::NeedsBalance
    })
    .await;

    client.wallet.set_balance(10u128.pow(18));
    client.handle.environment_changed().await.unwrap();
    let snapshot = wait_until(&client.handle, "registration screen", |s| {
        s.session.step.is_ready() && s.session.connected
    })
    .await;
    assert_eq!(snapshot.route, Route::Home);
    assert_eq!(snapshot.session.identity, Some(addr("a")));

    client.runtime.shutdown().await.unwrap();
}

/// Listeners per event kind that `ledger` currently holds.
fn listener_counts(ledger: &LocalLedger) -> Vec<usize> {
    EventKind::iter()
        .map(|kind| ledger.listener_count(&EventFilter::new(ledger.contract().clone(), kind)))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn listeners_follow_wallet_readiness() {
    let ledger = LocalLedger::new();
    let wallet = LocalWallet::connected(ledger.clone(), addr("a"));
    wallet.switch_chain(1);
    let client = start_client(wallet).await;

    wait_until(&client.handle, "connection on the wrong network", |s| {
        s.session.connected && s.session.step == ConnectionStep::NeedsNetwork
    })
    .await;
    assert!(listener_counts(&ledger).iter().all(|&count| count == 0));

    client.wallet.switch_chain(LOCAL_CHAIN_ID);
    client.handle.environment_changed().await.unwrap();
    wait_until(&client.handle, "ready wallet", |s| {
        s.session.connected && s.session.step.is_ready()
    })
    .await;
    assert!(listener_counts(&ledger).iter().all(|&count| count == 1));

    for _ in 0..2 {
        client.handle.environment_changed().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    wait_until(&client.handle, "ready wallet", |s| {
        s.session.connected && s.session.step.is_ready()
    })
    .await;
    assert!(listener_counts(&ledger).iter().all(|&count| count == 1));

    client.runtime.shutdown().await.unwrap();
    assert!(listener_counts(&ledger).iter().all(|&count| count == 0));
}

#[tokio::test(start_paused = true)]
async fn registration_marks_player_and_token() {
    let ledger = LocalLedger::new();
    let client = registered_client(&ledger, addr("a"), "alice").await;

    let snapshot = client.handle.snapshot().await.unwrap();
    assert!(snapshot.session.registered);
    assert!(snapshot.session.token_minted);

    // A second registration submits nothing.
    let block = ledger.block_number();
    assert_eq!(client.handle.register_player("alice").await.unwrap(), None);
    assert_eq!(ledger.block_number(), block);

    client.runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn invalid_name_is_rejected_before_submission() {
    let ledger = LocalLedger::new();
    let client = start_client(LocalWallet::connected(ledger.clone(), addr("a"))).await;
    wait_until(&client.handle, "ledger connection", |s| s.session.connected).await;

    let err = client.handle.register_player("alice!").await.unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Action(ActionError::InvalidName(_))
    ));
    assert_eq!(ledger.block_number(), 0);

    client.runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn rejected_submission_shows_revert_reason() {
    let ledger = LocalLedger::new();
    let alice = registered_client(&ledger, addr("a"), "alice").await;

    alice.handle.create_battle("arena").await.unwrap();
    let err = alice.handle.create_battle("arena").await.unwrap_err();
    assert!(matches!(err, RuntimeError::Action(ActionError::Transport(_))));

    let snapshot = alice.handle.snapshot().await.unwrap();
    assert!(snapshot.alert.visible);
    assert_eq!(snapshot.alert.kind, AlertKind::Failure);
    assert_eq!(snapshot.alert.message, "Battle already exists!");

    // Alerts clear on their own.
    tokio::time::sleep(Duration::from_secs(6)).await;
    let snapshot = alice.handle.snapshot().await.unwrap();
    assert!(!snapshot.alert.visible);

    alice.runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn two_players_meet_fight_and_finish() {
    let ledger = LocalLedger::new();
    let alice = registered_client(&ledger, addr("a"), "alice").await;
    let bob = registered_client(&ledger, addr("b"), "bob").await;

    // Alice opens a battle and waits.
    alice.handle.create_battle("arena").await.unwrap();
    let snapshot = wait_until(&alice.handle, "own pending battle", |s| {
        s.game_data.active_battle_name() == Some("arena")
    })
    .await;
    assert!(snapshot.session.awaiting_opponent);

    // Bob sees it after a refresh and joins.
    bob.handle.refresh().await.unwrap();
    let snapshot = wait_until(&bob.handle, "joinable battle", |s| {
        s.game_data.pending_battles.iter().any(|b| b.name == "arena")
    })
    .await;
    assert_eq!(
        snapshot
            .game_data
            .joinable_battles(&addr("b"))
            .map(|b| b.name.clone())
            .collect::<Vec<_>>(),
        vec!["arena".to_string()]
    );
    bob.handle.join_battle("arena").await.unwrap();

    for client in [&alice, &bob] {
        let snapshot = wait_until(&client.handle, "active battle", |s| {
            s.route == Route::Battle("arena".into())
                && s.game_data
                    .active_battle
                    .as_ref()
                    .is_some_and(|b| b.status == BattleStatus::Active)
        })
        .await;
        assert!(!snapshot.session.awaiting_opponent);
    }

    let view = alice.handle.battle_view().await.unwrap().expect("battle view");
    assert_eq!(view.local.name, "alice");
    assert!(view.local.attack.is_some());
    let opponent = view.opponent.expect("opponent card");
    assert_eq!(opponent.name, "bob");
    assert_eq!(opponent.attack, None);

    // One round of mutual attacks damages both sides.
    let mut cues = alice.handle.subscribe(Topic::Cue);
    alice.handle.attack().await.unwrap();
    bob.handle.attack().await.unwrap();

    let mut anchors = Vec::new();
    while anchors.len() < 2 {
        match tokio::time::timeout(Duration::from_secs(1), cues.recv()).await {
            Ok(Ok(Event::Cue(CueEvent::Hit { anchor }))) => anchors.push(anchor),
            other => panic!("expected hit cues, got {other:?}"),
        }
    }
    assert!(anchors.contains(&CueAnchor::LocalPlayer));
    assert!(anchors.contains(&CueAnchor::Opponent));

    // Bob forfeits. His own "quitting" notice may land after the result,
    // so watch the alert stream rather than the final slot.
    let mut bob_alerts = bob.handle.subscribe(Topic::Alert);
    bob.handle.quit_battle().await.unwrap();

    let snapshot = wait_until(&alice.handle, "victory notice", |s| {
        s.alert.message == "You won!"
    })
    .await;
    assert_eq!(snapshot.alert.kind, AlertKind::Success);

    loop {
        match tokio::time::timeout(Duration::from_secs(1), bob_alerts.recv()).await {
            Ok(Ok(Event::Alert(alert))) if alert.message == "You lost!" => {
                assert_eq!(alert.kind, AlertKind::Failure);
                break;
            }
            Ok(Ok(_)) => continue,
            other => panic!("expected defeat notice, got {other:?}"),
        }
    }

    for client in [&alice, &bob] {
        wait_until(&client.handle, "back in the lobby", |s| {
            s.route == Route::CreateBattle && s.game_data.active_battle.is_none()
        })
        .await;
    }

    alice.runtime.shutdown().await.unwrap();
    bob.runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn battleground_choice_persists_and_returns() {
    let ledger = LocalLedger::new();
    let data_dir = tempfile::tempdir().unwrap();
    let wallet = Arc::new(LocalWallet::connected(ledger.clone(), addr("a")));

    let runtime = Runtime::builder()
        .wallet(wallet.clone())
        .settings(BattlegroundStore::in_dir(data_dir.path()))
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();
    let snapshot = wait_until(&handle, "registration screen", |s| s.route == Route::Home).await;
    assert_eq!(snapshot.session.battleground, "bg-astral");

    handle.navigate(Route::Battleground).await.unwrap();
    handle.choose_battleground("bg-panight").await.unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.alert.message, "Panight is battle ready!");
    assert_eq!(snapshot.route, Route::Battleground);

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.route, Route::Home);

    assert!(handle.choose_battleground("bg-moon").await.is_err());
    runtime.shutdown().await.unwrap();

    let stored = BattlegroundStore::in_dir(data_dir.path())
        .load_or_init()
        .unwrap();
    assert_eq!(stored, "bg-panight");
}

#[tokio::test(start_paused = true)]
async fn account_switch_resets_session() {
    let ledger = LocalLedger::new();
    let alice = registered_client(&ledger, addr("a"), "alice").await;

    alice.wallet.switch_account(Some(addr("c")));
    alice.handle.environment_changed().await.unwrap();

    let snapshot = wait_until(&alice.handle, "new identity", |s| {
        s.session.identity == Some(addr("c")) && s.session.connected
    })
    .await;
    assert!(!snapshot.session.registered);
    assert_eq!(snapshot.route, Route::Home);

    alice.runtime.shutdown().await.unwrap();
}
