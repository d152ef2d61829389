//! Shared in-process ledger and per-signer contract handles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use client_blockchain_core::{
    Address, Battle, CallKind, ContractCall, EventFilter, GameEvent, GameToken, Ledger,
    LedgerReader, LedgerWriter, LogSource, LogSubscription, Player, RawLog, SubscriptionId,
    TransactionId, TransactionReceipt, TransportError,
};
use sha2::{Digest, Sha256};
use tokio::sync::mpsc;

use crate::contract::ContractState;

/// Default contract address of the local deployment.
pub const LOCAL_CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";

/// Gas consumed by each call kind on the local ledger.
pub const fn gas_cost(kind: CallKind) -> u64 {
    match kind {
        CallKind::RegisterPlayer => 350_000,
        CallKind::CreateBattle => 180_000,
        CallKind::JoinBattle => 160_000,
        CallKind::QuitBattle => 120_000,
        CallKind::AttackOrDefend => 150_000,
    }
}

/// Installed listener: the signer whose provider owns it, its filter and sink.
type Listener = (Address, EventFilter, mpsc::UnboundedSender<RawLog>);

#[derive(Default)]
struct Chain {
    block_number: u64,
    nonce: u64,
    receipts: HashMap<TransactionId, TransactionReceipt>,
}

struct Inner {
    contract: Address,
    state: Mutex<ContractState>,
    chain: Mutex<Chain>,
    listeners: Mutex<HashMap<SubscriptionId, Listener>>,
    next_subscription: Mutex<u64>,
    latency: Mutex<Duration>,
    scripted_failure: Mutex<Option<TransportError>>,
}

/// In-process ledger shared by every connected signer.
///
/// Cloning is cheap; all clones observe the same contract state and listeners.
#[derive(Clone)]
pub struct LocalLedger {
    inner: Arc<Inner>,
}

impl Default for LocalLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LocalLedger {
    pub fn new() -> Self {
        Self::with_contract(Address::new(LOCAL_CONTRACT))
    }

    pub fn with_contract(contract: Address) -> Self {
        Self {
            inner: Arc::new(Inner {
                contract,
                state: Mutex::new(ContractState::new()),
                chain: Mutex::new(Chain::default()),
                listeners: Mutex::new(HashMap::new()),
                next_subscription: Mutex::new(0),
                latency: Mutex::new(Duration::ZERO),
                scripted_failure: Mutex::new(None),
            }),
        }
    }

    pub fn contract(&self) -> &Address {
        &self.inner.contract
    }

    /// Handle that signs submissions as `signer`.
    pub fn contract_for(&self, signer: Address) -> LocalContract {
        LocalContract {
            ledger: self.clone(),
            signer,
        }
    }

    /// Delay applied to every read and confirmation.
    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.inner.latency) = latency;
    }

    /// Make the next submission fail with `error` before reaching the contract.
    pub fn fail_next(&self, error: TransportError) {
        *lock(&self.inner.scripted_failure) = Some(error);
    }

    /// Seed or overwrite a battle record.
    pub fn put_battle(&self, battle: Battle) {
        lock(&self.inner.state).put_battle(battle);
    }

    pub fn battles(&self) -> Vec<Battle> {
        lock(&self.inner.state).battles().to_vec()
    }

    pub fn block_number(&self) -> u64 {
        lock(&self.inner.chain).block_number
    }

    /// Deliver `event` to listeners as if the contract had emitted it.
    pub fn emit(&self, event: &GameEvent) -> Result<(), TransportError> {
        let block_number = lock(&self.inner.chain).block_number;
        let log = event
            .to_log(self.inner.contract.clone(), block_number, 0, None)
            .map_err(|e| TransportError::Serialization(e.to_string()))?;
        self.deliver(log);
        Ok(())
    }

    /// Deliver an arbitrary log (possibly malformed) to matching listeners.
    pub fn deliver(&self, log: RawLog) {
        let mut listeners = lock(&self.inner.listeners);
        listeners.retain(|id, (_, filter, tx)| {
            if filter.contract != log.contract || filter.kind.signature() != log.topic {
                return true;
            }
            if tx.send(log.clone()).is_err() {
                tracing::debug!(target: "ledger::local", ?id, "dropping closed listener");
                return false;
            }
            true
        });
    }

    /// Number of live listeners for `filter`.
    pub fn listener_count(&self, filter: &EventFilter) -> usize {
        lock(&self.inner.listeners)
            .values()
            .filter(|(_, f, tx)| f == filter && !tx.is_closed())
            .count()
    }

    async fn simulate_latency(&self) {
        let latency = *lock(&self.inner.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn execute(
        &self,
        sender: &Address,
        call: ContractCall,
        gas_limit: u64,
    ) -> Result<TransactionId, TransportError> {
        if let Some(error) = lock(&self.inner.scripted_failure).take() {
            return Err(error);
        }

        let required = gas_cost(call.kind());
        if gas_limit < required {
            return Err(TransportError::OutOfGas {
                limit: gas_limit,
                required,
            });
        }

        let events = lock(&self.inner.state)
            .execute(sender, &call)
            .map_err(|revert| TransportError::Reverted {
                reason: format!("execution reverted: {}.", revert.0),
            })?;

        let (tx_id, block_number) = {
            let mut chain = lock(&self.inner.chain);
            chain.nonce += 1;
            chain.block_number += 1;

            let mut hasher = Sha256::new();
            hasher.update(sender.as_str().to_ascii_lowercase().as_bytes());
            hasher.update(chain.nonce.to_le_bytes());
            let tx_id = TransactionId(format!("0x{}", hex::encode(hasher.finalize())));

            let block_number = chain.block_number;
            chain.receipts.insert(
                tx_id.clone(),
                TransactionReceipt {
                    transaction_id: tx_id.clone(),
                    block_number,
                    gas_used: required,
                },
            );
            (tx_id, block_number)
        };

        tracing::debug!(
            target: "ledger::local",
            sender = %sender,
            call = %call.kind(),
            tx = %tx_id,
            events = events.len(),
            "transaction mined"
        );

        for (log_index, event) in events.iter().enumerate() {
            match event.to_log(
                self.inner.contract.clone(),
                block_number,
                log_index as u64,
                Some(tx_id.clone()),
            ) {
                Ok(log) => self.deliver(log),
                Err(e) => tracing::warn!(target: "ledger::local", "failed to encode log: {}", e),
            }
        }

        Ok(tx_id)
    }
}

/// Contract handle bound to one signing account.
#[derive(Clone)]
pub struct LocalContract {
    ledger: LocalLedger,
    signer: Address,
}

#[async_trait]
impl LedgerReader for LocalContract {
    async fn is_player(&self, who: &Address) -> Result<bool, TransportError> {
        self.ledger.simulate_latency().await;
        Ok(lock(&self.ledger.inner.state).is_player(who))
    }

    async fn is_player_token(&self, who: &Address) -> Result<bool, TransportError> {
        self.ledger.simulate_latency().await;
        Ok(lock(&self.ledger.inner.state).is_player_token(who))
    }

    async fn get_player(&self, who: &Address) -> Result<Player, TransportError> {
        self.ledger.simulate_latency().await;
        lock(&self.ledger.inner.state)
            .player(who)
            .cloned()
            .ok_or_else(|| TransportError::NotFound(format!("player {who}")))
    }

    async fn get_player_token(&self, who: &Address) -> Result<GameToken, TransportError> {
        self.ledger.simulate_latency().await;
        lock(&self.ledger.inner.state)
            .token(who)
            .cloned()
            .ok_or_else(|| TransportError::NotFound(format!("token of {who}")))
    }

    async fn get_all_battles(&self) -> Result<Vec<Battle>, TransportError> {
        self.ledger.simulate_latency().await;
        Ok(self.ledger.battles())
    }
}

#[async_trait]
impl LedgerWriter for LocalContract {
    async fn submit(
        &self,
        call: ContractCall,
        gas_limit: u64,
    ) -> Result<TransactionId, TransportError> {
        self.ledger.execute(&self.signer, call, gas_limit)
    }

    async fn wait_for_confirmation(
        &self,
        tx_id: &TransactionId,
    ) -> Result<TransactionReceipt, TransportError> {
        self.ledger.simulate_latency().await;
        lock(&self.ledger.inner.chain)
            .receipts
            .get(tx_id)
            .cloned()
            .ok_or_else(|| TransportError::NotFound(format!("transaction {tx_id}")))
    }
}

impl LogSource for LocalContract {
    fn subscribe_logs(&self, filter: &EventFilter) -> Result<LogSubscription, TransportError> {
        let id = {
            let mut next = lock(&self.ledger.inner.next_subscription);
            *next += 1;
            SubscriptionId(*next)
        };
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.ledger.inner.listeners).insert(id, (self.signer.clone(), filter.clone(), tx));

        Ok(LogSubscription::new(id, filter.clone(), rx))
    }

    /// Only listeners installed through this signer's handle are removed,
    /// the way each wallet provider only knows its own listeners.
    fn remove_listeners(&self, filter: &EventFilter) -> usize {
        let mut listeners = lock(&self.ledger.inner.listeners);
        let before = listeners.len();
        listeners.retain(|_, (owner, f, _)| owner != &self.signer || f != filter);
        before - listeners.len()
    }
}

impl Ledger for LocalContract {
    fn name(&self) -> &str {
        "local"
    }

    fn contract(&self) -> &Address {
        &self.ledger.inner.contract
    }

    fn signer(&self) -> &Address {
        &self.signer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_blockchain_core::{EventKind, decode_log};

    fn register(name: &str) -> ContractCall {
        ContractCall::RegisterPlayer {
            name: name.into(),
            token_name: name.into(),
        }
    }

    #[tokio::test]
    async fn revert_reason_is_framed() {
        let ledger = LocalLedger::new();
        let alice = ledger.contract_for(Address::new("0xaa"));

        alice.submit(register("alice"), 500_000).await.unwrap();
        let err = alice.submit(register("alice"), 500_000).await.unwrap_err();

        assert_eq!(
            err.revert_reason(),
            Some("execution reverted: Player already registered.")
        );
    }

    #[tokio::test]
    async fn gas_ceiling_below_cost_fails() {
        let ledger = LocalLedger::new();
        let alice = ledger.contract_for(Address::new("0xaa"));

        let err = alice.submit(register("alice"), 1_000).await.unwrap_err();
        assert!(matches!(err, TransportError::OutOfGas { limit: 1_000, .. }));
        assert!(!alice.is_player(&Address::new("0xaa")).await.unwrap());
    }

    #[tokio::test]
    async fn listeners_receive_matching_logs_only() {
        let ledger = LocalLedger::new();
        let alice = ledger.contract_for(Address::new("0xaa"));

        let mut players =
            alice.subscribe_logs(&EventFilter::new(ledger.contract().clone(), EventKind::NewPlayer))
                .unwrap();
        let mut battles =
            alice.subscribe_logs(&EventFilter::new(ledger.contract().clone(), EventKind::NewBattle))
                .unwrap();

        let tx = alice.submit(register("alice"), 500_000).await.unwrap();
        let receipt = alice.wait_for_confirmation(&tx).await.unwrap();
        assert_eq!(receipt.gas_used, gas_cost(CallKind::RegisterPlayer));

        let log = players.recv().await.unwrap();
        assert!(matches!(decode_log(&log), Ok(GameEvent::NewPlayer(_))));
        assert!(battles.try_recv().is_none());
    }

    #[tokio::test]
    async fn remove_listeners_closes_subscriptions() {
        let ledger = LocalLedger::new();
        let alice = ledger.contract_for(Address::new("0xaa"));
        let filter = EventFilter::new(ledger.contract().clone(), EventKind::RoundEnded);

        let mut first = alice.subscribe_logs(&filter).unwrap();
        let _second = alice.subscribe_logs(&filter).unwrap();
        assert_eq!(ledger.listener_count(&filter), 2);

        assert_eq!(alice.remove_listeners(&filter), 2);
        assert_eq!(ledger.listener_count(&filter), 0);
        assert!(first.recv().await.is_none());
    }

    #[tokio::test]
    async fn remove_listeners_spares_other_signers() {
        let ledger = LocalLedger::new();
        let alice = ledger.contract_for(Address::new("0xaa"));
        let bob = ledger.contract_for(Address::new("0xbb"));
        let filter = EventFilter::new(ledger.contract().clone(), EventKind::NewBattle);

        let _alice_logs = alice.subscribe_logs(&filter).unwrap();
        let _bob_logs = bob.subscribe_logs(&filter).unwrap();

        assert_eq!(bob.remove_listeners(&filter), 1);
        assert_eq!(ledger.listener_count(&filter), 1);
    }

    #[tokio::test]
    async fn receipts_record_the_mined_block() {
        let ledger = LocalLedger::new();
        let alice = ledger.contract_for(Address::new("0xaa"));

        let first = alice.submit(register("alice"), 500_000).await.unwrap();
        let second = alice
            .submit(
                ContractCall::CreateBattle {
                    name: "arena".into(),
                },
                500_000,
            )
            .await
            .unwrap();

        let first = alice.wait_for_confirmation(&first).await.unwrap();
        let second = alice.wait_for_confirmation(&second).await.unwrap();
        assert_eq!(second.block_number, first.block_number + 1);
        assert_eq!(second.block_number, ledger.block_number());
    }

    #[tokio::test]
    async fn scripted_failure_applies_once() {
        let ledger = LocalLedger::new();
        let alice = ledger.contract_for(Address::new("0xaa"));

        ledger.fail_next(TransportError::Rejected("user denied".into()));
        assert!(alice.submit(register("alice"), 500_000).await.is_err());
        assert!(alice.submit(register("alice"), 500_000).await.is_ok());
    }
}
