use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Notify, broadcast};
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info};

use placehub_common::{HubResult, StorageError, ValidationError};

use crate::clock::SharedClock;
use crate::entry::PendingScript;
use crate::sweeper::Sweep;

/// Espera do expirer antes de tentar ler a fila de novo após uma falha.
const EXPIRER_RETRY: Duration = Duration::from_secs(1);

/// Item no BTreeSet de expiração: (prazo, uniqueId).
/// Cada script vivo tem exatamente um item; cancelar o timer é remover o item.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
struct ExpiryEntry(Instant, String);

#[derive(Default)]
struct QueueState {
    entries: HashMap<String, PendingScript>,
    expiry: BTreeSet<ExpiryEntry>,
    closed: bool,
}

struct Shared {
    state: Mutex<QueueState>,
    ttl: Duration,
    clock: SharedClock,
    notify_expiry: Notify,
}

/// Visão de um script pendente no momento da listagem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingScriptInfo {
    pub unique_id: String,
    pub script: String,
    pub expires_in_ms: u64,
}

/// Fila de scripts pendentes, cada um com seu próprio prazo de expiração.
#[derive(Clone)]
pub struct PendingScriptQueue {
    shared: Arc<Shared>,
}

impl PendingScriptQueue {
    pub fn new(ttl: Duration, clock: SharedClock) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState::default()),
                ttl,
                clock,
                notify_expiry: Notify::new(),
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, QueueState>, StorageError> {
        self.shared
            .state
            .lock()
            .map_err(|_| StorageError::Poisoned("pending_scripts"))
    }

    /// Enfileira `script` sob `unique_id`, com prazo `ttl` a partir de agora.
    ///
    /// Uma re-submissão troca o script e o prazo sob o mesmo lock: o timer
    /// antigo sai do índice antes do novo entrar.
    pub fn submit(&self, unique_id: &str, script: &str) -> HubResult<()> {
        if unique_id.is_empty() || script.is_empty() {
            return Err(ValidationError::MissingScriptFields.into());
        }

        let mut state = self.lock()?;
        if state.closed {
            return Err(StorageError::Closed.into());
        }
        let now = self.shared.clock.now();

        if let Some(previous) = state.entries.remove(unique_id) {
            state
                .expiry
                .remove(&ExpiryEntry(previous.deadline, unique_id.to_string()));
            debug!(unique_id, "re-submissão: timer anterior cancelado");
        }

        let Some(deadline) = now.checked_add(self.shared.ttl) else {
            error!(unique_id, "prazo de expiração não representável; script descartado");
            return Ok(());
        };

        state.entries.insert(
            unique_id.to_string(),
            PendingScript {
                script: script.to_string(),
                added_at: now,
                deadline,
            },
        );
        state
            .expiry
            .insert(ExpiryEntry(deadline, unique_id.to_string()));
        drop(state);

        self.shared.notify_expiry.notify_one();
        Ok(())
    }

    /// Todos os scripts ainda no prazo, do mais antigo para o mais novo.
    pub fn list_all(&self) -> Result<Vec<PendingScriptInfo>, StorageError> {
        let state = self.lock()?;
        let now = self.shared.clock.now();
        let ttl = self.shared.ttl;

        let mut live: Vec<(Instant, PendingScriptInfo)> = state
            .entries
            .iter()
            .filter(|(_, e)| now <= e.deadline)
            .map(|(id, e)| {
                let info = PendingScriptInfo {
                    unique_id: id.clone(),
                    script: e.script.clone(),
                    expires_in_ms: e.expires_in(now, ttl).as_millis() as u64,
                };
                (e.added_at, info)
            })
            .collect();
        drop(state);

        live.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.unique_id.cmp(&b.1.unique_id)));
        Ok(live.into_iter().map(|(_, info)| info).collect())
    }

    /// Remove todo script com prazo vencido. Retorna quantos saíram.
    pub fn purge_expired(&self) -> Result<usize, StorageError> {
        let mut state = self.lock()?;
        let now = self.shared.clock.now();

        let due: Vec<ExpiryEntry> = state
            .expiry
            .iter()
            .take_while(|e| e.0 <= now)
            .cloned()
            .collect();

        let mut removed = 0;
        for item in due {
            state.expiry.remove(&item);
            // Só remove se o prazo do índice ainda é o prazo da entrada
            if state
                .entries
                .get(&item.1)
                .is_some_and(|e| e.deadline == item.0 && e.is_expired(now))
            {
                state.entries.remove(&item.1);
                removed += 1;
                debug!(unique_id = %item.1, "script pendente expirado removido");
            }
        }
        Ok(removed)
    }

    /// Prazo mais próximo entre os timers ativos.
    pub fn next_deadline(&self) -> Result<Option<Instant>, StorageError> {
        Ok(self.lock()?.expiry.first().map(|e| e.0))
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.lock()?.entries.is_empty())
    }

    /// Cancela todos os timers e esvazia a fila. Submissões posteriores falham
    /// com `StorageError::Closed`. Retorna quantos scripts foram descartados.
    pub fn close(&self) -> usize {
        let mut state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let cancelled = state.entries.len();
        state.entries.clear();
        state.expiry.clear();
        state.closed = true;
        drop(state);

        self.shared.notify_expiry.notify_waiters();
        cancelled
    }
}

impl Sweep for PendingScriptQueue {
    fn name(&self) -> &'static str {
        "pending_scripts"
    }

    fn sweep(&self) -> Result<usize, StorageError> {
        self.purge_expired()
    }
}

/// Background task que dorme até o próximo prazo e purga os scripts vencidos.
///
/// A espera é calculada pelo relógio da fila, então um relógio parado nunca
/// vira busy loop.
pub async fn run_expirer(queue: PendingScriptQueue, mut shutdown: broadcast::Receiver<()>) {
    loop {
        let next_deadline = match queue.next_deadline() {
            Ok(next) => next,
            Err(e) => {
                error!("expirer sem acesso à fila: {e}; nova tentativa em {EXPIRER_RETRY:?}");
                tokio::select! {
                    _ = tokio::time::sleep(EXPIRER_RETRY) => { continue; }
                    _ = shutdown.recv() => { break; }
                }
            }
        };

        let notified = queue.shared.notify_expiry.notified();
        match next_deadline {
            Some(when) => {
                let wait = when.saturating_duration_since(queue.shared.clock.now());
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = notified => { continue; }
                    _ = shutdown.recv() => { break; }
                }
            }
            None => {
                tokio::select! {
                    _ = notified => { continue; }
                    _ = shutdown.recv() => { break; }
                }
            }
        }

        match queue.purge_expired() {
            Ok(0) => {}
            Ok(n) => debug!(removed = n, "scripts pendentes expirados"),
            Err(e) => error!("falha ao purgar scripts pendentes: {e}"),
        }
    }
    info!("expirer encerrado");
}

#[cfg(test)]
mod tests {
    use placehub_common::HubError;

    use super::*;
    use crate::clock::{ManualClock, TokioClock};

    const TTL: Duration = Duration::from_millis(10_000);

    fn queue() -> (PendingScriptQueue, ManualClock) {
        let clock = ManualClock::new();
        (PendingScriptQueue::new(TTL, Arc::new(clock.clone())), clock)
    }

    #[test]
    fn submit_and_list() {
        let (q, _clock) = queue();
        q.submit("u1", "foo").unwrap();
        let list = q.list_all().unwrap();
        assert_eq!(
            list,
            vec![PendingScriptInfo {
                unique_id: "u1".into(),
                script: "foo".into(),
                expires_in_ms: 10_000,
            }]
        );
    }

    #[test]
    fn validation_rejects_incomplete_input() {
        let (q, _clock) = queue();
        for (id, script) in [("", "script"), ("id", ""), ("", "")] {
            let err = q.submit(id, script).unwrap_err();
            assert!(matches!(
                err,
                HubError::Validation(ValidationError::MissingScriptFields)
            ));
        }
        assert!(q.is_empty().unwrap());
    }

    #[test]
    fn expires_in_decreases_and_floors_at_zero() {
        let (q, clock) = queue();
        q.submit("u1", "foo").unwrap();

        clock.advance(Duration::from_millis(1));
        let first = q.list_all().unwrap()[0].expires_in_ms;
        clock.advance(Duration::from_millis(250));
        let second = q.list_all().unwrap()[0].expires_in_ms;
        assert!(second < first);

        clock.advance(Duration::from_millis(9_749));
        assert_eq!(q.list_all().unwrap()[0].expires_in_ms, 0);
    }

    #[test]
    fn overdue_entries_hidden_before_purge() {
        let (q, clock) = queue();
        q.submit("u1", "foo").unwrap();
        clock.advance(TTL + Duration::from_millis(1));

        assert!(q.list_all().unwrap().is_empty());
        assert_eq!(q.len().unwrap(), 1);
        assert_eq!(q.purge_expired().unwrap(), 1);
        assert_eq!(q.len().unwrap(), 0);
    }

    #[test]
    fn resubmission_resets_deadline() {
        let (q, clock) = queue();
        q.submit("u1", "foo").unwrap();
        clock.advance(Duration::from_millis(5_000));
        assert_eq!(q.list_all().unwrap()[0].expires_in_ms, 5_000);

        q.submit("u1", "bar").unwrap();
        let list = q.list_all().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].script, "bar");
        assert_eq!(list[0].expires_in_ms, 10_000);

        // passou o prazo da primeira submissão: nada pode sair
        clock.advance(Duration::from_millis(6_000));
        assert_eq!(q.purge_expired().unwrap(), 0);
        assert_eq!(q.list_all().unwrap()[0].expires_in_ms, 4_000);

        clock.advance(Duration::from_millis(4_000));
        assert_eq!(q.purge_expired().unwrap(), 1);
        assert!(q.list_all().unwrap().is_empty());
    }

    #[test]
    fn one_expiry_item_per_id() {
        let (q, clock) = queue();
        for i in 0..10 {
            q.submit("u1", &format!("v{i}")).unwrap();
            clock.advance(Duration::from_millis(100));
        }
        let state = q.lock().unwrap();
        assert_eq!(state.expiry.len(), 1);
        assert_eq!(state.entries.len(), 1);
    }

    #[test]
    fn list_orders_by_submission() {
        let (q, clock) = queue();
        q.submit("b", "2").unwrap();
        clock.advance(Duration::from_millis(10));
        q.submit("a", "1").unwrap();
        clock.advance(Duration::from_millis(10));
        q.submit("c", "3").unwrap();

        let ids: Vec<_> = q
            .list_all()
            .unwrap()
            .into_iter()
            .map(|i| i.unique_id)
            .collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn close_cancels_everything() {
        let (q, _clock) = queue();
        q.submit("u1", "foo").unwrap();
        q.submit("u2", "bar").unwrap();

        assert_eq!(q.close(), 2);
        assert_eq!(q.next_deadline().unwrap(), None);
        assert!(matches!(
            q.submit("u3", "baz"),
            Err(HubError::Storage(StorageError::Closed))
        ));
    }

    #[test]
    fn scenario_u1() {
        let (q, clock) = queue();
        q.submit("u1", "foo").unwrap();
        assert_eq!(q.list_all().unwrap()[0].expires_in_ms, 10_000);

        clock.advance(Duration::from_millis(5_000));
        assert_eq!(q.list_all().unwrap()[0].expires_in_ms, 5_000);

        q.submit("u1", "bar").unwrap();
        let list = q.list_all().unwrap();
        assert_eq!(list[0].script, "bar");
        assert_eq!(list[0].expires_in_ms, 10_000);
    }

    #[test]
    fn unrepresentable_deadline_drops_entry() {
        let q = PendingScriptQueue::new(Duration::MAX, Arc::new(ManualClock::new()));
        assert!(q.submit("u1", "foo").is_ok());
        assert_eq!(q.len().unwrap(), 0);
        assert_eq!(q.next_deadline().unwrap(), None);
        assert!(q.list_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_submits_distinct_ids() {
        let (q, _clock) = queue();
        let mut handles = Vec::new();
        for t in 0..4 {
            let q = q.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..250 {
                    q.submit(&format!("script:{t}:{i}"), "noop").unwrap();
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(q.list_all().unwrap().len(), 1_000);
        let state = q.lock().unwrap();
        assert_eq!(state.expiry.len(), 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn expirer_survives_poisoned_queue() {
        let q = PendingScriptQueue::new(TTL, Arc::new(TokioClock));
        let poisoner = q.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.shared.state.lock();
            panic!("envenena o lock");
        })
        .join();
        assert_eq!(q.len(), Err(StorageError::Poisoned("pending_scripts")));

        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let task = tokio::spawn(run_expirer(q.clone(), shutdown_tx.subscribe()));

        tokio::time::sleep(EXPIRER_RETRY * 5).await;
        assert!(!task.is_finished());

        drop(shutdown_tx);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn expirer_removes_on_deadline() {
        let q = PendingScriptQueue::new(TTL, Arc::new(TokioClock));
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let task = tokio::spawn(run_expirer(q.clone(), shutdown_tx.subscribe()));

        q.submit("u1", "foo").unwrap();
        tokio::time::sleep(Duration::from_millis(9_900)).await;
        assert_eq!(q.len().unwrap(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(q.len().unwrap(), 0);

        drop(shutdown_tx);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn expirer_honours_resubmission() {
        let q = PendingScriptQueue::new(TTL, Arc::new(TokioClock));
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let task = tokio::spawn(run_expirer(q.clone(), shutdown_tx.subscribe()));

        q.submit("u1", "foo").unwrap();
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        q.submit("u1", "bar").unwrap();

        // prazo da primeira submissão já passou
        tokio::time::sleep(Duration::from_millis(6_000)).await;
        let list = q.list_all().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].script, "bar");

        tokio::time::sleep(Duration::from_millis(4_100)).await;
        assert_eq!(q.len().unwrap(), 0);

        drop(shutdown_tx);
        task.await.unwrap();
    }
}
