use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, error, info};

use placehub_common::StorageError;

/// Algo que o sweeper sabe varrer.
pub trait Sweep: Send + Sync {
    fn name(&self) -> &'static str;

    /// Remove as entradas vencidas e retorna quantas saíram.
    fn sweep(&self) -> Result<usize, StorageError>;
}

/// Task periódica de eviction. Uma varredura que falha é logada e a próxima
/// acontece normalmente.
pub struct Sweeper {
    period: Duration,
    targets: Vec<Arc<dyn Sweep>>,
}

impl Sweeper {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            targets: Vec::new(),
        }
    }

    pub fn with_target(mut self, target: Arc<dyn Sweep>) -> Self {
        self.targets.push(target);
        self
    }

    /// Varre todos os alvos uma vez. Retorna o total removido.
    pub fn sweep_once(&self) -> usize {
        let mut total = 0;
        for target in &self.targets {
            match catch_unwind(AssertUnwindSafe(|| target.sweep())) {
                Ok(Ok(0)) => {}
                Ok(Ok(n)) => {
                    debug!(store = target.name(), removed = n, "varredura concluída");
                    total += n;
                }
                Ok(Err(e)) => error!(store = target.name(), "varredura falhou: {e}"),
                Err(_) => error!(store = target.name(), "varredura entrou em pânico"),
            }
        }
        total
    }

    /// Loop principal até o shutdown. O primeiro sweep ocorre após um período.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval dispara imediatamente no primeiro tick
        ticker.tick().await;

        info!(period_ms = self.period.as_millis() as u64, "sweeper iniciado");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once();
                }
                _ = shutdown.recv() => {
                    break;
                }
            }
        }
        info!("sweeper encerrado");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Alvo que falha nas primeiras `failures` chamadas.
    struct Flaky {
        calls: AtomicUsize,
        failures: usize,
        panics: bool,
    }

    impl Flaky {
        fn new(failures: usize, panics: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                failures,
                panics,
            })
        }
    }

    impl Sweep for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn sweep(&self) -> Result<usize, StorageError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                if self.panics {
                    panic!("store corrompido");
                }
                return Err(StorageError::Poisoned("flaky"));
            }
            Ok(1)
        }
    }

    #[test]
    fn sweep_once_sums_targets() {
        let a = Flaky::new(0, false);
        let b = Flaky::new(0, false);
        let sweeper = Sweeper::new(Duration::from_secs(5))
            .with_target(a.clone())
            .with_target(b.clone());
        assert_eq!(sweeper.sweep_once(), 2);
    }

    #[test]
    fn failing_target_does_not_block_others() {
        let bad = Flaky::new(usize::MAX, false);
        let good = Flaky::new(0, false);
        let sweeper = Sweeper::new(Duration::from_secs(5))
            .with_target(bad.clone())
            .with_target(good.clone());
        assert_eq!(sweeper.sweep_once(), 1);
        assert_eq!(good.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_target_is_contained() {
        let target = Flaky::new(1, true);
        let sweeper = Sweeper::new(Duration::from_secs(5)).with_target(target.clone());
        assert_eq!(sweeper.sweep_once(), 0);
        assert_eq!(sweeper.sweep_once(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_ticking_after_failures() {
        let target = Flaky::new(2, false);
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let sweeper = Sweeper::new(Duration::from_secs(5)).with_target(target.clone());
        let task = tokio::spawn(sweeper.run(shutdown_tx.subscribe()));

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(target.calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(15_200)).await;
        assert_eq!(target.calls.load(Ordering::SeqCst), 4);

        drop(shutdown_tx);
        task.await.unwrap();
    }
}
