use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{error, info};

use crate::places::PlaceRegistry;
use crate::scripts::{PendingScriptQueue, run_expirer};
use crate::sweeper::Sweeper;

/// Dono das tasks de manutenção: sweeper periódico e expirer da fila.
pub struct Housekeeper {
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
    queue: PendingScriptQueue,
}

impl Housekeeper {
    /// Sobe as tasks no runtime atual.
    pub fn start(
        registry: &PlaceRegistry,
        queue: &PendingScriptQueue,
        clean_interval: Duration,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let sweeper = Sweeper::new(clean_interval)
            .with_target(Arc::new(registry.clone()))
            .with_target(Arc::new(queue.clone()));

        let tasks = vec![
            tokio::spawn(sweeper.run(shutdown_tx.subscribe())),
            tokio::spawn(run_expirer(queue.clone(), shutdown_tx.subscribe())),
        ];

        Self {
            shutdown_tx,
            tasks,
            queue: queue.clone(),
        }
    }

    /// Para as tasks e cancela todos os timers pendentes.
    pub async fn stop(self) {
        let Self {
            shutdown_tx,
            tasks,
            queue,
        } = self;
        drop(shutdown_tx);

        for task in tasks {
            if let Err(e) = task.await {
                error!("task de manutenção terminou com erro: {e}");
            }
        }

        let cancelled = queue.close();
        info!(cancelled, "housekeeper parado");
    }
}
