use crate::error::ClientError;
use crate::game::LocalView;
use crate::network::RpcClient;
use log::{debug, info, warn};
use shared::{BoxKind, Direction, MoveOutcome, PlayerId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Draws the local view. Called from the sync loop after every successful
/// refresh while the local player is still in the match.
pub trait Render: Send + Sync + 'static {
    fn render(&self, view: &LocalView);
}

struct SyncTask {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Keeps a [`LocalView`] in step with the server.
///
/// Moves are shown optimistically, then replaced by the server's answer. A
/// background loop polls the full state at a fixed interval so that other
/// players' actions show up too.
pub struct Reconciler<R: Render> {
    rpc: Arc<Mutex<RpcClient>>,
    view: Arc<RwLock<LocalView>>,
    renderer: Arc<R>,
    player_id: PlayerId,
    sequence: u64,
    sync_interval: Duration,
    sync: Option<SyncTask>,
}

impl<R: Render> Reconciler<R> {
    /// Joins the match over `rpc` as `name`.
    pub async fn connect(
        mut rpc: RpcClient,
        name: &str,
        renderer: R,
        sync_interval: Duration,
    ) -> Result<Self, ClientError> {
        let (player_id, snapshot) = rpc.connect_match(name).await?;
        info!("Joined the match as {} ({})", name, player_id);

        Ok(Self {
            rpc: Arc::new(Mutex::new(rpc)),
            view: Arc::new(RwLock::new(LocalView::new(player_id, snapshot))),
            renderer: Arc::new(renderer),
            player_id,
            sequence: 0,
            sync_interval,
            sync: None,
        })
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn view(&self) -> Arc<RwLock<LocalView>> {
        Arc::clone(&self.view)
    }

    /// Shows the move locally, then sends it. The view ends up holding the
    /// server's snapshot whatever the outcome. Failures are not retried.
    pub async fn submit_move(&mut self, direction: Direction) -> Result<MoveOutcome, ClientError> {
        self.sequence += 1;
        let sequence = self.sequence;

        {
            let mut view = self.view.write().await;
            view.apply_prediction(direction);
            self.renderer.render(&view);
        }

        let (outcome, snapshot) = self
            .rpc
            .lock()
            .await
            .send_move(self.player_id, sequence, direction)
            .await?;
        debug!("Move {} ({:?}) -> {:?}", sequence, direction, outcome);

        let mut view = self.view.write().await;
        view.apply_authoritative(snapshot);
        self.renderer.render(&view);

        Ok(outcome)
    }

    /// Opens the box under the local player, if any.
    pub async fn interact(&self) -> Result<Option<BoxKind>, ClientError> {
        let (kind, snapshot) = self.rpc.lock().await.interact(self.player_id).await?;

        let mut view = self.view.write().await;
        view.apply_authoritative(snapshot);
        view.record_reveal(kind);
        self.renderer.render(&view);

        Ok(kind)
    }

    /// One state round trip applied to the view.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let snapshot = self.rpc.lock().await.get_state(self.player_id).await?;
        self.view.write().await.apply_authoritative(snapshot);
        Ok(())
    }

    /// Spawns the sync loop. Returns false if it is already running.
    pub fn start_sync(&mut self) -> bool {
        if self.sync.is_some() {
            return false;
        }

        let (cancel, cancelled) = watch::channel(false);
        let handle = tokio::spawn(sync_loop(
            Arc::clone(&self.rpc),
            Arc::clone(&self.view),
            Arc::clone(&self.renderer),
            self.player_id,
            self.sync_interval,
            cancelled,
        ));

        self.sync = Some(SyncTask { cancel, handle });
        true
    }

    /// Stops the sync loop and waits for it to exit. A request already in
    /// flight is allowed to finish.
    pub async fn stop_sync(&mut self) {
        let Some(SyncTask { cancel, handle }) = self.sync.take() else {
            return;
        };

        cancel.send_replace(true);
        if let Err(e) = handle.await {
            warn!("Sync task ended abnormally: {}", e);
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.sync.is_some()
    }

    /// Leaves the match. Best effort: the server also drops players whose
    /// connection goes away.
    pub async fn disconnect(mut self) -> Result<(), ClientError> {
        self.stop_sync().await;
        self.rpc.lock().await.disconnect(self.player_id).await?;
        info!("Left the match");
        Ok(())
    }
}

async fn sync_loop<R: Render>(
    rpc: Arc<Mutex<RpcClient>>,
    view: Arc<RwLock<LocalView>>,
    renderer: Arc<R>,
    player_id: PlayerId,
    period: Duration,
    mut cancelled: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            changed = cancelled.changed() => {
                if changed.is_err() || *cancelled.borrow() {
                    break;
                }
            }

            _ = ticker.tick() => {
                let result = rpc.lock().await.get_state(player_id).await;
                match result {
                    Ok(snapshot) => {
                        let mut guard = view.write().await;
                        guard.apply_authoritative(snapshot);
                        let guard = guard.downgrade();
                        if guard.is_present() {
                            renderer.render(&guard);
                        }
                    }
                    Err(e) => warn!("Sync failed, retrying next tick: {}", e),
                }
            }
        }
    }

    debug!("Sync loop stopped");
}

impl<R: Render> Drop for Reconciler<R> {
    fn drop(&mut self) {
        if let Some(task) = self.sync.take() {
            task.cancel.send_replace(true);
        }
    }
}
