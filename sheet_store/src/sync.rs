use std::{sync::Arc, time::Duration};

use log::*;
use tokio::{
    sync::{watch, RwLock},
    task::JoinHandle,
};

use crate::{api::SheetStoreApi, product::Product};

/// How often the background poller re-reads the sheet.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Keeps an in-memory copy of the catalog eventually consistent with the shared sheet.
///
/// Two refresh modes exist: foreground (initial load and post-mutation refreshes, which raise
/// the loading flag while the fetch is in flight) and background (the interval poller, which is
/// silent). Every completed fetch replaces the whole set, so between two racing fetches the one
/// that completes last wins. That is the whole consistency story; there is no merging.
pub struct CatalogSync {
    api: SheetStoreApi,
    products: Arc<RwLock<Vec<Product>>>,
    loading: watch::Sender<bool>,
    shutdown: Option<watch::Sender<bool>>,
    poller: Option<JoinHandle<()>>,
    interval: Duration,
}

impl CatalogSync {
    pub fn new(api: SheetStoreApi) -> Self {
        Self::with_interval(api, POLL_INTERVAL)
    }

    pub fn with_interval(api: SheetStoreApi, interval: Duration) -> Self {
        let (loading, _) = watch::channel(false);
        Self { api, products: Arc::new(RwLock::new(Vec::new())), loading, shutdown: None, poller: None, interval }
    }

    /// Performs the initial foreground load, then starts the silent background poller.
    /// Does nothing while the adapter is unconfigured.
    pub async fn start(&mut self) {
        if !self.api.is_configured() {
            warn!("Catalog sync not started: no sheet endpoint configured");
            return;
        }
        if self.poller.is_some() {
            return;
        }
        self.refresh().await;
        let api = self.api.clone();
        let products = Arc::clone(&self.products);
        let interval = self.interval;
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            // The first tick completes immediately; the foreground load above already covered it.
            timer.tick().await;
            loop {
                // Shutdown is only observed between polls, so a fetch that has already started
                // runs to completion and its result still lands.
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = timer.tick() => {},
                }
                trace!("Background catalog refresh");
                let fetched = api.list().await;
                let mut guard = products.write().await;
                *guard = newest_first(fetched);
            }
            debug!("Catalog poller wound down");
        });
        self.shutdown = Some(shutdown_tx);
        self.poller = Some(handle);
        info!("Catalog polling started ({}s interval)", self.interval.as_secs());
    }

    /// A user-visible refresh: raises the loading flag, fetches, replaces the set, lowers the
    /// flag. Called for the initial load and after every successful mutation.
    pub async fn refresh(&self) {
        if !self.api.is_configured() {
            return;
        }
        let _ = self.loading.send(true);
        let fetched = self.api.list().await;
        {
            let mut guard = self.products.write().await;
            *guard = newest_first(fetched);
        }
        let _ = self.loading.send(false);
    }

    /// Stops scheduling background polls. A poll already in flight is not cancelled: it
    /// completes, replaces the set one last time, and the loop winds down after it.
    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }
        if self.poller.take().is_some() {
            info!("Catalog polling stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_some()
    }

    /// A snapshot of the current product set, newest first.
    pub async fn products(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    /// Observes the foreground loading flag, e.g. to drive a spinner.
    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub fn api(&self) -> &SheetStoreApi {
        &self.api
    }
}

impl Drop for CatalogSync {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The sheet appends new rows at the bottom; the catalog shows newest entries first.
fn newest_first(mut products: Vec<Product>) -> Vec<Product> {
    products.reverse();
    products
}

#[cfg(test)]
mod test {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        sync::oneshot,
    };

    use super::*;
    use crate::config::StoreConfig;

    fn unconfigured_sync() -> CatalogSync {
        CatalogSync::new(SheetStoreApi::new(StoreConfig::unconfigured()).unwrap())
    }

    /// A one-connection-at-a-time sheet stand-in. The first request (the foreground load)
    /// answers immediately with no rows; the second signals `started`, stalls, then answers
    /// with one row; anything after answers immediately with no rows again.
    async fn slow_second_poll(listener: TcpListener, started: oneshot::Sender<()>) {
        let mut started = Some(started);
        let mut hits = 0usize;
        loop {
            let (mut sock, _) = listener.accept().await.unwrap();
            hits += 1;
            let mut buf = vec![0u8; 4096];
            let _ = sock.read(&mut buf).await;
            let body = if hits == 2 {
                if let Some(tx) = started.take() {
                    let _ = tx.send(());
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
                r#"{"status":"success","data":[{"id":"late-row"}]}"#
            } else {
                r#"{"status":"success","data":[]}"#
            };
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = sock.write_all(response.as_bytes()).await;
        }
    }

    #[tokio::test]
    async fn unconfigured_sync_never_starts() {
        let _ = env_logger::try_init();
        let mut sync = unconfigured_sync();
        sync.start().await;
        assert!(!sync.is_running());
        assert!(sync.products().await.is_empty());
        assert!(!*sync.subscribe_loading().borrow());
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let mut sync = unconfigured_sync();
        sync.stop();
        sync.stop();
        assert!(!sync.is_running());
    }

    #[tokio::test]
    async fn foreground_refresh_toggles_the_loading_flag() {
        // Unreachable endpoint: the fetch fails soft, but the flag must still go up and down.
        let api = SheetStoreApi::new(StoreConfig::with_endpoint("http://127.0.0.1:9/macros/s/test/exec")).unwrap();
        let sync = CatalogSync::new(api);
        let mut loading = sync.subscribe_loading();
        let watcher = tokio::spawn(async move {
            loading.wait_for(|v| *v).await.expect("loading flag never raised");
            loading.wait_for(|v| !*v).await.expect("loading flag never lowered");
        });
        sync.refresh().await;
        watcher.await.unwrap();
        assert!(sync.products().await.is_empty());
    }

    #[tokio::test]
    async fn background_polls_never_raise_the_loading_flag() {
        let api = SheetStoreApi::new(StoreConfig::with_endpoint("http://127.0.0.1:9/macros/s/test/exec")).unwrap();
        let mut sync = CatalogSync::with_interval(api, Duration::from_millis(10));
        sync.start().await;
        // Subscribing after start marks the foreground load's toggling as seen; from here on
        // only a background poll could move the flag, and none may.
        let mut loading = sync.subscribe_loading();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!loading.has_changed().unwrap());
        assert!(!*loading.borrow());
        sync.stop();
    }

    #[tokio::test]
    async fn polling_starts_and_stops_cleanly() {
        let api = SheetStoreApi::new(StoreConfig::with_endpoint("http://127.0.0.1:9/macros/s/test/exec")).unwrap();
        let mut sync = CatalogSync::with_interval(api, Duration::from_millis(10));
        sync.start().await;
        assert!(sync.is_running());
        tokio::time::sleep(Duration::from_millis(35)).await;
        sync.stop();
        assert!(!sync.is_running());
    }

    #[tokio::test]
    async fn stop_lets_an_in_flight_poll_complete() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (started_tx, started_rx) = oneshot::channel();
        tokio::spawn(slow_second_poll(listener, started_tx));

        let api = SheetStoreApi::new(StoreConfig::with_endpoint(format!("http://{addr}/exec"))).unwrap();
        let mut sync = CatalogSync::with_interval(api, Duration::from_millis(10));
        sync.start().await;
        assert!(sync.products().await.is_empty());

        // Wait until the second poll is mid-flight, then stop. The poll must still land.
        started_rx.await.unwrap();
        sync.stop();
        tokio::time::sleep(Duration::from_millis(200)).await;
        let products = sync.products().await;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "late-row");
    }

    #[test]
    fn newest_rows_come_first() {
        let a = Product { id: "old".to_string(), ..Product::default() };
        let b = Product { id: "new".to_string(), ..Product::default() };
        let ordered = newest_first(vec![a, b]);
        assert_eq!(ordered[0].id, "new");
        assert_eq!(ordered[1].id, "old");
    }
}
