//! The item catalog server lifecycle.

use std::net::SocketAddr;

use anyhow::Result;
use tracing::info;

use crate::{config::Config, http::HttpServer, state::AppState, store::ItemStore};

/// Spawn the server and run until the `Ctrl-C` signal is received, then shutdown.
pub async fn run_with_config_until_ctrl_c(config: Config) -> Result<()> {
    let store = ItemStore::persistent(config.item_store_path()?)?;
    let server = Server::spawn(config, store).await?;
    tokio::signal::ctrl_c().await?;
    info!("shutdown");
    server.shutdown().await?;
    Ok(())
}

/// The item catalog server.
pub struct Server {
    http_server: HttpServer,
}

impl Server {
    /// Spawn the server.
    ///
    /// The store is constructed by the caller and handed in; it is dropped
    /// (releasing the database file) when the server shuts down.
    pub async fn spawn(config: Config, store: ItemStore) -> Result<Self> {
        let state = AppState { store };
        let http_server = HttpServer::spawn(config.http, state).await?;
        Ok(Self { http_server })
    }

    /// Get the bound address of the HTTP socket.
    pub fn addr(&self) -> SocketAddr {
        self.http_server.addr()
    }

    /// Cancel the server tasks and wait for all tasks to complete.
    pub async fn shutdown(self) -> Result<()> {
        self.http_server.shutdown().await
    }

    /// Wait for all tasks to complete.
    ///
    /// This will run forever unless a task closes with an error.
    pub async fn run_until_error(self) -> Result<()> {
        self.http_server.run_until_done().await
    }

    /// Spawn a server suitable for testing.
    ///
    /// Binds to localhost on an ephemeral port with an in-memory store.
    /// Returns the server handle, a clone of its store and the base [`url::Url`]
    /// of the HTTP server.
    #[cfg(test)]
    pub async fn spawn_for_tests() -> Result<(Self, ItemStore, url::Url)> {
        use std::net::{IpAddr, Ipv4Addr};

        let mut config = Config::default();
        config.http.port = 0;
        config.http.bind_addr = Some(IpAddr::V4(Ipv4Addr::LOCALHOST));

        let store = ItemStore::in_memory()?;
        let server = Self::spawn(config, store.clone()).await?;
        let url = format!("http://{}", server.addr()).parse()?;
        Ok((server, store, url))
    }
}
