//! Shared state for the item catalog server

use crate::store::ItemStore;

/// The shared app state.
#[derive(Clone)]
pub struct AppState {
    /// The item document store
    pub store: ItemStore,
}
