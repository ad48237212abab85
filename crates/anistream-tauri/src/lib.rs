//! Anistream Tauri Integration
//!
//! Provides Tauri plugin for frontend integration with the anistream
//! scraping providers.
//!
//! # Usage
//!
//! Register the plugin in your Tauri application:
//!
//! ```ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(anistream_tauri::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
//!
//! Then invoke commands from the frontend:
//!
//! ```javascript
//! import { invoke } from '@tauri-apps/api/core';
//!
//! // Search a provider
//! const results = await invoke('plugin:anistream|search', {
//!   provider: 'yhdm',
//!   options: { query: '斗罗大陆', media: { romajiTitle: 'Douluo Dalu' }, dub: false }
//! });
//!
//! // List episodes and resolve sources
//! const episodes = await invoke('plugin:anistream|find_episodes', { provider: 'yhdm', id: results[0].id });
//! const server = await invoke('plugin:anistream|find_episode_server', {
//!   provider: 'yhdm',
//!   episode: episodes[0],
//!   server: '默认播放器'
//! });
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use anistream_core::{AnimeProvider, ProviderKind};
use tauri::{
    Manager, Runtime,
    plugin::{Builder, TauriPlugin},
};

mod commands;

/// Shared providers, one per supported site
///
/// Providers are `Send + Sync` and keep their own caches and working
/// domain, so commands share them through an `Arc` without locking.
pub struct ProvidersState {
    providers: HashMap<ProviderKind, Arc<dyn AnimeProvider>>,
}

impl ProvidersState {
    /// Create every provider with its default configuration
    ///
    /// # Errors
    /// Returns error string if any provider fails to initialize
    pub fn new() -> Result<Self, String> {
        let providers = ProviderKind::ALL
            .into_iter()
            .map(|kind| kind.build().map(|provider| (kind, provider)))
            .collect::<anistream_core::Result<HashMap<_, _>>>()
            .map_err(|e| e.to_string())?;
        Ok(Self { providers })
    }

    /// Provider registered for `kind`
    ///
    /// # Errors
    /// Returns error string if the provider is not registered
    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn AnimeProvider>, String> {
        self.providers
            .get(&kind)
            .cloned()
            .ok_or_else(|| format!("Provider not available: {}", kind))
    }

    /// Registered providers in a stable order
    pub fn kinds(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.providers.contains_key(kind))
            .collect()
    }
}

/// Initialize the anistream plugin
///
/// # Returns
/// A configured TauriPlugin ready to be registered with the Tauri application
///
/// # Example
/// ```ignore
/// tauri::Builder::default()
///     .plugin(anistream_tauri::init())
///     .run(tauri::generate_context!())
///     .expect("error while running tauri application");
/// ```
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("anistream")
        .invoke_handler(tauri::generate_handler![
            commands::list_providers,
            commands::get_settings,
            commands::search,
            commands::find_episodes,
            commands::find_episode_server,
            commands::provider_info,
            commands::clear_cache
        ])
        .setup(|app, _api| {
            let state = ProvidersState::new().map_err(Box::<dyn std::error::Error>::from)?;
            tracing::info!(providers = state.providers.len(), "anistream plugin ready");
            app.manage(state);
            Ok(())
        })
        .build()
}

// Re-export types for convenience
pub use anistream_core::{EpisodeDetails as Episode, EpisodeServer as Server, SearchResult as Anime};
