//! Tauri commands for the anistream providers
//!
//! Every command takes the target `provider` ("hanime" or "yhdm") and
//! returns errors as their display string.

use anistream_core::{
    EpisodeDetails, EpisodeServer, ProviderInfo, ProviderKind, SearchOptions, SearchResult, Settings,
};
use tauri::State;

use crate::ProvidersState;

/// Names of the registered providers
#[tauri::command]
pub fn list_providers(state: State<'_, ProvidersState>) -> Vec<ProviderKind> {
    state.kinds()
}

/// Selectable servers and dub support of a provider
#[tauri::command]
pub fn get_settings(state: State<'_, ProvidersState>, provider: ProviderKind) -> Result<Settings, String> {
    Ok(state.get(provider)?.settings())
}

/// Search a provider
///
/// # Arguments
/// * `state` - Managed ProvidersState from Tauri
/// * `provider` - Target provider
/// * `options` - Query plus optional media titles
///
/// # Errors
/// Returns error message as String if the query is empty or every domain failed
#[tauri::command]
pub async fn search(
    state: State<'_, ProvidersState>,
    provider: ProviderKind,
    options: SearchOptions,
) -> Result<Vec<SearchResult>, String> {
    let provider = state.get(provider)?;
    provider.search(&options).await.map_err(|e| e.to_string())
}

/// List the episodes of a search result
#[tauri::command]
pub async fn find_episodes(
    state: State<'_, ProvidersState>,
    provider: ProviderKind,
    id: String,
) -> Result<Vec<EpisodeDetails>, String> {
    let provider = state.get(provider)?;
    provider.find_episodes(&id).await.map_err(|e| e.to_string())
}

/// Resolve playable sources for an episode
///
/// # Arguments
/// * `state` - Managed ProvidersState from Tauri
/// * `provider` - Target provider
/// * `episode` - Episode as returned by `find_episodes`
/// * `server` - Server name from the provider settings; blank picks the default
///
/// # Returns
/// Sources with the headers the player must send; no sources when the
/// page carried none
#[tauri::command]
pub async fn find_episode_server(
    state: State<'_, ProvidersState>,
    provider: ProviderKind,
    episode: EpisodeDetails,
    server: Option<String>,
) -> Result<EpisodeServer, String> {
    let provider = state.get(provider)?;
    provider
        .find_episode_server(&episode, server.as_deref().unwrap_or_default())
        .await
        .map_err(|e| e.to_string())
}

/// Version, working domain and cache size of a provider
#[tauri::command]
pub fn provider_info(state: State<'_, ProvidersState>, provider: ProviderKind) -> Result<ProviderInfo, String> {
    Ok(state.get(provider)?.info())
}

/// Drop a provider's cached responses
#[tauri::command]
pub fn clear_cache(state: State<'_, ProvidersState>, provider: ProviderKind) -> Result<(), String> {
    state.get(provider)?.clear_cache();
    Ok(())
}
