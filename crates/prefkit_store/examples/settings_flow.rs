//! End-to-end settings flow over the in-memory server.
//!
//! Run with `RUST_LOG=debug cargo run -p prefkit_store --example settings_flow`.

use std::sync::Arc;

use prefkit_client::{AuthGateway, MemoryAuthGateway, MemoryServer, RetryingClient};
use prefkit_core::{SchemeSetting, SectionData, ThemeSettings};
use prefkit_store::PreferencesStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Fresh account: the server has no stored preferences yet.
    let server = MemoryServer::new(None);
    let gateway = MemoryAuthGateway::new();
    let tokens = server.issue_tokens();
    gateway.set_tokens(&tokens.access, &tokens.refresh);

    let client = Arc::new(RetryingClient::new(server, gateway));
    let store = PreferencesStore::new(client);

    store
        .subscribe(|state| {
            tracing::info!(
                loading = state.loading,
                error = state.error.is_some(),
                scheme = ?state.document.theme.color_scheme,
                "state changed"
            );
        })
        .detach();

    // Null fetch falls back to the compiled-in defaults.
    let doc = store.load_preferences().await?;
    println!("loaded, frequency = {:?}", doc.notifications.frequency);

    // Propose a theme change; the server-confirmed value is committed.
    let confirmed = store
        .update_section(SectionData::Theme(ThemeSettings {
            color_scheme: SchemeSetting::Dark,
            ..ThemeSettings::default()
        }))
        .await?;
    println!("committed: {confirmed:?}");

    Ok(())
}
