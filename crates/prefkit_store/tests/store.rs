use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use prefkit_client::PreferencesClient;
use prefkit_core::{
    AccountSettings, ErrorKind, NotificationFrequency, PasswordChange, PreferencesDocument,
    PrefsError, PrivacySettings, ProfileVisibility, SchemeSetting, SectionData, ThemeSettings,
};
use prefkit_store::{PreferencesStore, StatePatch, StoreState};

enum SaveBehavior {
    Echo,
    Fail(String),
    SanitizeUsername,
}

/// Client with scripted fetch results and a fixed save behavior.
struct ScriptedClient {
    fetches: Mutex<VecDeque<Result<Option<PreferencesDocument>, PrefsError>>>,
    save_behavior: SaveBehavior,
    save_calls: AtomicUsize,
}

impl ScriptedClient {
    fn new(
        fetches: Vec<Result<Option<PreferencesDocument>, PrefsError>>,
        save_behavior: SaveBehavior,
    ) -> Arc<Self> {
        Arc::new(Self {
            fetches: Mutex::new(fetches.into()),
            save_behavior,
            save_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PreferencesClient for ScriptedClient {
    async fn fetch(&self) -> Result<Option<PreferencesDocument>, PrefsError> {
        self.fetches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }

    async fn save(&self, data: SectionData) -> Result<SectionData, PrefsError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        match &self.save_behavior {
            SaveBehavior::Echo => Ok(data),
            SaveBehavior::Fail(msg) => Err(PrefsError::Network(msg.clone())),
            SaveBehavior::SanitizeUsername => match data {
                SectionData::Account(mut account) => {
                    account.username = format!("{}_sanitized", account.username);
                    Ok(SectionData::Account(account))
                }
                other => Ok(other),
            },
        }
    }

    async fn change_password(&self, _change: PasswordChange) -> Result<(), PrefsError> {
        Ok(())
    }
}

/// Client whose saves block on a semaphore until the test releases them.
struct GatedClient {
    started: Mutex<Vec<SectionData>>,
    gate: tokio::sync::Semaphore,
    fetch_doc: Mutex<Option<PreferencesDocument>>,
}

impl GatedClient {
    fn new(fetch_doc: Option<PreferencesDocument>) -> Arc<Self> {
        Arc::new(Self {
            started: Mutex::new(Vec::new()),
            gate: tokio::sync::Semaphore::new(0),
            fetch_doc: Mutex::new(fetch_doc),
        })
    }

    fn started(&self) -> Vec<SectionData> {
        self.started.lock().unwrap().clone()
    }

    fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

#[async_trait]
impl PreferencesClient for GatedClient {
    async fn fetch(&self) -> Result<Option<PreferencesDocument>, PrefsError> {
        Ok(self.fetch_doc.lock().unwrap().clone())
    }

    async fn save(&self, data: SectionData) -> Result<SectionData, PrefsError> {
        self.started.lock().unwrap().push(data.clone());
        let permit = self.gate.acquire().await.expect("gate closed");
        permit.forget();
        Ok(data)
    }

    async fn change_password(&self, _change: PasswordChange) -> Result<(), PrefsError> {
        Ok(())
    }
}

fn recording_subscriber(store: &PreferencesStore) -> Arc<Mutex<Vec<StoreState>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    store
        .subscribe(move |state| sink.lock().unwrap().push(state.clone()))
        .detach();
    log
}

async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

fn valid_account(username: &str) -> AccountSettings {
    AccountSettings {
        username: username.to_string(),
        email: "user@example.com".to_string(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        phone: String::new(),
    }
}

fn privacy(visibility: ProfileVisibility) -> PrivacySettings {
    PrivacySettings {
        profile_visibility: visibility,
        ..PrivacySettings::default()
    }
}

#[tokio::test]
async fn subscribe_replays_current_state_immediately() {
    let client = ScriptedClient::new(vec![], SaveBehavior::Echo);
    let store = PreferencesStore::new(client);
    let log = recording_subscriber(&store);

    let states = log.lock().unwrap();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].document, PreferencesDocument::default());
    assert!(!states[0].loading);
    assert_eq!(states[0].error, None);
}

#[tokio::test]
async fn null_fetch_falls_back_to_compiled_in_defaults() {
    let client = ScriptedClient::new(vec![Ok(None)], SaveBehavior::Echo);
    let store = PreferencesStore::new(client);

    let doc = store.load_preferences().await.unwrap();
    assert_eq!(doc, PreferencesDocument::default());
    assert_eq!(
        store.state().document.notifications.frequency,
        NotificationFrequency::Daily
    );
    assert!(!store.state().loading);
}

#[tokio::test]
async fn load_failure_preserves_document_and_rethrows() {
    let mut custom = PreferencesDocument::default();
    custom.theme.color_scheme = SchemeSetting::Dark;
    let client = ScriptedClient::new(
        vec![
            Ok(Some(custom.clone())),
            Err(PrefsError::Network("boom".to_string())),
        ],
        SaveBehavior::Echo,
    );
    let store = PreferencesStore::new(client);

    store.load_preferences().await.unwrap();
    let err = store.load_preferences().await.unwrap_err();
    assert!(matches!(err, PrefsError::Network(_)));

    let state = store.state();
    assert_eq!(state.document, custom);
    assert!(!state.loading);
    assert_eq!(state.error.unwrap().kind, ErrorKind::Network);
}

#[tokio::test]
async fn commits_server_value_not_client_value() {
    let client = ScriptedClient::new(vec![], SaveBehavior::SanitizeUsername);
    let store = PreferencesStore::new(client);

    let confirmed = store
        .update_section(SectionData::Account(valid_account("x")))
        .await
        .unwrap();

    assert_eq!(
        store.state().document.account.username,
        "x_sanitized".to_string()
    );
    match confirmed {
        SectionData::Account(account) => assert_eq!(account.username, "x_sanitized"),
        other => panic!("unexpected section: {other:?}"),
    }
}

#[tokio::test]
async fn invalid_payload_never_reaches_the_network() {
    let client = ScriptedClient::new(vec![], SaveBehavior::Echo);
    let store = PreferencesStore::new(Arc::clone(&client) as Arc<dyn PreferencesClient>);
    let log = recording_subscriber(&store);

    let mut account = valid_account("jane.doe");
    account.email = "not-an-email".to_string();
    let err = store
        .update_section(SectionData::Account(account))
        .await
        .unwrap_err();

    match err {
        PrefsError::Validation(errors) => assert!(errors.get("email").is_some()),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(client.save_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.state().document.account, AccountSettings::default());
    // only the replay-on-subscribe notification happened
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_save_reverts_to_prior_value_and_clears_loading() {
    let client = ScriptedClient::new(vec![], SaveBehavior::Fail("offline".to_string()));
    let store = PreferencesStore::new(client);
    let log = recording_subscriber(&store);

    let before = store.state().document.privacy.clone();
    let err = store
        .update_section(SectionData::Privacy(privacy(ProfileVisibility::Public)))
        .await
        .unwrap_err();
    assert!(matches!(err, PrefsError::Network(_)));

    let states = log.lock().unwrap();
    let last = states.last().unwrap();
    assert_eq!(last.document.privacy, before);
    assert!(!last.loading);
    assert_eq!(last.error.as_ref().unwrap().kind, ErrorKind::Network);
}

#[tokio::test(flavor = "current_thread")]
async fn same_section_saves_queue_in_submission_order() {
    let client = GatedClient::new(None);
    let store = PreferencesStore::new(Arc::clone(&client) as Arc<dyn PreferencesClient>);

    let first = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .update_section(SectionData::Privacy(privacy(ProfileVisibility::Public)))
                .await
        })
    };
    settle().await;
    let second = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .update_section(SectionData::Privacy(privacy(ProfileVisibility::Private)))
                .await
        })
    };
    settle().await;

    // the second save is queued, not run concurrently and not dropped
    assert_eq!(client.started().len(), 1);

    client.release(1);
    settle().await;
    assert_eq!(
        store.state().document.privacy.profile_visibility,
        ProfileVisibility::Public
    );
    assert_eq!(client.started().len(), 2);

    client.release(1);
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();
    assert_eq!(
        store.state().document.privacy.profile_visibility,
        ProfileVisibility::Private
    );

    let started = client.started();
    assert_eq!(
        started[0],
        SectionData::Privacy(privacy(ProfileVisibility::Public))
    );
    assert_eq!(
        started[1],
        SectionData::Privacy(privacy(ProfileVisibility::Private))
    );
}

#[tokio::test(flavor = "current_thread")]
async fn different_sections_run_concurrently_and_share_the_loading_flag() {
    let client = GatedClient::new(None);
    let store = PreferencesStore::new(Arc::clone(&client) as Arc<dyn PreferencesClient>);

    let account_task = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .update_section(SectionData::Account(valid_account("jane.doe")))
                .await
        })
    };
    let privacy_task = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .update_section(SectionData::Privacy(privacy(ProfileVisibility::Public)))
                .await
        })
    };
    settle().await;

    // both dispatched, neither blocked behind the other
    assert_eq!(client.started().len(), 2);
    assert!(store.state().loading);

    client.release(1);
    settle().await;
    // one operation still in flight keeps loading true
    assert!(store.state().loading);

    client.release(1);
    account_task.await.unwrap().unwrap();
    privacy_task.await.unwrap().unwrap();
    assert!(!store.state().loading);
}

#[tokio::test(flavor = "current_thread")]
async fn save_resolving_after_a_reload_is_discarded() {
    let mut server_doc = PreferencesDocument::default();
    server_doc.privacy.profile_visibility = ProfileVisibility::Private;
    let client = GatedClient::new(Some(server_doc.clone()));
    let store = PreferencesStore::new(Arc::clone(&client) as Arc<dyn PreferencesClient>);

    let save_task = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .update_section(SectionData::Privacy(privacy(ProfileVisibility::Public)))
                .await
        })
    };
    settle().await;
    assert_eq!(client.started().len(), 1);

    // a reload lands while the save is still in flight
    store.load_preferences().await.unwrap();
    assert_eq!(
        store.state().document.privacy.profile_visibility,
        ProfileVisibility::Private
    );

    client.release(1);
    save_task.await.unwrap().unwrap();

    // the stale result must not clobber the fresher document
    assert_eq!(
        store.state().document.privacy.profile_visibility,
        ProfileVisibility::Private
    );
    assert!(!store.state().loading);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stale_save_cannot_clobber_a_reload_across_threads() {
    let mut server_doc = PreferencesDocument::default();
    server_doc.privacy.profile_visibility = ProfileVisibility::Private;
    let client = GatedClient::new(Some(server_doc));
    let store = PreferencesStore::new(Arc::clone(&client) as Arc<dyn PreferencesClient>);

    let save_task = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .update_section(SectionData::Privacy(privacy(ProfileVisibility::Public)))
                .await
        })
    };
    // wait until the save has taken its generation ticket
    while client.started().is_empty() {
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }

    store.load_preferences().await.unwrap();
    client.release(1);
    save_task.await.unwrap().unwrap();

    // the reload bumped the generation, so the save result is discarded
    assert_eq!(
        store.state().document.privacy.profile_visibility,
        ProfileVisibility::Private
    );
    assert!(!store.state().loading);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn subscribers_never_see_snapshots_go_backwards() {
    let client = ScriptedClient::new(vec![], SaveBehavior::Echo);
    let store = PreferencesStore::new(client);

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for i in 0..200u32 {
                let mut account = valid_account("jane.doe");
                account.first_name = i.to_string();
                store.set_state(StatePatch {
                    account: Some(account),
                    ..StatePatch::default()
                });
                tokio::task::yield_now().await;
            }
        })
    };

    // subscribe mid-stream; the replay must never arrive after a newer
    // notification
    let mut logs = Vec::new();
    for _ in 0..8 {
        let log: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let sub = store.subscribe(move |state| {
            let seen = state.document.account.first_name.parse().unwrap_or(0);
            sink.lock().unwrap().push(seen);
        });
        logs.push((sub, log));
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();

    for (_sub, log) in &logs {
        let seen = log.lock().unwrap();
        assert!(
            seen.windows(2).all(|pair| pair[0] <= pair[1]),
            "snapshots went backwards: {seen:?}"
        );
    }
}

#[tokio::test]
async fn theme_subscribers_fire_only_on_theme_changes() {
    let client = ScriptedClient::new(vec![], SaveBehavior::Echo);
    let store = PreferencesStore::new(client);

    let themes: Arc<Mutex<Vec<ThemeSettings>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&themes);
    store
        .subscribe_theme(move |theme| sink.lock().unwrap().push(theme.clone()))
        .detach();
    assert_eq!(themes.lock().unwrap().len(), 1); // replay

    store
        .update_section(SectionData::Privacy(privacy(ProfileVisibility::Public)))
        .await
        .unwrap();
    assert_eq!(themes.lock().unwrap().len(), 1);

    let new_theme = ThemeSettings {
        color_scheme: SchemeSetting::Dark,
        ..ThemeSettings::default()
    };
    store
        .update_section(SectionData::Theme(new_theme.clone()))
        .await
        .unwrap();
    let seen = themes.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1], new_theme);
}

#[tokio::test]
async fn unsubscribe_stops_notifications() {
    let client = ScriptedClient::new(vec![], SaveBehavior::Echo);
    let store = PreferencesStore::new(client);

    let count = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&count);
    let sub = store.subscribe(move |_| {
        sink.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(count.load(Ordering::SeqCst), 1);

    sub.unsubscribe();
    store
        .update_section(SectionData::Privacy(privacy(ProfileVisibility::Public)))
        .await
        .unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn set_state_merges_and_notifies_like_an_update() {
    let client = ScriptedClient::new(vec![], SaveBehavior::Echo);
    let store = PreferencesStore::new(client);
    let log = recording_subscriber(&store);

    let theme = ThemeSettings {
        color_scheme: SchemeSetting::Auto,
        ..ThemeSettings::default()
    };
    store.set_state(StatePatch {
        theme: Some(theme.clone()),
        error: Some(None),
        ..StatePatch::default()
    });

    let states = log.lock().unwrap();
    let last = states.last().unwrap();
    assert_eq!(last.document.theme, theme);
    assert_eq!(last.document.privacy, PrivacySettings::default());
}

#[tokio::test]
async fn password_change_validates_before_the_network() {
    let client = ScriptedClient::new(vec![], SaveBehavior::Echo);
    let store = PreferencesStore::new(Arc::clone(&client) as Arc<dyn PreferencesClient>);

    let err = store
        .change_password(PasswordChange {
            current_password: "Old12345".to_string(),
            new_password: "weak".to_string(),
            confirm_password: "weak".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PrefsError::Validation(_)));
    assert_eq!(store.state().error.unwrap().kind, ErrorKind::Validation);

    store
        .change_password(PasswordChange {
            current_password: "Old12345".to_string(),
            new_password: "Fresh123".to_string(),
            confirm_password: "Fresh123".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(store.state().error, None);
}
