//! Record a short session, persist it, load it back and replay it

use action_replay::capture::{DomEvent, EventTarget, ReplayFlag};
use action_replay::command::{Command, Payload};
use action_replay::config::ReplayConfig;
use action_replay::dom::headless::{HeadlessBrowser, HeadlessDocument, HeadlessElement, WindowEvent};
use action_replay::dom::{Dimensions, ACTIVATION_ATTRIBUTE};
use action_replay::loader::load_session;
use action_replay::player::{PlaybackState, ReplayPlayer};
use action_replay::recorder::{BufferConfig, CaptureSession, CommandBuffer};
use action_replay::storage::{MemoryStore, StoreBackend};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn app_browser() -> (Arc<HeadlessBrowser>, usize) {
    let doc = Arc::new(HeadlessDocument::new(Dimensions::new(1000.0, 3000.0)));
    doc.append(HeadlessElement::new("a").attr("href", "/feed"));
    let like = doc.append(HeadlessElement::new("button").attr(ACTIVATION_ATTRIBUTE, "like-post"));
    let browser = HeadlessBrowser::new(doc, Dimensions::new(1000.0, 1000.0))
        .with_load_delay(Duration::from_millis(250));
    (Arc::new(browser), like)
}

fn assert_gap(actual: Duration, expected_ms: u64) {
    let expected = Duration::from_millis(expected_ms);
    assert!(
        actual >= expected && actual < expected + Duration::from_millis(10),
        "expected ~{expected:?}, got {actual:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_session_replays_at_recorded_pace() {
    let store = Arc::new(MemoryStore::new());
    let backend = Arc::new(StoreBackend::new(store.clone(), "user-1"));

    let buffer = CommandBuffer::new(backend.clone(), BufferConfig::default());
    let session_id = buffer.init();
    buffer.push(Command::route(1_000, "/feed"));
    buffer.push(Command::activate(1_700, "like-post"));
    buffer.push(Command::scroll(2_200, 0.4, 0.0));
    assert!(buffer.flush().await);

    let commands = load_session(backend.as_ref(), session_id).await.unwrap();
    assert_eq!(commands.len(), 3);
    assert!(matches!(commands[2].payload, Payload::Scroll(_)));

    let (browser, like) = app_browser();
    let completions = Arc::new(AtomicUsize::new(0));
    let counter = completions.clone();
    let flag = ReplayFlag::new();
    let player = ReplayPlayer::builder(browser.clone(), commands, flag.clone())
        .on_complete(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    player.play().await.unwrap();
    assert_eq!(player.state(), PlaybackState::Playing);
    assert!(flag.is_replaying());

    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(player.state(), PlaybackState::Completed);
    assert_eq!(player.progress(), (3, 3));
    assert_eq!(completions.load(Ordering::SeqCst), 1);
    assert!(!flag.is_replaying());

    let windows = browser.windows();
    assert_eq!(windows.len(), 1);
    let window = &windows[0];
    assert_eq!(window.location(), "/feed");
    assert_eq!(window.scroll_position(), (0.0, 800.0));

    let journal = window.journal();
    let events: Vec<WindowEvent> = journal.iter().map(|e| e.event.clone()).collect();
    assert_eq!(
        events,
        vec![
            WindowEvent::Navigated("/feed".to_string()),
            WindowEvent::Clicked(like),
            WindowEvent::Scrolled { x: 0.0, y: 800.0 },
        ]
    );
    assert_gap(journal[1].at - journal[0].at, 700);
    assert_gap(journal[2].at - journal[1].at, 500);
}

#[tokio::test(start_paused = true)]
async fn test_dom_events_reach_the_store() {
    let store = Arc::new(MemoryStore::new());
    let backend = Arc::new(StoreBackend::new(store.clone(), "user-1"));
    let config = ReplayConfig {
        enabled: true,
        ..ReplayConfig::default()
    };
    let flag = ReplayFlag::new();

    let session = CaptureSession::new(&config, backend.clone(), flag.clone());
    session.gate().set_user(Some("user-1".to_string()));
    let session_id = session.init();

    session.handle_event(&DomEvent::RouteChange {
        path: "/admin/users".to_string(),
    });
    session.handle_event(&DomEvent::RouteChange {
        path: "/feed".to_string(),
    });
    session.handle_event(&DomEvent::Click {
        composed_path: vec![
            EventTarget::new("span"),
            EventTarget::new("button").with_attr(ACTIVATION_ATTRIBUTE, "like-post"),
        ],
    });

    flag.set(true);
    session.handle_event(&DomEvent::RouteChange {
        path: "/during-replay".to_string(),
    });
    flag.set(false);

    assert!(session.unload().await);

    let commands = load_session(backend.as_ref(), session_id).await.unwrap();
    let kinds: Vec<&str> = commands.iter().map(Command::kind).collect();
    assert_eq!(kinds, vec!["route", "click"]);
    assert_eq!(store.sessions_for_user("user-1").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_anonymous_visitors_are_not_recorded() {
    let store = Arc::new(MemoryStore::new());
    let backend = Arc::new(StoreBackend::new(store.clone(), "user-1"));
    let config = ReplayConfig {
        enabled: true,
        ..ReplayConfig::default()
    };

    let session = CaptureSession::new(&config, backend, ReplayFlag::new());
    session.init();
    session.handle_event(&DomEvent::RouteChange {
        path: "/feed".to_string(),
    });

    assert!(session.unload().await);
    assert_eq!(store.session_count(), 0);
}
