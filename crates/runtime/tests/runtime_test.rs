use std::time::Duration;

use serde_json::json;
use skirmish_core::{
    Action, CharacterData, CharacterId, CoreError, GameEvent, Resolution, Role, SpawnLocation,
    Timestamp, Update, UpdateResult, Vector, WorldMap,
};
use skirmish_runtime::{Event, Runtime, RuntimeConfig, RuntimeError, Topic};

const NO_TRIGGERS: &[&str] = &[];

fn arena() -> WorldMap {
    WorldMap::new(Vector::new(200.0, 200.0))
        .with_spawn_location(SpawnLocation::new(Vector::new(100.0, 100.0), 20.0))
}

fn hero() -> CharacterData {
    CharacterData::new("hero", json!({ "maxHealth": 7 })).at(Vector::new(50.0, 50.0))
}

/// Joining, spawning and leaving as seen by a subscriber.
#[tokio::test]
async fn lifecycle_and_updates_reach_subscribers() {
    // ================================================================
    // PHASE 1: Start a manually ticked server
    // ================================================================
    let runtime = Runtime::builder().map(arena()).build();
    let handle = runtime.handle();
    let mut lifecycle = handle.subscribe(Topic::Lifecycle);
    let mut updates = handle.subscribe(Topic::Updates);

    // ================================================================
    // PHASE 2: Join and spawn
    // ================================================================
    handle
        .add_character(hero(), Role::Player, NO_TRIGGERS)
        .await
        .expect("hero should join");
    assert_eq!(
        lifecycle.recv().await.expect("join announced"),
        Event::Lifecycle(GameEvent::NewCharacter {
            character: CharacterId::new("hero"),
            character_type: Role::Player,
        })
    );

    let report = handle.tick(Timestamp(0)).await.expect("tick should run");
    assert_eq!(report.updates.len(), 1);
    let spawned = updates.recv().await.expect("spawn published");
    let spawned = spawned.as_update().expect("update topic carries updates");
    assert_eq!(spawned.result, UpdateResult::Spawn);
    assert_eq!(spawned.position, Some(Vector::new(50.0, 50.0)));

    // ================================================================
    // PHASE 3: Leave
    // ================================================================
    assert!(handle.remove_character("hero").await.expect("remove should run"));
    assert!(!handle.remove_character("hero").await.expect("remove should run"));
    assert_eq!(
        lifecycle.recv().await.expect("leave announced"),
        Event::Lifecycle(GameEvent::RmCharacter {
            character_id: CharacterId::new("hero"),
        })
    );
    assert!(handle.snapshot().await.unwrap().characters.is_empty());

    drop(handle);
    runtime.shutdown().await.expect("runtime should stop");
}

#[tokio::test]
async fn injected_signals_are_echoed() {
    let runtime = Runtime::builder().map(arena()).build();
    let handle = runtime.handle();
    let mut signals = handle.subscribe(Topic::Signals);

    handle.publish(GameEvent::signal("nightfall")).await.unwrap();
    assert_eq!(
        signals.recv().await.unwrap(),
        Event::Signal("nightfall".to_owned())
    );

    drop(handle);
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn engine_errors_surface_through_the_handle() {
    let runtime = Runtime::builder().map(arena()).build();
    let handle = runtime.handle();

    let error = handle
        .add_character(hero(), Role::Npc, &["sulk"])
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        RuntimeError::Core(CoreError::UnknownTrigger(name)) if name == "sulk"
    ));

    handle.add_character(hero(), Role::Npc, NO_TRIGGERS).await.unwrap();
    let duplicate = handle
        .add_character(hero(), Role::Npc, NO_TRIGGERS)
        .await
        .unwrap_err();
    assert!(matches!(
        duplicate,
        RuntimeError::Core(CoreError::DuplicateCharacter(_))
    ));

    drop(handle);
    runtime.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn ticker_drives_the_engine() {
    let config = RuntimeConfig {
        tick_interval: Some(Duration::from_millis(100)),
        ..RuntimeConfig::default()
    };
    let runtime = Runtime::builder().config(config).map(arena()).build();
    let handle = runtime.handle();
    let mut updates = handle.subscribe(Topic::Updates);

    handle
        .add_character(hero(), Role::Player, NO_TRIGGERS)
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(1), updates.recv())
        .await
        .expect("ticker should tick within a second")
        .unwrap();
    assert_eq!(event.as_update().unwrap().result, UpdateResult::Spawn);

    drop(handle);
    runtime.shutdown().await.expect("ticker and worker should stop");
}

/// A predictive client adopts characters it learns about from the server.
#[tokio::test]
async fn client_applies_server_updates() {
    let config = RuntimeConfig {
        resolution: Resolution::Predictive,
        ..RuntimeConfig::default()
    };
    let runtime = Runtime::builder().config(config).map(arena()).build();
    let handle = runtime.handle();
    let mut updates = handle.subscribe(Topic::Updates);

    let walked = Update::new(CharacterId::new("scout"), Action::Walk, UpdateResult::Walk)
        .at(Vector::new(40.0, 60.0), Vector::new(1.0, 0.0))
        .with_sheet(json!({ "maxHealth": 5 }));
    handle.ingest_update(walked.clone()).await.unwrap();
    handle.tick(Timestamp(0)).await.unwrap();

    assert_eq!(updates.recv().await.unwrap(), Event::Update(walked));
    let snapshot = handle.snapshot().await.unwrap();
    let scout = snapshot
        .characters
        .iter()
        .find(|character| character.id == CharacterId::new("scout"))
        .expect("scout should be materialized");
    assert_eq!(scout.role, Role::Npc);
    assert_eq!(scout.position, Some(Vector::new(40.0, 60.0)));

    drop(handle);
    runtime.shutdown().await.unwrap();
}
