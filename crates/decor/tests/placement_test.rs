//! End-to-end tests for the placement engine.
//!
//! Each test wires a real engine to the in-memory scene, the furniture
//! catalog and a scripted tracking supplier.

use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::unbounded;
use decor::*;
use parking_lot::Mutex;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Records every lifecycle call the engine makes.
#[derive(Clone, Default)]
struct ScriptedSupplier {
    supported: bool,
    runs: Arc<Mutex<Vec<RunOptions>>>,
    pauses: Arc<Mutex<usize>>,
}

impl ScriptedSupplier {
    fn supported() -> Self {
        Self {
            supported: true,
            ..Self::default()
        }
    }
}

impl TrackingSupplier for ScriptedSupplier {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn run(&mut self, options: &RunOptions) {
        self.runs.lock().push(*options);
    }

    fn pause(&mut self) {
        *self.pauses.lock() += 1;
    }
}

fn engine_with(supplier: ScriptedSupplier, scene: &SharedScene) -> Result<PlacementEngine> {
    PlacementEngine::new(
        EngineOptions::default(),
        Box::new(supplier),
        scene.clone(),
        Arc::new(CatalogLoader::furniture()),
        Arc::new(MessageBoard::new()),
    )
}

fn camera() -> CameraPose {
    CameraPose::new(9.0 / 16.0)
}

fn floor_hit() -> SurfaceHit {
    SurfaceHit::horizontal(Vec3::new(0.0, -1.0, -2.0), 2.2)
}

#[test]
fn test_placement_session() {
    init_logging();

    let scene = SharedScene::new();
    let supplier = ScriptedSupplier::supported();
    let runs = Arc::clone(&supplier.runs);
    let mut engine = engine_with(supplier, &scene).expect("engine");

    assert_eq!(engine.state(), SessionState::NotStarted);
    engine.start().unwrap();
    assert_eq!(engine.state(), SessionState::Running);

    // Three frames: still searching, then a surface twice
    let searching = TrackingEstimate::new(
        camera(),
        TrackingQuality::Limited(LimitedReason::Initializing),
    );
    let detecting = TrackingEstimate::detecting(camera(), floor_hit());

    assert_eq!(engine.on_frame(&searching).kind(), CursorKind::Initializing);
    assert_eq!(engine.on_frame(&detecting).kind(), CursorKind::Detecting);
    assert_eq!(engine.on_frame(&detecting).kind(), CursorKind::Detecting);
    assert!(engine.can_add_object());

    // Place one object and wait for it to load
    let (done, loaded) = unbounded();
    let handle = engine
        .place_at_cursor("chair", move |outcome| done.send(outcome).unwrap())
        .unwrap();
    assert_eq!(engine.objects().len(), 1);
    let object = loaded.recv_timeout(TIMEOUT).unwrap().unwrap();
    assert_eq!(object.id(), handle.id());
    engine.flush().unwrap();
    assert!(scene.read(|s| s.contains(handle.id().into())));

    // The chair is now in view, which hides the cursor
    assert_eq!(engine.on_frame(&detecting).kind(), CursorKind::Hidden);
    assert!(!engine.can_add_object());
    engine.flush().unwrap();
    assert_eq!(scene.read(|s| s.cursor()), Some(CursorPlacement::Hidden));

    // Restart wipes the session
    engine.restart().unwrap();
    assert!(engine.objects().is_empty());
    assert!(!engine.is_loading());
    assert_eq!(engine.cursor_state().kind(), CursorKind::Initializing);
    engine.flush().unwrap();
    assert!(scene.read(|s| s.is_empty()));

    let runs = runs.lock();
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r.reset_tracking && r.remove_existing_anchors));

    engine.shutdown();
}

#[test]
fn test_unsupported_device() {
    let scene = SharedScene::new();
    let supplier = ScriptedSupplier::default();
    let runs = Arc::clone(&supplier.runs);

    let result = engine_with(supplier, &scene);
    assert!(matches!(result, Err(DecorError::TrackingUnavailable)));
    assert!(runs.lock().is_empty());
}

#[test]
fn test_failed_load_stays_until_removed() {
    let scene = SharedScene::new();
    let mut engine = engine_with(ScriptedSupplier::supported(), &scene).unwrap();
    engine.start().unwrap();
    engine.on_frame(&TrackingEstimate::detecting(camera(), floor_hit()));

    let (done, outcomes) = unbounded();
    let handle = engine
        .place_at_cursor("sofa", move |outcome| done.send(outcome).unwrap())
        .unwrap();
    let err = outcomes.recv_timeout(TIMEOUT).unwrap().unwrap_err();
    assert!(matches!(err, DecorError::LoadFailure { ref asset, .. } if asset == "sofa"));
    assert!(err.is_recoverable());

    let object = engine.objects().get(handle).unwrap();
    assert!(matches!(object.load_state(), LoadState::Failed(_)));

    assert!(engine.remove(handle));
    assert!(!engine.remove(handle));
    engine.flush().unwrap();
    assert!(scene.read(|s| s.is_empty()));
}

#[test]
fn test_pause_resume_keeps_objects() {
    let scene = SharedScene::new();
    let supplier = ScriptedSupplier::supported();
    let pauses = Arc::clone(&supplier.pauses);
    let runs = Arc::clone(&supplier.runs);
    let mut engine = engine_with(supplier, &scene).unwrap();
    engine.start().unwrap();

    let (done, loaded) = unbounded();
    engine.place(
        VirtualObject::new("lamp")
            .with_transform(Transform::from_translation(Vec3::new(0.5, -1.0, -3.0))),
        move |outcome| done.send(outcome.is_ok()).unwrap(),
    );
    assert!(loaded.recv_timeout(TIMEOUT).unwrap());

    engine.pause().unwrap();
    assert_eq!(*pauses.lock(), 1);
    assert!(matches!(
        engine.pause(),
        Err(DecorError::InvalidTransition { .. })
    ));

    engine.resume().unwrap();
    assert_eq!(engine.objects().len(), 1);
    assert!(!runs.lock().last().unwrap().reset_tracking);
}

#[test]
fn test_options_from_json() {
    let options = EngineOptions::from_json_str(r#"{ "load_workers": 4 }"#).unwrap();
    assert_eq!(options.load_workers, 4);
    assert!((options.focus_hint_delay_secs - 5.0).abs() < f32::EPSILON);

    let scene = SharedScene::new();
    let engine = PlacementEngine::new(
        options,
        Box::new(ScriptedSupplier::supported()),
        scene,
        Arc::new(CatalogLoader::furniture()),
        Arc::new(MessageBoard::new()),
    )
    .unwrap();
    assert_eq!(engine.options().load_workers, 4);
}

#[test]
fn test_account_gate() {
    let mut accounts = Accounts::new(MemorySessionStore::new());
    assert!(!accounts.is_logged_in());

    accounts.register("sam@example.com", "correct horse").unwrap();
    assert!(matches!(
        accounts.login("sam@example.com", "battery staple"),
        Err(DecorError::InvalidCredentials)
    ));
    accounts.login("sam@example.com", "correct horse").unwrap();
    assert!(accounts.is_logged_in());

    accounts.logout();
    assert!(!accounts.is_logged_in());
}
