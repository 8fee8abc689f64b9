//! Scripted walk through a placement session.
//!
//! Run with `RUST_LOG=debug` to see the engine's log output.

use std::sync::Arc;
use std::time::{Duration, Instant};

use decor::*;

/// Pretends to be a device: reports support and prints lifecycle calls.
struct ScriptedDevice;

impl TrackingSupplier for ScriptedDevice {
    fn is_supported(&self) -> bool {
        true
    }

    fn run(&mut self, options: &RunOptions) {
        println!(
            "device: run (reset tracking: {}, remove anchors: {})",
            options.reset_tracking, options.remove_existing_anchors
        );
    }

    fn pause(&mut self) {
        println!("device: pause");
    }
}

/// A camera sweeping slowly to the right, one pose per frame.
fn sweep(frame: usize) -> CameraPose {
    let angle = frame as f32 * 0.02;
    CameraPose::new(9.0 / 16.0).with_orientation(Quat::from_rotation_y(-angle))
}

fn estimate(frame: usize) -> TrackingEstimate {
    let camera = sweep(frame);
    match frame {
        0..=9 => TrackingEstimate::new(camera, TrackingQuality::Limited(LimitedReason::Initializing)),
        10..=14 => TrackingEstimate::new(camera, TrackingQuality::Limited(LimitedReason::ExcessiveMotion)),
        _ => {
            let ahead = camera.position + camera.forward() * 2.0 + Vec3::new(0.0, -1.2, 0.0);
            let hit = SurfaceHit::horizontal(ahead, ahead.length());
            TrackingEstimate::detecting(camera, hit)
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut accounts = Accounts::new(MemorySessionStore::new());
    accounts.register("demo@example.com", "demo")?;
    accounts.login("demo@example.com", "demo")?;
    println!("logged in: {}", accounts.is_logged_in());

    let scene = SharedScene::new();
    let board = Arc::new(MessageBoard::new());
    let mut engine = PlacementEngine::new(
        EngineOptions::default(),
        Box::new(ScriptedDevice),
        scene.clone(),
        Arc::new(CatalogLoader::furniture()),
        board.clone(),
    )?;
    engine.start()?;

    let started = Instant::now();
    let mut placed = Vec::new();
    for frame in 0..60 {
        let kind = engine.on_frame(&estimate(frame)).kind();

        // Place a piece of furniture every ten frames while a surface is under the cursor
        if engine.can_add_object() && frame % 10 == 0 {
            let asset = ["chair", "table", "lamp"][placed.len() % 3];
            let handle = engine.place_at_cursor(asset, move |outcome| match outcome {
                Ok(object) => println!("loaded {} ({})", object.asset(), object.id()),
                Err(err) => println!("load failed: {err}"),
            })?;
            placed.push(handle);
        }

        // Pretend each frame takes 200ms so the advisories come due
        let now = started + Duration::from_millis(200 * frame as u64);
        for category in board.poll(now) {
            if let Some(text) = board.showing(category) {
                println!("frame {frame:2}: [{category}] {text}");
            }
        }
        if frame % 10 == 0 {
            println!("frame {frame:2}: cursor {kind:?}, {} objects", engine.objects().len());
        }
    }

    engine.flush()?;
    println!("scene holds {} nodes", scene.read(|s| s.len()));

    engine.pause()?;
    engine.restart()?;
    engine.flush()?;
    println!(
        "after restart: {} objects, {} nodes, cursor {:?}",
        engine.objects().len(),
        scene.read(|s| s.len()),
        engine.cursor_state().kind()
    );

    engine.shutdown();
    Ok(())
}
