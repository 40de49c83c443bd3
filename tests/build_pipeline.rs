//! End-to-end tests for the build scheduler
//!
//! These tests verify:
//! - Every discovered file gets exactly one terminal status
//! - Second runs skip up-to-date outputs and leave their bytes and mtimes alone
//! - A data file sharing a texture's stem is still copied
//! - Encoder and supercompression failures are logged, never fatal
//! - Outcomes do not depend on the number of jobs
//! - Interruption writes a single log entry and ends the run with an error
//! - Post-build copy directories are flattened into the destination

use asset_baker::encoder::{EncodeRequest, ToolOutput};
use asset_baker::pipeline::aggregator::INTERRUPTED_MESSAGE;
use asset_baker::{BuildConfig, BuildError, Encoder, InterruptController, Scheduler, TaskStatus};
use image::{GrayImage, RgbImage, RgbaImage};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tokio::sync::broadcast;
use tokio_test::{assert_err, assert_ok};

/// Encoder double keyed on the output file name
#[derive(Default)]
struct ScriptedEncoder {
    encode_calls: AtomicUsize,
    deflate_exit: i32,
    delay: Option<Duration>,
    started: Mutex<Option<mpsc::Sender<()>>>,
}

impl ScriptedEncoder {
    fn run(command: &str, exit_code: i32) -> ToolOutput {
        ToolOutput {
            command: command.to_string(),
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: "scripted failure".to_string(),
        }
    }
}

impl Encoder for ScriptedEncoder {
    fn encode(&self, request: &EncodeRequest<'_>) -> Result<ToolOutput, BuildError> {
        self.encode_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(sender) = self.started.lock().unwrap().as_ref() {
            let _ = sender.send(());
        }
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let stem = request.output.file_stem().unwrap().to_string_lossy().into_owned();
        if stem.contains("panics") {
            panic!("encoder crashed on {}", stem);
        }
        if stem.contains("broken") {
            return Ok(Self::run("scripted-encode", 2));
        }

        std::fs::write(request.output, b"KTX2")?;
        Ok(Self::run("scripted-encode", 0))
    }

    fn supercompress(&self, _container: &Path, _level: u8) -> Result<ToolOutput, BuildError> {
        Ok(Self::run("scripted-deflate", self.deflate_exit))
    }
}

/// Project with textures, data files and a post-build copy directory
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let textures = root.join("Assets/textures");
    let post_build = root.join(asset_baker::file_manager::FileManager::post_build_copy_dir());
    std::fs::create_dir_all(&textures).unwrap();
    std::fs::create_dir_all(post_build.join("shaders")).unwrap();

    RgbaImage::new(8, 8).save(textures.join("wall.png")).unwrap();
    RgbImage::new(8, 8).save(textures.join("wall_normal.png")).unwrap();
    GrayImage::new(8, 8).save(textures.join("mask.png")).unwrap();
    RgbImage::new(8, 8).save(textures.join("photo.jpg")).unwrap();
    std::fs::write(root.join("Assets/level.json"), b"{\"tiles\": []}").unwrap();
    std::fs::write(root.join("Assets/app.ico"), b"icon").unwrap();
    std::fs::write(post_build.join("shaders/basic.vert"), b"void main() {}").unwrap();
    dir
}

fn config(root: &Path, jobs: usize) -> BuildConfig {
    let mut config = BuildConfig::for_project(root);
    config.override_name = Some("Game".to_string());
    config.ci = true;
    config.jobs = jobs;
    config
}

fn never_stop() -> (broadcast::Sender<()>, broadcast::Receiver<()>) {
    broadcast::channel(1)
}

/// Bytes and mtime of every file under `dir`
fn snapshot(dir: &Path) -> BTreeMap<PathBuf, (Vec<u8>, SystemTime)> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let path = entry.into_path();
            let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
            (path.clone(), (std::fs::read(&path).unwrap(), modified))
        })
        .collect()
}

#[tokio::test]
async fn test_full_build_then_incremental_rebuild() {
    let dir = project();
    let encoder = Arc::new(ScriptedEncoder::default());
    let scheduler = Scheduler::new(config(dir.path(), 4), encoder.clone());

    let tasks = scheduler.discover();
    assert_eq!(tasks.len(), 7);
    let (_tx, rx) = never_stop();
    let report = assert_ok!(scheduler.run(tasks, rx).await);

    assert_eq!(report.files.len(), report.total_files);
    assert_eq!(report.processed, 7);
    assert_eq!(report.count(TaskStatus::Completed), 4);
    assert_eq!(report.count(TaskStatus::Copied), 3);
    assert_eq!(report.errors, 0);
    assert_eq!(encoder.encode_calls.load(Ordering::SeqCst), 4);

    let dest = dir.path().join("bin/Debug/Game");
    assert!(dest.join("Assets/textures/wall.ktx2").is_file());
    assert!(dest.join("Assets/textures/photo.ktx2").is_file());
    assert!(dest.join("Assets/level.json").is_file());
    let before = snapshot(&dest);
    assert_eq!(before.len(), 7);

    // nothing changed: every file is skipped and the encoder is not called again
    let scheduler = Scheduler::new(config(dir.path(), 4), encoder.clone());
    let tasks = scheduler.discover();
    let (_tx, rx) = never_stop();
    let report = assert_ok!(scheduler.run(tasks, rx).await);

    assert_eq!(report.count(TaskStatus::Skipped), 7);
    assert_eq!(report.processed, 7);
    assert_eq!(encoder.encode_calls.load(Ordering::SeqCst), 4);
    assert_eq!(snapshot(&dest), before);
}

#[tokio::test]
async fn test_data_file_sharing_texture_stem_is_copied() {
    let dir = project();
    let data = dir.path().join("Assets/textures/wall.txt");
    std::fs::write(&data, b"wall metadata").unwrap();

    let scheduler = Scheduler::new(config(dir.path(), 1), Arc::new(ScriptedEncoder::default()));
    let (_tx, rx) = never_stop();
    let report = assert_ok!(scheduler.run(scheduler.discover(), rx).await);

    assert_eq!(report.files["Assets/textures/wall.png"], TaskStatus::Completed);
    assert_eq!(report.files["Assets/textures/wall.txt"], TaskStatus::Copied);

    let dest = dir.path().join("bin/Debug/Game/Assets/textures");
    assert!(dest.join("wall.ktx2").is_file());
    assert_eq!(std::fs::read(dest.join("wall.txt")).unwrap(), b"wall metadata");

    // both stay up to date on their own destination
    let scheduler = Scheduler::new(config(dir.path(), 1), Arc::new(ScriptedEncoder::default()));
    let (_tx, rx) = never_stop();
    let report = assert_ok!(scheduler.run(scheduler.discover(), rx).await);
    assert_eq!(report.count(TaskStatus::Skipped), report.total_files);
}

#[tokio::test]
async fn test_failures_are_logged_and_counted() {
    let dir = project();
    RgbaImage::new(8, 8)
        .save(dir.path().join("Assets/textures/broken_albedo.png"))
        .unwrap();
    RgbaImage::new(8, 8)
        .save(dir.path().join("Assets/textures/panics.png"))
        .unwrap();

    let scheduler = Scheduler::new(config(dir.path(), 3), Arc::new(ScriptedEncoder::default()));
    let tasks = scheduler.discover();
    let total = tasks.len();
    let (_tx, rx) = never_stop();
    let report = assert_ok!(scheduler.run(tasks, rx).await);

    assert_eq!(report.files.len(), total);
    assert_eq!(report.count(TaskStatus::Failed), 2);
    assert_eq!(report.processed, total - 2);
    assert_eq!(report.errors, 2);

    let log_path = report.log_file.clone().expect("errors must produce a log file");
    assert!(log_path.starts_with(dir.path().join("Logs")));
    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("Failed to compress"));
    assert!(log.contains("Return code: 2"));
    assert!(log.contains("Unhandled exception processing"));

    let broken_output = dir.path().join("bin/Debug/Game/Assets/textures/broken_albedo.ktx2");
    assert!(!broken_output.exists());
}

#[tokio::test]
async fn test_deflate_failure_keeps_texture_completed() {
    let dir = project();
    let encoder = Arc::new(ScriptedEncoder {
        deflate_exit: 1,
        ..Default::default()
    });
    let scheduler = Scheduler::new(config(dir.path(), 2), encoder);
    let tasks = scheduler.discover();
    let (_tx, rx) = never_stop();
    let report = assert_ok!(scheduler.run(tasks, rx).await);

    assert_eq!(report.count(TaskStatus::Completed), 4);
    assert_eq!(report.errors, 4);
    let log = std::fs::read_to_string(report.log_file.unwrap()).unwrap();
    assert_eq!(log.matches("Failed to deflate").count(), 4);
}

#[tokio::test]
async fn test_outcomes_do_not_depend_on_jobs() {
    let serial_dir = project();
    let parallel_dir = project();
    for dir in [&serial_dir, &parallel_dir] {
        let textures = dir.path().join("Assets/textures");
        RgbaImage::new(8, 8).save(textures.join("broken_albedo.png")).unwrap();
        std::fs::write(textures.join("wall.txt"), b"wall metadata").unwrap();
    }

    let serial = Scheduler::new(config(serial_dir.path(), 1), Arc::new(ScriptedEncoder::default()));
    let parallel = Scheduler::new(config(parallel_dir.path(), 8), Arc::new(ScriptedEncoder::default()));

    let (_tx, rx) = never_stop();
    let serial_report = assert_ok!(serial.run(serial.discover(), rx).await);
    let (_tx, rx) = never_stop();
    let parallel_report = assert_ok!(parallel.run(parallel.discover(), rx).await);

    assert_eq!(serial_report.files, parallel_report.files);
    assert_eq!(serial_report.errors, parallel_report.errors);
    assert_eq!(serial_report.files["Assets/textures/broken_albedo.png"], TaskStatus::Failed);
    assert_eq!(serial_report.files["Assets/textures/wall.txt"], TaskStatus::Copied);
    assert_eq!(serial_report.files["Assets/textures/wall.png"], TaskStatus::Completed);
}

#[tokio::test]
async fn test_post_build_copy_is_flattened() {
    let dir = project();
    let scheduler = Scheduler::new(config(dir.path(), 2), Arc::new(ScriptedEncoder::default()));
    let tasks = scheduler.discover();
    let (_tx, rx) = never_stop();
    assert_ok!(scheduler.run(tasks, rx).await);

    let dest = dir.path().join("bin/Debug/Game");
    assert!(dest.join("shaders/basic.vert").is_file());

    for entry in walkdir::WalkDir::new(&dest) {
        let path = entry.unwrap().into_path();
        let relative = path.strip_prefix(&dest).unwrap();
        assert!(relative.components().all(|c| match c {
            Component::Normal(s) => !matches!(s.to_str(), Some("PostBuildCopy" | "PostBuildCopy_windows")),
            _ => true,
        }));
    }
}

#[tokio::test]
async fn test_pending_stop_interrupts_once() {
    let dir = project();
    let scheduler = Scheduler::new(config(dir.path(), 2), Arc::new(ScriptedEncoder::default()));
    let tasks = scheduler.discover();

    let controller = InterruptController::new();
    let rx = controller.subscribe();
    controller.trigger();

    let result = scheduler.run(tasks, rx).await;
    let err = assert_err!(result);
    assert!(matches!(err, BuildError::Interrupted));
    assert_ne!(err.exit_code(), 0);

    let log = std::fs::read_to_string(scheduler.log_path()).unwrap();
    assert_eq!(log.matches(INTERRUPTED_MESSAGE).count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_during_run_interrupts() {
    let dir = project();
    let (started_tx, started_rx) = mpsc::channel();
    let encoder = Arc::new(ScriptedEncoder {
        delay: Some(Duration::from_millis(300)),
        started: Mutex::new(Some(started_tx)),
        ..Default::default()
    });
    let scheduler = Arc::new(Scheduler::new(config(dir.path(), 1), encoder));

    let controller = InterruptController::new();
    let rx = controller.subscribe();
    let tasks = scheduler.discover();
    let running = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.run(tasks, rx).await })
    };

    tokio::task::spawn_blocking(move || started_rx.recv().unwrap())
        .await
        .unwrap();
    controller.trigger();

    let result = running.await.unwrap();
    assert!(matches!(result, Err(BuildError::Interrupted)));

    let log = std::fs::read_to_string(scheduler.log_path()).unwrap();
    assert_eq!(log.matches(INTERRUPTED_MESSAGE).count(), 1);
}
