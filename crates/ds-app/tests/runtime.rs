mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use common::{FakeDevices, MemoryFs, RecordingNotifier};
use ds_app::{AppDeps, BrowserRuntime, CoreHandle, RuntimeOptions};
use ds_core::ids::DeviceId;
use ds_core::local::LocalEntry;
use ds_core::remote::RemotePath;
use ds_core::selection::{FileItem, FileItemKey};

fn start(devices: &FakeDevices, local: &MemoryFs) -> CoreHandle {
    start_with_interval(devices, local, Duration::from_secs(3600))
}

fn start_with_interval(
    devices: &FakeDevices,
    local: &MemoryFs,
    scan_interval: Duration,
) -> CoreHandle {
    let deps = AppDeps {
        transport: Arc::new(devices.clone()),
        local_fs: Arc::new(local.clone()),
        notifier: Arc::new(RecordingNotifier::default()),
    };
    let options = RuntimeOptions {
        client_label: "docshare-test".to_string(),
        scan_interval,
    };
    let (runtime, handle) = BrowserRuntime::new(deps, options);
    tokio::spawn(runtime.run());
    handle
}

/// Let spawned work run until `done` holds. Never sleeps on the tokio clock,
/// so paused time stays where the test put it.
async fn settle(done: impl Fn() -> bool) {
    for _ in 0..2_000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
        std::thread::sleep(Duration::from_millis(1));
    }
    panic!("condition did not hold in time");
}

async fn spin() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

fn local_item(path: &str) -> FileItem {
    FileItem::from_local(&LocalEntry {
        path: PathBuf::from(path),
        is_directory: false,
        size: 3,
        modified_at: None,
    })
}

#[tokio::test]
async fn detached_active_device_clears_dependent_state() {
    common::init_tracing();
    let devices = FakeDevices::new();
    let device = devices.attach("A1B2", "Phone");
    let app = devices.add_sharing_app(&device, "com.foo", "Foo");
    devices.put_file(&device, &app, "/Documents/a.txt", b"a");
    let handle = start(&devices, &MemoryFs::new());

    let found = handle.scan_now().await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Phone");
    let apps = handle.select_device(&device).await.unwrap().expect("apps");
    assert_eq!(apps.len(), 1);
    let files = handle.select_app(&app).await.unwrap().expect("files");
    assert_eq!(files.len(), 1);

    devices.detach(&device);
    let found = handle.scan_now().await.unwrap();

    assert!(found.is_empty());
    let snapshot = handle.snapshot();
    assert!(snapshot.devices.is_empty());
    assert_eq!(snapshot.active_device, None);
    assert_eq!(snapshot.active_app, None);
    assert!(snapshot.apps.is_empty());
    assert!(snapshot.files.is_empty());
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn app_list_survives_an_app_selected_before_it_arrives() {
    let devices = FakeDevices::new();
    let device = devices.attach("A1B2", "Phone");
    let app = devices.add_sharing_app(&device, "com.foo", "Foo");
    devices.put_file(&device, &app, "/Documents/a.txt", b"a");
    let handle = start(&devices, &MemoryFs::new());
    handle.scan_now().await.unwrap();

    let (apps, files) = tokio::join!(handle.select_device(&device), handle.select_app(&app));

    assert_eq!(apps.unwrap().expect("apps").len(), 1);
    assert_eq!(files.unwrap().expect("files").len(), 1);
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.active_device, Some(device));
    assert_eq!(snapshot.active_app, Some(app));
    assert_eq!(snapshot.apps.len(), 1);
    assert_eq!(snapshot.files.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn ticks_during_a_running_scan_are_dropped() {
    let devices = FakeDevices::new();
    devices.attach("A1B2", "Phone");
    devices.hold_enumeration();
    let handle = start_with_interval(&devices, &MemoryFs::new(), Duration::from_secs(1));

    // first tick fires without waiting a full interval
    settle(|| devices.enumerations() == 1).await;

    for _ in 0..5 {
        tokio::time::advance(Duration::from_secs(1)).await;
        spin().await;
    }
    assert_eq!(devices.enumerations(), 1);

    devices.release_enumeration();
    settle(|| handle.snapshot().devices.len() == 1).await;
    spin().await;
    assert_eq!(devices.enumerations(), 1);

    tokio::time::advance(Duration::from_secs(1)).await;
    settle(|| devices.enumerations() == 2).await;
    spin().await;
    assert_eq!(devices.enumerations(), 2);
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn failed_enumeration_keeps_previous_device_list() {
    let devices = FakeDevices::new();
    devices.attach("A1B2", "Phone");
    let handle = start(&devices, &MemoryFs::new());
    handle.scan_now().await.unwrap();

    devices.set_enumeration_fails(true);
    let found = handle.scan_now().await.unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(handle.devices().await.unwrap().len(), 1);
}

#[tokio::test]
async fn selecting_an_unknown_device_yields_nothing() {
    let devices = FakeDevices::new();
    let handle = start(&devices, &MemoryFs::new());
    handle.scan_now().await.unwrap();

    let apps = handle.select_device(&DeviceId::new("NOPE")).await.unwrap();

    assert!(apps.is_none());
    assert_eq!(handle.snapshot().active_device, None);
}

#[tokio::test]
async fn directory_navigation_tracks_current_path() {
    let devices = FakeDevices::new();
    let device = devices.attach("A1B2", "Phone");
    let app = devices.add_sharing_app(&device, "com.foo", "Foo");
    devices.put_dir(&device, &app, "/Documents/inner");
    devices.put_file(&device, &app, "/Documents/inner/deep.txt", b"d");
    let handle = start(&devices, &MemoryFs::new());
    handle.scan_now().await.unwrap();
    handle.select_device(&device).await.unwrap();
    handle.select_app(&app).await.unwrap();

    let inner = handle
        .open_directory(&RemotePath::new("/Documents/inner"))
        .await
        .unwrap()
        .expect("inner listing");
    assert_eq!(inner[0].name, "deep.txt");
    assert_eq!(handle.snapshot().current_path.as_str(), "/Documents/inner");

    let up = handle.navigate_up().await.unwrap().expect("parent listing");
    assert_eq!(up[0].name, "inner");
    assert_eq!(handle.snapshot().current_path.as_str(), "/Documents");

    let missing = handle
        .open_directory(&RemotePath::new("/Documents/missing"))
        .await
        .unwrap();
    assert!(missing.is_none());
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.current_path.as_str(), "/Documents");
    assert!(snapshot.last_error.is_some());
}

#[tokio::test]
async fn single_file_operations_refresh_the_listing() {
    let devices = FakeDevices::new();
    let device = devices.attach("A1B2", "Phone");
    let app = devices.add_sharing_app(&device, "com.foo", "Foo");
    let local = MemoryFs::new();
    local.put_dir("/home");
    local.put_file("/home/up.txt", b"up");
    let handle = start(&devices, &local);
    handle.scan_now().await.unwrap();
    handle.select_device(&device).await.unwrap();
    handle.select_app(&app).await.unwrap();

    assert!(handle.upload_file(Path::new("/home/up.txt")).await.unwrap());
    let files = handle.refresh().await.unwrap().expect("listing");
    assert_eq!(files.len(), 1);

    assert!(handle
        .delete_file(&RemotePath::new("/Documents/up.txt"))
        .await
        .unwrap());
    assert!(handle.refresh().await.unwrap().expect("listing").is_empty());
}

#[tokio::test]
async fn selection_commands_follow_set_semantics() {
    let devices = FakeDevices::new();
    let handle = start(&devices, &MemoryFs::new());
    let item = local_item("/tmp/a.txt");

    assert!(handle.add(item.clone()).await.unwrap());
    let version = handle.snapshot().selection_version;
    assert!(!handle.add(item.clone()).await.unwrap());
    assert_eq!(handle.snapshot().selection_version, version);

    assert!(!handle.toggle(item.clone()).await.unwrap());
    assert!(handle.toggle(item.clone()).await.unwrap());
    assert_eq!(handle.snapshot().selection_version, version + 2);

    assert!(handle
        .rename_local_identity(Path::new("/tmp/a.txt"), Path::new("/tmp/b.txt"))
        .await
        .unwrap());
    let selection = handle.selection().await.unwrap();
    assert_eq!(selection.len(), 1);
    assert_eq!(selection[0].key, FileItemKey::Local(PathBuf::from("/tmp/b.txt")));
    assert_eq!(handle.snapshot().selection_version, version + 3);

    handle.clear().await.unwrap();
    assert!(handle.selection().await.unwrap().is_empty());
}

#[tokio::test]
async fn bulk_results_are_applied_to_the_selection() {
    let devices = FakeDevices::new();
    let local = MemoryFs::new();
    local.put_dir("/src");
    local.put_dir("/dst");
    local.put_file("/src/a.txt", b"a");
    let handle = start(&devices, &local);
    handle.add(local_item("/src/a.txt")).await.unwrap();
    handle.add(local_item("/src/missing.txt")).await.unwrap();

    let moved = handle.move_local_all(Path::new("/dst")).await.unwrap();

    assert_eq!(moved, 1);
    let remaining = handle.selection().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "missing.txt");

    let deleted = handle.delete_all().await.unwrap();
    assert_eq!(deleted, 0);
    assert!(handle.snapshot().selection.is_empty());
}
