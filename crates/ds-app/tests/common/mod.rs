//! In-memory device and disk doubles shared by the integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use ds_core::device::{AttachedDevice, ConnectionKind};
use ds_core::ids::{AppId, DeviceId};
use ds_core::local::LocalEntry;
use ds_core::notice::Notice;
use ds_core::ports::{
    AppListingPort, BrowseOptions, DeviceConnectionPort, DeviceError, DeviceSessionPort,
    DeviceTransportPort, FileAccessPort, FileAccessStatus, FileHandle, FileVendingPort,
    LocalFsError, LocalFsPort, NotificationPort, OpenMode, ServiceDescriptor, DEVICE_NAME_KEY,
};
use ds_core::remote::RemotePath;
use ds_core::wire::{WireRecord, WireValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Dir,
    File(Vec<u8>),
}

#[derive(Default)]
struct World {
    attached: Vec<AttachedDevice>,
    names: HashMap<DeviceId, String>,
    apps: HashMap<DeviceId, Vec<WireRecord>>,
    sandboxes: HashMap<(DeviceId, AppId), BTreeMap<String, Node>>,
    calls: Vec<String>,
    failing: HashSet<String>,
    unreachable: HashSet<DeviceId>,
    enumeration_fails: bool,
    enumerations: usize,
    live_stages: i64,
    released: Vec<&'static str>,
}

/// Fake usbmux-style transport backed by in-memory sandboxes.
///
/// Records every file-access primitive as `"<op> <path>"` and lets tests
/// inject failures for a given `"<op> <path>"` pair.
#[derive(Clone, Default)]
pub struct FakeDevices {
    world: Arc<Mutex<World>>,
    gate: Arc<Gate>,
}

/// Blocks enumeration while closed.
#[derive(Default)]
struct Gate {
    closed: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    fn set_closed(&self, closed: bool) {
        *self.closed.lock().unwrap() = closed;
        self.opened.notify_all();
    }

    fn pass(&self) {
        let mut closed = self.closed.lock().unwrap();
        while *closed {
            closed = self.opened.wait(closed).unwrap();
        }
    }
}

impl FakeDevices {
    pub fn new() -> Self {
        Self::default()
    }

    fn world(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap()
    }

    pub fn attach(&self, id: &str, name: &str) -> DeviceId {
        let id = DeviceId::new(id);
        let mut world = self.world();
        world.attached.push(AttachedDevice {
            id: id.clone(),
            connection: ConnectionKind::Usb,
        });
        world.names.insert(id.clone(), name.to_string());
        id
    }

    pub fn detach(&self, id: &DeviceId) {
        self.world().attached.retain(|d| &d.id != id);
    }

    pub fn set_unreachable(&self, id: &DeviceId) {
        self.world().unreachable.insert(id.clone());
    }

    pub fn set_enumeration_fails(&self, fails: bool) {
        self.world().enumeration_fails = fails;
    }

    /// Park every enumeration until [`FakeDevices::release_enumeration`].
    pub fn hold_enumeration(&self) {
        self.gate.set_closed(true);
    }

    pub fn release_enumeration(&self) {
        self.gate.set_closed(false);
    }

    /// Enumerations started so far, held ones included.
    pub fn enumerations(&self) -> usize {
        self.world().enumerations
    }

    pub fn add_app_record(&self, device: &DeviceId, record: WireRecord) {
        self.world()
            .apps
            .entry(device.clone())
            .or_default()
            .push(record);
    }

    /// Register a file-sharing app with an empty `/Documents`.
    pub fn add_sharing_app(&self, device: &DeviceId, bundle: &str, name: &str) -> AppId {
        self.add_app_record(device, app_record(bundle, name, WireValue::Bool(true)));
        let app = AppId::new(bundle);
        let mut sandbox = BTreeMap::new();
        sandbox.insert("/".to_string(), Node::Dir);
        sandbox.insert("/Documents".to_string(), Node::Dir);
        self.world()
            .sandboxes
            .insert((device.clone(), app.clone()), sandbox);
        app
    }

    pub fn put_dir(&self, device: &DeviceId, app: &AppId, path: &str) {
        self.sandbox_insert(device, app, path, Node::Dir);
    }

    pub fn put_file(&self, device: &DeviceId, app: &AppId, path: &str, data: &[u8]) {
        self.sandbox_insert(device, app, path, Node::File(data.to_vec()));
    }

    fn sandbox_insert(&self, device: &DeviceId, app: &AppId, path: &str, node: Node) {
        let mut world = self.world();
        let sandbox = world
            .sandboxes
            .get_mut(&(device.clone(), app.clone()))
            .expect("app registered");
        sandbox.insert(RemotePath::new(path).as_str().to_string(), node);
    }

    pub fn node(&self, device: &DeviceId, app: &AppId, path: &str) -> Option<Node> {
        self.world()
            .sandboxes
            .get(&(device.clone(), app.clone()))
            .and_then(|s| s.get(RemotePath::new(path).as_str()).cloned())
    }

    /// Make `"<op> <path>"` fail with an I/O status.
    pub fn fail(&self, op: &str, path: &str) {
        self.world().failing.insert(format!("{op} {path}"));
    }

    pub fn calls(&self) -> Vec<String> {
        self.world().calls.clone()
    }

    pub fn calls_for(&self, op: &str) -> Vec<String> {
        let prefix = format!("{op} ");
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(&prefix))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.world().calls.clear();
    }

    /// Stages acquired and not yet released.
    pub fn live_stages(&self) -> i64 {
        self.world().live_stages
    }

    pub fn released(&self) -> Vec<&'static str> {
        self.world().released.clone()
    }
}

pub fn app_record(bundle: &str, name: &str, sharing: WireValue) -> WireRecord {
    let mut record = WireRecord::new();
    record.insert(
        "CFBundleIdentifier".to_string(),
        WireValue::String(bundle.to_string()),
    );
    if !name.is_empty() {
        record.insert(
            "CFBundleDisplayName".to_string(),
            WireValue::String(name.to_string()),
        );
    }
    record.insert(
        "CFBundleShortVersionString".to_string(),
        WireValue::String("1.0".to_string()),
    );
    record.insert("UIFileSharingEnabled".to_string(), sharing);
    record
}

/// Releases one stage on drop.
struct StageGuard {
    world: Arc<Mutex<World>>,
    name: &'static str,
}

impl StageGuard {
    fn acquire(world: &Arc<Mutex<World>>, name: &'static str) -> Self {
        world.lock().unwrap().live_stages += 1;
        Self {
            world: world.clone(),
            name,
        }
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let mut world = self.world.lock().unwrap();
        world.live_stages -= 1;
        world.released.push(self.name);
    }
}

impl DeviceTransportPort for FakeDevices {
    fn attached_devices(&self) -> Result<Vec<AttachedDevice>, DeviceError> {
        self.world().enumerations += 1;
        self.gate.pass();
        let world = self.world();
        if world.enumeration_fails {
            return Err(DeviceError::TransportUnavailable("daemon down".into()));
        }
        Ok(world.attached.clone())
    }

    fn open_device(&self, device: &DeviceId) -> Result<Box<dyn DeviceConnectionPort>, DeviceError> {
        {
            let world = self.world();
            if world.unreachable.contains(device) || !world.attached.iter().any(|d| &d.id == device)
            {
                return Err(DeviceError::TransportUnavailable(format!("{device} not attached")));
            }
        }
        Ok(Box::new(FakeConnection {
            world: self.world.clone(),
            device: device.clone(),
            _guard: StageGuard::acquire(&self.world, "connection"),
        }))
    }
}

struct FakeConnection {
    world: Arc<Mutex<World>>,
    device: DeviceId,
    _guard: StageGuard,
}

impl DeviceConnectionPort for FakeConnection {
    fn handshake(&mut self, _client_label: &str) -> Result<Box<dyn DeviceSessionPort>, DeviceError> {
        Ok(Box::new(FakeSession {
            world: self.world.clone(),
            device: self.device.clone(),
            _guard: StageGuard::acquire(&self.world, "session"),
        }))
    }

    fn open_app_listing(
        &mut self,
        _descriptor: &ServiceDescriptor,
    ) -> Result<Box<dyn AppListingPort>, DeviceError> {
        Ok(Box::new(FakeListing {
            world: self.world.clone(),
            device: self.device.clone(),
            _guard: StageGuard::acquire(&self.world, "app_listing"),
        }))
    }

    fn open_file_vending(
        &mut self,
        _descriptor: &ServiceDescriptor,
    ) -> Result<Box<dyn FileVendingPort>, DeviceError> {
        Ok(Box::new(FakeVending {
            world: self.world.clone(),
            device: self.device.clone(),
        }))
    }
}

struct FakeSession {
    world: Arc<Mutex<World>>,
    device: DeviceId,
    _guard: StageGuard,
}

impl DeviceSessionPort for FakeSession {
    fn value(&mut self, key: &str) -> Result<WireValue, DeviceError> {
        let world = self.world.lock().unwrap();
        match (key, world.names.get(&self.device)) {
            (DEVICE_NAME_KEY, Some(name)) => Ok(WireValue::String(name.clone())),
            _ => Err(DeviceError::Codec(format!("no value for {key}"))),
        }
    }

    fn start_service(&mut self, service: &str) -> Result<ServiceDescriptor, DeviceError> {
        if self
            .world
            .lock()
            .unwrap()
            .failing
            .contains(&format!("start_service {service}"))
        {
            return Err(DeviceError::ServiceUnavailable {
                service: service.to_string(),
                reason: "refused".to_string(),
            });
        }
        Ok(ServiceDescriptor {
            service: service.to_string(),
            port: 49152,
            ssl: false,
        })
    }
}

struct FakeListing {
    world: Arc<Mutex<World>>,
    device: DeviceId,
    _guard: StageGuard,
}

impl AppListingPort for FakeListing {
    fn browse(&mut self, options: &BrowseOptions) -> Result<Vec<WireRecord>, DeviceError> {
        assert_eq!(options.application_type, "User");
        let world = self.world.lock().unwrap();
        Ok(world.apps.get(&self.device).cloned().unwrap_or_default())
    }
}

struct FakeVending {
    world: Arc<Mutex<World>>,
    device: DeviceId,
}

impl FileVendingPort for FakeVending {
    fn vend_documents(self: Box<Self>, app: &AppId) -> Result<Box<dyn FileAccessPort>, DeviceError> {
        let key = (self.device.clone(), app.clone());
        if !self.world.lock().unwrap().sandboxes.contains_key(&key) {
            return Err(DeviceError::ServiceUnavailable {
                service: "house_arrest".to_string(),
                reason: format!("{app} does not share documents"),
            });
        }
        Ok(Box::new(FakeFiles {
            _guard: StageGuard::acquire(&self.world, "file_access"),
            world: self.world,
            key,
            handles: HashMap::new(),
            next_handle: 1,
        }))
    }
}

struct OpenFile {
    path: String,
    mode: OpenMode,
    offset: usize,
}

struct FakeFiles {
    world: Arc<Mutex<World>>,
    key: (DeviceId, AppId),
    handles: HashMap<u64, OpenFile>,
    next_handle: u64,
    _guard: StageGuard,
}

fn protocol(op: &'static str, status: FileAccessStatus) -> DeviceError {
    DeviceError::Protocol { op, status }
}

fn parent_of(path: &str) -> Option<String> {
    RemotePath::new(path).parent().map(|p| p.as_str().to_string())
}

impl FakeFiles {
    /// Record the call and apply any injected failure.
    fn enter(&self, op: &'static str, path: &str) -> Result<MutexGuard<'_, World>, DeviceError> {
        let mut world = self.world.lock().unwrap();
        let call = format!("{op} {path}");
        world.calls.push(call.clone());
        if world.failing.contains(&call) {
            return Err(protocol(op, FileAccessStatus::IoError));
        }
        Ok(world)
    }

    fn handle_path(&self, handle: FileHandle) -> Result<String, DeviceError> {
        self.handles
            .get(&handle.0)
            .map(|f| f.path.clone())
            .ok_or_else(|| protocol("handle", FileAccessStatus::InvalidArgument))
    }
}

impl FileAccessPort for FakeFiles {
    fn read_directory(&mut self, path: &str) -> Result<Vec<String>, DeviceError> {
        let world = self.enter("list", path)?;
        let sandbox = &world.sandboxes[&self.key];
        if sandbox.get(path) != Some(&Node::Dir) {
            return Err(protocol("list", FileAccessStatus::ObjectNotFound));
        }
        let mut names = vec![".".to_string(), "..".to_string()];
        names.extend(
            sandbox
                .keys()
                .filter(|k| k.as_str() != "/" && parent_of(k).as_deref() == Some(path))
                .filter_map(|k| RemotePath::new(k).file_name().map(str::to_string)),
        );
        Ok(names)
    }

    fn file_info(&mut self, path: &str) -> Result<BTreeMap<String, String>, DeviceError> {
        let world = self.enter("stat", path)?;
        let node = world.sandboxes[&self.key]
            .get(path)
            .ok_or_else(|| protocol("stat", FileAccessStatus::ObjectNotFound))?;
        let (kind, size) = match node {
            Node::Dir => ("S_IFDIR", 0),
            Node::File(data) => ("S_IFREG", data.len()),
        };
        let mut info = BTreeMap::new();
        info.insert("st_ifmt".to_string(), kind.to_string());
        info.insert("st_size".to_string(), size.to_string());
        info.insert("st_mtime".to_string(), "1700000000000000000".to_string());
        Ok(info)
    }

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<FileHandle, DeviceError> {
        {
            let mut world = self.enter("open", path)?;
            let sandbox = world.sandboxes.get_mut(&self.key).unwrap();
            match (mode, sandbox.get(path)) {
                (OpenMode::ReadOnly, Some(Node::File(_))) => {}
                (OpenMode::ReadOnly, _) => {
                    return Err(protocol("open", FileAccessStatus::ObjectNotFound))
                }
                (OpenMode::WriteTruncate, Some(Node::Dir)) => {
                    return Err(protocol("open", FileAccessStatus::ObjectIsDirectory))
                }
                (OpenMode::WriteTruncate, _) => {
                    let parent_is_dir = parent_of(path)
                        .map(|p| sandbox.get(&p) == Some(&Node::Dir))
                        .unwrap_or(false);
                    if !parent_is_dir {
                        return Err(protocol("open", FileAccessStatus::ObjectNotFound));
                    }
                    sandbox.insert(path.to_string(), Node::File(Vec::new()));
                }
            }
        }
        let handle = self.next_handle;
        self.next_handle += 1;
        self.handles.insert(
            handle,
            OpenFile {
                path: path.to_string(),
                mode,
                offset: 0,
            },
        );
        Ok(FileHandle(handle))
    }

    fn read(&mut self, handle: FileHandle, len: usize) -> Result<Vec<u8>, DeviceError> {
        let path = self.handle_path(handle)?;
        let chunk = {
            let world = self.enter("read", &path)?;
            let offset = self.handles[&handle.0].offset;
            match world.sandboxes[&self.key].get(&path) {
                Some(Node::File(data)) => {
                    let end = (offset + len).min(data.len());
                    data[offset.min(end)..end].to_vec()
                }
                _ => return Err(protocol("read", FileAccessStatus::ObjectNotFound)),
            }
        };
        if let Some(open) = self.handles.get_mut(&handle.0) {
            open.offset += chunk.len();
        }
        Ok(chunk)
    }

    fn write(&mut self, handle: FileHandle, data: &[u8]) -> Result<(), DeviceError> {
        let path = self.handle_path(handle)?;
        if self.handles[&handle.0].mode != OpenMode::WriteTruncate {
            return Err(protocol("write", FileAccessStatus::PermissionDenied));
        }
        let mut world = self.enter("write", &path)?;
        match world.sandboxes.get_mut(&self.key).unwrap().get_mut(&path) {
            Some(Node::File(contents)) => {
                contents.extend_from_slice(data);
                Ok(())
            }
            _ => Err(protocol("write", FileAccessStatus::ObjectNotFound)),
        }
    }

    fn close(&mut self, handle: FileHandle) -> Result<(), DeviceError> {
        let path = self.handle_path(handle)?;
        self.handles.remove(&handle.0);
        self.enter("close", &path).map(|_| ())
    }

    fn remove(&mut self, path: &str) -> Result<(), DeviceError> {
        let mut world = self.enter("remove", path)?;
        let sandbox = world.sandboxes.get_mut(&self.key).unwrap();
        let has_children = sandbox
            .keys()
            .any(|k| k.as_str() != "/" && parent_of(k).as_deref() == Some(path));
        if has_children {
            return Err(protocol("remove", FileAccessStatus::DirectoryNotEmpty));
        }
        sandbox
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| protocol("remove", FileAccessStatus::ObjectNotFound))
    }

    fn make_directory(&mut self, path: &str) -> Result<(), DeviceError> {
        let mut world = self.enter("mkdir", path)?;
        let sandbox = world.sandboxes.get_mut(&self.key).unwrap();
        if sandbox.contains_key(path) {
            return Err(protocol("mkdir", FileAccessStatus::ObjectExists));
        }
        sandbox.insert(path.to_string(), Node::Dir);
        Ok(())
    }
}

/// Local disk double kept entirely in memory.
#[derive(Clone, Default)]
pub struct MemoryFs {
    nodes: Arc<Mutex<BTreeMap<PathBuf, Node>>>,
    trashed: Arc<Mutex<Vec<PathBuf>>>,
    failing: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        let fs = Self::default();
        fs.put_dir("/");
        fs
    }

    pub fn put_dir(&self, path: impl AsRef<Path>) {
        self.nodes
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), Node::Dir);
    }

    pub fn put_file(&self, path: impl AsRef<Path>, data: &[u8]) {
        self.nodes
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), Node::File(data.to_vec()));
    }

    pub fn node(&self, path: impl AsRef<Path>) -> Option<Node> {
        self.nodes.lock().unwrap().get(path.as_ref()).cloned()
    }

    pub fn trashed(&self) -> Vec<PathBuf> {
        self.trashed.lock().unwrap().clone()
    }

    /// Every operation naming `path` fails.
    pub fn fail(&self, path: impl AsRef<Path>) {
        self.failing
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf());
    }

    fn check(&self, path: &Path) -> Result<(), LocalFsError> {
        if self.failing.lock().unwrap().contains(path) {
            return Err(LocalFsError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::other("injected"),
            });
        }
        Ok(())
    }

    fn subtree(&self, root: &Path) -> Vec<(PathBuf, Node)> {
        self.nodes
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p.starts_with(root))
            .map(|(p, n)| (p.clone(), n.clone()))
            .collect()
    }

    fn relocate(&self, source: &Path, destination_dir: &Path, keep_source: bool) -> Result<PathBuf, LocalFsError> {
        self.check(source)?;
        let name = source
            .file_name()
            .ok_or_else(|| LocalFsError::NotFound(source.to_path_buf()))?;
        let target = destination_dir.join(name);
        if self.node(&target).is_some() {
            return Err(LocalFsError::AlreadyExists(target));
        }
        let subtree = self.subtree(source);
        if subtree.is_empty() {
            return Err(LocalFsError::NotFound(source.to_path_buf()));
        }
        let mut nodes = self.nodes.lock().unwrap();
        for (path, node) in subtree {
            let moved = match path.strip_prefix(source) {
                Ok(relative) if !relative.as_os_str().is_empty() => target.join(relative),
                _ => target.clone(),
            };
            nodes.insert(moved, node);
            if !keep_source {
                nodes.remove(&path);
            }
        }
        Ok(target)
    }
}

struct MemoryWriter {
    nodes: Arc<Mutex<BTreeMap<PathBuf, Node>>>,
    path: PathBuf,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut nodes = self.nodes.lock().unwrap();
        match nodes.get_mut(&self.path) {
            Some(Node::File(data)) => {
                data.extend_from_slice(buf);
                Ok(buf.len())
            }
            _ => Err(std::io::Error::other("file vanished")),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LocalFsPort for MemoryFs {
    fn stat(&self, path: &Path) -> Result<LocalEntry, LocalFsError> {
        self.check(path)?;
        match self.node(path) {
            Some(node) => Ok(LocalEntry {
                path: path.to_path_buf(),
                is_directory: node == Node::Dir,
                size: match &node {
                    Node::File(data) => data.len() as u64,
                    Node::Dir => 0,
                },
                modified_at: None,
            }),
            None => Err(LocalFsError::NotFound(path.to_path_buf())),
        }
    }

    fn list_directory(&self, path: &Path) -> Result<Vec<String>, LocalFsError> {
        self.check(path)?;
        if self.node(path) != Some(Node::Dir) {
            return Err(LocalFsError::NotFound(path.to_path_buf()));
        }
        Ok(self
            .nodes
            .lock()
            .unwrap()
            .keys()
            .filter(|p| p.parent() == Some(path))
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect())
    }

    fn mkdir(&self, path: &Path) -> Result<(), LocalFsError> {
        self.check(path)?;
        match self.node(path) {
            Some(Node::Dir) => Ok(()),
            Some(Node::File(_)) => Err(LocalFsError::AlreadyExists(path.to_path_buf())),
            None => {
                self.put_dir(path);
                Ok(())
            }
        }
    }

    fn remove(&self, path: &Path) -> Result<(), LocalFsError> {
        self.check(path)?;
        let mut nodes = self.nodes.lock().unwrap();
        if nodes.remove(path).is_none() {
            return Err(LocalFsError::NotFound(path.to_path_buf()));
        }
        nodes.retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    fn copy(&self, source: &Path, destination_dir: &Path) -> Result<PathBuf, LocalFsError> {
        self.relocate(source, destination_dir, true)
    }

    fn move_to(&self, source: &Path, destination_dir: &Path) -> Result<PathBuf, LocalFsError> {
        self.relocate(source, destination_dir, false)
    }

    fn trash(&self, path: &Path) -> Result<(), LocalFsError> {
        self.remove(path)?;
        self.trashed.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>, LocalFsError> {
        self.check(path)?;
        match self.node(path) {
            Some(Node::File(data)) => Ok(Box::new(Cursor::new(data))),
            _ => Err(LocalFsError::NotFound(path.to_path_buf())),
        }
    }

    fn create_write(&self, path: &Path) -> Result<Box<dyn Write + Send>, LocalFsError> {
        self.check(path)?;
        if self.node(path).is_some() {
            return Err(LocalFsError::AlreadyExists(path.to_path_buf()));
        }
        self.put_file(path, &[]);
        Ok(Box::new(MemoryWriter {
            nodes: self.nodes.clone(),
            path: path.to_path_buf(),
        }))
    }
}

/// Notifier that keeps every notice for later assertions.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().unwrap().last().cloned()
    }
}

impl NotificationPort for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// Run a test body with tracing output captured by the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}
