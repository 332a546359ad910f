//! In-memory cluster for integration tests: a scriptable master plus region
//! servers implementing the proto traits, with fault injection and scanner
//! accounting.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rangetable_client::{Client, ClientConfig};
use rangetable_proto::catalog;
use rangetable_proto::{
    ColumnFamily, ColumnName, Connector, LockId, Master, RegionDescriptor, RegionName,
    RegionServer, RowKey, RpcError, RpcResult, ScanRow, ScannerId, ServerAddress, TableDescriptor,
    TableName,
};

pub const MASTER_ADDR: &str = "10.0.0.1:60000";
pub const CATALOG_ADDR: &str = "10.0.0.1:600";

/// Client configuration tuned for tests: short pauses, bounded retries.
pub fn test_config() -> ClientConfig {
    ClientConfig {
        master_address: ServerAddress::from(MASTER_ADDR),
        pause: Duration::from_millis(2),
        retries: 3,
    }
}

/// A client wired to the mock cluster with the test configuration.
pub fn client(cluster: &Arc<MockCluster>) -> Client {
    Client::new(test_config(), cluster.connector())
}

/// A catalog mutation applied after a scripted number of scanner opens.
pub enum CatalogAction {
    /// Insert (or replace) one catalog row.
    InsertRow(ScanRow),
    /// Remove every catalog row belonging to the named table.
    RemoveTableRows(String),
    /// Flip the offline flag on every catalog row of the named table.
    SetOffline(String, bool),
}

struct PendingAction {
    region: RegionName,
    action: CatalogAction,
    remaining_opens: usize,
}

struct MockScanner {
    region: RegionName,
    columns: Vec<ColumnName>,
    from: Bound<RowKey>,
}

struct MockLock {
    region: RegionName,
    client_id: u64,
    row: RowKey,
    staged: Vec<(ColumnName, Option<Vec<u8>>)>,
}

type CellVersions = Vec<(u64, Vec<u8>)>;
type RowCells = BTreeMap<ColumnName, CellVersions>;

pub struct MockRegion {
    pub descriptor: RegionDescriptor,
    pub rows: BTreeMap<RowKey, RowCells>,
}

#[derive(Default)]
struct ServerState {
    regions: HashMap<RegionName, MockRegion>,
    scanners: HashMap<ScannerId, MockScanner>,
    locks: HashMap<LockId, MockLock>,
    pending: Vec<PendingAction>,
    clock: u64,
    fail_puts: usize,
    aborts_received: usize,
}

pub struct MockRegionServer {
    pub addr: ServerAddress,
    state: Mutex<ServerState>,
    next_scanner: AtomicU64,
    next_lock: AtomicU64,
    pub opened_scanners: AtomicUsize,
    pub closed_scanners: AtomicUsize,
    pub bad_closes: AtomicUsize,
}

impl MockRegionServer {
    fn new(addr: ServerAddress) -> Self {
        Self {
            addr,
            state: Mutex::new(ServerState::default()),
            next_scanner: AtomicU64::new(1),
            next_lock: AtomicU64::new(1),
            opened_scanners: AtomicUsize::new(0),
            closed_scanners: AtomicUsize::new(0),
            bad_closes: AtomicUsize::new(0),
        }
    }

    pub fn install_region(&self, region: MockRegion) {
        let mut state = self.state.lock().unwrap();
        state.regions.insert(region.descriptor.name.clone(), region);
    }

    pub fn remove_region(&self, name: &RegionName) -> Option<MockRegion> {
        self.state.lock().unwrap().regions.remove(name)
    }

    pub fn has_region(&self, name: &RegionName) -> bool {
        self.state.lock().unwrap().regions.contains_key(name)
    }

    /// Schedules a catalog mutation on `region` after `empty_opens` further
    /// scanner opens observe the old state.
    pub fn schedule_on_open(&self, region: &RegionName, action: CatalogAction, empty_opens: usize) {
        self.state.lock().unwrap().pending.push(PendingAction {
            region: region.clone(),
            action,
            remaining_opens: empty_opens,
        });
    }

    /// Makes the next `count` put calls fail with a remote error.
    pub fn fail_next_puts(&self, count: usize) {
        self.state.lock().unwrap().fail_puts = count;
    }

    pub fn aborts_received(&self) -> usize {
        self.state.lock().unwrap().aborts_received
    }

    pub fn insert_cell(&self, region: &RegionName, row: &RowKey, column: &ColumnName, value: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.clock += 1;
        let clock = state.clock;
        let region = state.regions.get_mut(region).expect("region installed");
        region
            .rows
            .entry(row.clone())
            .or_default()
            .entry(column.clone())
            .or_default()
            .insert(0, (clock, value.to_vec()));
    }

    fn apply_action(region: &mut MockRegion, action: &CatalogAction, clock: u64) {
        match action {
            CatalogAction::InsertRow(scan_row) => {
                let cells = scan_row
                    .cells
                    .iter()
                    .map(|(column, value)| (column.clone(), vec![(clock, value.clone())]))
                    .collect();
                region.rows.insert(scan_row.row.clone(), cells);
            }
            CatalogAction::RemoveTableRows(table) => {
                let prefix = format!("{table},").into_bytes();
                region
                    .rows
                    .retain(|key, _| !key.as_bytes().starts_with(&prefix));
            }
            CatalogAction::SetOffline(table, offline) => {
                let prefix = format!("{table},").into_bytes();
                for (key, cells) in region.rows.iter_mut() {
                    if !key.as_bytes().starts_with(&prefix) {
                        continue;
                    }
                    if let Some(versions) = cells.get_mut(&ColumnName::from(catalog::COL_REGION)) {
                        if let Some((_, bytes)) = versions.first_mut() {
                            let mut descriptor =
                                catalog::decode_region(bytes).expect("valid catalog cell");
                            descriptor.offline = *offline;
                            *bytes = catalog::encode_region(&descriptor);
                        }
                    }
                }
            }
        }
    }
}

#[async_trait]
impl RegionServer for MockRegionServer {
    async fn region_info(&self, region: &RegionName) -> RpcResult<RegionDescriptor> {
        let state = self.state.lock().unwrap();
        state
            .regions
            .get(region)
            .map(|r| r.descriptor.clone())
            .ok_or_else(|| RpcError::NotServingRegion(region.clone()))
    }

    async fn get(
        &self,
        region: &RegionName,
        row: &RowKey,
        column: &ColumnName,
    ) -> RpcResult<Option<Vec<u8>>> {
        let state = self.state.lock().unwrap();
        let mock_region = state
            .regions
            .get(region)
            .ok_or_else(|| RpcError::NotServingRegion(region.clone()))?;
        if !mock_region.descriptor.contains(row) {
            return Err(RpcError::WrongRegion(region.as_str().to_string()));
        }
        Ok(mock_region
            .rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .and_then(|versions| versions.first())
            .map(|(_, value)| value.clone()))
    }

    async fn get_versions(
        &self,
        region: &RegionName,
        row: &RowKey,
        column: &ColumnName,
        versions: u32,
    ) -> RpcResult<Vec<Vec<u8>>> {
        let state = self.state.lock().unwrap();
        let mock_region = state
            .regions
            .get(region)
            .ok_or_else(|| RpcError::NotServingRegion(region.clone()))?;
        Ok(mock_region
            .rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(|cell| {
                cell.iter()
                    .take(versions as usize)
                    .map(|(_, value)| value.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_versions_before(
        &self,
        region: &RegionName,
        row: &RowKey,
        column: &ColumnName,
        timestamp: u64,
        versions: u32,
    ) -> RpcResult<Vec<Vec<u8>>> {
        let state = self.state.lock().unwrap();
        let mock_region = state
            .regions
            .get(region)
            .ok_or_else(|| RpcError::NotServingRegion(region.clone()))?;
        Ok(mock_region
            .rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(|cell| {
                cell.iter()
                    .filter(|(at, _)| *at <= timestamp)
                    .take(versions as usize)
                    .map(|(_, value)| value.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn row(
        &self,
        region: &RegionName,
        row: &RowKey,
    ) -> RpcResult<Vec<(ColumnName, Vec<u8>)>> {
        let state = self.state.lock().unwrap();
        let mock_region = state
            .regions
            .get(region)
            .ok_or_else(|| RpcError::NotServingRegion(region.clone()))?;
        if !mock_region.descriptor.contains(row) {
            return Err(RpcError::WrongRegion(region.as_str().to_string()));
        }
        Ok(mock_region
            .rows
            .get(row)
            .map(|cells| {
                cells
                    .iter()
                    .filter_map(|(column, versions)| {
                        versions
                            .first()
                            .map(|(_, value)| (column.clone(), value.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn open_scanner(
        &self,
        region: &RegionName,
        columns: &[ColumnName],
        start_row: &RowKey,
    ) -> RpcResult<ScannerId> {
        let mut state = self.state.lock().unwrap();
        state.clock += 1;
        let clock = state.clock;

        // Scripted catalog mutations fire once their empty-open budget is
        // spent.
        let mut keep = Vec::new();
        let mut fire = Vec::new();
        for mut pending in std::mem::take(&mut state.pending) {
            if pending.region == *region {
                if pending.remaining_opens == 0 {
                    fire.push(pending);
                } else {
                    pending.remaining_opens -= 1;
                    keep.push(pending);
                }
            } else {
                keep.push(pending);
            }
        }
        state.pending = keep;
        for pending in fire {
            if let Some(mock_region) = state.regions.get_mut(&pending.region) {
                Self::apply_action(mock_region, &pending.action, clock);
            }
        }

        if !state.regions.contains_key(region) {
            return Err(RpcError::NotServingRegion(region.clone()));
        }
        let id = ScannerId::new(self.next_scanner.fetch_add(1, Ordering::SeqCst));
        state.scanners.insert(
            id,
            MockScanner {
                region: region.clone(),
                columns: columns.to_vec(),
                from: Bound::Included(start_row.clone()),
            },
        );
        self.opened_scanners.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn next(&self, scanner: ScannerId) -> RpcResult<Option<ScanRow>> {
        let mut state = self.state.lock().unwrap();
        let mock_scanner = state
            .scanners
            .get(&scanner)
            .ok_or_else(|| RpcError::Remote(format!("unknown scanner {scanner}")))?;
        let region_name = mock_scanner.region.clone();
        let columns = mock_scanner.columns.clone();
        let from = mock_scanner.from.clone();

        let Some(region) = state.regions.get(&region_name) else {
            return Ok(None);
        };
        let found = region
            .rows
            .range((from, Bound::Unbounded))
            .find_map(|(key, cells)| {
                let selected: Vec<(ColumnName, Vec<u8>)> = cells
                    .iter()
                    .filter(|(column, _)| columns.iter().any(|want| want.selects(column)))
                    .filter_map(|(column, versions)| {
                        versions
                            .first()
                            .map(|(_, value)| (column.clone(), value.clone()))
                    })
                    .collect();
                if selected.is_empty() {
                    None
                } else {
                    Some(ScanRow {
                        row: key.clone(),
                        cells: selected,
                    })
                }
            });

        if let Some(row) = &found {
            let key = row.row.clone();
            if let Some(mock_scanner) = state.scanners.get_mut(&scanner) {
                mock_scanner.from = Bound::Excluded(key);
            }
        }
        Ok(found)
    }

    async fn close_scanner(&self, scanner: ScannerId) -> RpcResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.scanners.remove(&scanner).is_some() {
            self.closed_scanners.fetch_add(1, Ordering::SeqCst);
            Ok(())
        } else {
            self.bad_closes.fetch_add(1, Ordering::SeqCst);
            Err(RpcError::Remote(format!("unknown scanner {scanner}")))
        }
    }

    async fn start_update(
        &self,
        region: &RegionName,
        client_id: u64,
        row: &RowKey,
    ) -> RpcResult<LockId> {
        let mut state = self.state.lock().unwrap();
        let mock_region = state
            .regions
            .get(region)
            .ok_or_else(|| RpcError::NotServingRegion(region.clone()))?;
        if !mock_region.descriptor.contains(row) {
            return Err(RpcError::WrongRegion(region.as_str().to_string()));
        }
        let id = LockId::new(self.next_lock.fetch_add(1, Ordering::SeqCst));
        state.locks.insert(
            id,
            MockLock {
                region: region.clone(),
                client_id,
                row: row.clone(),
                staged: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn put(
        &self,
        _region: &RegionName,
        client_id: u64,
        lock: LockId,
        column: &ColumnName,
        value: Vec<u8>,
    ) -> RpcResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_puts > 0 {
            state.fail_puts -= 1;
            return Err(RpcError::Remote("injected put failure".into()));
        }
        let mock_lock = state
            .locks
            .get_mut(&lock)
            .filter(|l| l.client_id == client_id)
            .ok_or_else(|| RpcError::Lock(format!("no such lock {lock}")))?;
        mock_lock.staged.push((column.clone(), Some(value)));
        Ok(())
    }

    async fn delete(
        &self,
        _region: &RegionName,
        client_id: u64,
        lock: LockId,
        column: &ColumnName,
    ) -> RpcResult<()> {
        let mut state = self.state.lock().unwrap();
        let mock_lock = state
            .locks
            .get_mut(&lock)
            .filter(|l| l.client_id == client_id)
            .ok_or_else(|| RpcError::Lock(format!("no such lock {lock}")))?;
        mock_lock.staged.push((column.clone(), None));
        Ok(())
    }

    async fn abort_update(
        &self,
        _region: &RegionName,
        client_id: u64,
        lock: LockId,
    ) -> RpcResult<()> {
        let mut state = self.state.lock().unwrap();
        state.aborts_received += 1;
        state
            .locks
            .remove(&lock)
            .filter(|l| l.client_id == client_id)
            .map(|_| ())
            .ok_or_else(|| RpcError::Lock(format!("no such lock {lock}")))
    }

    async fn commit_update(
        &self,
        _region: &RegionName,
        client_id: u64,
        lock: LockId,
    ) -> RpcResult<()> {
        let mut state = self.state.lock().unwrap();
        let mock_lock = state
            .locks
            .remove(&lock)
            .filter(|l| l.client_id == client_id)
            .ok_or_else(|| RpcError::Lock(format!("no such lock {lock}")))?;
        state.clock += 1;
        let clock = state.clock;
        let region = state
            .regions
            .get_mut(&mock_lock.region)
            .ok_or_else(|| RpcError::NotServingRegion(mock_lock.region.clone()))?;
        let cells = region.rows.entry(mock_lock.row.clone()).or_default();
        for (column, value) in mock_lock.staged {
            match value {
                Some(value) => cells.entry(column).or_default().insert(0, (clock, value)),
                None => {
                    cells.remove(&column);
                }
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct MasterState {
    root: Option<ServerAddress>,
    root_answers: VecDeque<Option<ServerAddress>>,
}

pub struct MockMaster {
    running: AtomicBool,
    state: Mutex<MasterState>,
    pub admin_calls: Mutex<Vec<String>>,
}

impl MockMaster {
    fn new(root: ServerAddress) -> Self {
        Self {
            running: AtomicBool::new(true),
            state: Mutex::new(MasterState {
                root: Some(root),
                root_answers: VecDeque::new(),
            }),
            admin_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    /// Scripts the next answers to `find_root_region`; once drained, the
    /// stored root location is returned again.
    pub fn push_root_answer(&self, answer: Option<ServerAddress>) {
        self.state.lock().unwrap().root_answers.push_back(answer);
    }

    fn record(&self, call: impl Into<String>) {
        self.admin_calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl Master for MockMaster {
    async fn is_running(&self) -> RpcResult<bool> {
        Ok(self.running.load(Ordering::SeqCst))
    }

    async fn find_root_region(&self) -> RpcResult<Option<ServerAddress>> {
        let mut state = self.state.lock().unwrap();
        if let Some(answer) = state.root_answers.pop_front() {
            return Ok(answer);
        }
        Ok(state.root.clone())
    }

    async fn create_table(&self, table: &TableDescriptor) -> RpcResult<()> {
        self.record(format!("create_table {}", table.name));
        Ok(())
    }

    async fn delete_table(&self, table: &TableName) -> RpcResult<()> {
        self.record(format!("delete_table {table}"));
        Ok(())
    }

    async fn add_column(&self, table: &TableName, family: &ColumnFamily) -> RpcResult<()> {
        self.record(format!("add_column {table} {}", family.name));
        Ok(())
    }

    async fn delete_column(&self, table: &TableName, family: &str) -> RpcResult<()> {
        self.record(format!("delete_column {table} {family}"));
        Ok(())
    }

    async fn enable_table(&self, table: &TableName) -> RpcResult<()> {
        self.record(format!("enable_table {table}"));
        Ok(())
    }

    async fn disable_table(&self, table: &TableName) -> RpcResult<()> {
        self.record(format!("disable_table {table}"));
        Ok(())
    }

    async fn shutdown(&self) -> RpcResult<()> {
        self.record("shutdown".to_string());
        Ok(())
    }
}

pub struct MockCluster {
    pub master: Arc<MockMaster>,
    pub master_addr: ServerAddress,
    servers: Mutex<HashMap<ServerAddress, Arc<MockRegionServer>>>,
    meta_regions: Mutex<Vec<(RegionDescriptor, ServerAddress)>>,
    next_region_id: AtomicU64,
}

impl MockCluster {
    /// Builds a cluster with one catalog server hosting the root region and
    /// a single all-covering meta region.
    pub fn new() -> Arc<Self> {
        let catalog_addr = ServerAddress::from(CATALOG_ADDR);
        let cluster = Arc::new(Self {
            master: Arc::new(MockMaster::new(catalog_addr.clone())),
            master_addr: ServerAddress::from(MASTER_ADDR),
            servers: Mutex::new(HashMap::new()),
            meta_regions: Mutex::new(Vec::new()),
            next_region_id: AtomicU64::new(1),
        });

        let catalog_server = cluster.add_server(catalog_addr.clone());

        // The root region, with one row describing the sole meta region.
        let meta_table =
            TableDescriptor::new(TableName::meta(), vec![ColumnFamily::new("info")]);
        let meta_region = RegionDescriptor::new(
            meta_table,
            RowKey::empty(),
            RowKey::empty(),
            cluster.next_region_id.fetch_add(1, Ordering::SeqCst),
        );

        let root = catalog::root_region();
        let mut root_rows = BTreeMap::new();
        let row = catalog::catalog_row(&meta_region, Some(&catalog_addr));
        root_rows.insert(
            row.row.clone(),
            row.cells
                .iter()
                .map(|(column, value)| (column.clone(), vec![(1, value.clone())]))
                .collect(),
        );
        catalog_server.install_region(MockRegion {
            descriptor: root,
            rows: root_rows,
        });

        catalog_server.install_region(MockRegion {
            descriptor: meta_region.clone(),
            rows: BTreeMap::new(),
        });
        cluster
            .meta_regions
            .lock()
            .unwrap()
            .push((meta_region, catalog_addr));

        cluster
    }

    pub fn connector(self: &Arc<Self>) -> Arc<dyn Connector> {
        Arc::new(MockConnector {
            cluster: self.clone(),
        })
    }

    pub fn add_server(&self, addr: ServerAddress) -> Arc<MockRegionServer> {
        let mut servers = self.servers.lock().unwrap();
        servers
            .entry(addr.clone())
            .or_insert_with(|| Arc::new(MockRegionServer::new(addr)))
            .clone()
    }

    pub fn server(&self, addr: &str) -> Arc<MockRegionServer> {
        self.servers
            .lock()
            .unwrap()
            .get(&ServerAddress::from(addr))
            .expect("server exists")
            .clone()
    }

    pub fn catalog_server(&self) -> Arc<MockRegionServer> {
        self.server(CATALOG_ADDR)
    }

    /// The meta region whose key range holds `key`'s catalog row.
    pub fn meta_region_for(&self, key: &RowKey) -> (RegionDescriptor, ServerAddress) {
        let meta_regions = self.meta_regions.lock().unwrap();
        meta_regions
            .iter()
            .find(|(descriptor, _)| descriptor.contains(key))
            .expect("cluster has a meta region covering every key")
            .clone()
    }

    /// Creates a user table: installs a region per `(start_key, server)`
    /// pair and writes the matching catalog rows into meta.
    pub fn create_user_table(&self, name: &str, regions: &[(&str, &str)]) -> TableDescriptor {
        let table = TableDescriptor::new(TableName::from(name), vec![ColumnFamily::new("d")]);
        for (index, (start, addr)) in regions.iter().enumerate() {
            let end = regions
                .get(index + 1)
                .map(|(next_start, _)| RowKey::from(*next_start))
                .unwrap_or_else(RowKey::empty);
            let descriptor = RegionDescriptor::new(
                table.clone(),
                RowKey::from(*start),
                end,
                self.next_region_id.fetch_add(1, Ordering::SeqCst),
            );
            let server = self.add_server(ServerAddress::from(*addr));
            server.install_region(MockRegion {
                descriptor: descriptor.clone(),
                rows: BTreeMap::new(),
            });
            self.write_catalog_row(&descriptor, Some(&ServerAddress::from(*addr)));
        }
        table
    }

    /// Writes (or rewrites) a region's catalog row in the owning meta region.
    pub fn write_catalog_row(&self, descriptor: &RegionDescriptor, server: Option<&ServerAddress>) {
        let row = catalog::catalog_row(descriptor, server);
        let (meta_region, meta_addr) = self.meta_region_for(&row.row);
        let meta_server = self.server(meta_addr.as_str());
        let mut state_guard = meta_server.state.lock().unwrap();
        state_guard.clock += 1;
        let clock = state_guard.clock;
        let region = state_guard
            .regions
            .get_mut(&meta_region.name)
            .expect("meta region installed");
        let cells = row
            .cells
            .iter()
            .map(|(column, value)| (column.clone(), vec![(clock, value.clone())]))
            .collect();
        region.rows.insert(row.row.clone(), cells);
    }

    /// Finds the live region of `table` covering `row`.
    pub fn region_of(&self, table: &str, row: &str) -> (Arc<MockRegionServer>, RegionDescriptor) {
        let key = RowKey::from(row);
        let servers = self.servers.lock().unwrap();
        for server in servers.values() {
            let found = {
                let state = server.state.lock().unwrap();
                state
                    .regions
                    .values()
                    .find(|region| {
                        region.descriptor.table.name.as_str() == table
                            && region.descriptor.contains(&key)
                    })
                    .map(|region| region.descriptor.clone())
            };
            if let Some(descriptor) = found {
                return (server.clone(), descriptor);
            }
        }
        panic!("no region of {table} covers {row}");
    }

    /// Stores one cell through the hosting region directly.
    pub fn seed_cell(&self, table: &str, row: &str, column: &str, value: &[u8]) {
        let (server, descriptor) = self.region_of(table, row);
        server.insert_cell(
            &descriptor.name,
            &RowKey::from(row),
            &ColumnName::from(column),
            value,
        );
    }

    /// Moves a region to another server and updates its catalog row.
    pub fn move_region(&self, table: &str, row: &str, to: &str) {
        let (from_server, descriptor) = self.region_of(table, row);
        let region = from_server
            .remove_region(&descriptor.name)
            .expect("region hosted");
        let to_addr = ServerAddress::from(to);
        let target = self.add_server(to_addr.clone());
        target.install_region(region);
        self.write_catalog_row(&descriptor, Some(&to_addr));
    }

    /// Clears the server assignment in a region's catalog row.
    pub fn unassign_in_catalog(&self, table: &str, row: &str) {
        let (_, descriptor) = self.region_of(table, row);
        self.write_catalog_row(&descriptor, None);
    }

    /// Total scanner opens across every server.
    pub fn opened_scanners(&self) -> usize {
        self.servers
            .lock()
            .unwrap()
            .values()
            .map(|server| server.opened_scanners.load(Ordering::SeqCst))
            .sum()
    }

    /// Total scanner closes across every server.
    pub fn closed_scanners(&self) -> usize {
        self.servers
            .lock()
            .unwrap()
            .values()
            .map(|server| server.closed_scanners.load(Ordering::SeqCst))
            .sum()
    }

    /// Asserts every opened scanner was closed exactly once.
    pub fn assert_scanners_balanced(&self) {
        let opened = self.opened_scanners();
        let closed = self.closed_scanners();
        assert_eq!(opened, closed, "scanner opens ({opened}) != closes ({closed})");
        let bad: usize = self
            .servers
            .lock()
            .unwrap()
            .values()
            .map(|server| server.bad_closes.load(Ordering::SeqCst))
            .sum();
        assert_eq!(bad, 0, "{bad} closes hit an unknown scanner id");
    }
}

struct MockConnector {
    cluster: Arc<MockCluster>,
}

#[async_trait]
impl Connector for MockConnector {
    async fn region_server(&self, addr: &ServerAddress) -> RpcResult<Arc<dyn RegionServer>> {
        self.cluster
            .servers
            .lock()
            .unwrap()
            .get(addr)
            .cloned()
            .map(|server| server as Arc<dyn RegionServer>)
            .ok_or_else(|| RpcError::Unreachable {
                addr: addr.clone(),
                reason: "no such server".into(),
            })
    }

    async fn master(&self, addr: &ServerAddress) -> RpcResult<Arc<dyn Master>> {
        if *addr == self.cluster.master_addr {
            Ok(self.cluster.master.clone() as Arc<dyn Master>)
        } else {
            Err(RpcError::Unreachable {
                addr: addr.clone(),
                reason: "master is not at this address".into(),
            })
        }
    }
}
