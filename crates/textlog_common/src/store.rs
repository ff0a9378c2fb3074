//! Log Store - per-day error log with optional table mirror
//!
//! Records are appended to `<folder>/<YYYY_MM_DD>.txt`, one line each. No
//! index file is kept: the set of logged trace ids is recovered by scanning
//! today's file when the store is opened.
//!
//! Level lookups go through an in-memory index that starts cold and is built
//! by a full scan on first read. The index is a snapshot of the file at
//! that moment plus this store's own appends; lines written to the file by
//! anyone else are not picked up until `clear` or a reopen.
//!
//! When a table is configured, each append writes the row and the line as
//! one unit: the row is inserted inside a transaction, the line is
//! appended, and only then is the transaction committed. A failed commit
//! truncates the line back off the file.

use chrono::{Local, NaiveDate};
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::TextLogConfig;
use crate::error::{IdStore, LogError, Result};
use crate::line::{extract_level, extract_trace_id, format_line};
use crate::record::ErrorRecord;
use crate::table::ErrorTable;

/// Log file for `date` inside `folder`
pub fn log_file_path(folder: &Path, date: NaiveDate) -> PathBuf {
    folder.join(format!("{}.txt", date.format("%Y_%m_%d")))
}

/// Level index built lazily from the file (and table)
#[derive(Debug, Default)]
struct LevelIndex {
    buckets: BTreeMap<String, Vec<String>>,
    /// Trace ids already present in some bucket
    ids: HashSet<String>,
    /// Levels whose table rows have been merged
    table_levels: HashSet<String>,
    table_merged_all: bool,
}

impl LevelIndex {
    fn scan(path: &Path) -> Self {
        let mut index = Self::default();
        for line in read_lines(path) {
            let Some(level) = extract_level(&line) else {
                continue;
            };
            let level = level.to_string();
            if let Some(id) = extract_trace_id(&line) {
                index.ids.insert(id.to_string());
            }
            index.buckets.entry(level).or_default().push(line.trim().to_string());
        }
        index
    }

    fn push(&mut self, level: &str, trace_id: &str, line: String) {
        self.ids.insert(trace_id.to_string());
        self.buckets.entry(level.to_string()).or_default().push(line);
    }

    /// Add table rows not already seen in the file
    fn merge_rows(&mut self, rows: Vec<ErrorRecord>) -> usize {
        let mut merged = 0;
        for row in rows {
            if self.ids.contains(&row.trace_id) {
                continue;
            }
            let line = format_line(&row);
            self.push(&row.level, &row.trace_id, line);
            merged += 1;
        }
        merged
    }
}

/// Per-day text log of error records
pub struct LogStore {
    folder: PathBuf,
    file_path: PathBuf,
    table: Option<ErrorTable>,
    logged_ids: HashSet<String>,
    levels: Option<LevelIndex>,
}

impl LogStore {
    /// Open the store for today's log file
    pub fn open(config: &TextLogConfig) -> Result<Self> {
        Self::open_for_date(config, Local::now().date_naive())
    }

    /// Open the store for the log file of a given day
    pub fn open_for_date(config: &TextLogConfig, date: NaiveDate) -> Result<Self> {
        let table = match config.table_path() {
            Some(path) => Some(ErrorTable::open(path)?),
            None => None,
        };
        Self::open_with_table(&config.store.folder, date, table)
    }

    /// Build a store around an already opened table (or none)
    pub fn open_with_table(folder: &Path, date: NaiveDate, table: Option<ErrorTable>) -> Result<Self> {
        let folder = folder.to_path_buf();
        let file_path = log_file_path(&folder, date);
        let logged_ids = scan_ids(&file_path);

        fs::create_dir_all(&folder)?;

        if let Some(db) = table.as_ref().and_then(|t| t.path()) {
            if db.parent() == Some(folder.as_path()) {
                warn!(
                    "Error table {} lives inside the log folder and will be removed by clear",
                    db.display()
                );
            }
        }

        info!(
            "Opened log store at {} ({} existing trace ids, table: {})",
            file_path.display(),
            logged_ids.len(),
            if table.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            folder,
            file_path,
            table,
            logged_ids,
            levels: None,
        })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Current day's log file
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Trace ids logged in the current file, as tracked in memory
    pub fn logged_ids(&self) -> &HashSet<String> {
        &self.logged_ids
    }

    pub fn has_table(&self) -> bool {
        self.table.is_some()
    }

    pub fn table(&self) -> Option<&ErrorTable> {
        self.table.as_ref()
    }

    /// Whether the level index has been built
    pub fn is_warm(&self) -> bool {
        self.levels.is_some()
    }

    /// Trace ids found in the current file on disk
    pub fn existing_ids(&self) -> HashSet<String> {
        scan_ids(&self.file_path)
    }

    /// Append a record.
    ///
    /// Fails with `DuplicateId` if the trace id is already in today's file or
    /// in the table; in that case nothing is written anywhere.
    pub fn append(&mut self, record: &ErrorRecord) -> Result<()> {
        let line = format_line(record);

        if self.logged_ids.contains(&record.trace_id) {
            return Err(LogError::DuplicateId {
                trace_id: record.trace_id.clone(),
                store: IdStore::File,
            });
        }

        match self.table.as_mut() {
            Some(table) => {
                let tx = table.begin()?;
                tx.insert(record)?;
                let previous_len = append_line(&self.folder, &self.file_path, &line)?;
                if let Err(e) = tx.commit() {
                    warn!(
                        "Table commit failed for trace id {}, removing line from {}",
                        record.trace_id,
                        self.file_path.display()
                    );
                    truncate_file(&self.file_path, previous_len)?;
                    return Err(e);
                }
            }
            None => {
                append_line(&self.folder, &self.file_path, &line)?;
            }
        }

        self.logged_ids.insert(record.trace_id.clone());
        if let Some(index) = self.levels.as_mut() {
            index.push(&record.level, &record.trace_id, line);
        }

        debug!("Logged trace id {} at level {}", record.trace_id, record.level);
        Ok(())
    }

    /// Entries logged at `level`, in scan order.
    ///
    /// Builds the level index on first use. Table rows at `level` that are
    /// not in today's file (older days) are appended after the file's lines.
    pub fn load_by_level(&mut self, level: &str) -> Result<&[String]> {
        let index = warm_up(&mut self.levels, &self.file_path);

        if let Some(table) = self.table.as_ref() {
            if !index.table_merged_all && !index.table_levels.contains(level) {
                let merged = index.merge_rows(table.by_level(level)?);
                index.table_levels.insert(level.to_string());
                debug!("Merged {} table rows at level {}", merged, level);
            }
        }

        Ok(index.buckets.get(level).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// The whole level index, every table level merged
    pub fn levels(&mut self) -> Result<&BTreeMap<String, Vec<String>>> {
        let index = warm_up(&mut self.levels, &self.file_path);

        if let Some(table) = self.table.as_ref() {
            if !index.table_merged_all {
                let merged = index.merge_rows(table.all()?);
                index.table_merged_all = true;
                debug!("Merged {} table rows into level index", merged);
            }
        }

        Ok(&index.buckets)
    }

    /// Write the entries at `level` to stdout
    pub fn print(&mut self, level: &str) -> Result<usize> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.print_to(level, &mut out)
    }

    /// Write the entries at `level` to `out`, one per line, or a
    /// "no logs found" notice. Returns the number of entries written.
    pub fn print_to<W: Write>(&mut self, level: &str, out: &mut W) -> Result<usize> {
        let entries = self.load_by_level(level)?;
        if entries.is_empty() {
            writeln!(out, "No logs found for level: {}", level)?;
            return Ok(0);
        }

        for entry in entries {
            writeln!(out, "{}", entry)?;
        }
        Ok(entries.len())
    }

    /// Append the entries at `level` to `destination`, creating it if
    /// needed. Returns the number of entries written; nothing is created
    /// when there are none.
    pub fn export(&mut self, level: &str, destination: &Path) -> Result<usize> {
        let entries = self.load_by_level(level)?;
        if entries.is_empty() {
            warn!("No logs found for level: {}", level);
            return Ok(0);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(destination)?;
        for entry in entries {
            writeln!(file, "{}", entry)?;
        }

        debug!("Exported {} {} entries to {}", entries.len(), level, destination.display());
        Ok(entries.len())
    }

    /// Delete all rows and every file in the log folder, then start over
    /// with an empty, cold store for today.
    pub fn clear(&mut self) -> Result<()> {
        if let Some(table) = self.table.as_mut() {
            let rows = table.delete_all()?;
            debug!("Deleted {} rows from error table", rows);
        }

        let files = remove_files(&self.folder)?;

        self.logged_ids.clear();
        self.levels = None;
        self.file_path = log_file_path(&self.folder, Local::now().date_naive());

        info!("Cleared {} log files from {}", files, self.folder.display());
        Ok(())
    }
}

/// Build the level index on first use
fn warm_up<'a>(levels: &'a mut Option<LevelIndex>, path: &Path) -> &'a mut LevelIndex {
    levels.get_or_insert_with(|| {
        let index = LevelIndex::scan(path);
        debug!("Built level index from {} ({} levels)", path.display(), index.buckets.len());
        index
    })
}

/// Lines of `path`; a missing or unreadable file reads as empty.
///
/// Bytes that are not valid UTF-8 are replaced rather than ending the scan,
/// so one damaged line never hides the ids logged after it.
fn read_lines(path: &Path) -> Vec<String> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!("Cannot read {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let mut lines = Vec::new();
    for chunk in BufReader::new(file).split(b'\n') {
        match chunk {
            Ok(bytes) => {
                let line = String::from_utf8_lossy(&bytes);
                lines.push(line.strip_suffix('\r').unwrap_or(&line).to_string());
            }
            Err(e) => {
                warn!("Stopped reading {} after {} lines: {}", path.display(), lines.len(), e);
                break;
            }
        }
    }
    lines
}

fn scan_ids(path: &Path) -> HashSet<String> {
    read_lines(path)
        .iter()
        .filter_map(|line| extract_trace_id(line))
        .map(str::to_string)
        .collect()
}

/// Append one line, returning the file length before the write
fn append_line(folder: &Path, path: &Path, line: &str) -> io::Result<u64> {
    if !folder.exists() {
        fs::create_dir_all(folder)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let previous_len = file.metadata()?.len();

    if let Err(e) = writeln!(file, "{}", line) {
        if let Err(t) = file.set_len(previous_len) {
            warn!(
                "Could not roll back partial write to {}: {}",
                path.display(),
                t
            );
        }
        return Err(e);
    }
    Ok(previous_len)
}

fn truncate_file(path: &Path, len: u64) -> io::Result<()> {
    OpenOptions::new().write(true).open(path)?.set_len(len)
}

/// Remove every regular file directly inside `folder`
fn remove_files(folder: &Path) -> io::Result<usize> {
    let entries = match fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}
