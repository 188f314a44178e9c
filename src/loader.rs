use polars::prelude::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::domain::TSError;
use crate::store::Store;

#[derive(Debug)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

/// Expand `~` and environment variables in a user supplied path.
pub fn resolve_path(raw: &str) -> Result<PathBuf, TSError> {
    let expanded = shellexpand::full(raw).map_err(|e| TSError::BadPath(e.to_string()))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Load a tabular file and publish it through the store: column headers into
/// `columns`, stringified cells into `rows`, then flip `visible` on.
///
/// All data is held as Strings in memory; each column is stringified in its
/// own rayon task as this is the expensive part of loading.
pub fn load_into_store(store: &Store, path: PathBuf) -> Result<(), TSError> {
    let file_info = get_file_info(path)?;
    let frame = match file_info.file_type {
        FileType::CSV => load_csv(&file_info.path)?,
        FileType::PARQUET => load_parquet(&file_info.path)?,
        FileType::ARROW => load_arrow(&file_info.path)?,
    };

    let start_time = Instant::now();
    let df = frame.collect()?;

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let c_: Result<Vec<(String, Vec<String>)>, PolarsError> = names
        .par_iter()
        .map(|name| load_column(&df, name).map(|data| (name.clone(), data)))
        .collect();
    let columns = c_?;

    let data_loading_duration = start_time.elapsed().as_millis();
    info!(
        "Loaded {} ({} bytes, {:?}) in {data_loading_duration}ms",
        file_info.path.display(),
        file_info.file_size,
        file_info.file_type
    );
    for (name, data) in columns.iter() {
        debug!("Column \"{name}\", # rows {}", data.len());
    }

    let rows: HashMap<String, Vec<String>> = columns.into_iter().collect();
    store.set_columns(names);
    store.set_rows(rows);
    store.set_visible(true);

    Ok(())
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<Vec<String>, PolarsError> {
    let col = df.column(col_name)?.cast(&DataType::String)?;
    let series = col.str()?;
    let mut data = Vec::with_capacity(series.len());

    for value in series.into_iter() {
        let ss = match value {
            Some(s) => s.to_string().replace("\r\n", " ↵ ").replace("\n", " ↵ "),
            None => String::from("∅"),
        };
        data.push(ss);
    }
    Ok(data)
}

fn detect_file_type(path: &Path) -> Result<FileType, TSError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::CSV),
        Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
        _ => Err(TSError::UnknownFileType),
    }
}

fn get_file_info(path: PathBuf) -> Result<FileInfo, TSError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TSError::FileNotFound,
        ErrorKind::PermissionDenied => TSError::PermissionDenied,
        _ => TSError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(TSError::LoadingFailed("Not a file!".into()));
    }

    let file_size = metadata.len();
    let file_type = detect_file_type(&path)?;

    Ok(FileInfo {
        path,
        file_size,
        file_type,
    })
}

fn load_csv(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.as_path().into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(
        PlPath::Local(path.as_path().into()),
        ScanArgsParquet::default(),
    )
}

fn load_arrow(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.as_path().into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn csv_fills_the_store_and_shows_the_table() {
        let file = write_fixture("Name,Age\nAlice,30\nBob,25\n");
        let store = Store::new();

        load_into_store(&store, file.path().to_path_buf()).unwrap();

        assert!(store.visible());
        assert_eq!(store.columns(), vec!["Name".to_string(), "Age".to_string()]);
        assert_eq!(
            store.column("Name"),
            Some(vec!["Alice".to_string(), "Bob".to_string()])
        );
        assert_eq!(
            store.column("Age"),
            Some(vec!["30".to_string(), "25".to_string()])
        );
    }

    #[test]
    fn missing_values_are_stringified() {
        let file = write_fixture("a,b\n1,\n,2\n");
        let store = Store::new();

        load_into_store(&store, file.path().to_path_buf()).unwrap();

        assert_eq!(
            store.column("b"),
            Some(vec!["∅".to_string(), "2".to_string()])
        );
    }

    #[test]
    fn missing_file_is_reported() {
        let store = Store::new();
        let err = load_into_store(&store, PathBuf::from("/does/not/exist.csv"));
        assert!(matches!(err, Err(TSError::FileNotFound)));
        assert!(!store.visible());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"a,b\n1,2\n").unwrap();
        let store = Store::new();

        let err = load_into_store(&store, file.path().to_path_buf());
        assert!(matches!(err, Err(TSError::UnknownFileType)));
    }
}
