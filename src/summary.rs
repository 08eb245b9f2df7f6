// Directory summaries
// Per-trace catalog rows and verbose station listings for gminfo

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::io::{get_format, read_data};
use crate::model::stream::StationStream;
use crate::model::trace::StationTrace;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Directory '{0}' does not exist.")]
    NotADirectory(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type SummaryResult<T> = Result<T, SummaryError>;

pub const COLUMNS: [&str; 12] = [
    "Filename",
    "Format",
    "Process Level",
    "Start Time",
    "End Time",
    "Duration (s)",
    "Network",
    "Station",
    "Channel",
    "Sampling Rate (Hz)",
    "Latitude",
    "Longitude",
];

pub const ERROR_COLUMNS: [&str; 2] = ["Filename", "Error"];

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// One catalog row per trace
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub filename: String,
    pub format: String,
    pub process_level: String,
    pub start_time: String,
    pub end_time: String,
    pub duration: f64,
    pub network: String,
    pub station: String,
    pub channel: String,
    pub sampling_rate: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl SummaryRow {
    pub fn from_trace(filename: &str, trace: &StationTrace) -> Self {
        let stats = trace.stats();
        SummaryRow {
            filename: filename.to_string(),
            format: stats.standard.source_format.clone(),
            process_level: stats.standard.process_level.code().to_string(),
            start_time: trace.starttime().format(TIME_FORMAT).to_string(),
            end_time: trace.endtime().format(TIME_FORMAT).to_string(),
            duration: trace.duration(),
            network: stats.network.clone(),
            station: stats.station.clone(),
            channel: stats.channel.clone(),
            sampling_rate: stats.sampling_rate,
            latitude: stats.coordinates.map(|c| c.latitude),
            longitude: stats.coordinates.map(|c| c.longitude),
        }
    }

    pub fn fields(&self) -> Vec<String> {
        let coord = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
        vec![
            self.filename.clone(),
            self.format.clone(),
            self.process_level.clone(),
            self.start_time.clone(),
            self.end_time.clone(),
            self.duration.to_string(),
            self.network.clone(),
            self.station.clone(),
            self.channel.clone(),
            self.sampling_rate.to_string(),
            coord(self.latitude),
            coord(self.longitude),
        ]
    }
}

/// A file that could not be read
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRow {
    pub filename: String,
    pub error: String,
}

impl ErrorRow {
    pub fn fields(&self) -> Vec<String> {
        vec![self.filename.clone(), self.error.clone()]
    }
}

// ==================== DIRECTORY WALK ====================

/// Every regular file under `dir`, skipping hidden entries, in path order
pub fn walk_files(dir: &Path) -> SummaryResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SummaryError::NotADirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(dir).sort_by_file_name().into_iter();
    for entry in walker.filter_entry(|e| e.depth() == 0 || !is_hidden(e)) {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

// ==================== CONCISE ====================

/// Catalog rows for every readable file, sorted by network, station and
/// channel, plus one error row per unreadable file
pub fn summarize_files(files: &[PathBuf]) -> (Vec<SummaryRow>, Vec<ErrorRow>) {
    let mut rows = Vec::new();
    let mut errors = Vec::new();
    let mut folders: Vec<&Path> = Vec::new();

    for path in files {
        if let Some(folder) = path.parent() {
            if !folders.contains(&folder) {
                log::info!("Parsing files from subfolder {}...", folder.display());
                folders.push(folder);
            }
        }

        let filename = path.display().to_string();
        match read_data(path) {
            Ok(streams) => {
                for st in &streams {
                    rows.extend(st.iter().map(|tr| SummaryRow::from_trace(&filename, tr)));
                }
            }
            Err(e) => errors.push(ErrorRow {
                filename,
                error: e.to_string(),
            }),
        }
    }

    rows.sort_by(|a, b| {
        (&a.network, &a.station, &a.channel).cmp(&(&b.network, &b.station, &b.channel))
    });
    (rows, errors)
}

/// Left-aligned text table
pub fn render_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let mut push_line = |cells: Vec<&str>| {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        out.push_str(line.join(" ").trim_end());
        out.push('\n');
    };

    push_line(header.to_vec());
    for row in rows {
        push_line(row.iter().map(String::as_str).collect());
    }
    out
}

pub fn render_concise(rows: &[SummaryRow]) -> String {
    let cells: Vec<Vec<String>> = rows.iter().map(SummaryRow::fields).collect();
    render_table(&COLUMNS, &cells)
}

pub fn render_errors(errors: &[ErrorRow]) -> String {
    let cells: Vec<Vec<String>> = errors.iter().map(ErrorRow::fields).collect();
    render_table(&ERROR_COLUMNS, &cells)
}

// ==================== VERBOSE ====================

fn describe_stream(out: &mut String, filename: &str, format: &str, st: &StationStream) {
    let Some(first) = st.trace(0) else {
        return;
    };
    let stats = first.stats();
    let location = match stats.coordinates {
        Some(c) => format!(
            "Lat: {:.4} Lon: {:.4} Elev: {:.1}",
            c.latitude, c.longitude, c.elevation
        ),
        None => "unknown".to_string(),
    };

    let station_block = [
        ("Filename", filename.to_string()),
        ("Format", format.to_string()),
        ("Station", stats.station.clone()),
        ("Network", stats.network.clone()),
        ("Source", stats.standard.source.clone()),
        ("Location", stats.location.clone()),
        ("Coordinates", location),
    ];
    out.push('\n');
    for (key, value) in station_block {
        let _ = writeln!(out, "{:<12} {}", key, value);
    }

    for tr in st {
        let channel_block = [
            ("Channel", tr.stats().channel.clone()),
            ("Start Time", tr.starttime().format(TIME_FORMAT).to_string()),
            ("End Time", tr.endtime().format(TIME_FORMAT).to_string()),
            ("Number of Points", tr.npts().to_string()),
            ("Units", tr.stats().standard.units.clone()),
            ("Peak Value", tr.max_abs().to_string()),
        ];
        out.push('\n');
        for (key, value) in channel_block {
            let _ = writeln!(out, "\t{:<16} {}", key, value);
        }
    }
}

/// Station and channel listing for every readable file
pub fn render_verbose(files: &[PathBuf]) -> (String, Vec<ErrorRow>) {
    let mut out = String::new();
    let mut errors = Vec::new();

    for path in files {
        let filename = path.display().to_string();
        let format = get_format(path).unwrap_or("unknown");
        match read_data(path) {
            Ok(streams) => {
                for st in &streams {
                    describe_stream(&mut out, &filename, format, st);
                }
            }
            Err(e) => errors.push(ErrorRow {
                filename,
                error: e.to_string(),
            }),
        }
    }

    (out, errors)
}

// ==================== CSV ====================

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn to_csv(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    let header: Vec<String> = header.iter().map(|h| csv_field(h)).collect();
    out.push_str(&header.join(","));
    out.push('\n');
    for row in rows {
        let fields: Vec<String> = row.iter().map(|f| csv_field(f)).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// `<stem>_errors<ext>` next to the catalog file
pub fn error_path(outfile: &Path) -> PathBuf {
    let stem = outfile
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match outfile.extension() {
        Some(ext) => format!("{}_errors.{}", stem, ext.to_string_lossy()),
        None => format!("{}_errors", stem),
    };
    outfile.with_file_name(name)
}

/// Write the catalog and its error companion; returns the error file path
pub fn write_catalog(
    outfile: &Path,
    rows: &[SummaryRow],
    errors: &[ErrorRow],
) -> SummaryResult<PathBuf> {
    let cells: Vec<Vec<String>> = rows.iter().map(SummaryRow::fields).collect();
    std::fs::write(outfile, to_csv(&COLUMNS, &cells))?;

    let errfile = error_path(outfile);
    let cells: Vec<Vec<String>> = errors.iter().map(ErrorRow::fields).collect();
    std::fs::write(&errfile, to_csv(&ERROR_COLUMNS, &cells))?;
    Ok(errfile)
}
