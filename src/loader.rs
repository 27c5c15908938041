use crate::error::{Error, Result};
use crate::schema;
use crate::table::{Table, Value};
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

lazy_static! {
    static ref MISSING_REGEX: Regex =
        Regex::new(r"^(?:|NA|N/A|n/a|NaN|nan|NULL|null|None|#N/A)$").unwrap();
    static ref MONTH_REGEX: Regex =
        Regex::new(r"^(\d{4})[-/.](\d{1,2})(?:[-/.]\d{1,2})?(?:[ T].*)?$").unwrap();
}

/// Load a table from a CSV file
///
/// The first line holds the column names. Each following line becomes one
/// row; cells are typed on the way in (see [`parse_cell`]) and the `month`
/// column, when present, is normalised to `YYYY-MM` labels.
///
/// # Arguments
/// * `filepath` - Path to the CSV file to load
///
/// # Returns
/// * `Result<Table>` - The loaded table or an error
///
/// # Examples
/// ```no_run
/// use stay_or_skip::loader::from_csv;
///
/// match from_csv("spotify_merged.csv") {
///     Ok(table) => println!("Loaded {} rows", table.len()),
///     Err(e) => eprintln!("Error loading CSV: {}", e),
/// }
/// ```
pub fn from_csv(filepath: impl AsRef<Path>) -> Result<Table> {
    let file = File::open(filepath)?;
    let reader = BufReader::new(file);
    let lines: Vec<String> = reader.lines().collect::<std::result::Result<_, _>>()?;

    let mut lines = lines.into_iter().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| Error::Load("CSV file is empty".to_string()))?;

    let columns: Vec<String> = parse_csv_row(header.trim_start_matches('\u{feff}'))
        .into_iter()
        .map(|c| c.trim().to_string())
        .collect();
    let month_idx = columns.iter().position(|c| c == schema::MONTH);

    let mut table = Table::new(columns);
    for line in lines {
        let mut row: Vec<Value> = parse_csv_row(&line).iter().map(|s| parse_cell(s)).collect();
        if let Some(idx) = month_idx {
            if let Some(cell) = row.get_mut(idx) {
                *cell = normalize_month(cell);
            }
        }
        table.push_row(row)?;
    }

    debug!("csv: {} rows x {} columns", table.len(), table.columns().len());
    Ok(table)
}

/// Load a table from the first worksheet of an Excel file
///
/// The first sheet row holds the column names. Date cells are rendered as
/// `YYYY-MM-DD HH:MM:SS` text and empty or error cells become missing values.
///
/// # Arguments
/// * `filepath` - Path to the Excel file to load
///
/// # Returns
/// * `Result<Table>` - The loaded table or an error
///
/// # Examples
/// ```no_run
/// use stay_or_skip::loader::from_excel;
///
/// match from_excel("spotify_merged.xlsx") {
///     Ok(table) => println!("Loaded {} rows", table.len()),
///     Err(e) => eprintln!("Error loading Excel: {}", e),
/// }
/// ```
pub fn from_excel(filepath: impl AsRef<Path>) -> Result<Table> {
    use calamine::{Data, DataType, Reader, Xlsx, open_workbook};

    let mut workbook: Xlsx<_> = open_workbook(filepath)?;

    // Get the first worksheet
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::Load("No sheets found in Excel file".to_string()))?;

    let range = workbook.worksheet_range(&sheet_name)?;
    let mut rows = range.rows();

    let header = rows
        .next()
        .ok_or_else(|| Error::Load("Excel sheet is empty".to_string()))?;
    let columns: Vec<String> = header.iter().map(|c| c.to_string().trim().to_string()).collect();
    let month_idx = columns.iter().position(|c| c == schema::MONTH);

    let mut table = Table::new(columns);
    let mut skipped = 0usize;
    for (i, row) in rows.enumerate() {
        let mut values: Vec<Value> = row
            .iter()
            .map(|cell| match cell {
                Data::Empty | Data::Error(_) => Value::Null,
                Data::Int(i) => Value::Number(*i as f64),
                Data::Float(f) if f.is_finite() => Value::Number(*f),
                Data::Float(_) => Value::Null,
                Data::Bool(b) => Value::Bool(*b),
                Data::String(s) => parse_cell(s),
                Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
                    Some(dt) => Value::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
                    None => Value::Text(cell.to_string()),
                },
                other => Value::Text(other.to_string()),
            })
            .collect();

        if values.iter().all(Value::is_null) {
            // Sheet rows are 1-based and the header takes row 1
            warn!("xlsx '{}': skipping blank row {}", sheet_name, i + 2);
            skipped += 1;
            continue;
        }
        if let Some(idx) = month_idx {
            if let Some(cell) = values.get_mut(idx) {
                *cell = normalize_month(cell);
            }
        }
        table.push_row(values)?;
    }

    debug!(
        "xlsx '{}': {} rows x {} columns, {} blank rows skipped",
        sheet_name,
        table.len(),
        table.columns().len(),
        skipped
    );
    Ok(table)
}

/// Types a raw text cell
///
/// Missing markers (`""`, `NA`, `NaN`, `null`, ...) become [`Value::Null`],
/// finite numbers become [`Value::Number`], `true`/`false` become
/// [`Value::Bool`] and everything else stays text.
pub fn parse_cell(raw: &str) -> Value {
    let s = raw.trim();
    if MISSING_REGEX.is_match(s) {
        return Value::Null;
    }
    if let Ok(n) = s.parse::<f64>() {
        if n.is_finite() {
            return Value::Number(n);
        }
    }
    match s.to_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::Text(s.to_string()),
    }
}

/// Rewrites date-like month cells as `YYYY-MM`
///
/// `2023-1`, `2023/01/01` and `2023-01-01 00:00:00` all become `2023-01`.
/// Anything else, missing cells included, is returned unchanged.
pub fn normalize_month(value: &Value) -> Value {
    if let Value::Text(s) = value {
        if let Some(caps) = MONTH_REGEX.captures(s.trim()) {
            if let Ok(m) = caps[2].parse::<u32>() {
                if (1..=12).contains(&m) {
                    return Value::Text(format!("{}-{:02}", &caps[1], m));
                }
            }
        }
    }
    value.clone()
}

// Parse a CSV row into a vector of strings
fn parse_csv_row(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // Double quote inside quoted field - add a single quote
                    current_field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                result.push(std::mem::take(&mut current_field));
            }
            _ => {
                current_field.push(c);
            }
        }
    }

    // Add the last field
    result.push(current_field);
    result
}

/// Detect file type and load appropriate format
///
/// This function examines the file extension and calls the appropriate loader
/// for CSV or Excel files.
///
/// # Arguments
/// * `filepath` - Path to the file to load
///
/// # Returns
/// * `Result<Table>` - The loaded table or an error
///
/// # Examples
/// ```no_run
/// use stay_or_skip::loader::load_table;
///
/// match load_table("spotify_merged.xlsx") {
///     Ok(table) => println!("Successfully loaded {} rows", table.len()),
///     Err(e) => eprintln!("Error loading file: {}", e),
/// }
/// ```
pub fn load_table(filepath: impl AsRef<Path>) -> Result<Table> {
    let path = filepath.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    let table = match extension.as_deref() {
        Some("csv") => from_csv(path)?,
        Some("xlsx") | Some("xlsm") => from_excel(path)?,
        Some(ext) => return Err(Error::Load(format!("Unsupported file extension: {}", ext))),
        None => return Err(Error::Load("File has no extension".to_string())),
    };

    info!("loaded {} ({} rows)", path.display(), table.len());
    Ok(table)
}

/// Loads the subscription dataset and checks its required columns
pub fn load_dataset(filepath: impl AsRef<Path>) -> Result<Table> {
    let table = load_table(filepath)?;
    schema::require_columns(&table, &schema::DATASET_COLUMNS)?;
    Ok(table)
}
