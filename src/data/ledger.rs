//! Transaction-ledger ingest and normalization.
//!
//! The ledger is a fixed-layout CSV export: a banner preamble, then a header
//! row, then one row per operation. This module turns it into clean
//! per-operation records plus a per-day aggregated sales series.
//!
//! Design goals (same as the bond-list ingest this is modeled on):
//! - strict schema for required columns, with clear errors
//! - row-level validation: skip bad rows, but report what happened
//! - no fusion/fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::SalesPoint;
use crate::error::AppError;

/// Rows before the header row in the ledger export layout.
pub const LEDGER_HEADER_OFFSET: usize = 8;

const COL_CLIENT: &str = "Cliente";
const COL_DISCOUNT: &str = "Descuento";
const COL_PRODUCTS: &str = "Productos";
const COL_TOTAL: &str = "Total";
const COL_DATE: &str = "Fecha Emisión";

/// Marker used by the export for subtotal rows, matched case-insensitively.
const TOTALS_MARKER: &str = "totales";

/// One operation (invoice line) from the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub client: String,
    pub discount: f64,
    /// Units parsed out of the free-text product description.
    pub quantity: u32,
    pub total: f64,
    pub date: NaiveDate,
}

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: normalized operations + bookkeeping.
#[derive(Debug, Clone)]
pub struct LedgerData {
    pub rows: Vec<LedgerRow>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

impl LedgerData {
    /// Per-day aggregated sales over all usable rows.
    pub fn daily(&self) -> Vec<SalesPoint> {
        daily_sales(&self.rows)
    }
}

/// Load and normalize the ledger CSV.
pub fn load_ledger(path: &Path) -> Result<LedgerData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open ledger '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut records = reader.records();

    // Skip the banner preamble above the header row.
    for _ in 0..LEDGER_HEADER_OFFSET {
        match records.next() {
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                return Err(AppError::input(format!("Failed to read ledger preamble: {e}")))
            }
            None => {
                return Err(AppError::input(format!(
                    "Ledger '{}' is shorter than the {LEDGER_HEADER_OFFSET}-row preamble.",
                    path.display()
                )))
            }
        }
    }

    let header = match records.next() {
        Some(Ok(record)) => record,
        Some(Err(e)) => return Err(AppError::input(format!("Failed to read ledger header: {e}"))),
        None => {
            return Err(AppError::input(format!(
                "Ledger '{}' has no header row.",
                path.display()
            )))
        }
    };
    let columns = resolve_columns(&header)?;

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (offset, record) in records.enumerate() {
        let line = LEDGER_HEADER_OFFSET + 2 + offset;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("unreadable row: {e}"),
                });
                continue;
            }
        };
        rows_read += 1;

        let client = record.get(columns.client).unwrap_or("").to_string();
        // Subtotal rows and rows with no client are layout artifacts, not data.
        if client.is_empty() || client.to_lowercase().contains(TOTALS_MARKER) {
            continue;
        }

        match parse_row(&record, &columns, client) {
            Ok(row) => rows.push(row),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if rows.is_empty() {
        return Err(AppError::unavailable(format!(
            "Ledger '{}' contains no usable sales rows.",
            path.display()
        )));
    }

    let rows_used = rows.len();
    Ok(LedgerData {
        rows,
        row_errors,
        rows_read,
        rows_used,
    })
}

struct ColumnIndices {
    client: usize,
    discount: Option<usize>,
    products: Option<usize>,
    total: usize,
    date: usize,
}

fn resolve_columns(header: &StringRecord) -> Result<ColumnIndices, AppError> {
    let map: HashMap<&str, usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect();

    let require = |name: &str| {
        map.get(name).copied().ok_or_else(|| {
            AppError::input(format!("Ledger header is missing the '{name}' column."))
        })
    };

    Ok(ColumnIndices {
        client: require(COL_CLIENT)?,
        discount: map.get(COL_DISCOUNT).copied(),
        products: map.get(COL_PRODUCTS).copied(),
        total: require(COL_TOTAL)?,
        date: require(COL_DATE)?,
    })
}

fn parse_row(
    record: &StringRecord,
    columns: &ColumnIndices,
    client: String,
) -> Result<LedgerRow, String> {
    let raw_total = record.get(columns.total).unwrap_or("");
    let total = raw_total
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("unparseable total '{raw_total}'"))?;

    let raw_date = record.get(columns.date).unwrap_or("");
    let date = parse_ledger_date(raw_date).ok_or_else(|| format!("unparseable date '{raw_date}'"))?;

    let discount = columns
        .discount
        .and_then(|i| record.get(i))
        .and_then(|raw| raw.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0);

    let quantity = columns
        .products
        .and_then(|i| record.get(i))
        .map(parse_quantity)
        .unwrap_or(0);

    Ok(LedgerRow {
        client,
        discount,
        quantity,
        total,
        date,
    })
}

/// Parse the issue date, normalizing any time-of-day component away.
fn parse_ledger_date(raw: &str) -> Option<NaiveDate> {
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    None
}

/// Extract the unit count from a `Cantidad: N` token inside the product
/// description; 0 when the token is absent.
fn parse_quantity(text: &str) -> u32 {
    let Some(pos) = text.find("Cantidad:") else {
        return 0;
    };
    let rest = text[pos + "Cantidad:".len()..].trim_start();
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Aggregate operations to one sales point per calendar day, ascending.
pub fn daily_sales(rows: &[LedgerRow]) -> Vec<SalesPoint> {
    let mut by_day: std::collections::BTreeMap<NaiveDate, f64> = std::collections::BTreeMap::new();
    for row in rows {
        *by_day.entry(row.date).or_insert(0.0) += row.total;
    }
    by_day
        .into_iter()
        .map(|(date, amount)| SalesPoint { date, amount })
        .collect()
}

/// Keep rows within the closed date range; `None` bounds are open-ended.
pub fn filter_by_range(
    rows: &[LedgerRow],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<LedgerRow> {
    rows.iter()
        .filter(|r| from.map_or(true, |f| r.date >= f) && to.map_or(true, |t| r.date <= t))
        .cloned()
        .collect()
}

/// Quick ledger metrics for the `summary` command.
#[derive(Debug, Clone)]
pub struct LedgerSummary {
    pub total_sales: f64,
    pub total_discounts: f64,
    pub total_units: u64,
    pub operations: usize,
    /// Mean sales per operation; 0.0 when there are no operations.
    pub average_ticket: f64,
    /// Top-5 clients by summed sales, descending.
    pub top_by_sales: Vec<(String, f64)>,
    /// Top-5 clients by summed units, descending.
    pub top_by_units: Vec<(String, u64)>,
    pub best_day: Option<SalesPoint>,
    pub daily: Vec<SalesPoint>,
}

pub fn summarize(rows: &[LedgerRow]) -> LedgerSummary {
    let mut sales_by_client: HashMap<&str, f64> = HashMap::new();
    let mut units_by_client: HashMap<&str, u64> = HashMap::new();
    let mut total_sales = 0.0;
    let mut total_discounts = 0.0;
    let mut total_units = 0u64;

    for row in rows {
        total_sales += row.total;
        total_discounts += row.discount;
        total_units += u64::from(row.quantity);
        *sales_by_client.entry(&row.client).or_insert(0.0) += row.total;
        *units_by_client.entry(&row.client).or_insert(0) += u64::from(row.quantity);
    }

    let mut top_by_sales: Vec<(String, f64)> = sales_by_client
        .into_iter()
        .map(|(c, v)| (c.to_string(), v))
        .collect();
    top_by_sales.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    top_by_sales.truncate(5);

    let mut top_by_units: Vec<(String, u64)> = units_by_client
        .into_iter()
        .map(|(c, v)| (c.to_string(), v))
        .collect();
    top_by_units.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_by_units.truncate(5);

    let daily = daily_sales(rows);
    let best_day = daily
        .iter()
        .copied()
        .max_by(|a, b| {
            a.amount
                .partial_cmp(&b.amount)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    let average_ticket = if rows.is_empty() {
        0.0
    } else {
        total_sales / rows.len() as f64
    };

    LedgerSummary {
        total_sales,
        total_discounts,
        total_units,
        operations: rows.len(),
        average_ticket,
        top_by_sales,
        top_by_units,
        best_day,
        daily,
    }
}
