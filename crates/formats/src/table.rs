//! Delimited text tables (CSV and friends).
//!
//! Parsing rules:
//! - The delimiter is detected from the first non-blank line among `,` `;`
//!   and tab, defaulting to `,`. Records are then read with `csv`.
//! - Numeric-looking fields become numbers, `true`/`false` become booleans,
//!   empty fields are null, everything else stays text.
//! - Blank lines are skipped; rows may have differing lengths.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn infer(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() {
            return Value::Null;
        }
        match s {
            "true" | "TRUE" | "True" => return Value::Bool(true),
            "false" | "FALSE" | "False" => return Value::Bool(false),
            _ => {}
        }
        if looks_numeric(s)
            && let Ok(n) = s.parse::<f64>()
        {
            return Value::Number(n);
        }
        Value::Text(s.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Integral, non-negative numbers only.
    pub fn as_index(&self) -> Option<usize> {
        let n = self.as_f64()?;
        if n >= 0.0 && n.fract() == 0.0 && n <= usize::MAX as f64 {
            Some(n as usize)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Join key: text as-is, integral numbers without a fraction.
    pub fn key_string(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Number(n) if n.fract() == 0.0 => Some(format!("{}", *n as i64)),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null => None,
        }
    }
}

// Mirrors the usual dynamic-typing rule: optional sign, digits with an
// optional fraction, optional exponent. Rejects `inf`, `NaN`, hex, etc.
fn looks_numeric(s: &str) -> bool {
    let b = s.as_bytes();
    let mut i = 0;
    if i < b.len() && (b[i] == b'-' || b[i] == b'+') {
        i += 1;
    }
    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;
    let mut frac_digits = 0;
    if i < b.len() && b[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        frac_digits = i - frac_start;
    }
    if int_digits == 0 && frac_digits == 0 {
        return false;
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        i += 1;
        if i < b.len() && (b[i] == b'-' || b[i] == b'+') {
            i += 1;
        }
        let exp_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == b.len()
}

#[derive(Debug)]
pub enum TableError {
    Csv(csv::Error),
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::Csv(e) => write!(f, "malformed table: {e}"),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableError::Csv(e) => Some(e),
        }
    }
}

impl From<csv::Error> for TableError {
    fn from(e: csv::Error) -> Self {
        TableError::Csv(e)
    }
}

/// Parsed table. Rows keep their source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Option<Vec<String>>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn from_bytes(bytes: &[u8], has_header: bool) -> Result<Self, TableError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(detect_delimiter(bytes))
            .from_reader(bytes);

        let mut columns = None;
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if is_blank(&record) {
                continue;
            }
            if has_header && columns.is_none() {
                columns = Some(record.iter().map(|c| c.trim().to_string()).collect());
                continue;
            }
            rows.push(record.iter().map(Value::infer).collect());
        }
        if has_header && columns.is_none() {
            columns = Some(Vec::new());
        }

        Ok(Self::from_parts(columns, rows))
    }

    pub fn parse(text: &str, has_header: bool) -> Result<Self, TableError> {
        Self::from_bytes(text.as_bytes(), has_header)
    }

    pub fn from_parts(columns: Option<Vec<String>>, rows: Vec<Vec<Value>>) -> Self {
        let mut index = HashMap::new();
        if let Some(cols) = &columns {
            for (i, c) in cols.iter().enumerate() {
                // First occurrence wins for duplicated headers.
                index.entry(c.clone()).or_insert(i);
            }
        }
        Self {
            columns,
            index,
            rows,
        }
    }

    pub fn has_header(&self) -> bool {
        self.columns.is_some()
    }

    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, i: usize) -> Option<Row<'_>> {
        self.rows.get(i).map(|values| Row {
            table: self,
            values,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row {
            table: self,
            values,
        })
    }
}

/// Borrowed view of one row. Keyed access needs a header.
#[derive(Debug, Copy, Clone)]
pub struct Row<'a> {
    table: &'a Table,
    values: &'a [Value],
}

impl<'a> Row<'a> {
    /// `None` when the column is unknown or the row is too short for it.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let i = self.table.column_index(column)?;
        self.values.get(i)
    }

    pub fn at(&self, i: usize) -> Option<&'a Value> {
        self.values.get(i)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Value::as_f64)
    }

    pub fn number_at(&self, i: usize) -> Option<f64> {
        self.at(i).and_then(Value::as_f64)
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn detect_delimiter(bytes: &[u8]) -> u8 {
    let Some(first) = bytes
        .split(|&b| b == b'\n')
        .find(|l| !l.iter().all(u8::is_ascii_whitespace))
    else {
        return b',';
    };
    let mut best = (b',', 0usize);
    for candidate in [b',', b';', b'\t'] {
        let mut in_quotes = false;
        let mut count = 0;
        for &b in first {
            if b == b'"' {
                in_quotes = !in_quotes;
            } else if b == candidate && !in_quotes {
                count += 1;
            }
        }
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

// Whitespace-only lines come through as a single blank field.
fn is_blank(record: &csv::StringRecord) -> bool {
    record.len() <= 1 && record.get(0).is_none_or(|f| f.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{Table, TableError, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn headerless_rows_are_positional_numbers() {
        let t = Table::parse("319200,6397000,55.5\n319210,6397010,61\n", false).unwrap();
        assert!(!t.has_header());
        assert_eq!(t.len(), 2);
        let r = t.row(1).unwrap();
        assert_eq!(r.number_at(0), Some(319210.0));
        assert_eq!(r.number_at(2), Some(61.0));
        assert_eq!(r.get("x"), None);
    }

    #[test]
    fn header_rows_are_keyed() {
        let t = Table::parse("x,y,value\n1,2,3.5\n", true).unwrap();
        let r = t.row(0).unwrap();
        assert_eq!(r.number("value"), Some(3.5));
        assert_eq!(r.number("y"), Some(2.0));
        assert_eq!(r.get("missing"), None);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let t = Table::parse("a,b\r\n\r\n1,2\r\n   \r\n3,4\r\n\r\n", true).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.row(1).unwrap().number("b"), Some(4.0));
    }

    #[test]
    fn short_rows_leave_columns_undefined() {
        let t = Table::parse("x,y,value\n1,2\n", true).unwrap();
        assert_eq!(t.row(0).unwrap().get("value"), None);
    }

    #[test]
    fn dynamic_typing() {
        assert_eq!(Value::infer(" 42 "), Value::Number(42.0));
        assert_eq!(Value::infer("-1.5e3"), Value::Number(-1500.0));
        assert_eq!(Value::infer(".5"), Value::Number(0.5));
        assert_eq!(Value::infer("true"), Value::Bool(true));
        assert_eq!(Value::infer(""), Value::Null);
        assert_eq!(Value::infer("NaN"), Value::Text("NaN".into()));
        assert_eq!(Value::infer("inf"), Value::Text("inf".into()));
        assert_eq!(Value::infer("1e"), Value::Text("1e".into()));
        assert_eq!(Value::infer("abc-123"), Value::Text("abc-123".into()));
    }

    #[test]
    fn quoted_fields_may_hold_delimiters_and_escapes() {
        let t = Table::parse("ID,Note\n\"b-1\",\"a, \"\"quoted\"\" note\"\n", true).unwrap();
        let r = t.row(0).unwrap();
        assert_eq!(r.get("ID"), Some(&Value::Text("b-1".into())));
        assert_eq!(
            r.get("Note"),
            Some(&Value::Text("a, \"quoted\" note".into()))
        );
    }

    #[test]
    fn semicolon_and_tab_delimiters_are_detected() {
        let t = Table::parse("a;b\n1;2\n", true).unwrap();
        assert_eq!(t.row(0).unwrap().number("b"), Some(2.0));
        let t = Table::parse("1\t2\t3\n", false).unwrap();
        assert_eq!(t.row(0).unwrap().number_at(2), Some(3.0));
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let err = Table::from_bytes(b"x,y\n\xff\xfe,1\n", true).unwrap_err();
        assert!(matches!(err, TableError::Csv(_)));
    }

    #[test]
    fn byte_order_mark_is_dropped_from_the_header() {
        let t = Table::from_bytes(b"\xEF\xBB\xBFID,Total\nb-1,12\n", true).unwrap();
        assert_eq!(t.row(0).unwrap().number("Total"), Some(12.0));
        assert_eq!(t.columns().unwrap()[0], "ID");
    }

    #[test]
    fn header_only_table_is_empty() {
        let t = Table::parse("ID,Total\n", true).unwrap();
        assert!(t.is_empty());
        assert_eq!(t.column_index("Total"), Some(1));
        let t = Table::parse("", true).unwrap();
        assert!(t.has_header());
        assert!(t.is_empty());
    }

    #[test]
    fn key_strings_drop_integral_fractions() {
        assert_eq!(Value::Number(17.0).key_string(), Some("17".into()));
        assert_eq!(Value::Text("abc".into()).key_string(), Some("abc".into()));
        assert_eq!(Value::Null.key_string(), None);
    }
}
