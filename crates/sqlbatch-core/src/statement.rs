//! Statement sizing and lightweight INSERT recognition
//!
//! Recognition is deliberate text-pattern matching, not SQL parsing. The
//! merge-compatibility rules downstream depend on exactly this matching
//! behavior; loosening it (or swapping in a real parser) changes which
//! statements merge.

use regex::Regex;
use std::sync::OnceLock;

/// The UTF-8 encoded byte length of a statement.
pub fn statement_size(sql: &str) -> usize {
    sql.len()
}

fn insert_head_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)^\s*INSERT\s+INTO\s+([`"']?[A-Za-z_][\w.$]*[`"']?)\s*(?:\(([^)]*)\))?\s*VALUES\s*"#,
        )
        .expect("INSERT head pattern is valid")
    })
}

/// An ephemeral view over a recognized INSERT statement.
///
/// Table and column text are kept case-preserving; comparison goes through
/// the normalized [`InsertSignature`]. Value tuples are opaque text spans,
/// never individually parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInsert {
    table: String,
    columns: Option<Vec<String>>,
    values: Vec<String>,
}

impl ParsedInsert {
    /// Table name as written, including any quoting.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Explicit column list as written, if the statement has one.
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    /// Raw value tuple texts, parens included.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Column count: explicit list arity, else the arity of the first value
    /// tuple.
    pub fn column_count(&self) -> Option<usize> {
        match &self.columns {
            Some(cols) => Some(cols.len()),
            None => self.values.first().map(|t| tuple_arity(t)),
        }
    }

    /// Normalized merge-compatibility key.
    ///
    /// Explicit-column and implicit-column INSERTs never share a signature,
    /// even on the same table: with implicit columns the ordering cannot be
    /// verified to match.
    pub fn signature(&self) -> InsertSignature {
        InsertSignature {
            table: normalize_ident(&self.table),
            columns: self
                .columns
                .as_ref()
                .map(|cols| cols.iter().map(|c| normalize_ident(c)).collect()),
        }
    }

    /// The statement text up to and including `VALUES `, rebuilt from the
    /// parsed parts. Appending a comma-joined tuple list yields a valid
    /// INSERT again.
    pub fn insert_prefix(&self) -> String {
        match &self.columns {
            Some(cols) => format!("INSERT INTO {} ({}) VALUES ", self.table, cols.join(", ")),
            None => format!("INSERT INTO {} VALUES ", self.table),
        }
    }
}

/// Normalized table-plus-columns key deciding whether two INSERTs may merge.
///
/// Column lists compare as ordered sequences: `(id, name)` and `(name, id)`
/// bind values positionally, so reordering is never assumed safe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InsertSignature {
    table: String,
    columns: Option<Vec<String>>,
}

impl InsertSignature {
    /// Normalized table name.
    pub fn table(&self) -> &str {
        &self.table
    }
}

fn normalize_ident(ident: &str) -> String {
    ident
        .trim()
        .trim_matches(|c| c == '`' || c == '"' || c == '\'')
        .to_lowercase()
}

/// Recognize `INSERT INTO <table> [(<cols>)] VALUES <tuple>[, <tuple>...]`.
///
/// Keyword matching is case-insensitive and whitespace-tolerant. Anything
/// that does not fit the shape - including INSERTs with trailing clauses
/// like `ON CONFLICT` or `RETURNING` - yields `None` and is treated as
/// opaque, never as an error.
pub fn parse_insert(sql: &str) -> Option<ParsedInsert> {
    let caps = insert_head_re().captures(sql)?;
    let head = caps.get(0)?;
    let table = caps.get(1)?.as_str().to_string();

    let columns = match caps.get(2) {
        Some(m) => {
            let cols: Vec<String> = m.as_str().split(',').map(|c| c.trim().to_string()).collect();
            if cols.iter().any(|c| c.is_empty()) {
                return None;
            }
            Some(cols)
        }
        None => None,
    };

    let rest = &sql[head.end()..];
    let (values, consumed) = scan_tuples(rest)?;
    if values.is_empty() {
        return None;
    }

    // Only whitespace and statement delimiters may follow the tuple list.
    let trailing = &rest[consumed..];
    if !trailing.chars().all(|c| c == ';' || c.is_whitespace()) {
        return None;
    }

    Some(ParsedInsert {
        table,
        columns,
        values,
    })
}

/// Detect the column count of an INSERT statement, or `None` when the
/// statement is not a recognizable INSERT.
pub fn detect_column_count(sql: &str) -> Option<usize> {
    parse_insert(sql)?.column_count()
}

/// Scan a comma-separated list of parenthesized tuples, quote- and
/// depth-aware. Returns the tuple texts and the byte offset one past the
/// last closing paren.
fn scan_tuples(text: &str) -> Option<(Vec<String>, usize)> {
    let mut tuples = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut tuple_start = 0usize;
    let mut consumed = 0usize;
    let mut pending_comma = false;

    let mut iter = text.char_indices().peekable();
    'scan: while let Some((i, c)) = iter.next() {
        if let Some(q) = quote {
            if c == q {
                // a doubled quote is an escaped quote inside the literal
                if iter.peek().map(|&(_, n)| n) == Some(q) {
                    iter.next();
                } else {
                    quote = None;
                }
            }
            continue;
        }

        if depth > 0 {
            match c {
                '\'' | '"' => quote = Some(c),
                '(' | '[' | '{' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        let end = i + c.len_utf8();
                        tuples.push(text[tuple_start..end].to_string());
                        consumed = end;
                    }
                }
                ']' | '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            continue;
        }

        match c {
            c if c.is_whitespace() => {}
            '(' if tuples.is_empty() || pending_comma => {
                depth = 1;
                tuple_start = i;
                pending_comma = false;
            }
            ',' if !tuples.is_empty() && !pending_comma => pending_comma = true,
            _ => break 'scan,
        }
    }

    // unterminated tuple or literal, or a dangling comma: not a clean list
    if depth > 0 || quote.is_some() || pending_comma {
        return None;
    }

    Some((tuples, consumed))
}

/// Count top-level elements of one tuple (text includes the outer parens).
fn tuple_arity(tuple: &str) -> usize {
    let inner = tuple
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(tuple);

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut commas = 0usize;
    for c in inner.chars() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => commas += 1,
            _ => {}
        }
    }
    commas + 1
}

#[derive(Clone, Copy, PartialEq)]
enum SplitState {
    Normal,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Split a SQL script on `;`, respecting string literals and `--` / `/* */`
/// comments. Good enough for feeding scripts into the batcher; it is not a
/// dialect-aware parser.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = SplitState::Normal;

    let mut chars = script.chars().peekable();
    while let Some(c) = chars.next() {
        match state {
            SplitState::Normal => match c {
                ';' => {
                    let stmt = current.trim();
                    if !stmt.is_empty() {
                        statements.push(stmt.to_string());
                    }
                    current.clear();
                }
                '\'' | '"' => {
                    state = SplitState::Quoted(c);
                    current.push(c);
                }
                '-' if chars.peek() == Some(&'-') => {
                    state = SplitState::LineComment;
                    current.push(c);
                }
                '/' if chars.peek() == Some(&'*') => {
                    state = SplitState::BlockComment;
                    current.push(c);
                    if let Some(star) = chars.next() {
                        current.push(star);
                    }
                }
                _ => current.push(c),
            },
            SplitState::Quoted(q) => {
                current.push(c);
                if c == q {
                    if chars.peek() == Some(&q) {
                        if let Some(escaped) = chars.next() {
                            current.push(escaped);
                        }
                    } else {
                        state = SplitState::Normal;
                    }
                }
            }
            SplitState::LineComment => {
                current.push(c);
                if c == '\n' {
                    state = SplitState::Normal;
                }
            }
            SplitState::BlockComment => {
                current.push(c);
                if c == '*' && chars.peek() == Some(&'/') {
                    if let Some(slash) = chars.next() {
                        current.push(slash);
                    }
                    state = SplitState::Normal;
                }
            }
        }
    }

    let stmt = current.trim();
    if !stmt.is_empty() {
        statements.push(stmt.to_string());
    }

    statements
}
