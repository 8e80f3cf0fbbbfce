use crate::Operation;

/// A SQL statement passed through to a database backend.
///
/// The statement text is opaque to the client; only its leading keyword and
/// target table are inspected, for read-only gating and diagnostics.
///
/// # Example
/// ```
/// use shardgate::{Operation, Query};
///
/// let q = Query::new("select * from `users` where id = 1");
/// assert_eq!(q.name(), "SELECT");
/// assert!(q.is_read_only());
/// assert_eq!(q.describe().as_deref(), Some("SELECT users"));
///
/// assert!(!Query::new("SELECT * FROM users FOR UPDATE").is_read_only());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    sql: String,
    keyword: String,
}

impl Query {
    pub fn new(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let keyword = match sql.split_whitespace().next() {
            Some(word) => word.to_ascii_uppercase(),
            None => String::from("QUERY"),
        };
        Self { sql, keyword }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The table the statement acts on, if it can be found.
    pub fn table(&self) -> Option<&str> {
        let mut words = self.sql.split_whitespace().skip(1);
        let marker = match self.keyword.as_str() {
            "SELECT" | "DELETE" => "FROM",
            "INSERT" | "REPLACE" => "INTO",
            "UPDATE" => return words.next().map(clean_table).filter(|t| !t.is_empty()),
            _ => return None,
        };
        words
            .skip_while(|w| !w.eq_ignore_ascii_case(marker))
            .nth(1)
            .map(clean_table)
            .filter(|t| !t.is_empty())
    }
}

fn clean_table(word: &str) -> &str {
    let word = word.split('(').next().unwrap_or(word);
    word.trim_matches(|c| matches!(c, '`' | '"' | ';' | ','))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

impl Operation for Query {
    fn name(&self) -> &str {
        &self.keyword
    }

    fn is_read_only(&self) -> bool {
        match self.keyword.as_str() {
            "SELECT" => !contains_ignore_case(&self.sql, "FOR UPDATE"),
            "SHOW" => true,
            _ => false,
        }
    }

    fn describe(&self) -> Option<String> {
        self.table().map(|table| format!("{} {table}", self.keyword))
    }
}
