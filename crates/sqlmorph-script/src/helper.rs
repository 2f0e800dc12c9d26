//! Quoting, type rendering and literal primitives every dialect provides.

use std::sync::LazyLock;

use regex::Regex;
use sqlmorph_core::{Column, Dialect};

/// Dialect primitives the scripting algorithms are composed from.
pub trait ScriptHelper: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Quote one identifier, escaping embedded quote characters.
    fn quote_name(&self, name: &str) -> String;

    /// Qualified, quoted name; an empty schema yields the bare name.
    fn object_name(&self, schema: &str, name: &str) -> String {
        if schema.is_empty() {
            self.quote_name(name)
        } else {
            format!("{}.{}", self.quote_name(schema), self.quote_name(name))
        }
    }

    /// Full column type including length, precision or scale.
    fn render_type(&self, column: &Column) -> String;

    /// Batch separator line, for dialects whose client tools need one.
    fn batch_terminator(&self) -> Option<&'static str> {
        None
    }

    /// Zero value used to backfill a new NOT NULL column of `data_type`.
    fn default_literal(&self, data_type: &str) -> String;

    fn escape_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }
}

/// Broad type families used to pick zero literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeClass {
    Integer,
    Decimal,
    Float,
    Boolean,
    Text,
    Binary,
    Date,
    Time,
    DateTime,
    Uuid,
    Json,
    Other,
}

pub(crate) fn classify(data_type: &str) -> TypeClass {
    let base = data_type
        .split(['(', ' '])
        .next()
        .unwrap_or(data_type)
        .to_ascii_lowercase();
    match base.as_str() {
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "int2" | "int4"
        | "int8" | "serial" | "bigserial" | "year" => TypeClass::Integer,
        "decimal" | "numeric" | "money" | "smallmoney" => TypeClass::Decimal,
        "float" | "real" | "double" | "float4" | "float8" => TypeClass::Float,
        "bit" | "bool" | "boolean" => TypeClass::Boolean,
        "char" | "varchar" | "nchar" | "nvarchar" | "text" | "ntext" | "tinytext"
        | "mediumtext" | "longtext" | "bpchar" | "character" | "citext" | "xml" | "enum"
        | "set" | "name" => TypeClass::Text,
        "binary" | "varbinary" | "image" | "blob" | "tinyblob" | "mediumblob" | "longblob"
        | "bytea" => TypeClass::Binary,
        "date" => TypeClass::Date,
        "time" | "timetz" => TypeClass::Time,
        "datetime" | "datetime2" | "smalldatetime" | "datetimeoffset" | "timestamp"
        | "timestamptz" => TypeClass::DateTime,
        "uniqueidentifier" | "uuid" => TypeClass::Uuid,
        "json" | "jsonb" => TypeClass::Json,
        _ => TypeClass::Other,
    }
}

pub(crate) const ZERO_UUID: &str = "'00000000-0000-0000-0000-000000000000'";

/// Append a statement terminator unless the text already ends with one.
pub(crate) fn terminate(sql: &str) -> String {
    let sql = sql.trim_end();
    if sql.ends_with(';') {
        format!("{sql}\n")
    } else {
        format!("{sql};\n")
    }
}

/// Line-ending and trailing-whitespace normalisation for fingerprints.
pub fn normalize_definition(definition: &str) -> String {
    definition
        .replace("\r\n", "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

static CREATE_KEYWORD: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?is)^((?:\s|--[^\n]*\n|/\*.*?\*/)*)CREATE\s+(?:OR\s+(?:ALTER|REPLACE)\s+)?")
        .ok()
});

/// Rewrite the leading `CREATE [OR ALTER|OR REPLACE]` of a stored definition.
///
/// Leading comments are kept. Definitions that do not start with `CREATE`
/// are returned unchanged.
pub fn replace_create_keyword(definition: &str, replacement: &str) -> String {
    let Some(re) = CREATE_KEYWORD.as_ref() else {
        return definition.to_string();
    };
    re.replace(definition, |caps: &regex::Captures<'_>| {
        format!("{}{replacement} ", &caps[1])
    })
    .into_owned()
}

/// Wrap `expression` in parentheses unless one pair already encloses all of it.
pub(crate) fn parenthesized(expression: &str) -> String {
    let trimmed = expression.trim();
    let mut depth = 0usize;
    let mut enclosed = trimmed.starts_with('(');
    for (pos, ch) in trimmed.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && pos + 1 < trimmed.len() {
                    enclosed = false;
                }
            }
            _ => {}
        }
    }
    if enclosed && depth == 0 {
        trimmed.to_string()
    } else {
        format!("({trimmed})")
    }
}

/// Comma-separated quoted identifiers.
pub(crate) fn quoted_list<H: ScriptHelper + ?Sized>(helper: &H, names: &[String]) -> String {
    names
        .iter()
        .map(|name| helper.quote_name(name))
        .collect::<Vec<_>>()
        .join(", ")
}
