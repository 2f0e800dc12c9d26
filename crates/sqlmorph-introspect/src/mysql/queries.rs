//! MySQL and MariaDB catalog queries over `information_schema`.
//!
//! MySQL has no schemas inside a database, so every object is reported with an
//! empty schema; cross-database references keep the other database's name.

use sqlmorph_core::Dialect;

use crate::catalog::CatalogEnv;

pub const SERVER_VERSION: &str = "SELECT VERSION() AS version";

pub const DATABASE_LIST: &str = r#"
SELECT SCHEMA_NAME AS name
FROM information_schema.SCHEMATA
WHERE SCHEMA_NAME NOT IN ('mysql', 'information_schema', 'performance_schema', 'sys')
ORDER BY SCHEMA_NAME
"#;

const NUMERIC_TYPES: &str = "'tinyint', 'smallint', 'mediumint', 'int', 'integer', 'bigint', \
                             'decimal', 'numeric', 'float', 'double', 'real', 'bit', 'year'";

fn is_mariadb(env: &CatalogEnv) -> bool {
    env.dialect == Dialect::MariaDb
}

pub fn tables(env: &CatalogEnv) -> String {
    let collation_join = if is_mariadb(env) && env.version.at_least(10, 10) {
        "ccsa.FULL_COLLATION_NAME = t.TABLE_COLLATION"
    } else {
        "ccsa.COLLATION_NAME = t.TABLE_COLLATION"
    };
    format!(
        r#"
SELECT
  '' AS schema_name,
  t.TABLE_NAME AS table_name,
  t.ENGINE AS engine,
  ccsa.CHARACTER_SET_NAME AS charset_name,
  t.TABLE_COLLATION AS collation_name,
  NULLIF(t.TABLE_COMMENT, '') AS comment_text,
  t.AUTO_INCREMENT AS auto_increment
FROM information_schema.TABLES t
LEFT JOIN information_schema.COLLATION_CHARACTER_SET_APPLICABILITY ccsa
  ON {collation_join}
WHERE t.TABLE_TYPE = 'BASE TABLE'
  AND {database}
ORDER BY t.TABLE_NAME
"#,
        database = env.filter.database_equals("t.TABLE_SCHEMA"),
    )
}

/// MariaDB 10.2.7+ reports defaults as SQL expressions already; MySQL reports
/// the bare value, so string literals are quoted here.
fn default_expression(env: &CatalogEnv) -> String {
    if is_mariadb(env) && env.version >= sqlmorph_core::ServerVersion::new(10, 2, 7) {
        return "NULLIF(c.COLUMN_DEFAULT, 'NULL')".to_string();
    }
    format!(
        r#"CASE
    WHEN c.COLUMN_DEFAULT IS NULL THEN NULL
    WHEN UPPER(c.COLUMN_DEFAULT) LIKE 'CURRENT\_TIMESTAMP%' THEN c.COLUMN_DEFAULT
    WHEN c.EXTRA LIKE '%DEFAULT\_GENERATED%' THEN CONCAT('(', c.COLUMN_DEFAULT, ')')
    WHEN c.DATA_TYPE IN ({NUMERIC_TYPES}) THEN c.COLUMN_DEFAULT
    ELSE CONCAT('''', REPLACE(c.COLUMN_DEFAULT, '''', ''''''), '''')
  END"#
    )
}

pub fn columns(env: &CatalogEnv) -> String {
    let has_generation = if is_mariadb(env) {
        env.version.at_least(10, 2)
    } else {
        env.version.at_least(5, 7)
    };
    let generation = if has_generation {
        "NULLIF(c.GENERATION_EXPRESSION, '')"
    } else {
        "NULL"
    };
    format!(
        r#"
SELECT
  '' AS schema_name,
  c.TABLE_NAME AS table_name,
  c.COLUMN_NAME AS column_name,
  c.ORDINAL_POSITION AS ordinal_position,
  c.DATA_TYPE AS data_type,
  c.CHARACTER_MAXIMUM_LENGTH AS max_length,
  c.NUMERIC_PRECISION AS numeric_precision,
  c.NUMERIC_SCALE AS numeric_scale,
  (c.IS_NULLABLE = 'YES') AS is_nullable,
  {default} AS default_value,
  c.COLUMN_TYPE AS column_type,
  c.CHARACTER_SET_NAME AS charset_name,
  c.COLLATION_NAME AS collation_name,
  c.EXTRA AS extra,
  {generation} AS generation_expression,
  NULLIF(c.COLUMN_COMMENT, '') AS comment_text
FROM information_schema.COLUMNS c
JOIN information_schema.TABLES t
  ON t.TABLE_SCHEMA = c.TABLE_SCHEMA
 AND t.TABLE_NAME = c.TABLE_NAME
 AND t.TABLE_TYPE = 'BASE TABLE'
WHERE {database}
ORDER BY c.TABLE_NAME, c.ORDINAL_POSITION
"#,
        default = default_expression(env),
        database = env.filter.database_equals("c.TABLE_SCHEMA"),
    )
}

pub fn foreign_keys(env: &CatalogEnv) -> String {
    format!(
        r#"
SELECT
  '' AS schema_name,
  k.TABLE_NAME AS table_name,
  k.CONSTRAINT_NAME AS constraint_name,
  k.COLUMN_NAME AS column_name,
  k.ORDINAL_POSITION AS ordinal,
  CASE WHEN k.REFERENCED_TABLE_SCHEMA = k.TABLE_SCHEMA THEN '' ELSE k.REFERENCED_TABLE_SCHEMA END
    AS referenced_schema,
  k.REFERENCED_TABLE_NAME AS referenced_table,
  k.REFERENCED_COLUMN_NAME AS referenced_column,
  r.UPDATE_RULE AS update_rule,
  r.DELETE_RULE AS delete_rule
FROM information_schema.KEY_COLUMN_USAGE k
JOIN information_schema.REFERENTIAL_CONSTRAINTS r
  ON r.CONSTRAINT_SCHEMA = k.CONSTRAINT_SCHEMA
 AND r.CONSTRAINT_NAME = k.CONSTRAINT_NAME
 AND r.TABLE_NAME = k.TABLE_NAME
WHERE k.REFERENCED_TABLE_NAME IS NOT NULL
  AND {database}
ORDER BY k.TABLE_NAME, k.CONSTRAINT_NAME, k.ORDINAL_POSITION
"#,
        database = env.filter.database_equals("k.TABLE_SCHEMA"),
    )
}

pub fn indexes(env: &CatalogEnv) -> String {
    let expression = if !is_mariadb(env) && env.version >= sqlmorph_core::ServerVersion::new(8, 0, 13)
    {
        "s.EXPRESSION"
    } else {
        "NULL"
    };
    format!(
        r#"
SELECT
  '' AS schema_name,
  s.TABLE_NAME AS table_name,
  s.INDEX_NAME AS index_name,
  s.COLUMN_NAME AS column_name,
  s.SEQ_IN_INDEX AS ordinal,
  (s.COLLATION = 'D') AS is_descending,
  (s.NON_UNIQUE = 0) AS is_unique,
  (s.INDEX_NAME = 'PRIMARY') AS is_primary_key,
  s.INDEX_TYPE AS index_type,
  s.SUB_PART AS sub_part,
  {expression} AS index_definition
FROM information_schema.STATISTICS s
JOIN information_schema.TABLES t
  ON t.TABLE_SCHEMA = s.TABLE_SCHEMA
 AND t.TABLE_NAME = s.TABLE_NAME
 AND t.TABLE_TYPE = 'BASE TABLE'
WHERE {database}
ORDER BY s.TABLE_NAME, s.INDEX_NAME, s.SEQ_IN_INDEX
"#,
        database = env.filter.database_equals("s.TABLE_SCHEMA"),
    )
}

pub fn triggers(env: &CatalogEnv) -> String {
    format!(
        r#"
SELECT
  '' AS schema_name,
  tr.TRIGGER_NAME AS trigger_name,
  '' AS table_schema,
  tr.EVENT_OBJECT_TABLE AS table_name,
  CONCAT(
    'CREATE TRIGGER `', REPLACE(tr.TRIGGER_NAME, '`', '``'), '` ',
    tr.ACTION_TIMING, ' ', tr.EVENT_MANIPULATION,
    ' ON `', REPLACE(tr.EVENT_OBJECT_TABLE, '`', '``'), '` FOR EACH ROW ',
    tr.ACTION_STATEMENT
  ) AS definition
FROM information_schema.TRIGGERS tr
WHERE {database}
ORDER BY tr.EVENT_OBJECT_TABLE, tr.TRIGGER_NAME
"#,
        database = env.filter.database_equals("tr.TRIGGER_SCHEMA"),
    )
}

pub fn views(env: &CatalogEnv) -> String {
    format!(
        r#"
SELECT
  '' AS schema_name,
  v.TABLE_NAME AS view_name,
  CONCAT(
    'CREATE VIEW `', REPLACE(v.TABLE_NAME, '`', '``'), '` AS ',
    REPLACE(v.VIEW_DEFINITION, CONCAT('`', v.TABLE_SCHEMA, '`.'), '')
  ) AS definition
FROM information_schema.VIEWS v
WHERE {database}
ORDER BY v.TABLE_NAME
"#,
        database = env.filter.database_equals("v.TABLE_SCHEMA"),
    )
}

/// Rebuild a CREATE header from `PARAMETERS`; `ROUTINE_DEFINITION` is only the body.
fn routines(env: &CatalogEnv, routine_type: &str) -> String {
    let (parameter, tail) = if routine_type == "FUNCTION" {
        (
            "CONCAT('`', p.PARAMETER_NAME, '` ', p.DTD_IDENTIFIER)",
            "') RETURNS ', r.DTD_IDENTIFIER,",
        )
    } else {
        (
            "CONCAT(p.PARAMETER_MODE, ' `', p.PARAMETER_NAME, '` ', p.DTD_IDENTIFIER)",
            "')',",
        )
    };
    format!(
        r#"
SELECT
  '' AS schema_name,
  r.ROUTINE_NAME AS routine_name,
  CONCAT(
    'CREATE {routine_type} `', REPLACE(r.ROUTINE_NAME, '`', '``'), '`(',
    COALESCE((
      SELECT GROUP_CONCAT({parameter} ORDER BY p.ORDINAL_POSITION SEPARATOR ', ')
      FROM information_schema.PARAMETERS p
      WHERE p.SPECIFIC_SCHEMA = r.ROUTINE_SCHEMA
        AND p.SPECIFIC_NAME = r.SPECIFIC_NAME
        AND p.ORDINAL_POSITION > 0
    ), ''),
    {tail}
    CASE WHEN r.IS_DETERMINISTIC = 'YES' THEN ' DETERMINISTIC' ELSE '' END,
    CHAR(10),
    r.ROUTINE_DEFINITION
  ) AS definition
FROM information_schema.ROUTINES r
WHERE r.ROUTINE_TYPE = '{routine_type}'
  AND {database}
ORDER BY r.ROUTINE_NAME
"#,
        database = env.filter.database_equals("r.ROUTINE_SCHEMA"),
    )
}

pub fn functions(env: &CatalogEnv) -> String {
    routines(env, "FUNCTION")
}

pub fn stored_procedures(env: &CatalogEnv) -> String {
    routines(env, "PROCEDURE")
}

/// Accounts with several hosts collapse into one user; `login` lists the hosts.
pub const USERS: &str = r#"
SELECT
  u.User AS user_name,
  GROUP_CONCAT(u.Host ORDER BY u.Host SEPARATOR ',') AS login,
  1 AS can_login
FROM mysql.user u
WHERE u.User <> ''
GROUP BY u.User
ORDER BY u.User
"#;
