//! SQL Server catalog queries over the `sys` views of the connected database.

use crate::catalog::CatalogEnv;

pub const SERVER_VERSION: &str =
    "SELECT CAST(SERVERPROPERTY('ProductVersion') AS nvarchar(128)) AS version";

pub const DATABASE_LIST: &str = r#"
SELECT name
FROM sys.databases
WHERE database_id > 4 AND state = 0
ORDER BY name
"#;

/// Renders a column type the way `CREATE TYPE ... AS TABLE` expects it.
const COLUMN_TYPE_SQL: &str = r#"TYPE_NAME(c.user_type_id) +
      CASE
        WHEN TYPE_NAME(c.system_type_id) IN ('varchar', 'char', 'varbinary', 'binary')
          THEN '(' + CASE WHEN c.max_length = -1 THEN 'max' ELSE CAST(c.max_length AS varchar(10)) END + ')'
        WHEN TYPE_NAME(c.system_type_id) IN ('nvarchar', 'nchar')
          THEN '(' + CASE WHEN c.max_length = -1 THEN 'max' ELSE CAST(c.max_length / 2 AS varchar(10)) END + ')'
        WHEN TYPE_NAME(c.system_type_id) IN ('decimal', 'numeric')
          THEN '(' + CAST(c.precision AS varchar(5)) + ', ' + CAST(c.scale AS varchar(5)) + ')'
        ELSE ''
      END +
      CASE WHEN c.is_nullable = 1 THEN ' NULL' ELSE ' NOT NULL' END"#;

pub fn tables(env: &CatalogEnv) -> String {
    if env.version.at_least(13, 0) {
        r#"
SELECT
  s.name AS schema_name,
  t.name AS table_name,
  hs.name AS history_schema,
  ht.name AS history_table,
  ps.name AS period_start,
  pe.name AS period_end,
  CAST(CASE WHEN t.temporal_type = 1 THEN 1 ELSE 0 END AS bit) AS is_history
FROM sys.tables t
JOIN sys.schemas s ON s.schema_id = t.schema_id
LEFT JOIN sys.tables ht ON ht.object_id = t.history_table_id
LEFT JOIN sys.schemas hs ON hs.schema_id = ht.schema_id
LEFT JOIN sys.periods p ON p.object_id = t.object_id
LEFT JOIN sys.columns ps ON ps.object_id = p.object_id AND ps.column_id = p.start_column_id
LEFT JOIN sys.columns pe ON pe.object_id = p.object_id AND pe.column_id = p.end_column_id
WHERE t.is_ms_shipped = 0
ORDER BY s.name, t.name
"#
        .to_string()
    } else {
        r#"
SELECT
  s.name AS schema_name,
  t.name AS table_name
FROM sys.tables t
JOIN sys.schemas s ON s.schema_id = t.schema_id
WHERE t.is_ms_shipped = 0
ORDER BY s.name, t.name
"#
        .to_string()
    }
}

pub fn columns(env: &CatalogEnv) -> String {
    let temporal = if env.version.at_least(13, 0) {
        "CASE c.generated_always_type WHEN 1 THEN 'ROW START' WHEN 2 THEN 'ROW END' END AS generated_always,\n  \
         c.is_hidden AS is_hidden,"
    } else {
        ""
    };
    format!(
        r#"
SELECT
  s.name AS schema_name,
  t.name AS table_name,
  c.name AS column_name,
  c.column_id AS ordinal_position,
  ty.name AS data_type,
  CASE
    WHEN TYPE_NAME(c.system_type_id) NOT IN ('varchar', 'char', 'varbinary', 'binary', 'nvarchar', 'nchar') THEN NULL
    WHEN c.max_length = -1 THEN -1
    WHEN TYPE_NAME(c.system_type_id) IN ('nvarchar', 'nchar') THEN c.max_length / 2
    ELSE c.max_length
  END AS max_length,
  CASE WHEN TYPE_NAME(c.system_type_id) IN ('decimal', 'numeric') THEN CAST(c.precision AS int) END
    AS numeric_precision,
  CASE WHEN TYPE_NAME(c.system_type_id) IN ('decimal', 'numeric', 'datetime2', 'time', 'datetimeoffset')
    THEN CAST(c.scale AS int) END AS numeric_scale,
  c.is_nullable AS is_nullable,
  dc.definition AS default_value,
  dc.name AS default_constraint,
  CAST(ISNULL(dc.is_system_named, 0) AS bit) AS default_is_system_named,
  ty.is_user_defined AS is_user_defined,
  tys.name AS type_schema,
  c.is_identity AS is_identity,
  CAST(ic.seed_value AS bigint) AS identity_seed,
  CAST(ic.increment_value AS bigint) AS identity_increment,
  cc.definition AS computed,
  CAST(ISNULL(cc.is_persisted, 0) AS bit) AS is_persisted,
  NULLIF(c.collation_name, CAST(DATABASEPROPERTYEX(DB_NAME(), 'Collation') AS nvarchar(128)))
    AS collation_name,
  {temporal}
  c.is_rowguidcol AS is_rowguidcol
FROM sys.columns c
JOIN sys.tables t ON t.object_id = c.object_id
JOIN sys.schemas s ON s.schema_id = t.schema_id
JOIN sys.types ty ON ty.user_type_id = c.user_type_id
JOIN sys.schemas tys ON tys.schema_id = ty.schema_id
LEFT JOIN sys.default_constraints dc
  ON dc.parent_object_id = c.object_id AND dc.parent_column_id = c.column_id
LEFT JOIN sys.identity_columns ic ON ic.object_id = c.object_id AND ic.column_id = c.column_id
LEFT JOIN sys.computed_columns cc ON cc.object_id = c.object_id AND cc.column_id = c.column_id
WHERE t.is_ms_shipped = 0
ORDER BY s.name, t.name, c.column_id
"#
    )
}

pub fn foreign_keys(_env: &CatalogEnv) -> String {
    r#"
SELECT
  s.name AS schema_name,
  t.name AS table_name,
  fk.name AS constraint_name,
  pc.name AS column_name,
  fkc.constraint_column_id AS ordinal,
  rs.name AS referenced_schema,
  rt.name AS referenced_table,
  rc.name AS referenced_column,
  fk.update_referential_action_desc AS update_rule,
  fk.delete_referential_action_desc AS delete_rule,
  fk.is_disabled AS is_disabled
FROM sys.foreign_keys fk
JOIN sys.foreign_key_columns fkc ON fkc.constraint_object_id = fk.object_id
JOIN sys.tables t ON t.object_id = fk.parent_object_id
JOIN sys.schemas s ON s.schema_id = t.schema_id
JOIN sys.columns pc ON pc.object_id = fkc.parent_object_id AND pc.column_id = fkc.parent_column_id
JOIN sys.tables rt ON rt.object_id = fkc.referenced_object_id
JOIN sys.schemas rs ON rs.schema_id = rt.schema_id
JOIN sys.columns rc ON rc.object_id = fkc.referenced_object_id AND rc.column_id = fkc.referenced_column_id
ORDER BY s.name, t.name, fk.name, fkc.constraint_column_id
"#
    .to_string()
}

/// Included columns sort after key columns.
pub fn indexes(_env: &CatalogEnv) -> String {
    r#"
SELECT
  s.name AS schema_name,
  o.name AS table_name,
  i.name AS index_name,
  c.name AS column_name,
  CASE WHEN ic.is_included_column = 1 THEN 1000 + ic.index_column_id ELSE ic.key_ordinal END AS ordinal,
  ic.is_descending_key AS is_descending,
  ic.is_included_column AS is_included,
  i.is_unique AS is_unique,
  i.is_primary_key AS is_primary_key,
  CAST(CASE WHEN i.type IN (1, 5) THEN 1 ELSE 0 END AS bit) AS is_clustered,
  CAST(CASE WHEN i.type IN (5, 6) THEN 1 ELSE 0 END AS bit) AS is_columnstore,
  i.filter_definition AS filter_definition
FROM sys.indexes i
JOIN sys.objects o ON o.object_id = i.object_id AND o.type IN ('U', 'V')
JOIN sys.schemas s ON s.schema_id = o.schema_id
JOIN sys.index_columns ic ON ic.object_id = i.object_id AND ic.index_id = i.index_id
JOIN sys.columns c ON c.object_id = ic.object_id AND c.column_id = ic.column_id
WHERE i.type > 0
  AND i.is_hypothetical = 0
  AND i.is_unique_constraint = 0
  AND o.is_ms_shipped = 0
ORDER BY s.name, o.name, i.name, ordinal
"#
    .to_string()
}

pub fn constraints(_env: &CatalogEnv) -> String {
    r#"
SELECT
  s.name AS schema_name,
  t.name AS table_name,
  ck.name AS constraint_name,
  'CHECK' AS constraint_type,
  CAST(NULL AS sysname) AS column_name,
  0 AS ordinal,
  ck.definition AS definition
FROM sys.check_constraints ck
JOIN sys.tables t ON t.object_id = ck.parent_object_id
JOIN sys.schemas s ON s.schema_id = t.schema_id
UNION ALL
SELECT
  s.name,
  t.name,
  kc.name,
  'UNIQUE',
  c.name,
  CAST(ic.key_ordinal AS int),
  NULL
FROM sys.key_constraints kc
JOIN sys.tables t ON t.object_id = kc.parent_object_id
JOIN sys.schemas s ON s.schema_id = t.schema_id
JOIN sys.index_columns ic ON ic.object_id = kc.parent_object_id AND ic.index_id = kc.unique_index_id
JOIN sys.columns c ON c.object_id = ic.object_id AND c.column_id = ic.column_id
WHERE kc.type = 'UQ'
ORDER BY 1, 2, 3, 6
"#
    .to_string()
}

pub fn triggers(_env: &CatalogEnv) -> String {
    r#"
SELECT
  s.name AS schema_name,
  tr.name AS trigger_name,
  s.name AS table_schema,
  o.name AS table_name,
  m.definition AS definition,
  tr.is_disabled AS is_disabled
FROM sys.triggers tr
JOIN sys.objects o ON o.object_id = tr.parent_id AND o.type IN ('U', 'V')
JOIN sys.schemas s ON s.schema_id = o.schema_id
JOIN sys.sql_modules m ON m.object_id = tr.object_id
WHERE tr.is_ms_shipped = 0
ORDER BY s.name, o.name, tr.name
"#
    .to_string()
}

pub fn views(_env: &CatalogEnv) -> String {
    r#"
SELECT
  s.name AS schema_name,
  v.name AS view_name,
  m.definition AS definition
FROM sys.views v
JOIN sys.schemas s ON s.schema_id = v.schema_id
JOIN sys.sql_modules m ON m.object_id = v.object_id
WHERE v.is_ms_shipped = 0
ORDER BY s.name, v.name
"#
    .to_string()
}

fn modules(types: &str) -> String {
    format!(
        r#"
SELECT
  s.name AS schema_name,
  o.name AS routine_name,
  m.definition AS definition
FROM sys.objects o
JOIN sys.schemas s ON s.schema_id = o.schema_id
JOIN sys.sql_modules m ON m.object_id = o.object_id
WHERE o.type IN ({types})
  AND o.is_ms_shipped = 0
ORDER BY s.name, o.name
"#
    )
}

pub fn functions(_env: &CatalogEnv) -> String {
    modules("'FN', 'IF', 'TF'")
}

pub fn stored_procedures(_env: &CatalogEnv) -> String {
    modules("'P'")
}

pub fn data_types(env: &CatalogEnv) -> String {
    let table_definition = if env.version.at_least(14, 0) {
        format!(
            r#"(
    SELECT STRING_AGG(CAST(QUOTENAME(c.name) + ' ' + {COLUMN_TYPE_SQL} AS nvarchar(max)), ', ')
      WITHIN GROUP (ORDER BY c.column_id)
    FROM sys.columns c
    WHERE c.object_id = tt.type_table_object_id
  )"#
        )
    } else {
        format!(
            r#"STUFF((
    SELECT ', ' + QUOTENAME(c.name) + ' ' + {COLUMN_TYPE_SQL}
    FROM sys.columns c
    WHERE c.object_id = tt.type_table_object_id
    ORDER BY c.column_id
    FOR XML PATH(''), TYPE
  ).value('.', 'nvarchar(max)'), 1, 2, '')"#
        )
    };
    format!(
        r#"
SELECT
  s.name AS schema_name,
  t.name AS type_name,
  t.user_type_id AS type_id,
  t.is_user_defined AS is_user_defined,
  CAST(t.system_type_id AS int) AS system_type_id,
  CASE
    WHEN t.is_table_type = 1 THEN 'table'
    WHEN t.is_user_defined = 1 THEN 'alias'
    ELSE 'base'
  END AS category,
  CASE
    WHEN t.max_length = -1 THEN -1
    WHEN TYPE_NAME(t.system_type_id) IN ('nvarchar', 'nchar') THEN t.max_length / 2
    ELSE t.max_length
  END AS max_length,
  CAST(t.precision AS int) AS numeric_precision,
  CAST(t.scale AS int) AS numeric_scale,
  t.is_nullable AS is_nullable,
  CASE WHEN t.is_table_type = 1 THEN {table_definition} END AS definition
FROM sys.types t
JOIN sys.schemas s ON s.schema_id = t.schema_id
LEFT JOIN sys.table_types tt ON tt.user_type_id = t.user_type_id
ORDER BY s.name, t.name
"#
    )
}

pub fn sequences(_env: &CatalogEnv) -> String {
    r#"
SELECT
  s.name AS schema_name,
  sq.name AS sequence_name,
  TYPE_NAME(sq.user_type_id) AS data_type,
  TRY_CAST(sq.start_value AS bigint) AS start_value,
  TRY_CAST(sq.increment AS bigint) AS increment_by,
  TRY_CAST(sq.minimum_value AS bigint) AS min_value,
  TRY_CAST(sq.maximum_value AS bigint) AS max_value,
  sq.is_cycling AS is_cycling,
  CASE WHEN sq.is_cached = 1 THEN sq.cache_size END AS cache_size,
  TRY_CAST(sq.current_value AS bigint) AS current_value
FROM sys.sequences sq
JOIN sys.schemas s ON s.schema_id = sq.schema_id
ORDER BY s.name, sq.name
"#
    .to_string()
}

pub fn schemas(_env: &CatalogEnv) -> String {
    r#"
SELECT
  s.name AS schema_name,
  p.name AS owner
FROM sys.schemas s
LEFT JOIN sys.database_principals p ON p.principal_id = s.principal_id
WHERE s.schema_id < 16384
ORDER BY s.name
"#
    .to_string()
}

pub const USERS: &str = r#"
SELECT
  dp.name AS user_name,
  sp.name AS login,
  dp.default_schema_name AS default_schema,
  CAST(CASE WHEN sp.sid IS NULL THEN 0 ELSE 1 END AS bit) AS can_login
FROM sys.database_principals dp
LEFT JOIN sys.server_principals sp ON sp.sid = dp.sid
WHERE dp.type IN ('S', 'U', 'G', 'E', 'X')
  AND dp.principal_id > 4
  AND dp.name NOT LIKE '##%'
ORDER BY dp.name
"#;
