//! PostgreSQL catalog queries.
//!
//! Every column is cast to `text`, `bool`, `int4`, `int8` or an array of those
//! so row conversion only ever sees a handful of types.

use crate::catalog::CatalogEnv;

pub const SERVER_VERSION: &str = "select current_setting('server_version') as version";

pub const DATABASE_LIST: &str = r#"
select datname::text as name
from pg_database
where datallowconn and not datistemplate
order by datname
"#;

pub fn tables(env: &CatalogEnv) -> String {
    let partitioned = env.version.at_least(10, 0);
    let partition_key = if partitioned {
        "case when c.relkind = 'p' then pg_get_partkeydef(c.oid) end"
    } else {
        "null::text"
    };
    let relkinds = if partitioned { "'r', 'p'" } else { "'r'" };
    format!(
        r#"
select
  n.nspname::text as schema_name,
  c.relname::text as table_name,
  obj_description(c.oid, 'pg_class') as comment_text,
  ts.spcname::text as tablespace,
  (c.relpersistence = 'u') as is_unlogged,
  {partition_key} as partition_key,
  array(
    select pn.nspname::text
    from pg_inherits i
    join pg_class p on p.oid = i.inhparent
    join pg_namespace pn on pn.oid = p.relnamespace
    where i.inhrelid = c.oid
    order by i.inhseqno
  ) as inherit_schemas,
  array(
    select p.relname::text
    from pg_inherits i
    join pg_class p on p.oid = i.inhparent
    where i.inhrelid = c.oid
    order by i.inhseqno
  ) as inherit_names
from pg_class c
join pg_namespace n on n.oid = c.relnamespace
left join pg_tablespace ts on ts.oid = c.reltablespace
where c.relkind in ({relkinds})
  and {schema_filter}
order by n.nspname, c.relname
"#,
        schema_filter = env.filter.user_schema("n.nspname"),
    )
}

pub fn columns(env: &CatalogEnv) -> String {
    let identity = env.version.at_least(10, 0);
    let generated = env.version.at_least(12, 0);

    let identity_columns = if identity {
        "nullif(a.attidentity::text, '') as identity_generation,\n  \
         seq.seqstart::int8 as identity_seed,\n  \
         seq.seqincrement::int8 as identity_increment,"
    } else {
        "null::text as identity_generation,"
    };
    let identity_join = if identity {
        "left join pg_depend dep on dep.refobjid = c.oid and dep.refobjsubid = a.attnum \
         and dep.deptype = 'i' and dep.classid = 'pg_class'::regclass and a.attidentity <> ''\n\
         left join pg_sequence seq on seq.seqrelid = dep.objid"
    } else {
        ""
    };
    let (default_expr, generation_expr) = if generated {
        (
            "case when a.attgenerated = '' then pg_get_expr(d.adbin, d.adrelid) end",
            "case when a.attgenerated <> '' then pg_get_expr(d.adbin, d.adrelid) end",
        )
    } else {
        ("pg_get_expr(d.adbin, d.adrelid)", "null::text")
    };

    format!(
        r#"
select
  n.nspname::text as schema_name,
  c.relname::text as table_name,
  a.attname::text as column_name,
  a.attnum::int4 as ordinal_position,
  t.typname::text as data_type,
  format_type(a.atttypid, a.atttypmod) as formatted_type,
  case
    when t.typname in ('varchar', 'bpchar') and a.atttypmod > 0 then (a.atttypmod - 4)::int8
  end as max_length,
  case
    when t.typname = 'numeric' and a.atttypmod > 0 then (((a.atttypmod - 4) >> 16) & 65535)::int8
  end as numeric_precision,
  case
    when t.typname = 'numeric' and a.atttypmod > 0 then ((a.atttypmod - 4) & 65535)::int8
  end as numeric_scale,
  (not a.attnotnull) as is_nullable,
  {default_expr} as default_value,
  (tn.nspname not in ('pg_catalog', 'information_schema')) as is_user_defined,
  tn.nspname::text as type_schema,
  {identity_columns}
  {generation_expr} as generation_expression,
  co.collname::text as collation_name,
  col_description(c.oid, a.attnum) as comment_text
from pg_attribute a
join pg_class c on c.oid = a.attrelid
join pg_namespace n on n.oid = c.relnamespace
join pg_type t on t.oid = a.atttypid
join pg_namespace tn on tn.oid = t.typnamespace
left join pg_attrdef d on d.adrelid = a.attrelid and d.adnum = a.attnum
left join pg_collation co on co.oid = a.attcollation and a.attcollation <> t.typcollation
{identity_join}
where c.relkind in ('r', 'p')
  and a.attnum > 0
  and not a.attisdropped
  and {schema_filter}
order by n.nspname, c.relname, a.attnum
"#,
        schema_filter = env.filter.user_schema("n.nspname"),
    )
}

pub fn foreign_keys(env: &CatalogEnv) -> String {
    format!(
        r#"
select
  n.nspname::text as schema_name,
  c.relname::text as table_name,
  con.conname::text as constraint_name,
  a.attname::text as column_name,
  k.ord::int4 as ordinal,
  rn.nspname::text as referenced_schema,
  rc.relname::text as referenced_table,
  ra.attname::text as referenced_column,
  con.confupdtype::text as update_rule,
  con.confdeltype::text as delete_rule,
  con.condeferrable as is_deferrable,
  con.condeferred as initially_deferred
from pg_constraint con
join pg_class c on c.oid = con.conrelid
join pg_namespace n on n.oid = c.relnamespace
join pg_class rc on rc.oid = con.confrelid
join pg_namespace rn on rn.oid = rc.relnamespace
cross join lateral unnest(con.conkey, con.confkey) with ordinality as k(attnum, refnum, ord)
join pg_attribute a on a.attrelid = con.conrelid and a.attnum = k.attnum
join pg_attribute ra on ra.attrelid = con.confrelid and ra.attnum = k.refnum
where con.contype = 'f'
  and {schema_filter}
order by n.nspname, c.relname, con.conname, k.ord
"#,
        schema_filter = env.filter.user_schema("n.nspname"),
    )
}

pub fn indexes(env: &CatalogEnv) -> String {
    let included = if env.version.at_least(11, 0) {
        "(k.ord > ix.indnkeyatts)"
    } else {
        "false"
    };
    format!(
        r#"
select
  n.nspname::text as schema_name,
  t.relname::text as table_name,
  i.relname::text as index_name,
  a.attname::text as column_name,
  k.ord::int4 as ordinal,
  {included} as is_included,
  ((ix.indoption[k.ord::int4 - 1] & 1) = 1) as is_descending,
  ix.indisunique as is_unique,
  ix.indisprimary as is_primary_key,
  am.amname::text as index_method,
  pg_get_expr(ix.indpred, ix.indrelid) as predicate,
  pg_get_indexdef(ix.indexrelid) as index_definition
from pg_index ix
join pg_class i on i.oid = ix.indexrelid
join pg_class t on t.oid = ix.indrelid
join pg_namespace n on n.oid = t.relnamespace
join pg_am am on am.oid = i.relam
cross join lateral unnest(ix.indkey) with ordinality as k(attnum, ord)
left join pg_attribute a on a.attrelid = t.oid and a.attnum = k.attnum and k.attnum > 0
where t.relkind in ('r', 'p', 'm')
  and not exists (
    select 1 from pg_constraint con
    where con.conindid = ix.indexrelid and con.contype = 'u'
  )
  and {schema_filter}
order by n.nspname, t.relname, i.relname, k.ord
"#,
        schema_filter = env.filter.user_schema("n.nspname"),
    )
}

pub fn constraints(env: &CatalogEnv) -> String {
    format!(
        r#"
select
  n.nspname::text as schema_name,
  c.relname::text as table_name,
  con.conname::text as constraint_name,
  case con.contype when 'u' then 'UNIQUE' else 'CHECK' end as constraint_type,
  a.attname::text as column_name,
  coalesce(k.ord, 0)::int4 as ordinal,
  case when con.contype = 'c' then pg_get_expr(con.conbin, con.conrelid) end as definition,
  con.condeferrable as is_deferrable,
  con.condeferred as initially_deferred
from pg_constraint con
join pg_class c on c.oid = con.conrelid
join pg_namespace n on n.oid = c.relnamespace
left join lateral unnest(con.conkey) with ordinality as k(attnum, ord) on con.contype = 'u'
left join pg_attribute a on a.attrelid = c.oid and a.attnum = k.attnum
where con.contype in ('c', 'u')
  and c.relkind in ('r', 'p')
  and {schema_filter}
order by n.nspname, c.relname, con.conname, k.ord
"#,
        schema_filter = env.filter.user_schema("n.nspname"),
    )
}

pub fn triggers(env: &CatalogEnv) -> String {
    format!(
        r#"
select
  n.nspname::text as schema_name,
  tg.tgname::text as trigger_name,
  n.nspname::text as table_schema,
  c.relname::text as table_name,
  pg_get_triggerdef(tg.oid, true) as definition,
  (tg.tgenabled = 'D') as is_disabled
from pg_trigger tg
join pg_class c on c.oid = tg.tgrelid
join pg_namespace n on n.oid = c.relnamespace
where not tg.tgisinternal
  and {schema_filter}
order by n.nspname, c.relname, tg.tgname
"#,
        schema_filter = env.filter.user_schema("n.nspname"),
    )
}

pub fn views(env: &CatalogEnv) -> String {
    format!(
        r#"
select
  n.nspname::text as schema_name,
  c.relname::text as view_name,
  'CREATE ' || case when c.relkind = 'm' then 'MATERIALIZED ' else '' end || 'VIEW '
    || quote_ident(n.nspname) || '.' || quote_ident(c.relname) || ' AS' || chr(10)
    || pg_get_viewdef(c.oid, true) as definition,
  (c.relkind = 'm') as is_materialized
from pg_class c
join pg_namespace n on n.oid = c.relnamespace
where c.relkind in ('v', 'm')
  and {schema_filter}
order by n.nspname, c.relname
"#,
        schema_filter = env.filter.user_schema("n.nspname"),
    )
}

pub fn functions(env: &CatalogEnv) -> String {
    let plain_function = if env.version.at_least(11, 0) {
        "p.prokind = 'f'"
    } else {
        "not p.proisagg and not p.proiswindow"
    };
    format!(
        r#"
select
  n.nspname::text as schema_name,
  p.proname::text as routine_name,
  pg_get_functiondef(p.oid) as definition,
  coalesce(p.proargnames, array[]::text[]) as argument_names,
  coalesce(p.proargmodes::text[], array[]::text[]) as argument_modes,
  array(
    select format_type(arg.t, null)
    from unnest(coalesce(p.proallargtypes, p.proargtypes::oid[])) with ordinality as arg(t, ord)
    order by arg.ord
  ) as argument_types,
  format_type(p.prorettype, null) as return_type,
  l.lanname::text as routine_language,
  false as is_aggregate
from pg_proc p
join pg_namespace n on n.oid = p.pronamespace
join pg_language l on l.oid = p.prolang
where {plain_function}
  and not exists (
    select 1 from pg_depend d
    where d.classid = 'pg_proc'::regclass and d.objid = p.oid and d.deptype = 'e'
  )
  and {schema_filter}
order by n.nspname, p.proname, p.oid
"#,
        schema_filter = env.filter.user_schema("n.nspname"),
    )
}

pub fn data_types(_env: &CatalogEnv) -> String {
    r#"
select
  n.nspname::text as schema_name,
  t.typname::text as type_name,
  t.oid::int8 as type_id,
  (n.nspname not in ('pg_catalog', 'information_schema') and n.nspname not like 'pg\_%') as is_user_defined,
  case t.typtype
    when 'e' then 'enum'
    when 'c' then 'composite'
    when 'r' then 'range'
    when 'd' then 'domain'
    else 'base'
  end as category,
  array(
    select e.enumlabel::text from pg_enum e
    where e.enumtypid = t.oid
    order by e.enumsortorder
  ) as labels,
  array(
    select a.attname::text from pg_attribute a
    where a.attrelid = t.typrelid and a.attnum > 0 and not a.attisdropped
    order by a.attnum
  ) as attribute_names,
  array(
    select a.atttypid::int8 from pg_attribute a
    where a.attrelid = t.typrelid and a.attnum > 0 and not a.attisdropped
    order by a.attnum
  ) as attribute_type_ids,
  array(
    select format_type(a.atttypid, a.atttypmod) from pg_attribute a
    where a.attrelid = t.typrelid and a.attnum > 0 and not a.attisdropped
    order by a.attnum
  ) as attribute_types,
  r.rngsubtype::int8 as sub_type_id,
  format_type(r.rngsubtype, null) as sub_type,
  nullif(r.rngcanonical::text, '-') as canonical,
  nullif(r.rngsubdiff::text, '-') as sub_type_diff,
  case when t.typtype = 'd' then t.typbasetype::int8 end as base_type_id,
  case when t.typtype = 'd' then format_type(t.typbasetype, t.typtypmod) end as base_type,
  (
    select string_agg(pg_get_constraintdef(con.oid), ' ' order by con.conname)
    from pg_constraint con
    where con.contypid = t.oid
  ) as constraint_def,
  t.typnotnull as not_null,
  t.typdefault as default_value
from pg_type t
join pg_namespace n on n.oid = t.typnamespace
left join pg_range r on r.rngtypid = t.oid
where t.typtype in ('b', 'e', 'c', 'r', 'd')
  and t.typcategory <> 'A'
  and (t.typrelid = 0 or exists (
    select 1 from pg_class c where c.oid = t.typrelid and c.relkind = 'c'
  ))
order by n.nspname, t.typname
"#
    .to_string()
}

pub fn sequences(env: &CatalogEnv) -> String {
    if env.version.at_least(10, 0) {
        format!(
            r#"
select
  s.schemaname::text as schema_name,
  s.sequencename::text as sequence_name,
  s.data_type::text as data_type,
  s.start_value::int8 as start_value,
  s.increment_by::int8 as increment_by,
  s.min_value::int8 as min_value,
  s.max_value::int8 as max_value,
  s.cycle as is_cycling,
  s.cache_size::int8 as cache_size,
  s.last_value::int8 as current_value
from pg_sequences s
where {schema_filter}
  and not exists (
    select 1
    from pg_class c
    join pg_namespace cn on cn.oid = c.relnamespace
    join pg_depend d on d.objid = c.oid and d.deptype = 'i'
    where cn.nspname = s.schemaname and c.relname = s.sequencename
  )
order by s.schemaname, s.sequencename
"#,
            schema_filter = env.filter.user_schema("s.schemaname"),
        )
    } else {
        format!(
            r#"
select
  s.sequence_schema::text as schema_name,
  s.sequence_name::text as sequence_name,
  s.data_type::text as data_type,
  s.start_value::int8 as start_value,
  s.increment::int8 as increment_by,
  s.minimum_value::int8 as min_value,
  s.maximum_value::int8 as max_value,
  (s.cycle_option = 'YES') as is_cycling
from information_schema.sequences s
where {schema_filter}
order by s.sequence_schema, s.sequence_name
"#,
            schema_filter = env.filter.user_schema("s.sequence_schema"),
        )
    }
}

pub fn schemas(env: &CatalogEnv) -> String {
    format!(
        r#"
select
  n.nspname::text as schema_name,
  pg_get_userbyid(n.nspowner)::text as owner
from pg_namespace n
where {schema_filter}
order by n.nspname
"#,
        schema_filter = env.filter.user_schema("n.nspname"),
    )
}

pub const USERS: &str = r#"
select
  r.rolname::text as user_name,
  r.rolcanlogin as can_login
from pg_roles r
where r.rolname !~ '^pg_'
order by r.rolname
"#;
