//! Cross-dialect schema object model.

mod database;
mod keys;
mod object;
mod principals;
mod routines;
mod table;
mod types;

pub use database::{Database, Direction};
pub use keys::{
    Constraint, ConstraintKind, FkAction, ForeignKey, Index, IndexExt, MySqlIndex, PostgresIndex,
    PrimaryKey, SqlServerIndex,
};
pub use object::{ObjectKey, ObjectKind, ObjectRef, SchemaObject};
pub use principals::{SchemaInfo, User};
pub use routines::{Function, PostgresRoutine, RoutineExt, StoredProcedure, Trigger, View};
pub use table::{
    Column, ColumnExt, GeneratedColumn, IdentityGeneration, IdentitySpec, MySqlColumn,
    MySqlTable, PostgresColumn, PostgresTable, SqlServerColumn, SqlServerTable, Table, TableExt,
};
pub use types::{DataType, DataTypeKind, Sequence};
