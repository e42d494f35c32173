use convert_case::{Case, Casing};

use crate::utilities::identifiers::is_reserved_module_name;

/// Model field name for a column: the column name without its leading underscores.
///
/// `_peerdb_version` becomes `peerdb_version`; the column keeps its original name in the
/// storage declaration.
pub fn to_field_name(column_name: &str) -> String {
    column_name.trim_start_matches('_').to_string()
}

/// Module name for a generated class, e.g. `TestTable` is written to `test_table.py`.
///
/// A trailing `_` is appended when the snake_case name is a Python keyword so the module
/// stays importable.
pub fn create_class_filename(class_name: &str) -> String {
    let filename = class_name.to_case(Case::Snake);
    if is_reserved_module_name(&filename) {
        format!("{filename}_")
    } else {
        filename
    }
}

pub fn create_factory_name(model_name: &str) -> String {
    format!("{model_name}Factory")
}
