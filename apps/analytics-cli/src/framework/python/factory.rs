use itertools::Itertools;
use std::collections::BTreeSet;

use super::naming::{create_class_filename, create_factory_name};
use super::sqlmodel::{ModelFile, INDENT};
use crate::infrastructure::olap::clickhouse::type_parser::RuntimeType;

const FACTORY_IMPORTS: &[&str] = &[
    "from package.polyfactory.factories.sqlmodel_factory import SQLModelFactory",
    "from package.polyfactory.mixins import PeerDBFactoryMixin",
];

/// Polyfactory factory for a generated model.
///
/// Integer key fields get a `pydash.unique_id()` override so generated rows never collide on
/// their key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryFile {
    pub model_class: String,
    pub model_module: String,
    pub factory_class: String,
    pub random_seed: u64,
    pub unique_id_fields: Vec<String>,
}

impl FactoryFile {
    pub fn from_model(model: &ModelFile, random_seed: u64) -> Self {
        let unique_id_fields = model
            .fields
            .iter()
            .filter(|field| field.primary_key && field.runtime_type == RuntimeType::Integer)
            .map(|field| field.field_name.clone())
            .unique()
            .collect();

        Self {
            model_class: model.class_name.clone(),
            model_module: create_class_filename(&model.class_name),
            factory_class: create_factory_name(&model.class_name),
            random_seed,
            unique_id_fields,
        }
    }

    pub fn imports(&self) -> BTreeSet<String> {
        let mut imports: BTreeSet<String> =
            FACTORY_IMPORTS.iter().map(|i| i.to_string()).collect();
        imports.insert(format!(
            "from .{} import {}",
            self.model_module, self.model_class
        ));
        if !self.unique_id_fields.is_empty() {
            imports.insert("import pydash".to_string());
        }
        imports
    }

    pub fn render(&self) -> String {
        let mut lines: Vec<String> = self.imports().into_iter().collect();
        lines.push(String::new());
        lines.push(String::new());

        lines.push(format!(
            "class {}(PeerDBFactoryMixin, SQLModelFactory[{}]):",
            self.factory_class, self.model_class
        ));
        lines.push(format!("{INDENT}__random_seed__ = {}", self.random_seed));

        for field in &self.unique_id_fields {
            lines.push(String::new());
            lines.push(format!("{INDENT}@classmethod"));
            lines.push(format!("{INDENT}def {field}(cls) -> int:"));
            lines.push(format!("{INDENT}{INDENT}return int(pydash.unique_id())"));
        }

        lines.join("\n") + "\n"
    }
}
