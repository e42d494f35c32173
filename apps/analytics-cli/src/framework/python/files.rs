//! Writes generated models, their factories and the package `__init__.py` to disk.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::naming::{create_class_filename, create_factory_name};
use super::sqlmodel::GeneratedModel;
use crate::utilities::constants::PYTHON_FILE_EXTENSION;
use crate::utilities::identifiers::python_string_list;

pub const INIT_FILE_NAME: &str = "__init__.py";

#[derive(Debug, thiserror::Error)]
#[error("Failed to write {path}")]
pub struct FileWriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFilePaths {
    pub model: PathBuf,
    pub factory: PathBuf,
}

impl ModelFilePaths {
    pub fn new(out_dir: &Path, class_name: &str) -> Self {
        Self {
            model: out_dir
                .join(create_class_filename(class_name))
                .with_extension(PYTHON_FILE_EXTENSION),
            factory: out_dir
                .join(create_class_filename(&create_factory_name(class_name)))
                .with_extension(PYTHON_FILE_EXTENSION),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOptions {
    pub replace_model: bool,
    pub replace_factory: bool,
}

/// Which of a model's two files are (re)written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WritePlan {
    pub model: bool,
    pub factory: bool,
}

impl WritePlan {
    /// A file is written when it is missing or its replace flag is set.
    pub fn new(paths: &ModelFilePaths, replace: ReplaceOptions) -> Self {
        Self {
            model: replace.replace_model || !paths.model.exists(),
            factory: replace.replace_factory || !paths.factory.exists(),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.model && !self.factory
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), FileWriteError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| FileWriteError {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| FileWriteError {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the files selected by `plan` and returns their paths.
pub fn write_generated_model(
    paths: &ModelFilePaths,
    plan: WritePlan,
    generated: &GeneratedModel,
) -> Result<Vec<PathBuf>, FileWriteError> {
    let mut written = Vec::new();

    if plan.model {
        write_file(&paths.model, &generated.model_code)?;
        written.push(paths.model.clone());
    }
    if plan.factory {
        write_file(&paths.factory, &generated.factory_code)?;
        written.push(paths.factory.clone());
    }

    debug!("Wrote {:?} for {}", written, generated.class_name);
    Ok(written)
}

/// `__init__.py` re-exporting each model and its factory, in the given order.
pub fn render_init_file<S: AsRef<str>>(class_names: &[S]) -> String {
    let mut exports = Vec::with_capacity(class_names.len() * 2);
    let mut imports = Vec::with_capacity(class_names.len() * 2);

    for class_name in class_names {
        let class_name = class_name.as_ref();
        let factory_name = create_factory_name(class_name);

        imports.push(format!(
            "from .{} import {}",
            create_class_filename(class_name),
            class_name
        ));
        imports.push(format!(
            "from .{} import {}",
            create_class_filename(&factory_name),
            factory_name
        ));
        exports.push(class_name.to_string());
        exports.push(factory_name);
    }

    [
        format!("__all__ = {}", python_string_list(&exports)),
        String::new(),
        imports.join("\n"),
        String::new(),
    ]
    .join("\n")
}

pub fn create_init_file<S: AsRef<str>>(
    out_dir: &Path,
    class_names: &[S],
) -> Result<PathBuf, FileWriteError> {
    let path = out_dir.join(INIT_FILE_NAME);
    write_file(&path, &render_init_file(class_names))?;
    info!("Wrote {} with {} models", path.display(), class_names.len());
    Ok(path)
}
