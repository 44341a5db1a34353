use crate::error::JvmError;
use crate::{debug_log, throw_exception};
use itertools::Itertools;
use std::collections::HashMap;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Classpath-directory loader: indexes every `.class` file under the
/// configured directories, keyed by binary name (`com/example/Main`).
pub struct SystemClassLoader {
    classes: HashMap<String, PathBuf>,
}

impl SystemClassLoader {
    pub fn new(class_path: &[String]) -> Result<Self, JvmError> {
        let mut classes = HashMap::new();
        for dir in class_path {
            let root = PathBuf::from(dir);
            for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("class") {
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&root) else {
                    continue;
                };
                let name = relative
                    .with_extension("")
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().to_string())
                    .join("/");
                // First classpath entry wins, like a real classpath scan.
                classes.entry(name).or_insert_with(|| path.to_path_buf());
            }
        }
        debug_log!("SystemClassLoader indexed {} classes", classes.len());
        Ok(Self { classes })
    }

    pub fn find_class(&self, name: &str) -> Result<Vec<u8>, JvmError> {
        let Some(path) = self.classes.get(name) else {
            return throw_exception!(ClassNotFoundException, "{}", name.replace('/', "."));
        };
        std::fs::read(path).map_err(|e| {
            crate::build_exception!(ClassNotFoundException, "{}: {}", name.replace('/', "."), e)
        })
    }
}
