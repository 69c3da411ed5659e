use std::io;
use std::path::Path;

use docgen_config::Config;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use crate::error::{DocgenError, DocgenResult};
use crate::paths::component_key;

/// Walk the components directory and return every file matching the
/// configured component patterns, as sorted `/`-separated paths relative to
/// that directory. Hidden directories and `node_modules` are skipped, and
/// entries that cannot be read (dangling links, loops) are logged and
/// skipped. Only a missing or unreadable root is an error.
pub fn discover_components(config: &Config) -> DocgenResult<Vec<String>> {
    let root = config.components_dir();
    let mut components = Vec::new();

    let walker = WalkDir::new(&root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() > 0 => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.clone());
                return Err(DocgenError::io(path, io::Error::from(err)));
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(&root) else {
            continue;
        };

        if config.is_component(relative) {
            components.push(component_key(relative));
        }
    }

    components.sort();
    Ok(components)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "node_modules"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<template/>").unwrap();
    }

    #[test]
    fn finds_components_below_the_root() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "src/components/Button.vue");
        touch(temp.path(), "src/components/forms/Input.tsx");
        touch(temp.path(), "src/components/forms/_helpers.vue");
        touch(temp.path(), "src/components/Button.md");
        touch(temp.path(), "src/components/node_modules/lib/Dep.vue");
        touch(temp.path(), "src/components/.cache/Old.vue");
        touch(temp.path(), "src/Outside.vue");

        let mut config = Config::for_working_dir(temp.path());
        config.components_root = "src/components".into();

        let components = discover_components(&config).unwrap();

        assert_eq!(components, vec!["Button.vue", "forms/Input.tsx"]);
    }

    #[test]
    fn missing_root_is_an_io_error() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::for_working_dir(temp.path());
        config.components_root = "does/not/exist".into();

        let err = discover_components(&config).unwrap_err();

        assert!(matches!(err, DocgenError::Io { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_links_are_skipped() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "src/components/Button.vue");
        std::os::unix::fs::symlink(
            temp.path().join("gone"),
            temp.path().join("src/components/stale-link"),
        )
        .unwrap();

        let mut config = Config::for_working_dir(temp.path());
        config.components_root = "src/components".into();

        let components = discover_components(&config).unwrap();

        assert_eq!(components, vec!["Button.vue"]);
    }
}
