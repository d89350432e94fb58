//! Path resolution: ancestor file search and canonical module names.

use std::path::{Component, Path, PathBuf};

/// Walks from `start_dir` towards the filesystem root looking for
/// `relative_name`, returning the first existing file.
///
/// The walk stops when a directory's parent is itself (or missing), so it
/// terminates on any root without recursion.
pub fn find_ancestor_file(start_dir: &Path, relative_name: &Path) -> Option<PathBuf> {
    let mut dir = start_dir;
    loop {
        let candidate = dir.join(relative_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        match dir.parent() {
            Some(parent) if parent != dir => dir = parent,
            _ => return None,
        }
    }
}

/// Derives the module name from a path shaped like `.../game/sys/S<Name>.lua`.
///
/// Returns `None` for any other path; callers skip registration then.
pub fn canonical_module_name(path: &Path) -> Option<String> {
    if path.extension()? != "lua" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let mut stem_chars = stem.chars();
    if stem_chars.next() != Some('S') || !stem_chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return None;
    }
    if stem.len() < 2 {
        return None;
    }

    let dirs: Vec<&str> = path
        .parent()?
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect();
    match dirs.as_slice() {
        [.., "game", "sys"] => Some(stem.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn module_name_from_sys_path() {
        assert_eq!(
            canonical_module_name(Path::new("/proj/game/sys/SPhysics.lua")),
            Some("SPhysics".to_string())
        );
        assert_eq!(
            canonical_module_name(Path::new("game/sys/SInput.lua")),
            Some("SInput".to_string())
        );
    }

    #[test]
    fn module_name_rejects_other_layouts() {
        for path in [
            "/proj/game/sys/Physics.lua",
            "/proj/game/sys/SPhysics.txt",
            "/proj/game/ui/SPhysics.lua",
            "/proj/sys/SPhysics.lua",
            "/proj/game/sys/nested/SPhysics.lua",
            "/proj/game/sys/S.lua",
            "/proj/game/sys/S-Foo.lua",
        ] {
            assert_eq!(canonical_module_name(Path::new(path)), None, "{path}");
        }
    }

    #[test]
    fn finds_file_in_ancestor() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("game/sys")).unwrap();
        fs::write(root.join(".luacheckrc"), "std = 'lua51'\n").unwrap();

        let found = find_ancestor_file(&root.join("game/sys"), Path::new(".luacheckrc"));
        assert_eq!(found, Some(root.join(".luacheckrc")));
    }

    #[test]
    fn finds_nested_relative_name() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("game/sys")).unwrap();
        fs::create_dir_all(root.join("data")).unwrap();
        fs::write(root.join("data/sys_def.lua"), "return {}\n").unwrap();

        let found = find_ancestor_file(&root.join("game/sys"), Path::new("data/sys_def.lua"));
        assert_eq!(found, Some(root.join("data/sys_def.lua")));
    }

    #[test]
    fn nearest_ancestor_wins() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("game/sys")).unwrap();
        fs::write(root.join(".luacheckrc"), "").unwrap();
        fs::write(root.join("game/.luacheckrc"), "").unwrap();

        let found = find_ancestor_file(&root.join("game/sys"), Path::new(".luacheckrc"));
        assert_eq!(found, Some(root.join("game/.luacheckrc")));
    }

    #[test]
    fn missing_file_reaches_root_and_stops() {
        let temp = tempdir().unwrap();
        let found = find_ancestor_file(
            temp.path(),
            Path::new("definitely-not-present-7f3a.lua"),
        );
        assert_eq!(found, None);
    }

    #[test]
    fn directories_are_not_files() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("sub/.luacheckrc")).unwrap();
        assert_eq!(find_ancestor_file(&root.join("sub"), Path::new(".luacheckrc")), None);
    }
}
