use crate::error::Result;
use crate::models::Domain;
use crate::utils::constants::TEMPLATE_FILE_MARKER;
use std::path::{Path, PathBuf};

/// Recursively collect a domain's CSV files below `root`. Only files under a
/// directory named after the domain are taken, and template/DQC files
/// (name contains `YYYY_MM`) are excluded. The list is sorted for a
/// deterministic processing order.
pub fn collect_domain_files(root: &Path, domain: Domain) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk(root, &mut |path| {
        if !is_csv(path) {
            return;
        }
        if file_name_contains(path, TEMPLATE_FILE_MARKER) {
            return;
        }
        if path_has_component(path, domain.source_dir_name()) {
            files.push(path.to_path_buf());
        }
    })?;
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, visit: &mut impl FnMut(&Path)) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, visit)?;
        } else {
            visit(&path);
        }
    }
    Ok(())
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

fn file_name_contains(path: &Path, marker: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains(marker))
}

fn path_has_component(path: &Path, name: &str) -> bool {
    path.components()
        .any(|c| c.as_os_str().to_str() == Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_collects_only_domain_csv_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        touch(&root.join("BRB/Solarimetricos/2020/BRB_2020.csv"));
        touch(&root.join("BRB/Solarimetricos/2021/BRB_2021.csv"));
        touch(&root.join("BRB/Meteorologicos/2020/BRB_2020.csv"));
        touch(&root.join("BRB/Solarimetricos/notes.txt"));

        let files = collect_domain_files(root, Domain::Solarimetric).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.to_string_lossy().contains("Solarimetricos")));
    }

    #[test]
    fn test_excludes_template_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        touch(&root.join("BRB/Anemometricos/BRB_2020_01.csv"));
        touch(&root.join("BRB/Anemometricos/BRB_YYYY_MM_MD_DQC.csv"));

        let files = collect_domain_files(root, Domain::Anemometric).unwrap();
        assert_eq!(files.len(), 1);
        assert!(!files[0].to_string_lossy().contains("YYYY_MM"));
    }

    #[test]
    fn test_missing_root_yields_empty_list() {
        let files =
            collect_domain_files(Path::new("/nonexistent/sonda"), Domain::Meteorological).unwrap();
        assert!(files.is_empty());
    }
}
