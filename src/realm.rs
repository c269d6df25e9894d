use crate::error::SimError;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Read the realm identifier, creating the file with a fresh one if it
/// does not exist yet.
pub fn load_or_create(path: &Path) -> Result<String, SimError> {
    match load(path) {
        Ok(realm) => Ok(realm),
        Err(SimError::Realm(_)) if !path.exists() => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    SimError::Realm(format!("create {}: {e}", parent.display()))
                })?;
            }
            let realm = Uuid::new_v4().to_string();
            fs::write(path, format!("{realm}\n"))
                .map_err(|e| SimError::Realm(format!("write {}: {e}", path.display())))?;
            info!("🔑 Created realm identifier {} at {}", realm, path.display());
            Ok(realm)
        }
        Err(err) => Err(err),
    }
}

pub fn load(path: &Path) -> Result<String, SimError> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SimError::Realm(format!("{} not found", path.display())),
        _ => SimError::Realm(format!("read {}: {e}", path.display())),
    })?;

    let realm = content.trim();
    if realm.is_empty() {
        return Err(SimError::Realm(format!("{} is empty", path.display())));
    }
    Ok(realm.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_then_reuses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("realm-uuid");

        let first = load_or_create(&path).unwrap();
        assert!(Uuid::parse_str(&first).is_ok());
        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{first}\n"));

        let second = load_or_create(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(load(&path).unwrap(), first);
    }

    #[test]
    fn test_empty_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("realm-uuid");
        fs::write(&path, "\n").unwrap();

        let err = load_or_create(&path).unwrap_err();
        assert!(matches!(err, SimError::Realm(_)));
        // The existing file is left alone
        assert_eq!(fs::read_to_string(&path).unwrap(), "\n");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("absent")).is_err());
    }
}
