//! The seven user store operations, composed from the CSV table and the
//! context logs.
//!
//! Every operation resolves its storage directory first and runs as one
//! read-modify-write while holding the store lock. The lock only serialises
//! requests inside this process; another process writing the same directory
//! can still overwrite a concurrent update (last full rewrite wins).

use crate::contexts;
use crate::error::{StoreError, StoreResult};
use crate::storage::{resolve_dir, users_csv_path};
use crate::users_csv::{dedupe_user, ensure_user_row, find_user_index, read_users, write_users};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use user_store_types::*;

pub struct UserStore {
    default_dir: PathBuf,
    lock: Mutex<()>,
}

impl UserStore {
    pub fn new(default_dir: impl Into<PathBuf>) -> Self {
        Self {
            default_dir: default_dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn default_dir(&self) -> &Path {
        &self.default_dir
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn base(&self, directory: Option<&str>) -> StoreResult<PathBuf> {
        Ok(resolve_dir(directory, &self.default_dir)?)
    }

    pub fn create_user(
        &self,
        name: &str,
        id: &str,
        directory: Option<&str>,
    ) -> StoreResult<UserWriteResponse> {
        let _guard = self.guard();
        let base = self.base(directory)?;
        let path = users_csv_path(&base);

        let (mut records, columns) = read_users(&path)?;
        ensure_user_row(&mut records, &columns, name, id);
        let removed = dedupe_user(&mut records, name, id);
        if removed > 0 {
            log::warn!("Dropped {} duplicate rows for {}/{}", removed, name, id);
        }
        write_users(&records, &columns, &path)?;

        let user = find_user_index(&records, name, id)
            .map(|i| records[i].clone())
            .unwrap_or_else(|| blank_record(&[], name, id));
        log::info!("Created user {}/{} in {}", name, id, base.display());
        Ok(UserWriteResponse::created(user))
    }

    pub fn add_user_data(
        &self,
        column: &str,
        value: &str,
        name: &str,
        id: &str,
        directory: Option<&str>,
    ) -> StoreResult<UserWriteResponse> {
        let _guard = self.guard();
        let base = self.base(directory)?;
        let path = users_csv_path(&base);

        let (mut records, mut columns) = read_users(&path)?;
        let idx = ensure_user_row(&mut records, &columns, name, id);
        if !columns.iter().any(|c| c == column) {
            columns.push(column.to_string());
            for record in records.iter_mut() {
                record.entry(column.to_string()).or_default();
            }
            log::info!("Added column '{}' to {}", column, path.display());
        }
        records[idx].insert(column.to_string(), value.to_string());
        write_users(&records, &columns, &path)?;

        log::info!("Set {} for user {}/{}", column, name, id);
        Ok(UserWriteResponse::updated(records[idx].clone()))
    }

    pub fn get_user(&self, name: &str, id: &str, directory: Option<&str>) -> StoreResult<UserRecord> {
        let _guard = self.guard();
        let base = self.base(directory)?;
        let path = users_csv_path(&base);
        if !path.exists() {
            return Err(StoreError::UsersFileMissing);
        }

        let (records, _) = read_users(&path)?;
        let idx = find_user_index(&records, name, id).ok_or(StoreError::UserNotFound)?;
        log::debug!("Fetched user {}/{}", name, id);
        Ok(records[idx].clone())
    }

    pub fn delete_user(
        &self,
        name: &str,
        id: &str,
        rm_context: bool,
        directory: Option<&str>,
    ) -> StoreResult<UserDeletedResponse> {
        let _guard = self.guard();
        let base = self.base(directory)?;
        let path = users_csv_path(&base);
        if !path.exists() {
            return Err(StoreError::UsersFileMissing);
        }

        let (mut records, columns) = read_users(&path)?;
        let idx = find_user_index(&records, name, id).ok_or(StoreError::UserNotFound)?;
        records.remove(idx);
        write_users(&records, &columns, &path)?;

        if rm_context {
            match contexts::context_file(&base, name, id) {
                Ok(file) => contexts::remove_quietly(&file),
                Err(e) => log::warn!("Could not resolve context file for {}/{}: {}", name, id, e),
            }
        }

        log::info!("Deleted user {}/{} (rm_context={})", name, id, rm_context);
        Ok(UserDeletedResponse {
            status: "deleted".to_string(),
            name: name.to_string(),
            id: id.to_string(),
            rm_context,
        })
    }

    pub fn add_user_context(
        &self,
        context: &str,
        user: &str,
        id: &str,
        directory: Option<&str>,
    ) -> StoreResult<ContextFileResponse> {
        let _guard = self.guard();
        let base = self.base(directory)?;
        let file = contexts::context_file(&base, user, id)?;
        contexts::append_line(&file, context)?;

        log::debug!("Appended context for {}/{}", user, id);
        Ok(ContextFileResponse::appended(file.display().to_string()))
    }

    pub fn clear_user_context(
        &self,
        name: &str,
        id: &str,
        directory: Option<&str>,
    ) -> StoreResult<ContextFileResponse> {
        let _guard = self.guard();
        let base = self.base(directory)?;
        let file = contexts::context_file(&base, name, id)?;
        contexts::clear(&file)?;

        log::info!("Cleared context for {}/{}", name, id);
        Ok(ContextFileResponse::cleared(file.display().to_string()))
    }

    pub fn get_user_context(
        &self,
        name: &str,
        id: &str,
        directory: Option<&str>,
    ) -> StoreResult<UserContextResponse> {
        let _guard = self.guard();
        let base = self.base(directory)?;
        let file = contexts::context_file(&base, name, id)?;
        let context = contexts::read_lines(&file)?;

        Ok(UserContextResponse {
            name: name.to_string(),
            id: id.to_string(),
            context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn store() -> (tempfile::TempDir, UserStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = UserStore::new(tmp.path().join("data"));
        (tmp, store)
    }

    #[test]
    fn test_create_twice_keeps_one_record() {
        let (_tmp, store) = store();
        let first = store.create_user("Alice", "123", None).unwrap();
        assert_eq!(first.status, "created");
        assert_eq!(first.user["name"], "Alice");

        let again = store.create_user("alice", "123", None).unwrap();
        // The existing row is returned untouched.
        assert_eq!(again.user["name"], "Alice");

        let (records, _) = read_users(&store.default_dir().join("users.csv")).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_create_collapses_preexisting_duplicates() {
        let (_tmp, store) = store();
        let dir = store.default_dir().to_path_buf();
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("users.csv"),
            "name;id\nBob;2\nAlice;1\nALICE;1\nBob;2\n",
        )
        .unwrap();

        store.create_user("alice", "1", None).unwrap();
        let (records, _) = read_users(&dir.join("users.csv")).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r["name"].as_str()).collect();
        assert_eq!(names, vec!["Bob", "Alice", "Bob"]);
    }

    #[test]
    fn test_add_user_data_backfills_new_column() {
        let (_tmp, store) = store();
        store.create_user("Alice", "1", None).unwrap();
        store.create_user("Bob", "2", None).unwrap();

        let updated = store.add_user_data("grade", "A", "Alice", "1", None).unwrap();
        assert_eq!(updated.status, "updated");
        assert_eq!(updated.user["grade"], "A");

        let bob = store.get_user("Bob", "2", None).unwrap();
        assert_eq!(bob["grade"], "");
        let keys: Vec<&str> = bob.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "id", "grade"]);
    }

    #[test]
    fn test_add_user_data_creates_missing_user_and_overwrites() {
        let (_tmp, store) = store();
        store.add_user_data("city", "Porto", "Carol", "9", None).unwrap();
        store.add_user_data("city", "Lisbon", "CAROL", "9", None).unwrap();

        let carol = store.get_user("carol", "9", None).unwrap();
        assert_eq!(carol["name"], "Carol");
        assert_eq!(carol["city"], "Lisbon");
    }

    #[test]
    fn test_columns_never_shrink() {
        let (_tmp, store) = store();
        store.add_user_data("grade", "A", "Alice", "1", None).unwrap();
        store.delete_user("Alice", "1", false, None).unwrap();

        let (records, columns) = read_users(&store.default_dir().join("users.csv")).unwrap();
        assert!(records.is_empty());
        assert_eq!(columns, vec!["name", "id", "grade"]);
    }

    #[test]
    fn test_get_user_missing_file_and_missing_user() {
        let (_tmp, store) = store();
        let err = store.get_user("Alice", "1", None).unwrap_err();
        assert!(matches!(err, StoreError::UsersFileMissing));
        assert!(!store.default_dir().join("users.csv").exists());

        store.create_user("Bob", "2", None).unwrap();
        let err = store.get_user("Alice", "1", None).unwrap_err();
        assert!(matches!(err, StoreError::UserNotFound));
    }

    #[test]
    fn test_id_match_is_case_sensitive() {
        let (_tmp, store) = store();
        store.create_user("Alice", "abc", None).unwrap();
        assert!(store.get_user("Alice", "ABC", None).is_err());
        assert!(store.get_user("ALICE", "abc", None).is_ok());
    }

    #[test]
    fn test_delete_with_and_without_context() {
        let (_tmp, store) = store();
        store.create_user("Alice", "1", None).unwrap();
        store.create_user("Bob", "2", None).unwrap();
        store.add_user_context("alice note", "Alice", "1", None).unwrap();
        store.add_user_context("bob note", "Bob", "2", None).unwrap();

        let kept = store.delete_user("Bob", "2", false, None).unwrap();
        assert!(!kept.rm_context);
        let ctx_dir = store.default_dir().join("contexts");
        assert!(ctx_dir.join("Bob_2.txt").exists());

        let removed = store.delete_user("Alice", "1", true, None).unwrap();
        assert_eq!(removed.status, "deleted");
        assert!(removed.rm_context);
        assert!(!ctx_dir.join("Alice_1.txt").exists());

        assert!(matches!(
            store.get_user("Alice", "1", None).unwrap_err(),
            StoreError::UserNotFound
        ));
    }

    #[test]
    fn test_delete_missing_user() {
        let (_tmp, store) = store();
        assert!(matches!(
            store.delete_user("Bob", "999", false, None).unwrap_err(),
            StoreError::UsersFileMissing
        ));
        store.create_user("Alice", "1", None).unwrap();
        assert!(matches!(
            store.delete_user("Bob", "999", false, None).unwrap_err(),
            StoreError::UserNotFound
        ));
    }

    #[test]
    fn test_context_append_clear_cycle() {
        let (_tmp, store) = store();
        for note in ["one", "two", "three"] {
            let resp = store.add_user_context(note, "Alice", "1", None).unwrap();
            assert_eq!(resp.status, "appended");
            assert!(resp.file.ends_with("Alice_1.txt"));
        }
        let ctx = store.get_user_context("Alice", "1", None).unwrap();
        assert_eq!(ctx.context, vec!["one", "two", "three"]);

        let cleared = store.clear_user_context("Alice", "1", None).unwrap();
        assert_eq!(cleared.status, "cleared");
        assert!(store.get_user_context("Alice", "1", None).unwrap().context.is_empty());

        store.add_user_context("after", "Alice", "1", None).unwrap();
        assert_eq!(
            store.get_user_context("Alice", "1", None).unwrap().context,
            vec!["after"]
        );
    }

    #[test]
    fn test_context_for_unknown_user_is_empty() {
        let (_tmp, store) = store();
        let ctx = store.get_user_context("Nobody", "0", None).unwrap();
        assert_eq!(ctx.name, "Nobody");
        assert_eq!(ctx.id, "0");
        assert!(ctx.context.is_empty());
    }

    #[test]
    fn test_directory_override_isolates_tables() {
        let (tmp, store) = store();
        let other = tmp.path().join("other");
        let other_str = other.to_str().unwrap();

        store.create_user("Alice", "1", Some(other_str)).unwrap();
        assert!(other.join("users.csv").exists());
        assert!(matches!(
            store.get_user("Alice", "1", None).unwrap_err(),
            StoreError::UsersFileMissing
        ));
        assert!(store.get_user("Alice", "1", Some(other_str)).is_ok());
    }
}
