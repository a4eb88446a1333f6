//! [`Adapter`] over an [`SftpClient`].
//!
//! Every operation stats its target before mutating anything, so callers see
//! `FileNotFound`/`DirectoryNotFound`/`FileAlreadyExists` instead of a raw
//! protocol status. Transport failures that leave the session unusable map to
//! `Connection`, everything else to `Runtime`.

use async_trait::async_trait;
use kakehashi::path;
use kakehashi::{Adapter, AdapterCore, Directory, File, FsError, FsResult};

use crate::client::{SftpAttrs, SftpClient};
use crate::error::SftpError;
use crate::session::{RusshClient, SshConfig};

pub struct SftpAdapter<C = RusshClient> {
    core: AdapterCore,
    client: C,
}

impl SftpAdapter<RusshClient> {
    /// Adapter over a real SSH server. No connection is made until first use.
    pub fn connect_to(prefix: impl Into<String>, root: impl Into<String>, config: SshConfig) -> Self {
        Self::new(prefix, root, RusshClient::new(config))
    }
}

impl<C: SftpClient> SftpAdapter<C> {
    pub fn new(prefix: impl Into<String>, root: impl Into<String>, client: C) -> Self {
        Self {
            core: AdapterCore::new(prefix, root),
            client,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn fail(&self, path: &str, e: SftpError) -> FsError {
        if e.is_connection() {
            self.core.connection(e)
        } else {
            self.core.runtime(path, e)
        }
    }

    /// `Ok(None)` when nothing exists at `full`.
    async fn lookup(&self, full: &str) -> FsResult<Option<SftpAttrs>> {
        match self.client.stat(full).await {
            Ok(attrs) => Ok(Some(attrs)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(self.fail(full, e)),
        }
    }

    async fn stat_file(&self, full: &str) -> FsResult<File> {
        match self.lookup(full).await? {
            Some(attrs) if attrs.kind.is_file() => {
                Ok(self.core.file(full, attrs.size, attrs.modified))
            }
            _ => Err(self.core.file_not_found(full)),
        }
    }

    async fn stat_directory(&self, full: &str) -> FsResult<Directory> {
        match self.lookup(full).await? {
            Some(attrs) if attrs.kind.is_dir() => {
                Ok(self.core.directory(full, attrs.modified))
            }
            _ => Err(self.core.directory_not_found(full)),
        }
    }

    /// Create `full` and every missing ancestor.
    async fn create_dir_all(&self, full: &str) -> FsResult<()> {
        let mut missing = Vec::new();
        let mut current = Some(full.to_string());
        while let Some(dir) = current {
            match self.lookup(&dir).await? {
                Some(attrs) if attrs.kind.is_dir() => break,
                Some(_) => {
                    return Err(self.core.runtime(
                        full,
                        format!("{} exists and is not a directory", dir),
                    ));
                }
                None => {
                    current = path::parent(&dir);
                    missing.push(dir);
                }
            }
        }

        for dir in missing.iter().rev() {
            tracing::debug!(prefix = %self.core.prefix(), "mkdir {}", dir);
            self.client
                .create_dir(dir)
                .await
                .map_err(|e| self.fail(dir, e))?;
        }
        Ok(())
    }

    async fn ensure_parent(&self, full: &str) -> FsResult<()> {
        match path::parent(full) {
            Some(parent) => self.create_dir_all(&parent).await,
            None => Ok(()),
        }
    }

    /// Depth-first removal: files as they are found, directories deepest first.
    /// Symlinks are unlinked, never followed.
    async fn remove_tree(&self, full: &str) -> FsResult<()> {
        let mut pending = vec![full.to_string()];
        let mut directories = Vec::new();

        while let Some(dir) = pending.pop() {
            let children = self
                .client
                .list(&dir)
                .await
                .map_err(|e| self.fail(&dir, e))?;
            for child in children {
                let child_path = path::prepend_root_path(&dir, &child.name);
                if child.attrs.kind.is_dir() && !child.symlink {
                    pending.push(child_path);
                } else {
                    self.client
                        .remove_file(&child_path)
                        .await
                        .map_err(|e| self.fail(&child_path, e))?;
                }
            }
            directories.push(dir);
        }

        for dir in directories.iter().rev() {
            self.client
                .remove_dir(dir)
                .await
                .map_err(|e| self.fail(dir, e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl<C: SftpClient> Adapter for SftpAdapter<C> {
    fn prefix(&self) -> &str {
        self.core.prefix()
    }

    fn root_path(&self) -> &str {
        self.core.root_path()
    }

    async fn connect(&self) -> FsResult<()> {
        if self.client.is_connected().await {
            return Ok(());
        }
        self.client
            .connect()
            .await
            .map_err(|e| self.core.connection(e))?;
        tracing::info!(prefix = %self.core.prefix(), "SFTP session established");
        Ok(())
    }

    async fn dispose(&self) -> FsResult<()> {
        self.client
            .disconnect()
            .await
            .map_err(|e| self.core.connection(e))?;
        tracing::info!(prefix = %self.core.prefix(), "SFTP session closed");
        Ok(())
    }

    async fn get_file(&self, path: &str) -> FsResult<File> {
        let full = self.core.resolve(path)?;
        self.stat_file(&full).await
    }

    async fn get_directory(&self, path: &str) -> FsResult<Directory> {
        let full = self.core.resolve(path)?;
        self.stat_directory(&full).await
    }

    async fn list_files(&self, path: &str) -> FsResult<Vec<File>> {
        let full = self.core.resolve(path)?;
        self.stat_directory(&full).await?;
        let entries = self
            .client
            .list(&full)
            .await
            .map_err(|e| self.fail(&full, e))?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.attrs.kind.is_file())
            .map(|entry| {
                let child = path::prepend_root_path(&full, &entry.name);
                self.core.file(&child, entry.attrs.size, entry.attrs.modified)
            })
            .collect())
    }

    async fn list_directories(&self, path: &str) -> FsResult<Vec<Directory>> {
        let full = self.core.resolve(path)?;
        self.stat_directory(&full).await?;
        let entries = self
            .client
            .list(&full)
            .await
            .map_err(|e| self.fail(&full, e))?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.attrs.kind.is_dir())
            .map(|entry| {
                let child = path::prepend_root_path(&full, &entry.name);
                self.core.directory(&child, entry.attrs.modified)
            })
            .collect())
    }

    async fn create_file(&self, path: &str) -> FsResult<File> {
        let full = self.core.resolve(path)?;
        if self.lookup(&full).await?.is_some() {
            return Err(self.core.file_already_exists(&full));
        }
        self.ensure_parent(&full).await?;
        self.client
            .create_new(&full)
            .await
            .map_err(|e| self.fail(&full, e))?;
        self.stat_file(&full).await
    }

    async fn create_directory(&self, path: &str) -> FsResult<()> {
        let full = self.core.resolve(path)?;
        self.create_dir_all(&full).await
    }

    async fn delete_file(&self, path: &str) -> FsResult<()> {
        let full = self.core.resolve(path)?;
        self.stat_file(&full).await?;
        self.client
            .remove_file(&full)
            .await
            .map_err(|e| self.fail(&full, e))
    }

    async fn delete_directory(&self, path: &str, recursive: bool) -> FsResult<()> {
        let full = self.core.resolve(path)?;
        self.stat_directory(&full).await?;
        if full == self.core.resolve("")? {
            return Err(self.core.runtime(&full, "cannot remove the adapter root"));
        }
        if recursive {
            return self.remove_tree(&full).await;
        }
        self.client
            .remove_dir(&full)
            .await
            .map_err(|e| self.fail(&full, e))
    }

    async fn read_file(&self, path: &str) -> FsResult<Vec<u8>> {
        let full = self.core.resolve(path)?;
        self.stat_file(&full).await?;
        self.client
            .read(&full)
            .await
            .map_err(|e| self.fail(&full, e))
    }

    async fn write_file(&self, path: &str, contents: &[u8], overwrite: bool) -> FsResult<()> {
        let full = self.core.resolve(path)?;
        match self.lookup(&full).await? {
            Some(_) if !overwrite => return Err(self.core.file_already_exists(&full)),
            Some(attrs) if attrs.kind.is_dir() => {
                return Err(self.core.runtime(&full, "target is a directory"));
            }
            Some(_) => {}
            None => self.ensure_parent(&full).await?,
        }
        self.client
            .write(&full, contents)
            .await
            .map_err(|e| self.fail(&full, e))
    }

    async fn append_file(&self, path: &str, contents: &[u8]) -> FsResult<()> {
        let full = self.core.resolve(path)?;
        self.stat_file(&full).await?;
        self.client
            .append(&full, contents)
            .await
            .map_err(|e| self.fail(&full, e))
    }
}

impl<C> std::fmt::Debug for SftpAdapter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SftpAdapter")
            .field("prefix", &self.core.prefix())
            .field("root_path", &self.core.root_path())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    use kakehashi::{EntryKind, ErrorKind};
    use parking_lot::Mutex;

    use super::*;
    use crate::client::SftpEntry;

    #[derive(Clone)]
    enum Node {
        Dir,
        File(Vec<u8>),
        Link(String),
    }

    /// In-memory SFTP server that records every mutating call.
    #[derive(Default)]
    struct FakeClient {
        nodes: Mutex<BTreeMap<String, Node>>,
        calls: Mutex<Vec<String>>,
        connected: AtomicBool,
        refuse_connect: AtomicBool,
    }

    impl FakeClient {
        fn with_home() -> Self {
            let client = Self::default();
            {
                let mut nodes = client.nodes.lock();
                for dir in ["/", "/home", "/home/u"] {
                    nodes.insert(dir.to_string(), Node::Dir);
                }
            }
            client
        }

        fn insert(&self, path: &str, node: Node) {
            self.nodes.lock().insert(path.to_string(), node);
        }

        fn record(&self, call: String) {
            self.calls.lock().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        fn mutations(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter(|c| !c.starts_with("connect") && !c.starts_with("disconnect"))
                .collect()
        }

        fn check(&self) -> Result<(), SftpError> {
            if self.connected.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(SftpError::NotConnected)
            }
        }

        fn attrs(node: &Node) -> SftpAttrs {
            match node {
                Node::Dir => SftpAttrs::directory(None),
                Node::File(data) => SftpAttrs::file(data.len() as u64, None),
                Node::Link(_) => SftpAttrs {
                    kind: EntryKind::Other,
                    size: 0,
                    modified: None,
                },
            }
        }

        /// Rewrite linked ancestors of `path` the way a server would. The
        /// last component is followed only when `follow` is set.
        fn real_path(&self, path: &str, follow: bool) -> String {
            let nodes = self.nodes.lock();
            let names: Vec<&str> = path.split('/').filter(|n| !n.is_empty()).collect();
            let mut current = "/".to_string();
            for (i, name) in names.iter().enumerate() {
                current = path::prepend_root_path(&current, name);
                if let Some(Node::Link(target)) = nodes.get(&current) {
                    if follow || i + 1 < names.len() {
                        current = target.clone();
                    }
                }
            }
            current
        }

        fn parent_is_dir(&self, path: &str) -> bool {
            let parent = path::parent(path).unwrap_or_else(|| "/".to_string());
            let parent = self.real_path(&parent, true);
            matches!(self.nodes.lock().get(&parent), Some(Node::Dir))
        }
    }

    #[async_trait]
    impl SftpClient for FakeClient {
        async fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        async fn connect(&self) -> Result<(), SftpError> {
            self.record("connect".into());
            if self.refuse_connect.load(Ordering::SeqCst) {
                return Err(SftpError::ConnectionFailed("connection refused".into()));
            }
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), SftpError> {
            self.record("disconnect".into());
            self.connected.store(false, Ordering::SeqCst);
            Ok(())
        }

        async fn stat(&self, path: &str) -> Result<SftpAttrs, SftpError> {
            self.check()?;
            let real = self.real_path(path, true);
            self.nodes
                .lock()
                .get(&real)
                .map(Self::attrs)
                .ok_or_else(|| SftpError::NoSuchFile(path.into()))
        }

        async fn list(&self, path: &str) -> Result<Vec<SftpEntry>, SftpError> {
            self.check()?;
            let real = self.real_path(path, true);
            let nodes = self.nodes.lock();
            let prefix = if real == "/" {
                "/".to_string()
            } else {
                format!("{}/", real)
            };
            Ok(nodes
                .iter()
                .filter_map(|(key, node)| {
                    let name = key.strip_prefix(&prefix)?;
                    if name.is_empty() || name.contains('/') {
                        return None;
                    }
                    let (attrs, symlink) = match node {
                        Node::Link(target) => {
                            let attrs = nodes.get(target).map(Self::attrs).unwrap_or(SftpAttrs {
                                kind: EntryKind::Other,
                                size: 0,
                                modified: None,
                            });
                            (attrs, true)
                        }
                        node => (Self::attrs(node), false),
                    };
                    Some(SftpEntry {
                        name: name.to_string(),
                        attrs,
                        symlink,
                    })
                })
                .collect())
        }

        async fn create_dir(&self, path: &str) -> Result<(), SftpError> {
            self.check()?;
            self.record(format!("mkdir {}", path));
            if !self.parent_is_dir(path) {
                return Err(SftpError::NoSuchFile(path.into()));
            }
            let real = self.real_path(path, false);
            self.nodes.lock().insert(real, Node::Dir);
            Ok(())
        }

        async fn remove_file(&self, path: &str) -> Result<(), SftpError> {
            self.check()?;
            self.record(format!("rm {}", path));
            let real = self.real_path(path, false);
            let mut nodes = self.nodes.lock();
            match nodes.get(&real) {
                Some(Node::Dir) => Err(SftpError::Protocol(format!("{}: is a directory", path))),
                Some(_) => {
                    nodes.remove(&real);
                    Ok(())
                }
                None => Err(SftpError::NoSuchFile(path.into())),
            }
        }

        async fn remove_dir(&self, path: &str) -> Result<(), SftpError> {
            self.check()?;
            self.record(format!("rmdir {}", path));
            let real = self.real_path(path, false);
            let mut nodes = self.nodes.lock();
            if !matches!(nodes.get(&real), Some(Node::Dir)) {
                return Err(SftpError::Protocol(format!("{}: not a directory", path)));
            }
            let child_prefix = format!("{}/", real);
            if nodes.keys().any(|k| k.starts_with(&child_prefix)) {
                return Err(SftpError::Protocol(format!("{}: directory not empty", path)));
            }
            nodes.remove(&real);
            Ok(())
        }

        async fn read(&self, path: &str) -> Result<Vec<u8>, SftpError> {
            self.check()?;
            let real = self.real_path(path, true);
            match self.nodes.lock().get(&real) {
                Some(Node::File(data)) => Ok(data.clone()),
                _ => Err(SftpError::NoSuchFile(path.into())),
            }
        }

        async fn write(&self, path: &str, data: &[u8]) -> Result<(), SftpError> {
            self.check()?;
            self.record(format!("write {}", path));
            if !self.parent_is_dir(path) {
                return Err(SftpError::NoSuchFile(path.into()));
            }
            let real = self.real_path(path, true);
            self.nodes.lock().insert(real, Node::File(data.to_vec()));
            Ok(())
        }

        async fn append(&self, path: &str, data: &[u8]) -> Result<(), SftpError> {
            self.check()?;
            self.record(format!("append {}", path));
            let real = self.real_path(path, true);
            match self.nodes.lock().get_mut(&real) {
                Some(Node::File(existing)) => {
                    existing.extend_from_slice(data);
                    Ok(())
                }
                _ => Err(SftpError::NoSuchFile(path.into())),
            }
        }

        async fn create_new(&self, path: &str) -> Result<(), SftpError> {
            self.check()?;
            self.record(format!("create {}", path));
            let real = self.real_path(path, false);
            let mut nodes = self.nodes.lock();
            if nodes.contains_key(&real) {
                return Err(SftpError::Protocol(format!("{}: file exists", path)));
            }
            nodes.insert(real, Node::File(Vec::new()));
            Ok(())
        }
    }

    async fn connected() -> SftpAdapter<FakeClient> {
        let adapter = SftpAdapter::new("remote", "/home/u", FakeClient::with_home());
        adapter.connect().await.unwrap();
        adapter.client().calls.lock().clear();
        adapter
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let adapter = SftpAdapter::new("remote", "/home/u", FakeClient::with_home());
        adapter.connect().await.unwrap();
        adapter.connect().await.unwrap();
        assert_eq!(adapter.client().calls(), vec!["connect".to_string()]);
    }

    #[tokio::test]
    async fn test_connect_failure_is_connection_error() {
        let client = FakeClient::with_home();
        client.refuse_connect.store(true, Ordering::SeqCst);
        let adapter = SftpAdapter::new("remote", "/home/u", client);

        let err = adapter.connect().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(err.prefix(), Some("remote"));
    }

    #[tokio::test]
    async fn test_request_without_session_is_connection_error() {
        let adapter = SftpAdapter::new("remote", "/home/u", FakeClient::with_home());
        let err = adapter.get_file("a.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[tokio::test]
    async fn test_write_read_append() {
        let adapter = connected().await;
        adapter.write_text_file("notes/a.txt", "hello", false).await.unwrap();
        adapter.append_text_file("notes/a.txt", " world").await.unwrap();
        assert_eq!(
            adapter.read_text_file("notes/a.txt").await.unwrap(),
            "hello world"
        );

        let file = adapter.get_file("notes/a.txt").await.unwrap();
        assert_eq!(file.path, "/home/u/notes/a.txt");
        assert_eq!(file.virtual_path, "remote://notes/a.txt");
        assert_eq!(file.size, 11);
        assert!(adapter.client().calls().contains(&"mkdir /home/u/notes".to_string()));
    }

    #[tokio::test]
    async fn test_write_without_overwrite_makes_no_write_call() {
        let adapter = connected().await;
        adapter.write_file("a.txt", b"one", false).await.unwrap();
        adapter.client().calls.lock().clear();

        let err = adapter.write_file("a.txt", b"two", false).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileAlreadyExists);
        assert!(adapter.client().mutations().is_empty());
        assert_eq!(adapter.read_file("a.txt").await.unwrap(), b"one");

        adapter.write_file("a.txt", b"two", true).await.unwrap();
        assert_eq!(adapter.read_file("a.txt").await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_file_and_directory_do_not_cross() {
        let adapter = connected().await;
        adapter.create_directory("dir").await.unwrap();
        adapter.write_file("file", b"x", false).await.unwrap();

        assert_eq!(
            adapter.get_file("dir").await.unwrap_err().kind(),
            ErrorKind::FileNotFound
        );
        assert_eq!(
            adapter.get_directory("file").await.unwrap_err().kind(),
            ErrorKind::DirectoryNotFound
        );
        assert_eq!(
            adapter.list_files("file").await.unwrap_err().kind(),
            ErrorKind::DirectoryNotFound
        );
    }

    #[tokio::test]
    async fn test_delete_missing_makes_no_remove_call() {
        let adapter = connected().await;
        let err = adapter.delete_file("ghost.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        let err = adapter.delete_directory("ghost", true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DirectoryNotFound);
        let err = adapter.append_file("ghost.txt", b"x").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert!(adapter.client().mutations().is_empty());
    }

    #[tokio::test]
    async fn test_listing_splits_files_and_directories() {
        let adapter = connected().await;
        adapter.create_directory("d/sub").await.unwrap();
        adapter.write_file("d/one.txt", b"1", false).await.unwrap();
        adapter.write_file("d/two.txt", b"22", false).await.unwrap();

        let files = adapter.list_files("d").await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["one.txt", "two.txt"]);
        assert_eq!(files[1].size, 2);

        let dirs = adapter.list_directories("d").await.unwrap();
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].virtual_path, "remote://d/sub");
    }

    #[tokio::test]
    async fn test_recursive_delete_removes_children_first() {
        let adapter = connected().await;
        adapter.write_file("t/a.txt", b"a", false).await.unwrap();
        adapter.write_file("t/inner/b.txt", b"b", false).await.unwrap();
        adapter.client().calls.lock().clear();

        adapter.delete_directory("t", true).await.unwrap();
        assert!(!adapter.directory_exists("t").await.unwrap());

        let calls = adapter.client().calls();
        let position = |call: &str| calls.iter().position(|c| c == call).unwrap();
        assert!(position("rm /home/u/t/inner/b.txt") < position("rmdir /home/u/t/inner"));
        assert!(position("rmdir /home/u/t/inner") < position("rmdir /home/u/t"));
    }

    #[tokio::test]
    async fn test_recursive_delete_unlinks_symlinks() {
        let adapter = connected().await;
        let client = adapter.client();
        client.insert("/srv", Node::Dir);
        client.insert("/srv/other", Node::Dir);
        client.insert("/srv/other/precious.txt", Node::File(b"keep".to_vec()));
        adapter.write_file("t/a.txt", b"a", false).await.unwrap();
        client.insert("/home/u/t/link", Node::Link("/srv/other".into()));
        client.insert("/home/u/t/broken", Node::Link("/srv/gone".into()));

        let dirs = adapter.list_directories("t").await.unwrap();
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].name, "link");
        client.calls.lock().clear();

        adapter.delete_directory("t", true).await.unwrap();
        assert!(!adapter.directory_exists("t").await.unwrap());

        let calls = client.calls();
        assert!(calls.contains(&"rm /home/u/t/link".to_string()));
        assert!(calls.contains(&"rm /home/u/t/broken".to_string()));
        assert!(!calls.iter().any(|c| c.starts_with("rm /home/u/t/link/")));
        assert!(matches!(
            client.nodes.lock().get("/srv/other/precious.txt"),
            Some(Node::File(data)) if data == b"keep"
        ));
    }

    #[tokio::test]
    async fn test_delete_root_refused() {
        let adapter = connected().await;
        adapter.write_file("keep.txt", b"k", false).await.unwrap();
        adapter.client().calls.lock().clear();

        for root in ["", ".", "sub/.."] {
            let err = adapter.delete_directory(root, true).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Runtime);
        }
        assert!(adapter.client().mutations().is_empty());
        assert!(adapter.file_exists("keep.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_non_recursive_delete_of_non_empty_is_runtime() {
        let adapter = connected().await;
        adapter.write_file("t/a.txt", b"a", false).await.unwrap();

        let err = adapter.delete_directory("t", false).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Runtime);
        assert!(adapter.file_exists("t/a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_file() {
        let adapter = connected().await;
        let file = adapter.create_file("new/empty.txt").await.unwrap();
        assert_eq!(file.size, 0);
        let err = adapter.create_file("new/empty.txt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileAlreadyExists);
    }

    #[tokio::test]
    async fn test_traversal_rejected_before_transport() {
        let adapter = connected().await;
        let err = adapter.read_file("../../etc/passwd").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPath);
        assert!(adapter.client().calls().is_empty());
    }

    #[tokio::test]
    async fn test_dispose_closes_session() {
        let adapter = connected().await;
        adapter.dispose().await.unwrap();
        assert!(!adapter.client().is_connected().await);
        // reconnects lazily
        adapter.connect().await.unwrap();
        assert!(adapter.client().is_connected().await);
    }
}
