#![allow(dead_code)]
use std::fs;
use std::io::Result as IoResult;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// A temporary directory holding Lua sources and a fake compiler.
pub struct TestProject {
    /// Removed with its contents when dropped.
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl TestProject {
    pub fn new() -> IoResult<Self> {
        let temp_dir = tempdir()?;
        let root = temp_dir.path().join("project");
        fs::create_dir_all(&root)?;
        Ok(TestProject { temp_dir, root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Writes `contents` to `name` under the project root.
    pub fn write(&self, name: &str, contents: &str) -> IoResult<PathBuf> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Creates an executable shell script standing in for `luac`. `body`
    /// runs after the shebang; stdin still holds the document text.
    #[cfg(unix)]
    pub fn fake_compiler(&self, name: &str, body: &str) -> IoResult<PathBuf> {
        use std::os::unix::fs::PermissionsExt;
        let path = self.temp_dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body))?;
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms)?;
        Ok(path)
    }

    /// A fake compiler that swallows stdin, prints `stderr` and exits with
    /// `code`.
    #[cfg(unix)]
    pub fn compiler_printing(&self, name: &str, stderr: &str, code: i32) -> IoResult<PathBuf> {
        self.fake_compiler(
            name,
            &format!("cat > /dev/null\ncat >&2 <<'LUALINTER_EOF'\n{}\nLUALINTER_EOF\nexit {}", stderr, code),
        )
    }
}
