#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// A schema with one report covering every column kind plus a declared
/// but inactive column.
pub const SAMPLE_SCHEMA: &str = r#"
table_sql: SystemIndex_1_PropertyStore
reports:
  - title: My Report
    columns:
      - title: WorkId
        kind: Integer
      - title: Status
        sql:
          name: "7"
        kind: String
      - title: GatherTime
        sql:
          name: "11"
        kind: DateTime
      - title: ScopeID
        sql:
          name: "414"
        kind: GUID
      - title: Inactive
        kind: String
"#;
