#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use rusqlite::Connection;
use rust_xlsxwriter::Workbook;
use tempfile::{TempDir, tempdir};

pub const PLAYER_HEADER: &str = "family_id,serial_number,year,player_id,ch_name,nickname,grade,school_name,jersey_number,sibling,staff,status";

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
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }

    /// Writes a player roster CSV whose data lines follow [`PLAYER_HEADER`].
    pub fn write_roster(&self, name: &str, lines: &[&str]) -> PathBuf {
        let mut contents = String::from(PLAYER_HEADER);
        contents.push('\n');
        for line in lines {
            contents.push_str(line);
            contents.push('\n');
        }
        self.write(name, &contents)
    }

    /// Writes a single-sheet workbook. `None` cells are left blank.
    pub fn write_workbook(
        &self,
        name: &str,
        sheet: &str,
        headers: &[&str],
        rows: &[Vec<Option<SheetCell>>],
    ) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet).expect("sheet name");
        for (col, header) in headers.iter().enumerate() {
            worksheet
                .write_string(0, col as u16, *header)
                .expect("write header");
        }
        for (row_idx, row) in rows.iter().enumerate() {
            let row_num = row_idx as u32 + 1;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match cell {
                    Some(SheetCell::Text(text)) => {
                        worksheet
                            .write_string(row_num, col, text.as_str())
                            .expect("write text cell");
                    }
                    Some(SheetCell::Number(number)) => {
                        worksheet
                            .write_number(row_num, col, *number)
                            .expect("write number cell");
                    }
                    None => {}
                }
            }
        }
        workbook.save(&path).expect("save workbook");
        path
    }

    pub fn database(&self) -> PathBuf {
        self.temp_dir.path().join("baseball.db")
    }
}

#[derive(Debug, Clone)]
pub enum SheetCell {
    Text(String),
    Number(f64),
}

pub fn text(value: &str) -> Option<SheetCell> {
    Some(SheetCell::Text(value.to_string()))
}

pub fn number(value: f64) -> Option<SheetCell> {
    Some(SheetCell::Number(value))
}

pub fn roster_import() -> Command {
    let mut cmd = Command::cargo_bin("roster-import").expect("binary exists");
    cmd.env_remove("RUST_LOG");
    cmd
}

pub fn open_database(path: &Path) -> Connection {
    Connection::open(path).expect("open database")
}

pub fn count_players(path: &Path) -> i64 {
    open_database(path)
        .query_row("SELECT COUNT(*) FROM player", [], |row| row.get(0))
        .expect("count players")
}
