//! SQLite-backed destination store.
//!
//! A run owns one [`SqliteStore`] from open to close. Rows are written through
//! an [`ImportBatch`], which wraps an explicit transaction: nothing becomes
//! visible until [`ImportBatch::commit`], and a batch dropped on an error path
//! rolls back.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use log::debug;
use rusqlite::{
    Connection, Transaction, TransactionBehavior, params_from_iter,
    types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef},
};

use crate::{
    data::Value,
    error::{ImportError, ImportResult},
    record::ImportRecord,
};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Text(text) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::Boolean(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
        })
    }
}

/// `INSERT ... ON CONFLICT (key) DO UPDATE` restricted to the record's mutable
/// columns.
pub fn upsert_statement<R: ImportRecord>() -> String {
    let placeholders = (1..=R::TABLE_COLUMNS.len())
        .map(|idx| format!("?{idx}"))
        .collect::<Vec<_>>()
        .join(", ");
    let action = if R::MUTABLE_COLUMNS.is_empty() {
        "DO NOTHING".to_string()
    } else {
        let assignments = R::MUTABLE_COLUMNS
            .iter()
            .map(|column| format!("{column} = excluded.{column}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("DO UPDATE SET {assignments}")
    };
    format!(
        "INSERT INTO {table} ({columns}) VALUES ({placeholders}) ON CONFLICT ({keys}) {action}",
        table = R::TABLE,
        columns = R::TABLE_COLUMNS.join(", "),
        keys = R::KEY_COLUMNS.join(", "),
    )
}

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    pub fn open(path: &Path) -> ImportResult<Self> {
        let connection_error = |source| ImportError::StoreConnectionFailure {
            database: path.to_path_buf(),
            source,
        };
        let conn = Connection::open(path).map_err(connection_error)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(connection_error)?;
        debug!("Opened store {:?}", path);
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the destination table when it does not exist yet. Existing
    /// tables are left untouched.
    pub fn ensure_table<R: ImportRecord>(&self) -> ImportResult<()> {
        self.conn
            .execute_batch(R::TABLE_DEFINITION)
            .map_err(|source| ImportError::StoreConnectionFailure {
                database: self.path.clone(),
                source,
            })
    }

    pub fn begin<R: ImportRecord>(&mut self) -> ImportResult<ImportBatch<'_, R>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|source| ImportError::StoreConnectionFailure {
                database: self.path.clone(),
                source,
            })?;
        Ok(ImportBatch {
            tx,
            statement: upsert_statement::<R>(),
            rows: 0,
            _record: std::marker::PhantomData,
        })
    }

    pub fn close(self) -> ImportResult<()> {
        let database = self.path;
        self.conn
            .close()
            .map_err(|(_, source)| ImportError::StoreConnectionFailure { database, source })
    }
}

pub struct ImportBatch<'conn, R: ImportRecord> {
    tx: Transaction<'conn>,
    statement: String,
    rows: usize,
    _record: std::marker::PhantomData<R>,
}

impl<R: ImportRecord> ImportBatch<'_, R> {
    /// `line` is the source line the record came from, used in errors.
    pub fn upsert(&mut self, line: usize, record: &R) -> ImportResult<()> {
        let upsert_error = |source| ImportError::RowUpsertFailure {
            row: line,
            table: R::TABLE,
            source,
        };
        let params = record.params();
        let mut statement = self
            .tx
            .prepare_cached(&self.statement)
            .map_err(upsert_error)?;
        statement
            .execute(params_from_iter(params.iter()))
            .map_err(upsert_error)?;
        self.rows += 1;
        debug!("Upserted row {line} into '{}'", R::TABLE);
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Commits every upsert of the batch at once and returns the row count.
    pub fn commit(self) -> ImportResult<usize> {
        let rows = self.rows;
        self.tx.commit().map_err(|source| ImportError::CommitFailure {
            table: R::TABLE,
            source,
        })?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PlayerRecord;
    use tempfile::tempdir;

    fn player(player_id: &str, ch_name: &str, grade: &str) -> PlayerRecord {
        PlayerRecord {
            family_id: "F1".to_string(),
            serial_number: 1,
            year: 2024,
            player_id: player_id.to_string(),
            p_team_id: None,
            ch_name: Some(ch_name.to_string()),
            nickname: None,
            grade: Some(grade.to_string()),
            school_name: None,
            jersey_number: Some("7".to_string()),
            sibling: None,
            staff: None,
            status: Some("active".to_string()),
        }
    }

    fn open_store(dir: &Path) -> SqliteStore {
        let store = SqliteStore::open(&dir.join("baseball.db")).unwrap();
        store.ensure_table::<PlayerRecord>().unwrap();
        store
    }

    fn count_players(store: &SqliteStore) -> i64 {
        store
            .conn
            .query_row("SELECT COUNT(*) FROM player", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn upsert_statement_targets_key_and_mutable_columns() {
        let sql = upsert_statement::<PlayerRecord>();
        assert!(sql.starts_with("INSERT INTO player (family_id, serial_number"));
        assert!(sql.contains("?13)"));
        assert!(sql.contains("ON CONFLICT (family_id, serial_number, year, player_id)"));
        assert!(sql.contains("ch_name = excluded.ch_name"));
        assert!(!sql.contains("grade = excluded.grade"));
    }

    #[test]
    fn repeated_upserts_update_mutable_fields_only() {
        let dir = tempdir().unwrap();
        let mut store = open_store(dir.path());

        let mut batch = store.begin::<PlayerRecord>().unwrap();
        batch.upsert(2, &player("P001", "王小明", "3")).unwrap();
        assert_eq!(batch.commit().unwrap(), 1);

        let mut batch = store.begin::<PlayerRecord>().unwrap();
        batch.upsert(2, &player("P001", "王大明", "4")).unwrap();
        batch.commit().unwrap();

        assert_eq!(count_players(&store), 1);
        let (ch_name, grade): (String, String) = store
            .conn
            .query_row(
                "SELECT ch_name, grade FROM player WHERE player_id = 'P001'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(ch_name, "王大明");
        assert_eq!(grade, "3");
    }

    #[test]
    fn dropped_batch_rolls_back() {
        let dir = tempdir().unwrap();
        let mut store = open_store(dir.path());
        {
            let mut batch = store.begin::<PlayerRecord>().unwrap();
            batch.upsert(2, &player("P001", "王小明", "3")).unwrap();
            batch.upsert(3, &player("P002", "李小華", "2")).unwrap();
            assert_eq!(batch.rows(), 2);
        }
        assert_eq!(count_players(&store), 0);
        store.close().unwrap();
    }

    #[test]
    fn upsert_failures_name_the_source_row() {
        let dir = tempdir().unwrap();
        let mut store = open_store(dir.path());
        store
            .conn
            .execute_batch(
                "CREATE TRIGGER reject_p002 BEFORE INSERT ON player
                 WHEN NEW.player_id = 'P002'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let mut batch = store.begin::<PlayerRecord>().unwrap();
        batch.upsert(2, &player("P001", "王小明", "3")).unwrap();
        let err = batch.upsert(3, &player("P002", "李小華", "2")).unwrap_err();
        assert!(matches!(
            err,
            ImportError::RowUpsertFailure { row: 3, table: "player", .. }
        ));
    }
}
