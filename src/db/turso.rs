use crate::types::{
    Account, AccountFilter, AccountPage, AccountPatch, ActivityLogEntry, AppError, Court,
    NewAccount, NewActivityLog, ResetTokenRecord, Result,
};
use chrono::Utc;
use libsql::{params::Params, Builder, Connection, Database, Row, Value};

const ACCOUNT_COLUMNS: &str = "id, email, password_hash, name, job_title, permission, status, \
     court_id, region_id, last_access_at, reset_token_hash, reset_token_expires_at, \
     created_at, updated_at";

const COURT_COLUMNS: &str = "id, name, acronym, region_id";

/// libsql-backed store for accounts, courts and the activity log.
///
/// A single connection is kept open for the client's lifetime. An in-memory
/// database only exists for as long as the connection that created it.
pub struct TursoClient {
    _db: Database,
    conn: Connection,
}

fn db_err(e: libsql::Error) -> AppError {
    AppError::Database(e.to_string())
}

fn is_unique_violation(e: &libsql::Error) -> bool {
    e.to_string().contains("UNIQUE constraint failed")
}

/// Maps a write error to `Conflict` when it is a UNIQUE violation.
///
/// With `RETURNING`, SQLite reports the violation when the first row is
/// stepped, so this must wrap both `query()` and `rows.next()`.
fn write_err(
    conflict: &'static str,
    context: &'static str,
) -> impl Fn(libsql::Error) -> AppError {
    move |e| {
        if is_unique_violation(&e) {
            AppError::Conflict(conflict.to_string())
        } else {
            AppError::Database(format!("{}: {}", context, e))
        }
    }
}

/// Substring pattern for `LIKE ... ESCAPE '\'` with `%`, `_` and `\` taken literally.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn opt_int(value: Option<i64>) -> Value {
    value.map(Value::Integer).unwrap_or(Value::Null)
}

fn opt_text(value: Option<&str>) -> Value {
    value
        .map(|s| Value::Text(s.to_string()))
        .unwrap_or(Value::Null)
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn get_opt_int(row: &Row, idx: i32) -> Result<Option<i64>> {
    match row.get_value(idx).map_err(db_err)? {
        Value::Null => Ok(None),
        Value::Integer(v) => Ok(Some(v)),
        other => Err(AppError::Database(format!(
            "expected integer in column {}, got {:?}",
            idx, other
        ))),
    }
}

fn get_opt_text(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx).map_err(db_err)? {
        Value::Null => Ok(None),
        Value::Text(v) => Ok(Some(v)),
        other => Err(AppError::Database(format!(
            "expected text in column {}, got {:?}",
            idx, other
        ))),
    }
}

fn parse_column<T>(row: &Row, idx: i32) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.get(idx).map_err(db_err)?;
    raw.parse::<T>()
        .map_err(|e| AppError::Database(format!("column {}: {}", idx, e)))
}

fn row_to_account(row: &Row) -> Result<Account> {
    let reset_hash = get_opt_text(row, 10)?;
    let reset_expiry = get_opt_int(row, 11)?;
    let reset_token = match (reset_hash, reset_expiry) {
        (Some(hash), Some(expires_at)) => Some(ResetTokenRecord { hash, expires_at }),
        (None, None) => None,
        _ => {
            return Err(AppError::Database(
                "reset token hash and expiry out of step".to_string(),
            ))
        }
    };

    Ok(Account {
        id: row.get(0).map_err(db_err)?,
        email: row.get(1).map_err(db_err)?,
        password_hash: row.get(2).map_err(db_err)?,
        name: row.get(3).map_err(db_err)?,
        job_title: parse_column(row, 4)?,
        permission: parse_column(row, 5)?,
        status: parse_column(row, 6)?,
        court_id: get_opt_int(row, 7)?,
        region_id: get_opt_int(row, 8)?,
        last_access_at: get_opt_int(row, 9)?,
        reset_token,
        created_at: row.get(12).map_err(db_err)?,
        updated_at: row.get(13).map_err(db_err)?,
    })
}

fn row_to_court(row: &Row) -> Result<Court> {
    Ok(Court {
        id: row.get(0).map_err(db_err)?,
        nome: row.get(1).map_err(db_err)?,
        sigla: row.get(2).map_err(db_err)?,
        regiao_id: get_opt_int(row, 3)?,
    })
}

impl TursoClient {
    /// Open a remote Turso database
    pub async fn new_remote(url: String, auth_token: String) -> Result<Self> {
        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Turso: {}", e)))?;

        Self::from_database(db).await
    }

    /// Open (or create) a local SQLite file
    pub async fn new_local(path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Database(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        Self::from_database(db).await
    }

    /// Open an ephemeral in-memory database
    pub async fn new_memory() -> Result<Self> {
        Self::new_local(":memory:").await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let client = Self { _db: db, conn };
        client.initialize_schema().await?;

        Ok(client)
    }

    async fn initialize_schema(&self) -> Result<()> {
        // Users table
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    email TEXT UNIQUE NOT NULL,
                    password_hash TEXT NOT NULL,
                    name TEXT NOT NULL,
                    job_title TEXT NOT NULL
                        CHECK (job_title IN ('magistrado', 'servidor')),
                    permission TEXT NOT NULL
                        CHECK (permission IN ('administrador_nacional', 'administrador_regional', 'operador')),
                    status TEXT NOT NULL DEFAULT 'ativo'
                        CHECK (status IN ('ativo', 'inativo')),
                    court_id INTEGER,
                    region_id INTEGER,
                    last_access_at INTEGER,
                    reset_token_hash TEXT,
                    reset_token_expires_at INTEGER,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL,
                    CHECK ((reset_token_hash IS NULL) = (reset_token_expires_at IS NULL))
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        self.conn
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_users_reset_token_hash
                 ON users (reset_token_hash)",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create users index: {}", e)))?;

        // Courts table
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS courts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    acronym TEXT UNIQUE NOT NULL,
                    region_id INTEGER,
                    created_at INTEGER NOT NULL
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create courts table: {}", e)))?;

        // Activity log; rows outlive the accounts they mention
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS activity_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    action TEXT NOT NULL,
                    entity TEXT NOT NULL,
                    entity_id INTEGER,
                    description TEXT NOT NULL,
                    ip_address TEXT,
                    user_agent TEXT,
                    created_at INTEGER NOT NULL
                )",
                (),
            )
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to create activity_logs table: {}", e))
            })?;

        self.conn
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_activity_logs_user
                 ON activity_logs (user_id, created_at)",
                (),
            )
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to create activity_logs index: {}", e))
            })?;

        Ok(())
    }

    async fn query_one_account(&self, sql: &str, params: Params) -> Result<Option<Account>> {
        let mut rows = self
            .conn
            .query(sql, params)
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    // Account operations
    pub async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.query_one_account(
            &format!("SELECT {} FROM users WHERE email = ?", ACCOUNT_COLUMNS),
            Params::Positional(vec![text(email)]),
        )
        .await
    }

    pub async fn find_account_by_id(&self, id: i64) -> Result<Option<Account>> {
        self.query_one_account(
            &format!("SELECT {} FROM users WHERE id = ?", ACCOUNT_COLUMNS),
            Params::Positional(vec![Value::Integer(id)]),
        )
        .await
    }

    pub async fn find_account_by_reset_token_hash(
        &self,
        hash: &str,
        now: i64,
    ) -> Result<Option<Account>> {
        self.query_one_account(
            &format!(
                "SELECT {} FROM users
                 WHERE reset_token_hash = ? AND reset_token_expires_at > ?",
                ACCOUNT_COLUMNS
            ),
            Params::Positional(vec![text(hash), Value::Integer(now)]),
        )
        .await
    }

    pub async fn create_account(&self, account: &NewAccount) -> Result<Account> {
        let now = Utc::now().timestamp();

        let mut rows = self
            .conn
            .query(
                &format!(
                    "INSERT INTO users (email, password_hash, name, job_title, permission,
                         status, court_id, region_id, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                     RETURNING {}",
                    ACCOUNT_COLUMNS
                ),
                Params::Positional(vec![
                    text(&account.email),
                    text(&account.password_hash),
                    text(&account.name),
                    text(account.job_title.as_str()),
                    text(account.permission.as_str()),
                    text(account.status.as_str()),
                    opt_int(account.court_id),
                    opt_int(account.region_id),
                    Value::Integer(now),
                    Value::Integer(now),
                ]),
            )
            .await
            .map_err(write_err("Email já está em uso", "Failed to create user"))?;

        let row = rows
            .next()
            .await
            .map_err(write_err("Email já está em uso", "Failed to create user"))?
            .ok_or_else(|| AppError::Database("INSERT returned no row".to_string()))?;

        row_to_account(&row)
    }

    pub async fn update_account(&self, id: i64, patch: &AccountPatch) -> Result<Option<Account>> {
        if patch.is_empty() {
            return self.find_account_by_id(id).await;
        }

        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(ref email) = patch.email {
            sets.push("email = ?");
            values.push(text(email));
        }
        if let Some(ref name) = patch.name {
            sets.push("name = ?");
            values.push(text(name));
        }
        if let Some(ref password_hash) = patch.password_hash {
            sets.push("password_hash = ?");
            values.push(text(password_hash));
        }
        if let Some(job_title) = patch.job_title {
            sets.push("job_title = ?");
            values.push(text(job_title.as_str()));
        }
        if let Some(permission) = patch.permission {
            sets.push("permission = ?");
            values.push(text(permission.as_str()));
        }
        if let Some(status) = patch.status {
            sets.push("status = ?");
            values.push(text(status.as_str()));
        }
        if let Some(court_id) = patch.court_id {
            sets.push("court_id = ?");
            values.push(opt_int(court_id));
        }
        if let Some(region_id) = patch.region_id {
            sets.push("region_id = ?");
            values.push(opt_int(region_id));
        }
        if let Some(ref reset_token) = patch.reset_token {
            sets.push("reset_token_hash = ?");
            sets.push("reset_token_expires_at = ?");
            values.push(opt_text(reset_token.as_ref().map(|r| r.hash.as_str())));
            values.push(opt_int(reset_token.as_ref().map(|r| r.expires_at)));
        }

        sets.push("updated_at = ?");
        values.push(Value::Integer(Utc::now().timestamp()));
        values.push(Value::Integer(id));

        let sql = format!(
            "UPDATE users SET {} WHERE id = ? RETURNING {}",
            sets.join(", "),
            ACCOUNT_COLUMNS
        );

        let mut rows = self
            .conn
            .query(&sql, Params::Positional(values))
            .await
            .map_err(write_err("Email já está em uso", "Failed to update user"))?;

        match rows
            .next()
            .await
            .map_err(write_err("Email já está em uso", "Failed to update user"))?
        {
            Some(row) => Ok(Some(row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn redeem_reset_token(
        &self,
        hash: &str,
        now: i64,
        new_password_hash: &str,
    ) -> Result<Option<Account>> {
        self.query_one_account(
            &format!(
                "UPDATE users
                 SET password_hash = ?, reset_token_hash = NULL,
                     reset_token_expires_at = NULL, updated_at = ?
                 WHERE reset_token_hash = ? AND reset_token_expires_at > ?
                 RETURNING {}",
                ACCOUNT_COLUMNS
            ),
            Params::Positional(vec![
                text(new_password_hash),
                Value::Integer(now),
                text(hash),
                Value::Integer(now),
            ]),
        )
        .await
    }

    pub async fn clear_reset_token_if_matches(&self, account_id: i64, hash: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute(
                "UPDATE users
                 SET reset_token_hash = NULL, reset_token_expires_at = NULL, updated_at = ?
                 WHERE id = ? AND reset_token_hash = ?",
                Params::Positional(vec![
                    Value::Integer(Utc::now().timestamp()),
                    Value::Integer(account_id),
                    text(hash),
                ]),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to clear reset token: {}", e)))?;

        Ok(affected > 0)
    }

    pub async fn touch_last_access(&self, account_id: i64, at: i64) -> Result<()> {
        self.conn
            .execute(
                "UPDATE users SET last_access_at = ? WHERE id = ?",
                (at, account_id),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update last access: {}", e)))?;

        Ok(())
    }

    pub async fn list_accounts(&self, filter: &AccountFilter) -> Result<AccountPage> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(ref search) = filter.search {
            let pattern = like_pattern(search);
            clauses.push("(name LIKE ? ESCAPE '\\' OR email LIKE ? ESCAPE '\\')");
            values.push(Value::Text(pattern.clone()));
            values.push(Value::Text(pattern));
        }
        if let Some(permission) = filter.permission {
            clauses.push("permission = ?");
            values.push(text(permission.as_str()));
        }
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(text(status.as_str()));
        }
        if let Some(court_id) = filter.court_id {
            clauses.push("court_id = ?");
            values.push(Value::Integer(court_id));
        }
        if let Some(region_id) = filter.region_id {
            clauses.push("region_id = ?");
            values.push(Value::Integer(region_id));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let mut count_rows = self
            .conn
            .query(
                &format!("SELECT COUNT(*) FROM users{}", where_sql),
                Params::Positional(values.clone()),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to count users: {}", e)))?;
        let total: i64 = match count_rows.next().await.map_err(db_err)? {
            Some(row) => row.get(0).map_err(db_err)?,
            None => 0,
        };

        let limit = filter.limit.max(1);
        let offset = (filter.page.max(1) as i64 - 1) * limit as i64;
        values.push(Value::Integer(limit as i64));
        values.push(Value::Integer(offset));

        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {} FROM users{} ORDER BY name ASC, id ASC LIMIT ? OFFSET ?",
                    ACCOUNT_COLUMNS, where_sql
                ),
                Params::Positional(values),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to list users: {}", e)))?;

        let mut accounts = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            accounts.push(row_to_account(&row)?);
        }

        Ok(AccountPage {
            accounts,
            total: total.max(0) as u64,
        })
    }

    pub async fn delete_account(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM users WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete user: {}", e)))?;

        Ok(affected > 0)
    }

    // Activity log operations
    pub async fn append_activity_log(&self, entry: &NewActivityLog) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO activity_logs
                 (user_id, action, entity, entity_id, description, ip_address, user_agent, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                Params::Positional(vec![
                    Value::Integer(entry.account_id),
                    text(entry.action.as_str()),
                    text(&entry.entity),
                    opt_int(entry.entity_id),
                    text(&entry.description),
                    opt_text(entry.ip.as_deref()),
                    opt_text(entry.user_agent.as_deref()),
                    Value::Integer(Utc::now().timestamp()),
                ]),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to append activity log: {}", e)))?;

        Ok(())
    }

    pub async fn list_activity_logs(
        &self,
        account_id: i64,
        limit: u32,
    ) -> Result<Vec<ActivityLogEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, user_id, action, entity, entity_id, description, ip_address,
                        user_agent, created_at
                 FROM activity_logs WHERE user_id = ?
                 ORDER BY created_at DESC, id DESC LIMIT ?",
                (account_id, limit as i64),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query activity logs: {}", e)))?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            entries.push(ActivityLogEntry {
                id: row.get(0).map_err(db_err)?,
                usuario_id: row.get(1).map_err(db_err)?,
                acao: parse_column(&row, 2)?,
                entidade: row.get(3).map_err(db_err)?,
                entidade_id: get_opt_int(&row, 4)?,
                descricao: row.get(5).map_err(db_err)?,
                ip_address: get_opt_text(&row, 6)?,
                user_agent: get_opt_text(&row, 7)?,
                created_at: row.get(8).map_err(db_err)?,
            });
        }

        Ok(entries)
    }

    // Court operations
    pub async fn create_court(
        &self,
        name: &str,
        acronym: &str,
        region_id: Option<i64>,
    ) -> Result<Court> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "INSERT INTO courts (name, acronym, region_id, created_at)
                     VALUES (?, ?, ?, ?) RETURNING {}",
                    COURT_COLUMNS
                ),
                Params::Positional(vec![
                    text(name),
                    text(acronym),
                    opt_int(region_id),
                    Value::Integer(Utc::now().timestamp()),
                ]),
            )
            .await
            .map_err(write_err("Sigla já está em uso", "Failed to create court"))?;

        let row = rows
            .next()
            .await
            .map_err(write_err("Sigla já está em uso", "Failed to create court"))?
            .ok_or_else(|| AppError::Database("INSERT returned no row".to_string()))?;

        row_to_court(&row)
    }

    pub async fn find_court_by_id(&self, id: i64) -> Result<Option<Court>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {} FROM courts WHERE id = ?", COURT_COLUMNS),
                [id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query court: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(row_to_court(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_courts(&self, region_id: Option<i64>) -> Result<Vec<Court>> {
        let mut rows = match region_id {
            Some(region_id) => {
                self.conn
                    .query(
                        &format!(
                            "SELECT {} FROM courts WHERE region_id = ? ORDER BY name ASC",
                            COURT_COLUMNS
                        ),
                        [region_id],
                    )
                    .await
            }
            None => {
                self.conn
                    .query(
                        &format!("SELECT {} FROM courts ORDER BY name ASC", COURT_COLUMNS),
                        (),
                    )
                    .await
            }
        }
        .map_err(|e| AppError::Database(format!("Failed to list courts: {}", e)))?;

        let mut courts = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            courts.push(row_to_court(&row)?);
        }

        Ok(courts)
    }
}
