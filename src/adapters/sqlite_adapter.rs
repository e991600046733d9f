//! SQLite lifecycle record adapter.

use crate::domain::error::TokensimError;
use crate::domain::lifecycle::{LifecycleRecord, Outcome};
use crate::ports::config_port::ConfigPort;
use crate::ports::lifecycle_port::LifecyclePort;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Row};

const SELECT_COLUMNS: &str = "token_mint, symbol, discovered_at, initial_price, initial_liquidity,
    initial_risk_score, initial_holders, initial_top10_percent, token_age_minutes,
    peak_price, peak_at, time_to_peak_secs, final_price, final_liquidity,
    outcome, outcome_recorded_at, mint_revoked, freeze_revoked, lp_locked,
    has_twitter, has_telegram, has_website, smart_money_buys";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TokensimError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| TokensimError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| TokensimError::Database {
                    reason: e.to_string(),
                })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, TokensimError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| TokensimError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, TokensimError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| TokensimError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), TokensimError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS lifecycles (
                token_mint TEXT PRIMARY KEY,
                symbol TEXT,
                discovered_at INTEGER NOT NULL,
                initial_price REAL NOT NULL,
                initial_liquidity REAL,
                initial_risk_score REAL,
                initial_holders INTEGER,
                initial_top10_percent REAL,
                token_age_minutes REAL,
                peak_price REAL NOT NULL,
                peak_at INTEGER,
                time_to_peak_secs INTEGER,
                final_price REAL NOT NULL,
                final_liquidity REAL,
                outcome TEXT NOT NULL,
                outcome_recorded_at INTEGER,
                mint_revoked INTEGER,
                freeze_revoked INTEGER,
                lp_locked INTEGER,
                has_twitter INTEGER,
                has_telegram INTEGER,
                has_website INTEGER,
                smart_money_buys INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_lifecycles_discovered ON lifecycles(discovered_at);",
        )
        .map_err(|e: rusqlite::Error| TokensimError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Upsert records keyed by mint.
    pub fn insert_records(&self, records: &[LifecycleRecord]) -> Result<(), TokensimError> {
        let mut conn = self.conn()?;

        let tx =
            conn.transaction()
                .map_err(|e: rusqlite::Error| TokensimError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        for r in records {
            tx.execute(
                &format!(
                    "INSERT OR REPLACE INTO lifecycles ({SELECT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                             ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)"
                ),
                params![
                    r.token_mint,
                    r.symbol,
                    r.discovered_at,
                    r.initial_price,
                    r.initial_liquidity,
                    r.initial_risk_score,
                    r.initial_holders.and_then(|h| i64::try_from(h).ok()),
                    r.initial_top10_percent,
                    r.token_age_minutes,
                    r.peak_price,
                    r.peak_at,
                    r.time_to_peak_secs,
                    r.final_price,
                    r.final_liquidity,
                    r.outcome.as_str(),
                    r.outcome_recorded_at,
                    r.mint_revoked,
                    r.freeze_revoked,
                    r.lp_locked,
                    r.has_twitter,
                    r.has_telegram,
                    r.has_website,
                    r.smart_money_buys,
                ],
            )
            .map_err(|e: rusqlite::Error| TokensimError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| TokensimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<LifecycleRecord> {
    let outcome: String = row.get(14)?;
    let holders: Option<i64> = row.get(6)?;
    Ok(LifecycleRecord {
        token_mint: row.get(0)?,
        symbol: row.get(1)?,
        discovered_at: row.get(2)?,
        initial_price: row.get(3)?,
        initial_liquidity: row.get(4)?,
        initial_risk_score: row.get(5)?,
        initial_holders: holders.and_then(|h| u64::try_from(h).ok()),
        initial_top10_percent: row.get(7)?,
        token_age_minutes: row.get(8)?,
        peak_price: row.get(9)?,
        peak_at: row.get(10)?,
        time_to_peak_secs: row.get(11)?,
        final_price: row.get(12)?,
        final_liquidity: row.get(13)?,
        outcome: Outcome::parse(&outcome),
        outcome_recorded_at: row.get(15)?,
        mint_revoked: row.get(16)?,
        freeze_revoked: row.get(17)?,
        lp_locked: row.get(18)?,
        has_twitter: row.get(19)?,
        has_telegram: row.get(20)?,
        has_website: row.get(21)?,
        smart_money_buys: row.get(22)?,
    })
}

impl LifecyclePort for SqliteAdapter {
    fn get_lifecycle_records(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<LifecycleRecord>, TokensimError> {
        let conn = self.conn()?;

        let query = format!(
            "SELECT {SELECT_COLUMNS}
             FROM lifecycles
             WHERE discovered_at >= ?1 AND discovered_at <= ?2
             ORDER BY discovered_at ASC, token_mint ASC"
        );

        let mut stmt =
            conn.prepare(&query)
                .map_err(|e: rusqlite::Error| TokensimError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map(params![start, end], map_row)
            .map_err(|e: rusqlite::Error| TokensimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(
                row.map_err(|e: rusqlite::Error| TokensimError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(records)
    }

    fn get_data_range(&self) -> Result<Option<(i64, i64, usize)>, TokensimError> {
        let conn = self.conn()?;

        let query = "SELECT MIN(discovered_at), MAX(discovered_at), COUNT(*) FROM lifecycles";

        let result: (Option<i64>, Option<i64>, i64) = conn
            .query_row(query, [], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .map_err(|e: rusqlite::Error| TokensimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        match result {
            (Some(min), Some(max), count) if count > 0 => Ok(Some((min, max, count as usize))),
            _ => Ok(None),
        }
    }
}
