use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, Statement, TransactionTrait,
};
use tokio::sync::Mutex;
use typed_builder::TypedBuilder;

/// A buffered write.
pub enum PendingStatement {
    Plain(Statement),
    /// Must change a row, otherwise the whole unit is rolled back.
    Guarded { statement: Statement, context: String },
}

impl PendingStatement {
    fn statement(&self) -> &Statement {
        match self {
            Self::Plain(statement) | Self::Guarded { statement, .. } => statement,
        }
    }

    fn check(&self, rows_affected: u64) -> anyhow::Result<()> {
        match self {
            Self::Guarded { context, .. } if rows_affected == 0 => {
                anyhow::bail!("Guarded write matched no row: {context}")
            }
            _ => Ok(()),
        }
    }
}

/// Sea-orm store implementing every repository over one write buffer.
#[derive(TypedBuilder)]
pub struct OrmRepo {
    pub db: Arc<DatabaseConnection>,
    #[builder(default)]
    pub statements: Arc<Mutex<Vec<PendingStatement>>>,
    #[builder(default = AtomicBool::new(true))]
    pub can_drop: AtomicBool,
}

impl OrmRepo {
    pub fn conn(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    pub fn backend(&self) -> DbBackend {
        self.db.get_database_backend()
    }

    pub async fn push(&self, statement: PendingStatement) {
        self.statements.lock().await.push(statement);
        self.can_drop.store(false, Ordering::Relaxed);
    }

    pub async fn save_changed(&self) -> anyhow::Result<bool> {
        if self.can_drop.load(Ordering::Relaxed) {
            return Ok(false);
        }
        let mut stmts = self.statements.lock().await;
        let trans = self.db.begin().await?;
        for stmt in stmts.iter() {
            let res = trans
                .execute(stmt.statement().clone())
                .await
                .map_err(anyhow::Error::from)
                .and_then(|res| stmt.check(res.rows_affected()));
            if let Err(e) = res {
                stmts.clear();
                self.can_drop.store(true, Ordering::Relaxed);
                trans.rollback().await?;
                return Err(e);
            }
        }
        trans.commit().await?;
        self.can_drop.store(true, Ordering::Relaxed);
        stmts.clear();
        Ok(true)
    }

    pub async fn discard_changed(&self) -> anyhow::Result<()> {
        let mut stmts = self.statements.lock().await;
        if !stmts.is_empty() {
            tracing::debug!(count = stmts.len(), "Discard buffered statements.");
        }
        stmts.clear();
        self.can_drop.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Next value of a Postgres sequence.
    pub async fn next_val(&self, sequence: &str) -> anyhow::Result<u64> {
        let row = self
            .conn()
            .query_one(Statement::from_string(
                self.backend(),
                format!("SELECT nextval('{sequence}') AS id"),
            ))
            .await?
            .ok_or(anyhow::anyhow!("Sequence {sequence} returned nothing."))?;
        let id: i64 = row.try_get("", "id")?;
        Ok(id as u64)
    }
}

impl Drop for OrmRepo {
    fn drop(&mut self) {
        if !self.can_drop.load(Ordering::Relaxed) {
            if let Ok(stmts) = self.statements.try_lock() {
                let sqls = stmts
                    .iter()
                    .map(|x| x.statement().to_string())
                    .collect::<Vec<String>>()
                    .join("\n");
                tracing::trace!("Unused sql statements:\n{sqls}")
            }
        }
    }
}
