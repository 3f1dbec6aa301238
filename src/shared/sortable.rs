//! Generic flag and ordering operations shared by every sortable table.
//!
//! Registers, categories and objectives all carry `archived`, `highlighted`,
//! `sort_order`, `updated_by` and `updated_at` columns. The operations here are
//! parameterised by table name and by the column that scopes the ordering.
//! Table and column names come from `'static` constants, never from input.

use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::shared::ordering::{self, MoveDirection};

/// Boolean columns that can be set or flipped without touching anything else
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Archived,
    Highlighted,
    /// Only present on register entries
    Approved,
}

impl Flag {
    fn column(self) -> &'static str {
        match self {
            Flag::Archived => "archived",
            Flag::Highlighted => "highlighted",
            Flag::Approved => "approved",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SortableTable {
    pub table: &'static str,
    /// Column rows are ordered within; `None` orders the whole table as one list
    pub scope_column: Option<&'static str>,
    /// Name used in error messages
    pub entity: &'static str,
}

impl SortableTable {
    pub const fn new(
        table: &'static str,
        scope_column: Option<&'static str>,
        entity: &'static str,
    ) -> Self {
        Self {
            table,
            scope_column,
            entity,
        }
    }

    fn scope_expr(&self) -> &'static str {
        self.scope_column.unwrap_or("NULL::uuid")
    }

    /// Predicate matching rows in the scope bound at `$param`
    fn scope_filter(&self, param: usize) -> String {
        match self.scope_column {
            Some(column) => format!("{} = ${}", column, param),
            None => format!("${}::uuid IS NULL", param),
        }
    }

    fn not_found(&self, id: Uuid) -> AppError {
        AppError::NotFound(format!("{} with id {} not found", self.entity, id))
    }

    /// First free `sort_order` at the end of the scope
    pub async fn next_sort_order<'e, E>(&self, executor: E, scope: Option<Uuid>) -> Result<i32>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM {} WHERE {}",
            self.table,
            self.scope_filter(1)
        );

        sqlx::query_scalar::<_, i32>(&sql)
            .bind(scope)
            .fetch_one(executor)
            .await
            .map_err(AppError::Database)
    }

    pub async fn set_flag(
        &self,
        pool: &PgPool,
        id: Uuid,
        flag: Flag,
        value: bool,
        updated_by: &str,
    ) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET {} = $1, updated_by = $2, updated_at = NOW() WHERE id = $3",
            self.table,
            flag.column()
        );

        let result = sqlx::query(&sql)
            .bind(value)
            .bind(updated_by)
            .bind(id)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(self.not_found(id));
        }

        tracing::info!(
            "{} {}: {} = {} (by {})",
            self.entity,
            id,
            flag.column(),
            value,
            updated_by
        );
        Ok(())
    }

    /// Flip a flag and return its new value
    pub async fn toggle_flag(
        &self,
        pool: &PgPool,
        id: Uuid,
        flag: Flag,
        updated_by: &str,
    ) -> Result<bool> {
        let column = flag.column();
        let sql = format!(
            "UPDATE {table} SET {column} = NOT {column}, updated_by = $1, updated_at = NOW() \
             WHERE id = $2 RETURNING {column}",
            table = self.table,
            column = column
        );

        let value = sqlx::query_scalar::<_, bool>(&sql)
            .bind(updated_by)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| self.not_found(id))?;

        tracing::info!(
            "{} {}: {} toggled to {} (by {})",
            self.entity,
            id,
            column,
            value,
            updated_by
        );
        Ok(value)
    }

    /// Swap `sort_order` with the nearest non-archived neighbour in the scope.
    ///
    /// Returns false when the row is already first (up) or last (down).
    pub async fn swap_with_neighbor(
        &self,
        pool: &PgPool,
        id: Uuid,
        direction: MoveDirection,
    ) -> Result<bool> {
        let mut tx = pool.begin().await.map_err(AppError::Database)?;

        let sql = format!(
            "SELECT sort_order, {} FROM {} WHERE id = $1 FOR UPDATE",
            self.scope_expr(),
            self.table
        );
        let (current, scope): (i32, Option<Uuid>) = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| self.not_found(id))?;

        let (comparison, direction_sql) = match direction {
            MoveDirection::Up => ("<", "DESC"),
            MoveDirection::Down => (">", "ASC"),
        };
        let sql = format!(
            "SELECT id, sort_order FROM {} \
             WHERE archived = FALSE AND id <> $1 AND sort_order {} $2 AND {} \
             ORDER BY sort_order {} LIMIT 1 FOR UPDATE",
            self.table,
            comparison,
            self.scope_filter(3),
            direction_sql
        );
        let neighbor: Option<(Uuid, i32)> = sqlx::query_as(&sql)
            .bind(id)
            .bind(current)
            .bind(scope)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let Some((neighbor_id, neighbor_order)) = neighbor else {
            tracing::debug!("{} {} has no neighbour {:?}", self.entity, id, direction);
            return Ok(false);
        };

        let sql = format!(
            "UPDATE {} SET sort_order = $1, updated_at = NOW() WHERE id = $2",
            self.table
        );
        for (row, order) in [(id, neighbor_order), (neighbor_id, current)] {
            sqlx::query(&sql)
                .bind(order)
                .bind(row)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            "{} {} swapped with {} ({:?})",
            self.entity,
            id,
            neighbor_id,
            direction
        );
        Ok(true)
    }

    /// Assign sequential orders: `requested` first, the rest of the scope after it.
    pub async fn assign_sequence(
        &self,
        pool: &PgPool,
        scope: Option<Uuid>,
        requested: &[Uuid],
    ) -> Result<Vec<Uuid>> {
        let mut tx = pool.begin().await.map_err(AppError::Database)?;

        let current: Vec<Uuid> = self.ids_in_scope(&mut tx, scope).await?;
        let plan = ordering::plan_sequence(&current, requested)?;
        self.write_sequence(&mut tx, &plan).await?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!("Reordered {} {} rows", plan.len(), self.entity);
        Ok(plan)
    }

    /// Drag-and-drop: move a row to a zero-based position among the visible rows of its scope
    pub async fn move_to_position(
        &self,
        pool: &PgPool,
        id: Uuid,
        position: usize,
    ) -> Result<Vec<Uuid>> {
        let mut tx = pool.begin().await.map_err(AppError::Database)?;

        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            self.scope_expr(),
            self.table
        );
        let scope: Option<Uuid> = sqlx::query_scalar::<_, Option<Uuid>>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| self.not_found(id))?;

        let sql = format!(
            "SELECT id, archived FROM {} WHERE {} ORDER BY sort_order, created_at FOR UPDATE",
            self.table,
            self.scope_filter(1)
        );
        let rows: Vec<(Uuid, bool)> = sqlx::query_as(&sql)
            .bind(scope)
            .fetch_all(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let plan = ordering::reposition(&rows, id, position)?;
        self.write_sequence(&mut tx, &plan).await?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!("{} {} moved to position {}", self.entity, id, position);
        Ok(plan)
    }

    async fn ids_in_scope(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        scope: Option<Uuid>,
    ) -> Result<Vec<Uuid>> {
        let sql = format!(
            "SELECT id FROM {} WHERE {} ORDER BY sort_order, created_at FOR UPDATE",
            self.table,
            self.scope_filter(1)
        );

        sqlx::query_scalar::<_, Uuid>(&sql)
            .bind(scope)
            .fetch_all(&mut **tx)
            .await
            .map_err(AppError::Database)
    }

    /// Write `plan[i].sort_order = i` in one statement
    async fn write_sequence(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        plan: &[Uuid],
    ) -> Result<()> {
        let sql = format!(
            "UPDATE {} AS t SET sort_order = (o.position - 1)::int, updated_at = NOW() \
             FROM UNNEST($1::uuid[]) WITH ORDINALITY AS o(id, position) \
             WHERE t.id = o.id",
            self.table
        );

        sqlx::query(&sql)
            .bind(plan)
            .execute(&mut **tx)
            .await
            .map_err(AppError::Database)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCOPED: SortableTable =
        SortableTable::new("register_entries", Some("category_id"), "Entry");
    const GLOBAL: SortableTable = SortableTable::new("objectives", None, "Objective");

    #[test]
    fn test_scope_filter() {
        assert_eq!(SCOPED.scope_filter(3), "category_id = $3");
        assert_eq!(GLOBAL.scope_filter(1), "$1::uuid IS NULL");
    }

    #[test]
    fn test_scope_expr() {
        assert_eq!(SCOPED.scope_expr(), "category_id");
        assert_eq!(GLOBAL.scope_expr(), "NULL::uuid");
    }

    #[test]
    fn test_flag_columns() {
        assert_eq!(Flag::Archived.column(), "archived");
        assert_eq!(Flag::Highlighted.column(), "highlighted");
        assert_eq!(Flag::Approved.column(), "approved");
    }

    #[test]
    fn test_not_found_message_names_entity() {
        let id = Uuid::nil();
        match GLOBAL.not_found(id) {
            AppError::NotFound(msg) => assert!(msg.starts_with("Objective with id")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
