//! User repository for database operations

use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::debug;
use uuid::Uuid;

use crate::models::{NewUser, Role, User, UserChanges};

const USER_COLUMNS: &str = "id, email, password_hash, nombre_completo, rol, activo, \
                            ultimo_acceso, creado_en, is_temporary_password";

/// Map a `usuarios` row onto a [`User`]
fn user_from_row(row: &PgRow) -> DatabaseResult<User> {
    let role: String = row.try_get("rol")?;
    let role = role
        .parse::<Role>()
        .map_err(|e| DatabaseError::Query(sqlx::Error::Decode(Box::new(e))))?;

    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        full_name: row.try_get("nombre_completo")?,
        role,
        active: row.try_get("activo")?,
        last_login: row.try_get("ultimo_acceso")?,
        created_at: row.try_get("creado_en")?,
        is_temporary_password: row.try_get("is_temporary_password")?,
    })
}

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new user
    pub async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        debug!("Creating new user: {}", new_user.email);

        let sql = format!(
            "INSERT INTO usuarios (id, email, password_hash, nombre_completo, rol, activo, is_temporary_password) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.full_name)
            .bind(new_user.role.as_str())
            .bind(new_user.active)
            .bind(new_user.is_temporary_password)
            .fetch_one(&self.pool)
            .await?;

        user_from_row(&row)
    }

    /// Find a user by email
    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM usuarios WHERE email = $1");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// List every user, newest first
    pub async fn list(&self) -> DatabaseResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM usuarios ORDER BY creado_en DESC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(user_from_row).collect()
    }

    /// Apply `changes` to a user, returning the updated row or `None` if the
    /// user does not exist
    pub async fn update(&self, id: Uuid, changes: &UserChanges) -> DatabaseResult<Option<User>> {
        debug!("Updating user: {}", id);

        let sql = format!(
            "UPDATE usuarios SET \
                 nombre_completo = COALESCE($2, nombre_completo), \
                 rol = COALESCE($3, rol), \
                 activo = COALESCE($4, activo), \
                 password_hash = COALESCE($5, password_hash), \
                 is_temporary_password = COALESCE($6, is_temporary_password), \
                 ultimo_acceso = COALESCE($7, ultimo_acceso) \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(changes.full_name.as_deref())
            .bind(changes.role.map(|r| r.as_str()))
            .bind(changes.active)
            .bind(changes.password_hash.as_deref())
            .bind(changes.is_temporary_password)
            .bind(changes.last_login)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Stamp the last-login time of a user
    pub async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> DatabaseResult<()> {
        sqlx::query("UPDATE usuarios SET ultimo_acceso = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete a user, returning whether a row was removed
    pub async fn delete(&self, id: Uuid) -> DatabaseResult<bool> {
        debug!("Deleting user: {}", id);

        let result = sqlx::query("DELETE FROM usuarios WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
