use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::entities::refresh_tokens;

pub struct RefreshTokenRepository {
    conn: DatabaseConnection,
}

impl RefreshTokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, user_id: i32, token: &str, expires_at: &str) -> Result<()> {
        let active = refresh_tokens::ActiveModel {
            token: Set(token.to_string()),
            user_id: Set(user_id),
            expires_at: Set(expires_at.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to store refresh token")?;

        Ok(())
    }

    /// Consume a refresh token: read it, then delete it by value.
    ///
    /// Two concurrent calls with the same token can both read the row, but
    /// only one DELETE reports an affected row. The loser gets `None`, so a
    /// token is never redeemed twice.
    pub async fn consume(&self, token: &str) -> Result<Option<refresh_tokens::Model>> {
        let Some(row) = refresh_tokens::Entity::find()
            .filter(refresh_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query refresh token")?
        else {
            return Ok(None);
        };

        let result = refresh_tokens::Entity::delete_many()
            .filter(refresh_tokens::Column::Token.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to delete refresh token")?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        Ok(Some(row))
    }

    /// Revoke every outstanding refresh token for a user (logout).
    pub async fn revoke_all_for_user(&self, user_id: i32) -> Result<u64> {
        let result = refresh_tokens::Entity::delete_many()
            .filter(refresh_tokens::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to revoke refresh tokens")?;

        Ok(result.rows_affected)
    }

    /// Drop tokens whose expiry is in the past. RFC 3339 strings compare
    /// lexicographically in timestamp order.
    pub async fn prune_expired(&self, now: &str) -> Result<u64> {
        let result = refresh_tokens::Entity::delete_many()
            .filter(refresh_tokens::Column::ExpiresAt.lt(now))
            .exec(&self.conn)
            .await
            .context("Failed to prune expired refresh tokens")?;

        Ok(result.rows_affected)
    }
}
