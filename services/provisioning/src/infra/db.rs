use std::sync::Arc;

use anyhow::{Context as _, anyhow};
use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    sea_query::{Expr, OnConflict},
};

use aidwallet_domain::id::UserId;
use aidwallet_domain::user::{AccountStatus, DeployStatus};
use aidwallet_provisioning_schema::users;

use crate::domain::repository::UserStore;
use crate::domain::types::UserRecord;
use crate::error::ProvisioningError;

// ── User store ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserStore {
    pub db: Arc<DatabaseConnection>,
}

impl UserStore for DbUserStore {
    async fn upsert_by_external_id(
        &self,
        external_id: &str,
        email: &str,
    ) -> Result<UserRecord, ProvisioningError> {
        let now = Utc::now();
        let user = users::ActiveModel {
            id: Set(UserId::generate().0),
            external_id: Set(external_id.to_owned()),
            email: Set(email.to_owned()),
            public_key: Set(None),
            secret_ciphertext: Set(None),
            wallet_contract_id: Set(None),
            deploy_status: Set(DeployStatus::None.as_str().to_owned()),
            account_status: Set(AccountStatus::None.as_str().to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        // The unique index on external_id makes concurrent first syncs converge on one row.
        users::Entity::insert(user)
            .on_conflict(
                OnConflict::column(users::Column::ExternalId)
                    .update_columns([users::Column::Email, users::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .context("upsert user by external id")?;

        let model = users::Entity::find()
            .filter(users::Column::ExternalId.eq(external_id))
            .one(self.db.as_ref())
            .await
            .context("find user by external id")?
            .ok_or_else(|| anyhow!("user {external_id} missing after upsert"))?;
        record_from_model(model)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, ProvisioningError> {
        users::Entity::find_by_id(id.0)
            .one(self.db.as_ref())
            .await
            .context("find user by id")?
            .map(record_from_model)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, ProvisioningError> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .order_by_asc(users::Column::CreatedAt)
            .one(self.db.as_ref())
            .await
            .context("find user by email")?
            .map(record_from_model)
            .transpose()
    }

    async fn set_public_key_if_absent(
        &self,
        id: UserId,
        public_key: &str,
    ) -> Result<bool, ProvisioningError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::PublicKey, Expr::value(public_key))
            .col_expr(
                users::Column::AccountStatus,
                Expr::value(AccountStatus::Created.as_str()),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(id.0))
            .filter(users::Column::PublicKey.is_null())
            .filter(users::Column::AccountStatus.eq(AccountStatus::None.as_str()))
            .exec(self.db.as_ref())
            .await
            .context("set public key")?;
        Ok(result.rows_affected == 1)
    }

    async fn set_secret_ciphertext_if_absent(
        &self,
        id: UserId,
        public_key: &str,
        ciphertext: &str,
    ) -> Result<bool, ProvisioningError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::SecretCiphertext, Expr::value(ciphertext))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(id.0))
            .filter(users::Column::PublicKey.eq(public_key))
            .filter(users::Column::SecretCiphertext.is_null())
            .exec(self.db.as_ref())
            .await
            .context("set secret ciphertext")?;
        Ok(result.rows_affected == 1)
    }

    async fn set_wallet_contract_if_absent(
        &self,
        id: UserId,
        contract_id: &str,
    ) -> Result<bool, ProvisioningError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::WalletContractId, Expr::value(contract_id))
            .col_expr(
                users::Column::DeployStatus,
                Expr::value(DeployStatus::Deployed.as_str()),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(id.0))
            .filter(users::Column::PublicKey.is_not_null())
            .filter(users::Column::WalletContractId.is_null())
            .exec(self.db.as_ref())
            .await
            .context("set wallet contract")?;
        Ok(result.rows_affected == 1)
    }

    async fn advance_account_status(
        &self,
        id: UserId,
        status: AccountStatus,
    ) -> Result<bool, ProvisioningError> {
        let from: Vec<&'static str> = status.predecessors().iter().map(|s| s.as_str()).collect();
        if from.is_empty() {
            return Ok(false);
        }
        let result = users::Entity::update_many()
            .col_expr(users::Column::AccountStatus, Expr::value(status.as_str()))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(id.0))
            .filter(users::Column::PublicKey.is_not_null())
            .filter(users::Column::AccountStatus.is_in(from))
            .exec(self.db.as_ref())
            .await
            .context("advance account status")?;
        Ok(result.rows_affected == 1)
    }
}

fn record_from_model(model: users::Model) -> Result<UserRecord, ProvisioningError> {
    let deploy_status = model
        .deploy_status
        .parse::<DeployStatus>()
        .with_context(|| format!("user {} has bad deploy_status", model.id))?;
    let account_status = model
        .account_status
        .parse::<AccountStatus>()
        .with_context(|| format!("user {} has bad account_status", model.id))?;
    Ok(UserRecord {
        id: UserId(model.id),
        external_id: model.external_id,
        email: model.email,
        public_key: model.public_key,
        secret_ciphertext: model.secret_ciphertext,
        wallet_contract_id: model.wallet_contract_id,
        deploy_status,
        account_status,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
