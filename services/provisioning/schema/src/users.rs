use sea_orm::entity::prelude::*;

/// User record owned by the provisioning service.
///
/// Every wallet column starts NULL and is written once; `deploy_status` and
/// `account_status` only move forward.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Identity provider's stable user id.
    #[sea_orm(unique)]
    pub external_id: String,
    pub email: String,
    pub public_key: Option<String>,
    /// `base64(nonce).base64(tag).base64(ciphertext)` of the signing seed.
    pub secret_ciphertext: Option<String>,
    pub wallet_contract_id: Option<String>,
    pub deploy_status: String,
    pub account_status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
