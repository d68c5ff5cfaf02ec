use anyhow::anyhow;
use secrecy::ExposeSecret;
use tracing::{info, warn};

use aidwallet_domain::id::UserId;

use crate::domain::repository::UserStore;
use crate::domain::types::UserRecord;
use crate::error::ProvisioningError;
use crate::infra::cipher::SecretCipher;
use crate::infra::stellar;

pub struct IssueKeypairInput {
    pub user_id: UserId,
    pub persist_secret: bool,
}

#[derive(Debug)]
pub struct IssueKeypairOutput {
    pub user: UserRecord,
    pub public_key: String,
    /// Whether a custody ciphertext is on record for this key and was asked for.
    pub secret_stored: bool,
    /// Whether this call generated the key that is now on record.
    pub issued: bool,
}

pub struct IssueKeypairUseCase<S: UserStore> {
    pub store: S,
    /// `None` when no usable encryption key is configured.
    pub cipher: Option<SecretCipher>,
}

impl<S: UserStore> IssueKeypairUseCase<S> {
    pub async fn execute(
        &self,
        input: IssueKeypairInput,
    ) -> Result<IssueKeypairOutput, ProvisioningError> {
        let user = self.load(input.user_id).await?;
        if let Some(public_key) = user.public_key.clone() {
            return Ok(existing(user, public_key, input.persist_secret));
        }

        let keypair = stellar::generate_keypair();
        let won = self
            .store
            .set_public_key_if_absent(input.user_id, &keypair.public_key)
            .await?;
        if !won {
            // A concurrent call committed first; its key is canonical.
            drop(keypair);
            let user = self.load(input.user_id).await?;
            warn!(user_id = %input.user_id, "lost keypair race, discarded generated keypair");
            let public_key = user
                .public_key
                .clone()
                .ok_or_else(|| anyhow!("public key missing after lost race"))?;
            return Ok(existing(user, public_key, input.persist_secret));
        }
        info!(user_id = %input.user_id, public_key = %keypair.public_key, "public key committed");

        if !input.persist_secret {
            let user = self.load(input.user_id).await?;
            return Ok(IssueKeypairOutput {
                user,
                public_key: keypair.public_key,
                secret_stored: false,
                issued: true,
            });
        }

        // The public key stays committed even if custody fails below.
        let cipher = self
            .cipher
            .as_ref()
            .ok_or(ProvisioningError::EncryptionUnavailable)?;
        let sealed = cipher
            .encrypt(keypair.secret.expose_secret().as_bytes())
            .map_err(|e| anyhow!(e).context("seal signing secret"))?;
        let stored = self
            .store
            .set_secret_ciphertext_if_absent(input.user_id, &keypair.public_key, &sealed)
            .await?;
        if stored {
            info!(user_id = %input.user_id, "secret ciphertext stored");
        }

        let user = self.load(input.user_id).await?;
        Ok(IssueKeypairOutput {
            user,
            public_key: keypair.public_key,
            secret_stored: stored,
            issued: true,
        })
    }

    async fn load(&self, id: UserId) -> Result<UserRecord, ProvisioningError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(ProvisioningError::UserNotFound)
    }
}

fn existing(user: UserRecord, public_key: String, persist_secret: bool) -> IssueKeypairOutput {
    let secret_stored = persist_secret && user.secret_ciphertext.is_some();
    IssueKeypairOutput {
        user,
        public_key,
        secret_stored,
        issued: false,
    }
}
