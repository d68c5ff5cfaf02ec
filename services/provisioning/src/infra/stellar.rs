//! Stellar key, address and contract-id helpers.
//!
//! Contract ids are `sha256` of the XDR-encoded `HashIdPreimage::ContractId`,
//! which lets a deployer predict an instance id before submitting it.

use ed25519_dalek::SigningKey;
use rand::RngExt;
use secrecy::SecretString;
use sha2::{Digest, Sha256};
use stellar_strkey::{Contract, Strkey, ed25519};

use aidwallet_domain::network::Network;

use crate::domain::types::GeneratedKeypair;

const ENVELOPE_TYPE_CONTRACT_ID: u32 = 8;
const CONTRACT_ID_PREIMAGE_FROM_ADDRESS: u32 = 0;
const CONTRACT_ID_PREIMAGE_FROM_ASSET: u32 = 1;
const SC_ADDRESS_TYPE_ACCOUNT: u32 = 0;
const PUBLIC_KEY_TYPE_ED25519: u32 = 0;
const ASSET_TYPE_CREDIT_ALPHANUM4: u32 = 1;

/// Asset code of the stable asset the wallet holds.
pub const STABLE_ASSET_CODE: &str = "USDC";

/// Generate a fresh ed25519 keypair rendered as strkeys.
pub fn generate_keypair() -> GeneratedKeypair {
    let seed: [u8; 32] = rand::rng().random();
    let signing = SigningKey::from_bytes(&seed);
    let public_key = ed25519::PublicKey(signing.verifying_key().to_bytes()).to_string();
    let secret = SecretString::from(ed25519::PrivateKey(seed).to_string());
    GeneratedKeypair { public_key, secret }
}

/// A fresh 32-byte instantiation salt.
pub fn random_salt() -> [u8; 32] {
    rand::rng().random()
}

pub fn network_id(network: Network) -> [u8; 32] {
    Sha256::digest(network.passphrase().as_bytes()).into()
}

/// Decode a `G…` account strkey.
pub fn parse_account(value: &str) -> Option<[u8; 32]> {
    ed25519::PublicKey::from_string(value.trim()).ok().map(|k| k.0)
}

/// Whether `value` is a `G…` account or `C…` contract strkey.
pub fn is_address(value: &str) -> bool {
    matches!(
        Strkey::from_string(value.trim()),
        Ok(Strkey::PublicKeyEd25519(_)) | Ok(Strkey::Contract(_))
    )
}

/// Predict the id of a contract created by `deployer` with `salt`.
///
/// Returns `None` when the deployer is not a `G…` account (for example a named
/// identity on the deployment host), in which case no prediction is possible.
pub fn predict_contract_id(network: Network, deployer: &str, salt: &[u8; 32]) -> Option<String> {
    let account = parse_account(deployer)?;
    let mut preimage = Vec::with_capacity(4 + 32 + 4 + 4 + 4 + 32 + 32);
    put_u32(&mut preimage, ENVELOPE_TYPE_CONTRACT_ID);
    preimage.extend_from_slice(&network_id(network));
    put_u32(&mut preimage, CONTRACT_ID_PREIMAGE_FROM_ADDRESS);
    put_u32(&mut preimage, SC_ADDRESS_TYPE_ACCOUNT);
    put_u32(&mut preimage, PUBLIC_KEY_TYPE_ED25519);
    preimage.extend_from_slice(&account);
    preimage.extend_from_slice(salt);
    Some(contract_strkey(&preimage))
}

/// Stellar Asset Contract id of a 1–4 character credit asset.
pub fn asset_contract_id(network: Network, code: &str, issuer: &str) -> Option<String> {
    let issuer = parse_account(issuer)?;
    let code = code.as_bytes();
    if code.is_empty() || code.len() > 4 {
        return None;
    }
    let mut asset_code = [0u8; 4];
    asset_code[..code.len()].copy_from_slice(code);

    let mut preimage = Vec::with_capacity(4 + 32 + 4 + 4 + 4 + 4 + 32);
    put_u32(&mut preimage, ENVELOPE_TYPE_CONTRACT_ID);
    preimage.extend_from_slice(&network_id(network));
    put_u32(&mut preimage, CONTRACT_ID_PREIMAGE_FROM_ASSET);
    put_u32(&mut preimage, ASSET_TYPE_CREDIT_ALPHANUM4);
    preimage.extend_from_slice(&asset_code);
    put_u32(&mut preimage, PUBLIC_KEY_TYPE_ED25519);
    preimage.extend_from_slice(&issuer);
    Some(contract_strkey(&preimage))
}

/// Resolve the stable-asset token address to a contract id.
///
/// A `C…` value is used as is; a `G…` value is taken as the USDC issuer.
pub fn resolve_stable_asset(network: Network, value: &str) -> Option<String> {
    let value = value.trim();
    match Strkey::from_string(value) {
        Ok(Strkey::Contract(_)) => Some(value.to_owned()),
        Ok(Strkey::PublicKeyEd25519(_)) => asset_contract_id(network, STABLE_ASSET_CODE, value),
        _ => None,
    }
}

fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_be_bytes());
}

fn contract_strkey(preimage: &[u8]) -> String {
    let hash: [u8; 32] = Sha256::digest(preimage).into();
    Contract(hash).to_string()
}
