pub mod cipher;
pub mod db;
pub mod faucet;
pub mod identity;
pub mod rpc;
pub mod stellar;
