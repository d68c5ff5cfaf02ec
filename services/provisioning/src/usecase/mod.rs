pub mod deploy;
pub mod fund;
pub mod keypair;
pub mod onboarding;
pub mod session;
