use openssl::error::ErrorStack;
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::{CryptoError, EngineError};

lazy_static! {
    static ref SECURE_RANDOM: SystemRandom = SystemRandom::new();
}

/// Runs `task` on the blocking pool and resolves once with its outcome.
pub(crate) async fn run<F, T>(operation: &'static str, task: F) -> Result<T, CryptoError>
    where F: FnOnce() -> Result<T, CryptoError> + Send + 'static, T: Send + 'static {
    if let Err(e) = tokio::runtime::Handle::try_current() {
        debug!("{} needs a Tokio runtime: {}", operation, e);
        return Err(EngineError::NoRuntime.into());
    }
    trace!("Dispatching {}", operation);
    match tokio::task::spawn_blocking(task).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => {
            debug!("{} failed: {}", operation, e);
            Err(e)
        },
        Err(e) => {
            error!("{} interrupted: {}", operation, e);
            Err(EngineError::Interrupted.into())
        },
    }
}

pub(crate) fn random_bytes(len: usize) -> Result<Vec<u8>, EngineError> {
    let mut data = vec![0u8; len];
    SECURE_RANDOM.fill(&mut data).or(Err(EngineError::Random))?;
    Ok(data)
}

pub(crate) fn random_array<const N: usize>() -> Result<[u8; N], EngineError> {
    let mut data = [0u8; N];
    SECURE_RANDOM.fill(&mut data).or(Err(EngineError::Random))?;
    Ok(data)
}

pub(crate) fn openssl_error(err: ErrorStack) -> EngineError {
    debug!("OpenSSL error: {}", err);
    EngineError::Failure
}
