//! HTTP agent construction, fixed-delay retries and bounded response reads.

use std::io::{self, Read};
use std::time::Duration;

/// Retry settings for network operations with a fixed pause between attempts.
#[derive(Clone, Copy, Debug)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first try.
    pub max_attempts: usize,
    /// Pause after a failed attempt before the next one.
    pub delay: Duration,
}

/// Build an HTTP agent whose whole request (connect, send, read) is bounded by `timeout`.
pub fn agent_with_timeout(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

/// Run `action` up to `config.max_attempts` times, sleeping `config.delay` between failures.
///
/// `on_failure` sees every failed attempt with its 1-based attempt number.
/// The last error is returned once attempts are exhausted.
pub fn retry_fixed<T, E, F, L>(config: RetryConfig, mut action: F, mut on_failure: L) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    L: FnMut(usize, &E),
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0usize;
    loop {
        attempt += 1;
        match action() {
            Ok(value) => return Ok(value),
            Err(err) => {
                on_failure(attempt, &err);
                if attempt >= max_attempts {
                    return Err(err);
                }
                if !config.delay.is_zero() {
                    std::thread::sleep(config.delay);
                }
            }
        }
    }
}

/// Read a response into memory, enforcing a maximum byte size.
pub fn read_response_bytes(response: ureq::Response, max_bytes: usize) -> Result<Vec<u8>, io::Error> {
    check_content_length(&response, max_bytes)?;
    let reader = response.into_reader();
    let mut limited = reader.take(max_bytes as u64 + 1);
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes)?;
    if bytes.len() > max_bytes {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Response exceeded {max_bytes} bytes"),
        ));
    }
    Ok(bytes)
}

fn check_content_length(response: &ureq::Response, max_bytes: usize) -> Result<(), io::Error> {
    let Some(length) = response.header("Content-Length") else {
        return Ok(());
    };
    let Ok(length) = length.parse::<u64>() else {
        return Ok(());
    };
    if length > max_bytes as u64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Response too large: {length} bytes"),
        ));
    }
    Ok(())
}
