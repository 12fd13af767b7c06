use crate::acquire::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY};
use crate::manifest::DEFAULT_LIMIT_PER_GROUP;
use crate::units::{CorrectionRule, default_correction_rules};

pub(super) const MAX_WORKER_COUNT: usize = 64;

pub(super) fn clamp_worker_count(value: Option<usize>) -> Option<usize> {
    value.map(|count| count.clamp(1, MAX_WORKER_COUNT))
}

pub(super) fn default_true() -> bool {
    true
}

pub(super) fn default_limit_per_group() -> usize {
    DEFAULT_LIMIT_PER_GROUP
}

pub(super) fn default_retries() -> usize {
    DEFAULT_RETRIES
}

pub(super) fn default_retry_delay_secs() -> u64 {
    DEFAULT_RETRY_DELAY.as_secs()
}

pub(super) fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

pub(super) fn default_corrections() -> Vec<CorrectionRule> {
    default_correction_rules()
}
