//! Threshold aggregation certificate for an AVS operator set.
//!
//! An [AggregationCertificate] is created once per task over a fixed
//! operator roster and fed operator responses as they arrive. Each
//! submission is validated (roster membership, no duplicates, signature
//! over the SHA-256 digest of the claimed output) and folded into a
//! running aggregate signature under a single lock, so concurrent
//! producers never observe or produce a partially applied update. Any
//! rejection leaves the certificate untouched.
//!
//! The certificate never latches a terminal state: it keeps accepting
//! valid submissions after quorum, and the caller decides when to stop
//! and [AggregationCertificate::finalize] the result. Expiry enforcement
//! is the caller's job as well; `time_to_expiry` is carried as data only.

use crate::{KeyMaterial, SigningScheme};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Errors returned by certificate construction and submission processing.
///
/// Everything except [Error::EmptyTaskId], [Error::NoOperators],
/// [Error::DuplicateOperator], and [Error::InvalidThreshold] is
/// per-submission and recoverable: the caller drops the offending
/// response and keeps feeding the certificate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("task id must not be empty")]
    EmptyTaskId,
    #[error("operator roster must not be empty")]
    NoOperators,
    #[error("duplicate operator address: {0}")]
    DuplicateOperator(String),
    #[error("threshold percentage out of range: {0}")]
    InvalidThreshold(u8),
    #[error("task id does not match this certificate")]
    TaskIdMismatch,
    #[error("unknown signer: {0}")]
    UnknownSigner(String),
    #[error("empty signature")]
    EmptySignature,
    #[error("malformed signature: {0}")]
    MalformedSignature(crate::Error),
    #[error("signature verification failed for operator {0}")]
    VerificationFailure(String),
    #[error("duplicate submission from operator {0}")]
    DuplicateSubmission(String),
    #[error("signing threshold not met: {0} of {1}")]
    ThresholdNotMet(usize, usize),
    #[error("cryptographic operation failed: {0}")]
    Crypto(#[from] crate::Error),
}

/// An operator's identity: on-chain address plus roster public key.
#[derive(Clone, Debug)]
pub struct Operator<S: SigningScheme> {
    /// The operator's address, unique within a roster.
    pub address: String,
    /// The operator's registered public key.
    pub public_key: S::PublicKey,
}

impl<S: SigningScheme> Operator<S> {
    pub fn new(address: impl Into<String>, public_key: S::PublicKey) -> Self {
        Self {
            address: address.into(),
            public_key,
        }
    }
}

/// A task response as it arrives off the wire: the claimed output and the
/// operator's signature over its SHA-256 digest, still in byte form.
#[derive(Clone, Debug)]
pub struct TaskResult {
    pub operator_address: String,
    pub output: Vec<u8>,
    pub signature: Vec<u8>,
}

/// One accepted submission: the original response plus its decoded,
/// verified signature.
#[derive(Clone, Debug)]
pub struct ReceivedResponse<S: SigningScheme> {
    pub task_id: Vec<u8>,
    pub task_result: TaskResult,
    pub signature: S::Signature,
}

/// An independently verifiable summary of a certificate that reached
/// quorum, shaped for an on-chain certificate verifier: the aggregate
/// signature, the signers' aggregate public key, and the non-signers'
/// individual keys as witnesses.
#[derive(Clone, Debug)]
pub struct FinalizedCertificate<S: SigningScheme> {
    pub task_id: Vec<u8>,
    pub task_created_block: u64,
    /// Addresses that signed, in roster order.
    pub signers: Vec<String>,
    pub aggregate_signature: S::Signature,
    /// Aggregate public key of the signers only (not the full roster).
    pub signers_aggregate_public_key: S::PublicKey,
    /// Public keys of roster members that did not sign, in roster order.
    pub non_signer_public_keys: Vec<S::PublicKey>,
}

struct Inner<S: SigningScheme> {
    responses: HashMap<String, ReceivedResponse<S>>,
    accumulator: Option<S::Signature>,
}

/// Collects operator signatures for one task until the caller decides
/// quorum is good enough.
pub struct AggregationCertificate<S: SigningScheme> {
    task_id: Vec<u8>,
    task_created_block: u64,
    operator_set_id: u32,
    threshold_percentage: u8,
    task_data: Vec<u8>,
    time_to_expiry: Duration,
    operators: Vec<Operator<S>>,
    /// Aggregate over the full roster, fixed at construction. Not the
    /// signer-subset aggregate; see [FinalizedCertificate].
    aggregate_public_key: S::PublicKey,
    inner: Mutex<Inner<S>>,
    /// Mirrors `inner.responses.len()` so quorum checks never take the
    /// submission lock.
    received: AtomicUsize,
}

impl<S: SigningScheme> AggregationCertificate<S> {
    /// Creates a certificate for one task over a fixed roster.
    ///
    /// Validates the task id, roster, and threshold, and eagerly computes
    /// the full-roster aggregate public key. On failure no partial object
    /// is returned.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        task_id: Vec<u8>,
        task_created_block: u64,
        operator_set_id: u32,
        threshold_percentage: u8,
        task_data: Vec<u8>,
        time_to_expiry: Duration,
        operators: Vec<Operator<S>>,
    ) -> Result<Self, Error> {
        if task_id.is_empty() {
            return Err(Error::EmptyTaskId);
        }
        if operators.is_empty() {
            return Err(Error::NoOperators);
        }
        if !(1..=100).contains(&threshold_percentage) {
            return Err(Error::InvalidThreshold(threshold_percentage));
        }
        let mut seen = std::collections::HashSet::new();
        for operator in &operators {
            if !seen.insert(operator.address.as_str()) {
                return Err(Error::DuplicateOperator(operator.address.clone()));
            }
        }
        let publics: Vec<S::PublicKey> = operators
            .iter()
            .map(|operator| operator.public_key.clone())
            .collect();
        let aggregate_public_key = S::aggregate_public_keys(&publics)?;
        Ok(Self {
            task_id,
            task_created_block,
            operator_set_id,
            threshold_percentage,
            task_data,
            time_to_expiry,
            operators,
            aggregate_public_key,
            inner: Mutex::new(Inner {
                responses: HashMap::new(),
                accumulator: None,
            }),
            received: AtomicUsize::new(0),
        })
    }

    /// Validates and records one operator submission.
    ///
    /// The whole validate-then-commit sequence runs under the internal
    /// lock; every rejection leaves the certificate byte-for-byte
    /// unchanged. Submissions arriving after quorum are still accepted.
    pub fn process_new_signature(&self, task_id: &[u8], task_result: TaskResult) -> Result<(), Error> {
        if task_id != self.task_id {
            return Err(Error::TaskIdMismatch);
        }
        let operator = self
            .operators
            .iter()
            .find(|operator| operator.address == task_result.operator_address)
            .ok_or_else(|| {
                warn!(
                    address = %task_result.operator_address,
                    "rejected submission from unknown signer"
                );
                Error::UnknownSigner(task_result.operator_address.clone())
            })?;
        if task_result.signature.is_empty() {
            return Err(Error::EmptySignature);
        }

        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if inner.responses.contains_key(&task_result.operator_address) {
            return Err(Error::DuplicateSubmission(
                task_result.operator_address.clone(),
            ));
        }
        let signature =
            S::Signature::from_bytes(&task_result.signature).map_err(Error::MalformedSignature)?;
        let digest = Sha256::digest(&task_result.output);
        let valid = S::verify(&operator.public_key, &digest, &signature)?;
        if !valid {
            warn!(
                address = %task_result.operator_address,
                "rejected submission with invalid signature"
            );
            return Err(Error::VerificationFailure(
                task_result.operator_address.clone(),
            ));
        }

        // Fold before mutating so an aggregation error cannot leave a
        // recorded response without its contribution.
        let folded = match &inner.accumulator {
            None => signature.clone(),
            Some(accumulator) => {
                S::aggregate_signatures(&[accumulator.clone(), signature.clone()])?
            }
        };
        let address = task_result.operator_address.clone();
        inner.responses.insert(
            address.clone(),
            ReceivedResponse {
                task_id: self.task_id.clone(),
                task_result,
                signature,
            },
        );
        inner.accumulator = Some(folded);
        let count = inner.responses.len();
        self.received.store(count, Ordering::SeqCst);
        debug!(address = %address, received = count, "recorded operator signature");
        Ok(())
    }

    /// Number of signatures required to meet the threshold:
    /// `max(1, ceil(threshold_percentage/100 * numOperators))`.
    pub fn quorum(&self) -> usize {
        let n = self.operators.len();
        let required = (self.threshold_percentage as usize * n).div_ceil(100);
        required.max(1)
    }

    /// Whether enough signatures have been recorded to meet the threshold.
    ///
    /// Lock-free; safe to poll while submissions are still arriving.
    pub fn signing_threshold_met(&self) -> bool {
        self.received.load(Ordering::SeqCst) >= self.quorum()
    }

    /// Snapshot of the accepted submissions, keyed by operator address.
    pub fn received_signatures(&self) -> HashMap<String, ReceivedResponse<S>> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .responses
            .clone()
    }

    /// The aggregate public key of the full roster, fixed at construction.
    pub fn aggregate_public_key(&self) -> &S::PublicKey {
        &self.aggregate_public_key
    }

    pub fn task_id(&self) -> &[u8] {
        &self.task_id
    }

    pub fn task_created_block(&self) -> u64 {
        self.task_created_block
    }

    pub fn operator_set_id(&self) -> u32 {
        self.operator_set_id
    }

    pub fn threshold_percentage(&self) -> u8 {
        self.threshold_percentage
    }

    pub fn task_data(&self) -> &[u8] {
        &self.task_data
    }

    pub fn time_to_expiry(&self) -> Duration {
        self.time_to_expiry
    }

    pub fn operators(&self) -> &[Operator<S>] {
        &self.operators
    }

    /// Assembles the on-chain submission once quorum is met.
    ///
    /// Fails with [Error::ThresholdNotMet] before quorum. The certificate
    /// stays open: later submissions are still accepted, and finalizing
    /// again reflects them.
    pub fn finalize(&self) -> Result<FinalizedCertificate<S>, Error> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let quorum = self.quorum();
        if inner.responses.len() < quorum {
            return Err(Error::ThresholdNotMet(inner.responses.len(), quorum));
        }
        let mut signers = Vec::new();
        let mut signer_publics = Vec::new();
        let mut non_signer_public_keys = Vec::new();
        for operator in &self.operators {
            if inner.responses.contains_key(&operator.address) {
                signers.push(operator.address.clone());
                signer_publics.push(operator.public_key.clone());
            } else {
                non_signer_public_keys.push(operator.public_key.clone());
            }
        }
        let aggregate_signature = inner
            .accumulator
            .clone()
            .ok_or(Error::ThresholdNotMet(0, quorum))?;
        let signers_aggregate_public_key = S::aggregate_public_keys(&signer_publics)?;
        debug!(
            signers = signers.len(),
            non_signers = non_signer_public_keys.len(),
            "finalized aggregation certificate"
        );
        Ok(FinalizedCertificate {
            task_id: self.task_id.clone(),
            task_created_block: self.task_created_block,
            signers,
            aggregate_signature,
            signers_aggregate_public_key,
            non_signer_public_keys,
        })
    }
}
