//! Parity gate for database-native phonetic functions
//!
//! A store may offer its own phonetic function. It is only trusted when it
//! reproduces the in-process encoder on every name of the conformance corpus
//! (ASCII letters only); otherwise encoding stays in process.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::phonetic::encode;
use crate::store::{CatalogStore, StoreError};

/// Phonetic function evaluated by a store backend
#[async_trait]
pub trait NativeEncoder: Send + Sync {
    /// Label used in logs
    fn name(&self) -> &str;

    /// Codes for `names`, in the same order
    async fn encode_batch(&self, names: &[String]) -> Result<Vec<String>, StoreError>;
}

/// Name / expected code pairs every encoder must reproduce
pub const CONFORMANCE_VECTORS: &[(&str, &str)] = &[
    ("Smith", "S530"),
    ("Smyth", "S530"),
    ("Robert", "R163"),
    ("Rupert", "R163"),
    ("Rubin", "R150"),
    ("Jackson", "J250"),
    ("Tymczak", "T522"),
    ("Pfister", "P236"),
    ("Gutierrez", "G362"),
    ("Honeyman", "H555"),
    ("Washington", "W252"),
    ("Wheaton", "W350"),
    ("Lee", "L000"),
    ("Lloyd", "L300"),
    ("Ellery", "E460"),
    ("Ashcraft", "A261"),
    ("Burroughs", "B620"),
    ("Manteca", "M532"),
    ("Yerba", "Y610"),
    ("Harina", "H650"),
    ("Fideos", "F320"),
    ("Azucar", "A226"),
];

#[derive(Error, Debug)]
pub enum ParityError {
    #[error("{name:?}: expected {expected}, native returned {actual}")]
    Mismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("native returned {actual} codes for {expected} names")]
    WrongLength { expected: usize, actual: usize },

    #[error("native encoder failed: {0}")]
    Failed(#[from] StoreError),
}

/// Compare `native` against the in-process encoder over the corpus
pub async fn check_parity(native: &dyn NativeEncoder) -> Result<(), ParityError> {
    let names: Vec<String> = CONFORMANCE_VECTORS
        .iter()
        .map(|(name, _)| name.to_string())
        .collect();

    let actual = native.encode_batch(&names).await?;
    if actual.len() != names.len() {
        return Err(ParityError::WrongLength {
            expected: names.len(),
            actual: actual.len(),
        });
    }

    for (name, actual) in names.iter().zip(actual) {
        let expected = encode(name);
        if !actual.eq_ignore_ascii_case(expected.as_str()) {
            return Err(ParityError::Mismatch {
                name: name.clone(),
                expected: expected.to_string(),
                actual,
            });
        }
    }

    Ok(())
}

/// Which encoder a review run uses
#[derive(Clone, Default)]
pub enum EncoderChoice {
    #[default]
    InProcess,
    /// Native function that passed [`check_parity`]
    Native(Arc<dyn NativeEncoder>),
}

impl EncoderChoice {
    pub fn is_native(&self) -> bool {
        matches!(self, EncoderChoice::Native(_))
    }
}

impl fmt::Debug for EncoderChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncoderChoice::InProcess => f.write_str("InProcess"),
            EncoderChoice::Native(native) => write!(f, "Native({})", native.name()),
        }
    }
}

/// Decide between the store's native function and the in-process encoder
pub async fn select_encoder<S>(store: &S, prefer_native: bool) -> EncoderChoice
where
    S: CatalogStore + ?Sized,
{
    if !prefer_native {
        return EncoderChoice::InProcess;
    }

    let Some(native) = store.native_encoder().await else {
        info!("Store offers no native phonetic function; encoding in process");
        return EncoderChoice::InProcess;
    };

    match check_parity(native.as_ref()).await {
        Ok(()) => {
            info!("Delegating phonetic encoding to {}", native.name());
            EncoderChoice::Native(native)
        }
        Err(e) => {
            warn!("Rejected native encoder {}: {}", native.name(), e);
            EncoderChoice::InProcess
        }
    }
}
