// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use app_core::encoding::EncodingError;
use app_core::transaction::SignerError;
use thiserror::Error;

use crate::storage::{PersistenceError, ReloadError};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("cannot recover transaction sender")]
    InvalidSignature {
        #[source]
        source: SignerError,
    },
    #[error("cannot wrap transaction into an inbox message")]
    Encoding {
        #[source]
        source: EncodingError,
    },
    #[error("inbox store rejected message")]
    Persistence {
        #[source]
        source: PersistenceError,
    },
    #[error("inbox store reload after reorg failed")]
    Reload {
        #[source]
        source: ReloadError,
    },
}
