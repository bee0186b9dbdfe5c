use crate::domain::transaction::{Instrument, TransactionRequest};
use crate::error::{GatewayError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::Read;

/// Reads JSON request bodies from any `Read` source (e.g., File, Stdin).
///
/// Syntax errors surface as [`GatewayError::MalformedBody`]; well-formed JSON
/// with the wrong shape surfaces as [`GatewayError::Validation`].
pub struct RequestReader<R: Read> {
    source: R,
}

impl<R: Read> RequestReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// Parses and validates a transaction request for `instrument`.
    pub fn transaction_request(self, instrument: Instrument) -> Result<TransactionRequest> {
        let request: TransactionRequest = self.parse()?;
        request.validate(instrument)?;
        Ok(request)
    }

    /// Parses an arbitrary JSON document.
    pub fn json(self) -> Result<Value> {
        self.parse()
    }

    /// The raw bytes, unparsed.
    pub fn bytes(mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.source
            .read_to_end(&mut buffer)
            .map_err(|e| GatewayError::Internal(format!("cannot read request body: {e}")))?;
        Ok(buffer)
    }

    fn parse<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_reader(self.source).map_err(|e| {
            if e.is_syntax() || e.is_eof() {
                GatewayError::MalformedBody(e.to_string())
            } else if e.is_io() {
                GatewayError::Internal(format!("cannot read request body: {e}"))
            } else {
                GatewayError::validation(e.to_string())
            }
        })
    }
}
