use bpm_odata_client::{RequestMethod, Transport, ATOM_ACCEPT};
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

use super::{check_collection, check_id};
use crate::error::Result;

/// Returned by [`upload_binary`](super::ODataClient::upload_binary) when no
/// hash is requested.
pub const UPLOAD_OK: &str = "OK";

/// Upper-case hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:X}", Sha256::digest(bytes))
}

impl<T: Transport> super::ODataClient<T> {
    /// Upload the binary payload of an entity, streamed with chunked transfer
    /// encoding.
    ///
    /// Returns the upper-case hex SHA-256 of `bytes` when `return_hash` is
    /// set, `"OK"` otherwise.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_binary(
        &mut self,
        collection: &str,
        id: &str,
        bytes: &[u8],
        return_hash: bool,
    ) -> Result<String> {
        check_collection(collection)?;
        check_id(id)?;
        let url = format!("{}/Data", self.entity_url(collection, id));
        let request = self
            .data_request(RequestMethod::Put, &url)
            .accept(ATOM_ACCEPT)
            .bytes(Bytes::copy_from_slice(bytes))
            .chunked();
        self.send(request, "Failed to upload data").await?;
        info!("Binary data uploaded");

        Ok(if return_hash {
            sha256_hex(bytes)
        } else {
            UPLOAD_OK.to_string()
        })
    }

    /// Download raw bytes, typically a record's data link.
    #[instrument(skip(self))]
    pub async fn get_data(&mut self, url: &str) -> Result<Vec<u8>> {
        let request = self.data_request(RequestMethod::Get, url);
        let response = self.send(request, "Failed to retrieve data").await?;
        self.count_request();
        Ok(response.bytes().to_vec())
    }
}
