//! JSON-RPC registry client
//!
//! Talks to a Polygon-compatible endpoint over `eth_call` for reads and
//! `eth_sendTransaction` (node-managed signer account) for writes,
//! polling `eth_getTransactionReceipt` until the transaction is mined.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use async_trait::async_trait;
use veridian_core::{
    Address, AnchorRequest, ChainCredential, ChainReceipt, Cid, CredentialId, Institution,
    ValidityTuple,
};

use crate::abi::{encode_call, AbiError, Decoder, Token};
use crate::{ChainError, ChainRegistry};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const RECEIPT_POLL_ATTEMPTS: u32 = 60;

/// Registry gateway against a fixed JSON-RPC endpoint.
pub struct JsonRpcRegistry {
    http: reqwest::Client,
    endpoint: Url,
    contract: Address,
    /// Node-managed account transactions are sent from.
    sender: Address,
}

impl JsonRpcRegistry {
    pub fn new(endpoint: Url, contract: Address, sender: Address) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            http,
            endpoint,
            contract,
            sender,
        }
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self.http.post(self.endpoint.clone()).json(&body).send().await?;
        let payload: Value = response.json().await?;

        if let Some(error) = payload.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown RPC error")
                .to_string();
            return Err(classify_rpc_error(message));
        }
        Ok(payload.get("result").cloned().unwrap_or(Value::Null))
    }

    /// `eth_call` against the registry contract, returning decoded
    /// return data.
    async fn call(&self, data: Vec<u8>) -> Result<Vec<u8>, ChainError> {
        let result = self
            .rpc(
                "eth_call",
                json!([
                    {"to": self.contract.as_str(), "data": encode_hex(&data)},
                    "latest",
                ]),
            )
            .await?;
        let hex_str = result
            .as_str()
            .ok_or_else(|| ChainError::Unavailable("non-string eth_call result".into()))?;
        decode_hex(hex_str)
    }

    /// Submit a state-changing call and wait for it to be mined.
    async fn send(&self, data: Vec<u8>) -> Result<ChainReceipt, ChainError> {
        let result = self
            .rpc(
                "eth_sendTransaction",
                json!([{
                    "from": self.sender.as_str(),
                    "to": self.contract.as_str(),
                    "data": encode_hex(&data),
                }]),
            )
            .await?;
        let tx_hash = result
            .as_str()
            .ok_or_else(|| ChainError::Unavailable("non-string transaction hash".into()))?
            .to_string();

        for _ in 0..RECEIPT_POLL_ATTEMPTS {
            let receipt = self
                .rpc("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if receipt.is_null() {
                tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
                continue;
            }
            let status = receipt.get("status").and_then(Value::as_str).unwrap_or("0x1");
            if status == "0x0" {
                return Err(ChainError::Rejected("transaction reverted".into()));
            }
            let block_number = receipt
                .get("blockNumber")
                .and_then(Value::as_str)
                .map(parse_quantity)
                .transpose()?
                .unwrap_or(0);
            return Ok(ChainReceipt {
                tx_hash,
                block_number,
            });
        }
        Err(ChainError::Unavailable(format!(
            "transaction {tx_hash} not mined within deadline"
        )))
    }
}

#[async_trait]
impl ChainRegistry for JsonRpcRegistry {
    async fn get_credential(&self, id: &CredentialId) -> Result<ChainCredential, ChainError> {
        let data = encode_call(
            "getCredential(bytes32)",
            &[Token::Bytes32(id.chain_key())],
        );
        let ret = self.call(data).await?;
        let dec = Decoder::new(&ret);

        // (issuer, subject, cid, credentialType, issuedAt, expiresAt,
        //  revoked, revokedReason)
        let issuer = address_from(dec.address_at(0)?);
        if issuer.is_zero() {
            return Err(ChainError::NotFound(format!("credential {id}")));
        }
        let subject = address_from(dec.address_at(1)?);
        let cid = dec.string_at(2)?;
        let expires_at = dec.u64_at(5)?;

        Ok(ChainCredential {
            credential_id: id.clone(),
            issuer,
            subject: (!subject.is_zero()).then_some(subject),
            content_ref: (!cid.is_empty()).then(|| Cid::new(cid)),
            credential_type: dec.string_at(3)?,
            issued_at: timestamp_from(dec.u64_at(4)?),
            expires_at: (expires_at != 0).then(|| timestamp_from(expires_at)),
            revoked: dec.bool_at(6)?,
            revoked_reason: {
                let reason = dec.string_at(7)?;
                (!reason.is_empty()).then_some(reason)
            },
        })
    }

    async fn validity(&self, id: &CredentialId) -> Result<ValidityTuple, ChainError> {
        let data = encode_call("isValid(bytes32)", &[Token::Bytes32(id.chain_key())]);
        let ret = self.call(data).await?;
        let dec = Decoder::new(&ret);
        Ok(ValidityTuple {
            valid: dec.bool_at(0)?,
            expired: dec.bool_at(1)?,
            revoked: dec.bool_at(2)?,
        })
    }

    async fn issue_credential(&self, anchor: &AnchorRequest) -> Result<ChainReceipt, ChainError> {
        let subject = anchor
            .subject
            .clone()
            .unwrap_or_else(Address::zero)
            .to_bytes()
            .ok_or_else(|| ChainError::Rejected("malformed subject address".into()))?;
        let data = encode_call(
            "issueCredential(bytes32,address,string,string,uint64)",
            &[
                Token::Bytes32(anchor.credential_id.chain_key()),
                Token::Address(subject),
                Token::Str(anchor.content_ref.as_str().to_string()),
                Token::Str(anchor.credential_type.clone()),
                Token::Uint(anchor.expires_at.map(|at| at.timestamp() as u64).unwrap_or(0)),
            ],
        );
        self.send(data).await
    }

    async fn revoke_credential(
        &self,
        id: &CredentialId,
        reason: &str,
    ) -> Result<ChainReceipt, ChainError> {
        let data = encode_call(
            "revokeCredential(bytes32,string)",
            &[
                Token::Bytes32(id.chain_key()),
                Token::Str(reason.to_string()),
            ],
        );
        self.send(data).await
    }

    async fn get_institution(&self, address: &Address) -> Result<Institution, ChainError> {
        let raw = address
            .to_bytes()
            .ok_or_else(|| ChainError::Rejected("malformed institution address".into()))?;
        let ret = self
            .call(encode_call("getInstitution(address)", &[Token::Address(raw)]))
            .await?;
        let dec = Decoder::new(&ret);

        // (name, did, verified, active, registeredAt)
        let registered_at = dec.u64_at(4)?;
        if registered_at == 0 {
            return Err(ChainError::NotFound(format!("institution {address}")));
        }
        Ok(Institution {
            address: address.clone(),
            name: dec.string_at(0)?,
            did: dec.string_at(1)?,
            verified: dec.bool_at(2)?,
            active: dec.bool_at(3)?,
            registered_at: timestamp_from(registered_at),
        })
    }

    async fn register_institution(
        &self,
        institution: &Institution,
    ) -> Result<ChainReceipt, ChainError> {
        let raw = institution
            .address
            .to_bytes()
            .ok_or_else(|| ChainError::Rejected("malformed institution address".into()))?;
        let data = encode_call(
            "registerInstitution(address,string,string)",
            &[
                Token::Address(raw),
                Token::Str(institution.name.clone()),
                Token::Str(institution.did.clone()),
            ],
        );
        self.send(data).await
    }

    async fn set_institution_verified(
        &self,
        address: &Address,
        verified: bool,
    ) -> Result<ChainReceipt, ChainError> {
        let raw = address
            .to_bytes()
            .ok_or_else(|| ChainError::Rejected("malformed institution address".into()))?;
        let data = encode_call(
            "setInstitutionVerified(address,bool)",
            &[Token::Address(raw), Token::Bool(verified)],
        );
        self.send(data).await
    }

    async fn set_institution_active(
        &self,
        address: &Address,
        active: bool,
    ) -> Result<ChainReceipt, ChainError> {
        let raw = address
            .to_bytes()
            .ok_or_else(|| ChainError::Rejected("malformed institution address".into()))?;
        let data = encode_call(
            "setInstitutionActive(address,bool)",
            &[Token::Address(raw), Token::Bool(active)],
        );
        self.send(data).await
    }
}

fn classify_rpc_error(message: String) -> ChainError {
    let lower = message.to_lowercase();
    if lower.contains("revert") {
        if lower.contains("not found") || lower.contains("does not exist") {
            ChainError::NotFound(message)
        } else {
            ChainError::Rejected(message)
        }
    } else {
        ChainError::Unavailable(message)
    }
}

fn encode_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn decode_hex(s: &str) -> Result<Vec<u8>, ChainError> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
        .map_err(|e| ChainError::Unavailable(format!("malformed hex in RPC response: {e}")))
}

fn parse_quantity(s: &str) -> Result<u64, ChainError> {
    u64::from_str_radix(s.strip_prefix("0x").unwrap_or(s), 16)
        .map_err(|e| ChainError::Unavailable(format!("malformed quantity in RPC response: {e}")))
}

fn address_from(raw: [u8; 20]) -> Address {
    Address(format!("0x{}", hex::encode(raw)))
}

fn timestamp_from(secs: u64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs as i64, 0).single().unwrap_or_default()
}

impl From<AbiError> for ChainError {
    fn from(err: AbiError) -> Self {
        ChainError::Unavailable(format!("malformed contract response: {err}"))
    }
}
