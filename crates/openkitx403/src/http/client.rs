/*
[INPUT]:  HTTP configuration, a wallet signer, and the request to make
[OUTPUT]: Responses from OpenKitx403-protected endpoints
[POS]:    HTTP layer - client half of the challenge/response exchange
[UPDATE]: When adding connection options or changing the retry flow
*/

use std::time::Duration;

use chrono::Utc;
use rand::RngCore;
use rand::rngs::OsRng;
use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::{WalletSigner, build_signing_string};
use crate::codec;
use crate::http::{ClientError, Result};
use crate::types::{AuthorizationProof, Challenge, format_timestamp, parse_www_authenticate};

/// Random bytes behind each proof nonce
const PROOF_NONCE_BYTES: usize = 16;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client that answers OpenKitx403 challenges
#[derive(Debug, Clone)]
pub struct OpenKitClient {
    http_client: Client,
    base_url: Option<Url>,
}

impl OpenKitClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: None,
        })
    }

    /// Create a client that resolves relative targets against `base_url`
    pub fn with_config_and_base_url(config: ClientConfig, base_url: &str) -> Result<Self> {
        let mut client = Self::with_config(config)?;
        client.base_url = Some(Url::parse(base_url)?);
        Ok(client)
    }

    /// Resolve a target against the base URL, or parse it as absolute
    fn url(&self, target: &str) -> Result<Url> {
        match &self.base_url {
            Some(base) => Ok(base.join(target)?),
            None => Ok(Url::parse(target)?),
        }
    }

    fn request(&self, method: Method, url: Url, body: Option<&Value>) -> RequestBuilder {
        let builder = self.http_client.request(method, url);
        match body {
            Some(body) => builder.json(body),
            None => builder,
        }
    }

    /// Perform a request, answering one OpenKitx403 challenge if the server
    /// sends one.
    ///
    /// Flow:
    /// 1. Send the request without credentials
    /// 2. On 403, decode the challenge from `WWW-Authenticate`
    /// 3. Sign it and retry exactly once with `Authorization`
    /// 4. A 401/403 on the retry is terminal
    pub async fn authenticate(
        &self,
        signer: &dyn WalletSigner,
        method: Method,
        target: &str,
        body: Option<&Value>,
    ) -> Result<Response> {
        let url = self.url(target)?;

        let response = self.request(method.clone(), url.clone(), body).send().await?;
        if response.status() != StatusCode::FORBIDDEN {
            return Ok(response);
        }

        let challenge_header = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| parse_www_authenticate(value).ok())
            .map(str::to_string);
        let encoded = match challenge_header {
            Some(encoded) => encoded,
            None => {
                let message = response.text().await.unwrap_or_default();
                return Err(ClientError::authentication_failed(
                    StatusCode::FORBIDDEN,
                    format!("403 without an OpenKitx403 challenge: {message}"),
                ));
            }
        };

        let proof = Self::build_proof(signer, &encoded).await?;
        debug!(url = %url, address = %proof.address, "answering OpenKitx403 challenge");

        let response = self
            .request(method, url.clone(), body)
            .header(AUTHORIZATION, proof.to_header_value())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = response.text().await.unwrap_or_default();
            warn!(url = %url, status = status.as_u16(), "signed retry rejected");
            return Err(ClientError::authentication_failed(status, message));
        }

        Ok(response)
    }

    /// Authenticated request that decodes a JSON success body
    pub async fn authenticate_json<T: DeserializeOwned>(
        &self,
        signer: &dyn WalletSigner,
        method: Method,
        target: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        let response = self.authenticate(signer, method, target, body).await?;
        send_json(response).await
    }

    /// Build the `Authorization` proof for an encoded challenge.
    ///
    /// The proof binds to the challenge's own method and path, so a proof
    /// for a challenge issued for another route fails the server's bind check.
    pub async fn build_proof(
        signer: &dyn WalletSigner,
        encoded_challenge: &str,
    ) -> Result<AuthorizationProof> {
        let challenge = Challenge::decode(encoded_challenge)?;
        let signing_string = build_signing_string(&challenge)?;
        let signature = signer.sign(signing_string.as_bytes()).await?;

        let mut nonce = [0u8; PROOF_NONCE_BYTES];
        OsRng.fill_bytes(&mut nonce);

        Ok(AuthorizationProof {
            address: signer.address(),
            signature: codec::base58_encode(&signature),
            challenge: encoded_challenge.to_string(),
            timestamp: format_timestamp(Utc::now()),
            nonce: codec::base58_encode(nonce),
            bind: Some(challenge.bind_target()),
        })
    }
}

/// Decode a JSON body, mapping non-success statuses to `InvalidResponse`
async fn send_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(ClientError::InvalidResponse(format!(
            "HTTP {}: {text}",
            status.as_u16()
        )));
    }
    Ok(serde_json::from_str(&text)?)
}
