//! Gateway implementation against the hosted Supabase backend.
//!
//! Applications live in the `loan_applications` table behind the PostgREST
//! interface (`/rest/v1/...`); transaction files go to the
//! `transaction-files` storage bucket. Every call carries the project anon
//! key plus a bearer credential from the injected provider.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use loan_core::gateway::{
    CredentialProvider, FieldRejection, FileUpload, GatewayError, StoredFile, SubmissionGateway,
    validate_upload,
};
use loan_core::models::{
    NewTransactionRecord, StoredApplication, SubmissionRecord, TransactionRecord,
};

use crate::config::SupabaseConfig;

const APPLICATIONS_TABLE: &str = "loan_applications";
const TRANSACTIONS_TABLE: &str = "transaction_records";
const STORAGE_BUCKET: &str = "transaction-files";

/// Error body shape returned by PostgREST on constraint violations.
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    message: Option<String>,
    details: Option<String>,
    #[allow(dead_code)]
    hint: Option<String>,
    #[allow(dead_code)]
    code: Option<String>,
}

/// Pulls a column name out of messages like
/// `null value in column "loan_term" of relation ...`.
fn column_from_message(message: &str) -> Option<String> {
    let start = message.find("column \"")? + "column \"".len();
    let rest = &message[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

/// [`SubmissionGateway`] backed by Supabase's REST and Storage endpoints.
pub struct SupabaseGateway {
    http: Client,
    base_url: String,
    anon_key: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl SupabaseGateway {
    pub fn new(config: SupabaseConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let http = Client::builder()
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key,
            credentials,
        })
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn storage_object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, STORAGE_BUCKET, path
        )
    }

    fn storage_public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, STORAGE_BUCKET, path
        )
    }

    /// Builds the per-request header set. A missing credential is an
    /// [`GatewayError::Auth`] before anything goes on the wire.
    fn headers(&self) -> Result<HeaderMap, GatewayError> {
        let token = self.credentials.bearer_token().ok_or(GatewayError::Auth)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key)
                .map_err(|e| GatewayError::Network(format!("invalid anon key: {e}")))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| GatewayError::Network(format!("invalid bearer token: {e}")))?,
        );
        Ok(headers)
    }

    /// Maps a non-success REST response onto the gateway taxonomy.
    async fn rejection_from(response: Response) -> GatewayError {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return GatewayError::Auth;
        }

        let body: Option<PostgrestErrorBody> = response.json().await.ok();
        let message = body
            .as_ref()
            .and_then(|b| b.message.clone())
            .unwrap_or_else(|| format!("request failed with status {status}"));

        if status.is_server_error() {
            return GatewayError::Network(message);
        }

        let field_errors = body
            .as_ref()
            .and_then(|b| {
                let source = b.details.as_deref().unwrap_or(message.as_str());
                column_from_message(source).map(|field| {
                    vec![FieldRejection {
                        field: Some(field),
                        message: message.clone(),
                    }]
                })
            })
            .unwrap_or_default();

        GatewayError::Rejected {
            message,
            field_errors,
        }
    }

    /// Sends a request and deserializes a success body, folding transport
    /// and decode failures into [`GatewayError::Network`].
    async fn read_json<T: DeserializeOwned>(
        request: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection_from(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Network(format!("invalid response body: {e}")))
    }

    /// PostgREST returns inserted/updated rows as an array even for a single
    /// record; take the first.
    fn single(mut rows: Vec<StoredApplication>) -> Result<StoredApplication, GatewayError> {
        if rows.is_empty() {
            return Err(GatewayError::Network(
                "persistence endpoint returned no rows".to_string(),
            ));
        }
        Ok(rows.remove(0))
    }
}

#[async_trait]
impl SubmissionGateway for SupabaseGateway {
    async fn submit(&self, record: &SubmissionRecord) -> Result<StoredApplication, GatewayError> {
        let headers = self.headers()?;
        tracing::debug!(email = %record.email, "submitting application");

        let rows: Vec<StoredApplication> = Self::read_json(
            self.http
                .post(self.rest_url(APPLICATIONS_TABLE))
                .headers(headers)
                .header("Prefer", "return=representation")
                .json(&[record]),
        )
        .await?;

        let stored = Self::single(rows)?;
        tracing::info!(id = %stored.id, "application stored");
        Ok(stored)
    }

    async fn upload_file(
        &self,
        file: &FileUpload,
        application_id: &str,
    ) -> Result<StoredFile, GatewayError> {
        validate_upload(file)?;

        // Every failure past this point is file-specific; the record already
        // exists, so everything maps to Upload.
        let headers = self.headers().map_err(|e| match e {
            GatewayError::Auth => GatewayError::Upload("missing credential".to_string()),
            other => other,
        })?;

        let path = format!(
            "{application_id}/transaction_{}.csv",
            chrono::Utc::now().timestamp_millis()
        );

        let response = self
            .http
            .post(self.storage_object_url(&path))
            .headers(headers)
            .header("Content-Type", file.content_type.clone())
            .body(file.bytes.clone())
            .send()
            .await
            .map_err(|e| GatewayError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Upload(format!(
                "storage rejected the file ({status}): {body}"
            )));
        }

        tracing::info!(%path, "transaction file uploaded");
        Ok(StoredFile {
            url: self.storage_public_url(&path),
            name: file.name.clone(),
        })
    }

    async fn attach_file(
        &self,
        application_id: &str,
        url: &str,
        name: &str,
    ) -> Result<StoredApplication, GatewayError> {
        let headers = self.headers()?;

        let rows: Vec<StoredApplication> = Self::read_json(
            self.http
                .patch(self.rest_url(APPLICATIONS_TABLE))
                .query(&[("id", format!("eq.{application_id}"))])
                .headers(headers)
                .header("Prefer", "return=representation")
                .json(&serde_json::json!({
                    "transaction_file_url": url,
                    "transaction_file_name": name,
                })),
        )
        .await?;

        Self::single(rows)
    }

    async fn application(&self, id: &str) -> Result<StoredApplication, GatewayError> {
        let headers = self.headers()?;

        let rows: Vec<StoredApplication> = Self::read_json(
            self.http
                .get(self.rest_url(APPLICATIONS_TABLE))
                .query(&[("id", format!("eq.{id}")), ("select", "*".to_string())])
                .headers(headers),
        )
        .await?;

        rows.into_iter().next().ok_or_else(|| GatewayError::Rejected {
            message: format!("application {id} not found"),
            field_errors: Vec::new(),
        })
    }

    async fn applications_for(
        &self,
        email: &str,
    ) -> Result<Vec<StoredApplication>, GatewayError> {
        let headers = self.headers()?;

        Self::read_json(
            self.http
                .get(self.rest_url(APPLICATIONS_TABLE))
                .query(&[
                    ("email", format!("eq.{email}")),
                    ("select", "*".to_string()),
                    ("order", "created_at.desc".to_string()),
                ])
                .headers(headers),
        )
        .await
    }

    async fn store_transactions(
        &self,
        application_id: &str,
        rows: &[NewTransactionRecord],
    ) -> Result<Vec<TransactionRecord>, GatewayError> {
        #[derive(serde::Serialize)]
        struct Insert<'a> {
            application_id: &'a str,
            #[serde(flatten)]
            row: &'a NewTransactionRecord,
        }

        let headers = self.headers()?;
        let payload: Vec<Insert<'_>> = rows
            .iter()
            .map(|row| Insert {
                application_id,
                row,
            })
            .collect();

        Self::read_json(
            self.http
                .post(self.rest_url(TRANSACTIONS_TABLE))
                .headers(headers)
                .header("Prefer", "return=representation")
                .json(&payload),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use loan_core::gateway::{NoCredentials, StaticCredentials};
    use pretty_assertions::assert_eq;

    use super::*;

    fn gateway(credentials: Arc<dyn CredentialProvider>) -> SupabaseGateway {
        SupabaseGateway::new(
            SupabaseConfig {
                url: "https://abc.supabase.co/".to_string(),
                anon_key: "anon".to_string(),
            },
            credentials,
        )
        .unwrap()
    }

    #[test]
    fn rest_url_tolerates_trailing_slash_in_base() {
        let gw = gateway(Arc::new(StaticCredentials("tok".to_string())));

        assert_eq!(
            gw.rest_url("loan_applications"),
            "https://abc.supabase.co/rest/v1/loan_applications"
        );
    }

    #[test]
    fn storage_urls_point_into_the_bucket() {
        let gw = gateway(Arc::new(StaticCredentials("tok".to_string())));

        assert_eq!(
            gw.storage_object_url("app-1/transaction_1.csv"),
            "https://abc.supabase.co/storage/v1/object/transaction-files/app-1/transaction_1.csv"
        );
        assert_eq!(
            gw.storage_public_url("app-1/transaction_1.csv"),
            "https://abc.supabase.co/storage/v1/object/public/transaction-files/app-1/transaction_1.csv"
        );
    }

    #[test]
    fn missing_credential_is_an_auth_error_before_any_call() {
        let gw = gateway(Arc::new(NoCredentials));

        assert!(matches!(gw.headers(), Err(GatewayError::Auth)));
    }

    #[test]
    fn headers_carry_apikey_and_bearer() {
        let gw = gateway(Arc::new(StaticCredentials("tok".to_string())));

        let headers = gw.headers().unwrap();

        assert_eq!(headers.get("apikey").unwrap(), "anon");
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer tok");
    }

    #[test]
    fn column_is_extracted_from_constraint_messages() {
        assert_eq!(
            column_from_message(
                "null value in column \"loan_term\" of relation \"loan_applications\""
            ),
            Some("loan_term".to_string())
        );
        assert_eq!(column_from_message("permission denied"), None);
    }
}
