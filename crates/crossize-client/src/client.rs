//! HTTP client for the analysis backend using reqwest
//!
//! Every call is a single attempt. Failures come back as [`ClientError`] and
//! the caller turns them into an `Action::RequestFailed`.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crossize_core::{BackendSettings, ComparisonResult, Instrument, Sample};

use crate::error::{ClientError, ClientResult};
use crate::models::{
    AxisRecommendation, CrossValidateRequest, CrossValidationPayload, FcsResults,
    GatedAnalysisRequest, GatedStats, NtaResults, PopulationShiftRequest, SampleListing,
    SampleSummary, ScatterResponse, ShiftReport,
};

const USER_AGENT: &str = concat!("crossize/", env!("CARGO_PKG_VERSION"));

/// Client bound to one backend base URL
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base: Url,
    scatter_limit: usize,
}

impl BackendClient {
    /// Client with the timeout and base URL from `settings`
    pub fn new(settings: &BackendSettings) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        let mut backend = Self::with_client(client, &settings.base_url)?;
        backend.scatter_limit = settings.scatter_limit;
        Ok(backend)
    }

    /// Use an existing reqwest client
    pub fn with_client(client: Client, base_url: &str) -> ClientResult<Self> {
        let base = Url::parse(base_url).map_err(|_| ClientError::InvalidUrl {
            url: base_url.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl {
                url: base_url.to_string(),
            });
        }

        Ok(Self {
            client,
            base,
            scatter_limit: BackendSettings::default().scatter_limit,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `base` joined with percent-encoded path segments
    pub fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl {
                url: self.base.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, what: &'static str, url: Url) -> ClientResult<T> {
        tracing::debug!(%url, what, "GET");
        let response = self.client.get(url).send().await?;
        read_json(what, response).await
    }

    async fn post_json<B, T>(&self, what: &'static str, url: Url, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(%url, what, "POST");
        let response = self.client.post(url).json(body).send().await?;
        read_json(what, response).await
    }

    /// `GET /samples`
    pub async fn list_samples(&self) -> ClientResult<Vec<SampleSummary>> {
        let listing: SampleListing = self
            .get_json("sample listing", self.endpoint(&["samples"])?)
            .await?;
        Ok(listing.into_samples())
    }

    /// `GET /samples/{id}/fcs`
    pub async fn fcs_results(&self, sample_id: &str) -> ClientResult<FcsResults> {
        self.get_json("FCS results", self.endpoint(&["samples", sample_id, "fcs"])?)
            .await
    }

    /// `GET /samples/{id}/nta`
    pub async fn nta_results(&self, sample_id: &str) -> ClientResult<NtaResults> {
        self.get_json("NTA results", self.endpoint(&["samples", sample_id, "nta"])?)
            .await
    }

    /// NTA results as a local sample
    pub async fn nta_sample(&self, sample_id: &str) -> ClientResult<Sample> {
        let results = self.nta_results(sample_id).await?;
        let distribution = results
            .distribution()
            .ok_or_else(|| ClientError::Decode {
                what: "NTA results",
                message: "no size distribution".to_string(),
            })?
            .map_err(|e| ClientError::Decode {
                what: "NTA results",
                message: e.to_string(),
            })?;
        Ok(Sample::from_distribution(
            results.sample_id,
            Instrument::Nta,
            distribution,
        ))
    }

    /// `GET /samples/{id}/scatter`, limited to the configured point count
    /// unless `limit` is given
    pub async fn scatter(
        &self,
        sample_id: &str,
        x_channel: &str,
        y_channel: &str,
        limit: Option<usize>,
    ) -> ClientResult<ScatterResponse> {
        let mut url = self.endpoint(&["samples", sample_id, "scatter"])?;
        url.query_pairs_mut()
            .append_pair("x", x_channel)
            .append_pair("y", y_channel)
            .append_pair("limit", &limit.unwrap_or(self.scatter_limit).to_string());
        self.get_json("scatter points", url).await
    }

    /// `POST /cross-validate`
    pub async fn cross_validate(
        &self,
        request: &CrossValidateRequest,
    ) -> ClientResult<ComparisonResult> {
        let payload: CrossValidationPayload = self
            .post_json("cross-validation", self.endpoint(&["cross-validate"])?, request)
            .await?;
        payload.into_result(request)
    }

    /// `POST /population-shift`
    pub async fn population_shift(
        &self,
        request: &PopulationShiftRequest,
    ) -> ClientResult<ShiftReport> {
        self.post_json("population shift", self.endpoint(&["population-shift"])?, request)
            .await
    }

    /// `POST /gated-analysis`
    pub async fn gated_analysis(&self, request: &GatedAnalysisRequest) -> ClientResult<GatedStats> {
        self.post_json("gated analysis", self.endpoint(&["gated-analysis"])?, request)
            .await
    }

    /// `GET /samples/{id}/axis-recommendation`
    pub async fn axis_recommendation(&self, sample_id: &str) -> ClientResult<AxisRecommendation> {
        self.get_json(
            "axis recommendation",
            self.endpoint(&["samples", sample_id, "axis-recommendation"])?,
        )
        .await
    }
}

async fn read_json<T: DeserializeOwned>(what: &'static str, response: Response) -> ClientResult<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), what, "Backend request rejected");
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }
    parse_body(what, &body)
}

pub(crate) fn parse_body<T: DeserializeOwned>(what: &'static str, body: &str) -> ClientResult<T> {
    serde_json::from_str(body).map_err(|e| ClientError::Decode {
        what,
        message: e.to_string(),
    })
}
