//! Organization lookups and organization-scoped listings.

use serde_json::Value;

use crate::client::MapillaryClient;
use crate::decode;
use crate::errors::Result;
use crate::filter::FilterSet;
use crate::geo;
use crate::models::{Detection, Image, Organization, ResultPage, Sequence};

use super::{collect_fields, params_with_fields, require_id};

/// Fluent query builder for organization resources.
#[derive(Debug, Clone)]
pub struct OrganizationsRequest<'a> {
    client: &'a MapillaryClient,
    fields: Vec<String>,
}

impl<'a> OrganizationsRequest<'a> {
    pub(crate) fn new(client: &'a MapillaryClient) -> Self {
        Self { client, fields: Vec::new() }
    }

    /// Select which fields the response should include.
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = collect_fields(names);
        self
    }

    /// Fetch a single organization by id.
    pub async fn get_by_id(&self, organization_id: &str) -> Result<Organization> {
        require_id("organization_id", organization_id)?;

        let params = params_with_fields(&FilterSet::new(), &self.fields);
        let body = self.client.get_json(&format!("/{organization_id}"), &params).await?;
        decode::decode_record(body)
    }

    /// List the organizations the authenticated user belongs to.
    pub async fn get_current_user_organizations(&self) -> Result<ResultPage<Organization>> {
        let params = params_with_fields(&FilterSet::new(), &self.fields);
        let body = self.client.get_json("/me/organizations", &params).await?;
        decode::decode_page(body)
    }

    /// Fetch contribution statistics for an organization over a date range.
    /// The shape of the aggregation is upstream-defined, so it is returned
    /// as raw JSON.
    pub async fn get_stats(
        &self,
        organization_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Value> {
        require_id("organization_id", organization_id)?;
        geo::validate_date_string(start_date)?;
        geo::validate_date_string(end_date)?;

        let mut params = params_with_fields(&FilterSet::new(), &self.fields);
        params.set("start_date", start_date);
        params.set("end_date", end_date);
        self.client.get_json(&format!("/{organization_id}/stats"), &params).await
    }

    /// List images owned by an organization.
    pub async fn get_images(
        &self,
        organization_id: &str,
        limit: Option<u32>,
    ) -> Result<ResultPage<Image>> {
        let params = self.scoped_params(organization_id, limit)?;
        let body = self.client.get_json("/images", &params).await?;
        decode::decode_page(body)
    }

    /// List sequences owned by an organization.
    pub async fn get_sequences(
        &self,
        organization_id: &str,
        limit: Option<u32>,
    ) -> Result<ResultPage<Sequence>> {
        let params = self.scoped_params(organization_id, limit)?;
        let body = self.client.get_json("/sequences", &params).await?;
        decode::decode_page(body)
    }

    /// List detections owned by an organization.
    pub async fn get_detections(
        &self,
        organization_id: &str,
        limit: Option<u32>,
    ) -> Result<ResultPage<Detection>> {
        let params = self.scoped_params(organization_id, limit)?;
        let body = self.client.get_json("/map_features", &params).await?;
        decode::decode_page(body)
    }

    fn scoped_params(&self, organization_id: &str, limit: Option<u32>) -> Result<FilterSet> {
        require_id("organization_id", organization_id)?;

        let mut params = params_with_fields(&FilterSet::new(), &self.fields);
        params.set("organization_id", organization_id);
        if let Some(limit) = limit {
            params.set("limit", limit.to_string());
        }
        Ok(params)
    }
}
