//! Remark normalization stage: raw UPI/NEFT/IMPS remark → cleaned text + doubt note.

use anyhow::Result;
use async_trait::async_trait;
use ledgerlens_core::{Model, RemarkAnnotation, Stage};

use crate::prompts::{remark_prompt, REMARK_SYSTEM_PROMPT};
use crate::response::parse_remark_response;

pub struct RemarkNormalizer<M> {
    model: M,
}

impl<M: Model> RemarkNormalizer<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Normalize one remark outside of a batch
    pub async fn normalize(&self, remark: &str) -> Result<RemarkAnnotation> {
        let reply = self.model.invoke(&remark_prompt(remark), REMARK_SYSTEM_PROMPT).await?;
        Ok(parse_remark_response(&reply))
    }
}

#[async_trait]
impl<M: Model> Stage for RemarkNormalizer<M> {
    type Input = String;
    type Output = RemarkAnnotation;

    fn name(&self) -> &str {
        "remarks"
    }

    fn is_blank(&self, remark: &String) -> bool {
        remark.trim().is_empty()
    }

    fn sentinel(&self) -> RemarkAnnotation {
        RemarkAnnotation::default()
    }

    async fn transform(&self, remark: &String) -> Result<RemarkAnnotation> {
        self.normalize(remark).await
    }
}
