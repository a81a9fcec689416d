//! Categorization stage: cleaned remark + amounts → category / subcategory / confidence.
//!
//! Categories are not a fixed set. The model discovers them and the system
//! prompt keeps the labels consistent.

use anyhow::Result;
use async_trait::async_trait;
use ledgerlens_core::{CategoryAnnotation, Model, RemarkAnnotation, Stage, Transaction};

use crate::prompts::{category_prompt, CATEGORY_SYSTEM_PROMPT};
use crate::response::parse_category_response;

/// What the categorizer sees of a row
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizeInput {
    pub description: String,
    pub withdrawal: f64,
    pub deposit: f64,
}

impl CategorizeInput {
    pub fn new(description: impl Into<String>, withdrawal: f64, deposit: f64) -> Self {
        Self {
            description: description.into(),
            withdrawal,
            deposit,
        }
    }

    pub fn from_row(txn: &Transaction, remark: &RemarkAnnotation) -> Self {
        Self::new(remark.cleaned_remark.as_str(), txn.withdrawal, txn.deposit)
    }
}

pub struct Categorizer<M> {
    model: M,
}

impl<M: Model> Categorizer<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub async fn categorize(&self, input: &CategorizeInput) -> Result<CategoryAnnotation> {
        let prompt = category_prompt(&input.description, input.withdrawal, input.deposit);
        let reply = self.model.invoke(&prompt, CATEGORY_SYSTEM_PROMPT).await?;
        Ok(parse_category_response(&reply))
    }
}

#[async_trait]
impl<M: Model> Stage for Categorizer<M> {
    type Input = CategorizeInput;
    type Output = CategoryAnnotation;

    fn name(&self) -> &str {
        "categories"
    }

    fn is_blank(&self, input: &CategorizeInput) -> bool {
        input.description.trim().is_empty()
    }

    fn sentinel(&self) -> CategoryAnnotation {
        CategoryAnnotation::unclear()
    }

    async fn transform(&self, input: &CategorizeInput) -> Result<CategoryAnnotation> {
        self.categorize(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerlens_core::Confidence;

    struct Echo(&'static str);

    #[async_trait]
    impl Model for Echo {
        async fn invoke(&self, user: &str, _system: &str) -> Result<String> {
            assert!(user.contains("Deposit Amount(INR): ₹800.00"));
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_categorize_refund() {
        let stage = Categorizer::new(Echo(
            "Output: {\"category\": \"Refund\", \"subcategory\": \"\", \"confidence\": \"High\"}",
        ));
        let input = CategorizeInput::new("Temporary reversal (refund back to Kotak Mahindra account)", 0.0, 800.0);
        let out = stage.transform(&input).await.unwrap();
        assert_eq!(out, CategoryAnnotation::new("Refund", None, Confidence::High));
    }

    #[tokio::test]
    async fn test_unstructured_reply_falls_back() {
        let stage = Categorizer::new(Echo("I think this is a reversal of a failed payment."));
        let out = stage.transform(&CategorizeInput::new("Reversal", 0.0, 800.0)).await.unwrap();
        assert_eq!(out.category, "Refund");
        assert_eq!(out.confidence, Confidence::Low);
    }

    #[test]
    fn test_blank_description() {
        let stage = Categorizer::new(Echo(""));
        assert!(stage.is_blank(&CategorizeInput::new(" ", 10.0, 0.0)));
        assert!(stage.sentinel().is_unclear());
    }
}
