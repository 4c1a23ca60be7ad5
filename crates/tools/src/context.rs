use crate::communication_tools::SmsGateway;
use database::Database;
use memory::{DocType, SvDocumentManager};
use std::sync::Arc;

/// Shared handles every tool is built from.
#[derive(Clone)]
pub struct ToolContext {
    pub db: Arc<dyn Database>,
    pub docs: Option<Arc<SvDocumentManager>>,
    pub sms: SmsGateway,
}

impl ToolContext {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            docs: None,
            sms: SmsGateway::simulated(),
        }
    }

    pub fn with_docs(mut self, docs: Arc<SvDocumentManager>) -> Self {
        self.docs = Some(docs);
        self
    }

    pub fn with_sms(mut self, sms: SmsGateway) -> Self {
        self.sms = sms;
        self
    }

    /// Documentation context, or an empty string without a document manager.
    pub(crate) async fn documentation(
        &self,
        query: &str,
        doc_type: Option<DocType>,
        max_docs: usize,
    ) -> String {
        match &self.docs {
            Some(docs) => docs.get_relevant_documentation(query, doc_type, max_docs).await,
            None => String::new(),
        }
    }
}
