use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use domain::{KbAccessType, Node, NodeConfiguration, NodeKind};

use crate::{ExecutionContext, NodeBehavior, NodeError};

use super::mismatch;

/// Knowledge-base reference action. Resolves the reference and the search
/// terms; an optional `query` parameter is appended to the keywords.
pub struct KnowledgeBaseBehavior;

#[async_trait]
impl NodeBehavior for KnowledgeBaseBehavior {
    fn kind(&self) -> NodeKind {
        NodeKind::KbNode
    }

    async fn execute(&self, node: &Node, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        let NodeConfiguration::KbNode(kb) = &node.configuration else {
            return Err(mismatch(node, NodeKind::KbNode));
        };

        if kb.access_type == KbAccessType::Write && ctx.parameter("content").is_none() {
            return Err(NodeError::Fatal(format!(
                "write access to '{}' needs a 'content' parameter",
                kb.kb_reference_id
            )));
        }

        let mut keywords = kb.search_keywords.clone();
        if let Some(query) = ctx.parameter("query").and_then(Value::as_str) {
            keywords.push(query.to_owned());
        }

        debug!(node_id = %node.id, kb = %kb.kb_reference_id, "knowledge base resolved");
        Ok(json!({
            "kbReferenceId": kb.kb_reference_id,
            "accessType": kb.access_type.as_ref(),
            "keywords": keywords,
            "content": ctx.parameter("content"),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviors::fixtures;
    use domain::KbConfiguration;

    fn kb(access_type: KbAccessType) -> Node {
        fixtures::action(NodeConfiguration::KbNode(KbConfiguration {
            kb_reference_id: "policies".into(),
            access_type,
            search_keywords: vec!["refund".into()],
        }))
    }

    #[tokio::test]
    async fn query_extends_keywords() {
        let ctx = ExecutionContext::new("dan").with_parameter("query", json!("late delivery"));
        let out = KnowledgeBaseBehavior.execute(&kb(KbAccessType::Read), &ctx).await.unwrap();
        assert_eq!(out["keywords"], json!(["refund", "late delivery"]));
    }

    #[tokio::test]
    async fn write_without_content_is_fatal() {
        let err = KnowledgeBaseBehavior
            .execute(&kb(KbAccessType::Write), &ExecutionContext::system())
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::Fatal(_)));
    }
}
