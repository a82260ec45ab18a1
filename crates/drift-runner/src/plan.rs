//! Iteration planning and request preparation

use crate::url::construct_url;
use drift_client::ApiRequest;
use drift_config::{ApiConfig, Operation};
use drift_core::{ApiKind, IterationAssignment, TokenSpec, ORIGINAL_PAYLOAD_LABEL};
use drift_iteration::{generate, IterationStrategy};
use drift_template::{PayloadTemplate, RenderOutcome};

/// Iterations a run executes, in report order.
///
/// With tokens present the untouched payload runs first, ahead of the
/// generated assignments.
pub fn plan_iterations(
    tokens: &TokenSpec,
    max_iterations: usize,
    strategy: IterationStrategy,
) -> Vec<IterationAssignment> {
    let generated = generate(tokens, max_iterations, strategy);
    if tokens.is_empty() {
        return generated;
    }

    let mut iterations = Vec::with_capacity(generated.len() + 1);
    iterations.push(IterationAssignment::empty());
    iterations.extend(generated);
    iterations
}

/// Report name of an operation; iteration 1 is the original payload
pub fn operation_label(operation: &str, iteration_number: usize) -> String {
    if iteration_number == 1 {
        format!("{} {}", operation, ORIGINAL_PAYLOAD_LABEL)
    } else {
        operation.to_string()
    }
}

/// An operation resolved against its API: URL, method and loaded template
#[derive(Debug, Clone)]
pub(crate) struct PreparedOperation {
    pub name: String,
    pub url: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    template: Option<PayloadTemplate>,
    kind: ApiKind,
}

impl PreparedOperation {
    pub fn new(api: &ApiConfig, operation: &Operation, kind: ApiKind) -> Self {
        let method = operation
            .methods
            .first()
            .map(|m| m.to_ascii_uppercase())
            .unwrap_or_else(|| "GET".to_string());
        let template = operation
            .payload_template_path
            .as_deref()
            .filter(|source| !source.trim().is_empty())
            .map(|source| PayloadTemplate::load(source, kind.format()));

        Self {
            name: operation.name.clone(),
            url: construct_url(&api.base_url, operation.path.as_deref(), kind),
            method,
            headers: operation
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            template,
            kind,
        }
    }

    /// `SOAPAction` header of the operation, if configured
    pub fn soap_action(&self) -> Option<String> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("SOAPAction"))
            .map(|(_, value)| value.clone())
    }

    /// Request body for `assignment`; an empty assignment sends the template as written
    pub fn payload(&self, assignment: &IterationAssignment) -> Option<RenderOutcome> {
        let template = self.template.as_ref()?;
        if template.content().trim().is_empty() {
            return None;
        }
        if assignment.is_empty() {
            return Some(RenderOutcome::Rendered(template.content().to_string()));
        }
        Some(template.render(assignment))
    }

    /// Request for `assignment`, with the fallback reason if the template
    /// could not be rendered
    pub fn request(&self, assignment: &IterationAssignment) -> (ApiRequest, Option<String>) {
        let mut request = ApiRequest::new(self.method.clone(), self.url.clone());
        for (name, value) in &self.headers {
            request = request.header(name.clone(), value.clone());
        }

        let mut fallback = None;
        if let Some(outcome) = self.payload(assignment) {
            let has_content_type = request
                .headers
                .keys()
                .any(|k| k.eq_ignore_ascii_case("content-type"));
            if !has_content_type {
                request = request.header("Content-Type", self.kind.format().content_type());
            }
            let body = match outcome {
                RenderOutcome::Rendered(text) => text,
                RenderOutcome::FellBackToLiteral { text, reason } => {
                    fallback = Some(reason);
                    text
                }
            };
            request = request.body(body);
        }
        (request, fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_core::TokenValue;
    use indexmap::IndexMap;

    fn operation(template: Option<&str>) -> Operation {
        let mut headers = IndexMap::new();
        headers.insert("soapaction".to_string(), "urn:get".to_string());
        Operation {
            name: "getAccount".to_string(),
            path: Some("accounts".to_string()),
            methods: vec!["post".to_string(), "GET".to_string()],
            headers,
            payload_template_path: template.map(String::from),
        }
    }

    fn api() -> ApiConfig {
        ApiConfig {
            base_url: "http://host/api/".to_string(),
            authentication: None,
            operations: vec![],
        }
    }

    #[test]
    fn test_original_payload_runs_first_when_tokens_exist() {
        let tokens = TokenSpec::new().with_token("id", [1, 2]);
        let iterations = plan_iterations(&tokens, 100, IterationStrategy::AllCombinations);

        assert_eq!(iterations.len(), 3);
        assert!(iterations[0].is_empty());
        assert_eq!(iterations[1].get("id"), Some(&TokenValue::Integer(1)));
    }

    #[test]
    fn test_no_tokens_is_single_empty_iteration() {
        let iterations = plan_iterations(&TokenSpec::new(), 100, IterationStrategy::OneByOne);
        assert_eq!(iterations, vec![IterationAssignment::empty()]);
    }

    #[test]
    fn test_operation_label() {
        assert_eq!(
            operation_label("getAccount", 1),
            "getAccount (Original Input Payload)"
        );
        assert_eq!(operation_label("getAccount", 2), "getAccount");
    }

    #[test]
    fn test_request_uses_first_method_and_url() {
        let prepared = PreparedOperation::new(&api(), &operation(None), ApiKind::Rest);
        let (request, fallback) = prepared.request(&IterationAssignment::empty());

        assert!(fallback.is_none());
        assert_eq!(request.method, "POST");
        assert_eq!(request.url, "http://host/api/accounts");
        assert!(request.body.is_none());
        assert_eq!(prepared.soap_action().as_deref(), Some("urn:get"));
    }

    #[test]
    fn test_original_payload_is_sent_verbatim() {
        let template = "{ \"accountId\": 1 }";
        let prepared = PreparedOperation::new(&api(), &operation(Some(template)), ApiKind::Rest);

        let (original, _) = prepared.request(&IterationAssignment::empty());
        assert_eq!(original.body.as_deref(), Some(template));
        assert_eq!(original.headers["Content-Type"], "application/json");

        let tokens = IterationAssignment::empty().with_value("accountId", TokenValue::Integer(9));
        let (rendered, fallback) = prepared.request(&tokens);
        assert_eq!(rendered.body.as_deref(), Some(r#"{"accountId":9}"#));
        assert!(fallback.is_none());
    }

    #[test]
    fn test_unparsable_template_is_sent_literally_and_flagged() {
        let template = "{ \"accountId\": 1,";
        let prepared = PreparedOperation::new(&api(), &operation(Some(template)), ApiKind::Rest);

        let tokens = IterationAssignment::empty().with_value("accountId", TokenValue::Integer(9));
        let (request, fallback) = prepared.request(&tokens);

        assert_eq!(request.body.as_deref(), Some(template));
        assert!(fallback.is_some());
    }
}
