//! Lambda function executor.

use crate::backend::LambdaApi;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::result::{ExecuteResult, decode_json, lambda_error_message, validate_json_object_input};
use crate::types::{ExecutorKind, ExecutorTarget};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Invokes a Lambda function synchronously.
pub struct LambdaFunctionExecutor {
    target: ExecutorTarget,
    client: Arc<dyn LambdaApi>,
}

impl LambdaFunctionExecutor {
    /// Create an executor for the function in `target`.
    pub fn new(target: ExecutorTarget, client: Arc<dyn LambdaApi>) -> Self {
        Self { target, client }
    }
}

impl Executor for LambdaFunctionExecutor {
    fn target(&self) -> &ExecutorTarget {
        &self.target
    }

    fn kind(&self) -> ExecutorKind {
        ExecutorKind::LambdaFunction
    }

    fn execute(&self, input: Option<&str>) -> Result<ExecuteResult> {
        let input = validate_json_object_input(input)?;
        let function = &self.target.physical_resource_id;

        log::debug!("Invoking {function}");
        let response = self.client.invoke(function, input)?;
        if let Some(kind) = &response.function_error {
            log::debug!("{function} reported a {kind} error");
        }

        let payload = response.payload.ok_or_else(|| Error::MissingPayload {
            function: function.clone(),
        })?;
        let payload = decode_json("function payload", &String::from_utf8_lossy(&payload))?;

        Ok(match lambda_error_message(&payload) {
            Some(message) => ExecuteResult::failure(message, Some(payload)),
            None => ExecuteResult::success(Some(payload)),
        })
    }

    fn environment_variables(&self) -> Result<BTreeMap<String, String>> {
        let configuration = self
            .client
            .get_function_configuration(&self.target.physical_resource_id)?;
        Ok(configuration.into_variables())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, RemoteCall};
    use crate::types::{FunctionConfiguration, InvokeOutput};
    use serde_json::json;

    const FUNCTION: &str = "Stack-Fn-1A2B3C";

    fn executor(mock: &MockBackend) -> LambdaFunctionExecutor {
        LambdaFunctionExecutor::new(ExecutorTarget::physical(FUNCTION), Arc::new(mock.clone()))
    }

    #[test]
    fn test_invoke_success() {
        let mock = MockBackend::new();
        mock.set_invoke_output(InvokeOutput::with_payload(r#"{"statusCode":200}"#));

        let result = executor(&mock).execute(Some(r#"{"key":"value"}"#)).unwrap();

        assert_eq!(result, ExecuteResult::success(Some(json!({"statusCode": 200}))));
        assert_eq!(
            mock.calls(),
            vec![RemoteCall::Invoke {
                function: FUNCTION.into(),
                payload: Some(r#"{"key":"value"}"#.into()),
            }]
        );
    }

    #[test]
    fn test_error_message_payload() {
        let mock = MockBackend::new();
        mock.set_invoke_output(InvokeOutput {
            status_code: Some(200),
            function_error: Some("Unhandled".into()),
            payload: Some(br#"{"errorType":"Error","errorMessage":"boom"}"#.to_vec()),
        });

        let result = executor(&mock).execute(None).unwrap();

        assert_eq!(result.error.as_deref(), Some("boom"));
        assert_eq!(
            result.output,
            Some(json!({"errorType": "Error", "errorMessage": "boom"}))
        );
    }

    #[test]
    fn test_scalar_payload() {
        let mock = MockBackend::new();
        mock.set_invoke_output(InvokeOutput::with_payload("\"done\""));

        let result = executor(&mock).execute(None).unwrap();
        assert_eq!(result, ExecuteResult::success(Some(json!("done"))));
    }

    #[test]
    fn test_missing_payload() {
        let mock = MockBackend::new();
        mock.set_invoke_output(InvokeOutput::default());

        let err = executor(&mock).execute(None).unwrap_err();
        assert!(matches!(err, Error::MissingPayload { ref function } if function == FUNCTION));
    }

    #[test]
    fn test_undecodable_payload() {
        let mock = MockBackend::new();
        mock.set_invoke_output(InvokeOutput::with_payload("not json"));

        let err = executor(&mock).execute(None).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_invalid_input_makes_no_calls() {
        let mock = MockBackend::new();

        let err = executor(&mock).execute(Some("[1, 2, 3]")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_environment_variables() {
        let mock = MockBackend::new();
        mock.set_function_configuration(
            FUNCTION,
            FunctionConfiguration::with_variables(BTreeMap::from([
                ("TABLE_NAME".to_string(), "orders".to_string()),
                ("STAGE".to_string(), "dev".to_string()),
            ])),
        );

        let variables = executor(&mock).environment_variables().unwrap();
        assert_eq!(variables.len(), 2);
        assert_eq!(variables["TABLE_NAME"], "orders");
        assert_eq!(
            mock.calls(),
            vec![RemoteCall::GetFunctionConfiguration {
                function: FUNCTION.into()
            }]
        );
    }

    #[test]
    fn test_environment_variables_absent() {
        let mock = MockBackend::new();
        mock.set_function_configuration(FUNCTION, FunctionConfiguration::default());

        assert!(executor(&mock).environment_variables().unwrap().is_empty());
    }
}
