use serde::Serialize;
use serde_json::Value;

/// Metadata key under which the CDK records a resource's construct path.
pub const PATH_METADATA_KEY: &str = "aws:cdk:path";

/// CloudFormation type of a Step Functions state machine.
pub const STATE_MACHINE_TYPE: &str = "AWS::StepFunctions::StateMachine";

/// CloudFormation type of a Lambda function.
pub const LAMBDA_FUNCTION_TYPE: &str = "AWS::Lambda::Function";

/// A synthesized cloud assembly: an ordered list of stacks.
#[derive(Debug, Clone, Default)]
pub struct CloudAssembly {
    /// Stacks in manifest order
    pub stacks: Vec<Stack>,
}

impl CloudAssembly {
    /// Build an assembly from stacks that are already in memory.
    pub fn from_stacks(stacks: Vec<Stack>) -> Self {
        Self { stacks }
    }

    /// Find a stack by name.
    pub fn stack(&self, name: &str) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.stack_name == name)
    }
}

/// One deployed stack and its synthesized CloudFormation template.
#[derive(Debug, Clone)]
pub struct Stack {
    /// The deployed stack name
    pub stack_name: String,
    /// The template document, resource order preserved
    pub template: Value,
}

impl Stack {
    /// Create a stack from a parsed template.
    pub fn new(stack_name: impl Into<String>, template: Value) -> Self {
        Self {
            stack_name: stack_name.into(),
            template,
        }
    }

    /// Iterate the template's `Resources` entries in template order.
    ///
    /// Yields nothing if the template has no `Resources` object.
    pub fn resources(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.template
            .get("Resources")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|resources| resources.iter())
    }
}

/// A template resource that satisfied every active filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingResource {
    /// Name of the stack containing the resource
    pub stack_name: String,
    /// Logical ID of the resource within its template
    pub logical_resource_id: String,
    /// The CloudFormation type
    #[serde(rename = "type")]
    pub resource_type: String,
    /// The resource's construct path metadata
    pub construct_path: String,
}
