use serde_json::json;

use super::functions::{
    code_from_parameter, lambda_assume_role_policy, ARCHITECTURE, BASIC_EXECUTION_POLICY, HANDLER,
    RUNTIME,
};
use super::ids;
use super::template::{get_att, ref_, sub, Resource, Template};
use super::StackConfig;
use crate::contract::SEED_FUNCTION_NAME_PROPERTY;

pub(crate) const TRIGGER_RESOURCE_TYPE: &str = "Custom::CreateDatabaseTrigger";

/// Provider function plus the custom resource that asks it to seed the table.
pub(crate) fn add_seed_trigger(template: &mut Template, config: &StackConfig) {
    template.add_resource(
        ids::TRIGGER_ROLE,
        Resource::new(
            "AWS::IAM::Role",
            json!({
                "AssumeRolePolicyDocument": lambda_assume_role_policy(),
                "ManagedPolicyArns": [
                    sub(BASIC_EXECUTION_POLICY),
                ],
                "Policies": [{
                    "PolicyName": "InvokeSeedFunction",
                    "PolicyDocument": {
                        "Version": "2012-10-17",
                        "Statement": [{
                            "Effect": "Allow",
                            "Action": "lambda:InvokeFunction",
                            "Resource": get_att(ids::SEED_FUNCTION, "Arn"),
                        }],
                    },
                }],
            }),
        ),
    );

    template.add_resource(
        ids::TRIGGER_FUNCTION,
        Resource::new(
            "AWS::Lambda::Function",
            json!({
                "Runtime": RUNTIME,
                "Architectures": [ARCHITECTURE],
                "Handler": HANDLER,
                "MemorySize": 128,
                "Timeout": config.trigger_timeout_secs,
                "Role": get_att(ids::TRIGGER_ROLE, "Arn"),
                "Code": code_from_parameter(ids::TRIGGER_CODE_KEY_PARAM),
            }),
        )
        .depends_on([ids::TRIGGER_ROLE]),
    );

    let mut properties = serde_json::Map::new();
    properties.insert(
        "ServiceToken".to_string(),
        get_att(ids::TRIGGER_FUNCTION, "Arn"),
    );
    properties.insert(
        SEED_FUNCTION_NAME_PROPERTY.to_string(),
        ref_(ids::SEED_FUNCTION),
    );

    template.add_resource(
        ids::TRIGGER,
        Resource::new(TRIGGER_RESOURCE_TYPE, properties.into())
            .depends_on([ids::PROXY, ids::PROXY_TARGET_GROUP, ids::SEED_FUNCTION]),
    );
}
