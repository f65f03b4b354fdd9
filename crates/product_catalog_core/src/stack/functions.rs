use serde_json::{json, Value};

use super::ids;
use super::network::{SubnetTier, Subnets};
use super::template::{get_att, join, ref_, select, split, sub, Resource, Template};
use super::StackConfig;
use crate::settings::{DB_LOCATION_VAR, DB_NAME_VAR, DB_USER_VAR};

pub(crate) const RUNTIME: &str = "provided.al2023";
pub(crate) const ARCHITECTURE: &str = "arm64";
pub(crate) const HANDLER: &str = "bootstrap";

pub(crate) const BASIC_EXECUTION_POLICY: &str =
    "arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";
const VPC_ACCESS_POLICY: &str =
    "arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaVPCAccessExecutionRole";

pub(crate) fn add_code_parameters(template: &mut Template, config: &StackConfig) {
    template.add_parameter(
        ids::ARTIFACT_BUCKET_PARAM,
        "S3 bucket holding the packaged bootstrap zips",
        None,
    );
    template.add_parameter(
        ids::FETCH_CODE_KEY_PARAM,
        "S3 key of the fetch-products function zip",
        Some(&config.artifact_keys.fetch_products),
    );
    template.add_parameter(
        ids::SEED_CODE_KEY_PARAM,
        "S3 key of the seed-database function zip",
        Some(&config.artifact_keys.seed_db),
    );
    template.add_parameter(
        ids::TRIGGER_CODE_KEY_PARAM,
        "S3 key of the seed trigger provider zip",
        Some(&config.artifact_keys.seed_trigger),
    );
}

pub(crate) fn add_functions(template: &mut Template, config: &StackConfig, subnets: &Subnets) {
    add_database_function(
        template,
        config,
        subnets,
        DatabaseFunction {
            logical_id: ids::FETCH_FUNCTION,
            role_id: ids::FETCH_ROLE,
            code_key_param: ids::FETCH_CODE_KEY_PARAM,
            timeout_secs: config.fetch_timeout_secs,
        },
    );
    add_database_function(
        template,
        config,
        subnets,
        DatabaseFunction {
            logical_id: ids::SEED_FUNCTION,
            role_id: ids::SEED_ROLE,
            code_key_param: ids::SEED_CODE_KEY_PARAM,
            timeout_secs: config.seed_timeout_secs,
        },
    );
}

struct DatabaseFunction {
    logical_id: &'static str,
    role_id: &'static str,
    code_key_param: &'static str,
    timeout_secs: u32,
}

fn add_database_function(
    template: &mut Template,
    config: &StackConfig,
    subnets: &Subnets,
    function: DatabaseFunction,
) {
    template.add_resource(
        function.role_id,
        Resource::new(
            "AWS::IAM::Role",
            json!({
                "AssumeRolePolicyDocument": lambda_assume_role_policy(),
                "ManagedPolicyArns": [
                    sub(BASIC_EXECUTION_POLICY),
                    sub(VPC_ACCESS_POLICY),
                ],
                "Policies": [{
                    "PolicyName": "ProxyConnect",
                    "PolicyDocument": {
                        "Version": "2012-10-17",
                        "Statement": [proxy_connect_statement(config)],
                    },
                }],
            }),
        ),
    );

    template.add_resource(
        function.logical_id,
        Resource::new(
            "AWS::Lambda::Function",
            json!({
                "FunctionName": config.function_name(function.logical_id),
                "Runtime": RUNTIME,
                "Architectures": [ARCHITECTURE],
                "Handler": HANDLER,
                "MemorySize": config.function_memory_mb,
                "Timeout": function.timeout_secs,
                "Role": get_att(function.role_id, "Arn"),
                "Code": code_from_parameter(function.code_key_param),
                "VpcConfig": {
                    "SubnetIds": subnets.refs(SubnetTier::Isolated),
                    "SecurityGroupIds": [get_att(ids::LAMBDA_SG, "GroupId")],
                },
                "Environment": {
                    "Variables": {
                        DB_LOCATION_VAR: get_att(ids::PROXY, "Endpoint"),
                        DB_USER_VAR: config.db_user_name,
                        DB_NAME_VAR: config.database_name,
                    },
                },
            }),
        )
        .depends_on([function.role_id]),
    );
}

pub(crate) fn lambda_assume_role_policy() -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": "lambda.amazonaws.com" },
            "Action": "sts:AssumeRole",
        }],
    })
}

pub(crate) fn code_from_parameter(code_key_param: &str) -> Value {
    json!({
        "S3Bucket": ref_(ids::ARTIFACT_BUCKET_PARAM),
        "S3Key": ref_(code_key_param),
    })
}

/// `rds-db:connect` on the proxy for the database user.
///
/// The proxy resource id is the last segment of its ARN
/// (`arn:aws:rds:<region>:<account>:db-proxy:<id>`).
fn proxy_connect_statement(config: &StackConfig) -> Value {
    let proxy_resource_id = select(6, split(":", get_att(ids::PROXY, "DBProxyArn")));
    json!({
        "Effect": "Allow",
        "Action": "rds-db:connect",
        "Resource": join(
            "",
            vec![
                json!("arn:"),
                ref_("AWS::Partition"),
                json!(":rds-db:"),
                ref_("AWS::Region"),
                json!(":"),
                ref_("AWS::AccountId"),
                json!(":dbuser:"),
                proxy_resource_id,
                json!(format!("/{}", config.db_user_name)),
            ],
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::network::add_network;

    fn functions_template() -> Template {
        let config = StackConfig::default();
        let mut template = Template::new("functions");
        add_code_parameters(&mut template, &config);
        let subnets = add_network(&mut template, &config).expect("network should build");
        add_functions(&mut template, &config, &subnets);
        template
    }

    #[test]
    fn both_functions_point_at_proxy_endpoint() {
        let template = functions_template();
        for logical_id in [ids::FETCH_FUNCTION, ids::SEED_FUNCTION] {
            let function = template.resource(logical_id).expect("function should exist");
            let variables = &function.properties["Environment"]["Variables"];

            assert_eq!(variables["DB_LOCATION"], get_att(ids::PROXY, "Endpoint"));
            assert_eq!(variables["DB_USER"], "db_user");
            assert_eq!(variables["DB_NAME"], "product_db");
            assert_eq!(function.properties["Runtime"], "provided.al2023");
            assert_eq!(function.properties["Architectures"][0], "arm64");
            assert_eq!(function.properties["MemorySize"], 1024);
        }
    }

    #[test]
    fn seed_function_gets_longer_timeout() {
        let template = functions_template();
        let fetch = template.resource(ids::FETCH_FUNCTION).expect("fetch function");
        let seed = template.resource(ids::SEED_FUNCTION).expect("seed function");

        assert_eq!(fetch.properties["Timeout"], 30);
        assert_eq!(seed.properties["Timeout"], 240);
    }

    #[test]
    fn roles_grant_proxy_connect_for_db_user() {
        let template = functions_template();
        let role = template.resource(ids::SEED_ROLE).expect("seed role");
        let statement = &role.properties["Policies"][0]["PolicyDocument"]["Statement"][0];

        assert_eq!(statement["Action"], "rds-db:connect");
        let parts = statement["Resource"]["Fn::Join"][1]
            .as_array()
            .expect("join parts");
        assert_eq!(parts.last(), Some(&json!("/db_user")));
    }

    #[test]
    fn code_is_read_from_artifact_parameters() {
        let template = functions_template();
        let fetch = template.resource(ids::FETCH_FUNCTION).expect("fetch function");

        assert_eq!(
            fetch.properties["Code"]["S3Key"],
            ref_(ids::FETCH_CODE_KEY_PARAM)
        );
        assert_eq!(
            template.parameters[ids::SEED_CODE_KEY_PARAM].default.as_deref(),
            Some("lambda/seed_db_lambda.zip")
        );
    }
}
