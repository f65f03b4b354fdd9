use serde_json::json;

use super::ids;
use super::template::{get_att, ref_, sub, Resource, Template};
use super::StackConfig;

pub(crate) const PRODUCT_PATH_PART: &str = "product";
pub(crate) const PRODUCT_METHOD: &str = "POST";

pub(crate) fn add_rest_api(template: &mut Template, config: &StackConfig) {
    template.add_resource(
        ids::REST_API,
        Resource::new("AWS::ApiGateway::RestApi", json!({ "Name": ids::REST_API })),
    );

    template.add_resource(
        ids::PRODUCT_RESOURCE,
        Resource::new(
            "AWS::ApiGateway::Resource",
            json!({
                "ParentId": get_att(ids::REST_API, "RootResourceId"),
                "PathPart": PRODUCT_PATH_PART,
                "RestApiId": ref_(ids::REST_API),
            }),
        ),
    );

    template.add_resource(
        ids::PRODUCT_POST_METHOD,
        Resource::new(
            "AWS::ApiGateway::Method",
            json!({
                "HttpMethod": PRODUCT_METHOD,
                "ResourceId": ref_(ids::PRODUCT_RESOURCE),
                "RestApiId": ref_(ids::REST_API),
                "AuthorizationType": "NONE",
                "Integration": {
                    "Type": "AWS_PROXY",
                    "IntegrationHttpMethod": "POST",
                    "Uri": sub(&format!(
                        "arn:${{AWS::Partition}}:apigateway:${{AWS::Region}}:lambda:path/2015-03-31/functions/${{{}.Arn}}/invocations",
                        ids::FETCH_FUNCTION
                    )),
                },
            }),
        ),
    );

    template.add_resource(
        ids::API_DEPLOYMENT,
        Resource::new(
            "AWS::ApiGateway::Deployment",
            json!({
                "RestApiId": ref_(ids::REST_API),
                "Description": "Automatically created by the RestApi construct",
            }),
        )
        .depends_on([ids::PRODUCT_POST_METHOD, ids::PRODUCT_RESOURCE]),
    );

    template.add_resource(
        ids::API_STAGE,
        Resource::new(
            "AWS::ApiGateway::Stage",
            json!({
                "RestApiId": ref_(ids::REST_API),
                "DeploymentId": ref_(ids::API_DEPLOYMENT),
                "StageName": config.api_stage_name,
            }),
        ),
    );

    template.add_resource(
        ids::API_INVOKE_PERMISSION,
        Resource::new(
            "AWS::Lambda::Permission",
            json!({
                "Action": "lambda:InvokeFunction",
                "FunctionName": get_att(ids::FETCH_FUNCTION, "Arn"),
                "Principal": "apigateway.amazonaws.com",
                "SourceArn": sub(&format!(
                    "arn:${{AWS::Partition}}:execute-api:${{AWS::Region}}:${{AWS::AccountId}}:${{{}}}/*/{PRODUCT_METHOD}/{PRODUCT_PATH_PART}",
                    ids::REST_API
                )),
            }),
        ),
    );
}
