//! Stack definition for the product catalog deployment.
//!
//! `synthesize` turns a [`StackConfig`] into a CloudFormation [`Template`]:
//! VPC and security groups, the Aurora MySQL cluster behind an IAM-auth RDS
//! Proxy, the fetch and seed functions, the REST API, and the custom resource
//! that seeds the table once the stack is created.

mod api;
mod database;
mod functions;
mod network;
pub mod template;
mod trigger;

use thiserror::Error;

pub use template::{Output, Parameter, Resource, Template};

pub const MAX_FUNCTION_NAME_CHARS: usize = 64;
pub const MAX_PROXY_NAME_CHARS: usize = 60;

/// A [`StackConfig`] that would produce a template CloudFormation rejects.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StackConfigError {
    #[error("vpc_cidr must be an IPv4 block between /16 and /28, got '{0}'")]
    InvalidVpcCidr(String),
    #[error("availability_zones must be at least 1")]
    NoAvailabilityZones,
    #[error("{vpc_cidr} cannot hold {subnets} subnets of /28 or larger")]
    VpcTooSmall { vpc_cidr: String, subnets: usize },
    #[error("{kind} name '{name}' exceeds {max} characters")]
    NameTooLong {
        kind: &'static str,
        name: String,
        max: usize,
    },
}

/// Logical ids shared between the stack modules and their tests.
pub mod ids {
    pub const VPC: &str = "ECommerceServerlessVPC";
    pub const LAMBDA_SG: &str = "LambdaSG";
    pub const PROXY_SG: &str = "RDSProxySG";
    pub const DATABASE_SG: &str = "RDSSG";
    pub const DB_SUBNET_GROUP: &str = "ProductDBClusterSubnets";
    pub const SECRET: &str = "ProductRDSProxySecret";
    pub const SECRET_ATTACHMENT: &str = "ProductRDSProxySecretAttachment";
    pub const CLUSTER: &str = "ProductDBCluster";
    pub const CLUSTER_INSTANCE: &str = "ProductDBClusterInstance1";
    pub const PROXY: &str = "ProductDBProxy";
    pub const PROXY_ROLE: &str = "ProductDBProxyRole";
    pub const PROXY_TARGET_GROUP: &str = "ProductDBProxyTargetGroup";
    pub const FETCH_FUNCTION: &str = "CreateProductLambda";
    pub const FETCH_ROLE: &str = "CreateProductLambdaRole";
    pub const SEED_FUNCTION: &str = "CreateProductDatabaseLambda";
    pub const SEED_ROLE: &str = "CreateProductDatabaseLambdaRole";
    pub const REST_API: &str = "ProductAPI";
    pub const PRODUCT_RESOURCE: &str = "ProductAPIproduct";
    pub const PRODUCT_POST_METHOD: &str = "ProductAPIproductPOST";
    pub const API_DEPLOYMENT: &str = "ProductAPIDeployment";
    pub const API_STAGE: &str = "ProductAPIDeploymentStageprod";
    pub const API_INVOKE_PERMISSION: &str = "ProductAPIproductPOSTPermission";
    pub const TRIGGER_FUNCTION: &str = "CreateDatabaseTriggerProvider";
    pub const TRIGGER_ROLE: &str = "CreateDatabaseTriggerProviderRole";
    pub const TRIGGER: &str = "CreateDatabaseTrigger";
    pub const ARTIFACT_BUCKET_PARAM: &str = "LambdaArtifactBucket";
    pub const FETCH_CODE_KEY_PARAM: &str = "FetchProductsCodeKey";
    pub const SEED_CODE_KEY_PARAM: &str = "SeedDbCodeKey";
    pub const TRIGGER_CODE_KEY_PARAM: &str = "SeedTriggerCodeKey";
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackConfig {
    /// Construct id of the stack; prefixes the secret and function names.
    pub stack_name: String,
    pub vpc_cidr: String,
    pub availability_zones: usize,
    pub db_user_name: String,
    pub database_name: String,
    pub db_port: u16,
    pub cluster_identifier: String,
    pub engine_version: String,
    pub instance_class: String,
    pub backup_retention_days: u32,
    pub function_memory_mb: u32,
    pub fetch_timeout_secs: u32,
    pub seed_timeout_secs: u32,
    pub trigger_timeout_secs: u32,
    pub api_stage_name: String,
    pub artifact_keys: ArtifactKeys,
}

/// Default S3 keys of the packaged `bootstrap` zips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactKeys {
    pub fetch_products: String,
    pub seed_db: String,
    pub seed_trigger: String,
}

impl Default for ArtifactKeys {
    fn default() -> Self {
        Self {
            fetch_products: "lambda/fetch_products_lambda.zip".to_string(),
            seed_db: "lambda/seed_db_lambda.zip".to_string(),
            seed_trigger: "lambda/seed_trigger_lambda.zip".to_string(),
        }
    }
}

impl StackConfig {
    pub fn new(stack_name: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            vpc_cidr: "10.0.0.0/16".to_string(),
            availability_zones: 2,
            db_user_name: "db_user".to_string(),
            database_name: "product_db".to_string(),
            db_port: 3306,
            cluster_identifier: "ProductDBCluster".to_string(),
            engine_version: "8.0.mysql_aurora.3.02.1".to_string(),
            instance_class: "db.t3.medium".to_string(),
            backup_retention_days: 1,
            function_memory_mb: 1024,
            fetch_timeout_secs: 30,
            seed_timeout_secs: 240,
            trigger_timeout_secs: 900,
            api_stage_name: "prod".to_string(),
            artifact_keys: ArtifactKeys::default(),
        }
    }

    pub fn secret_name(&self) -> String {
        format!("{}-rds-credentials", self.stack_name)
    }

    pub fn function_name(&self, logical_id: &str) -> String {
        format!("{}{logical_id}", self.stack_name)
    }

    pub fn proxy_name(&self) -> String {
        format!("{}-productdbproxy", self.stack_name.to_lowercase())
    }

    /// Checks the name lengths and the subnet layout before anything is synthesized.
    pub fn validate(&self) -> Result<(), StackConfigError> {
        for logical_id in [ids::FETCH_FUNCTION, ids::SEED_FUNCTION] {
            check_name_length(
                "function",
                self.function_name(logical_id),
                MAX_FUNCTION_NAME_CHARS,
            )?;
        }
        check_name_length("proxy", self.proxy_name(), MAX_PROXY_NAME_CHARS)?;
        network::subnet_cidr_bits(self)?;
        Ok(())
    }
}

fn check_name_length(kind: &'static str, name: String, max: usize) -> Result<(), StackConfigError> {
    if name.chars().count() > max {
        return Err(StackConfigError::NameTooLong { kind, name, max });
    }
    Ok(())
}

impl Default for StackConfig {
    fn default() -> Self {
        Self::new("ServerlessExampleStack")
    }
}

pub fn synthesize(config: &StackConfig) -> Result<Template, StackConfigError> {
    config.validate()?;

    let mut template = Template::new(format!(
        "{}: product catalog API on Aurora MySQL behind an IAM-auth RDS Proxy",
        config.stack_name
    ));

    functions::add_code_parameters(&mut template, config);
    let subnets = network::add_network(&mut template, config)?;
    network::add_security_groups(&mut template, config);
    database::add_database(&mut template, config, &subnets);
    functions::add_functions(&mut template, config, &subnets);
    api::add_rest_api(&mut template, config);
    trigger::add_seed_trigger(&mut template, config);
    add_outputs(&mut template, config);

    Ok(template)
}

fn add_outputs(template: &mut Template, config: &StackConfig) {
    template.add_output(
        "ProductApiEndpoint",
        "Invoke URL of the product REST API",
        template::sub(&format!(
            "https://${{{}}}.execute-api.${{AWS::Region}}.${{AWS::URLSuffix}}/{}/",
            ids::REST_API,
            config.api_stage_name
        )),
    );
    template.add_output(
        "ProductDBProxyEndpoint",
        "RDS Proxy endpoint used as DB_LOCATION",
        template::get_att(ids::PROXY, "Endpoint"),
    );
    template.add_output(
        "ProductDBClusterEndpoint",
        "Writer endpoint of the Aurora cluster",
        template::get_att(ids::CLUSTER, "Endpoint.Address"),
    );
}
