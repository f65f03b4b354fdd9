use serde_json::json;

use super::ids;
use super::network::{SubnetTier, Subnets};
use super::template::{get_att, ref_, sub, Resource, Template};
use super::StackConfig;

const ENGINE: &str = "aurora-mysql";
const DEFAULT_CLUSTER_PARAMETER_GROUP: &str = "default.aurora-mysql8.0";

pub(crate) fn add_database(template: &mut Template, config: &StackConfig, subnets: &Subnets) {
    add_credentials_secret(template, config);
    add_cluster(template, config, subnets);
    add_proxy(template, config, subnets);
}

fn add_credentials_secret(template: &mut Template, config: &StackConfig) {
    template.add_resource(
        ids::SECRET,
        Resource::new(
            "AWS::SecretsManager::Secret",
            json!({
                "Name": config.secret_name(),
                "GenerateSecretString": {
                    "SecretStringTemplate": json!({ "username": config.db_user_name }).to_string(),
                    "GenerateStringKey": "password",
                    "ExcludePunctuation": true,
                    "IncludeSpace": false,
                },
            }),
        )
        .removal_policy("Delete"),
    );
    template.add_resource(
        ids::SECRET_ATTACHMENT,
        Resource::new(
            "AWS::SecretsManager::SecretTargetAttachment",
            json!({
                "SecretId": ref_(ids::SECRET),
                "TargetId": ref_(ids::CLUSTER),
                "TargetType": "AWS::RDS::DBCluster",
            }),
        ),
    );
}

fn add_cluster(template: &mut Template, config: &StackConfig, subnets: &Subnets) {
    template.add_resource(
        ids::DB_SUBNET_GROUP,
        Resource::new(
            "AWS::RDS::DBSubnetGroup",
            json!({
                "DBSubnetGroupDescription": format!("Subnets for {} database", ids::CLUSTER),
                "SubnetIds": subnets.refs(SubnetTier::Isolated),
            }),
        )
        .removal_policy("Delete"),
    );

    let secret_field = |field: &str| {
        sub(&format!(
            "{{{{resolve:secretsmanager:${{{}}}:SecretString:{field}::}}}}",
            ids::SECRET
        ))
    };

    template.add_resource(
        ids::CLUSTER,
        Resource::new(
            "AWS::RDS::DBCluster",
            json!({
                "DBClusterIdentifier": config.cluster_identifier,
                "Engine": ENGINE,
                "EngineVersion": config.engine_version,
                "DatabaseName": config.database_name,
                "Port": config.db_port,
                "MasterUsername": secret_field("username"),
                "MasterUserPassword": secret_field("password"),
                "BackupRetentionPeriod": config.backup_retention_days,
                "DBSubnetGroupName": ref_(ids::DB_SUBNET_GROUP),
                "DBClusterParameterGroupName": DEFAULT_CLUSTER_PARAMETER_GROUP,
                "VpcSecurityGroupIds": [get_att(ids::DATABASE_SG, "GroupId")],
                "CopyTagsToSnapshot": true,
            }),
        )
        .removal_policy("Delete"),
    );

    template.add_resource(
        ids::CLUSTER_INSTANCE,
        Resource::new(
            "AWS::RDS::DBInstance",
            json!({
                "DBClusterIdentifier": ref_(ids::CLUSTER),
                "DBInstanceClass": config.instance_class,
                "DBSubnetGroupName": ref_(ids::DB_SUBNET_GROUP),
                "Engine": ENGINE,
                "PubliclyAccessible": false,
            }),
        )
        .removal_policy("Delete")
        .depends_on(
            subnets
                .ids(SubnetTier::Isolated)
                .into_iter()
                .map(|subnet| format!("{subnet}RouteTableAssociation")),
        ),
    );
}

fn add_proxy(template: &mut Template, config: &StackConfig, subnets: &Subnets) {
    template.add_resource(
        ids::PROXY_ROLE,
        Resource::new(
            "AWS::IAM::Role",
            json!({
                "AssumeRolePolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Effect": "Allow",
                        "Principal": { "Service": "rds.amazonaws.com" },
                        "Action": "sts:AssumeRole",
                    }],
                },
                "Policies": [{
                    "PolicyName": "ProxySecretAccess",
                    "PolicyDocument": {
                        "Version": "2012-10-17",
                        "Statement": [{
                            "Effect": "Allow",
                            "Action": [
                                "secretsmanager:GetSecretValue",
                                "secretsmanager:DescribeSecret",
                            ],
                            "Resource": ref_(ids::SECRET_ATTACHMENT),
                        }],
                    },
                }],
            }),
        ),
    );

    template.add_resource(
        ids::PROXY,
        Resource::new(
            "AWS::RDS::DBProxy",
            json!({
                "DBProxyName": config.proxy_name(),
                "EngineFamily": "MYSQL",
                "Auth": [{
                    "AuthScheme": "SECRETS",
                    "IAMAuth": "REQUIRED",
                    "SecretArn": ref_(ids::SECRET_ATTACHMENT),
                }],
                "RoleArn": get_att(ids::PROXY_ROLE, "Arn"),
                "VpcSubnetIds": subnets.refs(SubnetTier::Isolated),
                "VpcSecurityGroupIds": [get_att(ids::PROXY_SG, "GroupId")],
                "RequireTLS": true,
                "DebugLogging": true,
                "IdleClientTimeout": 1800,
            }),
        ),
    );

    template.add_resource(
        ids::PROXY_TARGET_GROUP,
        Resource::new(
            "AWS::RDS::DBProxyTargetGroup",
            json!({
                "DBProxyName": ref_(ids::PROXY),
                "TargetGroupName": "default",
                "DBClusterIdentifiers": [ref_(ids::CLUSTER)],
                "ConnectionPoolConfigurationInfo": {},
            }),
        )
        .depends_on([ids::CLUSTER_INSTANCE]),
    );
}
