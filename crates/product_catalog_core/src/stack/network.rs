use std::net::Ipv4Addr;

use serde_json::{json, Value};

use super::ids;
use super::template::{availability_zone, get_att, ref_, select, tags, Resource, Template};
use super::{StackConfig, StackConfigError};

const INTERNET_GATEWAY: &str = "ECommerceServerlessVPCIGW";
const GATEWAY_ATTACHMENT: &str = "ECommerceServerlessVPCVPCGW";

/// AWS accepts VPC blocks from /16 to /28.
const VPC_PREFIX_RANGE: std::ops::RangeInclusive<u32> = 16..=28;
/// Host bits of a /28, the smallest subnet AWS accepts.
const MIN_SUBNET_HOST_BITS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubnetTier {
    Isolated,
    Public,
    Private,
}

impl SubnetTier {
    /// Allocation order of the tiers inside the VPC range.
    const ALL: [SubnetTier; 3] = [Self::Isolated, Self::Public, Self::Private];

    fn name(self) -> &'static str {
        match self {
            Self::Isolated => "isolated",
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    fn subnet_type_tag(self) -> &'static str {
        match self {
            Self::Isolated => "Isolated",
            Self::Public => "Public",
            Self::Private => "Private",
        }
    }
}

/// Logical ids of the subnets created, in allocation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Subnets {
    entries: Vec<(SubnetTier, String)>,
}

impl Subnets {
    pub(crate) fn ids(&self, tier: SubnetTier) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(entry_tier, _)| *entry_tier == tier)
            .map(|(_, logical_id)| logical_id.as_str())
            .collect()
    }

    pub(crate) fn refs(&self, tier: SubnetTier) -> Value {
        Value::Array(self.ids(tier).into_iter().map(ref_).collect())
    }

    fn push(&mut self, tier: SubnetTier, logical_id: String) {
        self.entries.push((tier, logical_id));
    }
}

fn subnet_id(tier: SubnetTier, az_number: usize) -> String {
    format!("{}{}Subnet{az_number}", ids::VPC, tier.name())
}

fn nat_gateway_id(az_number: usize) -> String {
    format!("{}NATGateway", subnet_id(SubnetTier::Public, az_number))
}

fn subnet_count(config: &StackConfig) -> usize {
    SubnetTier::ALL.len() * config.availability_zones
}

/// Host bits per subnet (`Fn::Cidr` `cidrBits`): the VPC range is split into
/// equal blocks, one per tier and zone, with the count rounded up to a power
/// of two.
///
/// A /16 split six ways yields /19s; nine ways yields /20s.
pub(crate) fn subnet_cidr_bits(config: &StackConfig) -> Result<u32, StackConfigError> {
    if config.availability_zones == 0 {
        return Err(StackConfigError::NoAvailabilityZones);
    }

    let vpc_host_bits = 32 - vpc_prefix_len(&config.vpc_cidr)?;
    let subnets = subnet_count(config);
    let split_bits = subnets.next_power_of_two().trailing_zeros();

    vpc_host_bits
        .checked_sub(split_bits)
        .filter(|bits| *bits >= MIN_SUBNET_HOST_BITS)
        .ok_or_else(|| StackConfigError::VpcTooSmall {
            vpc_cidr: config.vpc_cidr.clone(),
            subnets,
        })
}

fn vpc_prefix_len(vpc_cidr: &str) -> Result<u32, StackConfigError> {
    let invalid = || StackConfigError::InvalidVpcCidr(vpc_cidr.to_string());
    let (address, prefix) = vpc_cidr.split_once('/').ok_or_else(invalid)?;
    address.parse::<Ipv4Addr>().map_err(|_| invalid())?;
    let prefix = prefix.parse::<u32>().map_err(|_| invalid())?;
    if !VPC_PREFIX_RANGE.contains(&prefix) {
        return Err(invalid());
    }
    Ok(prefix)
}

pub(crate) fn add_network(
    template: &mut Template,
    config: &StackConfig,
) -> Result<Subnets, StackConfigError> {
    let cidr_bits = subnet_cidr_bits(config)?;
    let cidrs = json!({
        "Fn::Cidr": [get_att(ids::VPC, "CidrBlock"), subnet_count(config), cidr_bits.to_string()]
    });

    let vpc_name = format!("{}/{}", config.stack_name, ids::VPC);
    template.add_resource(
        ids::VPC,
        Resource::new(
            "AWS::EC2::VPC",
            json!({
                "CidrBlock": config.vpc_cidr,
                "EnableDnsHostnames": true,
                "EnableDnsSupport": true,
                "InstanceTenancy": "default",
                "Tags": tags(&vpc_name),
            }),
        ),
    );
    template.add_resource(
        INTERNET_GATEWAY,
        Resource::new("AWS::EC2::InternetGateway", json!({ "Tags": tags(&vpc_name) })),
    );
    template.add_resource(
        GATEWAY_ATTACHMENT,
        Resource::new(
            "AWS::EC2::VPCGatewayAttachment",
            json!({
                "VpcId": ref_(ids::VPC),
                "InternetGatewayId": ref_(INTERNET_GATEWAY),
            }),
        ),
    );

    let mut subnets = Subnets::default();
    let mut cidr_index = 0;
    for tier in SubnetTier::ALL {
        for az in 0..config.availability_zones {
            let logical_id = subnet_id(tier, az + 1);
            let cidr_block = select(cidr_index, cidrs.clone());
            add_subnet(template, config, tier, az, &logical_id, cidr_block);
            subnets.push(tier, logical_id);
            cidr_index += 1;
        }
    }

    Ok(subnets)
}

fn add_subnet(
    template: &mut Template,
    config: &StackConfig,
    tier: SubnetTier,
    az: usize,
    logical_id: &str,
    cidr_block: Value,
) {
    let az_number = az + 1;
    template.add_resource(
        logical_id,
        Resource::new(
            "AWS::EC2::Subnet",
            json!({
                "VpcId": ref_(ids::VPC),
                "AvailabilityZone": availability_zone(az),
                "CidrBlock": cidr_block,
                "MapPublicIpOnLaunch": tier == SubnetTier::Public,
                "Tags": [
                    { "Key": "Name", "Value": format!("{}/{logical_id}", config.stack_name) },
                    { "Key": "aws-cdk:subnet-name", "Value": tier.name() },
                    { "Key": "aws-cdk:subnet-type", "Value": tier.subnet_type_tag() },
                ],
            }),
        ),
    );

    let route_table = format!("{logical_id}RouteTable");
    template.add_resource(
        &route_table,
        Resource::new(
            "AWS::EC2::RouteTable",
            json!({
                "VpcId": ref_(ids::VPC),
                "Tags": tags(&format!("{}/{logical_id}", config.stack_name)),
            }),
        ),
    );
    template.add_resource(
        format!("{logical_id}RouteTableAssociation"),
        Resource::new(
            "AWS::EC2::SubnetRouteTableAssociation",
            json!({
                "RouteTableId": ref_(&route_table),
                "SubnetId": ref_(logical_id),
            }),
        ),
    );

    match tier {
        SubnetTier::Isolated => {}
        SubnetTier::Public => {
            template.add_resource(
                format!("{logical_id}DefaultRoute"),
                Resource::new(
                    "AWS::EC2::Route",
                    json!({
                        "RouteTableId": ref_(&route_table),
                        "DestinationCidrBlock": "0.0.0.0/0",
                        "GatewayId": ref_(INTERNET_GATEWAY),
                    }),
                )
                .depends_on([GATEWAY_ATTACHMENT]),
            );
            let eip = format!("{logical_id}EIP");
            template.add_resource(
                &eip,
                Resource::new("AWS::EC2::EIP", json!({ "Domain": "vpc" })),
            );
            template.add_resource(
                nat_gateway_id(az_number),
                Resource::new(
                    "AWS::EC2::NatGateway",
                    json!({
                        "SubnetId": ref_(logical_id),
                        "AllocationId": get_att(&eip, "AllocationId"),
                        "Tags": tags(&format!("{}/{logical_id}", config.stack_name)),
                    }),
                )
                .depends_on([
                    format!("{logical_id}DefaultRoute"),
                    format!("{logical_id}RouteTableAssociation"),
                ]),
            );
        }
        SubnetTier::Private => {
            template.add_resource(
                format!("{logical_id}DefaultRoute"),
                Resource::new(
                    "AWS::EC2::Route",
                    json!({
                        "RouteTableId": ref_(&route_table),
                        "DestinationCidrBlock": "0.0.0.0/0",
                        "NatGatewayId": ref_(&nat_gateway_id(az_number)),
                    }),
                ),
            );
        }
    }
}

pub(crate) fn add_security_groups(template: &mut Template, config: &StackConfig) {
    add_security_group(template, config, ids::LAMBDA_SG);
    add_security_group(template, config, ids::PROXY_SG);
    add_security_group(template, config, ids::DATABASE_SG);

    add_ingress_from(
        template,
        config,
        ids::PROXY_SG,
        ids::LAMBDA_SG,
        "allow lambda to connect to rds proxy",
    );
    add_ingress_from(
        template,
        config,
        ids::DATABASE_SG,
        ids::PROXY_SG,
        "allow rds proxy to connect to rds",
    );
}

fn add_security_group(template: &mut Template, config: &StackConfig, logical_id: &str) {
    template.add_resource(
        logical_id,
        Resource::new(
            "AWS::EC2::SecurityGroup",
            json!({
                "GroupDescription": format!("{}/{logical_id}", config.stack_name),
                "VpcId": ref_(ids::VPC),
                "SecurityGroupEgress": [{
                    "CidrIp": "0.0.0.0/0",
                    "Description": "Allow all outbound traffic by default",
                    "IpProtocol": "-1",
                }],
            }),
        ),
    );
}

fn add_ingress_from(
    template: &mut Template,
    config: &StackConfig,
    target_sg: &str,
    source_sg: &str,
    description: &str,
) {
    template.add_resource(
        format!("{target_sg}from{source_sg}IndirectPort"),
        Resource::new(
            "AWS::EC2::SecurityGroupIngress",
            json!({
                "GroupId": get_att(target_sg, "GroupId"),
                "SourceSecurityGroupId": get_att(source_sg, "GroupId"),
                "IpProtocol": "tcp",
                "FromPort": config.db_port,
                "ToPort": config.db_port,
                "Description": description,
            }),
        ),
    );
}
