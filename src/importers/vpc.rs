use super::{ImportContext, ImportIdStrategy};

/// `aws_route`: `<route table>_<destination cidr>`
pub struct RouteImporter;

impl ImportIdStrategy for RouteImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
        let table = ctx.require_related("AWS::EC2::RouteTable", "RouteTableId", warnings)?;

        let destination = ctx
            .property_text("DestinationCidrBlock")
            .or_else(|| ctx.property_text("DestinationIpv6CidrBlock"));

        match destination {
            Some(destination) => Some(format!("{}_{}", table, destination)),
            None => {
                warnings.push(format!(
                    "Cannot resolve destination for {}.",
                    ctx.mapping.aws_address()
                ));
                None
            }
        }
    }
}

/// `aws_route_table_association`: `<subnet>/<route table>`
pub struct RouteTableAssociationImporter;

impl ImportIdStrategy for RouteTableAssociationImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
        let subnet = ctx.require_related("AWS::EC2::Subnet", "SubnetId", warnings)?;
        let table = ctx.require_related("AWS::EC2::RouteTable", "RouteTableId", warnings)?;

        Some(format!("{}/{}", subnet, table))
    }
}

/// `aws_network_acl_rule`: `<acl>:<rule number>:<protocol>:<egress>`
pub struct NetworkAclRuleImporter;

impl ImportIdStrategy for NetworkAclRuleImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
        let acl = ctx.require_related("AWS::EC2::NetworkAcl", "NetworkAclId", warnings)?;
        let rule = ctx.require_property("RuleNumber", warnings)?;
        let protocol = ctx.require_property("Protocol", warnings)?;
        let egress = ctx
            .property_text("Egress")
            .unwrap_or_else(|| "false".to_string())
            .to_lowercase();

        Some(format!("{}:{}:{}:{}", acl, rule, protocol, egress))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::importers::testing::Fixture;
    use crate::test_helpers::SnapshotBuilder;

    fn network() -> SnapshotBuilder {
        SnapshotBuilder::new("net")
            .resource("Table", "AWS::EC2::RouteTable", "rtb-0a1b")
            .resource("Subnet", "AWS::EC2::Subnet", "subnet-9f8e")
            .resource("Acl", "AWS::EC2::NetworkAcl", "acl-77")
    }

    #[test]
    fn test_route() {
        let fixture = Fixture::new(network().resource_with_properties(
            "Default",
            "AWS::EC2::Route",
            "net-Defau-1AB",
            json!({"RouteTableId": {"Ref": "Table"}, "DestinationCidrBlock": "0.0.0.0/0"}),
        ));

        let (id, warnings) = fixture.import_id(&RouteImporter, "Default");

        assert_eq!(id.as_deref(), Some("rtb-0a1b_0.0.0.0/0"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_route_without_destination() {
        let fixture = Fixture::new(network().resource_with_properties(
            "Default",
            "AWS::EC2::Route",
            "net-Defau-1AB",
            json!({"RouteTableId": {"Ref": "Table"}}),
        ));

        let (id, warnings) = fixture.import_id(&RouteImporter, "Default");

        assert!(id.is_none());
        assert_eq!(
            warnings,
            vec!["Cannot resolve destination for Default (AWS::EC2::Route)."]
        );
    }

    #[test]
    fn test_route_table_association() {
        let fixture = Fixture::new(network().resource_with_properties(
            "Association",
            "AWS::EC2::SubnetRouteTableAssociation",
            "rtbassoc-1",
            json!({"RouteTableId": {"Ref": "Table"}, "SubnetId": {"Ref": "Subnet"}}),
        ));

        assert_eq!(
            fixture.import_id(&RouteTableAssociationImporter, "Association").0.as_deref(),
            Some("subnet-9f8e/rtb-0a1b")
        );
    }

    #[test]
    fn test_network_acl_rule() {
        let fixture = Fixture::new(network().resource_with_properties(
            "Inbound",
            "AWS::EC2::NetworkAclEntry",
            "net-Inbou-2CD",
            json!({
                "NetworkAclId": {"Ref": "Acl"},
                "RuleNumber": 100,
                "Protocol": 6,
                "Egress": true,
                "RuleAction": "allow"
            }),
        ));

        assert_eq!(
            fixture.import_id(&NetworkAclRuleImporter, "Inbound").0.as_deref(),
            Some("acl-77:100:6:true")
        );
    }

    #[test]
    fn test_route_without_table_warns() {
        let fixture = Fixture::new(network().resource_with_properties(
            "Default",
            "AWS::EC2::Route",
            "net-Defau-1AB",
            json!({"DestinationCidrBlock": "0.0.0.0/0"}),
        ));

        let (id, warnings) = fixture.import_id(&RouteImporter, "Default");

        assert!(id.is_none());
        assert_eq!(
            warnings,
            vec!["Cannot determine RouteTableId for resource \"Default\""]
        );
    }

    #[test]
    fn test_route_table_association_without_subnet_warns() {
        let fixture = Fixture::new(network().resource_with_properties(
            "Association",
            "AWS::EC2::SubnetRouteTableAssociation",
            "rtbassoc-1",
            json!({"RouteTableId": {"Ref": "Table"}}),
        ));

        let (id, warnings) = fixture.import_id(&RouteTableAssociationImporter, "Association");

        assert!(id.is_none());
        assert_eq!(
            warnings,
            vec!["Cannot determine SubnetId for resource \"Association\""]
        );
    }

    #[test]
    fn test_network_acl_rule_without_protocol_warns() {
        let fixture = Fixture::new(network().resource_with_properties(
            "Inbound",
            "AWS::EC2::NetworkAclEntry",
            "net-Inbou-2CD",
            json!({"NetworkAclId": {"Ref": "Acl"}, "RuleNumber": 100}),
        ));

        let (id, warnings) = fixture.import_id(&NetworkAclRuleImporter, "Inbound");

        assert!(id.is_none());
        assert_eq!(
            warnings,
            vec!["Cannot determine Protocol for resource \"Inbound\""]
        );
    }
}
