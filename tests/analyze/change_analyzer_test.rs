#[cfg(test)]
mod tests {
    use semforge::analyze::{
        analyze, has_destructive, AnalysisConfig, ChangeType, ImpactLevel, ObjectType,
        SemanticModelChange,
    };
    use semforge::model::{
        AttributeDescriptor, AttributeType, DateTableConfig, GeneratedDefinitionSet, RelationshipEdge,
        StorageMode, TableRole, TableSelection,
    };
    use semforge::preserve::parse_definitions;
    use semforge::tmdl::{ModelDefinitionGenerator, RELATIONSHIPS_PATH};

    fn opportunity() -> TableSelection {
        TableSelection::new("opportunity", "opportunityid")
            .with_display_name("Opportunity")
            .with_role(TableRole::Fact)
            .with_attribute(AttributeDescriptor::new("name", AttributeType::String).with_display_name("Topic"))
            .with_attribute(AttributeDescriptor::new("estimatedvalue", AttributeType::Money).with_display_name("Value"))
            .with_attribute(AttributeDescriptor::new("createdon", AttributeType::DateTime))
            .with_attribute(AttributeDescriptor::new("customerid", AttributeType::Customer))
    }

    fn account() -> TableSelection {
        TableSelection::new("account", "accountid")
            .with_display_name("Account")
            .with_attribute(AttributeDescriptor::new("name", AttributeType::String))
    }

    fn contact() -> TableSelection {
        TableSelection::new("contact", "contactid")
            .with_display_name("Contact")
            .with_attribute(AttributeDescriptor::new("fullname", AttributeType::String))
    }

    fn edges() -> Vec<RelationshipEdge> {
        vec![RelationshipEdge::new("opportunity", "customerid", "account")]
    }

    fn generate(
        tables: &[TableSelection],
        edges: &[RelationshipEdge],
        date: Option<&DateTableConfig>,
    ) -> GeneratedDefinitionSet {
        ModelDefinitionGenerator::default()
            .generate(tables, edges, date, "Sales")
            .unwrap()
            .definitions
    }

    fn diff(before: &GeneratedDefinitionSet, after: &GeneratedDefinitionSet) -> Vec<SemanticModelChange> {
        analyze(&parse_definitions(before), after, &AnalysisConfig::default())
    }

    fn find<'a>(changes: &'a [SemanticModelChange], name: &str) -> &'a SemanticModelChange {
        changes
            .iter()
            .find(|c| c.object_name == name)
            .unwrap_or_else(|| panic!("no change for '{}' in {:#?}", name, changes))
    }

    #[test]
    fn test_identical_input_reports_nothing() {
        let tables = [opportunity(), account()];
        let first = generate(&tables, &edges(), None);
        let second = generate(&tables, &edges(), None);
        assert_eq!(diff(&first, &second), Vec::new());
    }

    #[test]
    fn test_removed_column_is_destructive() {
        let before = generate(&[opportunity(), account()], &edges(), None);
        let mut trimmed = opportunity();
        trimmed.attributes.retain(|a| a.logical_name != "estimatedvalue");
        let after = generate(&[trimmed, account()], &edges(), None);

        let changes = diff(&before, &after);
        let change = find(&changes, "Opportunity.Value");
        assert_eq!(change.object_type, ObjectType::Column);
        assert_eq!(change.change_type, ChangeType::Warning);
        assert_eq!(change.impact, ImpactLevel::Destructive);
        assert!(change.description.contains("Value"));
        assert!(has_destructive(&changes));
    }

    #[test]
    fn test_added_column_is_additive() {
        let before = generate(&[opportunity(), account()], &edges(), None);
        let after = generate(
            &[
                opportunity().with_attribute(AttributeDescriptor::new("closeprobability", AttributeType::Integer)),
                account(),
            ],
            &edges(),
            None,
        );
        let changes = diff(&before, &after);
        let change = find(&changes, "Opportunity.closeprobability");
        assert_eq!((change.change_type, change.impact), (ChangeType::New, ImpactLevel::Additive));
        assert!(!has_destructive(&changes));
    }

    #[test]
    fn test_rename_is_safe() {
        let before = generate(&[opportunity(), account()], &edges(), None);
        let after = generate(
            &[opportunity().with_override("estimatedvalue", "Pipeline"), account()],
            &edges(),
            None,
        );
        let changes = diff(&before, &after);
        let change = find(&changes, "Opportunity.Pipeline");
        assert_eq!((change.change_type, change.impact), (ChangeType::Preserve, ImpactLevel::Safe));
        assert!(!has_destructive(&changes));
    }

    #[test]
    fn test_data_type_change_is_moderate() {
        let before = generate(&[opportunity(), account()], &edges(), None);
        let mut changed = opportunity();
        for attr in &mut changed.attributes {
            if attr.logical_name == "estimatedvalue" {
                attr.attribute_type = AttributeType::Double;
            }
        }
        let after = generate(&[changed, account()], &edges(), None);
        let changes = diff(&before, &after);
        let change = find(&changes, "Opportunity.Value");
        assert_eq!((change.change_type, change.impact), (ChangeType::Update, ImpactLevel::Moderate));
        assert!(change.description.contains("decimal"));
    }

    #[test]
    fn test_filter_change_updates_query() {
        let before = generate(&[opportunity(), account()], &edges(), None);
        let filtered = opportunity().with_filter(
            r#"<fetch><entity name="opportunity"><filter><condition attribute="statecode" operator="eq" value="0" /></filter></entity></fetch>"#,
        );
        let after = generate(&[filtered, account()], &edges(), None);
        let changes = diff(&before, &after);
        assert!(changes
            .iter()
            .any(|c| c.object_type == ObjectType::Query && c.object_name == "Opportunity" && c.impact == ImpactLevel::Moderate));
    }

    #[test]
    fn test_table_added_and_removed() {
        let before = generate(&[opportunity(), account()], &edges(), None);
        let after = generate(&[opportunity(), contact()], &[], None);
        let changes = diff(&before, &after);

        let added = find(&changes, "Contact");
        assert_eq!((added.change_type, added.impact), (ChangeType::New, ImpactLevel::Additive));
        let removed = find(&changes, "Account");
        assert_eq!((removed.change_type, removed.impact), (ChangeType::Warning, ImpactLevel::Destructive));
        let relationship = find(&changes, "Opportunity.customerid -> Account.accountid");
        assert_eq!(relationship.impact, ImpactLevel::Destructive);
    }

    #[test]
    fn test_relationship_added() {
        let before = generate(&[opportunity(), account()], &[], None);
        let after = generate(&[opportunity(), account()], &edges(), None);
        let changes = diff(&before, &after);
        let change = find(&changes, "Opportunity.customerid -> Account.accountid");
        assert_eq!((change.change_type, change.impact), (ChangeType::New, ImpactLevel::Additive));
    }

    #[test]
    fn test_relationship_endpoint_moved() {
        let before = generate(&[opportunity(), account(), contact()], &edges(), None);
        let moved = vec![RelationshipEdge::new("opportunity", "customerid", "contact")];
        let after = generate(&[opportunity(), account(), contact()], &moved, None);
        let changes = diff(&before, &after);
        let change = find(&changes, "Opportunity.customerid -> Contact.contactid");
        assert_eq!((change.change_type, change.impact), (ChangeType::Update, ImpactLevel::Moderate));
        assert!(change.description.contains("Account.accountid"));
    }

    #[test]
    fn test_relationship_deactivated() {
        let before = generate(&[opportunity(), account()], &edges(), None);
        let inactive = vec![RelationshipEdge::new("opportunity", "customerid", "account").inactive()];
        let after = generate(&[opportunity(), account()], &inactive, None);
        let changes = diff(&before, &after);
        let change = find(&changes, "Opportunity.customerid -> Account.accountid");
        assert_eq!(change.change_type, ChangeType::Update);
        assert_eq!(change.description, "relationship deactivated");
    }

    #[test]
    fn test_stale_date_relationship_is_info() {
        let date = DateTableConfig::new(2020, 2030, "opportunity", "createdon");
        let before = generate(&[opportunity(), account()], &edges(), Some(&date));
        let after = generate(&[opportunity(), account()], &edges(), None);
        let changes = diff(&before, &after);
        let change = find(&changes, "Opportunity.createdon -> Date.Date");
        assert_eq!(change.change_type, ChangeType::Info);
        // The Date table itself goes away with its configuration.
        assert_eq!(find(&changes, "Date").impact, ImpactLevel::Destructive);
    }

    #[test]
    fn test_user_relationship_is_preserved() {
        let mut before = generate(&[opportunity(), account(), contact()], &edges(), None);
        let mut text = before.get(RELATIONSHIPS_PATH).unwrap().to_string();
        text.push_str("relationship hand-made\n\tfromColumn: Opportunity.Topic\n\ttoColumn: Contact.contactid\n\n");
        before.insert(RELATIONSHIPS_PATH, text);

        let after = generate(&[opportunity(), account(), contact()], &edges(), None);
        let changes = diff(&before, &after);
        let change = find(&changes, "Opportunity.Topic -> Contact.contactid");
        assert_eq!((change.change_type, change.impact), (ChangeType::Preserve, ImpactLevel::Safe));
        // Reachable only through the hand-made relationship, which is kept.
        assert!(!changes.iter().any(|c| c.object_name == "Contact" && c.change_type == ChangeType::Warning));
    }

    #[test]
    fn test_unreachable_table_warned() {
        let tables = [opportunity(), account(), contact()];
        let before = generate(&tables, &edges(), None);
        let after = generate(&tables, &edges(), None);
        let changes = diff(&before, &after);
        let change = find(&changes, "Contact");
        assert_eq!((change.change_type, change.impact), (ChangeType::Warning, ImpactLevel::Safe));
        assert!(change.description.contains("Opportunity"));
    }

    #[test]
    fn test_storage_mode_mismatch_is_info() {
        let before = generate(&[account()], &[], None);
        let config = AnalysisConfig {
            storage_mode: StorageMode::Import,
            ..AnalysisConfig::default()
        };
        let changes = analyze(&parse_definitions(&before), &before, &config);
        let change = find(&changes, "Account");
        assert_eq!(change.change_type, ChangeType::Info);
        assert!(change.description.contains("directQuery"));
    }

    #[test]
    fn test_include_unchanged() {
        let before = generate(&[account()], &[], None);
        let config = AnalysisConfig {
            include_unchanged: true,
            ..AnalysisConfig::default()
        };
        let changes = analyze(&parse_definitions(&before), &before, &config);
        assert!(!changes.is_empty());
        assert!(changes
            .iter()
            .all(|c| c.change_type == ChangeType::Preserve && c.impact == ImpactLevel::Safe));
    }
}
