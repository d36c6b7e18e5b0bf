#[cfg(test)]
mod tests {
    use semforge::lookup::{classify_attributes, resolve_lookup_columns, AttributeGroup, SubColumnKind};
    use semforge::model::{
        AttributeDescriptor, AttributeType, LookupSubColumnConfig, RelationshipEdge, TableSelection,
    };
    use semforge::tmdl::{table_path, ModelDefinitionGenerator};

    fn owner() -> AttributeDescriptor {
        AttributeDescriptor::new("ownerid", AttributeType::Owner).with_display_name("Owner")
    }

    #[test]
    fn test_default_with_relationship() {
        let attr = AttributeDescriptor::new("parentaccountid", AttributeType::Lookup);
        let edges = [RelationshipEdge::new("account", "parentaccountid", "account")];
        let resolved = resolve_lookup_columns("account", &attr, None, &edges);
        assert!(resolved.include_id);
        assert!(resolved.id_hidden);
        assert!(!resolved.include_name);
    }

    #[test]
    fn test_default_without_relationship() {
        let attr = AttributeDescriptor::new("parentaccountid", AttributeType::Lookup);
        let resolved = resolve_lookup_columns("account", &attr, None, &[]);
        assert!(!resolved.include_id);
        assert!(resolved.include_name);
        assert!(!resolved.name_hidden);
        assert!(!resolved.include_type);
        assert!(!resolved.include_yomi);
    }

    #[test]
    fn test_inactive_edge_still_counts() {
        let attr = AttributeDescriptor::new("parentaccountid", AttributeType::Lookup);
        let edges = [RelationshipEdge::new("account", "parentaccountid", "account").inactive()];
        let resolved = resolve_lookup_columns("account", &attr, None, &edges);
        assert!(resolved.include_id);
        assert!(!resolved.include_name);
    }

    #[test]
    fn test_edge_on_other_table_ignored() {
        let attr = AttributeDescriptor::new("parentaccountid", AttributeType::Lookup);
        let edges = [RelationshipEdge::new("contact", "parentaccountid", "account")];
        let resolved = resolve_lookup_columns("account", &attr, None, &edges);
        assert!(!resolved.include_id);
    }

    #[test]
    fn test_override_is_per_field() {
        let attr = owner();
        let mut config = LookupSubColumnConfig::default();
        config.type_.set_hidden(true);
        let edges = [RelationshipEdge::new("account", "ownerid", "systemuser")];

        let resolved = resolve_lookup_columns("account", &attr, Some(&config), &edges);
        assert!(resolved.include_type);
        assert!(resolved.type_hidden);
        assert!(resolved.include_id);
        assert!(!resolved.include_name);

        // Defaults follow the relationship set; the stored override does not.
        let resolved = resolve_lookup_columns("account", &attr, Some(&config), &[]);
        assert!(resolved.include_type);
        assert!(!resolved.include_id);
        assert!(resolved.include_name);
    }

    #[test]
    fn test_non_polymorphic_has_no_type_or_yomi() {
        let attr = AttributeDescriptor::new("primarycontactid", AttributeType::Lookup);
        let mut config = LookupSubColumnConfig::default();
        config.type_.set_include(true);
        config.yomi.set_include(true);
        let resolved = resolve_lookup_columns("account", &attr, Some(&config), &[]);
        assert!(!resolved.include_type);
        assert!(!resolved.include_yomi);
        assert_eq!(
            resolved.included().collect::<Vec<_>>(),
            vec![SubColumnKind::Name]
        );
    }

    #[test]
    fn test_owning_user_never_gets_name() {
        let attr = AttributeDescriptor::new("owninguser", AttributeType::Lookup);
        let resolved = resolve_lookup_columns("account", &attr, None, &[]);
        assert!(!resolved.include_name);
        assert!(resolved.include_id && !resolved.id_hidden);
        let mut config = LookupSubColumnConfig::default();
        config.id.set_include(true);
        let resolved = resolve_lookup_columns("account", &attr, Some(&config), &[]);
        assert_eq!(resolved.included().collect::<Vec<_>>(), vec![SubColumnKind::Id]);
    }

    #[test]
    fn test_classification_is_order_independent() {
        let virtual_name = AttributeDescriptor::new("owneridname", AttributeType::String);
        let virtual_type = AttributeDescriptor::new("owneridtype", AttributeType::EntityName);
        let revenue = AttributeDescriptor::new("revenue", AttributeType::Money);

        let before = [virtual_name.clone(), revenue.clone(), owner(), virtual_type.clone()];
        let after = [revenue.clone(), owner(), virtual_type.clone(), virtual_name.clone()];

        let groups = classify_attributes(&before);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], AttributeGroup::Standalone(&before[1]));
        assert_eq!(
            groups[1],
            AttributeGroup::Lookup {
                parent: &before[2],
                virtual_columns: vec![(SubColumnKind::Name, &before[0]), (SubColumnKind::Type, &before[3])],
            }
        );

        let names = |attrs: &[AttributeDescriptor]| -> Vec<String> {
            classify_attributes(attrs)
                .iter()
                .map(|g| g.attribute().logical_name.clone())
                .collect()
        };
        assert_eq!(names(&before), names(&after));
    }

    #[test]
    fn test_suffix_without_polymorphic_parent_is_standalone() {
        let attrs = [
            AttributeDescriptor::new("budget", AttributeType::Money),
            AttributeDescriptor::new("budgettype", AttributeType::Picklist),
        ];
        let groups = classify_attributes(&attrs);
        assert_eq!(groups.len(), 2);
        assert!(matches!(groups[1], AttributeGroup::Standalone(_)));
    }

    #[test]
    fn test_virtual_column_first_keeps_parent_display_name() {
        let table = TableSelection::new("account", "accountid")
            .with_display_name("Account")
            .with_attribute(AttributeDescriptor::new("owneridname", AttributeType::String))
            .with_attribute(owner());
        let output = ModelDefinitionGenerator::default()
            .generate(&[table], &[], None, "Sales")
            .unwrap();
        let text = output.definitions.get(&table_path("Account")).unwrap();

        assert!(text.contains("\tcolumn Owner\n"));
        assert!(text.contains("sourceColumn: owneridname\n"));
        assert!(!text.contains("column owneridname"));
        assert_eq!(text.matches("sourceColumn: owneridname").count(), 1);
    }

    #[test]
    fn test_name_override_stored_under_parent() {
        let table = TableSelection::new("account", "accountid")
            .with_display_name("Account")
            .with_attribute(owner())
            .with_override("ownerid", "Account Manager");
        let output = ModelDefinitionGenerator::default()
            .generate(&[table], &[], None, "Sales")
            .unwrap();
        let text = output.definitions.get(&table_path("Account")).unwrap();
        assert!(text.contains("\tcolumn 'Account Manager'\n"));
    }
}
