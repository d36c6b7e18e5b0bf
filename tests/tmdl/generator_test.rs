#[cfg(test)]
mod tests {
    use semforge::model::{
        AttributeDescriptor, AttributeType, ConnectionType, DateTableConfig, RelationshipEdge,
        StorageMode, TableRole, TableSelection,
    };
    use semforge::tmdl::{
        table_path, DiagnosticKind, GenerateError, GenerateOptions, GenerationOutput, ModelDefinitionGenerator,
        DATABASE_PATH, EXPRESSIONS_PATH, MODEL_PATH, RELATIONSHIPS_PATH,
    };

    fn opportunity() -> TableSelection {
        TableSelection::new("opportunity", "opportunityid")
            .with_display_name("Opportunity")
            .with_role(TableRole::Fact)
            .with_primary_name("name")
            .with_attribute(AttributeDescriptor::new("name", AttributeType::String).with_display_name("Topic"))
            .with_attribute(
                AttributeDescriptor::new("estimatedvalue", AttributeType::Money)
                    .with_display_name("Est. Revenue"),
            )
            .with_attribute(AttributeDescriptor::new("createdon", AttributeType::DateTime).with_display_name("Created On"))
            .with_attribute(
                AttributeDescriptor::new("customerid", AttributeType::Customer)
                    .with_display_name("Potential Customer")
                    .with_targets(["account", "contact"]),
            )
            .with_attribute(AttributeDescriptor::new("statecode", AttributeType::State).with_display_name("Status"))
            .with_filter(
                r#"<fetch><entity name="opportunity"><filter><condition attribute="statecode" operator="eq" value="0" /></filter></entity></fetch>"#,
            )
    }

    fn account() -> TableSelection {
        TableSelection::new("account", "accountid")
            .with_display_name("Account")
            .with_primary_name("name")
            .with_attribute(AttributeDescriptor::new("name", AttributeType::String).with_display_name("Account Name"))
            .with_attribute(
                AttributeDescriptor::new("parentaccountid", AttributeType::Lookup)
                    .with_display_name("Parent Account"),
            )
    }

    fn edges() -> Vec<RelationshipEdge> {
        vec![RelationshipEdge::new("opportunity", "customerid", "account")]
    }

    fn generate(options: GenerateOptions, date: Option<&DateTableConfig>) -> GenerationOutput {
        ModelDefinitionGenerator::new(options)
            .generate(&[opportunity(), account()], &edges(), date, "Sales Model")
            .unwrap()
    }

    #[test]
    fn test_output_paths() {
        let out = generate(GenerateOptions::default(), None);
        let paths: Vec<&str> = out.definitions.paths().collect();
        assert!(paths.contains(&DATABASE_PATH));
        assert!(paths.contains(&MODEL_PATH));
        assert!(paths.contains(&EXPRESSIONS_PATH));
        assert!(paths.contains(&RELATIONSHIPS_PATH));
        assert!(paths.contains(&table_path("Opportunity").as_str()));
        assert!(paths.contains(&table_path("Account").as_str()));
        assert_eq!(out.definitions.len(), 6);
    }

    #[test]
    fn test_owning_attribute_keeps_its_id_column() {
        let team = TableSelection::new("account", "accountid")
            .with_display_name("Account")
            .with_attribute(AttributeDescriptor::new("owninguser", AttributeType::Lookup).with_display_name("Owning User"));
        let out = ModelDefinitionGenerator::default()
            .generate(&[team], &[], None, "Sales Model")
            .unwrap();
        let text = out.definitions.get(&table_path("Account")).unwrap();
        assert!(text.contains("\tcolumn owninguser\n"));
        assert!(text.contains("\t\tsourceColumn: owninguser\n"));
        assert!(!text.contains("owninguser\n\t\tdataType: string\n\t\tisHidden"));
    }

    #[test]
    fn test_fact_table_layout() {
        let out = generate(GenerateOptions::default(), None);
        let text = out.definitions.get(&table_path("Opportunity")).unwrap();

        assert!(text.starts_with("table Opportunity\n\tlineageTag: "));
        assert!(text.contains("\tmeasure 'Opportunity Count' = COUNTROWS('Opportunity')\n"));
        assert!(text.contains("\tannotation SemforgeLogicalName = opportunity\n"));
        assert!(text.ends_with("\tannotation PBI_ResultType = Table\n"));

        // Key first, then the primary display attribute.
        let key = text.find("\tcolumn opportunityid\n").unwrap();
        let topic = text.find("\tcolumn Topic\n").unwrap();
        let revenue = text.find("\tcolumn 'Est. Revenue'\n").unwrap();
        assert!(key < topic && topic < revenue);
        assert!(text.contains("\t\tdataType: decimal\n\t\tformatString: #,0.00\n"));
        assert!(text.contains("\t\tsummarizeBy: sum\n\t\tsourceColumn: estimatedvalue\n"));
    }

    #[test]
    fn test_choice_and_lookup_sources() {
        let out = generate(GenerateOptions::default(), None);
        let text = out.definitions.get(&table_path("Opportunity")).unwrap();
        assert!(text.contains("sourceColumn: statecodename\n"));
        // Relationship mode: hidden id, no name column.
        assert!(text.contains("\tcolumn customerid\n\t\tdataType: string\n\t\tisHidden\n"));
        assert!(!text.contains("sourceColumn: customeridname"));
        // No edge: name visible, id absent.
        let account = out.definitions.get(&table_path("Account")).unwrap();
        assert!(account.contains("\tcolumn 'Parent Account'\n"));
        assert!(account.contains("sourceColumn: parentaccountidname\n"));
        assert!(!account.contains("sourceColumn: parentaccountid\n"));
    }

    #[test]
    fn test_partition_embeds_filtered_query() {
        let out = generate(GenerateOptions::default(), None);
        let text = out.definitions.get(&table_path("Opportunity")).unwrap();
        assert!(text.contains("\tpartition Opportunity = m\n\t\tmode: directQuery\n\t\tsource =\n"));
        assert!(text.contains("CommonDataService.Database(DataverseURL"));
        assert!(text.contains(
            "FROM opportunity AS Base WHERE Base.statecode = 0\", null, [EnableFolding=true])"
        ));
        assert!(out.filters["Opportunity"].is_fully_supported);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_filter_offset_without_date_table() {
        let opportunity = TableSelection::new("opportunity", "opportunityid")
            .with_display_name("Opportunity")
            .with_attribute(AttributeDescriptor::new("createdon", AttributeType::DateTime))
            .with_filter(
                r#"<fetch><entity name="opportunity"><filter><condition attribute="createdon" operator="today" /></filter></entity></fetch>"#,
            );
        let options = GenerateOptions {
            utc_offset_hours: Some(-5.0),
            ..GenerateOptions::default()
        };
        let out = ModelDefinitionGenerator::new(options)
            .generate(&[opportunity.clone()], &[], None, "Sales Model")
            .unwrap();
        let clause = &out.filters["Opportunity"].sql_where_clause;
        assert!(clause.contains("DATEADD(hour, -5, Base.createdon)"), "{}", clause);

        // An explicit offset wins over the date table's.
        let date = DateTableConfig::new(2020, 2025, "opportunity", "createdon").with_utc_offset(2.0);
        let options = GenerateOptions {
            utc_offset_hours: Some(-5.0),
            ..GenerateOptions::default()
        };
        let out = ModelDefinitionGenerator::new(options)
            .generate(&[opportunity.clone()], &[], Some(&date), "Sales Model")
            .unwrap();
        assert!(out.filters["Opportunity"].sql_where_clause.contains("DATEADD(hour, -5, GETUTCDATE())"));

        let options = GenerateOptions {
            utc_offset_hours: Some(30.0),
            ..GenerateOptions::default()
        };
        let err = ModelDefinitionGenerator::new(options)
            .generate(&[opportunity], &[], None, "Sales Model")
            .unwrap_err();
        assert_eq!(err, GenerateError::UtcOffsetOutOfRange(30.0));
    }

    #[test]
    fn test_fabric_link_import() {
        let options = GenerateOptions {
            connection_type: ConnectionType::FabricLink,
            storage_mode: StorageMode::Import,
            fabric_sql_endpoint: "x.datawarehouse.fabric.microsoft.com".to_string(),
            fabric_lakehouse: "dataverse_org".to_string(),
            ..GenerateOptions::default()
        };
        let out = generate(options, None);
        let text = out.definitions.get(&table_path("Account")).unwrap();
        assert!(text.contains("\t\tmode: import\n"));
        assert!(text.contains("Sql.Database(FabricSQLEndpoint, FabricLakehouse)"));
        let expressions = out.definitions.get(EXPRESSIONS_PATH).unwrap();
        assert!(expressions.contains("expression FabricLakehouse = \"dataverse_org\""));
        let model = out.definitions.get(MODEL_PATH).unwrap();
        assert!(model.contains("[\"FabricSQLEndpoint\",\"FabricLakehouse\",\"Opportunity\",\"Account\"]"));
    }

    #[test]
    fn test_relationships_file() {
        let out = generate(GenerateOptions::default(), None);
        let text = out.definitions.get(RELATIONSHIPS_PATH).unwrap();
        assert!(text.contains("\tfromColumn: Opportunity.customerid\n\ttoColumn: Account.accountid\n"));
        assert!(text.contains("\tannotation SemforgeGenerated = true\n"));
        assert!(!text.contains("description"));
    }

    #[test]
    fn test_inactive_snowflake_edge() {
        let edges = vec![RelationshipEdge::new("opportunity", "customerid", "account")
            .inactive()
            .snowflake()
            .assume_integrity()];
        let out = ModelDefinitionGenerator::default()
            .generate(&[opportunity(), account()], &edges, None, "Sales")
            .unwrap();
        let text = out.definitions.get(RELATIONSHIPS_PATH).unwrap();
        assert!(text.contains("\tisActive: false\n\trelyOnReferentialIntegrity\n"));
        assert!(text.contains("\tannotation SemforgeSnowflake = true\n"));
    }

    #[test]
    fn test_edge_to_unselected_table_skipped() {
        let edges = vec![RelationshipEdge::new("account", "parentaccountid", "territory")];
        let out = ModelDefinitionGenerator::default()
            .generate(&[account()], &edges, None, "Sales")
            .unwrap();
        assert!(!out.definitions.contains(RELATIONSHIPS_PATH));
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::SkippedRelationship);
        assert!(out.diagnostics[0].message.contains("target table is not selected"));
    }

    #[test]
    fn test_date_table_and_relationship() {
        let date = DateTableConfig::new(2020, 2030, "opportunity", "createdon").with_utc_offset(-5.0);
        let out = generate(GenerateOptions::default(), Some(&date));

        let calendar = out.definitions.get(&table_path("Date")).unwrap();
        assert!(calendar.contains("CALENDAR(DATE(2020, 1, 1), DATE(2030, 12, 31))"));
        assert!(calendar.contains("\tdataCategory: Time\n"));

        let relationships = out.definitions.get(RELATIONSHIPS_PATH).unwrap();
        assert!(relationships.contains("\tfromColumn: Opportunity.'Created On'\n\ttoColumn: Date.Date\n"));

        let fact = out.definitions.get(&table_path("Opportunity")).unwrap();
        assert!(fact.contains("CAST(DATEADD(hour, -5, Base.createdon) AS DATE) AS createdon"));
        assert!(fact.contains("\t\tformatString: Short Date\n"));

        let model = out.definitions.get(MODEL_PATH).unwrap();
        assert!(model.ends_with("ref table Opportunity\nref table Account\nref table Date\n"));
    }

    #[test]
    fn test_partial_filter_reported() {
        let table = account().with_filter(
            r#"<fetch><entity name="account"><filter><condition attribute="name" operator="sounds-like" value="x" /></filter></entity></fetch>"#,
        );
        let out = ModelDefinitionGenerator::default()
            .generate(&[table], &[], None, "Sales")
            .unwrap();
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::PartialFilter);
        assert!(out.diagnostics[0].message.contains("sounds-like"));
        let text = out.definitions.get(&table_path("Account")).unwrap();
        assert!(!text.contains("WHERE"));
    }

    #[test]
    fn test_hostile_names_are_quoted() {
        let table = TableSelection::new("new_odd]table", "new_oddid")
            .with_display_name("Bob's Table")
            .with_attribute(AttributeDescriptor::new("new_x", AttributeType::String).with_display_name("It's"));
        let out = ModelDefinitionGenerator::default()
            .generate(&[table], &[], None, "Sales")
            .unwrap();
        let text = out.definitions.get(&table_path("Bob's Table")).unwrap();
        assert!(text.starts_with("table 'Bob''s Table'\n"));
        assert!(text.contains("\tcolumn 'It''s'\n"));
        assert!(text.contains("FROM [new_odd]]table] AS Base"));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_generation_is_deterministic_apart_from_identifiers() {
        let strip = |out: &GenerationOutput| -> Vec<String> {
            out.definitions
                .iter()
                .map(|(path, text)| {
                    let body: Vec<&str> = text
                        .lines()
                        .filter(|l| !l.trim_start().starts_with("lineageTag:") && !l.starts_with("relationship "))
                        .collect();
                    format!("{}\n{}", path, body.join("\n"))
                })
                .collect()
        };
        let a = generate(GenerateOptions::default(), None);
        let b = generate(GenerateOptions::default(), None);
        assert_eq!(strip(&a), strip(&b));
    }
}
