#[cfg(test)]
mod tests {
    use semforge::filter::{FilterConversion, FilterConverter, FilterEnvironment};
    use semforge::sql::validate_sql;

    fn fetch(conditions: &str) -> String {
        format!(
            r#"<fetch version="1.0"><entity name="account"><filter type="and">{}</filter></entity></fetch>"#,
            conditions
        )
    }

    fn convert(conditions: &str) -> FilterConversion {
        FilterConverter::new(0.0).convert(&fetch(conditions), "Base")
    }

    fn assert_parses(clause: &str) {
        let sql = format!("SELECT Base.accountid FROM account AS Base WHERE {}", clause);
        if let Err(err) = validate_sql(&sql) {
            panic!("generated clause does not parse: {}\n{}", err, sql);
        }
    }

    #[test]
    fn test_eq_string() {
        let out = convert(r#"<condition attribute="name" operator="eq" value="test" />"#);
        assert_eq!(out.sql_where_clause, "Base.name = 'test'");
        assert!(out.is_fully_supported);
        assert!(out.unsupported_features.is_empty());
    }

    #[test]
    fn test_begins_with() {
        let out = convert(r#"<condition attribute="name" operator="begins-with" value="Contoso" />"#);
        assert_eq!(out.sql_where_clause, "Base.name LIKE 'Contoso%'");
    }

    #[test]
    fn test_ends_with_and_negations() {
        let out = convert(
            r#"<condition attribute="name" operator="ends-with" value="Ltd" />
               <condition attribute="name" operator="not-begin-with" value="X" />
               <condition attribute="name" operator="not-end-with" value="Y" />"#,
        );
        assert_eq!(
            out.sql_where_clause,
            "Base.name LIKE '%Ltd' AND Base.name NOT LIKE 'X%' AND Base.name NOT LIKE '%Y'"
        );
        assert_parses(&out.sql_where_clause);
    }

    #[test]
    fn test_in_list() {
        let out = convert(
            r#"<condition attribute="statecode" operator="in"><value>0</value><value>1</value></condition>"#,
        );
        assert_eq!(out.sql_where_clause, "Base.statecode IN (0, 1)");
        assert_parses(&out.sql_where_clause);
    }

    #[test]
    fn test_not_in_strings() {
        let out = convert(
            r#"<condition attribute="city" operator="not-in"><value>Oslo</value><value>O'Hare</value></condition>"#,
        );
        assert_eq!(out.sql_where_clause, "Base.city NOT IN ('Oslo', 'O''Hare')");
    }

    #[test]
    fn test_comparisons() {
        let out = convert(
            r#"<condition attribute="revenue" operator="gt" value="1000" />
               <condition attribute="revenue" operator="le" value="5000" />
               <condition attribute="statuscode" operator="ne" value="2" />"#,
        );
        assert_eq!(
            out.sql_where_clause,
            "Base.revenue > 1000 AND Base.revenue <= 5000 AND Base.statuscode <> 2"
        );
    }

    #[test]
    fn test_null_checks() {
        let out = convert(
            r#"<condition attribute="parentaccountid" operator="null" />
               <condition attribute="telephone1" operator="not-null" />"#,
        );
        assert_eq!(
            out.sql_where_clause,
            "Base.parentaccountid IS NULL AND Base.telephone1 IS NOT NULL"
        );
    }

    #[test]
    fn test_between() {
        let out = convert(
            r#"<condition attribute="revenue" operator="between"><value>10</value><value>20</value></condition>"#,
        );
        assert_eq!(out.sql_where_clause, "Base.revenue BETWEEN 10 AND 20");
        assert_parses(&out.sql_where_clause);
    }

    #[test]
    fn test_between_needs_two_values() {
        let out = convert(
            r#"<condition attribute="revenue" operator="between"><value>10</value></condition>"#,
        );
        assert_eq!(out.sql_where_clause, "");
        assert!(!out.is_fully_supported);
    }

    #[test]
    fn test_guid_value_quoted() {
        let out = convert(
            r#"<condition attribute="ownerid" operator="eq" value="{6A1B8E5C-0000-4B1B-9B1B-000000000001}" />"#,
        );
        assert_eq!(
            out.sql_where_clause,
            "Base.ownerid = '{6A1B8E5C-0000-4B1B-9B1B-000000000001}'"
        );
    }

    #[test]
    fn test_quote_in_value_is_doubled() {
        let out = convert(r#"<condition attribute="name" operator="eq" value="O'Brien" />"#);
        assert_eq!(out.sql_where_clause, "Base.name = 'O''Brien'");
    }

    #[test]
    fn test_unusual_attribute_name_is_bracketed() {
        let out = convert(r#"<condition attribute="odd]name" operator="null" />"#);
        assert_eq!(out.sql_where_clause, "Base.[odd]]name] IS NULL");
    }

    #[test]
    fn test_or_group() {
        let xml = r#"<fetch><entity name="account"><filter type="or">
            <condition attribute="statecode" operator="eq" value="0" />
            <condition attribute="statecode" operator="eq" value="1" />
        </filter></entity></fetch>"#;
        let out = FilterConverter::new(0.0).convert(xml, "Base");
        assert_eq!(out.sql_where_clause, "Base.statecode = 0 OR Base.statecode = 1");
    }

    #[test]
    fn test_today_shifted() {
        let out = FilterConverter::new(-5.0).convert(
            &fetch(r#"<condition attribute="createdon" operator="today" />"#),
            "Base",
        );
        assert_eq!(
            out.sql_where_clause,
            "CAST(DATEADD(hour, -5, Base.createdon) AS DATE) = CAST(DATEADD(hour, -5, GETUTCDATE()) AS DATE)"
        );
        assert_parses(&out.sql_where_clause);
    }

    #[test]
    fn test_half_hour_offset_not_truncated() {
        let out = FilterConverter::new(5.5).convert(
            &fetch(r#"<condition attribute="createdon" operator="this-year" />"#),
            "Base",
        );
        assert_eq!(
            out.sql_where_clause,
            "YEAR(DATEADD(minute, 330, Base.createdon)) = YEAR(DATEADD(minute, 330, GETUTCDATE()))"
        );
    }

    #[test]
    fn test_last_x_days() {
        let out = convert(r#"<condition attribute="createdon" operator="last-x-days" value="30" />"#);
        assert_eq!(
            out.sql_where_clause,
            "(DATEADD(hour, 0, Base.createdon) >= DATEADD(day, -29, DATEADD(day, DATEDIFF(day, 0, DATEADD(hour, 0, GETUTCDATE())), 0)) AND DATEADD(hour, 0, Base.createdon) < DATEADD(day, 1, DATEADD(day, DATEDIFF(day, 0, DATEADD(hour, 0, GETUTCDATE())), 0)))"
        );
        assert_parses(&out.sql_where_clause);
    }

    #[test]
    fn test_older_than_accepts_short_spelling() {
        let long = convert(r#"<condition attribute="modifiedon" operator="olderthan-x-months" value="6" />"#);
        let short = convert(r#"<condition attribute="modifiedon" operator="older-x-months" value="6" />"#);
        assert_eq!(long.sql_where_clause, short.sql_where_clause);
        assert_eq!(
            long.sql_where_clause,
            "DATEADD(hour, 0, Base.modifiedon) < DATEADD(month, -6, DATEADD(hour, 0, GETUTCDATE()))"
        );
    }

    #[test]
    fn test_last_x_needs_numeric_count() {
        let out = convert(r#"<condition attribute="createdon" operator="last-x-days" value="many" />"#);
        assert_eq!(out.sql_where_clause, "");
        assert!(!out.is_fully_supported);
    }

    #[test]
    fn test_relative_count_beyond_int_range() {
        let out = convert(r#"<condition attribute="createdon" operator="next-x-days" value="9223372036854775807" />"#);
        assert_eq!(out.sql_where_clause, "");
        assert!(!out.is_fully_supported);
        assert!(out.unsupported_features[0].contains("next-x-days"));

        let out = convert(r#"<condition attribute="createdon" operator="last-x-years" value="2147483648" />"#);
        assert_eq!(out.sql_where_clause, "");
        assert!(!out.is_fully_supported);
    }

    #[test]
    fn test_relative_window_end_beyond_int_range() {
        // The count itself fits, but the window ends one period later.
        let out = convert(r#"<condition attribute="createdon" operator="next-x-days" value="2147483647" />"#);
        assert_eq!(out.sql_where_clause, "");
        assert!(!out.is_fully_supported);

        let out = convert(r#"<condition attribute="createdon" operator="last-x-days" value="2147483647" />"#);
        assert!(out.is_fully_supported);
        assert!(out.sql_where_clause.contains("DATEADD(day, -2147483646, "));
        let out = convert(r#"<condition attribute="modifiedon" operator="olderthan-x-hours" value="2147483647" />"#);
        assert!(out.sql_where_clause.contains("DATEADD(hour, -2147483647, "));
    }

    #[test]
    fn test_every_date_operator_parses() {
        let operators = [
            "today",
            "yesterday",
            "tomorrow",
            "this-week",
            "last-week",
            "next-week",
            "this-month",
            "last-month",
            "next-month",
            "this-year",
            "last-year",
            "next-year",
            "last-seven-days",
            "next-seven-days",
        ];
        for op in operators {
            let out = convert(&format!(r#"<condition attribute="createdon" operator="{}" />"#, op));
            assert!(out.is_fully_supported, "{} not supported", op);
            assert_parses(&out.sql_where_clause);
        }
        for unit in ["hours", "days", "weeks", "months", "years"] {
            for prefix in ["last-x-", "next-x-", "olderthan-x-"] {
                let out = convert(&format!(
                    r#"<condition attribute="createdon" operator="{}{}" value="3" />"#,
                    prefix, unit
                ));
                assert!(out.is_fully_supported, "{}{} not supported", prefix, unit);
                assert_parses(&out.sql_where_clause);
            }
        }
    }

    #[test]
    fn test_on_or_after() {
        let out = convert(r#"<condition attribute="createdon" operator="on-or-after" value="2024-01-01" />"#);
        assert_eq!(
            out.sql_where_clause,
            "DATEADD(hour, 0, Base.createdon) >= '2024-01-01'"
        );
    }

    #[test]
    fn test_unknown_operator_degrades() {
        let out = convert(r#"<condition attribute="name" operator="sounds-like" value="x" />"#);
        assert_eq!(out.sql_where_clause, "");
        assert!(!out.is_fully_supported);
        assert_eq!(out.unsupported_features.len(), 1);
        assert!(out.unsupported_features[0].contains("sounds-like"));
        assert!(out.unsupported_features[0].contains("name"));
    }

    #[test]
    fn test_unknown_operator_keeps_siblings() {
        let out = convert(
            r#"<condition attribute="name" operator="sounds-like" value="x" />
               <condition attribute="statecode" operator="eq" value="0" />"#,
        );
        assert_eq!(out.sql_where_clause, "Base.statecode = 0");
        assert!(!out.is_fully_supported);
    }

    #[test]
    fn test_malformed_xml_is_not_supported() {
        let out = FilterConverter::new(0.0).convert("<fetch><entity name=", "Base");
        assert_eq!(out.sql_where_clause, "");
        assert!(!out.is_fully_supported);
        assert!(!out.unsupported_features.is_empty());
    }

    #[test]
    fn test_current_user() {
        let out = convert(r#"<condition attribute="ownerid" operator="eq-userid" />"#);
        assert_eq!(out.sql_where_clause, "Base.ownerid = CURRENT_USER");
        assert!(out.is_fully_supported);
    }

    #[test]
    fn test_current_user_unavailable_on_fabric_link() {
        let converter = FilterConverter::new(0.0).with_environment(FilterEnvironment {
            fabric_link: true,
            import_mode: false,
        });
        let out = converter.convert(
            &fetch(r#"<condition attribute="ownerid" operator="eq-userid" />"#),
            "Base",
        );
        assert_eq!(out.sql_where_clause, "");
        assert!(!out.is_fully_supported);
    }

    #[test]
    fn test_user_teams_best_effort() {
        let out = convert(r#"<condition attribute="ownerid" operator="eq-userteams" />"#);
        assert_eq!(
            out.sql_where_clause,
            "Base.ownerid IN (SELECT tm.teamid FROM teammembership AS tm WHERE tm.systemuserid = CURRENT_USER)"
        );
        assert!(!out.is_fully_supported);
        assert_parses(&out.sql_where_clause);
    }

    #[test]
    fn test_custom_alias() {
        let out = FilterConverter::new(0.0).convert(
            &fetch(r#"<condition attribute="name" operator="like" value="%inc%" />"#),
            "a",
        );
        assert_eq!(out.sql_where_clause, "a.name LIKE '%inc%'");
    }
}
