use grade_portal::{
    Decision, GateError,
    access::{RouteAccessTable, RouteRule, default_rules},
    models::Role,
};

// --- Helper Functions ---

fn portal_table() -> RouteAccessTable {
    RouteAccessTable::compile(&default_rules()).unwrap()
}

fn redirect(to: &str) -> Decision {
    Decision::Redirect(to.to_string())
}

// --- Tests ---

#[test]
fn test_role_home_allowed_with_empty_table() {
    let table = RouteAccessTable::empty();
    for role in Role::ALL {
        assert_eq!(table.authorize(&role.home_path(), role), Decision::Allow);
    }
}

#[test]
fn test_role_home_allowed_even_when_table_excludes_it() {
    // A misconfigured table that locks everyone out of /faculty must not hide faculty's home.
    let rules = vec![RouteRule::new("/faculty(.*)", &[Role::Admin])];
    let table = RouteAccessTable::compile(&rules).unwrap();

    assert_eq!(table.authorize("/faculty", Role::Faculty), Decision::Allow);
    assert_eq!(
        table.authorize("/faculty/classes", Role::Faculty),
        redirect("/faculty")
    );
}

#[test]
fn test_single_pattern_allow_and_deny() {
    let table = portal_table();

    assert_eq!(table.authorize("/admin/users", Role::Admin), Decision::Allow);
    assert_eq!(table.authorize("/admin/users", Role::Student), redirect("/student"));
    assert_eq!(table.authorize("/admin", Role::Registrar), redirect("/registrar"));
    assert_eq!(table.authorize("/registrar/uploads", Role::Registrar), Decision::Allow);
    assert_eq!(table.authorize("/registrar/uploads", Role::Faculty), redirect("/faculty"));
}

#[test]
fn test_unlisted_path_is_allowed() {
    let table = portal_table();
    assert_eq!(table.governing_pattern("/settings"), None);
    assert_eq!(table.authorize("/settings", Role::Student), Decision::Allow);
}

#[test]
fn test_first_match_wins_over_later_patterns() {
    // Both patterns match /reports/final with disjoint role sets.
    let rules = vec![
        RouteRule::new("/reports/(.*)", &[Role::Faculty]),
        RouteRule::new("/reports/final", &[Role::Registrar]),
    ];
    let table = RouteAccessTable::compile(&rules).unwrap();

    assert_eq!(table.governing_pattern("/reports/final"), Some("/reports/(.*)"));
    assert_eq!(table.authorize("/reports/final", Role::Faculty), Decision::Allow);
    assert_eq!(
        table.authorize("/reports/final", Role::Registrar),
        redirect("/registrar")
    );

    // Reversing the declaration order flips the outcome.
    let reversed: Vec<RouteRule> = rules.into_iter().rev().collect();
    let table = RouteAccessTable::compile(&reversed).unwrap();
    assert_eq!(table.authorize("/reports/final", Role::Registrar), Decision::Allow);
    assert_eq!(table.authorize("/reports/final", Role::Faculty), redirect("/faculty"));
}

#[test]
fn test_stock_table_orders_grades_before_generic_lists() {
    let table = portal_table();

    assert_eq!(table.authorize("/list/grades", Role::Student), Decision::Allow);
    assert_eq!(table.authorize("/list/students", Role::Faculty), Decision::Allow);
    assert_eq!(table.authorize("/list/students", Role::Student), redirect("/student"));
    assert_eq!(table.authorize("/list/courses", Role::Faculty), redirect("/faculty"));
    assert_eq!(table.authorize("/list/courses", Role::Registrar), Decision::Allow);
}

#[test]
fn test_patterns_are_anchored() {
    let rules = vec![RouteRule::new("/admin", &[Role::Admin])];
    let table = RouteAccessTable::compile(&rules).unwrap();

    // Neither a prefix nor a suffix match counts.
    assert_eq!(table.governing_pattern("/admin/users"), None);
    assert_eq!(table.governing_pattern("/student/admin"), None);
    assert_eq!(table.governing_pattern("/admin"), Some("/admin"));
}

#[test]
fn test_patterns_keep_declaration_order() {
    let table = portal_table();
    let patterns: Vec<&str> = table.patterns().collect();
    assert_eq!(patterns.len(), table.len());
    assert_eq!(patterns.first(), Some(&"/admin(.*)"));
    assert_eq!(patterns.last(), Some(&"/list/(.*)"));
}

#[test]
fn test_from_json_table() {
    let raw = r#"[
        {"pattern": "/grades(.*)", "roles": ["faculty", "Registrar"]},
        {"pattern": "/(.*)", "roles": ["admin"]}
    ]"#;
    let table = RouteAccessTable::from_json(raw).unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.authorize("/grades/upload", Role::Registrar), Decision::Allow);
    assert_eq!(table.authorize("/anything", Role::Faculty), redirect("/faculty"));
}

#[test]
fn test_invalid_pattern_rejected_at_compile() {
    let rules = vec![RouteRule::new("/broken(", &[Role::Admin])];
    let result = RouteAccessTable::compile(&rules);
    assert!(matches!(result, Err(GateError::InvalidPattern { .. })));
}

#[test]
fn test_unknown_role_rejected_at_compile() {
    let rules = vec![RouteRule {
        pattern: "/parent(.*)".to_string(),
        roles: vec!["parent".to_string()],
    }];
    let result = RouteAccessTable::compile(&rules);
    assert!(matches!(result, Err(GateError::UnknownRole(_))));
}

#[test]
fn test_unknown_role_is_a_std_error() {
    let err = "parent".parse::<Role>().unwrap_err();
    assert_eq!(err.to_string(), "unknown role 'parent'");

    let _boxed: Box<dyn std::error::Error> = Box::new(err.clone());

    let gate_err = GateError::from("Parent ".parse::<Role>().unwrap_err());
    assert_eq!(gate_err.to_string(), "unknown role 'Parent '");
}

#[test]
fn test_malformed_json_table_rejected() {
    let result = RouteAccessTable::from_json(r#"{"pattern": "/admin"}"#);
    assert!(matches!(result, Err(GateError::MalformedTable(_))));
}
